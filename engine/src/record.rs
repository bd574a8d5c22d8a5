use serde::{Deserialize, Serialize};

use crate::RecordId;

pub const UNKNOWN_TITLE: &str = "Unknown";

/// A catalog entry as handed over by ingestion, before it is assigned an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_area: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub rating: Option<f32>,
    pub rating_desc: Option<String>,
}

/// A fitted catalog entry.
///
/// `id` is the record's position in the corpus the model was fitted on. It is
/// only meaningful together with that model: a refit may renumber every
/// record, so callers must not keep ids as long-lived keys without also
/// pinning the model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub target_area: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub rating: Option<f32>,
    pub rating_desc: Option<String>,
    /// Text the record was vectorized from; kept for traceability.
    pub feature_text: String,
}

impl Record {
    pub fn from_input(id: RecordId, input: RecordInput) -> Self {
        let feature_text = feature_text(&input);
        Self {
            id,
            title: input.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            description: input.description,
            category: input.category,
            target_area: input.target_area,
            equipment: input.equipment,
            level: input.level,
            rating: input.rating,
            rating_desc: input.rating_desc,
            feature_text,
        }
    }
}

/// Lower-cased, space-joined title, description, category, target area,
/// equipment and level. Absent attributes contribute nothing.
pub fn feature_text(input: &RecordInput) -> String {
    [
        &input.title,
        &input.description,
        &input.category,
        &input.target_area,
        &input.equipment,
        &input.level,
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// One ranked result, shaped the way the HTTP layer returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    #[serde(rename = "body_part")]
    pub target_area: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub rating: Option<f32>,
    pub similarity_score: f32,
}

impl Recommendation {
    pub fn new(record: &Record, similarity: f32) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            target_area: record.target_area.clone(),
            equipment: record.equipment.clone(),
            level: record.level.clone(),
            rating: record.rating,
            similarity_score: round4(similarity),
        }
    }
}

pub fn round4(x: f32) -> f32 {
    (x * 10_000.0).round() / 10_000.0
}
