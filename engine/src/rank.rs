use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{EngineError, Result};
use crate::filter::{filter_indices, FacetFilters};
use crate::record::{Record, Recommendation};
use crate::vectorizer::{cosine, SparseVector, TfIdfVectorizer};
use crate::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendQuery {
    pub filters: FacetFilters,
    pub exclude_titles: Vec<String>,
    pub limit: usize,
}

impl Default for RecommendQuery {
    fn default() -> Self {
        Self { filters: FacetFilters::default(), exclude_titles: Vec::new(), limit: 10 }
    }
}

/// Similarity descending, rating descending with unrated last, then corpus order.
fn compare(a: &(usize, f32), b: &(usize, f32), records: &[Record]) -> Ordering {
    b.1.total_cmp(&a.1)
        .then_with(|| match (records[a.0].rating, records[b.0].rating) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.0.cmp(&b.0))
}

pub fn recommend(
    vectorizer: &TfIdfVectorizer,
    rows: &[SparseVector],
    records: &[Record],
    query: &RecommendQuery,
) -> Vec<Recommendation> {
    let candidates = filter_indices(records, &query.filters, &query.exclude_titles);
    if candidates.is_empty() {
        return Vec::new();
    }

    let facets = query.filters.values();
    let mut scored: Vec<(usize, f32)> = if facets.is_empty() {
        // relevance is flat; ordering falls through to rating
        candidates.into_iter().map(|i| (i, 1.0)).collect()
    } else {
        let q = vectorizer.transform(&facets.join(" ").to_lowercase());
        candidates.into_iter().map(|i| (i, cosine(&q, &rows[i]))).collect()
    };

    scored.sort_by(|a, b| compare(a, b, records));
    scored
        .into_iter()
        .take(query.limit)
        .map(|(i, s)| Recommendation::new(&records[i], s))
        .collect()
}

pub fn similar(rows: &[SparseVector], records: &[Record], id: RecordId, limit: usize) -> Result<Vec<Recommendation>> {
    let target = id as usize;
    let row = rows.get(target).ok_or(EngineError::InvalidId { id, len: rows.len() })?;

    let mut scored: Vec<(usize, f32)> = rows.iter().enumerate().map(|(i, r)| (i, cosine(row, r))).collect();
    scored.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| (b.0 == target).cmp(&(a.0 == target)))
            .then_with(|| a.0.cmp(&b.0))
    });
    let skip = usize::from(scored.first().is_some_and(|(i, _)| *i == target));

    Ok(scored
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|(i, s)| Recommendation::new(&records[i], s))
        .collect())
}
