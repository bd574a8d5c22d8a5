//! Facet filtering over fitted records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::record::Record;

/// Exact-match facet constraints. `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetFilters {
    pub target_area: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
}

impl FacetFilters {
    /// Present facet values in query order: target area, equipment, level, category.
    pub fn values(&self) -> Vec<&str> {
        [&self.target_area, &self.equipment, &self.level, &self.category]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool { self.values().is_empty() }

    pub fn matches(&self, record: &Record) -> bool {
        facet_matches(&self.target_area, &record.target_area)
            && facet_matches(&self.equipment, &record.equipment)
            && facet_matches(&self.level, &record.level)
            && facet_matches(&self.category, &record.category)
    }
}

fn facet_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted.as_deref() {
        None | Some("") => true,
        Some(w) => actual.as_deref().is_some_and(|a| a.to_lowercase() == w.to_lowercase()),
    }
}

/// Indices of records passing every present facet whose title is not
/// excluded (case-insensitive), in original order.
pub fn filter_indices(records: &[Record], filters: &FacetFilters, exclude_titles: &[String]) -> Vec<usize> {
    let excluded: HashSet<String> = exclude_titles.iter().map(|t| t.to_lowercase()).collect();
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.matches(r) && !excluded.contains(&r.title.to_lowercase()))
        .map(|(i, _)| i)
        .collect()
}
