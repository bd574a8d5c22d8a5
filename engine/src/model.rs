use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::config::VectorizerConfig;
use crate::error::{EngineError, Result};
use crate::filter::{filter_indices, FacetFilters};
use crate::rank::{self, RecommendQuery};
use crate::record::{Record, RecordInput, Recommendation};
use crate::vectorizer::{SparseVector, TfIdfVectorizer};
use crate::{RecordId, TermId};

pub const MODEL_VERSION: &str = "1.0.0";

/// Vocabulary, IDF weights, corpus rows and records, built and replaced as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub model_version: String,
    pub vectorizer: TfIdfVectorizer,
    pub rows: Vec<SparseVector>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetOptions {
    pub body_parts: Vec<String>,
    pub equipment: Vec<String>,
    pub levels: Vec<String>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub records: Vec<&'a Record>,
    pub total: usize,
}

impl FittedModel {
    pub fn fit(inputs: Vec<RecordInput>, config: VectorizerConfig) -> Self {
        let records: Vec<Record> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| Record::from_input(i as RecordId, input))
            .collect();
        let vectorizer = TfIdfVectorizer::fit(
            &records.iter().map(|r| r.feature_text.as_str()).collect::<Vec<_>>(),
            config,
        );
        let rows = records.iter().map(|r| vectorizer.transform(&r.feature_text)).collect();
        tracing::info!(num_records = records.len(), vocabulary = vectorizer.vocabulary_size(), "fitted model");
        Self { model_version: MODEL_VERSION.to_string(), vectorizer, rows, records }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Rows × columns of the corpus matrix.
    pub fn shape(&self) -> (usize, usize) { (self.rows.len(), self.vectorizer.vocabulary_size()) }

    pub fn get(&self, id: RecordId) -> Result<&Record> {
        self.records.get(id as usize).ok_or(EngineError::InvalidId { id, len: self.records.len() })
    }

    pub fn recommend(&self, query: &RecommendQuery) -> Vec<Recommendation> {
        rank::recommend(&self.vectorizer, &self.rows, &self.records, query)
    }

    pub fn similar(&self, id: RecordId, limit: usize) -> Result<Vec<Recommendation>> {
        rank::similar(&self.rows, &self.records, id, limit)
    }

    /// Filtered catalog page; `page` is 1-based.
    pub fn browse(&self, filters: &FacetFilters, page: usize, page_size: usize) -> Page<'_> {
        let matched = filter_indices(&self.records, filters, &[]);
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let records = matched.iter().skip(start).take(page_size).map(|&i| &self.records[i]).collect();
        Page { records, total: matched.len() }
    }

    /// Sorted distinct values per facet.
    pub fn facet_options(&self) -> FacetOptions {
        fn distinct<'a>(it: impl Iterator<Item = &'a Option<String>>) -> Vec<String> {
            it.flatten().cloned().collect::<BTreeSet<_>>().into_iter().collect()
        }
        FacetOptions {
            body_parts: distinct(self.records.iter().map(|r| &r.target_area)),
            equipment: distinct(self.records.iter().map(|r| &r.equipment)),
            levels: distinct(self.records.iter().map(|r| &r.level)),
            types: distinct(self.records.iter().map(|r| &r.category)),
        }
    }

    /// Structural checks a loaded artifact must pass before it is served.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let cols = self.vectorizer.vocabulary_size();
        if self.vectorizer.dictionary.len() != cols {
            return Err(format!("dictionary has {} terms but {} idf weights", self.vectorizer.dictionary.len(), cols));
        }
        if self.vectorizer.dictionary.values().any(|&t| t as usize >= cols) {
            return Err("dictionary term id out of range".into());
        }
        let distinct: HashSet<TermId> = self.vectorizer.dictionary.values().copied().collect();
        if distinct.len() != cols {
            return Err("dictionary term ids are not unique".into());
        }
        if self.rows.len() != self.records.len() {
            return Err(format!("{} rows for {} records", self.rows.len(), self.records.len()));
        }
        if let Some((i, _)) = self.records.iter().enumerate().find(|(i, r)| r.id as usize != *i) {
            return Err(format!("record at position {i} has non-dense id"));
        }
        if self.rows.iter().flat_map(|r| &r.entries).any(|(t, _)| *t as usize >= cols) {
            return Err("row column out of range".into());
        }
        // dot products merge rows by term id
        if let Some(i) = self.rows.iter().position(|r| r.entries.windows(2).any(|w| w[0].0 >= w[1].0)) {
            return Err(format!("row {i} entries are not strictly sorted by term id"));
        }
        Ok(())
    }
}
