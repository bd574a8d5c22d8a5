//! Engine configuration.
//!
//! Defaults reproduce the vectorizer settings the catalog model has always
//! been trained with; a JSON or YAML params file may override any subset of them.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Upper bound on vocabulary size, keeping the most frequent terms.
    pub max_features: usize,
    /// Minimum number of records a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of records a term may appear in.
    pub max_df: f64,
    /// Inclusive n-gram lengths emitted by the tokenizer.
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { max_features: 5000, min_df: 2, max_df: 0.95, ngram_range: (1, 2) }
    }
}

/// What the bootstrap does when a persisted model cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Fit a fresh model from the corpus and persist it.
    #[default]
    RefitOnError,
    /// Treat a missing or corrupt artifact as a startup failure.
    FailFast,
}

impl std::str::FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "refit_on_error" | "refit" => Ok(Self::RefitOnError),
            "fail_fast" | "fail" => Ok(Self::FailFast),
            other => Err(format!("unknown load policy '{other}' (expected refit or fail)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vectorizer: VectorizerConfig,
    pub load_policy: LoadPolicy,
}

impl EngineConfig {
    /// Read a params file, YAML for `.yaml`/`.yml` and JSON otherwise.
    /// Keys that are missing keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&raw)?),
            _ => Ok(serde_json::from_str(&raw)?),
        }
    }
}
