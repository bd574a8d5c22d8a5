use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recommendation model is not fitted yet")]
    NotFitted,

    #[error("record id {id} out of range (corpus has {len} records)")]
    InvalidId { id: u32, len: usize },

    #[error("model artifact not found at {0}")]
    ModelNotFound(PathBuf),

    #[error("corrupt model artifact: {0}")]
    CorruptModel(String),

    #[error("invalid corpus: {0}")]
    Corpus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
