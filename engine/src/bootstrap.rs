use std::path::Path;

use crate::config::{EngineConfig, LoadPolicy};
use crate::corpus::load_corpus;
use crate::error::{EngineError, Result};
use crate::model::FittedModel;
use crate::persist::{self, ModelPaths};

/// Fit a model from the corpus file and persist it under `model_dir`.
pub fn fit_and_save(corpus: &Path, model_dir: &Path, config: &EngineConfig) -> Result<FittedModel> {
    let inputs = load_corpus(corpus)?;
    let model = FittedModel::fit(inputs, config.vectorizer.clone());
    persist::save(&ModelPaths::new(model_dir), &model)?;
    Ok(model)
}

/// Load the persisted model, falling back to a fresh fit when the artifact is
/// missing or corrupt and the policy allows it.
pub fn load_or_fit(model_dir: &Path, corpus: Option<&Path>, config: &EngineConfig) -> Result<FittedModel> {
    match persist::load(&ModelPaths::new(model_dir)) {
        Ok(model) => Ok(model),
        Err(e @ (EngineError::ModelNotFound(_) | EngineError::CorruptModel(_))) => match (config.load_policy, corpus) {
            (LoadPolicy::RefitOnError, Some(corpus)) => {
                tracing::warn!(error = %e, corpus = %corpus.display(), "model unavailable, refitting");
                fit_and_save(corpus, model_dir, config)
            }
            _ => Err(e),
        },
        Err(e) => Err(e),
    }
}
