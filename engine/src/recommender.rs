//! Shared context holding the fitted model.
//!
//! The model is immutable once installed and handed out as `Arc` snapshots,
//! so concurrent reads never block one another. Installing a model (first
//! initialization or a wholesale refit) is serialized by `init`; a failed
//! initializer leaves whatever was installed before untouched.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::model::FittedModel;
use crate::rank::RecommendQuery;
use crate::record::Recommendation;
use crate::RecordId;

#[derive(Default)]
pub struct Recommender {
    model: RwLock<Option<Arc<FittedModel>>>,
    init: Mutex<()>,
}

impl Recommender {
    pub fn new() -> Self { Self::default() }

    pub fn with_model(model: FittedModel) -> Self {
        Self { model: RwLock::new(Some(Arc::new(model))), init: Mutex::new(()) }
    }

    pub fn is_fitted(&self) -> bool { self.model.read().is_some() }

    pub fn snapshot(&self) -> Result<Arc<FittedModel>> {
        self.model.read().clone().ok_or(EngineError::NotFitted)
    }

    /// Run `build` only if no model is installed yet. Concurrent callers wait
    /// on the guard; exactly one of them builds, the rest see its result.
    pub fn initialize<F>(&self, build: F) -> Result<Arc<FittedModel>>
    where
        F: FnOnce() -> Result<FittedModel>,
    {
        let _guard = self.init.lock();
        if let Some(model) = self.model.read().clone() {
            return Ok(model);
        }
        let model = Arc::new(build()?);
        *self.model.write() = Some(model.clone());
        Ok(model)
    }

    /// Replace the installed model with a freshly built one.
    pub fn replace<F>(&self, build: F) -> Result<Arc<FittedModel>>
    where
        F: FnOnce() -> Result<FittedModel>,
    {
        let _guard = self.init.lock();
        let model = Arc::new(build()?);
        *self.model.write() = Some(model.clone());
        tracing::info!(num_records = model.len(), "replaced model");
        Ok(model)
    }

    pub fn recommend(&self, query: &RecommendQuery) -> Result<Vec<Recommendation>> {
        Ok(self.snapshot()?.recommend(query))
    }

    pub fn similar(&self, id: RecordId, limit: usize) -> Result<Vec<Recommendation>> {
        self.snapshot()?.similar(id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorizerConfig;
    use crate::record::RecordInput;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tiny() -> FittedModel {
        let inputs = ["chest press", "chest fly", "leg press"]
            .iter()
            .map(|t| RecordInput { title: Some(t.to_string()), ..Default::default() })
            .collect();
        FittedModel::fit(inputs, VectorizerConfig::default())
    }

    #[test]
    fn queries_before_fit_are_rejected() {
        let r = Recommender::new();
        assert!(matches!(r.recommend(&RecommendQuery::default()), Err(EngineError::NotFitted)));
        assert!(matches!(r.similar(0, 3), Err(EngineError::NotFitted)));
    }

    #[test]
    fn concurrent_initialize_builds_once() {
        let r = Arc::new(Recommender::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (r, builds) = (r.clone(), builds.clone());
                std::thread::spawn(move || {
                    r.initialize(|| {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok(tiny())
                    })
                    .unwrap();
                })
            })
            .collect();
        for h in handles { h.join().unwrap(); }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(r.is_fitted());
    }

    #[test]
    fn failed_build_keeps_previous_state() {
        let r = Recommender::new();
        assert!(r.initialize(|| Err(EngineError::CorruptModel("bad".into()))).is_err());
        assert!(!r.is_fitted());

        r.initialize(|| Ok(tiny())).unwrap();
        assert!(r.replace(|| Err(EngineError::Corpus("empty".into()))).is_err());
        assert_eq!(r.snapshot().unwrap().len(), 3);
    }

    #[test]
    fn replace_swaps_wholesale() {
        let r = Recommender::with_model(tiny());
        let old = r.snapshot().unwrap();
        r.replace(|| Ok(FittedModel::fit(Vec::new(), VectorizerConfig::default()))).unwrap();
        assert_eq!(old.len(), 3);
        assert_eq!(r.snapshot().unwrap().len(), 0);
    }
}
