//! Content-based exercise recommendation engine.
//!
//! Records are vectorized with TF-IDF over their feature text; recommendations
//! filter by exact facet matches and rank by cosine similarity to the facet
//! values, then by rating. Record ids are positions in the fitted corpus and
//! are only stable for one fitted model.

pub mod bootstrap;
pub mod config;
pub mod corpus;
pub mod error;
pub mod filter;
pub mod model;
pub mod persist;
pub mod rank;
pub mod recommender;
pub mod record;
pub mod tokenizer;
pub mod vectorizer;

pub type TermId = u32;
pub type RecordId = u32;

pub use config::{EngineConfig, LoadPolicy, VectorizerConfig};
pub use error::{EngineError, Result};
pub use filter::FacetFilters;
pub use model::FittedModel;
pub use rank::RecommendQuery;
pub use recommender::Recommender;
pub use record::{Record, RecordInput, Recommendation};
