use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use engine::bootstrap::fit_and_save;
use engine::{EngineConfig, EngineError, FacetFilters, Record, RecordId, RecommendQuery, Recommendation, Recommender};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_VERSION: &str = "1.0.0";
const MAX_RECOMMENDATIONS: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

type Rejection = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub model_dir: PathBuf,
    pub corpus: Option<PathBuf>,
    pub config: EngineConfig,
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub body_part: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub exercise_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub exclude_exercises: Option<Vec<String>>,
}
fn default_limit() -> usize { 10 }

#[derive(Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub total_found: usize,
    pub filters_applied: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct SimilarParams {
    #[serde(default = "default_similar_limit")]
    pub limit: usize,
}
fn default_similar_limit() -> usize { 5 }

#[derive(Deserialize)]
pub struct ExerciseListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub body_part: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub exercise_type: Option<String>,
}
fn default_page() -> usize { 1 }
fn default_page_size() -> usize { 20 }

#[derive(Serialize)]
pub struct Exercise {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
    pub body_part: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<String>,
    pub rating: Option<f32>,
    pub rating_desc: Option<String>,
}

impl From<&Record> for Exercise {
    fn from(r: &Record) -> Self {
        Self {
            id: r.id,
            title: r.title.clone(),
            description: r.description.clone(),
            category: r.category.clone(),
            body_part: r.target_area.clone(),
            equipment: r.equipment.clone(),
            level: r.level.clone(),
            rating: r.rating,
            rating_desc: r.rating_desc.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ExerciseListResponse {
    pub exercises: Vec<Exercise>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/api/recommend", post(recommend_handler))
        .route("/api/recommend/similar/:exercise_id", post(similar_handler))
        .route("/api/exercises", get(list_exercises))
        .route("/api/exercises/filters", get(exercise_filters))
        .route("/api/exercises/:exercise_id", get(get_exercise))
        .route("/admin/refit", post(admin_refit))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn reject(err: EngineError) -> Rejection {
    let status = match err {
        EngineError::NotFitted => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidId { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn unprocessable(msg: impl Into<String>) -> Rejection {
    (StatusCode::UNPROCESSABLE_ENTITY, msg.into())
}

/// Ids arrive as signed integers so negative values read as "not found".
fn record_id(raw: i64) -> Result<RecordId, Rejection> {
    RecordId::try_from(raw).map_err(|_| (StatusCode::NOT_FOUND, "Exercise not found".to_string()))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": API_VERSION,
        "model_fitted": state.recommender.is_fitted(),
    }))
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, Rejection> {
    if req.limit == 0 || req.limit > MAX_RECOMMENDATIONS {
        return Err(unprocessable(format!("limit must be between 1 and {MAX_RECOMMENDATIONS}")));
    }
    let mut filters_applied = serde_json::Map::new();
    for (key, value) in [
        ("body_part", &req.body_part),
        ("equipment", &req.equipment),
        ("level", &req.level),
        ("exercise_type", &req.exercise_type),
    ] {
        if let Some(v) = value {
            filters_applied.insert(key.to_string(), serde_json::Value::String(v.clone()));
        }
    }

    let query = RecommendQuery {
        filters: FacetFilters {
            target_area: req.body_part,
            equipment: req.equipment,
            level: req.level,
            category: req.exercise_type,
        },
        exclude_titles: req.exclude_exercises.unwrap_or_default(),
        limit: req.limit,
    };
    let recommendations = state.recommender.recommend(&query).map_err(reject)?;
    Ok(Json(RecommendationResponse { total_found: recommendations.len(), recommendations, filters_applied }))
}

pub async fn similar_handler(
    State(state): State<AppState>,
    Path(exercise_id): Path<i64>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<serde_json::Value>, Rejection> {
    let id = record_id(exercise_id)?;
    let similar = state.recommender.similar(id, params.limit).map_err(reject)?;
    Ok(Json(serde_json::json!({ "similar_exercises": similar })))
}

pub async fn list_exercises(
    State(state): State<AppState>,
    Query(params): Query<ExerciseListParams>,
) -> Result<Json<ExerciseListResponse>, Rejection> {
    if params.page == 0 {
        return Err(unprocessable("page must be at least 1"));
    }
    if params.page_size == 0 || params.page_size > MAX_PAGE_SIZE {
        return Err(unprocessable(format!("page_size must be between 1 and {MAX_PAGE_SIZE}")));
    }
    let model = state.recommender.snapshot().map_err(reject)?;
    let filters = FacetFilters {
        target_area: params.body_part,
        equipment: params.equipment,
        level: params.level,
        category: params.exercise_type,
    };
    let page = model.browse(&filters, params.page, params.page_size);
    Ok(Json(ExerciseListResponse {
        exercises: page.records.into_iter().map(Exercise::from).collect(),
        total: page.total,
        page: params.page,
        page_size: params.page_size,
    }))
}

pub async fn exercise_filters(State(state): State<AppState>) -> Result<Json<engine::model::FacetOptions>, Rejection> {
    let model = state.recommender.snapshot().map_err(reject)?;
    Ok(Json(model.facet_options()))
}

pub async fn get_exercise(State(state): State<AppState>, Path(exercise_id): Path<i64>) -> Result<Json<Exercise>, Rejection> {
    let id = record_id(exercise_id)?;
    let model = state.recommender.snapshot().map_err(reject)?;
    let record = model.get(id).map_err(reject)?;
    Ok(Json(Exercise::from(record)))
}

async fn admin_refit(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, Rejection> {
    authorize(&state, &headers)?;
    let corpus = state
        .corpus
        .clone()
        .ok_or((StatusCode::BAD_REQUEST, "no corpus configured".to_string()))?;
    let recommender = state.recommender.clone();
    let model = tokio::task::spawn_blocking(move || {
        recommender.replace(|| fit_and_save(&corpus, &state.model_dir, &state.config))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(reject)?;
    let (rows, cols) = model.shape();
    Ok(Json(serde_json::json!({ "num_exercises": rows, "vocabulary_size": cols })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
