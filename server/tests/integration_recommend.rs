use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use engine::{EngineConfig, FittedModel, RecordInput, Recommender, VectorizerConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn exercise(title: &str, area: &str, equipment: &str, level: &str, rating: Option<f32>) -> RecordInput {
    RecordInput {
        title: Some(title.into()),
        category: Some("Strength".into()),
        target_area: Some(area.into()),
        equipment: Some(equipment.into()),
        level: Some(level.into()),
        rating,
        ..Default::default()
    }
}

fn tiny_model() -> FittedModel {
    FittedModel::fit(
        vec![
            exercise("Bench Press", "Chest", "Barbell", "Intermediate", Some(9.0)),
            exercise("Curl", "Biceps", "Dumbbell", "Beginner", Some(8.5)),
            exercise("Squat", "Quadriceps", "Barbell", "Intermediate", Some(9.2)),
            exercise("Deadlift", "FullBody", "Barbell", "Expert", Some(9.5)),
            exercise("Push-up", "Chest", "Body Only", "Beginner", None),
        ],
        VectorizerConfig::default(),
    )
}

fn app_with(recommender: Recommender, corpus: Option<PathBuf>, model_dir: PathBuf) -> Router {
    build_app(AppState {
        recommender: Arc::new(recommender),
        model_dir,
        corpus,
        config: EngineConfig::default(),
        admin_token: Some("secret".into()),
    })
}

fn app() -> Router {
    app_with(Recommender::with_model(tiny_model()), None, PathBuf::from("unused"))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn recommend_filters_and_reports_filters() {
    let body = serde_json::json!({ "body_part": "chest", "limit": 5 });
    let (status, json) = send(app(), post_json("/api/recommend", body)).await;
    assert_eq!(status, StatusCode::OK);
    let recs = json["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r["body_part"] == "Chest"));
    assert_eq!(json["total_found"], 2);
    assert_eq!(json["filters_applied"], serde_json::json!({ "body_part": "chest" }));
}

#[tokio::test]
async fn recommend_without_filters_orders_by_rating() {
    let (status, json) = send(app(), post_json("/api/recommend", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json["recommendations"].as_array().unwrap().iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Deadlift", "Squat", "Bench Press", "Curl", "Push-up"]);
    assert_eq!(json["recommendations"][4]["rating"], Value::Null);
    assert_eq!(json["recommendations"][0]["similarity_score"], 1.0);
}

#[tokio::test]
async fn recommend_rejects_out_of_range_limit() {
    let (status, _) = send(app(), post_json("/api/recommend", serde_json::json!({ "limit": 0 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(app(), post_json("/api/recommend", serde_json::json!({ "limit": 51 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unfitted_model_is_unavailable() {
    let app = app_with(Recommender::new(), None, PathBuf::from("unused"));
    let (status, _) = send(app.clone(), post_json("/api/recommend", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, json) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model_fitted"], false);
}

#[tokio::test]
async fn similar_excludes_self_and_checks_ids() {
    let (status, json) = send(app(), Request::post("/api/recommend/similar/0?limit=3").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let sims = json["similar_exercises"].as_array().unwrap();
    assert_eq!(sims.len(), 3);
    assert!(sims.iter().all(|s| s["id"] != 0));

    let (status, _) = send(app(), Request::post("/api/recommend/similar/99").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app(), Request::post("/api/recommend/similar/-1").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exercises_are_paginated_and_filterable() {
    let (status, json) = send(app(), get("/api/exercises?equipment=barbell&page=1&page_size=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["exercises"].as_array().unwrap().len(), 2);
    assert_eq!(json["exercises"][0]["type"], "Strength");

    let (status, _) = send(app(), get("/api/exercises?page_size=101")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send(app(), get("/api/exercises/filters")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["levels"], serde_json::json!(["Beginner", "Expert", "Intermediate"]));

    let (status, json) = send(app(), get("/api/exercises/4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Push-up");
    let (status, _) = send(app(), get("/api/exercises/5")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_refit_requires_token_and_replaces_model() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus.jsonl");
    std::fs::write(&corpus, "{\"Title\":\"Dip\",\"BodyPart\":\"Chest\"}\n{\"Title\":\"Fly\",\"BodyPart\":\"Chest\"}\n").unwrap();
    let app = app_with(Recommender::with_model(tiny_model()), Some(corpus), dir.path().join("model"));

    let (status, _) = send(app.clone(), Request::post("/admin/refit").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::post("/admin/refit").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_exercises"], 2);

    let (_, json) = send(app, get("/api/exercises")).await;
    assert_eq!(json["total"], 2);
    assert!(dir.path().join("model/model.bin").exists());
}
