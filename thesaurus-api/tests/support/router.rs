use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use thesaurus_api::{create_api_router, AppState};
use thesaurus_storage::SynonymResolver;
use tower::ServiceExt;

pub fn test_app(resolver: SynonymResolver) -> Router {
    create_api_router(AppState::new(Arc::new(resolver)))
}

/// Issue a GET and decode the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, json)
}
