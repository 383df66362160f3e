//! Health check endpoint (spec §6: 503 while the auth public key is not
//! yet loaded).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use saga::AuthKeyCache;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health` — 200 once the auth public key has been loaded, 503 until
/// then (spec §5: "readers MUST tolerate absence (return 'not ready' for
/// health checks)").
pub async fn check(State(auth): State<Arc<AuthKeyCache>>) -> impl IntoResponse {
    if auth.public_key().await.is_some() {
        (StatusCode::OK, Json(HealthResponse { status: "ok" }))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "auth key not loaded" }))
    }
}
