//! Thin HTTP façade over the order orchestrator core (spec §6).
//!
//! Out of scope per spec.md (it specifies the façade only as an interface),
//! but built here as a minimal binary so the system runs end to end.

pub mod config;
pub mod error;
pub mod routes;
pub mod service_directory;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use repository::Repository;
use saga::AuthKeyCache;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<R: Repository + 'static>(
    state: Arc<AppState<R>>,
    auth: Arc<AuthKeyCache>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(auth);

    Router::new()
        .route("/order", post(routes::orders::create::<R>))
        .route("/order", get(routes::orders::list::<R>))
        .route("/order/{id}", get(routes::orders::get::<R>))
        .route("/order/{id}", delete(routes::orders::delete::<R>))
        .route("/order/{id}/status", get(routes::orders::status::<R>))
        .route("/order/{id}/cancel", post(routes::orders::cancel::<R>))
        .with_state(state)
        .merge(health_router)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
