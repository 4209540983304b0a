use axum::{Router, http::StatusCode, middleware, response::IntoResponse, routing::get};
use recall_db::ReviewStore;
use tower_http::trace::TraceLayer;

use crate::{
    metrics::{metrics_handler, track_metrics},
    middleware::request_id::request_id_middleware,
    state::ApiState,
    v1,
};

pub fn router<S: ReviewStore>() -> Router<ApiState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler::<S>))
        .nest("/v1", v1::routes())
        .fallback(handler_404)
}

/// The router with its state and the request-id, metrics and trace layers applied.
pub fn app<S: ReviewStore>(state: ApiState<S>) -> Router {
    router()
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
}
