use axum::Router;
use recall_db::ReviewStore;

use crate::{review, state::ApiState};

/// V1 API routes
pub fn routes<S: ReviewStore>() -> Router<ApiState<S>> {
    Router::new().merge(review::routes())
}
