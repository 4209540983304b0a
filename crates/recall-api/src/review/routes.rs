use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use recall_db::{ReviewStore, models::ReviewItem};
use uuid::Uuid;
use validator::Validate;

use super::model::{
    AssignItemRequest, DueItem, DueQuery, ReviewOutcome, ReviewSubmission, ScheduleSummary,
};
use crate::{error::ApiError, state::ApiState, validation};

/// Create the review routes
pub fn routes<S: ReviewStore>() -> Router<ApiState<S>> {
    Router::new()
        .route("/learners/{owner_id}/items", post(assign_item::<S>))
        .route(
            "/learners/{owner_id}/items/{item_id}",
            get(get_item::<S>).delete(retire_item::<S>),
        )
        .route(
            "/learners/{owner_id}/items/{item_id}/reviews",
            post(submit_review::<S>),
        )
        .route("/learners/{owner_id}/due", get(list_due_items::<S>))
        .route("/learners/{owner_id}/schedule", get(get_schedule::<S>))
}

/// Create the schedule for content newly assigned to a learner
async fn assign_item<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path(owner_id): Path<Uuid>,
    Json(payload): Json<AssignItemRequest>,
) -> Result<(StatusCode, Json<ReviewItem>), ApiError> {
    payload.validate()?;
    let item_id = payload.item_id;
    let content = validation::normalize_content(payload.into_content())?;

    let item = state
        .scheduler
        .initialize(owner_id, item_id, content, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Reveal an item, answer included
async fn get_item<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path((owner_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReviewItem>, ApiError> {
    let item = state.scheduler.item(owner_id, item_id).await?;
    Ok(Json(item))
}

async fn retire_item<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path((owner_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.scheduler.retire(owner_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_review<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path((owner_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReviewSubmission>,
) -> Result<Json<ReviewOutcome>, ApiError> {
    let outcome = state
        .scheduler
        .submit_review(owner_id, item_id, &payload, Utc::now())
        .await?;
    Ok(Json(outcome))
}

async fn list_due_items<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<DueQuery>,
) -> Result<Json<Vec<DueItem>>, ApiError> {
    let items = state
        .scheduler
        .due_items(owner_id, Utc::now(), query.limit)
        .await?;
    Ok(Json(items))
}

async fn get_schedule<S: ReviewStore>(
    State(state): State<ApiState<S>>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<ScheduleSummary>, ApiError> {
    let summary = state
        .scheduler
        .schedule_summary(owner_id, Utc::now())
        .await?;
    Ok(Json(summary))
}
