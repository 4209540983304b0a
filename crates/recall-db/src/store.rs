use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    StoreError,
    models::{EventCounts, ReviewEvent, ReviewItem, ScheduleCounts, ScheduleWindow},
    repositories::{event, review},
};

/// Durable per-learner schedule state with optimistic-concurrency writes.
///
/// [`compare_and_swap`](Self::compare_and_swap) is the only way to change an
/// existing item's schedule. Reads take no locks and may observe a slightly
/// stale snapshot.
pub trait ReviewStore: Clone + Send + Sync + 'static {
    /// Store a new item. Fails with [`StoreError::AlreadyExists`] on a duplicate key.
    fn insert(&self, item: &ReviewItem) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch one item of `owner_id`.
    fn get(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> impl Future<Output = Result<ReviewItem, StoreError>> + Send;

    /// Items with `next_review_at <= as_of`, most overdue first, ties broken by id.
    ///
    /// Fails with [`StoreError::NotFound`] only when the owner has no items at
    /// all; an empty list is otherwise a valid answer.
    fn due_items(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<ReviewItem>, StoreError>> + Send;

    /// Atomically write `item` and append `event`, but only if the stored
    /// revision still equals `expected_revision`.
    ///
    /// On success the stored revision becomes `expected_revision + 1` and the
    /// stored item is returned. On conflict nothing is written.
    fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_revision: i64,
        event: &ReviewEvent,
    ) -> impl Future<Output = Result<ReviewItem, StoreError>> + Send;

    /// Review event tallies for `owner_id` recorded at or after `since`.
    fn count_events_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<EventCounts, StoreError>> + Send;

    /// Item counts for the day and week of `window`.
    fn schedule_counts(
        &self,
        owner_id: Uuid,
        window: ScheduleWindow,
    ) -> impl Future<Output = Result<ScheduleCounts, StoreError>> + Send;

    /// Remove an item. Its review events are kept.
    fn delete(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// [`ReviewStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ReviewStore for PgReviewStore {
    async fn insert(&self, item: &ReviewItem) -> Result<(), StoreError> {
        if review::insert_item(&self.pool, item).await? {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists)
        }
    }

    async fn get(&self, owner_id: Uuid, item_id: Uuid) -> Result<ReviewItem, StoreError> {
        review::find_item(&self.pool, owner_id, item_id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn due_items(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ReviewItem>, StoreError> {
        let items = review::find_due_items(&self.pool, owner_id, as_of, limit).await?;
        if items.is_empty() && !review::owner_has_items(&self.pool, owner_id).await? {
            return Err(StoreError::NotFound);
        }
        Ok(items)
    }

    async fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_revision: i64,
        event: &ReviewEvent,
    ) -> Result<ReviewItem, StoreError> {
        // Dropping `tx` without commit rolls back, so a cancelled call leaves no trace
        let mut tx = self.pool.begin().await?;

        let Some(saved) = review::update_item_if_revision(&mut *tx, item, expected_revision).await?
        else {
            let actual = review::find_revision(&mut *tx, item.owner_id, item.id).await?;
            tracing::debug!(
                item_id = %item.id,
                expected_revision,
                ?actual,
                "conditional update matched no row"
            );
            return Err(match actual {
                Some(actual) => StoreError::RevisionConflict {
                    expected: expected_revision,
                    actual,
                },
                None => StoreError::NotFound,
            });
        };

        event::insert_event(&mut *tx, event).await?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn count_events_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<EventCounts, StoreError> {
        Ok(event::count_events_since(&self.pool, owner_id, since).await?)
    }

    async fn schedule_counts(
        &self,
        owner_id: Uuid,
        window: ScheduleWindow,
    ) -> Result<ScheduleCounts, StoreError> {
        Ok(review::count_schedule(&self.pool, owner_id, window).await?)
    }

    async fn delete(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), StoreError> {
        if review::delete_item(&self.pool, owner_id, item_id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}
