//! Review scheduler: applies SM-2 updates under optimistic concurrency and
//! answers due-list and schedule-summary queries.

use chrono::{DateTime, Utc};
use recall_db::{
    ReviewStore, StoreError,
    models::{ItemContent, ReviewEvent, ReviewItem, ScheduleWindow},
};
use recall_srs::{InvalidQuality, retention_rate};
use thiserror::Error;
use uuid::Uuid;

use super::model::{DueItem, ReviewOutcome, ReviewSubmission, ScheduleSummary};
use crate::{config::SchedulerConfig, metrics};

/// `due_this_week` looks this many days past `as_of`, today included.
const DAYS_PER_WEEK: i64 = 7;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    InvalidQuality(#[from] InvalidQuality),
    #[error("invalid review telemetry: {0}")]
    InvalidTelemetry(String),
    #[error("review item not found")]
    ItemNotFound,
    #[error("learner has no review items")]
    UnknownOwner,
    #[error("review item already assigned")]
    AlreadyAssigned,
    /// Every attempt lost the race to a concurrent update.
    #[error("review not applied after {attempts} attempts due to concurrent updates")]
    Contention { attempts: u32 },
    #[error(transparent)]
    Store(StoreError),
}

/// Maps a missing item to [`SchedulerError::ItemNotFound`], anything else passes through.
fn item_error(err: StoreError) -> SchedulerError {
    match err {
        StoreError::NotFound => SchedulerError::ItemNotFound,
        other => SchedulerError::Store(other),
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<S> {
    store: S,
    config: SchedulerConfig,
}

impl<S: ReviewStore> Scheduler<S> {
    pub const fn new(store: S, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the schedule for a newly assigned item: default ease, immediately due.
    #[tracing::instrument(skip(self, content))]
    pub async fn initialize(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        content: ItemContent,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem, SchedulerError> {
        let item = ReviewItem::new(owner_id, item_id, content, now);
        self.store.insert(&item).await.map_err(|e| match e {
            StoreError::AlreadyExists => SchedulerError::AlreadyAssigned,
            other => SchedulerError::Store(other),
        })?;

        tracing::debug!("review item initialized");
        Ok(item)
    }

    /// Full item state, answer included.
    pub async fn item(&self, owner_id: Uuid, item_id: Uuid) -> Result<ReviewItem, SchedulerError> {
        self.store.get(owner_id, item_id).await.map_err(item_error)
    }

    /// Drop an item whose content was retired. Its review history is kept.
    #[tracing::instrument(skip(self))]
    pub async fn retire(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), SchedulerError> {
        self.store.delete(owner_id, item_id).await.map_err(item_error)?;
        tracing::debug!("review item retired");
        Ok(())
    }

    /// Apply one rating to an item and persist the new schedule.
    ///
    /// The rating is validated before anything is read. On a revision
    /// conflict the item is re-read and the rating applied again to the fresh
    /// state, up to `max_attempts` times. Nothing is written unless the
    /// compare-and-swap commits.
    #[tracing::instrument(skip(self, submission), fields(quality = %submission.quality))]
    pub async fn submit_review(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        submission: &ReviewSubmission,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulerError> {
        let quality = submission.quality()?;
        submission
            .check_telemetry()
            .map_err(SchedulerError::InvalidTelemetry)?;

        let was_correct = quality.is_success();
        let event = ReviewEvent::new(
            owner_id,
            item_id,
            quality,
            submission.response_time_seconds,
            submission.hints_used,
            now,
        );

        for attempt in 1..=self.config.max_attempts {
            let current = self.store.get(owner_id, item_id).await.map_err(item_error)?;
            let updated = current.rescheduled(current.schedule().review(quality), now);

            match self
                .store
                .compare_and_swap(&updated, current.revision, &event)
                .await
            {
                Ok(item) => {
                    metrics::record_review(was_correct);
                    tracing::debug!(
                        attempt,
                        revision = item.revision,
                        repetitions = item.repetitions,
                        interval_days = item.interval_days,
                        ease_factor = item.ease_factor,
                        "review applied"
                    );
                    return Ok(ReviewOutcome { item, was_correct });
                }
                Err(StoreError::RevisionConflict { expected, actual }) => {
                    metrics::record_revision_conflict();
                    tracing::warn!(
                        attempt,
                        expected,
                        actual,
                        "revision conflict, re-reading item"
                    );
                }
                Err(other) => return Err(item_error(other)),
            }
        }

        metrics::record_contention();
        tracing::error!(
            attempts = self.config.max_attempts,
            "giving up on review after repeated revision conflicts"
        );
        Err(SchedulerError::Contention {
            attempts: self.config.max_attempts,
        })
    }

    /// Items due at `as_of`, most overdue first.
    ///
    /// `limit` falls back to the default page size and is clamped to the
    /// configured maximum. Fails with [`SchedulerError::UnknownOwner`] when
    /// the learner has no items at all.
    #[tracing::instrument(skip(self))]
    pub async fn due_items(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
        limit: Option<u32>,
    ) -> Result<Vec<DueItem>, SchedulerError> {
        let limit = self.config.due_limit(limit);
        let items = self
            .store
            .due_items(owner_id, as_of, limit)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => SchedulerError::UnknownOwner,
                other => SchedulerError::Store(other),
            })?;

        Ok(items
            .into_iter()
            .map(|item| DueItem::from_item(item, as_of))
            .collect())
    }

    /// Counts of upcoming work plus lifetime and recent review figures.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_summary(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<ScheduleSummary, SchedulerError> {
        let window = ScheduleWindow::around(as_of, DAYS_PER_WEEK);

        let counts = self
            .store
            .schedule_counts(owner_id, window)
            .await
            .map_err(SchedulerError::Store)?;
        let lifetime = self
            .store
            .count_events_since(owner_id, DateTime::UNIX_EPOCH)
            .await
            .map_err(SchedulerError::Store)?;
        let recent = self
            .store
            .count_events_since(owner_id, as_of - self.config.retention_window())
            .await
            .map_err(SchedulerError::Store)?;

        Ok(ScheduleSummary {
            due_today: counts.due_today,
            due_this_week: counts.due_this_week,
            new_items: counts.new_items,
            total_reviews: lifetime.total,
            average_retention: retention_rate(recent.successful, recent.total),
        })
    }
}
