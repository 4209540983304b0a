//! In-process [`ReviewStore`], used by tests and embedded setups.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    ReviewStore, StoreError,
    models::{EventCounts, ReviewEvent, ReviewItem, ScheduleCounts, ScheduleWindow},
};

/// [`ReviewStore`] holding everything in memory behind one async lock.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryReviewStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    items: BTreeMap<(Uuid, Uuid), ReviewItem>,
    events: Vec<ReviewEvent>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded for `owner_id`, oldest first.
    pub async fn events(&self, owner_id: Uuid) -> Vec<ReviewEvent> {
        let inner = self.inner.read().await;
        inner
            .events
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect()
    }
}

impl ReviewStore for MemoryReviewStore {
    async fn insert(&self, item: &ReviewItem) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (item.owner_id, item.id);
        if inner.items.contains_key(&key) {
            return Err(StoreError::AlreadyExists);
        }
        inner.items.insert(key, item.clone());
        Ok(())
    }

    async fn get(&self, owner_id: Uuid, item_id: Uuid) -> Result<ReviewItem, StoreError> {
        let inner = self.inner.read().await;
        inner
            .items
            .get(&(owner_id, item_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn due_items(
        &self,
        owner_id: Uuid,
        as_of: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ReviewItem>, StoreError> {
        let inner = self.inner.read().await;
        let mut owned = inner
            .items
            .range((owner_id, Uuid::nil())..=(owner_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, item)| item)
            .peekable();
        if owned.peek().is_none() {
            return Err(StoreError::NotFound);
        }

        let mut due: Vec<ReviewItem> = owned
            .filter(|item| item.next_review_at <= as_of)
            .cloned()
            .collect();
        due.sort_by(|a, b| (a.next_review_at, a.id).cmp(&(b.next_review_at, b.id)));
        due.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(due)
    }

    async fn compare_and_swap(
        &self,
        item: &ReviewItem,
        expected_revision: i64,
        event: &ReviewEvent,
    ) -> Result<ReviewItem, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .items
            .get_mut(&(item.owner_id, item.id))
            .ok_or(StoreError::NotFound)?;

        if stored.revision != expected_revision {
            return Err(StoreError::RevisionConflict {
                expected: expected_revision,
                actual: stored.revision,
            });
        }

        stored.ease_factor = item.ease_factor;
        stored.interval_days = item.interval_days;
        stored.repetitions = item.repetitions;
        stored.next_review_at = item.next_review_at;
        stored.last_reviewed_at = item.last_reviewed_at;
        stored.revision = expected_revision + 1;
        let saved = stored.clone();

        inner.events.push(event.clone());
        Ok(saved)
    }

    async fn count_events_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<EventCounts, StoreError> {
        let inner = self.inner.read().await;
        let counts = inner
            .events
            .iter()
            .filter(|e| e.owner_id == owner_id && e.reviewed_at >= since)
            .fold(EventCounts::default(), |mut acc, e| {
                acc.total += 1;
                if e.was_correct {
                    acc.successful += 1;
                }
                acc
            });
        Ok(counts)
    }

    async fn schedule_counts(
        &self,
        owner_id: Uuid,
        window: ScheduleWindow,
    ) -> Result<ScheduleCounts, StoreError> {
        let inner = self.inner.read().await;
        let counts = inner
            .items
            .range((owner_id, Uuid::nil())..=(owner_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, item)| item)
            .fold(ScheduleCounts::default(), |mut acc, item| {
                if window.is_today(item.next_review_at) {
                    acc.due_today += 1;
                }
                if window.is_this_week(item.next_review_at) {
                    acc.due_this_week += 1;
                }
                if item.repetitions == 0 {
                    acc.new_items += 1;
                }
                acc
            });
        Ok(counts)
    }

    async fn delete(&self, owner_id: Uuid, item_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .items
            .remove(&(owner_id, item_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
