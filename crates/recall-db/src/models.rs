use chrono::{DateTime, Duration, Utc};
use recall_srs::{Quality, Schedule, start_of_day};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One fact a learner is scheduled to revisit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewItem {
    /// Item identifier, unique per owner
    pub id: Uuid,
    /// Learner this schedule belongs to
    pub owner_id: Uuid,
    pub prompt: String,
    pub answer: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
    /// Never below 1.3
    pub ease_factor: f64,
    /// Days between the last review and the next one, 0 before the first review
    pub interval_days: i32,
    /// Consecutive successful reviews, reset by any lapse
    pub repetitions: i32,
    /// The item is due once this instant has passed
    pub next_review_at: DateTime<Utc>,
    /// Bumped by every committed update
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewItem {
    /// A freshly assigned item: default schedule, immediately due.
    pub fn new(owner_id: Uuid, id: Uuid, content: ItemContent, now: DateTime<Utc>) -> Self {
        let schedule = Schedule::new_item();
        Self {
            id,
            owner_id,
            prompt: content.prompt,
            answer: content.answer,
            hint: content.hint,
            tags: content.tags,
            ease_factor: schedule.ease_factor,
            interval_days: schedule.interval_days,
            repetitions: schedule.repetitions,
            next_review_at: now,
            revision: 0,
            created_at: now,
            last_reviewed_at: None,
        }
    }

    /// The scheduling state of this item.
    pub const fn schedule(&self) -> Schedule {
        Schedule {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
        }
    }

    /// Copy of this item carrying `schedule` as the result of a review at `reviewed_at`.
    ///
    /// The revision is left untouched; only the store advances it.
    pub fn rescheduled(&self, schedule: Schedule, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            ease_factor: schedule.ease_factor,
            interval_days: schedule.interval_days,
            repetitions: schedule.repetitions,
            next_review_at: schedule.next_review_at(reviewed_at),
            last_reviewed_at: Some(reviewed_at),
            ..self.clone()
        }
    }
}

/// Content payload supplied when an item is assigned. Opaque to scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    pub prompt: String,
    pub answer: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
}

/// One recorded review. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewEvent {
    pub owner_id: Uuid,
    pub item_id: Uuid,
    pub quality: i16,
    pub was_correct: bool,
    pub response_time_seconds: f64,
    pub hints_used: i32,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(
        owner_id: Uuid,
        item_id: Uuid,
        quality: Quality,
        response_time_seconds: f64,
        hints_used: i32,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            item_id,
            quality: i16::from(quality.value()),
            was_correct: quality.is_success(),
            response_time_seconds,
            hints_used,
            reviewed_at,
        }
    }
}

/// Review event tallies for retention figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventCounts {
    pub total: i64,
    pub successful: i64,
}

/// Time ranges used by schedule summaries: today is the half-open
/// `[day_start, day_end)`, the week runs from `day_start` through `week_end`
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
    pub week_end: DateTime<Utc>,
}

impl ScheduleWindow {
    /// The UTC day containing `as_of`, and the next `week_days` days of `as_of`
    /// with today included.
    pub fn around(as_of: DateTime<Utc>, week_days: i64) -> Self {
        let day_start = start_of_day(as_of);
        Self {
            day_start,
            day_end: day_start + Duration::days(1),
            week_end: as_of + Duration::days(week_days),
        }
    }

    pub fn is_today(&self, at: DateTime<Utc>) -> bool {
        self.day_start <= at && at < self.day_end
    }

    pub fn is_this_week(&self, at: DateTime<Utc>) -> bool {
        self.day_start <= at && at <= self.week_end
    }
}

/// Item counts for a [`ScheduleWindow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleCounts {
    pub due_today: i64,
    pub due_this_week: i64,
    /// Items with no current success streak
    pub new_items: i64,
}
