use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{ReviewItem, ScheduleCounts, ScheduleWindow};

/// Insert a new item. Returns `false` if `(owner_id, id)` is already taken.
pub async fn insert_item<'e, E>(executor: E, item: &ReviewItem) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO review_items (
                owner_id, id, prompt, answer, hint, tags,
                ease_factor, interval_days, repetitions, next_review_at,
                revision, created_at, last_reviewed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (owner_id, id) DO NOTHING
        "#,
    )
    .bind(item.owner_id)
    .bind(item.id)
    .bind(&item.prompt)
    .bind(&item.answer)
    .bind(&item.hint)
    .bind(&item.tags)
    .bind(item.ease_factor)
    .bind(item.interval_days)
    .bind(item.repetitions)
    .bind(item.next_review_at)
    .bind(item.revision)
    .bind(item.created_at)
    .bind(item.last_reviewed_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_item<'e, E>(
    executor: E,
    owner_id: Uuid,
    item_id: Uuid,
) -> Result<Option<ReviewItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, prompt, answer, hint, tags,
                   ease_factor, interval_days, repetitions, next_review_at,
                   revision, created_at, last_reviewed_at
            FROM review_items
            WHERE owner_id = $1 AND id = $2
        "#,
    )
    .bind(owner_id)
    .bind(item_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_revision<'e, E>(
    executor: E,
    owner_id: Uuid,
    item_id: Uuid,
) -> Result<Option<i64>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT revision
            FROM review_items
            WHERE owner_id = $1 AND id = $2
        "#,
    )
    .bind(owner_id)
    .bind(item_id)
    .fetch_optional(executor)
    .await
}

/// Most overdue first, ties broken by id.
pub async fn find_due_items<'e, E>(
    executor: E,
    owner_id: Uuid,
    as_of: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ReviewItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, owner_id, prompt, answer, hint, tags,
                   ease_factor, interval_days, repetitions, next_review_at,
                   revision, created_at, last_reviewed_at
            FROM review_items
            WHERE owner_id = $1 AND next_review_at <= $2
            ORDER BY next_review_at ASC, id ASC
            LIMIT $3
        "#,
    )
    .bind(owner_id)
    .bind(as_of)
    .bind(limit)
    .fetch_all(executor)
    .await
}

pub async fn owner_has_items<'e, E>(executor: E, owner_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM review_items
                WHERE owner_id = $1
            )
        "#,
    )
    .bind(owner_id)
    .fetch_one(executor)
    .await
}

/// Write the schedule fields of `item` if the stored revision is still
/// `expected_revision`, bumping it by one.
///
/// Returns `None` when no row matched (stale revision or missing item).
pub async fn update_item_if_revision<'e, E>(
    executor: E,
    item: &ReviewItem,
    expected_revision: i64,
) -> Result<Option<ReviewItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE review_items
            SET ease_factor = $4,
                interval_days = $5,
                repetitions = $6,
                next_review_at = $7,
                last_reviewed_at = $8,
                revision = revision + 1
            WHERE owner_id = $1 AND id = $2 AND revision = $3
            RETURNING id, owner_id, prompt, answer, hint, tags,
                      ease_factor, interval_days, repetitions, next_review_at,
                      revision, created_at, last_reviewed_at
        "#,
    )
    .bind(item.owner_id)
    .bind(item.id)
    .bind(expected_revision)
    .bind(item.ease_factor)
    .bind(item.interval_days)
    .bind(item.repetitions)
    .bind(item.next_review_at)
    .bind(item.last_reviewed_at)
    .fetch_optional(executor)
    .await
}

pub async fn count_schedule<'e, E>(
    executor: E,
    owner_id: Uuid,
    window: ScheduleWindow,
) -> Result<ScheduleCounts, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                COUNT(*) FILTER (WHERE next_review_at >= $2 AND next_review_at < $3) AS due_today,
                COUNT(*) FILTER (WHERE next_review_at >= $2 AND next_review_at <= $4) AS due_this_week,
                COUNT(*) FILTER (WHERE repetitions = 0) AS new_items
            FROM review_items
            WHERE owner_id = $1
        "#,
    )
    .bind(owner_id)
    .bind(window.day_start)
    .bind(window.day_end)
    .bind(window.week_end)
    .fetch_one(executor)
    .await
}

/// Returns `false` if there was nothing to delete.
pub async fn delete_item<'e, E>(
    executor: E,
    owner_id: Uuid,
    item_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM review_items
            WHERE owner_id = $1 AND id = $2
        "#,
    )
    .bind(owner_id)
    .bind(item_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
