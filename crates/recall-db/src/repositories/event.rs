use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{EventCounts, ReviewEvent};

pub async fn insert_event<'e, E>(executor: E, event: &ReviewEvent) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO review_events (owner_id, item_id, quality, was_correct, response_time_seconds, hints_used, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(event.owner_id)
    .bind(event.item_id)
    .bind(event.quality)
    .bind(event.was_correct)
    .bind(event.response_time_seconds)
    .bind(event.hints_used)
    .bind(event.reviewed_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn count_events_since<'e, E>(
    executor: E,
    owner_id: Uuid,
    since: DateTime<Utc>,
) -> Result<EventCounts, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE was_correct) AS successful
            FROM review_events
            WHERE owner_id = $1 AND reviewed_at >= $2
        "#,
    )
    .bind(owner_id)
    .bind(since)
    .fetch_one(executor)
    .await
}
