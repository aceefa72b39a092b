use chrono::Duration;
use log::{debug, trace};
use sng_common::SessionId;
use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderRecord, PaidEvent},
    traits::PipelineError,
};

/// Upserts the order mirror for the event's session into `paid_processing`. The webhook may
/// arrive more than once with different event ids for the same session; the stamp is simply
/// rewritten, keeping both records in agreement.
pub async fn stamp_paid(
    session_id: &SessionId,
    event: &PaidEvent,
    conn: &mut SqliteConnection,
) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
            INSERT INTO orders (
                session_id,
                user_id,
                status,
                status_updated_at,
                calendar_id,
                fiscal_year,
                buyer_email,
                bucket,
                updated_at
            ) VALUES ($1, $2, 'paid_processing', CURRENT_TIMESTAMP, $3, $4, $5, $6, CURRENT_TIMESTAMP)
            ON CONFLICT (session_id) DO UPDATE SET
                user_id = excluded.user_id,
                status = 'paid_processing',
                status_updated_at = CURRENT_TIMESTAMP,
                calendar_id = excluded.calendar_id,
                fiscal_year = excluded.fiscal_year,
                buyer_email = excluded.buyer_email,
                bucket = excluded.bucket,
                error_message = NULL,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(session_id.as_str())
    .bind(event.user_id.as_str())
    .bind(&event.calendar_id)
    .bind(&event.fiscal_year)
    .bind(&event.buyer_email)
    .bind(&event.bucket)
    .execute(conn)
    .await?;
    debug!("🗃️ Order [{session_id}] stamped as paid_processing");
    Ok(())
}

pub async fn fetch_order(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE session_id = $1")
        .bind(session_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The guarded claim: `paid_processing → generating_artifact`, returning the claimed order.
///
/// The status predicate makes this safe against concurrent triggers; whichever caller's UPDATE
/// matches the row wins, everyone else gets `None` back and must not generate.
pub async fn claim_for_generation(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, PipelineError> {
    let order: Option<OrderRecord> = sqlx::query_as(
        "UPDATE orders SET status = 'generating_artifact', status_updated_at = CURRENT_TIMESTAMP, \
         updated_at = CURRENT_TIMESTAMP WHERE session_id = $1 AND status = 'paid_processing' RETURNING *",
    )
    .bind(session_id.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Order [{session_id}] generation claim: {}", if order.is_some() { "won" } else { "lost" });
    Ok(order)
}

/// `generating_artifact → completed`. Returns the completed order, or `None` as an idempotent
/// skip when the order was not mid-generation.
pub async fn complete(
    session_id: &SessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, PipelineError> {
    let order: Option<OrderRecord> = sqlx::query_as(
        "UPDATE orders SET status = 'completed', status_updated_at = CURRENT_TIMESTAMP, error_message = NULL, \
         updated_at = CURRENT_TIMESTAMP WHERE session_id = $1 AND status = 'generating_artifact' RETURNING *",
    )
    .bind(session_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Terminal failure with a recorded message. Returns the failed order so the caller can mirror the
/// update onto the owner. No-op on records already in a terminal state.
pub async fn fail(
    session_id: &SessionId,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRecord>, PipelineError> {
    let order: Option<OrderRecord> = sqlx::query_as(
        "UPDATE orders SET status = 'failed', status_updated_at = CURRENT_TIMESTAMP, error_message = $2, \
         updated_at = CURRENT_TIMESTAMP WHERE session_id = $1 AND status NOT IN ('completed', 'failed') RETURNING *",
    )
    .bind(session_id.as_str())
    .bind(message)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// All orders waiting for a worker, oldest first.
pub async fn awaiting_generation(conn: &mut SqliteConnection) -> Result<Vec<OrderRecord>, PipelineError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status = 'paid_processing' ORDER BY created_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Resets orders that have sat in `generating_artifact` beyond `limit` back to `paid_processing`.
/// A worker that is still alive past the limit has already been written off by its host.
pub async fn requeue_stalled(
    limit: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderRecord>, PipelineError> {
    let rows = sqlx::query_as(
        "UPDATE orders SET status = 'paid_processing', status_updated_at = CURRENT_TIMESTAMP, \
         updated_at = CURRENT_TIMESTAMP WHERE status = 'generating_artifact' AND \
         (unixepoch(CURRENT_TIMESTAMP) - unixepoch(status_updated_at)) > $1 RETURNING *;",
    )
    .bind(limit.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Inserts a ready-to-generate order without a payment event (debug trigger path).
pub async fn insert_synthetic(
    session_id: &SessionId,
    user_id: &str,
    calendar_id: &str,
    fiscal_year: &str,
    buyer_email: Option<&str>,
    bucket: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<OrderRecord, PipelineError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (session_id, user_id, status, calendar_id, fiscal_year, buyer_email, bucket)
            VALUES ($1, $2, 'paid_processing', $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(session_id.as_str())
    .bind(user_id)
    .bind(calendar_id)
    .bind(fiscal_year)
    .bind(buyer_email)
    .bind(bucket)
    .fetch_one(conn)
    .await?;
    Ok(order)
}
