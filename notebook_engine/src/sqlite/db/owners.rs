use log::{debug, trace};
use sng_common::UserId;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DownloadGrant, OwnerRecord, PaidEvent},
    traits::PipelineError,
};

/// Upserts the owner record into `paid_processing` and stamps the generation metadata from the
/// event. Called only after the event id cleared the dedup ledger.
pub async fn stamp_paid(event: &PaidEvent, conn: &mut SqliteConnection) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
            INSERT INTO owners (
                user_id,
                status,
                status_updated_at,
                session_id,
                calendar_id,
                fiscal_year,
                buyer_email,
                bucket,
                last_event_id,
                updated_at
            ) VALUES ($1, 'paid_processing', CURRENT_TIMESTAMP, $2, $3, $4, $5, $6, $7, CURRENT_TIMESTAMP)
            ON CONFLICT (user_id) DO UPDATE SET
                status = 'paid_processing',
                status_updated_at = CURRENT_TIMESTAMP,
                session_id = excluded.session_id,
                calendar_id = excluded.calendar_id,
                fiscal_year = excluded.fiscal_year,
                buyer_email = excluded.buyer_email,
                bucket = excluded.bucket,
                last_event_id = excluded.last_event_id,
                error_message = NULL,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(event.user_id.as_str())
    .bind(event.session_id.as_ref().map(|s| s.as_str()))
    .bind(&event.calendar_id)
    .bind(&event.fiscal_year)
    .bind(&event.buyer_email)
    .bind(&event.bucket)
    .bind(&event.event_id)
    .execute(conn)
    .await?;
    debug!("🗃️ Owner [{}] stamped as paid_processing for event {}", event.user_id, event.event_id);
    Ok(())
}

pub async fn fetch_owner(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<OwnerRecord>, sqlx::Error> {
    let owner = sqlx::query_as("SELECT * FROM owners WHERE user_id = $1")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(owner)
}

/// Mirror of the order-side `paid_processing → generating_artifact` claim. Guarded on the same
/// predecessor state, so a replayed trigger that lost the order-side race changes nothing here
/// either.
pub async fn mark_generating(user_id: &UserId, conn: &mut SqliteConnection) -> Result<(), PipelineError> {
    let result = sqlx::query(
        "UPDATE owners SET status = 'generating_artifact', status_updated_at = CURRENT_TIMESTAMP, \
         updated_at = CURRENT_TIMESTAMP WHERE user_id = $1 AND status = 'paid_processing'",
    )
    .bind(user_id.as_str())
    .execute(conn)
    .await?;
    trace!("🗃️ Owner [{user_id}] marked generating ({} row)", result.rows_affected());
    Ok(())
}

/// `generating_artifact → completed`, replacing the download grant in the same statement.
pub async fn complete(
    user_id: &UserId,
    grant: &DownloadGrant,
    conn: &mut SqliteConnection,
) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
            UPDATE owners SET
                status = 'completed',
                status_updated_at = CURRENT_TIMESTAMP,
                error_message = NULL,
                download_url = $2,
                download_expires_at = $3,
                download_path = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1 AND status = 'generating_artifact';
        "#,
    )
    .bind(user_id.as_str())
    .bind(&grant.url)
    .bind(grant.expires_at)
    .bind(&grant.path)
    .execute(conn)
    .await?;
    debug!("🗃️ Owner [{user_id}] completed. Download grant expires {}", grant.expires_at);
    Ok(())
}

/// Terminal failure. No-op once the owner already reached a terminal state.
pub async fn fail(user_id: &UserId, message: &str, conn: &mut SqliteConnection) -> Result<(), PipelineError> {
    sqlx::query(
        "UPDATE owners SET status = 'failed', status_updated_at = CURRENT_TIMESTAMP, error_message = $2, \
         updated_at = CURRENT_TIMESTAMP WHERE user_id = $1 AND status NOT IN ('completed', 'failed')",
    )
    .bind(user_id.as_str())
    .bind(message)
    .execute(conn)
    .await?;
    Ok(())
}

/// Watchdog reset mirror: hand a stalled owner back to the `paid_processing` queue.
pub async fn requeue(user_id: &UserId, conn: &mut SqliteConnection) -> Result<(), PipelineError> {
    sqlx::query(
        "UPDATE owners SET status = 'paid_processing', status_updated_at = CURRENT_TIMESTAMP, \
         updated_at = CURRENT_TIMESTAMP WHERE user_id = $1 AND status = 'generating_artifact'",
    )
    .bind(user_id.as_str())
    .execute(conn)
    .await?;
    Ok(())
}
