use log::trace;
use sng_common::UserId;
use sqlx::SqliteConnection;

use crate::traits::PipelineError;

/// Records the event id in the owner's processed set. Returns `false` if the id was already
/// present, in which case nothing was written.
///
/// Embed this inside the transaction that applies the event's side effects: the insert and the
/// state mutation then commit (or vanish) together, which is what makes redelivery safe.
pub async fn record_event_id(
    user_id: &UserId,
    event_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, PipelineError> {
    let result = sqlx::query("INSERT INTO processed_events (user_id, event_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id.as_str())
        .bind(event_id)
        .execute(conn)
        .await?;
    let fresh = result.rows_affected() > 0;
    trace!("🗃️ Event {event_id} for [{user_id}] recorded. fresh: {fresh}");
    Ok(fresh)
}

/// The number of distinct event ids processed for the owner.
pub async fn processed_event_count(user_id: &UserId, conn: &mut SqliteConnection) -> Result<i64, PipelineError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_events WHERE user_id = $1")
        .bind(user_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}
