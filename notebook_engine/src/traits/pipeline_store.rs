use chrono::Duration;
use sng_common::{SessionId, UserId};
use thiserror::Error;

use crate::db_types::{DownloadGrant, OrderRecord, OwnerRecord, PaidEvent, PaidEventOutcome};

/// The transactional state store behind the pipeline: the idempotency ledger and the two mirrored
/// order/owner records, always mutated together.
///
/// Every mutating method is a single atomic transaction. Guarded transitions re-read the current
/// status inside that transaction and degrade to a no-op when the record is not in the expected
/// predecessor state; concurrent callers therefore race safely and exactly one prevails.
#[allow(async_fn_in_trait)]
pub trait PaymentPipelineStore {
    /// The URL of the backing database.
    fn url(&self) -> &str;

    /// Applies a verified paid event: records the event id in the owner's processed set, moves the
    /// owner (and the mirrored order, when a session id was supplied) to `paid_processing`, and
    /// stamps the generation metadata onto both records.
    ///
    /// Exactly-once effect: if the event id is already in the processed set, nothing is written and
    /// [`PaidEventOutcome::Duplicate`] is returned. Under concurrent redelivery of the same event
    /// id, precisely one invocation applies the mutation.
    async fn apply_paid_event(&self, event: &PaidEvent) -> Result<PaidEventOutcome, PipelineError>;

    /// Guarded transition `paid_processing → generating_artifact` on both records.
    ///
    /// Returns the claimed order, or `None` when the order does not exist or is not exactly in
    /// `paid_processing` (another trigger won, or generation already ran). The `None` path has no
    /// side effects.
    async fn begin_generation(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError>;

    /// Guarded transition `generating_artifact → completed`, recording the download grant on the
    /// owner (replacing any previous grant) and mirroring the status onto the order.
    ///
    /// Returns `false` as an idempotent skip when the order was not in `generating_artifact`.
    async fn complete_generation(
        &self,
        session_id: &SessionId,
        grant: &DownloadGrant,
    ) -> Result<bool, PipelineError>;

    /// Moves both records to the terminal `failed` state with a human-readable message. A no-op on
    /// records that already reached a terminal state.
    async fn fail_generation(&self, session_id: &SessionId, message: &str) -> Result<(), PipelineError>;

    /// Fetches the order record for the session, if the webhook has created one yet.
    async fn fetch_order(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError>;

    /// Fetches the owner's aggregate record.
    async fn fetch_owner(&self, user_id: &UserId) -> Result<Option<OwnerRecord>, PipelineError>;

    /// Creates a `paid_processing` order/owner pair without a payment event. Debug tooling only;
    /// the generated order flows through the exact same pipeline as a real one.
    async fn insert_synthetic_session(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        calendar_id: &str,
        fiscal_year: &str,
        buyer_email: Option<&str>,
        bucket: Option<&str>,
    ) -> Result<OrderRecord, PipelineError>;

    /// All orders currently sitting in `paid_processing`, oldest first. The out-of-band trigger
    /// feeds these back into [`Self::begin_generation`].
    async fn orders_awaiting_generation(&self) -> Result<Vec<OrderRecord>, PipelineError>;

    /// Guarded reset of orders stuck in `generating_artifact` for longer than `older_than` back to
    /// `paid_processing`, so the watchdog can re-drive them. Returns the reset orders.
    async fn requeue_stalled_generations(&self, older_than: Duration) -> Result<Vec<OrderRecord>, PipelineError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PipelineError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::DatabaseError(e.to_string())
    }
}
