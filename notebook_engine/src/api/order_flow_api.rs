use std::fmt::Debug;

use chrono::Utc;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use sng_common::{SessionId, UserId};

use crate::{
    db_types::{OrderRecord, PaidEvent, PaidEventOutcome},
    traits::{PaymentPipelineStore, PipelineError},
};

/// `OrderFlowApi` is the primary API for recording payment events and minting the synthetic
/// sessions the debug trigger uses.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentPipelineStore
{
    /// Applies a paid checkout event to the bookkeeping records.
    ///
    /// The event id is checked against the owner's processed set inside the same transaction that
    /// writes the status, so redelivered events come back as [`PaidEventOutcome::Duplicate`] and
    /// leave the records untouched.
    pub async fn process_paid_event(&self, event: PaidEvent) -> Result<PaidEventOutcome, PipelineError> {
        let outcome = self.db.apply_paid_event(&event).await?;
        match outcome {
            PaidEventOutcome::Applied => {
                debug!("🔄️📦️ Event [{}] applied for user [{}]", event.event_id, event.user_id)
            },
            PaidEventOutcome::Duplicate => {
                info!("🔄️📦️ Event [{}] is a redelivery for user [{}]. Skipping.", event.event_id, event.user_id)
            },
        }
        Ok(outcome)
    }

    /// Creates a ready-to-generate order with no payment behind it. Used by the debug trigger to
    /// exercise the generation pipeline end to end.
    pub async fn create_debug_session(&self) -> Result<OrderRecord, PipelineError> {
        let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
        let suffix = suffix.to_lowercase();
        let session_id = SessionId::from(format!("debug-session-{suffix}"));
        let user_id = UserId::from(format!("debug-user-{suffix}"));
        let fiscal_year = Utc::now().format("%Y").to_string();
        let order = self
            .db
            .insert_synthetic_session(&session_id, &user_id, "debug-calendar", &fiscal_year, None, None)
            .await?;
        info!("🔄️🪛️ Debug session [{session_id}] created for user [{user_id}]");
        Ok(order)
    }
}
