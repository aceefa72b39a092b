use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};
use sng_common::SessionId;

use crate::traits::{PaymentPipelineStore, PipelineError};

/// What a polling client learns about its purchase. `status` is always present; the other fields
/// appear once the pipeline reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Read side of the pipeline: answers purchase-status polls.
pub struct StatusApi<B> {
    db: B,
}

impl<B> Debug for StatusApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StatusApi")
    }
}

impl<B> StatusApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> StatusApi<B>
where B: PaymentPipelineStore
{
    /// Looks up the order for a checkout session and reports its owner's status.
    ///
    /// An unknown session, or an order whose owner record has not been written yet, reports
    /// `processing` rather than an error: the poll usually starts before the payment provider's
    /// event has landed, and the client just polls again.
    pub async fn purchase_status(&self, session_id: &SessionId) -> Result<PurchaseStatus, PipelineError> {
        let Some(order) = self.db.fetch_order(session_id).await? else {
            trace!("📊️ No order for session [{session_id}] yet. Reporting processing.");
            return Ok(PurchaseStatus { status: "processing".to_string(), download_url: None, error_message: None });
        };
        let Some(owner) = self.db.fetch_owner(&order.user_id).await? else {
            trace!("📊️ Order [{session_id}] has no owner record yet. Reporting processing.");
            return Ok(PurchaseStatus { status: "processing".to_string(), download_url: None, error_message: None });
        };
        let grant = owner.download_grant();
        Ok(PurchaseStatus {
            status: owner.status.to_string(),
            download_url: grant.map(|g| g.url),
            error_message: owner.error_message,
        })
    }
}
