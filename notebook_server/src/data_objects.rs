use std::collections::HashMap;

use notebook_engine::db_types::PaidEvent;
use serde::{Deserialize, Serialize};
use sng_common::{SessionId, UserId};

/// Provider event type the pipeline acts on. Anything else is acknowledged and dropped.
pub const SUPPORTED_EVENT_TYPE: &str = "checkout.session.completed";

//--------------------------------------   Webhook payload   ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: ProviderEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventData {
    pub object: CheckoutObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutObject {
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, Option<String>>>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

impl ProviderEvent {
    pub fn is_supported(&self) -> bool {
        self.event_type == SUPPORTED_EVENT_TYPE
    }

    /// Extracts the pipeline event from the checkout metadata.
    ///
    /// `userId`, `calendarId` and `fiscalYear` are mandatory (trimmed, non-empty). The session id
    /// falls back to the checkout object id, and the buyer email prefers `customer_details.email`
    /// over the top-level `customer_email`. Returns `None` when a mandatory field is absent.
    pub fn paid_event(&self, bucket: Option<&str>) -> Option<PaidEvent> {
        let object = &self.data.object;
        let metadata = object.metadata.as_ref()?;
        let field = |name: &str| -> Option<String> {
            metadata.get(name).and_then(|v| v.as_deref()).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
        };
        let user_id = field("userId")?;
        let calendar_id = field("calendarId")?;
        let fiscal_year = field("fiscalYear")?;
        let session_id = field("sessionId").or_else(|| object.id.clone()).map(SessionId::from);
        let buyer_email = object
            .customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(object.customer_email.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Some(PaidEvent {
            event_id: self.id.clone(),
            user_id: UserId::from(user_id),
            calendar_id,
            fiscal_year,
            session_id,
            buyer_email,
            bucket: bucket.map(String::from),
        })
    }
}

//--------------------------------------      Responses      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

impl ReceivedResponse {
    pub fn acked() -> Self {
        Self { received: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub session_id: SessionId,
    pub user_id: UserId,
}

//--------------------------------------   Query / dispatch   --------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub university_id: Option<String>,
}

/// Body POSTed to the generation worker endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub user_id: UserId,
    pub calendar_id: String,
    pub fiscal_year: String,
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    pub source: String,
}

impl DispatchRequest {
    pub fn from_event(event: &PaidEvent, session_id: &SessionId, source: &str) -> Self {
        Self {
            user_id: event.user_id.clone(),
            calendar_id: event.calendar_id.clone(),
            fiscal_year: event.fiscal_year.clone(),
            session_id: session_id.clone(),
            buyer_email: event.buyer_email.clone(),
            source: source.to_string(),
        }
    }
}
