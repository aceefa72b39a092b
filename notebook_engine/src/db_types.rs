use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sng_common::{SessionId, UserId};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderStatus       -------------------------------------------------------
/// The pipeline's finite state machine. Transitions only ever move forward; `Failed` is terminal
/// and reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// An order exists, but no payment event has been applied yet.
    Received,
    /// The paid event has been recorded. The order is waiting for a worker to pick it up.
    PaidProcessing,
    /// A worker has claimed the order and is rendering the artifact.
    GeneratingArtifact,
    /// The artifact was uploaded and a download grant issued.
    Completed,
    /// Generation failed. The error message on the record says why.
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Received => "received",
            OrderStatus::PaidProcessing => "paid_processing",
            OrderStatus::GeneratingArtifact => "generating_artifact",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "paid_processing" => Ok(Self::PaidProcessing),
            "generating_artifact" => Ok(Self::GeneratingArtifact),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status in the database: {value}. Defaulting to Received");
            OrderStatus::Received
        })
    }
}

//--------------------------------------    DownloadGrant      -------------------------------------------------------
/// A time-limited authorization to fetch the generated artifact. Replaced wholesale on
/// regeneration, never appended to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadGrant {
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub path: String,
}

//--------------------------------------      PaidEvent        -------------------------------------------------------
/// A verified, metadata-complete payment event, ready for the idempotency ledger.
///
/// Construction implies the signature already checked out and the mandatory metadata fields were
/// present. The `session_id` is optional: the provider may omit it, in which case only the owner
/// record is stamped.
#[derive(Debug, Clone)]
pub struct PaidEvent {
    /// Opaque, provider-assigned event id. The dedup key.
    pub event_id: String,
    pub user_id: UserId,
    pub calendar_id: String,
    pub fiscal_year: String,
    pub session_id: Option<SessionId>,
    pub buyer_email: Option<String>,
    /// Storage bucket/namespace the artifact should land in, stamped through to the worker.
    pub bucket: Option<String>,
}

/// The result of pushing a [`PaidEvent`] through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaidEventOutcome {
    /// First sighting of this event id. The state transition was committed.
    Applied,
    /// The event id was already in the processed set. Nothing was written.
    Duplicate,
}

//--------------------------------------     OwnerRecord       -------------------------------------------------------
/// The paying user's aggregate record. Mirrors the order status and carries the download grant.
#[derive(Debug, Clone, FromRow)]
pub struct OwnerRecord {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub status_updated_at: DateTime<Utc>,
    pub session_id: Option<SessionId>,
    pub calendar_id: Option<String>,
    pub fiscal_year: Option<String>,
    pub buyer_email: Option<String>,
    pub bucket: Option<String>,
    pub last_event_id: Option<String>,
    pub error_message: Option<String>,
    pub download_url: Option<String>,
    pub download_expires_at: Option<DateTime<Utc>>,
    pub download_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnerRecord {
    /// The current download grant, if generation has succeeded at least once.
    pub fn download_grant(&self) -> Option<DownloadGrant> {
        match (&self.download_url, &self.download_expires_at, &self.download_path) {
            (Some(url), Some(expires_at), Some(path)) => {
                Some(DownloadGrant { url: url.clone(), expires_at: *expires_at, path: path.clone() })
            },
            _ => None,
        }
    }
}

//--------------------------------------     OrderRecord       -------------------------------------------------------
/// One purchase, keyed by the provider's checkout session id.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub status_updated_at: DateTime<Utc>,
    pub calendar_id: String,
    pub fiscal_year: String,
    pub buyer_email: Option<String>,
    pub bucket: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     CalendarDay       -------------------------------------------------------
/// A single day's worth of academic calendar data.
///
/// Day-level rows and the JSON entries inside month blocks both deserialize into this shape.
/// A record with `is_deleted` set is treated everywhere as if it did not exist.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarDay {
    pub is_holiday: bool,
    pub day_type: Option<String>,
    /// Class timetable weekday, 1 = Monday .. 7 = Sunday.
    pub class_weekday: Option<i64>,
    /// Running count of class days for that timetable weekday.
    pub class_order: Option<i64>,
    pub term_id: Option<String>,
    pub holiday_name: Option<String>,
    pub is_deleted: bool,
}

//--------------------------------------     PlannerDay        -------------------------------------------------------
/// One rendered day cell: the opaque content handed to the page renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerDay {
    pub date: NaiveDate,
    pub is_holiday: bool,
    /// Slot A: the explicit national holiday name, or empty.
    pub description_a: String,
    /// Slot B: term and class-day information, or empty.
    pub description_b: String,
}

//--------------------------------------   Directory records   -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct University {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListing {
    pub id: String,
    pub university_id: String,
    pub fiscal_year: String,
    pub name: String,
}
