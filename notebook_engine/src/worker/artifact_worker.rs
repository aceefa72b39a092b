//! The generation worker: claims an order, renders its notebook and publishes the download grant.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sng_common::{FiscalYear, FiscalYearError, SessionId};
use thiserror::Error;

use crate::{
    db_types::{DownloadGrant, OrderRecord},
    traits::{
        ArtifactRenderer,
        CalendarError,
        CalendarSource,
        ObjectStore,
        PaymentPipelineStore,
        PipelineError,
        RenderError,
        StorageError,
    },
    worker::{build_planner_days, fiscal_year_dates, partition_weeks},
};

/// How long a generated download link stays valid.
pub const DOWNLOAD_GRANT_TTL_DAYS: i64 = 7;

/// Drives a single order from `paid_processing` to a terminal state.
///
/// The claim at the start is the concurrency gate: when two triggers race for the same session,
/// one gets the order and the other observes [`GenerationOutcome::NotEligible`] and walks away.
/// Any error after a successful claim marks both records failed before the error propagates.
pub struct ArtifactWorker<B, C, R, S> {
    db: B,
    calendars: C,
    renderer: R,
    storage: S,
}

impl<B, C, R, S> Debug for ArtifactWorker<B, C, R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArtifactWorker")
    }
}

#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The artifact was rendered, stored and the grant committed.
    Completed(DownloadGrant),
    /// The order was not in `paid_processing`; nothing was done.
    NotEligible,
}

impl<B, C, R, S> ArtifactWorker<B, C, R, S>
where
    B: PaymentPipelineStore,
    C: CalendarSource,
    R: ArtifactRenderer,
    S: ObjectStore,
{
    pub fn new(db: B, calendars: C, renderer: R, storage: S) -> Self {
        Self { db, calendars, renderer, storage }
    }

    pub async fn generate(&self, session_id: &SessionId) -> Result<GenerationOutcome, GenerationError> {
        let Some(order) = self.db.begin_generation(session_id).await? else {
            debug!("🕰️ Order [{session_id}] is not awaiting generation. Nothing to do.");
            return Ok(GenerationOutcome::NotEligible);
        };
        info!(
            "🕰️ Generating notebook for order [{session_id}]: calendar {}, fiscal year {}",
            order.calendar_id, order.fiscal_year
        );
        match self.run_pipeline(&order).await {
            Ok(grant) => {
                let committed = self.db.complete_generation(session_id, &grant).await?;
                if !committed {
                    // Lost the terminal race to a watchdog reset or a competing failure mark.
                    warn!("🕰️ Order [{session_id}] left generating_artifact before completion could commit");
                }
                info!("🕰️ Order [{session_id}] completed. Grant expires {}", grant.expires_at);
                Ok(GenerationOutcome::Completed(grant))
            },
            Err(e) => {
                warn!("🕰️ Generation for order [{session_id}] failed: {e}");
                self.db.fail_generation(session_id, &e.to_string()).await?;
                Err(e)
            },
        }
    }

    async fn run_pipeline(&self, order: &OrderRecord) -> Result<DownloadGrant, GenerationError> {
        let fy: FiscalYear = order.fiscal_year.parse()?;
        let dates = fiscal_year_dates(fy);
        let day_map = self.calendars.fetch_day_map(&order.fiscal_year, &order.calendar_id, &dates).await?;
        let term_names = self.calendars.fetch_term_names(&order.fiscal_year, &order.calendar_id).await?;
        let days = build_planner_days(&dates, &day_map, &term_names);
        let weeks = partition_weeks(days);
        let artifact = self.renderer.render(order.buyer_email.as_deref(), &weeks)?;
        trace!("🕰️ Rendered {} pages ({} bytes) for order [{}]", artifact.page_count, artifact.bytes.len(), order.session_id);

        let path = format!(
            "notebooks/{}/{}-{}-{}.pdf",
            order.user_id,
            order.fiscal_year,
            order.calendar_id,
            Utc::now().timestamp_millis()
        );
        self.storage.put(&path, &artifact.bytes, artifact.content_type).await?;
        let expires_at = Utc::now() + Duration::days(DOWNLOAD_GRANT_TTL_DAYS);
        let url = self.storage.signed_url(&path, expires_at)?;
        Ok(DownloadGrant { url, expires_at, path })
    }
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Pipeline store error: {0}")]
    StoreError(#[from] PipelineError),
    #[error("Invalid fiscal year on the order: {0}")]
    InvalidFiscalYear(#[from] FiscalYearError),
    #[error("Calendar data error: {0}")]
    CalendarError(#[from] CalendarError),
    #[error("Rendering error: {0}")]
    RenderError(#[from] RenderError),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}
