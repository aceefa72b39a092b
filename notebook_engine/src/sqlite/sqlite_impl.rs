//! `SqliteDatabase` is the concrete backend for the notebook pipeline.
//!
//! It implements the pipeline store, the calendar source and the lookup directory against a single
//! SQLite database, so the ordering guarantee between `apply_paid_event` and `begin_generation`
//! falls out of using one transactional store for both.
use std::{collections::HashMap, fmt::Debug};

use chrono::{Duration, NaiveDate};
use log::debug;
use sng_common::{SessionId, UserId};
use sqlx::SqlitePool;

use super::db::{calendar, db_url, directory, events, new_pool, orders, owners};
use crate::{
    db_types::{CalendarListing, DownloadGrant, OrderRecord, OwnerRecord, PaidEvent, PaidEventOutcome, University},
    traits::{CalendarDayMap, CalendarError, DirectoryStore, PaymentPipelineStore, PipelineError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, PipelineError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PipelineError> {
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The number of distinct provider events applied for this owner.
    pub async fn processed_event_count(&self, user_id: &UserId) -> Result<i64, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        events::processed_event_count(user_id, &mut conn).await
    }
}

impl PaymentPipelineStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn apply_paid_event(&self, event: &PaidEvent) -> Result<PaidEventOutcome, PipelineError> {
        let mut tx = self.pool.begin().await?;
        let fresh = events::record_event_id(&event.user_id, &event.event_id, &mut tx).await?;
        if !fresh {
            // Duplicate delivery. The transaction holds no writes; let it drop.
            debug!("🗃️ Event {} for [{}] was already processed. No-op.", event.event_id, event.user_id);
            return Ok(PaidEventOutcome::Duplicate);
        }
        owners::stamp_paid(event, &mut tx).await?;
        if let Some(session_id) = &event.session_id {
            orders::stamp_paid(session_id, event, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Event {} applied. Owner [{}] is paid_processing.", event.event_id, event.user_id);
        Ok(PaidEventOutcome::Applied)
    }

    async fn begin_generation(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::claim_for_generation(session_id, &mut tx).await? else {
            return Ok(None);
        };
        owners::mark_generating(&order.user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(order))
    }

    async fn complete_generation(
        &self,
        session_id: &SessionId,
        grant: &DownloadGrant,
    ) -> Result<bool, PipelineError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::complete(session_id, &mut tx).await? else {
            debug!("🗃️ Order [{session_id}] was not mid-generation. Completion skipped.");
            return Ok(false);
        };
        owners::complete(&order.user_id, grant, &mut tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn fail_generation(&self, session_id: &SessionId, message: &str) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;
        if let Some(order) = orders::fail(session_id, message, &mut tx).await? {
            owners::fail(&order.user_id, message, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_order(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(session_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_owner(&self, user_id: &UserId) -> Result<Option<OwnerRecord>, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        let owner = owners::fetch_owner(user_id, &mut conn).await?;
        Ok(owner)
    }

    async fn insert_synthetic_session(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        calendar_id: &str,
        fiscal_year: &str,
        buyer_email: Option<&str>,
        bucket: Option<&str>,
    ) -> Result<OrderRecord, PipelineError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_synthetic(
            session_id,
            user_id.as_str(),
            calendar_id,
            fiscal_year,
            buyer_email,
            bucket,
            &mut tx,
        )
        .await?;
        let event = PaidEvent {
            event_id: format!("synthetic-{session_id}"),
            user_id: user_id.clone(),
            calendar_id: calendar_id.to_string(),
            fiscal_year: fiscal_year.to_string(),
            session_id: Some(session_id.clone()),
            buyer_email: buyer_email.map(String::from),
            bucket: bucket.map(String::from),
        };
        owners::stamp_paid(&event, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn orders_awaiting_generation(&self) -> Result<Vec<OrderRecord>, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        orders::awaiting_generation(&mut conn).await
    }

    async fn requeue_stalled_generations(&self, older_than: Duration) -> Result<Vec<OrderRecord>, PipelineError> {
        let mut tx = self.pool.begin().await?;
        let stalled = orders::requeue_stalled(older_than, &mut tx).await?;
        for order in &stalled {
            owners::requeue(&order.user_id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(stalled)
    }

    async fn close(&mut self) -> Result<(), PipelineError> {
        self.pool.close().await;
        Ok(())
    }
}

impl crate::traits::CalendarSource for SqliteDatabase {
    async fn fetch_day_map(
        &self,
        fiscal_year: &str,
        calendar_id: &str,
        dates: &[NaiveDate],
    ) -> Result<CalendarDayMap, CalendarError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CalendarError::FetchError(e.to_string()))?;
        calendar::fetch_day_map(fiscal_year, calendar_id, dates, &mut conn).await
    }

    async fn fetch_term_names(
        &self,
        fiscal_year: &str,
        calendar_id: &str,
    ) -> Result<HashMap<String, String>, CalendarError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CalendarError::FetchError(e.to_string()))?;
        calendar::fetch_term_names(fiscal_year, calendar_id, &mut conn).await
    }
}

impl DirectoryStore for SqliteDatabase {
    async fn fetch_universities(&self) -> Result<Vec<University>, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        directory::fetch_universities(&mut conn).await
    }

    async fn fetch_calendars(&self, university_id: Option<&str>) -> Result<Vec<CalendarListing>, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        directory::fetch_calendars(university_id, &mut conn).await
    }
}
