use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db_types::CalendarDay;

/// Read-only source of academic calendar data, keyed by (fiscal year, calendar id).
#[allow(async_fn_in_trait)]
pub trait CalendarSource {
    /// Fetches day records for the given dates, including the month-level fallback blocks that
    /// cover them.
    async fn fetch_day_map(
        &self,
        fiscal_year: &str,
        calendar_id: &str,
        dates: &[NaiveDate],
    ) -> Result<CalendarDayMap, CalendarError>;

    /// Fetches the term-id → term-name lookup table for the calendar.
    async fn fetch_term_names(
        &self,
        fiscal_year: &str,
        calendar_id: &str,
    ) -> Result<HashMap<String, String>, CalendarError>;
}

/// Two-level day lookup: an exact per-day record wins; otherwise the day's entry inside its month
/// block is used. Records flagged deleted are treated as absent at both levels.
#[derive(Debug, Clone, Default)]
pub struct CalendarDayMap {
    day_level: HashMap<NaiveDate, CalendarDay>,
    month_level: HashMap<String, HashMap<String, CalendarDay>>,
}

impl CalendarDayMap {
    pub fn new(
        day_level: HashMap<NaiveDate, CalendarDay>,
        month_level: HashMap<String, HashMap<String, CalendarDay>>,
    ) -> Self {
        Self { day_level, month_level }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CalendarDay> {
        if let Some(day) = self.day_level.get(&date) {
            return (!day.is_deleted).then_some(day);
        }
        let month_id = date.format("%Y-%m").to_string();
        let iso = date.format("%Y-%m-%d").to_string();
        let day = self.month_level.get(&month_id)?.get(&iso)?;
        (!day.is_deleted).then_some(day)
    }
}

#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("Could not fetch calendar data: {0}")]
    FetchError(String),
    #[error("Malformed month block for {0}: {1}")]
    MalformedMonthBlock(String, String),
}

impl From<sqlx::Error> for CalendarError {
    fn from(e: sqlx::Error) -> Self {
        CalendarError::FetchError(e.to_string())
    }
}
