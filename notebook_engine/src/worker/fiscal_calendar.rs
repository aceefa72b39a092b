//! Date arithmetic for the Japanese academic year.
//!
//! The planner always covers whole weeks, Monday through Sunday. The span for fiscal year Y runs
//! from the Monday on or before 1 April Y to the Sunday on or after 31 March Y+1, so the day count
//! is a multiple of seven by construction.
use chrono::{Datelike, Duration, NaiveDate};
use sng_common::FiscalYear;

use crate::db_types::PlannerDay;

/// Inclusive start and end of the planner span for a fiscal year.
pub fn fiscal_year_span(fy: FiscalYear) -> (NaiveDate, NaiveDate) {
    let april_first = NaiveDate::from_ymd_opt(fy.starting_year(), 4, 1).unwrap_or_default();
    let start = april_first - Duration::days(i64::from(april_first.weekday().num_days_from_monday()));
    let march_last = NaiveDate::from_ymd_opt(fy.ending_year(), 3, 31).unwrap_or_default();
    let days_to_sunday = 6 - i64::from(march_last.weekday().num_days_from_monday());
    let end = march_last + Duration::days(days_to_sunday);
    (start, end)
}

/// Every date in the planner span, in order.
pub fn fiscal_year_dates(fy: FiscalYear) -> Vec<NaiveDate> {
    let (start, end) = fiscal_year_span(fy);
    let n = (end - start).num_days() + 1;
    (0..n).map(|i| start + Duration::days(i)).collect()
}

/// Splits the day sequence into Monday-to-Sunday weeks, one page each.
pub fn partition_weeks(days: Vec<PlannerDay>) -> Vec<Vec<PlannerDay>> {
    days.chunks(7).map(<[PlannerDay]>::to_vec).collect()
}
