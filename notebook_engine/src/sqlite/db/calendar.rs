use std::collections::HashMap;

use chrono::NaiveDate;
use log::trace;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::CalendarDay,
    traits::{CalendarDayMap, CalendarError},
};

#[derive(Debug, FromRow)]
struct CalendarDayRow {
    iso_date: String,
    is_holiday: bool,
    day_type: Option<String>,
    class_weekday: Option<i64>,
    class_order: Option<i64>,
    term_id: Option<String>,
    holiday_name: Option<String>,
    is_deleted: bool,
}

impl From<CalendarDayRow> for CalendarDay {
    fn from(row: CalendarDayRow) -> Self {
        CalendarDay {
            is_holiday: row.is_holiday,
            day_type: row.day_type,
            class_weekday: row.class_weekday,
            class_order: row.class_order,
            term_id: row.term_id,
            holiday_name: row.holiday_name,
            is_deleted: row.is_deleted,
        }
    }
}

/// Loads the two lookup levels for the requested dates: exact day rows, and the JSON month blocks
/// covering the months those dates fall in. Deleted-record filtering happens in
/// [`CalendarDayMap::get`], not here, so a deleted day row still masks its month-block entry.
pub async fn fetch_day_map(
    fiscal_year: &str,
    calendar_id: &str,
    dates: &[NaiveDate],
    conn: &mut SqliteConnection,
) -> Result<CalendarDayMap, CalendarError> {
    if dates.is_empty() {
        return Ok(CalendarDayMap::default());
    }
    let first = dates.iter().min().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let last = dates.iter().max().map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();

    let day_rows: Vec<CalendarDayRow> = sqlx::query_as(
        r#"
            SELECT iso_date, is_holiday, day_type, class_weekday, class_order, term_id, holiday_name, is_deleted
            FROM calendar_days
            WHERE fiscal_year = $1 AND calendar_id = $2 AND iso_date BETWEEN $3 AND $4
        "#,
    )
    .bind(fiscal_year)
    .bind(calendar_id)
    .bind(&first)
    .bind(&last)
    .fetch_all(&mut *conn)
    .await?;
    let mut day_level = HashMap::with_capacity(day_rows.len());
    for row in day_rows {
        let Ok(date) = row.iso_date.parse::<NaiveDate>() else {
            trace!("🗃️ Skipping calendar day row with unparseable date {}", row.iso_date);
            continue;
        };
        day_level.insert(date, CalendarDay::from(row));
    }

    let mut month_ids: Vec<String> = dates.iter().map(|d| d.format("%Y-%m").to_string()).collect();
    month_ids.sort();
    month_ids.dedup();

    let mut builder = QueryBuilder::new(
        "SELECT month_id, days FROM calendar_month_blocks WHERE fiscal_year = ",
    );
    builder.push_bind(fiscal_year);
    builder.push(" AND calendar_id = ");
    builder.push_bind(calendar_id);
    builder.push(" AND month_id IN (");
    let mut in_list = builder.separated(", ");
    for month_id in &month_ids {
        in_list.push_bind(month_id);
    }
    builder.push(")");
    let blocks: Vec<(String, String)> = builder.build_query_as().fetch_all(&mut *conn).await?;

    let mut month_level = HashMap::with_capacity(blocks.len());
    for (month_id, days_json) in blocks {
        let days: HashMap<String, CalendarDay> = serde_json::from_str(&days_json)
            .map_err(|e| CalendarError::MalformedMonthBlock(month_id.clone(), e.to_string()))?;
        month_level.insert(month_id, days);
    }

    trace!(
        "🗃️ Calendar {calendar_id}/{fiscal_year}: {} day rows, {} month blocks loaded",
        day_level.len(),
        month_level.len()
    );
    Ok(CalendarDayMap::new(day_level, month_level))
}

pub async fn fetch_term_names(
    fiscal_year: &str,
    calendar_id: &str,
    conn: &mut SqliteConnection,
) -> Result<HashMap<String, String>, CalendarError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT term_id, term_name FROM calendar_terms WHERE fiscal_year = $1 AND calendar_id = $2")
            .bind(fiscal_year)
            .bind(calendar_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(id, name)| (id, name.trim().to_string())).collect())
}
