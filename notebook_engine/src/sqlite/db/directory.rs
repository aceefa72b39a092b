use sqlx::SqliteConnection;

use crate::{
    db_types::{CalendarListing, University},
    traits::PipelineError,
};

pub async fn fetch_universities(conn: &mut SqliteConnection) -> Result<Vec<University>, PipelineError> {
    let rows = sqlx::query_as("SELECT id, name, short_name FROM universities ORDER BY name ASC")
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn fetch_calendars(
    university_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Vec<CalendarListing>, PipelineError> {
    let rows = match university_id {
        Some(uid) => {
            sqlx::query_as(
                "SELECT id, university_id, fiscal_year, name FROM calendars WHERE university_id = $1 ORDER BY name ASC",
            )
            .bind(uid)
            .fetch_all(conn)
            .await?
        },
        None => {
            sqlx::query_as("SELECT id, university_id, fiscal_year, name FROM calendars ORDER BY name ASC")
                .fetch_all(conn)
                .await?
        },
    };
    Ok(rows)
}
