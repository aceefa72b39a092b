use crate::{
    db_types::{CalendarListing, University},
    traits::PipelineError,
};

/// Plain read-only queries backing the university/calendar lookup directory.
#[allow(async_fn_in_trait)]
pub trait DirectoryStore {
    async fn fetch_universities(&self) -> Result<Vec<University>, PipelineError>;

    /// Calendars, optionally narrowed to one university.
    async fn fetch_calendars(&self, university_id: Option<&str>) -> Result<Vec<CalendarListing>, PipelineError>;
}
