use std::fmt::Debug;

use crate::{
    db_types::{CalendarListing, University},
    traits::{DirectoryStore, PipelineError},
};

/// Read-only listings of universities and their published calendars.
pub struct DirectoryApi<B> {
    db: B,
}

impl<B> Debug for DirectoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirectoryApi")
    }
}

impl<B> DirectoryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DirectoryApi<B>
where B: DirectoryStore
{
    pub async fn universities(&self) -> Result<Vec<University>, PipelineError> {
        self.db.fetch_universities().await
    }

    pub async fn calendars(&self, university_id: Option<&str>) -> Result<Vec<CalendarListing>, PipelineError> {
        self.db.fetch_calendars(university_id).await
    }
}
