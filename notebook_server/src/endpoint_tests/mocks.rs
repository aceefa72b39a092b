use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use mockall::mock;
use notebook_engine::{
    db_types::{CalendarListing, DownloadGrant, OrderRecord, OwnerRecord, PaidEvent, PaidEventOutcome, University},
    traits::{CalendarDayMap, CalendarError, CalendarSource, DirectoryStore, PaymentPipelineStore, PipelineError},
};
use sng_common::{SessionId, UserId};

mock! {
    pub PipelineStore {}
    impl PaymentPipelineStore for PipelineStore {
        fn url(&self) -> &str;
        async fn apply_paid_event(&self, event: &PaidEvent) -> Result<PaidEventOutcome, PipelineError>;
        async fn begin_generation(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError>;
        async fn complete_generation(&self, session_id: &SessionId, grant: &DownloadGrant) -> Result<bool, PipelineError>;
        async fn fail_generation(&self, session_id: &SessionId, message: &str) -> Result<(), PipelineError>;
        async fn fetch_order(&self, session_id: &SessionId) -> Result<Option<OrderRecord>, PipelineError>;
        async fn fetch_owner(&self, user_id: &UserId) -> Result<Option<OwnerRecord>, PipelineError>;
        async fn insert_synthetic_session<'a, 'b>(
            &self,
            session_id: &SessionId,
            user_id: &UserId,
            calendar_id: &str,
            fiscal_year: &str,
            buyer_email: Option<&'a str>,
            bucket: Option<&'b str>,
        ) -> Result<OrderRecord, PipelineError>;
        async fn orders_awaiting_generation(&self) -> Result<Vec<OrderRecord>, PipelineError>;
        async fn requeue_stalled_generations(&self, older_than: Duration) -> Result<Vec<OrderRecord>, PipelineError>;
    }
}

mock! {
    pub Calendars {}
    impl CalendarSource for Calendars {
        async fn fetch_day_map(
            &self,
            fiscal_year: &str,
            calendar_id: &str,
            dates: &[NaiveDate],
        ) -> Result<CalendarDayMap, CalendarError>;
        async fn fetch_term_names(
            &self,
            fiscal_year: &str,
            calendar_id: &str,
        ) -> Result<HashMap<String, String>, CalendarError>;
    }
}

mock! {
    pub Directory {}
    impl DirectoryStore for Directory {
        async fn fetch_universities(&self) -> Result<Vec<University>, PipelineError>;
        async fn fetch_calendars<'a>(&self, university_id: Option<&'a str>) -> Result<Vec<CalendarListing>, PipelineError>;
    }
}
