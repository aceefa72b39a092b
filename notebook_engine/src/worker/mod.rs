mod artifact_worker;
mod day_plan;
mod fiscal_calendar;

pub use artifact_worker::{ArtifactWorker, GenerationError, GenerationOutcome};
pub use day_plan::{build_planner_days, weekday_label_ja};
pub use fiscal_calendar::{fiscal_year_dates, fiscal_year_span, partition_weeks};
