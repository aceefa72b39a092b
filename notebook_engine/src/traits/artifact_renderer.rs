use thiserror::Error;

use crate::db_types::PlannerDay;

/// The page-rendering collaborator.
///
/// Given the cover watermark and the fiscal year partitioned into 7-day weeks, produce the
/// complete artifact in one pass. The pipeline treats the day descriptions as opaque content and
/// does not care about the drawing model; it only relies on the page structure: one cover page
/// plus one page per week.
pub trait ArtifactRenderer {
    fn render(&self, watermark: Option<&str>, weeks: &[Vec<PlannerDay>]) -> Result<RenderedArtifact, RenderError>;
}

#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("There is nothing to render: {0}")]
    EmptyInput(String),
    #[error("A week must contain exactly 7 days, got {0}")]
    RaggedWeek(usize),
}
