//! Behaviour traits at the seams of the pipeline.
//!
//! The worker and the HTTP layer only ever talk to these traits. Concrete backends (the SQLite
//! store, the local object store, the weekly PDF renderer) implement them, and the endpoint tests
//! mock them.

mod artifact_renderer;
mod calendar_source;
mod directory_store;
mod object_store;
mod pipeline_store;

pub use artifact_renderer::{ArtifactRenderer, RenderError, RenderedArtifact};
pub use calendar_source::{CalendarDayMap, CalendarError, CalendarSource};
pub use directory_store::DirectoryStore;
pub use object_store::{ObjectStore, StorageError};
pub use pipeline_store::{PaymentPipelineStore, PipelineError};
