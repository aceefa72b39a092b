//! Notebook Engine
//!
//! The core logic of the system-notebook pipeline: exactly-once bookkeeping of paid checkout
//! events, the generation worker that turns an academic calendar into a weekly planner PDF, and
//! the signed download grants handed back to buyers. It is HTTP-agnostic; the server crate puts
//! the web surface on top.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@sqlite`]). SQLite is the backing store. Callers should go through
//!    the public APIs rather than the database directly; the exception is the record types in
//!    [`mod@db_types`], which are public.
//! 2. The pipeline public API ([`mod@api`] and [`mod@worker`]). Order flow, status polling,
//!    directory listings and the artifact worker. Backends implement the traits in
//!    [`mod@traits`] to plug in.
//! 3. The concrete collaborators ([`mod@render`] and [`mod@storage`]): the weekly PDF renderer
//!    and the local, HMAC-signing object store.
pub mod api;
pub mod db_types;
pub mod render;
pub mod storage;
pub mod traits;
pub mod worker;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
