use chrono::{DateTime, Utc};
use thiserror::Error;

/// The blob storage collaborator. Writes are append-only per path; the worker namespaces paths by
/// owner and generation timestamp so concurrent regenerations never collide.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Issues a URL for `path` that stops validating after `expires_at`.
    fn signed_url(&self, path: &str, expires_at: DateTime<Utc>) -> Result<String, StorageError>;
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Could not store object at {path}: {reason}")]
    PutFailed { path: String, reason: String },
    #[error("Could not sign URL for {0}")]
    SigningFailed(String),
}
