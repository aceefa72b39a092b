//! Filesystem-backed object store with HMAC-signed download URLs.
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use sng_common::Secret;

use crate::traits::{ObjectStore, StorageError};

type HmacSha256 = Hmac<Sha256>;

/// Stores artifacts under a local root directory and issues URLs of the form
/// `{base_url}/{path}?expires={unix}&sig={hex}`. The signature covers the path and the expiry, so
/// neither can be altered without the signing key.
#[derive(Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
    signing_key: Secret<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>, signing_key: Secret<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { root: root.into(), base_url, signing_key }
    }

    fn signature(&self, path: &str, expires: i64) -> Result<String, StorageError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.reveal().as_bytes())
            .map_err(|_| StorageError::SigningFailed(path.to_string()))?;
        mac.update(format!("{path}|{expires}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks a previously issued `(path, expires, sig)` triple against the key and the clock.
    pub fn verify_signed(&self, path: &str, expires: i64, sig: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(sig) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.signing_key.reveal().as_bytes()) else {
            return false;
        };
        mac.update(format!("{path}|{expires}").as_bytes());
        mac.verify_slice(&sig_bytes).is_ok()
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        let escapes = rel.components().any(|c| !matches!(c, Component::Normal(_)));
        if escapes || rel.as_os_str().is_empty() {
            return Err(StorageError::PutFailed { path: path.to_string(), reason: "invalid object path".to_string() });
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::PutFailed { path: path.to_string(), reason: e.to_string() })?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| StorageError::PutFailed { path: path.to_string(), reason: e.to_string() })?;
        debug!("📦️ Stored {} bytes of {content_type} at {path}", bytes.len());
        Ok(())
    }

    fn signed_url(&self, path: &str, expires_at: DateTime<Utc>) -> Result<String, StorageError> {
        let expires = expires_at.timestamp();
        let sig = self.signature(path, expires)?;
        Ok(format!("{}/{path}?expires={expires}&sig={sig}", self.base_url))
    }
}
