//! Hand-off of freshly paid orders to the generation worker endpoint.
use log::*;
use thiserror::Error;

use crate::{config::DispatchConfig, data_objects::DispatchRequest};

/// POSTs the order metadata to the configured worker URL with a bearer token.
///
/// When no worker URL is configured the dispatch is skipped with a warning; the sweeper will pick
/// the order up from `paid_processing` instead.
#[derive(Clone)]
pub struct JobDispatcher {
    config: DispatchConfig,
    client: reqwest::Client,
}

impl JobDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    pub fn is_configured(&self) -> bool {
        self.config.worker_url.is_some()
    }

    /// Returns `true` if the job was handed off, `false` if dispatch is not configured.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<bool, DispatchError> {
        let Some(url) = &self.config.worker_url else {
            warn!(
                "💻️ Generation worker endpoint is not configured; skipping dispatch for [{}] and relying on the \
                 out-of-band trigger.",
                request.session_id
            );
            return Ok(false);
        };
        let mut req = self.client.post(url).json(request);
        if let Some(token) = &self.config.worker_token {
            req = req.bearer_auth(token.reveal());
        }
        let response = req.send().await.map_err(|e| DispatchError::RequestFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected(status.as_u16(), body));
        }
        debug!("💻️ Dispatched generation job for [{}]", request.session_id);
        Ok(true)
    }
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Could not reach the generation worker: {0}")]
    RequestFailed(String),
    #[error("The generation worker rejected the job: {0} {1}")]
    Rejected(u16, String),
}
