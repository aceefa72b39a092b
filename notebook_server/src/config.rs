use std::env;

use chrono::Duration;
use log::*;
use sng_common::{parse_boolean_flag, Secret};

const DEFAULT_SNG_HOST: &str = "127.0.0.1";
const DEFAULT_SNG_PORT: u16 = 8360;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::seconds(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret for verifying payment provider webhook signatures. When unset, webhook calls
    /// are rejected with a 500.
    pub webhook_secret: Option<Secret<String>>,
    /// Where the watchdog sweeper and the generation endpoint hand work off to. When unset, the
    /// webhook skips dispatch and relies on the sweeper to pick the order up.
    pub dispatch: DispatchConfig,
    /// Token required (as `x-debug-token`) for the debug trigger when running in production.
    pub debug_token: Option<Secret<String>>,
    /// True in production deployments. Gates the debug trigger.
    pub production: bool,
    /// Storage namespace stamped onto incoming orders, mirroring the provider metadata contract.
    pub storage_bucket: Option<String>,
    pub storage: StorageConfig,
    /// How often the watchdog sweeper runs.
    pub sweep_interval_secs: u64,
    /// How long an order may sit in `generating_artifact` before the sweeper resets it.
    pub generation_timeout: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct DispatchConfig {
    pub worker_url: Option<String>,
    pub worker_token: Option<Secret<String>>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub root: String,
    pub base_url: String,
    pub signing_key: Secret<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "data/artifacts".to_string(),
            base_url: format!("http://{DEFAULT_SNG_HOST}:{DEFAULT_SNG_PORT}/files"),
            signing_key: Secret::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SNG_HOST.to_string(),
            port: DEFAULT_SNG_PORT,
            database_url: String::default(),
            webhook_secret: None,
            dispatch: DispatchConfig::default(),
            debug_token: None,
            production: false,
            storage_bucket: None,
            storage: StorageConfig::default(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SNG_HOST").ok().unwrap_or_else(|| DEFAULT_SNG_HOST.into());
        let port = env::var("SNG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SNG_PORT. {e} Using the default, {DEFAULT_SNG_PORT}, instead."
                    );
                    DEFAULT_SNG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SNG_PORT);
        let database_url = env::var("SNG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SNG_DATABASE_URL is not set. Please set it to the URL for the notebook database.");
            String::default()
        });
        let webhook_secret = env::var("SNG_WEBHOOK_SECRET").ok().map(Secret::new);
        if webhook_secret.is_none() {
            warn!("🪛️ SNG_WEBHOOK_SECRET is not set. Webhook calls will be rejected until it is configured.");
        }
        let dispatch = DispatchConfig {
            worker_url: env::var("SNG_WORKER_URL").ok().filter(|s| !s.trim().is_empty()),
            worker_token: env::var("SNG_WORKER_TOKEN").ok().map(Secret::new),
        };
        if dispatch.worker_url.is_none() {
            info!("🪛️ SNG_WORKER_URL is not set. The webhook will rely on the sweeper to start generation jobs.");
        }
        let debug_token = env::var("SNG_DEBUG_TOKEN").ok().map(Secret::new);
        let production = parse_boolean_flag(env::var("SNG_PRODUCTION").ok(), false);
        let storage_bucket = env::var("SNG_STORAGE_BUCKET").ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let storage = StorageConfig {
            root: env::var("SNG_STORAGE_ROOT").ok().unwrap_or_else(|| StorageConfig::default().root),
            base_url: env::var("SNG_STORAGE_BASE_URL")
                .ok()
                .unwrap_or_else(|| format!("http://{host}:{port}/files")),
            signing_key: env::var("SNG_STORAGE_SIGNING_KEY").map(Secret::new).unwrap_or_else(|_| {
                warn!("🪛️ SNG_STORAGE_SIGNING_KEY is not set. Download URLs will be signed with an empty key.");
                Secret::default()
            }),
        };
        let sweep_interval_secs = env::var("SNG_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        let generation_timeout = env::var("SNG_GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::seconds)
            .unwrap_or(DEFAULT_GENERATION_TIMEOUT);
        Self {
            host,
            port,
            database_url,
            webhook_secret,
            dispatch,
            debug_token,
            production,
            storage_bucket,
            storage,
            sweep_interval_secs,
            generation_timeout,
        }
    }
}
