use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

/// Per-owner index retention; entries beyond this fall off the index.
pub const DEFAULT_INDEX_CAP: usize = 100;
/// Feed page size ceiling.
pub const DEFAULT_FEED_LIMIT: usize = 50;
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;

// Service configuration sourced from environment variables, with an optional
// YAML override file pointed at by EXCHANGE_CONFIG.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub remote: Option<RemoteStoreConfig>,
    pub index_cap: usize,
    pub feed_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Remote,
}

#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ExchangeConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    store_url: Option<String>,
    store_token: Option<String>,
    index_cap: Option<usize>,
    feed_limit: Option<usize>,
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "remote" => Ok(StorageBackend::Remote),
        other => bail!("unknown storage backend: {other}"),
    }
}

impl ExchangeConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("EXCHANGE_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse EXCHANGE_BIND")?;
        let metrics_bind = std::env::var("EXCHANGE_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse EXCHANGE_METRICS_BIND")?;
        let storage = parse_storage(
            &std::env::var("EXCHANGE_STORAGE").unwrap_or_else(|_| "memory".to_string()),
        )?;
        let remote = std::env::var("EXCHANGE_STORE_URL")
            .ok()
            .map(|base_url| RemoteStoreConfig {
                base_url,
                token: std::env::var("EXCHANGE_STORE_TOKEN").ok(),
                request_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            });
        let index_cap = match std::env::var("EXCHANGE_INDEX_CAP") {
            Ok(value) => value.parse().with_context(|| "parse EXCHANGE_INDEX_CAP")?,
            Err(_) => DEFAULT_INDEX_CAP,
        };
        let feed_limit = match std::env::var("EXCHANGE_FEED_LIMIT") {
            Ok(value) => value.parse().with_context(|| "parse EXCHANGE_FEED_LIMIT")?,
            Err(_) => DEFAULT_FEED_LIMIT,
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            remote,
            index_cap,
            feed_limit,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("EXCHANGE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read EXCHANGE_CONFIG: {path}"))?;
            let override_cfg: ExchangeConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse exchange config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.storage {
                config.storage = parse_storage(&value)?;
            }
            if let Some(value) = override_cfg.store_url {
                let token = override_cfg
                    .store_token
                    .or_else(|| config.remote.as_ref().and_then(|r| r.token.clone()));
                config.remote = Some(RemoteStoreConfig {
                    base_url: value,
                    token,
                    request_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
                });
            }
            if let Some(value) = override_cfg.index_cap {
                config.index_cap = value;
            }
            if let Some(value) = override_cfg.feed_limit {
                config.feed_limit = value;
            }
        }
        Ok(config)
    }
}
