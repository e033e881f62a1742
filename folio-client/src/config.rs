use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without trailing slash
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            api_base: String::from(DEFAULT_API_BASE),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> ClientConfig {
        let api_base: String = api_base.into();
        ClientConfig {
            api_base: String::from(api_base.trim_end_matches('/')),
            ..ClientConfig::default()
        }
    }

    /// Reads `FOLIO_API_BASE` and `FOLIO_TIMEOUT_MS`, falling back to defaults
    pub fn from_env() -> anyhow::Result<ClientConfig> {
        let mut cfg = match std::env::var("FOLIO_API_BASE") {
            Ok(base) => ClientConfig::new(base),
            Err(_) => ClientConfig::default(),
        };
        if let Ok(ms) = std::env::var("FOLIO_TIMEOUT_MS") {
            let ms = ms
                .parse::<u64>()
                .with_context(|| format!("parsing FOLIO_TIMEOUT_MS {ms:?} as milliseconds"))?;
            cfg.timeout = Duration::from_millis(ms);
        }
        Ok(cfg)
    }
}
