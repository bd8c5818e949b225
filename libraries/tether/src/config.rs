use std::time::Duration;

/// Default bound on any single request. The store never specifies one, but
/// an unbounded in-flight fetch would hold a poller's "skip if outstanding"
/// guard forever.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a REST resource store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read settings from the environment, honoring a `.env` file:
    /// `STORE_URL` (default `http://localhost:3000`) and
    /// `STORE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("STORE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let mut config = Self::new(base_url);

        if let Some(secs) = std::env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }

        config
    }
}
