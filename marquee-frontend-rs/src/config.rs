use std::time::Duration;

use tether::StoreConfig;
use tether::watchdog::DEFAULT_WATCHDOG_INTERVAL;

use crate::notifications::DEFAULT_FEED_INTERVAL;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub store: StoreConfig,
    pub notification_interval: Duration,
    pub watchdog_interval: Duration,
}

impl ClientConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self {
            store,
            notification_interval: DEFAULT_FEED_INTERVAL,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
        }
    }

    /// Settings from the environment (`.env` honored): the store settings
    /// per [`StoreConfig::from_env`], plus `MARQUEE_FEED_POLL_SECS` and
    /// `MARQUEE_WATCHDOG_POLL_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::new(StoreConfig::from_env());

        if let Some(secs) = read_secs("MARQUEE_FEED_POLL_SECS") {
            config.notification_interval = secs;
        }
        if let Some(secs) = read_secs("MARQUEE_WATCHDOG_POLL_SECS") {
            config.watchdog_interval = secs;
        }

        config
    }
}

fn read_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_secs)
}
