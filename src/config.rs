use std::time::Duration;

use crate::services::store::{
    StoreSettings, DEFAULT_RACE_COUNT, DEFAULT_REFRESH_INTERVAL, DEFAULT_TICK_INTERVAL,
};

const DEFAULT_RACING_API_URL: &str = "https://api.neds.com.au";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the racing API (without the `/rest/v1/racing/` path).
    pub racing_api_url: String,
    pub port: u16,
    /// How many races the board shows.
    pub race_count: usize,
    pub refresh_interval: Duration,
    pub countdown_tick: Duration,
    pub http_timeout: Duration,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            racing_api_url: std::env::var("RACING_API_URL")
                .unwrap_or_else(|_| DEFAULT_RACING_API_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            race_count: env_parse("RACE_COUNT", DEFAULT_RACE_COUNT as u64) as usize,
            refresh_interval: Duration::from_secs(env_parse(
                "REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL.as_secs(),
            )),
            countdown_tick: Duration::from_secs(env_parse(
                "COUNTDOWN_TICK_SECS",
                DEFAULT_TICK_INTERVAL.as_secs(),
            )),
            http_timeout: Duration::from_secs(env_parse(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            race_count: self.race_count,
            tick_interval: self.countdown_tick,
            refresh_interval: self.refresh_interval,
        }
    }
}

/// Read a positive integer from the environment, falling back to `default`
/// when unset. Zero is rejected because every use is a count or a period.
fn env_parse(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => panic!("{} must be a positive integer, got '{}'", key, raw),
        },
        Err(_) => default,
    }
}
