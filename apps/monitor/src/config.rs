use std::{env::var, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, ensure};
use market::DEFAULT_HISTORY_CAPACITY;

const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub watchlist_path: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub history_days: u32,
    pub history_capacity: usize,
    pub history_refresh: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("COINGECKO_API_KEY")
            .map(|k| k.trim().to_string())
            .unwrap_or_default();
        ensure!(!api_key.is_empty(), "COINGECKO_API_KEY not set");

        Ok(Self {
            api_key,
            api_base_url: lookup("COINGECKO_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            watchlist_path: lookup("WATCHLIST_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/watchlist.txt")),
            poll_interval: Duration::from_secs(positive(&lookup, "POLL_INTERVAL_SECS", 5)?),
            request_timeout: Duration::from_secs(positive(&lookup, "REQUEST_TIMEOUT_SECS", 5)?),
            history_days: positive(&lookup, "HISTORY_DAYS", 7)?,
            history_capacity: positive(&lookup, "HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY)?,
            history_refresh: Duration::from_secs(positive(&lookup, "HISTORY_REFRESH_SECS", 60)?),
        })
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let value: T = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} is not a valid number: {raw:?}"))?;
    ensure!(value > T::default(), "{key} must be greater than zero");

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("COINGECKO_API_KEY", "secret")]).unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.watchlist_path, PathBuf::from("data/watchlist.txt"));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.history_days, 7);
        assert_eq!(config.history_capacity, 12096);
        assert_eq!(config.history_refresh, Duration::from_secs(60));
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("COINGECKO_API_KEY", "  \n")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("COINGECKO_API_KEY", "secret\n"),
            ("POLL_INTERVAL_SECS", "10"),
            ("HISTORY_CAPACITY", "500"),
            ("WATCHLIST_PATH", "/tmp/w.txt"),
        ])
        .unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.history_capacity, 500);
        assert_eq!(config.watchlist_path, PathBuf::from("/tmp/w.txt"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(config(&[("COINGECKO_API_KEY", "k"), ("POLL_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("COINGECKO_API_KEY", "k"), ("HISTORY_DAYS", "week")]).is_err());
    }
}
