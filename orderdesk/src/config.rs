//! Desk configuration
//!
//! Every value has a default and can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DeskError;
use crate::poller::DEFAULT_REFRESH_INTERVAL;
use crate::prefill::PrefillPolicy;
use crate::types::Asset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Address the dashboard server binds to
    pub listen_addr: String,
    /// Base URL of the exchange serving /orderbook and /trade
    pub upstream_url: String,
    /// Assets offered to the asset picker
    pub assets: Vec<Asset>,
    /// Asset selected when the session starts
    pub default_asset: Asset,
    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Whether clicking a price level also submits the order
    pub prefill_policy: PrefillPolicy,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:6957".to_string(),
            upstream_url: "http://127.0.0.1:8080".to_string(),
            assets: vec![Asset::new("BTC"), Asset::new("ETH"), Asset::new("SOL")],
            default_asset: Asset::new("BTC"),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            request_timeout_ms: 10_000,
            prefill_policy: PrefillPolicy::PrefillOnly,
        }
    }
}

fn parse_millis(name: &str, value: &str) -> Result<u64, DeskError> {
    value
        .trim()
        .parse()
        .map_err(|_| DeskError::Config(format!("{name} must be a whole number of milliseconds, got '{value}'")))
}

impl DeskConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, DeskError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DeskError> {
        let mut config = Self::default();

        if let Some(v) = lookup("ORDERDESK_LISTEN_ADDR") {
            config.listen_addr = v.trim().to_string();
        }
        if let Some(v) = lookup("ORDERDESK_UPSTREAM_URL") {
            config.upstream_url = v.trim().to_string();
        }
        if let Some(v) = lookup("ORDERDESK_ASSETS") {
            config.assets = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Asset::new)
                .collect();
            if let Some(first) = config.assets.first() {
                config.default_asset = first.clone();
            }
        }
        if let Some(v) = lookup("ORDERDESK_DEFAULT_ASSET") {
            config.default_asset = Asset::new(v.trim());
        }
        if let Some(v) = lookup("ORDERDESK_REFRESH_INTERVAL_MS") {
            config.refresh_interval_ms = parse_millis("ORDERDESK_REFRESH_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("ORDERDESK_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_millis("ORDERDESK_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ORDERDESK_PREFILL_POLICY") {
            config.prefill_policy = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeskError> {
        if self.assets.is_empty() {
            return Err(DeskError::Config("at least one asset must be configured".to_string()));
        }
        if !self.is_known_asset(&self.default_asset) {
            return Err(DeskError::Config(format!(
                "default asset '{}' is not among the configured assets",
                self.default_asset
            )));
        }
        if self.refresh_interval_ms == 0 {
            return Err(DeskError::Config("refresh interval must be greater than 0".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(DeskError::Config("request timeout must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn is_known_asset(&self, asset: &Asset) -> bool {
        self.assets.contains(asset)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DeskConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DeskConfig::default());
        assert_eq!(config.default_asset, Asset::new("BTC"));
        assert_eq!(config.refresh_interval(), Duration::from_millis(5000));
        assert_eq!(config.prefill_policy, PrefillPolicy::PrefillOnly);
    }

    #[test]
    fn test_overrides() {
        let config = DeskConfig::from_lookup(lookup(&[
            ("ORDERDESK_LISTEN_ADDR", "127.0.0.1:9000"),
            ("ORDERDESK_UPSTREAM_URL", "http://exchange:8080"),
            ("ORDERDESK_ASSETS", "ETH, SOL ,,DOGE"),
            ("ORDERDESK_REFRESH_INTERVAL_MS", "1000"),
            ("ORDERDESK_PREFILL_POLICY", "prefill-and-submit"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.upstream_url, "http://exchange:8080");
        assert_eq!(
            config.assets,
            vec![Asset::new("ETH"), Asset::new("SOL"), Asset::new("DOGE")]
        );
        assert_eq!(config.default_asset, Asset::new("ETH"));
        assert_eq!(config.refresh_interval_ms, 1000);
        assert_eq!(config.prefill_policy, PrefillPolicy::PrefillAndSubmit);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = DeskConfig::from_lookup(lookup(&[("ORDERDESK_REFRESH_INTERVAL_MS", "soon")]));
        assert!(matches!(err, Err(DeskError::Config(_))));

        let err = DeskConfig::from_lookup(lookup(&[("ORDERDESK_REFRESH_INTERVAL_MS", "0")]));
        assert!(matches!(err, Err(DeskError::Config(_))));

        let err = DeskConfig::from_lookup(lookup(&[("ORDERDESK_PREFILL_POLICY", "yolo")]));
        assert!(matches!(err, Err(DeskError::Config(_))));

        let err = DeskConfig::from_lookup(lookup(&[("ORDERDESK_DEFAULT_ASSET", "XRP")]));
        assert!(matches!(err, Err(DeskError::Config(_))));

        let err = DeskConfig::from_lookup(lookup(&[("ORDERDESK_ASSETS", " , ")]));
        assert!(matches!(err, Err(DeskError::Config(_))));
    }
}
