use std::time::Duration;

use log::*;
use smg_common::Secret;

const DEFAULT_AMAZON_DOMAIN: &str = "amazon.co.uk";
const DEFAULT_BOOTS_BASE_URL: &str = "https://www.boots.com";
const DEFAULT_LIVE_CHECK_TIMEOUT_SECS: u64 = 8;

/// Configuration for the Rainforest-backed Amazon adapter.
#[derive(Debug, Clone)]
pub struct RainforestConfig {
    pub api_key: Secret<String>,
    pub amazon_domain: String,
    /// Per-request timeout. This is the true upper bound on a single live check.
    pub timeout: Duration,
}

impl Default for RainforestConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            amazon_domain: DEFAULT_AMAZON_DOMAIN.to_string(),
            timeout: Duration::from_secs(DEFAULT_LIVE_CHECK_TIMEOUT_SECS),
        }
    }
}

impl RainforestConfig {
    pub fn from_env_or_default() -> Self {
        let api_key = Secret::new(std::env::var("SMG_RAINFOREST_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SMG_RAINFOREST_API_KEY not set. Amazon live checks will be unavailable.");
            String::new()
        }));
        let amazon_domain = std::env::var("SMG_AMAZON_DOMAIN").unwrap_or_else(|_| {
            info!("🪛️ SMG_AMAZON_DOMAIN not set, using {DEFAULT_AMAZON_DOMAIN}");
            DEFAULT_AMAZON_DOMAIN.to_string()
        });
        Self { api_key, amazon_domain, timeout: live_check_timeout() }
    }

    /// True if an API key has been supplied.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_set()
    }
}

/// Configuration for the scrape-backed Boots adapter.
#[derive(Debug, Clone)]
pub struct BootsConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for BootsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BOOTS_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_LIVE_CHECK_TIMEOUT_SECS),
        }
    }
}

impl BootsConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = std::env::var("SMG_BOOTS_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ SMG_BOOTS_BASE_URL not set, using {DEFAULT_BOOTS_BASE_URL}");
            DEFAULT_BOOTS_BASE_URL.to_string()
        });
        Self { base_url, timeout: live_check_timeout() }
    }
}

fn live_check_timeout() -> Duration {
    let secs = std::env::var("SMG_LIVE_CHECK_TIMEOUT_SECS")
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| {
                    error!(
                        "🪛️ {s} is not a valid value for SMG_LIVE_CHECK_TIMEOUT_SECS. {e} Using the default, \
                         {DEFAULT_LIVE_CHECK_TIMEOUT_SECS}s, instead."
                    );
                })
                .ok()
        })
        .unwrap_or(DEFAULT_LIVE_CHECK_TIMEOUT_SECS);
    Duration::from_secs(secs)
}
