use std::env;

use log::*;
use retail_adapters::{BootsConfig, RainforestConfig};
use skinmatch_engine::{
    ingredients::DEFAULT_FUZZY_THRESHOLD,
    verification::VerifyOptions,
    MatchOptions,
};

const DEFAULT_SMG_HOST: &str = "127.0.0.1";
const DEFAULT_SMG_PORT: u16 = 8380;

/// Server configuration, read from `SMG_*` environment variables with logged fallbacks.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Countries the deployment serves, e.g. `GB,US`.
    pub country_whitelist: Vec<String>,
    pub default_currency: String,
    /// How many top-scored candidates are live-verified per request.
    pub top_n_live_check: usize,
    /// Minimum similarity (0–100) for a fuzzy ingredient match.
    pub fuzzy_match_threshold: f64,
    pub rainforest: RainforestConfig,
    pub boots: BootsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMG_HOST.to_string(),
            port: DEFAULT_SMG_PORT,
            database_url: String::default(),
            country_whitelist: vec!["GB".to_string()],
            default_currency: "GBP".to_string(),
            top_n_live_check: VerifyOptions::default().top_n,
            fuzzy_match_threshold: DEFAULT_FUZZY_THRESHOLD,
            rainforest: RainforestConfig::default(),
            boots: BootsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = ServerConfig::default();
        let host = env::var("SMG_HOST").ok().unwrap_or_else(|| DEFAULT_SMG_HOST.into());
        let port = env::var("SMG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SMG_PORT. {e} Using the default, {DEFAULT_SMG_PORT}, instead."
                    );
                    DEFAULT_SMG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SMG_PORT);
        let database_url = skinmatch_engine::db_url();
        let country_whitelist = env::var("SMG_COUNTRY_WHITELIST")
            .map(|s| s.split(',').map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()).collect::<Vec<_>>())
            .ok()
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                info!("🪛️ SMG_COUNTRY_WHITELIST not set, serving GB only");
                defaults.country_whitelist.clone()
            });
        let default_currency = env::var("SMG_DEFAULT_CURRENCY").ok().unwrap_or_else(|| {
            info!("🪛️ SMG_DEFAULT_CURRENCY not set, using GBP");
            defaults.default_currency.clone()
        });
        let top_n_live_check = env::var("SMG_TOP_N_LIVE_CHECK")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        error!(
                            "🪛️ {s} is not a valid value for SMG_TOP_N_LIVE_CHECK. {e} Using the default, {}, instead.",
                            defaults.top_n_live_check
                        );
                    })
                    .ok()
            })
            .unwrap_or(defaults.top_n_live_check);
        let fuzzy_match_threshold = env::var("SMG_FUZZY_MATCH_THRESHOLD")
            .ok()
            .and_then(|s| {
                s.parse::<f64>()
                    .map_err(|e| {
                        error!(
                            "🪛️ {s} is not a valid value for SMG_FUZZY_MATCH_THRESHOLD. {e} Using the default, \
                             {DEFAULT_FUZZY_THRESHOLD}, instead."
                        );
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_FUZZY_THRESHOLD);
        Self {
            host,
            port,
            database_url,
            country_whitelist,
            default_currency,
            top_n_live_check,
            fuzzy_match_threshold,
            rainforest: RainforestConfig::from_env_or_default(),
            boots: BootsConfig::from_env_or_default(),
        }
    }

    /// Engine-level request policy derived from this configuration.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            country_whitelist: self.country_whitelist.clone(),
            default_currency: self.default_currency.clone(),
            ..Default::default()
        }
    }

    /// Verification tunables derived from this configuration. The adapter-level timeout doubles
    /// as the per-call budget; the fan-out deadline adds a fixed buffer on top.
    pub fn verify_options(&self) -> VerifyOptions {
        let live_check_timeout = self.rainforest.timeout.max(self.boots.timeout);
        VerifyOptions { top_n: self.top_n_live_check, live_check_timeout, ..Default::default() }
    }
}
