use std::collections::HashSet;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::cli::Cli;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://detectors.db";
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_STATUS_ADDR: &str = "127.0.0.1:9464";

#[derive(Debug, Clone)]
pub struct Config {
    pub rules_base_url: String,
    pub database_url: String,
    pub refresh_interval: Duration,
    pub http_timeout: Duration,
    pub features: FeatureToggles,
    pub status_addr: SocketAddr,
}

/// Set of enabled feature flags, read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureToggles {
    enabled: HashSet<String>,
}

impl FeatureToggles {
    /// Parse a comma-separated flag list. Blank entries are ignored.
    pub fn from_list(list: &str) -> Self {
        Self {
            enabled: list
                .split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn with(mut self, flag: &str) -> Self {
        self.enabled.insert(flag.to_string());
        self
    }

    pub fn is_enabled(&self, flag: &str) -> bool {
        self.enabled.contains(flag)
    }
}

impl Config {
    /// Build the config from the process environment, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, String> {
        Self::load_with(cli, |key| env::var(key).ok())
    }

    /// `--scan` only reads the store, so it runs without a rules base URL.
    fn load_with<F>(cli: &Cli, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url_optional = cli.base_url.is_some() || cli.scan.is_some();
        let mut config = Self::from_lookup(lookup, base_url_optional)?;
        config.apply_cli(cli)?;
        Ok(config)
    }

    /// Build the config from `lookup`. `RULES_BASE_URL` may be absent only
    /// when the caller supplies it another way or never fetches.
    pub fn from_lookup<F>(lookup: F, base_url_overridden: bool) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rules_base_url = match lookup("RULES_BASE_URL") {
            Some(url) => url,
            None if base_url_overridden => String::new(),
            None => return Err("RULES_BASE_URL is required".to_string()),
        };

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let refresh_interval = parse_seconds(
            lookup("REFRESH_INTERVAL_SECONDS"),
            "REFRESH_INTERVAL_SECONDS",
            DEFAULT_REFRESH_INTERVAL_SECONDS,
        )?;

        let http_timeout = parse_seconds(
            lookup("HTTP_TIMEOUT_SECONDS"),
            "HTTP_TIMEOUT_SECONDS",
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;

        let features = FeatureToggles::from_list(&lookup("FEATURE_TOGGLES").unwrap_or_default());

        let status_addr = lookup("STATUS_ADDR")
            .unwrap_or_else(|| DEFAULT_STATUS_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|_| "STATUS_ADDR must be a socket address like 127.0.0.1:9464".to_string())?;

        Ok(Self {
            rules_base_url,
            database_url,
            refresh_interval,
            http_timeout,
            features,
            status_addr,
        })
    }

    fn apply_cli(&mut self, cli: &Cli) -> Result<(), String> {
        if let Some(url) = &cli.base_url {
            self.rules_base_url = url.clone();
        }
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(secs) = cli.refresh_interval {
            if secs == 0 {
                return Err("--refresh-interval must be greater than zero".to_string());
            }
            self.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(addr) = cli.status_addr {
            self.status_addr = addr;
        }
        Ok(())
    }
}

fn parse_seconds(value: Option<String>, name: &str, default: u64) -> Result<Duration, String> {
    let secs = match value {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("{} must be a valid number", name))?,
        None => default,
    };
    if secs == 0 {
        return Err(format!("{} must be greater than zero", name));
    }
    Ok(Duration::from_secs(secs))
}
