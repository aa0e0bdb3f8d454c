use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::rules::RuleSet;
use crate::services::source::{FetchError, RuleSource};

/// Path of the rules endpoint, relative to the configured base URL.
const RULES_PATH: &str = "api/plugins/angular_patterns";

/// Transport settings for the rules API client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 100,
        }
    }
}

/// HTTP client for the remote rules API.
#[derive(Clone)]
pub struct RulesApiClient {
    base_url: String,
    http: Client,
}

impl RulesApiClient {
    pub fn new(base_url: impl Into<String>, config: &HttpClientConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    /// Full URL of the rules endpoint. Any path on the base URL is kept.
    pub fn rules_url(&self) -> Result<Url, FetchError> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(RULES_PATH)?)
    }
}

#[async_trait]
impl RuleSource for RulesApiClient {
    async fn fetch_rules(&self) -> Result<RuleSet, FetchError> {
        let started = Instant::now();
        let url = self.rules_url()?;
        tracing::debug!(%url, "Fetching detection rules");

        let request = self.http.get(url).build().map_err(FetchError::Request)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        let rules: RuleSet = serde_json::from_slice(&body)?;

        tracing::debug!(
            rules = rules.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Fetched detection rules"
        );
        Ok(rules)
    }

    fn source_name(&self) -> &str {
        "rules-api"
    }
}
