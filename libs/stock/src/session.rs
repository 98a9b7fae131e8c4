use std::{env::var, path::PathBuf, time::Duration};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::{
    cache::{ResponseCache, cache_key},
    error::{Result, StockError},
    rate_limit::{RateLimit, RateLimiter},
};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
const DEFAULT_CACHE_PATH: &str = "stock-cache.sqlite";
const DEFAULT_CACHE_TTL_SECS: u64 = 900;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings fixed when the session is built.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    /// Page that hands out the consent cookie the crumb endpoint needs.
    pub cookie_url: String,
    pub user_agent: String,
    pub cache_path: PathBuf,
    /// `None` keeps cached responses forever.
    pub cache_ttl: Option<Duration>,
    pub rate_limit: RateLimit,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_ttl: Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            rate_limit: RateLimit::default(),
        }
    }
}

impl SessionConfig {
    /// Read overrides from the environment; anything unset keeps its default.
    ///
    /// `CACHE_TTL_SECS=0` disables expiry.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let cache_ttl = match parse_env::<u64>("CACHE_TTL_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.cache_ttl,
        };

        let rate_limit = RateLimit {
            max_requests: parse_env("RATE_LIMIT_REQUESTS")?
                .unwrap_or(defaults.rate_limit.max_requests),
            per: parse_env("RATE_LIMIT_WINDOW_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit.per),
        };

        Ok(Self {
            base_url: var("YAHOO_BASE_URL").unwrap_or(defaults.base_url),
            cookie_url: var("YAHOO_COOKIE_URL").unwrap_or(defaults.cookie_url),
            user_agent: var("YAHOO_USER_AGENT").unwrap_or(defaults.user_agent),
            cache_path: var("CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            cache_ttl,
            rate_limit,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StockError::InvalidParams(format!("{key}={raw} is not a valid value"))),
        Err(_) => Ok(None),
    }
}

/// Process-wide HTTP session: cached, rate limited, carrying Yahoo's cookie
/// and crumb.
pub struct Session {
    client: Client,
    limiter: RateLimiter,
    cache: ResponseCache,
    config: SessionConfig,
    crumb: RwLock<Option<String>>,
}

impl Session {
    pub async fn new(config: SessionConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = ResponseCache::open(&config.cache_path, config.cache_ttl).await?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(config.rate_limit),
            cache,
            config,
            crumb: RwLock::new(None),
        })
    }

    pub async fn from_env() -> Result<Self> {
        Self::new(SessionConfig::from_env()?).await
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Cached GET decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let body = self.get_cached(url, query, false).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Like [`Session::get_json`] for endpoints that need the crumb.
    pub async fn get_json_authed<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.get_cached(url, query, true).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    #[instrument(name = "session_get", skip(self, query))]
    async fn get_cached(&self, url: &str, query: &[(&str, &str)], authed: bool) -> Result<Vec<u8>> {
        let key = cache_key(url, query);

        if let Some(body) = self.cache.get(&key).await? {
            debug!(bytes = body.len(), "cache hit");
            return Ok(body);
        }

        let crumb = if authed { Some(self.crumb().await?) } else { None };
        let mut params: Vec<(&str, &str)> = query.to_vec();
        if let Some(crumb) = crumb.as_deref() {
            params.push(("crumb", crumb));
        }

        self.limiter.acquire().await;
        let res = self.client.get(url).query(&params).send().await?;
        let status = res.status();

        if status == StatusCode::UNAUTHORIZED && authed {
            warn!("crumb rejected, clearing it for the next request");
            self.crumb.write().await.take();
        }

        let body = res.error_for_status()?.bytes().await?.to_vec();
        debug!(status = status.as_u16(), bytes = body.len(), "fetched");

        if let Err(e) = self.cache.put(&key, &body).await {
            warn!(error = ?e, "failed to store response in cache");
        }

        Ok(body)
    }

    async fn crumb(&self) -> Result<String> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut slot = self.crumb.write().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }

        // Only sets the cookie; the page itself answers with an error status.
        self.limiter.acquire().await;
        if let Err(e) = self.client.get(&self.config.cookie_url).send().await {
            warn!(error = ?e, "cookie request failed");
        }

        self.limiter.acquire().await;
        let crumb = self
            .client
            .get(self.url("v1/test/getcrumb"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(StockError::provider("provider returned no usable crumb"));
        }

        debug!("obtained crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    pub async fn close(&self) {
        self.cache.close().await;
    }
}
