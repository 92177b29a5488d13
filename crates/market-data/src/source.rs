use crate::{RateLimiter, TieredCache};
use async_trait::async_trait;
use chrono::Duration;
use market_core::MarketError;
use serde_json::Value;

/// Trait for remote indicator providers
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Value, MarketError>;
}

/// Configuration for the rate-limited, cached data-access layer
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// External calls allowed per rolling window
    pub rate_limit: usize,
    pub rate_period: Duration,
    /// Durable-tier TTL for fetched values
    pub cache_ttl: Duration,
    /// Fast-tier TTL, independent of the durable TTL
    pub fast_ttl: Duration,
    pub request_timeout: std::time::Duration,
    pub max_attempts: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        // Free-tier providers should set INDICATOR_RATE_LIMIT accordingly.
        let rate_limit: usize = std::env::var("INDICATOR_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        Self {
            rate_limit,
            rate_period: Duration::minutes(1),
            cache_ttl: Duration::hours(1),
            fast_ttl: Duration::minutes(5),
            request_timeout: std::time::Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

/// HTTP-backed indicator source with bounded timeout and a fixed retry
/// budget with increasing backoff.
pub struct HttpIndicatorSource {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
}

impl HttpIndicatorSource {
    pub fn new(base_url: impl Into<String>, config: &SourceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

#[async_trait]
impl IndicatorSource for HttpIndicatorSource {
    async fn fetch(&self, key: &str) -> Result<Value, MarketError> {
        let url = format!("{}/indicators/{}", self.base_url, key);
        let mut last_error = MarketError::ExternalService("no attempts made".to_string());

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // 1s, 2s, 4s, ...
                let backoff = std::time::Duration::from_secs(1u64 << (attempt - 1));
                tracing::warn!(
                    key,
                    attempt,
                    "retrying indicator fetch after {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| MarketError::ExternalService(e.to_string()));
                    }
                    last_error = MarketError::ExternalService(format!(
                        "indicator source returned {status} for {key}"
                    ));
                    // Client errors other than 429 will not improve on retry
                    if status.is_client_error() && status.as_u16() != 429 {
                        return Err(last_error);
                    }
                }
                Err(e) => {
                    last_error = MarketError::ExternalService(e.to_string());
                }
            }
        }

        Err(last_error)
    }
}

/// Rate-limited, tier-cached front for an [`IndicatorSource`].
///
/// Lookup order is cache, then limiter, then remote: a cache hit never
/// consumes quota, and a refused acquisition surfaces as
/// `RateLimitExceeded` instead of bypassing the quota.
pub struct CachedIndicatorSource<S> {
    inner: S,
    cache: TieredCache<Value>,
    limiter: RateLimiter,
    cache_ttl: Duration,
}

impl<S: IndicatorSource> CachedIndicatorSource<S> {
    pub fn new(inner: S, config: &SourceConfig) -> Self {
        Self {
            inner,
            cache: TieredCache::new(config.fast_ttl),
            limiter: RateLimiter::new(config.rate_limit, config.rate_period),
            cache_ttl: config.cache_ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Result<Value, MarketError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(value);
        }

        if !self.limiter.acquire().await {
            let reset = self.limiter.get_reset_time().await;
            return Err(MarketError::RateLimitExceeded(match reset {
                Some(at) => format!("quota exhausted for {key}, window resets at {at}"),
                None => format!("quota exhausted for {key}"),
            }));
        }

        let value = self.inner.fetch(key).await?;
        self.cache.set(key, value.clone(), self.cache_ttl);
        Ok(value)
    }

    pub fn cache(&self) -> &TieredCache<Value> {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
