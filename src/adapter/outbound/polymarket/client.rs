//! Polymarket REST API client.
//!
//! Supports two API surfaces:
//! - **CLOB API** (`clob.polymarket.com`): order book queries for the
//!   fallback poller
//! - **Gamma API** (`gamma-api.polymarket.com`): event lookup by slug for
//!   startup market discovery
//!
//! Every request goes through one pacer so the process never exceeds
//! `requests_per_second`. HTTP 429 responses are retried with exponential
//! backoff (honoring `Retry-After`) up to `retry_max_attempts`.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{header::RETRY_AFTER, Client as HttpClient, Response, StatusCode};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::dto::response::{GammaEvent, PolymarketBookResponse};
use super::settings::{PolymarketConfig, PolymarketHttpConfig};
use crate::domain::{book::Book, id::TokenId};
use crate::error::{Error, Result};
use crate::port::outbound::exchange::{MarketResolver, OrderBookSource, ResolvedOutcomes};

/// Spaces requests evenly. Callers reserve the next free slot and sleep
/// until it arrives.
struct Pacer {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    fn new(requests_per_second: u32) -> Self {
        let min_interval = if requests_per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / requests_per_second
        };
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let slot = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.min_interval);
            slot
        };
        sleep_until(slot).await;
    }
}

/// HTTP client for the Polymarket REST APIs.
pub struct PolymarketClient {
    http: HttpClient,
    /// CLOB API base URL (order book).
    base_url: String,
    /// Gamma API base URL (event discovery).
    gamma_url: String,
    retry_max_attempts: u32,
    retry_backoff: Duration,
    max_backoff: Duration,
    pacer: Pacer,
}

impl PolymarketClient {
    /// Create a client with default HTTP settings.
    #[must_use]
    pub fn new(base_url: String, gamma_url: String) -> Self {
        Self::with_http(HttpClient::new(), base_url, gamma_url, &PolymarketHttpConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &PolymarketConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.http.timeout_ms))
            .connect_timeout(Duration::from_millis(config.http.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self::with_http(
            http,
            config.api_url.clone(),
            config.gamma_api_url.clone(),
            &config.http,
        )
    }

    fn with_http(
        http: HttpClient,
        base_url: String,
        gamma_url: String,
        settings: &PolymarketHttpConfig,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            gamma_url: gamma_url.trim_end_matches('/').to_string(),
            retry_max_attempts: settings.retry_max_attempts.max(1),
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            pacer: Pacer::new(settings.requests_per_second),
        }
    }

    async fn get_with_retry<T>(&self, url: Url) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.pacer.wait().await;

            let response = match self.http.get(url.clone()).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= self.retry_max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    let delay = self.backoff_delay(attempt, None);
                    warn!(attempt, error = %err, delay_ms = delay.as_millis(), "HTTP request failed, retrying");
                    sleep(delay).await;
                    continue;
                }
            };

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let delay = self.backoff_delay(attempt, retry_after(&response));
                if attempt >= self.retry_max_attempts {
                    return Err(Error::RateLimited {
                        attempts: attempt,
                        last_delay: delay,
                    });
                }
                warn!(attempt, delay_ms = delay.as_millis(), url = %url, "Rate limited, backing off");
                sleep(delay).await;
                continue;
            }

            return Ok(response.error_for_status()?.json::<T>().await?);
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    /// Delay before retry `attempt + 1`: `Retry-After` when the server sent
    /// one, otherwise the base backoff doubled per attempt. Always capped.
    fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        retry_after.unwrap_or(exponential).min(self.max_backoff)
    }

    /// Fetch all events matching a slug from the Gamma API.
    pub async fn get_events(&self, slug: &str) -> Result<Vec<GammaEvent>> {
        let url = Url::parse_with_params(&format!("{}/events", self.gamma_url), &[("slug", slug)])?;
        info!(url = %url, "Fetching event (Gamma)");
        self.get_with_retry(url).await
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl OrderBookSource for PolymarketClient {
    async fn order_book(&self, token_id: &TokenId) -> Result<Book> {
        let url = Url::parse_with_params(
            &format!("{}/book", self.base_url),
            &[("token_id", token_id.as_str())],
        )?;
        let response: PolymarketBookResponse = self.get_with_retry(url).await?;
        debug!(
            token = %token_id,
            bids = response.bids.len(),
            asks = response.asks.len(),
            "Fetched order book"
        );
        Ok(response.to_orderbook(token_id.clone()))
    }
}

#[async_trait]
impl MarketResolver for PolymarketClient {
    async fn resolve_outcomes(&self, slug: &str) -> Result<ResolvedOutcomes> {
        let events = self.get_events(slug).await?;
        let event = events
            .into_iter()
            .next()
            .ok_or_else(|| Error::Parse(format!("no event found for slug '{slug}'")))?;

        let outcomes: Vec<(TokenId, String)> = event
            .markets
            .iter()
            .filter_map(|market| {
                let token = market.no_token();
                if token.is_none() {
                    debug!(slug, question = ?market.question, "Market has no \"No\" token, skipping");
                }
                token.map(|id| (TokenId::from(id), market.display_name()))
            })
            .collect();

        info!(
            slug,
            outcomes = outcomes.len(),
            neg_risk = event.neg_risk,
            "Resolved market group"
        );

        Ok(ResolvedOutcomes {
            outcomes,
            neg_risk: event.neg_risk,
        })
    }
}
