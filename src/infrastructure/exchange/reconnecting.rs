//! Reconnection for any [`MarketDataStream`].
//!
//! [`ReconnectingDataStream`] retries a dropped feed with jittered
//! exponential backoff, replays the last subscription after every reconnect
//! and publishes the connection state through [`FeedHealth`]. Once
//! `max_consecutive_failures` attempts fail in a row the circuit breaker
//! pauses retries for the cooldown and the feed is reported
//! [`FeedState::Degraded`], which switches the REST fallback to full polling.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::application::fallback::{FeedHealth, FeedState};
use crate::domain::id::TokenId;
use crate::error::Result;
use crate::infrastructure::config::reconnection::ReconnectionConfig;
use crate::port::{MarketDataStream, MarketEvent};

/// Retry pacing: growing delays plus a failure-count circuit breaker.
#[derive(Debug)]
struct Backoff {
    config: ReconnectionConfig,
    failures: u32,
    delay_ms: u64,
    open_until: Option<Instant>,
}

impl Backoff {
    fn new(config: ReconnectionConfig) -> Self {
        Self {
            delay_ms: config.initial_delay_ms,
            config,
            failures: 0,
            open_until: None,
        }
    }

    fn reset(&mut self) {
        self.failures = 0;
        self.delay_ms = self.config.initial_delay_ms;
        self.open_until = None;
    }

    /// Count one failure. Returns true when it opens the breaker.
    fn fail(&mut self) -> bool {
        self.failures += 1;
        if self.failures < self.config.max_consecutive_failures {
            return false;
        }
        self.open_until = Some(Instant::now() + self.config.circuit_breaker_cooldown());
        true
    }

    /// Cooldown left on an open breaker. An expired breaker closes and the
    /// backoff starts over.
    fn cooldown_remaining(&mut self, now: Instant) -> Option<Duration> {
        let until = self.open_until?;
        if now >= until {
            self.reset();
            return None;
        }
        Some(until - now)
    }

    /// Current delay plus up to 20% jitter; grows the next one.
    fn next_delay(&mut self) -> Duration {
        let base = self.delay_ms;
        let grown = (base as f64 * self.config.backoff_multiplier) as u64;
        self.delay_ms = grown.min(self.config.max_delay_ms);
        Duration::from_millis(base + jitter_ms(base))
    }
}

fn jitter_ms(base_ms: u64) -> u64 {
    let range = base_ms / 5;
    if range == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=range)
}

/// A [`MarketDataStream`] that never gives up.
///
/// Reading events while disconnected reconnects first and then yields
/// [`MarketEvent::Connected`], so the caller sees every recovery. Drops
/// and the end of the inner stream are never surfaced.
pub struct ReconnectingDataStream<S: MarketDataStream> {
    inner: S,
    backoff: Backoff,
    /// Replayed after every reconnect.
    tokens: Vec<TokenId>,
    connected: bool,
    health: FeedHealth,
}

impl<S: MarketDataStream> ReconnectingDataStream<S> {
    pub fn new(inner: S, config: ReconnectionConfig, health: FeedHealth) -> Self {
        Self {
            inner,
            backoff: Backoff::new(config),
            tokens: Vec::new(),
            connected: false,
            health,
        }
    }

    #[must_use]
    pub fn health(&self) -> &FeedHealth {
        &self.health
    }

    fn on_connected(&mut self) {
        self.connected = true;
        self.backoff.reset();
        self.health.set(FeedState::Connected);
    }

    fn on_failure(&mut self) {
        self.connected = false;
        if self.backoff.fail() {
            self.health.set(FeedState::Degraded);
            error!(
                failures = self.backoff.failures,
                cooldown_ms = self.backoff.config.circuit_breaker_cooldown_ms,
                "Circuit breaker tripped, market feed degraded"
            );
        }
    }

    fn on_lost(&mut self) {
        if !self.health.is_degraded() {
            self.health.set(FeedState::Reconnecting);
        }
        self.on_failure();
    }

    /// One paced reconnect attempt, including the subscription replay.
    async fn reconnect(&mut self) -> Result<()> {
        if let Some(wait) = self.backoff.cooldown_remaining(Instant::now()) {
            warn!(
                remaining_ms = wait.as_millis() as u64,
                "Circuit breaker open, waiting for cooldown"
            );
            sleep(wait).await;
            self.backoff.reset();
        }

        let delay = self.backoff.next_delay();
        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = self.backoff.failures + 1,
            "Reconnecting after delay"
        );
        sleep(delay).await;

        if let Err(e) = self.inner.connect().await {
            error!(error = %e, "Reconnection failed");
            self.on_failure();
            return Err(e);
        }
        if !self.tokens.is_empty() {
            if let Err(e) = self.inner.subscribe(&self.tokens).await {
                error!(error = %e, "Resubscribe failed after reconnect");
                self.on_failure();
                return Err(e);
            }
        }

        info!(tokens = self.tokens.len(), "Market feed reconnected");
        self.on_connected();
        Ok(())
    }
}

#[async_trait]
impl<S: MarketDataStream + Send> MarketDataStream for ReconnectingDataStream<S> {
    /// First connection. A failure leaves the feed degraded; the next
    /// [`next_event`](Self::next_event) keeps retrying.
    async fn connect(&mut self) -> Result<()> {
        match self.inner.connect().await {
            Ok(()) => {
                self.on_connected();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Initial connection failed, feed degraded");
                self.on_failure();
                self.health.set(FeedState::Degraded);
                Err(e)
            }
        }
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        self.tokens = token_ids.to_vec();
        if !self.connected {
            debug!(tokens = token_ids.len(), "Not connected, subscription deferred");
            return Ok(());
        }
        self.inner.subscribe(token_ids).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if !self.connected {
                match self.reconnect().await {
                    Ok(()) => return Some(MarketEvent::Connected),
                    Err(e) => {
                        warn!(error = %e, "Reconnection attempt failed, will retry");
                        continue;
                    }
                }
            }

            match self.inner.next_event().await {
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(reason = %reason, "Connection lost, will reconnect");
                    self.on_lost();
                }
                None => {
                    warn!("Market data stream ended, will reconnect");
                    self.on_lost();
                }
                Some(event) => return Some(event),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.inner.close().await
    }

    fn exchange_name(&self) -> &'static str {
        self.inner.exchange_name()
    }
}
