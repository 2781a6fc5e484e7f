//! Mock [`MarketDataStream`] implementations for testing.
//!
//! - [`ScriptedStream`]: Pre-loaded connect/subscribe results and events.
//!   Best for: error handling, reconnection logic, retry behavior.
//!
//! - [`ChannelStream`]: Channel-backed stream with external control handle.
//!   Best for: engine tests needing precise, on-demand event delivery and
//!   connection failures injected mid-run.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::id::TokenId;
use crate::error::{Error, Result};
use crate::port::{MarketDataStream, MarketEvent};

// ---------------------------------------------------------------------------
// ScriptedStream
// ---------------------------------------------------------------------------

/// A mock stream with scripted connect/subscribe results and a fixed event queue.
///
/// Each call to `connect()` or `subscribe()` pops the next result from the
/// corresponding queue (defaults to `Ok(())` when exhausted). Once the event
/// queue is drained, `next_event()` returns `None`.
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    subscribe_results: VecDeque<Result<()>>,
    events: VecDeque<Option<MarketEvent>>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            subscribe_results: VecDeque::new(),
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            subscribe_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_subscribe_results(mut self, results: Vec<Result<()>>) -> Self {
        self.subscribe_results = results.into();
        self
    }

    pub fn with_events(mut self, events: Vec<Option<MarketEvent>>) -> Self {
        self.events = events.into();
        self
    }

    /// Get shared counters for asserting connect/subscribe call counts.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.connect_count.clone(), self.subscribe_count.clone())
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn subscribe(&mut self, _token_ids: &[TokenId]) -> Result<()> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        self.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        self.events.pop_front().flatten()
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// ChannelStream
// ---------------------------------------------------------------------------

/// A mock stream controlled externally via a [`ChannelStreamHandle`].
///
/// Events sent through the handle are returned by `next_event()`. Connect
/// attempts can be made to fail on demand.
pub struct ChannelStream {
    event_rx: mpsc::Receiver<Option<MarketEvent>>,
    shared: Arc<ChannelShared>,
}

#[derive(Default)]
struct ChannelShared {
    connect_count: AtomicU32,
    subscribe_count: AtomicU32,
    close_count: AtomicU32,
    failing_connects: AtomicU32,
    subscribed_tokens: Mutex<Vec<TokenId>>,
}

/// Control handle for a [`ChannelStream`].
#[derive(Clone)]
pub struct ChannelStreamHandle {
    event_tx: mpsc::Sender<Option<MarketEvent>>,
    shared: Arc<ChannelShared>,
}

impl ChannelStreamHandle {
    /// Send an event to the stream.
    pub async fn send(&self, event: MarketEvent) {
        let _ = self.event_tx.send(Some(event)).await;
    }

    /// Signal end-of-stream (causes `next_event` to return `None` once).
    pub async fn end(&self) {
        let _ = self.event_tx.send(None).await;
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.shared.failing_connects.store(n, Ordering::SeqCst);
    }

    /// How many times `connect()` was called.
    pub fn connect_count(&self) -> u32 {
        self.shared.connect_count.load(Ordering::SeqCst)
    }

    /// How many times `subscribe()` was called.
    pub fn subscribe_count(&self) -> u32 {
        self.shared.subscribe_count.load(Ordering::SeqCst)
    }

    /// How many times `close()` was called.
    pub fn close_count(&self) -> u32 {
        self.shared.close_count.load(Ordering::SeqCst)
    }

    /// Which tokens were last subscribed to.
    pub fn subscribed_tokens(&self) -> Vec<TokenId> {
        self.shared.subscribed_tokens.lock().clone()
    }
}

/// Create a [`ChannelStream`] and its control [`ChannelStreamHandle`].
pub fn channel_stream(buffer: usize) -> (ChannelStream, ChannelStreamHandle) {
    let (tx, rx) = mpsc::channel(buffer);
    let shared = Arc::new(ChannelShared::default());
    (
        ChannelStream {
            event_rx: rx,
            shared: Arc::clone(&shared),
        },
        ChannelStreamHandle {
            event_tx: tx,
            shared,
        },
    )
}

#[async_trait]
impl MarketDataStream for ChannelStream {
    async fn connect(&mut self) -> Result<()> {
        self.shared.connect_count.fetch_add(1, Ordering::SeqCst);
        let failing = self.shared.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.shared
                .failing_connects
                .store(failing - 1, Ordering::SeqCst);
            return Err(Error::Connection("scripted connect failure".to_string()));
        }
        Ok(())
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        self.shared.subscribe_count.fetch_add(1, Ordering::SeqCst);
        *self.shared.subscribed_tokens.lock() = token_ids.to_vec();
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        match self.event_rx.recv().await {
            Some(Some(event)) => Some(event),
            Some(None) => None,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.shared.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}
