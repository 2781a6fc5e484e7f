//! Polymarket market-channel WebSocket stream.
//!
//! Keeps a full local book per subscribed token so that `price_change`
//! messages, which carry only the touched levels, still yield a correct top
//! of book. A text `PING` is sent on a fixed heartbeat; the server's text
//! `PONG` replies are dropped.
//!
//! # Connection Lifecycle
//!
//! 1. `connect()` opens the socket and clears local books
//! 2. `subscribe()` sends `{"type":"market","assets_ids":[...]}`
//! 3. `next_event()` yields snapshots, deltas and tick-size changes until the
//!    socket closes, then reports `Disconnected`
//!
//! Reconnection is the job of
//! [`ReconnectingDataStream`](crate::infrastructure::exchange::reconnecting::ReconnectingDataStream).

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::dto::message::{PolymarketEvent, PolymarketSubscribeMessage, PolymarketWsMessage};
use crate::domain::{book::Book, id::TokenId};
use crate::error::{Error, Result};
use crate::port::{outbound::exchange::MarketDataStream, outbound::exchange::MarketEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Step {
    Heartbeat,
    Frame(Option<std::result::Result<Message, WsError>>),
}

/// Local full-depth books keyed by token.
#[derive(Debug, Default)]
pub struct LocalBooks {
    books: HashMap<TokenId, Book>,
}

impl LocalBooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.books.clear();
    }

    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<&Book> {
        self.books.get(token_id)
    }

    /// Apply one decoded message and queue the resulting events.
    pub fn apply(&mut self, message: PolymarketWsMessage, out: &mut VecDeque<MarketEvent>) {
        match message {
            PolymarketWsMessage::Event(PolymarketEvent::Book(book))
            | PolymarketWsMessage::LegacyBook(book) => {
                let book = book.to_orderbook();
                let token_id = book.token_id().clone();
                self.books.insert(token_id.clone(), book.clone());
                out.push_back(MarketEvent::BookSnapshot { token_id, book });
            }
            PolymarketWsMessage::Event(PolymarketEvent::PriceChange(change)) => {
                let mut touched: Vec<TokenId> = Vec::new();
                for level in change.level_changes() {
                    let Some(book) = self.books.get_mut(&level.token_id) else {
                        debug!(token = %level.token_id, "Price change before snapshot, ignoring");
                        continue;
                    };
                    book.apply_change(level.side, level.price, level.size);
                    if !touched.contains(&level.token_id) {
                        touched.push(level.token_id);
                    }
                }
                for token_id in touched {
                    if let Some(book) = self.books.get(&token_id) {
                        out.push_back(MarketEvent::BookDelta {
                            token_id,
                            book: book.clone(),
                        });
                    }
                }
            }
            PolymarketWsMessage::Event(PolymarketEvent::TickSizeChange(tick)) => {
                match tick.tick_size() {
                    Some(tick_size) => out.push_back(MarketEvent::TickSizeChanged {
                        token_id: TokenId::from(tick.asset_id),
                        tick_size,
                    }),
                    None => warn!(
                        asset_id = %tick.asset_id,
                        raw = %tick.new_tick_size,
                        "Ignoring invalid tick size"
                    ),
                }
            }
            PolymarketWsMessage::Event(PolymarketEvent::LastTradePrice(trade)) => {
                trace!(asset_id = %trade.asset_id, price = ?trade.price, "Last trade");
            }
            PolymarketWsMessage::Unknown(value) => {
                debug!(message = %value, "Ignoring unrecognized message");
            }
        }
    }
}

/// Polymarket market data stream implementing the `MarketDataStream` trait.
pub struct PolymarketDataStream {
    url: String,
    heartbeat: Duration,
    ws: Option<WsStream>,
    ticker: Option<Interval>,
    books: LocalBooks,
    pending: VecDeque<MarketEvent>,
}

impl PolymarketDataStream {
    /// Create a new data stream for the given WebSocket URL.
    #[must_use]
    pub fn new(url: String, heartbeat: Duration) -> Self {
        Self {
            url,
            heartbeat,
            ws: None,
            ticker: None,
            books: LocalBooks::new(),
            pending: VecDeque::new(),
        }
    }

    fn handle_text(&mut self, text: &str) {
        if text == "PONG" {
            trace!("Received PONG");
            return;
        }
        match PolymarketWsMessage::parse_frame(text) {
            Ok(items) => {
                for item in items {
                    self.books.apply(item, &mut self.pending);
                }
            }
            Err(e) => warn!(error = %e, bytes = text.len(), "Failed to parse message"),
        }
    }

    fn disconnected(&mut self, reason: String) -> Option<MarketEvent> {
        self.ws = None;
        self.ticker = None;
        Some(MarketEvent::Disconnected { reason })
    }
}

#[async_trait]
impl MarketDataStream for PolymarketDataStream {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to WebSocket");
        let (ws_stream, response) = connect_async(&self.url).await?;
        info!(status = %response.status(), "WebSocket connected");

        let mut ticker = interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.ws = Some(ws_stream);
        self.ticker = Some(ticker);
        self.books.clear();
        self.pending.clear();
        Ok(())
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Connection("Not connected".into()))?;

        let asset_ids: Vec<String> = token_ids.iter().map(|t| t.as_str().to_string()).collect();
        let msg = PolymarketSubscribeMessage::new(asset_ids.clone());
        let json = serde_json::to_string(&msg)?;

        // Log a truncated view of assets to avoid spam
        let total = asset_ids.len();
        if total <= 5 {
            info!(assets = ?asset_ids, "Subscribing to assets");
        } else {
            let preview: Vec<_> = asset_ids.iter().take(5).collect();
            info!(assets = ?preview, more = total - 5, "Subscribing to assets");
        }
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            let step = {
                let (Some(ws), Some(ticker)) = (self.ws.as_mut(), self.ticker.as_mut()) else {
                    return None;
                };
                tokio::select! {
                    _ = ticker.tick() => Step::Heartbeat,
                    frame = ws.next() => Step::Frame(frame),
                }
            };

            match step {
                Step::Heartbeat => {
                    trace!("Sending PING");
                    let ws = self.ws.as_mut()?;
                    if let Err(e) = ws.send(Message::Text("PING".into())).await {
                        return self.disconnected(format!("heartbeat failed: {e}"));
                    }
                }
                Step::Frame(Some(Ok(Message::Text(text)))) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    self.handle_text(&text);
                }
                Step::Frame(Some(Ok(Message::Ping(data)))) => {
                    trace!("Received WebSocket ping");
                    let ws = self.ws.as_mut()?;
                    if ws.send(Message::Pong(data)).await.is_err() {
                        return self.disconnected("Failed to send pong".into());
                    }
                }
                Step::Frame(Some(Ok(Message::Close(frame)))) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    return self.disconnected(reason);
                }
                Step::Frame(Some(Ok(_))) => {}
                Step::Frame(Some(Err(e))) => {
                    error!(error = %e, "WebSocket error");
                    return self.disconnected(e.to_string());
                }
                Step::Frame(None) => return self.disconnected("stream ended".into()),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.ticker = None;
        if let Some(mut ws) = self.ws.take() {
            ws.close(None).await?;
        }
        Ok(())
    }

    fn exchange_name(&self) -> &'static str {
        "Polymarket"
    }
}
