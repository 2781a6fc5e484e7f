//! Polymarket WebSocket message types.
//!
//! The market channel pushes JSON objects tagged by `event_type` (`book`,
//! `price_change`, `tick_size_change`, `last_trade_price`). Older servers
//! send untagged book objects that use either `bids`/`asks` or `buys`/`sells`,
//! and frames are sometimes wrapped in a JSON array.
//!
//! Example frames:
//! ```json
//! {"event_type":"book","asset_id":"123","bids":[{"price":"0.45","size":"10"}],"asks":[]}
//! [{"asset_id":"123","buys":[],"sells":[{"price":"0.55","size":"5"}]}]
//! {"event_type":"price_change","market":"0x..","price_changes":[{"asset_id":"123","price":"0.5","side":"SELL","size":"0"}]}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    book::{Book, BookSide, PriceLevel},
    id::TokenId,
};

/// Subscription request sent to Polymarket WebSocket
#[derive(Debug, Serialize)]
pub struct PolymarketSubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl PolymarketSubscribeMessage {
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "market".into(),
        }
    }
}

/// A tagged market-channel event.
#[derive(Debug, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PolymarketEvent {
    Book(PolymarketBookMessage),
    PriceChange(PolymarketPriceChangeMessage),
    TickSizeChange(PolymarketTickSizeMessage),
    LastTradePrice(PolymarketLastTradeMessage),
}

/// One decoded element of a frame.
#[derive(Debug)]
pub enum PolymarketWsMessage {
    Event(PolymarketEvent),
    /// Untagged book object.
    LegacyBook(PolymarketBookMessage),
    Unknown(Value),
}

impl PolymarketWsMessage {
    /// Decode a text frame into its elements. Arrays are flattened; objects
    /// that match no known shape come back as `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not JSON.
    pub fn parse_frame(text: &str) -> Result<Vec<Self>, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(match value {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            other => vec![Self::from_value(other)],
        })
    }

    fn from_value(value: Value) -> Self {
        if value.get("event_type").is_some() {
            return match serde_json::from_value::<PolymarketEvent>(value.clone()) {
                Ok(event) => Self::Event(event),
                Err(_) => Self::Unknown(value),
            };
        }
        if value.get("asset_id").is_some() {
            if let Ok(book) = serde_json::from_value::<PolymarketBookMessage>(value.clone()) {
                return Self::LegacyBook(book);
            }
        }
        Self::Unknown(value)
    }
}

/// Full book for one token.
#[derive(Debug, Deserialize)]
pub struct PolymarketBookMessage {
    pub asset_id: String,
    pub market: Option<String>,
    #[serde(default)]
    pub bids: Vec<PolymarketWsPriceLevel>,
    #[serde(default)]
    pub asks: Vec<PolymarketWsPriceLevel>,
    #[serde(default)]
    pub buys: Vec<PolymarketWsPriceLevel>,
    #[serde(default)]
    pub sells: Vec<PolymarketWsPriceLevel>,
    pub timestamp: Option<String>,
    pub hash: Option<String>,
}

impl PolymarketBookMessage {
    /// Convert this WebSocket message to a domain `Book`.
    ///
    /// `buys`/`sells` are used only when `bids`/`asks` are absent.
    #[must_use]
    pub fn to_orderbook(&self) -> Book {
        let token_id = TokenId::from(self.asset_id.clone());
        let bids = if self.bids.is_empty() {
            &self.buys
        } else {
            &self.bids
        };
        let asks = if self.asks.is_empty() {
            &self.sells
        } else {
            &self.asks
        };
        Book::with_levels(token_id, parse_levels(bids), parse_levels(asks))
    }
}

fn parse_levels(levels: &[PolymarketWsPriceLevel]) -> Vec<PriceLevel> {
    levels
        .iter()
        .filter_map(|pl| {
            Some(PriceLevel::new(
                pl.price.parse().ok()?,
                pl.size.parse().ok()?,
            ))
        })
        .collect()
}

/// Price level as received from WebSocket (strings, not decimals)
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketWsPriceLevel {
    pub price: String,
    pub size: String,
}

/// Incremental level changes.
///
/// Older servers put one `asset_id` on the message with a `changes` list;
/// newer ones send `price_changes` where every entry names its asset.
#[derive(Debug, Deserialize)]
pub struct PolymarketPriceChangeMessage {
    pub asset_id: Option<String>,
    pub market: Option<String>,
    #[serde(default)]
    pub changes: Vec<PolymarketLevelChange>,
    #[serde(default)]
    pub price_changes: Vec<PolymarketAssetLevelChange>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketLevelChange {
    pub price: String,
    pub side: String,
    pub size: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketAssetLevelChange {
    pub asset_id: String,
    pub price: String,
    pub side: String,
    pub size: String,
}

/// A decoded level change ready to apply to a local book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    pub token_id: TokenId,
    pub side: BookSide,
    pub price: Decimal,
    pub size: Decimal,
}

impl PolymarketPriceChangeMessage {
    /// All well-formed changes in message order. Entries with an unknown side
    /// or unparseable numbers are dropped.
    #[must_use]
    pub fn level_changes(&self) -> Vec<LevelChange> {
        let legacy = self.asset_id.iter().flat_map(|asset_id| {
            self.changes
                .iter()
                .filter_map(move |c| level_change(asset_id, &c.side, &c.price, &c.size))
        });
        let batched = self
            .price_changes
            .iter()
            .filter_map(|c| level_change(&c.asset_id, &c.side, &c.price, &c.size));
        legacy.chain(batched).collect()
    }
}

fn level_change(asset_id: &str, side: &str, price: &str, size: &str) -> Option<LevelChange> {
    let side = match side.to_ascii_uppercase().as_str() {
        "BUY" => BookSide::Bid,
        "SELL" => BookSide::Ask,
        _ => return None,
    };
    Some(LevelChange {
        token_id: TokenId::from(asset_id),
        side,
        price: price.parse().ok()?,
        size: size.parse().ok()?,
    })
}

#[derive(Debug, Deserialize)]
pub struct PolymarketTickSizeMessage {
    pub asset_id: String,
    pub old_tick_size: Option<String>,
    pub new_tick_size: String,
}

impl PolymarketTickSizeMessage {
    #[must_use]
    pub fn tick_size(&self) -> Option<Decimal> {
        self.new_tick_size
            .parse()
            .ok()
            .filter(|tick: &Decimal| *tick > Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
pub struct PolymarketLastTradeMessage {
    pub asset_id: String,
    pub price: Option<String>,
    pub size: Option<String>,
}
