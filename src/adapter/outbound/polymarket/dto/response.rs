//! Polymarket REST response types.
//!
//! Two API surfaces:
//! - **CLOB API** (`clob.polymarket.com`): `GET /book` order-book summaries.
//!   Uses [`PolymarketBookResponse`].
//! - **Gamma API** (`gamma-api.polymarket.com`): `GET /events?slug=` event
//!   lookup. Uses [`GammaEvent`] and [`GammaMarket`].

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::message::PolymarketWsPriceLevel;
use crate::domain::{book::Book, book::PriceLevel, id::TokenId};

/// Order-book summary returned by `GET /book?token_id=`.
#[derive(Debug, Deserialize)]
pub struct PolymarketBookResponse {
    pub asset_id: Option<String>,
    pub market: Option<String>,
    #[serde(default)]
    pub bids: Vec<PolymarketWsPriceLevel>,
    #[serde(default)]
    pub asks: Vec<PolymarketWsPriceLevel>,
    pub tick_size: Option<String>,
}

impl PolymarketBookResponse {
    /// Convert to a domain book for the requested token. The response's own
    /// `asset_id` is ignored so the caller's key always matches.
    #[must_use]
    pub fn to_orderbook(&self, token_id: TokenId) -> Book {
        Book::with_levels(token_id, levels(&self.bids), levels(&self.asks))
    }

    #[must_use]
    pub fn tick_size(&self) -> Option<Decimal> {
        self.tick_size.as_deref()?.parse().ok()
    }
}

fn levels(raw: &[PolymarketWsPriceLevel]) -> Vec<PriceLevel> {
    raw.iter()
        .filter_map(|pl| Some(PriceLevel::new(pl.price.parse().ok()?, pl.size.parse().ok()?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Gamma API types
// ---------------------------------------------------------------------------

/// Event from the Gamma API. A negative-risk event groups one binary market
/// per mutually exclusive outcome.
///
/// Response format: flat JSON array (no wrapper object).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub neg_risk: bool,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// Market data from the Gamma API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(default)]
    pub condition_id: Option<String>,
    /// Market question.
    #[serde(default)]
    pub question: Option<String>,
    /// Short label of this outcome within its event.
    #[serde(default)]
    pub group_item_title: Option<String>,
    #[serde(default)]
    pub closed: bool,
    /// JSON-encoded outcome names (e.g., `["Yes", "No"]`).
    #[serde(default)]
    pub outcomes: Option<String>,
    /// JSON-encoded CLOB token IDs.
    #[serde(default)]
    pub clob_token_ids: Option<String>,
}

impl GammaMarket {
    /// Parse the JSON-encoded CLOB token IDs.
    pub fn token_ids(&self) -> Vec<String> {
        decode_list(self.clob_token_ids.as_deref(), "clobTokenIds")
    }

    /// Parse the JSON-encoded outcome names.
    pub fn outcome_names(&self) -> Vec<String> {
        decode_list(self.outcomes.as_deref(), "outcomes")
    }

    /// Token paying out when this market resolves "No".
    #[must_use]
    pub fn no_token(&self) -> Option<String> {
        let names = self.outcome_names();
        let index = names.iter().position(|n| n.eq_ignore_ascii_case("no"))?;
        self.token_ids().into_iter().nth(index)
    }

    /// Display name: the group label when present, otherwise the question.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.group_item_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.question.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

fn decode_list(raw: Option<&str>, field: &'static str) -> Vec<String> {
    raw.and_then(|s| {
        serde_json::from_str::<Vec<String>>(s)
            .map_err(|e| debug!(error = %e, raw = %s, field, "Failed to decode Gamma list"))
            .ok()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gamma_event_deserializes_from_api_response() {
        let json = r#"[{
            "slug": "who-wins",
            "title": "Who wins?",
            "negRisk": true,
            "markets": [
                {
                    "conditionId": "0xabc",
                    "question": "Will Alice win?",
                    "groupItemTitle": "Alice",
                    "outcomes": "[\"Yes\", \"No\"]",
                    "clobTokenIds": "[\"alice-yes\", \"alice-no\"]"
                },
                {
                    "question": "Will Bob win?",
                    "outcomes": "[\"No\", \"Yes\"]",
                    "clobTokenIds": "[\"bob-no\", \"bob-yes\"]"
                }
            ]
        }]"#;

        let events: Vec<GammaEvent> = serde_json::from_str(json).unwrap();
        let event = &events[0];

        assert!(event.neg_risk);
        assert_eq!(event.markets.len(), 2);
        assert_eq!(event.markets[0].no_token().as_deref(), Some("alice-no"));
        assert_eq!(event.markets[0].display_name(), "Alice");
        assert_eq!(event.markets[1].no_token().as_deref(), Some("bob-no"));
        assert_eq!(event.markets[1].display_name(), "Will Bob win?");
    }

    #[test]
    fn gamma_market_without_no_outcome_has_no_token() {
        let market = GammaMarket {
            condition_id: None,
            question: None,
            group_item_title: None,
            closed: false,
            outcomes: Some(r#"["Up", "Down"]"#.into()),
            clob_token_ids: Some(r#"["u", "d"]"#.into()),
        };
        assert!(market.no_token().is_none());
    }

    #[test]
    fn gamma_market_with_malformed_lists_is_empty() {
        let market = GammaMarket {
            condition_id: None,
            question: Some("q".into()),
            group_item_title: Some(String::new()),
            closed: false,
            outcomes: Some("not json".into()),
            clob_token_ids: None,
        };
        assert!(market.outcome_names().is_empty());
        assert!(market.token_ids().is_empty());
        assert_eq!(market.display_name(), "q");
    }

    #[test]
    fn book_response_uses_requested_token() {
        let json = r#"{
            "market": "0xm",
            "asset_id": "other",
            "bids": [{"price": "0.40", "size": "10"}],
            "asks": [{"price": "0.45", "size": "3"}, {"price": "0.44", "size": "1"}],
            "tick_size": "0.001"
        }"#;
        let response: PolymarketBookResponse = serde_json::from_str(json).unwrap();
        let book = response.to_orderbook(TokenId::from("no-1"));

        assert_eq!(book.token_id().as_str(), "no-1");
        assert_eq!(book.best_ask().unwrap().price(), dec!(0.44));
        assert_eq!(response.tick_size(), Some(dec!(0.001)));
    }
}
