//! Live order service for the Polymarket CLOB.
//!
//! Provides the [`PolymarketExecutor`] adapter that builds, signs, posts,
//! cancels and inspects orders through the Polymarket SDK. Only compiled with
//! the `polymarket` feature; the default build trades against
//! [`PaperOrderService`](crate::adapter::outbound::paper::PaperOrderService).

use std::str::FromStr;
use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Normal, Signer};
use polymarket_client_sdk::clob::types::Side;
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::U256;
use tracing::{debug, info};

use super::settings::PolymarketRuntimeConfig;
use crate::domain::id::OrderId;
use crate::error::{ConfigError, ExecutionError, Result};
use crate::port::outbound::exchange::{
    OrderAck, OrderRequest, OrderService, OrderSide, OrderState, OrderStatus,
};

/// Type alias for the authenticated CLOB client.
type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Order service backed by the Polymarket CLOB.
///
/// Every order is a limit order at the request price. Taker legs are priced
/// through the touch, so they cross immediately; maker bids rest until
/// cancelled.
pub struct PolymarketExecutor {
    /// Authenticated CLOB client for API communication.
    client: Arc<AuthenticatedClient>,
    /// Local signer for order signatures.
    signer: Arc<PrivateKeySigner>,
}

impl PolymarketExecutor {
    /// Create a new executor by authenticating with the Polymarket CLOB.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is missing or invalid, or if
    /// CLOB authentication fails.
    pub async fn new(config: &PolymarketRuntimeConfig) -> Result<Self> {
        if config.private_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "WALLET_PRIVATE_KEY",
            }
            .into());
        }

        let chain_id = config.chain_id;

        let signer = PrivateKeySigner::from_str(config.private_key.trim())
            .map_err(|e| ConfigError::InvalidValue {
                field: "WALLET_PRIVATE_KEY",
                reason: e.to_string(),
            })?
            .with_chain_id(Some(chain_id));

        info!(
            chain_id = chain_id,
            address = %signer.address(),
            "Creating CLOB client"
        );

        let client = Client::new(&config.api_url, ClobConfig::default())
            .map_err(|e| ExecutionError::AuthFailed(format!("Failed to create CLOB client: {e}")))?
            .authentication_builder(&signer)
            .authenticate()
            .await
            .map_err(|e| ExecutionError::AuthFailed(e.to_string()))?;

        info!("CLOB client authenticated successfully");

        Ok(Self {
            client: Arc::new(client),
            signer: Arc::new(signer),
        })
    }

    fn parse_token(token_id: &str) -> Result<U256> {
        Ok(
            U256::from_str(token_id).map_err(|e| ExecutionError::InvalidTokenId {
                token_id: token_id.to_string(),
                reason: e.to_string(),
            })?,
        )
    }
}

/// Map the exchange's status label onto the engine's lifecycle states.
fn order_state(label: &str) -> OrderState {
    let label = label.to_ascii_lowercase();
    if label.contains("cancel") {
        OrderState::Cancelled
    } else if label.contains("unmatched") || label.contains("live") || label.contains("delayed") {
        OrderState::Live
    } else if label.contains("match") {
        OrderState::Matched
    } else {
        OrderState::Unknown
    }
}

#[async_trait]
impl OrderService for PolymarketExecutor {
    async fn post_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let token = Self::parse_token(order.token_id.as_str())?;
        let side = match order.side {
            OrderSide::Buy => Side::Buy,
            OrderSide::Sell => Side::Sell,
        };

        let unsigned = self
            .client
            .limit_order()
            .token_id(token)
            .side(side)
            .price(order.price)
            .size(order.size)
            .build()
            .await
            .map_err(|e| ExecutionError::OrderBuildFailed(e.to_string()))?;

        let signed = self
            .client
            .sign(self.signer.as_ref(), unsigned)
            .await
            .map_err(|e| ExecutionError::SigningFailed(e.to_string()))?;

        let response = self
            .client
            .post_order(signed)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(e.to_string()))?;

        if response.order_id.is_empty() {
            return Err(ExecutionError::OrderRejected(format!(
                "no order id returned for {}",
                order.token_id
            ))
            .into());
        }

        info!(
            order_id = %response.order_id,
            token_id = %order.token_id,
            side = ?order.side,
            size = %order.size,
            price = %order.price,
            tif = ?order.time_in_force,
            "Order submitted"
        );

        Ok(OrderAck {
            order_id: OrderId::new(response.order_id),
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let response = self
            .client
            .cancel_order(order_id.as_str())
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(format!("Cancel failed: {e}")))?;

        if let Some(reason) = response.not_canceled.get(order_id.as_str()) {
            return Err(ExecutionError::OrderRejected(format!(
                "Order {} not cancelled: {}",
                order_id.as_str(),
                reason
            ))
            .into());
        }

        info!(order_id = %order_id, "Order cancelled");
        Ok(())
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        let order = self.client.order(order_id.as_str()).await.map_err(|e| {
            ExecutionError::StatusUnavailable {
                order_id: order_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let state = order_state(&format!("{:?}", order.status));
        debug!(order_id = %order_id, state = ?state, matched = %order.size_matched, "Order status");

        Ok(OrderStatus {
            state,
            original_size: order.original_size,
            size_matched: order.size_matched,
        })
    }

    fn exchange_name(&self) -> &'static str {
        "Polymarket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_map_to_states() {
        assert_eq!(order_state("LIVE"), OrderState::Live);
        assert_eq!(order_state("Delayed"), OrderState::Live);
        assert_eq!(order_state("MATCHED"), OrderState::Matched);
        assert_eq!(order_state("Canceled"), OrderState::Cancelled);
        assert_eq!(order_state("CANCELED_MARKET_RESOLVED"), OrderState::Cancelled);
        assert_eq!(order_state("UNMATCHED"), OrderState::Live);
        assert_eq!(order_state("weird"), OrderState::Unknown);
    }

    #[test]
    fn invalid_token_id_is_rejected() {
        let err = PolymarketExecutor::parse_token("not-a-number").unwrap_err();
        assert!(err.to_string().contains("invalid token ID"));
    }

    #[tokio::test]
    async fn missing_private_key_is_config_error() {
        let config = PolymarketRuntimeConfig {
            private_key: "   ".into(),
            chain_id: 137,
            api_url: "https://clob.polymarket.com".into(),
        };
        let err = PolymarketExecutor::new(&config).await.err().unwrap();
        assert!(err.to_string().contains("WALLET_PRIVATE_KEY"));
    }
}
