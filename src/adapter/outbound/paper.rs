//! Paper order service for dry runs.
//!
//! Accepts every order, assigns it a random id and remembers it as live.
//! Nothing ever fills, so the maker-taker strategy keeps requoting and the
//! taker strategy logs what it would have sent.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::domain::id::OrderId;
use crate::error::{ExecutionError, Result};
use crate::port::outbound::exchange::{
    OrderAck, OrderRequest, OrderService, OrderState, OrderStatus,
};

/// In-memory order service that never trades.
#[derive(Default)]
pub struct PaperOrderService {
    orders: DashMap<OrderId, OrderStatus>,
}

impl PaperOrderService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders accepted and not cancelled.
    #[must_use]
    pub fn open_orders(&self) -> usize {
        self.orders
            .iter()
            .filter(|entry| entry.value().state == OrderState::Live)
            .count()
    }
}

#[async_trait]
impl OrderService for PaperOrderService {
    async fn post_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let order_id = OrderId::new(format!("paper-{}", Uuid::new_v4()));
        info!(
            order_id = %order_id,
            token_id = %order.token_id,
            side = ?order.side,
            price = %order.price,
            size = %order.size,
            tif = ?order.time_in_force,
            "[DRY RUN] Order accepted"
        );
        self.orders.insert(
            order_id.clone(),
            OrderStatus {
                state: OrderState::Live,
                original_size: order.size,
                size_matched: rust_decimal::Decimal::ZERO,
            },
        );
        Ok(OrderAck { order_id })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let mut status = self.orders.get_mut(order_id).ok_or_else(|| {
            ExecutionError::OrderRejected(format!("unknown paper order {order_id}"))
        })?;
        status.state = OrderState::Cancelled;
        info!(order_id = %order_id, "[DRY RUN] Order cancelled");
        Ok(())
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        self.orders
            .get(order_id)
            .map(|status| *status)
            .ok_or_else(|| {
                ExecutionError::StatusUnavailable {
                    order_id: order_id.to_string(),
                    reason: "unknown paper order".into(),
                }
                .into()
            })
    }

    fn exchange_name(&self) -> &'static str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::TokenId;
    use crate::port::outbound::exchange::TimeInForce;
    use rust_decimal_macros::dec;

    fn bid() -> OrderRequest {
        OrderRequest::buy(TokenId::from("no-1"), dec!(0.40), dec!(5), TimeInForce::Gtc)
    }

    #[tokio::test]
    async fn accepted_orders_stay_live_and_unfilled() {
        let service = PaperOrderService::new();
        let ack = service.post_order(&bid()).await.unwrap();

        assert!(ack.order_id.as_str().starts_with("paper-"));
        let status = service.order_status(&ack.order_id).await.unwrap();
        assert_eq!(status.state, OrderState::Live);
        assert!(!status.has_fill());
        assert_eq!(service.open_orders(), 1);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let service = PaperOrderService::new();
        let a = service.post_order(&bid()).await.unwrap();
        let b = service.post_order(&bid()).await.unwrap();
        assert_ne!(a.order_id, b.order_id);
    }

    #[tokio::test]
    async fn cancel_marks_order_cancelled() {
        let service = PaperOrderService::new();
        let ack = service.post_order(&bid()).await.unwrap();

        service.cancel_order(&ack.order_id).await.unwrap();

        let status = service.order_status(&ack.order_id).await.unwrap();
        assert_eq!(status.state, OrderState::Cancelled);
        assert_eq!(service.open_orders(), 0);
    }

    #[tokio::test]
    async fn unknown_orders_are_errors() {
        let service = PaperOrderService::new();
        let missing = OrderId::new("nope");
        assert!(service.cancel_order(&missing).await.is_err());
        assert!(service.order_status(&missing).await.is_err());
    }
}
