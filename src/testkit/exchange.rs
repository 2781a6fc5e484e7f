//! In-memory exchange collaborators.
//!
//! - [`MockOrderService`]: records every order and cancel, fails chosen
//!   tokens, and lets tests mark resting orders as filled.
//! - [`MockBookSource`]: serves scripted books and tracks call concurrency.
//! - [`StaticResolver`]: answers slug lookups from a fixed table.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{book::Book, id::OrderId, id::TokenId, money::Volume};
use crate::error::{Error, ExecutionError, Result};
use crate::port::{
    MarketResolver, OrderAck, OrderBookSource, OrderRequest, OrderService, OrderState,
    OrderStatus, ResolvedOutcomes,
};

// ---------------------------------------------------------------------------
// MockOrderService
// ---------------------------------------------------------------------------

/// Recording order service.
#[derive(Default)]
pub struct MockOrderService {
    posted: Mutex<Vec<(OrderId, OrderRequest)>>,
    cancelled: Mutex<Vec<OrderId>>,
    statuses: Mutex<HashMap<OrderId, OrderStatus>>,
    failing_tokens: HashSet<TokenId>,
    fail_cancels: bool,
    delay: Duration,
    next_id: AtomicU64,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl MockOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every order for this token.
    pub fn fail_token(mut self, token: &str) -> Self {
        self.failing_tokens.insert(TokenId::from(token));
        self
    }

    /// Reject every cancel.
    pub fn fail_cancels(mut self) -> Self {
        self.fail_cancels = true;
        self
    }

    /// Sleep before answering each post.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every order posted so far, in submission order.
    pub fn posted(&self) -> Vec<OrderRequest> {
        self.posted.lock().iter().map(|(_, o)| o.clone()).collect()
    }

    /// Orders posted for one token.
    pub fn posted_for(&self, token: &str) -> Vec<OrderRequest> {
        self.posted
            .lock()
            .iter()
            .filter(|(_, o)| o.token_id.as_str() == token)
            .map(|(_, o)| o.clone())
            .collect()
    }

    /// Every order id cancelled so far.
    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().clone()
    }

    /// Highest number of posts observed in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    /// Mark the most recent order for `token` as filled by `size`.
    ///
    /// Returns the order id, or `None` if nothing was posted for the token.
    pub fn fill_latest(&self, token: &str, size: Volume) -> Option<OrderId> {
        let order_id = self
            .posted
            .lock()
            .iter()
            .rev()
            .find(|(_, o)| o.token_id.as_str() == token)
            .map(|(id, _)| id.clone())?;
        self.fill_order(&order_id, size);
        Some(order_id)
    }

    /// Mark a specific order as filled by `size`.
    pub fn fill_order(&self, order_id: &OrderId, size: Volume) {
        let Some(original) = self
            .posted
            .lock()
            .iter()
            .find(|(id, _)| id == order_id)
            .map(|(_, o)| o.size)
        else {
            return;
        };
        let state = if size >= original {
            OrderState::Matched
        } else {
            OrderState::Live
        };
        self.statuses.lock().insert(
            order_id.clone(),
            OrderStatus {
                state,
                original_size: original,
                size_matched: size,
            },
        );
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.posted.lock().clear();
        self.cancelled.lock().clear();
    }
}

#[async_trait]
impl OrderService for MockOrderService {
    async fn post_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        let order_id = OrderId::new(format!(
            "order-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        self.posted.lock().push((order_id.clone(), order.clone()));

        if self.failing_tokens.contains(&order.token_id) {
            return Err(ExecutionError::OrderRejected(format!(
                "scripted rejection for {}",
                order.token_id
            ))
            .into());
        }

        self.statuses.lock().insert(
            order_id.clone(),
            OrderStatus {
                state: OrderState::Live,
                original_size: order.size,
                size_matched: Decimal::ZERO,
            },
        );
        Ok(OrderAck { order_id })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        self.cancelled.lock().push(order_id.clone());
        if self.fail_cancels {
            return Err(ExecutionError::OrderRejected("scripted cancel failure".into()).into());
        }
        if let Some(status) = self.statuses.lock().get_mut(order_id) {
            status.state = OrderState::Cancelled;
        }
        Ok(())
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
        self.statuses.lock().get(order_id).copied().ok_or_else(|| {
            ExecutionError::StatusUnavailable {
                order_id: order_id.to_string(),
                reason: "unknown order".into(),
            }
            .into()
        })
    }

    fn exchange_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockBookSource
// ---------------------------------------------------------------------------

/// Scripted REST order-book source.
#[derive(Default)]
pub struct MockBookSource {
    books: Mutex<HashMap<TokenId, Book>>,
    calls: Mutex<Vec<TokenId>>,
    delay: Duration,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl MockBookSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Serve `book` for its token from now on.
    pub fn set_book(&self, book: Book) {
        self.books.lock().insert(book.token_id().clone(), book);
    }

    /// Tokens requested so far, in call order.
    pub fn calls(&self) -> Vec<TokenId> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Highest number of fetches observed in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderBookSource for MockBookSource {
    async fn order_book(&self, token_id: &TokenId) -> Result<Book> {
        self.calls.lock().push(token_id.clone());
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        self.books
            .lock()
            .get(token_id)
            .cloned()
            .ok_or_else(|| Error::Connection(format!("no book for {token_id}")))
    }
}

// ---------------------------------------------------------------------------
// StaticResolver
// ---------------------------------------------------------------------------

/// Market resolver backed by a fixed table.
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, ResolvedOutcomes>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slug: &str, outcomes: &[(&str, &str)], neg_risk: bool) -> Self {
        self.entries.insert(
            slug.to_string(),
            ResolvedOutcomes {
                outcomes: outcomes
                    .iter()
                    .map(|(id, name)| (TokenId::from(*id), (*name).to_string()))
                    .collect(),
                neg_risk,
            },
        );
        self
    }
}

#[async_trait]
impl MarketResolver for StaticResolver {
    async fn resolve_outcomes(&self, slug: &str) -> Result<ResolvedOutcomes> {
        self.entries
            .get(slug)
            .cloned()
            .ok_or_else(|| Error::Parse(format!("no market found for slug: {slug}")))
    }
}
