//! Resting-bid table shared between maker-taker loops and read-only views.

use std::collections::BTreeMap;

use dashmap::DashMap;

use crate::domain::{id::TokenId, resting::BidState, resting::RestingBid};

/// Bid state per (group, outcome).
///
/// Each group is written by exactly one maker-taker loop; other tasks only
/// read. Groups are sharded independently.
#[derive(Default)]
pub struct RestingBids {
    groups: DashMap<String, BTreeMap<TokenId, BidState>>,
}

impl RestingBids {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `Absent` if never set.
    #[must_use]
    pub fn get(&self, group: &str, token_id: &TokenId) -> BidState {
        self.groups
            .get(group)
            .and_then(|bids| bids.get(token_id).cloned())
            .unwrap_or_default()
    }

    pub fn set(&self, group: &str, token_id: &TokenId, state: BidState) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(token_id.clone(), state);
    }

    /// Every outcome of `group` with a state other than `Absent`.
    #[must_use]
    pub fn states(&self, group: &str) -> Vec<(TokenId, BidState)> {
        self.groups.get(group).map_or_else(Vec::new, |bids| {
            bids.iter()
                .filter(|(_, state)| **state != BidState::Absent)
                .map(|(id, state)| (id.clone(), state.clone()))
                .collect()
        })
    }

    /// Orders currently on the book for `group`.
    #[must_use]
    pub fn resting(&self, group: &str) -> Vec<(TokenId, RestingBid)> {
        self.states(group)
            .into_iter()
            .filter_map(|(id, state)| state.resting().cloned().map(|bid| (id, bid)))
            .collect()
    }

    /// Total resting orders across all groups.
    #[must_use]
    pub fn resting_count(&self) -> usize {
        self.groups
            .iter()
            .map(|bids| bids.values().filter(|s| s.resting().is_some()).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::OrderId;
    use rust_decimal_macros::dec;

    fn resting(id: &str) -> BidState {
        BidState::Resting(RestingBid {
            order_id: OrderId::from(id),
            price: dec!(0.4),
            size: dec!(5),
        })
    }

    #[test]
    fn test_unknown_entry_is_absent() {
        let bids = RestingBids::new();
        assert_eq!(bids.get("g", &TokenId::from("a")), BidState::Absent);
        assert!(bids.states("g").is_empty());
    }

    #[test]
    fn test_resting_lists_only_open_orders() {
        let bids = RestingBids::new();
        bids.set("g", &TokenId::from("a"), resting("o1"));
        bids.set("g", &TokenId::from("b"), BidState::Swept);
        bids.set("g", &TokenId::from("c"), BidState::Absent);
        bids.set("h", &TokenId::from("d"), resting("o2"));

        let open = bids.resting("g");
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].1.order_id, OrderId::from("o1"));
        assert_eq!(bids.states("g").len(), 2);
        assert_eq!(bids.resting_count(), 2);
    }
}
