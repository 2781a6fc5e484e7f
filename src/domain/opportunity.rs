//! Negative-risk arbitrage economics.
//!
//! Buying one share of every liquid outcome in a mutually exclusive set of
//! `k` outcomes pays `k - 1` (every outcome but the winner), so the edge is
//! `(k - 1) - Σ asks`.
//!
//! ```
//! use negrisk::domain::opportunity::{Decision, Economics};
//! use rust_decimal_macros::dec;
//!
//! let econ = Economics::from_asks([dec!(0.30), dec!(0.33), dec!(0.34)]).unwrap();
//! assert_eq!(econ.payout, dec!(2));
//! assert_eq!(econ.edge, dec!(1.03));
//! assert_eq!(econ.decide(dec!(0.01), dec!(1.00)), Decision::Execute);
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::TokenId;
use super::money::{Price, Volume};

/// Cost, payout and edge for one set of liquid asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Economics {
    /// Number of liquid outcomes.
    pub k: usize,
    /// Sum of asks.
    pub cost: Decimal,
    /// Guaranteed payout, `k - 1`.
    pub payout: Decimal,
    /// `payout - cost`.
    pub edge: Decimal,
}

/// What to do with an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Edge clears the threshold and cost fits the budget.
    Execute,
    /// Edge clears the threshold but cost exceeds the budget.
    OverBudget,
    /// Edge does not clear the threshold.
    BelowEdge,
}

impl Economics {
    /// Compute economics over liquid asks. Returns `None` when fewer than two
    /// asks are supplied.
    pub fn from_asks(asks: impl IntoIterator<Item = Price>) -> Option<Self> {
        let (k, cost) = asks
            .into_iter()
            .fold((0usize, Decimal::ZERO), |(k, cost), ask| (k + 1, cost + ask));
        if k < 2 {
            return None;
        }
        let payout = Decimal::from(k - 1);
        Some(Self {
            k,
            cost,
            payout,
            edge: payout - cost,
        })
    }

    /// Apply the execution rule: `edge > min_edge` and `cost <= budget`.
    #[must_use]
    pub fn decide(&self, min_edge: Decimal, budget: Decimal) -> Decision {
        if self.edge <= min_edge {
            Decision::BelowEdge
        } else if self.cost > budget {
            Decision::OverBudget
        } else {
            Decision::Execute
        }
    }

    /// Edge as a percentage of payout.
    #[must_use]
    pub fn edge_percent(&self) -> Decimal {
        if self.payout.is_zero() {
            return Decimal::ZERO;
        }
        self.edge / self.payout * Decimal::ONE_HUNDRED
    }
}

/// One outcome leg of an opportunity: the ask it was priced from and the
/// size available there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpportunityLeg {
    token_id: TokenId,
    ask: Price,
    ask_size: Volume,
}

impl OpportunityLeg {
    #[must_use]
    pub fn new(token_id: TokenId, ask: Price, ask_size: Volume) -> Self {
        Self {
            token_id,
            ask,
            ask_size,
        }
    }

    #[must_use]
    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub fn ask(&self) -> Price {
        self.ask
    }

    #[must_use]
    pub fn ask_size(&self) -> Volume {
        self.ask_size
    }
}

/// An evaluated arbitrage opportunity for one market group.
///
/// Ephemeral: built from one cache snapshot and consumed in the same
/// evaluation cycle.
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    group: String,
    legs: Vec<OpportunityLeg>,
    economics: Economics,
    budget: Decimal,
    decision: Decision,
    detected_at: DateTime<Utc>,
    captured_at: Instant,
}

impl ArbitrageOpportunity {
    /// Evaluate liquid legs against the threshold and budget.
    ///
    /// Returns `None` when fewer than two legs are liquid.
    #[must_use]
    pub fn evaluate(
        group: impl Into<String>,
        legs: Vec<OpportunityLeg>,
        min_edge: Decimal,
        budget: Decimal,
        captured_at: Instant,
    ) -> Option<Self> {
        let economics = Economics::from_asks(legs.iter().map(OpportunityLeg::ask))?;
        let decision = economics.decide(min_edge, budget);
        Some(Self {
            group: group.into(),
            legs,
            economics,
            budget,
            decision,
            detected_at: Utc::now(),
            captured_at,
        })
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn legs(&self) -> &[OpportunityLeg] {
        &self.legs
    }

    #[must_use]
    pub fn economics(&self) -> &Economics {
        &self.economics
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.economics.k
    }

    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.economics.cost
    }

    #[must_use]
    pub fn payout(&self) -> Decimal {
        self.economics.payout
    }

    #[must_use]
    pub fn edge(&self) -> Decimal {
        self.economics.edge
    }

    #[must_use]
    pub fn edge_percent(&self) -> Decimal {
        self.economics.edge_percent()
    }

    #[must_use]
    pub fn budget(&self) -> Decimal {
        self.budget
    }

    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// True when the edge cleared the threshold, regardless of budget.
    #[must_use]
    pub fn clears_threshold(&self) -> bool {
        self.decision != Decision::BelowEdge
    }

    #[must_use]
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Monotonic instant the underlying quotes were captured.
    #[must_use]
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}
