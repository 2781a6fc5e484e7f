//! Domain validation errors.
//!
//! Returned by constructors that enforce market-group invariants. These are
//! only ever produced while loading configuration, so every variant is fatal
//! at startup.
//!
//! # Examples
//!
//! ```
//! use negrisk::domain::error::DomainError;
//! use negrisk::domain::group::MarketGroup;
//! use negrisk::domain::id::TokenId;
//!
//! let result = MarketGroup::try_new("solo", vec![TokenId::from("only")]);
//! assert!(matches!(result, Err(DomainError::TooFewOutcomes { count: 1, .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Group names identify execution flags and must be present.
    #[error("market group name cannot be empty")]
    EmptyGroupName,

    /// A mutually exclusive set needs at least two outcomes.
    #[error("market group '{group}' needs at least 2 outcomes, got {count}")]
    TooFewOutcomes {
        /// Group being validated.
        group: String,
        /// Number of outcomes supplied.
        count: usize,
    },

    /// The same outcome token appears twice in one group.
    #[error("market group '{group}' lists outcome {token_id} more than once")]
    DuplicateOutcome {
        /// Group being validated.
        group: String,
        /// The repeated token.
        token_id: String,
    },

    /// Budgets bound spend and must be positive.
    #[error("market group '{group}' budget must be positive, got {budget}")]
    NonPositiveBudget {
        /// Group being validated.
        group: String,
        /// The invalid budget.
        budget: Decimal,
    },
}
