//! Market groups: named sets of mutually exclusive outcomes.
//!
//! Exactly one outcome of a group resolves to 1; the rest resolve to 0. A
//! group is immutable once loaded. Construction validates the invariants the
//! arbitrage math depends on (two or more distinct outcomes, positive budget).

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::error::DomainError;
use super::id::TokenId;

/// A named set of mutually exclusive outcome tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketGroup {
    name: String,
    outcomes: Vec<TokenId>,
    outcome_names: HashMap<TokenId, String>,
    budget: Option<Decimal>,
}

impl MarketGroup {
    /// Create a validated group.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, fewer than two outcomes are
    /// given, or an outcome is listed twice.
    pub fn try_new(name: impl Into<String>, outcomes: Vec<TokenId>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyGroupName);
        }
        if outcomes.len() < 2 {
            return Err(DomainError::TooFewOutcomes {
                group: name,
                count: outcomes.len(),
            });
        }
        for (i, token) in outcomes.iter().enumerate() {
            if outcomes[..i].contains(token) {
                return Err(DomainError::DuplicateOutcome {
                    group: name,
                    token_id: token.to_string(),
                });
            }
        }

        Ok(Self {
            name,
            outcomes,
            outcome_names: HashMap::new(),
            budget: None,
        })
    }

    /// Attach display names. Names for tokens outside the group are dropped.
    #[must_use]
    pub fn with_outcome_names(mut self, names: HashMap<TokenId, String>) -> Self {
        self.outcome_names = names
            .into_iter()
            .filter(|(token, _)| self.outcomes.contains(token))
            .collect();
        self
    }

    /// Attach a per-group spend budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget is not positive.
    pub fn with_budget(mut self, budget: Decimal) -> Result<Self, DomainError> {
        if budget <= Decimal::ZERO {
            return Err(DomainError::NonPositiveBudget {
                group: self.name,
                budget,
            });
        }
        self.budget = Some(budget);
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outcomes in configured order.
    #[must_use]
    pub fn outcomes(&self) -> &[TokenId] {
        &self.outcomes
    }

    /// Number of outcomes (`n`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Always false for a validated group; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.outcomes.contains(token_id)
    }

    /// Display name for an outcome, falling back to the token id.
    #[must_use]
    pub fn display_name<'a>(&'a self, token_id: &'a TokenId) -> &'a str {
        self.outcome_names
            .get(token_id)
            .map_or_else(|| token_id.as_str(), String::as_str)
    }

    /// The group's own budget, if one was configured.
    #[must_use]
    pub fn budget(&self) -> Option<Decimal> {
        self.budget
    }

    /// Budget to enforce: the group's own, else the global default.
    #[must_use]
    pub fn effective_budget(&self, default: Decimal) -> Decimal {
        self.budget.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tokens(ids: &[&str]) -> Vec<TokenId> {
        ids.iter().map(|id| TokenId::from(*id)).collect()
    }

    #[test]
    fn rejects_fewer_than_two_outcomes() {
        let err = MarketGroup::try_new("g", tokens(&["a"])).unwrap_err();
        assert_eq!(
            err,
            DomainError::TooFewOutcomes {
                group: "g".into(),
                count: 1
            }
        );
    }

    #[test]
    fn rejects_duplicate_outcomes() {
        let err = MarketGroup::try_new("g", tokens(&["a", "b", "a"])).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateOutcome { ref token_id, .. } if token_id == "a"));
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            MarketGroup::try_new("  ", tokens(&["a", "b"])).unwrap_err(),
            DomainError::EmptyGroupName
        );
    }

    #[test]
    fn budget_must_be_positive() {
        let group = MarketGroup::try_new("g", tokens(&["a", "b"])).unwrap();
        assert!(group.clone().with_budget(dec!(0)).is_err());
        let group = group.with_budget(dec!(25)).unwrap();
        assert_eq!(group.effective_budget(dec!(10)), dec!(25));
    }

    #[test]
    fn effective_budget_falls_back_to_default() {
        let group = MarketGroup::try_new("g", tokens(&["a", "b"])).unwrap();
        assert_eq!(group.effective_budget(dec!(10)), dec!(10));
    }

    #[test]
    fn display_name_falls_back_to_token() {
        let names = HashMap::from([
            (TokenId::from("a"), "Alice".to_string()),
            (TokenId::from("zzz"), "Stranger".to_string()),
        ]);
        let group = MarketGroup::try_new("g", tokens(&["a", "b"]))
            .unwrap()
            .with_outcome_names(names);

        assert_eq!(group.display_name(&TokenId::from("a")), "Alice");
        assert_eq!(group.display_name(&TokenId::from("b")), "b");
        assert_eq!(group.outcome_names.len(), 1);
    }
}
