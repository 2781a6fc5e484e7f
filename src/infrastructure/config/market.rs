//! Market group configuration.
//!
//! A `[[markets]]` entry either lists its outcome tokens directly or names a
//! Gamma event slug that is resolved at startup.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{group::MarketGroup, id::TokenId};
use crate::error::Result;

/// One `[[markets]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketConfig {
    pub name: String,

    /// Gamma event slug; used when `outcomes` is empty.
    #[serde(default)]
    pub slug: Option<String>,

    /// Outcome token ids, in display order.
    #[serde(default)]
    pub outcomes: Vec<String>,

    /// Token id to display name.
    #[serde(default)]
    pub outcome_names: HashMap<String, String>,

    /// Per-group spend cap; falls back to the global `max_spend`.
    #[serde(default)]
    pub budget: Option<Decimal>,
}

impl MarketConfig {
    /// True when the outcomes must be discovered through the slug.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        self.outcomes.is_empty() && self.slug.is_some()
    }

    /// Build a group from the listed outcomes.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the outcomes or budget violate the group
    /// invariants.
    pub fn to_group(&self) -> Result<MarketGroup> {
        let outcomes = self.outcomes.iter().map(|t| TokenId::from(t.as_str())).collect();
        let names = self
            .outcome_names
            .iter()
            .map(|(token, name)| (TokenId::from(token.as_str()), name.clone()))
            .collect();
        self.finish(MarketGroup::try_new(&self.name, outcomes)?.with_outcome_names(names))
    }

    /// Build a group from resolved `(token, display name)` pairs. Names from
    /// `outcome_names` win over the resolved ones.
    ///
    /// # Errors
    ///
    /// Returns a domain error if the outcomes or budget violate the group
    /// invariants.
    pub fn to_resolved_group(&self, resolved: Vec<(TokenId, String)>) -> Result<MarketGroup> {
        let mut names: HashMap<TokenId, String> = HashMap::with_capacity(resolved.len());
        let mut outcomes = Vec::with_capacity(resolved.len());
        for (token, name) in resolved {
            let name = self
                .outcome_names
                .get(token.as_str())
                .cloned()
                .unwrap_or(name);
            names.insert(token.clone(), name);
            outcomes.push(token);
        }
        self.finish(MarketGroup::try_new(&self.name, outcomes)?.with_outcome_names(names))
    }

    fn finish(&self, group: MarketGroup) -> Result<MarketGroup> {
        match self.budget {
            Some(budget) => Ok(group.with_budget(budget)?),
            None => Ok(group),
        }
    }
}
