//! Startup helpers: turn `[[markets]]` entries into validated groups.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::group::MarketGroup;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::market::MarketConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::MarketResolver;

/// Build every configured group, resolving slug-only entries through
/// `resolver`.
///
/// # Errors
///
/// Returns an error if a slug cannot be resolved, resolves to an event that
/// is not negative-risk, or if any group breaks the group invariants. Every
/// failure is fatal at startup.
pub async fn build_groups(config: &Config, resolver: &dyn MarketResolver) -> Result<Vec<MarketGroup>> {
    let mut groups = Vec::with_capacity(config.markets.len());
    let mut seen = HashSet::new();

    for market in &config.markets {
        let group = build_group(market, resolver).await?;
        for token in group.outcomes() {
            if !seen.insert(token.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: "markets.outcomes",
                    reason: format!("token {token} belongs to more than one group"),
                }
                .into());
            }
        }
        info!(
            group = %group.name(),
            outcomes = group.len(),
            budget = %group.effective_budget(config.max_spend),
            "Market group loaded"
        );
        groups.push(group);
    }

    Ok(groups)
}

async fn build_group(market: &MarketConfig, resolver: &dyn MarketResolver) -> Result<MarketGroup> {
    let Some(slug) = market.slug.as_deref().filter(|_| market.needs_resolution()) else {
        return market.to_group();
    };

    let unresolved = |reason: String| ConfigError::UnresolvedGroup {
        group: market.name.clone(),
        reason,
    };

    debug!(group = %market.name, slug, "Resolving market group");
    let resolved = resolver
        .resolve_outcomes(slug)
        .await
        .map_err(|e| unresolved(e.to_string()))?;

    if !resolved.neg_risk {
        return Err(unresolved(format!("event '{slug}' is not negative-risk")).into());
    }

    market
        .to_resolved_group(resolved.outcomes)
        .map_err(|e| unresolved(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::TokenId;
    use crate::error::Error;
    use crate::testkit::exchange::StaticResolver;
    use rust_decimal_macros::dec;

    fn config(markets: &str) -> Config {
        let config: Config = toml::from_str(markets).unwrap();
        config.validate().unwrap();
        config
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with(
                "fed-decision",
                &[("no-cut", "Cut"), ("no-hold", "Hold"), ("no-hike", "Hike")],
                true,
            )
            .with("coin-flip", &[("no-h", "Heads"), ("no-t", "Tails")], false)
    }

    #[tokio::test]
    async fn listed_and_resolved_groups_are_built_in_order() {
        let config = config(
            r#"
            [[markets]]
            name = "election"
            outcomes = ["a", "b"]
            budget = 4

            [[markets]]
            name = "fed"
            slug = "fed-decision"
            "#,
        );

        let groups = build_groups(&config, &resolver()).await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name(), "election");
        assert_eq!(groups[0].budget(), Some(dec!(4)));
        assert_eq!(groups[1].name(), "fed");
        assert_eq!(groups[1].len(), 3);
        assert_eq!(groups[1].display_name(&TokenId::from("no-hold")), "Hold");
    }

    #[tokio::test]
    async fn non_neg_risk_event_is_fatal() {
        let config = config("[[markets]]\nname = \"flip\"\nslug = \"coin-flip\"");
        let err = build_groups(&config, &resolver()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnresolvedGroup { ref group, .. }) if group == "flip"
        ));
    }

    #[tokio::test]
    async fn unknown_slug_is_fatal() {
        let config = config("[[markets]]\nname = \"x\"\nslug = \"missing\"");
        let err = build_groups(&config, &resolver()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnresolvedGroup { .. })));
    }

    #[tokio::test]
    async fn resolved_token_shared_with_listed_group_is_rejected() {
        let config = config(
            r#"
            [[markets]]
            name = "manual"
            outcomes = ["no-cut", "other"]

            [[markets]]
            name = "fed"
            slug = "fed-decision"
            "#,
        );
        let err = build_groups(&config, &resolver()).await.unwrap_err();
        assert!(err.to_string().contains("no-cut"));
    }
}
