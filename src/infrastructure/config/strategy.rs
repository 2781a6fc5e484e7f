//! Strategy configuration.

use serde::Deserialize;

use crate::application::strategy::{MakerTakerConfig, TakerConfig};

/// `[strategies]` section: one table per strategy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategiesConfig {
    #[serde(default)]
    pub taker: TakerConfig,

    #[serde(default)]
    pub maker_taker: MakerTakerConfig,
}

impl StrategiesConfig {
    /// Names of the enabled strategies.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(2);
        if self.taker.enabled {
            names.push("taker");
        }
        if self.maker_taker.enabled {
            names.push("maker_taker");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn taker_is_the_only_default_strategy() {
        let config = StrategiesConfig::default();
        assert_eq!(config.enabled(), vec!["taker"]);
    }

    #[test]
    fn tables_override_defaults() {
        let toml = r#"
            [taker]
            enabled = false

            [maker_taker]
            enabled = true
            extra_edge = 0.02
        "#;
        let config: StrategiesConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.enabled(), vec!["maker_taker"]);
        assert_eq!(config.maker_taker.extra_edge, dec!(0.02));
        assert_eq!(config.maker_taker.order_size, dec!(5));
    }
}
