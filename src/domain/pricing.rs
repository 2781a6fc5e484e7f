//! Price-grid and sizing rules shared by both strategies.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::money::{notional, Price, Volume};

/// Default minimum price increment.
pub const DEFAULT_TICK: Price = dec!(0.01);

/// Round down to the tick grid.
#[must_use]
pub fn floor_to_tick(price: Price, tick: Price) -> Price {
    if tick <= Decimal::ZERO {
        return price;
    }
    (price / tick).floor() * tick
}

/// Round up to the tick grid.
#[must_use]
pub fn ceil_to_tick(price: Price, tick: Price) -> Price {
    if tick <= Decimal::ZERO {
        return price;
    }
    (price / tick).ceil() * tick
}

/// Maker bid for outcome J: `(n - 1 - extra_edge) - Σ ask_i` over `i != J`.
///
/// The raw value is unbounded; see [`maker_bid_price`] for the tradeable
/// price.
#[must_use]
pub fn desired_bid(outcome_count: usize, extra_edge: Decimal, other_asks_sum: Decimal) -> Decimal {
    let set_cost = Decimal::from(outcome_count.saturating_sub(1)) - extra_edge;
    set_cost - other_asks_sum
}

/// Map a raw desired bid onto the price grid.
///
/// Returns `None` when the bid does not exceed one tick (non-viable). Bids
/// above `1 - tick` are clamped there; the rest round down to the grid.
#[must_use]
pub fn maker_bid_price(desired: Decimal, tick: Price) -> Option<Price> {
    if desired <= tick {
        return None;
    }
    let ceiling = Decimal::ONE - tick;
    Some(floor_to_tick(desired.min(ceiling), tick))
}

/// Limit price for a taker leg: `ask × (1 + nudge)` rounded up to the grid and
/// capped at `1 - tick`.
#[must_use]
pub fn taker_price(ask: Price, nudge: Decimal, tick: Price) -> Price {
    let nudged = ceil_to_tick(ask * (Decimal::ONE + nudge), tick);
    nudged.min(Decimal::ONE - tick)
}

/// Shares to buy on one leg: `base_size`, raised to the smallest whole
/// number of shares whose notional reaches `min_notional`.
#[must_use]
pub fn leg_size(base_size: Volume, price: Price, min_notional: Decimal) -> Volume {
    if price <= Decimal::ZERO || notional(price, base_size) >= min_notional {
        return base_size;
    }
    (min_notional / price).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_bid_follows_formula() {
        // asks [0.30, 0.31, 0.32], extra 0.01, outcome 1 -> 1.99 - 0.63
        assert_eq!(desired_bid(3, dec!(0.01), dec!(0.31) + dec!(0.32)), dec!(1.36));
    }

    #[test]
    fn out_of_range_bid_is_clamped() {
        assert_eq!(maker_bid_price(dec!(1.36), DEFAULT_TICK), Some(dec!(0.99)));
    }

    #[test]
    fn bid_at_or_below_tick_is_not_viable() {
        assert_eq!(maker_bid_price(dec!(0.01), DEFAULT_TICK), None);
        assert_eq!(maker_bid_price(dec!(-0.4), DEFAULT_TICK), None);
        assert_eq!(maker_bid_price(dec!(0.011), DEFAULT_TICK), Some(dec!(0.01)));
    }

    #[test]
    fn bid_rounds_down_to_grid() {
        assert_eq!(maker_bid_price(dec!(0.4567), DEFAULT_TICK), Some(dec!(0.45)));
        assert_eq!(maker_bid_price(dec!(0.4567), dec!(0.001)), Some(dec!(0.456)));
    }

    #[test]
    fn taker_price_nudges_through_ask() {
        assert_eq!(taker_price(dec!(0.30), dec!(0.01), DEFAULT_TICK), dec!(0.31));
        assert_eq!(taker_price(dec!(0.50), dec!(0), DEFAULT_TICK), dec!(0.50));
        assert_eq!(taker_price(dec!(0.99), dec!(0.01), DEFAULT_TICK), dec!(0.99));
    }

    #[test]
    fn leg_size_keeps_base_when_notional_is_met() {
        assert_eq!(leg_size(dec!(5), dec!(0.5), dec!(1)), dec!(5));
        assert_eq!(leg_size(dec!(1), dec!(1), dec!(1)), dec!(1));
    }

    #[test]
    fn leg_size_rounds_up_to_whole_shares() {
        // 1 / 0.30 = 3.33 -> 4 shares
        assert_eq!(leg_size(dec!(1), dec!(0.30), dec!(1)), dec!(4));
        assert_eq!(leg_size(dec!(1), dec!(0.34), dec!(1)), dec!(3));
        assert_eq!(leg_size(dec!(1), dec!(0.25), dec!(1)), dec!(4));
    }
}
