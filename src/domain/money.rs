//! Monetary types for price and volume representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
///
/// Outcome prices live in `[0, 1]` (one share pays at most 1 USDC).
pub type Price = Decimal;

/// Volume (share count) represented as a Decimal for precision.
pub type Volume = Decimal;

/// USDC value of `size` shares at `price`.
#[must_use]
pub fn notional(price: Price, size: Volume) -> Decimal {
    price * size
}
