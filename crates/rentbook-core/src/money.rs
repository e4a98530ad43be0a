//! Currency arithmetic
//!
//! Amounts are fixed-point decimals. Aggregates are snapped to their clean
//! endpoint (zero or the agreed total) when they land within one cent of it,
//! which keeps data written by float-based clients consistent.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Snap tolerance: one currency cent
pub const EPSILON: Decimal = dec!(0.01);

/// Amount still owed, snapped to zero inside the tolerance
pub fn remaining(total: Decimal, paid: Decimal) -> Decimal {
    let remaining = total - paid;
    if remaining < EPSILON {
        Decimal::ZERO
    } else {
        remaining
    }
}

/// Whether `paid` covers `total` within the tolerance
pub fn is_settled(total: Decimal, paid: Decimal) -> bool {
    paid >= total - EPSILON
}

/// Render an amount with two decimal places for messages
pub fn display(amount: Decimal) -> String {
    format!("{:.2}", amount)
}
