//! Decimal money for the capital stack, loan schedule, costs and statements
//!
//! Configuration and the revenue estimator work in `f64` (rates, hours and
//! utilization fractions). Amounts cross into [`Money`] once, rounded to cents,
//! and every ledger sum after that is exact.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

pub type Money = Decimal;

/// Ledger precision
pub const CENTS: u32 = 2;

/// Decimal form of a configured figure. Non-finite or out-of-range input maps to zero.
pub fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// An `f64` amount rounded to cents
pub fn money(value: f64) -> Money {
    decimal(value).round_dp(CENTS)
}

pub fn cents(value: Decimal) -> Money {
    value.round_dp(CENTS)
}

/// Lossy conversion for ratios and reporting
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
