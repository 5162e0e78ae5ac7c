//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored as `f64` in currency units. All arithmetic goes
//! through `Decimal` and is rounded half-up to 2 places before converting
//! back, so repeated additions do not accumulate binary float error.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal (non-finite values become zero)
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 after rounding
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 places
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// `unit_price × quantity`
pub fn line_total(unit_price: f64, quantity: u32) -> Decimal {
    to_decimal(unit_price) * Decimal::from(quantity)
}

/// Sum of `unit_price × quantity` over an iterator of lines
pub fn sum_lines<I>(lines: I) -> f64
where
    I: IntoIterator<Item = (f64, u32)>,
{
    let total: Decimal = lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum();
    to_f64(total)
}

/// Unit price recovered from a line total (`line_total / quantity`)
pub fn unit_price(line_total: f64, quantity: u32) -> f64 {
    if quantity == 0 {
        return 0.0;
    }
    to_f64(to_decimal(line_total) / Decimal::from(quantity))
}

/// `total + delivery_fee - discount`, never below zero
pub fn grand_total(total: f64, delivery_fee: f64, discount: f64) -> f64 {
    let value = to_decimal(total) + to_decimal(delivery_fee) - to_decimal(discount);
    to_f64(value.max(Decimal::ZERO))
}

/// Parse a decimal string as sent by the remote platform ("12.50")
pub fn parse_amount(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    Decimal::from_str(trimmed).ok().map(to_f64)
}

/// Format an amount for the remote platform ("12.50")
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}
