//! Money calculation utilities using rust_decimal for precision
//!
//! All cash arithmetic (pricing, drawer variance, cash-to-remit) runs
//! through `Decimal` internally, then converts to `f64` for
//! storage/serialization. Never add f64 amounts directly.

use rust_decimal::prelude::*;

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn out(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round a cash amount to 2 decimal places (half-up)
pub fn round_cash(value: f64) -> f64 {
    out(dec(value))
}

/// a + b with decimal precision
pub fn add(a: f64, b: f64) -> f64 {
    out(dec(a) + dec(b))
}

/// a − b with decimal precision
pub fn sub(a: f64, b: f64) -> f64 {
    out(dec(a) - dec(b))
}

/// unit price × quantity
pub fn mul_qty(price: f64, qty: i64) -> f64 {
    out(dec(price) * Decimal::from(qty))
}

/// value% of base (e.g. `percentage(250.0, 10.0)` = 25.00)
pub fn percentage(base: f64, value: f64) -> f64 {
    out(dec(base) * dec(value) / Decimal::from(100))
}

/// Sum with decimal precision
pub fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    out(values.into_iter().map(dec).sum::<Decimal>())
}

/// Whether an amount is zero within cash tolerance (half a centavo)
pub fn is_zero(value: f64) -> bool {
    value.abs() < 0.005
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_cash(2.675), 2.68);
        assert_eq!(round_cash(2.674), 2.67);
        assert_eq!(round_cash(-2.675), -2.68);
    }

    #[test]
    fn float_artifacts_do_not_leak() {
        // 0.1 + 0.2 != 0.3 in f64; must be exact after decimal round-trip
        assert_eq!(add(0.1, 0.2), 0.3);
        assert_eq!(sub(1.0, 0.9), 0.1);
    }

    #[test]
    fn qty_multiplication() {
        assert_eq!(mul_qty(19.99, 3), 59.97);
        assert_eq!(mul_qty(0.0, 100), 0.0);
    }

    #[test]
    fn percentage_of_base() {
        assert_eq!(percentage(250.0, 10.0), 25.0);
        assert_eq!(percentage(99.99, 50.0), 50.0);
    }

    #[test]
    fn sum_many_small_amounts() {
        let total = sum(std::iter::repeat(0.1).take(10));
        assert_eq!(total, 1.0);
    }

    #[test]
    fn zero_tolerance() {
        assert!(is_zero(0.0));
        assert!(is_zero(0.004));
        assert!(!is_zero(0.01));
    }
}
