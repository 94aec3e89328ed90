//! Rupee amounts and minor-unit (paise) conversion.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; the gateway wire format wants
//! integer paise, produced here with one documented rounding rule.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// ISO 4217 currency code for all gateway traffic.
pub const CURRENCY: &str = "INR";

/// Number of paise in one rupee.
const PAISE_PER_RUPEE: Decimal = Decimal::ONE_HUNDRED;

/// Converts a rupee amount to integer paise.
///
/// Rounding is round-half-up on `amount * 100` (`MidpointAwayFromZero`), so
/// the same decimal amount always maps to the same paise value.
///
/// Returns `None` for negative amounts or amounts that do not fit in `i64`.
#[must_use]
pub fn to_paise(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() {
        return None;
    }
    (amount * PAISE_PER_RUPEE)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Converts integer paise back to a rupee amount.
#[must_use]
pub fn from_paise(paise: i64) -> Decimal {
    Decimal::from(paise) / PAISE_PER_RUPEE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), 0)]
    #[case(dec!(425), 42_500)]
    #[case(dec!(112.5), 11_250)]
    #[case(dec!(99.99), 9_999)]
    #[case(dec!(0.01), 1)]
    fn test_exact_conversions(#[case] amount: Decimal, #[case] expected: i64) {
        assert_eq!(to_paise(amount), Some(expected));
    }

    #[rstest]
    #[case(dec!(10.005), 1_001)] // half-paise rounds up
    #[case(dec!(10.004), 1_000)]
    #[case(dec!(0.005), 1)]
    fn test_round_half_up(#[case] amount: Decimal, #[case] expected: i64) {
        assert_eq!(to_paise(amount), Some(expected));
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(to_paise(dec!(-1)), None);
    }

    #[test]
    fn test_round_trip() {
        let amount = dec!(1234.56);
        assert_eq!(from_paise(to_paise(amount).unwrap()), amount);
    }

    #[test]
    fn test_repeated_conversion_is_stable() {
        // quantity 5 x price 22.5 must give the same paise on every call
        let amount = dec!(5) * dec!(22.5);
        assert_eq!(amount, dec!(112.5));
        for _ in 0..10 {
            assert_eq!(to_paise(amount), Some(11_250));
        }
    }
}
