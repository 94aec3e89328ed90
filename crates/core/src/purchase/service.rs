//! Purchase validation and pricing.
//!
//! This service contains pure business logic with no database dependencies.
//! It validates a record-purchase request and resolves the milkman's current
//! price before persistence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::PurchaseError;
use super::types::{BillingCycle, PricedPurchase, RecordPurchaseInput};

/// Purchase validation and pricing service.
pub struct PurchaseService;

impl PurchaseService {
    /// Validates a purchase request and prices it from the milkman's
    /// current configuration.
    ///
    /// Steps:
    /// 1. Rejects non-positive quantities
    /// 2. Rejects billing cycles other than 15 or 30 days (default 15)
    /// 3. Resolves the milkman's price per litre through `price_lookup`
    /// 4. Computes `total_amount = litres * price` and the due date
    ///
    /// The entry date defaults to `today`; time-of-day never enters the
    /// ledger, `NaiveDate` is already day-granular.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError` if validation fails or the milkman has no
    /// configured price.
    pub fn price<F>(
        input: &RecordPurchaseInput,
        today: NaiveDate,
        price_lookup: F,
    ) -> Result<PricedPurchase, PurchaseError>
    where
        F: Fn(Uuid) -> Result<Option<Decimal>, PurchaseError>,
    {
        if input.litres <= Decimal::ZERO {
            return Err(PurchaseError::NonPositiveQuantity);
        }

        let billing_cycle = match input.billing_cycle_days {
            None => BillingCycle::default(),
            Some(days) => BillingCycle::try_from_days(days)
                .ok_or(PurchaseError::InvalidBillingCycle(days))?,
        };

        let price_per_litre = price_lookup(input.milkman_id)?
            .ok_or(PurchaseError::PriceNotConfigured(input.milkman_id))?;

        let entry_date = input.entry_date.unwrap_or(today);

        Ok(PricedPurchase {
            customer_id: input.customer_id,
            milkman_id: input.milkman_id,
            litres: input.litres,
            price_per_litre,
            total_amount: input.litres * price_per_litre,
            billing_cycle,
            entry_date,
            due_date: billing_cycle.due_date(entry_date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn make_input(litres: Decimal, cycle: Option<u16>) -> RecordPurchaseInput {
        RecordPurchaseInput {
            customer_id: Uuid::new_v4(),
            milkman_id: Uuid::new_v4(),
            litres,
            entry_date: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            billing_cycle_days: cycle,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn price_of(price: Decimal) -> impl Fn(Uuid) -> Result<Option<Decimal>, PurchaseError> {
        move |_| Ok(Some(price))
    }

    #[test]
    fn test_amount_is_computed_server_side() {
        let input = make_input(dec!(5), None);
        let priced = PurchaseService::price(&input, today(), price_of(dec!(22.5))).unwrap();

        assert_eq!(priced.total_amount, dec!(112.5));
        assert_eq!(priced.price_per_litre, dec!(22.5));
        assert_eq!(priced.litres, dec!(5));
    }

    #[test]
    fn test_due_date_from_entry_date_and_cycle() {
        let input = make_input(dec!(1), Some(30));
        let priced = PurchaseService::price(&input, today(), price_of(dec!(20))).unwrap();

        assert_eq!(priced.billing_cycle, BillingCycle::Monthly);
        assert_eq!(
            priced.due_date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
    }

    #[test]
    fn test_entry_date_defaults_to_today() {
        let mut input = make_input(dec!(2), None);
        input.entry_date = None;
        let priced = PurchaseService::price(&input, today(), price_of(dec!(20))).unwrap();

        assert_eq!(priced.entry_date, today());
        assert_eq!(priced.due_date, BillingCycle::Fortnightly.due_date(today()));
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(-0.5))]
    fn test_non_positive_quantity_rejected(#[case] litres: Decimal) {
        let input = make_input(litres, None);
        let result = PurchaseService::price(&input, today(), price_of(dec!(20)));
        assert!(matches!(result, Err(PurchaseError::NonPositiveQuantity)));
    }

    #[rstest]
    #[case(7)]
    #[case(0)]
    #[case(31)]
    fn test_invalid_billing_cycle_rejected(#[case] days: u16) {
        let input = make_input(dec!(1), Some(days));
        let result = PurchaseService::price(&input, today(), price_of(dec!(20)));
        assert!(matches!(
            result,
            Err(PurchaseError::InvalidBillingCycle(d)) if d == days
        ));
    }

    #[test]
    fn test_missing_price_is_configuration_error() {
        let input = make_input(dec!(1), None);
        let result = PurchaseService::price(&input, today(), |_| Ok(None));
        assert!(matches!(
            result,
            Err(PurchaseError::PriceNotConfigured(id)) if id == input.milkman_id
        ));
    }

    #[test]
    fn test_price_lookup_failure_propagates() {
        let input = make_input(dec!(1), None);
        let result = PurchaseService::price(&input, today(), |_| {
            Err(PurchaseError::Database("connection lost".into()))
        });
        assert!(matches!(result, Err(PurchaseError::Database(_))));
    }

    proptest! {
        /// Total amount is always exactly litres * price, with no drift
        /// across repeated pricing of the same input.
        #[test]
        fn prop_total_amount_is_exact_product(
            litres_centi in 1i64..100_000,
            price_centi in 1i64..100_000,
        ) {
            let litres = Decimal::new(litres_centi, 2);
            let price = Decimal::new(price_centi, 2);
            let input = make_input(litres, None);

            let first = PurchaseService::price(&input, today(), price_of(price)).unwrap();
            let second = PurchaseService::price(&input, today(), price_of(price)).unwrap();

            prop_assert_eq!(first.total_amount, litres * price);
            prop_assert_eq!(first.total_amount, second.total_amount);
        }

        /// The due date is always exactly the cycle length after the entry
        /// date, for both valid cycles.
        #[test]
        fn prop_due_date_offset(
            days_offset in 0u64..20_000,
            cycle in prop_oneof![Just(15u16), Just(30u16)],
        ) {
            let entry = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
                + chrono::Days::new(days_offset);
            let mut input = make_input(dec!(1), Some(cycle));
            input.entry_date = Some(entry);

            let priced = PurchaseService::price(&input, today(), price_of(dec!(10))).unwrap();
            let expected = entry + chrono::Days::new(u64::from(cycle));
            prop_assert_eq!(priced.due_date, expected);
        }
    }
}
