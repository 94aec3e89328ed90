//! Order-creation logic: eligibility filtering and amount derivation.

use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use milkbook_shared::types::money;

use super::error::PaymentError;
use crate::purchase::types::LedgerEntry;

/// The billable subset of an order request, with its frozen amount.
#[derive(Debug, Clone)]
pub struct BillableSelection {
    /// Entries that will be referenced by the payment, in request order.
    pub entries: Vec<LedgerEntry>,
    /// Exact sum of the entries' `total_amount`.
    pub amount: Decimal,
    /// The same amount in gateway minor units (paise).
    pub amount_paise: i64,
}

/// Filters a requested entry set down to the billable subset and sums it.
///
/// An entry is billable when it belongs to the (customer, milkman) pair, is
/// unpaid, and is not already referenced by a non-terminal payment
/// (`referenced` carries those ids). Ineligible entries are silently
/// dropped; ids the fetch did not return at all are likewise ignored.
///
/// # Errors
///
/// - `EmptySelection` when `requested` is empty
/// - `NoEligibleEntries` when the filtered set is empty
/// - `UnrepresentableAmount` when the sum does not fit integer paise
pub fn select_billable(
    customer_id: Uuid,
    milkman_id: Uuid,
    requested: &[Uuid],
    fetched: Vec<LedgerEntry>,
    referenced: &HashSet<Uuid>,
) -> Result<BillableSelection, PaymentError> {
    if requested.is_empty() {
        return Err(PaymentError::EmptySelection);
    }

    let by_id: std::collections::HashMap<Uuid, LedgerEntry> =
        fetched.into_iter().map(|e| (e.id, e)).collect();

    // Deduplicate while preserving request order; the reference set on the
    // payment is ordered and duplicate-free.
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for id in requested {
        if !seen.insert(*id) {
            continue;
        }
        let Some(entry) = by_id.get(id) else {
            continue;
        };
        if entry.customer_id != customer_id || entry.milkman_id != milkman_id {
            continue;
        }
        if entry.is_paid || referenced.contains(id) {
            continue;
        }
        entries.push(entry.clone());
    }

    if entries.is_empty() {
        return Err(PaymentError::NoEligibleEntries);
    }

    let amount: Decimal = entries.iter().map(|e| e.total_amount).sum();
    let amount_paise = money::to_paise(amount).ok_or(PaymentError::UnrepresentableAmount)?;

    Ok(BillableSelection {
        entries,
        amount,
        amount_paise,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn entry(customer: Uuid, milkman: Uuid, amount: Decimal, is_paid: bool) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            customer_id: customer,
            milkman_id: milkman,
            litres: dec!(1),
            price_per_litre: amount,
            total_amount: amount,
            billing_cycle_days: 15,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
            is_paid,
        }
    }

    #[test]
    fn test_sum_and_minor_units() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let entries = vec![
            entry(customer, milkman, dec!(100), false),
            entry(customer, milkman, dec!(250), false),
            entry(customer, milkman, dec!(75), false),
        ];
        let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();

        let selection =
            select_billable(customer, milkman, &ids, entries, &HashSet::new()).unwrap();

        assert_eq!(selection.amount, dec!(425));
        assert_eq!(selection.amount_paise, 42_500);
        assert_eq!(selection.entries.len(), 3);
    }

    #[test]
    fn test_paid_entries_silently_excluded() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let paid = entry(customer, milkman, dec!(100), true);
        let open = entry(customer, milkman, dec!(50), false);
        let ids = vec![paid.id, open.id];

        let selection =
            select_billable(customer, milkman, &ids, vec![paid, open], &HashSet::new()).unwrap();

        assert_eq!(selection.amount, dec!(50));
        assert_eq!(selection.entries.len(), 1);
    }

    #[test]
    fn test_foreign_entries_silently_excluded() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let mine = entry(customer, milkman, dec!(50), false);
        let other_customer = entry(Uuid::new_v4(), milkman, dec!(100), false);
        let other_milkman = entry(customer, Uuid::new_v4(), dec!(100), false);
        let ids = vec![mine.id, other_customer.id, other_milkman.id];

        let selection = select_billable(
            customer,
            milkman,
            &ids,
            vec![mine, other_customer, other_milkman],
            &HashSet::new(),
        )
        .unwrap();

        assert_eq!(selection.amount, dec!(50));
    }

    #[test]
    fn test_entries_referenced_by_pending_payment_excluded() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let locked = entry(customer, milkman, dec!(100), false);
        let free = entry(customer, milkman, dec!(40), false);
        let ids = vec![locked.id, free.id];
        let referenced: HashSet<Uuid> = [locked.id].into_iter().collect();

        let selection =
            select_billable(customer, milkman, &ids, vec![locked, free], &referenced).unwrap();

        assert_eq!(selection.amount, dec!(40));
        assert_eq!(selection.entries.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_counted_once() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let e = entry(customer, milkman, dec!(60), false);
        let ids = vec![e.id, e.id, e.id];

        let selection =
            select_billable(customer, milkman, &ids, vec![e], &HashSet::new()).unwrap();

        assert_eq!(selection.amount, dec!(60));
        assert_eq!(selection.entries.len(), 1);
    }

    #[test]
    fn test_empty_request_rejected() {
        let result = select_billable(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[],
            vec![],
            &HashSet::new(),
        );
        assert!(matches!(result, Err(PaymentError::EmptySelection)));
    }

    #[test]
    fn test_all_paid_yields_no_eligible_entries() {
        let customer = Uuid::new_v4();
        let milkman = Uuid::new_v4();
        let a = entry(customer, milkman, dec!(10), true);
        let b = entry(customer, milkman, dec!(20), true);
        let ids = vec![a.id, b.id];

        let result = select_billable(customer, milkman, &ids, vec![a, b], &HashSet::new());
        assert!(matches!(result, Err(PaymentError::NoEligibleEntries)));
    }

    #[test]
    fn test_unknown_ids_alone_yield_no_eligible_entries() {
        let result = select_billable(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[Uuid::new_v4()],
            vec![],
            &HashSet::new(),
        );
        assert!(matches!(result, Err(PaymentError::NoEligibleEntries)));
    }

    proptest! {
        /// However the requested set overlaps with paid/referenced entries,
        /// the selected amount never counts an entry twice and never counts
        /// an unpayable entry. Two disjoint selections over the same ledger
        /// (the second treating the first's picks as referenced) can never
        /// sum to more than the outstanding total - the double-count
        /// property at the decision-logic level.
        #[test]
        fn prop_disjoint_selections_never_double_count(
            amounts in proptest::collection::vec(1i64..10_000, 1..12),
            split in 0usize..12,
        ) {
            let customer = Uuid::new_v4();
            let milkman = Uuid::new_v4();
            let ledger: Vec<LedgerEntry> = amounts
                .iter()
                .map(|a| entry(customer, milkman, Decimal::new(*a, 2), false))
                .collect();
            let outstanding: Decimal = ledger.iter().map(|e| e.total_amount).sum();
            let ids: Vec<Uuid> = ledger.iter().map(|e| e.id).collect();

            let split = split.min(ids.len());
            let first_ids = &ids[..split];
            let second_ids = &ids[..]; // overlaps the first request entirely

            let mut referenced = HashSet::new();
            let mut collected = Decimal::ZERO;

            if let Ok(first) =
                select_billable(customer, milkman, first_ids, ledger.clone(), &referenced)
            {
                for e in &first.entries {
                    referenced.insert(e.id);
                }
                collected += first.amount;
            }

            if let Ok(second) =
                select_billable(customer, milkman, second_ids, ledger.clone(), &referenced)
            {
                for e in &second.entries {
                    prop_assert!(!referenced.contains(&e.id));
                }
                collected += second.amount;
            }

            prop_assert!(collected <= outstanding);
        }
    }
}
