//! Outstanding-balance views derived from ledger entries.
//!
//! Pure folds over `LedgerEntry` slices; the repositories fetch, this module
//! aggregates.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::types::LedgerEntry;

/// A customer's own ledger view: entries plus the unpaid total.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerStatement {
    /// Entries, newest first.
    pub entries: Vec<LedgerEntry>,
    /// Sum of `total_amount` over unpaid entries.
    pub total_unpaid: Decimal,
}

/// One customer's slice of a milkman's ledger.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerGroup {
    /// The customer.
    pub customer_id: Uuid,
    /// Lifetime total across all entries.
    pub total_amount: Decimal,
    /// Currently outstanding total.
    pub total_unpaid: Decimal,
    /// Entries, newest first.
    pub entries: Vec<LedgerEntry>,
}

/// A milkman's full ledger grouped by customer.
#[derive(Debug, Clone, Serialize)]
pub struct MilkmanLedger {
    /// Per-customer groups.
    pub customers: Vec<CustomerGroup>,
}

/// Builds a customer statement from that customer's entries.
///
/// Entries are returned newest first; the unpaid total folds only entries
/// with `is_paid == false`.
#[must_use]
pub fn customer_statement(mut entries: Vec<LedgerEntry>) -> CustomerStatement {
    entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
    let total_unpaid = entries
        .iter()
        .filter(|e| !e.is_paid)
        .map(|e| e.total_amount)
        .sum();

    CustomerStatement {
        entries,
        total_unpaid,
    }
}

/// Groups a milkman's entries by customer.
///
/// Each group carries both the lifetime total and the outstanding total;
/// within a group entries are ordered by entry date descending. Groups are
/// ordered by customer id for a stable response.
#[must_use]
pub fn milkman_ledger(entries: Vec<LedgerEntry>) -> MilkmanLedger {
    let mut groups: HashMap<Uuid, CustomerGroup> = HashMap::new();

    for entry in entries {
        let group = groups
            .entry(entry.customer_id)
            .or_insert_with(|| CustomerGroup {
                customer_id: entry.customer_id,
                total_amount: Decimal::ZERO,
                total_unpaid: Decimal::ZERO,
                entries: Vec::new(),
            });
        group.total_amount += entry.total_amount;
        if !entry.is_paid {
            group.total_unpaid += entry.total_amount;
        }
        group.entries.push(entry);
    }

    let mut customers: Vec<CustomerGroup> = groups.into_values().collect();
    for group in &mut customers {
        group.entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
    }
    customers.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));

    MilkmanLedger { customers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(
        customer: Uuid,
        day: u32,
        amount: Decimal,
        is_paid: bool,
    ) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            customer_id: customer,
            milkman_id: Uuid::nil(),
            litres: dec!(1),
            price_per_litre: amount,
            total_amount: amount,
            billing_cycle_days: 15,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            is_paid,
        }
    }

    #[test]
    fn test_statement_sums_only_unpaid() {
        let customer = Uuid::new_v4();
        let statement = customer_statement(vec![
            entry(customer, 1, dec!(100), true),
            entry(customer, 2, dec!(250), false),
            entry(customer, 3, dec!(75), false),
        ]);

        assert_eq!(statement.total_unpaid, dec!(325));
        assert_eq!(statement.entries.len(), 3);
    }

    #[test]
    fn test_statement_orders_newest_first() {
        let customer = Uuid::new_v4();
        let statement = customer_statement(vec![
            entry(customer, 1, dec!(10), false),
            entry(customer, 15, dec!(10), false),
            entry(customer, 7, dec!(10), false),
        ]);

        let days: Vec<u32> = statement
            .entries
            .iter()
            .map(|e| e.entry_date.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(days, vec![15, 7, 1]);
    }

    #[test]
    fn test_statement_of_empty_ledger_is_zero() {
        let statement = customer_statement(vec![]);
        assert_eq!(statement.total_unpaid, Decimal::ZERO);
        assert!(statement.entries.is_empty());
    }

    #[test]
    fn test_milkman_ledger_groups_by_customer() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let ledger = milkman_ledger(vec![
            entry(alice, 1, dec!(100), true),
            entry(alice, 2, dec!(50), false),
            entry(bob, 1, dec!(30), false),
        ]);

        assert_eq!(ledger.customers.len(), 2);
        let alice_group = ledger
            .customers
            .iter()
            .find(|g| g.customer_id == alice)
            .unwrap();
        assert_eq!(alice_group.total_amount, dec!(150));
        assert_eq!(alice_group.total_unpaid, dec!(50));
        assert_eq!(alice_group.entries.len(), 2);

        let bob_group = ledger
            .customers
            .iter()
            .find(|g| g.customer_id == bob)
            .unwrap();
        assert_eq!(bob_group.total_amount, dec!(30));
        assert_eq!(bob_group.total_unpaid, dec!(30));
    }

    #[test]
    fn test_group_entries_ordered_newest_first() {
        let customer = Uuid::new_v4();
        let ledger = milkman_ledger(vec![
            entry(customer, 3, dec!(10), false),
            entry(customer, 9, dec!(10), false),
        ]);

        let group = &ledger.customers[0];
        assert!(group.entries[0].entry_date > group.entries[1].entry_date);
    }

    #[test]
    fn test_fully_paid_customer_has_zero_outstanding() {
        let customer = Uuid::new_v4();
        let ledger = milkman_ledger(vec![
            entry(customer, 1, dec!(100), true),
            entry(customer, 2, dec!(200), true),
        ]);

        assert_eq!(ledger.customers[0].total_amount, dec!(300));
        assert_eq!(ledger.customers[0].total_unpaid, Decimal::ZERO);
    }
}
