//! Purchase ledger domain types.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Billing cycle: days after an entry's date by which payment is due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// Payment due 15 days after the entry date.
    #[default]
    Fortnightly,
    /// Payment due 30 days after the entry date.
    Monthly,
}

impl BillingCycle {
    /// Returns the cycle length in days.
    #[must_use]
    pub const fn days(self) -> u16 {
        match self {
            Self::Fortnightly => 15,
            Self::Monthly => 30,
        }
    }

    /// Parses a cycle length in days. Only 15 and 30 are valid.
    #[must_use]
    pub const fn try_from_days(days: u16) -> Option<Self> {
        match days {
            15 => Some(Self::Fortnightly),
            30 => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Computes the payment due date for an entry recorded on `entry_date`.
    #[must_use]
    pub fn due_date(self, entry_date: NaiveDate) -> NaiveDate {
        entry_date
            .checked_add_days(Days::new(u64::from(self.days())))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Input for recording (or re-recording) a day's purchase.
#[derive(Debug, Clone)]
pub struct RecordPurchaseInput {
    /// The customer recording the purchase.
    pub customer_id: Uuid,
    /// The milkman the customer is bound to.
    pub milkman_id: Uuid,
    /// Delivered quantity in litres (must be positive).
    pub litres: Decimal,
    /// Entry date; defaults to today. Day granularity.
    pub entry_date: Option<NaiveDate>,
    /// Billing cycle length in days; defaults to 15.
    pub billing_cycle_days: Option<u16>,
}

/// A validated, priced purchase ready to be persisted.
///
/// `total_amount` is always computed here from the milkman's current price,
/// never accepted from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedPurchase {
    /// The customer.
    pub customer_id: Uuid,
    /// The milkman.
    pub milkman_id: Uuid,
    /// Delivered quantity in litres.
    pub litres: Decimal,
    /// Price per litre snapshotted at record time.
    pub price_per_litre: Decimal,
    /// `litres * price_per_litre`.
    pub total_amount: Decimal,
    /// Billing cycle.
    pub billing_cycle: BillingCycle,
    /// Day the delivery happened.
    pub entry_date: NaiveDate,
    /// `entry_date + billing_cycle`.
    pub due_date: NaiveDate,
}

/// A persisted ledger entry as seen by the aggregation and payment flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: Uuid,
    /// The customer.
    pub customer_id: Uuid,
    /// The milkman.
    pub milkman_id: Uuid,
    /// Delivered quantity in litres.
    pub litres: Decimal,
    /// Snapshotted price per litre.
    pub price_per_litre: Decimal,
    /// Amount owed for this entry.
    pub total_amount: Decimal,
    /// Billing cycle length in days.
    pub billing_cycle_days: u16,
    /// Day of delivery.
    pub entry_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Whether the entry has been settled.
    pub is_paid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_days() {
        assert_eq!(BillingCycle::Fortnightly.days(), 15);
        assert_eq!(BillingCycle::Monthly.days(), 30);
    }

    #[test]
    fn test_try_from_days() {
        assert_eq!(
            BillingCycle::try_from_days(15),
            Some(BillingCycle::Fortnightly)
        );
        assert_eq!(BillingCycle::try_from_days(30), Some(BillingCycle::Monthly));
        assert_eq!(BillingCycle::try_from_days(7), None);
        assert_eq!(BillingCycle::try_from_days(0), None);
    }

    #[test]
    fn test_default_cycle_is_fortnightly() {
        assert_eq!(BillingCycle::default(), BillingCycle::Fortnightly);
    }

    #[test]
    fn test_due_date_computation() {
        let entry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            BillingCycle::Monthly.due_date(entry),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(
            BillingCycle::Fortnightly.due_date(entry),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }

    #[test]
    fn test_due_date_crosses_month_boundary() {
        let entry = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(
            BillingCycle::Fortnightly.due_date(entry),
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap() // 2024 is a leap year
        );
    }
}
