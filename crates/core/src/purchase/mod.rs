//! Daily purchase ledger: recording, pricing, and balance aggregation.
//!
//! A purchase entry is one day's delivery for one customer from one milkman.
//! There is at most one entry per (customer, milkman, day); re-recording the
//! same day overwrites quantity, snapshotted price, and due date.

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

pub use balance::{CustomerGroup, CustomerStatement, MilkmanLedger};
pub use error::PurchaseError;
pub use service::PurchaseService;
pub use types::{BillingCycle, LedgerEntry, PricedPurchase, RecordPurchaseInput};
