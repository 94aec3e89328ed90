//! Payment orders and gateway reconciliation.
//!
//! A payment covers a fixed set of unpaid ledger entries. Its amount is
//! frozen at creation, its remote order is opened against the gateway with
//! the payment id as receipt, and the gateway's signed confirmation is
//! verified and applied exactly once.

pub mod error;
pub mod gateway;
pub mod order;
pub mod reconcile;
pub mod types;

pub use error::PaymentError;
pub use gateway::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
pub use order::{BillableSelection, select_billable};
pub use reconcile::{
    RemoteConfirmation, VerificationOutcome, plan_verification, verify_signature,
};
pub use types::{GatewayKeys, Initiator, PaymentStatus};
