//! Payment repository: order creation and reconciliation persistence.
//!
//! Order creation and reconciliation are each one database transaction.
//! Creation locks the candidate ledger rows before filtering so two
//! overlapping orders cannot both count the same entry; reconciliation
//! flips the payment and its referenced entries together or not at all.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use milkbook_core::payment::{
    BillableSelection, PaymentError, RemoteConfirmation, select_billable,
};

use crate::entities::{
    daily_purchases, payment_purchases, payments, sea_orm_active_enums::PaymentStatus,
};
use crate::repositories::purchase::to_ledger_entry;

fn db_err(e: DbErr) -> PaymentError {
    PaymentError::Database(e.to_string())
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a pending payment over the billable subset of the requested
    /// entries.
    ///
    /// One transaction: the candidate rows are locked `FOR UPDATE`, entries
    /// already referenced by a pending payment are excluded, the amount is
    /// frozen, and the ordered reference set is written. A concurrent
    /// overlapping request blocks on the row locks and then sees this
    /// payment's references.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection`, `NoEligibleEntries`, or a database error.
    pub async fn create_with_references(
        &self,
        customer_id: Uuid,
        milkman_id: Uuid,
        requested: &[Uuid],
    ) -> Result<(payments::Model, BillableSelection), PaymentError> {
        if requested.is_empty() {
            return Err(PaymentError::EmptySelection);
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let fetched = daily_purchases::Entity::find()
            .filter(daily_purchases::Column::Id.is_in(requested.to_vec()))
            .filter(daily_purchases::Column::CustomerId.eq(customer_id))
            .filter(daily_purchases::Column::MilkmanId.eq(milkman_id))
            .lock_exclusive()
            .all(&txn)
            .await
            .map_err(db_err)?;

        let referenced =
            Self::pending_referenced_ids(&txn, fetched.iter().map(|e| e.id)).await?;

        let selection = select_billable(
            customer_id,
            milkman_id,
            requested,
            fetched.iter().map(to_ledger_entry).collect(),
            &referenced,
        )?;

        let now = Utc::now().into();
        let payment = payments::ActiveModel {
            id: Set(Uuid::now_v7()),
            customer_id: Set(customer_id),
            milkman_id: Set(milkman_id),
            amount: Set(selection.amount),
            status: Set(PaymentStatus::Pending),
            gateway_order_id: Set(None),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        for (position, entry) in selection.entries.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let position = position as i32;
            payment_purchases::ActiveModel {
                id: Set(Uuid::now_v7()),
                payment_id: Set(payment.id),
                purchase_id: Set(entry.id),
                position: Set(position),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok((payment, selection))
    }

    /// Persists the gateway's order id onto a pending payment.
    ///
    /// Safe to call again when order-opening is retried; the payment id is
    /// the gateway-side idempotency token (receipt), so a retry yields the
    /// same remote order.
    pub async fn record_gateway_order(
        &self,
        payment_id: Uuid,
        gateway_order_id: &str,
    ) -> Result<payments::Model, PaymentError> {
        let payment = self
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::AlreadySettled(payment_id));
        }

        let mut active: payments::ActiveModel = payment.into();
        active.gateway_order_id = Set(Some(gateway_order_id.to_string()));
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Finds a payment by id.
    pub async fn find_by_id(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<payments::Model>, PaymentError> {
        payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// The ordered purchase ids referenced by a payment.
    pub async fn referenced_purchase_ids(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<Uuid>, PaymentError> {
        let rows = payment_purchases::Entity::find()
            .filter(payment_purchases::Column::PaymentId.eq(payment_id))
            .order_by_asc(payment_purchases::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(|r| r.purchase_id).collect())
    }

    /// A customer's payments, newest first.
    pub async fn history_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<payments::Model>, PaymentError> {
        payments::Entity::find()
            .filter(payments::Column::CustomerId.eq(customer_id))
            .order_by_desc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Applies a verified gateway confirmation.
    ///
    /// One transaction flips the payment to completed (storing the remote
    /// ids and signature) and marks every referenced entry paid. The status
    /// is re-checked under a row lock, so a duplicate webhook that raced
    /// past the caller's check still resolves idempotently.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadySettled` (terminal failure), or
    /// `VerificationFailed` (completed with different remote ids).
    pub async fn complete(
        &self,
        payment_id: Uuid,
        confirmation: &RemoteConfirmation,
    ) -> Result<payments::Model, PaymentError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let payment = payments::Entity::find_by_id(payment_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::NotFound(payment_id))?;

        match payment.status {
            PaymentStatus::Completed => {
                // Duplicate delivery: idempotent when the ids match.
                let ids_match = payment.gateway_order_id.as_deref()
                    == Some(confirmation.order_id.as_str())
                    && payment.gateway_payment_id.as_deref()
                        == Some(confirmation.payment_id.as_str());
                txn.commit().await.map_err(db_err)?;
                if ids_match {
                    return Ok(payment);
                }
                return Err(PaymentError::VerificationFailed);
            }
            PaymentStatus::Failed => {
                return Err(PaymentError::AlreadySettled(payment_id));
            }
            PaymentStatus::Pending => {}
        }

        let referenced = payment_purchases::Entity::find()
            .filter(payment_purchases::Column::PaymentId.eq(payment_id))
            .all(&txn)
            .await
            .map_err(db_err)?;
        let purchase_ids: Vec<Uuid> = referenced.iter().map(|r| r.purchase_id).collect();
        let entry_count = purchase_ids.len();

        let now = Utc::now();

        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(PaymentStatus::Completed);
        active.gateway_order_id = Set(Some(confirmation.order_id.clone()));
        active.gateway_payment_id = Set(Some(confirmation.payment_id.clone()));
        active.gateway_signature = Set(Some(confirmation.signature.clone()));
        active.updated_at = Set(now.into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        // Already-paid entries are a no-op by construction: setting
        // is_paid = true twice changes nothing.
        daily_purchases::Entity::update_many()
            .col_expr(daily_purchases::Column::IsPaid, Expr::value(true))
            .col_expr(
                daily_purchases::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .filter(daily_purchases::Column::Id.is_in(purchase_ids))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        debug!(
            payment_id = %payment_id,
            entries = entry_count,
            "Payment completed and entries settled"
        );
        Ok(updated)
    }

    /// Purchase ids (among `candidates`) referenced by any pending payment.
    async fn pending_referenced_ids<I>(
        txn: &DatabaseTransaction,
        candidates: I,
    ) -> Result<HashSet<Uuid>, PaymentError>
    where
        I: Iterator<Item = Uuid>,
    {
        let candidate_ids: Vec<Uuid> = candidates.collect();
        if candidate_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let references = payment_purchases::Entity::find()
            .filter(payment_purchases::Column::PurchaseId.is_in(candidate_ids))
            .all(txn)
            .await
            .map_err(db_err)?;

        if references.is_empty() {
            return Ok(HashSet::new());
        }

        let payment_ids: Vec<Uuid> = references.iter().map(|r| r.payment_id).collect();
        let pending: HashSet<Uuid> = payments::Entity::find()
            .filter(payments::Column::Id.is_in(payment_ids))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .all(txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|p| p.id)
            .collect();

        Ok(references
            .into_iter()
            .filter(|r| pending.contains(&r.payment_id))
            .map(|r| r.purchase_id)
            .collect())
    }
}
