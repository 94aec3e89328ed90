//! Purchase repository: the daily ledger's persistence.
//!
//! The daily upsert is a single conditional write on the compound unique key
//! (customer, milkman, entry_date) - never a find-then-save sequence - so
//! two concurrent recordings of the same day can never produce two rows.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use milkbook_core::purchase::{PricedPurchase, PurchaseError, types::LedgerEntry};

use crate::entities::{
    daily_purchases, payment_purchases, payments, sea_orm_active_enums::PaymentStatus,
};

/// Maps a ledger row to the core view consumed by aggregation and payment
/// logic.
#[must_use]
pub fn to_ledger_entry(model: &daily_purchases::Model) -> LedgerEntry {
    LedgerEntry {
        id: model.id,
        customer_id: model.customer_id,
        milkman_id: model.milkman_id,
        litres: model.litres,
        price_per_litre: model.price_per_litre,
        total_amount: model.total_amount,
        billing_cycle_days: model.billing_cycle_days.unsigned_abs(),
        entry_date: model.entry_date,
        due_date: model.due_date,
        is_paid: model.is_paid,
    }
}

fn db_err(e: DbErr) -> PurchaseError {
    PurchaseError::Database(e.to_string())
}

/// Purchase repository for ledger persistence.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    db: DatabaseConnection,
}

impl PurchaseRepository {
    /// Creates a new purchase repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts the ledger entry for a priced purchase.
    ///
    /// If an entry already exists for (customer, milkman, entry_date) it is
    /// overwritten in place: quantity, snapshotted price, amount, cycle, and
    /// due date. An entry referenced by a pending payment is locked against
    /// edits and the upsert fails with a retryable conflict.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::LockedByPendingPayment` or a database error.
    pub async fn upsert_daily(
        &self,
        priced: &PricedPurchase,
    ) -> Result<daily_purchases::Model, PurchaseError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        // Lock the existing row (if any) so this upsert serializes with
        // order creation, which locks the same rows before referencing them.
        let existing = daily_purchases::Entity::find()
            .filter(daily_purchases::Column::CustomerId.eq(priced.customer_id))
            .filter(daily_purchases::Column::MilkmanId.eq(priced.milkman_id))
            .filter(daily_purchases::Column::EntryDate.eq(priced.entry_date))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?;

        if let Some(entry) = &existing {
            if Self::is_referenced_by_pending(&txn, entry.id).await? {
                return Err(PurchaseError::LockedByPendingPayment(entry.id));
            }
        }

        let now = Utc::now().into();
        #[allow(clippy::cast_possible_wrap)]
        let cycle_days = priced.billing_cycle.days() as i16;

        let row = daily_purchases::ActiveModel {
            id: Set(Uuid::now_v7()),
            customer_id: Set(priced.customer_id),
            milkman_id: Set(priced.milkman_id),
            litres: Set(priced.litres),
            price_per_litre: Set(priced.price_per_litre),
            total_amount: Set(priced.total_amount),
            billing_cycle_days: Set(cycle_days),
            entry_date: Set(priced.entry_date),
            due_date: Set(priced.due_date),
            is_paid: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = daily_purchases::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    daily_purchases::Column::CustomerId,
                    daily_purchases::Column::MilkmanId,
                    daily_purchases::Column::EntryDate,
                ])
                .update_columns([
                    daily_purchases::Column::Litres,
                    daily_purchases::Column::PricePerLitre,
                    daily_purchases::Column::TotalAmount,
                    daily_purchases::Column::BillingCycleDays,
                    daily_purchases::Column::DueDate,
                    daily_purchases::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_with_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        debug!(
            purchase_id = %model.id,
            overwrote = existing.is_some(),
            "Daily purchase upserted"
        );
        Ok(model)
    }

    /// Lists a customer's entries, newest first.
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<daily_purchases::Model>, PurchaseError> {
        daily_purchases::Entity::find()
            .filter(daily_purchases::Column::CustomerId.eq(customer_id))
            .order_by_desc(daily_purchases::Column::EntryDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists all entries across a milkman's customers, newest first.
    pub async fn list_for_milkman(
        &self,
        milkman_id: Uuid,
    ) -> Result<Vec<daily_purchases::Model>, PurchaseError> {
        daily_purchases::Entity::find()
            .filter(daily_purchases::Column::MilkmanId.eq(milkman_id))
            .order_by_desc(daily_purchases::Column::EntryDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Milkman's manual override: marks one of their entries paid without a
    /// gateway payment. The transition stays one-directional; marking an
    /// already-paid entry is a no-op.
    pub async fn mark_paid_direct(
        &self,
        milkman_id: Uuid,
        purchase_id: Uuid,
    ) -> Result<daily_purchases::Model, PurchaseError> {
        let entry = daily_purchases::Entity::find_by_id(purchase_id)
            .filter(daily_purchases::Column::MilkmanId.eq(milkman_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PurchaseError::NotFound(purchase_id))?;

        if entry.is_paid {
            return Ok(entry);
        }

        let mut active: daily_purchases::ActiveModel = entry.into();
        active.is_paid = Set(true);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_err)
    }

    /// Returns true if any non-terminal payment references the entry.
    async fn is_referenced_by_pending(
        txn: &DatabaseTransaction,
        purchase_id: Uuid,
    ) -> Result<bool, PurchaseError> {
        let references = payment_purchases::Entity::find()
            .filter(payment_purchases::Column::PurchaseId.eq(purchase_id))
            .all(txn)
            .await
            .map_err(db_err)?;

        if references.is_empty() {
            return Ok(false);
        }

        let payment_ids: Vec<Uuid> = references.iter().map(|r| r.payment_id).collect();
        let pending = payments::Entity::find()
            .filter(payments::Column::Id.is_in(payment_ids))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .count(txn)
            .await
            .map_err(db_err)?;

        Ok(pending > 0)
    }
}
