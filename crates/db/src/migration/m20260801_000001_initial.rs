//! Initial database migration.
//!
//! Creates the enums, tables, and indexes for accounts, verification codes,
//! the daily purchase ledger, and payments.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(VERIFICATION_CODES_SQL).await?;

        // ============================================================
        // PART 3: PURCHASE LEDGER
        // ============================================================
        db.execute_unprepared(DAILY_PURCHASES_SQL).await?;

        // ============================================================
        // PART 4: PAYMENTS
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_PURCHASES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account roles
CREATE TYPE user_role AS ENUM ('milkman', 'customer');

-- Payment lifecycle
CREATE TYPE payment_status AS ENUM ('pending', 'completed', 'failed');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role user_role NOT NULL,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    milkman_id UUID REFERENCES users(id),
    referral_code TEXT UNIQUE,
    price_per_litre NUMERIC(12, 2) CHECK (price_per_litre > 0),
    gateway_key_id TEXT,
    gateway_key_secret TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    -- Customers are always bound to a milkman; milkmen never are.
    CONSTRAINT customer_has_milkman CHECK (role <> 'customer' OR milkman_id IS NOT NULL),
    CONSTRAINT milkman_has_no_milkman CHECK (role <> 'milkman' OR milkman_id IS NULL)
);

CREATE INDEX idx_users_milkman ON users(milkman_id) WHERE milkman_id IS NOT NULL;
";

const VERIFICATION_CODES_SQL: &str = r"
CREATE TABLE verification_codes (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    code_hash TEXT NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    consumed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const DAILY_PURCHASES_SQL: &str = r"
CREATE TABLE daily_purchases (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES users(id),
    milkman_id UUID NOT NULL REFERENCES users(id),
    litres NUMERIC(10, 3) NOT NULL CHECK (litres > 0),
    price_per_litre NUMERIC(12, 2) NOT NULL CHECK (price_per_litre >= 0),
    total_amount NUMERIC(14, 2) NOT NULL CHECK (total_amount >= 0),
    billing_cycle_days SMALLINT NOT NULL CHECK (billing_cycle_days IN (15, 30)),
    entry_date DATE NOT NULL,
    due_date DATE NOT NULL,
    is_paid BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    -- One entry per customer/milkman/day; the upsert's conflict target.
    CONSTRAINT uq_daily_purchase UNIQUE (customer_id, milkman_id, entry_date)
);

CREATE INDEX idx_daily_purchases_customer ON daily_purchases(customer_id, entry_date DESC);
CREATE INDEX idx_daily_purchases_milkman ON daily_purchases(milkman_id, entry_date DESC);
CREATE INDEX idx_daily_purchases_unpaid ON daily_purchases(customer_id) WHERE NOT is_paid;
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES users(id),
    milkman_id UUID NOT NULL REFERENCES users(id),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
    status payment_status NOT NULL DEFAULT 'pending',
    gateway_order_id TEXT,
    gateway_payment_id TEXT,
    gateway_signature TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_payments_customer ON payments(customer_id, created_at DESC);
CREATE INDEX idx_payments_milkman ON payments(milkman_id, created_at DESC);
CREATE INDEX idx_payments_pending ON payments(id) WHERE status = 'pending';
";

const PAYMENT_PURCHASES_SQL: &str = r"
CREATE TABLE payment_purchases (
    id UUID PRIMARY KEY,
    payment_id UUID NOT NULL REFERENCES payments(id) ON DELETE CASCADE,
    purchase_id UUID NOT NULL REFERENCES daily_purchases(id),
    position INTEGER NOT NULL,
    CONSTRAINT uq_payment_purchase UNIQUE (payment_id, purchase_id)
);

CREATE INDEX idx_payment_purchases_purchase ON payment_purchases(purchase_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payment_purchases;
DROP TABLE IF EXISTS payments;
DROP TABLE IF EXISTS daily_purchases;
DROP TABLE IF EXISTS verification_codes;
DROP TABLE IF EXISTS users;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS user_role;
";
