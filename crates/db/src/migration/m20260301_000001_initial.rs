//! Initial database migration.
//!
//! Creates the enums, tables and indexes for the ledger: branches,
//! users, accounts, funds, categories, transactions, fund transfers,
//! claims and the append-only audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(BRANCHES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(FUNDS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(FUND_TRANSFERS_SQL).await?;
        db.execute_unprepared(CLAIMS_SQL).await?;
        db.execute_unprepared(AUDIT_LOG_SQL).await?;

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
CREATE TYPE transaction_kind AS ENUM ('income', 'expense');

CREATE TYPE claim_status AS ENUM ('pending', 'approved', 'rejected');

CREATE TYPE role_scope AS ENUM ('branch', 'cross_branch', 'global');
";

const BRANCHES_SQL: &str = r"
CREATE TABLE branches (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL UNIQUE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    branch_id UUID NOT NULL REFERENCES branches(id),
    role role_scope NOT NULL DEFAULT 'branch',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_users_branch ON users(branch_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    name VARCHAR(255) NOT NULL,
    starting_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_accounts_branch_name UNIQUE (branch_id, name)
);

-- At most one default account per branch.
CREATE UNIQUE INDEX uq_accounts_branch_default
    ON accounts(branch_id) WHERE is_default;

CREATE INDEX idx_accounts_branch ON accounts(branch_id);
";

const FUNDS_SQL: &str = r"
CREATE TABLE funds (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    name VARCHAR(255) NOT NULL,
    is_general BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_funds_branch_name UNIQUE (branch_id, name)
);

-- At most one General Fund per branch.
CREATE UNIQUE INDEX uq_funds_branch_general
    ON funds(branch_id) WHERE is_general;

CREATE INDEX idx_funds_branch ON funds(branch_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    name VARCHAR(255) NOT NULL,
    kind transaction_kind NOT NULL,
    is_claim_category BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_categories_branch_name UNIQUE (branch_id, name)
);

CREATE INDEX idx_categories_branch ON categories(branch_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    kind transaction_kind NOT NULL,
    transaction_date DATE NOT NULL,
    amount NUMERIC(19, 2) NOT NULL CHECK (amount > 0),
    account_id UUID NOT NULL REFERENCES accounts(id),
    category_id UUID NOT NULL REFERENCES categories(id),
    fund_id UUID REFERENCES funds(id),
    description TEXT NOT NULL DEFAULT '',
    reference VARCHAR(255),
    receipt_ref VARCHAR(255),
    claim_id UUID,
    created_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_transactions_branch_date
    ON transactions(branch_id, transaction_date DESC);
CREATE INDEX idx_transactions_account ON transactions(account_id);
CREATE INDEX idx_transactions_fund ON transactions(fund_id);
CREATE INDEX idx_transactions_claim ON transactions(claim_id);
";

const FUND_TRANSFERS_SQL: &str = r"
CREATE TABLE fund_transfers (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    from_fund_id UUID NOT NULL REFERENCES funds(id),
    to_fund_id UUID NOT NULL REFERENCES funds(id),
    amount NUMERIC(19, 2) NOT NULL CHECK (amount > 0),
    description TEXT NOT NULL DEFAULT '',
    created_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_transfer_distinct_funds CHECK (from_fund_id <> to_fund_id)
);

CREATE INDEX idx_fund_transfers_branch ON fund_transfers(branch_id);
CREATE INDEX idx_fund_transfers_from ON fund_transfers(from_fund_id);
CREATE INDEX idx_fund_transfers_to ON fund_transfers(to_fund_id);
";

const CLAIMS_SQL: &str = r"
CREATE TABLE claims (
    id UUID PRIMARY KEY,
    branch_id UUID NOT NULL REFERENCES branches(id),
    submitted_by UUID NOT NULL REFERENCES users(id),
    amount NUMERIC(19, 2) NOT NULL CHECK (amount > 0),
    receipt_date DATE NOT NULL,
    category_id UUID REFERENCES categories(id),
    description TEXT NOT NULL DEFAULT '',
    receipt_ref VARCHAR(255) NOT NULL,
    status claim_status NOT NULL DEFAULT 'pending',
    decided_by UUID REFERENCES users(id),
    decided_at TIMESTAMPTZ,
    rejection_reason TEXT,
    transaction_id UUID REFERENCES transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_claims_branch_status ON claims(branch_id, status);
CREATE INDEX idx_claims_submitter ON claims(submitted_by);

-- Back-reference from approval-generated expenses to their claim.
ALTER TABLE transactions
    ADD CONSTRAINT fk_transactions_claim
    FOREIGN KEY (claim_id) REFERENCES claims(id);
";

const AUDIT_LOG_SQL: &str = r"
CREATE TABLE audit_log (
    id UUID PRIMARY KEY,
    actor_id UUID REFERENCES users(id),
    action VARCHAR(64) NOT NULL,
    entity_type VARCHAR(64) NOT NULL,
    entity_id UUID,
    old_values JSONB,
    new_values JSONB,
    ip_address VARCHAR(45),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_audit_log_created ON audit_log(created_at DESC);
CREATE INDEX idx_audit_log_actor ON audit_log(actor_id);
CREATE INDEX idx_audit_log_entity ON audit_log(entity_type, entity_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_log;
ALTER TABLE IF EXISTS transactions DROP CONSTRAINT IF EXISTS fk_transactions_claim;
DROP TABLE IF EXISTS claims;
DROP TABLE IF EXISTS fund_transfers;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS funds;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS branches;
DROP TYPE IF EXISTS role_scope;
DROP TYPE IF EXISTS claim_status;
DROP TYPE IF EXISTS transaction_kind;
";
