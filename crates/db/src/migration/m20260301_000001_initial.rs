//! Initial database migration.
//!
//! Creates the enums, the period registry, the journal tables the closing
//! engine reads and writes, and the period audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: PERIOD REGISTRY
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_LINES_SQL).await?;

        // ============================================================
        // PART 4: AUDIT
        // ============================================================
        db.execute_unprepared(PERIOD_AUDIT_EVENTS_SQL).await?;

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

const EXTENSIONS_SQL: &str = r"
-- Equality operators on uuid inside gist exclusion constraints
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
-- Journal entry posting status
CREATE TYPE journal_entry_status AS ENUM (
    'draft',
    'posted',
    'validated',
    'imported'
);

-- Marks entries produced by period closing
CREATE TYPE journal_entry_tag AS ENUM ('regular', 'closing', 'opening');

-- Period lifecycle actions
CREATE TYPE period_audit_action AS ENUM (
    'closed',
    'reopened',
    'opening_regenerated'
);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_period_name CHECK (btrim(name) <> ''),
    CONSTRAINT chk_period_closed_at CHECK (is_closed = (closed_at IS NOT NULL)),
    CONSTRAINT excl_period_overlap EXCLUDE USING gist (
        company_id WITH =,
        daterange(start_date, end_date, '[]') WITH &&
    )
);

CREATE INDEX idx_accounting_periods_company_start ON accounting_periods(company_id, start_date DESC);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    entry_date DATE NOT NULL,
    status journal_entry_status NOT NULL DEFAULT 'draft',
    tag journal_entry_tag NOT NULL DEFAULT 'regular',
    source_period_id UUID REFERENCES accounting_periods(id),
    description TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_artifact_source CHECK ((tag = 'regular') = (source_period_id IS NULL))
);

-- Balance and activity scans by date range
CREATE INDEX idx_journal_entries_company_date ON journal_entries(company_id, entry_date);

-- Closing artifacts by originating period
CREATE INDEX idx_journal_entries_source ON journal_entries(source_period_id, tag)
    WHERE tag <> 'regular';
";

const JOURNAL_ENTRY_LINES_SQL: &str = r#"
CREATE TABLE journal_entry_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    -- Byte order so account listings sort the same on every locale
    account_number VARCHAR(20) COLLATE "C" NOT NULL,
    account_name VARCHAR(255),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    lettering VARCHAR(20),
    CONSTRAINT chk_line_amounts CHECK (debit >= 0 AND credit >= 0),
    UNIQUE (entry_id, line_number)
);

CREATE INDEX idx_journal_entry_lines_account ON journal_entry_lines(account_number);
"#;

const PERIOD_AUDIT_EVENTS_SQL: &str = r"
CREATE TABLE period_audit_events (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    period_id UUID NOT NULL REFERENCES accounting_periods(id) ON DELETE CASCADE,
    action period_audit_action NOT NULL,
    reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_period_audit_events_period ON period_audit_events(period_id, created_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS period_audit_events CASCADE;
DROP TABLE IF EXISTS journal_entry_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TYPE IF EXISTS period_audit_action;
DROP TYPE IF EXISTS journal_entry_tag;
DROP TYPE IF EXISTS journal_entry_status;
";
