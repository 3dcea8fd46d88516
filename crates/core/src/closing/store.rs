//! Storage seam for the closing service.
//!
//! `LedgerReader` serves lock-free reads. `ClosingStore::begin` opens a
//! `ClosingTransaction`: every mutation of a close, reopen or regeneration
//! goes through one transaction and becomes visible only on `commit`.
//! Dropping a transaction without committing rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};

use super::error::ClosingError;
use super::types::PeriodAuditEvent;
use crate::ledger::{AccountBalance, EntryTag, LedgerActivity, NewJournalEntry};
use crate::period::AccountingPeriod;

/// Read boundary over periods and the posted ledger.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Periods of a company, latest `start_date` first.
    async fn list_periods(&self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError>;

    /// One period, if it exists and belongs to the company.
    async fn find_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<Option<AccountingPeriod>, ClosingError>;

    /// Per-account totals of posted lines dated within `[start_date, end_date]`,
    /// ordered by account number, inactive accounts dropped.
    async fn account_balances(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError>;

    /// Entry and lettering counts over `[start_date, end_date]`.
    async fn ledger_activity(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError>;

    /// Number of entries with `tag` sourced from `period_id`.
    async fn count_artifacts(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError>;
}

/// A store able to run closing transactions.
#[async_trait]
pub trait ClosingStore: LedgerReader {
    /// Transaction type.
    type Tx: ClosingTransaction;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Tx, ClosingError>;
}

/// One all-or-nothing unit of work.
#[async_trait]
pub trait ClosingTransaction: Send {
    /// Periods of a company as seen by this transaction.
    async fn list_periods(&mut self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError>;

    /// Inserts a period. Fails with `OverlappingPeriod` if storage detects a
    /// conflicting range.
    async fn insert_period(&mut self, period: &AccountingPeriod) -> Result<(), ClosingError>;

    /// Takes the exclusive lock on a period and returns its current state.
    ///
    /// Fails with `Concurrency` when another transaction holds the lock and
    /// `PeriodNotFound` when the period does not exist for the company.
    async fn lock_period(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, ClosingError>;

    /// Locks and returns every period starting after `after`, earliest first.
    async fn lock_later_periods(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, ClosingError>;

    /// The period with the earliest start after `after`, unlocked.
    async fn successor_period(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, ClosingError>;

    /// Same as [`LedgerReader::account_balances`], including this transaction's writes.
    async fn account_balances(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError>;

    /// Same as [`LedgerReader::ledger_activity`], including this transaction's writes.
    async fn ledger_activity(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError>;

    /// Writes a journal entry with its lines.
    async fn insert_entry(&mut self, entry: &NewJournalEntry) -> Result<JournalEntryId, ClosingError>;

    /// Deletes entries with `tag` sourced from `period_id`; returns how many.
    async fn delete_artifacts(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError>;

    /// Sets the closed flag (`Some`) or clears it (`None`).
    async fn set_period_closed(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<AccountingPeriod, ClosingError>;

    /// Appends an audit event.
    async fn append_audit(&mut self, event: &PeriodAuditEvent) -> Result<(), ClosingError>;

    /// Makes every write visible atomically.
    async fn commit(self) -> Result<(), ClosingError>;
}
