//! Postgres implementation of the closing storage traits.
//!
//! Every closing mutation runs in one database transaction. Period locks are
//! row locks taken with `NOWAIT`, so a second writer on the same period fails
//! immediately with `Concurrency` instead of queueing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use closebook_core::closing::{
    ClosingError, ClosingStore, ClosingTransaction, LedgerReader, PeriodAuditEvent,
};
use closebook_core::ledger::{AccountBalance, EntryTag, LedgerActivity, NewJournalEntry};
use closebook_core::period::AccountingPeriod;
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::warn;

use super::{EXCLUSION_VIOLATION, audit, closing_error, ledger, period, sql_state};

/// Closing store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgClosingStore {
    db: DatabaseConnection,
}

impl PgClosingStore {
    /// Creates a store over a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerReader for PgClosingStore {
    async fn list_periods(&self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError> {
        period::list_periods(&self.db, company_id)
            .await
            .map_err(closing_error)
    }

    async fn find_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<Option<AccountingPeriod>, ClosingError> {
        period::find_period(&self.db, company_id, period_id)
            .await
            .map_err(closing_error)
    }

    async fn account_balances(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError> {
        ledger::account_balances(&self.db, company_id, start_date, end_date)
            .await
            .map_err(closing_error)
    }

    async fn ledger_activity(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError> {
        ledger::ledger_activity(&self.db, company_id, start_date, end_date)
            .await
            .map_err(closing_error)
    }

    async fn count_artifacts(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError> {
        ledger::count_artifacts(&self.db, company_id, period_id, tag)
            .await
            .map_err(closing_error)
    }
}

#[async_trait]
impl ClosingStore for PgClosingStore {
    type Tx = PgClosingTransaction;

    async fn begin(&self) -> Result<PgClosingTransaction, ClosingError> {
        let txn = self.db.begin().await.map_err(closing_error)?;
        Ok(PgClosingTransaction {
            txn,
            db: self.db.clone(),
        })
    }
}

/// One closing unit of work. Dropped without `commit`, it rolls back.
pub struct PgClosingTransaction {
    txn: DatabaseTransaction,
    /// Pool handle for lookups once `txn` is aborted.
    db: DatabaseConnection,
}

#[async_trait]
impl ClosingTransaction for PgClosingTransaction {
    async fn list_periods(&mut self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError> {
        period::list_periods(&self.txn, company_id)
            .await
            .map_err(closing_error)
    }

    async fn insert_period(&mut self, new_period: &AccountingPeriod) -> Result<(), ClosingError> {
        match period::insert_period(&self.txn, new_period).await {
            Ok(()) => Ok(()),
            Err(err) if sql_state(&err).as_deref() == Some(EXCLUSION_VIOLATION) => {
                warn!(name = %new_period.name, "Concurrent overlapping period rejected by constraint");
                let existing = period::find_overlapping(
                    &self.db,
                    new_period.company_id,
                    new_period.start_date,
                    new_period.end_date,
                )
                .await
                .map_err(closing_error)?;
                Err(existing.map_or(ClosingError::Concurrency, |p| {
                    ClosingError::OverlappingPeriod { existing: p.name }
                }))
            }
            Err(err) => Err(closing_error(err)),
        }
    }

    async fn lock_period(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, ClosingError> {
        period::lock_period(&self.txn, company_id, period_id)
            .await
            .map_err(closing_error)?
            .ok_or(ClosingError::PeriodNotFound(period_id))
    }

    async fn lock_later_periods(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, ClosingError> {
        period::lock_periods_after(&self.txn, company_id, after)
            .await
            .map_err(closing_error)
    }

    async fn successor_period(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, ClosingError> {
        period::successor_period(&self.txn, company_id, after)
            .await
            .map_err(closing_error)
    }

    async fn account_balances(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError> {
        ledger::account_balances(&self.txn, company_id, start_date, end_date)
            .await
            .map_err(closing_error)
    }

    async fn ledger_activity(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError> {
        ledger::ledger_activity(&self.txn, company_id, start_date, end_date)
            .await
            .map_err(closing_error)
    }

    async fn insert_entry(&mut self, entry: &NewJournalEntry) -> Result<JournalEntryId, ClosingError> {
        ledger::insert_entry(&self.txn, entry)
            .await
            .map_err(closing_error)
    }

    async fn delete_artifacts(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError> {
        ledger::delete_artifacts(&self.txn, company_id, period_id, tag)
            .await
            .map_err(closing_error)
    }

    async fn set_period_closed(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<AccountingPeriod, ClosingError> {
        period::set_closed(&self.txn, company_id, period_id, closed_at)
            .await
            .map_err(closing_error)?
            .ok_or(ClosingError::PeriodNotFound(period_id))
    }

    async fn append_audit(&mut self, event: &PeriodAuditEvent) -> Result<(), ClosingError> {
        audit::append(&self.txn, event).await.map_err(closing_error)
    }

    async fn commit(self) -> Result<(), ClosingError> {
        self.txn.commit().await.map_err(closing_error)
    }
}
