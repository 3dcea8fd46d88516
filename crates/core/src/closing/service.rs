//! Closing service.
//!
//! Reads go straight to the store. Close, reopen and opening regeneration each
//! run in one store transaction holding the period lock; any error drops the
//! transaction and leaves storage untouched.

use chrono::{NaiveDate, Utc};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use tracing::{info, instrument, warn};

use super::entries::EntryPlanner;
use super::error::ClosingError;
use super::result::ResultCalculator;
use super::store::{ClosingStore, ClosingTransaction};
use super::types::{
    AuditAction, ClosingPolicy, ClosureStatus, OpeningEntriesRegenerated, PeriodAuditEvent,
    PeriodClosed, PeriodReopened, PeriodResult, ValidationReport,
};
use super::validator::ClosureValidator;
use crate::ledger::{AccountBalance, EntryTag};
use crate::period::{
    AccountingPeriod, CreatePeriodInput, find_overlap, validate_date_range, validate_period_input,
};

/// Period registry and closing executor over a store.
#[derive(Debug)]
pub struct ClosingService<S> {
    store: S,
    policy: ClosingPolicy,
}

impl<S: ClosingStore> ClosingService<S> {
    /// Creates a service over `store` applying `policy`.
    pub fn new(store: S, policy: ClosingPolicy) -> Self {
        Self { store, policy }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Period registry
    // ========================================================================

    /// Registers a new open period.
    #[instrument(skip(self, input), fields(company_id = %input.company_id, name = %input.name))]
    pub async fn create_period(
        &self,
        input: CreatePeriodInput,
    ) -> Result<AccountingPeriod, ClosingError> {
        validate_period_input(&input)?;

        let mut tx = self.store.begin().await?;
        let existing = tx.list_periods(input.company_id).await?;
        if let Some(conflict) = find_overlap(&existing, input.start_date, input.end_date) {
            return Err(ClosingError::OverlappingPeriod {
                existing: conflict.name.clone(),
            });
        }

        let period = AccountingPeriod::open(&input, Utc::now());
        tx.insert_period(&period).await?;
        tx.commit().await?;

        info!(period_id = %period.id, "Accounting period created");
        Ok(period)
    }

    /// Periods of a company, latest first.
    pub async fn get_periods(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<AccountingPeriod>, ClosingError> {
        self.store.list_periods(company_id).await
    }

    /// One period of a company.
    pub async fn get_period_by_id(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, ClosingError> {
        self.store
            .find_period(company_id, period_id)
            .await?
            .ok_or(ClosingError::PeriodNotFound(period_id))
    }

    // ========================================================================
    // Read-only reports
    // ========================================================================

    /// Posted balances per account over a date range.
    pub async fn get_account_balances(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError> {
        validate_date_range(start_date, end_date)?;
        self.store
            .account_balances(company_id, start_date, end_date)
            .await
    }

    /// Revenue minus expenses over a date range.
    pub async fn calculate_period_result(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PeriodResult, ClosingError> {
        let balances = self
            .get_account_balances(company_id, start_date, end_date)
            .await?;
        Ok(ResultCalculator::calculate(&balances))
    }

    /// Whether the period could be closed now, and why not.
    pub async fn validate_closure_readiness(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<ValidationReport, ClosingError> {
        let period = self.get_period_by_id(company_id, period_id).await?;
        let balances = self
            .store
            .account_balances(company_id, period.start_date, period.end_date)
            .await?;
        let activity = self
            .store
            .ledger_activity(company_id, period.start_date, period.end_date)
            .await?;

        Ok(ClosureValidator::assess(
            &period,
            &balances,
            &activity,
            self.policy.balance_tolerance,
        ))
    }

    /// Entry counts and closing state of a period.
    pub async fn get_period_closure_status(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<ClosureStatus, ClosingError> {
        let period = self.get_period_by_id(company_id, period_id).await?;
        let activity = self
            .store
            .ledger_activity(company_id, period.start_date, period.end_date)
            .await?;
        let closing_entries = self
            .store
            .count_artifacts(company_id, period_id, EntryTag::Closing)
            .await?;

        Ok(ClosureStatus {
            period_id,
            is_closed: period.is_closed,
            period_name: period.name,
            start_date: period.start_date,
            end_date: period.end_date,
            closed_at: period.closed_at,
            total_entries: activity.total_entries,
            draft_entries: activity.draft_entries,
            posted_entries: activity.posted_entries,
            unlettered_customer_lines: activity.unlettered_customer_lines,
            unlettered_supplier_lines: activity.unlettered_supplier_lines,
            has_closing_entry: closing_entries > 0,
        })
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Closes a period: writes the closing entry, flags the period closed and
    /// carries balances into the next open period.
    #[instrument(skip(self))]
    pub async fn close_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<PeriodClosed, ClosingError> {
        let mut tx = self.store.begin().await?;
        let period = tx.lock_period(company_id, period_id).await?;
        if period.is_closed {
            return Err(ClosingError::AlreadyClosed(period.name));
        }

        let balances = tx
            .account_balances(company_id, period.start_date, period.end_date)
            .await?;
        let activity = tx
            .ledger_activity(company_id, period.start_date, period.end_date)
            .await?;
        let report = ClosureValidator::assess(
            &period,
            &balances,
            &activity,
            self.policy.balance_tolerance,
        );
        if !report.is_valid {
            warn!(period = %period.name, errors = ?report.errors, "Period closure rejected");
            return Err(ClosingError::ValidationFailed {
                errors: report.errors,
                warnings: report.warnings,
            });
        }

        let result = ResultCalculator::calculate(&balances);
        let closing = EntryPlanner::closing_entry(&period, &balances, &result, &self.policy);
        let closing_entry_id = tx.insert_entry(&closing).await?;

        let now = Utc::now();
        let closed = tx.set_period_closed(company_id, period_id, Some(now)).await?;

        let mut warnings = report.warnings;
        let opening_entry_id = match tx.successor_period(company_id, closed.end_date).await? {
            None => {
                warnings.push(format!(
                    "No period follows \"{}\"; opening entries were not generated",
                    closed.name
                ));
                None
            }
            Some(next) if next.is_closed => {
                warnings.push(format!(
                    "Following period \"{}\" is closed; opening entries were not generated",
                    next.name
                ));
                None
            }
            Some(next) => {
                let (opening_id, _) = write_opening_entry(&mut tx, &closed, &next).await?;
                warnings.push(format!("Opening entries generated in period \"{}\"", next.name));
                Some(opening_id)
            }
        };

        tx.append_audit(&PeriodAuditEvent::new(&closed, AuditAction::Closed, None, now))
            .await?;
        tx.commit().await?;

        info!(
            period = %closed.name,
            %closing_entry_id,
            result = %result.result,
            "Accounting period closed"
        );

        Ok(PeriodClosed {
            period: closed,
            closing_entry_id,
            opening_entry_id,
            result_amount: result.amount(),
            result_type: result.result_type(),
            warnings,
        })
    }

    /// Reopens a closed period, deleting the closing entry and the opening
    /// entries it produced.
    #[instrument(skip(self, reason))]
    pub async fn reopen_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        reason: &str,
    ) -> Result<PeriodReopened, ClosingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ClosingError::EmptyReason);
        }

        let mut tx = self.store.begin().await?;
        let period = tx.lock_period(company_id, period_id).await?;

        let blocking: Vec<String> = tx
            .lock_later_periods(company_id, period.end_date)
            .await?
            .into_iter()
            .filter(|p| p.is_closed)
            .map(|p| p.name)
            .collect();
        if !blocking.is_empty() {
            warn!(period = %period.name, blocking = ?blocking, "Reopen blocked by later closed periods");
            return Err(ClosingError::CascadeBlocked { periods: blocking });
        }

        if !period.is_closed {
            return Err(ClosingError::NotClosed(period.name));
        }

        let deleted_closing = tx
            .delete_artifacts(company_id, period_id, EntryTag::Closing)
            .await?;
        let deleted_opening = tx
            .delete_artifacts(company_id, period_id, EntryTag::Opening)
            .await?;
        let reopened = tx.set_period_closed(company_id, period_id, None).await?;

        tx.append_audit(&PeriodAuditEvent::new(
            &reopened,
            AuditAction::Reopened,
            Some(reason.to_string()),
            Utc::now(),
        ))
        .await?;
        tx.commit().await?;

        warn!(period = %reopened.name, reason, "Accounting period reopened");

        Ok(PeriodReopened {
            period: reopened,
            deleted_entries: deleted_closing + deleted_opening,
            warnings: vec![format!("Reopening reason: {reason}")],
        })
    }

    /// Rewrites the opening entry of a closed period into its successor.
    ///
    /// Used when the next period was created after the close. Idempotent.
    #[instrument(skip(self))]
    pub async fn regenerate_opening_entries(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<OpeningEntriesRegenerated, ClosingError> {
        let mut tx = self.store.begin().await?;
        let period = tx.lock_period(company_id, period_id).await?;
        if !period.is_closed {
            return Err(ClosingError::NotClosed(period.name));
        }

        let next = match tx.successor_period(company_id, period.end_date).await? {
            None => return Err(ClosingError::NoSuccessorPeriod(period.name)),
            Some(next) if next.is_closed => return Err(ClosingError::SuccessorClosed(next.name)),
            Some(next) => next,
        };

        let (opening_entry_id, replaced_entries) =
            write_opening_entry(&mut tx, &period, &next).await?;
        tx.append_audit(&PeriodAuditEvent::new(
            &period,
            AuditAction::OpeningRegenerated,
            None,
            Utc::now(),
        ))
        .await?;
        tx.commit().await?;

        info!(
            period = %period.name,
            target = %next.name,
            %opening_entry_id,
            replaced_entries,
            "Opening entries regenerated"
        );

        Ok(OpeningEntriesRegenerated {
            period_id,
            target_period: next,
            opening_entry_id,
            replaced_entries,
        })
    }
}

/// Locks `next`, drops stale opening entries sourced from `closed` and writes
/// a fresh one. Returns the new entry id and the number of entries replaced.
async fn write_opening_entry<T: ClosingTransaction>(
    tx: &mut T,
    closed: &AccountingPeriod,
    next: &AccountingPeriod,
) -> Result<(JournalEntryId, u64), ClosingError> {
    tx.lock_period(next.company_id, next.id).await?;
    let replaced = tx
        .delete_artifacts(closed.company_id, closed.id, EntryTag::Opening)
        .await?;
    let balances = tx
        .account_balances(closed.company_id, closed.start_date, closed.end_date)
        .await?;
    let opening = EntryPlanner::opening_entry(closed, next, &balances);
    let opening_id = tx.insert_entry(&opening).await?;
    Ok((opening_id, replaced))
}
