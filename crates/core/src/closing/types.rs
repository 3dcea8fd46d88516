//! Closing domain types.

use chrono::{DateTime, NaiveDate, Utc};
use closebook_shared::config::ClosingConfig;
use closebook_shared::types::{
    AccountingPeriodId, CompanyId, JournalEntryId, PeriodAuditEventId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::AccountingPeriod;

/// Accounts and tolerance applied when closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPolicy {
    /// Account credited with a profit.
    pub profit_account: String,
    /// Account debited with a loss.
    pub loss_account: String,
    /// Maximum accepted |debit - credit| over the period.
    pub balance_tolerance: Decimal,
}

impl Default for ClosingPolicy {
    fn default() -> Self {
        Self {
            profit_account: "120".to_string(),
            loss_account: "129".to_string(),
            balance_tolerance: Decimal::new(1, 2),
        }
    }
}

impl From<&ClosingConfig> for ClosingPolicy {
    fn from(config: &ClosingConfig) -> Self {
        Self {
            profit_account: config.profit_account.clone(),
            loss_account: config.loss_account.clone(),
            balance_tolerance: config.balance_tolerance,
        }
    }
}

/// Whether the period made money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Revenue >= expenses.
    Profit,
    /// Revenue < expenses.
    Loss,
}

/// Financial result of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodResult {
    /// Σ(debit - credit) over class 6.
    pub total_charges: Decimal,
    /// Σ(credit - debit) over class 7.
    #[serde(rename = "total_produits")]
    pub total_revenue: Decimal,
    /// `total_revenue - total_charges`.
    pub result: Decimal,
    /// `result >= 0`.
    pub is_profit: bool,
}

impl PeriodResult {
    /// Profit or loss; a zero result is a profit.
    #[must_use]
    pub const fn result_type(&self) -> ResultType {
        if self.is_profit {
            ResultType::Profit
        } else {
            ResultType::Loss
        }
    }

    /// Absolute amount of the result.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.result.abs()
    }
}

/// Debit/credit equilibrium over the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// Sum of posted debits.
    pub total_debit: Decimal,
    /// Sum of posted credits.
    pub total_credit: Decimal,
    /// Whether the gap is within tolerance.
    pub is_balanced: bool,
}

/// Outcome of the closure readiness checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `errors` is empty.
    pub is_valid: bool,
    /// Blocking problems.
    pub errors: Vec<String>,
    /// Non-blocking notices.
    pub warnings: Vec<String>,
    /// Debit/credit equilibrium.
    pub balance_sheet: BalanceCheck,
    /// Draft entries in the period.
    pub unposted_entries: u64,
    /// Unlettered third-party lines.
    pub unlettered_entries: u64,
    /// Unlettered customer lines.
    pub unlettered_customer_lines: u64,
    /// Unlettered supplier lines.
    pub unlettered_supplier_lines: u64,
    /// Period name.
    pub period_name: String,
    /// Whether the period is already closed.
    pub is_closed: bool,
}

/// Read-only snapshot of a period's closing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureStatus {
    /// Period id.
    pub period_id: AccountingPeriodId,
    /// Whether the period is closed.
    pub is_closed: bool,
    /// Period name.
    pub period_name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Entries in range, any status.
    pub total_entries: u64,
    /// Draft entries in range.
    pub draft_entries: u64,
    /// Posted entries in range.
    pub posted_entries: u64,
    /// Unlettered customer lines.
    pub unlettered_customer_lines: u64,
    /// Unlettered supplier lines.
    pub unlettered_supplier_lines: u64,
    /// Whether a closing entry exists for the period.
    pub has_closing_entry: bool,
}

/// Successful close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosed {
    /// The period, now closed.
    pub period: AccountingPeriod,
    /// The closing entry written.
    pub closing_entry_id: JournalEntryId,
    /// The opening entry written into the next period, if any.
    pub opening_entry_id: Option<JournalEntryId>,
    /// Absolute result amount.
    pub result_amount: Decimal,
    /// Profit or loss.
    pub result_type: ResultType,
    /// Non-blocking notices.
    pub warnings: Vec<String>,
}

/// Successful reopen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReopened {
    /// The period, now open.
    pub period: AccountingPeriod,
    /// Closing and opening entries removed.
    pub deleted_entries: u64,
    /// Non-blocking notices, including the recorded reason.
    pub warnings: Vec<String>,
}

/// Successful opening entry regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningEntriesRegenerated {
    /// The closed period the balances come from.
    pub period_id: AccountingPeriodId,
    /// The period receiving the opening entry.
    pub target_period: AccountingPeriod,
    /// The new opening entry.
    pub opening_entry_id: JournalEntryId,
    /// Previous opening entries replaced.
    pub replaced_entries: u64,
}

/// Lifecycle action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Period closed.
    Closed,
    /// Period reopened.
    Reopened,
    /// Opening entry rewritten.
    OpeningRegenerated,
}

/// Audit trail record of a period lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAuditEvent {
    /// Unique identifier.
    pub id: PeriodAuditEventId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Period concerned.
    pub period_id: AccountingPeriodId,
    /// What happened.
    pub action: AuditAction,
    /// Caller-supplied reason (reopen).
    pub reason: Option<String>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl PeriodAuditEvent {
    /// Creates an event stamped `now`.
    #[must_use]
    pub fn new(
        period: &AccountingPeriod,
        action: AuditAction,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PeriodAuditEventId::new(),
            company_id: period.company_id,
            period_id: period.id,
            action,
            reason,
            created_at: now,
        }
    }
}
