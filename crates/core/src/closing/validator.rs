//! Closure readiness checks.

use rust_decimal::Decimal;

use super::types::{BalanceCheck, ValidationReport};
use crate::ledger::{AccountBalance, BalanceTotals, LedgerActivity};
use crate::period::AccountingPeriod;

/// Stateless validator deciding whether a period may be closed.
pub struct ClosureValidator;

impl ClosureValidator {
    /// Builds the readiness report from the period's balances and activity.
    ///
    /// Errors block the close: the period is already closed, draft entries
    /// remain, or debits and credits differ by more than `tolerance`.
    /// Unlettered customer and supplier lines only produce a warning.
    #[must_use]
    pub fn assess(
        period: &AccountingPeriod,
        balances: &[AccountBalance],
        activity: &LedgerActivity,
        tolerance: Decimal,
    ) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if period.is_closed {
            errors.push(format!("Period \"{}\" is already closed", period.name));
        }

        if activity.draft_entries > 0 {
            errors.push(format!(
                "{} draft {} must be posted or deleted before closing",
                activity.draft_entries,
                if activity.draft_entries == 1 { "entry" } else { "entries" }
            ));
        }

        let balance_sheet = Self::balance_check(balances, tolerance);
        if !balance_sheet.is_balanced {
            errors.push(format!(
                "Ledger is not balanced: total debit {}, total credit {} (difference {})",
                balance_sheet.total_debit,
                balance_sheet.total_credit,
                (balance_sheet.total_debit - balance_sheet.total_credit).abs()
            ));
        }

        let unlettered = activity.unlettered_lines();
        if unlettered > 0 {
            warnings.push(format!(
                "{unlettered} third-party {} not lettered ({} customer, {} supplier)",
                if unlettered == 1 { "line is" } else { "lines are" },
                activity.unlettered_customer_lines,
                activity.unlettered_supplier_lines
            ));
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            balance_sheet,
            unposted_entries: activity.draft_entries,
            unlettered_entries: unlettered,
            unlettered_customer_lines: activity.unlettered_customer_lines,
            unlettered_supplier_lines: activity.unlettered_supplier_lines,
            period_name: period.name.clone(),
            is_closed: period.is_closed,
        }
    }

    /// Checks that posted debits and credits agree within `tolerance`.
    #[must_use]
    pub fn balance_check(balances: &[AccountBalance], tolerance: Decimal) -> BalanceCheck {
        let totals = BalanceTotals::of(balances);
        BalanceCheck {
            total_debit: totals.total_debit,
            total_credit: totals.total_credit,
            is_balanced: totals.difference() <= tolerance,
        }
    }
}
