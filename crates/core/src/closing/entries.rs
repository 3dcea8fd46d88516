//! Closing and opening entry planning.
//!
//! The closing entry zeroes every revenue and expense account and books the
//! difference to the result account. The opening entry re-creates every
//! balance-sheet balance on the first day of the next period.

use rust_decimal::Decimal;

use super::types::{ClosingPolicy, PeriodResult};
use crate::ledger::{AccountBalance, EntryTag, LedgerLine, NewJournalEntry, PostingStatus};
use crate::period::AccountingPeriod;

/// Stateless planner for closing artifacts.
pub struct EntryPlanner;

impl EntryPlanner {
    /// Plans the closing entry of `period`.
    ///
    /// A debit balance is cleared with a credit line and vice versa. A profit
    /// is credited to the policy's profit account, a loss debited to its loss
    /// account; a zero result adds no result line.
    #[must_use]
    pub fn closing_entry(
        period: &AccountingPeriod,
        balances: &[AccountBalance],
        result: &PeriodResult,
        policy: &ClosingPolicy,
    ) -> NewJournalEntry {
        let mut lines: Vec<LedgerLine> = balances
            .iter()
            .filter(|b| b.class().is_income_statement() && !b.balance.is_zero())
            .map(|b| counter_line(b, CounterSide::Clear))
            .collect();

        if result.result > Decimal::ZERO {
            lines.push(LedgerLine::credit(policy.profit_account.clone(), result.result));
        } else if result.result < Decimal::ZERO {
            lines.push(LedgerLine::debit(policy.loss_account.clone(), -result.result));
        }

        NewJournalEntry {
            company_id: period.company_id,
            entry_date: period.end_date,
            status: PostingStatus::Posted,
            tag: EntryTag::Closing,
            source_period_id: Some(period.id),
            description: format!("Closing entry for period {}", period.name),
            lines,
        }
    }

    /// Plans the opening entry carrying `closed`'s balances into `next`.
    ///
    /// `balances` must be read after the closing entry was written so the
    /// result account is carried too.
    #[must_use]
    pub fn opening_entry(
        closed: &AccountingPeriod,
        next: &AccountingPeriod,
        balances: &[AccountBalance],
    ) -> NewJournalEntry {
        let lines = balances
            .iter()
            .filter(|b| b.class().is_balance_sheet() && !b.balance.is_zero())
            .map(|b| counter_line(b, CounterSide::Carry))
            .collect();

        NewJournalEntry {
            company_id: next.company_id,
            entry_date: next.start_date,
            status: PostingStatus::Posted,
            tag: EntryTag::Opening,
            source_period_id: Some(closed.id),
            description: format!("Opening balances carried forward from period {}", closed.name),
            lines,
        }
    }
}

#[derive(Clone, Copy)]
enum CounterSide {
    /// Book the opposite of the balance.
    Clear,
    /// Book the balance as-is.
    Carry,
}

fn counter_line(balance: &AccountBalance, side: CounterSide) -> LedgerLine {
    let amount = balance.balance.abs();
    let debit_side = match side {
        CounterSide::Clear => balance.balance < Decimal::ZERO,
        CounterSide::Carry => balance.balance > Decimal::ZERO,
    };
    let line = if debit_side {
        LedgerLine::debit(balance.account_number.clone(), amount)
    } else {
        LedgerLine::credit(balance.account_number.clone(), amount)
    };
    match &balance.account_name {
        Some(name) => line.named(name.clone()),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closing::ResultCalculator;
    use crate::ledger::BalanceAggregator;
    use crate::period::CreatePeriodInput;
    use chrono::{NaiveDate, Utc};
    use closebook_shared::types::CompanyId;
    use rust_decimal_macros::dec;

    fn period(name: &str, year: i32) -> AccountingPeriod {
        AccountingPeriod::open(
            &CreatePeriodInput {
                company_id: CompanyId::new(),
                name: name.to_string(),
                start_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            },
            Utc::now(),
        )
    }

    fn example_balances() -> Vec<AccountBalance> {
        vec![
            AccountBalance::from_totals("401000", None, dec!(0), dec!(6000)),
            AccountBalance::from_totals("512000", Some("Bank".into()), dec!(10000), dec!(0)),
            AccountBalance::from_totals("600000", None, dec!(6000), dec!(0)),
            AccountBalance::from_totals("700000", None, dec!(0), dec!(10000)),
        ]
    }

    #[test]
    fn test_closing_entry_for_profit() {
        let period = period("2024", 2024);
        let balances = example_balances();
        let result = ResultCalculator::calculate(&balances);

        let entry = EntryPlanner::closing_entry(&period, &balances, &result, &ClosingPolicy::default());

        assert_eq!(entry.tag, EntryTag::Closing);
        assert_eq!(entry.entry_date, period.end_date);
        assert_eq!(entry.source_period_id, Some(period.id));
        assert_eq!(
            entry.lines,
            vec![
                LedgerLine::credit("600000", dec!(6000)),
                LedgerLine::debit("700000", dec!(10000)),
                LedgerLine::credit("120", dec!(4000)),
            ]
        );
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_closing_entry_for_loss_uses_loss_account() {
        let period = period("2024", 2024);
        let balances = vec![
            AccountBalance::from_totals("512000", None, dec!(0), dec!(500)),
            AccountBalance::from_totals("613000", None, dec!(500), dec!(0)),
        ];
        let result = ResultCalculator::calculate(&balances);

        let entry = EntryPlanner::closing_entry(&period, &balances, &result, &ClosingPolicy::default());
        assert_eq!(entry.lines.last(), Some(&LedgerLine::debit("129", dec!(500))));
        assert!(entry.is_balanced());
    }

    #[test]
    fn test_closing_entry_without_activity_has_no_lines() {
        let period = period("2024", 2024);
        let result = ResultCalculator::calculate(&[]);
        let entry = EntryPlanner::closing_entry(&period, &[], &result, &ClosingPolicy::default());
        assert!(entry.lines.is_empty());
    }

    #[test]
    fn test_opening_entry_carries_balance_sheet_after_closing() {
        let closed = period("2024", 2024);
        let next = period("2025", 2025);
        let balances = example_balances();
        let result = ResultCalculator::calculate(&balances);
        let closing =
            EntryPlanner::closing_entry(&closed, &balances, &result, &ClosingPolicy::default());

        let mut aggregator = BalanceAggregator::new();
        for b in &balances {
            aggregator.add(&b.account_number, b.account_name.as_deref(), b.debit_total, b.credit_total);
        }
        aggregator.extend(closing.lines.iter());
        let after_closing = aggregator.finish();

        let opening = EntryPlanner::opening_entry(&closed, &next, &after_closing);

        assert_eq!(opening.tag, EntryTag::Opening);
        assert_eq!(opening.entry_date, next.start_date);
        assert_eq!(opening.source_period_id, Some(closed.id));
        assert_eq!(
            opening.lines,
            vec![
                LedgerLine::credit("120", dec!(4000)),
                LedgerLine::credit("401000", dec!(6000)),
                LedgerLine::debit("512000", dec!(10000)).named("Bank"),
            ]
        );
        assert!(opening.is_balanced());
    }
}
