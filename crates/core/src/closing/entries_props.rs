//! Property-based tests for result calculation and closing entry planning.
//!
//! - Closing entries are always balanced
//! - Closing zeroes every revenue and expense account
//! - Opening entries are balanced whenever the ledger is
//! - The result is linear in the amounts

use chrono::{NaiveDate, Utc};
use closebook_shared::types::CompanyId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entries::EntryPlanner;
use super::result::ResultCalculator;
use super::types::ClosingPolicy;
use crate::ledger::{AccountBalance, AccountClass, BalanceAggregator, LedgerLine};
use crate::period::{AccountingPeriod, CreatePeriodInput};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_number() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("101300".to_string()),
        Just("215400".to_string()),
        Just("310000".to_string()),
        Just("401000".to_string()),
        Just("411000".to_string()),
        Just("512000".to_string()),
        Just("601000".to_string()),
        Just("641000".to_string()),
        Just("706000".to_string()),
        Just("758000".to_string()),
        Just("890000".to_string()),
    ]
}

/// A balanced two-line movement between two random accounts.
fn balanced_movement() -> impl Strategy<Value = [LedgerLine; 2]> {
    (account_number(), account_number(), positive_amount()).prop_map(|(debit, credit, amount)| {
        [LedgerLine::debit(debit, amount), LedgerLine::credit(credit, amount)]
    })
}

/// An arbitrary, possibly unbalanced, line.
fn any_line() -> impl Strategy<Value = LedgerLine> {
    (account_number(), positive_amount(), any::<bool>()).prop_map(|(account, amount, is_debit)| {
        if is_debit {
            LedgerLine::debit(account, amount)
        } else {
            LedgerLine::credit(account, amount)
        }
    })
}

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

fn aggregate<'a>(lines: impl IntoIterator<Item = &'a LedgerLine>) -> Vec<AccountBalance> {
    lines.into_iter().collect::<BalanceAggregator>().finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The closing entry balances even when the ledger does not.
    #[test]
    fn prop_closing_entry_balanced(lines in prop::collection::vec(any_line(), 0..30)) {
        let balances = aggregate(&lines);
        let result = ResultCalculator::calculate(&balances);
        let entry = EntryPlanner::closing_entry(&period("P", 2024), &balances, &result, &ClosingPolicy::default());

        prop_assert!(entry.is_balanced(), "debit {} != credit {}", entry.total_debit(), entry.total_credit());
    }

    /// After applying the closing entry every class 6/7 balance is zero.
    #[test]
    fn prop_closing_zeroes_income_statement(lines in prop::collection::vec(any_line(), 0..30)) {
        let balances = aggregate(&lines);
        let result = ResultCalculator::calculate(&balances);
        let entry = EntryPlanner::closing_entry(&period("P", 2024), &balances, &result, &ClosingPolicy::default());

        let after = aggregate(lines.iter().chain(entry.lines.iter()));
        for balance in after.iter().filter(|b| b.class().is_income_statement()) {
            prop_assert_eq!(balance.balance, Decimal::ZERO, "account {}", &balance.account_number);
        }
        prop_assert_eq!(ResultCalculator::calculate(&after).result, Decimal::ZERO);
    }

    /// The opening entry of a balanced ledger is balanced.
    #[test]
    fn prop_opening_entry_balanced(movements in prop::collection::vec(balanced_movement(), 0..20)) {
        let lines: Vec<LedgerLine> = movements.into_iter().flatten().collect();
        let closed = period("2024", 2024);
        let next = period("2025", 2025);

        let balances = aggregate(&lines);
        let result = ResultCalculator::calculate(&balances);
        let closing = EntryPlanner::closing_entry(&closed, &balances, &result, &ClosingPolicy::default());
        let after = aggregate(lines.iter().chain(closing.lines.iter()));
        let opening = EntryPlanner::opening_entry(&closed, &next, &after);

        prop_assert!(opening.is_balanced());
        for line in &opening.lines {
            prop_assert!(AccountClass::of(&line.account_number).is_balance_sheet());
        }
    }

    /// result(A + B) == result(A) + result(B).
    #[test]
    fn prop_result_is_linear(
        a in prop::collection::vec(any_line(), 0..20),
        b in prop::collection::vec(any_line(), 0..20),
    ) {
        let combined = ResultCalculator::calculate(&aggregate(a.iter().chain(b.iter())));
        let left = ResultCalculator::calculate(&aggregate(&a));
        let right = ResultCalculator::calculate(&aggregate(&b));

        prop_assert_eq!(combined.result, left.result + right.result);
        prop_assert_eq!(combined.total_charges, left.total_charges + right.total_charges);
        prop_assert_eq!(combined.total_revenue, left.total_revenue + right.total_revenue);
    }
}
