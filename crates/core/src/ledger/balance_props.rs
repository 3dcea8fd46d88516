//! Property-based tests for balance aggregation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{BalanceAggregator, BalanceTotals};
use super::types::LedgerLine;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate account numbers across all classes.
fn account_number() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("101000".to_string()),
        Just("120000".to_string()),
        Just("411000".to_string()),
        Just("401000".to_string()),
        Just("512000".to_string()),
        Just("606100".to_string()),
        Just("706000".to_string()),
        Just("801000".to_string()),
    ]
}

/// Strategy to generate one ledger line.
fn ledger_line() -> impl Strategy<Value = LedgerLine> {
    (account_number(), positive_amount(), any::<bool>()).prop_map(|(account, amount, is_debit)| {
        if is_debit {
            LedgerLine::debit(account, amount)
        } else {
            LedgerLine::credit(account, amount)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Aggregated totals equal the sum of the raw lines.
    #[test]
    fn prop_totals_preserved(lines in prop::collection::vec(ledger_line(), 0..40)) {
        let balances = lines.iter().collect::<BalanceAggregator>().finish();
        let totals = BalanceTotals::of(&balances);

        let debit: Decimal = lines.iter().map(|l| l.debit).sum();
        let credit: Decimal = lines.iter().map(|l| l.credit).sum();
        prop_assert_eq!(totals.total_debit, debit);
        prop_assert_eq!(totals.total_credit, credit);
    }

    /// Every balance equals its debit total minus its credit total.
    #[test]
    fn prop_balance_is_debit_minus_credit(lines in prop::collection::vec(ledger_line(), 1..40)) {
        for balance in lines.iter().collect::<BalanceAggregator>().finish() {
            prop_assert_eq!(balance.balance, balance.debit_total - balance.credit_total);
        }
    }

    /// Output is strictly ordered by account number with no duplicates.
    #[test]
    fn prop_output_sorted_and_unique(lines in prop::collection::vec(ledger_line(), 0..40)) {
        let balances = lines.iter().collect::<BalanceAggregator>().finish();
        for pair in balances.windows(2) {
            prop_assert!(pair[0].account_number < pair[1].account_number);
        }
    }

    /// Aggregation does not depend on line order.
    #[test]
    fn prop_order_independent(lines in prop::collection::vec(ledger_line(), 0..40)) {
        let forward = lines.iter().collect::<BalanceAggregator>().finish();
        let backward = lines.iter().rev().collect::<BalanceAggregator>().finish();
        prop_assert_eq!(forward, backward);
    }
}
