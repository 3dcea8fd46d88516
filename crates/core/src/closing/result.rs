//! Period result calculation.

use rust_decimal::Decimal;

use super::types::PeriodResult;
use crate::ledger::{AccountBalance, AccountClass};

/// Stateless calculator for the income statement result.
pub struct ResultCalculator;

impl ResultCalculator {
    /// Computes revenue minus expenses over the given balances.
    ///
    /// Balance-sheet and off-balance accounts are ignored.
    #[must_use]
    pub fn calculate(balances: &[AccountBalance]) -> PeriodResult {
        let (total_charges, total_revenue) =
            balances
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(charges, revenue), b| {
                    match b.class() {
                        AccountClass::Expense => (charges + b.balance, revenue),
                        AccountClass::Revenue => (charges, revenue - b.balance),
                        _ => (charges, revenue),
                    }
                });

        let result = total_revenue - total_charges;
        PeriodResult {
            total_charges,
            total_revenue,
            result,
            is_profit: result >= Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closing::ResultType;
    use rust_decimal_macros::dec;

    fn balance(account: &str, debit: Decimal, credit: Decimal) -> AccountBalance {
        AccountBalance::from_totals(account, None, debit, credit)
    }

    #[test]
    fn test_profit() {
        let balances = vec![
            balance("512000", dec!(10000), dec!(6000)),
            balance("606000", dec!(6000), dec!(0)),
            balance("706000", dec!(0), dec!(10000)),
        ];

        let result = ResultCalculator::calculate(&balances);
        assert_eq!(result.total_charges, dec!(6000));
        assert_eq!(result.total_revenue, dec!(10000));
        assert_eq!(result.result, dec!(4000));
        assert!(result.is_profit);
        assert_eq!(result.result_type(), ResultType::Profit);
    }

    #[test]
    fn test_loss_amount_is_absolute() {
        let balances = vec![
            balance("641000", dec!(2500.75), dec!(0)),
            balance("706000", dec!(0), dec!(1000)),
        ];

        let result = ResultCalculator::calculate(&balances);
        assert_eq!(result.result, dec!(-1500.75));
        assert!(!result.is_profit);
        assert_eq!(result.result_type(), ResultType::Loss);
        assert_eq!(result.amount(), dec!(1500.75));
    }

    #[test]
    fn test_zero_result_is_profit() {
        let result = ResultCalculator::calculate(&[]);
        assert_eq!(result.result, Decimal::ZERO);
        assert!(result.is_profit);
    }

    #[test]
    fn test_refunds_reduce_revenue() {
        let balances = vec![balance("706000", dec!(300), dec!(1000))];
        let result = ResultCalculator::calculate(&balances);
        assert_eq!(result.total_revenue, dec!(700));
    }

    #[test]
    fn test_off_balance_accounts_ignored() {
        let balances = vec![
            balance("801000", dec!(999), dec!(0)),
            balance("401000", dec!(0), dec!(50)),
        ];
        let result = ResultCalculator::calculate(&balances);
        assert_eq!(result.result, Decimal::ZERO);
    }

    #[test]
    fn test_serializes_revenue_as_produits() {
        let json = serde_json::to_value(ResultCalculator::calculate(&[])).unwrap();
        assert!(json.get("total_produits").is_some());
        assert!(json.get("total_revenue").is_none());
    }
}
