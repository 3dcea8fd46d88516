//! Account balance calculations.
//!
//! A balance is always `debit_total - credit_total`: positive for debit
//! balances, negative for credit balances.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountClass;
use super::types::LedgerLine;

/// Net position of one account over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account number.
    pub account_number: String,
    /// Account label, if any line carried one.
    pub account_name: Option<String>,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// `debit_total - credit_total`.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates an empty balance for an account.
    #[must_use]
    pub fn new(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            account_name: None,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Builds a balance from aggregated totals.
    #[must_use]
    pub fn from_totals(
        account_number: impl Into<String>,
        account_name: Option<String>,
        debit_total: Decimal,
        credit_total: Decimal,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            account_name,
            debit_total,
            credit_total,
            balance: debit_total - credit_total,
        }
    }

    /// Adds a debit amount.
    pub fn add_debit(&mut self, amount: Decimal) {
        self.debit_total += amount;
        self.balance = self.debit_total - self.credit_total;
    }

    /// Adds a credit amount.
    pub fn add_credit(&mut self, amount: Decimal) {
        self.credit_total += amount;
        self.balance = self.debit_total - self.credit_total;
    }

    /// Chart-of-accounts class of this account.
    #[must_use]
    pub fn class(&self) -> AccountClass {
        AccountClass::of(&self.account_number)
    }

    /// Returns true if the account saw no debit and no credit.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.debit_total.is_zero() && self.credit_total.is_zero()
    }
}

/// Folds ledger lines into per-account balances ordered by account number.
#[derive(Debug, Default)]
pub struct BalanceAggregator {
    accounts: BTreeMap<String, AccountBalance>,
}

impl BalanceAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one debit/credit movement on an account.
    pub fn add(&mut self, account_number: &str, account_name: Option<&str>, debit: Decimal, credit: Decimal) {
        let balance = self
            .accounts
            .entry(account_number.to_string())
            .or_insert_with(|| AccountBalance::new(account_number));
        if balance.account_name.is_none() {
            balance.account_name = account_name.map(str::to_string);
        }
        balance.add_debit(debit);
        balance.add_credit(credit);
    }

    /// Adds one ledger line.
    pub fn add_line(&mut self, line: &LedgerLine) {
        self.add(
            &line.account_number,
            line.account_name.as_deref(),
            line.debit,
            line.credit,
        );
    }

    /// Returns the balances, dropping accounts with neither debit nor credit.
    #[must_use]
    pub fn finish(self) -> Vec<AccountBalance> {
        self.accounts
            .into_values()
            .filter(|b| !b.is_inactive())
            .collect()
    }
}

impl<'a> Extend<&'a LedgerLine> for BalanceAggregator {
    fn extend<T: IntoIterator<Item = &'a LedgerLine>>(&mut self, lines: T) {
        for line in lines {
            self.add_line(line);
        }
    }
}

impl<'a> FromIterator<&'a LedgerLine> for BalanceAggregator {
    fn from_iter<T: IntoIterator<Item = &'a LedgerLine>>(lines: T) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(lines);
        aggregator
    }
}

/// Debit and credit totals over a set of balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Sum of debit totals.
    pub total_debit: Decimal,
    /// Sum of credit totals.
    pub total_credit: Decimal,
}

impl BalanceTotals {
    /// Sums the debit and credit totals of the given balances.
    #[must_use]
    pub fn of(balances: &[AccountBalance]) -> Self {
        balances.iter().fold(Self::default(), |acc, b| Self {
            total_debit: acc.total_debit + b.debit_total,
            total_credit: acc.total_credit + b.credit_total,
        })
    }

    /// Absolute gap between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_aggregator_orders_by_account_number() {
        let lines = [
            LedgerLine::credit("706000", dec!(100)),
            LedgerLine::debit("411000", dec!(100)),
            LedgerLine::debit("106100", dec!(5)),
        ];

        let numbers: Vec<_> = lines
            .iter()
            .collect::<BalanceAggregator>()
            .finish()
            .into_iter()
            .map(|b| b.account_number)
            .collect();
        assert_eq!(numbers, vec!["106100", "411000", "706000"]);
    }

    #[test]
    fn test_aggregator_sums_and_nets() {
        let lines = [
            LedgerLine::debit("512000", dec!(300)).named("Bank"),
            LedgerLine::credit("512000", dec!(120.50)),
            LedgerLine::debit("512000", dec!(20)),
        ];

        let balances = lines.iter().collect::<BalanceAggregator>().finish();
        assert_eq!(balances.len(), 1);
        let bank = &balances[0];
        assert_eq!(bank.account_name.as_deref(), Some("Bank"));
        assert_eq!(bank.debit_total, dec!(320));
        assert_eq!(bank.credit_total, dec!(120.50));
        assert_eq!(bank.balance, dec!(199.50));
    }

    #[test]
    fn test_aggregator_drops_inactive_accounts_but_keeps_settled_ones() {
        let lines = [
            LedgerLine::debit("401000", dec!(0)),
            LedgerLine::debit("411000", dec!(10)),
            LedgerLine::credit("411000", dec!(10)),
        ];

        let balances = lines.iter().collect::<BalanceAggregator>().finish();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].account_number, "411000");
        assert_eq!(balances[0].balance, Decimal::ZERO);
    }

    #[test]
    fn test_totals_difference() {
        let balances = vec![
            AccountBalance::from_totals("512000", None, dec!(100), dec!(0)),
            AccountBalance::from_totals("706000", None, dec!(0), dec!(99.99)),
        ];
        let totals = BalanceTotals::of(&balances);
        assert_eq!(totals.total_debit, dec!(100));
        assert_eq!(totals.total_credit, dec!(99.99));
        assert_eq!(totals.difference(), dec!(0.01));
    }
}
