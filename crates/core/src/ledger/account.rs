//! Account classification.
//!
//! Accounts follow the French chart of accounts: the first digit of the
//! account number is its class.

use serde::{Deserialize, Serialize};

/// Chart-of-accounts class derived from the first digit of an account number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClass {
    /// Class 1: equity, provisions, borrowings.
    Capital,
    /// Class 2: fixed assets.
    FixedAssets,
    /// Class 3: inventory and work in progress.
    Inventory,
    /// Class 4: third parties (customers, suppliers, tax, staff).
    ThirdParties,
    /// Class 5: financial accounts (bank, cash).
    Financial,
    /// Class 6: expenses (charges).
    Expense,
    /// Class 7: revenue (produits).
    Revenue,
    /// Anything else (classes 8 and 9, non-numeric codes).
    OffBalance,
}

impl AccountClass {
    /// Classifies an account number by its first character, as a database
    /// prefix match would. Numbers are expected trimmed.
    #[must_use]
    pub fn of(account_number: &str) -> Self {
        match account_number.chars().next() {
            Some('1') => Self::Capital,
            Some('2') => Self::FixedAssets,
            Some('3') => Self::Inventory,
            Some('4') => Self::ThirdParties,
            Some('5') => Self::Financial,
            Some('6') => Self::Expense,
            Some('7') => Self::Revenue,
            _ => Self::OffBalance,
        }
    }

    /// Classes 1 to 5, carried forward into the next period.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(
            self,
            Self::Capital | Self::FixedAssets | Self::Inventory | Self::ThirdParties | Self::Financial
        )
    }

    /// Classes 6 and 7, zeroed by the closing entry.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        matches!(self, Self::Expense | Self::Revenue)
    }
}

/// Third-party account kinds subject to lettering checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThirdPartyKind {
    /// Customer accounts (prefix `41`).
    Customer,
    /// Supplier accounts (prefix `40`).
    Supplier,
}

impl ThirdPartyKind {
    /// Account number prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Customer => "41",
            Self::Supplier => "40",
        }
    }

    /// Detects customer or supplier accounts.
    #[must_use]
    pub fn of(account_number: &str) -> Option<Self> {
        [Self::Customer, Self::Supplier]
            .into_iter()
            .find(|kind| account_number.starts_with(kind.prefix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("101300", AccountClass::Capital)]
    #[case("120", AccountClass::Capital)]
    #[case("218300", AccountClass::FixedAssets)]
    #[case("370000", AccountClass::Inventory)]
    #[case("411000", AccountClass::ThirdParties)]
    #[case("512000", AccountClass::Financial)]
    #[case("606100", AccountClass::Expense)]
    #[case("706000", AccountClass::Revenue)]
    #[case("801000", AccountClass::OffBalance)]
    #[case("9", AccountClass::OffBalance)]
    #[case("", AccountClass::OffBalance)]
    #[case("CLIENT", AccountClass::OffBalance)]
    #[case(" 411000", AccountClass::OffBalance)]
    fn test_account_class_of(#[case] number: &str, #[case] expected: AccountClass) {
        assert_eq!(AccountClass::of(number), expected);
    }

    #[test]
    fn test_balance_sheet_and_income_statement_are_disjoint() {
        for number in ["1", "2", "3", "4", "5", "6", "7", "8"] {
            let class = AccountClass::of(number);
            assert!(!(class.is_balance_sheet() && class.is_income_statement()));
        }
        assert!(AccountClass::of("5").is_balance_sheet());
        assert!(AccountClass::of("6").is_income_statement());
        assert!(!AccountClass::of("8").is_balance_sheet());
    }

    #[rstest]
    #[case("411000", Some(ThirdPartyKind::Customer))]
    #[case("401000", Some(ThirdPartyKind::Supplier))]
    #[case("404100", Some(ThirdPartyKind::Supplier))]
    #[case("421000", None)]
    #[case(" 411000", None)]
    #[case("512000", None)]
    fn test_third_party_kind(#[case] number: &str, #[case] expected: Option<ThirdPartyKind>) {
        assert_eq!(ThirdPartyKind::of(number), expected);
    }
}
