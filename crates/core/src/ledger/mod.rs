//! Ledger read model used by period closing.
//!
//! The general ledger itself (entry capture, posting, lettering) lives outside
//! this workspace. This module holds the shapes the closing engine reads and
//! writes:
//! - Journal entries and their lines
//! - Account classification by chart-of-accounts number
//! - Per-account balance aggregation

pub mod account;
pub mod balance;
pub mod types;

#[cfg(test)]
mod balance_props;

pub use account::{AccountClass, ThirdPartyKind};
pub use balance::{AccountBalance, BalanceAggregator, BalanceTotals};
pub use types::{EntryTag, JournalEntry, LedgerActivity, LedgerLine, NewJournalEntry, PostingStatus};
