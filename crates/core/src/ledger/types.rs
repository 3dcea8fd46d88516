//! Journal entry types.

use chrono::{DateTime, NaiveDate, Utc};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::ThirdPartyKind;

/// Posting status of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    /// Entry is being edited, not yet part of the books.
    Draft,
    /// Entry is posted.
    Posted,
    /// Entry is posted and reviewed.
    Validated,
    /// Entry was posted by an import.
    Imported,
}

impl PostingStatus {
    /// Statuses whose lines count toward balances.
    pub const POSTED: [Self; 3] = [Self::Posted, Self::Validated, Self::Imported];

    /// Returns true if lines of this status count toward balances.
    #[must_use]
    pub const fn is_posted(self) -> bool {
        !matches!(self, Self::Draft)
    }
}

/// Marks journal entries produced by period closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    /// Ordinary bookkeeping entry.
    Regular,
    /// Zeroes revenue and expense accounts at period end.
    Closing,
    /// Carries balance-sheet balances into the next period.
    Opening,
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Account number (e.g., "706000").
    pub account_number: String,
    /// Account label, if known.
    pub account_name: Option<String>,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Lettering code matching this line with its settlement.
    pub lettering: Option<String>,
}

impl LedgerLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            account_name: None,
            debit: amount,
            credit: Decimal::ZERO,
            lettering: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            account_name: None,
            debit: Decimal::ZERO,
            credit: amount,
            lettering: None,
        }
    }

    /// Sets the account label.
    #[must_use]
    pub fn named(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }

    /// Sets the lettering code.
    #[must_use]
    pub fn lettered(mut self, code: impl Into<String>) -> Self {
        self.lettering = Some(code.into());
        self
    }

    /// Strips surrounding whitespace from the account number.
    ///
    /// Stores apply this on write so prefix matching sees canonical numbers.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let trimmed = self.account_number.trim();
        if trimmed.len() != self.account_number.len() {
            self.account_number = trimmed.to_string();
        }
        self
    }

    /// Returns true if the line carries a non-empty lettering code.
    #[must_use]
    pub fn is_lettered(&self) -> bool {
        self.lettering.as_deref().is_some_and(|code| !code.trim().is_empty())
    }

    /// Returns the third-party kind when the line needs lettering and has none.
    #[must_use]
    pub fn unlettered_third_party(&self) -> Option<ThirdPartyKind> {
        if self.is_lettered() {
            return None;
        }
        ThirdPartyKind::of(&self.account_number)
    }
}

/// A journal entry to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Owning company.
    pub company_id: CompanyId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Posting status.
    pub status: PostingStatus,
    /// Closing artifact marker.
    pub tag: EntryTag,
    /// Period whose closing produced this entry.
    pub source_period_id: Option<AccountingPeriodId>,
    /// Free-text description.
    pub description: String,
    /// Lines.
    pub lines: Vec<LedgerLine>,
}

impl NewJournalEntry {
    /// Creates a regular entry with the given status.
    #[must_use]
    pub fn regular(
        company_id: CompanyId,
        entry_date: NaiveDate,
        status: PostingStatus,
        description: impl Into<String>,
        lines: Vec<LedgerLine>,
    ) -> Self {
        Self {
            company_id,
            entry_date,
            status,
            tag: EntryTag::Regular,
            source_period_id: None,
            description: description.into(),
            lines,
        }
    }

    /// Sum of all debit amounts.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of all credit amounts.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}

/// A stored journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Posting status.
    pub status: PostingStatus,
    /// Closing artifact marker.
    pub tag: EntryTag,
    /// Period whose closing produced this entry.
    pub source_period_id: Option<AccountingPeriodId>,
    /// Free-text description.
    pub description: String,
    /// Lines.
    pub lines: Vec<LedgerLine>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Materializes a new entry with a fresh id.
    #[must_use]
    pub fn from_new(entry: NewJournalEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: JournalEntryId::new(),
            company_id: entry.company_id,
            entry_date: entry.entry_date,
            status: entry.status,
            tag: entry.tag,
            source_period_id: entry.source_period_id,
            description: entry.description,
            lines: entry.lines.into_iter().map(LedgerLine::normalized).collect(),
            created_at: now,
        }
    }

    /// Returns true if this entry is the given artifact of the given period.
    #[must_use]
    pub fn is_artifact_of(&self, period_id: AccountingPeriodId, tag: EntryTag) -> bool {
        self.tag == tag && self.source_period_id == Some(period_id)
    }
}

/// Entry and lettering counts over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerActivity {
    /// All entries in range, any status.
    pub total_entries: u64,
    /// Entries still in draft.
    pub draft_entries: u64,
    /// Entries counting toward balances.
    pub posted_entries: u64,
    /// Posted customer lines without lettering.
    pub unlettered_customer_lines: u64,
    /// Posted supplier lines without lettering.
    pub unlettered_supplier_lines: u64,
}

impl LedgerActivity {
    /// Accumulates one entry.
    ///
    /// Lettering is only tracked on regular entries: third-party balances
    /// carried by an opening entry are settled through the original lines.
    pub fn record(&mut self, entry: &JournalEntry) {
        self.total_entries += 1;
        if !entry.status.is_posted() {
            self.draft_entries += 1;
            return;
        }
        self.posted_entries += 1;
        if entry.tag != EntryTag::Regular {
            return;
        }
        for line in &entry.lines {
            match line.unlettered_third_party() {
                Some(ThirdPartyKind::Customer) => self.unlettered_customer_lines += 1,
                Some(ThirdPartyKind::Supplier) => self.unlettered_supplier_lines += 1,
                None => {}
            }
        }
    }

    /// Unlettered third-party lines of both kinds.
    #[must_use]
    pub const fn unlettered_lines(&self) -> u64 {
        self.unlettered_customer_lines + self.unlettered_supplier_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(status: PostingStatus, lines: Vec<LedgerLine>) -> JournalEntry {
        JournalEntry::from_new(
            NewJournalEntry::regular(
                CompanyId::new(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                status,
                "test",
                lines,
            ),
            Utc::now(),
        )
    }

    #[test]
    fn test_is_balanced() {
        let balanced = NewJournalEntry::regular(
            CompanyId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            PostingStatus::Posted,
            "sale",
            vec![
                LedgerLine::debit("411000", dec!(120)),
                LedgerLine::credit("706000", dec!(100)),
                LedgerLine::credit("445710", dec!(20)),
            ],
        );
        assert!(balanced.is_balanced());
        assert_eq!(balanced.total_debit(), dec!(120));
    }

    #[test]
    fn test_blank_lettering_counts_as_unlettered() {
        let line = LedgerLine::debit("411000", dec!(10)).lettered("  ");
        assert!(!line.is_lettered());
        assert_eq!(line.unlettered_third_party(), Some(ThirdPartyKind::Customer));
        assert_eq!(
            LedgerLine::debit("411000", dec!(10)).lettered("AA").unlettered_third_party(),
            None
        );
    }

    #[test]
    fn test_activity_counts_drafts_without_lettering() {
        let mut activity = LedgerActivity::default();
        activity.record(&entry(
            PostingStatus::Posted,
            vec![
                LedgerLine::debit("411000", dec!(50)),
                LedgerLine::credit("401000", dec!(50)),
            ],
        ));
        activity.record(&entry(
            PostingStatus::Draft,
            vec![LedgerLine::debit("411000", dec!(50))],
        ));
        activity.record(&entry(
            PostingStatus::Imported,
            vec![LedgerLine::credit("401000", dec!(5)).lettered("B")],
        ));

        assert_eq!(activity.total_entries, 3);
        assert_eq!(activity.draft_entries, 1);
        assert_eq!(activity.posted_entries, 2);
        assert_eq!(activity.unlettered_customer_lines, 1);
        assert_eq!(activity.unlettered_supplier_lines, 1);
        assert_eq!(activity.unlettered_lines(), 2);
    }

    #[test]
    fn test_activity_ignores_lettering_on_opening_entries() {
        let mut opening = entry(
            PostingStatus::Posted,
            vec![
                LedgerLine::debit("411000", dec!(50)),
                LedgerLine::credit("401000", dec!(50)),
            ],
        );
        opening.tag = EntryTag::Opening;

        let mut activity = LedgerActivity::default();
        activity.record(&opening);

        assert_eq!(activity.posted_entries, 1);
        assert_eq!(activity.unlettered_lines(), 0);
    }

    #[test]
    fn test_stored_lines_have_trimmed_account_numbers() {
        let stored = entry(
            PostingStatus::Posted,
            vec![LedgerLine::debit(" 411000 ", dec!(10))],
        );
        assert_eq!(stored.lines[0].account_number, "411000");
        assert_eq!(
            stored.lines[0].unlettered_third_party(),
            Some(ThirdPartyKind::Customer)
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PostingStatus::Validated).unwrap(),
            "\"validated\""
        );
        assert_eq!(serde_json::to_string(&EntryTag::Opening).unwrap(), "\"opening\"");
    }
}
