//! Entity re-exports.

pub use super::accounting_periods::Entity as AccountingPeriods;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_entry_lines::Entity as JournalEntryLines;
pub use super::period_audit_events::Entity as PeriodAuditEvents;
