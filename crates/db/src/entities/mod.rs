//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounting_periods;
pub mod journal_entries;
pub mod journal_entry_lines;
pub mod period_audit_events;
pub mod sea_orm_active_enums;
