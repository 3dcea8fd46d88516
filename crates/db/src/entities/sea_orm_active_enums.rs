//! `SeaORM` active enums mapped to Postgres enum types.

use closebook_core::closing::AuditAction;
use closebook_core::ledger::{EntryTag, PostingStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_entry_status")]
pub enum JournalEntryStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "imported")]
    Imported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_entry_tag")]
pub enum JournalEntryTag {
    #[sea_orm(string_value = "regular")]
    Regular,
    #[sea_orm(string_value = "closing")]
    Closing,
    #[sea_orm(string_value = "opening")]
    Opening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_audit_action")]
pub enum PeriodAuditAction {
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "reopened")]
    Reopened,
    #[sea_orm(string_value = "opening_regenerated")]
    OpeningRegenerated,
}

impl From<PostingStatus> for JournalEntryStatus {
    fn from(status: PostingStatus) -> Self {
        match status {
            PostingStatus::Draft => Self::Draft,
            PostingStatus::Posted => Self::Posted,
            PostingStatus::Validated => Self::Validated,
            PostingStatus::Imported => Self::Imported,
        }
    }
}

impl From<JournalEntryStatus> for PostingStatus {
    fn from(status: JournalEntryStatus) -> Self {
        match status {
            JournalEntryStatus::Draft => Self::Draft,
            JournalEntryStatus::Posted => Self::Posted,
            JournalEntryStatus::Validated => Self::Validated,
            JournalEntryStatus::Imported => Self::Imported,
        }
    }
}

impl From<EntryTag> for JournalEntryTag {
    fn from(tag: EntryTag) -> Self {
        match tag {
            EntryTag::Regular => Self::Regular,
            EntryTag::Closing => Self::Closing,
            EntryTag::Opening => Self::Opening,
        }
    }
}

impl From<JournalEntryTag> for EntryTag {
    fn from(tag: JournalEntryTag) -> Self {
        match tag {
            JournalEntryTag::Regular => Self::Regular,
            JournalEntryTag::Closing => Self::Closing,
            JournalEntryTag::Opening => Self::Opening,
        }
    }
}

impl From<AuditAction> for PeriodAuditAction {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Closed => Self::Closed,
            AuditAction::Reopened => Self::Reopened,
            AuditAction::OpeningRegenerated => Self::OpeningRegenerated,
        }
    }
}

impl From<PeriodAuditAction> for AuditAction {
    fn from(action: PeriodAuditAction) -> Self {
        match action {
            PeriodAuditAction::Closed => Self::Closed,
            PeriodAuditAction::Reopened => Self::Reopened,
            PeriodAuditAction::OpeningRegenerated => Self::OpeningRegenerated,
        }
    }
}

/// Statuses whose lines count toward balances.
#[must_use]
pub fn posted_statuses() -> [JournalEntryStatus; 3] {
    PostingStatus::POSTED.map(JournalEntryStatus::from)
}
