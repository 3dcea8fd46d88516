//! `SeaORM` Entity for accounting_periods table.

use closebook_core::period::AccountingPeriod;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounting_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_closed: bool,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_entries::Entity")]
    JournalEntries,
    #[sea_orm(has_many = "super::period_audit_events::Entity")]
    PeriodAuditEvents,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::period_audit_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodAuditEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AccountingPeriod {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            is_closed: model.is_closed,
            closed_at: model.closed_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
