//! `SeaORM` Entity for period_audit_events table.

use closebook_core::closing::PeriodAuditEvent;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PeriodAuditAction;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "period_audit_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub period_id: Uuid,
    pub action: PeriodAuditAction,
    pub reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounting_periods::Entity",
        from = "Column::PeriodId",
        to = "super::accounting_periods::Column::Id"
    )]
    AccountingPeriods,
}

impl Related<super::accounting_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountingPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PeriodAuditEvent {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            period_id: model.period_id.into(),
            action: model.action.into(),
            reason: model.reason,
            created_at: model.created_at.into(),
        }
    }
}
