//! Period audit log.

use closebook_core::closing::PeriodAuditEvent;
use closebook_shared::types::AccountingPeriodId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::period_audit_events;

pub(crate) async fn append<C: ConnectionTrait>(
    conn: &C,
    event: &PeriodAuditEvent,
) -> Result<(), DbErr> {
    period_audit_events::ActiveModel {
        id: Set(event.id.into_inner()),
        company_id: Set(event.company_id.into_inner()),
        period_id: Set(event.period_id.into_inner()),
        action: Set(event.action.into()),
        reason: Set(event.reason.clone()),
        created_at: Set(event.created_at.into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

pub(crate) async fn list_for_period<C: ConnectionTrait>(
    conn: &C,
    period_id: AccountingPeriodId,
) -> Result<Vec<PeriodAuditEvent>, DbErr> {
    let events = period_audit_events::Entity::find()
        .filter(period_audit_events::Column::PeriodId.eq(period_id.into_inner()))
        .order_by_asc(period_audit_events::Column::CreatedAt)
        .order_by_asc(period_audit_events::Column::Id)
        .all(conn)
        .await?;

    Ok(events.into_iter().map(PeriodAuditEvent::from).collect())
}
