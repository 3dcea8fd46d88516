//! Accounting period repository.

use chrono::{DateTime, NaiveDate, Utc};
use closebook_core::closing::PeriodAuditEvent;
use closebook_core::period::AccountingPeriod;
use closebook_shared::types::{AccountingPeriodId, CompanyId};
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::audit;
use crate::entities::accounting_periods;

/// Read access to the period registry.
///
/// Writes go through a closing transaction so they share its locks.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Periods of a company, latest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_periods(&self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, DbErr> {
        list_periods(&self.db, company_id).await
    }

    /// Finds a period of a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<Option<AccountingPeriod>, DbErr> {
        find_period(&self.db, company_id, period_id).await
    }

    /// Audit trail of a period, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn audit_events(
        &self,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<PeriodAuditEvent>, DbErr> {
        audit::list_for_period(&self.db, period_id).await
    }
}

pub(crate) async fn list_periods<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
) -> Result<Vec<AccountingPeriod>, DbErr> {
    let periods = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .order_by_desc(accounting_periods::Column::StartDate)
        .all(conn)
        .await?;

    Ok(periods.into_iter().map(AccountingPeriod::from).collect())
}

pub(crate) async fn find_period<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    period_id: AccountingPeriodId,
) -> Result<Option<AccountingPeriod>, DbErr> {
    let period = accounting_periods::Entity::find_by_id(period_id.into_inner())
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .one(conn)
        .await?;

    Ok(period.map(AccountingPeriod::from))
}

pub(crate) async fn find_overlapping<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Option<AccountingPeriod>, DbErr> {
    let period = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .filter(accounting_periods::Column::StartDate.lte(end_date))
        .filter(accounting_periods::Column::EndDate.gte(start_date))
        .order_by_asc(accounting_periods::Column::StartDate)
        .one(conn)
        .await?;

    Ok(period.map(AccountingPeriod::from))
}

pub(crate) async fn insert_period<C: ConnectionTrait>(
    conn: &C,
    period: &AccountingPeriod,
) -> Result<(), DbErr> {
    accounting_periods::ActiveModel {
        id: Set(period.id.into_inner()),
        company_id: Set(period.company_id.into_inner()),
        name: Set(period.name.clone()),
        start_date: Set(period.start_date),
        end_date: Set(period.end_date),
        is_closed: Set(period.is_closed),
        closed_at: Set(period.closed_at.map(Into::into)),
        created_at: Set(period.created_at.into()),
        updated_at: Set(period.updated_at.into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// `SELECT ... FOR UPDATE NOWAIT` on one period.
pub(crate) async fn lock_period<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    period_id: AccountingPeriodId,
) -> Result<Option<AccountingPeriod>, DbErr> {
    let period = accounting_periods::Entity::find_by_id(period_id.into_inner())
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .lock_with_behavior(LockType::Update, LockBehavior::Nowait)
        .one(conn)
        .await?;

    Ok(period.map(AccountingPeriod::from))
}

/// `SELECT ... FOR SHARE NOWAIT` on every period starting after `after`.
///
/// Share locks let concurrent reopens of earlier periods proceed while any
/// close of a later period (which takes `FOR UPDATE`) fails fast.
pub(crate) async fn lock_periods_after<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    after: NaiveDate,
) -> Result<Vec<AccountingPeriod>, DbErr> {
    let periods = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .filter(accounting_periods::Column::StartDate.gt(after))
        .order_by_asc(accounting_periods::Column::StartDate)
        .lock_with_behavior(LockType::Share, LockBehavior::Nowait)
        .all(conn)
        .await?;

    Ok(periods.into_iter().map(AccountingPeriod::from).collect())
}

pub(crate) async fn successor_period<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    after: NaiveDate,
) -> Result<Option<AccountingPeriod>, DbErr> {
    let period = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .filter(accounting_periods::Column::StartDate.gt(after))
        .order_by_asc(accounting_periods::Column::StartDate)
        .one(conn)
        .await?;

    Ok(period.map(AccountingPeriod::from))
}

pub(crate) async fn set_closed<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    period_id: AccountingPeriodId,
    closed_at: Option<DateTime<Utc>>,
) -> Result<Option<AccountingPeriod>, DbErr> {
    let Some(period) = accounting_periods::Entity::find_by_id(period_id.into_inner())
        .filter(accounting_periods::Column::CompanyId.eq(company_id.into_inner()))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let mut active: accounting_periods::ActiveModel = period.into();
    active.is_closed = Set(closed_at.is_some());
    active.closed_at = Set(closed_at.map(Into::into));
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(conn).await?;
    Ok(Some(updated.into()))
}
