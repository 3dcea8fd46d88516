//! Journal repository: balance aggregation, activity counts and the entries
//! written by period closing.

use chrono::{NaiveDate, Utc};
use closebook_core::ledger::{
    AccountBalance, EntryTag, LedgerActivity, LedgerLine, NewJournalEntry, PostingStatus,
    ThirdPartyKind,
};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    journal_entries, journal_entry_lines,
    sea_orm_active_enums::{JournalEntryStatus, JournalEntryTag, posted_statuses},
};

/// Access to the journal outside closing transactions.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a journal entry with its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record_entry(&self, entry: &NewJournalEntry) -> Result<JournalEntryId, DbErr> {
        let txn = self.db.begin().await?;
        let id = insert_entry(&txn, entry).await?;
        txn.commit().await?;
        Ok(id)
    }

    /// Changes the posting status of an entry. Returns false if unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_entry_status(
        &self,
        entry_id: JournalEntryId,
        status: PostingStatus,
    ) -> Result<bool, DbErr> {
        let Some(entry) = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };

        let mut active: journal_entries::ActiveModel = entry.into();
        active.status = Set(status.into());
        active.update(&self.db).await?;
        Ok(true)
    }

    /// Lines of an entry in their original order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entry_lines(&self, entry_id: JournalEntryId) -> Result<Vec<LedgerLine>, DbErr> {
        let lines = journal_entry_lines::Entity::find()
            .filter(journal_entry_lines::Column::EntryId.eq(entry_id.into_inner()))
            .order_by_asc(journal_entry_lines::Column::LineNumber)
            .all(&self.db)
            .await?;

        Ok(lines.into_iter().map(LedgerLine::from).collect())
    }

    /// IDs of the entries carrying `tag` sourced from `period_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn artifact_ids(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<Vec<JournalEntryId>, DbErr> {
        let entries = journal_entries::Entity::find()
            .filter(artifact_of(company_id, period_id, tag))
            .order_by_asc(journal_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(entries.into_iter().map(|e| e.id.into()).collect())
    }
}

/// Entries of a company dated within `[start_date, end_date]`.
fn entries_in_range(company_id: CompanyId, start_date: NaiveDate, end_date: NaiveDate) -> Condition {
    Condition::all()
        .add(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
        .add(journal_entries::Column::EntryDate.between(start_date, end_date))
}

fn artifact_of(company_id: CompanyId, period_id: AccountingPeriodId, tag: EntryTag) -> Condition {
    Condition::all()
        .add(journal_entries::Column::CompanyId.eq(company_id.into_inner()))
        .add(journal_entries::Column::SourcePeriodId.eq(period_id.into_inner()))
        .add(journal_entries::Column::Tag.eq(JournalEntryTag::from(tag)))
}

#[derive(Debug, FromQueryResult)]
struct BalanceRow {
    account_number: String,
    account_name: Option<String>,
    debit_total: Decimal,
    credit_total: Decimal,
}

/// Per-account totals of posted lines, aggregated in the database.
pub(crate) async fn account_balances<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<AccountBalance>, DbErr> {
    let rows = journal_entry_lines::Entity::find()
        .select_only()
        .column(journal_entry_lines::Column::AccountNumber)
        .column_as(journal_entry_lines::Column::AccountName.max(), "account_name")
        .column_as(journal_entry_lines::Column::Debit.sum(), "debit_total")
        .column_as(journal_entry_lines::Column::Credit.sum(), "credit_total")
        .inner_join(journal_entries::Entity)
        .filter(entries_in_range(company_id, start_date, end_date))
        .filter(journal_entries::Column::Status.is_in(posted_statuses()))
        .group_by(journal_entry_lines::Column::AccountNumber)
        .order_by_asc(journal_entry_lines::Column::AccountNumber)
        .into_model::<BalanceRow>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            AccountBalance::from_totals(
                row.account_number,
                row.account_name,
                row.debit_total,
                row.credit_total,
            )
        })
        .filter(|balance| !balance.is_inactive())
        .collect())
}

#[derive(Debug, FromQueryResult)]
struct StatusCount {
    status: JournalEntryStatus,
    entries: i64,
}

/// Entry counts by status and unlettered third-party lines over a range.
pub(crate) async fn ledger_activity<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LedgerActivity, DbErr> {
    let counts = journal_entries::Entity::find()
        .select_only()
        .column(journal_entries::Column::Status)
        .column_as(journal_entries::Column::Id.count(), "entries")
        .filter(entries_in_range(company_id, start_date, end_date))
        .group_by(journal_entries::Column::Status)
        .into_model::<StatusCount>()
        .all(conn)
        .await?;

    let mut activity = LedgerActivity::default();
    for count in counts {
        let entries = u64::try_from(count.entries).unwrap_or_default();
        activity.total_entries += entries;
        if PostingStatus::from(count.status).is_posted() {
            activity.posted_entries += entries;
        } else {
            activity.draft_entries += entries;
        }
    }

    activity.unlettered_customer_lines =
        count_unlettered(conn, company_id, start_date, end_date, ThirdPartyKind::Customer).await?;
    activity.unlettered_supplier_lines =
        count_unlettered(conn, company_id, start_date, end_date, ThirdPartyKind::Supplier).await?;

    Ok(activity)
}

/// Posted lines on `kind` accounts whose lettering is missing or blank.
async fn count_unlettered<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    kind: ThirdPartyKind,
) -> Result<u64, DbErr> {
    let blank_lettering = Expr::expr(
        Func::cust(Alias::new("btrim")).arg(Expr::col((
            journal_entry_lines::Entity,
            journal_entry_lines::Column::Lettering,
        ))),
    )
    .eq("");

    journal_entry_lines::Entity::find()
        .inner_join(journal_entries::Entity)
        .filter(entries_in_range(company_id, start_date, end_date))
        .filter(journal_entries::Column::Status.is_in(posted_statuses()))
        .filter(journal_entries::Column::Tag.eq(JournalEntryTag::Regular))
        .filter(journal_entry_lines::Column::AccountNumber.starts_with(kind.prefix()))
        .filter(
            Condition::any()
                .add(journal_entry_lines::Column::Lettering.is_null())
                .add(blank_lettering),
        )
        .count(conn)
        .await
}

pub(crate) async fn count_artifacts<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    period_id: AccountingPeriodId,
    tag: EntryTag,
) -> Result<u64, DbErr> {
    journal_entries::Entity::find()
        .filter(artifact_of(company_id, period_id, tag))
        .count(conn)
        .await
}

/// Inserts an entry and its lines. Run inside a transaction.
pub(crate) async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &NewJournalEntry,
) -> Result<JournalEntryId, DbErr> {
    let id = JournalEntryId::new();

    journal_entries::ActiveModel {
        id: Set(id.into_inner()),
        company_id: Set(entry.company_id.into_inner()),
        entry_date: Set(entry.entry_date),
        status: Set(entry.status.into()),
        tag: Set(entry.tag.into()),
        source_period_id: Set(entry.source_period_id.map(AccountingPeriodId::into_inner)),
        description: Set(entry.description.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    if entry.lines.is_empty() {
        return Ok(id);
    }

    let lines = entry
        .lines
        .iter()
        .zip(1..)
        .map(|(line, line_number)| journal_entry_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            entry_id: Set(id.into_inner()),
            line_number: Set(line_number),
            account_number: Set(line.account_number.trim().to_string()),
            account_name: Set(line.account_name.clone()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            lettering: Set(line.lettering.clone()),
        });

    journal_entry_lines::Entity::insert_many(lines)
        .exec_without_returning(conn)
        .await?;

    Ok(id)
}

/// Deletes the entries with `tag` sourced from `period_id`; lines cascade.
pub(crate) async fn delete_artifacts<C: ConnectionTrait>(
    conn: &C,
    company_id: CompanyId,
    period_id: AccountingPeriodId,
    tag: EntryTag,
) -> Result<u64, DbErr> {
    let result = journal_entries::Entity::delete_many()
        .filter(artifact_of(company_id, period_id, tag))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
