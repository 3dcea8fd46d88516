//! In-memory closing store for tests, local demos, and embedding.
//!
//! A transaction reads from a snapshot taken at `begin` and records its
//! writes. On commit the writes are replayed onto the current state, unless
//! something the transaction depended on changed since the snapshot:
//! - a period it locked, or the entries sourced from that period
//! - posted entries of its company dated within a range it read
//! - the successor or later periods it looked up
//!
//! Writes elsewhere in the store, including other companies, never conflict.
//! Period locks are per-period async mutexes taken with `try_lock`, so a
//! second writer on the same period fails fast.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::ClosingError;
use super::store::{ClosingStore, ClosingTransaction, LedgerReader};
use super::types::PeriodAuditEvent;
use crate::ledger::{
    AccountBalance, BalanceAggregator, EntryTag, JournalEntry, LedgerActivity, NewJournalEntry,
    PostingStatus,
};
use crate::period::{AccountingPeriod, date_ranges_overlap, later_periods, successor_of};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    /// Sequence number of the last commit.
    seq: u64,
    periods: BTreeMap<AccountingPeriodId, AccountingPeriod>,
    entries: Vec<JournalEntry>,
    audit_log: Vec<PeriodAuditEvent>,
    /// Last commit that changed a period or an entry sourced from it.
    period_changes: HashMap<AccountingPeriodId, u64>,
    /// Last commit that changed an entry of a company, by entry date.
    entry_changes: HashMap<CompanyId, BTreeMap<NaiveDate, u64>>,
}

impl LedgerState {
    fn company_periods(&self, company_id: CompanyId) -> impl Iterator<Item = &AccountingPeriod> {
        self.periods
            .values()
            .filter(move |p| p.company_id == company_id)
    }

    fn list_periods(&self, company_id: CompanyId) -> Vec<AccountingPeriod> {
        let mut periods: Vec<_> = self.company_periods(company_id).cloned().collect();
        periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        periods
    }

    fn find_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Option<&AccountingPeriod> {
        self.periods
            .get(&period_id)
            .filter(|p| p.company_id == company_id)
    }

    fn entries_in_range(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| {
            e.company_id == company_id && e.entry_date >= start_date && e.entry_date <= end_date
        })
    }

    fn account_balances(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<AccountBalance> {
        self.entries_in_range(company_id, start_date, end_date)
            .filter(|e| e.status.is_posted())
            .flat_map(|e| e.lines.iter())
            .collect::<BalanceAggregator>()
            .finish()
    }

    fn ledger_activity(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerActivity {
        let mut activity = LedgerActivity::default();
        for entry in self.entries_in_range(company_id, start_date, end_date) {
            activity.record(entry);
        }
        activity
    }

    fn count_artifacts(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> u64 {
        let count = self
            .entries
            .iter()
            .filter(|e| e.company_id == company_id && e.is_artifact_of(period_id, tag))
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    fn overlapping(&self, period: &AccountingPeriod) -> Option<&AccountingPeriod> {
        self.company_periods(period.company_id).find(|p| {
            p.id != period.id
                && date_ranges_overlap(p.start_date, p.end_date, period.start_date, period.end_date)
        })
    }

    // ------------------------------------------------------------------------
    // Change tracking
    // ------------------------------------------------------------------------

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn touch_entry(&mut self, entry: &JournalEntry, seq: u64) {
        self.entry_changes
            .entry(entry.company_id)
            .or_default()
            .insert(entry.entry_date, seq);
        if let Some(source) = entry.source_period_id {
            self.period_changes.insert(source, seq);
        }
    }

    fn period_changed_since(&self, period_id: AccountingPeriodId, base: u64) -> bool {
        self.period_changes
            .get(&period_id)
            .is_some_and(|&seq| seq > base)
    }

    fn entries_changed_since(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        base: u64,
    ) -> bool {
        self.entry_changes.get(&company_id).is_some_and(|dates| {
            dates
                .range(start_date..=end_date)
                .any(|(_, &seq)| seq > base)
        })
    }

    /// Rejects new periods overlapping committed ones or each other.
    fn check_new_periods(&self, writes: &[PendingWrite]) -> Result<(), ClosingError> {
        let mut accepted: Vec<&AccountingPeriod> = Vec::new();
        for write in writes {
            let PendingWrite::InsertPeriod(period) = write else {
                continue;
            };
            let clash = self.overlapping(period).or_else(|| {
                accepted.iter().copied().find(|p| {
                    p.company_id == period.company_id
                        && date_ranges_overlap(
                            p.start_date,
                            p.end_date,
                            period.start_date,
                            period.end_date,
                        )
                })
            });
            if let Some(existing) = clash {
                return Err(ClosingError::OverlappingPeriod {
                    existing: existing.name.clone(),
                });
            }
            accepted.push(period);
        }
        Ok(())
    }

    fn apply(&mut self, writes: Vec<PendingWrite>) {
        if writes.is_empty() {
            return;
        }
        let seq = self.next_seq();
        for write in writes {
            match write {
                PendingWrite::InsertPeriod(period) | PendingWrite::UpdatePeriod(period) => {
                    self.period_changes.insert(period.id, seq);
                    self.periods.insert(period.id, period);
                }
                PendingWrite::InsertEntry(entry) => {
                    self.touch_entry(&entry, seq);
                    self.entries.push(entry);
                }
                PendingWrite::DeleteEntries(removed) => {
                    for entry in &removed {
                        self.touch_entry(entry, seq);
                    }
                    let ids: HashSet<JournalEntryId> = removed.iter().map(|e| e.id).collect();
                    self.entries.retain(|e| !ids.contains(&e.id));
                }
                PendingWrite::Audit(event) => self.audit_log.push(event),
            }
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<LedgerState>,
    locks: DashMap<AccountingPeriodId, Arc<Mutex<()>>>,
}

impl Shared {
    fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, ClosingError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> Result<T, ClosingError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        Ok(f(&mut state))
    }

    fn period_lock(&self, period_id: AccountingPeriodId) -> Arc<Mutex<()>> {
        self.locks.entry(period_id).or_default().clone()
    }
}

fn poisoned() -> ClosingError {
    ClosingError::Storage("in-memory ledger lock poisoned".into())
}

/// In-memory implementation of [`ClosingStore`].
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryClosingStore {
    shared: Arc<Shared>,
}

impl MemoryClosingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a journal entry as the general ledger would.
    pub fn record_entry(&self, entry: NewJournalEntry) -> Result<JournalEntryId, ClosingError> {
        let entry = JournalEntry::from_new(entry, Utc::now());
        let id = entry.id;
        self.shared.write(|state| {
            let seq = state.next_seq();
            state.touch_entry(&entry, seq);
            state.entries.push(entry);
        })?;
        Ok(id)
    }

    /// Changes the posting status of an entry. Returns false if unknown.
    pub fn set_entry_status(
        &self,
        entry_id: JournalEntryId,
        status: PostingStatus,
    ) -> Result<bool, ClosingError> {
        self.shared.write(|state| {
            let Some(index) = state.entries.iter().position(|e| e.id == entry_id) else {
                return false;
            };
            state.entries[index].status = status;
            let changed = state.entries[index].clone();
            let seq = state.next_seq();
            state.touch_entry(&changed, seq);
            true
        })
    }

    /// Entries of a company carrying `tag`, in insertion order.
    pub fn entries_tagged(
        &self,
        company_id: CompanyId,
        tag: EntryTag,
    ) -> Result<Vec<JournalEntry>, ClosingError> {
        self.shared.read(|state| {
            state
                .entries
                .iter()
                .filter(|e| e.company_id == company_id && e.tag == tag)
                .cloned()
                .collect()
        })
    }

    /// Audit events recorded for a period, oldest first.
    pub fn audit_events(
        &self,
        period_id: AccountingPeriodId,
    ) -> Result<Vec<PeriodAuditEvent>, ClosingError> {
        self.shared.read(|state| {
            state
                .audit_log
                .iter()
                .filter(|e| e.period_id == period_id)
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl LedgerReader for MemoryClosingStore {
    async fn list_periods(&self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError> {
        self.shared.read(|state| state.list_periods(company_id))
    }

    async fn find_period(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<Option<AccountingPeriod>, ClosingError> {
        self.shared
            .read(|state| state.find_period(company_id, period_id).cloned())
    }

    async fn account_balances(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError> {
        self.shared
            .read(|state| state.account_balances(company_id, start_date, end_date))
    }

    async fn ledger_activity(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError> {
        self.shared
            .read(|state| state.ledger_activity(company_id, start_date, end_date))
    }

    async fn count_artifacts(
        &self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError> {
        self.shared
            .read(|state| state.count_artifacts(company_id, period_id, tag))
    }
}

#[async_trait]
impl ClosingStore for MemoryClosingStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, ClosingError> {
        let working = self.shared.read(LedgerState::clone)?;
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            base: working.seq,
            working,
            guards: HashMap::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        })
    }
}

/// A lookup whose answer must still hold at commit.
#[derive(Debug)]
enum Dependency {
    Entries {
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Successor {
        company_id: CompanyId,
        after: NaiveDate,
        found: Option<(AccountingPeriodId, bool)>,
    },
    Later {
        company_id: CompanyId,
        after: NaiveDate,
        found: Vec<AccountingPeriodId>,
    },
}

impl Dependency {
    fn is_stale(&self, state: &LedgerState, base: u64) -> bool {
        match self {
            Self::Entries {
                company_id,
                start_date,
                end_date,
            } => state.entries_changed_since(*company_id, *start_date, *end_date, base),
            Self::Successor {
                company_id,
                after,
                found,
            } => {
                successor_of(state.company_periods(*company_id), *after).map(|p| (p.id, p.is_closed))
                    != *found
            }
            Self::Later {
                company_id,
                after,
                found,
            } => {
                let now: Vec<_> = later_periods(state.company_periods(*company_id), *after)
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
                now != *found
            }
        }
    }
}

#[derive(Debug)]
enum PendingWrite {
    InsertPeriod(AccountingPeriod),
    UpdatePeriod(AccountingPeriod),
    InsertEntry(JournalEntry),
    DeleteEntries(Vec<JournalEntry>),
    Audit(PeriodAuditEvent),
}

/// Snapshot transaction over a [`MemoryClosingStore`].
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    base: u64,
    working: LedgerState,
    guards: HashMap<AccountingPeriodId, OwnedMutexGuard<()>>,
    reads: Vec<Dependency>,
    writes: Vec<PendingWrite>,
}

impl MemoryTransaction {
    /// Takes the period lock. Fails if it is held elsewhere or if the period
    /// changed after this transaction's snapshot.
    fn acquire(&mut self, period_id: AccountingPeriodId) -> Result<(), ClosingError> {
        if self.guards.contains_key(&period_id) {
            return Ok(());
        }
        let guard = self
            .shared
            .period_lock(period_id)
            .try_lock_owned()
            .map_err(|_| ClosingError::Concurrency)?;
        let base = self.base;
        if self
            .shared
            .read(|state| state.period_changed_since(period_id, base))?
        {
            return Err(ClosingError::Concurrency);
        }
        self.guards.insert(period_id, guard);
        Ok(())
    }

    fn read_entries(&mut self, company_id: CompanyId, start_date: NaiveDate, end_date: NaiveDate) {
        self.reads.push(Dependency::Entries {
            company_id,
            start_date,
            end_date,
        });
    }
}

#[async_trait]
impl ClosingTransaction for MemoryTransaction {
    // Only a pre-check for `insert_period`, which is re-validated at commit.
    async fn list_periods(&mut self, company_id: CompanyId) -> Result<Vec<AccountingPeriod>, ClosingError> {
        Ok(self.working.list_periods(company_id))
    }

    async fn insert_period(&mut self, period: &AccountingPeriod) -> Result<(), ClosingError> {
        if let Some(existing) = self.working.overlapping(period) {
            return Err(ClosingError::OverlappingPeriod {
                existing: existing.name.clone(),
            });
        }
        self.working.periods.insert(period.id, period.clone());
        self.writes.push(PendingWrite::InsertPeriod(period.clone()));
        Ok(())
    }

    async fn lock_period(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
    ) -> Result<AccountingPeriod, ClosingError> {
        let period = self
            .working
            .find_period(company_id, period_id)
            .cloned()
            .ok_or(ClosingError::PeriodNotFound(period_id))?;
        self.acquire(period_id)?;
        Ok(period)
    }

    async fn lock_later_periods(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, ClosingError> {
        let later: Vec<AccountingPeriod> =
            later_periods(self.working.company_periods(company_id), after)
                .into_iter()
                .cloned()
                .collect();
        for period in &later {
            self.acquire(period.id)?;
        }
        self.reads.push(Dependency::Later {
            company_id,
            after,
            found: later.iter().map(|p| p.id).collect(),
        });
        Ok(later)
    }

    async fn successor_period(
        &mut self,
        company_id: CompanyId,
        after: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, ClosingError> {
        let successor = successor_of(self.working.company_periods(company_id), after).cloned();
        self.reads.push(Dependency::Successor {
            company_id,
            after,
            found: successor.as_ref().map(|p| (p.id, p.is_closed)),
        });
        Ok(successor)
    }

    async fn account_balances(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountBalance>, ClosingError> {
        self.read_entries(company_id, start_date, end_date);
        Ok(self
            .working
            .account_balances(company_id, start_date, end_date))
    }

    async fn ledger_activity(
        &mut self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<LedgerActivity, ClosingError> {
        self.read_entries(company_id, start_date, end_date);
        Ok(self
            .working
            .ledger_activity(company_id, start_date, end_date))
    }

    async fn insert_entry(&mut self, entry: &NewJournalEntry) -> Result<JournalEntryId, ClosingError> {
        let entry = JournalEntry::from_new(entry.clone(), Utc::now());
        let id = entry.id;
        self.working.entries.push(entry.clone());
        self.writes.push(PendingWrite::InsertEntry(entry));
        Ok(id)
    }

    async fn delete_artifacts(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        tag: EntryTag,
    ) -> Result<u64, ClosingError> {
        let (removed, kept): (Vec<JournalEntry>, Vec<JournalEntry>) =
            std::mem::take(&mut self.working.entries)
                .into_iter()
                .partition(|e| e.company_id == company_id && e.is_artifact_of(period_id, tag));
        self.working.entries = kept;

        let count = u64::try_from(removed.len()).unwrap_or(u64::MAX);
        if !removed.is_empty() {
            self.writes.push(PendingWrite::DeleteEntries(removed));
        }
        Ok(count)
    }

    async fn set_period_closed(
        &mut self,
        company_id: CompanyId,
        period_id: AccountingPeriodId,
        closed_at: Option<DateTime<Utc>>,
    ) -> Result<AccountingPeriod, ClosingError> {
        let period = self
            .working
            .periods
            .get_mut(&period_id)
            .filter(|p| p.company_id == company_id)
            .ok_or(ClosingError::PeriodNotFound(period_id))?;
        period.is_closed = closed_at.is_some();
        period.closed_at = closed_at;
        period.updated_at = Utc::now();

        let updated = period.clone();
        self.writes.push(PendingWrite::UpdatePeriod(updated.clone()));
        Ok(updated)
    }

    async fn append_audit(&mut self, event: &PeriodAuditEvent) -> Result<(), ClosingError> {
        self.working.audit_log.push(event.clone());
        self.writes.push(PendingWrite::Audit(event.clone()));
        Ok(())
    }

    async fn commit(self) -> Result<(), ClosingError> {
        let Self {
            shared,
            base,
            guards,
            reads,
            writes,
            ..
        } = self;

        {
            let mut state = shared.state.write().map_err(|_| poisoned())?;
            let stale = guards
                .keys()
                .any(|&period_id| state.period_changed_since(period_id, base))
                || reads.iter().any(|read| read.is_stale(&state, base));
            if stale {
                return Err(ClosingError::Concurrency);
            }
            state.check_new_periods(&writes)?;
            state.apply(writes);
        }

        drop(guards);
        Ok(())
    }
}
