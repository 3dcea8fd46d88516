//! Period closing.
//!
//! This module implements the closing workflow:
//! - Closure readiness validation (drafts, ledger balance, lettering)
//! - Period result calculation (revenue minus expenses)
//! - Closing and opening entry planning
//! - Storage traits for transactional execution
//! - `ClosingService`, which runs close/reopen/regenerate atomically
//! - An in-memory store for tests and embedding

pub mod entries;
pub mod error;
pub mod memory;
pub mod result;
pub mod service;
pub mod store;
pub mod types;
pub mod validator;

#[cfg(test)]
mod entries_props;

pub use entries::EntryPlanner;
pub use error::ClosingError;
pub use memory::{MemoryClosingStore, MemoryTransaction};
pub use result::ResultCalculator;
pub use service::ClosingService;
pub use store::{ClosingStore, ClosingTransaction, LedgerReader};
pub use types::{
    AuditAction, BalanceCheck, ClosingPolicy, ClosureStatus, OpeningEntriesRegenerated,
    PeriodAuditEvent, PeriodClosed, PeriodReopened, PeriodResult, ResultType, ValidationReport,
};
pub use validator::ClosureValidator;
