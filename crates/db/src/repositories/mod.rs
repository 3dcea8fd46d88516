//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Query helpers are generic over [`sea_orm::ConnectionTrait`] so the closing
//! store runs the same statements on a pooled connection or inside a
//! transaction.

pub mod audit;
pub mod closing;
pub mod ledger;
pub mod period;

pub use closing::{PgClosingStore, PgClosingTransaction};
pub use ledger::LedgerRepository;
pub use period::PeriodRepository;

use closebook_core::closing::ClosingError;
use sea_orm::{DbErr, RuntimeErr};
use tracing::{error, warn};

/// `lock_not_available`: a `NOWAIT` lock was refused.
pub(crate) const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `serialization_failure`.
pub(crate) const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`.
pub(crate) const DEADLOCK_DETECTED: &str = "40P01";
/// `exclusion_violation`: raised by the period overlap constraint.
pub(crate) const EXCLUSION_VIOLATION: &str = "23P01";

/// Postgres SQLSTATE carried by a database error, if any.
pub(crate) fn sql_state(err: &DbErr) -> Option<String> {
    let (DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return None;
    };
    db_err.code().map(std::borrow::Cow::into_owned)
}

/// Maps a database error onto the closing error model.
///
/// Lock conflicts become the retryable `Concurrency`; everything else is
/// logged in full and surfaced as `Storage`.
pub(crate) fn closing_error(err: DbErr) -> ClosingError {
    match sql_state(&err).as_deref() {
        Some(LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
            warn!(error = %err, "Closing lock conflict");
            ClosingError::Concurrency
        }
        _ => {
            error!(error = %err, "Closing store failure");
            ClosingError::Storage(err.to_string())
        }
    }
}
