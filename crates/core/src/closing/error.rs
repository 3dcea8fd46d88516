//! Closing error types.

use chrono::NaiveDate;
use closebook_shared::types::AccountingPeriodId;
use thiserror::Error;

/// Errors that can occur while registering, closing or reopening periods.
#[derive(Debug, Error)]
pub enum ClosingError {
    // ========== Registry Errors ==========
    /// Start date is after end date.
    #[error("Invalid date range: start date {start} is after end date {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Period name is blank.
    #[error("Period name cannot be empty")]
    EmptyName,

    /// Dates overlap another period of the same company.
    #[error("Period dates overlap existing period \"{existing}\"")]
    OverlappingPeriod {
        /// Name of the conflicting period.
        existing: String,
    },

    // ========== Closure Errors ==========
    /// Closure readiness checks failed.
    #[error("Period cannot be closed: {}", errors.join("; "))]
    ValidationFailed {
        /// Blocking problems.
        errors: Vec<String>,
        /// Non-blocking notices gathered by the same checks.
        warnings: Vec<String>,
    },

    /// Period is already closed.
    #[error("Period \"{0}\" is already closed")]
    AlreadyClosed(String),

    /// Period is open but the operation needs a closed one.
    #[error("Period \"{0}\" is not closed")]
    NotClosed(String),

    /// Reopening requires a reason.
    #[error("A reason is required to reopen a period")]
    EmptyReason,

    /// Later periods are closed and would be invalidated.
    #[error("Cannot reopen: later periods are closed ({})", periods.join(", "))]
    CascadeBlocked {
        /// Names of the closed later periods.
        periods: Vec<String>,
    },

    /// No period follows the closed one.
    #[error("No period follows \"{0}\"; create the next period first")]
    NoSuccessorPeriod(String),

    /// The following period is closed and cannot receive opening entries.
    #[error("Following period \"{0}\" is closed")]
    SuccessorClosed(String),

    // ========== Lookup Errors ==========
    /// Period not found for this company.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(AccountingPeriodId),

    // ========== Concurrency Errors ==========
    /// Another operation holds the period lock or committed first.
    #[error("Period is being modified by another operation, please retry")]
    Concurrency,

    // ========== Storage Errors ==========
    /// Storage or transport failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClosingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::EmptyName => "EMPTY_PERIOD_NAME",
            Self::OverlappingPeriod { .. } => "OVERLAPPING_PERIOD",
            Self::ValidationFailed { .. } => "CLOSURE_VALIDATION_FAILED",
            Self::AlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::NotClosed(_) => "PERIOD_NOT_CLOSED",
            Self::EmptyReason => "REOPEN_REASON_REQUIRED",
            Self::CascadeBlocked { .. } => "LATER_PERIODS_CLOSED",
            Self::NoSuccessorPeriod(_) => "NO_SUCCESSOR_PERIOD",
            Self::SuccessorClosed(_) => "SUCCESSOR_PERIOD_CLOSED",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::Concurrency => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InvalidDateRange { .. } | Self::EmptyName | Self::EmptyReason => 400,

            // 404 Not Found
            Self::PeriodNotFound(_) => 404,

            // 409 Conflict - state held by another period or operation
            Self::OverlappingPeriod { .. } | Self::CascadeBlocked { .. } | Self::Concurrency => {
                409
            }

            // 422 Unprocessable - period state forbids the operation
            Self::ValidationFailed { .. }
            | Self::AlreadyClosed(_)
            | Self::NotClosed(_)
            | Self::NoSuccessorPeriod(_)
            | Self::SuccessorClosed(_) => 422,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Concurrency)
    }

    /// Message safe to show callers; storage details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(_) => "An internal error occurred, please try again later".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ClosingError::EmptyName, 400, "EMPTY_PERIOD_NAME")]
    #[case(ClosingError::EmptyReason, 400, "REOPEN_REASON_REQUIRED")]
    #[case(ClosingError::PeriodNotFound(AccountingPeriodId::new()), 404, "PERIOD_NOT_FOUND")]
    #[case(ClosingError::Concurrency, 409, "CONCURRENT_MODIFICATION")]
    #[case(
        ClosingError::CascadeBlocked { periods: vec!["2025".into()] },
        409,
        "LATER_PERIODS_CLOSED"
    )]
    #[case(ClosingError::AlreadyClosed("2024".into()), 422, "PERIOD_ALREADY_CLOSED")]
    #[case(ClosingError::Storage("boom".into()), 500, "STORAGE_ERROR")]
    fn test_status_and_code(
        #[case] error: ClosingError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(error.http_status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_only_concurrency_is_retryable() {
        assert!(ClosingError::Concurrency.is_retryable());
        assert!(!ClosingError::EmptyReason.is_retryable());
        assert!(!ClosingError::Storage("x".into()).is_retryable());
    }

    #[test]
    fn test_public_message_hides_storage_detail() {
        let err = ClosingError::Storage("relation \"journal_entries\" does not exist".into());
        assert!(!err.public_message().contains("journal_entries"));

        let err = ClosingError::CascadeBlocked {
            periods: vec!["2025".into(), "2026".into()],
        };
        assert_eq!(
            err.public_message(),
            "Cannot reopen: later periods are closed (2025, 2026)"
        );
    }

    #[test]
    fn test_validation_failed_lists_errors() {
        let err = ClosingError::ValidationFailed {
            errors: vec!["a".into(), "b".into()],
            warnings: vec![],
        };
        assert_eq!(err.to_string(), "Period cannot be closed: a; b");
    }
}
