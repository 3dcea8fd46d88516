//! Closing errors as HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use closebook_core::closing::ClosingError;
use serde_json::json;
use tracing::{error, warn};

/// HTTP status for a closing error.
pub fn status_of(err: &ClosingError) -> StatusCode {
    StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Logs an error at the level its kind deserves.
pub fn log_error(err: &ClosingError, operation: &str) {
    match err {
        ClosingError::Storage(detail) => error!(error = %detail, operation, "Storage failure"),
        ClosingError::Concurrency | ClosingError::CascadeBlocked { .. } => {
            warn!(error = %err, operation, "Operation blocked");
        }
        _ => {}
    }
}

/// Builds the `{error, message}` body for a failed request.
///
/// Validation failures carry their `errors` and `warnings`, blocked reopens
/// the names of the blocking periods.
pub fn error_response(err: &ClosingError, operation: &str) -> Response {
    log_error(err, operation);

    let mut body = json!({
        "error": err.error_code(),
        "message": err.public_message(),
        "retryable": err.is_retryable(),
    });
    match err {
        ClosingError::ValidationFailed { errors, warnings } => {
            body["errors"] = json!(errors);
            body["warnings"] = json!(warnings);
        }
        ClosingError::CascadeBlocked { periods } => {
            body["periods"] = json!(periods);
        }
        _ => {}
    }

    (status_of(err), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use closebook_shared::types::AccountingPeriodId;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(ClosingError::EmptyName, StatusCode::BAD_REQUEST)]
    #[case(ClosingError::EmptyReason, StatusCode::BAD_REQUEST)]
    #[case(ClosingError::PeriodNotFound(AccountingPeriodId::new()), StatusCode::NOT_FOUND)]
    #[case(ClosingError::Concurrency, StatusCode::CONFLICT)]
    #[case(ClosingError::AlreadyClosed("2024".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(ClosingError::Storage("connection reset".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_of(#[case] err: ClosingError, #[case] expected: StatusCode) {
        assert_eq!(status_of(&err), expected);
    }

    #[tokio::test]
    async fn test_storage_detail_is_hidden() {
        let response = error_response(
            &ClosingError::Storage("password authentication failed".into()),
            "test",
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "STORAGE_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_validation_failure_lists_errors_and_warnings() {
        let err = ClosingError::ValidationFailed {
            errors: vec!["2 draft entries".into()],
            warnings: vec!["1 unlettered customer line".into()],
        };
        let body = body_json(error_response(&err, "close")).await;

        assert_eq!(body["error"], "CLOSURE_VALIDATION_FAILED");
        assert_eq!(body["errors"][0], "2 draft entries");
        assert_eq!(body["warnings"][0], "1 unlettered customer line");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn test_cascade_lists_blocking_periods() {
        let err = ClosingError::CascadeBlocked {
            periods: vec!["2025".into()],
        };
        let body = body_json(error_response(&err, "reopen")).await;

        assert_eq!(body["periods"], json!(["2025"]));
    }
}
