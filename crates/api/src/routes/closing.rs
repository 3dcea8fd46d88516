//! Period closing routes: readiness, status, close, reopen and opening
//! entry regeneration.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use closebook_core::closing::{
    ClosingError, ClosingStore, PeriodClosed, PeriodReopened, ResultType,
};
use closebook_shared::types::{AccountingPeriodId, CompanyId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    AppState,
    error::{error_response, log_error, status_of},
};

/// Creates the closing routes.
pub fn routes<S: ClosingStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/periods/{period_id}/closure-readiness",
            get(closure_readiness::<S>),
        )
        .route(
            "/companies/{company_id}/periods/{period_id}/closure-status",
            get(closure_status::<S>),
        )
        .route(
            "/companies/{company_id}/periods/{period_id}/close",
            post(close_period::<S>),
        )
        .route(
            "/companies/{company_id}/periods/{period_id}/reopen",
            post(reopen_period::<S>),
        )
        .route(
            "/companies/{company_id}/periods/{period_id}/opening-entries",
            post(regenerate_opening_entries::<S>),
        )
}

/// Request body for reopening a period.
#[derive(Debug, Deserialize)]
pub struct ReopenRequest {
    /// Why the period is reopened; kept in the audit log.
    #[serde(default)]
    pub reason: String,
}

/// Outcome of a close or reopen.
///
/// Built only from a completed operation or an error, so `success: true`
/// always comes with the fields the operation produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureResponse {
    /// Whether the operation committed.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Machine-readable error code on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Closing entry written by a close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_entry_id: Option<JournalEntryId>,
    /// Opening entry written into the next period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_entry_id: Option<JournalEntryId>,
    /// Absolute result of the closed period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_amount: Option<Decimal>,
    /// Profit or loss.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultType>,
    /// Closing and opening entries removed by a reopen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_entries: Option<u64>,
    /// Blocking problems.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Non-blocking notices.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl From<PeriodClosed> for ClosureResponse {
    fn from(closed: PeriodClosed) -> Self {
        let outcome = match closed.result_type {
            ResultType::Profit => "profit",
            ResultType::Loss => "loss",
        };
        Self {
            success: true,
            message: format!(
                "Period \"{}\" closed with a {outcome} of {}",
                closed.period.name, closed.result_amount
            ),
            error: None,
            closing_entry_id: Some(closed.closing_entry_id),
            opening_entry_id: closed.opening_entry_id,
            result_amount: Some(closed.result_amount),
            result_type: Some(closed.result_type),
            deleted_entries: None,
            errors: Vec::new(),
            warnings: closed.warnings,
        }
    }
}

impl From<PeriodReopened> for ClosureResponse {
    fn from(reopened: PeriodReopened) -> Self {
        Self {
            success: true,
            message: format!(
                "Period \"{}\" reopened, {} entries deleted",
                reopened.period.name, reopened.deleted_entries
            ),
            error: None,
            closing_entry_id: None,
            opening_entry_id: None,
            result_amount: None,
            result_type: None,
            deleted_entries: Some(reopened.deleted_entries),
            errors: Vec::new(),
            warnings: reopened.warnings,
        }
    }
}

impl From<&ClosingError> for ClosureResponse {
    fn from(err: &ClosingError) -> Self {
        let (errors, warnings) = match err {
            ClosingError::ValidationFailed { errors, warnings } => {
                (errors.clone(), warnings.clone())
            }
            other => (vec![other.public_message()], Vec::new()),
        };
        Self {
            success: false,
            message: err.public_message(),
            error: Some(err.error_code().to_string()),
            closing_entry_id: None,
            opening_entry_id: None,
            result_amount: None,
            result_type: None,
            deleted_entries: None,
            errors,
            warnings,
        }
    }
}

fn closure_failure(err: &ClosingError, operation: &str) -> Response {
    log_error(err, operation);
    (status_of(err), Json(ClosureResponse::from(err))).into_response()
}

/// GET `.../closure-readiness` - Whether the period could be closed now.
async fn closure_readiness<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
) -> Response {
    match state
        .closing
        .validate_closure_readiness(company_id, period_id)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(&e, "closure_readiness"),
    }
}

/// GET `.../closure-status` - Entry counts and closing state.
async fn closure_status<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
) -> Response {
    match state
        .closing
        .get_period_closure_status(company_id, period_id)
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => error_response(&e, "closure_status"),
    }
}

/// POST `.../close` - Close the period.
async fn close_period<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
) -> Response {
    match state.closing.close_period(company_id, period_id).await {
        Ok(closed) => {
            info!(
                period_id = %period_id,
                closing_entry_id = %closed.closing_entry_id,
                "Close request completed"
            );
            (StatusCode::OK, Json(ClosureResponse::from(closed))).into_response()
        }
        Err(e) => closure_failure(&e, "close_period"),
    }
}

/// POST `.../reopen` - Reopen a closed period.
async fn reopen_period<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
    Json(payload): Json<ReopenRequest>,
) -> Response {
    match state
        .closing
        .reopen_period(company_id, period_id, &payload.reason)
        .await
    {
        Ok(reopened) => (StatusCode::OK, Json(ClosureResponse::from(reopened))).into_response(),
        Err(e) => closure_failure(&e, "reopen_period"),
    }
}

/// POST `.../opening-entries` - Rewrite the opening entry in the next period.
async fn regenerate_opening_entries<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
) -> Response {
    match state
        .closing
        .regenerate_opening_entries(company_id, period_id)
        .await
    {
        Ok(regenerated) => (StatusCode::OK, Json(regenerated)).into_response(),
        Err(e) => error_response(&e, "regenerate_opening_entries"),
    }
}
