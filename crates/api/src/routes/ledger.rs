//! Balance and result reports over a date range.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use closebook_core::closing::{ClosingStore, PeriodResult, ResultType};
use closebook_shared::types::CompanyId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, error::error_response};

/// Creates the ledger report routes.
pub fn routes<S: ClosingStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/companies/{company_id}/balances", get(account_balances::<S>))
        .route("/companies/{company_id}/result", get(period_result::<S>))
}

/// Inclusive date range query.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    /// First day (YYYY-MM-DD).
    pub start_date: NaiveDate,
    /// Last day (YYYY-MM-DD).
    pub end_date: NaiveDate,
}

/// Result of a range with its direction spelled out.
#[derive(Debug, Serialize)]
pub struct PeriodResultResponse {
    /// Charges, revenue and net result.
    #[serde(flatten)]
    pub result: PeriodResult,
    /// Profit or loss.
    pub result_type: ResultType,
}

/// GET `/companies/{company_id}/balances` - Posted balances per account.
async fn account_balances<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(range): Query<DateRangeQuery>,
) -> Response {
    match state
        .closing
        .get_account_balances(company_id, range.start_date, range.end_date)
        .await
    {
        Ok(balances) => (StatusCode::OK, Json(json!({ "balances": balances }))).into_response(),
        Err(e) => error_response(&e, "account_balances"),
    }
}

/// GET `/companies/{company_id}/result` - Revenue minus expenses.
async fn period_result<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Query(range): Query<DateRangeQuery>,
) -> Response {
    match state
        .closing
        .calculate_period_result(company_id, range.start_date, range.end_date)
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(PeriodResultResponse {
                result_type: result.result_type(),
                result,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e, "period_result"),
    }
}
