//! Accounting period registry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use closebook_core::closing::ClosingStore;
use closebook_core::period::CreatePeriodInput;
use closebook_shared::types::{AccountingPeriodId, CompanyId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::error_response};

/// Creates the period routes.
pub fn routes<S: ClosingStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/companies/{company_id}/periods",
            get(list_periods::<S>).post(create_period::<S>),
        )
        .route(
            "/companies/{company_id}/periods/{period_id}",
            get(get_period::<S>),
        )
}

/// Request body for registering a period.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    /// Period name (e.g., "FY 2024").
    pub name: String,
    /// First day (YYYY-MM-DD).
    pub start_date: NaiveDate,
    /// Last day, inclusive (YYYY-MM-DD).
    pub end_date: NaiveDate,
}

/// GET `/companies/{company_id}/periods` - Periods of a company, latest first.
async fn list_periods<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
) -> Response {
    match state.closing.get_periods(company_id).await {
        Ok(periods) => (StatusCode::OK, Json(json!({ "periods": periods }))).into_response(),
        Err(e) => error_response(&e, "list_periods"),
    }
}

/// POST `/companies/{company_id}/periods` - Register an open period.
async fn create_period<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path(company_id): Path<CompanyId>,
    Json(payload): Json<CreatePeriodRequest>,
) -> Response {
    let input = CreatePeriodInput {
        company_id,
        name: payload.name,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };

    match state.closing.create_period(input).await {
        Ok(period) => (StatusCode::CREATED, Json(period)).into_response(),
        Err(e) => error_response(&e, "create_period"),
    }
}

/// GET `/companies/{company_id}/periods/{period_id}` - One period.
async fn get_period<S: ClosingStore>(
    State(state): State<AppState<S>>,
    Path((company_id, period_id)): Path<(CompanyId, AccountingPeriodId)>,
) -> Response {
    match state.closing.get_period_by_id(company_id, period_id).await {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(e) => error_response(&e, "get_period"),
    }
}
