//! API route definitions.

use axum::Router;
use closebook_core::closing::ClosingStore;

use crate::AppState;

pub mod closing;
pub mod health;
pub mod ledger;
pub mod periods;

/// Creates the API router with all routes.
pub fn api_routes<S: ClosingStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(periods::routes())
        .merge(closing::routes())
        .merge(ledger::routes())
}
