//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes over the closing service
//! - Error-to-response mapping
//! - Response types for close and reopen

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use closebook_core::closing::{ClosingService, ClosingStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState<S> {
    /// Closing service over the configured store.
    pub closing: Arc<ClosingService<S>>,
}

impl<S> AppState<S> {
    /// Wraps a service for sharing across handlers.
    pub fn new(closing: ClosingService<S>) -> Self {
        Self {
            closing: Arc::new(closing),
        }
    }
}

// Manual impl: the store itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            closing: Arc::clone(&self.closing),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: ClosingStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
