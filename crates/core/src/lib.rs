//! Core period closing logic for Closebook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here, together with
//! the storage traits the database layer implements.
//!
//! # Modules
//!
//! - `period` - Accounting periods and their date-range rules
//! - `ledger` - Journal entries, account classes and balance aggregation
//! - `closing` - Closure validation, result calculation, closing/opening entries
//!   and the transactional closing service

pub mod closing;
pub mod ledger;
pub mod period;
