//! Accounting periods.
//!
//! A period is a named, inclusive date range owned by one company. Periods of
//! the same company never overlap and are either open or closed.

pub mod rules;
pub mod types;

#[cfg(test)]
mod rules_props;

pub use rules::{
    date_ranges_overlap, find_overlap, later_periods, successor_of, validate_date_range,
    validate_period_input,
};
pub use types::{AccountingPeriod, CreatePeriodInput};
