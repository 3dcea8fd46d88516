//! Accounting period types.

use chrono::{DateTime, NaiveDate, Utc};
use closebook_shared::types::{AccountingPeriodId, CompanyId};
use serde::{Deserialize, Serialize};

/// An accounting period (fiscal year, quarter, month...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: AccountingPeriodId,
    /// Company owning the period.
    pub company_id: CompanyId,
    /// Period name (e.g., "2024").
    pub name: String,
    /// First day of the period, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Whether the period has been closed.
    pub is_closed: bool,
    /// When the period was last closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AccountingPeriod {
    /// Builds a new open period from validated input.
    #[must_use]
    pub fn open(input: &CreatePeriodInput, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountingPeriodId::new(),
            company_id: input.company_id,
            name: input.name.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            is_closed: false,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for registering a new period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePeriodInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}
