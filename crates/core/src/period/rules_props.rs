//! Property-based tests for period date-range rules.

use chrono::{Duration, NaiveDate, Utc};
use closebook_shared::types::CompanyId;
use proptest::prelude::*;

use super::rules::{date_ranges_overlap, find_overlap, successor_of, validate_date_range};
use super::types::{AccountingPeriod, CreatePeriodInput};
use crate::closing::ClosingError;

/// Strategy to generate dates from 2020-01-01 to 2030-12-28.
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

/// Strategy to generate a valid period range (start <= end, single day allowed).
fn valid_period_dates() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (date_strategy(), 0i64..=365).prop_map(|(start, days)| (start, start + Duration::days(days)))
}

fn period_for(start: NaiveDate, end: NaiveDate) -> AccountingPeriod {
    AccountingPeriod::open(
        &CreatePeriodInput {
            company_id: CompanyId::new(),
            name: format!("{start}..{end}"),
            start_date: start,
            end_date: end,
        },
        Utc::now(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Date range validation
    // =========================================================================

    /// Any range with start <= end is accepted, including single-day ranges.
    #[test]
    fn prop_valid_date_range_accepted((start, end) in valid_period_dates()) {
        prop_assert!(validate_date_range(start, end).is_ok());
    }

    /// Any range ending before it starts is rejected.
    #[test]
    fn prop_inverted_date_range_rejected(date in date_strategy(), days in 1i64..=365) {
        let earlier = date - Duration::days(days);
        prop_assert!(
            matches!(
                validate_date_range(date, earlier),
                Err(ClosingError::InvalidDateRange { .. })
            ),
            "End before start should be rejected"
        );
    }

    // =========================================================================
    // Overlap detection
    // =========================================================================

    /// A range starting inside another range overlaps it.
    #[test]
    fn prop_overlapping_ranges_detected(
        (a_start, a_end) in valid_period_dates(),
        offset in 0i64..=365,
    ) {
        let b_start = a_start + Duration::days(offset);
        if b_start <= a_end {
            let b_end = b_start + Duration::days(30);
            prop_assert!(date_ranges_overlap(a_start, a_end, b_start, b_end));
        }
    }

    /// overlap(A, B) == overlap(B, A).
    #[test]
    fn prop_overlap_is_symmetric(
        (a_start, a_end) in valid_period_dates(),
        (b_start, b_end) in valid_period_dates(),
    ) {
        prop_assert_eq!(
            date_ranges_overlap(a_start, a_end, b_start, b_end),
            date_ranges_overlap(b_start, b_end, a_start, a_end)
        );
    }

    /// A range ending on day D and another starting on D+1 do not overlap.
    #[test]
    fn prop_adjacent_ranges_do_not_overlap((a_start, a_end) in valid_period_dates()) {
        let b_start = a_end + Duration::days(1);
        let b_end = b_start + Duration::days(30);

        prop_assert!(!date_ranges_overlap(a_start, a_end, b_start, b_end));
        let existing = vec![period_for(a_start, a_end)];
        prop_assert!(find_overlap(&existing, b_start, b_end).is_none());
    }

    /// Every range overlaps itself.
    #[test]
    fn prop_range_overlaps_itself((start, end) in valid_period_dates()) {
        prop_assert!(date_ranges_overlap(start, end, start, end));
    }

    // =========================================================================
    // Successor selection
    // =========================================================================

    /// The successor of a period is adjacent when periods are laid end to end.
    #[test]
    fn prop_successor_of_back_to_back_periods(
        start in date_strategy(),
        lengths in prop::collection::vec(0i64..=90, 2..6),
    ) {
        let mut periods = Vec::new();
        let mut cursor = start;
        for len in &lengths {
            let end = cursor + Duration::days(*len);
            periods.push(period_for(cursor, end));
            cursor = end + Duration::days(1);
        }

        for pair in periods.windows(2) {
            let next = successor_of(&periods, pair[0].end_date);
            prop_assert_eq!(next.map(|p| p.id), Some(pair[1].id));
        }
        let last = &periods[periods.len() - 1];
        prop_assert!(successor_of(&periods, last.end_date).is_none());
    }
}
