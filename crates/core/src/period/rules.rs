//! Date-range rules for accounting periods.

use chrono::NaiveDate;

use super::types::{AccountingPeriod, CreatePeriodInput};
use crate::closing::ClosingError;

/// Validates that `start_date` is not after `end_date`.
///
/// A single-day period (`start_date == end_date`) is valid.
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), ClosingError> {
    if start_date > end_date {
        return Err(ClosingError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }
    Ok(())
}

/// Checks if two inclusive date ranges overlap.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Validates the shape of a period before it touches storage.
pub fn validate_period_input(input: &CreatePeriodInput) -> Result<(), ClosingError> {
    if input.name.trim().is_empty() {
        return Err(ClosingError::EmptyName);
    }
    validate_date_range(input.start_date, input.end_date)
}

/// Returns the first period of the slice overlapping `[start, end]`.
#[must_use]
pub fn find_overlap(
    periods: &[AccountingPeriod],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<&AccountingPeriod> {
    periods
        .iter()
        .find(|p| date_ranges_overlap(p.start_date, p.end_date, start_date, end_date))
}

/// Returns the immediate successor: the period with the earliest start after `after`.
pub fn successor_of<'a, I>(periods: I, after: NaiveDate) -> Option<&'a AccountingPeriod>
where
    I: IntoIterator<Item = &'a AccountingPeriod>,
{
    periods
        .into_iter()
        .filter(|p| p.start_date > after)
        .min_by_key(|p| p.start_date)
}

/// Returns every period starting after `after`, earliest first.
pub fn later_periods<'a, I>(periods: I, after: NaiveDate) -> Vec<&'a AccountingPeriod>
where
    I: IntoIterator<Item = &'a AccountingPeriod>,
{
    let mut later: Vec<_> = periods
        .into_iter()
        .filter(|p| p.start_date > after)
        .collect();
    later.sort_by_key(|p| p.start_date);
    later
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use closebook_shared::types::CompanyId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(name: &str, start: NaiveDate, end: NaiveDate) -> AccountingPeriod {
        AccountingPeriod::open(
            &CreatePeriodInput {
                company_id: CompanyId::new(),
                name: name.to_string(),
                start_date: start,
                end_date: end,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(date(2024, 1, 1), date(2024, 12, 31)).is_ok());
        assert!(validate_date_range(date(2024, 6, 30), date(2024, 6, 30)).is_ok());
        assert!(matches!(
            validate_date_range(date(2024, 12, 31), date(2024, 1, 1)),
            Err(ClosingError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_validate_period_input_rejects_blank_name() {
        let input = CreatePeriodInput {
            company_id: CompanyId::new(),
            name: "   ".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
        };
        assert!(matches!(
            validate_period_input(&input),
            Err(ClosingError::EmptyName)
        ));
    }

    #[test]
    fn test_find_overlap_names_existing_period() {
        let periods = vec![period("2024", date(2024, 1, 1), date(2024, 12, 31))];

        let hit = find_overlap(&periods, date(2024, 12, 31), date(2025, 12, 31));
        assert_eq!(hit.map(|p| p.name.as_str()), Some("2024"));
        assert!(find_overlap(&periods, date(2025, 1, 1), date(2025, 12, 31)).is_none());
    }

    #[test]
    fn test_successor_is_earliest_later_period() {
        let periods = vec![
            period("2026", date(2026, 1, 1), date(2026, 12, 31)),
            period("2024", date(2024, 1, 1), date(2024, 12, 31)),
            period("2025", date(2025, 1, 1), date(2025, 12, 31)),
        ];

        let next = successor_of(&periods, date(2024, 12, 31));
        assert_eq!(next.map(|p| p.name.as_str()), Some("2025"));
        assert!(successor_of(&periods, date(2026, 12, 31)).is_none());

        let later: Vec<_> = later_periods(&periods, date(2024, 12, 31))
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(later, vec!["2025", "2026"]);
    }
}
