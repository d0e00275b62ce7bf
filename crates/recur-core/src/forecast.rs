//! Next-occurrence forecasting

use chrono::{Duration, Months, NaiveDate};

use crate::models::{ExpenseGroup, Frequency};
use crate::stats::mean;

/// Expected date of the next charge after `last`
///
/// Monthly series land on the same day of the next calendar month, clamped to
/// that month's last day (Jan 31 -> Feb 29 in a leap year). Everything else
/// advances by the cadence's interval. None when the result is past the last
/// representable date.
pub fn next_expected(last: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Monthly => last.checked_add_months(Months::new(1)),
        other => last.checked_add_signed(Duration::days(other.interval_days() as i64)),
    }
}

/// Representative charge for a series
pub fn average_amount(group: &ExpenseGroup) -> f64 {
    mean(&group.amounts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, normalized};

    #[test]
    fn test_monthly_same_day() {
        assert_eq!(
            next_expected(date(2024, 4, 5), Frequency::Monthly),
            Some(date(2024, 5, 5))
        );
        assert_eq!(
            next_expected(date(2024, 12, 15), Frequency::Monthly),
            Some(date(2025, 1, 15))
        );
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        assert_eq!(
            next_expected(date(2024, 1, 31), Frequency::Monthly),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            next_expected(date(2023, 1, 31), Frequency::Monthly),
            Some(date(2023, 2, 28))
        );
        assert_eq!(
            next_expected(date(2024, 3, 31), Frequency::Monthly),
            Some(date(2024, 4, 30))
        );
    }

    #[test]
    fn test_fixed_intervals() {
        let last = date(2024, 2, 26);
        assert_eq!(next_expected(last, Frequency::Weekly), Some(date(2024, 3, 4)));
        assert_eq!(next_expected(last, Frequency::Biweekly), Some(date(2024, 3, 11)));
        assert_eq!(next_expected(last, Frequency::Quarterly), Some(date(2024, 5, 26)));
        assert_eq!(
            next_expected(last, Frequency::Custom { interval_days: 45 }),
            Some(date(2024, 4, 11))
        );
    }

    #[test]
    fn test_past_last_representable_date() {
        assert_eq!(next_expected(NaiveDate::MAX, Frequency::Weekly), None);
        assert_eq!(next_expected(NaiveDate::MAX, Frequency::Monthly), None);
        let near_end = NaiveDate::MAX - Duration::days(3);
        assert_eq!(next_expected(near_end, Frequency::Quarterly), None);
    }

    #[test]
    fn test_average_amount() {
        let group = ExpenseGroup {
            merchant_key: "netflix".to_string(),
            currency: None,
            members: vec![
                normalized(1, "Netflix", 260_000.0, date(2024, 1, 5)),
                normalized(2, "Netflix", 262_000.0, date(2024, 2, 5)),
                normalized(3, "Netflix", 264_000.0, date(2024, 3, 5)),
            ],
        };
        assert_eq!(average_amount(&group), 262_000.0);
    }
}
