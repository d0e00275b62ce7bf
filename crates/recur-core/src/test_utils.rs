//! Test utilities for recur-core
//!
//! Expense builders shared by unit tests here and by the CLI crate's tests
//! (enable the `test-utils` feature).

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Months, NaiveDate};

use crate::models::{Expense, NormalizedExpense};
use crate::normalize::normalize_merchant;

static NEXT_ID: AtomicI64 = AtomicI64::new(10_000);

/// Shorthand for a calendar date; panics on invalid input
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A single raw expense for user 1
pub fn expense(id: i64, merchant: &str, amount: f64, transaction_date: &str) -> Expense {
    Expense {
        id,
        user_id: 1,
        merchant: merchant.to_string(),
        category: None,
        amount,
        currency: None,
        transaction_date: transaction_date.to_string(),
    }
}

/// One raw expense per date, same merchant and amount
pub fn series(merchant: &str, amount: f64, dates: &[NaiveDate]) -> Vec<Expense> {
    dates
        .iter()
        .map(|d| {
            let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
            expense(id, merchant, amount, &d.format("%Y-%m-%d").to_string())
        })
        .collect()
}

/// `count` dates starting at `start`, `step_days` apart
pub fn every_n_days(start: NaiveDate, step_days: i64, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map(|i| start + Duration::days(step_days * i as i64))
        .collect()
}

/// `count` dates on the same day of consecutive months (clamped at month end)
pub fn monthly_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|i| start.checked_add_months(Months::new(i as u32)))
        .collect()
}

/// An already-normalized expense, for stage-level tests
pub fn normalized(id: i64, merchant: &str, amount: f64, date: NaiveDate) -> NormalizedExpense {
    NormalizedExpense {
        id,
        merchant: merchant.to_string(),
        merchant_key: normalize_merchant(merchant),
        category: None,
        amount,
        currency: None,
        date,
    }
}
