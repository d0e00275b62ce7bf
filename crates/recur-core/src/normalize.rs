//! Merchant and amount normalization
//!
//! Turns raw expense records into [`NormalizedExpense`]s:
//! - merchant names collapse to a canonical key so cosmetic variants
//!   ("NETFLIX.COM*12345", "Netflix") group together
//! - dates are parsed from the handful of formats banks and stores emit
//! - amounts become positive magnitudes

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::models::{Expense, NormalizedExpense};

/// Default amount drift always tolerated
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 2000.0;

/// Default amount drift tolerated relative to the larger amount
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 0.05;

/// Card-network and point-of-sale prefixes that vary per transaction
static PROCESSOR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:sq|tst|sp|aplpay|applepay|gpay)\s+").expect("valid regex")
});

/// Store, branch or terminal numbers at the end of a descriptor
static TRAILING_CODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+\d+)+$").expect("valid regex"));

/// Web domain suffix left over from "netflix.com" style descriptors
static DOMAIN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:com|net|org|io|co)$").expect("valid regex"));

/// Canonicalize a merchant name to a grouping key
///
/// Lowercases, drops apostrophes, turns other punctuation into spaces,
/// collapses whitespace runs, and strips processor prefixes, trailing numeric
/// store codes and web domain suffixes.
pub fn normalize_merchant(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut spaced = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            spaced.push(c);
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else {
            spaced.push(' ');
        }
    }

    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let without_prefix = PROCESSOR_PREFIX.replace(&collapsed, "");
    let without_codes = TRAILING_CODES.replace(&without_prefix, "");
    let without_domain = DOMAIN_SUFFIX.replace(&without_codes, "");
    let key = TRAILING_CODES.replace(&without_domain, "");

    if key.is_empty() {
        // A name made only of a prefix keeps it rather than vanishing
        return collapsed;
    }
    key.into_owned()
}

/// Whether two amounts are the same price give or take tax/fee drift,
/// using the default tolerances
pub fn amounts_compatible(a: f64, b: f64) -> bool {
    amounts_compatible_with(a, b, DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_RELATIVE_TOLERANCE)
}

/// `|a - b| <= max(absolute, relative * max(a, b))`
pub fn amounts_compatible_with(a: f64, b: f64, absolute: f64, relative: f64) -> bool {
    let allowed = absolute.max(relative * a.abs().max(b.abs()));
    (a - b).abs() <= allowed
}

/// Parse a stored transaction date
pub fn parse_transaction_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Try common date formats
    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%y", // 01/15/24 (before %Y, which would read "24" as year 24)
        "%m/%d/%Y", // 01/15/2024
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // Timestamps: keep the calendar date as written
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Normalize a single expense, or None if the record is unusable
pub fn normalize_expense(expense: &Expense) -> Option<NormalizedExpense> {
    let Some(date) = parse_transaction_date(&expense.transaction_date) else {
        debug!(
            "Skipping expense {} - unparseable date {:?}",
            expense.id, expense.transaction_date
        );
        return None;
    };

    if !expense.amount.is_finite() || expense.amount == 0.0 {
        debug!(
            "Skipping expense {} - unusable amount {}",
            expense.id, expense.amount
        );
        return None;
    }

    let merchant_key = normalize_merchant(&expense.merchant);
    if merchant_key.is_empty() {
        debug!("Skipping expense {} - empty merchant", expense.id);
        return None;
    }

    Some(NormalizedExpense {
        id: expense.id,
        merchant: expense.merchant.trim().to_string(),
        merchant_key,
        category: expense
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        amount: expense.amount.abs(),
        currency: expense
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase),
        date,
    })
}

/// Output of the normalization stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub expenses: Vec<NormalizedExpense>,
    /// Malformed records
    pub skipped: usize,
    /// Records in an excluded category
    pub excluded: usize,
}

/// Normalize a whole expense history
pub fn normalize_expenses(expenses: &[Expense], config: &DetectionConfig) -> Normalized {
    let mut out = Normalized::default();

    for expense in expenses {
        if config.is_excluded_category(expense.category.as_deref()) {
            out.excluded += 1;
            continue;
        }
        match normalize_expense(expense) {
            Some(normalized) => out.expenses.push(normalized),
            None => out.skipped += 1,
        }
    }

    out
}
