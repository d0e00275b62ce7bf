//! Domain models for Recur

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// A raw expense as supplied by the expense store
///
/// The date stays in its stored text form; records whose date cannot be
/// parsed are skipped during normalization instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub merchant: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub transaction_date: String,
}

/// An expense with a parsed date and a canonical merchant key
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedExpense {
    pub id: i64,
    /// Merchant as it appeared on the record
    pub merchant: String,
    pub merchant_key: String,
    pub category: Option<String>,
    /// Always positive
    pub amount: f64,
    /// Uppercased ISO code, if the record carried one
    pub currency: Option<String>,
    pub date: NaiveDate,
}

/// A candidate recurring series: one merchant, one amount band, one currency
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseGroup {
    pub merchant_key: String,
    pub currency: Option<String>,
    /// Ordered by date (then id)
    pub members: Vec<NormalizedExpense>,
}

impl ExpenseGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.members.iter().map(|m| m.amount).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.members.iter().map(|m| m.date).collect()
    }

    pub fn first_seen(&self) -> Option<NaiveDate> {
        self.members.first().map(|m| m.date)
    }

    pub fn last_seen(&self) -> Option<NaiveDate> {
        self.members.last().map(|m| m.date)
    }
}

/// Classified cadence of a recurring series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Custom { interval_days: u32 },
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Custom { .. } => "custom",
        }
    }

    /// Nominal number of days between occurrences
    pub fn interval_days(&self) -> u32 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Custom { interval_days } => *interval_days,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { interval_days } => write!(f, "every {} days", interval_days),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A recurring payment inferred from expense history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    /// Stable across runs for the same series (merchant, currency, first charge)
    pub pattern_id: String,
    /// Canonical merchant key
    pub merchant: String,
    /// Most common raw merchant spelling in the series
    pub display_name: String,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub average_amount: f64,
    pub amount_min: f64,
    pub amount_max: f64,
    pub frequency: Frequency,
    pub interval_days: u32,
    pub confidence: f64,
    pub next_expected: NaiveDate,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub occurrence_count: usize,
    /// Only two occurrences backed this pattern
    pub low_evidence: bool,
}

impl DetectedPattern {
    /// Map to the stored "recurring expense" shape
    pub fn to_recurring_expense(&self, user_id: i64) -> RecurringExpenseRecord {
        RecurringExpenseRecord {
            user_id,
            pattern_id: self.pattern_id.clone(),
            name: self.display_name.clone(),
            merchant: self.merchant.clone(),
            category: self.category.clone(),
            currency: self.currency.clone(),
            amount: self.average_amount,
            frequency: self.frequency.as_str().to_string(),
            interval_days: self.interval_days,
            next_due_date: self.next_expected,
            confidence_score: self.confidence,
            source: RECORD_SOURCE_DETECTED.to_string(),
            is_active: true,
        }
    }
}

/// Source tag for recurring expenses created by detection
pub const RECORD_SOURCE_DETECTED: &str = "detected";

/// A recurring expense row as persisted by the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpenseRecord {
    pub user_id: i64,
    pub pattern_id: String,
    pub name: String,
    pub merchant: String,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub amount: f64,
    pub frequency: String,
    pub interval_days: u32,
    pub next_due_date: NaiveDate,
    pub confidence_score: f64,
    pub source: String,
    pub is_active: bool,
}

/// Results of running detection over one expense history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Records received
    pub expenses_seen: usize,
    /// Records dropped as malformed (bad date, unusable amount, empty merchant)
    pub skipped: usize,
    /// Records ignored because of their category
    pub excluded: usize,
    pub groups_formed: usize,
    /// Groups with a single occurrence
    pub groups_discarded: usize,
    /// Groups with no recognizable cadence
    pub groups_rejected: usize,
    /// Sorted by descending confidence
    pub patterns: Vec<DetectedPattern>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pattern() -> DetectedPattern {
        DetectedPattern {
            pattern_id: "abc123".to_string(),
            merchant: "netflix".to_string(),
            display_name: "Netflix".to_string(),
            category: Some("Entertainment".to_string()),
            currency: Some("IDR".to_string()),
            average_amount: 260_000.0,
            amount_min: 260_000.0,
            amount_max: 260_000.0,
            frequency: Frequency::Monthly,
            interval_days: 30,
            confidence: 0.91,
            next_expected: NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
            first_seen: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            last_seen: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            occurrence_count: 4,
            low_evidence: false,
        }
    }

    #[test]
    fn test_frequency_as_str() {
        assert_eq!(Frequency::Weekly.as_str(), "weekly");
        assert_eq!(Frequency::Quarterly.as_str(), "quarterly");
        assert_eq!(Frequency::Custom { interval_days: 45 }.as_str(), "custom");
    }

    #[test]
    fn test_frequency_interval_days() {
        assert_eq!(Frequency::Biweekly.interval_days(), 14);
        assert_eq!(Frequency::Monthly.interval_days(), 30);
        assert_eq!(Frequency::Custom { interval_days: 365 }.interval_days(), 365);
    }

    #[test]
    fn test_frequency_display() {
        assert_eq!(Frequency::Monthly.to_string(), "monthly");
        assert_eq!(
            Frequency::Custom { interval_days: 45 }.to_string(),
            "every 45 days"
        );
    }

    #[test]
    fn test_pattern_serializes_camel_case() {
        let json = serde_json::to_value(sample_pattern()).unwrap();
        assert_eq!(json["frequency"], "monthly");
        assert_eq!(json["intervalDays"], 30);
        assert_eq!(json["averageAmount"], 260_000.0);
        assert_eq!(json["nextExpected"], "2024-05-05");
        assert_eq!(json["occurrenceCount"], 4);
    }

    #[test]
    fn test_to_recurring_expense() {
        let record = sample_pattern().to_recurring_expense(42);
        assert_eq!(record.user_id, 42);
        assert_eq!(record.name, "Netflix");
        assert_eq!(record.merchant, "netflix");
        assert_eq!(record.amount, 260_000.0);
        assert_eq!(record.frequency, "monthly");
        assert_eq!(record.interval_days, 30);
        assert_eq!(
            record.next_due_date,
            NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()
        );
        assert_eq!(record.confidence_score, 0.91);
        assert_eq!(record.source, "detected");
        assert!(record.is_active);
    }

    #[test]
    fn test_expense_deserialize_optional_fields() {
        let json = r#"{"merchant":"Spotify","amount":54990,"transaction_date":"2024-03-01"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.id, 0);
        assert_eq!(expense.category, None);
        assert_eq!(expense.currency, None);
        assert_eq!(expense.transaction_date, "2024-03-01");
    }
}
