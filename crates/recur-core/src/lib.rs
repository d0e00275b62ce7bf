//! Recur Core Library
//!
//! Recurring expense detection for the Recur personal finance tool:
//! - Merchant normalization and amount tolerance
//! - Grouping expense history into candidate recurring series
//! - Cadence classification with missed-cycle tolerance
//! - Confidence scoring and next-charge forecasting
//! - Expense history loading (CSV, JSON) and detector configuration

pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod forecast;
pub mod group;
pub mod import;
pub mod models;
pub mod normalize;
pub mod score;
pub mod stats;

/// Test utilities including expense builders
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::{Classification, GapAnalysis, IntervalClassifier};
pub use config::DetectionConfig;
pub use detect::{detect_recurring, RecurringDetector};
pub use error::{Error, Result};
pub use group::{GroupBuilder, Grouping};
pub use import::{load_expenses, InputFormat};
pub use models::{
    DetectedPattern, DetectionReport, Expense, ExpenseGroup, Frequency, NormalizedExpense,
    RecurringExpenseRecord,
};
pub use normalize::{amounts_compatible, normalize_merchant};
pub use score::{ConfidenceScorer, ScoreBreakdown};
