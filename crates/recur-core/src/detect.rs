//! Recurring expense detection
//!
//! Infers subscriptions, bills and memberships from an untagged expense
//! history. The pipeline runs strictly forward, each stage producing a new
//! value from the previous one:
//!
//! 1. normalize: parse dates, canonicalize merchants, drop malformed rows
//! 2. group: split each merchant into amount bands
//! 3. classify: measure gaps and assign a cadence (or reject)
//! 4. score: one confidence value per series
//! 5. forecast: next expected date and representative amount
//!
//! The detector holds no state between calls; the same input always yields
//! the same report.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::classify::{Classification, IntervalClassifier};
use crate::config::DetectionConfig;
use crate::forecast::{average_amount, next_expected};
use crate::group::{is_low_evidence, GroupBuilder};
use crate::models::{DetectedPattern, DetectionReport, Expense, ExpenseGroup};
use crate::normalize::normalize_expenses;
use crate::score::ConfidenceScorer;

/// Main detector that runs the full pipeline
#[derive(Debug, Clone, Default)]
pub struct RecurringDetector {
    config: DetectionConfig,
}

impl RecurringDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run detection over one user's expense history
    pub fn detect(&self, expenses: &[Expense]) -> DetectionReport {
        let normalized = normalize_expenses(expenses, &self.config);
        let grouping = GroupBuilder::new(&self.config).build(&normalized.expenses);

        let classifier = IntervalClassifier::new(&self.config);
        let scorer = ConfidenceScorer::new(&self.config);

        let mut rejected = 0;
        let mut patterns = Vec::new();
        for group in &grouping.groups {
            let Some(classification) = classifier.classify(group) else {
                rejected += 1;
                continue;
            };

            let confidence = scorer.score(group, &classification);
            if confidence < self.config.min_confidence {
                debug!(
                    "Dropping {} - confidence {:.2} below {:.2}",
                    group.merchant_key, confidence, self.config.min_confidence
                );
                continue;
            }

            match build_pattern(group, &classification, confidence) {
                Some(pattern) => patterns.push(pattern),
                None => {
                    debug!(
                        "Rejecting {} - no representable next date after {:?}",
                        group.merchant_key,
                        group.last_seen()
                    );
                    rejected += 1;
                }
            }
        }

        patterns.sort_by(compare_patterns);

        info!(
            "Detection complete: {} expenses, {} skipped, {} excluded, {} groups ({} discarded, {} rejected), {} patterns",
            expenses.len(),
            normalized.skipped,
            normalized.excluded,
            grouping.formed,
            grouping.discarded,
            rejected,
            patterns.len()
        );

        DetectionReport {
            expenses_seen: expenses.len(),
            skipped: normalized.skipped,
            excluded: normalized.excluded,
            groups_formed: grouping.formed,
            groups_discarded: grouping.discarded,
            groups_rejected: rejected,
            patterns,
        }
    }
}

/// Detect recurring patterns with the default configuration
pub fn detect_recurring(expenses: &[Expense]) -> DetectionReport {
    RecurringDetector::new().detect(expenses)
}

fn build_pattern(
    group: &ExpenseGroup,
    classification: &Classification,
    confidence: f64,
) -> Option<DetectedPattern> {
    let first_seen = group.first_seen()?;
    let last_seen = group.last_seen()?;
    let amounts = group.amounts();
    let first_amount = *amounts.first()?;
    let frequency = classification.frequency;

    Some(DetectedPattern {
        pattern_id: pattern_id(group, first_seen, first_amount),
        merchant: group.merchant_key.clone(),
        display_name: most_common(group.members.iter().map(|m| m.merchant.as_str()))
            .unwrap_or(group.merchant_key.as_str())
            .to_string(),
        category: most_common(group.members.iter().filter_map(|m| m.category.as_deref()))
            .map(str::to_string),
        currency: group.currency.clone(),
        average_amount: average_amount(group),
        amount_min: amounts.iter().copied().fold(f64::INFINITY, f64::min),
        amount_max: amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        frequency,
        interval_days: frequency.interval_days(),
        confidence,
        next_expected: next_expected(last_seen, frequency)?,
        first_seen,
        last_seen,
        occurrence_count: group.len(),
        low_evidence: is_low_evidence(group),
    })
}

/// Stable identifier for a series: merchant key, currency and first charge
fn pattern_id(group: &ExpenseGroup, first_seen: NaiveDate, first_amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(group.merchant_key.as_bytes());
    hasher.update(b"|");
    hasher.update(group.currency.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(first_seen.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{:.2}", first_amount).as_bytes());
    hex::encode(hasher.finalize())
}

/// Most frequent value; ties go to the lexicographically smallest
fn most_common<'s>(values: impl Iterator<Item = &'s str>) -> Option<&'s str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .fold(None::<(&'s str, usize)>, |best, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

/// Descending confidence, then merchant, then next expected date
fn compare_patterns(left: &DetectedPattern, right: &DetectedPattern) -> Ordering {
    right
        .confidence
        .total_cmp(&left.confidence)
        .then_with(|| left.merchant.cmp(&right.merchant))
        .then_with(|| left.next_expected.cmp(&right.next_expected))
        .then_with(|| left.pattern_id.cmp(&right.pattern_id))
}
