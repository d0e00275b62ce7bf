//! Candidate series construction
//!
//! Partitions normalized expenses by merchant key, then splits each merchant
//! into amount bands so that two subscriptions at the same vendor (different
//! tiers, different family members) stay separate series.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::DetectionConfig;
use crate::models::{ExpenseGroup, NormalizedExpense};
use crate::normalize::amounts_compatible_with;

/// Fewest occurrences that can establish a cadence
pub const MIN_OCCURRENCES: usize = 2;

/// Fewest occurrences for a classification that is not low-evidence
pub const CONFIDENT_OCCURRENCES: usize = 3;

/// Whether a group only barely clears the minimum evidence bar
pub fn is_low_evidence(group: &ExpenseGroup) -> bool {
    group.len() < CONFIDENT_OCCURRENCES
}

/// Output of the grouping stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    /// Groups with at least [`MIN_OCCURRENCES`] members, ordered by merchant key
    pub groups: Vec<ExpenseGroup>,
    /// Groups opened in total, including discarded ones
    pub formed: usize,
    /// Groups dropped for having a single occurrence
    pub discarded: usize,
}

/// A group still accepting occurrences
struct OpenGroup {
    currency: Option<String>,
    members: Vec<NormalizedExpense>,
    total: f64,
}

impl OpenGroup {
    fn running_mean(&self) -> f64 {
        self.total / self.members.len() as f64
    }

    fn accepts(&self, expense: &NormalizedExpense, config: &DetectionConfig) -> bool {
        self.currency == expense.currency
            && amounts_compatible_with(
                self.running_mean(),
                expense.amount,
                config.absolute_tolerance,
                config.relative_tolerance,
            )
    }
}

pub struct GroupBuilder<'a> {
    config: &'a DetectionConfig,
}

impl<'a> GroupBuilder<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Partition an expense history into candidate recurring series
    pub fn build(&self, expenses: &[NormalizedExpense]) -> Grouping {
        let mut by_merchant: BTreeMap<&str, Vec<&NormalizedExpense>> = BTreeMap::new();
        for expense in expenses {
            by_merchant
                .entry(expense.merchant_key.as_str())
                .or_default()
                .push(expense);
        }

        let mut grouping = Grouping::default();

        for (merchant_key, mut occurrences) in by_merchant {
            occurrences.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

            for open in self.split_bands(&occurrences) {
                grouping.formed += 1;
                if open.members.len() < MIN_OCCURRENCES {
                    debug!(
                        "Discarding {} group @ {:.2} - single occurrence",
                        merchant_key, open.total
                    );
                    grouping.discarded += 1;
                    continue;
                }
                grouping.groups.push(ExpenseGroup {
                    merchant_key: merchant_key.to_string(),
                    currency: open.currency,
                    members: open.members,
                });
            }
        }

        grouping
    }

    /// Assign each date-ordered occurrence to the first compatible open group
    fn split_bands(&self, occurrences: &[&NormalizedExpense]) -> Vec<OpenGroup> {
        let mut open: Vec<OpenGroup> = Vec::new();

        for &expense in occurrences {
            match open.iter_mut().find(|g| g.accepts(expense, self.config)) {
                Some(group) => {
                    group.total += expense.amount;
                    group.members.push(expense.clone());
                }
                None => open.push(OpenGroup {
                    currency: expense.currency.clone(),
                    members: vec![expense.clone()],
                    total: expense.amount,
                }),
            }
        }

        open
    }
}
