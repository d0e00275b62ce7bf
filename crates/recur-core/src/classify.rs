//! Cadence classification
//!
//! Measures the gaps between consecutive occurrences of a series and maps the
//! median gap to a [`Frequency`]. Gaps that are close to 2x or 3x the typical
//! gap are treated as skipped billing cycles: they stay in the series but are
//! left out of the gap statistics.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::config::DetectionConfig;
use crate::models::{ExpenseGroup, Frequency};
use crate::stats::{median, relative_dispersion};

/// Cycle multiples recognised as skipped payments
const SKIP_MULTIPLES: [f64; 2] = [2.0, 3.0];

/// Integer day gaps are never matched more tightly than this
const MIN_SKIP_TOLERANCE_DAYS: f64 = 1.0;

/// Median-gap window in which day-of-month stability alone implies monthly
const DAY_OF_MONTH_WINDOW: (f64, f64) = (24.0, 35.0);

/// Gap statistics for one series
#[derive(Debug, Clone, PartialEq)]
pub struct GapAnalysis {
    /// Every gap between consecutive occurrences, in days
    pub gaps: Vec<i64>,
    /// Gaps used for statistics (skipped cycles removed)
    pub kept: Vec<f64>,
    /// Gaps recognised as missed billing cycles
    pub skipped_cycles: usize,
    /// Median of the kept gaps
    pub median_gap: f64,
    /// stdev(kept) / median_gap
    pub dispersion: f64,
}

/// A series with an accepted cadence
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub frequency: Frequency,
    pub gaps: GapAnalysis,
}

/// Days between consecutive dates (dates must be ordered)
pub fn gaps_in_days(dates: &[NaiveDate]) -> Vec<i64> {
    dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect()
}

/// Whether every date falls within `jitter` days of the first date's day-of-month
///
/// The first occurrence is the anchor, so drift is not chained: a series that
/// starts 3 days late and later lands 3 days early is not stable with jitter 3.
/// Month-end charges count as day 31 so Jan 31 / Feb 29 / Mar 31 is stable,
/// and distances wrap so the 31st and the 1st are one day apart.
pub fn day_of_month_stable(dates: &[NaiveDate], jitter: u32) -> bool {
    let Some(first) = dates.first() else {
        return false;
    };
    let anchor = effective_day(*first);
    dates.iter().all(|d| {
        let diff = effective_day(*d).abs_diff(anchor);
        diff.min(31 - diff) <= jitter
    })
}

fn effective_day(date: NaiveDate) -> u32 {
    let is_month_end = date.succ_opt().is_some_and(|next| next.month() != date.month());
    if is_month_end {
        31
    } else {
        date.day()
    }
}

fn is_skipped_cycle(gap: f64, base: f64, relative_tolerance: f64) -> bool {
    if base <= 0.0 {
        return false;
    }
    SKIP_MULTIPLES.iter().any(|k| {
        let expected = k * base;
        (gap - expected).abs() <= (relative_tolerance * expected).max(MIN_SKIP_TOLERANCE_DAYS)
    })
}

/// Split gaps into (kept, skipped count) against a base cycle length
fn partition_against(gaps: &[f64], base: f64, relative_tolerance: f64) -> (Vec<f64>, usize) {
    let kept: Vec<f64> = gaps
        .iter()
        .copied()
        .filter(|g| !is_skipped_cycle(*g, base, relative_tolerance))
        .collect();
    let skipped = gaps.len() - kept.len();
    (kept, skipped)
}

pub struct IntervalClassifier<'a> {
    config: &'a DetectionConfig,
}

impl<'a> IntervalClassifier<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Gap statistics for an ordered list of dates; None with fewer than two dates
    pub fn analyze(&self, dates: &[NaiveDate]) -> Option<GapAnalysis> {
        let gaps = gaps_in_days(dates);
        if gaps.is_empty() {
            return None;
        }

        let as_f64: Vec<f64> = gaps.iter().map(|g| *g as f64).collect();
        let (kept, skipped_cycles) = self.exclude_skipped_cycles(&as_f64);
        let median_gap = median(&kept);
        let dispersion = relative_dispersion(&kept);

        Some(GapAnalysis {
            gaps,
            kept,
            skipped_cycles,
            median_gap,
            dispersion,
        })
    }

    /// Remove gaps that look like missed cycles of an otherwise steady cadence
    ///
    /// The median is tried as the base cycle first. In short series a single
    /// skipped cycle drags the median up, so the shortest gap is tried next.
    /// Skips must stay the exception: they may not outnumber the kept gaps
    /// (a lone pair of gaps may split one and one).
    fn exclude_skipped_cycles(&self, gaps: &[f64]) -> (Vec<f64>, usize) {
        let rel = self.config.relative_tolerance;
        let acceptable = |kept: &[f64], skipped: usize| {
            skipped > 0 && !kept.is_empty() && (kept.len() > skipped || gaps.len() == 2)
        };

        let med = median(gaps);
        let (kept, skipped) = partition_against(gaps, med, rel);
        if acceptable(&kept, skipped) {
            return (kept, skipped);
        }

        let shortest = gaps
            .iter()
            .copied()
            .filter(|g| *g > 0.0)
            .fold(f64::INFINITY, f64::min);
        if shortest.is_finite() && shortest < med {
            let (kept, skipped) = partition_against(gaps, shortest, rel);
            if acceptable(&kept, skipped) {
                return (kept, skipped);
            }
        }

        (gaps.to_vec(), 0)
    }

    /// Assign a cadence to a group, or None if it is not recurring
    pub fn classify(&self, group: &ExpenseGroup) -> Option<Classification> {
        let dates = group.dates();
        let gaps = self.analyze(&dates)?;
        let m = gaps.median_gap;

        if m <= 0.0 {
            debug!("Rejecting {} - same-day occurrences only", group.merchant_key);
            return None;
        }

        if gaps.dispersion > self.config.max_gap_dispersion {
            debug!(
                "Rejecting {} - gap dispersion {:.2} around median {:.1}d",
                group.merchant_key, gaps.dispersion, m
            );
            return None;
        }

        let monthly_by_day = (DAY_OF_MONTH_WINDOW.0..=DAY_OF_MONTH_WINDOW.1).contains(&m)
            && day_of_month_stable(&dates, self.config.day_of_month_jitter);

        let frequency = if (6.0..=8.0).contains(&m) {
            Frequency::Weekly
        } else if (13.0..=16.0).contains(&m) {
            Frequency::Biweekly
        } else if (27.0..=32.0).contains(&m) || monthly_by_day {
            Frequency::Monthly
        } else if (85.0..=95.0).contains(&m) {
            Frequency::Quarterly
        } else if gaps.dispersion < self.config.custom_max_dispersion {
            Frequency::Custom {
                interval_days: m.round() as u32,
            }
        } else {
            debug!(
                "Rejecting {} - median gap {:.1}d with dispersion {:.2}",
                group.merchant_key, m, gaps.dispersion
            );
            return None;
        };

        debug!(
            "Classified {} as {} (median {:.1}d, {} skipped cycles)",
            group.merchant_key, frequency, m, gaps.skipped_cycles
        );

        Some(Classification { frequency, gaps })
    }
}
