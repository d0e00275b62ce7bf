//! Confidence scoring
//!
//! `confidence = clamp01(0.4 * count + 0.4 * gap_regularity + 0.2 * amount_regularity)`
//!
//! - count factor saturates at `count_saturation` occurrences
//! - gap regularity is `1 - cv(kept gaps)`
//! - amount regularity is `1 - cv(amounts)`
//!
//! Two-occurrence series are capped at `low_evidence_cap`.

use crate::classify::Classification;
use crate::config::DetectionConfig;
use crate::group::is_low_evidence;
use crate::models::ExpenseGroup;
use crate::stats::{clamp01, coefficient_of_variation};

const COUNT_WEIGHT: f64 = 0.4;
const GAP_WEIGHT: f64 = 0.4;
const AMOUNT_WEIGHT: f64 = 0.2;

/// Individual factors behind a confidence score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub count_factor: f64,
    pub gap_regularity: f64,
    pub amount_regularity: f64,
    pub confidence: f64,
}

pub struct ConfidenceScorer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, group: &ExpenseGroup, classification: &Classification) -> f64 {
        self.breakdown(group, classification).confidence
    }

    pub fn breakdown(&self, group: &ExpenseGroup, classification: &Classification) -> ScoreBreakdown {
        let saturation = self.config.count_saturation.max(1) as f64;
        let count_factor = (group.len() as f64 / saturation).min(1.0);
        let gap_regularity = clamp01(1.0 - coefficient_of_variation(&classification.gaps.kept));
        let amount_regularity = clamp01(1.0 - coefficient_of_variation(&group.amounts()));

        let mut confidence = clamp01(
            COUNT_WEIGHT * count_factor
                + GAP_WEIGHT * gap_regularity
                + AMOUNT_WEIGHT * amount_regularity,
        );
        if is_low_evidence(group) {
            confidence = confidence.min(self.config.low_evidence_cap);
        }

        ScoreBreakdown {
            count_factor,
            gap_regularity,
            amount_regularity,
            confidence,
        }
    }
}
