//! Detector configuration
//!
//! Every tolerance the detector applies lives here so it can be tuned
//! against real transaction data without a rebuild.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/recur/config/detector.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/detector.toml");

/// Detection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Amount drift always tolerated, in the expense's own currency units
    pub absolute_tolerance: f64,
    /// Amount drift tolerated as a fraction of the larger amount.
    /// Also used when matching a gap against a multiple of the median gap.
    pub relative_tolerance: f64,
    /// Allowed day-of-month drift for monthly charges
    pub day_of_month_jitter: u32,
    /// Maximum stdev(gaps) / median_gap for a custom cadence
    pub custom_max_dispersion: f64,
    /// Maximum stdev(gaps) / median_gap for any cadence
    pub max_gap_dispersion: f64,
    /// Occurrence count at which the count factor reaches 1.0
    pub count_saturation: usize,
    /// Confidence ceiling for two-occurrence series
    pub low_evidence_cap: f64,
    /// Patterns scoring below this are dropped from output
    pub min_confidence: f64,
    /// Categories ignored before grouping (compared case-insensitively)
    pub excluded_categories: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: 2000.0,
            relative_tolerance: 0.05,
            day_of_month_jitter: 3,
            custom_max_dispersion: 0.25,
            max_gap_dispersion: 0.4,
            count_saturation: 5,
            low_evidence_cap: 0.5,
            min_confidence: 0.0,
            excluded_categories: Vec::new(),
        }
    }
}

impl DetectionConfig {
    /// Load from the override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path; a missing file yields the embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Render in the same sectioned layout the loader reads
    pub fn to_toml(&self) -> Result<String> {
        let raw = RawConfig {
            tolerance: Some(RawTolerance {
                absolute: Some(self.absolute_tolerance),
                relative: Some(self.relative_tolerance),
                day_of_month_jitter: Some(self.day_of_month_jitter),
            }),
            cadence: Some(RawCadence {
                custom_max_dispersion: Some(self.custom_max_dispersion),
                max_gap_dispersion: Some(self.max_gap_dispersion),
            }),
            scoring: Some(RawScoring {
                count_saturation: Some(self.count_saturation),
                low_evidence_cap: Some(self.low_evidence_cap),
                min_confidence: Some(self.min_confidence),
            }),
            filters: Some(RawFilters {
                excluded_categories: Some(self.excluded_categories.clone()),
            }),
        };
        toml::to_string_pretty(&raw)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }

    /// Whether an expense category is on the exclusion list
    pub fn is_excluded_category(&self, category: Option<&str>) -> bool {
        let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
            return false;
        };
        self.excluded_categories
            .iter()
            .any(|excluded| excluded.trim().eq_ignore_ascii_case(category))
    }

    fn validate(&self) -> Result<()> {
        if !(self.absolute_tolerance >= 0.0 && self.absolute_tolerance.is_finite()) {
            return Err(Error::Config(
                "tolerance.absolute must be a non-negative number".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.relative_tolerance) {
            return Err(Error::Config(
                "tolerance.relative must be in [0, 1)".into(),
            ));
        }
        for (name, value) in [
            ("cadence.custom_max_dispersion", self.custom_max_dispersion),
            ("cadence.max_gap_dispersion", self.max_gap_dispersion),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }
        if self.count_saturation == 0 {
            return Err(Error::Config(
                "scoring.count_saturation must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("scoring.low_evidence_cap", self.low_evidence_cap),
            ("scoring.min_confidence", self.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be in [0, 1]", name)));
            }
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("recur").join("config").join("detector.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<DetectionConfig> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    let content = match path {
        Some(path) if path.exists() => fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    tolerance: Option<RawTolerance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cadence: Option<RawCadence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scoring: Option<RawScoring>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<RawFilters>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTolerance {
    absolute: Option<f64>,
    relative: Option<f64>,
    day_of_month_jitter: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCadence {
    custom_max_dispersion: Option<f64>,
    max_gap_dispersion: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawScoring {
    count_saturation: Option<usize>,
    low_evidence_cap: Option<f64>,
    min_confidence: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawFilters {
    excluded_categories: Option<Vec<String>>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<DetectionConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = DetectionConfig::default();

    if let Some(tolerance) = raw.tolerance {
        if let Some(absolute) = tolerance.absolute {
            config.absolute_tolerance = absolute;
        }
        if let Some(relative) = tolerance.relative {
            config.relative_tolerance = relative;
        }
        if let Some(jitter) = tolerance.day_of_month_jitter {
            config.day_of_month_jitter = jitter;
        }
    }

    if let Some(cadence) = raw.cadence {
        if let Some(custom) = cadence.custom_max_dispersion {
            config.custom_max_dispersion = custom;
        }
        if let Some(max) = cadence.max_gap_dispersion {
            config.max_gap_dispersion = max;
        }
    }

    if let Some(scoring) = raw.scoring {
        if let Some(saturation) = scoring.count_saturation {
            config.count_saturation = saturation;
        }
        if let Some(cap) = scoring.low_evidence_cap {
            config.low_evidence_cap = cap;
        }
        if let Some(min) = scoring.min_confidence {
            config.min_confidence = min;
        }
    }

    if let Some(filters) = raw.filters {
        if let Some(categories) = filters.excluded_categories {
            config.excluded_categories = categories;
        }
    }

    config.validate()?;
    Ok(config)
}
