//! Detection command implementation

use std::path::Path;

use anyhow::{bail, Context, Result};
use recur_core::{load_expenses, DetectionReport, InputFormat, RecurringDetector};

use super::{load_config, truncate};

/// How detection results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Records,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "records" => Ok(Self::Records),
            other => bail!("Unknown output format: {} (use table, json or records)", other),
        }
    }
}

pub fn cmd_detect(
    file: &Path,
    input: Option<&str>,
    output: &str,
    user_id: i64,
    min_confidence: Option<f64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let output: OutputFormat = output.parse()?;
    let report = run_detect(file, input, min_confidence, config_path)?;

    let rendered = match output {
        OutputFormat::Table => render_table(&report),
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Records => render_records(&report, user_id)?,
    };
    println!("{}", rendered);
    Ok(())
}

/// Load the history and run the detector
pub fn run_detect(
    file: &Path,
    input: Option<&str>,
    min_confidence: Option<f64>,
    config_path: Option<&Path>,
) -> Result<DetectionReport> {
    let format = input
        .map(|s| s.parse::<InputFormat>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()?;

    let mut config = load_config(config_path)?;
    if let Some(min) = min_confidence {
        if !(0.0..=1.0).contains(&min) {
            bail!("--min-confidence must be between 0 and 1");
        }
        config.min_confidence = min;
    }

    let expenses = load_expenses(file, format)
        .with_context(|| format!("Failed to load expenses from {}", file.display()))?;

    Ok(RecurringDetector::with_config(config).detect(&expenses))
}

/// Human-readable table of detected patterns
pub fn render_table(report: &DetectionReport) -> String {
    let mut out = String::new();

    out.push('\n');
    if report.patterns.is_empty() {
        out.push_str("No recurring expenses detected.\n");
    } else {
        out.push_str("🔁 Recurring Expenses\n");
        out.push_str("   ─────────────────────────────────────────────────────────────────────\n");
        for p in &report.patterns {
            let marker = if p.low_evidence { "?" } else { " " };
            out.push_str(&format!(
                "   {}{:22} │ {:>14.2} │ {:<14} │ {:>3.0}% │ next {}\n",
                marker,
                truncate(&p.display_name, 22),
                p.average_amount,
                p.frequency.to_string(),
                p.confidence * 100.0,
                p.next_expected
            ));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "   {} expenses read, {} skipped (malformed), {} excluded by category\n",
        report.expenses_seen, report.skipped, report.excluded
    ));
    out.push_str(&format!(
        "   {} candidate groups: {} too sparse, {} without a cadence",
        report.groups_formed, report.groups_discarded, report.groups_rejected
    ));
    out
}

/// Full report as pretty JSON
pub fn render_json(report: &DetectionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Patterns mapped to stored recurring-expense rows, as pretty JSON
pub fn render_records(report: &DetectionReport, user_id: i64) -> Result<String> {
    let records: Vec<_> = report
        .patterns
        .iter()
        .map(|p| p.to_recurring_expense(user_id))
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
