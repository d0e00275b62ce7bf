//! Expense history loading
//!
//! Reads exported expense histories from CSV (header row required) or JSON
//! (array of expense objects). Dates are kept as text: an unparseable date
//! is not a load error, the detector skips and counts that record instead.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Expense;

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Detect format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown input format: {} (use csv or json)", other)),
        }
    }
}

/// Load an expense history, detecting the format from the extension
pub fn load_expenses(path: &Path, format: Option<InputFormat>) -> Result<Vec<Expense>> {
    let format = format.or_else(|| InputFormat::from_path(path)).ok_or_else(|| {
        Error::Import(format!(
            "Cannot tell format of {} (expected .csv or .json)",
            path.display()
        ))
    })?;

    let reader = BufReader::new(File::open(path)?);
    let expenses = match format {
        InputFormat::Csv => parse_csv(reader)?,
        InputFormat::Json => parse_json(reader)?,
    };

    debug!(
        "Loaded {} expenses from {} ({})",
        expenses.len(),
        path.display(),
        format.as_str()
    );
    Ok(expenses)
}

/// Column positions resolved from the header row
struct Columns {
    id: Option<usize>,
    user_id: Option<usize>,
    merchant: usize,
    category: Option<usize>,
    amount: usize,
    currency: Option<usize>,
    date: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                names.iter().any(|n| *n == h)
            })
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| Error::Import(format!("Missing column: {}", names[0])))
        };

        Ok(Self {
            id: find(&["id"]),
            user_id: find(&["user_id"]),
            merchant: require(&["merchant", "description"])?,
            category: find(&["category"]),
            amount: require(&["amount"])?,
            currency: find(&["currency"]),
            date: require(&["transaction_date", "date"])?,
        })
    }
}

fn optional_text(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_int(record: &StringRecord, column: Option<usize>, row: usize) -> Result<Option<i64>> {
    optional_text(record, column)
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Import(format!("Row {}: invalid integer {:?}", row, s)))
        })
        .transpose()
}

/// Parse a CSV expense history
///
/// Required columns: `merchant`, `amount`, `transaction_date` (or `date`).
/// Optional: `id`, `user_id`, `category`, `currency`. Header names are
/// matched case-insensitively; a missing `id` falls back to the row number.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Expense>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut expenses = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;

        let merchant = record
            .get(columns.merchant)
            .map(str::trim)
            .ok_or_else(|| Error::Import(format!("Row {}: missing merchant", row)))?
            .to_string();

        let amount_str = record
            .get(columns.amount)
            .ok_or_else(|| Error::Import(format!("Row {}: missing amount", row)))?;
        let amount = parse_amount(amount_str)
            .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?;

        let transaction_date = record.get(columns.date).unwrap_or("").to_string();

        expenses.push(Expense {
            id: optional_int(&record, columns.id, row)?.unwrap_or(row as i64),
            user_id: optional_int(&record, columns.user_id, row)?.unwrap_or(0),
            merchant,
            category: optional_text(&record, columns.category),
            amount,
            currency: optional_text(&record, columns.currency),
            transaction_date,
        });
    }

    debug!("Parsed {} CSV expenses", expenses.len());
    Ok(expenses)
}

/// Parse a JSON array of expense objects
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<Expense>> {
    let expenses: Vec<Expense> = serde_json::from_reader(reader)?;
    debug!("Parsed {} JSON expenses", expenses.len());
    Ok(expenses)
}

/// Parse an amount string, handling currency symbols and separators
///
/// Accounting-style parentheses mark negatives: "(1,234.50)" is -1234.5.
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' ', '€', '£'], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::InvalidData(format!("Unable to parse amount: {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("260000").unwrap(), 260_000.0);
        assert_eq!(parse_amount("(15.99)").unwrap(), -15.99);
        assert_eq!(parse_amount(" -42 ").unwrap(), -42.0);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_csv() {
        let data = "\
id,user_id,merchant,category,amount,currency,transaction_date
1,7,Netflix,Entertainment,260000,IDR,2024-01-05
2,7,Netflix,,\"260,000\",,2024-02-05
";
        let expenses = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 2);

        assert_eq!(expenses[0].id, 1);
        assert_eq!(expenses[0].user_id, 7);
        assert_eq!(expenses[0].merchant, "Netflix");
        assert_eq!(expenses[0].category.as_deref(), Some("Entertainment"));
        assert_eq!(expenses[0].currency.as_deref(), Some("IDR"));
        assert_eq!(expenses[0].transaction_date, "2024-01-05");

        assert_eq!(expenses[1].amount, 260_000.0);
        assert_eq!(expenses[1].category, None);
        assert_eq!(expenses[1].currency, None);
    }

    #[test]
    fn test_parse_csv_minimal_columns() {
        let data = "Date,Merchant,Amount\n01/15/2024,Spotify,54990\n";
        let expenses = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, 1);
        assert_eq!(expenses[0].user_id, 0);
        assert_eq!(expenses[0].transaction_date, "01/15/2024");
    }

    #[test]
    fn test_parse_csv_keeps_bad_dates() {
        let data = "merchant,amount,transaction_date\nGym,150000,not-a-date\n";
        let expenses = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses[0].transaction_date, "not-a-date");
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let data = "merchant,transaction_date\nGym,2024-01-01\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_parse_csv_bad_amount_reports_row() {
        let data = "merchant,amount,transaction_date\nGym,150000,2024-01-01\nGym,lots,2024-02-01\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Row 2"), "{}", err);
    }

    #[test]
    fn test_parse_json() {
        let data = r#"[
            {"id": 1, "user_id": 3, "merchant": "Netflix", "amount": 260000, "currency": "IDR", "transaction_date": "2024-01-05"},
            {"merchant": "Netflix", "amount": 260000, "transaction_date": "2024-02-05"}
        ]"#;
        let expenses = parse_json(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].user_id, 3);
        assert_eq!(expenses[1].id, 0);
    }

    #[test]
    fn test_input_format() {
        assert_eq!(
            InputFormat::from_path(Path::new("history.CSV")),
            Some(InputFormat::Csv)
        );
        assert_eq!(
            InputFormat::from_path(Path::new("history.json")),
            Some(InputFormat::Json)
        );
        assert_eq!(InputFormat::from_path(Path::new("history.txt")), None);
        assert_eq!("JSON".parse::<InputFormat>(), Ok(InputFormat::Json));
        assert!("xml".parse::<InputFormat>().is_err());
    }

    #[test]
    fn test_load_expenses_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "merchant,amount,date\nGym,150000,2024-01-01\n").unwrap();

        let expenses = load_expenses(&path, None).unwrap();
        assert_eq!(expenses.len(), 1);

        let unknown = dir.path().join("history.dat");
        std::fs::write(&unknown, "").unwrap();
        assert!(load_expenses(&unknown, None).is_err());
        assert!(load_expenses(&unknown, Some(InputFormat::Csv)).is_err());
    }
}
