//! Input file readers for transactions, profiles and budgets

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{BudgetStatus, Category, Transaction, UserProfile};

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: Option<usize>,
    category: Option<usize>,
    amount: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: find("date").ok_or_else(|| Error::Import("Missing 'date' column".into()))?,
            description: find("description"),
            category: find("category"),
            amount: find("amount")
                .ok_or_else(|| Error::Import("Missing 'amount' column".into()))?,
        })
    }
}

/// Parse `date,description,category,amount` CSV (header required, any column order)
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        // Header is line 1
        let row = index + 2;
        let record = result?;

        let field = |i: usize| record.get(i).unwrap_or("");
        let date = parse_date(field(columns.date))
            .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?;
        let amount = parse_amount(field(columns.amount))
            .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?;
        let description = columns.description.map(field).unwrap_or("").to_string();
        let category = parse_category(columns.category.map(field).unwrap_or(""));

        transactions.push(Transaction::new(amount, category, description, date));
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Transaction as it appears in a JSON file
#[derive(Deserialize)]
struct RawTransaction {
    amount: f64,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    date: String,
}

/// Parse a JSON array of `{amount, category, description, date}` objects
pub fn parse_transactions_json<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let raw: Vec<RawTransaction> = serde_json::from_reader(reader)?;

    let transactions = raw
        .into_iter()
        .enumerate()
        .map(|(index, tx)| {
            let date = parse_date(&tx.date)
                .map_err(|e| Error::Import(format!("Entry {}: {}", index + 1, e)))?;
            if !tx.amount.is_finite() {
                return Err(Error::Import(format!("Entry {}: amount is not a number", index + 1)));
            }
            Ok(Transaction::new(
                tx.amount.abs(),
                parse_category(&tx.category),
                tx.description,
                date,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} JSON transactions", transactions.len());
    Ok(transactions)
}

/// Load transactions from a file, choosing the format by extension
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => parse_transactions_csv(file),
        Some("json") => parse_transactions_json(file),
        other => Err(Error::Import(format!(
            "Unsupported transaction file type: {}",
            other.unwrap_or("(none)")
        ))),
    }
}

/// Load a profile JSON object; missing fields take their defaults
pub fn load_profile_json(path: &Path) -> Result<UserProfile> {
    let profile: UserProfile = serde_json::from_reader(File::open(path)?)?;
    if profile.income.is_some_and(|i| i < 0.0) || profile.savings.is_some_and(|s| s < 0.0) {
        return Err(Error::InvalidData(
            "Income and savings must not be negative".into(),
        ));
    }
    Ok(profile)
}

/// Load a JSON array of budget statuses
pub fn load_budgets_json(path: &Path) -> Result<Vec<BudgetStatus>> {
    Ok(serde_json::from_reader(File::open(path)?)?)
}

/// Unknown or empty categories are filed under `other`
fn parse_category(s: &str) -> Category {
    s.parse().unwrap_or(Category::Other)
}

/// Parse RFC 3339, `YYYY-MM-DD` or `MM/DD/YYYY`; bare dates are midnight UTC
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&dt));
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount, tolerating currency symbols and thousands separators.
/// Negative amounts are taken as absolute spend.
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .map(f64::abs)
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("01/15/2024").unwrap(), expected);
        assert_eq!(
            parse_date("2024-01-15T09:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap()
        );
        assert!(parse_date("15th Jan").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-123.45").unwrap(), 123.45);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_csv() {
        let csv = "date,description,category,amount
2024-01-15,Groceries,food,\"$1,200.00\"
01/16/2024,Bus pass,transportation,-45
2024-01-17,Gift,presents,20";
        let txs = parse_transactions_csv(csv.as_bytes()).unwrap();

        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].amount, 1200.0);
        assert_eq!(txs[0].category, Category::Food);
        assert_eq!(txs[1].amount, 45.0);
        assert_eq!(txs[1].category, Category::Transport);
        assert_eq!(txs[2].category, Category::Other);
    }

    #[test]
    fn test_parse_csv_column_order_and_errors() {
        let csv = "amount,date,category\n10,2024-02-01,bills";
        let txs = parse_transactions_csv(csv.as_bytes()).unwrap();
        assert_eq!(txs[0].category, Category::Bills);
        assert_eq!(txs[0].description, "");

        let missing = "date,description\n2024-02-01,rent";
        assert!(matches!(
            parse_transactions_csv(missing.as_bytes()),
            Err(Error::Import(_))
        ));

        let bad_row = "date,description,category,amount\n2024-02-01,ok,food,5\nyesterday,bad,food,5";
        match parse_transactions_csv(bad_row.as_bytes()) {
            Err(Error::Import(msg)) => assert!(msg.starts_with("Row 3:"), "{}", msg),
            other => panic!("expected import error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"amount": 25.5, "category": "food", "description": "Lunch", "date": "2024-03-01T12:00:00Z"},
            {"amount": -10, "category": "unknown", "date": "2024-03-02"}
        ]"#;
        let txs = parse_transactions_json(json.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].category, Category::Food);
        assert_eq!(txs[1].amount, 10.0);
        assert_eq!(txs[1].category, Category::Other);

        let bad = r#"[{"amount": 1, "date": "soon"}]"#;
        assert!(matches!(
            parse_transactions_json(bad.as_bytes()),
            Err(Error::Import(_))
        ));
    }

    #[test]
    fn test_load_files() {
        let mut tx_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(tx_file, "date,description,category,amount").unwrap();
        writeln!(tx_file, "2024-01-15,Rent,bills,900").unwrap();
        let txs = load_transactions(tx_file.path()).unwrap();
        assert_eq!(txs[0].amount, 900.0);

        let txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(load_transactions(txt.path()).is_err());

        let mut profile_file = NamedTempFile::new().unwrap();
        write!(profile_file, r#"{{"income": 60000, "goals": ["House"]}}"#).unwrap();
        let profile = load_profile_json(profile_file.path()).unwrap();
        assert_eq!(profile.monthly_income(), Some(5000.0));
        assert_eq!(profile.currency, "$");

        let mut budget_file = NamedTempFile::new().unwrap();
        write!(
            budget_file,
            r#"[{{"category": "food", "limit": 400, "spent": 450, "state": "exceeded"}}]"#
        )
        .unwrap();
        let budgets = load_budgets_json(budget_file.path()).unwrap();
        assert_eq!(budgets[0].overage(), 50.0);
    }

    #[test]
    fn test_negative_profile_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"income": -1}}"#).unwrap();
        assert!(matches!(
            load_profile_json(file.path()),
            Err(Error::InvalidData(_))
        ));
    }
}
