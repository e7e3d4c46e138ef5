//! CSV ingestion adapter.
//!
//! Reads the transaction export with header
//! `typeofaction,sourceid,destinationid,amountofmoney,date,isfraud,typeoffraud`.
//! Dates are day-first. Action labels are coded through an [`ActionCodebook`]
//! built from every label in the file. Any malformed row fails the whole read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use mule_core::types::{AccountId, ActionCodebook, Amount, Transaction};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// A rejected row. `line` is 1-based and counts the header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct IngestionError {
    pub line: u64,
    pub reason: String,
}

impl IngestionError {
    fn new(line: u64, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Parsed batch plus the codebook its action codes refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedBatch {
    pub transactions: Vec<Transaction>,
    pub codebook: ActionCodebook,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    typeofaction: String,
    sourceid: String,
    destinationid: String,
    amountofmoney: String,
    date: String,
    isfraud: String,
    #[serde(default)]
    typeoffraud: Option<String>,
}

/// Parse a timestamp in any accepted layout. Date-only values are midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_fraud_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_fraud_type(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
}

pub fn read_transactions<R: Read>(reader: R) -> Result<IngestedBatch, IngestionError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| IngestionError::new(1, e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let fallback = i as u64 + 2;
        let record = record.map_err(|e| {
            let line = e.position().map_or(fallback, |p| p.line());
            IngestionError::new(line, e.to_string())
        })?;
        let line = record.position().map_or(fallback, |p| p.line());
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| IngestionError::new(line, e.to_string()))?;
        rows.push((line, row));
    }

    let codebook = ActionCodebook::from_labels(rows.iter().map(|(_, r)| r.typeofaction.as_str()));
    let transactions = rows
        .into_iter()
        .map(|(line, row)| to_transaction(line, row, &codebook))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        transactions = transactions.len(),
        action_types = codebook.len(),
        "ingested transaction batch"
    );
    Ok(IngestedBatch {
        transactions,
        codebook,
    })
}

pub fn read_transactions_path(path: &Path) -> Result<IngestedBatch, IngestionError> {
    let file = File::open(path)
        .map_err(|e| IngestionError::new(0, format!("{}: {e}", path.display())))?;
    read_transactions(file)
}

fn to_transaction(
    line: u64,
    row: CsvRow,
    codebook: &ActionCodebook,
) -> Result<Transaction, IngestionError> {
    let err = |reason: String| IngestionError::new(line, reason);

    let source = AccountId::new(&row.sourceid).map_err(|e| err(format!("sourceid: {e}")))?;
    let destination =
        AccountId::new(&row.destinationid).map_err(|e| err(format!("destinationid: {e}")))?;
    let value: f64 = row
        .amountofmoney
        .parse()
        .map_err(|_| err(format!("amountofmoney: not a number: {:?}", row.amountofmoney)))?;
    let amount = Amount::from_f64(value).map_err(|e| err(format!("amountofmoney: {e}")))?;
    let timestamp =
        parse_timestamp(&row.date).ok_or_else(|| err(format!("date: unparseable {:?}", row.date)))?;
    let is_fraud = parse_fraud_flag(&row.isfraud)
        .ok_or_else(|| err(format!("isfraud: expected 0/1, got {:?}", row.isfraud)))?;
    let action = codebook
        .code(&row.typeofaction)
        .ok_or_else(|| err(format!("typeofaction: unknown label {:?}", row.typeofaction)))?;

    let tx = Transaction::new(source, destination, amount, timestamp).with_action(action);
    Ok(if is_fraud {
        tx.with_fraud(parse_fraud_type(row.typeoffraud))
    } else {
        tx
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use mule_core::types::ActionCode;

    const HEADER: &str = "typeofaction,sourceid,destinationid,amountofmoney,date,isfraud,typeoffraud\n";

    fn read(body: &str) -> Result<IngestedBatch, IngestionError> {
        read_transactions(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_rows() {
        let batch = read(
            "transfer,30105,28942,494528.0,19/07/2019 14:40,1,type1\n\
             cash-in,30105,8692,494528.0,19/07/2019 14:41,0,none\n",
        )
        .unwrap();
        assert_eq!(batch.transactions.len(), 2);

        let first = &batch.transactions[0];
        assert_eq!(first.source.as_str(), "30105");
        assert_eq!(first.amount.as_f64(), 494528.0);
        assert!(first.is_fraud);
        assert_eq!(first.fraud_type.as_deref(), Some("type1"));
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2019, 7, 19)
                .unwrap()
                .and_hms_opt(14, 40, 0)
                .unwrap()
        );

        let second = &batch.transactions[1];
        assert!(!second.is_fraud);
        assert_eq!(second.fraud_type, None);
    }

    #[test]
    fn action_codes_are_lexicographic() {
        let batch = read(
            "transfer,1,2,1,01/01/2020,0,\n\
             cash-in,1,2,1,01/01/2020,0,\n\
             transfer,2,1,1,01/01/2020,0,\n",
        )
        .unwrap();
        assert_eq!(batch.codebook.len(), 2);
        assert_eq!(batch.transactions[0].action, ActionCode(1));
        assert_eq!(batch.transactions[1].action, ActionCode(0));
        assert_eq!(batch.codebook.label(ActionCode(1)), Some("transfer"));
    }

    #[test]
    fn header_only_is_empty_batch() {
        let batch = read("").unwrap();
        assert!(batch.transactions.is_empty());
        assert!(batch.codebook.is_empty());
    }

    #[test]
    fn day_first_dates() {
        let expect = NaiveDate::from_ymd_opt(2019, 2, 3).unwrap();
        assert_eq!(parse_timestamp("03/02/2019").unwrap().date(), expect);
        assert_eq!(parse_timestamp("03-02-2019 10:00").unwrap().date(), expect);
        assert_eq!(parse_timestamp("2019-02-03 10:00:00").unwrap().date(), expect);
        assert_eq!(parse_timestamp("03/02/2019 10:15:30").unwrap().time().to_string(), "10:15:30");
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("13/13/2019").is_none());
    }

    #[test]
    fn fraud_flags() {
        assert_eq!(parse_fraud_flag("1"), Some(true));
        assert_eq!(parse_fraud_flag("TRUE"), Some(true));
        assert_eq!(parse_fraud_flag("0"), Some(false));
        assert_eq!(parse_fraud_flag("2"), None);
        assert_eq!(parse_fraud_type(Some("None".into())), None);
        assert_eq!(parse_fraud_type(Some(" ".into())), None);
        assert_eq!(parse_fraud_type(Some("type2".into())).as_deref(), Some("type2"));
    }

    #[test]
    fn bad_amount_reports_line() {
        let err = read("transfer,1,2,1,01/01/2020,0,\ntransfer,1,2,-5,01/01/2020,0,\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.reason.contains("amountofmoney"));
    }

    #[test]
    fn large_amount_accepted() {
        let batch = read("transfer,1,2,5000000000000,01/01/2020,0,\ntransfer,2,1,1,01/01/2020,0,\n")
            .unwrap();
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(batch.transactions[0].amount.as_f64(), 5.0e12);
    }

    #[test]
    fn bad_date_and_blank_id_rejected() {
        let err = read("transfer,1,2,1,someday,0,\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.reason.contains("date"));

        let err = read("transfer, ,2,1,01/01/2020,0,\n").unwrap_err();
        assert!(err.reason.contains("sourceid"));
    }

    #[test]
    fn bad_fraud_flag_rejected() {
        let err = read("transfer,1,2,1,01/01/2020,yes,\n").unwrap_err();
        assert!(err.reason.contains("isfraud"));
    }

    #[test]
    fn reads_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}transfer,1,2,10.5,01/01/2020 09:00,0,").unwrap();
        let batch = read_transactions_path(file.path()).unwrap();
        assert_eq!(batch.transactions.len(), 1);
        assert_eq!(batch.transactions[0].amount.as_f64(), 10.5);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(read_transactions_path(Path::new("/nonexistent/ml.csv")).is_err());
    }
}
