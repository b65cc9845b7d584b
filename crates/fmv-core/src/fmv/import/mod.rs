//! CSV ingest for market surveys and employee compensation exports.
//!
//! Both importers are all-or-nothing: the first structural or numeric problem aborts the file
//! and no rows are returned.

mod aliases;
mod normalizer;
mod parser;

use crate::fmv::benchmark::MarketDataRow;
use crate::fmv::compensation::CompensationComponents;
use parser::{amount, empty_string_as_none, parse_rows};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum FmvImportError {
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
    #[error("line {line}: column '{column}' must not be empty")]
    MissingValue { line: u64, column: String },
}

pub const MARKET_COLUMNS: [&str; 13] = [
    "specialty",
    "p25_total",
    "p50_total",
    "p75_total",
    "p90_total",
    "p25_wrvu",
    "p50_wrvu",
    "p75_wrvu",
    "p90_wrvu",
    "p25_cf",
    "p50_cf",
    "p75_cf",
    "p90_cf",
];

pub const EMPLOYEE_REQUIRED_COLUMNS: [&str; 8] = [
    "employee_id",
    "full_name",
    "specialty",
    "base_pay",
    "wrvu_incentive",
    "quality_payments",
    "admin_payments",
    "annual_wrvus",
];

pub struct MarketDataImporter;

impl MarketDataImporter {
    /// Parse a market survey. Rows without any benchmark values are dropped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MarketDataRow>, FmvImportError> {
        let parsed = parse_rows::<_, RawMarketRow, _>(reader, &MARKET_COLUMNS, |header: &str| {
            header.to_string()
        })?;
        let total = parsed.len();

        let mut rows = Vec::with_capacity(total);
        for parsed_row in parsed {
            let row = parsed_row.row.into_market_row(parsed_row.line)?;
            if !row.is_empty() {
                rows.push(row);
            }
        }

        debug!(total, kept = rows.len(), "parsed market data");
        Ok(rows)
    }
}

#[derive(Debug, Deserialize)]
struct RawMarketRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    specialty: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p25_total: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p50_total: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p75_total: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p90_total: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p25_wrvu: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p50_wrvu: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p75_wrvu: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p90_wrvu: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p25_cf: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p50_cf: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p75_cf: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    p90_cf: Option<String>,
}

impl RawMarketRow {
    fn into_market_row(self, line: u64) -> Result<MarketDataRow, FmvImportError> {
        let cell = |column: &str, raw: &Option<String>| amount(line, column, raw.as_deref());

        Ok(MarketDataRow {
            p25_total: cell("p25_total", &self.p25_total)?,
            p50_total: cell("p50_total", &self.p50_total)?,
            p75_total: cell("p75_total", &self.p75_total)?,
            p90_total: cell("p90_total", &self.p90_total)?,
            p25_wrvu: cell("p25_wrvu", &self.p25_wrvu)?,
            p50_wrvu: cell("p50_wrvu", &self.p50_wrvu)?,
            p75_wrvu: cell("p75_wrvu", &self.p75_wrvu)?,
            p90_wrvu: cell("p90_wrvu", &self.p90_wrvu)?,
            p25_cf: cell("p25_cf", &self.p25_cf)?,
            p50_cf: cell("p50_cf", &self.p50_cf)?,
            p75_cf: cell("p75_cf", &self.p75_cf)?,
            p90_cf: cell("p90_cf", &self.p90_cf)?,
            specialty: self.specialty.unwrap_or_default(),
        })
    }
}

/// One provider's compensation line from the employee export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub full_name: String,
    pub specialty: String,
    pub base_pay: f64,
    pub wrvu_incentive: f64,
    pub quality_payments: f64,
    pub admin_payments: f64,
    pub annual_wrvus: f64,
    pub conversion_factor: f64,
    pub call_pay: f64,
}

impl EmployeeRecord {
    pub fn components(&self) -> CompensationComponents {
        CompensationComponents {
            base_total: self.base_pay,
            productivity_total: self.wrvu_incentive,
            call_total: self.call_pay,
            admin_total: self.admin_payments,
            quality_total: self.quality_payments,
        }
    }
}

pub struct EmployeeImporter;

impl EmployeeImporter {
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<EmployeeRecord>, FmvImportError> {
        let parsed = parse_rows::<_, RawEmployeeRow, _>(
            reader,
            &EMPLOYEE_REQUIRED_COLUMNS,
            aliases::canonical_employee_column,
        )?;

        let employees = parsed
            .into_iter()
            .map(|parsed_row| parsed_row.row.into_record(parsed_row.line))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = employees.len(), "parsed employee data");
        Ok(employees)
    }
}

#[derive(Debug, Deserialize)]
struct RawEmployeeRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    employee_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    specialty: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    base_pay: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    wrvu_incentive: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    quality_payments: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    admin_payments: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    annual_wrvus: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    conversion_factor: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    call_pay: Option<String>,
}

impl RawEmployeeRow {
    fn into_record(self, line: u64) -> Result<EmployeeRecord, FmvImportError> {
        let cell = |column: &str, raw: &Option<String>| amount(line, column, raw.as_deref());

        let base_pay = cell("base_pay", &self.base_pay)?;
        let wrvu_incentive = cell("wrvu_incentive", &self.wrvu_incentive)?;
        let quality_payments = cell("quality_payments", &self.quality_payments)?;
        let admin_payments = cell("admin_payments", &self.admin_payments)?;
        let annual_wrvus = cell("annual_wrvus", &self.annual_wrvus)?;
        let conversion_factor = cell("conversion_factor", &self.conversion_factor)?;
        let call_pay = cell("call_pay", &self.call_pay)?;

        let employee_id = self.employee_id.ok_or_else(|| FmvImportError::MissingValue {
            line,
            column: "employee_id".to_string(),
        })?;

        Ok(EmployeeRecord {
            employee_id,
            full_name: self.full_name.unwrap_or_default(),
            specialty: self.specialty.unwrap_or_default(),
            base_pay,
            wrvu_incentive,
            quality_payments,
            admin_payments,
            annual_wrvus,
            conversion_factor,
            call_pay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MARKET_CSV: &str = "\u{feff}Specialty,P25 Total,P50 Total,P75 Total,P90 Total,P25 wRVU,P50 wRVU,P75 wRVU,P90 wRVU,P25 CF,P50 CF,P75 CF,P90 CF\n\
Cardiology,286364,333779,391588,462010,3259,4321,5577,7591,64.20,79.20,105.60,145.20\n\
Placeholder,0,0,0,0,0,0,0,0,0,0,0,0\n";

    #[test]
    fn market_import_normalizes_headers_and_drops_empty_rows() {
        let rows = MarketDataImporter::from_reader(Cursor::new(MARKET_CSV)).expect("imports");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].specialty, "Cardiology");
        assert_eq!(rows[0].p50_total, 333_779.0);
        assert_eq!(rows[0].p90_cf, 145.20);
    }

    #[test]
    fn market_import_reports_missing_columns() {
        let error = MarketDataImporter::from_reader(Cursor::new("specialty,p25_total\nX,1\n"))
            .expect_err("missing columns");
        match error {
            FmvImportError::MissingColumns(columns) => {
                assert_eq!(columns.len(), 11);
                assert!(columns.contains(&"p90_cf".to_string()));
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn market_import_rejects_ragged_rows() {
        let csv = format!("{}\nCardiology,1,2\n", MARKET_COLUMNS.join(","));
        let error = MarketDataImporter::from_reader(Cursor::new(csv)).expect_err("ragged row");
        assert!(matches!(error, FmvImportError::Csv(_)));
    }

    #[test]
    fn market_import_points_at_bad_cells() {
        let csv = format!(
            "{}\nCardiology,1,2,3,4,5,6,7,8,9,ten,11,12\n",
            MARKET_COLUMNS.join(",")
        );
        let error = MarketDataImporter::from_reader(Cursor::new(csv)).expect_err("bad number");
        match error {
            FmvImportError::InvalidNumber {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, "p50_cf");
                assert_eq!(value, "ten");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
    }

    #[test]
    fn employee_import_resolves_aliases_and_optional_columns() {
        let csv = "Provider ID,Provider Name,Speciality,Base Salary,Incentive,Quality,Admin,wRVUs\n\
E100,Dana Whitfield,Cardiology,\"$302,024\",\"72,872\",28452,4598,4321\n";
        let employees = EmployeeImporter::from_reader(Cursor::new(csv)).expect("imports");
        assert_eq!(employees.len(), 1);

        let employee = &employees[0];
        assert_eq!(employee.employee_id, "E100");
        assert_eq!(employee.full_name, "Dana Whitfield");
        assert_eq!(employee.base_pay, 302_024.0);
        assert_eq!(employee.wrvu_incentive, 72_872.0);
        assert_eq!(employee.conversion_factor, 0.0);
        assert_eq!(employee.call_pay, 0.0);
        assert_eq!(employee.components().total(), 407_946.0);
    }

    #[test]
    fn employee_import_requires_an_id() {
        let csv = format!(
            "{}\n,Nameless,Cardiology,1,2,3,4,5\n",
            EMPLOYEE_REQUIRED_COLUMNS.join(",")
        );
        let error = EmployeeImporter::from_reader(Cursor::new(csv)).expect_err("missing id");
        assert!(matches!(error, FmvImportError::MissingValue { line: 2, .. }));
    }
}
