use super::normalizer::normalize_header;
use super::FmvImportError;
use crate::fmv::compensation::try_parse_amount;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct ParsedRow<T> {
    pub(crate) line: u64,
    pub(crate) row: T,
}

/// Read a headed CSV, rewrite every header through `canonical` and deserialize each record
/// into `T`. Fails before reading any record when a required column is absent.
pub(crate) fn parse_rows<R, T, F>(
    reader: R,
    required: &[&str],
    canonical: F,
) -> Result<Vec<ParsedRow<T>>, FmvImportError>
where
    R: Read,
    T: DeserializeOwned,
    F: Fn(&str) -> String,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: StringRecord = csv_reader
        .headers()?
        .iter()
        .map(|header| canonical(&normalize_header(header)))
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| (*column).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FmvImportError::MissingColumns(missing));
    }
    csv_reader.set_headers(headers.clone());

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or_default();
        let row = record.deserialize(Some(&headers))?;
        rows.push(ParsedRow { line, row });
    }

    Ok(rows)
}

/// Numeric cell: empty means zero, anything unparseable is rejected with its location.
pub(crate) fn amount(line: u64, column: &str, raw: Option<&str>) -> Result<f64, FmvImportError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };

    try_parse_amount(raw).ok_or_else(|| FmvImportError::InvalidNumber {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Debug, Deserialize)]
    struct Pair {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        name: Option<String>,
        #[serde(default, deserialize_with = "empty_string_as_none")]
        amount: Option<String>,
    }

    #[test]
    fn rows_carry_their_source_line() {
        let rows: Vec<ParsedRow<Pair>> = parse_rows(
            Cursor::new(" Name , Amount\nfirst, 10\nsecond,\n"),
            &["name", "amount"],
            |header| header.to_string(),
        )
        .expect("parses");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].row.name.as_deref(), Some("first"));
        assert_eq!(rows[1].line, 3);
        assert!(rows[1].row.amount.is_none());
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let error = parse_rows::<_, Pair, _>(Cursor::new("other\nx\n"), &["name", "amount"], |h| {
            h.to_string()
        })
        .expect_err("missing columns");

        match error {
            FmvImportError::MissingColumns(columns) => {
                assert_eq!(columns, vec!["name".to_string(), "amount".to_string()]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn amount_rejects_text_and_accepts_currency() {
        assert_eq!(amount(2, "base_pay", Some("$1,250.50")).expect("parses"), 1_250.5);
        assert_eq!(amount(2, "base_pay", None).expect("empty"), 0.0);
        let error = amount(7, "base_pay", Some("n/a")).expect_err("rejects");
        assert!(matches!(
            error,
            FmvImportError::InvalidNumber { line: 7, ref column, ref value }
                if column == "base_pay" && value == "n/a"
        ));
    }
}
