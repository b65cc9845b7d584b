use serde::{Deserialize, Serialize};

/// One percentile marker within a specialty survey, e.g. p50 TCC = 333,779.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub value: f64,
    pub percentile: f64,
}

pub const BENCHMARK_PERCENTILES: [f64; 4] = [25.0, 50.0, 75.0, 90.0];

/// Market-survey row for a single specialty as uploaded by the user.
///
/// Numeric columns that were absent from the source default to zero; callers filter rows
/// where every value is zero before building benchmarks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataRow {
    pub specialty: String,
    pub p25_total: f64,
    pub p50_total: f64,
    pub p75_total: f64,
    pub p90_total: f64,
    pub p25_wrvu: f64,
    pub p50_wrvu: f64,
    pub p75_wrvu: f64,
    pub p90_wrvu: f64,
    pub p25_cf: f64,
    pub p50_cf: f64,
    pub p75_cf: f64,
    pub p90_cf: f64,
}

impl MarketDataRow {
    pub fn total_cash_values(&self) -> [f64; 4] {
        [self.p25_total, self.p50_total, self.p75_total, self.p90_total]
    }

    pub fn wrvu_values(&self) -> [f64; 4] {
        [self.p25_wrvu, self.p50_wrvu, self.p75_wrvu, self.p90_wrvu]
    }

    pub fn conversion_factor_values(&self) -> [f64; 4] {
        [self.p25_cf, self.p50_cf, self.p75_cf, self.p90_cf]
    }

    /// True when the row carries no benchmark data at all.
    pub fn is_empty(&self) -> bool {
        self.total_cash_values()
            .iter()
            .chain(self.wrvu_values().iter())
            .chain(self.conversion_factor_values().iter())
            .all(|value| *value == 0.0)
    }

    pub fn matches_specialty(&self, specialty: &str) -> bool {
        self.specialty.trim().eq_ignore_ascii_case(specialty.trim())
    }
}

/// The three independent benchmark sets derived from one market row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTable {
    pub specialty: String,
    pub total_cash: Vec<BenchmarkPoint>,
    pub wrvus: Vec<BenchmarkPoint>,
    pub conversion_factor: Vec<BenchmarkPoint>,
}

impl BenchmarkTable {
    pub fn from_row(row: &MarketDataRow) -> Self {
        Self {
            specialty: row.specialty.clone(),
            total_cash: points(row.total_cash_values()),
            wrvus: points(row.wrvu_values()),
            conversion_factor: points(row.conversion_factor_values()),
        }
    }
}

fn points(values: [f64; 4]) -> Vec<BenchmarkPoint> {
    values
        .into_iter()
        .zip(BENCHMARK_PERCENTILES)
        .map(|(value, percentile)| BenchmarkPoint {
            value: if value.is_finite() { value } else { 0.0 },
            percentile,
        })
        .collect()
}

/// Locate the market row for a specialty (case-insensitive) and build its benchmarks.
pub fn benchmarks_for(rows: &[MarketDataRow], specialty: &str) -> Option<BenchmarkTable> {
    rows.iter()
        .filter(|row| !row.is_empty())
        .find(|row| row.matches_specialty(specialty))
        .map(BenchmarkTable::from_row)
}
