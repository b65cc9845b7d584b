//! Maps a raw compensation or productivity value onto a percentile position.
//!
//! Two policies exist for the same question. `Interpolated` scales linearly between the
//! benchmark knots; `RankBased` only counts how many knots sit strictly below the value and
//! ignores magnitude. A deployment picks one strategy and applies it to every percentile in an
//! analysis; results from the two policies are not comparable.

use super::benchmark::BenchmarkPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentileStrategy {
    #[default]
    Interpolated,
    RankBased,
}

impl PercentileStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "interpolated" | "interpolate" | "linear" => Some(Self::Interpolated),
            "rank" | "rank_based" | "rank-based" => Some(Self::RankBased),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Interpolated => "interpolated",
            Self::RankBased => "rank_based",
        }
    }

    pub fn percentile_of(self, value: f64, benchmarks: &[BenchmarkPoint]) -> f64 {
        match self {
            Self::Interpolated => percentile_of(value, benchmarks),
            Self::RankBased => rank_percentile(value, benchmarks),
        }
    }
}

/// Linear interpolation against the benchmark knots.
///
/// Values at or below the smallest knot are scaled proportionally toward zero rather than
/// floored at the smallest percentile; values at or above the largest knot are capped at the
/// largest percentile.
pub fn percentile_of(value: f64, benchmarks: &[BenchmarkPoint]) -> f64 {
    let value = finite_or_zero(value);
    let sorted = sorted_by_value(benchmarks);

    let (Some(smallest), Some(largest)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };

    if value <= smallest.value {
        if smallest.value <= 0.0 {
            return 0.0;
        }
        return smallest.percentile * (value / smallest.value);
    }

    if value >= largest.value {
        return largest.percentile;
    }

    for pair in sorted.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if lower.value <= value && value <= upper.value {
            let span = upper.value - lower.value;
            if span <= 0.0 {
                return upper.percentile;
            }
            return lower.percentile
                + (value - lower.value) * (upper.percentile - lower.percentile) / span;
        }
    }

    largest.percentile
}

/// Coarse rank policy: share of knots strictly below `value`, as a percentage.
pub fn rank_percentile(value: f64, benchmarks: &[BenchmarkPoint]) -> f64 {
    if benchmarks.is_empty() {
        return 0.0;
    }

    let value = finite_or_zero(value);
    let rank = benchmarks
        .iter()
        .filter(|point| point.value < value)
        .count();

    (rank as f64 / benchmarks.len() as f64) * 100.0
}

fn sorted_by_value(benchmarks: &[BenchmarkPoint]) -> Vec<BenchmarkPoint> {
    let mut sorted: Vec<BenchmarkPoint> = benchmarks
        .iter()
        .copied()
        .filter(|point| point.value.is_finite() && point.percentile.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    sorted
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
