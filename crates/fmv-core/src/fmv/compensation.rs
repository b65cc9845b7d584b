use serde::{Deserialize, Serialize};

/// Additive breakdown of a provider's total cash compensation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationComponents {
    pub base_total: f64,
    pub productivity_total: f64,
    pub call_total: f64,
    pub admin_total: f64,
    pub quality_total: f64,
}

impl CompensationComponents {
    /// Copy with every field forced to a finite, non-negative amount.
    pub fn sanitized(&self) -> Self {
        Self {
            base_total: non_negative(self.base_total),
            productivity_total: non_negative(self.productivity_total),
            call_total: non_negative(self.call_total),
            admin_total: non_negative(self.admin_total),
            quality_total: non_negative(self.quality_total),
        }
    }

    pub fn total(&self) -> f64 {
        let clean = self.sanitized();
        clean.base_total
            + clean.productivity_total
            + clean.call_total
            + clean.admin_total
            + clean.quality_total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompensationSummary {
    pub components: CompensationComponents,
    pub total: f64,
    /// Total compensation per productivity unit (per wRVU); zero when no units were recorded.
    pub per_unit: f64,
}

/// Sum the components and derive the per-unit rate.
///
/// Malformed amounts contribute zero instead of failing the calculation.
pub fn aggregate(components: &CompensationComponents, productivity_units: f64) -> CompensationSummary {
    let components = components.sanitized();
    let total = components.total();
    let units = non_negative(productivity_units);
    let per_unit = if units > 0.0 { total / units } else { 0.0 };

    CompensationSummary {
        components,
        total,
        per_unit: non_negative(per_unit),
    }
}

/// Lenient amount parser for form and CSV text: `$1,250.50` parses, garbage becomes zero.
pub fn parse_amount(raw: &str) -> f64 {
    try_parse_amount(raw).map(non_negative).unwrap_or(0.0)
}

/// Strict variant used by importers that must reject non-numeric cells.
/// Empty input yields `Some(0.0)`.
pub(crate) fn try_parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '$' | ',' | ' ' | '\u{a0}'))
        .collect();

    if cleaned.is_empty() {
        return Some(0.0);
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
