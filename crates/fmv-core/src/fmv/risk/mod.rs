//! Rule-based FMV risk scoring.
//!
//! Scoring is a two-stage, side-effect free pipeline. Each category's rule turns the context
//! into a raw score, the category thresholds convert that into points and a risk level, and the
//! points are summed and banded into an overall level and severity.

pub mod config;
pub mod context;
mod rules;

pub use config::{
    select_band, select_threshold, ConfigValidationError, RiskBand, RiskCategory, RiskLevel,
    RiskRule, RiskScoringConfig, RiskThreshold, Severity, SeverityBands,
};
pub use context::{
    BusinessCase, CompensationPercentiles, ComplianceFlags, DocumentationStatus, Level,
    MarketConditions, PracticeMetrics, ProgramFacts, ProviderProfile, RiskAssessmentInput,
    RiskFactorContext,
};

use serde::{Deserialize, Serialize};

/// Evaluated result for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category_id: String,
    pub category: String,
    pub raw_score: u8,
    pub score: u8,
    pub risk_level: RiskLevel,
    pub description: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub high_risk_factors: usize,
    pub medium_risk_factors: usize,
    pub low_risk_factors: usize,
    pub max_possible_score: u32,
    /// `total_score / max_possible_score`, zero when nothing can score.
    pub score_ratio: f64,
    pub tcc_percentile: f64,
    pub wrvu_percentile: f64,
    pub conversion_factor_percentile: f64,
}

/// Aggregate result of one evaluation. Rebuilt on every recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub factors: Vec<RiskFactor>,
    pub total_score: u32,
    pub overall_risk: RiskLevel,
    pub summary: String,
    pub metrics: RiskMetrics,
    pub severity: Severity,
    pub contextual_factors: Vec<String>,
}

/// Score a single category against the context.
pub fn evaluate_category(category: &RiskCategory, context: &RiskFactorContext) -> RiskFactor {
    let raw_score = rules::raw_score(category.rule, context);
    let (points, risk_level) = category
        .threshold_for(f64::from(raw_score))
        .map(|threshold| (threshold.points.min(config::MAX_FACTOR_POINTS), threshold.risk))
        .unwrap_or((0, RiskLevel::Low));

    RiskFactor {
        category_id: category.id.clone(),
        category: category.name.clone(),
        raw_score,
        score: points,
        risk_level,
        description: category.description.clone(),
        findings: rules::findings(category.rule, context),
        recommendations: rules::recommendations(category.rule, points, context),
    }
}

/// Evaluate every configured category and aggregate into an overall analysis.
pub fn analyze_risk(context: &RiskFactorContext, config: &RiskScoringConfig) -> RiskAnalysis {
    let factors: Vec<RiskFactor> = config
        .categories
        .iter()
        .map(|category| evaluate_category(category, context))
        .collect();

    let total_score: u32 = factors.iter().map(|factor| u32::from(factor.score)).sum();
    let overall_risk = select_band(&config.overall_bands, f64::from(total_score));
    let severity = config.severity_bands.classify(f64::from(total_score));

    let count_at = |level: RiskLevel| {
        factors
            .iter()
            .filter(|factor| factor.risk_level == level)
            .count()
    };
    let max_possible_score = config.max_possible_score();
    let metrics = RiskMetrics {
        high_risk_factors: count_at(RiskLevel::High),
        medium_risk_factors: count_at(RiskLevel::Medium),
        low_risk_factors: count_at(RiskLevel::Low),
        max_possible_score,
        score_ratio: if max_possible_score > 0 {
            f64::from(total_score) / f64::from(max_possible_score)
        } else {
            0.0
        },
        tcc_percentile: context.compensation.tcc,
        wrvu_percentile: context.compensation.wrvu,
        conversion_factor_percentile: context.compensation.conversion_factor,
    };

    let summary = summarize(&factors, total_score, overall_risk, severity, max_possible_score);

    RiskAnalysis {
        factors,
        total_score,
        overall_risk,
        summary,
        metrics,
        severity,
        contextual_factors: context.contextual_factors(),
    }
}

fn summarize(
    factors: &[RiskFactor],
    total_score: u32,
    overall_risk: RiskLevel,
    severity: Severity,
    max_possible_score: u32,
) -> String {
    let mut summary = format!(
        "Overall {} FMV risk ({} severity): {} of {} points across {} categories",
        overall_risk.label(),
        severity.label(),
        total_score,
        max_possible_score,
        factors.len()
    );

    let high: Vec<&str> = factors
        .iter()
        .filter(|factor| factor.risk_level == RiskLevel::High)
        .map(|factor| factor.category.as_str())
        .collect();
    if !high.is_empty() {
        summary.push_str(&format!("; high risk in {}", high.join(", ")));
    }

    summary
}
