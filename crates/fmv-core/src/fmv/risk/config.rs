use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Risk label attached to thresholds, factors and the overall analysis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Four-way severity derived from the total score through `SeverityBands`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// `max` is inclusive: a raw score equal to `max` selects this threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThreshold {
    pub max: f64,
    pub points: u8,
    pub risk: RiskLevel,
}

/// Built-in evaluators a category can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    CompensationLevel,
    ProductivityAlignment,
    MarketJustification,
    ProviderQualifications,
    RegulatoryCompliance,
    Documentation,
    BusinessCase,
}

impl RiskRule {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::CompensationLevel,
            Self::ProductivityAlignment,
            Self::MarketJustification,
            Self::ProviderQualifications,
            Self::RegulatoryCompliance,
            Self::Documentation,
            Self::BusinessCase,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::CompensationLevel => "compensation_structure",
            Self::ProductivityAlignment => "productivity_alignment",
            Self::MarketJustification => "market_factors",
            Self::ProviderQualifications => "provider_qualifications",
            Self::RegulatoryCompliance => "regulatory_compliance",
            Self::Documentation => "documentation",
            Self::BusinessCase => "business_case",
        }
    }

    pub const fn default_name(self) -> &'static str {
        match self {
            Self::CompensationLevel => "Compensation Structure",
            Self::ProductivityAlignment => "Productivity Alignment",
            Self::MarketJustification => "Market Factors",
            Self::ProviderQualifications => "Provider Qualifications",
            Self::RegulatoryCompliance => "Regulatory Compliance",
            Self::Documentation => "Documentation",
            Self::BusinessCase => "Business Case",
        }
    }

    pub const fn default_description(self) -> &'static str {
        match self {
            Self::CompensationLevel => {
                "Position of total cash compensation and conversion factor against market benchmarks"
            }
            Self::ProductivityAlignment => {
                "Whether compensation tracks personally performed work and quality outcomes"
            }
            Self::MarketJustification => {
                "Market demand, competition and recruitment conditions supporting elevated pay"
            }
            Self::ProviderQualifications => {
                "Experience, certifications and skills justifying above-market compensation"
            }
            Self::RegulatoryCompliance => {
                "Stark Law and Anti-Kickback review status and referral relationships"
            }
            Self::Documentation => "Completeness of the FMV file supporting the arrangement",
            Self::BusinessCase => "Return on investment and strategic justification",
        }
    }
}

/// A named risk dimension and the thresholds that convert its raw score into points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule: RiskRule,
    pub thresholds: Vec<RiskThreshold>,
}

impl RiskCategory {
    pub fn standard(rule: RiskRule) -> Self {
        Self {
            id: rule.key().to_string(),
            name: rule.default_name().to_string(),
            description: rule.default_description().to_string(),
            rule,
            thresholds: standard_thresholds(),
        }
    }

    pub fn threshold_for(&self, raw_score: f64) -> Option<&RiskThreshold> {
        select_threshold(&self.thresholds, raw_score)
    }

    pub fn max_points(&self) -> u8 {
        self.thresholds
            .iter()
            .map(|threshold| threshold.points)
            .max()
            .unwrap_or(0)
    }
}

fn standard_thresholds() -> Vec<RiskThreshold> {
    vec![
        RiskThreshold {
            max: 0.0,
            points: 0,
            risk: RiskLevel::Low,
        },
        RiskThreshold {
            max: 1.0,
            points: 1,
            risk: RiskLevel::Low,
        },
        RiskThreshold {
            max: 2.0,
            points: 2,
            risk: RiskLevel::Medium,
        },
        RiskThreshold {
            max: 3.0,
            points: 3,
            risk: RiskLevel::High,
        },
    ]
}

/// First threshold (ascending by `max`) whose `max` covers the raw score; the highest threshold
/// when the score exceeds them all. `None` only for an empty list.
pub fn select_threshold(thresholds: &[RiskThreshold], raw_score: f64) -> Option<&RiskThreshold> {
    let mut ordered: Vec<&RiskThreshold> = thresholds.iter().collect();
    ordered.sort_by(|a, b| a.max.total_cmp(&b.max));

    ordered
        .iter()
        .copied()
        .find(|threshold| threshold.max >= raw_score)
        .or_else(|| ordered.last().copied())
}

/// Overall-risk band keyed on the total score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub max: f64,
    pub risk: RiskLevel,
}

/// Same selection rule as thresholds, but an unmatched score is always `High`.
pub fn select_band(bands: &[RiskBand], total_score: f64) -> RiskLevel {
    let mut ordered: Vec<&RiskBand> = bands.iter().collect();
    ordered.sort_by(|a, b| a.max.total_cmp(&b.max));

    ordered
        .iter()
        .find(|band| band.max >= total_score)
        .map(|band| band.risk)
        .unwrap_or(RiskLevel::High)
}

/// Inclusive upper bounds for the low, medium and high severities; anything above `high`
/// is critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            low: 3.0,
            medium: 6.0,
            high: 9.0,
        }
    }
}

impl SeverityBands {
    pub fn classify(&self, total_score: f64) -> Severity {
        if total_score <= self.low {
            Severity::Low
        } else if total_score <= self.medium {
            Severity::Medium
        } else if total_score <= self.high {
            Severity::High
        } else {
            Severity::Critical
        }
    }
}

/// User-editable scoring configuration consumed by the risk evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoringConfig {
    pub categories: Vec<RiskCategory>,
    pub overall_bands: Vec<RiskBand>,
    #[serde(default)]
    pub severity_bands: SeverityBands,
}

impl Default for RiskScoringConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskScoringConfig {
    pub fn standard() -> Self {
        Self {
            categories: RiskRule::ordered()
                .into_iter()
                .map(RiskCategory::standard)
                .collect(),
            overall_bands: vec![
                RiskBand {
                    max: 5.0,
                    risk: RiskLevel::Low,
                },
                RiskBand {
                    max: 12.0,
                    risk: RiskLevel::Medium,
                },
                RiskBand {
                    max: 21.0,
                    risk: RiskLevel::High,
                },
            ],
            severity_bands: SeverityBands::default(),
        }
    }

    pub fn max_possible_score(&self) -> u32 {
        self.categories
            .iter()
            .map(|category| u32::from(category.max_points()))
            .sum()
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.categories.is_empty() {
            return Err(ConfigValidationError::NoCategories);
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.id.as_str()) {
                return Err(ConfigValidationError::DuplicateCategory(category.id.clone()));
            }
            if category.thresholds.is_empty() {
                return Err(ConfigValidationError::EmptyThresholds(category.id.clone()));
            }
            for threshold in &category.thresholds {
                if !threshold.max.is_finite() {
                    return Err(ConfigValidationError::NonFiniteThreshold(
                        category.id.clone(),
                    ));
                }
                if threshold.points > MAX_FACTOR_POINTS {
                    return Err(ConfigValidationError::PointsOutOfRange {
                        category: category.id.clone(),
                        points: threshold.points,
                    });
                }
            }
        }

        if self.overall_bands.iter().any(|band| !band.max.is_finite()) {
            return Err(ConfigValidationError::NonFiniteBand);
        }

        let bands = self.severity_bands;
        if !(bands.low <= bands.medium && bands.medium <= bands.high) {
            return Err(ConfigValidationError::UnorderedSeverityBands);
        }

        Ok(())
    }
}

pub const MAX_FACTOR_POINTS: u8 = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("risk configuration must define at least one category")]
    NoCategories,
    #[error("risk category '{0}' is defined more than once")]
    DuplicateCategory(String),
    #[error("risk category '{0}' has no thresholds")]
    EmptyThresholds(String),
    #[error("risk category '{0}' has a threshold with a non-finite max")]
    NonFiniteThreshold(String),
    #[error("risk category '{category}' awards {points} points (maximum is 3)")]
    PointsOutOfRange { category: String, points: u8 },
    #[error("overall risk bands must have finite bounds")]
    NonFiniteBand,
    #[error("severity bands must ascend: low <= medium <= high")]
    UnorderedSeverityBands,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_thresholds() -> Vec<RiskThreshold> {
        vec![
            RiskThreshold {
                max: 50.0,
                points: 0,
                risk: RiskLevel::Low,
            },
            RiskThreshold {
                max: 75.0,
                points: 1,
                risk: RiskLevel::Medium,
            },
            RiskThreshold {
                max: 100.0,
                points: 3,
                risk: RiskLevel::High,
            },
        ]
    }

    #[test]
    fn selects_first_threshold_covering_raw_score() {
        let thresholds = percent_thresholds();
        let selected = select_threshold(&thresholds, 60.0).expect("threshold");
        assert_eq!(selected.points, 1);
        assert_eq!(selected.risk, RiskLevel::Medium);
        assert_eq!(select_threshold(&thresholds, 50.0).map(|t| t.points), Some(0));
    }

    #[test]
    fn falls_back_to_highest_threshold() {
        let mut thresholds = percent_thresholds();
        thresholds.reverse();
        let selected = select_threshold(&thresholds, 140.0).expect("threshold");
        assert_eq!(selected.max, 100.0);
        assert_eq!(selected.risk, RiskLevel::High);
        assert!(select_threshold(&[], 1.0).is_none());
    }

    #[test]
    fn overall_band_defaults_to_high() {
        let bands = RiskScoringConfig::standard().overall_bands;
        assert_eq!(select_band(&bands, 0.0), RiskLevel::Low);
        assert_eq!(select_band(&bands, 5.0), RiskLevel::Low);
        assert_eq!(select_band(&bands, 6.0), RiskLevel::Medium);
        assert_eq!(select_band(&bands, 40.0), RiskLevel::High);
        assert_eq!(select_band(&[], 0.0), RiskLevel::High);
    }

    #[test]
    fn severity_bands_split_at_three_six_nine() {
        let bands = SeverityBands::default();
        assert_eq!(bands.classify(3.0), Severity::Low);
        assert_eq!(bands.classify(4.0), Severity::Medium);
        assert_eq!(bands.classify(9.0), Severity::High);
        assert_eq!(bands.classify(10.0), Severity::Critical);
    }

    #[test]
    fn standard_config_validates_and_scores_up_to_twenty_one() {
        let config = RiskScoringConfig::standard();
        config.validate().expect("standard config is valid");
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.max_possible_score(), 21);
        assert!(config
            .categories
            .iter()
            .any(|category| category.id == "documentation"));
    }

    #[test]
    fn validation_rejects_out_of_range_points() {
        let mut config = RiskScoringConfig::standard();
        config.categories[0].thresholds[3].points = 5;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::PointsOutOfRange {
                category: "compensation_structure".to_string(),
                points: 5,
            })
        );
    }

    #[test]
    fn validation_rejects_duplicate_and_empty_categories() {
        let mut config = RiskScoringConfig::standard();
        config.categories.push(RiskCategory::standard(RiskRule::Documentation));
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::DuplicateCategory(_))
        ));

        let mut config = RiskScoringConfig::standard();
        config.categories[1].thresholds.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyThresholds(_))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RiskScoringConfig::standard();
        let json = serde_json::to_string(&config).expect("serializes");
        assert!(json.contains("\"rule\":\"market_justification\""));
        let restored: RiskScoringConfig = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(restored, config);
    }
}
