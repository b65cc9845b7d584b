//! Typed snapshot of everything the risk rules read.
//!
//! Every struct implements `Default` and deserializes with `#[serde(default)]`, so a partially
//! filled assessment form still produces a complete context and rules never branch on absent
//! fields.

use serde::{Deserialize, Serialize};

/// Reviewer rating for a market or program attribute. Unanswered attributes read as `Medium`,
/// so this stays separate from `RiskLevel`, which is a scoring output defaulting to `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

pub const NATIONAL_COST_OF_LIVING_INDEX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConditions {
    pub demand: Level,
    pub competition: Level,
    pub region: String,
    /// 100 is the national average.
    pub cost_of_living_index: f64,
    pub recruitment_difficulty: Level,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            demand: Level::default(),
            competition: Level::default(),
            region: String::new(),
            cost_of_living_index: NATIONAL_COST_OF_LIVING_INDEX,
            recruitment_difficulty: Level::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderProfile {
    pub years_experience: u32,
    pub certifications: Vec<String>,
    pub unique_skills: Vec<String>,
    pub academic_appointment: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeMetrics {
    pub case_complexity: Level,
    pub quality_metric_score: f64,
    pub quality_metric_benchmark: f64,
    pub patient_satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramFacts {
    pub research_program: bool,
    pub teaching_program: bool,
    pub strategic_importance: Level,
}

/// Percentile positions computed from the benchmark tables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationPercentiles {
    pub tcc: f64,
    pub wrvu: f64,
    pub conversion_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationStatus {
    pub fmv_opinion: bool,
    pub written_agreement: bool,
    pub time_records: bool,
    pub duties_description: bool,
}

impl DocumentationStatus {
    pub fn missing_items(&self) -> Vec<&'static str> {
        [
            (self.fmv_opinion, "independent FMV opinion"),
            (self.written_agreement, "signed written agreement"),
            (self.time_records, "time and activity records"),
            (self.duties_description, "description of duties"),
        ]
        .into_iter()
        .filter(|(present, _)| !present)
        .map(|(_, label)| label)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceFlags {
    pub stark_reviewed: bool,
    pub aks_reviewed: bool,
    pub referral_relationship: bool,
    pub referral_analysis_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessCase {
    /// Expected return on investment in percent; `None` when no projection was made.
    pub roi_percent: Option<f64>,
    pub justification: String,
}

/// Reviewer-supplied facts collected alongside the compensation data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentInput {
    pub market: MarketConditions,
    pub provider: ProviderProfile,
    pub practice: PracticeMetrics,
    pub program: ProgramFacts,
    pub documentation: DocumentationStatus,
    pub compliance: ComplianceFlags,
    pub business_case: BusinessCase,
}

/// Read-only input to the risk rules. Rebuilt for every evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFactorContext {
    pub market: MarketConditions,
    pub provider: ProviderProfile,
    pub practice: PracticeMetrics,
    pub program: ProgramFacts,
    pub compensation: CompensationPercentiles,
    pub documentation: DocumentationStatus,
    pub compliance: ComplianceFlags,
    pub business_case: BusinessCase,
}

impl RiskFactorContext {
    /// Combine the assessment with computed percentiles, replacing non-finite numbers with
    /// their defaults.
    pub fn new(assessment: RiskAssessmentInput, compensation: CompensationPercentiles) -> Self {
        let RiskAssessmentInput {
            mut market,
            provider,
            mut practice,
            program,
            documentation,
            compliance,
            mut business_case,
        } = assessment;

        if !market.cost_of_living_index.is_finite() || market.cost_of_living_index <= 0.0 {
            market.cost_of_living_index = NATIONAL_COST_OF_LIVING_INDEX;
        }
        practice.quality_metric_score = finite(practice.quality_metric_score);
        practice.quality_metric_benchmark = finite(practice.quality_metric_benchmark);
        practice.patient_satisfaction = finite(practice.patient_satisfaction);
        business_case.roi_percent = business_case.roi_percent.filter(|roi| roi.is_finite());

        Self {
            market,
            provider,
            practice,
            program,
            compensation: CompensationPercentiles {
                tcc: finite(compensation.tcc),
                wrvu: finite(compensation.wrvu),
                conversion_factor: finite(compensation.conversion_factor),
            },
            documentation,
            compliance,
            business_case,
        }
    }

    /// Context notes a reviewer weighs alongside the scored categories.
    pub fn contextual_factors(&self) -> Vec<String> {
        let mut factors = Vec::new();

        if self.provider.academic_appointment {
            factors.push("Provider holds an academic appointment".to_string());
        }
        if self.program.research_program {
            factors.push("Arrangement supports a research program".to_string());
        }
        if self.program.teaching_program {
            factors.push("Arrangement includes teaching responsibilities".to_string());
        }
        if !self.provider.unique_skills.is_empty() {
            factors.push(format!(
                "Unique clinical skills: {}",
                self.provider.unique_skills.join(", ")
            ));
        }
        if self.market.recruitment_difficulty == Level::High {
            factors.push("Recruitment for this specialty is difficult in the market".to_string());
        }
        if self.practice.case_complexity == Level::High {
            factors.push("Caseload complexity is high".to_string());
        }
        if self.practice.quality_metric_benchmark > 0.0
            && self.practice.quality_metric_score >= self.practice.quality_metric_benchmark
        {
            factors.push(format!(
                "Quality score {:.1} meets the {:.1} benchmark",
                self.practice.quality_metric_score, self.practice.quality_metric_benchmark
            ));
        }
        if self.practice.patient_satisfaction >= 90.0 {
            factors.push(format!(
                "Patient satisfaction at {:.1}",
                self.practice.patient_satisfaction
            ));
        }
        if self.market.cost_of_living_index > 110.0 {
            factors.push(format!(
                "Cost-of-living index {:.0} is well above the national average",
                self.market.cost_of_living_index
            ));
        }
        if self.program.strategic_importance == Level::High {
            factors.push("Service line is of high strategic importance".to_string());
        }

        factors
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_produces_complete_context() {
        let assessment: RiskAssessmentInput = serde_json::from_str("{}").expect("parses");
        let context = RiskFactorContext::new(assessment, CompensationPercentiles::default());
        assert_eq!(context.market.cost_of_living_index, 100.0);
        assert_eq!(context.market.demand, Level::Medium);
        assert!(context.business_case.roi_percent.is_none());
        assert_eq!(context.documentation.missing_items().len(), 4);
    }

    #[test]
    fn nested_partial_payload_keeps_defaults_for_siblings() {
        let assessment: RiskAssessmentInput = serde_json::from_str(
            r#"{"market": {"demand": "high"}, "provider": {"years_experience": 12}}"#,
        )
        .expect("parses");
        assert_eq!(assessment.market.demand, Level::High);
        assert_eq!(assessment.market.competition, Level::Medium);
        assert_eq!(assessment.market.cost_of_living_index, 100.0);
        assert_eq!(assessment.provider.years_experience, 12);
    }

    #[test]
    fn non_finite_numbers_are_replaced() {
        let mut assessment = RiskAssessmentInput::default();
        assessment.market.cost_of_living_index = f64::NAN;
        assessment.business_case.roi_percent = Some(f64::INFINITY);
        let context = RiskFactorContext::new(
            assessment,
            CompensationPercentiles {
                tcc: f64::NAN,
                wrvu: 40.0,
                conversion_factor: 55.0,
            },
        );
        assert_eq!(context.market.cost_of_living_index, 100.0);
        assert!(context.business_case.roi_percent.is_none());
        assert_eq!(context.compensation.tcc, 0.0);
        assert_eq!(context.compensation.wrvu, 40.0);
    }

    #[test]
    fn lists_mitigating_context() {
        let mut context = RiskFactorContext::default();
        context.provider.academic_appointment = true;
        context.provider.unique_skills = vec!["TAVR".to_string()];
        context.market.recruitment_difficulty = Level::High;
        let factors = context.contextual_factors();
        assert_eq!(factors.len(), 3);
        assert!(factors.iter().any(|factor| factor.contains("TAVR")));
    }
}
