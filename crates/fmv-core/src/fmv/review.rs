//! Reviewer records kept alongside the calculations: the saved FMV worksheet for a provider
//! and the approve/reject decision on the arrangement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::qualification::QualificationAnswers;
use super::risk::RiskAssessmentInput;

/// Saved FMV worksheet: the reviewer's risk inputs and qualification answers for a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FmvReview {
    pub provider_id: String,
    #[serde(default)]
    pub assessment: RiskAssessmentInput,
    #[serde(default)]
    pub qualification_answers: QualificationAnswers,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reviewer: String,
    pub updated_at: DateTime<Utc>,
}

/// Worksheet body as submitted by a client; identity and timestamp are assigned on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmvReviewDraft {
    pub assessment: RiskAssessmentInput,
    pub qualification_answers: QualificationAnswers,
    pub notes: String,
    pub reviewer: String,
}

impl FmvReviewDraft {
    pub fn into_review(self, provider_id: &str, updated_at: DateTime<Utc>) -> FmvReview {
        FmvReview {
            provider_id: provider_id.to_string(),
            assessment: self.assessment,
            qualification_answers: self.qualification_answers,
            notes: self.notes,
            reviewer: self.reviewer,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReview {
    pub provider_id: String,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub comments: String,
    pub decided_at: DateTime<Utc>,
}

impl ProviderReview {
    /// Placeholder returned for providers nobody has decided on yet.
    pub fn pending(provider_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            decision: ReviewDecision::Pending,
            reviewer: String::new(),
            comments: String::new(),
            decided_at: at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub comments: String,
}
