//! Provider compensation fair-market-value (FMV) analysis.
//!
//! Market surveys and employee compensation exports are imported from CSV, turned into
//! percentile positions against specialty benchmarks, and scored by the configurable risk
//! rules. Everything below `service` is pure calculation; `service` and `router` add
//! persistence and the HTTP surface.

pub mod benchmark;
pub mod compensation;
pub mod config_store;
pub mod import;
pub mod percentile;
pub mod qualification;
pub mod review;
pub mod risk;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use benchmark::{benchmarks_for, BenchmarkPoint, BenchmarkTable, MarketDataRow};
pub use compensation::{aggregate, parse_amount, CompensationComponents, CompensationSummary};
pub use config_store::{ConfigStoreError, RiskConfigStore};
pub use import::{EmployeeImporter, EmployeeRecord, FmvImportError, MarketDataImporter};
pub use percentile::{percentile_of, rank_percentile, PercentileStrategy};
pub use qualification::{
    default_criteria, score_qualifications, QualificationAnswer, QualificationAnswers,
    QualificationCriterion, QualificationRule, QualificationScore,
};
pub use review::{DecisionRequest, FmvReview, FmvReviewDraft, ProviderReview, ReviewDecision};
pub use risk::{analyze_risk, evaluate_category, RiskAnalysis, RiskFactor, RiskScoringConfig};
pub use router::fmv_router;
pub use service::{build_analysis, FmvService, FmvServiceError, ProviderAnalysis};
pub use storage::{FileStore, InMemoryStore, KeyValueStore, StorageError};
