use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::benchmark::{benchmarks_for, BenchmarkTable, MarketDataRow};
use super::compensation::{aggregate, CompensationSummary};
use super::config_store::{ConfigStoreError, RiskConfigStore};
use super::import::{EmployeeImporter, EmployeeRecord, FmvImportError, MarketDataImporter};
use super::percentile::PercentileStrategy;
use super::qualification::{
    score_qualifications, QualificationAnswers, QualificationCriterion, QualificationScore,
};
use super::review::{DecisionRequest, FmvReview, FmvReviewDraft, ProviderReview};
use super::risk::{
    analyze_risk, CompensationPercentiles, RiskAnalysis, RiskAssessmentInput, RiskFactorContext,
    RiskScoringConfig,
};
use super::storage::{
    keys, load_json, load_json_or_default, save_json, KeyValueStore, StorageError,
};

/// Everything computed for one provider in a single analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAnalysis {
    pub provider_id: String,
    pub full_name: String,
    pub specialty: String,
    pub compensation: CompensationSummary,
    pub annual_wrvus: f64,
    /// Stated conversion factor, or the effective rate when none was reported.
    pub conversion_factor: f64,
    pub percentiles: CompensationPercentiles,
    pub strategy: PercentileStrategy,
    pub risk: RiskAnalysis,
    pub generated_at: DateTime<Utc>,
}

/// Application service composing ingest, persistence, configuration and the scoring engine.
pub struct FmvService<S> {
    store: Arc<S>,
    config: RiskConfigStore<S>,
    strategy: PercentileStrategy,
    // Serializes the read-modify-write of the `providerReviews` map.
    decisions: Mutex<()>,
}

impl<S> FmvService<S>
where
    S: KeyValueStore + 'static,
{
    pub fn new(store: Arc<S>, strategy: PercentileStrategy) -> Self {
        let config = RiskConfigStore::load(Arc::clone(&store));
        Self {
            store,
            config,
            strategy,
            decisions: Mutex::new(()),
        }
    }

    pub fn strategy(&self) -> PercentileStrategy {
        self.strategy
    }

    /// Replace the stored market survey. Nothing is written when the file fails to parse.
    pub fn import_market_data<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<MarketDataRow>, FmvServiceError> {
        let rows = MarketDataImporter::from_reader(reader)?;
        save_json(self.store.as_ref(), keys::MARKET_DATA, &rows)?;
        info!(rows = rows.len(), "market data imported");
        Ok(rows)
    }

    pub fn import_employee_data<R: Read>(
        &self,
        reader: R,
    ) -> Result<Vec<EmployeeRecord>, FmvServiceError> {
        let employees = EmployeeImporter::from_reader(reader)?;
        save_json(self.store.as_ref(), keys::EMPLOYEE_DATA, &employees)?;
        info!(employees = employees.len(), "employee data imported");
        Ok(employees)
    }

    pub fn market_data(&self) -> Vec<MarketDataRow> {
        load_json_or_default(self.store.as_ref(), keys::MARKET_DATA)
    }

    pub fn employees(&self) -> Vec<EmployeeRecord> {
        load_json_or_default(self.store.as_ref(), keys::EMPLOYEE_DATA)
    }

    pub fn employee(&self, employee_id: &str) -> Result<EmployeeRecord, FmvServiceError> {
        self.employees()
            .into_iter()
            .find(|employee| employee.employee_id == employee_id)
            .ok_or_else(|| FmvServiceError::EmployeeNotFound(employee_id.to_string()))
    }

    pub fn benchmarks(&self, specialty: &str) -> Result<BenchmarkTable, FmvServiceError> {
        benchmarks_for(&self.market_data(), specialty)
            .ok_or_else(|| FmvServiceError::MarketDataNotFound(specialty.to_string()))
    }

    /// Compute compensation, percentiles and the risk analysis for one provider.
    pub fn analyze_provider(
        &self,
        employee_id: &str,
        assessment: RiskAssessmentInput,
    ) -> Result<ProviderAnalysis, FmvServiceError> {
        let employee = self.employee(employee_id)?;
        let table = self.benchmarks(&employee.specialty)?;
        let config = self.config.config();

        let analysis = build_analysis(&employee, &table, assessment, &config, self.strategy);
        info!(
            provider_id = %analysis.provider_id,
            total_score = analysis.risk.total_score,
            overall_risk = analysis.risk.overall_risk.label(),
            "provider analysis computed"
        );

        if let Err(error) = save_json(self.store.as_ref(), keys::COMPENSATION_RESULTS, &analysis) {
            warn!(provider_id = %analysis.provider_id, %error, "failed to persist analysis");
        }

        Ok(analysis)
    }

    /// Most recently computed analysis, if any.
    pub fn last_analysis(&self) -> Option<ProviderAnalysis> {
        load_json_or_default(self.store.as_ref(), keys::COMPENSATION_RESULTS)
    }

    pub fn risk_config(&self) -> RiskScoringConfig {
        self.config.config()
    }

    pub fn update_risk_config(
        &self,
        config: RiskScoringConfig,
    ) -> Result<RiskScoringConfig, FmvServiceError> {
        Ok(self.config.update_config(config)?)
    }

    pub fn qualification_criteria(&self) -> Vec<QualificationCriterion> {
        self.config.qualification_criteria()
    }

    pub fn update_qualification_criteria(
        &self,
        criteria: Vec<QualificationCriterion>,
    ) -> Result<Vec<QualificationCriterion>, FmvServiceError> {
        Ok(self.config.update_qualification_criteria(criteria)?)
    }

    pub fn score_qualifications(&self, answers: &QualificationAnswers) -> QualificationScore {
        score_qualifications(&self.config.qualification_criteria(), answers)
    }

    pub fn save_fmv_review(
        &self,
        provider_id: &str,
        draft: FmvReviewDraft,
    ) -> Result<FmvReview, FmvServiceError> {
        Ok(self.config.save_fmv_review(provider_id, draft)?)
    }

    pub fn load_fmv_review(&self, provider_id: &str) -> Result<FmvReview, FmvServiceError> {
        self.config
            .load_fmv_review(provider_id)?
            .ok_or_else(|| FmvServiceError::ReviewNotFound(provider_id.to_string()))
    }

    pub fn record_provider_decision(
        &self,
        provider_id: &str,
        request: DecisionRequest,
    ) -> Result<ProviderReview, FmvServiceError> {
        let _guard = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut decisions = self.provider_decisions()?;
        let review = ProviderReview {
            provider_id: provider_id.to_string(),
            decision: request.decision,
            reviewer: request.reviewer,
            comments: request.comments,
            decided_at: Utc::now(),
        };
        decisions.insert(provider_id.to_string(), review.clone());
        save_json(self.store.as_ref(), keys::PROVIDER_REVIEWS, &decisions)?;

        info!(%provider_id, decision = review.decision.label(), "provider decision recorded");
        Ok(review)
    }

    /// Current decision for a provider; undecided providers report `pending`.
    pub fn provider_decision(&self, provider_id: &str) -> Result<ProviderReview, FmvServiceError> {
        Ok(self
            .provider_decisions()?
            .remove(provider_id)
            .unwrap_or_else(|| ProviderReview::pending(provider_id, Utc::now())))
    }

    fn provider_decisions(&self) -> Result<BTreeMap<String, ProviderReview>, FmvServiceError> {
        Ok(load_json(self.store.as_ref(), keys::PROVIDER_REVIEWS)?.unwrap_or_default())
    }
}

/// Pure assembly of a provider analysis from already-loaded inputs.
pub fn build_analysis(
    employee: &EmployeeRecord,
    table: &BenchmarkTable,
    assessment: RiskAssessmentInput,
    config: &RiskScoringConfig,
    strategy: PercentileStrategy,
) -> ProviderAnalysis {
    let compensation = aggregate(&employee.components(), employee.annual_wrvus);
    let stated = employee.conversion_factor;
    let conversion_factor = if stated.is_finite() && stated > 0.0 {
        stated
    } else {
        compensation.per_unit
    };

    let percentiles = CompensationPercentiles {
        tcc: strategy.percentile_of(compensation.total, &table.total_cash),
        wrvu: strategy.percentile_of(employee.annual_wrvus, &table.wrvus),
        conversion_factor: strategy.percentile_of(conversion_factor, &table.conversion_factor),
    };

    let context = RiskFactorContext::new(assessment, percentiles);
    let risk = analyze_risk(&context, config);

    ProviderAnalysis {
        provider_id: employee.employee_id.clone(),
        full_name: employee.full_name.clone(),
        specialty: employee.specialty.clone(),
        compensation,
        annual_wrvus: employee.annual_wrvus,
        conversion_factor,
        percentiles: context.compensation,
        strategy,
        risk,
        generated_at: Utc::now(),
    }
}

/// Error raised by the FMV service.
#[derive(Debug, thiserror::Error)]
pub enum FmvServiceError {
    #[error(transparent)]
    Import(#[from] FmvImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigStoreError),
    #[error("employee '{0}' not found")]
    EmployeeNotFound(String),
    #[error("no market data for specialty '{0}'")]
    MarketDataNotFound(String),
    #[error("no FMV review saved for provider '{0}'")]
    ReviewNotFound(String),
    #[error("no analysis has been computed yet")]
    NoAnalysis,
}

impl FmvServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EmployeeNotFound(_)
                | Self::MarketDataNotFound(_)
                | Self::ReviewNotFound(_)
                | Self::NoAnalysis
        )
    }

    /// Caller-correctable input problems (bad files, rejected configuration).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Import(_)
                | Self::Config(ConfigStoreError::Validation(_))
                | Self::Config(ConfigStoreError::InvalidCriteria(_))
        )
    }
}
