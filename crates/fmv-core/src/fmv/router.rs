use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, StringRejection},
        DefaultBodyLimit, Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::import::EmployeeRecord;
use super::qualification::{QualificationAnswers, QualificationCriterion, QualificationScore};
use super::review::{DecisionRequest, FmvReview, FmvReviewDraft, ProviderReview};
use super::risk::{RiskAssessmentInput, RiskScoringConfig};
use super::service::{FmvService, FmvServiceError, ProviderAnalysis};
use super::storage::KeyValueStore;
use crate::error::AppError;

type Service<S> = State<Arc<FmvService<S>>>;

/// Upload ceiling for CSV bodies.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Router exposing ingest, analysis, configuration and review endpoints.
pub fn fmv_router<S>(service: Arc<FmvService<S>>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/fmv/market-data", post(import_market_handler::<S>))
        .route(
            "/api/v1/fmv/employees",
            post(import_employees_handler::<S>).get(list_employees_handler::<S>),
        )
        .route(
            "/api/v1/fmv/providers/:provider_id/analysis",
            post(analysis_handler::<S>),
        )
        .route(
            "/api/v1/fmv/providers/:provider_id/fmv-review",
            get(get_review_handler::<S>).put(put_review_handler::<S>),
        )
        .route(
            "/api/v1/fmv/providers/:provider_id/decision",
            get(get_decision_handler::<S>).put(put_decision_handler::<S>),
        )
        .route("/api/v1/fmv/results/latest", get(latest_result_handler::<S>))
        .route(
            "/api/v1/fmv/risk-config",
            get(get_config_handler::<S>).put(put_config_handler::<S>),
        )
        .route(
            "/api/v1/fmv/qualification-criteria",
            get(get_criteria_handler::<S>).put(put_criteria_handler::<S>),
        )
        .route(
            "/api/v1/fmv/qualification-score",
            post(qualification_score_handler::<S>),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

pub(crate) async fn import_market_handler<S>(
    State(service): Service<S>,
    body: Result<String, StringRejection>,
) -> Result<Json<Value>, AppError>
where
    S: KeyValueStore + 'static,
{
    let rows = service.import_market_data(body?.as_bytes())?;
    let specialties: Vec<&str> = rows.iter().map(|row| row.specialty.as_str()).collect();
    Ok(Json(json!({
        "imported": rows.len(),
        "specialties": specialties,
    })))
}

pub(crate) async fn import_employees_handler<S>(
    State(service): Service<S>,
    body: Result<String, StringRejection>,
) -> Result<Json<Value>, AppError>
where
    S: KeyValueStore + 'static,
{
    let employees = service.import_employee_data(body?.as_bytes())?;
    Ok(Json(json!({ "imported": employees.len() })))
}

pub(crate) async fn list_employees_handler<S>(
    State(service): Service<S>,
) -> Json<Vec<EmployeeRecord>>
where
    S: KeyValueStore + 'static,
{
    Json(service.employees())
}

pub(crate) async fn analysis_handler<S>(
    State(service): Service<S>,
    Path(provider_id): Path<String>,
    payload: Result<Json<RiskAssessmentInput>, JsonRejection>,
) -> Result<Json<ProviderAnalysis>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(assessment) = payload?;
    Ok(Json(service.analyze_provider(&provider_id, assessment)?))
}

pub(crate) async fn latest_result_handler<S>(
    State(service): Service<S>,
) -> Result<Json<ProviderAnalysis>, AppError>
where
    S: KeyValueStore + 'static,
{
    let analysis = service.last_analysis().ok_or(FmvServiceError::NoAnalysis)?;
    Ok(Json(analysis))
}

pub(crate) async fn get_config_handler<S>(State(service): Service<S>) -> Json<RiskScoringConfig>
where
    S: KeyValueStore + 'static,
{
    Json(service.risk_config())
}

pub(crate) async fn put_config_handler<S>(
    State(service): Service<S>,
    payload: Result<Json<RiskScoringConfig>, JsonRejection>,
) -> Result<Json<RiskScoringConfig>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(config) = payload?;
    Ok(Json(service.update_risk_config(config)?))
}

pub(crate) async fn get_criteria_handler<S>(
    State(service): Service<S>,
) -> Json<Vec<QualificationCriterion>>
where
    S: KeyValueStore + 'static,
{
    Json(service.qualification_criteria())
}

pub(crate) async fn put_criteria_handler<S>(
    State(service): Service<S>,
    payload: Result<Json<Vec<QualificationCriterion>>, JsonRejection>,
) -> Result<Json<Vec<QualificationCriterion>>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(criteria) = payload?;
    Ok(Json(service.update_qualification_criteria(criteria)?))
}

pub(crate) async fn qualification_score_handler<S>(
    State(service): Service<S>,
    payload: Result<Json<QualificationAnswers>, JsonRejection>,
) -> Result<Json<QualificationScore>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(answers) = payload?;
    Ok(Json(service.score_qualifications(&answers)))
}

pub(crate) async fn get_review_handler<S>(
    State(service): Service<S>,
    Path(provider_id): Path<String>,
) -> Result<Json<FmvReview>, AppError>
where
    S: KeyValueStore + 'static,
{
    Ok(Json(service.load_fmv_review(&provider_id)?))
}

pub(crate) async fn put_review_handler<S>(
    State(service): Service<S>,
    Path(provider_id): Path<String>,
    payload: Result<Json<FmvReviewDraft>, JsonRejection>,
) -> Result<Json<FmvReview>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(draft) = payload?;
    Ok(Json(service.save_fmv_review(&provider_id, draft)?))
}

pub(crate) async fn get_decision_handler<S>(
    State(service): Service<S>,
    Path(provider_id): Path<String>,
) -> Result<Json<ProviderReview>, AppError>
where
    S: KeyValueStore + 'static,
{
    Ok(Json(service.provider_decision(&provider_id)?))
}

pub(crate) async fn put_decision_handler<S>(
    State(service): Service<S>,
    Path(provider_id): Path<String>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<ProviderReview>, AppError>
where
    S: KeyValueStore + 'static,
{
    let Json(request) = payload?;
    Ok(Json(service.record_provider_decision(&provider_id, request)?))
}
