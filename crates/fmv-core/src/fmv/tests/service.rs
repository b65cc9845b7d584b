use super::common::*;
use std::io::Cursor;
use std::sync::Barrier;
use std::thread;

use crate::fmv::percentile::PercentileStrategy;
use crate::fmv::qualification::QualificationAnswer;
use crate::fmv::review::{DecisionRequest, FmvReviewDraft, ReviewDecision};
use crate::fmv::risk::{RiskAssessmentInput, RiskLevel, Severity};
use crate::fmv::service::FmvServiceError;
use crate::fmv::storage::{keys, InMemoryStore};

#[test]
fn analyze_provider_positions_compensation_against_specialty() {
    let service = loaded_service();
    let analysis = service
        .analyze_provider("E100", reviewed_assessment())
        .expect("analysis succeeds");

    assert_eq!(analysis.compensation.total, 407_946.0);
    let expected_tcc = 75.0 + (407_946.0 - 391_588.0) * 15.0 / (462_010.0 - 391_588.0);
    assert!((analysis.percentiles.tcc - expected_tcc).abs() < EPSILON);
    assert!((analysis.percentiles.wrvu - 50.0).abs() < EPSILON);

    let effective_rate = 407_946.0 / 4_321.0;
    assert!((analysis.conversion_factor - effective_rate).abs() < EPSILON);
    assert!(analysis.percentiles.conversion_factor > 50.0);
    assert!(analysis.percentiles.conversion_factor < 75.0);
    assert_eq!(analysis.strategy, PercentileStrategy::Interpolated);
}

#[test]
fn analyze_provider_scores_reviewed_arrangement() {
    let service = loaded_service();
    let analysis = service
        .analyze_provider("E100", reviewed_assessment())
        .expect("analysis succeeds");

    let score_for = |id: &str| {
        analysis
            .risk
            .factors
            .iter()
            .find(|factor| factor.category_id == id)
            .map(|factor| factor.score)
            .expect("category present")
    };
    assert_eq!(score_for("compensation_structure"), 1);
    assert_eq!(score_for("productivity_alignment"), 2);
    assert_eq!(score_for("provider_qualifications"), 3);
    assert_eq!(score_for("documentation"), 0);
    assert_eq!(analysis.risk.total_score, 6);
    assert_eq!(analysis.risk.overall_risk, RiskLevel::Medium);
    assert_eq!(analysis.risk.severity, Severity::Medium);
}

#[test]
fn rank_strategy_counts_benchmarks_below() {
    let service = loaded_service_with(InMemoryStore::default(), PercentileStrategy::RankBased);
    let analysis = service
        .analyze_provider("E100", RiskAssessmentInput::default())
        .expect("analysis succeeds");

    assert_eq!(analysis.percentiles.tcc, 75.0);
    assert_eq!(analysis.percentiles.wrvu, 25.0);
    assert_eq!(analysis.strategy, PercentileStrategy::RankBased);
}

#[test]
fn stated_conversion_factor_takes_precedence() {
    let service = loaded_service();
    let csv = "employee_id,full_name,specialty,base_pay,wrvu_incentive,quality_payments,admin_payments,annual_wrvus,cf\n\
E300,Lee Park,Cardiology,300000,0,0,0,4000,145.20\n";
    service
        .import_employee_data(Cursor::new(csv))
        .expect("imports");

    let analysis = service
        .analyze_provider("E300", RiskAssessmentInput::default())
        .expect("analysis succeeds");
    assert_eq!(analysis.conversion_factor, 145.20);
    assert!((analysis.percentiles.conversion_factor - 90.0).abs() < EPSILON);
}

#[test]
fn analysis_errors_distinguish_missing_employee_and_market() {
    let service = loaded_service();

    let missing = service
        .analyze_provider("E999", RiskAssessmentInput::default())
        .expect_err("unknown employee");
    assert!(matches!(missing, FmvServiceError::EmployeeNotFound(ref id) if id == "E999"));
    assert!(missing.is_not_found());

    let no_market = service
        .analyze_provider("E200", RiskAssessmentInput::default())
        .expect_err("no dermatology survey");
    assert!(matches!(no_market, FmvServiceError::MarketDataNotFound(ref s) if s == "Dermatology"));
}

#[test]
fn latest_analysis_is_persisted() {
    let service = loaded_service();
    assert!(service.last_analysis().is_none());

    let analysis = service
        .analyze_provider("E100", reviewed_assessment())
        .expect("analysis succeeds");
    assert_eq!(service.last_analysis(), Some(analysis));
}

#[test]
fn failing_to_persist_analysis_is_not_fatal() {
    let service = loaded_service_with(
        FlakyStore::refusing(&[keys::COMPENSATION_RESULTS]),
        PercentileStrategy::Interpolated,
    );

    let analysis = service
        .analyze_provider("E100", reviewed_assessment())
        .expect("analysis still returned");
    assert_eq!(analysis.provider_id, "E100");
    assert!(service.last_analysis().is_none());
}

#[test]
fn rejected_import_keeps_previous_data() {
    let service = loaded_service();
    let error = service
        .import_market_data(Cursor::new("specialty,p25_total\nCardiology,1\n"))
        .expect_err("missing columns");
    assert!(error.is_validation());
    assert_eq!(service.market_data().len(), 2);
}

#[test]
fn import_storage_failure_surfaces() {
    let service = crate::fmv::service::FmvService::new(
        std::sync::Arc::new(FlakyStore::refusing(&[keys::MARKET_DATA])),
        PercentileStrategy::Interpolated,
    );
    let error = service
        .import_market_data(Cursor::new(MARKET_CSV))
        .expect_err("storage refuses");
    assert!(matches!(error, FmvServiceError::Storage(_)));
    assert!(service.market_data().is_empty());
}

#[test]
fn qualification_scoring_uses_active_criteria() {
    let service = loaded_service();
    let mut answers = crate::fmv::qualification::QualificationAnswers::new();
    answers.insert("years_experience".to_string(), QualificationAnswer::Value(8.0));
    answers.insert(
        "leadership_roles".to_string(),
        QualificationAnswer::Selected(vec!["medical_director".to_string()]),
    );

    let score = service.score_qualifications(&answers);
    assert_eq!(score.total, 4);
}

#[test]
fn fmv_review_round_trip_through_service() {
    let service = loaded_service();
    assert!(matches!(
        service.load_fmv_review("E100"),
        Err(FmvServiceError::ReviewNotFound(_))
    ));

    let draft = FmvReviewDraft {
        assessment: reviewed_assessment(),
        notes: "Ready for committee".to_string(),
        reviewer: "compliance".to_string(),
        ..FmvReviewDraft::default()
    };
    service.save_fmv_review("E100", draft).expect("saves");

    let review = service.load_fmv_review("E100").expect("loads");
    assert_eq!(review.notes, "Ready for committee");
    assert_eq!(review.assessment, reviewed_assessment());
}

#[test]
fn provider_decisions_default_to_pending() {
    let service = loaded_service();
    let decision = service.provider_decision("E100").expect("reads");
    assert_eq!(decision.decision, ReviewDecision::Pending);

    service
        .record_provider_decision(
            "E100",
            DecisionRequest {
                decision: ReviewDecision::Approved,
                reviewer: "cfo".to_string(),
                comments: "Within range".to_string(),
            },
        )
        .expect("records");

    let decision = service.provider_decision("E100").expect("reads");
    assert_eq!(decision.decision, ReviewDecision::Approved);
    assert_eq!(decision.reviewer, "cfo");
    assert_eq!(
        service.provider_decision("E200").expect("reads").decision,
        ReviewDecision::Pending
    );
}

#[test]
fn concurrent_writes_for_different_providers_are_all_kept() {
    let service = loaded_service_with(SlowReadStore::default(), PercentileStrategy::Interpolated);
    let barrier = Barrier::new(2);

    thread::scope(|scope| {
        for provider_id in ["E100", "E200"] {
            let (service, barrier) = (&service, &barrier);
            scope.spawn(move || {
                barrier.wait();
                service
                    .save_fmv_review(provider_id, FmvReviewDraft::default())
                    .expect("saves review");
                service
                    .record_provider_decision(
                        provider_id,
                        DecisionRequest {
                            decision: ReviewDecision::Approved,
                            reviewer: "committee".to_string(),
                            comments: String::new(),
                        },
                    )
                    .expect("records decision");
            });
        }
    });

    for provider_id in ["E100", "E200"] {
        assert!(service.load_fmv_review(provider_id).is_ok(), "{provider_id} review lost");
        assert_eq!(
            service.provider_decision(provider_id).expect("reads").decision,
            ReviewDecision::Approved,
            "{provider_id} decision lost"
        );
    }
}
