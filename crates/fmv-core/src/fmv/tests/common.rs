use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::fmv::percentile::PercentileStrategy;
use crate::fmv::risk::{DocumentationStatus, RiskAssessmentInput};
use crate::fmv::router::fmv_router;
use crate::fmv::service::FmvService;
use crate::fmv::storage::{InMemoryStore, KeyValueStore, StorageError};

pub(super) const MARKET_CSV: &str = "specialty,p25_total,p50_total,p75_total,p90_total,p25_wrvu,p50_wrvu,p75_wrvu,p90_wrvu,p25_cf,p50_cf,p75_cf,p90_cf\n\
Cardiology,286364,333779,391588,462010,3259,4321,5577,7591,64.20,79.20,105.60,145.20\n\
Family Medicine,228000,262000,301000,352000,3900,4700,5600,6600,47.10,53.90,61.80,70.40\n";

pub(super) const EMPLOYEE_CSV: &str = "Employee ID,Full Name,Specialty,Base Pay,wRVU Incentive,Quality Payments,Admin Payments,Annual wRVUs\n\
E100,Dana Whitfield,Cardiology,\"$302,024\",\"$72,872\",\"$28,452\",\"$4,598\",4321\n\
E200,Sam Okafor,Dermatology,250000,0,0,0,5000\n";

/// Tolerance for comparing interpolated percentiles.
pub(super) const EPSILON: f64 = 1e-6;

pub(super) fn loaded_service() -> FmvService<InMemoryStore> {
    loaded_service_with(InMemoryStore::default(), PercentileStrategy::Interpolated)
}

pub(super) fn loaded_service_with<S>(store: S, strategy: PercentileStrategy) -> FmvService<S>
where
    S: KeyValueStore + 'static,
{
    let service = FmvService::new(Arc::new(store), strategy);
    service
        .import_market_data(Cursor::new(MARKET_CSV))
        .expect("market data imports");
    service
        .import_employee_data(Cursor::new(EMPLOYEE_CSV))
        .expect("employee data imports");
    service
}

pub(super) fn reviewed_assessment() -> RiskAssessmentInput {
    let mut assessment = RiskAssessmentInput::default();
    assessment.documentation = DocumentationStatus {
        fmv_opinion: true,
        written_agreement: true,
        time_records: true,
        duties_description: true,
    };
    assessment.compliance.stark_reviewed = true;
    assessment.compliance.aks_reviewed = true;
    assessment.business_case.justification = "Expand structural heart coverage".to_string();
    assessment.business_case.roi_percent = Some(6.5);
    assessment
}

/// Store that refuses writes to selected keys and behaves normally otherwise.
#[derive(Default)]
pub(super) struct FlakyStore {
    inner: InMemoryStore,
    refused: HashSet<&'static str>,
}

impl FlakyStore {
    pub(super) fn refusing(keys: &[&'static str]) -> Self {
        Self {
            inner: InMemoryStore::default(),
            refused: keys.iter().copied().collect(),
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        if self.refused.contains(key) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.put(key, value)
    }
}

/// Store whose reads stall, widening the window between a read and the following write.
#[derive(Default)]
pub(super) struct SlowReadStore {
    inner: InMemoryStore,
}

impl KeyValueStore for SlowReadStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        thread::sleep(Duration::from_millis(50));
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.put(key, value)
    }
}

pub(super) fn router_with_service<S>(service: FmvService<S>) -> axum::Router
where
    S: KeyValueStore + 'static,
{
    fmv_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
