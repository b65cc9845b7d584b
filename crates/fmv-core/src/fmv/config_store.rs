//! Holds the active risk-scoring configuration and qualification criteria, and the saved FMV
//! worksheets, on top of a `KeyValueStore`.
//!
//! Reads come from memory. Writes validate, persist, and only then replace the in-memory
//! copy, so a failed write leaves the previous state in effect. Each write holds its lock
//! across the persist so memory and storage never disagree within one process.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use tracing::{info, warn};

use super::qualification::{default_criteria, QualificationCriterion, QualificationRule};
use super::review::{FmvReview, FmvReviewDraft};
use super::risk::{ConfigValidationError, RiskScoringConfig};
use super::storage::{keys, load_json, save_json, KeyValueStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    #[error("invalid qualification criteria: {0}")]
    InvalidCriteria(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct RiskConfigStore<S> {
    store: Arc<S>,
    config: RwLock<RiskScoringConfig>,
    criteria: RwLock<Vec<QualificationCriterion>>,
    // Serializes the read-modify-write of the `fmvReviews` map.
    reviews: Mutex<()>,
}

impl<S> RiskConfigStore<S>
where
    S: KeyValueStore + 'static,
{
    /// Load persisted state, falling back to the built-in defaults for anything missing,
    /// unreadable or invalid.
    pub fn load(store: Arc<S>) -> Self {
        let config = match load_json::<RiskScoringConfig, _>(store.as_ref(), keys::RISK_CONFIG) {
            Ok(Some(config)) => match config.validate() {
                Ok(()) => config,
                Err(error) => {
                    warn!(%error, "persisted risk configuration is invalid; using defaults");
                    RiskScoringConfig::standard()
                }
            },
            Ok(None) => RiskScoringConfig::standard(),
            Err(error) => {
                warn!(%error, "could not read risk configuration; using defaults");
                RiskScoringConfig::standard()
            }
        };

        let criteria = match load_json::<Vec<QualificationCriterion>, _>(
            store.as_ref(),
            keys::QUALIFICATION_CRITERIA,
        ) {
            Ok(Some(criteria)) => criteria,
            Ok(None) => default_criteria(),
            Err(error) => {
                warn!(%error, "could not read qualification criteria; using defaults");
                default_criteria()
            }
        };

        Self {
            store,
            config: RwLock::new(config),
            criteria: RwLock::new(criteria),
            reviews: Mutex::new(()),
        }
    }

    pub fn config(&self) -> RiskScoringConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_config(
        &self,
        config: RiskScoringConfig,
    ) -> Result<RiskScoringConfig, ConfigStoreError> {
        config.validate()?;
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = save_json(self.store.as_ref(), keys::RISK_CONFIG, &config) {
            warn!(%error, "failed to persist risk configuration; keeping previous");
            return Err(error.into());
        }

        *current = config.clone();
        drop(current);
        info!(categories = config.categories.len(), "risk configuration updated");
        Ok(config)
    }

    pub fn qualification_criteria(&self) -> Vec<QualificationCriterion> {
        self.criteria
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_qualification_criteria(
        &self,
        criteria: Vec<QualificationCriterion>,
    ) -> Result<Vec<QualificationCriterion>, ConfigStoreError> {
        validate_criteria(&criteria)?;
        let mut current = self.criteria.write().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = save_json(self.store.as_ref(), keys::QUALIFICATION_CRITERIA, &criteria)
        {
            warn!(%error, "failed to persist qualification criteria; keeping previous");
            return Err(error.into());
        }

        *current = criteria.clone();
        drop(current);
        info!(criteria = criteria.len(), "qualification criteria updated");
        Ok(criteria)
    }

    pub fn save_fmv_review(
        &self,
        provider_id: &str,
        draft: FmvReviewDraft,
    ) -> Result<FmvReview, ConfigStoreError> {
        let _guard = self.reviews.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reviews = self.fmv_reviews()?;
        let review = draft.into_review(provider_id, Utc::now());
        reviews.insert(provider_id.to_string(), review.clone());

        if let Err(error) = save_json(self.store.as_ref(), keys::FMV_REVIEWS, &reviews) {
            warn!(%provider_id, %error, "failed to persist FMV review");
            return Err(error.into());
        }
        Ok(review)
    }

    pub fn load_fmv_review(&self, provider_id: &str) -> Result<Option<FmvReview>, ConfigStoreError> {
        Ok(self.fmv_reviews()?.remove(provider_id))
    }

    // Strict read: a corrupt map must not be silently replaced by a one-entry map on save.
    fn fmv_reviews(&self) -> Result<BTreeMap<String, FmvReview>, ConfigStoreError> {
        Ok(load_json(self.store.as_ref(), keys::FMV_REVIEWS)?.unwrap_or_default())
    }
}

fn validate_criteria(criteria: &[QualificationCriterion]) -> Result<(), ConfigStoreError> {
    let mut seen = HashSet::new();
    for criterion in criteria {
        if criterion.id.trim().is_empty() {
            return Err(ConfigStoreError::InvalidCriteria(
                "criterion id must not be empty".to_string(),
            ));
        }
        if !seen.insert(criterion.id.as_str()) {
            return Err(ConfigStoreError::InvalidCriteria(format!(
                "duplicate criterion '{}'",
                criterion.id
            )));
        }
        if let QualificationRule::Range { bands } = &criterion.rule {
            let malformed = bands.iter().any(|band| {
                !band.min.is_finite()
                    || band
                        .max
                        .is_some_and(|max| !max.is_finite() || max <= band.min)
            });
            if malformed {
                return Err(ConfigStoreError::InvalidCriteria(format!(
                    "criterion '{}' has a malformed range band",
                    criterion.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmv::storage::InMemoryStore;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    struct ReadOnlyStore(InMemoryStore);

    /// Both directions stall so racing writers overlap.
    #[derive(Default)]
    struct SlowStore(InMemoryStore);

    impl KeyValueStore for SlowStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            thread::sleep(Duration::from_millis(50));
            self.0.get(key)
        }

        fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
            thread::sleep(Duration::from_millis(50));
            self.0.put(key, value)
        }
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn put(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn first_run_uses_defaults() {
        let store = RiskConfigStore::load(Arc::new(InMemoryStore::default()));
        assert_eq!(store.config(), RiskScoringConfig::standard());
        assert_eq!(store.qualification_criteria(), default_criteria());
    }

    #[test]
    fn persisted_config_wins_on_reload() {
        let backend = Arc::new(InMemoryStore::default());
        let store = RiskConfigStore::load(Arc::clone(&backend));

        let mut config = RiskScoringConfig::standard();
        config.overall_bands[0].max = 4.0;
        store.update_config(config.clone()).expect("updates");

        let reloaded = RiskConfigStore::load(backend);
        assert_eq!(reloaded.config(), config);
    }

    #[test]
    fn invalid_config_is_rejected_without_side_effects() {
        let store = RiskConfigStore::load(Arc::new(InMemoryStore::default()));
        let mut config = RiskScoringConfig::standard();
        config.categories[0].thresholds.clear();

        let error = store.update_config(config).expect_err("invalid");
        assert!(matches!(
            error,
            ConfigStoreError::Validation(ConfigValidationError::EmptyThresholds(_))
        ));
        assert_eq!(store.config(), RiskScoringConfig::standard());
    }

    #[test]
    fn storage_failure_keeps_previous_config() {
        let store = RiskConfigStore::load(Arc::new(ReadOnlyStore(InMemoryStore::default())));
        let mut config = RiskScoringConfig::standard();
        config.overall_bands[0].max = 2.0;

        let error = store.update_config(config).expect_err("storage fails");
        assert!(matches!(error, ConfigStoreError::Storage(_)));
        assert_eq!(store.config(), RiskScoringConfig::standard());
    }

    #[test]
    fn corrupt_persisted_config_falls_back_to_defaults() {
        let backend = InMemoryStore::default();
        backend
            .put(keys::RISK_CONFIG, "[[[".to_string())
            .expect("raw put");
        let store = RiskConfigStore::load(Arc::new(backend));
        assert_eq!(store.config(), RiskScoringConfig::standard());
    }

    #[test]
    fn duplicate_criteria_are_rejected() {
        let store = RiskConfigStore::load(Arc::new(InMemoryStore::default()));
        let mut criteria = default_criteria();
        criteria.push(criteria[0].clone());
        let error = store
            .update_qualification_criteria(criteria)
            .expect_err("duplicate");
        assert!(matches!(error, ConfigStoreError::InvalidCriteria(_)));
    }

    #[test]
    fn empty_range_bands_are_rejected() {
        let store = RiskConfigStore::load(Arc::new(InMemoryStore::default()));
        let mut criteria = default_criteria();
        if let QualificationRule::Range { bands } = &mut criteria[0].rule {
            bands[0].max = Some(bands[0].min);
        }
        let error = store
            .update_qualification_criteria(criteria)
            .expect_err("empty band");
        assert!(matches!(error, ConfigStoreError::InvalidCriteria(_)));
        assert_eq!(store.qualification_criteria(), default_criteria());
    }

    #[test]
    fn fmv_reviews_are_keyed_by_provider() {
        let store = RiskConfigStore::load(Arc::new(InMemoryStore::default()));
        let draft = FmvReviewDraft {
            notes: "first pass".to_string(),
            ..FmvReviewDraft::default()
        };
        store.save_fmv_review("E100", draft).expect("saves");
        store
            .save_fmv_review("E200", FmvReviewDraft::default())
            .expect("saves");

        let review = store
            .load_fmv_review("E100")
            .expect("loads")
            .expect("present");
        assert_eq!(review.notes, "first pass");
        assert!(store.load_fmv_review("E999").expect("loads").is_none());
    }

    #[test]
    fn racing_reviews_for_different_providers_are_both_saved() {
        let store = RiskConfigStore::load(Arc::new(SlowStore::default()));
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            for provider_id in ["E100", "E200"] {
                let (store, barrier) = (&store, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    store
                        .save_fmv_review(provider_id, FmvReviewDraft::default())
                        .expect("saves");
                });
            }
        });

        assert!(store.load_fmv_review("E100").expect("loads").is_some());
        assert!(store.load_fmv_review("E200").expect("loads").is_some());
    }

    #[test]
    fn racing_config_updates_leave_memory_and_storage_in_agreement() {
        let backend = Arc::new(SlowStore::default());
        let store = RiskConfigStore::load(Arc::clone(&backend));
        let barrier = Barrier::new(3);

        thread::scope(|scope| {
            for low_max in [2.0, 3.0, 4.0] {
                let (store, barrier) = (&store, &barrier);
                scope.spawn(move || {
                    let mut config = RiskScoringConfig::standard();
                    config.overall_bands[0].max = low_max;
                    barrier.wait();
                    store.update_config(config).expect("updates");
                });
            }
        });

        let persisted: RiskScoringConfig = load_json(backend.as_ref(), keys::RISK_CONFIG)
            .expect("loads")
            .expect("present");
        assert_eq!(store.config(), persisted);
    }
}
