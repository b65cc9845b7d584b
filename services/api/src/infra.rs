use fmv_core::fmv::percentile::PercentileStrategy;
use fmv_core::fmv::storage::{FileStore, InMemoryStore, KeyValueStore, StorageError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Persistence backend chosen at startup: a directory of JSON files when a data directory is
/// configured, process memory otherwise.
#[derive(Debug)]
pub(crate) enum StoreBackend {
    Memory(InMemoryStore),
    File(FileStore),
}

impl StoreBackend {
    pub(crate) fn open(data_dir: Option<&Path>) -> Result<Self, StorageError> {
        match data_dir {
            Some(dir) => Ok(Self::File(FileStore::open(dir)?)),
            None => Ok(Self::Memory(InMemoryStore::default())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "memory".to_string(),
            Self::File(store) => format!("file:{}", store.root().display()),
        }
    }
}

impl KeyValueStore for StoreBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        match self {
            Self::Memory(store) => store.put(key, value),
            Self::File(store) => store.put(key, value),
        }
    }
}

pub(crate) fn parse_strategy(raw: &str) -> Result<PercentileStrategy, String> {
    PercentileStrategy::parse(raw)
        .ok_or_else(|| format!("unknown percentile strategy '{raw}' (use interpolated or rank)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_without_data_dir() {
        let backend = StoreBackend::open(None).expect("opens");
        assert_eq!(backend.describe(), "memory");
        backend.put("marketData", "[]".to_string()).expect("writes");
        assert_eq!(
            backend.get("marketData").expect("reads").as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn strategy_flag_accepts_aliases() {
        assert_eq!(
            parse_strategy("rank").expect("parses"),
            PercentileStrategy::RankBased
        );
        assert!(parse_strategy("median").is_err());
    }
}
