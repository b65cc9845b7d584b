use crate::cli::ServeArgs;
use crate::infra::{AppState, StoreBackend};
use crate::routes::with_fmv_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fmv_core::config::AppConfig;
use fmv_core::error::AppError;
use fmv_core::fmv::service::FmvService;
use fmv_core::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = Some(data_dir);
    }
    if let Some(strategy) = args.strategy.take() {
        config.analysis.percentile_strategy = strategy;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = StoreBackend::open(config.storage.data_dir.as_deref())?;
    let storage = store.describe();
    let service = Arc::new(FmvService::new(
        Arc::new(store),
        config.analysis.percentile_strategy,
    ));
    let strategy = service.strategy();

    let app = with_fmv_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %storage,
        strategy = strategy.label(),
        "fmv review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
