use crate::cli::ServeArgs;
use crate::infra::{
    create_pool, run_migrations, AppState, DiskFileStore, MySqlApplicationRepository,
    MySqlCatalogRepository, MySqlUserRepository,
};
use crate::routes::app_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use guidance::accounts::AccountsService;
use guidance::admissions::AdmissionsService;
use guidance::config::AppConfig;
use guidance::error::AppError;
use guidance::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let pool = create_pool(&config.database)
        .await
        .map_err(AppError::database)?;
    run_migrations(&pool).await.map_err(AppError::database)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let applications = Arc::new(MySqlApplicationRepository::new(pool.clone()));
    let catalog = Arc::new(MySqlCatalogRepository::new(pool.clone()));
    let users = Arc::new(MySqlUserRepository::new(pool));
    let files = Arc::new(DiskFileStore::new(config.storage.upload_dir.clone()));

    let admissions = Arc::new(AdmissionsService::new(
        applications,
        catalog.clone(),
        files,
        config.storage.clone(),
    ));
    let accounts = Arc::new(AccountsService::new(users));

    let app = app_router(
        admissions,
        catalog,
        accounts,
        config.storage.upload_dir.clone(),
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "career guidance admissions service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) async fn run_migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = create_pool(&config.database)
        .await
        .map_err(AppError::database)?;
    run_migrations(&pool).await.map_err(AppError::database)?;

    info!("migrations complete");
    Ok(())
}
