use std::{process, sync::Arc};

use labmyshare::{
    application::{catalog::CatalogService, error::AppError, regions::RegionService},
    cache::{self, CacheBackend, CacheConfig, RegionAwareCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState, ListCaches},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let cache_config = CacheConfig::from(&settings.cache);
    let backend = cache::build_backend(&cache_config)
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    match command {
        config::Command::Serve(_) => run_serve(settings, cache_config, backend).await,
        config::Command::PurgeCache(args) => run_purge_cache(backend, &args.pattern).await,
    }
}

async fn run_serve(
    settings: config::Settings,
    cache_config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let regions = RegionService::new(
        repositories.clone(),
        backend.clone(),
        cache_config.region_timeout,
        settings.regions.default_region.clone(),
    );
    let catalog = CatalogService::new(
        repositories.clone(),
        RegionAwareCache::new(backend.clone(), cache_config.default_timeout),
    );

    let state = HttpState {
        regions,
        catalog,
        lists: ListCaches::new(backend.clone(), &cache_config),
        health: repositories,
        cache: backend.clone(),
    };

    info!(
        target = "labmyshare::serve",
        addr = %settings.server.addr,
        cache_backend = backend.name(),
        default_region = settings.regions.default_region.as_deref().unwrap_or("global"),
        "starting http server"
    );

    serve_http(&settings, state).await
}

async fn run_purge_cache(backend: Arc<dyn CacheBackend>, pattern: &str) -> Result<(), AppError> {
    if pattern.trim().is_empty() {
        return Err(AppError::validation("purge pattern must not be empty"));
    }

    let deleted = cache::invalidate_pattern(&*backend, pattern).await;
    info!(
        target = "labmyshare::purge_cache",
        pattern,
        deleted,
        backend = backend.name(),
        "cache purge finished"
    );
    println!("{deleted}");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let shutdown = Arc::new(Notify::new());
    let drain = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { drain.notified().await });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        () = shutdown_signal() => {}
    }

    info!(
        target = "labmyshare::serve",
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutdown signal received, draining connections"
    );
    shutdown.notify_one();

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                target = "labmyshare::serve",
                "graceful shutdown timed out, dropping open connections"
            );
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "labmyshare::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
