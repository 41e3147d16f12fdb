use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use assessment_backend::config::Config;
use assessment_backend::logging::{init_tracing, LogConfig};
use assessment_backend::routes::build_router;
use assessment_backend::selection::model::{ModelError, ModelHandle};
use assessment_backend::state::AppState;
use assessment_backend::store::Store;
use assessment_backend::workers::WorkerManager;
use axum::http::{header, HeaderValue};
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig::from(&config));
    tracing::info!("Starting assessment-backend");

    if let Err(e) = config.selection.validate() {
        panic!("FATAL: invalid selection config: {e}");
    }

    let store = Arc::new(Store::open(&config.sled_path).expect("Failed to open sled database"));
    store.run_migrations().expect("Failed to run migrations");

    // 启动时预热模型；维度不匹配属于配置错误，直接终止
    let model = Arc::new(ModelHandle::new(&config.model_path));
    match model.get() {
        Ok(m) => tracing::info!(
            path = %model.path().display(),
            intercept = m.intercept(),
            "Scoring model ready"
        ),
        Err(e @ ModelError::DimensionMismatch { .. }) => {
            panic!("FATAL: scoring model artifact does not fit the feature encoder: {e}")
        }
        Err(e) => panic!("FATAL: scoring model unavailable: {e}"),
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(store.clone(), model, &config, shutdown_tx.clone());

    let worker_manager =
        WorkerManager::new(state.sessions(), shutdown_tx.subscribe(), &config.session);
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker_manager.start().await {
            tracing::error!(error = %e, "Worker manager failed");
        }
    });

    let app = build_router(state)
        .layer(build_cors_layer(&config))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    // Worker 作为独立后台任务运行，panic 仅记录错误，不终止 HTTP 服务器
    tokio::spawn(async move {
        match worker_handle.await {
            Err(e) => tracing::error!(error = %e, "Worker task panicked, HTTP server continues"),
            Ok(()) => tracing::info!("Worker manager exited normally"),
        }
    });

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any),
        Err(e) => {
            panic!(
                "FATAL: Invalid CORS_ORIGIN '{}': {}. \
                 Fix the CORS_ORIGIN environment variable.",
                config.cors_origin, e
            );
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
