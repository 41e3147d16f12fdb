use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use assessment_backend::config::{Config, SessionConfig};
use assessment_backend::routes::build_router;
use assessment_backend::selection::config::SelectionConfig;
use assessment_backend::selection::model::ModelHandle;
use assessment_backend::state::AppState;
use assessment_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: temp_dir
            .path()
            .join("assessment-test.sled")
            .to_string_lossy()
            .to_string(),
        model_path: temp_dir
            .path()
            .join("model")
            .join("scoring_model.json")
            .to_string_lossy()
            .to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        request_timeout_secs: 10,
        session: SessionConfig::default(),
        selection: SelectionConfig::default(),
    }
}

/// App over a fresh sled store with the seeded bank. The model loads lazily
/// from a temp path on first use.
pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(&temp_dir);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let model = Arc::new(ModelHandle::new(&config.model_path));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(store, model, &config, shutdown_tx);

    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}
