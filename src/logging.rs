use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&crate::config::Config> for LogConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

fn file_appender(log_dir: &str) -> Option<RollingFileAppender> {
    match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("assessment-backend")
        .filename_suffix("log")
        .max_log_files(30)
        .build(log_dir)
    {
        Ok(appender) => Some(appender),
        Err(e) => {
            // subscriber 尚未就绪，只能写 stderr
            eprintln!("file logging disabled, cannot open {log_dir}: {e}");
            None
        }
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let file_layer = config
        .enable_file_logs
        .then(|| file_appender(&config.log_dir))
        .flatten()
        .map(|appender| fmt::layer().with_writer(appender).with_ansi(false).json());

    let result = Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    // 已设置全局 subscriber 属于正常情况（测试环境）；首次启动失败则说明配置有误
    if let Err(e) = result {
        let msg = e.to_string();
        if !msg.contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}
