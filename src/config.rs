use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MODEL_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SESSION_TTL_SECS,
};
use crate::selection::config::SelectionConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub model_path: String,
    pub cors_origin: String,
    pub request_timeout_secs: u64,
    pub session: SessionConfig,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions older than this are dropped by the sweep worker.
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            sweep_interval_secs: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let selection_defaults = SelectionConfig::default();
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/assessment.sled"),
            model_path: env_or("MODEL_PATH", DEFAULT_MODEL_PATH),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            request_timeout_secs: env_or_parse(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            session: SessionConfig {
                ttl_secs: env_or_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
                sweep_interval_secs: env_or_parse("SESSION_SWEEP_INTERVAL_SECS", 300_u64),
            },
            selection: SelectionConfig {
                moderate_low: env_or_parse(
                    "SELECTION_MODERATE_LOW",
                    selection_defaults.moderate_low,
                ),
                moderate_high: env_or_parse(
                    "SELECTION_MODERATE_HIGH",
                    selection_defaults.moderate_high,
                ),
                target: env_or_parse("SELECTION_TARGET", selection_defaults.target),
                default_avg_time: env_or_parse(
                    "SELECTION_DEFAULT_AVG_TIME",
                    selection_defaults.default_avg_time,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "MODEL_PATH",
            "SESSION_TTL_SECS",
            "SELECTION_TARGET",
            "SELECTION_MODERATE_HIGH",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.model_path, DEFAULT_MODEL_PATH);
        assert_eq!(cfg.session.ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert_eq!(cfg.selection.target, 0.55);
        assert!(!cfg.enable_file_logs);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("SESSION_TTL_SECS", "60");
        env::set_var("SELECTION_TARGET", "0.6");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.session.ttl_secs, 60);
        assert_eq!(cfg.selection.target, 0.6);
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("SELECTION_MODERATE_HIGH", "high");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.selection.moderate_high, 0.7);
        clear_keys(managed_keys());
    }

    #[test]
    fn bool_flags_accept_common_spellings() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ENABLE_FILE_LOGS", "Yes");
        assert!(Config::from_env().enable_file_logs);
        env::set_var("ENABLE_FILE_LOGS", "maybe");
        assert!(!Config::from_env().enable_file_logs);
        clear_keys(managed_keys());
    }
}
