//! Configuration for ChessTTY runtime.
//!
//! Every tunable has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both (see `main.rs`).

use std::path::PathBuf;
use std::time::Duration;

use players::{EngineSettings, ProviderConfig, RemoteConfig};

/// Default engine search timeout (in milliseconds).
const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 10_000;

/// Default maximum engine search depth.
const DEFAULT_ENGINE_DEPTH: u8 = 12;

/// Default chat-completion endpoint root.
const DEFAULT_REMOTE_BASE_URL: &str = "https://api.x.ai/v1";

const DEFAULT_REMOTE_MODEL: &str = "grok-3-mini";

/// Default remote request timeout (in seconds).
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Default number of provider attempts per turn before a random move.
const DEFAULT_MAX_ATTEMPTS: usize = 3;

const DEFAULT_LOG_DIR: &str = "logs";

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get the Stockfish executable path, if one is configured.
///
/// `CHESSTTY_STOCKFISH_PATH`; otherwise the engine searches common locations.
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var("CHESSTTY_STOCKFISH_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Get the engine timeout in milliseconds.
///
/// Priority:
/// 1. `CHESSTTY_ENGINE_TIMEOUT_MS` env variable if set (falls back to default
///    if the value cannot be parsed as a `u64`)
/// 2. `10000` ms as fallback
pub fn get_engine_timeout_ms() -> u64 {
    parse_env("CHESSTTY_ENGINE_TIMEOUT_MS", DEFAULT_ENGINE_TIMEOUT_MS)
}

/// Get the maximum engine search depth (`CHESSTTY_ENGINE_DEPTH`, default 12).
pub fn get_engine_depth() -> u8 {
    parse_env("CHESSTTY_ENGINE_DEPTH", DEFAULT_ENGINE_DEPTH)
}

/// Get a fixed engine think time per move (`CHESSTTY_ENGINE_MOVETIME_MS`).
///
/// Unset, empty or unparsable values leave the search depth-limited.
pub fn get_engine_movetime_ms() -> Option<u64> {
    std::env::var("CHESSTTY_ENGINE_MOVETIME_MS")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|ms| *ms > 0)
}

pub fn get_remote_base_url() -> String {
    std::env::var("CHESSTTY_REMOTE_BASE_URL").unwrap_or_else(|_| DEFAULT_REMOTE_BASE_URL.to_string())
}

pub fn get_remote_model() -> String {
    std::env::var("CHESSTTY_REMOTE_MODEL").unwrap_or_else(|_| DEFAULT_REMOTE_MODEL.to_string())
}

/// Get the remote API key.
///
/// Priority:
/// 1. `XAI_API_KEY`
/// 2. `GROK_API_KEY`
pub fn get_remote_api_key() -> Option<String> {
    ["XAI_API_KEY", "GROK_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
}

pub fn get_remote_timeout_secs() -> u64 {
    parse_env("CHESSTTY_REMOTE_TIMEOUT_SECS", DEFAULT_REMOTE_TIMEOUT_SECS)
}

/// Get the number of provider attempts per turn (`CHESSTTY_MAX_ATTEMPTS`, default 3).
pub fn get_max_attempts() -> usize {
    parse_env("CHESSTTY_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)
}

/// Get the directory PGN files are exported to.
///
/// Priority:
/// 1. `CHESSTTY_DATA_DIR` env variable if set
/// 2. `<data dir>/chesstty` from the platform data directory
/// 3. the current directory
pub fn get_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("CHESSTTY_DATA_DIR") {
        return PathBuf::from(path);
    }

    dirs::data_dir()
        .map(|dir| dir.join("chesstty"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the directory for rolling log files (`CHESSTTY_LOG_DIR`, default `logs`).
pub fn get_log_dir() -> PathBuf {
    if let Ok(path) = std::env::var("CHESSTTY_LOG_DIR") {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_LOG_DIR)
}

/// Provider settings assembled from the environment.
pub fn provider_config_from_env() -> ProviderConfig {
    ProviderConfig {
        engine: EngineSettings {
            path: get_stockfish_path(),
            max_depth: get_engine_depth(),
            movetime_ms: get_engine_movetime_ms(),
            timeout: Duration::from_millis(get_engine_timeout_ms()),
            ..Default::default()
        },
        remote: RemoteConfig {
            base_url: get_remote_base_url(),
            model: get_remote_model(),
            api_key: get_remote_api_key(),
            timeout: Duration::from_secs(get_remote_timeout_secs()),
            ..Default::default()
        },
        max_attempts: get_max_attempts(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_engine_timeout_ms() {
        let timeout = get_engine_timeout_ms();
        match std::env::var("CHESSTTY_ENGINE_TIMEOUT_MS") {
            Ok(val) => assert_eq!(timeout, val.parse().unwrap_or(DEFAULT_ENGINE_TIMEOUT_MS)),
            Err(_) => assert_eq!(timeout, DEFAULT_ENGINE_TIMEOUT_MS),
        }
    }

    #[test]
    fn test_get_engine_depth_default() {
        if std::env::var("CHESSTTY_ENGINE_DEPTH").is_err() {
            assert_eq!(get_engine_depth(), DEFAULT_ENGINE_DEPTH);
        }
    }

    #[test]
    fn test_get_max_attempts_default() {
        if std::env::var("CHESSTTY_MAX_ATTEMPTS").is_err() {
            assert_eq!(get_max_attempts(), DEFAULT_MAX_ATTEMPTS);
        }
    }

    #[test]
    fn test_get_remote_defaults() {
        match std::env::var("CHESSTTY_REMOTE_MODEL") {
            Ok(val) => assert_eq!(get_remote_model(), val),
            Err(_) => assert_eq!(get_remote_model(), DEFAULT_REMOTE_MODEL),
        }
        match std::env::var("CHESSTTY_REMOTE_BASE_URL") {
            Ok(val) => assert_eq!(get_remote_base_url(), val),
            Err(_) => assert_eq!(get_remote_base_url(), DEFAULT_REMOTE_BASE_URL),
        }
    }

    #[test]
    fn test_get_log_dir() {
        let dir = get_log_dir();
        match std::env::var("CHESSTTY_LOG_DIR") {
            Ok(val) => assert_eq!(dir, PathBuf::from(val)),
            Err(_) => assert_eq!(dir, PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        assert_eq!(parse_env("CHESSTTY_TEST_UNSET_VARIABLE", 42u64), 42);
    }

    #[test]
    fn test_provider_config_from_env_carries_values() {
        let config = provider_config_from_env();
        assert_eq!(config.max_attempts, get_max_attempts());
        assert_eq!(
            config.engine.timeout,
            Duration::from_millis(get_engine_timeout_ms())
        );
        assert_eq!(config.remote.model, get_remote_model());
        assert_eq!(config.engine.movetime_ms, get_engine_movetime_ms());
    }
}
