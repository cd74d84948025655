//! Runtime configuration for the live shoot coordinator.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the configuration JSON is looked up.
const DEFAULT_CONFIG_PATH: &str = "config/live-shoot.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LIVE_SHOOT_CONFIG_PATH";
/// Environment variable overriding the shoot service base URL.
const SERVICE_URL_ENV: &str = "LIVE_SHOOT_SERVICE_URL";
/// Environment variable overriding the session record directory.
const STORAGE_DIR_ENV: &str = "LIVE_SHOOT_STORAGE_DIR";
/// Directory used for the session record when nothing else is configured.
const DEFAULT_STORAGE_DIR: &str = ".live-shoot";
/// Records older than this are considered expired.
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
/// Capacity of the channel event broadcast buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Immutable runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveShootConfig {
    /// Base URL of the HTTP shoot service, when one is used.
    pub service_url: Option<String>,
    /// Directory holding the persisted session record.
    pub storage_dir: PathBuf,
    /// Maximum age of a persisted session record before it is discarded.
    pub session_max_age: Duration,
    /// Buffer size for channel events awaiting the coordinator.
    pub event_capacity: usize,
}

impl LiveShootConfig {
    /// Load the configuration from disk and environment, falling back to defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded live shoot config");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply `LIVE_SHOOT_SERVICE_URL` / `LIVE_SHOOT_STORAGE_DIR` style overrides.
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(SERVICE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.service_url = Some(url);
        }
        if let Some(dir) = lookup(STORAGE_DIR_ENV).filter(|value| !value.trim().is_empty()) {
            self.storage_dir = PathBuf::from(dir);
        }
        self
    }
}

impl Default for LiveShootConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            session_max_age: DEFAULT_SESSION_MAX_AGE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    service_url: Option<String>,
    storage_dir: Option<PathBuf>,
    session_max_age_secs: Option<u64>,
    event_capacity: Option<usize>,
}

impl From<RawConfig> for LiveShootConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            service_url: value.service_url,
            storage_dir: value.storage_dir.unwrap_or(defaults.storage_dir),
            session_max_age: value
                .session_max_age_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_max_age),
            event_capacity: value
                .event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
