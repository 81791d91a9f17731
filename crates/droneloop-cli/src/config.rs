//! Configuration Vault – reads/writes `droneloop.toml` in the data directory.
//!
//! The data directory is `$DRONELOOP_DATA_DIR` when set, otherwise
//! `~/.droneloop`.  The file is rewritten after every load so options added
//! in newer versions show up with their defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const CONFIG_FILE_NAME: &str = "droneloop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the Responses API (without `/v1`).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// System instructions.  Built-in instructions are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_base_url: default_api_base_url(),
            instructions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneConfig {
    /// `host:port` of the drone's HTTP control bridge.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Speed cap applied at startup, in m/s.
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    /// Landing protection state applied at startup.
    #[serde(default)]
    pub landing_protection: bool,

    /// Wait between capture and preview fetch.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Longest distance a single `move` may cover.
    #[serde(default = "default_max_move_distance_m")]
    pub max_move_distance_m: f32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_speed: default_max_speed(),
            landing_protection: false,
            settle_delay_ms: default_settle_delay_ms(),
            max_move_distance_m: default_max_move_distance_m(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Personal weather station id, e.g. `KMAHANOV10`.
    #[serde(default)]
    pub station_id: String,
}

/// API credentials.  Wiped from memory on drop.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Keys {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub openai_api_key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub weather_api_key: String,
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<not set>" } else { "<redacted>" }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys")
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("weather_api_key", &redacted(&self.weather_api_key))
            .finish()
    }
}

/// Persisted configuration stored in `droneloop.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub drone: DroneConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub keys: Keys,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_endpoint() -> String {
    "192.168.1.2:8080".to_string()
}
fn default_max_speed() -> f32 {
    1.0
}
fn default_settle_delay_ms() -> u64 {
    1200
}
fn default_max_move_distance_m() -> f32 {
    droneloop_runtime::DEFAULT_MAX_MOVE_DISTANCE_M
}

// ─────────────────────────────────────────────────────────────────────────────
// Paths
// ─────────────────────────────────────────────────────────────────────────────

/// `$DRONELOOP_DATA_DIR`, or `~/.droneloop`.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DRONELOOP_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    data_dir_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn data_dir_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".droneloop")
}

pub fn config_path_for(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

// ─────────────────────────────────────────────────────────────────────────────
// Load / save
// ─────────────────────────────────────────────────────────────────────────────

/// Load the file (defaults when missing), write it back, then apply
/// environment overrides.  Overrides are never persisted.
pub fn load_and_refresh(path: &Path) -> Result<Config, ConfigError> {
    let cfg = load_from(path)?.unwrap_or_default();
    save_to(&cfg, path)?;
    let mut cfg = cfg;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml::from_str(&raw)?))
}

fn replace_secret(slot: &mut String, value: String) {
    slot.zeroize();
    *slot = value;
}

/// Apply environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `DRONELOOP_MODEL` | `model.name` |
/// | `DRONELOOP_API_BASE_URL` | `model.api_base_url` |
/// | `DRONELOOP_DRONE_ENDPOINT` | `drone.endpoint` |
/// | `OPENAI_API_KEY` | `keys.openai_api_key` |
/// | `DRONELOOP_WEATHER_API_KEY` | `keys.weather_api_key` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("DRONELOOP_MODEL") {
        cfg.model.name = v;
    }
    if let Ok(v) = std::env::var("DRONELOOP_API_BASE_URL") {
        cfg.model.api_base_url = v;
    }
    if let Ok(v) = std::env::var("DRONELOOP_DRONE_ENDPOINT") {
        cfg.drone.endpoint = v;
    }
    if let Ok(v) = std::env::var("OPENAI_API_KEY")
        && !v.is_empty()
    {
        replace_secret(&mut cfg.keys.openai_api_key, v);
    }
    if let Ok(v) = std::env::var("DRONELOOP_WEATHER_API_KEY")
        && !v.is_empty()
    {
        replace_secret(&mut cfg.keys.weather_api_key, v);
    }
}

/// Save the config to `path`, creating the directory if necessary.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source: io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(write_err)?;
        }
    }

    let raw = toml::to_string_pretty(cfg)?;

    // Owner-only file (rw-------) on Unix; it may hold API keys.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;

    Ok(())
}
