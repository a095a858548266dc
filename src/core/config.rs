//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.docchat/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DocchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub quick_actions: Vec<QuickAction>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Wait between reloading a document and jumping to the cited page.
    pub seek_delay_ms: Option<u64>,
}

/// Canned question bound to a function key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuickAction {
    pub label: String,
    pub prompt: String,
}

impl QuickAction {
    pub fn new(label: &str, prompt: &str) -> Self {
        Self {
            label: label.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SEEK_DELAY_MS: u64 = 100;
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

pub fn default_quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction::new(
            "Summarize",
            "Summarize this document in 5 concise bullet points.",
        ),
        QuickAction::new(
            "Risks",
            "Identify potential risks, warnings, or negative clauses.",
        ),
        QuickAction::new(
            "Dates",
            "List all important dates, deadlines, and timelines.",
        ),
    ]
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub seek_delay: Duration,
    pub log_level: LevelFilter,
    pub quick_actions: Vec<QuickAction>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve_with(&DocchatConfig::default(), &CliOverrides::default(), |_| None)
    }
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub server: Option<String>,
    pub seek_delay_ms: Option<u64>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.docchat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".docchat").join("config.toml"))
}

/// Load config from `~/.docchat/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `DocchatConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<DocchatConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(DocchatConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<DocchatConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(DocchatConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: DocchatConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_FILE: &str = r#"# docchat Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "debug"                # Or set DOCCHAT_LOG_LEVEL

# [server]
# base_url = "http://localhost:8000" # Or set DOCCHAT_SERVER_URL / --server
# connect_timeout_secs = 10

# [viewer]
# seek_delay_ms = 100                # Or set DOCCHAT_SEEK_DELAY_MS / --seek-delay-ms

# Quick actions replace the built-in F1-F3 prompts when present.
# [[quick_actions]]
# label = "Summarize"
# prompt = "Summarize this document in 5 concise bullet points."

# [[quick_actions]]
# label = "Risks"
# prompt = "Identify potential risks, warnings, or negative clauses."
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_FILE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &DocchatConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an explicit environment lookup.
pub fn resolve_with(
    config: &DocchatConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Server URL: CLI → env → config → default
    let base_url = cli
        .server
        .clone()
        .or_else(|| env("DOCCHAT_SERVER_URL"))
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Seek delay: CLI → env → config → default
    let seek_delay_ms = cli
        .seek_delay_ms
        .or_else(|| parse_env(&env, "DOCCHAT_SEEK_DELAY_MS"))
        .or(config.viewer.seek_delay_ms)
        .unwrap_or(DEFAULT_SEEK_DELAY_MS);

    // Log level: env → config → default
    let log_level = env("DOCCHAT_LOG_LEVEL")
        .or_else(|| config.general.log_level.clone())
        .and_then(|level| match level.parse::<LevelFilter>() {
            Ok(filter) => Some(filter),
            Err(_) => {
                warn!("Unknown log level {:?}, using default", level);
                None
            }
        })
        .unwrap_or(DEFAULT_LOG_LEVEL);

    let quick_actions = if config.quick_actions.is_empty() {
        default_quick_actions()
    } else {
        config.quick_actions.clone()
    };

    ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        connect_timeout: Duration::from_secs(
            config
                .server
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
        seek_delay: Duration::from_millis(seek_delay_ms),
        log_level,
        quick_actions,
    }
}

fn parse_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}
