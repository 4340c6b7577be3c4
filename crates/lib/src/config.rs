//! Configuration types and loading.
//!
//! Config is loaded from an optional JSON file (e.g. `~/.reminders-bridge/config.json`).
//! Every key has a default, so a missing file runs the bridge exactly as shipped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::script::DEFAULT_LIST_NAME;
use crate::token;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Listener settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Reminder defaults and the interpreter used to create them.
    #[serde(default)]
    pub reminders: RemindersConfig,
}

/// Listener bind, port, token file and preflight origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Port for HTTP (default 19092).
    #[serde(default = "default_bridge_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1"). Must be loopback.
    #[serde(default = "default_bridge_bind")]
    pub bind: String,

    /// Where the per-run token is written. Default: `bridge_config.json` next to the executable.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// `Access-Control-Allow-Origin` sent on preflight responses.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// Default list and interpreter command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindersConfig {
    /// List used when a request has no listName (default "Create Reminders").
    #[serde(default = "default_list_name")]
    pub default_list: String,

    /// Interpreter program (default "osascript").
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Arguments placed before the script (default ["-e"]).
    #[serde(default = "default_interpreter_args")]
    pub interpreter_args: Vec<String>,
}

fn default_bridge_port() -> u16 {
    19092
}

fn default_bridge_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_allowed_origin() -> String {
    "chrome-extension://*".to_string()
}

fn default_list_name() -> String {
    DEFAULT_LIST_NAME.to_string()
}

fn default_interpreter() -> String {
    "osascript".to_string()
}

fn default_interpreter_args() -> Vec<String> {
    vec!["-e".to_string()]
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: default_bridge_port(),
            bind: default_bridge_bind(),
            token_file: None,
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            default_list: default_list_name(),
            interpreter: default_interpreter(),
            interpreter_args: default_interpreter_args(),
        }
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "localhost"
        || b.parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

/// Resolve the token file path: configured path or the default next to the executable.
pub fn resolve_token_path(config: &Config) -> PathBuf {
    config
        .bridge
        .token_file
        .clone()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(token::default_token_path)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("REMINDERS_BRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".reminders-bridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, else REMINDERS_BRIDGE_CONFIG_PATH, else the default.
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
