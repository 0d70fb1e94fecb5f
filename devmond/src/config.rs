use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable that must be `true` (or `1`) for the server to start.
pub const LAUNCH_ENV: &str = "LAUNCH_DEV_ENV_MONITOR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sampling: SamplingConfig,
    pub queries: QueryConfig,
    pub processes: ProcessConfig,
    pub debug: DebugConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Outbound frames buffered per subscriber before frames are dropped.
    pub queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 4567,
            queue_depth: crate::hub::DEFAULT_QUEUE_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_secs: u64,
    pub disk_mount: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            disk_mount: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub capacity: usize,
    pub app_root: Option<String>,
    pub frame_silencers: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            capacity: crate::queries::store::DEFAULT_CAPACITY,
            app_root: None,
            frame_silencers: vec![
                "/gems/".to_string(),
                "/rubygems/".to_string(),
                "<internal:".to_string(),
                "/.cargo/registry/".to_string(),
                "/rustc/".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub keywords: Vec<String>,
    pub exclude: Vec<String>,
    /// Evaluated in order, first match wins.
    pub rules: Vec<RuleConfig>,
    pub fallback: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        let rule = |pattern: &str, label: &str| RuleConfig {
            pattern: pattern.to_string(),
            label: label.to_string(),
        };
        Self {
            keywords: vec!["rails".into(), "ruby".into(), "puma".into()],
            exclude: vec!["fsevent_watch".into()],
            rules: vec![
                rule("puma", "Puma server (hosting the Rails application)"),
                rule("rails", "Rails process"),
                rule("devmon", "Monitor process (devmond)"),
            ],
            fallback: "Unknown process".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// The daemon's own threads are always checked for a debugger. When the
    /// instrumented application runs as a separate process and posts to
    /// `/queries`, set this to its pid, otherwise stepping through the app
    /// never holds pushes back.
    pub target_pid: Option<i32>,
    pub debuggers: Vec<String>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            target_pid: None,
            debuggers: ["gdb", "lldb", "rr", "gdbserver", "codelldb"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("failed to parse config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

pub fn launch_flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v.eq_ignore_ascii_case("true") || v == "1"
    })
}

pub fn launch_requested() -> bool {
    launch_flag_enabled(env::var(LAUNCH_ENV).ok().as_deref())
}
