//! Client configuration and factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examwalk_core::progress::ProgressConfig;
use examwalk_core::statistics::StatsConfig;

use crate::client::{ClientOptions, Credentials, ExamWalkClient};

/// Top-level examwalk configuration.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExamWalkConfig {
    /// Backend root, e.g. `https://api.examwalk.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token. Supports `${VAR}` references.
    #[serde(default)]
    pub token: Option<String>,
    /// Student whose progress is fetched by default.
    #[serde(default)]
    pub student_id: Option<String>,
    /// Target percentage shown next to each summary.
    #[serde(default)]
    pub target_percentage: Option<f64>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Max retries on transient backend errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent requests.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Aggregator settings.
    #[serde(default)]
    pub stats: StatsConfig,
}

impl std::fmt::Debug for ExamWalkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExamWalkConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("student_id", &self.student_id)
            .field("target_percentage", &self.target_percentage)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("parallelism", &self.parallelism)
            .field("stats", &self.stats)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}
fn default_parallelism() -> usize {
    4
}

impl Default for ExamWalkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            student_id: None,
            target_percentage: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            stats: StatsConfig::default(),
        }
    }
}

impl ExamWalkConfig {
    /// Settings for the progress collector. `target` overrides the
    /// configured target percentage.
    pub fn progress_config(&self, target: Option<f64>) -> ProgressConfig {
        ProgressConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            target: target.or(self.target_percentage),
            stats: self.stats.clone(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + len];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examwalk.toml` in the current directory
/// 2. `~/.config/examwalk/config.toml`
///
/// Environment variable overrides: `EXAMWALK_TOKEN`, `EXAMWALK_BASE_URL`,
/// `EXAMWALK_STUDENT_ID`.
pub fn load_config() -> Result<ExamWalkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamWalkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examwalk.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamWalkConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamWalkConfig::default(),
    };

    if config.stats.window() != config.stats.recent_window {
        tracing::warn!(
            "stats.recent_window = {} is out of range, using {}",
            config.stats.recent_window,
            config.stats.window()
        );
    }

    apply_env_overrides(&mut config);

    config.base_url = resolve_env_vars(&config.base_url);
    config.token = config
        .token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
    config.student_id = config.student_id.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn apply_env_overrides(config: &mut ExamWalkConfig) {
    if let Ok(token) = std::env::var("EXAMWALK_TOKEN") {
        config.token = Some(token);
    }
    if let Ok(base_url) = std::env::var("EXAMWALK_BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(student_id) = std::env::var("EXAMWALK_STUDENT_ID") {
        config.student_id = Some(student_id);
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examwalk"))
}

/// Create an authenticated client from configuration.
pub fn create_client(config: &ExamWalkConfig) -> Result<ExamWalkClient> {
    let Some(token) = &config.token else {
        anyhow::bail!("no API token configured. Set `token` in examwalk.toml or EXAMWALK_TOKEN");
    };
    ExamWalkClient::new(
        &config.base_url,
        Credentials::bearer(token.clone()),
        ClientOptions {
            timeout_secs: config.timeout_secs,
        },
    )
}
