//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ClientError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Client settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Also write diagnostics to daily files under the logs directory
    #[serde(default)]
    pub log_to_file: bool,

    /// Emit diagnostics as JSON
    #[serde(default)]
    pub json_logs: bool,

    /// Build service configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Log stream configuration
    #[serde(default)]
    pub log_stream: LogStreamSettings,

    /// Completion service configuration
    #[serde(default)]
    pub remediation: RemediationSettings,
}

/// Build service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the build service API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Build request timeout in seconds
    #[serde(default = "default_build_timeout")]
    pub build_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_build_timeout() -> u64 {
    900
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            build_timeout_secs: default_build_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Log stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogStreamSettings {
    /// First reconnect delay in seconds
    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_secs: u64,

    /// Reconnect delay cap in seconds
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_secs: u64,
}

fn default_reconnect_base() -> u64 {
    1
}

fn default_reconnect_max() -> u64 {
    30
}

impl Default for LogStreamSettings {
    fn default() -> Self {
        Self {
            reconnect_base_secs: default_reconnect_base(),
            reconnect_max_secs: default_reconnect_max(),
        }
    }
}

/// Completion service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationSettings {
    /// Base URL of the generative language API
    #[serde(default = "default_remediation_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; `GEMINI_API_KEY` is used when absent
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_remediation_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

impl Default for RemediationSettings {
    fn default() -> Self {
        Self {
            base_url: default_remediation_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

/// Load settings, falling back to defaults when the file does not exist
pub async fn load_settings(file: &File) -> Result<Settings, ClientError> {
    if !file.exists().await {
        debug!("No settings file at {}, using defaults", file.path().display());
        return Ok(Settings::default());
    }
    file.read_json::<Settings>().await
}
