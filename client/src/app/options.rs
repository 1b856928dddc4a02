//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::logs::{LogLevel, LogOptions};
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::utils::CooldownOptions;
use crate::workers::log_stream;

/// Environment variable holding the completion service API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Build service configuration
    pub backend: BackendOptions,

    /// Log stream worker options
    pub log_stream: log_stream::Options,

    /// Completion service configuration
    pub remediation: RemediationOptions,

    /// Logging configuration
    pub logging: LogOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend: BackendOptions::default(),
            log_stream: log_stream::Options::default(),
            remediation: RemediationOptions::default(),
            logging: LogOptions::default(),
        }
    }
}

impl AppOptions {
    /// Resolve runtime options from the settings file and environment
    pub fn from_settings(settings: &Settings, layout: &StorageLayout, env_api_key: Option<String>) -> Self {
        let api_key = settings
            .remediation
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or(env_api_key.filter(|key| !key.is_empty()))
            .map(SecretString::from);

        Self {
            lifecycle: LifecycleOptions::default(),
            backend: BackendOptions {
                base_url: settings.backend.base_url.clone(),
                build_timeout: Duration::from_secs(settings.backend.build_timeout_secs),
                connect_timeout: Duration::from_secs(settings.backend.connect_timeout_secs),
            },
            log_stream: log_stream::Options {
                reconnect: CooldownOptions {
                    base_delay: Duration::from_secs(settings.log_stream.reconnect_base_secs),
                    max_delay: Duration::from_secs(settings.log_stream.reconnect_max_secs),
                    ..Default::default()
                },
                ..Default::default()
            },
            remediation: RemediationOptions {
                base_url: settings.remediation.base_url.clone(),
                model: settings.remediation.model.clone(),
                api_key,
                ..Default::default()
            },
            logging: LogOptions {
                log_level: settings.log_level.clone(),
                json_format: settings.json_logs,
                log_dir: settings.log_to_file.then(|| layout.logs_dir()),
                ..Default::default()
            },
        }
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.backend.base_url = base_url;
        }
        self
    }

    pub fn with_log_level(mut self, log_level: Option<LogLevel>) -> Self {
        if let Some(log_level) = log_level {
            self.logging.log_level = log_level;
        }
        self
    }
}

/// Session lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful teardown
    pub max_shutdown_delay: Duration,

    /// Time to let trailing log lines arrive after a build returns
    pub log_drain_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
            log_drain_delay: Duration::from_millis(500),
        }
    }
}

/// Build service options
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// API base URL; build and log endpoints hang off it
    pub base_url: String,

    /// Overall timeout of one build request
    pub build_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/v1".to_string(),
            build_timeout: Duration::from_secs(900),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Completion service options
#[derive(Debug)]
pub struct RemediationOptions {
    /// API base URL
    pub base_url: String,

    /// Model name
    pub model: String,

    /// API key; requests fail without one
    pub api_key: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for RemediationOptions {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}
