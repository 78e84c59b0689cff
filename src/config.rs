use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CONFIG_DIR: &str = "config";
const SESSION_FILE_NAME: &str = "session.json";

/// Console configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Base URL of the inventory backend, without the `/api` suffix
    #[validate(custom = "validate_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds (1s - 5min)
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Override for the persisted session file
    #[serde(default)]
    pub session_file: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL.to_string(), DEFAULT_ENV.to_string())
    }
}

impl ConsoleConfig {
    /// Creates a new configuration
    pub fn new(api_base_url: String, environment: String) -> Self {
        Self {
            api_base_url,
            request_timeout_secs: default_request_timeout_secs(),
            environment,
            log_level: default_log_level(),
            log_json: false,
            session_file: None,
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Where the login session is persisted.
    ///
    /// Resolution order: explicit `session_file`, `$LOT_CONSOLE_HOME`,
    /// then `~/.lot-console/session.json`.
    pub fn session_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.session_file.as_ref().filter(|p| !p.trim().is_empty()) {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = env::var("LOT_CONSOLE_HOME") {
            let mut path = PathBuf::from(dir);
            path.push(SESSION_FILE_NAME);
            return Some(path);
        }

        env::var("HOME").ok().map(|home| {
            let mut path = PathBuf::from(home);
            path.push(".lot-console");
            path.push(SESSION_FILE_NAME);
            path
        })
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConsoleConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn validate_api_base_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => {
            let mut err = ValidationError::new("api_base_url");
            err.message = Some("api_base_url must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("lot_console={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    // Logs go to stderr so `--json` output on stdout stays parseable.
    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Loads console configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<ConsoleConfig, ConsoleConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] with an explicit config directory.
pub fn load_config_from(config_dir: &Path) -> Result<ConsoleConfig, ConsoleConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let console_config: ConsoleConfig = config.try_deserialize()?;

    console_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        ConsoleConfigError::Validation(e)
    })?;

    info!(
        api_base_url = %console_config.api_base_url,
        "Configuration loaded successfully"
    );
    Ok(console_config)
}
