//! Configuration management for shell-driver.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::logging::DEFAULT_LEVEL;
use crate::session::{ShellConfig, DEFAULT_EXECUTABLE, DEFAULT_SHUTDOWN_GRACE};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell configuration.
    pub shell: ShellSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Shell configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// Interpreter to launch.
    pub executable: PathBuf,
    /// Companion REPL script. Unset uses the bundled one.
    pub script: Option<PathBuf>,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Per-frame deadline in seconds. Unset waits forever.
    pub timeout_secs: Option<u64>,
    /// Shutdown grace period in milliseconds.
    pub shutdown_grace_ms: u64,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            script: None,
            working_dir: None,
            timeout_secs: None,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE.as_millis() as u64,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(executable) = std::env::var("SHELL_DRIVER_EXECUTABLE") {
            self.shell.executable = executable.into();
        }

        if let Ok(script) = std::env::var("SHELL_DRIVER_SCRIPT") {
            self.shell.script = Some(script.into());
        }

        if let Ok(timeout) = std::env::var("SHELL_DRIVER_TIMEOUT") {
            let secs = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(timeout.clone()))?;
            self.shell.timeout_secs = Some(secs);
        }

        if let Ok(level) = std::env::var("SHELL_DRIVER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref executable) = args.executable {
            self.shell.executable = executable.clone();
        }

        if let Some(ref script) = args.script {
            self.shell.script = Some(script.clone());
        }

        if let Some(secs) = args.timeout_secs {
            self.shell.timeout_secs = Some(secs);
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env()?;

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to the runtime shell configuration.
    pub fn to_shell_config(&self) -> Result<ShellConfig, ConfigError> {
        if self.shell.executable.as_os_str().is_empty() {
            return Err(ConfigError::MissingExecutable);
        }

        let mut config = match self.shell.script {
            Some(ref script) => ShellConfig::new(&self.shell.executable, script),
            None => ShellConfig::bundled(&self.shell.executable),
        }
        .shutdown_grace(Duration::from_millis(self.shell.shutdown_grace_ms));

        if let Some(ref dir) = self.shell.working_dir {
            config = config.working_dir(dir);
        }

        match self.shell.timeout_secs {
            Some(0) => return Err(ConfigError::InvalidTimeout("0".to_string())),
            Some(secs) => config = config.timeout(Duration::from_secs(secs)),
            None => {}
        }

        Ok(config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Timeout is not a positive whole number of seconds.
    InvalidTimeout(String),
    /// No interpreter configured.
    MissingExecutable,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidTimeout(value) => write!(f, "invalid timeout: {}", value),
            Self::MissingExecutable => write!(f, "no shell executable configured"),
        }
    }
}

impl std::error::Error for ConfigError {}
