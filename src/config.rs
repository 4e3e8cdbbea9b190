// Configuration File Support
//
// TOML configuration for the nl2bash guard, with environment variable
// overrides. Loaded from the XDG config directory by default:
// ~/.config/nl2bash-guard/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::safety::{RiskClassifier, RuleCatalog, RuleCategory, RuleSpec};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP boundary configuration
    pub server: ServerConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,

    /// Extra policy rules
    pub rules: RulesConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Parse host and port into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to expose /metrics on the HTTP server
    pub enabled: bool,
}

/// Policy rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Rules appended to the built-in catalog
    pub extra: Vec<RuleSpec>,
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/nl2bash-guard/config.toml` on Linux
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "nl2bash", "nl2bash-guard") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("nl2bash-guard")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - NL2BASH_LOG_LEVEL
    /// - NL2BASH_LOG_FORMAT
    /// - NL2BASH_HOST
    /// - NL2BASH_PORT
    /// - NL2BASH_METRICS_ENABLED
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("NL2BASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NL2BASH_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(host) = std::env::var("NL2BASH_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("NL2BASH_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                if port > 0 {
                    self.server.port = port;
                }
            }
        }

        if let Ok(enabled) = std::env::var("NL2BASH_METRICS_ENABLED") {
            self.metrics.enabled = enabled.parse().unwrap_or(self.metrics.enabled);
        }

        self
    }

    /// Validate the configuration
    ///
    /// Extra rules are only checked for shape here; their patterns are
    /// compiled by `build_classifier`.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }
        if self.server.host.trim().is_empty() {
            anyhow::bail!("Server host must not be empty");
        }

        for rule in &self.rules.extra {
            if rule.name.trim().is_empty() {
                anyhow::bail!("Extra rule with pattern '{}' has no name", rule.pattern);
            }
            if rule.pattern.trim().is_empty() {
                anyhow::bail!("Extra rule '{}' has an empty pattern", rule.name);
            }
            // Hints never surface a reason
            if rule.reason.trim().is_empty() && rule.category != RuleCategory::ReadOnlyHint {
                anyhow::bail!("Extra rule '{}' has an empty reason", rule.name);
            }
        }

        Ok(())
    }

    /// Compile the built-in catalog plus configured extras into a classifier
    ///
    /// This is the single place the catalog is compiled; an invalid pattern
    /// aborts startup.
    pub fn build_classifier(&self) -> Result<RiskClassifier> {
        let mut catalog = RuleCatalog::builtin().context("Failed to compile built-in rules")?;
        catalog
            .extend(self.rules.extra.iter().cloned())
            .context("Failed to compile configured rules")?;
        tracing::debug!(
            "Compiled rule catalog: {} rules ({} from config)",
            catalog.len(),
            self.rules.extra.len()
        );
        Ok(RiskClassifier::new(catalog))
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
