//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.controller-attach.toml` files.

use crate::discovery::{validate_capacity, DEFAULT_CAPACITY};
use crate::models::validate_namespace;
use crate::models::NamespaceScope;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".controller-attach.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Discovery channel settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Explicit log level (error, warn, info, debug, trace).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Settings handed to the controllers at attach time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Namespace to watch. Empty means all namespaces.
    #[serde(default)]
    pub namespace: String,
}

/// Discovery channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Kinds buffered per subscriber before it starts lagging.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.controller-attach.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref namespace) = args.namespace {
            self.runtime.namespace = namespace.clone();
        }

        if let Some(capacity) = args.discovery_capacity {
            self.discovery.capacity = capacity;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that would otherwise only fail once the runtime starts.
    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.discovery.capacity).map_err(|e| anyhow!(e))?;

        let namespace = self.runtime.namespace.trim();
        if !namespace.is_empty() {
            validate_namespace(namespace).map_err(|e| anyhow!(e))?;
        }

        Ok(())
    }

    /// The namespace scope handed to every controller.
    pub fn scope(&self) -> NamespaceScope {
        NamespaceScope::new(self.runtime.namespace.as_str())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
