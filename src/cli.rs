//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::discovery::validate_capacity;
use crate::models::validate_namespace;
use clap::Parser;
use std::path::PathBuf;

/// controller-attach - attach control loops to a shared runtime
///
/// Registers every linked control loop, attaches them in order to one
/// manager with a shared discovery channel, then runs the manager until
/// interrupted. Any attachment failure aborts startup.
///
/// Examples:
///   controller-attach
///   controller-attach --namespace observability
///   controller-attach --dry-run --format json
///   controller-attach --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Namespace to watch (empty for all namespaces)
    ///
    /// Overrides the [runtime] namespace setting of the config file.
    #[arg(short, long, value_name = "NAMESPACE", env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .controller-attach.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Kinds buffered per discovery subscriber
    #[arg(long, value_name = "COUNT")]
    pub discovery_capacity: Option<usize>,

    /// Attach every controller, list the workers and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the --dry-run listing (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Generate a default .controller-attach.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dry-run listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(capacity) = self.discovery_capacity {
            validate_capacity(capacity)?;
        }

        if let Some(ref namespace) = self.namespace {
            let namespace = namespace.trim();
            if !namespace.is_empty() {
                validate_namespace(namespace)?;
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
