//! CLI configuration

use std::path::Path;

use rulepick::PickerConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - warnings and errors
    #[default]
    Normal,
    /// Verbose - session and scope events
    Verbose,
    /// Debug - everything, including rule construction traces
    Debug,
}

impl Verbosity {
    /// Level from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Default tracing directive for this level
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `verbosity`
pub fn init_logging(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Picker configuration from `path`, or defaults
pub fn load_picker_config(path: Option<&Path>) -> CliResult<PickerConfig> {
    match path {
        Some(path) => Ok(PickerConfig::load(path)?),
        None => Ok(PickerConfig::default()),
    }
}
