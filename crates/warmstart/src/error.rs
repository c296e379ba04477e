//! Error type for warm-start models and their configuration.

use std::path::PathBuf;

use sphgrid::GridError;
use thiserror::Error;

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, WarmStartError>;

/// Errors raised while configuring or stepping a warm-start model.
#[derive(Error, Debug)]
pub enum WarmStartError {
    /// Failure inside the grid engine (bad geometry, shape mismatch, ...).
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The grid predictor could not produce label grids.
    #[error("predictor failed: {0}")]
    Predictor(String),

    /// Inconsistent model configuration.
    #[error("invalid model configuration: {0}")]
    Config(String),

    /// Failure reading a configuration file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration JSON.
    #[error("failed to parse model configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
