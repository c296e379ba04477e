//! Error types for grid construction and channel access.
//!
//! Only construction-time problems and explicit lookups surface as errors.
//! Per-step degeneracies (empty input, isolated particles, zero weight sums)
//! are absorbed inside the transfers and reported through `tracing`.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised by the grid engine.
#[derive(Error, Debug)]
pub enum GridError {
    /// Invalid construction parameters (resolution, bounds, support radius).
    #[error("invalid grid configuration: {0}")]
    Configuration(String),

    /// Channel requested from the registry that was never populated.
    #[error("unknown channel `{0}`")]
    UnknownChannel(String),

    /// Externally supplied grid whose shape does not match the geometry.
    #[error("shape mismatch for channel `{channel}`: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Channel (or stack slot) being checked.
        channel: String,
        /// Shape required by the grid geometry, `(nx, ny)`.
        expected: (usize, usize),
        /// Shape actually supplied.
        found: (usize, usize),
    },

    /// Flat buffer whose length does not match the requested shape.
    #[error("buffer of {found} values cannot fill a {nx}x{ny} grid")]
    LengthMismatch {
        /// Nodes along x.
        nx: usize,
        /// Nodes along y.
        ny: usize,
        /// Values supplied.
        found: usize,
    },

    /// Number of grids in a stack does not match the number of names given.
    #[error("got {grids} grids but {names} channel names")]
    ChannelCountMismatch {
        /// Grids supplied.
        grids: usize,
        /// Names supplied.
        names: usize,
    },

    /// Identity keys and query points of a gather are not parallel.
    #[error("got {keys} record keys for {points} query points")]
    KeyCountMismatch {
        /// Keys supplied.
        keys: usize,
        /// Points supplied.
        points: usize,
    },

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
    #[error("failed to parse grid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GridError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
