//! Construction-time configuration for a grid manager.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};
use crate::geometry::GridGeometry;
use crate::sph::SmoothingKernel;

/// Scenario-wide grid parameters. Fixed for the lifetime of a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Lower-left corner `[x, y]` (position of node `(0, 0)`).
    pub lower_left: [f64; 2],
    /// Upper-right corner `[x, y]`.
    pub upper_right: [f64; 2],
    /// Node spacing along x.
    pub x_res: f64,
    /// Node spacing along y.
    pub y_res: f64,
    /// Kernel support radius `h`.
    pub support_radius: f64,
    /// Smoothing kernel used for both transfer directions.
    #[serde(default)]
    pub kernel: SmoothingKernel,
}

impl GridConfig {
    /// Configuration with the default (poly6) kernel.
    pub fn new(
        lower_left: [f64; 2],
        upper_right: [f64; 2],
        x_res: f64,
        y_res: f64,
        support_radius: f64,
    ) -> Self {
        Self {
            lower_left,
            upper_right,
            x_res,
            y_res,
            support_radius,
            kernel: SmoothingKernel::default(),
        }
    }

    /// Replace the smoothing kernel.
    pub fn with_kernel(mut self, kernel: SmoothingKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> GridResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> GridResult<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GridResult<()> {
        if !(self.support_radius.is_finite() && self.support_radius > 0.0) {
            return Err(GridError::config(format!(
                "support radius must be positive, got {}",
                self.support_radius
            )));
        }
        // Bounds and resolution rules live with the geometry.
        self.geometry().map(|_| ())
    }

    /// Lattice described by this configuration.
    pub fn geometry(&self) -> GridResult<GridGeometry> {
        GridGeometry::new(self.lower_left, self.upper_right, [self.x_res, self.y_res])
    }
}
