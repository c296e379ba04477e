//! Configuration parsing and validation for grid warm-start models

use serde::{Deserialize, Serialize};
use sphgrid::GridConfig;
use std::fs;
use std::path::Path;

use crate::error::{Result, WarmStartError};
use crate::snapshot::{BODY_COLUMNS, CONTACT_COLUMNS};

/// How label grids are read back at contact points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readout {
    /// Kernel-weighted gather (inverse of the splat)
    #[default]
    Gather,
    /// Bicubic spline lookup per point
    Interp,
}

/// Which warm-start model to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Cold start (all impulses zero)
    None,
    /// Solver's own warm start
    Builtin,
    /// Fixed 10000 / 10000 impulses
    Constant,
    /// Seeded uniform random impulses
    Random {
        /// RNG seed
        seed: u64,
    },
    /// Grid model with the identity predictor
    Identity,
}

/// Grid model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Lattice and kernel parameters
    #[serde(flatten)]
    pub grid: GridConfig,
    /// Body columns splatted every step
    #[serde(default = "default_body_channels")]
    pub body_channels: Vec<String>,
    /// Contact columns splatted every step
    #[serde(default = "default_contact_channels")]
    pub contact_channels: Vec<String>,
    /// Channels stacked (in order) as predictor input
    #[serde(default = "default_feature_channels")]
    pub feature_channels: Vec<String>,
    /// Normal and tangent impulse channels produced by the predictor
    #[serde(default = "default_label_channels")]
    pub label_channels: Vec<String>,
    /// Readout mode for the label grids
    #[serde(default)]
    pub readout: Readout,
}

// Default values
fn default_body_channels() -> Vec<String> {
    ["mass", "vx", "vy", "omega"].map(String::from).to_vec()
}

fn default_contact_channels() -> Vec<String> {
    vec!["nx".to_string()]
}

fn default_feature_channels() -> Vec<String> {
    ["mass", "vx", "vy", "omega", "nx"].map(String::from).to_vec()
}

fn default_label_channels() -> Vec<String> {
    vec!["ni".to_string(), "ti".to_string()]
}

impl ModelConfig {
    /// Configuration with default channel lists on the given grid
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            body_channels: default_body_channels(),
            contact_channels: default_contact_channels(),
            feature_channels: default_feature_channels(),
            label_channels: default_label_channels(),
            readout: Readout::default(),
        }
    }

    /// Configuration that splats the recorded impulses and feeds them
    /// straight back as labels
    pub fn identity(grid: GridConfig) -> Self {
        let impulses = default_label_channels();
        Self {
            contact_channels: impulses.clone(),
            feature_channels: impulses,
            body_channels: Vec::new(),
            ..Self::new(grid)
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| WarmStartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;

        // Splat channels must name snapshot columns
        for name in &self.body_channels {
            if !BODY_COLUMNS.contains(&name.as_str()) {
                return Err(WarmStartError::Config(format!("'{}' is not a body column", name)));
            }
        }
        for name in &self.contact_channels {
            if !CONTACT_COLUMNS.contains(&name.as_str()) {
                return Err(WarmStartError::Config(format!("'{}' is not a contact column", name)));
            }
        }

        // Body and contact tables share px / py; a channel may come from one only
        if let Some(dup) = self
            .body_channels
            .iter()
            .find(|name| self.contact_channels.contains(name))
        {
            return Err(WarmStartError::Config(format!(
                "'{}' is splatted from both bodies and contacts",
                dup
            )));
        }

        if self.feature_channels.is_empty() {
            return Err(WarmStartError::Config("at least one feature channel is required".to_string()));
        }
        for name in &self.feature_channels {
            if !self.body_channels.contains(name) && !self.contact_channels.contains(name) {
                return Err(WarmStartError::Config(format!(
                    "feature channel '{}' is never splatted",
                    name
                )));
            }
        }

        if self.label_channels.len() != 2 {
            return Err(WarmStartError::Config(format!(
                "expected normal and tangent label channels, got {}",
                self.label_channels.len()
            )));
        }
        if self.label_channels[0] == self.label_channels[1] {
            return Err(WarmStartError::Config("label channels must differ".to_string()));
        }

        Ok(())
    }

    /// Feature channel names as string slices
    pub fn features(&self) -> Vec<&str> {
        self.feature_channels.iter().map(String::as_str).collect()
    }

    /// Label channel names as string slices
    pub fn labels(&self) -> Vec<&str> {
        self.label_channels.iter().map(String::as_str).collect()
    }

    /// Body channel names as string slices
    pub fn bodies(&self) -> Vec<&str> {
        self.body_channels.iter().map(String::as_str).collect()
    }

    /// Contact channel names as string slices
    pub fn contacts(&self) -> Vec<&str> {
        self.contact_channels.iter().map(String::as_str).collect()
    }
}
