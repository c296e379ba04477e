//! Training sample assembly: one feature stack and one label stack per
//! snapshot. Persisting samples is left to the caller.

use sphgrid::{GridManager, GridStack};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::snapshot::WorldSnapshot;

/// Feature and label grids for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Input channels, in `feature_channels` order.
    pub features: GridStack,
    /// Target channels, in `label_channels` order.
    pub labels: GridStack,
}

impl Sample {
    /// Features flattened channels-last (`[nx][ny][k]`).
    pub fn feature_tensor(&self) -> Vec<f64> {
        self.features.to_channels_last()
    }

    /// Labels flattened channels-last (`[nx][ny][k]`).
    pub fn label_tensor(&self) -> Vec<f64> {
        self.labels.to_channels_last()
    }
}

/// Splat `world` and collect the feature and label stacks.
///
/// Labels are splatted from the contact table, so they must name contact
/// columns (the recorded impulses by default). The manager is reset first
/// and left populated with every splatted channel.
pub fn build_sample(manager: &mut GridManager, world: &WorldSnapshot, config: &ModelConfig) -> Result<Sample> {
    manager.reset();
    manager.create_grids(&world.body_table(), &config.bodies());

    let mut contact_channels = config.contacts();
    for label in config.labels() {
        if !contact_channels.contains(&label) {
            contact_channels.push(label);
        }
    }
    manager.create_grids(&world.contact_table(), &contact_channels);

    Ok(Sample {
        features: manager.stack(&config.features())?,
        labels: manager.stack(&config.labels())?,
    })
}
