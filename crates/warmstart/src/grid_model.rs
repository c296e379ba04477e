//! Grid-based warm-start model.
//!
//! Per step: splat the snapshot onto feature channels, hand the feature
//! stack to a [`GridPredictor`], inject the predicted label grids, and read
//! them back at every contact point. Contact points that receive no
//! contribution from the label grids get no prediction.

use std::collections::BTreeMap;

use sphgrid::{GridManager, GridStack};

use crate::config::{ModelConfig, Readout};
use crate::error::{Result, WarmStartError};
use crate::model::WarmStartModel;
use crate::snapshot::{ContactKey, PointImpulse, WorldSnapshot};

/// Maps a feature stack to a stack of label grids (normal, tangent).
///
/// This is the boundary to a learned image model: input and output stacks
/// are channel-first and shaped like the manager's lattice.
pub trait GridPredictor {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Predict label grids from `features`.
    fn predict(&mut self, features: &GridStack) -> Result<GridStack>;
}

/// Copies selected feature channels into the label slots.
#[derive(Debug, Clone)]
pub struct IdentityPredictor {
    sources: Vec<usize>,
}

impl IdentityPredictor {
    /// Predictor whose label `k` is feature `sources[k]`.
    pub fn new(sources: Vec<usize>) -> Self {
        Self { sources }
    }

    /// Copy each label channel from the feature channel of the same name.
    pub fn matching(config: &ModelConfig) -> Result<Self> {
        let sources = config
            .label_channels
            .iter()
            .map(|label| {
                config
                    .feature_channels
                    .iter()
                    .position(|f| f == label)
                    .ok_or_else(|| {
                        WarmStartError::Config(format!("label '{}' is not a feature channel", label))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }
}

impl GridPredictor for IdentityPredictor {
    fn name(&self) -> &str {
        "identity"
    }

    fn predict(&mut self, features: &GridStack) -> Result<GridStack> {
        let mut labels = GridStack::new(features.dims());
        for &k in &self.sources {
            let grid = features.get(k).ok_or_else(|| {
                WarmStartError::Predictor(format!(
                    "feature {} requested but stack has {} channels",
                    k,
                    features.len()
                ))
            })?;
            labels.push(grid.clone())?;
        }
        Ok(labels)
    }
}

/// Warm-start model backed by a [`GridManager`] and a [`GridPredictor`].
pub struct GridModel<P: GridPredictor> {
    manager: GridManager,
    config: ModelConfig,
    predictor: P,
    name: String,
    predictions: BTreeMap<ContactKey, Vec<PointImpulse>>,
}

impl<P: GridPredictor> GridModel<P> {
    /// Build the manager described by `config` around `predictor`.
    pub fn new(config: ModelConfig, predictor: P) -> Result<Self> {
        config.validate()?;
        let manager = GridManager::new(config.grid.clone())?;
        let name = format!("grid/{}", predictor.name());
        tracing::info!(
            "Grid model '{}' ready: features {:?} -> labels {:?}, readout {:?}",
            name,
            config.feature_channels,
            config.label_channels,
            config.readout
        );
        Ok(Self {
            manager,
            config,
            predictor,
            name,
            predictions: BTreeMap::new(),
        })
    }

    /// The underlying grid manager (populated after a step with contacts).
    pub fn manager(&self) -> &GridManager {
        &self.manager
    }

    /// Model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of contacts with a prediction from the last step.
    pub fn predicted_contacts(&self) -> usize {
        self.predictions.len()
    }
}

impl<P: GridPredictor> WarmStartModel for GridModel<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, world: &WorldSnapshot) -> Result<()> {
        self.predictions.clear();
        self.manager.reset();
        if world.contacts.is_empty() {
            tracing::debug!("No contacts this step, skipping grid prediction");
            return Ok(());
        }

        self.manager.create_grids(&world.body_table(), &self.config.bodies());
        self.manager.create_grids(&world.contact_table(), &self.config.contacts());
        let features = self.manager.stack(&self.config.features())?;

        let labels = self.predictor.predict(&features)?;
        let label_names = self.config.labels();
        self.manager.add_grids(labels, &label_names)?;

        let keys: Vec<_> = world.contacts.iter().map(|c| c.record_key()).collect();
        let points: Vec<_> = world.contacts.iter().map(|c| c.position()).collect();
        let readings: Vec<(usize, [f64; 2])> = match self.config.readout {
            Readout::Gather => {
                let stack = self.manager.stack(&label_names)?;
                let records = self.manager.grids_to_records(&stack, &keys, &points)?;
                let rows: BTreeMap<_, _> = records.into_iter().map(|r| (r.key, r.values)).collect();
                keys.iter()
                    .enumerate()
                    .filter_map(|(i, key)| rows.get(key).map(|v| (i, [v[0], v[1]])))
                    .collect()
            }
            Readout::Interp => {
                self.manager.create_interp(&label_names)?;
                let mut out = Vec::with_capacity(points.len());
                for (i, &[x, y]) in points.iter().enumerate() {
                    let normal = self.manager.query_interp(x, y, label_names[0])?;
                    let tangent = self.manager.query_interp(x, y, label_names[1])?;
                    out.push((i, [normal, tangent]));
                }
                out
            }
        };

        for (i, [normal, tangent]) in readings {
            let c = &world.contacts[i];
            self.predictions.entry(c.key()).or_default().push(PointImpulse {
                point: c.point_index,
                normal,
                tangent,
            });
        }
        tracing::debug!(
            "{} predicted {} of {} contact points",
            self.name,
            self.predictions.values().map(Vec::len).sum::<usize>(),
            world.contacts.len()
        );
        Ok(())
    }

    fn predict(&self, contact: &ContactKey) -> Vec<PointImpulse> {
        self.predictions.get(contact).cloned().unwrap_or_default()
    }
}
