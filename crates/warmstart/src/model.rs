//! The warm-start model interface and the baseline models.
//!
//! A model is stepped once per simulation step with the current snapshot
//! and is then asked for impulses contact by contact. An empty prediction
//! means "no opinion": the solver keeps its own warm start for that contact.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::snapshot::{ContactKey, PointImpulse, WorldSnapshot};

/// Impulse predictor consulted by the contact solver.
pub trait WarmStartModel {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Prepare predictions for the contacts of `world`.
    fn step(&mut self, world: &WorldSnapshot) -> Result<()>;

    /// Predicted impulses for the manifold points of `contact`.
    fn predict(&self, contact: &ContactKey) -> Vec<PointImpulse>;
}

/// Predictions of a model that sets every point to fixed impulses.
fn fill_manifolds(world: &WorldSnapshot, normal: f64, tangent: f64) -> BTreeMap<ContactKey, Vec<PointImpulse>> {
    world
        .manifolds()
        .into_iter()
        .map(|(key, points)| {
            let impulses = points
                .into_iter()
                .map(|point| PointImpulse {
                    point,
                    normal,
                    tangent,
                })
                .collect();
            (key, impulses)
        })
        .collect()
}

/// Cold start: every point starts from zero impulse.
#[derive(Debug, Default)]
pub struct NoWarmStart {
    predictions: BTreeMap<ContactKey, Vec<PointImpulse>>,
}

impl WarmStartModel for NoWarmStart {
    fn name(&self) -> &str {
        "none"
    }

    fn step(&mut self, world: &WorldSnapshot) -> Result<()> {
        self.predictions = fill_manifolds(world, 0.0, 0.0);
        Ok(())
    }

    fn predict(&self, contact: &ContactKey) -> Vec<PointImpulse> {
        self.predictions.get(contact).cloned().unwrap_or_default()
    }
}

/// Defer to the solver's own warm start for every contact.
#[derive(Debug, Default)]
pub struct BuiltinWarmStart;

impl WarmStartModel for BuiltinWarmStart {
    fn name(&self) -> &str {
        "builtin"
    }

    fn step(&mut self, _world: &WorldSnapshot) -> Result<()> {
        Ok(())
    }

    fn predict(&self, _contact: &ContactKey) -> Vec<PointImpulse> {
        Vec::new()
    }
}

/// Fixed impulses on every point. With the default values this is a
/// deliberately bad model, useful as an upper bound on solver effort.
#[derive(Debug)]
pub struct ConstantModel {
    normal: f64,
    tangent: f64,
    predictions: BTreeMap<ContactKey, Vec<PointImpulse>>,
}

impl ConstantModel {
    /// Model predicting `normal` / `tangent` everywhere.
    pub fn new(normal: f64, tangent: f64) -> Self {
        Self {
            normal,
            tangent,
            predictions: BTreeMap::new(),
        }
    }
}

impl Default for ConstantModel {
    fn default() -> Self {
        Self::new(10_000.0, 10_000.0)
    }
}

impl WarmStartModel for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn step(&mut self, world: &WorldSnapshot) -> Result<()> {
        self.predictions = fill_manifolds(world, self.normal, self.tangent);
        Ok(())
    }

    fn predict(&self, contact: &ContactKey) -> Vec<PointImpulse> {
        self.predictions.get(contact).cloned().unwrap_or_default()
    }
}

/// Uniformly random impulses: normal in `[0, 20)`, tangent in `[-10, 10)`.
#[derive(Debug)]
pub struct RandomModel {
    rng: StdRng,
    predictions: BTreeMap<ContactKey, Vec<PointImpulse>>,
}

impl RandomModel {
    /// Seeded model; identical seeds draw identical impulse sequences.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            predictions: BTreeMap::new(),
        }
    }
}

impl WarmStartModel for RandomModel {
    fn name(&self) -> &str {
        "random"
    }

    fn step(&mut self, world: &WorldSnapshot) -> Result<()> {
        self.predictions.clear();
        for (key, points) in world.manifolds() {
            let impulses = points
                .into_iter()
                .map(|point| PointImpulse {
                    point,
                    normal: self.rng.gen_range(0.0..20.0),
                    tangent: self.rng.gen_range(-10.0..10.0),
                })
                .collect();
            self.predictions.insert(key, impulses);
        }
        Ok(())
    }

    fn predict(&self, contact: &ContactKey) -> Vec<PointImpulse> {
        self.predictions.get(contact).cloned().unwrap_or_default()
    }
}
