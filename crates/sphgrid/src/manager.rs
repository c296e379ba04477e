//! The [`GridManager`] facade: one per scenario, repopulated every step.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelGrid, ChannelRegistry, GridStack};
use crate::config::GridConfig;
use crate::error::{GridError, GridResult};
use crate::geometry::GridGeometry;
use crate::neighbor::BucketGrid;
use crate::particle::{ParticleTable, RecordKey};
use crate::sph::SmoothingKernel;
use crate::transfer::{self, Gathered};

/// Whether the registry currently holds any channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// Constructed or reset; every query is an unknown-channel error.
    Empty,
    /// At least one channel was computed or injected since the last reset.
    Populated,
}

/// Per-point result of a gather, for points that received a contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Identity of the query point.
    pub key: RecordKey,
    /// One value per gathered channel, in stack order.
    pub values: Vec<f64>,
}

/// Particle <-> grid interpolation engine for one scenario.
///
/// The lattice and support radius are fixed at construction. Per step the
/// caller populates channels with [`create_grids`](Self::create_grids) or
/// [`add_grid`](Self::add_grid), queries them, and calls
/// [`reset`](Self::reset) before the next step.
#[derive(Debug)]
pub struct GridManager {
    config: GridConfig,
    /// Index over the lattice nodes, shared by every splat.
    node_index: BucketGrid,
    registry: ChannelRegistry,
}

impl GridManager {
    /// Create a manager for the lattice and kernel described by `config`.
    pub fn new(config: GridConfig) -> GridResult<Self> {
        config.validate()?;
        let geometry = config.geometry()?;
        let node_index = BucketGrid::build(&geometry.node_positions(), config.support_radius);
        tracing::info!(
            "Grid manager ready: {}x{} nodes, h={}, kernel={}",
            geometry.nx(),
            geometry.ny(),
            config.support_radius,
            config.kernel.name()
        );
        Ok(Self {
            config,
            node_index,
            registry: ChannelRegistry::new(geometry),
        })
    }

    /// Configuration the manager was built from.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Lattice shared by every channel.
    pub fn geometry(&self) -> &GridGeometry {
        self.registry.geometry()
    }

    /// Kernel support radius `h`.
    pub fn support_radius(&self) -> f64 {
        self.config.support_radius
    }

    /// Smoothing kernel used by both transfer directions.
    pub fn kernel(&self) -> SmoothingKernel {
        self.config.kernel
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GridState {
        if self.registry.is_empty() {
            GridState::Empty
        } else {
            GridState::Populated
        }
    }

    /// Splat the requested columns of `table` onto the lattice.
    ///
    /// Channels not present in the table schema are logged and skipped.
    /// Every computed channel replaces any previous array of that name.
    /// Returns the names actually computed, in request order.
    pub fn create_grids(&mut self, table: &ParticleTable, channels: &[&str]) -> Vec<String> {
        let mut names: Vec<&str> = Vec::with_capacity(channels.len());
        let mut columns: Vec<&[f64]> = Vec::with_capacity(channels.len());
        for &name in channels {
            if names.contains(&name) {
                continue;
            }
            match table.column_index(name) {
                Some(c) => {
                    names.push(name);
                    columns.push(table.column_at(c));
                }
                None => tracing::warn!("Channel '{}' not present on records, skipping", name),
            }
        }
        if names.is_empty() {
            return Vec::new();
        }
        if table.is_empty() {
            tracing::debug!("No records this step, {} channels left at zero", names.len());
        }

        let grids = transfer::particles_to_grid(
            self.registry.geometry(),
            &self.node_index,
            &table.positions(),
            &columns,
            self.config.kernel,
            self.config.support_radius,
        );
        for (name, grid) in names.iter().zip(grids) {
            self.registry.replace((*name).to_string(), grid);
        }
        tracing::debug!("Splatted {} records onto {:?}", table.len(), names);
        names.into_iter().map(str::to_string).collect()
    }

    /// Inject an externally computed grid, bypassing splatting.
    pub fn add_grid(&mut self, name: impl Into<String>, grid: ChannelGrid) -> GridResult<()> {
        self.registry.insert(name, grid)
    }

    /// Inject every grid of `stack` under the matching name.
    ///
    /// Nothing is inserted unless the whole stack is valid.
    pub fn add_grids(&mut self, stack: GridStack, names: &[&str]) -> GridResult<()> {
        if stack.len() != names.len() {
            return Err(GridError::ChannelCountMismatch {
                grids: stack.len(),
                names: names.len(),
            });
        }
        self.check_stack(&stack)?;
        for (name, grid) in names.iter().zip(stack.into_grids()) {
            self.registry.replace((*name).to_string(), grid);
        }
        Ok(())
    }

    /// Values of a populated channel.
    pub fn channel(&self, name: &str) -> GridResult<&ChannelGrid> {
        self.registry
            .get(name)
            .ok_or_else(|| GridError::UnknownChannel(name.to_string()))
    }

    /// Names of every populated channel, sorted.
    pub fn channel_names(&self) -> Vec<&str> {
        self.registry.names().collect()
    }

    /// Copy the named channels into a stack, in the order given.
    pub fn stack(&self, names: &[&str]) -> GridResult<GridStack> {
        let mut stack = GridStack::new(self.geometry().dims());
        for name in names {
            stack.push(self.channel(name)?.clone())?;
        }
        Ok(stack)
    }

    /// Fit splines for the named channels now rather than on first query.
    pub fn create_interp(&self, names: &[&str]) -> GridResult<()> {
        for name in names {
            self.registry
                .spline(name)
                .ok_or_else(|| GridError::UnknownChannel((*name).to_string()))?;
        }
        Ok(())
    }

    /// Evaluate the spline of channel `name` at `(x, y)`.
    pub fn query_interp(&self, x: f64, y: f64, name: &str) -> GridResult<f64> {
        let spline = self
            .registry
            .spline(name)
            .ok_or_else(|| GridError::UnknownChannel(name.to_string()))?;
        Ok(spline.evaluate(x, y))
    }

    /// Kernel-weighted lookup of channel `name` at each point, using the same
    /// neighbor search as [`grids_to_particles`](Self::grids_to_particles).
    pub fn query_tree(&self, points: &[[f64; 2]], name: &str) -> GridResult<Vec<f64>> {
        let stack = GridStack::from_grids(self.geometry().dims(), vec![self.channel(name)?.clone()])?;
        let gathered = self.gather(&stack, points);
        Ok((0..gathered.len()).map(|p| gathered.get(p, 0)).collect())
    }

    /// Gather every grid of `stack` onto `points`.
    pub fn grids_to_particles(&self, stack: &GridStack, points: &[[f64; 2]]) -> GridResult<Gathered> {
        self.check_stack(stack)?;
        Ok(self.gather(stack, points))
    }

    /// Gather `stack` onto keyed points, keeping only points that received a
    /// contribution. A key missing from the output means "no prediction".
    pub fn grids_to_records(
        &self,
        stack: &GridStack,
        keys: &[RecordKey],
        points: &[[f64; 2]],
    ) -> GridResult<Vec<PredictionRecord>> {
        if keys.len() != points.len() {
            return Err(GridError::KeyCountMismatch {
                keys: keys.len(),
                points: points.len(),
            });
        }
        let gathered = self.grids_to_particles(stack, points)?;
        Ok(keys
            .iter()
            .enumerate()
            .filter(|(p, _)| gathered.is_covered(*p))
            .map(|(p, &key)| PredictionRecord {
                key,
                values: gathered.row(p).to_vec(),
            })
            .collect())
    }

    /// Drop every channel.
    pub fn reset(&mut self) {
        self.registry.clear();
    }

    fn gather(&self, stack: &GridStack, points: &[[f64; 2]]) -> Gathered {
        transfer::grid_to_points(
            self.registry.geometry(),
            stack,
            points,
            self.config.kernel,
            self.config.support_radius,
        )
    }

    fn check_stack(&self, stack: &GridStack) -> GridResult<()> {
        let expected = self.geometry().dims();
        let found = stack.dims();
        if found != expected {
            return Err(GridError::ShapeMismatch {
                channel: "grid stack".to_string(),
                expected: (expected[0], expected[1]),
                found: (found[0], found[1]),
            });
        }
        Ok(())
    }
}
