//! Particle -> grid splatting and grid -> particle gathering.
//!
//! Both directions share one shape: every *source* item (a particle when
//! splatting, a grid node when gathering) looks up its neighbor *targets*
//! within the support radius, normalizes kernel weights over that neighbor
//! set, and adds `weight * value` into each target. The neighbor weights are
//! stored once per call as a [`TransferPlan`] in CSR layout and then applied
//! to every channel, so the kernel and the index are evaluated once per
//! source regardless of the channel count.

use crate::channel::{ChannelGrid, GridStack};
use crate::geometry::GridGeometry;
use crate::neighbor::{BucketGrid, SpatialIndex};
use crate::sph::SmoothingKernel;

/// Sparse source -> target weights in compressed-row layout.
///
/// Row `s` holds the targets of source `s` in
/// `targets[offsets[s]..offsets[s + 1]]`, with matching `weights`. A row's
/// weights sum to 1, or the row is empty when the source has no usable
/// neighbors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPlan {
    offsets: Vec<usize>,
    targets: Vec<u32>,
    weights: Vec<f64>,
    target_count: usize,
}

impl TransferPlan {
    /// Compute weights from every source position to the points held by
    /// `targets` that lie strictly within `h`.
    pub fn build<I: SpatialIndex>(
        sources: &[[f64; 2]],
        targets: &I,
        kernel: SmoothingKernel,
        h: f64,
    ) -> Self {
        let mut plan = Self {
            offsets: Vec::with_capacity(sources.len() + 1),
            targets: Vec::new(),
            weights: Vec::new(),
            target_count: targets.len(),
        };
        plan.offsets.push(0);

        let mut found: Vec<(u32, f64)> = Vec::new();
        let mut r_sq: Vec<f64> = Vec::new();
        let mut w: Vec<f64> = Vec::new();
        for &p in sources {
            found.clear();
            targets.for_each_within(p, h, |j, d2| found.push((j as u32, d2)));

            r_sq.clear();
            r_sq.extend(found.iter().map(|&(_, d2)| d2));
            if kernel.normalized_weights(&r_sq, h, &mut w) {
                for (&(j, _), &wj) in found.iter().zip(&w) {
                    // Neighbors sitting exactly on the support boundary carry no weight.
                    if wj > 0.0 {
                        plan.targets.push(j);
                        plan.weights.push(wj);
                    }
                }
            }
            plan.offsets.push(plan.targets.len());
        }
        plan
    }

    /// Number of source rows.
    pub fn source_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of target slots the plan writes into.
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Total stored (source, target) pairs.
    pub fn nnz(&self) -> usize {
        self.targets.len()
    }

    /// Targets and weights of source `s`.
    pub fn row(&self, s: usize) -> (&[u32], &[f64]) {
        let range = self.offsets[s]..self.offsets[s + 1];
        (&self.targets[range.clone()], &self.weights[range])
    }

    /// Sources that reached no target.
    pub fn isolated_sources(&self) -> usize {
        self.offsets.windows(2).filter(|w| w[0] == w[1]).count()
    }

    /// Per-target flag: `true` if at least one source wrote into it.
    pub fn target_coverage(&self) -> Vec<bool> {
        let mut covered = vec![false; self.target_count];
        for &t in &self.targets {
            covered[t as usize] = true;
        }
        covered
    }

    /// `out[t] += w * values[s]` over every stored pair.
    ///
    /// # Panics
    /// If `out` is shorter than the target count.
    pub fn accumulate(&self, values: &[f64], out: &mut [f64]) {
        for (s, &v) in values.iter().enumerate().take(self.source_count()) {
            let (targets, weights) = self.row(s);
            for (&t, &w) in targets.iter().zip(weights) {
                out[t as usize] += w * v;
            }
        }
    }
}

/// Splat particle columns onto the lattice.
///
/// `node_index` must index `geometry`'s node positions in flat storage
/// order. Returns one grid per column, in the order given. Particles with
/// no node inside the support radius contribute nothing.
pub fn particles_to_grid(
    geometry: &GridGeometry,
    node_index: &BucketGrid,
    positions: &[[f64; 2]],
    columns: &[&[f64]],
    kernel: SmoothingKernel,
    h: f64,
) -> Vec<ChannelGrid> {
    let mut grids = vec![ChannelGrid::zeros(geometry.dims()); columns.len()];
    if positions.is_empty() || columns.is_empty() {
        return grids;
    }

    let plan = TransferPlan::build(positions, node_index, kernel, h);
    for (grid, column) in grids.iter_mut().zip(columns) {
        plan.accumulate(column, grid.as_mut_slice());
    }

    let isolated = plan.isolated_sources();
    if isolated > 0 {
        tracing::debug!(
            "Splat dropped {} of {} particles with no grid node in support",
            isolated,
            positions.len()
        );
    }
    grids
}

/// Per-point values gathered from a grid stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered {
    channels: usize,
    /// Row-major `(points, channels)` matrix.
    values: Vec<f64>,
    covered: Vec<bool>,
}

impl Gathered {
    /// Number of query points.
    pub fn len(&self) -> usize {
        self.covered.len()
    }

    /// Return `true` if there were no query points.
    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    /// Number of channels per point.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Values at point `p`, one per channel.
    pub fn row(&self, p: usize) -> &[f64] {
        &self.values[p * self.channels..(p + 1) * self.channels]
    }

    /// Value of channel `k` at point `p`.
    pub fn get(&self, p: usize, k: usize) -> f64 {
        self.values[p * self.channels + k]
    }

    /// Whether point `p` received any contribution.
    ///
    /// An uncovered point has an all-zero row that is *not* a prediction.
    pub fn is_covered(&self, p: usize) -> bool {
        self.covered[p]
    }

    /// Number of covered points.
    pub fn covered_count(&self) -> usize {
        self.covered.iter().filter(|c| **c).count()
    }

    /// The full row-major matrix.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Gather a grid stack onto query points.
///
/// Each node distributes its value over the query points within `h`, with
/// weights normalized over that node's neighbor points.
pub fn grid_to_points(
    geometry: &GridGeometry,
    stack: &GridStack,
    points: &[[f64; 2]],
    kernel: SmoothingKernel,
    h: f64,
) -> Gathered {
    let k = stack.len();
    let n = points.len();
    let mut gathered = Gathered {
        channels: k,
        values: vec![0.0; n * k],
        covered: vec![false; n],
    };
    if n == 0 {
        return gathered;
    }

    let point_index = BucketGrid::build(points, h);
    let plan = TransferPlan::build(&geometry.node_positions(), &point_index, kernel, h);
    gathered.covered = plan.target_coverage();

    // Accumulate per channel into a contiguous column, then interleave.
    let mut column = vec![0.0; n];
    for (c, grid) in stack.grids().iter().enumerate() {
        column.fill(0.0);
        plan.accumulate(grid.as_slice(), &mut column);
        for (p, &v) in column.iter().enumerate() {
            gathered.values[p * k + c] = v;
        }
    }

    let uncovered = n - gathered.covered_count();
    if uncovered > 0 {
        tracing::debug!("Gather left {} of {} query points uncovered", uncovered, n);
    }
    gathered
}
