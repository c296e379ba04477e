//! Rectangular node lattice shared by every channel of a scenario.

use crate::error::{GridError, GridResult};

/// Tolerance when deciding whether the upper-right bound lands on a node.
const NODE_SNAP_EPS: f64 = 1.0e-9;

/// Refuse lattices larger than this many nodes.
const MAX_NODES: usize = 1 << 26;

/// Immutable description of a uniform 2D lattice.
///
/// Node `(i, j)` sits at `(x0 + i * dx, y0 + j * dy)` and is stored at flat
/// index `i * ny + j` (row-major, y varies fastest).
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    origin: [f64; 2],
    resolution: [f64; 2],
    dims: [usize; 2],
    x_coords: Vec<f64>,
    y_coords: Vec<f64>,
}

impl GridGeometry {
    /// Lattice covering `[lower_left, upper_right]` with spacing `resolution`.
    ///
    /// Node counts are `ceil(extent / res) + 1` per axis, so the last node
    /// reaches (or just passes) the upper-right bound.
    pub fn new(lower_left: [f64; 2], upper_right: [f64; 2], resolution: [f64; 2]) -> GridResult<Self> {
        for axis in 0..2 {
            let name = ["x", "y"][axis];
            if !lower_left[axis].is_finite() || !upper_right[axis].is_finite() {
                return Err(GridError::config(format!("{name} bounds must be finite")));
            }
            if !(resolution[axis].is_finite() && resolution[axis] > 0.0) {
                return Err(GridError::config(format!(
                    "{name} resolution must be positive, got {}",
                    resolution[axis]
                )));
            }
            if upper_right[axis] <= lower_left[axis] {
                return Err(GridError::config(format!(
                    "upper-right {name} ({}) must exceed lower-left {name} ({})",
                    upper_right[axis], lower_left[axis]
                )));
            }
        }

        let count = |axis: usize| -> GridResult<usize> {
            let cells = (upper_right[axis] - lower_left[axis]) / resolution[axis];
            let nodes = (cells - NODE_SNAP_EPS).ceil().max(0.0) + 1.0;
            if !nodes.is_finite() || nodes > MAX_NODES as f64 {
                return Err(GridError::config(format!(
                    "{} extent spans {cells:e} cells, beyond the limit of {MAX_NODES} nodes",
                    ["x", "y"][axis]
                )));
            }
            Ok(nodes as usize)
        };
        Self::from_dims(lower_left, resolution, [count(0)?, count(1)?])
    }

    /// Lattice with explicit node counts.
    pub fn from_dims(origin: [f64; 2], resolution: [f64; 2], dims: [usize; 2]) -> GridResult<Self> {
        if !(origin[0].is_finite() && origin[1].is_finite()) {
            return Err(GridError::config("origin must be finite"));
        }
        if !(resolution.iter().all(|r| r.is_finite() && *r > 0.0)) {
            return Err(GridError::config(format!(
                "resolution must be positive, got {resolution:?}"
            )));
        }
        if dims[0] == 0 || dims[1] == 0 {
            return Err(GridError::config(format!("node counts must be positive, got {dims:?}")));
        }
        if dims[0].saturating_mul(dims[1]) > MAX_NODES {
            return Err(GridError::config(format!(
                "{}x{} nodes exceeds the limit of {MAX_NODES}",
                dims[0], dims[1]
            )));
        }

        let x_coords = (0..dims[0]).map(|i| origin[0] + i as f64 * resolution[0]).collect();
        let y_coords = (0..dims[1]).map(|j| origin[1] + j as f64 * resolution[1]).collect();
        Ok(Self {
            origin,
            resolution,
            dims,
            x_coords,
            y_coords,
        })
    }

    /// Position of node `(0, 0)`.
    pub fn origin(&self) -> [f64; 2] {
        self.origin
    }

    /// Node spacing `[dx, dy]`.
    pub fn resolution(&self) -> [f64; 2] {
        self.resolution
    }

    /// Node counts `[nx, ny]`.
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// Nodes along x.
    pub fn nx(&self) -> usize {
        self.dims[0]
    }

    /// Nodes along y.
    pub fn ny(&self) -> usize {
        self.dims[1]
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// Node x coordinates, ascending.
    pub fn x_coords(&self) -> &[f64] {
        &self.x_coords
    }

    /// Node y coordinates, ascending.
    pub fn y_coords(&self) -> &[f64] {
        &self.y_coords
    }

    /// Position of the last node `(nx - 1, ny - 1)`.
    pub fn upper_right(&self) -> [f64; 2] {
        [self.x_coords[self.dims[0] - 1], self.y_coords[self.dims[1] - 1]]
    }

    /// Flat storage index of node `(i, j)`.
    #[inline]
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        i * self.dims[1] + j
    }

    /// Inverse of [`flat_index`](Self::flat_index).
    #[inline]
    pub fn unflatten(&self, k: usize) -> (usize, usize) {
        (k / self.dims[1], k % self.dims[1])
    }

    /// World position of node `(i, j)`.
    #[inline]
    pub fn node_position(&self, i: usize, j: usize) -> [f64; 2] {
        [self.x_coords[i], self.y_coords[j]]
    }

    /// All node positions in flat storage order.
    pub fn node_positions(&self) -> Vec<[f64; 2]> {
        let mut out = Vec::with_capacity(self.node_count());
        for &x in &self.x_coords {
            for &y in &self.y_coords {
                out.push([x, y]);
            }
        }
        out
    }

    /// Return `true` if `p` lies inside the lattice bounding box.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        let hi = self.upper_right();
        p[0] >= self.origin[0] && p[0] <= hi[0] && p[1] >= self.origin[1] && p[1] <= hi[1]
    }
}
