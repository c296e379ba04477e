//! Dense channel arrays and the registry that owns them.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{GridError, GridResult};
use crate::geometry::GridGeometry;
use crate::spline::BicubicSpline;

/// One scalar field on the lattice, stored row-major (`i * ny + j`).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGrid {
    dims: [usize; 2],
    data: Vec<f64>,
}

impl ChannelGrid {
    /// All-zero grid of shape `[nx, ny]`.
    pub fn zeros(dims: [usize; 2]) -> Self {
        Self {
            dims,
            data: vec![0.0; dims[0] * dims[1]],
        }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_vec(dims: [usize; 2], data: Vec<f64>) -> GridResult<Self> {
        if data.len() != dims[0] * dims[1] {
            return Err(GridError::LengthMismatch {
                nx: dims[0],
                ny: dims[1],
                found: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    /// Shape `[nx, ny]`.
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` for a grid with no nodes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at node `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dims[1] + j]
    }

    /// Overwrite node `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.dims[1] + j] = value;
    }

    /// Flat view in storage order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat view in storage order.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume into the flat buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Sum over all nodes.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Number of nodes holding a non-zero value.
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }
}

/// Ordered stack of equally shaped grids (channel-first).
#[derive(Debug, Clone, PartialEq)]
pub struct GridStack {
    dims: [usize; 2],
    grids: Vec<ChannelGrid>,
}

impl GridStack {
    /// Empty stack for grids of shape `dims`.
    pub fn new(dims: [usize; 2]) -> Self {
        Self {
            dims,
            grids: Vec::new(),
        }
    }

    /// Stack the given grids; every grid must have shape `dims`.
    pub fn from_grids(dims: [usize; 2], grids: Vec<ChannelGrid>) -> GridResult<Self> {
        let mut stack = Self::new(dims);
        for grid in grids {
            stack.push(grid)?;
        }
        Ok(stack)
    }

    /// Rebuild a stack from a channels-last buffer (`[nx][ny][k]`), the
    /// layout image models consume and produce.
    pub fn from_channels_last(dims: [usize; 2], channels: usize, data: &[f64]) -> GridResult<Self> {
        let nodes = dims[0] * dims[1];
        if data.len() != nodes * channels {
            return Err(GridError::LengthMismatch {
                nx: dims[0],
                ny: dims[1] * channels,
                found: data.len(),
            });
        }
        let grids = (0..channels)
            .map(|k| ChannelGrid {
                dims,
                data: (0..nodes).map(|n| data[n * channels + k]).collect(),
            })
            .collect();
        Ok(Self { dims, grids })
    }

    /// Append a grid.
    pub fn push(&mut self, grid: ChannelGrid) -> GridResult<()> {
        if grid.dims != self.dims {
            return Err(GridError::ShapeMismatch {
                channel: format!("stack slot {}", self.grids.len()),
                expected: (self.dims[0], self.dims[1]),
                found: (grid.dims[0], grid.dims[1]),
            });
        }
        self.grids.push(grid);
        Ok(())
    }

    /// Shape of every grid in the stack.
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Return `true` if the stack holds no channels.
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Channel `k`.
    pub fn get(&self, k: usize) -> Option<&ChannelGrid> {
        self.grids.get(k)
    }

    /// All channels in order.
    pub fn grids(&self) -> &[ChannelGrid] {
        &self.grids
    }

    /// Consume into the channel list.
    pub fn into_grids(self) -> Vec<ChannelGrid> {
        self.grids
    }

    /// Interleave into a channels-last buffer (`[nx][ny][k]`).
    pub fn to_channels_last(&self) -> Vec<f64> {
        let k = self.grids.len();
        let nodes = self.dims[0] * self.dims[1];
        let mut out = vec![0.0; nodes * k];
        for (c, grid) in self.grids.iter().enumerate() {
            for (n, &v) in grid.data.iter().enumerate() {
                out[n * k + c] = v;
            }
        }
        out
    }
}

/// A populated channel plus its lazily fitted spline.
#[derive(Debug)]
struct Channel {
    grid: ChannelGrid,
    spline: OnceLock<BicubicSpline>,
}

/// Named channel arrays shaped to one [`GridGeometry`].
///
/// Names iterate in sorted order so every consumer sees the same sequence.
#[derive(Debug)]
pub struct ChannelRegistry {
    geometry: GridGeometry,
    channels: BTreeMap<String, Channel>,
}

impl ChannelRegistry {
    /// Empty registry for `geometry`.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            channels: BTreeMap::new(),
        }
    }

    /// Lattice every channel is shaped to.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Insert or replace a channel. Any spline fitted to the old values is
    /// discarded.
    pub fn insert(&mut self, name: impl Into<String>, grid: ChannelGrid) -> GridResult<()> {
        let name = name.into();
        let expected = self.geometry.dims();
        if grid.dims() != expected {
            return Err(GridError::ShapeMismatch {
                channel: name,
                expected: (expected[0], expected[1]),
                found: (grid.dims[0], grid.dims[1]),
            });
        }
        self.replace(name, grid);
        Ok(())
    }

    /// Insert a grid produced against this registry's geometry.
    pub(crate) fn replace(&mut self, name: String, grid: ChannelGrid) {
        debug_assert_eq!(grid.dims(), self.geometry.dims());
        self.channels.insert(
            name,
            Channel {
                grid,
                spline: OnceLock::new(),
            },
        );
    }

    /// Channel values, if populated.
    pub fn get(&self, name: &str) -> Option<&ChannelGrid> {
        self.channels.get(name).map(|c| &c.grid)
    }

    /// Return `true` if `name` is populated.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Spline over channel `name`, fitted on first use.
    pub fn spline(&self, name: &str) -> Option<&BicubicSpline> {
        let channel = self.channels.get(name)?;
        Some(
            channel
                .spline
                .get_or_init(|| BicubicSpline::new(&self.geometry, &channel.grid)),
        )
    }

    /// Return `true` if a spline has already been fitted for `name`.
    pub fn has_spline(&self, name: &str) -> bool {
        self.channels
            .get(name)
            .is_some_and(|c| c.spline.get().is_some())
    }

    /// Populated channel names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Number of populated channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Return `true` if no channel is populated.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Remove every channel.
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
