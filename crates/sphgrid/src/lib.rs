//! SPH Grid Engine
//!
//! Converts an irregular, per-step set of point samples (bodies, contact
//! points) into fixed-shape multi-channel grids with a renormalized SPH
//! kernel, and resamples grids back onto arbitrary query points.
//!
//! # Modules
//! - [`sph`] -- Poly6 / spiky smoothing kernels and per-query weight normalization.
//! - [`neighbor`] -- `SpatialIndex` trait, uniform bucket grid and brute-force oracle.
//! - [`geometry`] -- Immutable node lattice.
//! - [`channel`] -- Channel arrays, grid stacks and the named channel registry.
//! - [`transfer`] -- CSR transfer plans, particle -> grid splat and grid -> particle gather.
//! - [`spline`] -- Bicubic spline lookup over a channel.
//! - [`particle`] -- Record keys, loose records and the column table fed to the splat.
//! - [`manager`] -- `GridManager` facade tying the above together.
//! - [`config`] -- Serde-backed construction parameters.
//! - [`error`] -- `GridError` and the `GridResult` alias.

#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod neighbor;
pub mod particle;
pub mod sph;
pub mod spline;
pub mod transfer;

pub use channel::{ChannelGrid, ChannelRegistry, GridStack};
pub use config::GridConfig;
pub use error::{GridError, GridResult};
pub use geometry::GridGeometry;
pub use manager::{GridManager, GridState, PredictionRecord};
pub use neighbor::{BucketGrid, LinearScan, SpatialIndex};
pub use particle::{ParticleRecord, ParticleTable, RecordKey};
pub use sph::{poly6_2d, spiky_2d, SmoothingKernel};
pub use spline::BicubicSpline;
pub use transfer::{Gathered, TransferPlan};
