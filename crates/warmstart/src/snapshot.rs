//! Per-step world snapshots handed over by the physics engine.
//!
//! A snapshot is a plain value: bodies and active manifold points with the
//! attributes the grid engine can splat. Conversion to [`ParticleTable`]
//! uses the attribute names as column names, so the column names double as
//! the channel namespace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sphgrid::{ParticleTable, RecordKey};

/// Value columns of a body table.
pub const BODY_COLUMNS: [&str; 8] = ["px", "py", "mass", "inertia", "vx", "vy", "theta", "omega"];

/// Value columns of a contact table.
pub const CONTACT_COLUMNS: [&str; 6] = ["px", "py", "nx", "ny", "ni", "ti"];

/// One dynamic body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    /// Stable body id.
    pub id: u64,
    /// Position x.
    pub px: f64,
    /// Position y.
    pub py: f64,
    /// Mass.
    pub mass: f64,
    /// Rotational inertia.
    pub inertia: f64,
    /// Linear velocity x.
    pub vx: f64,
    /// Linear velocity y.
    pub vy: f64,
    /// Orientation angle.
    pub theta: f64,
    /// Angular velocity.
    pub omega: f64,
}

impl BodySnapshot {
    /// Body at rest with unit mass and inertia.
    pub fn at_rest(id: u64, px: f64, py: f64) -> Self {
        Self {
            id,
            px,
            py,
            mass: 1.0,
            inertia: 1.0,
            vx: 0.0,
            vy: 0.0,
            theta: 0.0,
            omega: 0.0,
        }
    }

    fn row(&self) -> [f64; 8] {
        [
            self.px,
            self.py,
            self.mass,
            self.inertia,
            self.vx,
            self.vy,
            self.theta,
            self.omega,
        ]
    }
}

/// Identity of a touching body pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactKey {
    /// Id of the first body.
    pub master: u64,
    /// Id of the second body.
    pub slave: u64,
}

impl ContactKey {
    /// Key for the pair `(master, slave)`.
    pub fn new(master: u64, slave: u64) -> Self {
        Self { master, slave }
    }

    /// Record key of manifold point `point` of this contact.
    pub fn record_key(&self, point: u32) -> RecordKey {
        RecordKey::Contact {
            master: self.master,
            slave: self.slave,
            point,
        }
    }
}

/// One active manifold point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    /// Id of the first body.
    pub master: u64,
    /// Id of the second body.
    pub slave: u64,
    /// Index of this point within the contact manifold.
    pub point_index: u32,
    /// World-space point x.
    pub px: f64,
    /// World-space point y.
    pub py: f64,
    /// Contact normal x.
    pub nx: f64,
    /// Contact normal y.
    pub ny: f64,
    /// Normal impulse.
    pub normal_impulse: f64,
    /// Tangent (friction) impulse.
    pub tangent_impulse: f64,
}

impl ContactSnapshot {
    /// Pair this point belongs to.
    pub fn key(&self) -> ContactKey {
        ContactKey::new(self.master, self.slave)
    }

    /// Identity of this point.
    pub fn record_key(&self) -> RecordKey {
        self.key().record_key(self.point_index)
    }

    /// World-space position.
    pub fn position(&self) -> [f64; 2] {
        [self.px, self.py]
    }

    fn row(&self) -> [f64; 6] {
        [
            self.px,
            self.py,
            self.nx,
            self.ny,
            self.normal_impulse,
            self.tangent_impulse,
        ]
    }
}

/// Impulse pair for one manifold point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointImpulse {
    /// Manifold point index.
    pub point: u32,
    /// Normal impulse.
    pub normal: f64,
    /// Tangent impulse.
    pub tangent: f64,
}

/// Everything the grid engine needs from one simulation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Dynamic bodies.
    pub bodies: Vec<BodySnapshot>,
    /// Active manifold points.
    pub contacts: Vec<ContactSnapshot>,
}

impl WorldSnapshot {
    /// Bodies as a table with [`BODY_COLUMNS`].
    pub fn body_table(&self) -> ParticleTable {
        let mut table = ParticleTable::new(BODY_COLUMNS);
        for b in &self.bodies {
            table.push_row(RecordKey::Body(b.id), [b.px, b.py], &b.row());
        }
        table
    }

    /// Manifold points as a table with [`CONTACT_COLUMNS`].
    pub fn contact_table(&self) -> ParticleTable {
        let mut table = ParticleTable::new(CONTACT_COLUMNS);
        for c in &self.contacts {
            table.push_row(c.record_key(), c.position(), &c.row());
        }
        table
    }

    /// Manifold point indices of every contact, grouped by pair.
    pub fn manifolds(&self) -> BTreeMap<ContactKey, Vec<u32>> {
        let mut out: BTreeMap<ContactKey, Vec<u32>> = BTreeMap::new();
        for c in &self.contacts {
            out.entry(c.key()).or_default().push(c.point_index);
        }
        out
    }

    /// Impulses recorded on the snapshot, grouped by pair.
    pub fn impulses(&self) -> BTreeMap<ContactKey, Vec<PointImpulse>> {
        let mut out: BTreeMap<ContactKey, Vec<PointImpulse>> = BTreeMap::new();
        for c in &self.contacts {
            out.entry(c.key()).or_default().push(PointImpulse {
                point: c.point_index,
                normal: c.normal_impulse,
                tangent: c.tangent_impulse,
            });
        }
        out
    }
}
