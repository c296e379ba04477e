//! Per-step particle samples: record keys, single records, and the
//! column-oriented table handed to [`GridManager::create_grids`].
//!
//! [`GridManager::create_grids`]: crate::GridManager::create_grids

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Opaque identity of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKey {
    /// A dynamic body.
    Body(u64),
    /// One manifold point of a contact between two bodies.
    Contact {
        /// Id of the first body in the pair.
        master: u64,
        /// Id of the second body in the pair.
        slave: u64,
        /// Manifold point index within the contact.
        point: u32,
    },
}

/// A single sample: identity, position and named scalar attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    /// Identity of the sample.
    pub key: RecordKey,
    /// World-space position `[x, y]`.
    pub position: [f64; 2],
    /// Channel name -> value.
    pub attributes: BTreeMap<String, f64>,
}

impl ParticleRecord {
    /// Create a record with no attributes.
    pub fn new(key: RecordKey, position: [f64; 2]) -> Self {
        Self {
            key,
            position,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// Struct-of-arrays sample table with named value columns.
///
/// All arrays are parallel: row `i` across every array is the same sample.
/// Column presence is a property of the table schema, not of its rows, so an
/// empty table still advertises its columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleTable {
    keys: Vec<RecordKey>,
    x: Vec<f64>,
    y: Vec<f64>,
    column_names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ParticleTable {
    /// Create an empty table with the given value columns.
    ///
    /// Repeated names are kept once, at their first position.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let mut column_names: Vec<String> = Vec::new();
        for name in columns {
            let name = name.into();
            if !column_names.contains(&name) {
                column_names.push(name);
            }
        }
        let columns = vec![Vec::new(); column_names.len()];
        Self {
            keys: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            column_names,
            columns,
        }
    }

    /// Build a table from loose records.
    ///
    /// The schema is the set of attribute names carried by *every* record
    /// (sorted by name); attributes missing from some record are left out.
    pub fn from_records(records: &[ParticleRecord]) -> Self {
        let mut shared: Option<BTreeSet<&str>> = None;
        for r in records {
            let names: BTreeSet<&str> = r.attributes.keys().map(String::as_str).collect();
            shared = Some(match shared {
                None => names,
                Some(acc) => acc.intersection(&names).copied().collect(),
            });
        }
        let names: Vec<&str> = shared.unwrap_or_default().into_iter().collect();

        let mut table = Self::new(names.iter().copied());
        let mut row = Vec::with_capacity(names.len());
        for r in records {
            row.clear();
            row.extend(names.iter().map(|n| r.attributes[*n]));
            table.push_row(r.key, r.position, &row);
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Row identities.
    pub fn keys(&self) -> &[RecordKey] {
        &self.keys
    }

    /// X positions, parallel to the rows.
    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    /// Y positions, parallel to the rows.
    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Position of `name` in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Return `true` if the schema contains `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Values of one column, parallel to the rows.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|c| self.columns[c].as_slice())
    }

    /// Values of the column at schema position `index`.
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Append one row. `values` follows schema order.
    ///
    /// # Panics
    /// If `values.len()` differs from the number of columns.
    pub fn push_row(&mut self, key: RecordKey, position: [f64; 2], values: &[f64]) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row has {} values but table has {} columns",
            values.len(),
            self.columns.len()
        );
        self.keys.push(key);
        self.x.push(position[0]);
        self.y.push(position[1]);
        for (col, &v) in self.columns.iter_mut().zip(values) {
            col.push(v);
        }
    }

    /// Row positions as `[x, y]` pairs.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.x.iter().zip(&self.y).map(|(&x, &y)| [x, y]).collect()
    }

    /// Row `i` as a loose record.
    pub fn record(&self, i: usize) -> ParticleRecord {
        let attributes = self
            .column_names
            .iter()
            .zip(&self.columns)
            .map(|(name, col)| (name.clone(), col[i]))
            .collect();
        ParticleRecord {
            key: self.keys[i],
            position: [self.x[i], self.y[i]],
            attributes,
        }
    }
}
