//! Grid -> particle gathering, continuous lookups and the manager lifecycle.

use sphgrid::{
    ChannelGrid, GridConfig, GridError, GridManager, GridStack, GridState, ParticleTable,
    RecordKey, SmoothingKernel,
};

fn fine_manager(kernel: SmoothingKernel) -> GridManager {
    let config = GridConfig::new([0.0, 0.0], [6.0, 6.0], 0.05, 0.05, 0.5).with_kernel(kernel);
    GridManager::new(config).unwrap()
}

fn single_body(position: [f64; 2], mass: f64) -> ParticleTable {
    let mut t = ParticleTable::new(["mass"]);
    t.push_row(RecordKey::Body(1), position, &[mass]);
    t
}

#[test]
fn single_particle_round_trip() {
    for kernel in [SmoothingKernel::Poly6, SmoothingKernel::Spiky] {
        let mut m = fine_manager(kernel);
        let p = [2.37, 3.11];
        m.create_grids(&single_body(p, 5.0), &["mass"]);

        let recovered = m.query_tree(&[p], "mass").unwrap();
        assert!(
            (recovered[0] - 5.0).abs() < 1.0e-9,
            "{}: recovered {}",
            kernel.name(),
            recovered[0]
        );
    }
}

#[test]
fn well_separated_particles_round_trip() {
    let mut m = fine_manager(SmoothingKernel::Poly6);
    let mut t = ParticleTable::new(["mass", "ni"]);
    let a = [1.2, 1.4];
    let b = [4.5, 3.9];
    t.push_row(RecordKey::Body(1), a, &[2.0, -1.0]);
    t.push_row(RecordKey::Body(2), b, &[7.5, 0.25]);
    m.create_grids(&t, &["mass", "ni"]);

    let stack = m.stack(&["mass", "ni"]).unwrap();
    let gathered = m.grids_to_particles(&stack, &[a, b]).unwrap();
    assert_eq!(gathered.len(), 2);
    assert_eq!(gathered.channels(), 2);
    let expected = [[2.0, -1.0], [7.5, 0.25]];
    for (p, row) in expected.iter().enumerate() {
        for (k, &v) in row.iter().enumerate() {
            let got = gathered.get(p, k);
            assert!((got - v).abs() < 1.0e-9, "point {p} channel {k}: {got} vs {v}");
        }
    }
}

#[test]
fn gather_conserves_node_totals() {
    let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 1.5)).unwrap();
    let mut grid = ChannelGrid::zeros([11, 11]);
    for (i, j, v) in [(3, 3, 1.0), (3, 4, 2.0), (7, 6, -4.0)] {
        grid.set(i, j, v);
    }
    m.add_grid("ni", grid).unwrap();

    // Every populated node has at least one query point strictly inside h.
    let points = [[3.2, 3.4], [2.6, 4.1], [7.1, 6.3], [0.0, 10.0]];
    let values = m.query_tree(&points, "ni").unwrap();
    let total: f64 = values.iter().sum();
    assert!((total - (1.0 + 2.0 - 4.0)).abs() < 1.0e-9, "total={total}");
    assert_eq!(values[3], 0.0);
}

#[test]
fn uncovered_points_are_absent_from_records() {
    let m = {
        let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 2.0)).unwrap();
        m.create_grids(&single_body([5.0, 5.0], 10.0), &["mass"]);
        m
    };
    let stack = m.stack(&["mass"]).unwrap();
    let keys = [
        RecordKey::Contact { master: 1, slave: 2, point: 0 },
        RecordKey::Contact { master: 1, slave: 2, point: 1 },
        RecordKey::Contact { master: 3, slave: 4, point: 0 },
    ];
    // The last point is far outside the lattice; the middle one sits among
    // zero-valued nodes, which is a real (zero) prediction.
    let points = [[5.0, 5.0], [1.0, 1.0], [50.0, 50.0]];
    let records = m.grids_to_records(&stack, &keys, &points).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, keys[0]);
    assert!(records[0].values[0] > 0.0);
    assert_eq!(records[1].key, keys[1]);
    assert_eq!(records[1].values, vec![0.0]);
}

#[test]
fn gather_survives_astronomically_distant_points() {
    let m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 1.0)).unwrap();
    let mut grid = ChannelGrid::zeros([11, 11]);
    grid.set(5, 5, 3.0);
    let stack = GridStack::from_grids([11, 11], vec![grid]).unwrap();

    let points = [[5.0, 5.0], [1.0e20, 5.0]];
    let gathered = m.grids_to_particles(&stack, &points).unwrap();
    assert!((gathered.get(0, 0) - 3.0).abs() < 1.0e-12);
    assert!(gathered.is_covered(0));
    assert!(!gathered.is_covered(1));
    assert_eq!(gathered.get(1, 0), 0.0);
}

#[test]
fn gather_rejects_foreign_stack_shape() {
    let m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 2.0)).unwrap();
    let stack = GridStack::from_grids([4, 4], vec![ChannelGrid::zeros([4, 4])]).unwrap();
    let err = m.grids_to_particles(&stack, &[[1.0, 1.0]]).unwrap_err();
    assert!(matches!(err, GridError::ShapeMismatch { expected: (11, 11), found: (4, 4), .. }));
}

#[test]
fn gather_with_no_points_returns_empty_matrix() {
    let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 2.0)).unwrap();
    m.create_grids(&single_body([5.0, 5.0], 1.0), &["mass"]);
    let gathered = m.grids_to_particles(&m.stack(&["mass"]).unwrap(), &[]).unwrap();
    assert!(gathered.is_empty());
    assert!(m.grids_to_records(&m.stack(&["mass"]).unwrap(), &[], &[]).unwrap().is_empty());
}

#[test]
fn spline_lookup_matches_nodes() {
    let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 2.0)).unwrap();
    m.create_grids(&single_body([4.6, 5.2], 10.0), &["mass"]);
    m.create_interp(&["mass"]).unwrap();

    let mass = m.channel("mass").unwrap().clone();
    for (i, j) in [(4, 5), (5, 5), (0, 0), (10, 3)] {
        let v = m.query_interp(i as f64, j as f64, "mass").unwrap();
        assert!((v - mass.get(i, j)).abs() < 1.0e-9, "node ({i},{j}): {v}");
    }
    assert!(matches!(m.query_interp(1.0, 1.0, "vx"), Err(GridError::UnknownChannel(_))));
}

#[test]
fn lifecycle_follows_populate_and_reset() {
    let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [10.0, 10.0], 1.0, 1.0, 2.0)).unwrap();
    assert_eq!(m.state(), GridState::Empty);
    assert!(matches!(m.channel("mass"), Err(GridError::UnknownChannel(_))));
    assert!(matches!(m.query_tree(&[[1.0, 1.0]], "mass"), Err(GridError::UnknownChannel(_))));

    m.create_grids(&single_body([5.0, 5.0], 1.0), &["mass"]);
    assert_eq!(m.state(), GridState::Populated);

    m.reset();
    assert_eq!(m.state(), GridState::Empty);
    assert!(m.channel_names().is_empty());
    assert!(m.stack(&["mass"]).is_err());

    m.add_grid("ti", ChannelGrid::zeros([11, 11])).unwrap();
    assert_eq!(m.state(), GridState::Populated);
    let err = m.add_grid("ni", ChannelGrid::zeros([10, 11])).unwrap_err();
    assert!(matches!(err, GridError::ShapeMismatch { ref channel, .. } if channel == "ni"));
    assert_eq!(m.channel_names(), vec!["ti"]);
}

#[test]
fn injected_stack_round_trips_through_channels_last() {
    let mut m = GridManager::new(GridConfig::new([0.0, 0.0], [4.0, 2.0], 1.0, 1.0, 1.2)).unwrap();
    let dims = m.geometry().dims();
    let n = dims[0] * dims[1];
    let data: Vec<f64> = (0..n * 2).map(|v| v as f64).collect();
    let stack = GridStack::from_channels_last(dims, 2, &data).unwrap();
    m.add_grids(stack, &["ni", "ti"]).unwrap();

    assert_eq!(m.channel("ni").unwrap().get(0, 1), 2.0);
    assert_eq!(m.channel("ti").unwrap().get(0, 1), 3.0);
    assert_eq!(m.stack(&["ni", "ti"]).unwrap().to_channels_last(), data);
}
