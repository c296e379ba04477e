//! Identity grid model end to end
//!
//! Impulses recorded on a snapshot are splatted, copied through the identity
//! predictor and read back at the contact points. With contacts further than
//! two support radii apart the node sets never overlap, so gather readout
//! recovers every recorded impulse.

use sphgrid::GridConfig;
use warmstart::{
    aggregate_metrics, create_model, BodySnapshot, ContactKey, ContactSnapshot, GridModel,
    IdentityPredictor, ModelConfig, ModelKind, PredictionMetrics, Readout, WarmStartModel,
    WorldSnapshot,
};

fn grid() -> GridConfig {
    GridConfig::new([0.0, 0.0], [20.0, 20.0], 0.5, 0.5, 0.75)
}

fn contact(master: u64, slave: u64, point: u32, p: [f64; 2], ni: f64, ti: f64) -> ContactSnapshot {
    ContactSnapshot {
        master,
        slave,
        point_index: point,
        px: p[0],
        py: p[1],
        nx: 0.0,
        ny: 1.0,
        normal_impulse: ni,
        tangent_impulse: ti,
    }
}

fn separated_world() -> WorldSnapshot {
    WorldSnapshot {
        bodies: vec![
            BodySnapshot::at_rest(1, 3.0, 3.0),
            BodySnapshot::at_rest(2, 4.0, 3.0),
            BodySnapshot::at_rest(3, 12.0, 9.0),
        ],
        contacts: vec![
            contact(1, 2, 0, [3.1, 3.3], 12.0, -1.5),
            contact(1, 2, 1, [6.2, 3.4], 8.0, 0.5),
            contact(2, 3, 0, [12.3, 9.7], 30.0, 4.0),
        ],
    }
}

fn identity_model(readout: Readout) -> GridModel<IdentityPredictor> {
    let mut config = ModelConfig::identity(grid());
    config.readout = readout;
    let predictor = IdentityPredictor::matching(&config).unwrap();
    GridModel::new(config, predictor).unwrap()
}

#[test]
fn gather_readout_recovers_recorded_impulses() {
    let world = separated_world();
    let mut model = identity_model(Readout::Gather);
    model.step(&world).unwrap();

    assert_eq!(model.name(), "grid/identity");
    assert_eq!(model.predicted_contacts(), 2);

    for (key, truth) in world.impulses() {
        let predicted = model.predict(&key);
        assert_eq!(predicted.len(), truth.len());
        for (p, t) in predicted.iter().zip(&truth) {
            assert_eq!(p.point, t.point);
            assert!((p.normal - t.normal).abs() < 1.0e-9, "{:?}: {} vs {}", key, p.normal, t.normal);
            assert!((p.tangent - t.tangent).abs() < 1.0e-9, "{:?}: {} vs {}", key, p.tangent, t.tangent);
        }
    }

    let metrics = PredictionMetrics::evaluate(&model, &world);
    assert_eq!(metrics.coverage(), 1.0);
    assert!(metrics.mean_abs_normal_error < 1.0e-9);
}

#[test]
fn interp_readout_predicts_every_point() {
    let world = separated_world();
    let mut model = identity_model(Readout::Interp);
    model.step(&world).unwrap();

    let metrics = PredictionMetrics::evaluate(&model, &world);
    assert_eq!(metrics.contact_points, 3);
    assert_eq!(metrics.predicted_points, 3);
    for (_, predicted) in world.manifolds().keys().map(|k| (k, model.predict(k))) {
        assert!(predicted.iter().all(|p| p.normal.is_finite() && p.tangent.is_finite()));
    }
}

#[test]
fn step_without_contacts_clears_predictions() {
    let mut model = identity_model(Readout::Gather);
    model.step(&separated_world()).unwrap();
    assert_eq!(model.predicted_contacts(), 2);

    let quiet = WorldSnapshot {
        bodies: separated_world().bodies,
        contacts: vec![],
    };
    model.step(&quiet).unwrap();
    assert_eq!(model.predicted_contacts(), 0);
    assert!(model.predict(&ContactKey::new(1, 2)).is_empty());
    assert!(model.manager().channel_names().is_empty());
}

#[test]
fn contacts_outside_the_lattice_get_no_prediction() {
    let world = WorldSnapshot {
        bodies: vec![],
        contacts: vec![
            contact(1, 2, 0, [5.0, 5.0], 10.0, 1.0),
            // beyond every node by more than the support radius
            contact(3, 4, 0, [40.0, 40.0], 10.0, 1.0),
        ],
    };
    let mut model = identity_model(Readout::Gather);
    model.step(&world).unwrap();

    assert_eq!(model.predict(&ContactKey::new(1, 2)).len(), 1);
    assert!(model.predict(&ContactKey::new(3, 4)).is_empty());

    let metrics = PredictionMetrics::evaluate(&model, &world);
    assert_eq!(metrics.coverage(), 0.5);
}

#[test]
fn identity_beats_baselines_on_recorded_impulses() {
    let world = separated_world();
    let config = ModelConfig::identity(grid());
    let kinds = [
        ModelKind::None,
        ModelKind::Constant,
        ModelKind::Random { seed: 7 },
        ModelKind::Identity,
    ];

    let mut results = Vec::new();
    for kind in kinds {
        let mut model = create_model(kind, &config).unwrap();
        model.step(&world).unwrap();
        results.push((model.name().to_string(), PredictionMetrics::evaluate(model.as_ref(), &world)));
    }

    let identity = &results[3].1;
    for (name, m) in &results[..3] {
        assert!(
            m.mean_abs_normal_error > identity.mean_abs_normal_error,
            "{} normal error {} not above identity",
            name,
            m.mean_abs_normal_error
        );
    }

    let summary = aggregate_metrics(&results.iter().map(|(_, m)| *m).collect::<Vec<_>>());
    assert_eq!(summary.contact_points, 12);
}
