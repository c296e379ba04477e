//! Warm-Start Layer
//!
//! This crate builds contact-impulse warm-start predictors on top of the
//! `sphgrid` engine, including:
//! - World snapshots from the physics engine and their particle tables
//! - The `WarmStartModel` interface and the baseline models
//! - Grid models that splat a snapshot, run a grid predictor and read the
//!   predicted impulse grids back at each contact point
//! - Training sample assembly and prediction metrics

#![warn(missing_docs)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod grid_model;
pub mod metrics;
pub mod model;
pub mod snapshot;

pub use config::{ModelConfig, ModelKind, Readout};
pub use dataset::{build_sample, Sample};
pub use error::{Result, WarmStartError};
pub use grid_model::{GridModel, GridPredictor, IdentityPredictor};
pub use metrics::PredictionMetrics;
pub use model::{BuiltinWarmStart, ConstantModel, NoWarmStart, RandomModel, WarmStartModel};
pub use snapshot::{BodySnapshot, ContactKey, ContactSnapshot, PointImpulse, WorldSnapshot};

/// Create an identity grid model from a configuration file
///
/// This function performs the full setup pipeline:
/// 1. Load and validate the model configuration
/// 2. Map each label channel to the feature channel of the same name
/// 3. Build the grid manager and wrap it in a `GridModel`
///
/// # Example
/// ```no_run
/// use warmstart::{create_identity_model, WarmStartModel};
///
/// let mut model = create_identity_model("config/identity.json")?;
/// model.step(&warmstart::WorldSnapshot::default())?;
/// # Ok::<(), warmstart::WarmStartError>(())
/// ```
pub fn create_identity_model(config_path: &str) -> Result<GridModel<IdentityPredictor>> {
    tracing::info!("Creating grid model from config: {}", config_path);
    let config = ModelConfig::load(config_path)?;
    let predictor = IdentityPredictor::matching(&config)?;
    GridModel::new(config, predictor)
}

/// Create a warm-start model of the given kind.
///
/// `config` is only consulted by grid-backed kinds.
pub fn create_model(kind: ModelKind, config: &ModelConfig) -> Result<Box<dyn WarmStartModel>> {
    match kind {
        ModelKind::None => Ok(Box::new(NoWarmStart::default())),
        ModelKind::Builtin => Ok(Box::new(BuiltinWarmStart)),
        ModelKind::Constant => Ok(Box::new(ConstantModel::default())),
        ModelKind::Random { seed } => Ok(Box::new(RandomModel::new(seed))),
        ModelKind::Identity => {
            let predictor = IdentityPredictor::matching(config)?;
            Ok(Box::new(GridModel::new(config.clone(), predictor)?))
        }
    }
}

/// Combine metrics from several snapshots into one summary.
///
/// Point counts are summed; error means are weighted by each snapshot's
/// number of predicted points.
pub fn aggregate_metrics(metrics: &[PredictionMetrics]) -> PredictionMetrics {
    let mut total = PredictionMetrics {
        contact_points: 0,
        predicted_points: 0,
        mean_abs_normal_error: 0.0,
        mean_abs_tangent_error: 0.0,
    };
    for m in metrics {
        total.contact_points += m.contact_points;
        total.predicted_points += m.predicted_points;
        total.mean_abs_normal_error += m.mean_abs_normal_error * m.predicted_points as f64;
        total.mean_abs_tangent_error += m.mean_abs_tangent_error * m.predicted_points as f64;
    }
    if total.predicted_points > 0 {
        let n = total.predicted_points as f64;
        total.mean_abs_normal_error /= n;
        total.mean_abs_tangent_error /= n;
    }
    total
}
