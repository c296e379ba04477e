//! Prediction quality against the impulses a solver actually converged to.

use crate::model::WarmStartModel;
use crate::snapshot::WorldSnapshot;

/// Aggregate error of one model over one reference snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionMetrics {
    /// Manifold points in the reference snapshot.
    pub contact_points: usize,
    /// Points the model produced a prediction for.
    pub predicted_points: usize,
    /// Mean |predicted - reference| normal impulse over predicted points.
    pub mean_abs_normal_error: f64,
    /// Mean |predicted - reference| tangent impulse over predicted points.
    pub mean_abs_tangent_error: f64,
}

impl PredictionMetrics {
    /// Compare `model`'s current predictions with the impulses stored on
    /// `reference`. Points the model has no prediction for only lower the
    /// coverage; they do not enter the error means.
    pub fn evaluate<M: WarmStartModel + ?Sized>(model: &M, reference: &WorldSnapshot) -> Self {
        let mut contact_points = 0;
        let mut predicted_points = 0;
        let mut normal_sum = 0.0;
        let mut tangent_sum = 0.0;

        for (key, truth) in reference.impulses() {
            contact_points += truth.len();
            let predicted = model.predict(&key);
            for t in &truth {
                if let Some(p) = predicted.iter().find(|p| p.point == t.point) {
                    predicted_points += 1;
                    normal_sum += (p.normal - t.normal).abs();
                    tangent_sum += (p.tangent - t.tangent).abs();
                }
            }
        }

        let mean = |sum: f64| {
            if predicted_points > 0 {
                sum / predicted_points as f64
            } else {
                0.0
            }
        };
        Self {
            contact_points,
            predicted_points,
            mean_abs_normal_error: mean(normal_sum),
            mean_abs_tangent_error: mean(tangent_sum),
        }
    }

    /// Fraction of reference points that received a prediction.
    pub fn coverage(&self) -> f64 {
        if self.contact_points == 0 {
            return 0.0;
        }
        self.predicted_points as f64 / self.contact_points as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuiltinWarmStart, ConstantModel, NoWarmStart};
    use crate::snapshot::ContactSnapshot;

    fn reference() -> WorldSnapshot {
        let point = |point_index, ni, ti| ContactSnapshot {
            master: 1,
            slave: 2,
            point_index,
            px: 0.0,
            py: 0.0,
            nx: 0.0,
            ny: 1.0,
            normal_impulse: ni,
            tangent_impulse: ti,
        };
        WorldSnapshot {
            bodies: vec![],
            contacts: vec![point(0, 4.0, -1.0), point(1, 2.0, 3.0)],
        }
    }

    #[test]
    fn test_zero_model_error_is_mean_magnitude() {
        let mut model = NoWarmStart::default();
        model.step(&reference()).unwrap();
        let m = PredictionMetrics::evaluate(&model, &reference());
        assert_eq!(m.contact_points, 2);
        assert_eq!(m.predicted_points, 2);
        assert!((m.mean_abs_normal_error - 3.0).abs() < 1.0e-12);
        assert!((m.mean_abs_tangent_error - 2.0).abs() < 1.0e-12);
        assert_eq!(m.coverage(), 1.0);
    }

    #[test]
    fn test_constant_model_error() {
        let mut model = ConstantModel::new(4.0, 3.0);
        model.step(&reference()).unwrap();
        let m = PredictionMetrics::evaluate(&model, &reference());
        assert!((m.mean_abs_normal_error - 1.0).abs() < 1.0e-12);
        assert!((m.mean_abs_tangent_error - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn test_builtin_has_no_coverage() {
        let model = BuiltinWarmStart;
        let m = PredictionMetrics::evaluate(&model, &reference());
        assert_eq!(m.predicted_points, 0);
        assert_eq!(m.coverage(), 0.0);
        assert_eq!(m.mean_abs_normal_error, 0.0);
    }

    #[test]
    fn test_works_through_trait_objects() {
        let mut model: Box<dyn WarmStartModel> = Box::new(NoWarmStart::default());
        model.step(&reference()).unwrap();
        let m = PredictionMetrics::evaluate(model.as_ref(), &reference());
        assert_eq!(m.predicted_points, 2);
    }
}
