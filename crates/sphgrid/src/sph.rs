//! SPH smoothing kernels in 2D.
//!
//! Kernels here are used as interpolation weights rather than density
//! estimators: for every query (one particle, or one grid node) the raw
//! kernel values over its neighbor set are renormalized to sum to exactly 1.
//! A trained downstream model depends on that renormalization, so it is
//! applied for every kernel variant.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Smoothing kernel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKernel {
    /// Poly6 kernel, `4 / (pi h^8) * (h^2 - r^2)^3`.
    #[default]
    Poly6,
    /// Spiky kernel, `10 / (pi h^5) * (h - r)^3`.
    Spiky,
}

impl SmoothingKernel {
    /// Short name used in configs and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Poly6 => "poly6",
            Self::Spiky => "spiky",
        }
    }

    /// Raw (unnormalized) kernel value for squared distance `r_sq`.
    #[inline]
    pub fn evaluate(&self, r_sq: f64, h: f64) -> f64 {
        match self {
            Self::Poly6 => poly6_2d(r_sq, h),
            Self::Spiky => spiky_2d(r_sq, h),
        }
    }

    /// Fill `out` with weights for one query's neighbor set, normalized to
    /// sum to 1.
    ///
    /// `r_sq` holds the squared distances from the query to each neighbor.
    /// Returns `false` and leaves `out` empty when the neighbor set is empty
    /// or every neighbor sits on or beyond the support radius (zero weight
    /// sum). Callers treat that as "no contribution".
    pub fn normalized_weights(&self, r_sq: &[f64], h: f64, out: &mut Vec<f64>) -> bool {
        out.clear();
        if r_sq.is_empty() {
            return false;
        }

        out.extend(r_sq.iter().map(|&r2| self.evaluate(r2, h)));
        let sum: f64 = out.iter().sum();
        // Also rejects NaN sums.
        if !(sum > 0.0) {
            out.clear();
            return false;
        }

        for w in out.iter_mut() {
            *w /= sum;
        }
        true
    }
}

/// Poly6 smoothing kernel in 2D.
///
/// ```text
/// W(r, h) = 4 / (pi h^8) * (h^2 - r^2)^3   for r < h
/// W(r, h) = 0                             for r >= h
/// ```
///
/// Takes the squared distance so callers never need a square root.
#[inline]
pub fn poly6_2d(r_sq: f64, h: f64) -> f64 {
    let h2 = h * h;
    if r_sq >= h2 {
        return 0.0;
    }
    let h8 = h2 * h2 * h2 * h2;
    let c = 4.0 / (PI * h8);
    let d = h2 - r_sq;
    c * d * d * d
}

/// Spiky smoothing kernel in 2D.
///
/// ```text
/// W(r, h) = 10 / (pi h^5) * (h - r)^3   for r < h
/// W(r, h) = 0                          for r >= h
/// ```
#[inline]
pub fn spiky_2d(r_sq: f64, h: f64) -> f64 {
    if r_sq >= h * h {
        return 0.0;
    }
    let r = r_sq.sqrt();
    let c = 10.0 / (PI * h.powi(5));
    let d = h - r;
    c * d * d * d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poly6_at_zero_distance() {
        let h = 2.0;
        let w = poly6_2d(0.0, h);
        // c * h^6 = 4 / (pi h^2)
        let expected = 4.0 / (PI * h * h);
        assert!((w - expected).abs() < 1.0e-12, "w={w}, expected={expected}");
    }

    #[test]
    fn poly6_zero_at_and_beyond_support() {
        let h = 1.5;
        assert_eq!(poly6_2d(h * h, h), 0.0);
        assert_eq!(poly6_2d(4.0 * h * h, h), 0.0);
        assert_eq!(spiky_2d(h * h, h), 0.0);
    }

    #[test]
    fn kernels_positive_inside_support() {
        let h = 1.0;
        for i in 0..20 {
            let r = i as f64 * 0.05;
            assert!(poly6_2d(r * r, h) > 0.0, "poly6 should be positive at r={r}");
            assert!(spiky_2d(r * r, h) > 0.0, "spiky should be positive at r={r}");
        }
    }

    #[test]
    fn kernel_integrates_to_one_over_disc() {
        // Radial midpoint rule: integral of W(r) * 2 pi r dr over [0, h].
        let h = 0.7;
        let n = 20_000;
        let dr = h / n as f64;
        for kernel in [SmoothingKernel::Poly6, SmoothingKernel::Spiky] {
            let mut integral = 0.0;
            for i in 0..n {
                let r = (i as f64 + 0.5) * dr;
                integral += kernel.evaluate(r * r, h) * 2.0 * PI * r * dr;
            }
            assert!(
                (integral - 1.0).abs() < 1.0e-6,
                "{} integral = {integral}, expected ~1.0",
                kernel.name()
            );
        }
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let h = 2.0;
        let r_sq = [0.0, 1.0, 1.0, 2.0, 3.9];
        let mut w = Vec::new();
        assert!(SmoothingKernel::Poly6.normalized_weights(&r_sq, h, &mut w));
        assert_eq!(w.len(), r_sq.len());
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1.0e-12, "sum={sum}");
        // Closer neighbors weigh more.
        assert!(w[0] > w[1] && w[1] > w[3] && w[3] > w[4]);
    }

    #[test]
    fn normalized_weights_empty_is_noop() {
        let mut w = vec![42.0];
        assert!(!SmoothingKernel::Poly6.normalized_weights(&[], 1.0, &mut w));
        assert!(w.is_empty());
    }

    #[test]
    fn normalized_weights_on_support_boundary_is_degenerate() {
        // Every neighbor exactly at h has zero raw weight: no NaN, no contribution.
        let h = 1.0;
        let mut w = Vec::new();
        assert!(!SmoothingKernel::Poly6.normalized_weights(&[1.0, 1.0], h, &mut w));
        assert!(w.is_empty());
    }

    #[test]
    fn single_neighbor_gets_full_weight() {
        let mut w = Vec::new();
        assert!(SmoothingKernel::Spiky.normalized_weights(&[0.25], 1.0, &mut w));
        assert_eq!(w, vec![1.0]);
    }

    #[test]
    fn kernel_serde_names() {
        let json = serde_json::to_string(&SmoothingKernel::Spiky).unwrap();
        assert_eq!(json, "\"spiky\"");
        let k: SmoothingKernel = serde_json::from_str("\"poly6\"").unwrap();
        assert_eq!(k, SmoothingKernel::Poly6);
    }
}
