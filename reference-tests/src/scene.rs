//! Seeded scene generation for grid sweeps and reference checks.
//!
//! Circles of unit density are drawn around the box center from a normal
//! distribution and rejected when they leave the box or overlap a circle
//! already placed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use warmstart::{BodySnapshot, WorldSnapshot};

/// Consecutive rejections tolerated before a scene is declared full
const MAX_CONSECUTIVE_TRIES: usize = 100;

/// Parameters of a clustered-circles scene
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Number of bodies to place
    pub bodies: usize,
    /// Lower-left corner of the confining box
    pub lower_left: [f64; 2],
    /// Upper-right corner of the confining box
    pub upper_right: [f64; 2],
    /// Minimum and maximum circle radius
    pub radius: (f64, f64),
    /// Spread multiplier; per-axis sigma is `sqrt(extent / 2) * sigma_coef`
    pub sigma_coef: f64,
    /// RNG seed
    pub seed: u64,
}

impl SceneConfig {
    /// Unit circles confined to the given box
    pub fn new(bodies: usize, lower_left: [f64; 2], upper_right: [f64; 2], seed: u64) -> Self {
        Self {
            bodies,
            lower_left,
            upper_right,
            radius: (1.0, 1.0),
            sigma_coef: 1.2,
            seed,
        }
    }
}

/// One placed circle
#[derive(Debug, Clone, Copy)]
struct Circle {
    center: [f64; 2],
    radius: f64,
}

/// Generate a clustered scene of resting bodies.
///
/// Body ids run from 0 in placement order; mass is the circle area.
pub fn clustered_scene(config: &SceneConfig) -> Result<WorldSnapshot, String> {
    let (min_radius, max_radius) = config.radius;
    if min_radius <= 0.0 || max_radius < min_radius {
        return Err(format!("Invalid radius range ({}, {})", min_radius, max_radius));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let [xlo, ylo] = config.lower_left;
    let [xhi, yhi] = config.upper_right;
    let spread = |lo: f64, hi: f64| {
        Normal::new((lo + hi) / 2.0, ((hi - lo) / 2.0).sqrt() * config.sigma_coef)
            .map_err(|e| format!("Invalid scene spread: {}", e))
    };
    let x_dist = spread(xlo, xhi)?;
    let y_dist = spread(ylo, yhi)?;

    let radii: Vec<f64> = (0..config.bodies)
        .map(|_| min_radius + rng.gen::<f64>() * (max_radius - min_radius))
        .collect();

    let mut circles: Vec<Circle> = Vec::with_capacity(config.bodies);
    let mut failed = 0;
    while circles.len() < config.bodies {
        let radius = radii[circles.len()];
        let center = [x_dist.sample(&mut rng), y_dist.sample(&mut rng)];

        let inside = center[0] - xlo >= radius
            && xhi - center[0] >= radius
            && center[1] - ylo >= radius
            && yhi - center[1] >= radius;
        let clear = circles.iter().all(|c| {
            let dx = c.center[0] - center[0];
            let dy = c.center[1] - center[1];
            (dx * dx + dy * dy).sqrt() > c.radius + radius
        });

        if inside && clear {
            circles.push(Circle { center, radius });
            failed = 0;
            continue;
        }

        failed += 1;
        if failed > MAX_CONSECUTIVE_TRIES {
            return Err(format!(
                "Unable to place a circle after {} tries. Only {} out of {} circles could fit",
                MAX_CONSECUTIVE_TRIES,
                circles.len(),
                config.bodies
            ));
        }
    }

    let bodies = circles
        .iter()
        .enumerate()
        .map(|(id, c)| {
            let mut body = BodySnapshot::at_rest(id as u64, c.center[0], c.center[1]);
            body.mass = std::f64::consts::PI * c.radius * c.radius;
            body.inertia = 0.5 * body.mass * c.radius * c.radius;
            body
        })
        .collect();

    tracing::debug!("Placed {} bodies (seed {})", config.bodies, config.seed);
    Ok(WorldSnapshot {
        bodies,
        contacts: Vec::new(),
    })
}
