//! Grid parameter sweep
//!
//! For every (resolution, support radius) pair, each scene's body masses are
//! splatted and read back at the body positions. Two errors are reported,
//! both averaged over scenes:
//! - world total: |sum of masses - sum of recovered values|
//! - per body: mean |mass - recovered value|

use sphgrid::{GridConfig, GridManager, GridResult};
use warmstart::WorldSnapshot;

/// Channel splatted during the sweep
pub const SWEEP_CHANNEL: &str = "mass";

/// Averaged errors for one parameter pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    /// Lattice spacing (both axes)
    pub res: f64,
    /// Support radius
    pub h: f64,
    /// Average world-total error
    pub avg_total_error: f64,
    /// Average per-body error
    pub avg_body_error: f64,
}

/// Errors of one scene under one manager
fn scene_errors(manager: &mut GridManager, world: &WorldSnapshot) -> GridResult<(f64, f64)> {
    manager.create_grids(&world.body_table(), &[SWEEP_CHANNEL]);
    let points: Vec<[f64; 2]> = world.bodies.iter().map(|b| [b.px, b.py]).collect();
    let recovered = manager.query_tree(&points, SWEEP_CHANNEL)?;

    let original: f64 = world.bodies.iter().map(|b| b.mass).sum();
    let total: f64 = recovered.iter().sum();
    let body_error = if world.bodies.is_empty() {
        0.0
    } else {
        world
            .bodies
            .iter()
            .zip(&recovered)
            .map(|(b, v)| (b.mass - v).abs())
            .sum::<f64>()
            / world.bodies.len() as f64
    };
    Ok(((original - total).abs(), body_error))
}

/// Run the sweep over every `(res, h)` combination.
///
/// Results are sorted by average world-total error, smallest first.
pub fn grid_search(
    worlds: &[WorldSnapshot],
    lower_left: [f64; 2],
    upper_right: [f64; 2],
    resolutions: &[f64],
    radii: &[f64],
) -> GridResult<Vec<SweepResult>> {
    let pairs: Vec<(f64, f64)> = resolutions
        .iter()
        .flat_map(|&res| radii.iter().map(move |&h| (res, h)))
        .collect();

    let mut results = Vec::with_capacity(pairs.len());
    for (i, &(res, h)) in pairs.iter().enumerate() {
        tracing::info!("Trying parameter set {} of {}: res={}, h={}", i + 1, pairs.len(), res, h);

        let mut manager = GridManager::new(GridConfig::new(lower_left, upper_right, res, res, h))?;
        let mut total_sum = 0.0;
        let mut body_sum = 0.0;
        for world in worlds {
            let (total, body) = scene_errors(&mut manager, world)?;
            total_sum += total;
            body_sum += body;
        }

        let n = worlds.len().max(1) as f64;
        results.push(SweepResult {
            res,
            h,
            avg_total_error: total_sum / n,
            avg_body_error: body_sum / n,
        });
    }

    results.sort_by(|a, b| a.avg_total_error.total_cmp(&b.avg_total_error));
    Ok(results)
}

/// Print a sweep table
pub fn print_sweep(results: &[SweepResult]) {
    println!("\n{:>6} {:>6} {:>16} {:>16}", "res", "h", "Avg total diff", "Avg body diff");
    println!("{}", "-".repeat(48));
    for r in results {
        println!(
            "{:>6.2} {:>6.2} {:>16.4} {:>16.4}",
            r.res, r.h, r.avg_total_error, r.avg_body_error
        );
    }
}
