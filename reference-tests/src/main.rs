//! Reference test binary entry point
//!
//! Runs the grid parameter sweep over seeded clustered scenes, then every
//! reference test case.

use reference_tests::scene::{clustered_scene, SceneConfig};
use reference_tests::sweep::{grid_search, print_sweep};
use reference_tests::{all_tests, TestResult};
use tracing_subscriber::EnvFilter;

/// Number of scenes averaged per parameter pair
const SWEEP_WORLDS: u64 = 25;
/// Bodies per sweep scene
const SWEEP_BODIES: usize = 50;
/// Lattice spacings tried
const RESOLUTIONS: [f64; 7] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0];
/// Support radii tried
const RADII: [f64; 7] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

fn run_sweep() -> Result<(), String> {
    let lower_left = [0.0, 0.0];
    let upper_right = [50.0, 50.0];

    let worlds = (0..SWEEP_WORLDS)
        .map(|seed| clustered_scene(&SceneConfig::new(SWEEP_BODIES, lower_left, upper_right, seed)))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!("Generated {} sweep scenes", worlds.len());

    let results = grid_search(&worlds, lower_left, upper_right, &RESOLUTIONS, &RADII).map_err(|e| e.to_string())?;
    if let Some(body) = worlds.first().and_then(|w| w.bodies.first()) {
        let total: f64 = worlds[0].bodies.iter().map(|b| b.mass).sum();
        println!("Original total: {:.2}", total);
        println!("Body mass:      {:.2}", body.mass);
    }
    print_sweep(&results);
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    tracing::info!("SPH Grid Reference Suite");
    tracing::info!("========================");

    let mut failed_count = 0;
    if let Err(e) = run_sweep() {
        eprintln!("\nERROR running grid sweep: {}", e);
        failed_count += 1;
    }

    let tests = all_tests();
    tracing::info!("Found {} reference tests", tests.len());

    let mut results: Vec<TestResult> = Vec::new();
    let mut passed_count = 0;
    for test in tests {
        match test.run() {
            Ok(result) => {
                if result.passed {
                    passed_count += 1;
                } else {
                    failed_count += 1;
                }
                result.print_summary();
                results.push(result);
            }
            Err(e) => {
                eprintln!("\nERROR running test {}: {}", test.name, e);
                failed_count += 1;
            }
        }
    }

    // Print overall summary
    println!("\n{}", "=".repeat(80));
    println!("OVERALL SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total tests: {}", results.len());
    println!("Passed: {}", passed_count);
    println!("Failed: {}", failed_count);
    println!("{}", "=".repeat(80));

    if failed_count > 0 {
        std::process::exit(1);
    }
}
