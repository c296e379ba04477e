//! Reference test framework for the SPH grid engine
//!
//! This crate generates seeded clustered scenes, sweeps grid parameters and
//! validates splat / gather accuracy through reference checks.

pub mod scene;
pub mod sweep;


use scene::{clustered_scene, SceneConfig};
use sphgrid::{GridConfig, GridManager};
use warmstart::WorldSnapshot;

/// Channel the reference checks splat
const CHECK_CHANNEL: &str = "mass";

/// Expected result criteria for a reference test
#[derive(Debug, Clone)]
pub struct ExpectedResult {
    /// Splatted grid total against the scene total
    pub conservation: Option<ConservationCheck>,
    /// Values recovered at the bodies after a splat / gather round trip
    pub round_trip: Option<RoundTripCheck>,
}

/// Check that splatting preserves the channel total
#[derive(Debug, Clone)]
pub struct ConservationCheck {
    /// Maximum allowed relative error of the grid total
    pub max_relative_error: f64,
}

/// Check values recovered at the body positions
#[derive(Debug, Clone)]
pub struct RoundTripCheck {
    /// Maximum allowed relative error of the recovered total
    pub max_total_error: f64,
    /// Maximum allowed mean per-body relative error
    pub max_body_error: f64,
}

/// Result of running a reference test
#[derive(Debug)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether test passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Bodies in the scene
    pub bodies: usize,
    /// Channel total over the scene
    pub scene_total: f64,
}

/// Result of an individual validation check
#[derive(Debug)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Whether check passed
    pub passed: bool,
    /// Detail or error message
    pub message: Option<String>,
}

/// A reference test case
pub struct ReferenceTest {
    /// Test name
    pub name: String,
    /// Scene to generate
    pub scene: SceneConfig,
    /// Grid under test
    pub grid: GridConfig,
    /// Expected results to validate
    pub expected: ExpectedResult,
}

impl ReferenceTest {
    /// Run the reference test and return results
    pub fn run(&self) -> Result<TestResult, String> {
        tracing::info!("Running reference test: {}", self.name);

        let world = clustered_scene(&self.scene)?;
        let mut manager = GridManager::new(self.grid.clone()).map_err(|e| e.to_string())?;
        manager.create_grids(&world.body_table(), &[CHECK_CHANNEL]);

        let scene_total: f64 = world.bodies.iter().map(|b| b.mass).sum();
        tracing::info!(
            "Splatted {} bodies onto {:?} nodes, h={}",
            world.bodies.len(),
            manager.geometry().dims(),
            manager.support_radius()
        );

        let mut checks = Vec::new();
        let mut all_passed = true;

        if let Some(ref conservation) = self.expected.conservation {
            let check = validate_conservation(&manager, scene_total, conservation);
            all_passed &= check.passed;
            checks.push(check);
        }

        if let Some(ref round_trip) = self.expected.round_trip {
            let check = validate_round_trip(&manager, &world, round_trip);
            all_passed &= check.passed;
            checks.push(check);
        }

        Ok(TestResult {
            name: self.name.clone(),
            passed: all_passed,
            checks,
            bodies: world.bodies.len(),
            scene_total,
        })
    }
}

fn relative(error: f64, reference: f64) -> f64 {
    error.abs() / reference.abs().max(1.0e-12)
}

/// Validate the splatted grid total
fn validate_conservation(manager: &GridManager, scene_total: f64, check: &ConservationCheck) -> CheckResult {
    let grid_total = match manager.channel(CHECK_CHANNEL) {
        Ok(grid) => grid.sum(),
        Err(e) => {
            return CheckResult {
                name: "Conservation".to_string(),
                passed: false,
                message: Some(e.to_string()),
            }
        }
    };
    let error = relative(grid_total - scene_total, scene_total);

    CheckResult {
        name: "Conservation".to_string(),
        passed: error <= check.max_relative_error,
        message: Some(format!(
            "Scene: {:.4}, Grid: {:.4} (error: {:.2e}, limit: {:.2e})",
            scene_total, grid_total, error, check.max_relative_error
        )),
    }
}

/// Validate values gathered back at the bodies
fn validate_round_trip(manager: &GridManager, world: &WorldSnapshot, check: &RoundTripCheck) -> CheckResult {
    let points: Vec<[f64; 2]> = world.bodies.iter().map(|b| [b.px, b.py]).collect();
    let recovered = match manager.query_tree(&points, CHECK_CHANNEL) {
        Ok(values) => values,
        Err(e) => {
            return CheckResult {
                name: "Round Trip".to_string(),
                passed: false,
                message: Some(e.to_string()),
            }
        }
    };

    let scene_total: f64 = world.bodies.iter().map(|b| b.mass).sum();
    let recovered_total: f64 = recovered.iter().sum();
    let total_error = relative(recovered_total - scene_total, scene_total);
    let body_error = if world.bodies.is_empty() {
        0.0
    } else {
        world
            .bodies
            .iter()
            .zip(&recovered)
            .map(|(b, v)| relative(v - b.mass, b.mass))
            .sum::<f64>()
            / world.bodies.len() as f64
    };

    let total_ok = total_error <= check.max_total_error;
    let body_ok = body_error <= check.max_body_error;
    if total_ok && body_ok {
        CheckResult {
            name: "Round Trip".to_string(),
            passed: true,
            message: Some(format!("Total: {:.2e}, Mean body: {:.2}%", total_error, body_error * 100.0)),
        }
    } else {
        let mut issues = Vec::new();
        if !total_ok {
            issues.push(format!("Total: {:.2e} (limit: {:.2e})", total_error, check.max_total_error));
        }
        if !body_ok {
            issues.push(format!(
                "Mean body: {:.2}% (limit: {:.2}%)",
                body_error * 100.0,
                check.max_body_error * 100.0
            ));
        }
        CheckResult {
            name: "Round Trip".to_string(),
            passed: false,
            message: Some(issues.join(", ")),
        }
    }
}

impl TestResult {
    /// Print a summary of the test result
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("Test: {}", self.name);
        println!("{}", "=".repeat(80));
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
        println!("Bodies: {}", self.bodies);
        println!("Scene total: {:.4}", self.scene_total);
        println!("\nValidation Checks:");
        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", status, check.name);
            if let Some(ref msg) = check.message {
                print!(" - {}", msg);
            }
            println!();
        }
        println!("{}", "=".repeat(80));
    }
}

/// Reference suite shared by the binary and `cargo test`
pub fn all_tests() -> Vec<ReferenceTest> {
    vec![dense_cluster_test(), sparse_scene_test(), spiky_kernel_test()]
}

/// Many bodies on a fine lattice: totals survive both directions and
/// bodies are recovered closely
fn dense_cluster_test() -> ReferenceTest {
    ReferenceTest {
        name: "Dense Cluster".to_string(),
        scene: SceneConfig::new(50, [0.0, 0.0], [50.0, 50.0], 123),
        grid: GridConfig::new([0.0, 0.0], [50.0, 50.0], 0.25, 0.25, 0.5),
        expected: ExpectedResult {
            conservation: Some(ConservationCheck {
                max_relative_error: 1.0e-9,
            }),
            round_trip: Some(RoundTripCheck {
                max_total_error: 1.0e-9,
                // bodies are at least two radii apart, beyond 2h
                max_body_error: 1.0e-9,
            }),
        },
    }
}

/// Coarse lattice with a support radius spanning several bodies
fn sparse_scene_test() -> ReferenceTest {
    ReferenceTest {
        name: "Wide Support".to_string(),
        scene: SceneConfig::new(25, [0.0, 0.0], [50.0, 50.0], 7),
        grid: GridConfig::new([0.0, 0.0], [50.0, 50.0], 1.0, 1.0, 2.0),
        expected: ExpectedResult {
            conservation: Some(ConservationCheck {
                max_relative_error: 1.0e-9,
            }),
            round_trip: Some(RoundTripCheck {
                max_total_error: 1.0e-9,
                max_body_error: 1.0,
            }),
        },
    }
}

/// Same checks with the spiky kernel
fn spiky_kernel_test() -> ReferenceTest {
    ReferenceTest {
        name: "Spiky Kernel".to_string(),
        scene: SceneConfig::new(40, [0.0, 0.0], [50.0, 50.0], 42),
        grid: GridConfig::new([0.0, 0.0], [50.0, 50.0], 0.5, 0.5, 0.75)
            .with_kernel(sphgrid::SmoothingKernel::Spiky),
        expected: ExpectedResult {
            conservation: Some(ConservationCheck {
                max_relative_error: 1.0e-9,
            }),
            round_trip: Some(RoundTripCheck {
                max_total_error: 1.0e-9,
                max_body_error: 1.0e-9,
            }),
        },
    }
}
