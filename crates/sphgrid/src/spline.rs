//! Smooth continuous lookup over a populated channel.
//!
//! Tensor-product natural cubic spline through the node values: cubic
//! splines along y are prepared once per lattice row, and each lookup fits
//! one cubic spline along x through the row values at the query's y.

use crate::channel::ChannelGrid;
use crate::geometry::GridGeometry;

/// Interpolating (zero-smoothing) bicubic spline over one channel.
///
/// Queries outside the lattice are clamped to its bounding box.
#[derive(Debug, Clone)]
pub struct BicubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Node values, row-major like [`ChannelGrid`].
    values: Vec<f64>,
    /// Second derivatives along y for every row.
    m_y: Vec<f64>,
}

impl BicubicSpline {
    /// Fit a spline to `grid` on `geometry`'s lattice.
    ///
    /// # Panics
    /// If `grid` is not shaped like `geometry`.
    pub fn new(geometry: &GridGeometry, grid: &ChannelGrid) -> Self {
        assert_eq!(grid.dims(), geometry.dims(), "grid shape must match geometry");
        let xs = geometry.x_coords().to_vec();
        let ys = geometry.y_coords().to_vec();
        let ny = ys.len();
        let values = grid.as_slice().to_vec();

        let mut m_y = vec![0.0; values.len()];
        let mut scratch = Vec::new();
        for (row, m_row) in values.chunks_exact(ny).zip(m_y.chunks_exact_mut(ny)) {
            natural_second_derivatives(&ys, row, m_row, &mut scratch);
        }

        Self { xs, ys, values, m_y }
    }

    /// Evaluate the spline at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let ny = self.ys.len();
        let column: Vec<f64> = self
            .values
            .chunks_exact(ny)
            .zip(self.m_y.chunks_exact(ny))
            .map(|(row, m_row)| eval_cubic(&self.ys, row, m_row, y))
            .collect();

        let mut m_x = vec![0.0; column.len()];
        let mut scratch = Vec::new();
        natural_second_derivatives(&self.xs, &column, &mut m_x, &mut scratch);
        eval_cubic(&self.xs, &column, &m_x, x)
    }
}

/// Solve for the second derivatives of a natural cubic spline through
/// `(xs[k], ys[k])`, writing them into `out`. Fewer than three knots give a
/// piecewise-linear (all-zero) result.
fn natural_second_derivatives(xs: &[f64], ys: &[f64], out: &mut [f64], scratch: &mut Vec<f64>) {
    let n = xs.len();
    out.fill(0.0);
    if n < 3 {
        return;
    }

    // Thomas algorithm on the interior knots 1..n-1.
    // scratch[..n] holds the modified super-diagonal, out[] the modified rhs.
    scratch.clear();
    scratch.resize(n, 0.0);
    for i in 1..n - 1 {
        let h_lo = xs[i] - xs[i - 1];
        let h_hi = xs[i + 1] - xs[i];
        let rhs = 6.0 * ((ys[i + 1] - ys[i]) / h_hi - (ys[i] - ys[i - 1]) / h_lo);
        let diag = 2.0 * (h_lo + h_hi) - h_lo * scratch[i - 1];
        scratch[i] = h_hi / diag;
        out[i] = (rhs - h_lo * out[i - 1]) / diag;
    }
    // out[n - 1] stays 0 (natural end condition).
    for i in (1..n - 1).rev() {
        out[i] -= scratch[i] * out[i + 1];
    }
}

/// Evaluate a cubic spline with knot second derivatives `m` at `x`
/// (clamped to the knot range).
fn eval_cubic(xs: &[f64], ys: &[f64], m: &[f64], x: f64) -> f64 {
    let n = xs.len();
    if n == 1 {
        return ys[0];
    }
    let x = x.clamp(xs[0], xs[n - 1]);
    let k = xs.partition_point(|&knot| knot <= x).clamp(1, n - 1) - 1;

    let h = xs[k + 1] - xs[k];
    let a = (xs[k + 1] - x) / h;
    let b = (x - xs[k]) / h;
    a * ys[k] + b * ys[k + 1] + ((a * a * a - a) * m[k] + (b * b * b - b) * m[k + 1]) * h * h / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(geometry: &GridGeometry, f: impl Fn(f64, f64) -> f64) -> ChannelGrid {
        let mut grid = ChannelGrid::zeros(geometry.dims());
        for i in 0..geometry.nx() {
            for j in 0..geometry.ny() {
                let [x, y] = geometry.node_position(i, j);
                grid.set(i, j, f(x, y));
            }
        }
        grid
    }

    #[test]
    fn passes_through_node_values() {
        let g = GridGeometry::new([0.0, 0.0], [4.0, 3.0], [1.0, 0.5]).unwrap();
        let grid = grid_from(&g, |x, y| (x * 0.7).sin() + y * y);
        let spline = BicubicSpline::new(&g, &grid);
        for i in 0..g.nx() {
            for j in 0..g.ny() {
                let [x, y] = g.node_position(i, j);
                let v = spline.evaluate(x, y);
                assert!((v - grid.get(i, j)).abs() < 1.0e-10, "node ({i},{j}): {v}");
            }
        }
    }

    #[test]
    fn reproduces_bilinear_plane() {
        let g = GridGeometry::new([-2.0, 1.0], [2.0, 5.0], [0.5, 1.0]).unwrap();
        let plane = |x: f64, y: f64| 2.0 * x - 3.0 * y + 0.25;
        let spline = BicubicSpline::new(&g, &grid_from(&g, plane));
        for &(x, y) in &[(0.1, 1.3), (-1.77, 4.9), (1.99, 2.5)] {
            let v = spline.evaluate(x, y);
            assert!((v - plane(x, y)).abs() < 1.0e-10, "({x},{y}): {v}");
        }
    }

    #[test]
    fn smooth_field_is_close_between_nodes() {
        let g = GridGeometry::new([0.0, 0.0], [6.0, 6.0], [0.25, 0.25]).unwrap();
        let f = |x: f64, y: f64| (0.5 * x).sin() * (0.3 * y).cos();
        let spline = BicubicSpline::new(&g, &grid_from(&g, f));
        let v = spline.evaluate(3.1, 2.9);
        assert!((v - f(3.1, 2.9)).abs() < 1.0e-4, "v={v}");
    }

    #[test]
    fn clamps_outside_lattice() {
        let g = GridGeometry::new([0.0, 0.0], [2.0, 2.0], [1.0, 1.0]).unwrap();
        let grid = grid_from(&g, |x, y| x + 10.0 * y);
        let spline = BicubicSpline::new(&g, &grid);
        assert!((spline.evaluate(-5.0, 0.0) - 0.0).abs() < 1.0e-12);
        assert!((spline.evaluate(2.0, 9.0) - 22.0).abs() < 1.0e-12);
    }

    #[test]
    fn degenerate_single_row() {
        let g = GridGeometry::from_dims([0.0, 0.0], [1.0, 1.0], [1, 3]).unwrap();
        let grid = ChannelGrid::from_vec([1, 3], vec![1.0, 2.0, 3.0]).unwrap();
        let spline = BicubicSpline::new(&g, &grid);
        assert!((spline.evaluate(7.0, 1.5) - 2.5).abs() < 1.0e-12);
    }
}
