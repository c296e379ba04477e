//! Fixed-radius neighbor search in 2D.
//!
//! [`BucketGrid`] is the production index: a uniform bucket grid using
//! sorted-index + cell-offset arrays built with a counting sort, so a rebuild
//! is linear and a query touches only the cells overlapping the search disc.
//! [`LinearScan`] checks every point and serves as the reference oracle.

/// Upper bound on buckets allocated by [`BucketGrid`]. Point sets spread far
/// beyond the cell size get coarser buckets instead of a huge allocation.
const MAX_CELLS: usize = 1 << 22;

/// Static, rebuildable "all points within radius" index.
pub trait SpatialIndex {
    /// Replace the indexed point set.
    fn rebuild(&mut self, points: &[[f64; 2]]);

    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Return `true` if no points are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke `f(index, r_sq)` for every indexed point whose squared
    /// distance to `query` is `<= radius^2`.
    ///
    /// Visit order is deterministic for identical input order.
    fn for_each_within<F>(&self, query: [f64; 2], radius: f64, f: F)
    where
        F: FnMut(usize, f64);

    /// Neighbor index lists for a batch of queries, one list per query.
    fn query_radius(&self, queries: &[[f64; 2]], radius: f64) -> Vec<Vec<usize>> {
        queries
            .iter()
            .map(|&q| {
                let mut found = Vec::new();
                self.for_each_within(q, radius, |j, _| found.push(j));
                found
            })
            .collect()
    }
}

/// Uniform bucket grid over an arbitrary 2D point set.
///
/// The bucket domain is the bounding box of the finite input points. Points
/// and queries outside that box are clamped into the edge buckets, which
/// keeps the search exact because clamping never increases the bucket
/// distance between two positions.
#[derive(Debug, Clone)]
pub struct BucketGrid {
    /// Requested bucket edge length (usually the support radius).
    cell_size: f64,
    /// Effective bucket edge length after the [`MAX_CELLS`] cap.
    effective_cell: f64,
    grid_min: [f64; 2],
    grid_dims: [usize; 2],
    points: Vec<[f64; 2]>,
    /// Bucket index for each point (parallel to `points`).
    cell_indices: Vec<u32>,
    /// Point indices sorted by bucket.
    sorted_indices: Vec<u32>,
    /// Start offset in `sorted_indices` for each bucket.
    cell_offsets: Vec<u32>,
    /// Number of points in each bucket.
    cell_counts: Vec<u32>,
}

impl BucketGrid {
    /// Create an empty index with the given bucket edge length.
    ///
    /// `cell_size` should be set to the search radius.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            effective_cell: cell_size,
            grid_min: [0.0; 2],
            grid_dims: [1, 1],
            points: Vec::new(),
            cell_indices: Vec::new(),
            sorted_indices: Vec::new(),
            cell_offsets: vec![0; 1],
            cell_counts: vec![0; 1],
        }
    }

    /// Create an index and populate it in one call.
    pub fn build(points: &[[f64; 2]], cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        grid.rebuild(points);
        grid
    }

    /// Bucket dimensions `[nx, ny]` of the current build.
    pub fn dims(&self) -> [usize; 2] {
        self.grid_dims
    }

    /// Indexed positions, in input order.
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    fn total_cells(&self) -> usize {
        self.grid_dims[0] * self.grid_dims[1]
    }

    /// Map a position to its bucket (cx, cy), clamped to grid bounds.
    #[inline]
    fn pos_to_cell(&self, p: [f64; 2]) -> (usize, usize) {
        let cx = ((p[0] - self.grid_min[0]) / self.effective_cell)
            .floor()
            .max(0.0)
            .min((self.grid_dims[0] - 1) as f64) as usize;
        let cy = ((p[1] - self.grid_min[1]) / self.effective_cell)
            .floor()
            .max(0.0)
            .min((self.grid_dims[1] - 1) as f64) as usize;
        (cx, cy)
    }

    #[inline]
    fn cell_hash(&self, cx: usize, cy: usize) -> usize {
        cx + cy * self.grid_dims[0]
    }

    /// Size the bucket domain to the bounding box of the finite points.
    fn fit_domain(&mut self, points: &[[f64; 2]]) {
        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        for p in points.iter().filter(|p| p[0].is_finite() && p[1].is_finite()) {
            lo[0] = lo[0].min(p[0]);
            lo[1] = lo[1].min(p[1]);
            hi[0] = hi[0].max(p[0]);
            hi[1] = hi[1].max(p[1]);
        }
        if lo[0] > hi[0] {
            // No finite points.
            self.grid_min = [0.0; 2];
            self.grid_dims = [1, 1];
            self.effective_cell = self.cell_size;
            return;
        }

        // Spans of points near +-f64::MAX overflow to infinity.
        let span = [(hi[0] - lo[0]).min(f64::MAX), (hi[1] - lo[1]).min(f64::MAX)];
        let mut cell = self.cell_size;
        let dims = loop {
            // Sized in f64 so a huge spread cannot overflow the cast.
            let fx = (span[0] / cell).floor() + 1.0;
            let fy = (span[1] / cell).floor() + 1.0;
            if fx * fy <= MAX_CELLS as f64 {
                break [fx as usize, fy as usize];
            }
            cell *= 2.0;
        };
        self.grid_min = lo;
        self.grid_dims = dims;
        self.effective_cell = cell;
    }
}

impl SpatialIndex for BucketGrid {
    fn rebuild(&mut self, points: &[[f64; 2]]) {
        let n = points.len();
        self.points.clear();
        self.points.extend_from_slice(points);
        self.fit_domain(points);

        let total_cells = self.total_cells();

        // Row-major bucket of every point.
        self.cell_indices.resize(n, 0);
        for i in 0..n {
            let (cx, cy) = self.pos_to_cell(points[i]);
            self.cell_indices[i] = self.cell_hash(cx, cy) as u32;
        }

        self.cell_counts.clear();
        self.cell_counts.resize(total_cells, 0);
        for &ci in &self.cell_indices {
            self.cell_counts[ci as usize] += 1;
        }

        // Bucket b owns sorted_indices[offsets[b]..offsets[b] + counts[b]].
        self.cell_offsets.clear();
        self.cell_offsets.resize(total_cells, 0);
        let mut running = 0u32;
        for c in 0..total_cells {
            self.cell_offsets[c] = running;
            running += self.cell_counts[c];
        }

        // Input order is kept within a bucket, so queries visit points deterministically.
        self.sorted_indices.resize(n, 0);
        let mut write_heads = self.cell_offsets.clone();
        for i in 0..n {
            let ci = self.cell_indices[i] as usize;
            let pos = write_heads[ci] as usize;
            self.sorted_indices[pos] = i as u32;
            write_heads[ci] += 1;
        }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn for_each_within<F>(&self, query: [f64; 2], radius: f64, mut f: F)
    where
        F: FnMut(usize, f64),
    {
        if self.points.is_empty() || !(radius >= 0.0) {
            return;
        }
        let (cx, cy) = self.pos_to_cell(query);
        let radius_sq = radius * radius;
        let reach = (radius / self.effective_cell).ceil();
        let reach_x = reach.min(self.grid_dims[0] as f64) as usize;
        let reach_y = reach.min(self.grid_dims[1] as f64) as usize;

        let y_lo = cy.saturating_sub(reach_y);
        let y_hi = (cy + reach_y).min(self.grid_dims[1] - 1);
        let x_lo = cx.saturating_sub(reach_x);
        let x_hi = (cx + reach_x).min(self.grid_dims[0] - 1);

        for ny in y_lo..=y_hi {
            for nx in x_lo..=x_hi {
                let cell = self.cell_hash(nx, ny);
                let start = self.cell_offsets[cell] as usize;
                let count = self.cell_counts[cell] as usize;

                for s in start..start + count {
                    let j = self.sorted_indices[s] as usize;
                    let p = self.points[j];
                    let ddx = query[0] - p[0];
                    let ddy = query[1] - p[1];
                    let dist_sq = ddx * ddx + ddy * ddy;
                    if dist_sq <= radius_sq {
                        f(j, dist_sq);
                    }
                }
            }
        }
    }
}

/// Brute-force index: every query checks every point.
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    points: Vec<[f64; 2]>,
}

impl LinearScan {
    /// Create an index over `points`.
    pub fn build(points: &[[f64; 2]]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl SpatialIndex for LinearScan {
    fn rebuild(&mut self, points: &[[f64; 2]]) {
        self.points.clear();
        self.points.extend_from_slice(points);
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn for_each_within<F>(&self, query: [f64; 2], radius: f64, mut f: F)
    where
        F: FnMut(usize, f64),
    {
        let radius_sq = radius * radius;
        for (j, p) in self.points.iter().enumerate() {
            let ddx = query[0] - p[0];
            let ddy = query[1] - p[1];
            let dist_sq = ddx * ddx + ddy * ddy;
            if dist_sq <= radius_sq {
                f(j, dist_sq);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    /// Deterministic scattered points (golden-ratio sequence).
    fn scattered(n: usize, extent: f64) -> Vec<[f64; 2]> {
        let phi = 0.618_033_988_749_895_f64;
        (0..n)
            .map(|i| {
                let a = (i as f64 * phi).fract();
                let b = (i as f64 * phi * phi + 0.31).fract();
                [a * extent, b * extent]
            })
            .collect()
    }

    #[test]
    fn empty_index_returns_empty_lists() {
        let grid = BucketGrid::build(&[], 0.5);
        assert!(grid.is_empty());
        let found = grid.query_radius(&[[0.0, 0.0], [3.0, -1.0]], 10.0);
        assert_eq!(found, vec![Vec::<usize>::new(), Vec::new()]);
    }

    #[test]
    fn single_point_outside_radius() {
        let grid = BucketGrid::build(&[[0.5, 0.5]], 0.2);
        let found = grid.query_radius(&[[0.9, 0.5]], 0.2);
        assert!(found[0].is_empty());
    }

    #[test]
    fn two_close_points() {
        let points = [[0.5, 0.5], [0.51, 0.5]];
        let grid = BucketGrid::build(&points, 0.2);
        let found = grid.query_radius(&[[0.5, 0.5]], 0.2);
        assert_eq!(sorted(found[0].clone()), vec![0, 1]);
    }

    #[test]
    fn boundary_distance_is_inclusive() {
        let grid = BucketGrid::build(&[[1.0, 0.0]], 1.0);
        let mut hits = Vec::new();
        grid.for_each_within([0.0, 0.0], 1.0, |j, r_sq| hits.push((j, r_sq)));
        assert_eq!(hits, vec![(0, 1.0)]);
    }

    #[test]
    fn points_across_bucket_boundary() {
        let cell_size = 0.2;
        let points = [[0.19, 0.5], [0.21, 0.5], [0.0, 0.0], [1.0, 1.0]];
        let grid = BucketGrid::build(&points, cell_size);
        let found = grid.query_radius(&[[0.19, 0.5]], cell_size);
        assert_eq!(sorted(found[0].clone()), vec![0, 1]);
    }

    #[test]
    fn query_outside_bounding_box() {
        let points = [[0.0, 0.0], [0.5, 0.0], [5.0, 5.0]];
        let grid = BucketGrid::build(&points, 1.0);
        let found = grid.query_radius(&[[-0.8, 0.0]], 1.0);
        assert_eq!(found[0], vec![0]);
    }

    #[test]
    fn radius_larger_than_bucket() {
        let points = scattered(200, 10.0);
        let grid = BucketGrid::build(&points, 0.5);
        let oracle = LinearScan::build(&points);
        let q = [[5.0, 5.0], [0.0, 10.0]];
        let a = grid.query_radius(&q, 2.3);
        let b = oracle.query_radius(&q, 2.3);
        for (x, y) in a.into_iter().zip(b) {
            assert_eq!(sorted(x), sorted(y));
        }
    }

    #[test]
    fn matches_linear_scan() {
        let points = scattered(500, 20.0);
        let queries = scattered(97, 24.0);
        let grid = BucketGrid::build(&points, 1.0);
        let oracle = LinearScan::build(&points);
        let a = grid.query_radius(&queries, 1.0);
        let b = oracle.query_radius(&queries, 1.0);
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.into_iter().zip(b).enumerate() {
            assert_eq!(sorted(x), sorted(y), "query {i} disagrees");
        }
    }

    #[test]
    fn query_order_is_deterministic() {
        let points = scattered(300, 10.0);
        let a = BucketGrid::build(&points, 0.7).query_radius(&points, 0.7);
        let b = BucketGrid::build(&points, 0.7).query_radius(&points, 0.7);
        assert_eq!(a, b);
    }

    #[test]
    fn far_outlier_caps_bucket_count() {
        let points = [[0.0, 0.0], [1.0e9, 1.0e9], [0.1, 0.0]];
        let grid = BucketGrid::build(&points, 1.0e-3);
        let [nx, ny] = grid.dims();
        assert!(nx * ny <= MAX_CELLS);
        let found = grid.query_radius(&[[0.0, 0.0]], 0.2);
        assert_eq!(sorted(found[0].clone()), vec![0, 2]);
    }

    #[test]
    fn astronomical_spread_stays_bounded() {
        for points in [
            vec![[0.0, 0.0], [1.0e20, 0.0]],
            vec![[-f64::MAX, 0.0], [f64::MAX, 1.0e300]],
        ] {
            let grid = BucketGrid::build(&points, 1.0);
            let [nx, ny] = grid.dims();
            assert!(nx >= 1 && ny >= 1 && nx * ny <= MAX_CELLS, "dims {nx}x{ny}");
            assert_eq!(grid.query_radius(&[points[0]], 1.0)[0], vec![0]);
        }
    }

    #[test]
    fn non_finite_points_are_never_reported() {
        let points = [[f64::NAN, 0.0], [0.0, 0.0], [f64::INFINITY, 1.0]];
        let grid = BucketGrid::build(&points, 1.0);
        let found = grid.query_radius(&[[0.0, 0.0]], 5.0);
        assert_eq!(found[0], vec![1]);
    }

    #[test]
    fn rebuild_replaces_points() {
        let mut grid = BucketGrid::build(&[[0.0, 0.0]], 1.0);
        grid.rebuild(&[[10.0, 10.0], [10.5, 10.0]]);
        assert_eq!(grid.len(), 2);
        assert!(grid.query_radius(&[[0.0, 0.0]], 1.0)[0].is_empty());
        assert_eq!(sorted(grid.query_radius(&[[10.0, 10.0]], 1.0)[0].clone()), vec![0, 1]);
    }
}
