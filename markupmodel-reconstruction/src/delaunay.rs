//! 3D Delaunay tetrahedralization
//!
//! Incremental Bowyer-Watson insertion. The convex hull is closed off with a
//! vertex at infinity: every hull triangle carries one infinite cell, so the
//! finite cells always fill the hull of the points inserted so far. The
//! result is the whole hull, or only the alpha complex when an alpha radius is
//! configured.
//!
//! Orientation and insphere signs come from Shewchuk's adaptive exact
//! predicates (`robust`). They are evaluated on a slightly jittered copy of
//! the input so that cospherical and coplanar configurations (cube corners,
//! regular grids, cylinder caps) are in general position; the output always
//! references the original point indices and positions.

use markupmodel_core::{
    to_f64, Drawable, Error, LinedPointSet, Point3d, Result, TetrahedralMesh, Vector3d,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use robust::{insphere, Coord3D};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Relative magnitude of the predicate jitter
const JITTER_SCALE: f64 = 1e-9;

/// Vertex id standing for the point at infinity
const INFINITE: usize = usize::MAX;

/// Configuration for Delaunay tetrahedralization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delaunay3DConfig {
    /// Points closer than `tolerance` times the bounding box diagonal to an
    /// already inserted point are merged into it
    pub tolerance: f64,
    /// Keep only tetrahedra whose circumradius is at most `alpha` (0 keeps all)
    pub alpha: f64,
    /// Seed for the predicate jitter
    pub seed: u64,
}

impl Default for Delaunay3DConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            alpha: 0.0,
            seed: 0x5eed,
        }
    }
}

impl Delaunay3DConfig {
    /// Set the merge tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the alpha radius
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the jitter seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tolerance >= 0.0 && self.tolerance < 1.0) {
            return Err(Error::InvalidData(format!(
                "Delaunay tolerance must be in [0, 1), got {}",
                self.tolerance
            )));
        }
        if !(self.alpha >= 0.0) {
            return Err(Error::InvalidData(format!(
                "Alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

fn coord(p: &Point3d) -> Coord3D<f64> {
    Coord3D { x: p.x, y: p.y, z: p.z }
}

/// Six times the signed volume of `(a, b, c, d)`, with an exact sign
///
/// Positive when `d` lies on the side the counterclockwise normal of `abc`
/// points to.
pub fn orient3d(a: &Point3d, b: &Point3d, c: &Point3d, d: &Point3d) -> f64 {
    -robust::orient3d(coord(a), coord(b), coord(c), coord(d))
}

/// Whether `e` lies strictly inside the sphere through `a`, `b`, `c`, `d`
///
/// Either orientation of the four sphere points is accepted; a flat
/// quadruple has no sphere and contains nothing.
pub fn in_sphere(a: &Point3d, b: &Point3d, c: &Point3d, d: &Point3d, e: &Point3d) -> bool {
    let orientation = robust::orient3d(coord(a), coord(b), coord(c), coord(d));
    let side = insphere(coord(a), coord(b), coord(c), coord(d), coord(e));
    (orientation > 0.0 && side > 0.0) || (orientation < 0.0 && side < 0.0)
}

/// Whether `p`, coplanar with `a`, `b`, `c`, lies strictly inside their
/// circumcircle
fn in_circumcircle(a: &Point3d, b: &Point3d, c: &Point3d, p: &Point3d) -> bool {
    // Any sphere through the triangle cuts its plane in the circumcircle.
    let lifted = a + (b - a).cross(&(c - a));
    in_sphere(a, b, c, &lifted, p)
}

/// Circumscribed sphere of a tetrahedron as `(center, radius²)`
pub fn circumsphere(a: &Point3d, b: &Point3d, c: &Point3d, d: &Point3d) -> Option<(Point3d, f64)> {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let det = 2.0 * ab.dot(&ac.cross(&ad));

    let scale = ab.norm() * ac.norm() * ad.norm();
    if det.abs() <= f64::EPSILON * scale || !det.is_finite() {
        return None;
    }

    let offset = (ac.cross(&ad) * ab.norm_squared()
        + ad.cross(&ab) * ac.norm_squared()
        + ab.cross(&ac) * ad.norm_squared())
        / det;

    Some((a + offset, offset.norm_squared()))
}

/// Four input points spanning a volume, or why none exist
fn initial_simplex(points: &[Point3d], tolerance: f64) -> Result<[usize; 4]> {
    let p0 = points[0];

    let (i1, d1) = farthest(points, |p| (p - p0).norm());
    if d1 <= tolerance {
        return Err(Error::Degenerate("all points coincide".to_string()));
    }
    let axis = (points[i1] - p0) / d1;

    let (i2, d2) = farthest(points, |p| (p - p0).cross(&axis).norm());
    if d2 <= tolerance {
        return Err(Error::Degenerate("all points are collinear".to_string()));
    }
    let normal = axis.cross(&(points[i2] - p0)).normalize();

    let (i3, d3) = farthest(points, |p| (p - p0).dot(&normal).abs());
    if d3 <= tolerance {
        return Err(Error::Degenerate("all points are coplanar".to_string()));
    }

    Ok([0, i1, i2, i3])
}

fn farthest<F: Fn(&Point3d) -> f64>(points: &[Point3d], distance: F) -> (usize, f64) {
    points
        .iter()
        .map(|p| distance(p))
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best })
}

/// Rotate an oriented face so that its smallest id comes first
fn face_key(face: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = face;
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

/// Move the infinite vertex, if any, to the last slot with an even permutation
fn infinite_last(mut cell: [usize; 4]) -> [usize; 4] {
    if let Some(k) = cell[..3].iter().position(|&v| v == INFINITE) {
        cell.swap(k, 3);
        let (i, j) = match k {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        cell.swap(i, j);
    }
    cell
}

/// Cells of a Delaunay tetrahedralization closed by the vertex at infinity
///
/// Every cell is positively oriented. An infinite cell `[a, b, c, INFINITE]`
/// stores its hull triangle wound outward, so the hull interior lies on the
/// negative side of `abc`.
struct Triangulation<'a> {
    positions: &'a [Point3d],
    cells: Vec<[usize; 4]>,
    alive: Vec<bool>,
    /// Oriented face to the cell it bounds
    faces: HashMap<[usize; 3], usize>,
    /// A point strictly inside the hull at every stage
    interior: Point3d,
}

impl<'a> Triangulation<'a> {
    fn new(positions: &'a [Point3d], simplex: [usize; 4]) -> Result<Self> {
        let [a, mut b, mut c, d] = simplex;
        let [pa, pb, pc, pd] = simplex.map(|v| positions[v]);
        let side = orient3d(&pa, &pb, &pc, &pd);
        if side == 0.0 {
            return Err(Error::Degenerate("all points are coplanar".to_string()));
        }
        if side < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }

        let mut triangulation = Self {
            positions,
            cells: Vec::new(),
            alive: Vec::new(),
            faces: HashMap::new(),
            interior: Point3d::from((pa.coords + pb.coords + pc.coords + pd.coords) / 4.0),
        };

        let first = [a, b, c, d];
        triangulation.add_cell(first);
        for [x, y, z] in TetrahedralMesh::outward_faces(&first) {
            triangulation.add_cell([x, y, z, INFINITE]);
        }
        Ok(triangulation)
    }

    fn add_cell(&mut self, cell: [usize; 4]) {
        let id = self.cells.len();
        for face in TetrahedralMesh::outward_faces(&cell) {
            self.faces.insert(face_key(face), id);
        }
        self.cells.push(cell);
        self.alive.push(true);
    }

    fn remove_cell(&mut self, id: usize) {
        for face in TetrahedralMesh::outward_faces(&self.cells[id]) {
            self.faces.remove(&face_key(face));
        }
        self.alive[id] = false;
    }

    /// The cell on the other side of an oriented face
    fn neighbor(&self, [a, b, c]: [usize; 3]) -> Option<usize> {
        self.faces.get(&face_key([a, c, b])).copied()
    }

    /// Whether inserting `p` destroys `cell`
    fn conflicts(&self, cell: usize, p: &Point3d) -> bool {
        let [a, b, c, d] = self.cells[cell];
        let (pa, pb, pc) = (&self.positions[a], &self.positions[b], &self.positions[c]);
        if d != INFINITE {
            return in_sphere(pa, pb, pc, &self.positions[d], p);
        }
        let side = orient3d(pa, pb, pc, p);
        if side != 0.0 {
            return side > 0.0;
        }
        in_circumcircle(pa, pb, pc, p)
    }

    fn is_positive(&self, cell: &[usize; 4]) -> bool {
        let [a, b, c, d] = *cell;
        let (pa, pb, pc) = (&self.positions[a], &self.positions[b], &self.positions[c]);
        if d == INFINITE {
            orient3d(pa, pb, pc, &self.interior) < 0.0
        } else {
            orient3d(pa, pb, pc, &self.positions[d]) > 0.0
        }
    }

    /// Bowyer-Watson step: grow the cavity of `index` across faces from one
    /// conflicting cell, then re-fill it with cells joining its boundary to
    /// the new point
    fn insert(&mut self, index: usize) -> Result<()> {
        let p = self.positions[index];
        let start = (0..self.cells.len())
            .find(|&cell| self.alive[cell] && self.conflicts(cell, &p))
            .ok_or_else(|| Error::Algorithm(format!("Point {} conflicts with no cell", index)))?;

        let mut cavity = HashSet::from([start]);
        let mut stack = vec![start];
        let mut boundary = Vec::new();
        while let Some(cell) = stack.pop() {
            for face in TetrahedralMesh::outward_faces(&self.cells[cell]) {
                match self.neighbor(face) {
                    Some(next) if cavity.contains(&next) => {}
                    Some(next) if self.conflicts(next, &p) => {
                        cavity.insert(next);
                        stack.push(next);
                    }
                    _ => boundary.push(face),
                }
            }
        }

        // Boundary faces point away from the cavity; flipped, they face the new point.
        let created: Vec<[usize; 4]> = boundary
            .iter()
            .map(|&[x, y, z]| infinite_last([x, z, y, index]))
            .collect();
        if let Some(cell) = created.iter().find(|cell| !self.is_positive(cell)) {
            return Err(Error::Algorithm(format!(
                "Cavity of point {} is not star-shaped at cell {:?}",
                index, cell
            )));
        }

        for &cell in &cavity {
            self.remove_cell(cell);
        }
        for cell in created {
            self.add_cell(cell);
        }
        Ok(())
    }

    fn finite_cells(&self) -> impl Iterator<Item = &[usize; 4]> + '_ {
        self.cells
            .iter()
            .zip(&self.alive)
            .filter(|&(cell, &alive)| alive && cell[3] != INFINITE)
            .map(|(cell, _)| cell)
    }
}

/// Delaunay tetrahedralization with the default configuration
pub fn delaunay_3d(input: &LinedPointSet) -> Result<TetrahedralMesh> {
    delaunay_3d_with_config(input, &Delaunay3DConfig::default())
}

/// Delaunay tetrahedralization of a lined point set
///
/// Line cells are validated but do not constrain the decomposition.
pub fn delaunay_3d_with_config(input: &LinedPointSet, config: &Delaunay3DConfig) -> Result<TetrahedralMesh> {
    config.validate()?;
    input.validate()?;

    let points = &input.points.points;
    if points.is_empty() {
        return Err(Error::InvalidData("Point set is empty".to_string()));
    }

    let originals: Vec<Point3d> = points.iter().map(to_f64).collect();
    let diagonal = input.points.diagonal() as f64;
    let merge_distance = config.tolerance * diagonal;

    if diagonal <= f64::EPSILON {
        return Err(Error::Degenerate("all points coincide".to_string()));
    }
    let simplex = initial_simplex(&originals, merge_distance.max(f64::EPSILON * diagonal))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let jitter = diagonal * JITTER_SCALE;
    let positions: Vec<Point3d> = originals
        .iter()
        .map(|p| {
            p + Vector3d::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ) * jitter
        })
        .collect();

    let mut triangulation = Triangulation::new(&positions, simplex)?;
    let mut inserted: Vec<usize> = simplex.to_vec();
    let mut merged = 0usize;

    for index in 0..originals.len() {
        if simplex.contains(&index) {
            continue;
        }
        let is_duplicate = inserted
            .iter()
            .any(|&other| (originals[other] - originals[index]).norm() <= merge_distance);
        if is_duplicate {
            merged += 1;
            continue;
        }

        triangulation.insert(index)?;
        inserted.push(index);
    }

    if merged > 0 {
        log::debug!("Delaunay 3D merged {} coincident points", merged);
    }

    let alpha_sq = config.alpha * config.alpha;
    let tetrahedra: Vec<[usize; 4]> = triangulation
        .finite_cells()
        .filter(|cell| {
            if config.alpha <= 0.0 {
                return true;
            }
            let [a, b, c, d] = cell.map(|v| positions[v]);
            circumsphere(&a, &b, &c, &d).is_some_and(|(_, radius_sq)| radius_sq <= alpha_sq)
        })
        .copied()
        .collect();

    if tetrahedra.is_empty() {
        return Err(Error::Algorithm(
            "Delaunay 3D produced no tetrahedra".to_string(),
        ));
    }

    log::debug!(
        "Delaunay 3D: {} points -> {} tetrahedra",
        inserted.len(),
        tetrahedra.len()
    );

    Ok(TetrahedralMesh::new(points.clone(), tetrahedra))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markupmodel_core::{Point3f, PointCloud, PolyLine};

    fn lined(points: Vec<Point3f>) -> LinedPointSet {
        let line = PolyLine::through(points.len());
        LinedPointSet::new(PointCloud::from_points(points), vec![line])
    }

    fn cube_corners() -> Vec<Point3f> {
        let mut points = Vec::new();
        for &x in &[0.0, 1.0] {
            for &y in &[0.0, 1.0] {
                for &z in &[0.0, 1.0] {
                    points.push(Point3f::new(x, y, z));
                }
            }
        }
        points
    }

    fn grid(n: usize) -> Vec<Point3f> {
        let mut points = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    points.push(Point3f::new(x as f32, y as f32, z as f32));
                }
            }
        }
        points
    }

    #[test]
    fn test_delaunay_config_default() {
        let config = Delaunay3DConfig::default();
        assert_eq!(config.tolerance, 0.001);
        assert_eq!(config.alpha, 0.0);
    }

    #[test]
    fn test_orient3d_sign() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        assert!(orient3d(&a, &b, &c, &Point3d::new(0.0, 0.0, 1.0)) > 0.0);
        assert!(orient3d(&a, &b, &c, &Point3d::new(0.0, 0.0, -1.0)) < 0.0);
        assert_eq!(orient3d(&a, &b, &c, &Point3d::new(3.0, -2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_in_sphere_ignores_orientation() {
        let a = Point3d::new(1.0, 0.0, 0.0);
        let b = Point3d::new(0.0, 1.0, 0.0);
        let c = Point3d::new(-1.0, 0.0, 0.0);
        let d = Point3d::new(0.0, 0.0, 1.0);
        let inside = Point3d::new(0.1, 0.2, -0.3);
        let on = Point3d::new(0.0, -1.0, 0.0);

        assert!(in_sphere(&a, &b, &c, &d, &inside));
        assert!(in_sphere(&b, &a, &c, &d, &inside));
        assert!(!in_sphere(&a, &b, &c, &d, &on));
        assert!(!in_sphere(&a, &b, &c, &d, &Point3d::new(0.0, 0.0, -1.5)));
    }

    #[test]
    fn test_in_circumcircle() {
        let a = Point3d::new(1.0, 0.0, 2.0);
        let b = Point3d::new(0.0, 1.0, 2.0);
        let c = Point3d::new(-1.0, 0.0, 2.0);
        assert!(in_circumcircle(&a, &b, &c, &Point3d::new(0.0, -0.9, 2.0)));
        assert!(!in_circumcircle(&a, &b, &c, &Point3d::new(0.0, -1.0, 2.0)));
        assert!(!in_circumcircle(&a, &b, &c, &Point3d::new(2.0, 0.0, 2.0)));
    }

    #[test]
    fn test_face_key_keeps_orientation() {
        assert_eq!(face_key([3, 1, 2]), [1, 2, 3]);
        assert_eq!(face_key([2, 3, 1]), [1, 2, 3]);
        assert_eq!(face_key([1, 3, 2]), [1, 3, 2]);
        assert_ne!(face_key([1, 2, 3]), face_key([1, 3, 2]));
    }

    #[test]
    fn test_infinite_last_is_even() {
        fn inversions(cell: [usize; 4]) -> usize {
            let mut count = 0;
            for i in 0..4 {
                for j in i + 1..4 {
                    if cell[i] > cell[j] {
                        count += 1;
                    }
                }
            }
            count
        }
        for k in 0..4 {
            let mut cell = [0, 1, 2, 3];
            cell[k] = INFINITE;
            let moved = infinite_last(cell);
            assert_eq!(moved[3], INFINITE);
            let rank = moved.map(|v| if v == INFINITE { k } else { v });
            assert_eq!(inversions(rank) % 2, 0, "{:?}", moved);
        }
    }

    #[test]
    fn test_circumsphere_of_unit_tetra() {
        let (center, radius_sq) = circumsphere(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
            &Point3d::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(center, Point3d::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(radius_sq, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_circumsphere_of_flat_tetra() {
        let flat = circumsphere(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
            &Point3d::new(1.0, 1.0, 0.0),
        );
        assert!(flat.is_none());
    }

    #[test]
    fn test_output_cells_are_positive() {
        let volume = delaunay_3d(&lined(cube_corners())).unwrap();
        for t in 0..volume.tetra_count() {
            assert!(volume.signed_volume(t) >= 0.0);
        }
    }

    #[test]
    fn test_single_tetrahedron() {
        let input = lined(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ]);
        let volume = delaunay_3d(&input).unwrap();
        assert_eq!(volume.tetra_count(), 1);
        assert_relative_eq!(volume.total_volume(), 1.0 / 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cube_fills_hull() {
        let volume = delaunay_3d(&lined(cube_corners())).unwrap();
        assert!(volume.tetra_count() >= 5);
        assert_relative_eq!(volume.total_volume(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_grid_fills_hull_for_any_seed() {
        for seed in [0x5eed, 1, 2, 3] {
            let config = Delaunay3DConfig::default().with_seed(seed);
            let volume = delaunay_3d_with_config(&lined(grid(5)), &config).unwrap();
            assert_relative_eq!(volume.total_volume(), 64.0, epsilon = 1e-4);
            for t in 0..volume.tetra_count() {
                assert!(volume.signed_volume(t) >= 0.0, "seed {}: tetra {}", seed, t);
            }
        }
    }

    #[test]
    fn test_interior_point_is_used() {
        let mut points = cube_corners();
        points.push(Point3f::new(0.5, 0.5, 0.5));
        let volume = delaunay_3d(&lined(points)).unwrap();
        assert!(volume.tetrahedra.iter().any(|t| t.contains(&8)));
        assert_relative_eq!(volume.total_volume(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_coincident_points_are_merged() {
        let mut points = cube_corners();
        points.push(Point3f::new(1.0, 1.0, 1.0));
        let volume = delaunay_3d(&lined(points)).unwrap();
        assert!(volume.tetrahedra.iter().all(|t| !t.contains(&8)));
        assert_eq!(volume.vertex_count(), 9);
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let input = lined(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 1.0),
            Point3f::new(2.0, 2.0, 2.0),
        ]);
        assert!(matches!(delaunay_3d(&input), Err(Error::Degenerate(_))));
    }

    #[test]
    fn test_coplanar_points_are_degenerate() {
        let input = lined(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.5, 0.5, 0.0),
        ]);
        assert!(matches!(delaunay_3d(&input), Err(Error::Degenerate(_))));
    }

    #[test]
    fn test_coincident_only_is_degenerate() {
        let input = lined(vec![Point3f::new(2.0, 2.0, 2.0); 3]);
        assert!(matches!(delaunay_3d(&input), Err(Error::Degenerate(_))));
    }

    #[test]
    fn test_empty_input() {
        let input = LinedPointSet::default();
        assert!(matches!(delaunay_3d(&input), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_small_alpha_removes_everything() {
        let config = Delaunay3DConfig::default().with_alpha(0.01);
        let result = delaunay_3d_with_config(&lined(cube_corners()), &config);
        assert!(matches!(result, Err(Error::Algorithm(_))));
    }

    #[test]
    fn test_invalid_config() {
        let config = Delaunay3DConfig::default().with_tolerance(1.5);
        let result = delaunay_3d_with_config(&lined(cube_corners()), &config);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_deterministic() {
        let a = delaunay_3d(&lined(cube_corners())).unwrap();
        let b = delaunay_3d(&lined(cube_corners())).unwrap();
        assert_eq!(a.tetrahedra, b.tetrahedra);
    }
}
