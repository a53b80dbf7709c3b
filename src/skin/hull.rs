//! Incremental 3D convex hull.
//!
//! Beneath-beyond construction: start from a non-degenerate tetrahedron,
//! then add the remaining points one at a time. A point in front of some
//! faces deletes them and is coned to the horizon they leave. Points on or
//! behind every face are interior and skipped. The point sets stitched at a
//! joint hold a few dozen points, so faces are kept in a plain list.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy)]
struct HullFace {
    corners: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
}

impl HullFace {
    fn new(points: &[Point3<f64>], corners: [usize; 3]) -> Self {
        let [a, b, c] = corners.map(|i| points[i]);
        let normal = (b - a)
            .cross(&(c - a))
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros);
        Self {
            corners,
            normal,
            offset: normal.dot(&a.coords),
        }
    }

    #[inline]
    fn height(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn flipped(&self, points: &[Point3<f64>]) -> Self {
        let [a, b, c] = self.corners;
        Self::new(points, [a, c, b])
    }
}

/// Indices of four affinely independent points, or `None` if all points lie
/// within `epsilon` of a common plane.
fn initial_simplex(points: &[Point3<f64>], epsilon: f64) -> Option<[usize; 4]> {
    let i0 = 0;
    let p0 = points.first()?;

    let i1 = farthest(points, |p| (p - p0).norm())?;
    let p1 = points[i1];
    let axis = (p1 - p0).try_normalize(epsilon)?;

    let i2 = farthest(points, |p| (p - p0).cross(&axis).norm())?;
    let p2 = points[i2];
    if (p2 - p0).cross(&axis).norm() <= epsilon {
        return None;
    }

    let normal = (p1 - p0).cross(&(p2 - p0)).normalize();
    let i3 = farthest(points, |p| normal.dot(&(p - p0)).abs())?;
    if normal.dot(&(points[i3] - p0)).abs() <= epsilon {
        return None;
    }
    Some([i0, i1, i2, i3])
}

fn farthest(points: &[Point3<f64>], measure: impl Fn(&Point3<f64>) -> f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, measure(p)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Triangles of the convex hull of `points`, as index triples wound
/// counter-clockwise seen from outside.
///
/// Returns `None` when the points are coplanar (within `epsilon`).
pub fn convex_hull(points: &[Point3<f64>], epsilon: f64) -> Option<Vec<[usize; 3]>> {
    let simplex = initial_simplex(points, epsilon)?;
    let interior = Point3::from(
        simplex
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + points[i].coords)
            / 4.0,
    );

    let [a, b, c, d] = simplex;
    let mut faces: Vec<HullFace> = [[a, b, c], [a, d, b], [b, d, c], [c, d, a]]
        .into_iter()
        .map(|corners| {
            let face = HullFace::new(points, corners);
            if face.height(&interior) > 0.0 {
                face.flipped(points)
            } else {
                face
            }
        })
        .collect();

    for (i, p) in points.iter().enumerate() {
        if simplex.contains(&i) {
            continue;
        }

        let (visible, hidden): (Vec<HullFace>, Vec<HullFace>) = std::mem::take(&mut faces)
            .into_iter()
            .partition(|f| f.height(p) > epsilon);
        faces = hidden;
        if visible.is_empty() {
            continue;
        }

        let visible_edges: HashSet<(usize, usize)> = visible
            .iter()
            .flat_map(|f| {
                let [x, y, z] = f.corners;
                [(x, y), (y, z), (z, x)]
            })
            .collect();

        for &(u, v) in &visible_edges {
            if !visible_edges.contains(&(v, u)) {
                faces.push(HullFace::new(points, [u, v, i]));
            }
        }
    }

    // Sort for a stable output order; the edge set above iterates randomly.
    let mut triangles: Vec<[usize; 3]> = faces.iter().map(|f| f.corners).collect();
    triangles.sort_unstable();
    Some(triangles)
}
