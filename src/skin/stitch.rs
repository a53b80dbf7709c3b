//! Hull stitching at joints and the skinning recursion.
//!
//! At a joint, the end cross-section of every limb that meets it (the
//! fringes) and a few samples on the joint sphere are wrapped in a convex
//! hull. Hull triangles spanning a single fringe cap a limb opening and are
//! dropped; the rest skin the joint and meet the limb tubes along the fringe
//! edges.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::hull::convex_hull;
use super::limb::{layer_axis, layer_center, Layer, Limb};
use super::soup::{weld_key, PolygonSoup};
use super::sweep::{bridge, sweep_box, sweep_chain, ChainEnd};
use super::SkinOptions;
use crate::skeleton::{NodeId, NodeKind, SkeletalTree};

/// A limb opening at a joint.
#[derive(Debug, Clone, Copy)]
pub struct Fringe {
    /// The four corners.
    pub points: Layer,
    /// Unit normal of the opening, pointing from the joint into the limb.
    pub outward: Vector3<f64>,
}

impl Fringe {
    /// Fringe of a child limb: its first layer, facing along the sweep.
    pub fn child(layer: &Layer) -> Self {
        Self {
            points: *layer,
            outward: layer_axis(layer),
        }
    }

    /// Fringe of the parent limb: its last layer, facing back up the sweep.
    pub fn parent(layer: &Layer) -> Self {
        Self {
            points: *layer,
            outward: -layer_axis(layer),
        }
    }

    /// Signed distance of `p` in front of the opening's plane.
    pub fn height(&self, p: &Point3<f64>) -> f64 {
        self.outward.dot(&(p - layer_center(&self.points)))
    }
}

/// Orthonormal pair spanning the plane perpendicular to `up`.
fn equator_basis(up: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let e1 = [Vector3::y(), Vector3::x()]
        .iter()
        .find_map(|axis| axis.cross(up).try_normalize(1e-9))
        .unwrap_or_else(Vector3::x);
    let e2 = up.cross(&e1);
    (e1, e2)
}

/// Eight points on the joint sphere at latitude ±`options.sample_latitude`
/// and longitudes 45°, 135°, 225° and 315° about `options.up_axis`.
pub fn sphere_samples(center: Point3<f64>, radius: f64, options: &SkinOptions) -> Vec<Point3<f64>> {
    let up = options
        .up_axis
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::z);
    let (e1, e2) = equator_basis(&up);
    let lat = options.sample_latitude.to_radians();

    let mut samples = Vec::with_capacity(8);
    for sign in [1.0, -1.0] {
        for k in 0..4 {
            let lon = (45.0 + 90.0 * k as f64).to_radians();
            let dir = (e1 * lon.cos() + e2 * lon.sin()) * lat.cos() + up * (sign * lat.sin());
            samples.push(center + dir * radius);
        }
    }
    samples
}

/// Triangles skinning a joint.
///
/// Samples in front of (or on) any fringe plane are discarded before the
/// hull is built. Hull triangles with two corners welded together, or with
/// all three corners on one fringe, are dropped.
///
/// # Panics
///
/// Panics if the points are coplanar, which two or more fringes of positive
/// radius cannot be.
pub fn joint_triangles(
    center: Point3<f64>,
    radius: f64,
    fringes: &[Fringe],
    options: &SkinOptions,
) -> Vec<[Point3<f64>; 3]> {
    let mut points = Vec::new();
    let mut groups: Vec<Option<usize>> = Vec::new();
    let mut seen: HashMap<[i64; 3], usize> = HashMap::new();

    let mut push = |p: Point3<f64>, group: Option<usize>| {
        seen.entry(weld_key(&p, options.weld_epsilon)).or_insert_with(|| {
            points.push(p);
            groups.push(group);
            points.len() - 1
        });
    };

    for (g, fringe) in fringes.iter().enumerate() {
        for &p in &fringe.points {
            push(p, Some(g));
        }
    }
    let samples = sphere_samples(center, radius, options);
    let mut culled = 0;
    for s in samples {
        if fringes.iter().any(|f| f.height(&s) >= -options.weld_epsilon) {
            culled += 1;
        } else {
            push(s, None);
        }
    }

    let Some(hull) = convex_hull(&points, options.hull_epsilon) else {
        panic!(
            "joint at {:?} has a degenerate point set ({} points)",
            center,
            points.len()
        );
    };

    let total = hull.len();
    let triangles: Vec<[Point3<f64>; 3]> = hull
        .into_iter()
        .filter(|&[a, b, c]| a != b && b != c && c != a)
        .filter(|&[a, b, c]| groups[a].is_none() || !(groups[a] == groups[b] && groups[b] == groups[c]))
        .map(|t| t.map(|i| points[i]))
        .collect();

    log::debug!(
        "joint at ({:.3}, {:.3}, {:.3}): {} fringes, {} samples culled, {} of {} hull triangles kept",
        center.x,
        center.y,
        center.z,
        fringes.len(),
        culled,
        triangles.len(),
        total
    );
    triangles
}

fn emit_limb(soup: &mut PolygonSoup, limb: &Limb) {
    for quad in limb.quads() {
        soup.add_polygon(quad);
    }
}

fn emit_triangles(soup: &mut PolygonSoup, triangles: &[[Point3<f64>; 3]]) {
    for t in triangles {
        soup.add_polygon(t);
    }
}

/// Sweep every child of `joint`, stitch deeper joints first, then stitch
/// `joint` itself. `parent_fringe` is the end layer of the limb arriving
/// from above, if any.
///
/// # Panics
///
/// Panics if `joint` is not a joint.
pub fn stitch_joint(
    tree: &SkeletalTree,
    joint: NodeId,
    parent_fringe: Option<&Layer>,
    options: &SkinOptions,
    soup: &mut PolygonSoup,
) {
    assert_eq!(
        tree.kind(joint),
        NodeKind::Joint,
        "stitching non-joint node {:?}",
        joint
    );

    let mut fringes: Vec<Fringe> = parent_fringe.map(Fringe::parent).into_iter().collect();

    for &child in tree.children(joint) {
        let limb = if tree.kind(child) == NodeKind::Joint {
            let limb = bridge(tree, joint, child, options);
            if let Some(layer) = limb.first_four() {
                stitch_joint(tree, child, Some(layer), options, soup);
            }
            limb
        } else {
            let swept = sweep_chain(tree, Some(joint), child, options);
            if let (ChainEnd::Joint(next), Some(layer)) = (swept.end, swept.limb.last_four()) {
                stitch_joint(tree, next, Some(layer), options, soup);
            }
            swept.limb
        };

        emit_limb(soup, &limb);
        match limb.first_four() {
            Some(layer) => fringes.push(Fringe::child(layer)),
            None => panic!("limb below joint {:?} has no layers", joint),
        }
    }

    let node = tree.node(joint);
    let triangles = joint_triangles(node.position, node.radius, &fringes, options);
    emit_triangles(soup, &triangles);
}

/// Skin a skeleton into a welded polygon soup.
///
/// The tree is used as-is; run [`interpolate`](crate::skeleton::interpolate)
/// first so limb chains have enough cross-sections.
pub fn skin(tree: &SkeletalTree, options: &SkinOptions) -> PolygonSoup {
    let mut soup = PolygonSoup::new(options.weld_epsilon);
    let Some(root) = tree.root() else {
        return soup;
    };

    match tree.kind(root) {
        NodeKind::Leaf => emit_limb(&mut soup, &sweep_box(tree, root, options)),
        NodeKind::Limb => {
            let swept = sweep_chain(tree, None, root, options);
            if let (ChainEnd::Joint(next), Some(layer)) = (swept.end, swept.limb.last_four()) {
                stitch_joint(tree, next, Some(layer), options, &mut soup);
            }
            emit_limb(&mut soup, &swept.limb);
        }
        NodeKind::Joint => stitch_joint(tree, root, None, options, &mut soup),
    }

    log::debug!(
        "skinned {} nodes into {} polygons over {} vertices",
        tree.len(),
        soup.len(),
        soup.positions().len()
    );
    soup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::interpolate;

    fn y_shape() -> SkeletalTree {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
        let root = tree.root().unwrap();
        tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
        tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
        tree
    }

    fn assert_closed_manifold(soup: &PolygonSoup) {
        let mesh = soup.to_mesh().unwrap();
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());
        assert_eq!(mesh.num_boundary_halfedges(), 0);
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn test_sphere_samples() {
        let options = SkinOptions::default();
        let samples = sphere_samples(Point3::new(1.0, 2.0, 3.0), 2.0, &options);
        assert_eq!(samples.len(), 8);
        for s in &samples {
            let d = s - Point3::new(1.0, 2.0, 3.0);
            assert!((d.norm() - 2.0).abs() < 1e-12);
            assert!((d.z.abs() - 2.0 * 45f64.to_radians().sin()).abs() < 1e-12);
        }
        let first = samples[0] - Point3::new(1.0, 2.0, 3.0);
        assert!((first.x - first.y).abs() < 1e-12 && first.x > 0.0);
    }

    #[test]
    fn test_fringe_orientation() {
        let layer: Layer = [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
        ];
        let child = Fringe::child(&layer);
        let parent = Fringe::parent(&layer);
        assert!((child.outward - Vector3::x()).norm() < 1e-12);
        assert!(child.height(&Point3::new(2.0, 0.0, 0.0)) > 0.0);
        assert!(parent.height(&Point3::new(2.0, 0.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_fringe_caps_are_dropped() {
        let tree = {
            let mut tree = y_shape();
            interpolate(&mut tree);
            tree
        };
        let options = SkinOptions::default();
        let root = tree.root().unwrap();
        let fringes: Vec<Fringe> = tree
            .children(root)
            .iter()
            .map(|&c| {
                let swept = sweep_chain(&tree, Some(root), c, &options);
                Fringe::child(swept.limb.first_four().unwrap())
            })
            .collect();

        let triangles = joint_triangles(Point3::origin(), 0.5, &fringes, &options);
        assert!(!triangles.is_empty());
        for t in &triangles {
            for f in &fringes {
                assert!(!t.iter().all(|p| f.points.contains(p)));
            }
        }
    }

    #[test]
    #[should_panic(expected = "stitching non-joint")]
    fn test_stitch_non_joint_panics() {
        let tree = SkeletalTree::with_root(Point3::origin(), 1.0);
        let mut soup = PolygonSoup::default();
        stitch_joint(
            &tree,
            tree.root().unwrap(),
            None,
            &SkinOptions::default(),
            &mut soup,
        );
    }

    #[test]
    fn test_skin_empty_tree() {
        let soup = skin(&SkeletalTree::new(), &SkinOptions::default());
        assert!(soup.is_empty());
    }

    #[test]
    fn test_skin_single_sphere_is_a_box() {
        let tree = SkeletalTree::with_root(Point3::origin(), 1.0);
        let soup = skin(&tree, &SkinOptions::default());
        assert_eq!(soup.len(), 6);
        assert_eq!(soup.positions().len(), 8);
        assert_closed_manifold(&soup);
    }

    #[test]
    fn test_skin_straight_limb() {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 0.4);
        let root = tree.root().unwrap();
        tree.add_child(root, Point3::new(3.0, 0.0, 0.0), 0.3);
        interpolate(&mut tree);

        let soup = skin(&tree, &SkinOptions::default());
        assert!(soup.polygons().iter().all(|p| p.len() == 4));
        assert_closed_manifold(&soup);
    }

    #[test]
    fn test_skin_y_shape() {
        let mut tree = y_shape();
        interpolate(&mut tree);

        let soup = skin(&tree, &SkinOptions::default());
        assert!(soup.polygons().iter().any(|p| p.len() == 3));
        assert_closed_manifold(&soup);
    }
}
