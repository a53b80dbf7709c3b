//! Tangent-sphere interpolation along skeleton links.
//!
//! Every link `parent → child` is filled with a chain of spheres, each one
//! tangent to the previous, so the cross-sections later swept along the
//! chain never overlap. Chains start at the parent and step toward the
//! child until the gap left is covered by the last sphere and the target.
//!
//! Joints constrain their neighbourhood: the first sphere next to a joint
//! uses the smallest tangent radius over all of the joint's links, so the
//! limbs fanning out of it stay clear of each other.

use std::collections::HashMap;

use nalgebra::Point3;

use super::tree::{NodeId, NodeKind, SkeletalTree};

/// Upper bound on spheres inserted along one link.
pub const MAX_CHAIN: usize = 64;

/// Radius of the sphere tangent to a sphere of radius `r1` and lying on the
/// line toward a sphere of radius `r2` whose center is `d` away.
///
/// The new sphere's center sits `r1 + r3` from the first center. Equal radii
/// reproduce the radius; a shrinking link yields a smaller sphere.
///
/// ```
/// use bonemesh::skeleton::edge_interpolate;
///
/// let r3 = edge_interpolate(0.5, 0.3, 2.0);
/// assert!(r3 > 0.3 && r3 < 0.5);
/// assert!((edge_interpolate(0.4, 0.4, 3.0) - 0.4).abs() < 1e-12);
/// ```
#[inline]
pub fn edge_interpolate(r1: f64, r2: f64, d: f64) -> f64 {
    r1 * (d + r2 - r1) / (d - r2 + r1)
}

/// Smallest tangent radius over the links of a joint, or `None` if `id` is
/// not a joint or every link overlaps.
pub fn joint_seed(tree: &SkeletalTree, id: NodeId) -> Option<f64> {
    if tree.kind(id) != NodeKind::Joint {
        return None;
    }
    let node = tree.node(id);
    tree.children(id)
        .iter()
        .copied()
        .chain(node.parent())
        .filter_map(|other| {
            let other = tree.node(other);
            let d = (other.position - node.position).norm();
            (d > node.radius + other.radius).then(|| edge_interpolate(node.radius, other.radius, d))
        })
        .filter(|r| r.is_finite() && *r > 0.0)
        .reduce(f64::min)
}

/// Spheres to insert along `parent → child`, ordered from the parent.
///
/// `seeds` maps joints to their [`joint_seed`]. When the child is a joint
/// the chain ends with a sphere of the child's seed radius tangent to it.
pub fn link_spheres(
    tree: &SkeletalTree,
    parent: NodeId,
    child: NodeId,
    seeds: &HashMap<NodeId, f64>,
) -> Vec<(Point3<f64>, f64)> {
    let (from, to) = (tree.node(parent), tree.node(child));
    let delta = to.position - from.position;
    let d = delta.norm();
    if d <= f64::EPSILON {
        return Vec::new();
    }
    let dir = delta / d;

    let (target_dist, target_radius, tail) = match seeds.get(&child) {
        Some(&rj) => (d - (to.radius + rj), rj, true),
        None => (d, to.radius, false),
    };

    let mut spheres = Vec::new();
    let mut t = 0.0;
    let mut radius = from.radius;
    let mut seed = seeds.get(&parent).copied();

    for _ in 0..MAX_CHAIN {
        let remaining = target_dist - t;
        if remaining <= radius + target_radius {
            break;
        }
        let r3 = seed
            .take()
            .unwrap_or_else(|| edge_interpolate(radius, target_radius, remaining));
        if !(r3.is_finite() && r3 > 0.0) {
            break;
        }
        t += radius + r3;
        radius = r3;
        spheres.push((from.position + dir * t, r3));
    }

    if tail && target_dist > t {
        spheres.push((from.position + dir * target_dist, target_radius));
    }
    spheres
}

/// Replace all interpolated spheres with a fresh set.
///
/// Existing interpolated nodes are spliced out first, so running this twice
/// on an unchanged skeleton yields the same spheres. Returns the number of
/// spheres inserted.
pub fn interpolate(tree: &mut SkeletalTree) -> usize {
    let removed = tree.remove_interpolated();

    let view: &SkeletalTree = tree;
    let order = view.preorder();
    let seeds: HashMap<NodeId, f64> = order
        .iter()
        .filter_map(|&id| joint_seed(view, id).map(|r| (id, r)))
        .collect();
    let links: Vec<(NodeId, NodeId)> = order
        .iter()
        .flat_map(|&p| view.children(p).iter().map(move |&c| (p, c)))
        .collect();

    let mut inserted = 0;
    for (parent, child) in links {
        let mut upper = parent;
        for (center, radius) in link_spheres(tree, parent, child, &seeds) {
            upper = tree.insert_between(upper, child, center, radius);
            inserted += 1;
        }
    }

    log::debug!(
        "interpolation removed {} and inserted {} spheres",
        removed,
        inserted
    );
    inserted
}
