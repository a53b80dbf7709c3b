//! Sweeping limb chains into tubes.
//!
//! A chain starts at the child of a joint (or at the root) and follows
//! single-child nodes until it reaches a leaf or another joint. Each node
//! contributes one square cross-section in a local frame whose x axis is
//! the travel direction.

use nalgebra::{Point3, Vector3};

use super::limb::{Layer, Limb};
use super::SkinOptions;
use crate::skeleton::{NodeId, NodeKind, SkeletalTree};

/// Orthonormal frame of a cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Travel direction.
    pub x: Vector3<f64>,
    /// `up × x`, normalised.
    pub y: Vector3<f64>,
    /// `x × y`.
    pub z: Vector3<f64>,
}

impl Frame {
    /// Build a frame around the travel direction `x`.
    ///
    /// When `x` is parallel to `up` the world Y axis (then X) stands in.
    pub fn new(x: Vector3<f64>, up: Vector3<f64>) -> Self {
        let x = x.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::x);
        let y = [up, Vector3::y(), Vector3::x()]
            .iter()
            .find_map(|axis| axis.cross(&x).try_normalize(1e-9))
            .unwrap_or_else(Vector3::y);
        let z = x.cross(&y);
        Self { x, y, z }
    }

    /// Square cross-section with corners at `center ± r·y ± r·z`,
    /// counter-clockwise about `x`.
    pub fn layer(&self, center: Point3<f64>, radius: f64) -> Layer {
        const SIGNS: [(f64, f64); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        SIGNS.map(|(sy, sz)| center + (self.y * sy + self.z * sz) * radius)
    }
}

/// Where a swept chain stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnd {
    /// The chain ran into a leaf and was sealed.
    Leaf(NodeId),
    /// The chain ran into a joint, which still needs stitching.
    Joint(NodeId),
}

/// A swept chain.
#[derive(Debug, Clone)]
pub struct SweptChain {
    /// The tube.
    pub limb: Limb,
    /// What terminated it.
    pub end: ChainEnd,
}

/// Unit direction from `a` to `b`.
fn direction(a: &Point3<f64>, b: &Point3<f64>) -> Option<Vector3<f64>> {
    (b - a).try_normalize(f64::EPSILON)
}

/// Blend of the incoming and outgoing directions at a chain node.
fn travel_direction(
    prev: Option<&Point3<f64>>,
    here: &Point3<f64>,
    next: Option<&Point3<f64>>,
) -> Vector3<f64> {
    let incoming = prev.and_then(|p| direction(p, here));
    let outgoing = next.and_then(|n| direction(here, n));
    match (incoming, outgoing) {
        (Some(a), Some(b)) => (a + b).try_normalize(f64::EPSILON).unwrap_or(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => Vector3::x(),
    }
}

/// Sweep the chain that starts at `first`.
///
/// `entry` is the joint the chain hangs from, or `None` when `first` is the
/// root, in which case a tapered front layer is added and sealed. A chain
/// that ends in a leaf gets a tapered end layer and is sealed.
///
/// # Panics
///
/// Panics if `first` is a joint; joint-to-joint links use [`bridge`].
pub fn sweep_chain(
    tree: &SkeletalTree,
    entry: Option<NodeId>,
    first: NodeId,
    options: &SkinOptions,
) -> SweptChain {
    assert_ne!(
        tree.kind(first),
        NodeKind::Joint,
        "chain cannot start at joint {:?}",
        first
    );

    let mut nodes = vec![first];
    let mut end = ChainEnd::Leaf(first);
    let mut current = first;
    while tree.kind(current) == NodeKind::Limb {
        let next = tree.children(current)[0];
        if tree.kind(next) == NodeKind::Joint {
            end = ChainEnd::Joint(next);
            break;
        }
        nodes.push(next);
        current = next;
        end = ChainEnd::Leaf(next);
    }

    let position = |id: NodeId| tree.node(id).position;
    let entry_pos = entry.map(position);
    let end_pos = match end {
        ChainEnd::Joint(j) => Some(position(j)),
        ChainEnd::Leaf(_) => None,
    };

    let mut limb = Limb::new();
    let mut frames = Vec::with_capacity(nodes.len());
    for (i, &id) in nodes.iter().enumerate() {
        let here = position(id);
        let prev = if i == 0 { entry_pos } else { Some(position(nodes[i - 1])) };
        let next = nodes.get(i + 1).map(|&n| position(n)).or(end_pos);
        frames.push(Frame::new(
            travel_direction(prev.as_ref(), &here, next.as_ref()),
            options.up_axis,
        ));
    }

    let radius = |id: NodeId| tree.node(id).radius;
    if entry.is_none() {
        let (frame, r) = (frames[0], radius(first));
        let center = position(first) - frame.x * (r / 3.0);
        limb.add_layer(frame.layer(center, r * options.leaf_taper));
    }
    for (&id, frame) in nodes.iter().zip(&frames) {
        limb.add_layer(frame.layer(position(id), radius(id)));
    }
    if let ChainEnd::Leaf(leaf) = end {
        let (frame, r) = (frames[frames.len() - 1], radius(leaf));
        let center = position(leaf) + frame.x * (r / 3.0);
        limb.add_layer(frame.layer(center, r * options.leaf_taper));
        limb.seal();
    }
    if entry.is_none() {
        limb.seal_front();
    }

    SweptChain { limb, end }
}

/// One-layer limb between a joint and a child joint with no room for a
/// chain between them.
///
/// The layer sits between the two spheres, splitting the gap in proportion
/// to their radii, at half the smaller radius.
pub fn bridge(tree: &SkeletalTree, joint: NodeId, child: NodeId, options: &SkinOptions) -> Limb {
    let (a, b) = (tree.node(joint), tree.node(child));
    let delta = b.position - a.position;
    let frame = Frame::new(delta, options.up_axis);
    let center = a.position + delta * (a.radius / (a.radius + b.radius));

    let mut limb = Limb::new();
    limb.add_layer(frame.layer(center, 0.5 * a.radius.min(b.radius)));
    limb
}

/// Closed box around a lone sphere.
pub fn sweep_box(tree: &SkeletalTree, id: NodeId, options: &SkinOptions) -> Limb {
    let node = tree.node(id);
    let frame = Frame::new(Vector3::x(), options.up_axis);
    let r = node.radius;

    let mut limb = Limb::new();
    limb.add_layer(frame.layer(node.position - frame.x * r, r));
    limb.add_layer(frame.layer(node.position + frame.x * r, r));
    limb.seal();
    limb.seal_front();
    limb
}
