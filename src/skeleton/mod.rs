//! The skeleton: a rooted tree of spheres.
//!
//! [`SkeletalTree`] stores the user's spheres and any synthetic spheres
//! inserted by [`interpolate`]. Nodes are classified by child count as
//! leaves, limb nodes or joints; skinning sweeps tubes through limb chains
//! and stitches hulls around joints.
//!
//! ```
//! use bonemesh::skeleton::{interpolate, NodeKind, SkeletalTree};
//! use nalgebra::Point3;
//!
//! let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
//! let root = tree.root().unwrap();
//! tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
//! tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
//! assert_eq!(tree.kind(root), NodeKind::Joint);
//!
//! let inserted = interpolate(&mut tree);
//! assert_eq!(tree.len(), 3 + inserted);
//! ```

mod interpolate;
mod tree;

pub use interpolate::{edge_interpolate, interpolate, joint_seed, link_spheres, MAX_CHAIN};
pub use tree::{
    NodeId, NodeKind, SkeletalNode, SkeletalTree, DEFAULT_RADIUS, EXTRUDE_STEP, MIN_RADIUS,
};
