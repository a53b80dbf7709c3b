//! # Bonemesh
//!
//! Skin a tree of spheres into a closed manifold mesh, then refine it.
//!
//! A skeleton is a rooted tree of spheres. Generation runs four steps:
//!
//! 1. **Interpolate**: long links get extra spheres so the skin has enough
//!    cross-sections ([`skeleton::interpolate`]).
//! 2. **Sweep**: chains of single-child spheres become square tubes
//!    ([`skin::sweep_chain`]).
//! 3. **Stitch**: at every branching sphere the tube openings are wrapped in
//!    a convex hull ([`skin::stitch_joint`]).
//! 4. **Build**: the welded polygons become a half-edge mesh
//!    ([`mesh::HalfEdgeMesh::build`]).
//!
//! The mesh can then be refined with Catmull-Clark subdivision
//! ([`algo::subdivide`]) and isotropic remeshing ([`algo::remesh`]).
//!
//! ## Quick Start
//!
//! ```
//! use bonemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
//! let root = tree.root().unwrap();
//! tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
//! tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
//!
//! let mut session = Session::from_tree(tree);
//! session.generate().unwrap();
//! session.subdivide(2).unwrap();
//!
//! let mesh = session.mesh().unwrap();
//! assert!(mesh.is_closed());
//! assert_eq!(mesh.euler_characteristic(), 2);
//! ```
//!
//! ## Working Without a Session
//!
//! Every step is also callable on its own:
//!
//! ```
//! use bonemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut tree = SkeletalTree::with_root(Point3::origin(), 0.4);
//! let root = tree.root().unwrap();
//! tree.add_child(root, Point3::new(0.0, 0.0, 3.0), 0.2);
//! interpolate(&mut tree);
//!
//! let soup = skin(&tree, &SkinOptions::default());
//! let mut mesh = soup.to_mesh().unwrap();
//! catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();
//! assert!(mesh.is_closed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod session;
pub mod skeleton;
pub mod skin;

pub use session::{Session, Surface};

/// Prelude module for convenient imports.
///
/// ```
/// use bonemesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::remesh::{remesh, RemeshOptions};
    pub use crate::algo::subdivide::{catmull_clark_subdivide, SubdivideOptions};
    pub use crate::error::{BuildError, Error, Result};
    pub use crate::mesh::{
        build_from_quads, build_from_triangles, EdgeId, FaceId, HalfEdgeId, HalfEdgeMesh,
        MergePosition, VertexId,
    };
    pub use crate::session::{Session, Surface};
    pub use crate::skeleton::{interpolate, NodeId, NodeKind, SkeletalTree};
    pub use crate::skin::{skin, PolygonSoup, SkinOptions};
}
