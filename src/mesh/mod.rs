//! Core mesh data structures.
//!
//! The primary type is [`HalfEdgeMesh`], a half-edge (doubly-connected edge
//! list) representation of polygon surfaces. It is built from the indexed
//! polygon soup produced by skinning, queried through O(1) adjacency
//! accessors, and edited in place by the remesher.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face or boundary loop
//! - [`EdgeId`] - Identifies a full edge
//!
//! # Construction
//!
//! ```
//! use bonemesh::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_boundary_halfedges(), 3);
//! ```

mod builder;
mod edit;
mod halfedge;
mod index;

pub use builder::{build_from_quads, build_from_triangles};
pub use edit::{CompactStats, Diamond, MergePosition};
pub use halfedge::{Edge, Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, VertexId};
