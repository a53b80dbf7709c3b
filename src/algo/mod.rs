//! Surface refinement algorithms.
//!
//! Both run on a [`HalfEdgeMesh`](crate::mesh::HalfEdgeMesh) built from a
//! skin:
//!
//! - **Subdivision**: Catmull-Clark
//! - **Remeshing**: local-scale isotropic split, collapse, flip and smooth
//!
//! Long-running passes take an optional [`Progress`] reporter.

pub mod progress;
pub mod remesh;
pub mod subdivide;

pub use progress::Progress;
