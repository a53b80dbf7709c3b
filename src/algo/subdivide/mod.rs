//! Mesh subdivision.
//!
//! # Catmull-Clark Subdivision
//!
//! Catmull-Clark subdivision (Catmull & Clark, 1978) refines any polygon
//! mesh into an all-quad mesh. Each iteration:
//!
//! 1. Creates a face point at each face centroid
//! 2. Creates an edge point from the edge's endpoints and its two face points
//! 3. Moves each original vertex toward its surrounding face and edge points
//! 4. Splits every n-sided face into n quads
//!
//! The mesh is rebuilt from the new quad soup rather than edited in place.
//!
//! # Example
//!
//! ```
//! use bonemesh::algo::subdivide::{catmull_clark_subdivide, SubdivideOptions};
//! use bonemesh::mesh::build_from_quads;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
//! catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();
//! assert_eq!(mesh.num_faces(), 4);
//! ```
//!
//! # References
//!
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline surfaces
//!   on arbitrary topological meshes." Computer-Aided Design, 10(6), 350-355.

mod catmull_clark;

pub use catmull_clark::{catmull_clark_subdivide, catmull_clark_subdivide_with_progress};

/// Options for subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self::new(1)
    }
}
