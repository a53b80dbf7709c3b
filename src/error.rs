//! Error types for bonemesh.
//!
//! [`BuildError`] describes why a polygon soup could not be turned into a
//! half-edge mesh; callers are expected to recover from it by keeping the
//! raw soup. [`Error`] is the crate-wide error for everything else.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons [`HalfEdgeMesh::build`](crate::mesh::HalfEdgeMesh::build) rejects its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No polygons were supplied.
    #[error("mesh has no polygons")]
    EmptyMesh,

    /// A polygon has fewer than three corners.
    #[error("polygon {polygon} has {count} vertices, at least 3 are required")]
    TooFewVertices {
        /// The polygon index.
        polygon: usize,
        /// Number of corners it has.
        count: usize,
    },

    /// A polygon lists the same vertex twice.
    #[error("polygon {polygon} repeats vertex {vertex}")]
    RepeatedVertex {
        /// The polygon index.
        polygon: usize,
        /// The repeated vertex index.
        vertex: usize,
    },

    /// The same oriented edge appears in two polygons.
    ///
    /// Either more than two polygons meet at the edge, or two neighbours
    /// disagree about orientation.
    #[error("oriented edge ({from}, {to}) is used by more than one polygon")]
    DuplicateOrientedEdge {
        /// Start vertex of the edge.
        from: usize,
        /// End vertex of the edge.
        to: usize,
    },

    /// A supplied position is not referenced by any polygon.
    #[error("vertex {vertex} is not used by any polygon")]
    OrphanVertex {
        /// The unreferenced vertex index.
        vertex: usize,
    },

    /// The polygons around a vertex do not form a single fan.
    #[error("vertex {vertex} is non-manifold: {expected} incident polygons but a fan of {found}")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
        /// Number of polygons that reference the vertex.
        expected: usize,
        /// Number of polygons reachable by walking its fan.
        found: usize,
    },

    /// The polygons reference a different number of vertices than there are positions.
    #[error("polygons reference {vertices} distinct vertices but {positions} positions were given")]
    VertexCountMismatch {
        /// Number of supplied positions.
        positions: usize,
        /// Number of distinct vertex indices.
        vertices: usize,
    },
}

/// Errors that can occur in bonemesh.
#[derive(Error, Debug)]
pub enum Error {
    /// A polygon soup could not be built into a half-edge mesh.
    #[error("mesh build failed: {0}")]
    Build(#[from] BuildError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed skeleton JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted skeleton parsed but describes an invalid tree.
    #[error("invalid skeleton: {0}")]
    InvalidSkeleton(String),

    /// The operation needs state that is not there (e.g. no mesh yet).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
