//! Isotropic remeshing.
//!
//! One remesh invocation runs four passes in a fixed order:
//!
//! 1. **Split** edges longer than 4/3 × the mean side of a triangle they bound
//! 2. **Collapse** edges shorter than 4/5 × that mean, then compact
//! 3. **Flip** edges when it lowers Σ|valence − 6| around them
//! 4. **Tangential smoothing** toward the one-ring centroid, damped by λ = 0.3
//!
//! Split, collapse and flip only touch interior edges shared by two
//! triangles; quads left by skinning or subdivision are skipped unless
//! [`RemeshOptions::triangulate`] is set. Each pass is also available on its
//! own.
//!
//! # Example
//!
//! ```
//! use bonemesh::algo::remesh::{remesh, RemeshOptions};
//! use bonemesh::mesh::{build_from_triangles, MergePosition};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let faces = [
//!     [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//! let mut mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = RemeshOptions::default().with_merge(MergePosition::Midpoint);
//! remesh(&mut mesh, &options).unwrap();
//! assert_eq!(mesh.euler_characteristic(), 2);
//! ```
//!
//! # References
//!
//! - Botsch, M., & Kobbelt, L. (2004). "A remeshing approach to multiresolution modeling."
//!   Symposium on Geometry Processing.

mod isotropic;

pub use isotropic::{
    collapse_queue, collapse_short_edges, flip_to_regular_valence, long_sides, short_sides,
    split_long_edges, split_queue, tangential_smooth, valence_deviation,
};

use crate::algo::progress::{report, Progress};
use crate::error::{Error, Result};
use crate::mesh::{HalfEdgeMesh, MergePosition};

/// Options for remeshing.
#[derive(Debug, Clone)]
pub struct RemeshOptions {
    /// Number of split → collapse → flip → smooth rounds.
    pub iterations: usize,

    /// Split edges longer than this multiple of their triangle's mean side.
    pub split_ratio: f64,

    /// Collapse edges shorter than this multiple of their triangle's mean side.
    pub collapse_ratio: f64,

    /// Damping factor for tangential smoothing.
    pub smoothing_lambda: f64,

    /// Placement of the surviving vertex of a collapse.
    pub merge: MergePosition,

    /// Fan-triangulate non-triangular faces before the first round.
    pub triangulate: bool,
}

impl Default for RemeshOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            split_ratio: 4.0 / 3.0,
            collapse_ratio: 4.0 / 5.0,
            smoothing_lambda: 0.3,
            merge: MergePosition::Sum,
            triangulate: false,
        }
    }
}

impl RemeshOptions {
    /// Set the number of remeshing rounds.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the smoothing factor.
    pub fn with_smoothing_lambda(mut self, lambda: f64) -> Self {
        self.smoothing_lambda = lambda;
        self
    }

    /// Set where collapsed edges leave their surviving vertex.
    pub fn with_merge(mut self, merge: MergePosition) -> Self {
        self.merge = merge;
        self
    }

    /// Set whether to triangulate quads and n-gons first.
    pub fn with_triangulate(mut self, triangulate: bool) -> Self {
        self.triangulate = triangulate;
        self
    }

    /// Reject option combinations the passes cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(self.collapse_ratio > 0.0) {
            return Err(Error::invalid_param(
                "collapse_ratio",
                self.collapse_ratio,
                "must be positive",
            ));
        }
        if !(self.split_ratio > self.collapse_ratio) {
            return Err(Error::invalid_param(
                "split_ratio",
                self.split_ratio,
                "must exceed collapse_ratio",
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_lambda) {
            return Err(Error::invalid_param(
                "smoothing_lambda",
                self.smoothing_lambda,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// What a remesh changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemeshStats {
    /// Edges split.
    pub split: usize,
    /// Edges collapsed.
    pub collapsed: usize,
    /// Edges flipped.
    pub flipped: usize,
}

/// Run `options.iterations` rounds of split → collapse → flip → smooth.
pub fn remesh(mesh: &mut HalfEdgeMesh, options: &RemeshOptions) -> Result<RemeshStats> {
    remesh_internal(mesh, options, None)
}

/// Remeshing with progress reporting.
///
/// See [`remesh`] for algorithm details.
pub fn remesh_with_progress(
    mesh: &mut HalfEdgeMesh,
    options: &RemeshOptions,
    progress: &Progress,
) -> Result<RemeshStats> {
    remesh_internal(mesh, options, Some(progress))
}

fn remesh_internal(
    mesh: &mut HalfEdgeMesh,
    options: &RemeshOptions,
    progress: Option<&Progress>,
) -> Result<RemeshStats> {
    options.validate()?;

    if options.triangulate {
        *mesh = mesh.triangulated()?;
    }

    // 4 sub-steps per iteration
    let total_steps = options.iterations * 4;
    let mut stats = RemeshStats::default();

    for iter in 0..options.iterations {
        let base_step = iter * 4;

        report(progress, base_step, total_steps, "Splitting edges");
        stats.split += split_long_edges(mesh, options.split_ratio);

        report(progress, base_step + 1, total_steps, "Collapsing edges");
        stats.collapsed += collapse_short_edges(mesh, options.collapse_ratio, options.merge);

        report(progress, base_step + 2, total_steps, "Flipping edges");
        stats.flipped += flip_to_regular_valence(mesh);

        report(progress, base_step + 3, total_steps, "Smoothing");
        tangential_smooth(mesh, options.smoothing_lambda);
    }

    report(progress, total_steps, total_steps, "Remeshing complete");
    log::info!(
        "remeshed: {} split, {} collapsed, {} flipped; {} faces",
        stats.split,
        stats.collapsed,
        stats.flipped,
        mesh.num_faces()
    );

    Ok(stats)
}
