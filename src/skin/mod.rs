//! Skinning: from a skeleton of spheres to a closed polygon surface.
//!
//! Generation runs in three steps over an interpolated
//! [`SkeletalTree`](crate::skeleton::SkeletalTree):
//!
//! 1. **Sweep**: every chain of single-child nodes becomes a [`Limb`], a tube
//!    of square cross-sections. Chains that end in a leaf are tapered and
//!    sealed.
//! 2. **Stitch**: at every joint the limb openings meeting it, plus samples
//!    on the joint sphere, are wrapped in a convex hull. Hull triangles that
//!    would cap a limb opening are dropped. Deeper joints are stitched first.
//! 3. **Weld**: limb quads and joint triangles are merged into a
//!    [`PolygonSoup`] keyed by quantised position, ready for
//!    [`HalfEdgeMesh::build`](crate::mesh::HalfEdgeMesh::build).
//!
//! # Example
//!
//! ```
//! use bonemesh::skeleton::{interpolate, SkeletalTree};
//! use bonemesh::skin::{skin, SkinOptions};
//! use nalgebra::Point3;
//!
//! let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
//! let root = tree.root().unwrap();
//! tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
//! tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
//! interpolate(&mut tree);
//!
//! let soup = skin(&tree, &SkinOptions::default());
//! let mesh = soup.to_mesh().unwrap();
//! assert!(mesh.is_closed());
//! ```

mod hull;
mod limb;
mod soup;
mod stitch;
mod sweep;

pub use hull::convex_hull;
pub use limb::{layer_axis, layer_center, Layer, Limb, Quad};
pub use soup::{weld_key, PolygonSoup, DEFAULT_WELD_EPSILON};
pub use stitch::{joint_triangles, skin, sphere_samples, stitch_joint, Fringe};
pub use sweep::{bridge, sweep_box, sweep_chain, ChainEnd, Frame, SweptChain};

use nalgebra::Vector3;

use crate::error::{Error, Result};

/// Options for skinning.
#[derive(Debug, Clone)]
pub struct SkinOptions {
    /// World axis crossed with the travel direction to orient cross-sections.
    pub up_axis: Vector3<f64>,

    /// Radius factor of the tapered cross-section closing a leaf or root end.
    pub leaf_taper: f64,

    /// Latitude, in degrees, of the joint-sphere samples.
    pub sample_latitude: f64,

    /// Quantisation step of the vertex welding key.
    pub weld_epsilon: f64,

    /// Visibility tolerance of the joint hull.
    pub hull_epsilon: f64,
}

impl Default for SkinOptions {
    fn default() -> Self {
        Self {
            up_axis: Vector3::z(),
            leaf_taper: 0.5,
            sample_latitude: 45.0,
            weld_epsilon: DEFAULT_WELD_EPSILON,
            hull_epsilon: 1e-9,
        }
    }
}

impl SkinOptions {
    /// Set the up axis. It is normalised on use.
    pub fn with_up_axis(mut self, up: Vector3<f64>) -> Self {
        self.up_axis = up;
        self
    }

    /// Set the taper factor of sealed ends.
    pub fn with_leaf_taper(mut self, taper: f64) -> Self {
        self.leaf_taper = taper;
        self
    }

    /// Set the welding step.
    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Check ranges and normalise the up axis.
    pub fn validated(mut self) -> Result<Self> {
        self.up_axis = self
            .up_axis
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| Error::invalid_param("up_axis", "zero vector", "must be non-zero"))?;
        if !(self.leaf_taper > 0.0 && self.leaf_taper <= 1.0) {
            return Err(Error::invalid_param(
                "leaf_taper",
                self.leaf_taper,
                "must lie in (0, 1]",
            ));
        }
        if !(self.sample_latitude > 0.0 && self.sample_latitude < 90.0) {
            return Err(Error::invalid_param(
                "sample_latitude",
                self.sample_latitude,
                "must lie in (0, 90) degrees",
            ));
        }
        if !(self.weld_epsilon > 0.0) {
            return Err(Error::invalid_param(
                "weld_epsilon",
                self.weld_epsilon,
                "must be positive",
            ));
        }
        if !(self.hull_epsilon >= 0.0) {
            return Err(Error::invalid_param(
                "hull_epsilon",
                self.hull_epsilon,
                "must be non-negative",
            ));
        }
        Ok(self)
    }
}
