//! Quad tubes swept along limb chains.

use nalgebra::{Point3, Vector3};

/// Four corners of a cross-section, counter-clockwise about the travel axis.
pub type Layer = [Point3<f64>; 4];

/// A quad.
pub type Quad = [Point3<f64>; 4];

/// A tube of square cross-sections.
///
/// Each [`add_layer`](Limb::add_layer) after the first emits the four side
/// quads joining it to the previous layer, wound so their normals face away
/// from the tube axis. The first and last layers are the limb's fringes:
/// the openings through which it meets a joint hull, unless sealed.
#[derive(Debug, Clone, Default)]
pub struct Limb {
    layers: Vec<Layer>,
    quads: Vec<Quad>,
}

impl Limb {
    /// Create an empty limb.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cross-section.
    pub fn add_layer(&mut self, layer: Layer) {
        if let Some(prev) = self.layers.last() {
            for k in 0..4 {
                let j = (k + 1) % 4;
                self.quads.push([prev[k], prev[j], layer[j], layer[k]]);
            }
        }
        self.layers.push(layer);
    }

    /// Close the far end with a quad over the last layer.
    pub fn seal(&mut self) {
        if let Some(&[a, b, c, d]) = self.layers.last() {
            self.quads.push([a, b, c, d]);
        }
    }

    /// Close the near end with a quad over the first layer.
    pub fn seal_front(&mut self) {
        if let Some(&[a, b, c, d]) = self.layers.first() {
            self.quads.push([d, c, b, a]);
        }
    }

    /// First cross-section.
    pub fn first_four(&self) -> Option<&Layer> {
        self.layers.first()
    }

    /// Last cross-section.
    pub fn last_four(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// All cross-sections in sweep order.
    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Side and seal quads.
    #[inline]
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }
}

/// Unit normal of a layer, pointing along the direction it was swept.
pub fn layer_axis(layer: &Layer) -> Vector3<f64> {
    (layer[1] - layer[0])
        .cross(&(layer[2] - layer[1]))
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Mean of a layer's corners.
pub fn layer_center(layer: &Layer) -> Point3<f64> {
    let sum = layer.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square of half-width `r` in the plane x = `x`, counter-clockwise about +x.
    fn square(x: f64, r: f64) -> Layer {
        [
            Point3::new(x, r, r),
            Point3::new(x, -r, r),
            Point3::new(x, -r, -r),
            Point3::new(x, r, -r),
        ]
    }

    fn quad_normal(q: &Quad) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        for i in 0..4 {
            n += q[i].coords.cross(&q[(i + 1) % 4].coords);
        }
        n
    }

    #[test]
    fn test_add_layer_emits_side_quads() {
        let mut limb = Limb::new();
        limb.add_layer(square(0.0, 1.0));
        assert!(limb.quads().is_empty());
        limb.add_layer(square(2.0, 1.0));
        assert_eq!(limb.quads().len(), 4);
        limb.add_layer(square(4.0, 1.0));
        assert_eq!(limb.quads().len(), 8);
        assert_eq!(limb.layers().len(), 3);
    }

    #[test]
    fn test_side_quads_face_outward() {
        let mut limb = Limb::new();
        limb.add_layer(square(0.0, 1.0));
        limb.add_layer(square(2.0, 1.0));

        for q in limb.quads() {
            let center = q.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / 4.0;
            let radial = Vector3::new(0.0, center.y, center.z);
            assert!(quad_normal(q).dot(&radial) > 0.0);
        }
    }

    #[test]
    fn test_seals_face_outward() {
        let mut limb = Limb::new();
        limb.add_layer(square(0.0, 1.0));
        limb.add_layer(square(2.0, 1.0));
        limb.seal();
        limb.seal_front();

        let quads = limb.quads();
        assert_eq!(quads.len(), 6);
        assert!(quad_normal(&quads[4]).x > 0.0);
        assert!(quad_normal(&quads[5]).x < 0.0);
    }

    #[test]
    fn test_fringes_and_axis() {
        let mut limb = Limb::new();
        limb.add_layer(square(0.0, 1.0));
        limb.add_layer(square(3.0, 0.5));

        assert_eq!(limb.first_four().unwrap()[0], Point3::new(0.0, 1.0, 1.0));
        assert_eq!(limb.last_four().unwrap()[0], Point3::new(3.0, 0.5, 0.5));

        let axis = layer_axis(limb.last_four().unwrap());
        assert!((axis - Vector3::x()).norm() < 1e-12);
        assert_eq!(layer_center(&square(3.0, 0.5)), Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_limb() {
        let mut limb = Limb::new();
        limb.seal();
        assert!(limb.first_four().is_none());
        assert!(limb.quads().is_empty());
    }
}
