//! Welded polygon soup.
//!
//! Skinning emits raw corner positions. [`PolygonSoup`] welds them through
//! a quantised coordinate key, so two corners that land within a weld step
//! of each other share one index, and keeps the resulting index polygons
//! ready for [`HalfEdgeMesh::build`].

use std::collections::HashMap;

use nalgebra::Point3;

use crate::error::BuildError;
use crate::mesh::HalfEdgeMesh;

/// Default quantisation step for welding.
pub const DEFAULT_WELD_EPSILON: f64 = 1e-6;

/// Quantised position key: each coordinate divided by `epsilon` and rounded.
#[inline]
pub fn weld_key(p: &Point3<f64>, epsilon: f64) -> [i64; 3] {
    [
        (p.x / epsilon).round() as i64,
        (p.y / epsilon).round() as i64,
        (p.z / epsilon).round() as i64,
    ]
}

/// Indexed polygons over a welded vertex list.
#[derive(Debug, Clone)]
pub struct PolygonSoup {
    positions: Vec<Point3<f64>>,
    polygons: Vec<Vec<usize>>,
    lookup: HashMap<[i64; 3], usize>,
    epsilon: f64,
}

impl Default for PolygonSoup {
    fn default() -> Self {
        Self::new(DEFAULT_WELD_EPSILON)
    }
}

impl PolygonSoup {
    /// Create an empty soup welding at `epsilon`.
    pub fn new(epsilon: f64) -> Self {
        Self {
            positions: Vec::new(),
            polygons: Vec::new(),
            lookup: HashMap::new(),
            epsilon,
        }
    }

    /// Index of `p`, adding it if no welded vertex shares its key.
    pub fn insert_point(&mut self, p: Point3<f64>) -> usize {
        let key = weld_key(&p, self.epsilon);
        *self.lookup.entry(key).or_insert_with(|| {
            self.positions.push(p);
            self.positions.len() - 1
        })
    }

    /// Weld and append a polygon.
    ///
    /// Returns `false`, adding nothing, if welding leaves fewer than three
    /// distinct corners.
    pub fn add_polygon(&mut self, corners: &[Point3<f64>]) -> bool {
        // Keys are checked before any corner is stored, so a rejected
        // polygon leaves no unreferenced positions behind.
        let keys: Vec<[i64; 3]> = corners.iter().map(|p| weld_key(p, self.epsilon)).collect();
        let distinct = keys
            .iter()
            .enumerate()
            .all(|(i, a)| !keys[..i].contains(a));
        if keys.len() < 3 || !distinct {
            return false;
        }
        let indices = corners.iter().map(|&p| self.insert_point(p)).collect();
        self.polygons.push(indices);
        true
    }

    /// Append every polygon of another soup.
    pub fn extend(&mut self, other: &PolygonSoup) {
        for polygon in &other.polygons {
            let corners: Vec<Point3<f64>> = polygon.iter().map(|&i| other.positions[i]).collect();
            self.add_polygon(&corners);
        }
    }

    /// Welded positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Index polygons.
    #[inline]
    pub fn polygons(&self) -> &[Vec<usize>] {
        &self.polygons
    }

    /// Weld step.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// True if the soup holds no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Corner positions of every polygon.
    pub fn polygon_positions(&self) -> impl Iterator<Item = Vec<Point3<f64>>> + '_ {
        self.polygons
            .iter()
            .map(|poly| poly.iter().map(|&i| self.positions[i]).collect())
    }

    /// Build a half-edge mesh from the soup.
    pub fn to_mesh(&self) -> Result<HalfEdgeMesh, BuildError> {
        HalfEdgeMesh::build(&self.polygons, &self.positions)
    }
}
