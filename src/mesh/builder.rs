//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from indexed polygon lists (the
//! "polygon soup" produced by skinning and subdivision) and converts them
//! back.

use std::collections::{BTreeMap, HashMap};

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, VertexId};
use crate::error::BuildError;

impl HalfEdgeMesh {
    /// Build a half-edge mesh from polygons of any degree.
    ///
    /// Polygons index into the distinct vertex indices they use; the `i`-th
    /// smallest index receives `positions[i]`, so the usual dense `0..n`
    /// numbering maps straight through. Edges used by only one polygon are
    /// closed off with boundary-loop faces.
    ///
    /// # Errors
    /// Returns a [`BuildError`] instead of a partial mesh when the input is
    /// not an oriented 2-manifold (with boundary).
    ///
    /// # Example
    /// ```
    /// use bonemesh::mesh::HalfEdgeMesh;
    /// use nalgebra::Point3;
    ///
    /// let positions = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let mesh = HalfEdgeMesh::build(&[vec![0, 1, 2, 3]], &positions).unwrap();
    /// assert_eq!(mesh.num_faces(), 1);
    /// assert_eq!(mesh.num_boundary_loops(), 1);
    /// ```
    pub fn build(
        polygons: &[Vec<usize>],
        positions: &[Point3<f64>],
    ) -> Result<Self, BuildError> {
        if polygons.is_empty() {
            return Err(BuildError::EmptyMesh);
        }

        // Reference counts double as the expected fan size of each vertex.
        let mut references: BTreeMap<usize, usize> = BTreeMap::new();
        for (pi, polygon) in polygons.iter().enumerate() {
            if polygon.len() < 3 {
                return Err(BuildError::TooFewVertices {
                    polygon: pi,
                    count: polygon.len(),
                });
            }
            for (i, &v) in polygon.iter().enumerate() {
                if polygon[..i].contains(&v) {
                    return Err(BuildError::RepeatedVertex {
                        polygon: pi,
                        vertex: v,
                    });
                }
                *references.entry(v).or_insert(0) += 1;
            }
        }

        if references.len() != positions.len() {
            let in_range = references.keys().all(|&v| v < positions.len());
            if in_range && references.len() < positions.len() {
                let vertex = (0..positions.len())
                    .find(|v| !references.contains_key(v))
                    .unwrap_or(positions.len());
                return Err(BuildError::OrphanVertex { vertex });
            }
            return Err(BuildError::VertexCountMismatch {
                positions: positions.len(),
                vertices: references.len(),
            });
        }

        let mut mesh = HalfEdgeMesh::new();
        let mut vertex_ids: HashMap<usize, VertexId> = HashMap::with_capacity(references.len());
        for (&index, position) in references.keys().zip(positions) {
            vertex_ids.insert(index, mesh.add_vertex(*position));
        }

        // First pass: one half-edge per oriented polygon side
        let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();
        let mut sides: Vec<(usize, usize, HalfEdgeId)> = Vec::new();

        for polygon in polygons {
            let first = HalfEdgeId::new(mesh.halfedges.len());
            let face = mesh.add_face(first, false);
            let n = polygon.len();

            for i in 0..n {
                let (a, b) = (polygon[i], polygon[(i + 1) % n]);
                let he = mesh.add_halfedge();
                if edge_map.insert((a, b), he).is_some() {
                    return Err(BuildError::DuplicateOrientedEdge { from: a, to: b });
                }
                sides.push((a, b, he));

                let origin = vertex_ids[&a];
                let h = mesh.halfedge_mut(he);
                h.origin = origin;
                h.face = face;
                h.next = HalfEdgeId::new(first.index() + (i + 1) % n);
                mesh.vertex_mut(origin).halfedge = he;
            }
        }

        // Second pass: twins and edges, with a boundary half-edge for every unmatched side
        let mut boundary: Vec<HalfEdgeId> = Vec::new();
        for &(a, b, he) in &sides {
            if mesh.halfedge(he).twin.is_valid() {
                continue;
            }
            let twin = match edge_map.get(&(b, a)) {
                Some(&twin) => twin,
                None => {
                    let bhe = mesh.add_halfedge();
                    mesh.halfedge_mut(bhe).origin = vertex_ids[&b];
                    boundary.push(bhe);
                    bhe
                }
            };
            let edge = mesh.add_edge(he);
            mesh.halfedge_mut(he).twin = twin;
            mesh.halfedge_mut(he).edge = edge;
            mesh.halfedge_mut(twin).twin = he;
            mesh.halfedge_mut(twin).edge = edge;
        }

        link_boundary_loops(&mut mesh, &boundary, &references)?;

        // A vertex on a hole should advertise its boundary spoke.
        for &bhe in &boundary {
            let origin = mesh.origin(bhe);
            mesh.vertex_mut(origin).halfedge = bhe;
        }

        for (&index, &expected) in &references {
            let v = vertex_ids[&index];
            if !mesh.vertex(v).halfedge.is_valid() {
                return Err(BuildError::OrphanVertex { vertex: index });
            }
            let found = mesh
                .vertex_halfedges(v)
                .filter(|&he| !mesh.is_boundary_halfedge(he))
                .count();
            if found != expected {
                return Err(BuildError::NonManifoldVertex {
                    vertex: index,
                    expected,
                    found,
                });
            }
        }

        Ok(mesh)
    }

    /// Export the live mesh as dense positions plus polygon index lists.
    ///
    /// Tombstoned elements are skipped and the remaining vertices are
    /// renumbered in arena order.
    pub fn to_polygons(&self) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut positions = Vec::with_capacity(self.vertices.len());
        for v in self.vertex_ids() {
            remap[v.index()] = positions.len();
            positions.push(*self.position(v));
        }

        let polygons = self
            .face_ids()
            .map(|f| self.face_vertices(f).map(|v| remap[v.index()]).collect())
            .collect();

        (positions, polygons)
    }

    /// Rebuild the mesh with every polygon fan-triangulated from its first corner.
    pub fn triangulated(&self) -> Result<Self, BuildError> {
        let (positions, polygons) = self.to_polygons();
        let triangles: Vec<Vec<usize>> = polygons
            .iter()
            .flat_map(|p| (1..p.len() - 1).map(move |i| vec![p[0], p[i], p[i + 1]]))
            .collect();
        Self::build(&triangles, &positions)
    }
}

/// Chain the boundary half-edges around each hole and give every hole a face.
fn link_boundary_loops(
    mesh: &mut HalfEdgeMesh,
    boundary: &[HalfEdgeId],
    references: &BTreeMap<usize, usize>,
) -> Result<(), BuildError> {
    if boundary.is_empty() {
        return Ok(());
    }

    // Vertex ids were handed out in sorted index order.
    let pinched = |v: VertexId| {
        let index = references.keys().nth(v.index()).copied().unwrap_or(v.index());
        let expected = references.get(&index).copied().unwrap_or(0);
        BuildError::NonManifoldVertex {
            vertex: index,
            expected,
            found: expected + 1,
        }
    };

    let mut outgoing: HashMap<VertexId, HalfEdgeId> = HashMap::new();
    for &he in boundary {
        let origin = mesh.origin(he);
        if outgoing.insert(origin, he).is_some() {
            // Two holes pinch at this vertex.
            return Err(pinched(origin));
        }
    }

    for &he in boundary {
        let dest = mesh.dest(he);
        let next = *outgoing.get(&dest).ok_or_else(|| pinched(dest))?;
        mesh.halfedge_mut(he).next = next;
    }

    for &start in boundary {
        if mesh.halfedge(start).face.is_valid() {
            continue;
        }
        let face = mesh.add_face(start, true);
        let mut he = start;
        loop {
            mesh.halfedge_mut(he).face = face;
            he = mesh.next(he);
            if he == start {
                break;
            }
        }
    }

    Ok(())
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use bonemesh::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh, BuildError> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    HalfEdgeMesh::build(&polygons, vertices)
}

/// Build a half-edge mesh from vertices and quad faces (counter-clockwise).
pub fn build_from_quads(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh, BuildError> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    HalfEdgeMesh::build(&polygons, vertices)
}
