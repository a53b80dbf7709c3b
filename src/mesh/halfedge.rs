//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for polygon meshes. Elements live in four arenas addressed by typed handles,
//! which keeps the cyclic twin/next graph free of references.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions
//! - Each half-edge knows its **twin**, **next** (around the face), **origin**
//!   vertex, owning **edge**, and incident **face**
//! - Each vertex stores one outgoing half-edge
//! - Each edge and face stores one of its half-edges
//!
//! # Boundary Handling
//!
//! Every half-edge has a face. Holes in the surface are closed by explicit
//! boundary-loop faces flagged with [`Face::boundary`], so twin and next
//! are always valid on a built mesh.
//!
//! # Deletion
//!
//! Topological editors never shrink the arenas. Removed elements are
//! tombstoned and skipped by every iterator and counter until
//! [`HalfEdgeMesh::compact`] sweeps them out.

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    pub halfedge: HalfEdgeId,

    pub(crate) removed: bool,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            removed: false,
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId,

    /// The undirected edge this half-edge is one side of.
    pub edge: EdgeId,

    /// The face (or boundary loop) this half-edge belongs to.
    pub face: FaceId,

    pub(crate) removed: bool,
}

impl HalfEdge {
    /// Create a new unlinked half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            edge: EdgeId::invalid(),
            face: FaceId::invalid(),
            removed: false,
        }
    }
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// An undirected edge.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// One of the two half-edges of this edge.
    pub halfedge: HalfEdgeId,

    pub(crate) removed: bool,
}

impl Edge {
    /// Create an edge referring to one of its half-edges.
    pub fn new(halfedge: HalfEdgeId) -> Self {
        Self {
            halfedge,
            removed: false,
        }
    }
}

/// A face (or boundary loop) in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId,

    /// True if this face is a hole in the surface rather than a polygon.
    pub boundary: bool,

    pub(crate) removed: bool,
}

impl Face {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId, boundary: bool) -> Self {
        Self {
            halfedge,
            boundary,
            removed: false,
        }
    }
}

/// A half-edge mesh for polygon surfaces.
///
/// Built with [`HalfEdgeMesh::build`]; edited in place with
/// [`flip_edge`](HalfEdgeMesh::flip_edge), [`split_edge`](HalfEdgeMesh::split_edge)
/// and [`collapse_edge`](HalfEdgeMesh::collapse_edge).
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    /// Tombstoned entries in `vertices`, kept so the live count is O(1).
    pub(crate) removed_vertices: usize,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Accessors ====================

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.removed_vertices
    }

    /// Number of live half-edges, including those on boundary loops.
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.iter().filter(|h| !h.removed).count()
    }

    /// Number of live undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().filter(|e| !e.removed).count()
    }

    /// Number of live polygon faces. Boundary loops are not counted.
    pub fn num_faces(&self) -> usize {
        self.faces.iter().filter(|f| !f.removed && !f.boundary).count()
    }

    /// Number of boundary loops (holes).
    pub fn num_boundary_loops(&self) -> usize {
        self.faces.iter().filter(|f| !f.removed && f.boundary).count()
    }

    /// Number of live half-edges that belong to a boundary loop.
    pub fn num_boundary_halfedges(&self) -> usize {
        self.halfedges
            .iter()
            .filter(|h| !h.removed && self.faces[h.face.index()].boundary)
            .count()
    }

    /// `V - E + F`, counting polygon faces only.
    pub fn euler_characteristic(&self) -> i64 {
        self.num_vertices() as i64 - self.num_edges() as i64 + self.num_faces() as i64
    }

    /// True if the surface has no holes.
    pub fn is_closed(&self) -> bool {
        self.num_boundary_loops() == 0
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge {
        &mut self.halfedges[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a mutable edge by ID.
    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    /// True if the vertex has been removed by an editor and not yet compacted.
    #[inline]
    pub fn is_vertex_removed(&self, v: VertexId) -> bool {
        self.vertex(v).removed
    }

    /// True if the edge has been removed by an editor and not yet compacted.
    #[inline]
    pub fn is_edge_removed(&self, e: EdgeId) -> bool {
        self.edge(e).removed
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face by walking the loop.
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        let mut current = he;
        loop {
            let n = self.next(current);
            if n == he {
                return current;
            }
            current = n;
        }
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.twin(he))
    }

    /// Get the edge of a half-edge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId) -> EdgeId {
        self.halfedge(he).edge
    }

    /// Get the face (or boundary loop) of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId) -> FaceId {
        self.halfedge(he).face
    }

    /// The two endpoints of an edge.
    pub fn edge_vertices(&self, e: EdgeId) -> (VertexId, VertexId) {
        let he = self.edge(e).halfedge;
        (self.origin(he), self.dest(he))
    }

    /// Check if a half-edge lies on a boundary loop.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId) -> bool {
        self.face(self.face_of(he)).boundary
    }

    /// Check if an edge touches a boundary loop.
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        let he = self.edge(e).halfedge;
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Check if a vertex is on the boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertex_halfedges(v).any(|he| self.is_boundary_halfedge(he))
    }

    /// Find the half-edge going from `a` to `b`, if the two are adjacent.
    pub fn find_halfedge(&self, a: VertexId, b: VertexId) -> Option<HalfEdgeId> {
        self.vertex_halfedges(a).find(|&he| self.dest(he) == b)
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.removed)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.removed)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over live edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed)
            .map(|(i, _)| EdgeId::new(i))
    }

    /// Iterate over live polygon faces, skipping boundary loops.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.removed && !f.boundary)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over boundary loops.
    pub fn boundary_loop_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.removed && f.boundary)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId) -> VertexHalfEdgeIter<'_> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over polygon faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|&f| !self.face(f).boundary)
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId) -> FaceHalfEdgeIter<'_> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face.
    pub fn face_vertices(&self, f: FaceId) -> impl Iterator<Item = VertexId> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Number of sides of a face.
    pub fn face_degree(&self, f: FaceId) -> usize {
        self.face_halfedges(f).count()
    }

    /// True if the face is a polygon (not a boundary loop) with three sides.
    pub fn is_triangle(&self, f: FaceId) -> bool {
        !self.face(f).boundary && self.face_degree(f) == 3
    }

    /// Positions of the corners of a face, in order.
    pub fn face_positions(&self, f: FaceId) -> Vec<Point3<f64>> {
        self.face_vertices(f).map(|v| *self.position(v)).collect()
    }

    // ==================== Geometry ====================

    /// Unnormalized face normal (Newell's method). Its length is twice the area.
    pub fn face_area_vector(&self, f: FaceId) -> Vector3<f64> {
        let points = self.face_positions(f);
        let mut n = Vector3::zeros();
        for i in 0..points.len() {
            let a = points[i].coords;
            let b = points[(i + 1) % points.len()].coords;
            n += a.cross(&b);
        }
        n
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        self.face_area_vector(f)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        0.5 * self.face_area_vector(f).norm()
    }

    /// Compute the area-weighted normal at a vertex.
    pub fn vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            normal += self.face_area_vector(f);
        }
        normal
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, e: EdgeId) -> f64 {
        let (a, b) = self.edge_vertices(e);
        (self.position(b) - self.position(a)).norm()
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId) -> Point3<f64> {
        let (a, b) = self.edge_vertices(e);
        Point3::from((self.position(a).coords + self.position(b).coords) * 0.5)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let points = self.face_positions(f);
        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / points.len() as f64)
    }

    /// Compute the bounding box of the live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut live = self.vertices.iter().filter(|v| !v.removed);
        let first = live.next()?.position;
        let mut min = first;
        let mut max = first;

        for v in live {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Mean length over all live edges, or 0 for an empty mesh.
    pub fn average_edge_length(&self) -> f64 {
        let (sum, count) = self
            .edge_ids()
            .fold((0.0, 0usize), |(s, c), e| (s + self.edge_length(e), c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    // ==================== Construction ====================

    /// Add a new unlinked vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    pub(crate) fn add_halfedge(&mut self) -> HalfEdgeId {
        let id = HalfEdgeId::new(self.halfedges.len());
        self.halfedges.push(HalfEdge::new());
        id
    }

    pub(crate) fn add_edge(&mut self, halfedge: HalfEdgeId) -> EdgeId {
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Edge::new(halfedge));
        id
    }

    pub(crate) fn add_face(&mut self, halfedge: HalfEdgeId, boundary: bool) -> FaceId {
        let id = FaceId::new(self.faces.len());
        self.faces.push(Face::new(halfedge, boundary));
        id
    }

    // ==================== Validation ====================

    /// Check that all connectivity among live elements is consistent.
    ///
    /// Verifies `twin(twin(h)) == h`, that every face loop closes on itself
    /// with all of its half-edges agreeing on the face, and that vertex, edge
    /// and face back-references point at live half-edges they own.
    pub fn is_valid(&self) -> bool {
        let limit = self.halfedges.len();

        for (i, he) in self.halfedges.iter().enumerate() {
            if he.removed {
                continue;
            }
            let id = HalfEdgeId::new(i);

            if !he.twin.is_valid() || !he.next.is_valid() || !he.face.is_valid() {
                return false;
            }
            let twin = self.halfedge(he.twin);
            if twin.removed || twin.twin != id || twin.origin == he.origin {
                return false;
            }
            if twin.edge != he.edge || self.edge(he.edge).removed {
                return false;
            }
            if self.vertex(he.origin).removed || self.face(he.face).removed {
                return false;
            }

            // Walking next must come back to the start without leaving the face.
            let mut current = he.next;
            let mut steps = 1;
            while current != id {
                let h = self.halfedge(current);
                if h.removed || h.face != he.face || steps > limit {
                    return false;
                }
                current = h.next;
                steps += 1;
            }
        }

        for (i, v) in self.vertices.iter().enumerate() {
            if v.removed {
                continue;
            }
            if !v.halfedge.is_valid() {
                return false;
            }
            let he = self.halfedge(v.halfedge);
            if he.removed || he.origin != VertexId::new(i) {
                return false;
            }
        }

        for (i, e) in self.edges.iter().enumerate() {
            if !e.removed {
                let he = self.halfedge(e.halfedge);
                if he.removed || he.edge != EdgeId::new(i) {
                    return false;
                }
            }
        }

        for (i, f) in self.faces.iter().enumerate() {
            if !f.removed {
                let he = self.halfedge(f.halfedge);
                if he.removed || he.face != FaceId::new(i) {
                    return false;
                }
            }
        }

        true
    }
}

/// Iterator over outgoing half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> VertexHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, v: VertexId) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for VertexHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he goes v -> w, twin(he) goes w -> v and the half-edge after it
        // in its face is the next spoke leaving v.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> FaceHalfEdgeIter<'a> {
    fn new(mesh: &'a HalfEdgeMesh, f: FaceId) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl Iterator for FaceHalfEdgeIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
