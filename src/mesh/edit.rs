//! Local topological editors: edge flip, split and collapse.
//!
//! All three act on an interior edge whose two faces are triangles. The
//! neighbourhood of such an edge is captured once as a [`Diamond`] and the
//! editors then relink it element by element:
//!
//! ```text
//!             v3
//!            /  \
//!       h2  / f0 \  h1
//!          /  h0  \
//!        v0 ------ v1
//!          \  h3  /
//!       h4  \ f1 /  h5
//!            \  /
//!             v2
//! ```
//!
//! `h0` runs `v0 -> v1` inside `f0`, `h3` is its twin inside `f1`;
//! `h6..h9` are the outer twins of `h1`, `h2`, `h4`, `h5`.
//!
//! Removed elements are only tombstoned. Call [`HalfEdgeMesh::compact`] to
//! drop them once no caller still holds handles into the old arenas.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, VertexId};

/// The two triangles around an interior edge, fully labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diamond {
    /// Half-edges of the two triangles, `h0..h5`.
    pub inner: [HalfEdgeId; 6],
    /// Outer twins of `h1`, `h2`, `h4`, `h5`.
    pub outer: [HalfEdgeId; 4],
    /// `v0` and `v1` are the edge endpoints, `v2` and `v3` the opposite corners.
    pub vertices: [VertexId; 4],
    /// The edge itself followed by the four rim edges (of `h1`, `h2`, `h4`, `h5`).
    pub edges: [EdgeId; 5],
    /// `f0` above the edge, `f1` below it.
    pub faces: [FaceId; 2],
}

/// Where a collapsed edge leaves its surviving vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePosition {
    /// Sum of the two endpoint positions.
    #[default]
    Sum,
    /// Midpoint of the two endpoints.
    Midpoint,
}

impl MergePosition {
    fn apply(self, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
        match self {
            MergePosition::Sum => Point3::from(a.coords + b.coords),
            MergePosition::Midpoint => Point3::from((a.coords + b.coords) * 0.5),
        }
    }
}

/// Element counts removed by [`HalfEdgeMesh::compact`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    /// Vertices swept.
    pub vertices: usize,
    /// Half-edges swept.
    pub halfedges: usize,
    /// Edges swept.
    pub edges: usize,
    /// Faces swept.
    pub faces: usize,
}

impl HalfEdgeMesh {
    /// Label the neighbourhood of `e`, or `None` unless both of its faces
    /// are live triangles.
    pub fn diamond(&self, e: EdgeId) -> Option<Diamond> {
        if self.edge(e).removed {
            return None;
        }
        let h0 = self.edge(e).halfedge;
        let h3 = self.twin(h0);
        let (f0, f1) = (self.face_of(h0), self.face_of(h3));
        if f0 == f1 || !self.is_triangle(f0) || !self.is_triangle(f1) {
            return None;
        }

        let h1 = self.next(h0);
        let h2 = self.next(h1);
        let h4 = self.next(h3);
        let h5 = self.next(h4);

        let outer = [self.twin(h1), self.twin(h2), self.twin(h4), self.twin(h5)];
        let vertices = [
            self.origin(h0),
            self.origin(h3),
            self.origin(h5),
            self.origin(h2),
        ];
        let edges = [
            e,
            self.edge_of(h1),
            self.edge_of(h2),
            self.edge_of(h4),
            self.edge_of(h5),
        ];

        Some(Diamond {
            inner: [h0, h1, h2, h3, h4, h5],
            outer,
            vertices,
            edges,
            faces: [f0, f1],
        })
    }

    /// Rotate `e` inside its two triangles so it joins the opposite corners.
    ///
    /// Returns the (same) edge id on success, `None` if `e` is not an
    /// interior edge between two triangles. No geometric checks are made.
    pub fn flip_edge(&mut self, e: EdgeId) -> Option<EdgeId> {
        let d = self.diamond(e)?;
        let [h0, h1, h2, h3, h4, h5] = d.inner;
        let [v0, v1, v2, v3] = d.vertices;
        let [f0, f1] = d.faces;

        // f0 becomes v2 -> v3 -> v0, f1 becomes v3 -> v2 -> v1.
        self.set_halfedge(h0, h2, v2, f0);
        self.set_halfedge(h2, h4, v3, f0);
        self.set_halfedge(h4, h0, v0, f0);
        self.set_halfedge(h3, h5, v3, f1);
        self.set_halfedge(h5, h1, v2, f1);
        self.set_halfedge(h1, h3, v1, f1);

        self.vertex_mut(v0).halfedge = h4;
        self.vertex_mut(v1).halfedge = h1;
        self.vertex_mut(v2).halfedge = h5;
        self.vertex_mut(v3).halfedge = h2;

        self.face_mut(f0).halfedge = h0;
        self.face_mut(f1).halfedge = h3;

        Some(e)
    }

    /// Insert a vertex at the midpoint of `e`, turning its two triangles into four.
    ///
    /// Adds one vertex, three edges, two faces and six half-edges. The new
    /// vertex's half-edge runs along the split edge. Returns `None` if `e` is
    /// not an interior edge between two triangles.
    pub fn split_edge(&mut self, e: EdgeId) -> Option<VertexId> {
        let d = self.diamond(e)?;
        let [h0, h1, h2, h3, h4, h5] = d.inner;
        let [v0, v1, v2, v3] = d.vertices;
        let [f0, f1] = d.faces;

        let v4 = self.add_vertex(self.edge_midpoint(e));

        let h10 = self.add_halfedge();
        let h11 = self.add_halfedge();
        let h12 = self.add_halfedge();
        let h13 = self.add_halfedge();
        let h14 = self.add_halfedge();
        let h15 = self.add_halfedge();

        let e5 = self.add_edge(h10);
        let e6 = self.add_edge(h12);
        let e7 = self.add_edge(h14);

        let f2 = self.add_face(h14, false);
        let f3 = self.add_face(h15, false);

        // f0: v4 -> v1 -> v3
        self.set_halfedge(h0, h1, v4, f0);
        self.set_halfedge(h1, h10, v1, f0);
        self.link(h10, h0, h11, v3, e5, f0);
        // f2: v4 -> v3 -> v0
        self.link(h11, h2, h10, v4, e5, f2);
        self.set_halfedge(h2, h14, v3, f2);
        self.link(h14, h11, h15, v0, e7, f2);
        // f1: v1 -> v4 -> v2
        self.set_halfedge(h3, h12, v1, f1);
        self.link(h12, h5, h13, v4, e6, f1);
        self.set_halfedge(h5, h3, v2, f1);
        // f3: v2 -> v4 -> v0
        self.link(h13, h15, h12, v2, e6, f3);
        self.link(h15, h4, h14, v4, e7, f3);
        self.set_halfedge(h4, h13, v0, f3);

        self.vertex_mut(v0).halfedge = h14;
        self.vertex_mut(v1).halfedge = h3;
        self.vertex_mut(v2).halfedge = h13;
        self.vertex_mut(v3).halfedge = h10;
        self.vertex_mut(v4).halfedge = h15;

        self.edge_mut(e).halfedge = h0;

        self.face_mut(f0).halfedge = h0;
        self.face_mut(f1).halfedge = h3;

        Some(v4)
    }

    /// Merge the endpoints of `e`, keeping the origin of its stored half-edge.
    ///
    /// Removes two faces, the edge and two rim edges, six half-edges and one
    /// vertex. The survivor is placed with [`MergePosition::Sum`]; see
    /// [`collapse_edge_with`](Self::collapse_edge_with) for the alternative.
    pub fn collapse_edge(&mut self, e: EdgeId) -> Option<VertexId> {
        self.collapse_edge_with(e, MergePosition::Sum)
    }

    /// Like [`collapse_edge`](Self::collapse_edge) with an explicit placement rule.
    ///
    /// The caller is responsible for the link condition (see
    /// [`can_collapse`](Self::can_collapse)); collapsing an edge that fails it
    /// leaves a non-manifold surface.
    pub fn collapse_edge_with(&mut self, e: EdgeId, merge: MergePosition) -> Option<VertexId> {
        let d = self.diamond(e)?;
        let [h0, h1, h2, h3, h4, h5] = d.inner;
        let [h6, h7, h8, h9] = d.outer;
        let [v0, v1, v2, v3] = d.vertices;
        let [_, e1, e2, e3, e4] = d.edges;
        let [f0, f1] = d.faces;

        // Close both triangles by gluing their outer rims together.
        self.halfedge_mut(h6).twin = h7;
        self.halfedge_mut(h7).twin = h6;
        self.halfedge_mut(h6).edge = e2;
        self.halfedge_mut(h8).twin = h9;
        self.halfedge_mut(h9).twin = h8;
        self.halfedge_mut(h9).edge = e3;

        self.edge_mut(e2).halfedge = h7;
        self.edge_mut(e3).halfedge = h8;

        // With the rims glued the two fans form one; walk it and re-home v1's spokes.
        let mut he = h9;
        loop {
            self.halfedge_mut(he).origin = v0;
            he = self.next(self.twin(he));
            if he == h9 {
                break;
            }
        }

        let merged = merge.apply(self.position(v0), self.position(v1));
        self.set_position(v0, merged);

        self.vertex_mut(v0).halfedge = h7;
        self.vertex_mut(v2).halfedge = h8;
        self.vertex_mut(v3).halfedge = h6;

        for h in [h0, h1, h2, h3, h4, h5] {
            self.halfedge_mut(h).removed = true;
        }
        self.vertex_mut(v1).removed = true;
        self.removed_vertices += 1;
        for edge in [e, e1, e4] {
            self.edge_mut(edge).removed = true;
        }
        self.face_mut(f0).removed = true;
        self.face_mut(f1).removed = true;

        Some(v0)
    }

    /// True if collapsing `e` keeps the surface manifold.
    ///
    /// Requires a triangle pair around `e`, and that the endpoints share no
    /// neighbours other than the two opposite corners (the link condition).
    /// Meshes with four or fewer vertices cannot lose one.
    pub fn can_collapse(&self, e: EdgeId) -> bool {
        let Some(d) = self.diamond(e) else {
            return false;
        };
        let [v0, v1, v2, v3] = d.vertices;
        if v2 == v3 || self.num_vertices() <= 4 {
            return false;
        }
        if self.vertex_halfedges(v0).any(|h| self.is_boundary_halfedge(h))
            && self.vertex_halfedges(v1).any(|h| self.is_boundary_halfedge(h))
        {
            return false;
        }
        let ring: Vec<VertexId> = self.vertex_neighbors(v0).collect();
        self.vertex_neighbors(v1)
            .filter(|n| ring.contains(n))
            .all(|n| n == v2 || n == v3)
    }

    /// Sweep tombstoned elements out of the arenas and renumber the rest.
    ///
    /// Every handle obtained before the call is invalidated.
    pub fn compact(&mut self) -> CompactStats {
        let stats = CompactStats {
            vertices: self.vertices.iter().filter(|v| v.removed).count(),
            halfedges: self.halfedges.iter().filter(|h| h.removed).count(),
            edges: self.edges.iter().filter(|e| e.removed).count(),
            faces: self.faces.iter().filter(|f| f.removed).count(),
        };
        if stats == CompactStats::default() {
            return stats;
        }

        let vmap = survivors(self.vertices.iter().map(|v| v.removed));
        let hmap = survivors(self.halfedges.iter().map(|h| h.removed));
        let emap = survivors(self.edges.iter().map(|e| e.removed));
        let fmap = survivors(self.faces.iter().map(|f| f.removed));

        self.vertices.retain(|v| !v.removed);
        self.removed_vertices = 0;
        self.halfedges.retain(|h| !h.removed);
        self.edges.retain(|e| !e.removed);
        self.faces.retain(|f| !f.removed);

        for v in &mut self.vertices {
            v.halfedge = HalfEdgeId::new(hmap[v.halfedge.index()]);
        }
        for h in &mut self.halfedges {
            h.origin = VertexId::new(vmap[h.origin.index()]);
            h.twin = HalfEdgeId::new(hmap[h.twin.index()]);
            h.next = HalfEdgeId::new(hmap[h.next.index()]);
            h.edge = EdgeId::new(emap[h.edge.index()]);
            h.face = FaceId::new(fmap[h.face.index()]);
        }
        for e in &mut self.edges {
            e.halfedge = HalfEdgeId::new(hmap[e.halfedge.index()]);
        }
        for f in &mut self.faces {
            f.halfedge = HalfEdgeId::new(hmap[f.halfedge.index()]);
        }

        log::debug!(
            "compacted mesh: -{} vertices, -{} edges, -{} faces",
            stats.vertices,
            stats.edges,
            stats.faces
        );
        stats
    }

    fn set_halfedge(&mut self, he: HalfEdgeId, next: HalfEdgeId, origin: VertexId, face: FaceId) {
        let h = self.halfedge_mut(he);
        h.next = next;
        h.origin = origin;
        h.face = face;
    }

    fn link(
        &mut self,
        he: HalfEdgeId,
        next: HalfEdgeId,
        twin: HalfEdgeId,
        origin: VertexId,
        edge: EdgeId,
        face: FaceId,
    ) {
        let h = self.halfedge_mut(he);
        h.next = next;
        h.twin = twin;
        h.origin = origin;
        h.edge = edge;
        h.face = face;
    }
}

/// Old index -> new index for the elements that survive a sweep.
fn survivors(removed: impl Iterator<Item = bool>) -> Vec<usize> {
    let mut next = 0;
    removed
        .map(|gone| {
            if gone {
                usize::MAX
            } else {
                next += 1;
                next - 1
            }
        })
        .collect()
}
