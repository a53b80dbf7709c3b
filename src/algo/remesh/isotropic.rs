//! The four remeshing passes.
//!
//! Thresholds are local: each triangle compares its own sides against the
//! mean of its three side lengths, so a skin with thick and thin limbs is
//! refined relative to each region's scale.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use crate::mesh::{EdgeId, FaceId, HalfEdgeMesh, MergePosition, VertexId};

/// Which sides of a triangle exceed `ratio` times the mean side length.
///
/// ```
/// use bonemesh::algo::remesh::long_sides;
///
/// assert_eq!(long_sides([1.0, 1.0, 3.0], 4.0 / 3.0), [false, false, true]);
/// assert_eq!(long_sides([1.0, 1.0, 1.0], 4.0 / 3.0), [false; 3]);
/// ```
pub fn long_sides(lengths: [f64; 3], ratio: f64) -> [bool; 3] {
    let threshold = ratio * mean(lengths);
    lengths.map(|l| l > threshold)
}

/// Which sides of a triangle fall below `ratio` times the mean side length.
pub fn short_sides(lengths: [f64; 3], ratio: f64) -> [bool; 3] {
    let threshold = ratio * mean(lengths);
    lengths.map(|l| l < threshold)
}

fn mean(lengths: [f64; 3]) -> f64 {
    lengths.iter().sum::<f64>() / 3.0
}

/// Sides of `f` as (edge, length), in loop order.
fn triangle_sides(mesh: &HalfEdgeMesh, f: FaceId) -> [(EdgeId, f64); 3] {
    let mut sides = [(EdgeId::invalid(), 0.0); 3];
    for (slot, he) in sides.iter_mut().zip(mesh.face_halfedges(f)) {
        let e = mesh.edge_of(he);
        *slot = (e, mesh.edge_length(e));
    }
    sides
}

/// Collect interior edges flagged by `select` on any triangle they bound.
fn queue_edges(
    mesh: &HalfEdgeMesh,
    ratio: f64,
    select: fn([f64; 3], f64) -> [bool; 3],
) -> Vec<EdgeId> {
    let mut seen = HashSet::new();
    let mut queue = Vec::new();

    for f in mesh.face_ids() {
        if !mesh.is_triangle(f) {
            continue;
        }
        let sides = triangle_sides(mesh, f);
        let flags = select(sides.map(|(_, l)| l), ratio);
        for ((e, _), flagged) in sides.into_iter().zip(flags) {
            if flagged && mesh.diamond(e).is_some() && seen.insert(e) {
                queue.push(e);
            }
        }
    }
    queue
}

/// Interior edges longer than `ratio` × the mean side of a triangle they bound.
pub fn split_queue(mesh: &HalfEdgeMesh, ratio: f64) -> Vec<EdgeId> {
    queue_edges(mesh, ratio, long_sides)
}

/// Interior edges shorter than `ratio` × the mean side of a triangle they bound.
pub fn collapse_queue(mesh: &HalfEdgeMesh, ratio: f64) -> Vec<EdgeId> {
    queue_edges(mesh, ratio, short_sides)
}

/// Split every queued long edge at its midpoint. Returns the number split.
pub fn split_long_edges(mesh: &mut HalfEdgeMesh, ratio: f64) -> usize {
    let queue = split_queue(mesh, ratio);
    let split = queue
        .into_iter()
        .filter(|&e| mesh.split_edge(e).is_some())
        .count();
    log::debug!("split {} long edges", split);
    split
}

/// Collapse every queued short edge that passes [`HalfEdgeMesh::can_collapse`],
/// then compact the mesh. Returns the number collapsed.
///
/// Edges removed by an earlier collapse in the same pass are skipped.
pub fn collapse_short_edges(mesh: &mut HalfEdgeMesh, ratio: f64, merge: MergePosition) -> usize {
    let queue = collapse_queue(mesh, ratio);
    let mut collapsed = 0;

    for e in queue {
        if mesh.is_edge_removed(e) || !mesh.can_collapse(e) {
            continue;
        }
        if mesh.collapse_edge_with(e, merge).is_some() {
            collapsed += 1;
        }
    }

    mesh.compact();
    log::debug!("collapsed {} short edges", collapsed);
    collapsed
}

/// Deviation of a valence from the regular interior valence of 6.
#[inline]
pub fn valence_deviation(valence: usize) -> usize {
    valence.abs_diff(6)
}

/// Flip edges whose flip strictly lowers the total valence deviation of the
/// four diamond corners. Returns the number flipped.
///
/// A flip is skipped when the opposite corners are already connected or when
/// either endpoint would drop below valence 3.
pub fn flip_to_regular_valence(mesh: &mut HalfEdgeMesh) -> usize {
    let edges: Vec<EdgeId> = mesh.edge_ids().collect();
    let mut flipped = 0;

    for e in edges {
        if should_flip(mesh, e) && mesh.flip_edge(e).is_some() {
            flipped += 1;
        }
    }

    log::debug!("flipped {} edges", flipped);
    flipped
}

fn should_flip(mesh: &HalfEdgeMesh, e: EdgeId) -> bool {
    let Some(d) = mesh.diamond(e) else {
        return false;
    };
    let [v0, v1, v2, v3] = d.vertices;
    if v2 == v3 || mesh.find_halfedge(v2, v3).is_some() {
        return false;
    }

    let [a0, a1, a2, a3] = [v0, v1, v2, v3].map(|v| mesh.valence(v));
    if a0 <= 3 || a1 <= 3 {
        return false;
    }

    let before = valence_deviation(a0)
        + valence_deviation(a1)
        + valence_deviation(a2)
        + valence_deviation(a3);
    let after = valence_deviation(a0 - 1)
        + valence_deviation(a1 - 1)
        + valence_deviation(a2 + 1)
        + valence_deviation(a3 + 1);
    after < before
}

/// Move every interior vertex by `lambda` times the tangential part of the
/// offset to its one-ring centroid.
///
/// New positions are computed from the old ones and written together.
/// Boundary vertices stay put.
pub fn tangential_smooth(mesh: &mut HalfEdgeMesh, lambda: f64) {
    let updates: Vec<(VertexId, Point3<f64>)> = mesh
        .vertex_ids()
        .filter(|&v| !mesh.is_boundary_vertex(v))
        .filter_map(|v| {
            let p = *mesh.position(v);
            let mut sum = Vector3::zeros();
            let mut count = 0usize;
            for n in mesh.vertex_neighbors(v) {
                sum += mesh.position(n).coords;
                count += 1;
            }
            if count == 0 {
                return None;
            }

            let offset = sum / count as f64 - p.coords;
            let normal = mesh.vertex_normal(v);
            let tangential = offset - normal * normal.dot(&offset);
            Some((v, p + tangential * lambda))
        })
        .collect();

    for (v, p) in updates {
        mesh.set_position(v, p);
    }
}
