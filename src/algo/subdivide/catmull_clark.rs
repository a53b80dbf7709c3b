//! Catmull-Clark subdivision for polygon meshes.

use nalgebra::{Point3, Vector3};

use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::HalfEdgeMesh;

use super::SubdivideOptions;

/// Performs Catmull-Clark subdivision.
///
/// Every face of degree n becomes n quads, so an all-quad mesh of F faces
/// has 4F faces after one iteration.
///
/// # Vertex Rules
///
/// - **Face point**: centroid of the face's vertices
/// - **Edge point**: mean of the two endpoints and the two adjacent face points
///   (the midpoint on a boundary edge)
/// - **Vertex point**: (ΣF + 2ΣE + n·S) / 4n where:
///   - ΣF = sum of the incident face points
///   - ΣE = sum of the incident edge points
///   - S = original position
///   - n = valence
///
/// Boundary vertices use the cubic B-spline curve rule along the boundary.
///
/// # Errors
///
/// Returns an error, leaving `mesh` untouched, if the refined soup fails
/// to build.
pub fn catmull_clark_subdivide(mesh: &mut HalfEdgeMesh, options: &SubdivideOptions) -> Result<()> {
    for _ in 0..options.iterations {
        catmull_clark_subdivide_once(mesh)?;
    }
    Ok(())
}

/// Catmull-Clark subdivision with progress reporting.
pub fn catmull_clark_subdivide_with_progress(
    mesh: &mut HalfEdgeMesh,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<()> {
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Catmull-Clark subdivision");
        catmull_clark_subdivide_once(mesh)?;
    }
    progress.report(options.iterations, options.iterations, "Catmull-Clark subdivision");
    Ok(())
}

/// Perform one iteration of Catmull-Clark subdivision.
fn catmull_clark_subdivide_once(mesh: &mut HalfEdgeMesh) -> Result<()> {
    if mesh.num_faces() == 0 {
        return Ok(());
    }

    let numbering = DenseNumbering::new(mesh);

    // Step 1: face points
    let face_points: Vec<Point3<f64>> = mesh.face_ids().map(|f| mesh.face_centroid(f)).collect();

    // Step 2: edge points
    let edge_points = compute_cc_edge_points(mesh, &numbering, &face_points);

    // Step 3: updated vertex positions
    let vertex_points = compute_cc_vertex_points(mesh, &numbering, &face_points, &edge_points);

    // Step 4: new quads
    let (positions, quads) =
        build_cc_subdivided_mesh(mesh, &numbering, vertex_points, face_points, edge_points);

    let refined = HalfEdgeMesh::build(&quads, &positions)?;
    log::debug!(
        "Catmull-Clark: {} faces -> {} quads",
        mesh.num_faces(),
        refined.num_faces()
    );
    *mesh = refined;
    Ok(())
}

/// Dense 0-based numbering of the live elements, skipping tombstones.
struct DenseNumbering {
    vertex: Vec<usize>,
    face: Vec<usize>,
    edge: Vec<usize>,
}

impl DenseNumbering {
    fn new(mesh: &HalfEdgeMesh) -> Self {
        fn number(slots: usize, live: impl Iterator<Item = usize>) -> Vec<usize> {
            let mut map = vec![usize::MAX; slots];
            for (dense, i) in live.enumerate() {
                map[i] = dense;
            }
            map
        }

        Self {
            vertex: number(mesh.vertices.len(), mesh.vertex_ids().map(|v| v.index())),
            face: number(mesh.faces.len(), mesh.face_ids().map(|f| f.index())),
            edge: number(mesh.edges.len(), mesh.edge_ids().map(|e| e.index())),
        }
    }
}

/// Compute edge points for Catmull-Clark subdivision.
fn compute_cc_edge_points(
    mesh: &HalfEdgeMesh,
    numbering: &DenseNumbering,
    face_points: &[Point3<f64>],
) -> Vec<Point3<f64>> {
    mesh.edge_ids()
        .map(|e| {
            let he = mesh.edge(e).halfedge;
            let twin = mesh.twin(he);
            if mesh.is_boundary_edge(e) {
                return mesh.edge_midpoint(e);
            }
            let (a, b) = mesh.edge_vertices(e);
            let fp0 = face_points[numbering.face[mesh.face_of(he).index()]];
            let fp1 = face_points[numbering.face[mesh.face_of(twin).index()]];
            Point3::from(
                (mesh.position(a).coords + mesh.position(b).coords + fp0.coords + fp1.coords) / 4.0,
            )
        })
        .collect()
}

/// Compute updated vertex positions for Catmull-Clark subdivision.
fn compute_cc_vertex_points(
    mesh: &HalfEdgeMesh,
    numbering: &DenseNumbering,
    face_points: &[Point3<f64>],
    edge_points: &[Point3<f64>],
) -> Vec<Point3<f64>> {
    mesh.vertex_ids()
        .map(|v| {
            let pos = *mesh.position(v);

            if mesh.is_boundary_vertex(v) {
                // Regular boundary vertex: 1/8 * (left + right) + 3/4 * v
                let ends: Vec<Vector3<f64>> = mesh
                    .vertex_halfedges(v)
                    .filter(|&he| mesh.is_boundary_edge(mesh.edge_of(he)))
                    .map(|he| mesh.position(mesh.dest(he)).coords)
                    .collect();
                return if ends.len() == 2 {
                    Point3::from((ends[0] + ends[1]) * (1.0 / 8.0) + pos.coords * (3.0 / 4.0))
                } else {
                    pos
                };
            }

            let mut face_sum = Vector3::zeros();
            let mut edge_sum = Vector3::zeros();
            let mut n = 0usize;
            for he in mesh.vertex_halfedges(v) {
                face_sum += face_points[numbering.face[mesh.face_of(he).index()]].coords;
                edge_sum += edge_points[numbering.edge[mesh.edge_of(he).index()]].coords;
                n += 1;
            }
            if n == 0 {
                return pos;
            }

            let n_f = n as f64;
            Point3::from((face_sum + edge_sum * 2.0 + pos.coords * n_f) / (4.0 * n_f))
        })
        .collect()
}

/// Build the subdivided quad soup.
///
/// New vertices are laid out as updated originals, then face points, then
/// edge points.
fn build_cc_subdivided_mesh(
    mesh: &HalfEdgeMesh,
    numbering: &DenseNumbering,
    vertex_points: Vec<Point3<f64>>,
    face_points: Vec<Point3<f64>>,
    edge_points: Vec<Point3<f64>>,
) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let num_original = vertex_points.len();
    let num_face_points = face_points.len();

    let face_point = |f: usize| num_original + f;
    let edge_point = |e: usize| num_original + num_face_points + e;

    let mut quads = Vec::new();
    for f in mesh.face_ids() {
        let fp = face_point(numbering.face[f.index()]);
        let sides: Vec<_> = mesh.face_halfedges(f).collect();
        let n = sides.len();

        // Quad around the corner between side i and side i + 1.
        for i in 0..n {
            let he = sides[i];
            let next = sides[(i + 1) % n];
            quads.push(vec![
                fp,
                edge_point(numbering.edge[mesh.edge_of(he).index()]),
                numbering.vertex[mesh.origin(next).index()],
                edge_point(numbering.edge[mesh.edge_of(next).index()]),
            ]);
        }
    }

    let mut positions = vertex_points;
    positions.extend(face_points);
    positions.extend(edge_points);

    (positions, quads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_quads, build_from_triangles};

    fn create_single_quad() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap()
    }

    fn create_quad_cube() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 4, 7, 3],
            [1, 2, 6, 5],
        ];
        build_from_quads(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_catmull_clark_single_quad() {
        let mut mesh = create_single_quad();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();

        // 4 original + 1 face point + 4 edge points
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_vertices(), 9);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_catmull_clark_quadruples_quads() {
        let mut mesh = create_quad_cube();
        let original_faces = mesh.num_faces();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();

        assert_eq!(mesh.num_faces(), original_faces * 4);
        assert!(mesh.face_ids().all(|f| mesh.face_degree(f) == 4));
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_catmull_clark_two_iterations() {
        let mut mesh = create_quad_cube();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(2)).unwrap();
        assert_eq!(mesh.num_faces(), 96);
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn test_catmull_clark_triangles_become_quads() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mut mesh = build_from_triangles(&vertices, &faces).unwrap();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();

        // 4 triangles -> 12 quads; 4 + 4 + 6 vertices
        assert_eq!(mesh.num_faces(), 12);
        assert_eq!(mesh.num_vertices(), 14);
        assert!(mesh.face_ids().all(|f| mesh.face_degree(f) == 4));
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn test_catmull_clark_vertex_rule() {
        let mut mesh = create_quad_cube();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();

        // Corner at the origin: face points sum to (1,1,1), edge points to
        // (0.75,0.75,0.75), valence 3.
        let expected = 2.5 / 12.0;
        let p = mesh.position(crate::mesh::VertexId::new(0));
        for i in 0..3 {
            assert!((p[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_catmull_clark_zero_iterations() {
        let mut mesh = create_quad_cube();
        catmull_clark_subdivide(&mut mesh, &SubdivideOptions::new(0)).unwrap();
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_vertices(), 8);
    }

    #[test]
    fn test_catmull_clark_with_progress_reports() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = Progress::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut mesh = create_quad_cube();
        catmull_clark_subdivide_with_progress(&mut mesh, &SubdivideOptions::new(2), &progress)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
