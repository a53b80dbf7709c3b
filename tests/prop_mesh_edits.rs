use bonemesh::mesh::{build_from_triangles, EdgeId, HalfEdgeMesh};
use nalgebra::Point3;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Edit {
    Flip(usize),
    Split(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        any::<usize>().prop_map(Edit::Flip),
        any::<usize>().prop_map(Edit::Split),
    ]
}

fn octahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// A flip that keeps the mesh a simplicial surface.
fn can_flip(mesh: &HalfEdgeMesh, e: EdgeId) -> bool {
    let Some(d) = mesh.diamond(e) else {
        return false;
    };
    let [v0, v1, v2, v3] = d.vertices;
    v2 != v3
        && mesh.find_halfedge(v2, v3).is_none()
        && mesh.valence(v0) > 3
        && mesh.valence(v1) > 3
}

fn pick(mesh: &HalfEdgeMesh, n: usize) -> EdgeId {
    let edges: Vec<EdgeId> = mesh.edge_ids().collect();
    edges[n % edges.len()]
}

fn assert_twin_next_invariants(mesh: &HalfEdgeMesh) -> Result<(), TestCaseError> {
    prop_assert!(mesh.is_valid());
    for h in mesh.halfedge_ids() {
        prop_assert_eq!(mesh.twin(mesh.twin(h)), h);
        prop_assert_eq!(mesh.origin(mesh.twin(h)), mesh.dest(h));
        prop_assert_eq!(mesh.prev(mesh.next(h)), h);
        prop_assert_eq!(mesh.face_of(mesh.next(h)), mesh.face_of(h));
    }
    Ok(())
}

proptest! {
    #[test]
    fn edits_keep_connectivity_consistent(edits in prop::collection::vec(edit(), 1..40)) {
        let mut mesh = octahedron();
        for edit in edits {
            match edit {
                Edit::Flip(n) => {
                    let e = pick(&mesh, n);
                    if can_flip(&mesh, e) {
                        prop_assert_eq!(mesh.flip_edge(e), Some(e));
                    }
                }
                Edit::Split(n) => {
                    let e = pick(&mesh, n);
                    prop_assert!(mesh.split_edge(e).is_some());
                }
            }
            assert_twin_next_invariants(&mesh)?;
        }

        prop_assert!(mesh.is_closed());
        prop_assert_eq!(mesh.euler_characteristic(), 2);
        prop_assert!(mesh.face_ids().all(|f| mesh.is_triangle(f)));
    }

    #[test]
    fn split_then_collapse_restores_counts(n in any::<usize>()) {
        let mut mesh = octahedron();
        let (vertices, faces) = (mesh.num_vertices(), mesh.num_faces());

        let e = pick(&mesh, n);
        let v = mesh.split_edge(e).unwrap();
        prop_assert_eq!(mesh.num_faces(), faces + 2);

        let spoke = mesh
            .vertex_halfedges(v)
            .map(|h| mesh.edge_of(h))
            .find(|&s| mesh.can_collapse(s));
        prop_assert!(spoke.is_some());
        prop_assert!(mesh.collapse_edge(spoke.unwrap()).is_some());
        mesh.compact();

        prop_assert_eq!(mesh.num_vertices(), vertices);
        prop_assert_eq!(mesh.num_faces(), faces);
        assert_twin_next_invariants(&mesh)?;
    }
}
