//! End-to-end generation from skeleton to refined mesh.

use bonemesh::algo::remesh::RemeshOptions;
use bonemesh::prelude::*;
use bonemesh::skeleton::edge_interpolate;
use nalgebra::Point3;

fn y_skeleton() -> SkeletalTree {
    let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
    let root = tree.root().unwrap();
    tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
    tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
    tree
}

fn assert_closed_sphere(mesh: &HalfEdgeMesh) {
    assert!(mesh.is_valid());
    assert!(mesh.is_closed());
    assert_eq!(mesh.num_boundary_halfedges(), 0);
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn y_skeleton_generates_closed_mesh() {
    let mut session = Session::from_tree(y_skeleton());
    assert!(session.generate().unwrap().is_mesh());

    let tree = session.tree();
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.node_ids().filter(|&id| tree.node(id).interpolated).count(), 4);

    assert_closed_sphere(session.mesh().unwrap());
}

#[test]
fn interpolated_radii_shrink_towards_tips() {
    let mut tree = y_skeleton();
    interpolate(&mut tree);
    let root = tree.root().unwrap();

    // Root seed first, then the tangent recurrence towards the leaf.
    let d = 1.5 * 2.0_f64.sqrt();
    let r1 = edge_interpolate(0.5, 0.3, d);
    let t1 = 0.5 + r1;
    let r2 = edge_interpolate(r1, 0.3, d - t1);
    let t2 = t1 + r1 + r2;
    assert!(0.3 < r2 && r2 < r1 && r1 < 0.5);

    for &first in tree.children(root) {
        let second = tree.children(first)[0];
        let (a, b) = (tree.node(first), tree.node(second));
        assert!(a.interpolated && b.interpolated);
        assert!((a.position.coords.norm() - t1).abs() < 1e-9);
        assert!((a.radius - r1).abs() < 1e-9);
        assert!((b.position.coords.norm() - t2).abs() < 1e-9);
        assert!((b.radius - r2).abs() < 1e-9);
    }
}

#[test]
fn subdivide_then_remesh_keeps_topology() {
    let mut session = Session::from_tree(y_skeleton());
    session.generate().unwrap();
    let mesh = session.mesh().unwrap();
    let corners: usize = mesh.face_ids().map(|f| mesh.face_degree(f)).sum();

    // One quad per face corner, then four per quad.
    session.subdivide(2).unwrap();
    let mesh = session.mesh().unwrap();
    assert_eq!(mesh.num_faces(), corners * 4);
    assert!(mesh.face_ids().all(|f| mesh.face_degree(f) == 4));
    assert_closed_sphere(mesh);

    let options = RemeshOptions::default()
        .with_iterations(2)
        .with_triangulate(true)
        .with_merge(MergePosition::Midpoint);
    session.remesh(&options).unwrap();
    let mesh = session.mesh().unwrap();
    assert!(mesh.face_ids().all(|f| mesh.is_triangle(f)));
    assert_closed_sphere(mesh);
}

#[test]
fn chain_of_joints_generates_closed_mesh() {
    let mut tree = SkeletalTree::with_root(Point3::origin(), 0.4);
    let root = tree.root().unwrap();
    let spine = tree.add_child(root, Point3::new(0.0, 2.0, 0.0), 0.4);
    tree.add_child(root, Point3::new(0.0, -2.0, 0.0), 0.3);
    tree.add_child(spine, Point3::new(-1.5, 3.5, 0.0), 0.25);
    tree.add_child(spine, Point3::new(1.5, 3.5, 0.0), 0.25);

    let mut session = Session::from_tree(tree);
    session.generate().unwrap();
    assert_closed_sphere(session.mesh().unwrap());
}

#[test]
fn lone_sphere_generates_box() {
    let mut session = Session::from_tree(SkeletalTree::with_root(Point3::origin(), 1.0));
    session.generate().unwrap();
    let mesh = session.mesh().unwrap();
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.num_faces(), 6);
    assert_closed_sphere(mesh);
}

#[test]
fn editing_and_regenerating() {
    let mut session = Session::with_seed(11);
    session.create().unwrap();
    session.set_selected_radius(0.5).unwrap();
    for _ in 0..10 {
        session.extrude().unwrap();
    }
    assert_eq!(session.tree().len(), 11);

    session.generate().unwrap();
    assert_closed_sphere(session.mesh().unwrap());
}
