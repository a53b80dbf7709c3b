use bonemesh::skeleton::{edge_interpolate, interpolate, SkeletalTree};
use nalgebra::Point3;
use proptest::prelude::*;

fn radius() -> impl Strategy<Value = f64> {
    0.01f64..5.0
}

proptest! {
    #[test]
    fn tangent_radius_is_positive_and_finite(r1 in radius(), r2 in radius(), gap in 0.001f64..50.0) {
        let d = r1 + r2 + gap;
        let r3 = edge_interpolate(r1, r2, d);
        prop_assert!(r3.is_finite());
        prop_assert!(r3 > 0.0);
    }

    #[test]
    fn tangent_radius_lies_between_endpoints(a in radius(), b in radius(), gap in 0.001f64..50.0) {
        let (r1, r2) = if a >= b { (a, b) } else { (b, a) };
        let r3 = edge_interpolate(r1, r2, r1 + r2 + gap);
        prop_assert!(r3 <= r1 * (1.0 + 1e-12));
        prop_assert!(r3 >= r2 * (1.0 - 1e-12));
    }

    #[test]
    fn interpolated_spheres_touch_their_neighbours(
        r1 in 0.1f64..1.0,
        r2 in 0.1f64..1.0,
        length in 0.5f64..20.0,
    ) {
        let mut tree = SkeletalTree::with_root(Point3::origin(), r1);
        let root = tree.root().unwrap();
        tree.add_child(root, Point3::new(0.0, length, 0.0), r2);
        interpolate(&mut tree);
        prop_assert!(tree.is_consistent());

        let chain = tree.preorder();
        for pair in chain.windows(2) {
            let (a, b) = (tree.node(pair[0]), tree.node(pair[1]));
            if b.interpolated {
                let d = (b.position - a.position).norm();
                prop_assert!((d - (a.radius + b.radius)).abs() < 1e-9);
            }
            prop_assert!(b.position.y > a.position.y);
        }

        let again = tree.clone();
        interpolate(&mut tree);
        prop_assert_eq!(tree.len(), again.len());
    }
}
