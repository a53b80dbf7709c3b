//! File I/O.
//!
//! | What | Module | Format | Load | Save |
//! |------|--------|--------|------|------|
//! | Skeleton | [`skeleton`] | JSON | ✓ | ✓ |
//! | Skin mesh | [`obj`] | Wavefront OBJ | ✗ | ✓ |
//!
//! ```no_run
//! use bonemesh::io::{obj, skeleton};
//! use bonemesh::Session;
//!
//! let tree = skeleton::load("skeleton.json").unwrap();
//! let mut session = Session::from_tree(tree);
//! session.generate().unwrap();
//! obj::save(session.mesh().unwrap(), "skin.obj").unwrap();
//! ```

pub mod obj;
pub mod skeleton;
