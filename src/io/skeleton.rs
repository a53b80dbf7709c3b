//! Skeleton persistence as JSON.
//!
//! The file lists every real sphere once:
//!
//! ```json
//! {
//!   "count": 2,
//!   "spheres": [
//!     { "index": 0, "radius": 0.5, "pos": [0.0, 0.0, 0.0], "parent": -1, "children": [1] },
//!     { "index": 1, "radius": 0.3, "pos": [0.0, 1.0, 0.0], "parent": 0, "children": [] }
//!   ]
//! }
//! ```
//!
//! Interpolated spheres are not saved; a link that runs through them is
//! written as a direct link between the real spheres at either end.
//! Interpolation recreates them on the next generation.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::skeleton::{NodeId, SkeletalTree};

/// On-disk form of a skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonFile {
    /// Number of entries in `spheres`.
    pub count: usize,
    /// The spheres, root first.
    pub spheres: Vec<SphereRecord>,
}

/// One persisted sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereRecord {
    /// Index referenced by `parent` and `children`.
    pub index: usize,
    /// Sphere radius.
    pub radius: f64,
    /// Sphere center.
    pub pos: [f64; 3],
    /// Parent index, or -1 for the root.
    pub parent: i64,
    /// Child indices in order.
    pub children: Vec<usize>,
}

fn invalid(message: String) -> Error {
    Error::InvalidSkeleton(message)
}

impl SkeletonFile {
    /// Capture the real spheres of `tree`, numbered in preorder.
    pub fn from_tree(tree: &SkeletalTree) -> Self {
        let Some(root) = tree.root() else {
            return Self {
                count: 0,
                spheres: Vec::new(),
            };
        };
        let saved = |id: NodeId| id == root || !tree.node(id).interpolated;

        let order: Vec<NodeId> = tree.preorder().into_iter().filter(|&id| saved(id)).collect();
        let index: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let spheres = order
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let node = tree.node(id);
                let mut parent = node.parent();
                while let Some(p) = parent.filter(|&p| !saved(p)) {
                    parent = tree.parent(p);
                }
                SphereRecord {
                    index: i,
                    radius: node.radius,
                    pos: [node.position.x, node.position.y, node.position.z],
                    parent: parent.map_or(-1, |p| index[&p] as i64),
                    children: real_children(tree, id, &saved)
                        .into_iter()
                        .map(|c| index[&c])
                        .collect(),
                }
            })
            .collect::<Vec<_>>();

        Self {
            count: spheres.len(),
            spheres,
        }
    }

    /// Rebuild a tree, checking that the records describe one.
    ///
    /// Fails with [`Error::InvalidSkeleton`] if `count` disagrees with the
    /// record list, an index is repeated or dangling, there is not exactly
    /// one root, a sphere is not finite or has a non-positive radius, or the
    /// parent and children links disagree or leave spheres unreachable.
    pub fn to_tree(&self) -> Result<SkeletalTree> {
        if self.count != self.spheres.len() {
            return Err(invalid(format!(
                "count is {} but {} spheres are listed",
                self.count,
                self.spheres.len()
            )));
        }
        if self.spheres.is_empty() {
            return Ok(SkeletalTree::new());
        }

        let mut records: HashMap<usize, &SphereRecord> = HashMap::with_capacity(self.count);
        for record in &self.spheres {
            if records.insert(record.index, record).is_some() {
                return Err(invalid(format!("index {} is used twice", record.index)));
            }
            if !(record.radius > 0.0 && record.radius.is_finite()) {
                return Err(invalid(format!(
                    "sphere {} has radius {}",
                    record.index, record.radius
                )));
            }
            if record.pos.iter().any(|c| !c.is_finite()) {
                return Err(invalid(format!("sphere {} has a non-finite position", record.index)));
            }
        }

        let roots: Vec<&SphereRecord> = self.spheres.iter().filter(|r| r.parent == -1).collect();
        let root = match roots.as_slice() {
            [root] => *root,
            _ => return Err(invalid(format!("expected one root, found {}", roots.len()))),
        };

        for record in &self.spheres {
            if record.parent < -1 {
                return Err(invalid(format!(
                    "sphere {} has parent {}",
                    record.index, record.parent
                )));
            }
            if record.parent >= 0 {
                let parent = records.get(&(record.parent as usize)).ok_or_else(|| {
                    invalid(format!(
                        "sphere {} has missing parent {}",
                        record.index, record.parent
                    ))
                })?;
                if !parent.children.contains(&record.index) {
                    return Err(invalid(format!(
                        "sphere {} is not among the children of its parent {}",
                        record.index, parent.index
                    )));
                }
            }
        }

        let position = |r: &SphereRecord| Point3::new(r.pos[0], r.pos[1], r.pos[2]);
        let mut tree = SkeletalTree::with_root(position(root), root.radius);
        let root_id = tree.root().ok_or_else(|| invalid("root was not created".into()))?;

        let mut reached: HashSet<usize> = HashSet::from([root.index]);
        let mut stack = vec![(root, root_id)];
        while let Some((record, id)) = stack.pop() {
            for &c in &record.children {
                let child = records
                    .get(&c)
                    .copied()
                    .ok_or_else(|| invalid(format!("sphere {} has missing child {}", record.index, c)))?;
                if child.parent != record.index as i64 {
                    return Err(invalid(format!(
                        "sphere {} lists child {} whose parent is {}",
                        record.index, c, child.parent
                    )));
                }
                if !reached.insert(c) {
                    return Err(invalid(format!("sphere {} is reached twice", c)));
                }
                let child_id = tree.add_child(id, position(child), child.radius);
                stack.push((child, child_id));
            }
        }

        if reached.len() != self.count {
            return Err(invalid(format!(
                "{} of {} spheres are unreachable from the root",
                self.count - reached.len(),
                self.count
            )));
        }
        Ok(tree)
    }
}

/// Nearest saved descendants of `id`, looking through unsaved nodes.
fn real_children(
    tree: &SkeletalTree,
    id: NodeId,
    saved: &impl Fn(NodeId) -> bool,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &c in tree.children(id) {
        if saved(c) {
            out.push(c);
        } else {
            out.extend(real_children(tree, c, saved));
        }
    }
    out
}

/// Serialize the real spheres of a tree to pretty-printed JSON.
pub fn to_json(tree: &SkeletalTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SkeletonFile::from_tree(tree))?)
}

/// Parse and validate a skeleton from JSON.
pub fn from_json(json: &str) -> Result<SkeletalTree> {
    let file: SkeletonFile = serde_json::from_str(json)?;
    file.to_tree()
}

/// Save a skeleton to a JSON file.
pub fn save<P: AsRef<Path>>(tree: &SkeletalTree, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let skeleton = SkeletonFile::from_tree(tree);
    serde_json::to_writer_pretty(&mut writer, &skeleton)?;
    writer.flush()?;
    log::info!(
        "saved {} spheres to {}",
        skeleton.count,
        path.as_ref().display()
    );
    Ok(())
}

/// Load a skeleton from a JSON file.
///
/// # Example
///
/// ```no_run
/// use bonemesh::io::skeleton;
///
/// let tree = skeleton::load("skeleton.json").unwrap();
/// println!("{} spheres", tree.len());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<SkeletalTree> {
    let file = File::open(path.as_ref())?;
    let skeleton: SkeletonFile = serde_json::from_reader(BufReader::new(file))?;
    let tree = skeleton.to_tree()?;
    log::info!("loaded {} spheres from {}", tree.len(), path.as_ref().display());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::interpolate;

    fn y_tree() -> SkeletalTree {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
        let root = tree.root().unwrap();
        tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
        tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
        tree
    }

    fn record(index: usize, parent: i64, children: Vec<usize>) -> SphereRecord {
        SphereRecord {
            index,
            radius: 0.5,
            pos: [index as f64, 0.0, 0.0],
            parent,
            children,
        }
    }

    #[test]
    fn test_schema_field_names() {
        let json = to_json(&y_tree()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["count"], 3);
        assert_eq!(value["spheres"][0]["parent"], -1);
        assert_eq!(value["spheres"][0]["children"], serde_json::json!([1, 2]));
        assert_eq!(value["spheres"][1]["pos"], serde_json::json!([-1.5, 1.5, 0.0]));
        assert_eq!(value["spheres"][2]["radius"], 0.3);
    }

    #[test]
    fn test_round_trip() {
        let tree = y_tree();
        let loaded = from_json(&to_json(&tree).unwrap()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.is_consistent());
        let root = loaded.root().unwrap();
        let children = loaded.children(root);
        assert_eq!(children.len(), 2);
        assert_eq!(loaded.node(children[1]).position, Point3::new(1.5, 1.5, 0.0));
    }

    #[test]
    fn test_interpolated_spheres_are_skipped() {
        let mut tree = y_tree();
        assert_eq!(interpolate(&mut tree), 4);
        assert_eq!(tree.len(), 7);

        let file = SkeletonFile::from_tree(&tree);
        assert_eq!(file.count, 3);
        assert_eq!(file.spheres[0].children, vec![1, 2]);
        assert_eq!(file.spheres[1].parent, 0);
        assert_eq!(file.spheres[2].parent, 0);
        assert_eq!(file, SkeletonFile::from_tree(&y_tree()));
    }

    #[test]
    fn test_empty_tree() {
        let json = to_json(&SkeletalTree::new()).unwrap();
        assert!(from_json(&json).unwrap().is_empty());
    }

    #[test]
    fn test_records_in_any_order() {
        let file = SkeletonFile {
            count: 3,
            spheres: vec![record(7, 3, vec![]), record(3, -1, vec![5, 7]), record(5, 3, vec![])],
        };
        let tree = file.to_tree().unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).position.x, 3.0);
        let xs: Vec<f64> = tree
            .children(root)
            .iter()
            .map(|&c| tree.node(c).position.x)
            .collect();
        assert_eq!(xs, vec![5.0, 7.0]);
    }

    #[test]
    fn test_rejects_bad_count() {
        let file = SkeletonFile {
            count: 2,
            spheres: vec![record(0, -1, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_two_roots() {
        let file = SkeletonFile {
            count: 2,
            spheres: vec![record(0, -1, vec![]), record(1, -1, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_duplicate_index() {
        let file = SkeletonFile {
            count: 2,
            spheres: vec![record(0, -1, vec![0]), record(0, 0, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_asymmetric_links() {
        let file = SkeletonFile {
            count: 2,
            spheres: vec![record(0, -1, vec![]), record(1, 0, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));

        let file = SkeletonFile {
            count: 3,
            spheres: vec![record(0, -1, vec![1, 2]), record(1, 0, vec![]), record(2, 1, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_detached_cycle() {
        let file = SkeletonFile {
            count: 3,
            spheres: vec![record(0, -1, vec![]), record(1, 2, vec![2]), record(2, 1, vec![1])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_repeated_child() {
        let file = SkeletonFile {
            count: 3,
            spheres: vec![record(0, -1, vec![1, 1]), record(1, 0, vec![]), record(2, 0, vec![])],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_rejects_bad_radius() {
        let mut bad = record(0, -1, vec![]);
        bad.radius = 0.0;
        let file = SkeletonFile {
            count: 1,
            spheres: vec![bad],
        };
        assert!(matches!(file.to_tree(), Err(Error::InvalidSkeleton(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(from_json("{\"count\": 1}"), Err(Error::Json(_))));
    }
}
