//! Arena-backed tree of spheres.
//!
//! Nodes live in a flat `Vec` of slots addressed by [`NodeId`]. Parent and
//! child links are ids into the same arena, so the arena is the only record
//! of which nodes exist; "all nodes" is an iteration over live slots. Freed
//! slots are recycled by later insertions.

use std::fmt::{self, Debug};

use nalgebra::{Point3, Vector3};
use rand::Rng;

/// Smallest radius a node may be given.
pub const MIN_RADIUS: f64 = 0.01;

/// Radius of a root created without a parent to copy from.
pub const DEFAULT_RADIUS: f64 = 0.25;

/// Length of the offset from a node to its extruded child.
pub const EXTRUDE_STEP: f64 = 0.08;

/// A type-safe skeleton node index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node id from a raw slot index.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "index {} too large for u32", index);
        Self(index as u32)
    }

    /// Get the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N({})", self.0)
    }
}

/// Structural role of a node, by child count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// No children.
    Leaf,
    /// Exactly one child.
    Limb,
    /// Two or more children.
    Joint,
}

/// A sphere in the skeleton.
#[derive(Debug, Clone)]
pub struct SkeletalNode {
    /// Sphere center.
    pub position: Point3<f64>,
    /// Sphere radius, at least [`MIN_RADIUS`].
    pub radius: f64,
    /// True for synthetic spheres inserted by interpolation.
    pub interpolated: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SkeletalNode {
    fn new(position: Point3<f64>, radius: f64, parent: Option<NodeId>) -> Self {
        Self {
            position,
            radius,
            interpolated: false,
            parent,
            children: Vec::new(),
        }
    }

    /// The parent, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Leaf, limb or joint.
    pub fn kind(&self) -> NodeKind {
        match self.children.len() {
            0 => NodeKind::Leaf,
            1 => NodeKind::Limb,
            _ => NodeKind::Joint,
        }
    }
}

/// A rooted tree of spheres with a current selection.
#[derive(Debug, Clone, Default)]
pub struct SkeletalTree {
    slots: Vec<Option<SkeletalNode>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    selected: Option<NodeId>,
}

impl SkeletalTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree holding a single root sphere.
    pub fn with_root(position: Point3<f64>, radius: f64) -> Self {
        let mut tree = Self::new();
        let root = tree.alloc(SkeletalNode::new(position, radius.max(MIN_RADIUS), None));
        tree.root = Some(root);
        tree
    }

    // ==================== Queries ====================

    /// Number of live nodes, interpolated ones included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True if `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&SkeletalNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    #[inline]
    pub fn node(&self, id: NodeId) -> &SkeletalNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("skeleton node {:?} does not exist", id),
        }
    }

    /// Get a node mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut SkeletalNode {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("skeleton node {:?} does not exist", id),
        }
    }

    /// Parent of a node.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Structural role of a node.
    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    /// Number of links between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(p) = self.parent(current) {
            depth += 1;
            current = p;
        }
        depth
    }

    /// Live node ids in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeId::new(i))
    }

    /// Nodes reachable from the root, parents before children, siblings in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Check parent/child symmetry, a single root and that every live node is
    /// reachable from it.
    pub fn is_consistent(&self) -> bool {
        let Some(root) = self.root else {
            return self.len() == 0;
        };
        if !self.contains(root) || self.parent(root).is_some() {
            return false;
        }
        for id in self.node_ids() {
            let node = self.node(id);
            if let Some(p) = node.parent {
                if !self.contains(p) || !self.children(p).contains(&id) {
                    return false;
                }
            } else if id != root {
                return false;
            }
            for &c in &node.children {
                if !self.contains(c) || self.parent(c) != Some(id) {
                    return false;
                }
            }
        }
        self.preorder().len() == self.len()
    }

    // ==================== Edits ====================

    fn alloc(&mut self, node: SkeletalNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId::new(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.slots[id.index()] = None;
        self.free.push(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Append a new child to `parent`, copying its position and radius.
    ///
    /// With `parent == None` the new node becomes the root; an existing root
    /// becomes its only child.
    pub fn create_after(&mut self, parent: Option<NodeId>) -> NodeId {
        match parent {
            Some(p) => {
                let (position, radius) = {
                    let node = self.node(p);
                    (node.position, node.radius)
                };
                self.add_child(p, position, radius)
            }
            None => {
                let (position, radius) = match self.root {
                    Some(r) => (self.node(r).position, self.node(r).radius),
                    None => (Point3::origin(), DEFAULT_RADIUS),
                };
                let id = self.alloc(SkeletalNode::new(position, radius, None));
                if let Some(old) = self.root.replace(id) {
                    self.node_mut(old).parent = Some(id);
                    self.node_mut(id).children.push(old);
                }
                id
            }
        }
    }

    /// Append a child with the given sphere.
    pub fn add_child(&mut self, parent: NodeId, position: Point3<f64>, radius: f64) -> NodeId {
        let id = self.alloc(SkeletalNode::new(position, radius.max(MIN_RADIUS), Some(parent)));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Create a child a short step beyond `id`, continuing the direction
    /// from its parent. Returns `None` for interpolated nodes.
    pub fn extrude(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        if node.interpolated {
            return None;
        }
        let offset = node
            .parent
            .and_then(|p| (node.position - self.node(p).position).try_normalize(f64::EPSILON))
            .map(|dir| dir * EXTRUDE_STEP)
            .unwrap_or_else(|| Vector3::new(0.05, 0.05, 0.05));

        let position = node.position + offset;
        let radius = node.radius;
        Some(self.add_child(id, position, radius))
    }

    /// Insert an interpolated sphere on the link `parent → child`, taking the
    /// child's slot in the parent's child list.
    pub(crate) fn insert_between(
        &mut self,
        parent: NodeId,
        child: NodeId,
        position: Point3<f64>,
        radius: f64,
    ) -> NodeId {
        let mut node = SkeletalNode::new(position, radius, Some(parent));
        node.interpolated = true;
        node.children.push(child);
        let id = self.alloc(node);

        let slot = self
            .children(parent)
            .iter()
            .position(|&c| c == child);
        match slot {
            Some(i) => self.node_mut(parent).children[i] = id,
            None => panic!("{:?} is not a child of {:?}", child, parent),
        }
        self.node_mut(child).parent = Some(id);
        id
    }

    /// Move a node.
    pub fn set_position(&mut self, id: NodeId, position: Point3<f64>) {
        self.node_mut(id).position = position;
    }

    /// Resize a node, clamping to [`MIN_RADIUS`].
    pub fn set_radius(&mut self, id: NodeId, radius: f64) {
        self.node_mut(id).radius = radius.max(MIN_RADIUS);
    }

    /// Remove a node.
    ///
    /// A non-root node is spliced out: its children take its place, in
    /// order, in its parent's child list. Deleting the root first re-roots
    /// the tree at its first real (non-interpolated) descendant in preorder
    /// by reversing the links along the path to it; with no such descendant
    /// the whole tree is cleared.
    ///
    /// Returns `false` if `id` is not a live node.
    pub fn delete(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.root == Some(id) {
            let target = self
                .preorder()
                .into_iter()
                .skip(1)
                .find(|&n| !self.node(n).interpolated);
            match target {
                Some(target) => self.reroot(target),
                None => {
                    log::debug!("deleting root {:?} clears the skeleton", id);
                    self.clear();
                    return true;
                }
            }
        }
        self.splice_out(id);
        true
    }

    fn splice_out(&mut self, id: NodeId) {
        let node = self.node(id).clone();
        let Some(parent) = node.parent else {
            panic!("cannot splice out the root {:?}", id);
        };
        for &c in &node.children {
            self.node_mut(c).parent = Some(parent);
        }
        let siblings = &mut self.node_mut(parent).children;
        if let Some(i) = siblings.iter().position(|&c| c == id) {
            siblings.splice(i..=i, node.children.iter().copied());
        }
        self.release(id);
    }

    /// Make `target` the root by reversing every link on the path to it.
    fn reroot(&mut self, target: NodeId) {
        let mut path = vec![target];
        let mut current = target;
        while let Some(p) = self.parent(current) {
            path.push(p);
            current = p;
        }
        path.reverse();

        for pair in path.windows(2) {
            let (upper, lower) = (pair[0], pair[1]);
            self.node_mut(upper).children.retain(|&c| c != lower);
            self.node_mut(upper).parent = Some(lower);
            self.node_mut(lower).children.push(upper);
        }
        self.node_mut(target).parent = None;
        self.root = Some(target);
        log::debug!("re-rooted skeleton at {:?}", target);
    }

    /// Splice out every interpolated node. Returns how many were removed.
    pub fn remove_interpolated(&mut self) -> usize {
        let doomed: Vec<NodeId> = self
            .node_ids()
            .filter(|&id| self.node(id).interpolated && self.root != Some(id))
            .collect();
        for &id in &doomed {
            self.splice_out(id);
        }
        doomed.len()
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.selected = None;
    }

    // ==================== Selection ====================

    /// The selected node.
    #[inline]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Select a node, or clear the selection with `None`.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|&n| self.contains(n));
    }

    /// Move the selection to another sibling.
    ///
    /// The step from the current sibling is drawn from `rng`, so repeated
    /// calls wander among siblings. A node without siblings keeps the
    /// selection.
    pub fn select_next<R: Rng>(&mut self, rng: &mut R) -> Option<NodeId> {
        let current = self.selected?;
        let Some(parent) = self.parent(current) else {
            return Some(current);
        };
        let siblings = self.children(parent);
        let n = siblings.len();
        if n > 1 {
            let i = siblings.iter().position(|&c| c == current).unwrap_or(0);
            let step = rng.gen_range(1..n);
            self.selected = Some(siblings[(i + step) % n]);
        }
        self.selected
    }

    /// Move the selection to the parent; a no-op at the root.
    pub fn select_parent(&mut self) -> Option<NodeId> {
        let current = self.selected?;
        if let Some(p) = self.parent(current) {
            self.selected = Some(p);
        }
        self.selected
    }

    /// Move the selection to the first child; a no-op at a leaf.
    pub fn select_child(&mut self) -> Option<NodeId> {
        let current = self.selected?;
        if let Some(&c) = self.children(current).first() {
            self.selected = Some(c);
        }
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// root -> a -> b, root -> c
    fn small_tree() -> (SkeletalTree, [NodeId; 4]) {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
        let root = tree.root().unwrap();
        let a = tree.add_child(root, Point3::new(1.0, 0.0, 0.0), 0.3);
        let b = tree.add_child(a, Point3::new(2.0, 0.0, 0.0), 0.2);
        let c = tree.add_child(root, Point3::new(0.0, 1.0, 0.0), 0.3);
        (tree, [root, a, b, c])
    }

    #[test]
    fn test_create_after_copies_parent() {
        let mut tree = SkeletalTree::new();
        let root = tree.create_after(None);
        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.node(root).radius, DEFAULT_RADIUS);

        tree.set_radius(root, 0.7);
        let child = tree.create_after(Some(root));
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.node(child).radius, 0.7);
        assert_eq!(tree.children(root), &[child]);
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_create_root_over_existing_root() {
        let (mut tree, [root, ..]) = small_tree();
        let new_root = tree.create_after(None);
        assert_eq!(tree.root(), Some(new_root));
        assert_eq!(tree.children(new_root), &[root]);
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_kinds_and_depth() {
        let (tree, [root, a, b, c]) = small_tree();
        assert_eq!(tree.kind(root), NodeKind::Joint);
        assert_eq!(tree.kind(a), NodeKind::Limb);
        assert_eq!(tree.kind(b), NodeKind::Leaf);
        assert_eq!(tree.kind(c), NodeKind::Leaf);
        assert_eq!(tree.depth(root), 0);
        assert_eq!(tree.depth(b), 2);
    }

    #[test]
    fn test_preorder() {
        let (tree, [root, a, b, c]) = small_tree();
        assert_eq!(tree.preorder(), vec![root, a, b, c]);
    }

    #[test]
    fn test_delete_splices_children_in_place() {
        let (mut tree, [root, a, b, c]) = small_tree();
        assert!(tree.delete(a));

        assert!(!tree.contains(a));
        assert_eq!(tree.children(root), &[b, c]);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.len(), 3);
        assert!(tree.is_consistent());
        assert!(!tree.delete(a));
    }

    #[test]
    fn test_delete_root_reroots() {
        let (mut tree, [root, a, b, c]) = small_tree();
        assert!(tree.delete(root));

        assert_eq!(tree.root(), Some(a));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.children(a), &[b, c]);
        assert_eq!(tree.parent(c), Some(a));
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_delete_root_skips_interpolated() {
        let (mut tree, [root, a, ..]) = small_tree();
        let mid = tree.insert_between(root, a, Point3::new(0.5, 0.0, 0.0), 0.2);
        assert!(tree.delete(root));

        // `a` becomes root, the interpolated node hangs below it.
        assert_eq!(tree.root(), Some(a));
        assert!(tree.contains(mid));
        assert_eq!(tree.parent(mid), Some(a));
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_delete_lone_root_clears() {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 1.0);
        let root = tree.root().unwrap();
        assert!(tree.delete(root));
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_insert_between_and_remove() {
        let (mut tree, [root, a, b, c]) = small_tree();
        let m1 = tree.insert_between(root, a, Point3::new(0.3, 0.0, 0.0), 0.4);
        let m2 = tree.insert_between(m1, a, Point3::new(0.6, 0.0, 0.0), 0.35);

        assert_eq!(tree.children(root), &[m1, c]);
        assert_eq!(tree.children(m1), &[m2]);
        assert_eq!(tree.parent(a), Some(m2));
        assert!(tree.is_consistent());

        assert_eq!(tree.remove_interpolated(), 2);
        assert_eq!(tree.children(root), &[a, c]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.children(a), &[b]);
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_slots_are_recycled() {
        let (mut tree, [root, a, ..]) = small_tree();
        let m = tree.insert_between(root, a, Point3::new(0.5, 0.0, 0.0), 0.2);
        tree.remove_interpolated();
        let again = tree.insert_between(root, a, Point3::new(0.5, 0.0, 0.0), 0.2);
        assert_eq!(m, again);
    }

    #[test]
    fn test_set_radius_clamps() {
        let (mut tree, [root, ..]) = small_tree();
        tree.set_radius(root, -1.0);
        assert_eq!(tree.node(root).radius, MIN_RADIUS);
    }

    #[test]
    fn test_extrude_follows_parent_direction() {
        let (mut tree, [root, a, b, _]) = small_tree();
        let e = tree.extrude(b).unwrap();
        let p = tree.node(e).position;
        assert!((p - Point3::new(2.0 + EXTRUDE_STEP, 0.0, 0.0)).norm() < 1e-12);
        assert_eq!(tree.parent(e), Some(b));

        let r = tree.extrude(root).unwrap();
        let p = tree.node(r).position;
        assert!((p - Point3::new(0.05, 0.05, 0.05)).norm() < 1e-12);

        let m = tree.insert_between(root, a, Point3::new(0.5, 0.0, 0.0), 0.2);
        assert!(tree.extrude(m).is_none());
    }

    #[test]
    fn test_selection_navigation() {
        let (mut tree, [root, a, b, c]) = small_tree();
        let mut rng = StdRng::seed_from_u64(7);

        tree.select(Some(root));
        assert_eq!(tree.select_parent(), Some(root));
        assert_eq!(tree.select_next(&mut rng), Some(root));
        assert_eq!(tree.select_child(), Some(a));
        assert_eq!(tree.select_next(&mut rng), Some(c));
        assert_eq!(tree.select_next(&mut rng), Some(a));
        assert_eq!(tree.select_child(), Some(b));
        assert_eq!(tree.select_child(), Some(b));
        assert_eq!(tree.select_parent(), Some(a));
    }

    #[test]
    fn test_select_next_never_stays_among_many() {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 1.0);
        let root = tree.root().unwrap();
        let kids: Vec<_> = (0..4)
            .map(|i| tree.add_child(root, Point3::new(i as f64, 1.0, 0.0), 0.2))
            .collect();
        let mut rng = StdRng::seed_from_u64(1);

        tree.select(Some(kids[0]));
        for _ in 0..20 {
            let before = tree.selected();
            let after = tree.select_next(&mut rng);
            assert_ne!(before, after);
            assert!(kids.contains(&after.unwrap()));
        }
    }

    #[test]
    fn test_deleting_selected_clears_selection() {
        let (mut tree, [_, a, ..]) = small_tree();
        tree.select(Some(a));
        tree.delete(a);
        assert_eq!(tree.selected(), None);
    }
}
