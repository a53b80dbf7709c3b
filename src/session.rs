//! Editing session: a skeleton, its generated surface and the commands that
//! move between them.
//!
//! A [`Session`] is what a front-end drives. It owns the [`SkeletalTree`]
//! being edited and the [`Surface`] last generated from it. The surface only
//! changes on [`generate`](Session::generate) and the refinement commands;
//! editing the tree leaves the previous surface in place until the next
//! generation.
//!
//! # Example
//!
//! ```
//! use bonemesh::algo::remesh::RemeshOptions;
//! use bonemesh::skeleton::SkeletalTree;
//! use bonemesh::Session;
//! use nalgebra::Point3;
//!
//! let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
//! let root = tree.root().unwrap();
//! tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
//! tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
//!
//! let mut session = Session::from_tree(tree);
//! session.generate().unwrap();
//! session.subdivide(1).unwrap();
//! session.remesh(&RemeshOptions::default()).unwrap();
//! assert!(session.mesh().unwrap().is_closed());
//! ```

use std::path::Path;

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::algo::remesh::{self, RemeshOptions, RemeshStats};
use crate::algo::subdivide::{self, SubdivideOptions};
use crate::algo::Progress;
use crate::error::{Error, Result};
use crate::io;
use crate::mesh::{HalfEdgeMesh, MergePosition};
use crate::skeleton::{self, NodeId, SkeletalTree};
use crate::skin::{self, PolygonSoup, SkinOptions};

/// The generated surface.
#[derive(Debug, Clone, Default)]
pub enum Surface {
    /// Nothing generated yet, or the skeleton was replaced.
    #[default]
    NotReady,
    /// The skin did not build into a half-edge mesh; only the raw welded
    /// polygons are available, for drawing.
    Polygons(PolygonSoup),
    /// An indexed half-edge mesh, ready for refinement and export.
    Mesh(HalfEdgeMesh),
}

impl Surface {
    /// True when an indexed mesh is available.
    pub fn is_mesh(&self) -> bool {
        matches!(self, Surface::Mesh(_))
    }
}

/// A skeleton under edit and the surface generated from it.
#[derive(Debug)]
pub struct Session {
    tree: SkeletalTree,
    surface: Surface,
    skin_options: SkinOptions,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start from an empty skeleton.
    pub fn new() -> Self {
        Self::from_tree(SkeletalTree::new())
    }

    /// Start from an empty skeleton with a seeded navigation generator, so
    /// [`select_next`](Self::select_next) is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new()
        }
    }

    /// Start from an existing skeleton.
    pub fn from_tree(tree: SkeletalTree) -> Self {
        Self {
            tree,
            surface: Surface::NotReady,
            skin_options: SkinOptions::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the skinning options.
    pub fn with_skin_options(mut self, options: SkinOptions) -> Self {
        self.skin_options = options;
        self
    }

    // ==================== Accessors ====================

    /// The skeleton.
    pub fn tree(&self) -> &SkeletalTree {
        &self.tree
    }

    /// The skeleton, for direct edits.
    pub fn tree_mut(&mut self) -> &mut SkeletalTree {
        &mut self.tree
    }

    /// The current surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The skinning options.
    pub fn skin_options(&self) -> &SkinOptions {
        &self.skin_options
    }

    /// The indexed mesh.
    ///
    /// Fails with [`Error::InvalidState`] when there is none.
    pub fn mesh(&self) -> Result<&HalfEdgeMesh> {
        match &self.surface {
            Surface::Mesh(mesh) => Ok(mesh),
            _ => Err(no_mesh()),
        }
    }

    fn mesh_mut(&mut self) -> Result<&mut HalfEdgeMesh> {
        match &mut self.surface {
            Surface::Mesh(mesh) => Ok(mesh),
            _ => Err(no_mesh()),
        }
    }

    // ==================== Selection ====================

    /// The selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.tree.selected()
    }

    /// Select a node, or clear the selection.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.tree.select(id);
    }

    /// Step the selection to a random other sibling.
    pub fn select_next(&mut self) -> Option<NodeId> {
        self.tree.select_next(&mut self.rng)
    }

    /// Step the selection to its parent.
    pub fn select_parent(&mut self) -> Option<NodeId> {
        self.tree.select_parent()
    }

    /// Step the selection to its first child.
    pub fn select_child(&mut self) -> Option<NodeId> {
        self.tree.select_child()
    }

    /// The selected node, refusing interpolated ones.
    fn editable_selection(&self) -> Result<NodeId> {
        let id = self
            .tree
            .selected()
            .ok_or_else(|| Error::InvalidState("no node is selected".into()))?;
        if self.tree.node(id).interpolated {
            return Err(Error::InvalidState(format!(
                "{:?} is an interpolated node and cannot be edited",
                id
            )));
        }
        Ok(id)
    }

    // ==================== Tree edits ====================

    /// Add a node after the selection and select it.
    ///
    /// With nothing selected the new node becomes the root.
    pub fn create(&mut self) -> Result<NodeId> {
        let parent = match self.tree.selected() {
            Some(_) => Some(self.editable_selection()?),
            None => None,
        };
        let id = self.tree.create_after(parent);
        self.tree.select(Some(id));
        Ok(id)
    }

    /// Extrude a child from the selection and select it.
    pub fn extrude(&mut self) -> Result<NodeId> {
        let id = self.editable_selection()?;
        let child = self
            .tree
            .extrude(id)
            .ok_or_else(|| Error::InvalidState(format!("{:?} cannot be extruded", id)))?;
        self.tree.select(Some(child));
        Ok(child)
    }

    /// Delete the selection. The selection is cleared.
    pub fn delete(&mut self) -> Result<()> {
        let id = self.editable_selection()?;
        self.tree.delete(id);
        self.tree.select(None);
        Ok(())
    }

    /// Move the selection.
    pub fn move_selected(&mut self, position: Point3<f64>) -> Result<()> {
        let id = self.editable_selection()?;
        self.tree.set_position(id, position);
        Ok(())
    }

    /// Resize the selection, clamped to
    /// [`MIN_RADIUS`](crate::skeleton::MIN_RADIUS).
    pub fn set_selected_radius(&mut self, radius: f64) -> Result<()> {
        let id = self.editable_selection()?;
        self.tree.set_radius(id, radius);
        Ok(())
    }

    // ==================== Generation ====================

    /// Interpolate, skin and build the surface.
    ///
    /// If the welded skin does not build into a half-edge mesh the surface
    /// falls back to [`Surface::Polygons`]; that is logged, not returned as
    /// an error.
    pub fn generate(&mut self) -> Result<&Surface> {
        let options = self.skin_options.clone().validated()?;
        if self.tree.is_empty() {
            return Err(Error::InvalidState("the skeleton is empty".into()));
        }

        let inserted = skeleton::interpolate(&mut self.tree);
        log::debug!("interpolation inserted {} spheres", inserted);

        let soup = skin::skin(&self.tree, &options);
        self.surface = match soup.to_mesh() {
            Ok(mesh) => {
                log::info!(
                    "generated mesh: {} vertices, {} faces",
                    mesh.num_vertices(),
                    mesh.num_faces()
                );
                Surface::Mesh(mesh)
            }
            Err(e) => {
                log::warn!("skin is not a manifold mesh ({}); keeping the raw polygons", e);
                Surface::Polygons(soup)
            }
        };
        Ok(&self.surface)
    }

    /// Run `iterations` Catmull-Clark passes on the mesh.
    pub fn subdivide(&mut self, iterations: usize) -> Result<()> {
        self.subdivide_with_progress(iterations, &Progress::none())
    }

    /// [`subdivide`](Self::subdivide) with progress reporting.
    pub fn subdivide_with_progress(&mut self, iterations: usize, progress: &Progress) -> Result<()> {
        let mesh = self.mesh_mut()?;
        subdivide::catmull_clark_subdivide_with_progress(
            mesh,
            &SubdivideOptions::new(iterations),
            progress,
        )?;
        log::info!(
            "subdivided {} times: {} vertices, {} faces",
            iterations,
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Ok(())
    }

    /// Remesh the mesh towards uniform edge lengths.
    pub fn remesh(&mut self, options: &RemeshOptions) -> Result<RemeshStats> {
        remesh::remesh(self.mesh_mut()?, options)
    }

    /// [`remesh`](Self::remesh) with progress reporting.
    pub fn remesh_with_progress(
        &mut self,
        options: &RemeshOptions,
        progress: &Progress,
    ) -> Result<RemeshStats> {
        remesh::remesh_with_progress(self.mesh_mut()?, options, progress)
    }

    /// Split every edge longer than 4/3 of its triangle's mean side.
    pub fn split_long_edges(&mut self) -> Result<usize> {
        let ratio = RemeshOptions::default().split_ratio;
        Ok(remesh::split_long_edges(self.mesh_mut()?, ratio))
    }

    /// Collapse every edge shorter than 4/5 of its triangle's mean side.
    pub fn collapse_short_edges(&mut self, merge: MergePosition) -> Result<usize> {
        let ratio = RemeshOptions::default().collapse_ratio;
        Ok(remesh::collapse_short_edges(self.mesh_mut()?, ratio, merge))
    }

    /// Flip edges that bring vertex valences closer to six.
    pub fn flip_edges(&mut self) -> Result<usize> {
        Ok(remesh::flip_to_regular_valence(self.mesh_mut()?))
    }

    /// One round of tangential smoothing.
    pub fn smooth(&mut self, lambda: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&lambda) {
            return Err(Error::invalid_param("lambda", lambda, "must lie in [0, 1]"));
        }
        remesh::tangential_smooth(self.mesh_mut()?, lambda);
        Ok(())
    }

    /// Fan-triangulate every face of the mesh.
    pub fn triangulate(&mut self) -> Result<()> {
        let mesh = self.mesh_mut()?;
        *mesh = mesh.triangulated()?;
        Ok(())
    }

    // ==================== Files ====================

    /// Export the mesh as OBJ.
    pub fn export_obj<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        io::obj::save(self.mesh()?, path)
    }

    /// Save the skeleton as JSON.
    pub fn save_skeleton<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        io::skeleton::save(&self.tree, path)
    }

    /// Replace the skeleton with one loaded from JSON.
    ///
    /// The surface is reset to [`Surface::NotReady`]. On failure the session
    /// is left unchanged.
    pub fn load_skeleton<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.tree = io::skeleton::load(path)?;
        self.surface = Surface::NotReady;
        Ok(())
    }
}

fn no_mesh() -> Error {
    Error::InvalidState("no mesh has been generated".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn y_session() -> Session {
        let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
        let root = tree.root().unwrap();
        tree.add_child(root, Point3::new(-1.5, 1.5, 0.0), 0.3);
        tree.add_child(root, Point3::new(1.5, 1.5, 0.0), 0.3);
        Session::from_tree(tree)
    }

    #[test]
    fn test_new_session_is_not_ready() {
        let session = Session::new();
        assert!(session.tree().is_empty());
        assert!(matches!(session.surface(), Surface::NotReady));
        assert!(matches!(session.mesh(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_generate_builds_mesh() {
        let mut session = y_session();
        assert!(session.generate().unwrap().is_mesh());
        let mesh = session.mesh().unwrap();
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 2);
        assert_eq!(session.tree().len(), 7);
    }

    #[test]
    fn test_generate_twice_is_stable() {
        let mut session = y_session();
        session.generate().unwrap();
        let first = session.mesh().unwrap().num_faces();
        session.generate().unwrap();
        assert_eq!(session.mesh().unwrap().num_faces(), first);
        assert_eq!(session.tree().len(), 7);
    }

    #[test]
    fn test_generate_empty_skeleton() {
        let mut session = Session::new();
        assert!(matches!(session.generate(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_refinement_needs_mesh() {
        let mut session = y_session();
        assert!(matches!(session.subdivide(1), Err(Error::InvalidState(_))));
        assert!(matches!(
            session.remesh(&RemeshOptions::default()),
            Err(Error::InvalidState(_))
        ));
        assert!(session.flip_edges().is_err());
        assert!(session.export_obj("unused.obj").is_err());
    }

    #[test]
    fn test_subdivide_and_remesh() {
        let mut session = y_session();
        session.generate().unwrap();
        let faces = session.mesh().unwrap().num_faces();
        session.subdivide(1).unwrap();
        assert!(session.mesh().unwrap().num_faces() > faces);

        session
            .remesh(&RemeshOptions::default().with_triangulate(true))
            .unwrap();
        let mesh = session.mesh().unwrap();
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn test_individual_passes() {
        let mut session = y_session();
        session.generate().unwrap();
        session.triangulate().unwrap();
        session.split_long_edges().unwrap();
        session.collapse_short_edges(MergePosition::Midpoint).unwrap();
        session.flip_edges().unwrap();
        session.smooth(0.3).unwrap();
        assert!(session.smooth(2.0).is_err());
        assert!(session.mesh().unwrap().is_closed());
    }

    #[test]
    fn test_extrude_selects_child() {
        let mut session = y_session();
        let root = session.tree().root().unwrap();
        let branch = session.tree().children(root)[1];
        session.select(Some(branch));

        let child = session.extrude().unwrap();
        assert_eq!(session.selected(), Some(child));
        assert_eq!(session.tree().parent(child), Some(branch));
    }

    #[test]
    fn test_interpolated_nodes_are_not_editable() {
        let mut session = y_session();
        session.generate().unwrap();
        let interpolated = session
            .tree()
            .node_ids()
            .find(|&id| session.tree().node(id).interpolated)
            .unwrap();
        session.select(Some(interpolated));
        assert!(matches!(session.extrude(), Err(Error::InvalidState(_))));
        assert!(matches!(session.delete(), Err(Error::InvalidState(_))));
        assert!(session.set_selected_radius(1.0).is_err());
    }

    #[test]
    fn test_edits_need_selection() {
        let mut session = y_session();
        assert!(session.extrude().is_err());
        assert!(session.delete().is_err());
    }

    #[test]
    fn test_create_without_selection_makes_root() {
        let mut session = Session::new();
        let a = session.create().unwrap();
        assert_eq!(session.tree().root(), Some(a));
        let b = session.create().unwrap();
        assert_eq!(session.tree().parent(b), Some(a));
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut session = y_session();
        let root = session.tree().root().unwrap();
        let leaf = session.tree().children(root)[0];
        session.select(Some(leaf));
        session.delete().unwrap();
        assert_eq!(session.selected(), None);
        assert_eq!(session.tree().len(), 2);
    }

    #[test]
    fn test_seeded_navigation_is_reproducible() {
        let walk = |seed| {
            let mut session = Session::with_seed(seed);
            let root = session.create().unwrap();
            for _ in 0..4 {
                session.select(Some(root));
                session.create().unwrap();
            }
            session.select(Some(session.tree().children(root)[0]));
            (0..10).map(|_| session.select_next()).collect::<Vec<_>>()
        };
        assert_eq!(walk(7), walk(7));
    }

    #[test]
    fn test_navigation() {
        let mut session = y_session();
        let root = session.tree().root().unwrap();
        session.select(Some(root));
        let child = session.select_child().unwrap();
        assert_eq!(session.tree().parent(child), Some(root));
        let sibling = session.select_next().unwrap();
        assert_ne!(sibling, child);
        assert_eq!(session.select_parent(), Some(root));
    }
}
