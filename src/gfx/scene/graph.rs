//! Scene graph manager
//!
//! The graph owns one render group holding every placed node plus the
//! transient decorations (drag ghost, selection outlines), a ground node kept
//! outside the group, the light rig and the background colour. Nodes are kept
//! in insertion order; that order is what "first match wins" refers to.

use cgmath::{Matrix4, One, Vector3};

use super::node::{MeshPart, NodeId, NodeKind, SceneNode};
use crate::gfx::resources::ResourceBackend;
use crate::store::{Color, PlacedObject};

/// Ambient fill plus one directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub ambient_color: Color,
    pub ambient_intensity: f32,
    pub directional_color: Color,
    pub directional_position: Vector3<f32>,
    pub directional_intensity: f32,
}

/// Full white ambient and no directional contribution, so an unlit graph
/// shows flat material colours
impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient_color: Color(0xffffff),
            ambient_intensity: 1.0,
            directional_color: Color(0xffffff),
            directional_position: Vector3::new(0.0, 1.0, 0.0),
            directional_intensity: 0.0,
        }
    }
}

pub struct SceneGraph {
    pub background: Color,
    pub lights: LightRig,
    ground: Option<SceneNode>,
    group: Vec<(NodeId, SceneNode)>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            lights: LightRig::default(),
            ground: None,
            group: Vec::new(),
            next_id: 0,
        }
    }

    /// Installs the ground node, disposing any previous one
    pub fn set_ground(&mut self, ground: SceneNode, backend: &mut dyn ResourceBackend) {
        if let Some(mut previous) = self.ground.replace(ground) {
            previous.dispose(backend);
        }
    }

    pub fn ground(&self) -> Option<&SceneNode> {
        self.ground.as_ref()
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        log::trace!("scene add {:?} {:?}", id, node.kind);
        self.group.push((id, node));
        id
    }

    /// Detaches and disposes a node. Unknown ids are ignored.
    pub fn remove_node(&mut self, id: NodeId, backend: &mut dyn ResourceBackend) -> bool {
        let Some(index) = self.group.iter().position(|(node_id, _)| *node_id == id) else {
            log::trace!("scene remove: {:?} not in group", id);
            return false;
        };
        let (_, mut node) = self.group.remove(index);
        node.dispose(backend);
        true
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.group
            .iter()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.group
            .iter_mut()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Every node of the group in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.group.iter().map(|(id, node)| (*id, node))
    }

    pub fn placed(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.nodes().filter(|(_, node)| node.kind.is_placed())
    }

    pub fn placed_count(&self) -> usize {
        self.placed().count()
    }

    pub fn ghost_count(&self) -> usize {
        self.nodes().filter(|(_, node)| node.kind.is_ghost()).count()
    }

    pub fn outline_count(&self) -> usize {
        self.nodes().filter(|(_, node)| node.kind.is_outline()).count()
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// Index among placed nodes of the first whose footprint contains `(x, z)`
    pub fn find_by_footprint(&self, x: f32, z: f32) -> Option<usize> {
        self.placed()
            .position(|(_, node)| node.world_bounds().is_some_and(|b| b.contains_xz(x, z)))
    }

    /// Removes and disposes every placed node, returning how many went
    pub fn clear_placed(&mut self, backend: &mut dyn ResourceBackend) -> usize {
        let ids: Vec<NodeId> = self.placed().map(|(id, _)| id).collect();
        for id in &ids {
            self.remove_node(*id, backend);
        }
        ids.len()
    }

    /// Replaces every placed node with one derived node per record.
    ///
    /// `build` may decline a record (e.g. its mesh is still loading); such
    /// records simply get no node here.
    pub fn rebuild_from_records<F>(
        &mut self,
        records: &[PlacedObject],
        backend: &mut dyn ResourceBackend,
        mut build: F,
    ) -> Vec<(usize, NodeId)>
    where
        F: FnMut(usize, &PlacedObject, &mut dyn ResourceBackend) -> Option<SceneNode>,
    {
        let cleared = self.clear_placed(backend);
        let mut added = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if let Some(node) = build(index, record, backend) {
                added.push((index, self.add_node(node)));
            }
        }
        log::debug!(
            "rebuilt scene: {} nodes cleared, {} of {} records derived",
            cleared,
            added.len(),
            records.len()
        );
        added
    }

    /// Visits the ground and every mesh of the group with its world matrix
    pub fn visit_meshes<F>(&self, mut f: F)
    where
        F: FnMut(&NodeKind, &MeshPart, Matrix4<f32>),
    {
        if let Some(ground) = &self.ground {
            ground.for_each_mesh(Matrix4::one(), &mut |mesh, world| f(&ground.kind, mesh, world));
        }
        for (_, node) in &self.group {
            node.for_each_mesh(Matrix4::one(), &mut |mesh, world| f(&node.kind, mesh, world));
        }
    }

    /// Disposes every node including the ground
    pub fn clear(&mut self, backend: &mut dyn ResourceBackend) {
        for (_, mut node) in self.group.drain(..) {
            node.dispose(backend);
        }
        if let Some(mut ground) = self.ground.take() {
            ground.dispose(backend);
        }
    }
}
