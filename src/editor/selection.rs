//! Selection state machine
//!
//! Tracks which placed nodes are selected and keeps exactly one outline node
//! in the scene per member. Membership order is insertion order.

use std::collections::HashMap;

use crate::gfx::factory::create_outline;
use crate::gfx::resources::ResourceBackend;
use crate::gfx::scene::{NodeId, SceneGraph};
use crate::store::Color;

/// Read-only view of the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    Single(NodeId),
    Multi(Vec<NodeId>),
}

#[derive(Debug, Default)]
pub struct Selection {
    members: Vec<NodeId>,
    /// Selected node -> its outline node
    outlines: HashMap<NodeId, NodeId>,
    last_touched: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match self.members.as_slice() {
            [] => SelectionState::Empty,
            [single] => SelectionState::Single(*single),
            many => SelectionState::Multi(many.to_vec()),
        }
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Member most recently added, for UI emphasis
    pub fn last_touched(&self) -> Option<NodeId> {
        self.last_touched
    }

    /// Plain click: the selection becomes exactly `id`
    pub fn select_only(
        &mut self,
        id: NodeId,
        scene: &mut SceneGraph,
        backend: &mut dyn ResourceBackend,
        outline_color: Color,
    ) {
        self.clear(scene, backend);
        self.add(id, scene, backend, outline_color);
    }

    /// Modified click: flips membership of `id`, returning whether it is now selected
    pub fn toggle(
        &mut self,
        id: NodeId,
        scene: &mut SceneGraph,
        backend: &mut dyn ResourceBackend,
        outline_color: Color,
    ) -> bool {
        if self.contains(id) {
            self.remove(id, scene, backend);
            false
        } else {
            self.add(id, scene, backend, outline_color);
            true
        }
    }

    /// Adds `id` and its outline. Unknown or non-placed nodes are ignored.
    pub fn add(
        &mut self,
        id: NodeId,
        scene: &mut SceneGraph,
        backend: &mut dyn ResourceBackend,
        outline_color: Color,
    ) {
        if self.contains(id) {
            return;
        }
        let Some(target) = scene.get(id).filter(|node| node.kind.is_placed()) else {
            log::trace!("selection: {:?} is not a placed node", id);
            return;
        };
        let Some(outline) = create_outline(backend, id, target, outline_color) else {
            return;
        };

        let outline_id = scene.add_node(outline);
        self.outlines.insert(id, outline_id);
        self.members.push(id);
        self.last_touched = Some(id);
    }

    pub fn remove(&mut self, id: NodeId, scene: &mut SceneGraph, backend: &mut dyn ResourceBackend) {
        self.members.retain(|member| *member != id);
        if let Some(outline) = self.outlines.remove(&id) {
            scene.remove_node(outline, backend);
        }
        if self.last_touched == Some(id) {
            self.last_touched = self.members.last().copied();
        }
    }

    /// Removes every member and outline
    pub fn clear(&mut self, scene: &mut SceneGraph, backend: &mut dyn ResourceBackend) {
        self.take(scene, backend);
    }

    /// Clears the selection, returning the former members in order
    pub fn take(&mut self, scene: &mut SceneGraph, backend: &mut dyn ResourceBackend) -> Vec<NodeId> {
        for (_, outline) in self.outlines.drain() {
            scene.remove_node(outline, backend);
        }
        self.last_touched = None;
        std::mem::take(&mut self.members)
    }

    /// Drops all tracking without touching the scene, for when the scene
    /// itself is being torn down
    pub fn forget(&mut self) {
        self.members.clear();
        self.outlines.clear();
        self.last_touched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::PrototypeMesh;
    use crate::gfx::factory::{build_prototype, PrototypeStyle};
    use crate::gfx::resources::HeadlessBackend;
    use cgmath::Vector3;

    fn scene_with_cubes(backend: &mut HeadlessBackend, count: usize) -> (SceneGraph, Vec<NodeId>) {
        let mut scene = SceneGraph::new(Color(0xf0f0f0));
        let ids = (0..count)
            .map(|i| {
                scene.add_node(build_prototype(
                    backend,
                    &PrototypeMesh::cube(),
                    Color::GREEN,
                    PrototypeStyle::Opaque,
                    Vector3::new(i as f32 * 2.0, 0.5, 0.0),
                ))
            })
            .collect();
        (scene, ids)
    }

    #[test]
    fn test_select_then_toggle_off_returns_to_empty() {
        let mut backend = HeadlessBackend::new();
        let (mut scene, ids) = scene_with_cubes(&mut backend, 1);
        let mut selection = Selection::new();

        selection.select_only(ids[0], &mut scene, &mut backend, Color::YELLOW);
        assert_eq!(selection.state(), SelectionState::Single(ids[0]));
        assert_eq!(scene.outline_count(), 1);

        assert!(!selection.toggle(ids[0], &mut scene, &mut backend, Color::YELLOW));
        assert_eq!(selection.state(), SelectionState::Empty);
        assert_eq!(scene.outline_count(), 0);
        assert_eq!(backend.stats().live_geometries, 1);
    }

    #[test]
    fn test_toggle_builds_multi_selection() {
        let mut backend = HeadlessBackend::new();
        let (mut scene, ids) = scene_with_cubes(&mut backend, 3);
        let mut selection = Selection::new();

        selection.select_only(ids[0], &mut scene, &mut backend, Color::YELLOW);
        selection.toggle(ids[2], &mut scene, &mut backend, Color::YELLOW);
        assert_eq!(selection.state(), SelectionState::Multi(vec![ids[0], ids[2]]));
        assert_eq!(selection.last_touched(), Some(ids[2]));
        assert_eq!(scene.outline_count(), 2);

        // A plain click collapses back to one member
        selection.select_only(ids[1], &mut scene, &mut backend, Color::YELLOW);
        assert_eq!(selection.state(), SelectionState::Single(ids[1]));
        assert_eq!(scene.outline_count(), 1);
    }

    #[test]
    fn test_outlines_are_never_selectable() {
        let mut backend = HeadlessBackend::new();
        let (mut scene, ids) = scene_with_cubes(&mut backend, 1);
        let mut selection = Selection::new();

        selection.add(ids[0], &mut scene, &mut backend, Color::YELLOW);
        selection.add(ids[0], &mut scene, &mut backend, Color::YELLOW);
        assert_eq!(scene.outline_count(), 1);

        let outline = scene
            .nodes()
            .find(|(_, node)| node.kind.is_outline())
            .map(|(id, _)| id)
            .unwrap();
        selection.add(outline, &mut scene, &mut backend, Color::YELLOW);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_take_returns_members_and_drops_outlines() {
        let mut backend = HeadlessBackend::new();
        let (mut scene, ids) = scene_with_cubes(&mut backend, 2);
        let mut selection = Selection::new();
        for id in &ids {
            selection.add(*id, &mut scene, &mut backend, Color::YELLOW);
        }

        assert_eq!(selection.take(&mut scene, &mut backend), ids);
        assert!(selection.is_empty());
        assert_eq!(scene.outline_count(), 0);
        assert_eq!(backend.stats().stale_disposals, 0);
    }
}
