//! Drag session state and placement outcomes

use crate::gfx::resources::ResourceBackend;
use crate::gfx::scene::{NodeId, SceneGraph};
use crate::store::{Color, PrototypeKind};

/// How a drop ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// Added to the scene and dispatched to the store
    Committed { position: [f32; 3], color: Color },
    /// Blocked by an existing placement; nothing changed
    Rejected { position: [f32; 3] },
    /// Not our payload, no ground under the pointer, or the mesh failed to load
    Ignored,
    /// Waiting on the prototype mesh; resolved by a later tick
    Pending,
}

impl PlacementOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, PlacementOutcome::Committed { .. })
    }
}

/// Transient state of one palette drag
#[derive(Debug, Default)]
pub struct DragSession {
    kind: Option<PrototypeKind>,
    ghost: Option<NodeId>,
    ghost_color: Option<Color>,
    /// Last snapped ground cell under the pointer
    hover: Option<(f32, f32)>,
    /// The ghost mesh failed to load during this drag
    load_failed: bool,
}

impl DragSession {
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<PrototypeKind> {
        self.kind
    }

    pub fn ghost(&self) -> Option<NodeId> {
        self.ghost
    }

    pub fn hover(&self) -> Option<(f32, f32)> {
        self.hover
    }

    pub(crate) fn begin(&mut self, kind: PrototypeKind) {
        if self.kind != Some(kind) {
            self.kind = Some(kind);
            self.load_failed = false;
        }
    }

    pub(crate) fn set_hover(&mut self, x: f32, z: f32) {
        self.hover = Some((x, z));
    }

    pub(crate) fn attach_ghost(&mut self, id: NodeId, color: Color) {
        self.ghost = Some(id);
        self.ghost_color = Some(color);
    }

    /// Whether the ghost needs repainting to match `color`
    pub(crate) fn ghost_color_stale(&self, color: Color) -> bool {
        self.ghost.is_some() && self.ghost_color != Some(color)
    }

    pub(crate) fn set_ghost_color(&mut self, color: Color) {
        self.ghost_color = Some(color);
    }

    pub(crate) fn mark_load_failed(&mut self) {
        self.load_failed = true;
    }

    pub(crate) fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Removes the ghost and ends the session. Safe with no ghost or no session.
    pub fn tear_down(&mut self, scene: &mut SceneGraph, backend: &mut dyn ResourceBackend) {
        if let Some(ghost) = self.ghost.take() {
            scene.remove_node(ghost, backend);
            log::trace!("drag ghost {:?} removed", ghost);
        }
        self.reset();
    }

    /// Ends the session without touching the scene
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::PrototypeMesh;
    use crate::gfx::factory::{build_prototype, PrototypeStyle};
    use crate::gfx::resources::HeadlessBackend;
    use cgmath::Vector3;

    #[test]
    fn test_tear_down_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut scene = SceneGraph::new(Color(0xf0f0f0));
        let mut session = DragSession::default();
        session.begin(PrototypeKind::Square);

        let ghost = build_prototype(
            &mut backend,
            &PrototypeMesh::cube(),
            Color::GREEN,
            PrototypeStyle::Ghost { opacity: 0.5 },
            Vector3::new(0.0, 0.5, 0.0),
        );
        session.attach_ghost(scene.add_node(ghost), Color::GREEN);
        assert_eq!(scene.ghost_count(), 1);

        session.tear_down(&mut scene, &mut backend);
        session.tear_down(&mut scene, &mut backend);
        assert!(!session.is_active());
        assert_eq!(scene.ghost_count(), 0);
        assert_eq!(backend.stats().live_geometries, 0);
        assert_eq!(backend.stats().stale_disposals, 0);
    }

    #[test]
    fn test_ghost_colour_tracks_live_colour() {
        let mut session = DragSession::default();
        session.begin(PrototypeKind::Square);
        assert!(!session.ghost_color_stale(Color::BLUE));

        session.attach_ghost(NodeId(7), Color::GREEN);
        assert!(session.ghost_color_stale(Color::BLUE));
        session.set_ghost_color(Color::BLUE);
        assert!(!session.ghost_color_stale(Color::BLUE));
    }

    #[test]
    fn test_switching_kind_clears_load_failure() {
        let mut session = DragSession::default();
        session.begin(PrototypeKind::Sofa);
        session.mark_load_failed();
        session.begin(PrototypeKind::Sofa);
        assert!(session.load_failed());
        session.begin(PrototypeKind::Square);
        assert!(!session.load_failed());
    }
}
