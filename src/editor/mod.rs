//! Scene interaction engine
//!
//! [`LayoutEditor`] owns the live scene and turns pointer, keyboard and drag
//! events into scene mutations plus intents dispatched to a [`LayoutStore`].
//! The store stays the source of truth: placed nodes are derived from its
//! records and rebuilt whenever its list diverges from the scene.
//!
//! Every handler is a silent no-op while the editor is not mounted.

mod frame_loop;
mod loads;
mod notice;
mod payload;
mod placement;
mod selection;

#[cfg(test)]
mod tests;

pub use frame_loop::FrameLoop;
pub use loads::{LoadPurpose, MeshCache};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use payload::{DragPayload, DragTransfer, DRAG_FORMAT};
pub use placement::{DragSession, PlacementOutcome};
pub use selection::{Selection, SelectionState};

use cgmath::Vector3;

use crate::assets::{PrototypeLoader, PrototypeMesh};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::gfx::{
    camera::CameraManager,
    factory::{self, PrototypeStyle},
    picking::{overlaps, pick_at, screen_to_world_on_ground, Viewport},
    resources::ResourceBackend,
    scene::{NodeKind, SceneGraph, SceneNode},
};
use crate::store::{Color, LayoutIntent, LayoutStore, PlacedObject, PositionKey, PrototypeKind};

/// Everything a spatial query needs, alive exactly while mounted
pub struct EditorContext {
    pub scene: SceneGraph,
    pub camera: CameraManager,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Delete,
    Backspace,
    Escape,
}

fn require_context(context: &mut Option<EditorContext>) -> Result<&mut EditorContext> {
    context.as_mut().ok_or(EditorError::MissingSpatialContext)
}

/// Snapped ground cell under the pointer
fn ground_cell(ctx: &EditorContext, pointer: (f32, f32), grid_size: f32) -> Result<Option<(f32, f32)>> {
    let ground = ctx.scene.ground().ok_or(EditorError::MissingSpatialContext)?;
    Ok(screen_to_world_on_ground(
        pointer,
        ctx.viewport,
        &ctx.camera.camera,
        ground,
        grid_size,
    ))
}

fn spawn_ghost(
    scene: &mut SceneGraph,
    drag: &mut DragSession,
    backend: &mut dyn ResourceBackend,
    mesh: &PrototypeMesh,
    color: Color,
    opacity: f32,
) {
    let Some((x, z)) = drag.hover() else {
        return;
    };
    let node = factory::build_prototype(
        backend,
        mesh,
        color,
        PrototypeStyle::Ghost { opacity },
        Vector3::new(x, mesh.rest_height(), z),
    );
    let id = scene.add_node(node);
    log::trace!("drag ghost {:?} created", id);
    drag.attach_ghost(id, color);
}

fn refresh_ghost_color(
    scene: &mut SceneGraph,
    drag: &mut DragSession,
    backend: &mut dyn ResourceBackend,
    color: Color,
) {
    if !drag.ghost_color_stale(color) {
        return;
    }
    if let Some(node) = drag.ghost().and_then(|id| scene.get_mut(id)) {
        node.set_color(backend, color);
    }
    drag.set_ghost_color(color);
}

/// What a placed node was derived from, comparable with a record
fn derived_signature(node: &SceneNode) -> Option<(PositionKey, Color, PrototypeKind)> {
    match node.kind {
        NodeKind::Placed { prototype, color } => Some((node.position_key(), color, prototype)),
        _ => None,
    }
}

pub struct LayoutEditor<S, L> {
    config: EditorConfig,
    store: S,
    loader: L,
    context: Option<EditorContext>,
    selection: Selection,
    drag: DragSession,
    loads: MeshCache,
    notices: NoticeBoard,
    synced_revision: Option<u64>,
    /// A mesh finished loading since the last sync
    resync: bool,
    /// Drops held back until every stored record has a node to test against
    deferred_drops: Vec<(PrototypeKind, f32, f32)>,
}

impl<S: LayoutStore, L: PrototypeLoader> LayoutEditor<S, L> {
    pub fn new(config: EditorConfig, store: S, loader: L) -> Self {
        let notices = NoticeBoard::new(config.notice_lifetime);
        Self {
            config,
            store,
            loader,
            context: None,
            selection: Selection::new(),
            drag: DragSession::default(),
            loads: MeshCache::default(),
            notices,
            synced_revision: None,
            resync: false,
            deferred_drops: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn context(&self) -> Option<&EditorContext> {
        self.context.as_ref()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.context.as_ref().map(|ctx| &ctx.scene)
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraManager> {
        self.context.as_mut().map(|ctx| &mut ctx.camera)
    }

    pub fn is_mounted(&self) -> bool {
        self.context.is_some()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn drag_session(&self) -> &DragSession {
        &self.drag
    }

    pub fn pending_loads(&self) -> usize {
        self.loads.pending_count()
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.active()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Builds the scene, ground and camera and derives nodes from the store
    pub fn mount(&mut self, backend: &mut dyn ResourceBackend, viewport: Viewport) {
        if self.context.is_some() {
            log::debug!("editor already mounted");
            return;
        }

        let mut scene = factory::create_scene(&self.config);
        scene.set_ground(factory::create_ground_plane(backend, &self.config), backend);
        let camera = factory::create_camera(viewport, &self.config);
        self.context = Some(EditorContext {
            scene,
            camera,
            viewport,
        });
        self.synced_revision = None;
        self.sync_with_store(backend);
        log::info!("editor mounted at {}x{}", viewport.width, viewport.height);
    }

    /// Abandons pending loads and disposes every node
    pub fn unmount(&mut self, backend: &mut dyn ResourceBackend) {
        let Some(mut ctx) = self.context.take() else {
            return;
        };
        self.loads.abandon_all();
        self.drag.reset();
        self.selection.forget();
        ctx.scene.clear(backend);
        self.synced_revision = None;
        self.resync = false;
        self.deferred_drops.clear();
        log::info!("editor unmounted");
    }

    pub fn resize(&mut self, viewport: Viewport) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.viewport = viewport;
        if !viewport.is_empty() {
            ctx.camera.camera.resize_projection(viewport.width, viewport.height);
        }
    }

    /// Resolves a click to a selection change. `additive` is the
    /// Ctrl/Cmd modifier.
    pub fn pointer_click(&mut self, backend: &mut dyn ResourceBackend, pointer: (f32, f32), additive: bool) {
        if let Err(err) = self.try_pointer_click(backend, pointer, additive) {
            log::trace!("click ignored: {}", err);
        }
    }

    fn try_pointer_click(
        &mut self,
        backend: &mut dyn ResourceBackend,
        pointer: (f32, f32),
        additive: bool,
    ) -> Result<()> {
        let ctx = require_context(&mut self.context)?;
        let outline_color = self.config.outline_color;

        match pick_at(pointer, ctx.viewport, &ctx.camera.camera, &ctx.scene) {
            Some(id) if additive => {
                let selected = self.selection.toggle(id, &mut ctx.scene, backend, outline_color);
                log::debug!("toggled {:?}, selected: {}", id, selected);
            }
            Some(id) => {
                self.selection.select_only(id, &mut ctx.scene, backend, outline_color);
                log::debug!("selected {:?}", id);
            }
            None => self.selection.clear(&mut ctx.scene, backend),
        }
        Ok(())
    }

    /// Returns whether the key did anything
    pub fn key_pressed(&mut self, backend: &mut dyn ResourceBackend, key: EditorKey) -> bool {
        match key {
            EditorKey::Delete | EditorKey::Backspace => self.delete_selection(backend) > 0,
            EditorKey::Escape => {
                let dragging = self.drag.is_active();
                self.drag_leave(backend);
                dragging
            }
        }
    }

    /// Removes every selected node and dispatches one removal intent each
    pub fn delete_selection(&mut self, backend: &mut dyn ResourceBackend) -> usize {
        self.try_delete_selection(backend).unwrap_or_else(|err| {
            log::trace!("delete ignored: {}", err);
            0
        })
    }

    fn try_delete_selection(&mut self, backend: &mut dyn ResourceBackend) -> Result<usize> {
        let ctx = require_context(&mut self.context)?;
        let mut deleted = 0;

        for id in self.selection.take(&mut ctx.scene, backend) {
            let Some(key) = ctx.scene.get(id).map(SceneNode::position_key) else {
                continue;
            };
            ctx.scene.remove_node(id, backend);
            self.store.dispatch(LayoutIntent::RemoveRecord(key));
            deleted += 1;
        }

        if deleted > 0 {
            log::info!("deleted {} objects", deleted);
        }
        Ok(deleted)
    }

    /// Updates the live colour; the selection and any drag ghost follow it
    pub fn set_active_color(&mut self, backend: &mut dyn ResourceBackend, color: Color) {
        self.store.dispatch(LayoutIntent::SetActiveColor(color));
        self.recolor_selection(backend, color);
        if let Some(ctx) = self.context.as_mut() {
            refresh_ghost_color(&mut ctx.scene, &mut self.drag, backend, color);
        }
    }

    /// Recolours every selected node in place and dispatches one recolour
    /// intent per node, keyed by its record index
    pub fn recolor_selection(&mut self, backend: &mut dyn ResourceBackend, color: Color) -> usize {
        self.try_recolor_selection(backend, color).unwrap_or_else(|err| {
            log::trace!("recolor ignored: {}", err);
            0
        })
    }

    fn try_recolor_selection(&mut self, backend: &mut dyn ResourceBackend, color: Color) -> Result<usize> {
        let ctx = require_context(&mut self.context)?;
        if self.selection.is_empty() {
            return Ok(0);
        }

        let records = self.store.records();
        let mut recolored = 0;
        for &id in self.selection.ids() {
            let Some(node) = ctx.scene.get_mut(id) else {
                continue;
            };
            let key = node.position_key();
            node.set_color(backend, color);

            match records.iter().position(|record| record.key() == key) {
                Some(index) => {
                    self.store.dispatch(LayoutIntent::RecolorRecord { index, color });
                    recolored += 1;
                }
                None => log::warn!("no record at {:?} to recolor", key),
            }
        }
        log::debug!("recolored {} objects to {}", recolored, color);
        Ok(recolored)
    }

    /// Shows or moves the drag ghost. Returns `false` for transfers that are
    /// not palette drags, so the host can leave them alone.
    pub fn drag_over(
        &mut self,
        backend: &mut dyn ResourceBackend,
        transfer: &DragTransfer,
        pointer: (f32, f32),
    ) -> bool {
        let Some(payload) = transfer.payload() else {
            return false;
        };
        match self.try_drag_over(backend, payload.kind, pointer) {
            Ok(()) => true,
            Err(err) => {
                log::trace!("drag over ignored: {}", err);
                false
            }
        }
    }

    fn try_drag_over(
        &mut self,
        backend: &mut dyn ResourceBackend,
        kind: PrototypeKind,
        pointer: (f32, f32),
    ) -> Result<()> {
        let ctx = require_context(&mut self.context)?;
        if self.drag.kind().is_some_and(|current| current != kind) {
            self.drag.tear_down(&mut ctx.scene, backend);
        }
        self.drag.begin(kind);

        let Some((x, z)) = ground_cell(ctx, pointer, self.config.grid_size)? else {
            return Ok(());
        };
        self.drag.set_hover(x, z);
        let color = self.store.active_color();

        if let Some(node) = self.drag.ghost().and_then(|id| ctx.scene.get_mut(id)) {
            let y = node.position().y;
            node.set_position(Vector3::new(x, y, z));
            refresh_ghost_color(&mut ctx.scene, &mut self.drag, backend, color);
            return Ok(());
        }
        if self.drag.load_failed() {
            return Ok(());
        }

        match self.loads.request(kind, LoadPurpose::Ghost, &self.loader) {
            Ok(Some(mesh)) => spawn_ghost(
                &mut ctx.scene,
                &mut self.drag,
                backend,
                &mesh,
                color,
                self.config.ghost_opacity,
            ),
            Ok(None) => {}
            Err(err) => {
                self.drag.mark_load_failed();
                self.notices.push(
                    NoticeKind::AssetLoadFailed,
                    format!("could not load {}: {}", kind, err),
                );
            }
        }
        Ok(())
    }

    /// Commits or rejects a placement at the pointer. The ghost is removed
    /// whatever the outcome.
    pub fn drop(
        &mut self,
        backend: &mut dyn ResourceBackend,
        transfer: &DragTransfer,
        pointer: (f32, f32),
    ) -> PlacementOutcome {
        let Some(payload) = transfer.payload() else {
            return PlacementOutcome::Ignored;
        };
        let outcome = self
            .try_drop(backend, payload.kind, pointer)
            .unwrap_or_else(|err| {
                log::trace!("drop ignored: {}", err);
                PlacementOutcome::Ignored
            });
        self.drag_leave(backend);
        outcome
    }

    fn try_drop(
        &mut self,
        backend: &mut dyn ResourceBackend,
        kind: PrototypeKind,
        pointer: (f32, f32),
    ) -> Result<PlacementOutcome> {
        let ctx = require_context(&mut self.context)?;
        let Some((x, z)) = ground_cell(ctx, pointer, self.config.grid_size)? else {
            log::debug!("drop missed the ground");
            return Ok(PlacementOutcome::Ignored);
        };

        match self.loads.request(kind, LoadPurpose::Drop { x, z }, &self.loader) {
            Ok(Some(mesh)) => self.place(backend, &mesh, x, z),
            Ok(None) => Ok(PlacementOutcome::Pending),
            Err(err) => {
                self.notices.push(
                    NoticeKind::AssetLoadFailed,
                    format!("could not load {}: {}", kind, err),
                );
                Ok(PlacementOutcome::Ignored)
            }
        }
    }

    /// Whether some stored record still waits for its mesh, and so has no
    /// node an overlap test could see
    fn records_loading(&self) -> bool {
        self.store
            .records()
            .iter()
            .any(|record| self.loads.is_pending(record.kind))
    }

    /// Builds an opaque candidate at the cell and commits it unless it
    /// overlaps a placed node or a record whose mesh failed to load.
    ///
    /// While any record mesh is still loading the drop is deferred and
    /// retried from [`LayoutEditor::tick`].
    fn place(
        &mut self,
        backend: &mut dyn ResourceBackend,
        mesh: &PrototypeMesh,
        x: f32,
        z: f32,
    ) -> Result<PlacementOutcome> {
        self.try_sync_with_store(backend)?;
        let kind = mesh.kind;
        let color = self.store.active_color();
        let position = Vector3::new(x, mesh.rest_height(), z);

        if self.records_loading() {
            log::debug!("{} drop at ({}, {}) waits for stored records", kind, x, z);
            self.deferred_drops.push((kind, x, z));
            return Ok(PlacementOutcome::Pending);
        }

        let underived: Vec<PlacedObject> = self
            .store
            .records()
            .into_iter()
            .filter(|record| self.loads.has_failed(record.kind))
            .collect();
        let ctx = require_context(&mut self.context)?;
        let mut candidate = factory::build_prototype(backend, mesh, color, PrototypeStyle::Opaque, position);
        let covers_underived = candidate.world_bounds().is_some_and(|bounds| {
            underived
                .iter()
                .any(|record| bounds.contains_xz(record.x, record.z))
        });

        if covers_underived || overlaps(&candidate, ctx.scene.placed().map(|(_, node)| node)) {
            candidate.dispose(backend);
            self.notices.push(
                NoticeKind::PlacementRejected,
                "placement blocked by existing object",
            );
            return Ok(PlacementOutcome::Rejected {
                position: position.into(),
            });
        }

        ctx.scene.add_node(candidate);
        self.store
            .dispatch(LayoutIntent::AddRecord(PlacedObject::new(position.into(), color, kind)));
        log::info!("placed {} at ({}, {}, {}) in {}", kind, x, position.y, z, color);
        Ok(PlacementOutcome::Committed {
            position: position.into(),
            color,
        })
    }

    /// Removes the ghost and ends the drag. Safe to call at any time.
    pub fn drag_leave(&mut self, backend: &mut dyn ResourceBackend) {
        match self.context.as_mut() {
            Some(ctx) => self.drag.tear_down(&mut ctx.scene, backend),
            None => self.drag.reset(),
        }
    }

    /// Per-frame work: camera controls, pending loads, store sync, notice aging
    pub fn tick(&mut self, backend: &mut dyn ResourceBackend, dt: f32) {
        self.notices.advance(dt);
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        ctx.camera.update(dt);

        for resolved in self.loads.poll() {
            self.resolve_load(backend, resolved);
        }
        self.sync_with_store(backend);
        self.retry_deferred_drops(backend);
    }

    fn retry_deferred_drops(&mut self, backend: &mut dyn ResourceBackend) {
        if self.deferred_drops.is_empty() || self.records_loading() {
            return;
        }
        for (kind, x, z) in std::mem::take(&mut self.deferred_drops) {
            let Some(mesh) = self.loads.get(kind) else {
                continue;
            };
            match self.place(backend, &mesh, x, z) {
                Ok(outcome) => log::debug!("deferred drop resolved: {:?}", outcome),
                Err(err) => log::trace!("deferred drop ignored: {}", err),
            }
        }
    }

    fn resolve_load(&mut self, backend: &mut dyn ResourceBackend, resolved: loads::Resolved) {
        let loads::Resolved { kind, result, waiters } = resolved;
        let mesh = match result {
            Ok(mesh) => mesh,
            Err(err) => {
                if waiters.contains(&LoadPurpose::Ghost) && self.drag.kind() == Some(kind) {
                    self.drag.mark_load_failed();
                }
                self.notices.push(
                    NoticeKind::AssetLoadFailed,
                    format!("could not load {}: {}", kind, err),
                );
                return;
            }
        };
        log::debug!("{} mesh resolved for {} waiters", kind, waiters.len());
        // Records of this kind can be derived now
        self.resync = true;

        for purpose in waiters {
            match purpose {
                LoadPurpose::Ghost => {
                    let Some(ctx) = self.context.as_mut() else {
                        continue;
                    };
                    if self.drag.kind() == Some(kind) && self.drag.ghost().is_none() {
                        // Colour as of now, not as of when the drag began
                        let color = self.store.active_color();
                        spawn_ghost(
                            &mut ctx.scene,
                            &mut self.drag,
                            backend,
                            &mesh,
                            color,
                            self.config.ghost_opacity,
                        );
                    }
                }
                LoadPurpose::Drop { x, z } => match self.place(backend, &mesh, x, z) {
                    Ok(outcome) => log::debug!("deferred drop resolved: {:?}", outcome),
                    Err(err) => log::trace!("deferred drop ignored: {}", err),
                },
                LoadPurpose::Derive => {}
            }
        }
    }

    /// Rebuilds placed nodes when the store's records no longer match them.
    /// Selection survives a rebuild by position key.
    pub fn sync_with_store(&mut self, backend: &mut dyn ResourceBackend) {
        if let Err(err) = self.try_sync_with_store(backend) {
            log::trace!("sync skipped: {}", err);
        }
    }

    fn try_sync_with_store(&mut self, backend: &mut dyn ResourceBackend) -> Result<()> {
        let revision = self.store.revision();
        if self.synced_revision == Some(revision) && !self.resync {
            return Ok(());
        }
        let ctx = require_context(&mut self.context)?;
        self.synced_revision = Some(revision);
        self.resync = false;

        let records = self.store.records();
        let mut kinds: Vec<PrototypeKind> = records.iter().map(|record| record.kind).collect();
        kinds.sort();
        kinds.dedup();
        for kind in kinds {
            if self.loads.get(kind).is_some() || self.loads.has_failed(kind) {
                continue;
            }
            if let Err(err) = self.loads.request(kind, LoadPurpose::Derive, &self.loader) {
                self.notices.push(
                    NoticeKind::AssetLoadFailed,
                    format!("could not load {}: {}", kind, err),
                );
            }
        }

        let mut wanted: Vec<_> = records
            .iter()
            .filter(|record| self.loads.get(record.kind).is_some())
            .map(|record| (record.key(), record.color, record.kind))
            .collect();
        let mut derived: Vec<_> = ctx
            .scene
            .placed()
            .filter_map(|(_, node)| derived_signature(node))
            .collect();
        wanted.sort();
        derived.sort();
        if wanted == derived {
            return Ok(());
        }

        let selected: Vec<PositionKey> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| ctx.scene.get(*id))
            .map(SceneNode::position_key)
            .collect();
        self.selection.clear(&mut ctx.scene, backend);

        let loads = &self.loads;
        let added = ctx.scene.rebuild_from_records(&records, backend, |_, record, backend| {
            let mesh = loads.get(record.kind)?;
            Some(factory::build_prototype(
                backend,
                &mesh,
                record.color,
                PrototypeStyle::Opaque,
                Vector3::from(record.position()),
            ))
        });

        let outline_color = self.config.outline_color;
        for (_, id) in added {
            let reselect = ctx
                .scene
                .get(id)
                .is_some_and(|node| selected.contains(&node.position_key()));
            if reselect {
                self.selection.add(id, &mut ctx.scene, backend, outline_color);
            }
        }
        Ok(())
    }
}
