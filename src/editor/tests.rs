//! Headless end-to-end tests of the editor against the counting backend

use std::cell::RefCell;
use std::rc::Rc;

use cgmath::Vector3;
use futures::channel::oneshot;
use futures::FutureExt;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::*;
use crate::assets::{AssetLibrary, LoadFuture};
use crate::error::AssetLoadError;
use crate::gfx::geometry::generate_cube;
use crate::gfx::picking::project_to_screen;
use crate::gfx::resources::HeadlessBackend;
use crate::gfx::scene::NodeId;
use crate::store::MemoryStore;

/// Geometries and materials owned by the ground (plane plus grid)
const GROUND_MESHES: usize = 2;

/// Store that remembers every intent it was sent
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    intents: Vec<LayoutIntent>,
}

impl RecordingStore {
    fn with_color(color: Color) -> Self {
        Self {
            inner: MemoryStore::new(color),
            intents: Vec::new(),
        }
    }

    fn removals(&self) -> usize {
        self.intents
            .iter()
            .filter(|intent| matches!(intent, LayoutIntent::RemoveRecord(_)))
            .count()
    }
}

impl LayoutStore for RecordingStore {
    fn records(&self) -> Vec<PlacedObject> {
        self.inner.records()
    }

    fn active_color(&self) -> Color {
        self.inner.active_color()
    }

    fn revision(&self) -> u64 {
        self.inner.revision()
    }

    fn dispatch(&mut self, intent: LayoutIntent) {
        self.intents.push(intent.clone());
        self.inner.dispatch(intent);
    }
}

type Sender = oneshot::Sender<std::result::Result<PrototypeMesh, AssetLoadError>>;

/// Squares resolve at once; sofa loads wait until the test resolves them
#[derive(Clone, Default)]
struct ManualLoader {
    senders: Rc<RefCell<Vec<Sender>>>,
}

impl ManualLoader {
    fn resolve_sofa(&self) -> bool {
        let Some(sender) = self.senders.borrow_mut().pop() else {
            return false;
        };
        sender.send(Ok(sofa_mesh())).is_ok()
    }
}

impl PrototypeLoader for ManualLoader {
    fn load(&self, kind: PrototypeKind) -> LoadFuture {
        if kind == PrototypeKind::Square {
            return futures::future::ready(Ok(PrototypeMesh::cube())).boxed_local();
        }
        let (sender, receiver) = oneshot::channel();
        self.senders.borrow_mut().push(sender);
        async move { receiver.await.unwrap_or(Err(AssetLoadError::Abandoned)) }.boxed_local()
    }
}

/// Two cubes side by side, 2 x 1 x 1 overall
fn sofa_mesh() -> PrototypeMesh {
    let mut left = generate_cube();
    let mut right = generate_cube();
    left.vertices.iter_mut().for_each(|v| v[0] -= 0.5);
    right.vertices.iter_mut().for_each(|v| v[0] += 0.5);
    PrototypeMesh {
        kind: PrototypeKind::Sofa,
        parts: vec![left, right],
    }
}

fn mounted<S: LayoutStore, L: PrototypeLoader>(store: S, loader: L) -> (LayoutEditor<S, L>, HeadlessBackend) {
    let mut backend = HeadlessBackend::new();
    let mut editor = LayoutEditor::new(EditorConfig::default(), store, loader);
    editor.mount(&mut backend, Viewport::new(1200, 800));
    (editor, backend)
}

fn green_editor() -> (LayoutEditor<RecordingStore, AssetLibrary>, HeadlessBackend) {
    mounted(RecordingStore::with_color(Color::GREEN), AssetLibrary::default())
}

fn screen<S: LayoutStore, L: PrototypeLoader>(editor: &LayoutEditor<S, L>, point: Vector3<f32>) -> (f32, f32) {
    let ctx = editor.context().expect("editor is mounted");
    project_to_screen(point, ctx.viewport, &ctx.camera.camera).expect("point is in front of the camera")
}

fn on_ground<S: LayoutStore, L: PrototypeLoader>(editor: &LayoutEditor<S, L>, x: f32, z: f32) -> (f32, f32) {
    screen(editor, Vector3::new(x, 0.0, z))
}

fn drag_drop<S: LayoutStore, L: PrototypeLoader>(
    editor: &mut LayoutEditor<S, L>,
    backend: &mut HeadlessBackend,
    kind: PrototypeKind,
    x: f32,
    z: f32,
) -> PlacementOutcome {
    let transfer = DragTransfer::for_prototype(kind);
    let pointer = on_ground(editor, x, z);
    editor.drag_over(backend, &transfer, pointer);
    editor.drop(backend, &transfer, pointer)
}

fn click_cube<S: LayoutStore, L: PrototypeLoader>(
    editor: &mut LayoutEditor<S, L>,
    backend: &mut HeadlessBackend,
    x: f32,
    z: f32,
    additive: bool,
) {
    let pointer = screen(editor, Vector3::new(x, 0.5, z));
    editor.pointer_click(backend, pointer, additive);
}

fn scene<S: LayoutStore, L: PrototypeLoader>(editor: &LayoutEditor<S, L>) -> &SceneGraph {
    editor.scene().expect("editor is mounted")
}

#[test]
fn test_first_drop_commits_at_grid_cell() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::for_prototype(PrototypeKind::Square);
    let pointer = on_ground(&editor, 0.3, 1.4);

    assert!(editor.drag_over(&mut backend, &transfer, pointer));
    assert_eq!(scene(&editor).ghost_count(), 1);
    let ghost = editor.drag_session().ghost().unwrap();
    assert_eq!(scene(&editor).get(ghost).unwrap().position(), Vector3::new(0.0, 0.5, 1.0));

    let outcome = editor.drop(&mut backend, &transfer, pointer);
    assert_eq!(
        outcome,
        PlacementOutcome::Committed {
            position: [0.0, 0.5, 1.0],
            color: Color::GREEN
        }
    );
    assert_eq!(
        editor.store().records(),
        vec![PlacedObject::new([0.0, 0.5, 1.0], Color::GREEN, PrototypeKind::Square)]
    );
    assert_eq!(scene(&editor).ghost_count(), 0);
    assert_eq!(scene(&editor).placed_count(), 1);
    assert!(!editor.drag_session().is_active());
}

#[test]
fn test_drop_on_occupied_cell_is_rejected() {
    let (mut editor, mut backend) = green_editor();
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.3, 1.4);
    let stats_before = backend.stats();

    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, -0.2, 0.8);
    assert_eq!(
        outcome,
        PlacementOutcome::Rejected {
            position: [0.0, 0.5, 1.0]
        }
    );
    assert_eq!(editor.store().records().len(), 1);
    assert_eq!(editor.notices().len(), 1);
    assert_eq!(editor.notices()[0].kind, NoticeKind::PlacementRejected);

    // Candidate and ghost were both released
    let stats = backend.stats();
    assert_eq!(stats.live_geometries, stats_before.live_geometries);
    assert_eq!(stats.live_materials, stats_before.live_materials);
    assert_eq!(stats.stale_disposals, 0);
}

#[test]
fn test_face_adjacent_drop_is_allowed() {
    let (mut editor, mut backend) = green_editor();
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 0.0);
    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 1.0, 0.0);
    assert!(outcome.is_committed());
    assert_eq!(editor.store().records().len(), 2);
}

#[test]
fn test_recolor_selected_object() {
    let (mut editor, mut backend) = green_editor();
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.3, 1.4);
    click_cube(&mut editor, &mut backend, 0.0, 1.0, false);
    let SelectionState::Single(id) = editor.selection_state() else {
        panic!("expected a single selection");
    };

    editor.set_active_color(&mut backend, Color::BLUE);

    let material = scene(&editor).get(id).unwrap().mesh().unwrap().material;
    assert_eq!(backend.material_color(material), Some(Color::BLUE));
    assert!(editor
        .store()
        .intents
        .contains(&LayoutIntent::RecolorRecord {
            index: 0,
            color: Color::BLUE
        }));
    assert_eq!(editor.store().records()[0].color, Color::BLUE);
    assert_eq!(editor.store().active_color(), Color::BLUE);

    // The store now matches the scene, so the next tick keeps the same node
    editor.tick(&mut backend, 0.016);
    assert_eq!(editor.selection_state(), SelectionState::Single(id));
}

#[test]
fn test_modified_click_on_selected_node_empties_selection() {
    let (mut editor, mut backend) = green_editor();
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 1.0);

    click_cube(&mut editor, &mut backend, 0.0, 1.0, false);
    assert!(matches!(editor.selection_state(), SelectionState::Single(_)));
    assert_eq!(scene(&editor).outline_count(), 1);

    click_cube(&mut editor, &mut backend, 0.0, 1.0, true);
    assert_eq!(editor.selection_state(), SelectionState::Empty);
    assert_eq!(scene(&editor).outline_count(), 0);
}

#[test]
fn test_click_on_empty_space_clears_selection() {
    let (mut editor, mut backend) = green_editor();
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 1.0);
    click_cube(&mut editor, &mut backend, 0.0, 1.0, false);

    let empty = on_ground(&editor, -2.0, -2.0);
    editor.pointer_click(&mut backend, empty, true);
    assert_eq!(editor.selection_state(), SelectionState::Empty);
    assert_eq!(scene(&editor).outline_count(), 0);
}

#[test]
fn test_delete_multi_selection() {
    let (mut editor, mut backend) = green_editor();
    for x in [-2.0, 0.0, 2.0] {
        drag_drop(&mut editor, &mut backend, PrototypeKind::Square, x, 0.0);
    }
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, -3.0);

    click_cube(&mut editor, &mut backend, -2.0, 0.0, false);
    click_cube(&mut editor, &mut backend, 0.0, 0.0, true);
    click_cube(&mut editor, &mut backend, 2.0, 0.0, true);
    assert_eq!(editor.selection().len(), 3);
    assert_eq!(scene(&editor).outline_count(), 3);

    assert!(editor.key_pressed(&mut backend, EditorKey::Delete));

    assert_eq!(editor.selection_state(), SelectionState::Empty);
    assert_eq!(scene(&editor).placed_count(), 1);
    assert_eq!(scene(&editor).outline_count(), 0);
    assert_eq!(editor.store().removals(), 3);
    assert_eq!(
        editor.store().records(),
        vec![PlacedObject::new([0.0, 0.5, -3.0], Color::GREEN, PrototypeKind::Square)]
    );

    // Nothing selected, nothing to delete
    assert!(!editor.key_pressed(&mut backend, EditorKey::Backspace));
    assert_eq!(editor.store().removals(), 3);
}

#[test]
fn test_drag_leave_removes_ghost() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::for_prototype(PrototypeKind::Square);
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 1.0, 1.0));
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 2.0, 0.0));
    assert_eq!(scene(&editor).ghost_count(), 1);

    editor.drag_leave(&mut backend);
    editor.drag_leave(&mut backend);
    assert_eq!(scene(&editor).ghost_count(), 0);
    assert_eq!(backend.stats().live_geometries, GROUND_MESHES);
    assert!(editor.store().records().is_empty());
}

#[test]
fn test_ghost_follows_live_colour_while_hovering() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::for_prototype(PrototypeKind::Square);
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 0.0, 0.0));

    editor.set_active_color(&mut backend, Color::PURPLE);
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 1.0, 0.0));

    let ghost = editor.drag_session().ghost().unwrap();
    let node = scene(&editor).get(ghost).unwrap();
    assert_eq!(node.position(), Vector3::new(1.0, 0.5, 0.0));
    let material = node.mesh().unwrap().material;
    assert_eq!(backend.material_color(material), Some(Color::PURPLE));
    assert!(backend.material(material).unwrap().is_transparent());
}

#[test]
fn test_foreign_drag_is_ignored() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::new("text/plain", "hello");
    let pointer = on_ground(&editor, 0.0, 0.0);

    assert!(!editor.drag_over(&mut backend, &transfer, pointer));
    assert_eq!(editor.drop(&mut backend, &transfer, pointer), PlacementOutcome::Ignored);
    assert_eq!(scene(&editor).ghost_count(), 0);
    assert!(editor.store().intents.is_empty());
}

#[test]
fn test_drop_above_horizon_is_ignored() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::for_prototype(PrototypeKind::Square);
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 0.0, 0.0));

    let outcome = editor.drop(&mut backend, &transfer, (600.0, 0.0));
    assert_eq!(outcome, PlacementOutcome::Ignored);
    assert_eq!(scene(&editor).ghost_count(), 0);
    assert!(editor.store().records().is_empty());
    assert!(editor.notices().is_empty());
}

#[test]
fn test_handlers_are_no_ops_when_unmounted() {
    let mut backend = HeadlessBackend::new();
    let mut editor = LayoutEditor::new(
        EditorConfig::default(),
        RecordingStore::with_color(Color::GREEN),
        AssetLibrary::default(),
    );
    let transfer = DragTransfer::for_prototype(PrototypeKind::Square);

    editor.pointer_click(&mut backend, (10.0, 10.0), false);
    assert!(!editor.drag_over(&mut backend, &transfer, (10.0, 10.0)));
    assert_eq!(editor.drop(&mut backend, &transfer, (10.0, 10.0)), PlacementOutcome::Ignored);
    assert_eq!(editor.delete_selection(&mut backend), 0);
    assert_eq!(editor.recolor_selection(&mut backend, Color::BLUE), 0);
    editor.drag_leave(&mut backend);
    editor.tick(&mut backend, 0.016);
    editor.unmount(&mut backend);

    assert!(editor.notices().is_empty());
    assert_eq!(backend.stats().geometries_created, 0);
}

#[test]
fn test_mount_and_unmount_are_idempotent() {
    let store = MemoryStore::with_records(
        Color::GREEN,
        vec![
            PlacedObject::new([0.0, 0.5, 0.0], Color::GREEN, PrototypeKind::Square),
            PlacedObject::new([2.0, 0.5, 0.0], Color::BLUE, PrototypeKind::Square),
        ],
    );
    let (mut editor, mut backend) = mounted(store, AssetLibrary::default());
    editor.mount(&mut backend, Viewport::new(1200, 800));

    assert_eq!(scene(&editor).placed_count(), 2);
    assert_eq!(backend.stats().live_geometries, GROUND_MESHES + 2);

    click_cube(&mut editor, &mut backend, 2.0, 0.0, false);
    editor.unmount(&mut backend);
    editor.unmount(&mut backend);

    assert!(!editor.is_mounted());
    assert_eq!(editor.selection_state(), SelectionState::Empty);
    let stats = backend.stats();
    assert_eq!(stats.live_geometries, 0);
    assert_eq!(stats.live_materials, 0);
    assert_eq!(stats.stale_disposals, 0);

    // Remounting derives the same nodes again
    editor.mount(&mut backend, Viewport::new(1200, 800));
    assert_eq!(scene(&editor).placed_count(), 2);
}

#[test]
fn test_external_rebuild_keeps_selection() {
    let (mut editor, mut backend) = mounted(MemoryStore::new(Color::GREEN), AssetLibrary::default());
    drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 0.0);
    click_cube(&mut editor, &mut backend, 0.0, 0.0, false);
    let SelectionState::Single(before) = editor.selection_state() else {
        panic!("expected a single selection");
    };

    let mut records = editor.store().records();
    records.push(PlacedObject::new([3.0, 0.5, 0.0], Color::PURPLE, PrototypeKind::Square));
    editor.store_mut().replace_records(records);
    editor.tick(&mut backend, 0.016);

    assert_eq!(scene(&editor).placed_count(), 2);
    let SelectionState::Single(after) = editor.selection_state() else {
        panic!("selection was lost in the rebuild");
    };
    assert_ne!(before, after);
    assert_eq!(scene(&editor).get(after).unwrap().position(), Vector3::new(0.0, 0.5, 0.0));
    assert_eq!(scene(&editor).outline_count(), 1);

    // Removing the selected record externally drops it from the selection
    let remaining = vec![editor.store().records()[1]];
    editor.store_mut().replace_records(remaining);
    editor.tick(&mut backend, 0.016);
    assert_eq!(editor.selection_state(), SelectionState::Empty);
    assert_eq!(scene(&editor).outline_count(), 0);
    assert_eq!(backend.stats().live_geometries, GROUND_MESHES + 1);
}

#[test]
fn test_colour_change_during_ghost_load_is_applied() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(RecordingStore::with_color(Color::GREEN), loader.clone());
    let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);

    assert!(editor.drag_over(&mut backend, &transfer, on_ground(&editor, 0.0, 0.0)));
    assert_eq!(scene(&editor).ghost_count(), 0);
    assert_eq!(editor.pending_loads(), 1);

    editor.set_active_color(&mut backend, Color::BLUE);
    assert!(loader.resolve_sofa());
    editor.tick(&mut backend, 0.016);

    let ghost = editor.drag_session().ghost().expect("ghost appears once loaded");
    let node = scene(&editor).get(ghost).unwrap();
    assert_eq!(node.children().len(), 2);
    for part in node.children() {
        let material = part.mesh().unwrap().material;
        assert_eq!(backend.material_color(material), Some(Color::BLUE));
    }

    let outcome = editor.drop(&mut backend, &transfer, on_ground(&editor, 0.0, 0.0));
    assert_eq!(
        outcome,
        PlacementOutcome::Committed {
            position: [0.0, 0.5, 0.0],
            color: Color::BLUE
        }
    );
    assert_eq!(editor.store().records()[0].kind, PrototypeKind::Sofa);
}

#[test]
fn test_drop_during_load_commits_on_resolution() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(RecordingStore::with_color(Color::GREEN), loader.clone());
    let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);
    let pointer = on_ground(&editor, 2.0, -1.0);

    editor.drag_over(&mut backend, &transfer, pointer);
    assert_eq!(editor.drop(&mut backend, &transfer, pointer), PlacementOutcome::Pending);
    editor.set_active_color(&mut backend, Color::PURPLE);

    loader.resolve_sofa();
    editor.tick(&mut backend, 0.016);

    assert_eq!(
        editor.store().records(),
        vec![PlacedObject::new([2.0, 0.5, -1.0], Color::PURPLE, PrototypeKind::Sofa)]
    );
    assert_eq!(scene(&editor).placed_count(), 1);
    // The drag had already ended, so no ghost was built
    assert_eq!(scene(&editor).ghost_count(), 0);
}

/// Store already holding a blue sofa centred on the origin
fn store_with_sofa() -> RecordingStore {
    let mut store = RecordingStore::with_color(Color::GREEN);
    store.inner.dispatch(LayoutIntent::AddRecord(PlacedObject::new(
        [0.0, 0.5, 0.0],
        Color::BLUE,
        PrototypeKind::Sofa,
    )));
    store
}

fn assert_no_intersections<S: LayoutStore, L: PrototypeLoader>(editor: &LayoutEditor<S, L>) {
    let placed: Vec<_> = scene(editor)
        .placed()
        .filter_map(|(_, node)| node.world_bounds())
        .collect();
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            assert!(!a.intersects(b), "{:?} intersects {:?}", a, b);
        }
    }
}

#[test]
fn test_drop_over_loading_record_waits_then_rejects() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(store_with_sofa(), loader.clone());
    assert_eq!(editor.pending_loads(), 1);
    assert_eq!(scene(&editor).placed_count(), 0);

    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 0.0);
    assert_eq!(outcome, PlacementOutcome::Pending);
    assert_eq!(editor.store().records().len(), 1);
    assert_eq!(scene(&editor).ghost_count(), 0);

    assert!(loader.resolve_sofa());
    editor.tick(&mut backend, 0.016);

    assert_eq!(editor.store().records().len(), 1);
    assert_eq!(scene(&editor).placed_count(), 1);
    assert_eq!(editor.notices().len(), 1);
    assert_eq!(editor.notices()[0].kind, NoticeKind::PlacementRejected);
    assert_no_intersections(&editor);

    let stats = backend.stats();
    assert_eq!(stats.live_geometries, GROUND_MESHES + 2);
    assert_eq!(stats.stale_disposals, 0);
}

#[test]
fn test_drop_beside_loading_record_commits_once_loaded() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(store_with_sofa(), loader.clone());

    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 2.0, 0.0);
    assert_eq!(outcome, PlacementOutcome::Pending);

    // Still loading: the drop stays held back across ticks
    editor.tick(&mut backend, 0.016);
    assert_eq!(editor.store().records().len(), 1);

    loader.resolve_sofa();
    editor.tick(&mut backend, 0.016);

    assert_eq!(
        editor.store().records(),
        vec![
            PlacedObject::new([0.0, 0.5, 0.0], Color::BLUE, PrototypeKind::Sofa),
            PlacedObject::new([2.0, 0.5, 0.0], Color::GREEN, PrototypeKind::Square),
        ]
    );
    assert_eq!(scene(&editor).placed_count(), 2);
    assert_no_intersections(&editor);
}

#[test]
fn test_drop_over_record_with_failed_mesh_is_rejected() {
    // No sofa model configured, so the stored sofa can never be derived
    let (mut editor, mut backend) = mounted(store_with_sofa(), AssetLibrary::default());
    assert_eq!(scene(&editor).placed_count(), 0);
    assert_eq!(editor.notices()[0].kind, NoticeKind::AssetLoadFailed);

    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 0.0, 0.0);
    assert_eq!(
        outcome,
        PlacementOutcome::Rejected {
            position: [0.0, 0.5, 0.0]
        }
    );
    assert_eq!(editor.store().records().len(), 1);

    let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, 2.0, 0.0);
    assert!(outcome.is_committed());
    assert_eq!(editor.store().records().len(), 2);
}

#[test]
fn test_composite_outline_uses_bounding_box() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(RecordingStore::with_color(Color::GREEN), loader.clone());
    let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);
    let pointer = on_ground(&editor, 0.0, 0.0);
    editor.drop(&mut backend, &transfer, pointer);
    loader.resolve_sofa();
    editor.tick(&mut backend, 0.016);

    // Click the right-hand part; the whole sofa is selected
    editor.pointer_click(&mut backend, screen(&editor, Vector3::new(0.5, 0.5, 0.0)), false);
    let SelectionState::Single(id) = editor.selection_state() else {
        panic!("expected the sofa to be selected");
    };
    let scene = scene(&editor);
    let sofa = scene.get(id).unwrap();
    let (_, outline) = scene.nodes().find(|(_, node)| node.kind.is_outline()).unwrap();
    assert_eq!(outline.world_bounds(), sofa.world_bounds());
    assert_eq!(outline.kind, NodeKind::Outline { target: id });
}

#[test]
fn test_unmount_mid_load_attaches_nothing() {
    let loader = ManualLoader::default();
    let (mut editor, mut backend) = mounted(RecordingStore::with_color(Color::GREEN), loader.clone());
    let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);
    editor.drag_over(&mut backend, &transfer, on_ground(&editor, 0.0, 0.0));
    assert_eq!(editor.pending_loads(), 1);

    editor.unmount(&mut backend);
    assert_eq!(editor.pending_loads(), 0);
    // The load finishes after its receiver was dropped
    assert!(!loader.resolve_sofa());
    editor.tick(&mut backend, 0.016);

    assert!(editor.scene().is_none());
    assert_eq!(backend.stats().live_geometries, 0);
    assert_eq!(backend.stats().live_materials, 0);
}

#[test]
fn test_missing_model_raises_one_notice_per_attempt() {
    let (mut editor, mut backend) = green_editor();
    let transfer = DragTransfer::for_prototype(PrototypeKind::Sofa);
    let pointer = on_ground(&editor, 0.0, 0.0);

    editor.drag_over(&mut backend, &transfer, pointer);
    editor.drag_over(&mut backend, &transfer, pointer);
    assert_eq!(editor.notices().len(), 1);
    assert_eq!(editor.notices()[0].kind, NoticeKind::AssetLoadFailed);

    assert_eq!(editor.drop(&mut backend, &transfer, pointer), PlacementOutcome::Ignored);
    assert_eq!(editor.notices().len(), 2);
    assert!(editor.store().records().is_empty());
    assert_eq!(backend.stats().live_geometries, GROUND_MESHES);

    // Notices fade after their lifetime
    editor.tick(&mut backend, 3.5);
    assert!(editor.notices().is_empty());
}

#[test]
fn test_random_session_keeps_invariants() {
    let (mut editor, mut backend) = green_editor();
    let mut rng = StdRng::seed_from_u64(0x9e37);
    let palette = [Color::GREEN, Color::BLUE, Color::PURPLE];

    for _ in 0..60 {
        let x = rng.random_range(-2..=2) as f32;
        let z = rng.random_range(-4..=2) as f32;
        match rng.random_range(0..10) {
            0..=5 => {
                let before = editor.store().records().len();
                let outcome = drag_drop(&mut editor, &mut backend, PrototypeKind::Square, x, z);
                let after = editor.store().records().len();
                match outcome {
                    PlacementOutcome::Committed { .. } => assert_eq!(after, before + 1),
                    PlacementOutcome::Rejected { .. } => assert_eq!(after, before),
                    other => panic!("unexpected outcome {:?}", other),
                }
            }
            6 | 7 => click_cube(&mut editor, &mut backend, x, z, rng.random_bool(0.5)),
            8 => {
                let color = palette[rng.random_range(0..palette.len())];
                editor.set_active_color(&mut backend, color);
            }
            _ => {
                editor.key_pressed(&mut backend, EditorKey::Delete);
            }
        }
        editor.tick(&mut backend, 0.016);

        // Committed placements never intersect
        let placed: Vec<_> = scene(&editor)
            .placed()
            .filter_map(|(_, node)| node.world_bounds())
            .collect();
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.intersects(b), "{:?} intersects {:?}", a, b);
            }
        }
    }

    // Live resources are exactly those derivable from the final list
    let records = editor.store().records().len();
    let outlines = scene(&editor).outline_count();
    assert_eq!(scene(&editor).placed_count(), records);
    assert_eq!(outlines, editor.selection().len());
    let stats = backend.stats();
    assert_eq!(stats.live_geometries, GROUND_MESHES + records + outlines);
    assert_eq!(stats.live_materials, GROUND_MESHES + records + outlines);
    assert_eq!(stats.stale_disposals, 0);

    let selected: Vec<NodeId> = editor.selection().ids().to_vec();
    assert!(selected.iter().all(|id| scene(&editor).get(*id).is_some_and(|n| n.kind.is_placed())));
}
