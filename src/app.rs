//! Windowed host for the layout editor
//!
//! Translates winit events into editor calls. The palette lives in the imgui
//! overlay: pressing and dragging an entry starts a drag, moving over the
//! viewport shows the ghost, and releasing drops it.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition, PhysicalSize},
    error::EventLoopError,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::AssetLibrary,
    config::EditorConfig,
    editor::{DragTransfer, EditorKey, FrameLoop, LayoutEditor, PlacementOutcome},
    gfx::{camera::CameraUniform, picking::Viewport, RenderEngine},
    store::{LayoutIntent, LayoutStore, MemoryStore, PrototypeKind},
    ui::{layout_panel, notice_toasts, PanelAction, PanelFrame, PanelSnapshot, UiManager},
};

/// Pointer travel in pixels that turns a press into a camera drag
const CLICK_SLOP: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: (f32, f32),
    moved: bool,
}

pub struct EditorApp {
    editor: LayoutEditor<MemoryStore, AssetLibrary>,
    prototypes: Vec<(PrototypeKind, bool)>,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    frame_loop: FrameLoop,
    pointer: (f32, f32),
    press: Option<Press>,
    palette_drag: Option<PrototypeKind>,
    pointer_over_ui: bool,
    modifiers: ModifiersState,
}

impl EditorApp {
    pub fn new(config: EditorConfig, store: MemoryStore, library: AssetLibrary) -> Self {
        let prototypes = PrototypeKind::ALL
            .iter()
            .map(|kind| (*kind, library.has_model(*kind)))
            .collect();

        Self {
            editor: LayoutEditor::new(config, store, library),
            prototypes,
            window: None,
            render_engine: None,
            ui_manager: None,
            frame_loop: FrameLoop::new(),
            pointer: (0.0, 0.0),
            press: None,
            palette_drag: None,
            pointer_over_ui: false,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> Result<(), EventLoopError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)
    }

    fn snapshot(&self) -> PanelSnapshot {
        let config = self.editor.config();
        PanelSnapshot {
            prototypes: self.prototypes.clone(),
            palette: config.palette.clone(),
            active_color: self.editor.store().active_color(),
            placed: self.editor.scene().map_or(0, |scene| scene.placed_count()),
            selected: self.editor.selection().len(),
            pending_loads: self.editor.pending_loads(),
            dragging: self.palette_drag,
            notices: self.editor.notices().iter().map(|n| n.to_string()).collect(),
        }
    }

    fn set_camera_enabled(&mut self, enabled: bool) {
        if let Some(camera) = self.editor.camera_mut() {
            camera.controller.set_enabled(enabled);
        }
    }

    fn begin_palette_drag(&mut self, kind: PrototypeKind) {
        if self.palette_drag.is_some() {
            return;
        }
        log::debug!("palette drag of {} started", kind);
        self.palette_drag = Some(kind);
        self.press = None;
        self.set_camera_enabled(false);
    }

    fn end_palette_drag(&mut self, drop: bool) {
        let Some(kind) = self.palette_drag.take() else {
            return;
        };
        self.set_camera_enabled(true);
        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };

        if drop && !self.pointer_over_ui {
            let transfer = DragTransfer::for_prototype(kind);
            match self.editor.drop(engine, &transfer, self.pointer) {
                PlacementOutcome::Committed { position, color } => {
                    log::info!("placed {} at {:?} in {}", kind, position, color)
                }
                outcome => log::debug!("drop of {} ended as {:?}", kind, outcome),
            }
        } else {
            self.editor.drag_leave(engine);
        }
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        self.pointer = (position.x as f32, position.y as f32);

        if let Some(press) = self.press.as_mut() {
            let (dx, dy) = (self.pointer.0 - press.origin.0, self.pointer.1 - press.origin.1);
            if dx * dx + dy * dy > CLICK_SLOP * CLICK_SLOP {
                press.moved = true;
            }
        }

        let Some(kind) = self.palette_drag else {
            return;
        };
        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };
        if self.pointer_over_ui {
            self.editor.drag_leave(engine);
        } else {
            let transfer = DragTransfer::for_prototype(kind);
            self.editor.drag_over(engine, &transfer, self.pointer);
        }
    }

    fn primary_button(&mut self, state: ElementState, captured: bool) {
        match state {
            ElementState::Pressed => {
                if captured || self.palette_drag.is_some() {
                    return;
                }
                self.press = Some(Press {
                    origin: self.pointer,
                    moved: false,
                });
                if let Some(camera) = self.editor.camera_mut() {
                    camera.controller.set_mouse_pressed(true);
                }
            }
            ElementState::Released => {
                if let Some(camera) = self.editor.camera_mut() {
                    camera.controller.set_mouse_pressed(false);
                }
                if self.palette_drag.is_some() {
                    self.end_palette_drag(true);
                    return;
                }
                let Some(press) = self.press.take() else {
                    return;
                };
                if press.moved {
                    return;
                }
                let additive = self.modifiers.control_key() || self.modifiers.super_key();
                if let Some(engine) = self.render_engine.as_mut() {
                    self.editor.pointer_click(engine, self.pointer, additive);
                }
            }
        }
    }

    fn keyboard_input(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let key = match code {
            KeyCode::Delete => EditorKey::Delete,
            KeyCode::Backspace => EditorKey::Backspace,
            KeyCode::Escape => EditorKey::Escape,
            _ => {
                if let Some(camera) = self.editor.camera_mut() {
                    camera.process_keyboard_event(event);
                }
                return;
            }
        };
        if event.state != ElementState::Pressed {
            return;
        }
        if key == EditorKey::Escape {
            self.end_palette_drag(false);
        }
        if let Some(engine) = self.render_engine.as_mut() {
            self.editor.key_pressed(engine, key);
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>) {
        if let Some(engine) = self.render_engine.as_mut() {
            engine.resize(size.width, size.height);
        }
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            ui_manager.update_display_size(size.width, size.height);
        }
        self.editor.resize(Viewport::new(size.width, size.height));
    }

    fn redraw(&mut self) {
        let Some(dt) = self.frame_loop.tick(Instant::now()) else {
            return;
        };
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };
        self.editor.tick(engine, dt);

        let snapshot = self.snapshot();
        let mut frame = PanelFrame::default();
        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };
        let Some(scene) = self.editor.scene() else {
            return;
        };
        let camera: CameraUniform = self
            .editor
            .context()
            .map(|ctx| ctx.camera.uniform())
            .unwrap_or_default();

        let result = match self.ui_manager.as_mut() {
            Some(ui_manager) => engine.render_frame(
                scene,
                &camera,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     view: &wgpu::TextureView| {
                        ui_manager.draw(device, queue, encoder, &window, view, |ui| {
                            layout_panel(ui, &snapshot, &mut frame);
                            notice_toasts(ui, &snapshot.notices);
                        });
                    },
                ),
            ),
            None => engine.render_frame(
                scene,
                &camera,
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            ),
        };
        if let Err(e) = result {
            log::error!("frame failed: {}", e);
        }

        self.pointer_over_ui = frame.pointer_over_ui;
        for action in frame.actions {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: PanelAction) {
        match action {
            PanelAction::BeginDrag(kind) => self.begin_palette_drag(kind),
            PanelAction::SetColor(color) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    self.editor.set_active_color(engine, color);
                }
            }
            PanelAction::ClearLayout => {
                log::info!("clearing layout");
                self.editor.store_mut().dispatch(LayoutIntent::Reset);
            }
        }
    }

    fn shut_down(&mut self) {
        self.frame_loop.stop();
        if let Some(engine) = self.render_engine.as_mut() {
            self.editor.unmount(engine);
        }
        if let Some(path) = self.editor.config().layout_path.clone() {
            if let Err(e) = self.editor.store().save_json(&path) {
                log::error!("could not save layout: {}", e);
            }
        }
    }
}

impl ApplicationHandler for EditorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = self.editor.config();
        let attributes = WindowAttributes::default()
            .with_title("Plinth")
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let window_clone = window.clone();
        let engine = match pollster::block_on(RenderEngine::new(window_clone, width, height)) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("could not start renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut ui_manager = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.window = Some(window);
        self.ui_manager = Some(ui_manager);
        let engine = self.render_engine.insert(engine);
        self.editor.mount(engine, Viewport::new(width, height));
        self.frame_loop.start();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let captured = match self.ui_manager.as_mut() {
            Some(ui_manager) => ui_manager.handle_input(&window, window_id, &event),
            None => false,
        };

        match event {
            WindowEvent::CursorMoved { position, .. } => self.pointer_moved(position),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.primary_button(state, captured),
            WindowEvent::CursorLeft { .. } => {
                if self.palette_drag.is_some() {
                    if let Some(engine) = self.render_engine.as_mut() {
                        self.editor.drag_leave(engine);
                    }
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } if !captured => self.keyboard_input(&event),
            WindowEvent::Resized(size) => self.resized(size),
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.palette_drag.is_some() {
            return;
        }
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.wants_input() {
                return;
            }
        }
        if let Some(camera) = self.editor.camera_mut() {
            camera.process_event(&event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.frame_loop.is_running() {
            return;
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shut_down();
    }
}
