// src/ui/panel.rs
//! Editor panels
//!
//! Panels only read a [`PanelSnapshot`] taken before the frame and report
//! what the user asked for as [`PanelAction`]s. The app applies them after
//! the frame has been submitted.

use crate::store::{Color, PrototypeKind};

/// Read-only view of the editor state the overlay displays
#[derive(Debug, Clone)]
pub struct PanelSnapshot {
    /// Palette entries with whether a model is available for them
    pub prototypes: Vec<(PrototypeKind, bool)>,
    pub palette: Vec<(String, Color)>,
    pub active_color: Color,
    pub placed: usize,
    pub selected: usize,
    pub pending_loads: usize,
    pub dragging: Option<PrototypeKind>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Pointer pressed and moved on a palette entry
    BeginDrag(PrototypeKind),
    SetColor(Color),
    ClearLayout,
}

/// Result of building the overlay for one frame
#[derive(Debug, Clone, Default)]
pub struct PanelFrame {
    pub actions: Vec<PanelAction>,
    /// Pointer is over any overlay window
    pub pointer_over_ui: bool,
}

/// Text for the selection line of the panel
pub fn selection_summary(selected: usize) -> String {
    match selected {
        0 => "Nothing selected".to_string(),
        1 => "1 object selected".to_string(),
        n => format!("{} objects selected", n),
    }
}

/// Palette, colour picker and layout controls
///
/// # Arguments
/// * `ui` - ImGui UI context
/// * `snapshot` - State to display
/// * `frame` - Collects the actions raised this frame
pub fn layout_panel(ui: &imgui::Ui, snapshot: &PanelSnapshot, frame: &mut PanelFrame) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Layout")
        .size([260.0, 360.0], imgui::Condition::FirstUseEver)
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            render_palette(ui, snapshot, frame);
            ui.separator();
            render_colors(ui, snapshot, frame);
            ui.separator();
            render_status(ui, snapshot, frame);
        });

    frame.pointer_over_ui |= ui.is_window_hovered_with_flags(
        imgui::WindowHoveredFlags::ANY_WINDOW
            | imgui::WindowHoveredFlags::ALLOW_WHEN_BLOCKED_BY_ACTIVE_ITEM,
    );
}

/// Drag sources, one per prototype
fn render_palette(ui: &imgui::Ui, snapshot: &PanelSnapshot, frame: &mut PanelFrame) {
    ui.text("Objects");
    ui.text_disabled("Drag onto the ground");
    ui.spacing();

    for (kind, available) in &snapshot.prototypes {
        let highlighted = snapshot.dragging == Some(*kind);
        let label = if highlighted {
            format!("> {} <", kind.label())
        } else {
            kind.label().to_string()
        };
        ui.button_with_size(format!("{}##palette_{}", label, kind), [-1.0, 0.0]);
        if ui.is_item_active() && ui.is_mouse_dragging(imgui::MouseButton::Left) {
            frame.actions.push(PanelAction::BeginDrag(*kind));
        }
        if !available && ui.is_item_hovered() {
            ui.tooltip_text("No model configured (see --sofa-model)");
        }
    }
    ui.spacing();
}

fn render_colors(ui: &imgui::Ui, snapshot: &PanelSnapshot, frame: &mut PanelFrame) {
    ui.text("Color");
    ui.spacing();

    for (index, (name, color)) in snapshot.palette.iter().enumerate() {
        if index > 0 {
            ui.same_line();
        }
        if ui.color_button(format!("{}##color", name), color.to_rgba(1.0)) {
            frame.actions.push(PanelAction::SetColor(*color));
        }
        if ui.is_item_hovered() {
            ui.tooltip_text(name);
        }
    }

    let active_name = snapshot
        .palette
        .iter()
        .find(|(_, color)| *color == snapshot.active_color)
        .map(|(name, _)| name.as_str())
        .unwrap_or("Custom");
    ui.text(format!("Active: {} ({})", active_name, snapshot.active_color));
    ui.spacing();
}

fn render_status(ui: &imgui::Ui, snapshot: &PanelSnapshot, frame: &mut PanelFrame) {
    ui.columns(2, "layout_stats", false);
    ui.text("Placed:");
    ui.next_column();
    ui.text(format!("{}", snapshot.placed));
    ui.next_column();
    ui.text("Loading:");
    ui.next_column();
    ui.text(format!("{}", snapshot.pending_loads));
    ui.columns(1, "", false);

    ui.text(selection_summary(snapshot.selected));
    ui.text_disabled("Ctrl-click adds, Delete removes");
    ui.spacing();

    if ui.button_with_size("Clear layout", [-1.0, 0.0]) {
        frame.actions.push(PanelAction::ClearLayout);
    }
}

/// Transient messages stacked in the bottom-right corner
pub fn notice_toasts(ui: &imgui::Ui, notices: &[String]) {
    if notices.is_empty() {
        return;
    }
    let [width, height] = ui.io().display_size;
    if width <= 0.0 || height <= 0.0 {
        return;
    }

    ui.window("##notices")
        .position([width - 16.0, height - 16.0], imgui::Condition::Always)
        .position_pivot([1.0, 1.0])
        .bg_alpha(0.85)
        .no_decoration()
        .no_inputs()
        .always_auto_resize(true)
        .focus_on_appearing(false)
        .build(|| {
            for notice in notices {
                ui.text_colored([0.9, 0.3, 0.2, 1.0], notice);
            }
        });
}
