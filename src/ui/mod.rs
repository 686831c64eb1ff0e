//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the scene.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu
//! - [`panel`] - The layout panel (palette, colours, counts) and notice toasts
//!
//! ## Input Handling
//!
//! While ImGui wants the mouse or keyboard the app keeps events away from the
//! camera and the editor, so clicking a colour button never clears the
//! selection underneath it.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{layout_panel, notice_toasts, PanelAction, PanelFrame, PanelSnapshot};
