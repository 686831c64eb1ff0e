// src/lib.rs
//! Plinth layout editor
//!
//! An interactive 3D layout editor built on wgpu and winit. Objects are dragged
//! from a palette onto a ground plane, placed on a grid without overlapping,
//! then selected, recoloured and deleted.
//!
//! The interaction engine ([`editor::LayoutEditor`]) is independent of the
//! window: it talks to GPU memory through [`gfx::resources::ResourceBackend`]
//! and to the durable record list through [`store::LayoutStore`].

pub mod app;
pub mod assets;
pub mod config;
pub mod editor;
pub mod error;
pub mod gfx;
pub mod store;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::EditorApp;
pub use config::EditorConfig;
pub use editor::LayoutEditor;
pub use error::{EditorError, Result};
