// src/gfx/resources/mod.rs
//! Render resource management
//!
//! [`ResourceBackend`] is the allocation seam: the wgpu renderer implements it
//! with real buffers, [`HeadlessBackend`] with plain bookkeeping.

pub mod backend;
pub mod global_bindings;
pub mod headless;
pub mod material;
pub mod mesh_buffer;
pub mod texture_resource;

// Re-export main types
pub use backend::{GeometryId, MaterialDesc, MaterialId, ResourceBackend, ResourceStats};
pub use global_bindings::GlobalBindings;
pub use headless::HeadlessBackend;
pub use texture_resource::TextureResource;
