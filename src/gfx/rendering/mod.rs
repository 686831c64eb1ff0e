//! Rendering system for the scene
//!
//! Provides the wgpu render engine and the pipeline manager it compiles its
//! scene pipelines with.

pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
