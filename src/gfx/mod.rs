//! # Graphics Module
//!
//! Everything that turns the layout into pixels and pointer positions back
//! into scene hits.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with damped controls
//! - **Geometry** ([`geometry`]) - Primitive generators and bounding boxes
//! - **Factory** ([`factory`]) - Builds the scene, ground, prototypes and outlines
//! - **Picking** ([`picking`]) - Pointer rays and hit ordering
//! - **Rendering Pipeline** ([`rendering`]) - wgpu engine and pipelines
//! - **Resource Management** ([`resources`]) - Backend trait and GPU buffers
//! - **Scene Management** ([`scene`]) - Tagged node graph
//!
//! Scene code never talks to wgpu directly. It allocates through
//! [`ResourceBackend`], which the [`RenderEngine`] implements on the GPU and
//! [`resources::HeadlessBackend`] implements without one.
//!
//! [`ResourceBackend`]: resources::ResourceBackend

pub mod camera;
pub mod factory;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
