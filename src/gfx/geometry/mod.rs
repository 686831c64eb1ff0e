//! # Procedural Geometry Generation
//!
//! CPU-side geometry for the shapes the editor needs without model files:
//! the unit cube prototype, the ground plane and the box-edge overlay used
//! for selection outlines.
//!
//! ## Usage
//!
//! ```rust
//! use plinth::gfx::geometry::{generate_cube, generate_plane, generate_box_edges};
//!
//! let cube = generate_cube();
//! let ground = generate_plane(50.0, 50.0, 1, 1);
//! let edges = generate_box_edges([1.0, 1.0, 1.0]);
//! assert_eq!(edges.indices.len(), 24);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::picking::Aabb;
use crate::gfx::scene::vertex::Vertex3D;

/// How the index buffer of a geometry is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z); may be empty for line geometry
    pub normals: Vec<[f32; 3]>,
    /// Triangle or line-segment indices
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounding box of the vertices
    pub fn bounds(&self) -> Aabb {
        Aabb::from_vertices(&self.vertices)
    }

    /// Interleaves positions and normals into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}
