//! Resource backend abstraction
//!
//! Everything that allocates GPU memory goes through [`ResourceBackend`]. The
//! scene graph only stores the returned ids and hands them back for disposal,
//! which keeps ownership explicit: whoever holds a [`MeshPart`] owns its
//! geometry and material.
//!
//! [`MeshPart`]: crate::gfx::scene::MeshPart

use crate::gfx::geometry::{GeometryData, Topology};
use crate::store::Color;

/// Handle to an uploaded vertex/index buffer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

/// Handle to a material (colour uniform plus render state)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Description of a material at creation time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    pub color: Color,
    /// 1.0 is opaque; anything lower is alpha blended
    pub opacity: f32,
    pub depth_write: bool,
    /// Unlit materials ignore the light rig (outline edges)
    pub lit: bool,
}

impl MaterialDesc {
    /// Opaque lit surface, used by placed objects and the ground
    pub fn opaque(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            depth_write: true,
            lit: true,
        }
    }

    /// Translucent preview surface that never occludes what is behind it
    pub fn ghost(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, 1.0),
            depth_write: false,
            lit: true,
        }
    }

    /// Flat-coloured line overlay
    pub fn line(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            depth_write: true,
            lit: false,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    pub fn rgba(&self) -> [f32; 4] {
        self.color.to_rgba(self.opacity)
    }
}

/// Live and lifetime resource counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub live_geometries: usize,
    pub live_materials: usize,
    pub geometries_created: usize,
    pub materials_created: usize,
    /// Dispose calls on ids that were unknown or already released
    pub stale_disposals: usize,
}

/// Allocator and owner of render resources.
///
/// Disposal is idempotent: releasing an unknown or already-released id is
/// counted in [`ResourceStats::stale_disposals`] and otherwise ignored.
pub trait ResourceBackend {
    fn create_geometry(&mut self, data: &GeometryData, topology: Topology) -> GeometryId;

    fn create_material(&mut self, desc: &MaterialDesc) -> MaterialId;

    /// Updates the colour of a live material in place
    fn set_material_color(&mut self, id: MaterialId, color: Color);

    fn dispose_geometry(&mut self, id: GeometryId);

    fn dispose_material(&mut self, id: MaterialId);

    fn stats(&self) -> ResourceStats;
}
