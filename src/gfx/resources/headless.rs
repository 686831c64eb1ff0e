//! In-memory resource backend
//!
//! Keeps descriptors instead of GPU buffers. Used by the test-suite and by
//! anything that needs to drive the editor without a window.

use std::collections::HashMap;

use super::backend::{GeometryId, MaterialDesc, MaterialId, ResourceBackend, ResourceStats};
use crate::gfx::geometry::{GeometryData, Topology};
use crate::store::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRecord {
    pub vertex_count: usize,
    pub index_count: usize,
    pub topology: Topology,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    geometries: HashMap<GeometryId, GeometryRecord>,
    materials: HashMap<MaterialId, MaterialDesc>,
    stats: ResourceStats,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryRecord> {
        self.geometries.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials.get(&id)
    }

    pub fn material_color(&self, id: MaterialId) -> Option<Color> {
        self.materials.get(&id).map(|desc| desc.color)
    }
}

impl ResourceBackend for HeadlessBackend {
    fn create_geometry(&mut self, data: &GeometryData, topology: Topology) -> GeometryId {
        let id = GeometryId(self.allocate());
        self.geometries.insert(
            id,
            GeometryRecord {
                vertex_count: data.vertex_count(),
                index_count: data.indices.len(),
                topology,
            },
        );
        self.stats.geometries_created += 1;
        id
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> MaterialId {
        let id = MaterialId(self.allocate());
        self.materials.insert(id, *desc);
        self.stats.materials_created += 1;
        id
    }

    fn set_material_color(&mut self, id: MaterialId, color: Color) {
        match self.materials.get_mut(&id) {
            Some(desc) => desc.color = color,
            None => log::warn!("recolor of unknown material {:?}", id),
        }
    }

    fn dispose_geometry(&mut self, id: GeometryId) {
        if self.geometries.remove(&id).is_none() {
            log::debug!("geometry {:?} already disposed", id);
            self.stats.stale_disposals += 1;
        }
    }

    fn dispose_material(&mut self, id: MaterialId) {
        if self.materials.remove(&id).is_none() {
            log::debug!("material {:?} already disposed", id);
            self.stats.stale_disposals += 1;
        }
    }

    fn stats(&self) -> ResourceStats {
        ResourceStats {
            live_geometries: self.geometries.len(),
            live_materials: self.materials.len(),
            ..self.stats
        }
    }
}
