//! Scene nodes
//!
//! A [`SceneNode`] is a transform, an optional mesh and a list of children.
//! Composite prototypes are one top-level node with a child per mesh; every
//! leaf owns its own geometry and material and is disposed individually.

use cgmath::{Matrix4, One, Quaternion, Vector3, Zero};

use crate::gfx::{
    geometry::Topology,
    picking::Aabb,
    resources::{GeometryId, MaterialId, ResourceBackend},
};
use crate::store::{Color, PositionKey, PrototypeKind};

/// Stable handle of a top-level node in the scene group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// What a node is for; picking, overlap tests and disposal branch on this
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Derived from a store record
    Placed { prototype: PrototypeKind, color: Color },
    /// Translucent drag preview, at most one alive
    Ghost { prototype: PrototypeKind },
    /// Selection decoration for the given placed node
    Outline { target: NodeId },
    Ground,
    /// Child mesh of a composite node
    Part,
}

impl NodeKind {
    /// Only placed nodes take part in picking
    pub fn is_interactive(&self) -> bool {
        self.is_placed()
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, NodeKind::Placed { .. })
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self, NodeKind::Ghost { .. })
    }

    pub fn is_outline(&self) -> bool {
        matches!(self, NodeKind::Outline { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::zero(),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Render resources of a single mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPart {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub topology: Topology,
    /// Local-space bounds of the geometry
    pub bounds: Aabb,
}

#[derive(Debug)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub transform: Transform,
    mesh: Option<MeshPart>,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// Node without a mesh, used as the parent of composite parts
    pub fn group(kind: NodeKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(kind: NodeKind, transform: Transform, mesh: MeshPart) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(kind, transform)
        }
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn mesh(&self) -> Option<&MeshPart> {
        self.mesh.as_ref()
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.translation
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.translation = position;
    }

    pub fn position_key(&self) -> PositionKey {
        let p = self.transform.translation;
        PositionKey::from_position(p.x, p.y, p.z)
    }

    /// Visits every mesh with its world matrix, depth first
    pub fn for_each_mesh<F>(&self, parent: Matrix4<f32>, f: &mut F)
    where
        F: FnMut(&MeshPart, Matrix4<f32>),
    {
        let world = parent * self.transform.matrix();
        if let Some(mesh) = &self.mesh {
            f(mesh, world);
        }
        for child in &self.children {
            child.for_each_mesh(world, f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(Matrix4::one(), &mut |_, _| count += 1);
        count
    }

    /// World-space box around every mesh; `None` once disposed
    pub fn world_bounds(&self) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        self.for_each_mesh(Matrix4::one(), &mut |mesh, world| {
            let mesh_bounds = mesh.bounds.transform(&world);
            bounds = Some(match bounds {
                Some(acc) => acc.union(&mesh_bounds),
                None => mesh_bounds,
            });
        });
        bounds
    }

    /// Sets every material of the node and its descendants to `color`
    pub fn set_color(&mut self, backend: &mut dyn ResourceBackend, color: Color) {
        if let NodeKind::Placed { color: current, .. } = &mut self.kind {
            *current = color;
        }
        if let Some(mesh) = &self.mesh {
            backend.set_material_color(mesh.material, color);
        }
        for child in &mut self.children {
            child.set_color(backend, color);
        }
    }

    /// Releases every leaf's geometry and material. Safe to call repeatedly.
    pub fn dispose(&mut self, backend: &mut dyn ResourceBackend) {
        if let Some(mesh) = self.mesh.take() {
            backend.dispose_geometry(mesh.geometry);
            backend.dispose_material(mesh.material);
        }
        for child in &mut self.children {
            child.dispose(backend);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.mesh.is_none() && self.children.iter().all(SceneNode::is_disposed)
    }
}
