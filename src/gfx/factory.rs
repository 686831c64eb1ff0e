//! Geometry and resource factory
//!
//! Builds the camera, ground, light rig, prototype nodes and selection
//! outlines. Every function that allocates through the backend returns a
//! node the caller owns; the factory keeps nothing.

use cgmath::{ElementWise, Rotation, Vector3};

use crate::assets::PrototypeMesh;
use crate::config::EditorConfig;
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    geometry::{generate_box_edges, generate_grid_lines, generate_plane, GeometryData, Topology},
    picking::Viewport,
    resources::{MaterialDesc, ResourceBackend},
    scene::{LightRig, MeshPart, NodeId, NodeKind, SceneGraph, SceneNode, Transform},
};
use crate::store::Color;

/// Lift of the grid overlay above the ground surface
const GRID_LIFT: f32 = 0.002;
const GRID_COLOR: Color = Color(0x888888);

/// How a prototype node is rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrototypeStyle {
    /// Full-fidelity placed object
    Opaque,
    /// Translucent, non-depth-writing drag preview
    Ghost { opacity: f32 },
}

pub fn create_scene(config: &EditorConfig) -> SceneGraph {
    let mut scene = SceneGraph::new(config.background);
    scene.lights = create_light_rig();
    scene
}

/// Ambient fill at 0.7 plus a white directional light from (5, 10, 5)
pub fn create_light_rig() -> LightRig {
    LightRig {
        ambient_color: Color(0xffffff),
        ambient_intensity: 0.7,
        directional_color: Color(0xffffff),
        directional_position: Vector3::new(5.0, 10.0, 5.0),
        directional_intensity: 1.0,
    }
}

pub fn create_camera(viewport: Viewport, config: &EditorConfig) -> CameraManager {
    let camera = OrbitCamera::looking_at(config.camera_eye, config.camera_target, viewport.aspect())
        .with_projection(config.camera_fov, config.camera_near, config.camera_far);
    let controller = CameraController::new(0.005, 0.1).with_damping(config.orbit_damping);
    CameraManager::new(camera, controller)
}

fn upload(
    backend: &mut dyn ResourceBackend,
    data: &GeometryData,
    topology: Topology,
    material: MaterialDesc,
) -> MeshPart {
    MeshPart {
        geometry: backend.create_geometry(data, topology),
        material: backend.create_material(&material),
        topology,
        bounds: data.bounds(),
    }
}

/// Horizontal ground plane with a grid overlay, the target of ground queries
pub fn create_ground_plane(backend: &mut dyn ResourceBackend, config: &EditorConfig) -> SceneNode {
    let size = config.ground_size;
    let plane = generate_plane(size, size, 1, 1);
    let mut ground = SceneNode::with_mesh(
        NodeKind::Ground,
        Transform::default(),
        upload(backend, &plane, Topology::Triangles, MaterialDesc::opaque(config.ground_color)),
    );

    let divisions = (size / config.grid_size.max(f32::EPSILON)).round().max(1.0) as u32;
    let grid = generate_grid_lines(size, divisions);
    ground.add_child(SceneNode::with_mesh(
        NodeKind::Part,
        Transform::from_translation(Vector3::new(0.0, GRID_LIFT, 0.0)),
        upload(backend, &grid, Topology::Lines, MaterialDesc::line(GRID_COLOR)),
    ));
    ground
}

/// Instantiates a prototype at `position` with a fresh material per mesh
pub fn build_prototype(
    backend: &mut dyn ResourceBackend,
    mesh: &PrototypeMesh,
    color: Color,
    style: PrototypeStyle,
    position: Vector3<f32>,
) -> SceneNode {
    let (kind, material) = match style {
        PrototypeStyle::Opaque => (
            NodeKind::Placed {
                prototype: mesh.kind,
                color,
            },
            MaterialDesc::opaque(color),
        ),
        PrototypeStyle::Ghost { opacity } => (
            NodeKind::Ghost {
                prototype: mesh.kind,
            },
            MaterialDesc::ghost(color, opacity),
        ),
    };
    let transform = Transform::from_translation(position);

    match mesh.parts.as_slice() {
        [single] => SceneNode::with_mesh(
            kind,
            transform,
            upload(backend, single, Topology::Triangles, material),
        ),
        parts => {
            let mut node = SceneNode::group(kind, transform);
            for part in parts {
                node.add_child(SceneNode::with_mesh(
                    NodeKind::Part,
                    Transform::default(),
                    upload(backend, part, Topology::Triangles, material),
                ));
            }
            node
        }
    }
}

/// Edge overlay marking `target` as selected.
///
/// Single-mesh nodes get their own box edges under the node's transform.
/// Composites get the edges of their world bounding box, centred on it.
pub fn create_outline(
    backend: &mut dyn ResourceBackend,
    target_id: NodeId,
    target: &SceneNode,
    color: Color,
) -> Option<SceneNode> {
    let kind = NodeKind::Outline { target: target_id };
    let material = MaterialDesc::line(color);

    let (size, transform) = match target.mesh() {
        Some(mesh) => {
            let local = target.transform;
            let center = local
                .rotation
                .rotate_vector(mesh.bounds.center().mul_element_wise(local.scale));
            (
                mesh.bounds.size(),
                Transform {
                    translation: local.translation + center,
                    ..local
                },
            )
        }
        None => {
            let bounds = target.world_bounds()?;
            (bounds.size(), Transform::from_translation(bounds.center()))
        }
    };

    let edges = generate_box_edges([size.x, size.y, size.z]);
    Some(SceneNode::with_mesh(
        kind,
        transform,
        upload(backend, &edges, Topology::Lines, material),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::picking::{ground_hit, project_to_screen};
    use crate::gfx::resources::HeadlessBackend;
    use crate::store::PrototypeKind;

    fn two_part_mesh() -> PrototypeMesh {
        let mut left = crate::gfx::geometry::generate_cube();
        let mut right = crate::gfx::geometry::generate_cube();
        left.vertices.iter_mut().for_each(|v| v[0] -= 0.5);
        right.vertices.iter_mut().for_each(|v| v[0] += 0.5);
        PrototypeMesh {
            kind: PrototypeKind::Sofa,
            parts: vec![left, right],
        }
    }

    #[test]
    fn test_scene_carries_light_rig() {
        let scene = create_scene(&EditorConfig::default());
        assert_eq!(scene.lights.ambient_intensity, 0.7);
        assert_eq!(scene.lights.directional_position, Vector3::new(5.0, 10.0, 5.0));
        assert_eq!(scene.lights.directional_intensity, 1.0);
        assert_ne!(scene.lights, LightRig::default());
    }

    #[test]
    fn test_ground_is_ray_target() {
        let config = EditorConfig::default();
        let mut backend = HeadlessBackend::new();
        let ground = create_ground_plane(&mut backend, &config);
        assert_eq!(ground.mesh_count(), 2);

        let viewport = Viewport::new(1200, 800);
        let camera = create_camera(viewport, &config);
        let target = Vector3::new(2.0, 0.0, -3.0);
        let pointer = project_to_screen(target, viewport, &camera.camera).unwrap();
        let hit = ground_hit(pointer, viewport, &camera.camera, &ground).unwrap();
        assert!((hit.x - 2.0).abs() < 1e-3 && (hit.z + 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_ghost_material_is_translucent() {
        let mut backend = HeadlessBackend::new();
        let node = build_prototype(
            &mut backend,
            &PrototypeMesh::cube(),
            Color::GREEN,
            PrototypeStyle::Ghost { opacity: 0.5 },
            Vector3::new(0.0, 0.5, 0.0),
        );
        assert!(node.kind.is_ghost());
        let desc = backend.material(node.mesh().unwrap().material).unwrap();
        assert!(desc.is_transparent());
        assert!(!desc.depth_write);
    }

    #[test]
    fn test_composite_prototype_has_one_child_per_part() {
        let mut backend = HeadlessBackend::new();
        let node = build_prototype(
            &mut backend,
            &two_part_mesh(),
            Color::PURPLE,
            PrototypeStyle::Opaque,
            Vector3::new(3.0, 0.5, 0.0),
        );
        assert!(node.mesh().is_none());
        assert_eq!(node.children().len(), 2);
        assert_eq!(backend.stats().live_materials, 2);
    }

    #[test]
    fn test_outline_variants_match_target_bounds() {
        let mut backend = HeadlessBackend::new();
        let cube = build_prototype(
            &mut backend,
            &PrototypeMesh::cube(),
            Color::GREEN,
            PrototypeStyle::Opaque,
            Vector3::new(1.0, 0.5, 2.0),
        );
        let outline = create_outline(&mut backend, NodeId(1), &cube, Color::YELLOW).unwrap();
        assert_eq!(outline.world_bounds(), cube.world_bounds());
        assert_eq!(outline.mesh().unwrap().topology, Topology::Lines);

        let sofa = build_prototype(
            &mut backend,
            &two_part_mesh(),
            Color::GREEN,
            PrototypeStyle::Opaque,
            Vector3::new(-2.0, 0.5, 0.0),
        );
        let outline = create_outline(&mut backend, NodeId(2), &sofa, Color::YELLOW).unwrap();
        assert_eq!(outline.position(), sofa.world_bounds().unwrap().center());
        assert_eq!(outline.world_bounds(), sofa.world_bounds());
    }
}
