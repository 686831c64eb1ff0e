//! # Spatial Queries
//!
//! Turns 2D pointer positions into 3D decisions: ground-plane placement
//! coordinates, the placed node under the cursor, and bounding-box overlap
//! between a candidate placement and what is already on the ground.
//!
//! ## How it works
//!
//! 1. **Pointer to Ray**: unproject the pointer through the inverse
//!    view-projection to a world-space ray
//! 2. **Ray queries**: intersect the ray with the ground plane or with the
//!    world-space bounding box of every placed mesh
//! 3. **Resolution**: the nearest hit wins; composite prototypes resolve to
//!    their top-level node, never to a child mesh
//!
//! ## Usage
//!
//! ```no_run
//! use plinth::gfx::picking::{pick_at, Viewport};
//! # fn demo(camera: &plinth::gfx::camera::OrbitCamera, scene: &plinth::gfx::scene::SceneGraph) {
//! let viewport = Viewport::new(1200, 800);
//! if let Some(id) = pick_at((600.0, 400.0), viewport, camera, scene) {
//!     log::info!("picked {:?}", id);
//! }
//! # }
//! ```

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    scene::{NodeId, SceneGraph, SceneNode},
};

/// Tolerance for box overlap; boxes sharing a face do not overlap
pub const OVERLAP_EPSILON: f32 = 1e-4;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the horizontal plane `y = height`
    pub fn intersect_horizontal_plane(&self, height: f32) -> Option<f32> {
        if self.direction.y.abs() < f32::EPSILON {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then_some(t)
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let mut min = Vector3::new(first[0], first[1], first[2]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            min.x = min.x.min(vertex[0]);
            min.y = min.y.min(vertex[1]);
            min.z = min.z.min(vertex[2]);
            max.x = max.x.max(vertex[0]);
            max.y = max.y.max(vertex[1]);
            max.z = max.z.max(vertex[2]);
        }

        Self::new(min, max)
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Box intersection with a small tolerance, so face-adjacent boxes pass
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x - OVERLAP_EPSILON
            && self.max.x > other.min.x + OVERLAP_EPSILON
            && self.min.y < other.max.y - OVERLAP_EPSILON
            && self.max.y > other.min.y + OVERLAP_EPSILON
            && self.min.z < other.max.z - OVERLAP_EPSILON
            && self.max.z > other.min.z + OVERLAP_EPSILON
    }

    /// Whether the ground footprint of the box contains `(x, z)`
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform all 8 corners of the AABB and compute new bounds
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed_corners: Vec<[f32; 3]> = corners
            .iter()
            .map(|corner| {
                let transformed = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
                [
                    transformed.x / transformed.w,
                    transformed.y / transformed.w,
                    transformed.z / transformed.w,
                ]
            })
            .collect();

        Self::from_vertices(&transformed_corners)
    }
}

/// Render surface size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Convert screen coordinates to a world-space ray
pub fn screen_to_ray(pointer: (f32, f32), viewport: Viewport, camera: &OrbitCamera) -> Option<Ray> {
    if viewport.is_empty() {
        return None;
    }
    let (mouse_x, mouse_y) = pointer;

    // Convert screen coordinates to normalized device coordinates (-1 to 1)
    let ndc_x = (2.0 * mouse_x) / viewport.width as f32 - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_y) / viewport.height as f32;

    let inv_view_proj = camera.view_projection_gl().invert()?;

    let world_near = inv_view_proj * Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
    let world_far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);

    let near_3d = world_near.truncate() / world_near.w;
    let far_3d = world_far.truncate() / world_far.w;

    let direction = far_3d - near_3d;
    if direction.magnitude2() <= f32::EPSILON {
        return None;
    }
    Some(Ray::new(near_3d, direction))
}

/// Projects a world point to pointer coordinates; `None` when behind the camera
pub fn project_to_screen(
    point: Vector3<f32>,
    viewport: Viewport,
    camera: &OrbitCamera,
) -> Option<(f32, f32)> {
    let clip = camera.view_projection_gl() * point.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some((
        (ndc.x + 1.0) * 0.5 * viewport.width as f32,
        (1.0 - ndc.y) * 0.5 * viewport.height as f32,
    ))
}

/// Unrounded hit of the pointer ray on the ground node's surface.
///
/// Only the ground is considered; a ray that leaves the ground's extent
/// misses.
pub fn ground_hit(
    pointer: (f32, f32),
    viewport: Viewport,
    camera: &OrbitCamera,
    ground: &SceneNode,
) -> Option<Vector3<f32>> {
    let ray = screen_to_ray(pointer, viewport, camera)?;
    let bounds = ground.world_bounds()?;
    let t = ray.intersect_horizontal_plane(ground.position().y)?;
    let hit = ray.point_at(t);
    bounds.contains_xz(hit.x, hit.z).then_some(hit)
}

/// Ground hit snapped to the nearest grid unit, as `(x, z)`
pub fn screen_to_world_on_ground(
    pointer: (f32, f32),
    viewport: Viewport,
    camera: &OrbitCamera,
    ground: &SceneNode,
    grid_size: f32,
) -> Option<(f32, f32)> {
    let hit = ground_hit(pointer, viewport, camera, ground)?;
    Some((snap(hit.x, grid_size), snap(hit.z, grid_size)))
}

/// Rounds to the nearest multiple of `grid`; normalises `-0.0` to `0.0`
pub fn snap(value: f32, grid: f32) -> f32 {
    let grid = if grid > 0.0 { grid } else { 1.0 };
    (value / grid).round() * grid + 0.0
}

/// Result of a pick against the scene graph
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// Top-level placed node that owns the hit mesh
    pub node: NodeId,
    /// Distance from camera to intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Casts the pointer ray against every interactive mesh of the scene group
pub fn pick(
    pointer: (f32, f32),
    viewport: Viewport,
    camera: &OrbitCamera,
    scene: &SceneGraph,
) -> Option<PickResult> {
    let ray = screen_to_ray(pointer, viewport, camera)?;
    let mut closest: Option<PickResult> = None;

    for (id, node) in scene.nodes() {
        if !node.kind.is_interactive() {
            continue;
        }

        node.for_each_mesh(Matrix4::identity(), &mut |mesh, world| {
            let Some(distance) = mesh.bounds.transform(&world).intersect_ray(&ray) else {
                return;
            };
            if closest.map_or(true, |best| distance < best.distance) {
                closest = Some(PickResult {
                    node: id,
                    distance,
                    intersection_point: ray.point_at(distance),
                });
            }
        });
    }

    closest
}

/// The placed node under the pointer, if any
pub fn pick_at(
    pointer: (f32, f32),
    viewport: Viewport,
    camera: &OrbitCamera,
    scene: &SceneGraph,
) -> Option<NodeId> {
    pick(pointer, viewport, camera, scene).map(|result| result.node)
}

/// Whether `candidate` at its current transform intersects any placed node
pub fn overlaps<'a>(candidate: &SceneNode, existing: impl IntoIterator<Item = &'a SceneNode>) -> bool {
    let Some(candidate_bounds) = candidate.world_bounds() else {
        return false;
    };

    existing
        .into_iter()
        .filter(|node| node.kind.is_placed())
        .filter_map(SceneNode::world_bounds)
        .any(|bounds| candidate_bounds.intersects(&bounds))
}
