//! Prototype meshes and the asynchronous load capability
//!
//! A [`PrototypeLoader`] turns a [`PrototypeKind`] into CPU-side geometry.
//! The result carries no colour; the editor applies the active colour at the
//! moment the load resolves, so a colour change during a slow load is never
//! lost.

use std::path::{Path, PathBuf};
use std::thread;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::AssetLoadError;
use crate::gfx::geometry::{generate_cube, GeometryData};
use crate::gfx::picking::Aabb;
use crate::store::PrototypeKind;

pub type LoadFuture = LocalBoxFuture<'static, Result<PrototypeMesh, AssetLoadError>>;

/// Geometry of one prototype, one entry per mesh
#[derive(Debug, Clone)]
pub struct PrototypeMesh {
    pub kind: PrototypeKind,
    pub parts: Vec<GeometryData>,
}

impl PrototypeMesh {
    pub fn cube() -> Self {
        Self {
            kind: PrototypeKind::Square,
            parts: vec![generate_cube()],
        }
    }

    /// Local bounds over every part
    pub fn bounds(&self) -> Aabb {
        self.parts
            .iter()
            .map(GeometryData::bounds)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| GeometryData::default().bounds())
    }

    /// Height at which the prototype rests on the ground
    pub fn rest_height(&self) -> f32 {
        -self.bounds().min.y
    }

    /// More than one mesh; outlines use the bounding box instead of the edges
    pub fn is_composite(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Asynchronous prototype load capability
pub trait PrototypeLoader {
    fn load(&self, kind: PrototypeKind) -> LoadFuture;
}

/// Built-in shapes plus OBJ models from disk
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    sofa_model: Option<PathBuf>,
}

impl AssetLibrary {
    pub fn new(sofa_model: Option<PathBuf>) -> Self {
        Self { sofa_model }
    }

    pub fn has_model(&self, kind: PrototypeKind) -> bool {
        match kind {
            PrototypeKind::Square => true,
            PrototypeKind::Sofa => self.sofa_model.is_some(),
        }
    }
}

impl PrototypeLoader for AssetLibrary {
    fn load(&self, kind: PrototypeKind) -> LoadFuture {
        match kind {
            PrototypeKind::Square => future::ready(Ok(PrototypeMesh::cube())).boxed_local(),
            PrototypeKind::Sofa => match &self.sofa_model {
                Some(path) => load_obj_in_background(kind, path.clone()),
                None => future::ready(Err(AssetLoadError::MissingModel(kind))).boxed_local(),
            },
        }
    }
}

/// Parses the OBJ on a worker thread and resolves through a oneshot channel
fn load_obj_in_background(kind: PrototypeKind, path: PathBuf) -> LoadFuture {
    let (sender, receiver) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name(format!("obj-loader-{}", kind))
        .spawn(move || {
            let result = load_obj(kind, &path);
            // The receiver is gone when the load was abandoned
            if sender.send(result).is_err() {
                log::debug!("{} load finished after being abandoned", kind);
            }
        });

    if let Err(err) = spawned {
        log::warn!("could not spawn loader thread: {}", err);
        return future::ready(Err(AssetLoadError::Abandoned)).boxed_local();
    }

    async move { receiver.await.unwrap_or(Err(AssetLoadError::Abandoned)) }.boxed_local()
}

/// Loads every mesh of an OBJ file, centred over the origin in X and Z
pub fn load_obj(kind: PrototypeKind, path: &Path) -> Result<PrototypeMesh, AssetLoadError> {
    let (models, _materials) =
        tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| AssetLoadError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

    let parts: Vec<GeometryData> = models
        .iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = &model.mesh;
            // Use normals from OBJ if available, otherwise calculate them
            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals.clone()
            } else {
                calculate_vertex_normals(&mesh.positions, &mesh.indices)
            };
            GeometryData {
                vertices: mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
                normals: normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect(),
                indices: mesh.indices.clone(),
            }
        })
        .collect();

    if parts.is_empty() {
        return Err(AssetLoadError::EmptyModel(path.to_path_buf()));
    }

    let mut prototype = PrototypeMesh { kind, parts };
    let center = prototype.bounds().center();
    for part in &mut prototype.parts {
        for vertex in &mut part.vertices {
            vertex[0] -= center.x;
            vertex[2] -= center.z;
        }
    }

    log::info!(
        "loaded {} model {} ({} meshes)",
        kind,
        path.display(),
        prototype.parts.len()
    );
    Ok(prototype)
}

/// Area-weighted smooth normals for meshes that ship without them
pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if [i0, i1, i2].iter().any(|&i| i * 3 + 2 >= positions.len()) {
            continue;
        }
        let vertex = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];
        let (v0, v1, v2) = (vertex(i0), vertex(i1), vertex(i2));

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &vertex_idx in &[i0, i1, i2] {
            normals[vertex_idx * 3] += face_normal[0];
            normals[vertex_idx * 3 + 1] += face_normal[1];
            normals[vertex_idx * 3 + 2] += face_normal[2];
        }
    }

    for normal in normals.chunks_exact_mut(3) {
        let length = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        if length > 0.0 {
            normal.iter_mut().for_each(|c| *c /= length);
        } else {
            normal.copy_from_slice(&[0.0, 1.0, 0.0]);
        }
    }

    normals
}
