//! WGPU-based rendering engine for the layout editor
//!
//! Owns the surface, device and every GPU buffer the scene refers to. It is
//! also the live [`ResourceBackend`]: geometry and material ids handed to the
//! scene graph index into the engine's own tables, and disposal destroys the
//! underlying buffers immediately.

use std::{collections::HashMap, sync::Arc};
use wgpu::TextureFormat;

use crate::error::{EditorError, Result};
use crate::gfx::{
    camera::camera_utils::CameraUniform,
    geometry::{GeometryData, Topology},
    resources::{
        backend::{GeometryId, MaterialDesc, MaterialId, ResourceBackend, ResourceStats},
        global_bindings::GlobalBindings,
        material::{material_bind_group_layout, GpuMaterial},
        mesh_buffer::MeshBuffer,
        texture_resource::TextureResource,
    },
    scene::SceneGraph,
};
use crate::store::Color;

use super::pipeline_manager::{PipelineConfig, PipelineManager};

const OPAQUE_PIPELINE: &str = "Opaque";
const LINES_PIPELINE: &str = "Lines";
const TRANSPARENT_PIPELINE: &str = "Transparent";

/// One recorded draw: which buffers, bound with which material
#[derive(Debug, Clone, Copy)]
struct DrawItem {
    geometry: GeometryId,
    material: MaterialId,
    /// Squared distance from the camera, used to sort translucent draws
    depth: f32,
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles all low-level graphics operations including:
/// - Surface and device management
/// - Pipeline creation and management
/// - Depth buffer handling
/// - Scene resource allocation through [`ResourceBackend`]
/// - UI overlay rendering
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    material_layout: wgpu::BindGroupLayout,

    next_id: u64,
    meshes: HashMap<GeometryId, MeshBuffer>,
    materials: HashMap<MaterialId, GpuMaterial>,
    stats: ResourceStats,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu with default settings, creates the depth buffer and
    /// compiles the scene pipelines.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    ///
    /// # Errors
    /// Returns [`EditorError::Surface`] when no adapter, device or pipeline
    /// can be created.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| EditorError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EditorError::Surface(format!("no suitable adapter: {}", e)))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| EditorError::Surface(format!("device request failed: {}", e)))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| EditorError::Surface("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "surface configured: {}x{} {:?} on {}",
            config.width,
            config.height,
            format,
            adapter.get_info().name
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let global_bindings = GlobalBindings::new(&device);
        let material_layout = material_bind_group_layout(&device);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));

        let layouts = vec![
            global_bindings.bind_group_layout().clone(),
            material_layout.clone(),
        ];
        let base = PipelineConfig::default()
            .with_shader("scene")
            .with_bind_group_layouts(layouts)
            .with_cull_mode(None);

        pipeline_manager.register_pipeline(
            OPAQUE_PIPELINE,
            base.clone()
                .with_label("Opaque Pipeline")
                .with_depth(TextureResource::DEPTH_FORMAT, true)
                .with_color_target(format, wgpu::BlendState::REPLACE),
        );
        pipeline_manager.register_pipeline(
            LINES_PIPELINE,
            base.clone()
                .with_label("Lines Pipeline")
                .with_fragment_entry("fs_unlit")
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_depth(TextureResource::DEPTH_FORMAT, true)
                .with_color_target(format, wgpu::BlendState::REPLACE),
        );
        pipeline_manager.register_pipeline(
            TRANSPARENT_PIPELINE,
            base.with_label("Transparent Pipeline")
                .with_depth(TextureResource::DEPTH_FORMAT, false)
                .with_color_target(format, wgpu::BlendState::ALPHA_BLENDING),
        );
        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| EditorError::Surface(errors.join("; ")))?;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_bindings,
            material_layout,
            next_id: 0,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            stats: ResourceStats::default(),
        })
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Renders one frame of `scene` seen through `camera`
    ///
    /// Opaque surfaces are drawn first, then line overlays, then translucent
    /// surfaces back to front. The optional UI callback records its own pass
    /// on top of the finished scene.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(
        &mut self,
        scene: &SceneGraph,
        camera: &CameraUniform,
        ui_callback: Option<F>,
    ) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::debug!("surface outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(EditorError::Surface(e.to_string())),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.global_bindings.update(&self.queue, camera, &scene.lights);

        let eye = camera.view_position;
        let mut opaque = Vec::new();
        let mut lines = Vec::new();
        let mut transparent = Vec::new();
        {
            let queue = &self.queue;
            let materials = &mut self.materials;
            scene.visit_meshes(|_, mesh, world| {
                let Some(material) = materials.get_mut(&mesh.material) else {
                    log::trace!("mesh {:?} has no live material", mesh.geometry);
                    return;
                };
                material.write(queue, world);

                let (dx, dy, dz) = (world.w.x - eye[0], world.w.y - eye[1], world.w.z - eye[2]);
                let item = DrawItem {
                    geometry: mesh.geometry,
                    material: mesh.material,
                    depth: dx * dx + dy * dy + dz * dz,
                };
                match (mesh.topology, material.desc.is_transparent()) {
                    (Topology::Lines, _) => lines.push(item),
                    (Topology::Triangles, true) => transparent.push(item),
                    (Topology::Triangles, false) => opaque.push(item),
                }
            });
        }
        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, _] = scene.background.to_rgba(1.0);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            for (pipeline, items) in [
                (OPAQUE_PIPELINE, &opaque),
                (LINES_PIPELINE, &lines),
                (TRANSPARENT_PIPELINE, &transparent),
            ] {
                if items.is_empty() {
                    continue;
                }
                let Some(pipeline) = self.pipeline_manager.pipeline(pipeline) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                for item in items.iter() {
                    if let (Some(mesh), Some(material)) =
                        (self.meshes.get(&item.geometry), self.materials.get(&item.material))
                    {
                        render_pass.set_bind_group(1, material.bind_group(), &[]);
                        mesh.draw(&mut render_pass);
                    }
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the render engine surface and recreates depth buffer
    ///
    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Returns current surface dimensions as (width, height) in pixels
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    ///
    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

impl ResourceBackend for RenderEngine {
    fn create_geometry(&mut self, data: &GeometryData, topology: Topology) -> GeometryId {
        let id = GeometryId(self.allocate());
        let buffer = MeshBuffer::new(&self.device, data, topology);
        self.meshes.insert(id, buffer);
        self.stats.geometries_created += 1;
        id
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> MaterialId {
        let id = MaterialId(self.allocate());
        let material = GpuMaterial::new(&self.device, &self.material_layout, *desc);
        self.materials.insert(id, material);
        self.stats.materials_created += 1;
        id
    }

    fn set_material_color(&mut self, id: MaterialId, color: Color) {
        match self.materials.get_mut(&id) {
            Some(material) => material.set_color(color),
            None => log::warn!("recolor of unknown material {:?}", id),
        }
    }

    fn dispose_geometry(&mut self, id: GeometryId) {
        match self.meshes.remove(&id) {
            Some(buffer) => buffer.destroy(),
            None => {
                log::debug!("geometry {:?} already disposed", id);
                self.stats.stale_disposals += 1;
            }
        }
    }

    fn dispose_material(&mut self, id: MaterialId) {
        match self.materials.remove(&id) {
            Some(material) => material.destroy(),
            None => {
                log::debug!("material {:?} already disposed", id);
                self.stats.stale_disposals += 1;
            }
        }
    }

    fn stats(&self) -> ResourceStats {
        ResourceStats {
            live_geometries: self.meshes.len(),
            live_materials: self.materials.len(),
            ..self.stats
        }
    }
}
