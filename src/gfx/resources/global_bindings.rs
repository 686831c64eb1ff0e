//! Global uniform bindings for camera and lighting
//!
//! One uniform buffer bound at group 0 in every pipeline. It carries the
//! camera matrices and the scene's light rig and is refreshed once per frame.

use crate::{
    gfx::{camera::camera_utils::CameraUniform, scene::LightRig},
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// Global uniform buffer content.
/// MUST match the `Globals` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    /// Camera position (homogeneous coordinates)
    view_position: [f32; 4],
    /// Normalised direction towards the directional light; w unused
    light_direction: [f32; 4],
    /// Directional light rgb premultiplied by intensity
    light_color: [f32; 4],
    /// Ambient light rgb premultiplied by intensity
    ambient: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraUniform, lights: &LightRig) -> Self {
        let direction = {
            let p = lights.directional_position;
            let length = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt().max(f32::EPSILON);
            [p.x / length, p.y / length, p.z / length, 0.0]
        };
        Self {
            view_proj: camera.view_proj,
            view_position: camera.view_position,
            light_direction: direction,
            light_color: scaled(lights.directional_color.to_rgba(1.0), lights.directional_intensity),
            ambient: scaled(lights.ambient_color.to_rgba(1.0), lights.ambient_intensity),
        }
    }
}

fn scaled(rgba: [f32; 4], intensity: f32) -> [f32; 4] {
    [rgba[0] * intensity, rgba[1] * intensity, rgba[2] * intensity, 1.0]
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Layout, buffer and bind group for slot 0
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    ubo: GlobalUBO,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = binding_types::uniform_layout(
            device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "Globals Bind Group Layout",
        );
        let ubo = GlobalUBO::new_with_data(
            device,
            &GlobalUniform::new(&CameraUniform::default(), &LightRig::default()),
        );
        let bind_group = binding_types::single_bind_group(
            device,
            &bind_group_layout,
            ubo.binding_resource(),
            "Global Bind Group",
        );

        Self {
            bind_group_layout,
            ubo,
            bind_group,
        }
    }

    /// Writes this frame's camera and lights
    pub fn update(&mut self, queue: &wgpu::Queue, camera: &CameraUniform, lights: &LightRig) {
        self.ubo.update_content(queue, GlobalUniform::new(camera, lights));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
