//! GPU materials
//!
//! Every mesh owns exactly one material, so the per-draw model matrix lives
//! in the same uniform as the colour. The renderer rewrites it each frame
//! before recording the draw.

use wgpu::Device;

use super::backend::MaterialDesc;
use crate::store::Color;
use crate::wgpu_utils::{binding_types, uniform_buffer::UniformBuffer};

/// Per-draw uniform data.
/// MUST match the `Draw` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl DrawUniform {
    fn new(model: cgmath::Matrix4<f32>, desc: &MaterialDesc) -> Self {
        Self {
            model: model.into(),
            color: desc.rgba(),
        }
    }
}

type DrawUBO = UniformBuffer<DrawUniform>;

/// Layout of the material bind group (slot 1)
pub fn material_bind_group_layout(device: &Device) -> wgpu::BindGroupLayout {
    binding_types::uniform_layout(
        device,
        wgpu::ShaderStages::VERTEX_FRAGMENT,
        "Material Bind Group Layout",
    )
}

pub struct GpuMaterial {
    pub desc: MaterialDesc,
    ubo: DrawUBO,
    bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(device: &Device, layout: &wgpu::BindGroupLayout, desc: MaterialDesc) -> Self {
        use cgmath::SquareMatrix;

        let ubo = DrawUBO::new_with_data(
            device,
            &DrawUniform::new(cgmath::Matrix4::identity(), &desc),
        );
        let bind_group = binding_types::single_bind_group(
            device,
            layout,
            ubo.binding_resource(),
            "Material Bind Group",
        );

        Self {
            desc,
            ubo,
            bind_group,
        }
    }

    /// Takes effect on the next [`GpuMaterial::write`]
    pub fn set_color(&mut self, color: Color) {
        self.desc.color = color;
    }

    pub fn write(&mut self, queue: &wgpu::Queue, model: cgmath::Matrix4<f32>) {
        self.ubo.update_content(queue, DrawUniform::new(model, &self.desc));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn destroy(&self) {
        self.ubo.destroy();
    }
}
