use cgmath::{Matrix4, SquareMatrix};
use winit::event::{DeviceEvent, KeyEvent};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

/// The editor camera and the controls driving it
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &DeviceEvent) {
        self.controller.process_events(event, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller
            .process_keyed_events(event, &mut self.camera);
    }

    /// Advances damped controls and refreshes the GPU-facing uniform
    pub fn update(&mut self, delta_time: f32) {
        self.controller.update(delta_time, &mut self.camera);
        self.camera.update_view_proj();
    }

    /// Uniform as of the last [`CameraManager::update`]
    pub fn uniform(&self) -> CameraUniform {
        self.camera.uniform
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// Eye position; w is 1 so the vec4 keeps 16 byte alignment
    pub view_position: [f32; 4],

    /// wgpu clip-space view projection
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_update_refreshes_uniform_eye() {
        let camera = OrbitCamera::looking_at(Vector3::new(0.0, 1.5, 5.0), Vector3::new(0.0, 0.0, 0.0), 1.5);
        let mut manager = CameraManager::new(camera, CameraController::new(0.005, 0.1));
        manager.update(1.0 / 60.0);

        let eye = manager.uniform().view_position;
        assert!((eye[1] - 1.5).abs() < 1e-4);
        assert!((eye[2] - 5.0).abs() < 1e-4);
        assert_eq!(eye[3], 1.0);
    }
}
