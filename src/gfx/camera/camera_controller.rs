use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Velocity below which orbit/pan motion snaps to rest
const REST_EPSILON: f32 = 1e-5;

/// Orbit controls with damping.
///
/// Mouse motion feeds angular and pan velocities; [`CameraController::update`]
/// applies them to the camera once per render tick and decays them by the
/// damping factor, so the view keeps gliding briefly after the pointer stops.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Fraction of velocity lost per 60 Hz tick
    pub damping: f32,
    enabled: bool,
    is_shift_held: bool,
    is_mouse_pressed: bool,
    yaw_velocity: f32,
    pitch_velocity: f32,
    pan_velocity: (f32, f32),
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping: 0.05,
            enabled: true,
            is_shift_held: false,
            is_mouse_pressed: false,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            pan_velocity: (0.0, 0.0),
        }
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    /// Suspends orbiting, e.g. while a palette drag owns the pointer
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.is_mouse_pressed = false;
        }
    }

    /// The primary button state comes from window events so UI capture can veto it
    pub fn set_mouse_pressed(&mut self, pressed: bool) {
        self.is_mouse_pressed = pressed && self.enabled;
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        if !self.enabled {
            return;
        }

        match event {
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    if self.is_shift_held {
                        // SHIFT + DRAG = PAN (move focus point)
                        self.pan_velocity.0 += -delta.0 as f32 * self.pan_speed;
                        self.pan_velocity.1 += delta.1 as f32 * self.pan_speed;
                    } else {
                        // NORMAL DRAG = ROTATE (orbit around focus)
                        self.yaw_velocity += -delta.0 as f32 * self.rotate_speed;
                        self.pitch_velocity += delta.1 as f32 * self.rotate_speed;
                    }
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                if self.is_shift_held {
                    log::info!("resetting camera to its home position");
                    self.stop();
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    /// Advances the controls by one tick of `delta_time` seconds
    pub fn update(&mut self, delta_time: f32, camera: &mut OrbitCamera) {
        if self.yaw_velocity != 0.0 {
            camera.add_yaw(self.yaw_velocity);
        }
        if self.pitch_velocity != 0.0 {
            camera.add_pitch(self.pitch_velocity);
        }
        if self.pan_velocity != (0.0, 0.0) {
            camera.pan(self.pan_velocity);
        }

        let keep = (1.0 - self.damping).powf((delta_time * 60.0).max(0.0));
        self.yaw_velocity = decay(self.yaw_velocity, keep);
        self.pitch_velocity = decay(self.pitch_velocity, keep);
        self.pan_velocity = (
            decay(self.pan_velocity.0, keep),
            decay(self.pan_velocity.1, keep),
        );
    }

    pub fn stop(&mut self) {
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.pan_velocity = (0.0, 0.0);
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }

    pub fn is_moving(&self) -> bool {
        self.yaw_velocity != 0.0 || self.pitch_velocity != 0.0 || self.pan_velocity != (0.0, 0.0)
    }
}

fn decay(velocity: f32, keep: f32) -> f32 {
    let next = velocity * keep;
    if next.abs() < REST_EPSILON {
        0.0
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Zero};

    #[test]
    fn test_orbit_glides_then_rests() {
        let mut camera = OrbitCamera::looking_at(Vector3::new(0.0, 1.5, 5.0), Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.005, 0.1).with_damping(0.05);

        controller.set_mouse_pressed(true);
        controller.process_events(&DeviceEvent::MouseMotion { delta: (-40.0, 0.0) }, &mut camera);
        controller.set_mouse_pressed(false);

        let start_yaw = camera.yaw;
        controller.update(1.0 / 60.0, &mut camera);
        let first_step = camera.yaw - start_yaw;
        assert!(first_step > 0.0);

        controller.update(1.0 / 60.0, &mut camera);
        let second_step = camera.yaw - start_yaw - first_step;
        assert!(second_step > 0.0 && second_step < first_step);

        for _ in 0..2000 {
            controller.update(1.0 / 60.0, &mut camera);
        }
        assert!(!controller.is_moving());
    }

    #[test]
    fn test_disabled_controller_ignores_motion() {
        let mut camera = OrbitCamera::looking_at(Vector3::new(0.0, 1.5, 5.0), Vector3::zero(), 1.0);
        let mut controller = CameraController::new(0.005, 0.1);
        controller.set_enabled(false);
        controller.set_mouse_pressed(true);
        controller.process_events(&DeviceEvent::MouseMotion { delta: (10.0, 10.0) }, &mut camera);
        controller.update(1.0 / 60.0, &mut camera);
        assert!(!controller.is_moving());
    }
}
