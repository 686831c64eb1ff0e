//! Render loop driver
//!
//! The host calls [`FrameLoop::tick`] on every display refresh while the loop
//! runs. Start and stop are each idempotent: starting a running loop or
//! stopping one that never started does nothing.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    last_tick: Option<Instant>,
    frames: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            last_tick: None,
            frames: 0,
        }
    }

    /// Returns `true` only when this call started the loop
    pub fn start(&mut self) -> bool {
        if self.state == LoopState::Running {
            return false;
        }
        log::debug!("frame loop started");
        self.state = LoopState::Running;
        self.last_tick = None;
        true
    }

    /// Cancels the scheduled tick; returns `true` only when this call stopped it
    pub fn stop(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        log::debug!("frame loop stopped after {} frames", self.frames);
        self.state = LoopState::Stopped;
        self.last_tick = None;
        true
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds since the previous tick, or `None` when the loop is not running.
    /// The first tick after a start reports zero.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        if !self.is_running() {
            return None;
        }
        let dt = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.frames += 1;
        Some(dt)
    }
}
