use std::time::Duration;

/// Amount a pointer button press changes the per-frame rotation
pub const DELTA_STEP: f64 = 0.005;

/// Window size used for layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u16,
    pub height: u16,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        SurfaceSize {
            width: 400,
            height: 400,
        }
    }
}

/// Animation state
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    /// Current rotation of the scene, never wrapped
    pub rotation: f64,
    /// Rotation added per timed frame
    pub delta: f64,
    pub frames_per_second: f64,
    /// Window unmapped or fully obscured
    pub paused: bool,
    /// Paused from the pointer
    pub manually_paused: bool,
    pub size: SurfaceSize,
}

impl RenderState {
    pub fn new(delta: f64, frames_per_second: f64) -> Self {
        RenderState {
            rotation: 0.0,
            delta,
            frames_per_second,
            paused: false,
            manually_paused: false,
            size: SurfaceSize::default(),
        }
    }

    /// Timed frames are only produced while this holds
    pub fn running(&self) -> bool {
        !self.paused && !self.manually_paused
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frames_per_second)
    }

    pub fn advance(&mut self) {
        self.rotation += self.delta;
    }

    pub fn speed_up(&mut self) {
        self.delta += DELTA_STEP;
    }

    pub fn slow_down(&mut self) {
        self.delta -= DELTA_STEP;
    }

    /// Flips the manual pause and returns the new value
    pub fn toggle_manual_pause(&mut self) -> bool {
        self.manually_paused = !self.manually_paused;
        self.manually_paused
    }
}
