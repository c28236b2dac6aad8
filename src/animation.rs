use crate::error::Result;
use crate::graphics::Frame;
use crate::state::{RenderState, SurfaceSize};
use crate::surface::{Surface, Visibility, WindowEvent};
use tracing::{debug, info};

/// Whether the loop keeps going after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Done,
}

/// Owns the render state and the surface it animates
pub struct AnimationLoop<S: Surface> {
    surface: S,
    state: RenderState,
    spokes: u32,
    double_buffered: bool,
    frames: u64,
}

impl<S: Surface> AnimationLoop<S> {
    pub fn new(surface: S, state: RenderState, spokes: u32, double_buffered: bool) -> Self {
        AnimationLoop {
            surface,
            state,
            spokes,
            double_buffered,
            frames: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Frames rendered so far, timed and exposed alike
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Animates until a key is pressed
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.state.running() && !self.surface.has_pending_event()? {
                let interval = self.state.frame_interval();
                while !self.surface.wait_for_input(interval)? {
                    self.state.advance();
                    self.render_frame()?;
                    self.surface.flush()?;
                }
            }

            let event = self.surface.next_event()?;
            if self.dispatch(event)? == Control::Done {
                return Ok(());
            }
        }
    }

    /// Applies one event to the state
    pub fn dispatch(&mut self, event: WindowEvent) -> Result<Control> {
        match event {
            WindowEvent::Mapped => {
                debug!("MapNotify: resuming...");
                self.state.paused = false;
            }
            WindowEvent::Unmapped => {
                debug!("UnmapNotify: pausing...");
                self.state.paused = true;
            }
            WindowEvent::Visibility(visibility) => {
                debug!(?visibility, "visibility changed");
                self.state.paused = visibility == Visibility::FullyObscured;
            }
            WindowEvent::Expose => {
                debug!("Expose: rendering.");
                let skipped = self.surface.discard_exposes()?;
                if skipped > 0 {
                    debug!(skipped, "coalesced expose events");
                }
                self.render_frame()?;
                // a paused loop goes straight back to a blocking wait
                self.surface.flush()?;
            }
            WindowEvent::ButtonPress(1) => {
                info!("ButtonPress: faster: {}", self.state.delta);
                self.state.speed_up();
            }
            WindowEvent::ButtonPress(2) => {
                info!("ButtonPress: slower: {}", self.state.delta);
                self.state.slow_down();
            }
            WindowEvent::ButtonPress(3) => {
                if self.state.toggle_manual_pause() {
                    info!("ButtonPress: manual pause.");
                } else {
                    info!("ButtonPress: manual resume.");
                }
            }
            WindowEvent::KeyPress => {
                info!("KeyPress: done.");
                return Ok(Control::Done);
            }
            WindowEvent::Resized { width, height } => {
                debug!(width, height, "ConfigureNotify: resizing.");
                self.state.size = SurfaceSize { width, height };
            }
            WindowEvent::ButtonPress(_) | WindowEvent::Other => {}
        }
        Ok(Control::Continue)
    }

    /// Draws the scene once and shows it
    pub fn render_frame(&mut self) -> Result<()> {
        debug!(rotation = self.state.rotation, "redraw.");
        // the swap clears the back buffer, only a bare window needs it here
        if !self.double_buffered {
            self.surface.clear()?;
        }
        let frame = Frame::compose(&self.state, self.spokes);
        self.surface.draw(&frame)?;
        if self.double_buffered {
            self.surface.present()?;
        }
        self.frames += 1;
        Ok(())
    }
}
