use crate::error::Result;
use crate::graphics::Frame;
use std::time::Duration;

/// How much of the window is visible
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Unobscured,
    PartiallyObscured,
    FullyObscured,
}

/// Input events the loop reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    Mapped,
    Unmapped,
    Visibility(Visibility),
    /// Part of the window needs repainting
    Expose,
    ButtonPress(u8),
    KeyPress,
    Resized { width: u16, height: u16 },
    /// Anything the loop has no transition for
    Other,
}

/// A window plus its draw target, as seen by the animation loop
pub trait Surface {
    /// Flushes pending output and reports whether an event is already queued
    fn has_pending_event(&mut self) -> Result<bool>;

    /// Waits up to `timeout` for the connection to become readable.
    /// Returns `false` when the timeout elapsed first.
    fn wait_for_input(&mut self, timeout: Duration) -> Result<bool>;

    /// Flushes pending output, then blocks until the next event is available
    /// and removes it from the queue
    fn next_event(&mut self) -> Result<WindowEvent>;

    /// Drops every queued expose event, leaving other events in order
    fn discard_exposes(&mut self) -> Result<usize>;

    /// Clears the window itself; used when drawing without a back buffer
    fn clear(&mut self) -> Result<()>;

    fn draw(&mut self, frame: &Frame) -> Result<()>;

    /// Shows the back buffer and clears it for the next frame
    fn present(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
