use crate::cli::Settings;
use crate::error::{DizzyError, Result};
use crate::graphics::{Frame, Pen, FULL_CIRCLE};
use crate::state::SurfaceSize;
use crate::surface::{Surface, Visibility, WindowEvent};
use crate::visual::{choose_visual, Candidate, ColorClass, SurfaceConfig, VisualRequest, VisualSource};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::os::fd::AsFd;
use std::time::Duration;
use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection as _};
use x11rb::protocol::dbe::{self, ConnectionExt as _, SwapAction, SwapInfo};
use x11rb::protocol::xproto::{
    self, Arc, AtomEnum, CapStyle, ColormapAlloc, ConnectionExt as _, CoordMode, CreateGCAux,
    CreateWindowAux, EventMask, PropMode, Screen, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

const TITLE: &str = "DBE dizzy demo";
const ORIGIN: (i16, i16) = (10, 10);
const LINE_WIDTH: u32 = 8;

/// An open display connection and its default screen
pub struct Display {
    conn: RustConnection,
    screen_num: usize,
    synchronous: bool,
}

impl Display {
    pub fn open(name: Option<&str>, synchronous: bool) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(name).map_err(|source| DizzyError::Connect {
            display: name.map_or_else(
                || std::env::var("DISPLAY").unwrap_or_default(),
                str::to_owned,
            ),
            source,
        })?;
        if synchronous {
            debug!("Running in synchronous X mode.");
        }
        Ok(Display {
            conn,
            screen_num,
            synchronous,
        })
    }

    fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    /// Makes sure the double buffer extension is present
    pub fn query_dbe(&self) -> Result<(u8, u8)> {
        let present = self
            .conn
            .extension_information(dbe::X11_EXTENSION_NAME)?
            .is_some();
        if !present {
            return Err(DizzyError::ExtensionUnavailable(format!(
                "{} not supported by the server",
                dbe::X11_EXTENSION_NAME
            )));
        }
        let version = self
            .conn
            .dbe_query_version(1, 0)?
            .reply()
            .map_err(|e| DizzyError::ExtensionUnavailable(format!("DBE version query: {e}")))?;
        debug!(
            major = version.major_version,
            minor = version.minor_version,
            "double buffer extension"
        );
        Ok((version.major_version, version.minor_version))
    }

    /// Picks the visual for the window: a DBE visual, or the root visual when
    /// double buffering is off
    pub fn select_config(
        &self,
        settings: &Settings,
        request: &VisualRequest,
        listing: Option<&mut dyn Write>,
    ) -> Result<SurfaceConfig> {
        if !settings.double_buffer {
            let screen = self.screen();
            return self
                .describe(screen.root_visual)
                .ok_or(DizzyError::ConfigResolution(screen.root_visual));
        }
        self.query_dbe()?;
        choose_visual(self, request, listing)
    }

    /// Creates the window, its colors and pens, and maps it
    pub fn create_surface(self, config: SurfaceConfig, settings: &Settings) -> Result<X11Surface> {
        let conn = &self.conn;
        let screen = self.screen();
        let root = screen.root;

        let colormap = conn.generate_id()?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, config.visual_id)?
            .check()
            .map_err(|e| DizzyError::resource("colormap", e))?;

        let mut pixels = HashMap::new();
        for pen in Pen::ALL {
            let reply = conn
                .alloc_named_color(colormap, pen.color_name().as_bytes())?
                .reply()
                .map_err(|e| DizzyError::resource(format!("color {}", pen.color_name()), e))?;
            pixels.insert(pen, reply.pixel);
        }
        let black = pixels[&Pen::Black];

        let size = SurfaceSize::default();
        let window = conn.generate_id()?;
        conn.create_window(
            config.depth,
            window,
            root,
            ORIGIN.0,
            ORIGIN.1,
            size.width,
            size.height,
            0,
            WindowClass::INPUT_OUTPUT,
            config.visual_id,
            &CreateWindowAux::new()
                .background_pixel(black)
                .border_pixel(black)
                .colormap(colormap)
                .event_mask(
                    EventMask::VISIBILITY_CHANGE
                        | EventMask::EXPOSURE
                        | EventMask::BUTTON_PRESS
                        | EventMask::KEY_PRESS
                        | EventMask::STRUCTURE_NOTIFY,
                ),
        )?
        .check()
        .map_err(|e| DizzyError::resource("window", e))?;

        let program = env!("CARGO_PKG_NAME");
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            TITLE.as_bytes(),
        )?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_ICON_NAME,
            AtomEnum::STRING,
            program.as_bytes(),
        )?;

        let back_buffer = if settings.double_buffer {
            let buffer = conn.generate_id()?;
            conn.dbe_allocate_back_buffer(window, buffer, SwapAction::BACKGROUND.into())?
                .check()
                .map_err(|e| DizzyError::resource("buffers", e))?;
            Some(buffer)
        } else {
            None
        };

        // one GC per color so drawing never has to change GC state
        let mut pens = HashMap::new();
        for (pen, pixel) in &pixels {
            let gc = conn.generate_id()?;
            conn.create_gc(
                gc,
                window,
                &CreateGCAux::new()
                    .foreground(*pixel)
                    .line_width(LINE_WIDTH)
                    .cap_style(CapStyle::ROUND),
            )?
            .check()
            .map_err(|e| DizzyError::resource(format!("graphics context {}", pen.color_name()), e))?;
            pens.insert(*pen, gc);
        }

        conn.map_window(window)?;
        conn.flush()?;

        Ok(X11Surface {
            display: self,
            window,
            back_buffer,
            colormap,
            pens,
            queued: VecDeque::new(),
        })
    }
}

impl VisualSource for Display {
    fn double_buffer_visuals(&self) -> Result<Vec<Candidate>> {
        let reply = self
            .conn
            .dbe_get_visual_info(&[self.screen().root])?
            .reply()
            .map_err(|e| DizzyError::ExtensionUnavailable(format!("DBE visual query: {e}")))?;
        let infos = reply
            .supported_visuals
            .into_iter()
            .next()
            .ok_or_else(|| DizzyError::ExtensionUnavailable("no DBE visuals for screen".into()))?;
        Ok(infos
            .infos
            .into_iter()
            .map(|info| Candidate {
                visual_id: info.visual_id,
                depth: info.depth,
            })
            .collect())
    }

    fn describe(&self, visual_id: u32) -> Option<SurfaceConfig> {
        self.screen().allowed_depths.iter().find_map(|depth| {
            depth
                .visuals
                .iter()
                .find(|visual| visual.visual_id == visual_id)
                .map(|visual| SurfaceConfig {
                    visual_id,
                    class: ColorClass::from_raw(u8::from(visual.class)),
                    depth: depth.depth,
                })
        })
    }
}

/// The demo window and its draw target
pub struct X11Surface {
    display: Display,
    window: xproto::Window,
    back_buffer: Option<dbe::BackBuffer>,
    colormap: xproto::Colormap,
    pens: HashMap<Pen, xproto::Gcontext>,
    /// Events read off the connection but not yet handed out
    queued: VecDeque<Event>,
}

impl X11Surface {
    fn conn(&self) -> &RustConnection {
        &self.display.conn
    }

    fn target(&self) -> xproto::Drawable {
        self.back_buffer.unwrap_or(self.window)
    }

    /// Round trip so errors from the last requests show up now
    fn sync_if_requested(&self) -> Result<()> {
        if self.display.synchronous {
            self.conn().get_input_focus()?.reply()?;
        }
        Ok(())
    }

    /// Moves everything already received into the local queue
    fn drain_connection(&mut self) -> Result<()> {
        while let Some(event) = self.display.conn.poll_for_event()? {
            self.queued.push_back(event);
        }
        Ok(())
    }

    /// Releases the server side resources
    pub fn close(self) -> Result<()> {
        let conn = self.conn();
        for gc in self.pens.values() {
            conn.free_gc(*gc)?;
        }
        if let Some(buffer) = self.back_buffer {
            conn.dbe_deallocate_back_buffer(buffer)?;
        }
        conn.destroy_window(self.window)?;
        conn.free_colormap(self.colormap)?;
        conn.flush()?;
        debug!("Done.");
        Ok(())
    }
}

fn translate(event: Event) -> Result<WindowEvent> {
    Ok(match event {
        Event::MapNotify(_) => WindowEvent::Mapped,
        Event::UnmapNotify(_) => WindowEvent::Unmapped,
        Event::VisibilityNotify(ev) => WindowEvent::Visibility(match ev.state {
            xproto::Visibility::FULLY_OBSCURED => Visibility::FullyObscured,
            xproto::Visibility::PARTIALLY_OBSCURED => Visibility::PartiallyObscured,
            _ => Visibility::Unobscured,
        }),
        Event::Expose(_) => WindowEvent::Expose,
        Event::ButtonPress(ev) => WindowEvent::ButtonPress(ev.detail),
        Event::KeyPress(_) => WindowEvent::KeyPress,
        Event::ConfigureNotify(ev) => WindowEvent::Resized {
            width: ev.width,
            height: ev.height,
        },
        Event::Error(err) => return Err(DizzyError::Protocol(err.into())),
        _ => WindowEvent::Other,
    })
}

/// Poll timeout in whole milliseconds, rounded up so short frames never spin
fn poll_millis(timeout: Duration) -> u16 {
    let millis = timeout.as_micros().div_ceil(1000).max(1);
    u16::try_from(millis).unwrap_or(u16::MAX)
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

fn clamp_u16(v: i32) -> u16 {
    v.clamp(0, u16::MAX.into()) as u16
}

impl Surface for X11Surface {
    fn has_pending_event(&mut self) -> Result<bool> {
        self.display.conn.flush()?;
        if self.queued.is_empty() {
            if let Some(event) = self.display.conn.poll_for_event()? {
                self.queued.push_back(event);
            }
        }
        Ok(!self.queued.is_empty())
    }

    fn wait_for_input(&mut self, timeout: Duration) -> Result<bool> {
        // replies read during the last frame may have carried events along
        self.drain_connection()?;
        if !self.queued.is_empty() {
            return Ok(true);
        }
        let millis = poll_millis(timeout);
        let stream = self.display.conn.stream();
        let mut fds = [PollFd::new(stream.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::from(millis))?;
        Ok(ready > 0)
    }

    fn next_event(&mut self) -> Result<WindowEvent> {
        let event = match self.queued.pop_front() {
            Some(event) => event,
            None => {
                self.display.conn.flush()?;
                self.display.conn.wait_for_event()?
            }
        };
        translate(event)
    }

    fn discard_exposes(&mut self) -> Result<usize> {
        self.drain_connection()?;
        let before = self.queued.len();
        self.queued.retain(|event| !matches!(event, Event::Expose(_)));
        Ok(before - self.queued.len())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn().clear_area(false, self.window, 0, 0, 0, 0)?;
        Ok(())
    }

    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let conn = self.conn();
        let target = self.target();
        for ring in &frame.rings {
            let arc = Arc {
                x: clamp_i16(ring.x),
                y: clamp_i16(ring.y),
                width: clamp_u16(ring.width),
                height: clamp_u16(ring.height),
                angle1: 0,
                angle2: FULL_CIRCLE as i16,
            };
            conn.poly_arc(target, self.pens[&ring.pen], &[arc])?;
        }
        for spoke in &frame.spokes {
            let points = spoke.map(|[x, y]| xproto::Point {
                x: clamp_i16(x),
                y: clamp_i16(y),
            });
            conn.poly_line(CoordMode::ORIGIN, target, self.pens[&Pen::Pink], &points)?;
        }
        self.sync_if_requested()
    }

    fn present(&mut self) -> Result<()> {
        let swap = SwapInfo {
            window: self.window,
            swap_action: SwapAction::BACKGROUND.into(),
        };
        self.conn().dbe_swap_buffers(&[swap])?;
        self.sync_if_requested()
    }

    fn flush(&mut self) -> Result<()> {
        self.display.conn.flush()?;
        Ok(())
    }
}

/// Reports the chosen visual the way the classic demo does
pub fn announce(config: &SurfaceConfig, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{}: Chose visual ID: {:#4x} depth: {}\n",
        env!("CARGO_PKG_NAME"),
        config.visual_id,
        config.depth
    )?;
    info!(visual = config.visual_id, depth = config.depth, class = %config.class, "visual selected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_saturate_into_protocol_range() {
        assert_eq!(clamp_i16(40_000), i16::MAX);
        assert_eq!(clamp_i16(-40_000), i16::MIN);
        assert_eq!(clamp_i16(-40), -40);
        assert_eq!(clamp_u16(-5), 0);
        assert_eq!(clamp_u16(480), 480);
    }

    #[test]
    fn visibility_states_map_to_pause_triggers() {
        let event = |state| {
            Event::VisibilityNotify(xproto::VisibilityNotifyEvent {
                response_type: xproto::VISIBILITY_NOTIFY_EVENT,
                sequence: 0,
                window: 1,
                state,
            })
        };
        assert_eq!(
            translate(event(xproto::Visibility::FULLY_OBSCURED)).unwrap(),
            WindowEvent::Visibility(Visibility::FullyObscured)
        );
        assert_eq!(
            translate(event(xproto::Visibility::UNOBSCURED)).unwrap(),
            WindowEvent::Visibility(Visibility::Unobscured)
        );
    }

    #[test]
    fn poll_timeouts_round_up_to_whole_milliseconds() {
        assert_eq!(poll_millis(Duration::from_secs_f64(1.0 / 20.0)), 50);
        assert_eq!(poll_millis(Duration::from_secs_f64(1.0 / 3000.0)), 1);
        assert_eq!(poll_millis(Duration::from_micros(1500)), 2);
        assert_eq!(poll_millis(Duration::ZERO), 1);
        assert_eq!(poll_millis(Duration::from_secs(120)), u16::MAX);
    }

    #[test]
    fn full_circle_fits_an_arc_angle() {
        assert!(FULL_CIRCLE <= i32::from(i16::MAX));
    }

    #[test]
    fn announcement_matches_classic_format() {
        let mut out = Vec::new();
        let config = SurfaceConfig {
            visual_id: 0x21,
            class: ColorClass::TrueColor,
            depth: 24,
        };
        announce(&config, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "xdbedizzy: Chose visual ID: 0x21 depth: 24\n\n"
        );
    }
}
