use crate::math::{elliptic_point, spoke_angle, wobble};
use crate::state::RenderState;

/// Radius ratios of the three spoke control points
const SPOKE_RATIOS: [f64; 3] = [0.4, 0.7, 0.95];
/// Angular lag of each control point behind the spoke's base angle
const SPOKE_STAGGER: [f64; 3] = [0.0, -0.1, -0.2];
const WOBBLE: f64 = 20.0;
/// A full circle in X arc units (1/64 degree)
pub const FULL_CIRCLE: i32 = 360 * 64;

/// The colors the scene is drawn with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pen {
    Black,
    Pink,
    Green,
    Orange,
    Blue,
}

impl Pen {
    pub const ALL: [Pen; 5] = [Pen::Black, Pen::Pink, Pen::Green, Pen::Orange, Pen::Blue];

    /// Server color database name
    pub fn color_name(self) -> &'static str {
        match self {
            Pen::Black => "black",
            Pen::Pink => "pink",
            Pen::Green => "green",
            Pen::Orange => "orange",
            Pen::Blue => "blue",
        }
    }
}

/// Full-circle arc inscribed in a bounding box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ring {
    pub pen: Pen,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Everything drawn in one frame
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub rings: Vec<Ring>,
    /// Pink polylines, starting at the window center
    pub spokes: Vec<[[i32; 2]; 4]>,
}

impl Frame {
    /// Lays out the scene for the current rotation and window size
    pub fn compose(state: &RenderState, spokes: u32) -> Frame {
        let half_w = i32::from(state.size.width) / 2;
        let half_h = i32::from(state.size.height) / 2;

        let [dx, dy] = wobble(state.rotation, WOBBLE);
        let (x, y) = (half_w + dx, half_h + dy);
        let mut rings = Vec::with_capacity(21);
        for i in (5..26).step_by(3) {
            for (pen, grow) in [(Pen::Orange, 0), (Pen::Green, 5), (Pen::Blue, 10)] {
                rings.push(Ring {
                    pen,
                    x: x - i * 10 - grow,
                    y: y - i * 10 - grow,
                    width: i * 20 + grow * 2,
                    height: i * 20 + grow * 2,
                });
            }
        }

        let step = if spokes == 0 { 0.0 } else { spoke_angle(spokes) };
        let spokes = (0..spokes)
            .map(|k| {
                let base = k as f64 * step + state.rotation;
                let mut line = [[half_w, half_h]; 4];
                for (point, (ratio, stagger)) in line[1..]
                    .iter_mut()
                    .zip(SPOKE_RATIOS.iter().zip(SPOKE_STAGGER.iter()))
                {
                    *point = elliptic_point(base + stagger, *ratio, half_w, half_h);
                }
                line
            })
            .collect();

        Frame { rings, spokes }
    }
}
