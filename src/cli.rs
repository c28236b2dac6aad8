use crate::state::RenderState;
use crate::visual::{ColorClass, VisualRequest};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;

/// Options that keep their traditional single-dash spelling
const LONG_OPTIONS: [&str; 13] = [
    "display", "delta", "class", "depth", "visid", "list", "nodb", "help", "speed", "sync",
    "spokes", "verbose", "debug_use_threadsafe_api",
];

/// Visual classes accepted by `-class`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClassArg {
    #[value(name = "TrueColor", alias = "True")]
    TrueColor,
    #[value(name = "DirectColor")]
    DirectColor,
    #[value(name = "PseudoColor", alias = "Pseudo")]
    PseudoColor,
    #[value(name = "StaticColor")]
    StaticColor,
    #[value(name = "GrayScale")]
    GrayScale,
    #[value(name = "StaticGray")]
    StaticGray,
}

impl From<ClassArg> for ColorClass {
    fn from(class: ClassArg) -> Self {
        match class {
            ClassArg::TrueColor => ColorClass::TrueColor,
            ClassArg::DirectColor => ColorClass::DirectColor,
            ClassArg::PseudoColor => ColorClass::PseudoColor,
            ClassArg::StaticColor => ColorClass::StaticColor,
            ClassArg::GrayScale => ColorClass::GrayScale,
            ClassArg::StaticGray => ColorClass::StaticGray,
        }
    }
}

/// Demo of DBE creating a double buffered spinning scene
#[derive(Debug, Parser)]
#[command(name = "xdbedizzy", version)]
pub struct Args {
    /// X server connection to use
    #[arg(long, value_name = "host:dpy")]
    pub display: Option<String>,

    /// Rotate by this much per frame
    #[arg(long, value_name = "dlt", default_value_t = 0.05, allow_negative_numbers = true)]
    pub delta: f64,

    /// Class of visual to use
    #[arg(long, value_enum, value_name = "classname", default_value_t = ClassArg::PseudoColor)]
    pub class: ClassArg,

    /// Depth of visual to use
    #[arg(long, value_name = "n", default_value_t = 0)]
    pub depth: u8,

    /// Visual ID to use (ignore -class, -depth)
    #[arg(long, value_name = "nn|0xnn", value_parser = parse_visual_id)]
    pub visid: Option<u32>,

    /// List double buffer capable visuals
    #[arg(long)]
    pub list: bool,

    /// Single buffer (ignore -class, -depth, -visid)
    #[arg(long)]
    pub nodb: bool,

    /// Frames per second
    #[arg(long, value_name = "val", default_value_t = 20.0, value_parser = parse_speed)]
    pub speed: f64,

    /// Use synchronous X connection
    #[arg(long)]
    pub sync: bool,

    /// Number of spokes to draw
    #[arg(long, value_name = "n", default_value_t = 12, allow_negative_numbers = true)]
    pub spokes: i32,

    /// Produce chatty messages while running
    #[arg(long)]
    pub verbose: bool,

    /// Accepted for old scripts, connections are always thread safe
    #[arg(long = "debug_use_threadsafe_api", hide = true)]
    pub debug_use_threadsafe_api: bool,
}

/// Loop and window settings taken from the command line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub spokes: u32,
    pub double_buffer: bool,
    pub synchronous: bool,
}

impl Args {
    /// Parses `args`, accepting `-name` as well as `--name`
    ///
    /// Exits on bad arguments. Asking for help counts as a failed run, like the
    /// classic `usage()`.
    pub fn parse_traditional<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        match Args::try_parse_from(normalize_args(args)) {
            Ok(args) => args,
            Err(err) => {
                let _ = err.print();
                std::process::exit(exit_code(err.kind()));
            }
        }
    }

    pub fn visual_request(&self) -> VisualRequest {
        VisualRequest {
            class: self.class.into(),
            depth: self.depth,
            visual_id: self.visid.filter(|&id| id != 0),
        }
    }

    pub fn render_state(&self) -> RenderState {
        RenderState::new(self.delta, self.speed)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            spokes: u32::try_from(self.spokes).unwrap_or(0),
            double_buffer: !self.nodb,
            synchronous: self.sync,
        }
    }
}

/// Rewrites `-display` style options into the `--display` form clap expects
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let rewritten = arg.to_str().and_then(|s| {
                let name = s.strip_prefix('-')?;
                LONG_OPTIONS
                    .contains(&name)
                    .then(|| OsString::from(format!("-{s}")))
            });
            rewritten.unwrap_or(arg)
        })
        .collect()
}

/// Process status for a parse that did not produce `Args`
fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayVersion => 0,
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 1,
        _ => 2,
    }
}

/// Accepts decimal, `0x` hex and leading-zero octal like `strtol` with base 0
fn parse_visual_id(value: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else if value.len() > 1 && value.starts_with('0') {
        u32::from_str_radix(&value[1..], 8)
    } else {
        value.parse()
    };
    parsed.map_err(|e| format!("invalid visual id `{value}`: {e}"))
}

fn parse_speed(value: &str) -> Result<f64, String> {
    let speed: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive number, got {value}"))
    }
}
