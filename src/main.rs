mod animation;
mod cli;
mod error;
mod graphics;
mod math;
mod state;
mod surface;
mod visual;
mod x11;

use animation::AnimationLoop;
use cli::Args;
use error::Result;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use x11::{announce, Display};

/// Main function
fn main() -> ExitCode {
    let args = Args::parse_traditional(std::env::args_os());
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", env!("CARGO_PKG_NAME"));
            ExitCode::FAILURE
        }
    }
}

/// Logs to stderr; `RUST_LOG` wins over `-verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let settings = args.settings();
    if args.debug_use_threadsafe_api {
        debug!("connection is always thread safe, -debug_use_threadsafe_api ignored");
    }
    let display = Display::open(args.display.as_deref(), settings.synchronous)?;

    let mut stdout = io::stdout().lock();
    let listing: Option<&mut dyn Write> = if args.list {
        Some(&mut stdout)
    } else {
        None
    };
    let config = display.select_config(&settings, &args.visual_request(), listing)?;
    if settings.double_buffer {
        announce(&config, &mut stdout)?;
    } else {
        debug!(visual = config.visual_id, depth = config.depth, "single buffered, default visual");
    }
    stdout.flush()?;
    drop(stdout);

    let surface = display.create_surface(config, &settings)?;
    let mut dizzy = AnimationLoop::new(
        surface,
        args.render_state(),
        settings.spokes,
        settings.double_buffer,
    );
    dizzy.run()?;
    debug!(frames = dizzy.frames(), rotation = dizzy.state().rotation, "animation finished");
    dizzy.into_surface().close()
}
