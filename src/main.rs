// SPDX-License-Identifier: MPL-2.0
//! `photocam-probe`: loads an image into a headless viewer and reports what
//! the engine did with it.

use photocam::config::{self, EngineConfig};
use photocam::domain::{Orientation, PixelRect, Size, ZoomMode};
use photocam::engine::{Photocam, Residency, ViewerEvent};
use photocam::infrastructure::{ScrollState, ThreadedDecoder};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
photocam-probe - run the tiled viewer engine headless on one image

USAGE:
  photocam-probe [OPTIONS] <IMAGE>

OPTIONS:
  --config <PATH>        Engine config file (default: user config dir)
  --viewport <WxH>       Viewport size [default: 800x600]
  --mode <MODE>          manual | fit | fill | fit-in [default: fit]
  --zoom <DIVISOR>       Zoom divisor, implies --mode manual
  --orientation <1-8>    EXIF orientation to apply after loading
  --region <X,Y,W,H>     Image region to show after loading
  --timeout <SECS>       Give up waiting for decodes [default: 30]
  -v, --verbose          Debug logging (RUST_LOG overrides)
  -h, --help             Print help
";

struct Args {
    image: PathBuf,
    config: Option<PathBuf>,
    viewport: Size,
    mode: ZoomMode,
    zoom: Option<f64>,
    orientation: Option<Orientation>,
    region: Option<PixelRect>,
    timeout: Duration,
    verbose: bool,
}

fn parse_viewport(value: &str) -> Result<Size, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok(Size::new(f64::from(width), f64::from(height)))
}

fn parse_region(value: &str) -> Result<PixelRect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("bad region '{value}': {err}"))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(PixelRect::new(*x, *y, *w, *h)),
        _ => Err(format!("expected X,Y,W,H, got '{value}'")),
    }
}

fn parse_orientation(value: &str) -> Result<Orientation, String> {
    value
        .parse::<u32>()
        .ok()
        .and_then(Orientation::from_exif)
        .ok_or_else(|| format!("orientation must be 1-8, got '{value}'"))
}

fn parse_args() -> Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let verbose = args.contains(["-v", "--verbose"]);
    let config = args.opt_value_from_str("--config")?;
    let viewport = args
        .opt_value_from_fn("--viewport", parse_viewport)?
        .unwrap_or(Size::new(800.0, 600.0));
    let zoom: Option<f64> = args.opt_value_from_str("--zoom")?;
    let mode = match zoom {
        Some(_) => ZoomMode::Manual,
        None => args
            .opt_value_from_str("--mode")?
            .unwrap_or(ZoomMode::AutoFit),
    };
    let orientation = args.opt_value_from_fn("--orientation", parse_orientation)?;
    let region = args.opt_value_from_fn("--region", parse_region)?;
    let timeout = args.opt_value_from_str("--timeout")?.unwrap_or(30.0_f64);
    let image: PathBuf = args.free_from_str()?;

    Ok(Some(Args {
        image,
        config,
        viewport,
        mode,
        zoom,
        orientation,
        region,
        timeout: Duration::from_secs_f64(timeout.clamp(0.0, 3600.0)),
        verbose,
    }))
}

fn load_config(path: Option<&PathBuf>) -> EngineConfig {
    let loaded = match path {
        Some(path) => config::load_from_path(path),
        None => config::load(),
    };
    loaded.unwrap_or_else(|err| {
        tracing::warn!(%err, "could not read engine config, using defaults");
        EngineConfig::default()
    })
}

/// Ticks until every decode has landed and no transition runs.
fn settle(viewer: &mut Photocam<ScrollState, ThreadedDecoder>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let animating = viewer.tick(Instant::now());
        if !animating && viewer.pending_loads() == 0 && !viewer.needs_recalc() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn report(viewer: &Photocam<ScrollState, ThreadedDecoder>) {
    let (width, height) = viewer.image_size_get();
    let size = viewer.current_size();
    let region = viewer.image_region_get();
    println!("image:       {width}x{height} ({:?})", viewer.orientation_get());
    println!("zoom:        {:.4} ({})", viewer.zoom_get(), viewer.zoom_mode_get());
    println!("content:     {}x{}", size.width, size.height);
    println!(
        "region:      {},{} {}x{}",
        region.x, region.y, region.width, region.height
    );
    match viewer.grid() {
        Some(grid) => println!(
            "grid:        divisor {} ({}x{} tiles, {} resident)",
            grid.divisor(),
            grid.cols(),
            grid.rows(),
            grid.count(Residency::Resident)
        ),
        None => println!("grid:        none (base image only)"),
    }
    let placement = viewer.placement();
    println!(
        "tiles:       {} visible, {} resident",
        placement.visible_tiles().count(),
        placement.resident_tiles().count()
    );
    println!("passes:      {}", viewer.recalc_passes());
}

fn run(args: Args) -> ExitCode {
    let engine_config = load_config(args.config.as_ref());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: could not start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let surface = ScrollState::new(args.viewport);
    let decoder = ThreadedDecoder::new(runtime.handle().clone());
    let mut viewer = Photocam::new(engine_config, surface, decoder);
    viewer.pause_set(true);
    viewer.zoom_mode_set(args.mode);
    if let Some(zoom) = args.zoom {
        viewer.zoom_set(zoom);
    }

    if let Err(err) = viewer.load_file(&args.image) {
        eprintln!("error: {}: {err}", args.image.display());
        return ExitCode::FAILURE;
    }
    if !settle(&mut viewer, args.timeout) {
        eprintln!("error: timed out waiting for decodes");
        return ExitCode::FAILURE;
    }

    if let Some(orientation) = args.orientation {
        viewer.orientation_set(orientation);
    }
    if let Some(region) = args.region {
        viewer.image_region_show(region);
    }
    if !settle(&mut viewer, args.timeout) {
        eprintln!("error: timed out waiting for decodes");
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    for event in viewer.drain_events() {
        match event {
            ViewerEvent::LoadFailed(err) => {
                eprintln!("error: {}: {err}", args.image.display());
                failed = true;
            }
            ViewerEvent::TileDecodeFailed { grid, index, error } => {
                eprintln!(
                    "warning: tile {},{} of grid {} failed: {error}",
                    index.row,
                    index.col,
                    grid.value()
                );
            }
            other => tracing::debug!(?other, "event"),
        }
    }
    if failed {
        return ExitCode::FAILURE;
    }

    report(&viewer);
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "photocam=debug" } else { "warn" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run(args)
}
