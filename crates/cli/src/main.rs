#![deny(unsafe_code)]
//! Headless CLI for the ambient background engine.
//!
//! Subcommands:
//! - `render` runs the background for N frames and writes a PNG
//! - `profile <route>` prints the resolved render profile
//! - `list` prints known routes and modes
//! - `mode get|set` reads or writes the persisted mode in a state file

mod error;

use ambient_core::profile::known_routes;
use ambient_core::{profile_for, PixelSurface, Rgba};
use ambient_scene::snapshot::write_png;
use ambient_scene::{
    FileStore, FrameDriver, ManualScheduler, MemoryStore, Mode, ModeController, ModeStore,
    SceneConfig, StaticHint, TrackHint, MODE_KEY,
};
use clap::{Parser, Subcommand};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};

const DEFAULT_SEED: u64 = 42;

#[derive(Parser)]
#[command(name = "ambient", about = "Ambient background engine CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the background for N frames and write a PNG snapshot.
    Render {
        /// Route whose profile tunes the animation.
        #[arg(long, default_value = "/")]
        route: String,

        /// Mode to render (off, flow-field, attractor). Overrides --state-file.
        #[arg(long)]
        mode: Option<String>,

        /// Canvas width in pixels.
        #[arg(short = 'W', long, default_value_t = 1280)]
        width: usize,

        /// Canvas height in pixels.
        #[arg(short = 'H', long, default_value_t = 720)]
        height: usize,

        /// Number of frames to run.
        #[arg(short, long, default_value_t = 300)]
        frames: u64,

        /// Milliseconds between frames.
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,

        /// PRNG seed. Falls back to the config seed, then 42.
        #[arg(long)]
        seed: Option<u64>,

        /// Now-playing track id used as a color hint.
        #[arg(long)]
        track: Option<String>,

        /// Pointer position held for the whole render, as "X,Y".
        #[arg(long)]
        pointer: Option<String>,

        /// State file to read the persisted mode from.
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Scene configuration JSON file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Scene configuration overrides as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Output file path.
        #[arg(short, long, default_value = "ambient.png")]
        output: PathBuf,
    },
    /// Print the render profile resolved for a route and viewport.
    Profile {
        route: String,

        #[arg(short = 'W', long, default_value_t = 1280.0)]
        width: f64,

        #[arg(short = 'H', long, default_value_t = 720.0)]
        height: f64,
    },
    /// List known routes and modes.
    List,
    /// Read or write the persisted mode.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },
}

#[derive(Subcommand)]
enum ModeAction {
    /// Print the persisted mode and pause flag.
    Get {
        #[arg(long)]
        state_file: PathBuf,
    },
    /// Persist a mode, and optionally the pause flag.
    Set {
        mode: String,

        #[arg(long)]
        state_file: PathBuf,

        #[arg(long)]
        paused: Option<bool>,
    },
}

/// Options for a single `render` invocation.
struct RenderArgs {
    route: String,
    mode: Option<String>,
    width: usize,
    height: usize,
    frames: u64,
    frame_ms: f64,
    seed: Option<u64>,
    track: Option<String>,
    pointer: Option<String>,
    state_file: Option<PathBuf>,
    config: Option<PathBuf>,
    params: String,
    output: PathBuf,
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let routes: Vec<&str> = known_routes().collect();
            let modes: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
            if cli.json {
                let info = serde_json::json!({ "routes": routes, "modes": modes });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Routes:");
                for route in routes {
                    println!("  {route}");
                }
                println!("Modes:");
                println!("  {}", modes.join(", "));
            }
        }
        Command::Profile {
            route,
            width,
            height,
        } => {
            let profile = profile_for(&route, width, height);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("route:          {} (requested {route})", profile.route);
                println!("device:         {:?}", profile.device);
                println!("particles:      {}", profile.particle_count);
                println!("speed_mod:      {}", profile.speed_mod);
                println!("noise_zoom:     {}", profile.noise_zoom);
                println!("vertical_bias:  {}", profile.vertical_bias);
                println!("color_scheme:   {:?}", profile.color_scheme);
                println!(
                    "pointer:        {:?} radius {} strength {}",
                    profile.pointer.mode,
                    profile.pointer.radius_sq.sqrt(),
                    profile.pointer.strength
                );
                println!("damping:        {}", profile.damping);
                println!("projection:     {}", profile.projection_scale);
            }
        }
        Command::Mode { action } => run_mode(action, cli.json)?,
        Command::Render {
            route,
            mode,
            width,
            height,
            frames,
            frame_ms,
            seed,
            track,
            pointer,
            state_file,
            config,
            params,
            output,
        } => {
            let args = RenderArgs {
                route,
                mode,
                width,
                height,
                frames,
                frame_ms,
                seed,
                track,
                pointer,
                state_file,
                config,
                params,
                output,
            };
            run_render(args, cli.json)?;
        }
    }

    Ok(())
}

fn run_render(args: RenderArgs, json: bool) -> Result<(), CliError> {
    let config = render_config(args.config.as_deref(), &args.params, args.seed)?;
    let seed = config.seed.unwrap_or(DEFAULT_SEED);
    let store = render_store(args.mode.as_deref(), args.state_file.as_deref())?;
    let pointer = args.pointer.as_deref().map(parse_pointer).transpose()?;
    let hint = StaticHint::new(args.track.as_deref().map(|id| TrackHint::new(id, 0.0)));

    let surface = PixelSurface::new(args.width, args.height, Rgba::opaque(0, 0, 0))?;
    let mut driver = FrameDriver::new(Ok(surface), ManualScheduler::new(), store, config)?
        .with_hint_source(Box::new(hint))
        .with_route(args.route.as_str());
    driver.start()?;
    if let Some((x, y)) = pointer {
        driver.on_pointer_move(x, y);
    }

    for i in 0..args.frames {
        if !driver.on_frame(i as f64 * args.frame_ms) {
            debug!(frame = i, "no frame pending, stopping early");
            break;
        }
    }

    let mode = driver.mode();
    let rendered = driver.frames_rendered();
    let profile = driver.profile();
    let surface = driver.into_surface().ok_or_else(|| {
        CliError::Scene(ambient_core::EngineError::SurfaceUnavailable(
            "pixel surface was not retained".into(),
        ))
    })?;
    write_png(&surface, &args.output)?;
    info!(mode = %mode, frames = rendered, output = %args.output.display(), "render complete");

    if json {
        let info = serde_json::json!({
            "route": args.route,
            "profile_route": profile.route,
            "mode": mode.as_str(),
            "width": args.width,
            "height": args.height,
            "frames": rendered,
            "seed": seed,
            "output": args.output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {mode} on {} ({}x{}, {rendered} frames, seed {seed}) -> {}",
            profile.route,
            args.width,
            args.height,
            args.output.display()
        );
    }
    Ok(())
}

fn run_mode(action: ModeAction, json: bool) -> Result<(), CliError> {
    let (state_file, mode, paused) = match action {
        ModeAction::Get { state_file } => {
            let mut controller = ModeController::new(FileStore::new(&state_file));
            let mode = controller.restore();
            (state_file, mode, controller.is_paused())
        }
        ModeAction::Set {
            mode,
            state_file,
            paused,
        } => {
            let mode: Mode = mode.parse()?;
            let mut controller = ModeController::new(FileStore::new(&state_file));
            controller.restore();
            controller.set_mode(mode)?;
            if let Some(paused) = paused {
                controller.set_paused(paused)?;
            }
            (state_file, mode, controller.is_paused())
        }
    };

    if json {
        let info = serde_json::json!({
            "mode": mode.as_str(),
            "paused": paused,
            "state_file": state_file.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{mode}{}", if paused { " (paused)" } else { "" });
    }
    Ok(())
}

/// Seed precedence: `--seed`, then the config seed, then [`DEFAULT_SEED`].
fn render_config(
    path: Option<&Path>,
    params: &str,
    seed: Option<u64>,
) -> Result<SceneConfig, CliError> {
    let base = match path {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    let overrides: serde_json::Value = serde_json::from_str(params)
        .map_err(|e| CliError::BadArgument(format!("invalid --params JSON: {e}")))?;
    let mut config = base.merged(&overrides)?;
    config.seed = Some(seed.or(config.seed).unwrap_or(DEFAULT_SEED));
    config.validate()?;
    Ok(config)
}

/// Renders never write state back. The pause flag is not carried over, so a
/// paused state file still renders frames.
fn render_store(mode: Option<&str>, state_file: Option<&Path>) -> Result<MemoryStore, CliError> {
    if let Some(raw) = mode {
        let mode: Mode = raw.parse()?;
        return Ok(MemoryStore::with_entry(MODE_KEY, mode.as_str()));
    }
    let Some(path) = state_file else {
        return Ok(MemoryStore::new());
    };
    Ok(match FileStore::new(path).load(MODE_KEY) {
        Ok(Some(value)) => MemoryStore::with_entry(MODE_KEY, &value),
        Ok(None) => MemoryStore::new(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "unreadable state file, using default mode");
            MemoryStore::new()
        }
    })
}

fn parse_pointer(raw: &str) -> Result<(f64, f64), CliError> {
    let invalid = || CliError::BadArgument(format!("invalid --pointer {raw:?}, expected X,Y"));
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok((x, y))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
