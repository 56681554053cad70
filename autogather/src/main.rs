//! autogather: prompt-driven resource harvesting.
//!
//! The binary wires configuration, templates, capture and the controller
//! thread together. Key injection is left to the platform; this build logs
//! every intent instead.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use autogather::{
    assets,
    capture::{Capture, FileCapture},
    config::Config,
    controller::{self, Controller},
    input::TracingActuator,
    resource::Resource,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autogather")]
#[command(about = "Harvest resources by watching the interaction prompt")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the harvesting loop; press Enter to stop.
    Run(RunArgs),

    /// Capture one frame, outline the prompt region and detections, and save it.
    Snapshot(SnapshotArgs),

    /// List known resources and whether templates are installed.
    Resources,

    /// Write the default configuration file.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct SourceArgs {
    /// Read frames from this image file instead of the game window.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Resource to harvest (folder name; small typos are tolerated).
    #[arg(long)]
    resource: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Stand still and only act on prompts.
    #[arg(long)]
    dont_move: bool,

    /// Trigger on any prompt row, not only when the selector is on the gathering row.
    #[arg(long)]
    any_prompt: bool,

    /// Walk back to the starting point after each harvest.
    #[arg(long)]
    return_to_origin: bool,

    /// Seconds between status lines.
    #[arg(long, default_value = "1.0")]
    status_interval: f32,
}

#[derive(Debug, Clone, Args)]
struct SnapshotArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Where to write the annotated PNG.
    #[arg(long, default_value = "debug_prompt.png")]
    out: PathBuf,
}

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(cli.config, args),
        Commands::Snapshot(args) => snapshot(cli.config, args),
        Commands::Resources => resources(cli.config),
        Commands::InitConfig { force } => init_config(cli.config, force),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::try_load_from(path),
        None => Ok(Config::load_or_default()),
    }
}

fn apply_source(cfg: &mut Config, source: &SourceArgs) -> Result<()> {
    if let Some(name) = &source.resource {
        let resource: Resource = name.parse()?;
        cfg.set_resource(resource);
    }
    Ok(())
}

fn open_capture(cfg: &Config, source: &SourceArgs) -> Result<Box<dyn Capture>> {
    if let Some(path) = &source.frames {
        return Ok(Box::new(FileCapture::new(path)));
    }

    #[cfg(feature = "window-capture")]
    {
        Ok(Box::new(autogather::capture::WindowCapture::new(cfg.app_name.clone())))
    }
    #[cfg(not(feature = "window-capture"))]
    {
        bail!(
            "built without window capture (feature `window-capture`); pass --frames <image> to read frames for {:?} from a file",
            cfg.app_name
        )
    }
}

fn run(config_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut cfg = load_config(config_path.as_ref())?;
    apply_source(&mut cfg, &args.source)?;
    cfg.behaviour.dont_move |= args.dont_move;
    cfg.behaviour.return_to_origin |= args.return_to_origin;
    if args.any_prompt {
        cfg.behaviour.require_alignment = false;
    }
    cfg.validate().context("invalid configuration")?;

    let engine = autogather::build_ie(&cfg, Arc::new(ie::TracingSink))?;
    let capture = open_capture(&cfg, &args.source)?;

    let controller = Controller::new(engine, capture, TracingActuator, cfg);
    let status = controller.status_handle();
    let handle = controller::spawn(controller).context("spawn controller thread")?;

    // Status printer: reads the published snapshot, never touches the controller.
    let printer_stop = handle.stop_token();
    let interval = args.status_interval;
    let printer = std::thread::Builder::new()
        .name("status".to_string())
        .spawn(move || {
            while printer_stop.sleep_secs(interval) {
                let snapshot = status.lock().unwrap_or_else(|e| e.into_inner()).clone();
                println!("{snapshot}");
            }
        })
        .context("spawn status thread")?;

    println!("running; press Enter to stop");
    wait_for_enter(std::io::stdin().lock(), || handle.is_finished())?;

    let last = handle.status();
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("controller thread panicked"))?;
    let _ = printer.join();

    println!("stopped after {} harvests", last.harvests);
    Ok(())
}

/// Block until a line arrives on `input`. Once `input` is closed (detached
/// from a terminal) there is no Enter to wait for, so wait for `finished`.
fn wait_for_enter(mut input: impl BufRead, finished: impl Fn() -> bool) -> Result<()> {
    let mut line = String::new();
    if input.read_line(&mut line).context("read stdin")? == 0 {
        tracing::info!("stdin closed; running until interrupted");
        while !finished() {
            std::thread::park_timeout(Duration::from_millis(500));
        }
    }
    Ok(())
}

fn snapshot(config_path: Option<PathBuf>, args: SnapshotArgs) -> Result<()> {
    let mut cfg = load_config(config_path.as_ref())?;
    apply_source(&mut cfg, &args.source)?;
    // A snapshot never moves, so the world object set is optional.
    cfg.behaviour.dont_move = true;
    cfg.validate().context("invalid configuration")?;

    let extrema = Arc::new(ie::ScoreExtrema::default());
    let engine = autogather::build_ie(&cfg, extrema.clone())?;
    let mut capture = open_capture(&cfg, &args.source)?;
    let frame = capture.grab().context("no frame available")?;

    let set = engine.detect(frame.as_image());
    let world = engine.find_world_object(frame.as_image());
    ie::snapshot::annotate(frame.as_image(), &set, world.as_ref())
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("save {:?}", args.out))?;

    for label in ie::Label::ALL {
        let hit = match label {
            ie::Label::WorldObject => world,
            _ => set.get(label).copied(),
        };
        let range = extrema
            .get(label)
            .map(|(lo, hi)| format!("scores {lo:.3}..{hi:.3}"))
            .unwrap_or_else(|| "no templates".to_string());
        match hit {
            Some(d) => println!("{:>12}: {:.3} at {:?} ({range})", label.to_string(), d.score, d.bbox),
            None => println!("{:>12}: -  ({range})", label.to_string()),
        }
    }
    println!(
        "aligned: {}  |  saved {}",
        engine.prompt_is_aligned(&set, cfg.align_tolerance_px),
        args.out.display()
    );
    Ok(())
}

fn resources(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(config_path.as_ref())?;
    let installed = match assets::resolve_resources_dir(cfg.assets_dir.as_deref()) {
        Ok(root) => {
            println!("templates: {}", root.display());
            assets::scan_resources(&root)
        }
        Err(err) => {
            tracing::warn!(error = %err, "no template directory");
            Vec::new()
        }
    };

    for r in Resource::ALL {
        let (lateral, forward) = r.tolerance();
        println!(
            "{} {:<20} {:<20} tol {lateral}/{forward}{}",
            if installed.contains(&r) { "*" } else { " " },
            r.folder(),
            r.display_name(),
            if r.focus_needed() { "" } else { "  (no focus row)" },
        );
    }
    Ok(())
}

fn init_config(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => Config::path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save_to(&path)?;
    println!("wrote {}", path.display());
    Ok(())
}
