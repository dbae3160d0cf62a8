use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use panelsim::surface::WindowSurface;
use panelsim::work::{Blink, Idle};
use panelsim::{Application, Settings, VisibilityHandles, Work, WindowSettings};

#[derive(Parser, Debug)]
#[command(name = "panelsim", version, about = "Show a live composite of toggleable image layers")]
struct Cli {
    /// Directory with one image per layer, composited in file name order
    #[arg(value_name = "DIR", default_value = "images/output")]
    layer_dir: PathBuf,

    /// Milliseconds between two redraws
    #[arg(long, value_name = "MS", default_value_t = 50)]
    interval: u64,

    /// Milliseconds to wait for the worker on shutdown (0 waits forever)
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    shutdown_timeout: u64,

    /// Layer to blink on and off
    #[arg(long, value_name = "LAYER")]
    blink: Option<String>,

    /// Milliseconds the blinking layer stays in each state
    #[arg(long, value_name = "MS", default_value_t = 100)]
    period: u64,

    /// Only redraw when a layer changed
    #[arg(long)]
    skip_idle: bool,

    /// Window title
    #[arg(long, default_value = "panelsim")]
    title: String,
}

enum PanelWork {
    Blink(Blink),
    Idle(Idle),
}

impl Work for PanelWork {
    fn run_once(&mut self) -> anyhow::Result<()> {
        match self {
            PanelWork::Blink(blink) => blink.run_once(),
            PanelWork::Idle(idle) => idle.run_once(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let shutdown_timeout = match cli.shutdown_timeout {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };
    let settings = Settings::new(&cli.layer_dir)
        .with_update_interval(Duration::from_millis(cli.interval))
        .with_shutdown_timeout(shutdown_timeout)
        .with_skip_idle_redraw(cli.skip_idle)
        .with_window(WindowSettings {
            title: cli.title.clone(),
            ..WindowSettings::default()
        });

    let period = Duration::from_millis(cli.period);
    let mut missing_layer = None;
    let app = Application::new(settings, |handles: VisibilityHandles| {
        match cli.blink.as_deref().map(|name| (name, handles.get(name))) {
            Some((_, Some(handle))) => PanelWork::Blink(Blink::new(handle.clone(), period)),
            Some((name, None)) => {
                missing_layer = Some(name.to_string());
                PanelWork::Idle(Idle::new(period))
            }
            None => PanelWork::Idle(Idle::new(period)),
        }
    })
    .with_context(|| format!("could not load layers from {:?}", cli.layer_dir))?;

    if let Some(name) = missing_layer {
        bail!("there is no layer called `{}` to blink", name);
    }

    let surface = WindowSurface::new(&app.settings().window);
    let stats = app.run(surface)?;

    log::info!(
        "rendered {} frames over {} ticks, {} commands applied, {} ignored",
        stats.frames,
        stats.ticks,
        stats.applied,
        stats.ignored
    );

    Ok(())
}
