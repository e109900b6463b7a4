use clap::Parser;
use std::cell::RefCell;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use panel1620::clock::SystemClock;
use panel1620::config::PanelConfig;
use panel1620::display::TermDisplay;
use panel1620::input::StdinInput;
use panel1620::layout::PanelLayout;
use panel1620::panel::PanelController;
use panel1620::processor::TestPattern;

/// IBM 1620 control panel in the terminal, driven by a test pattern
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// stop after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// where log output goes; the terminal is taken by the panel
    #[arg(long, default_value = "panel1620.log")]
    log_file: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("panel1620={}", args.log_level)))
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();

    // initialise
    let config = match &args.config {
        Some(path) => PanelConfig::load(path)?,
        None => PanelConfig::default(),
    };
    debug!(?config, "config loaded");

    let layout = PanelLayout::standard(config.lamp_levels);
    let pattern = Rc::new(RefCell::new(TestPattern::new(&layout)));
    let mut display = TermDisplay::new(layout.clone(), &config.title)?;
    let mut input = StdinInput::new();
    let clock = SystemClock::new();

    let limit = args
        .duration
        .map(Duration::try_from_secs_f64)
        .transpose()?;
    let mut panel = PanelController::new(&layout, &config, pattern.clone(), &mut display)?;
    info!(?limit, "panel running");
    panel.run(&mut input, &clock, limit, |now| {
        pattern.borrow_mut().advance(now)
    })?;
    drop(panel);
    drop(display);

    info!(mar = pattern.borrow().mar_display(), "panel closed");
    Ok(())
}
