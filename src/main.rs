//! Ghost Hand CLI - dry-run entry point
//!
//! Runs an action script (or a short built-in demo) against the dry-run
//! backend, so sequences can be checked without touching a real desktop.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ghost_hand::input::{DryRunBackend, MouseButton, Point};
use ghost_hand::mouse::ClickRequest;
use ghost_hand::sequence::{parse_script, Action, ActionSequencer, BreakKind};
use ghost_hand::stealth::SystemClock;
use ghost_hand::Settings;

/// Run humanized input sequences against a dry-run backend
#[derive(Parser, Debug)]
#[command(name = "ghosthand")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON array of action records to run
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Action sequence preset, overriding the settings file
    #[arg(short, long)]
    preset: Option<String>,

    /// Random seed, overriding the settings file
    #[arg(long)]
    seed: Option<u64>,
}

fn demo() -> Vec<Action> {
    vec![
        Action::MouseMove {
            target: Point::new(400, 300),
            duration: None,
        },
        Action::MouseClick(ClickRequest::at(420, 310)),
        Action::TypeText {
            text: "hello world".to_string(),
            error_correction: true,
        },
        Action::KeyHotkey {
            keys: "ctrl+s".to_string(),
        },
        Action::Think { duration: None },
        Action::Break {
            kind: BreakKind::Micro,
            duration: Some(Duration::from_secs(1)),
        },
        Action::MouseDrag {
            target: Point::new(800, 500),
            button: MouseButton::Left,
            duration: Some(Duration::from_millis(600)),
        },
    ]
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(preset) = cli.preset {
        settings.preset = preset;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }

    let actions = match &cli.script {
        Some(path) => parse_script(&fs::read_to_string(path)?)?,
        None => demo(),
    };

    let humanizer = settings.humanizer(Arc::new(SystemClock::new()));
    let backend = Arc::new(DryRunBackend::default());
    let mut sequencer = ActionSequencer::with_humanizer(settings.build_profile(), backend, humanizer);

    log::info!("Running {} actions with preset '{}'", actions.len(), settings.preset);
    let result = sequencer.execute_sequence(actions);

    let stats = sequencer.statistics();
    if let Some(summary) = stats.session {
        println!("Session: {}", summary);
    }
    println!(
        "  moves: {} ({} overshoots, {} skipped), avg {:.0}px/s, max {:.0}px/s",
        stats.mouse.moves,
        stats.mouse.overshoots,
        stats.mouse.skipped_short_moves,
        stats.mouse.average_velocity(),
        stats.mouse.max_velocity
    );
    println!(
        "  keys pressed: {}, typos: {} ({} immediate, {} delayed corrections)",
        stats.keyboard.keys_pressed,
        stats.keyboard.errors_injected,
        stats.keyboard.immediate_corrections,
        stats.keyboard.delayed_corrections
    );

    Ok(result?)
}

fn main() -> ExitCode {
    // Level is overridden by `RUST_LOG`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ghosthand: {}", e);
            ExitCode::FAILURE
        }
    }
}
