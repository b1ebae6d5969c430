// SPDX-License-Identifier: MIT OR Apache-2.0
//! `curvanim_player` - headless animation player
//!
//! Loads a RON scene file, attaches its animators to a driver, ticks a
//! fixed-step scheduler and logs the resulting event trace and final scene
//! state.
//!
//! ```text
//! curvanim_player <scene.ron> [--frames N] [--step SECONDS] [--export PATH]
//! ```
//!
//! `--export` writes the scene's animation as a standalone file with its
//! progress curve normalized into [0, 1].
//!
//! Set `RUST_LOG=curvanim_player=trace` to see every progress update.

mod player;
mod scene_file;

use player::Player;
use scene_file::{PlayerError, PlayerScene, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: curvanim_player <scene.ron> [--frames N] [--step SECONDS] [--export PATH]";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: PathBuf,
    frames: Option<u32>,
    step: Option<f32>,
    export: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut scene = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--frames" => parsed.frames = Some(parse_value(&arg, args.next())?),
                "--step" => parsed.step = Some(parse_value(&arg, args.next())?),
                "--export" => parsed.export = Some(PathBuf::from(require(&arg, args.next())?)),
                "-h" | "--help" => return Err(PlayerError::Usage(USAGE.to_string())),
                flag if flag.starts_with("--") => {
                    return Err(PlayerError::Usage(format!("unknown option '{flag}'\n{USAGE}")));
                }
                _ if scene.is_none() => scene = Some(PathBuf::from(&arg)),
                _ => return Err(PlayerError::Usage(format!("unexpected argument '{arg}'\n{USAGE}"))),
            }
        }

        parsed.scene = scene.ok_or_else(|| PlayerError::Usage(USAGE.to_string()))?;
        Ok(parsed)
    }
}

fn require(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| PlayerError::Usage(format!("{flag} needs a value")))
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = require(flag, value)?;
    value
        .parse()
        .map_err(|_| PlayerError::Usage(format!("invalid value '{value}' for {flag}")))
}

fn run(args: Args) -> Result<()> {
    let scene = PlayerScene::load(&args.scene)?;

    if let Some(path) = &args.export {
        let mut animation = scene.animation.clone();
        animation.progress_curve = animation.progress_curve.normalized();
        animation.save(path)?;
        tracing::info!("Exported animation '{}' to {:?}", animation.name, path);
    }

    let mut player = Player::new(&scene)?;
    let mut plan = scene.playback;
    if let Some(frames) = args.frames {
        plan.frames = frames;
    }
    if let Some(step) = args.step {
        plan.step = step;
    }
    player.set_plan(plan);

    player.run();
    tracing::info!("{} driver event(s) recorded", player.trace().len());
    player.log_summary();
    Ok(())
}

fn main() -> ExitCode {
    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting curvanim player v{}", env!("CARGO_PKG_VERSION"));

    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(PlayerError::Usage(message)) => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("Player failed: {e}");
            ExitCode::FAILURE
        }
    }
}
