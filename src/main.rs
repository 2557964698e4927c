//! EdemaFlex glove controller - binary entry point.
//!
//! Thin front end over the session engine: connect (real or mock), start
//! a session, render status/telemetry/countdown events, and stop cleanly
//! on Ctrl-C or auto-stop.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use edemaflex_core::logging;
use edemaflex_core::prelude::*;
use edemaflex_engine::{CharacteristicKey, EngineEvent, GloveEngine, SegmentReadings, SettingsStore};

/// Run a compression-glove therapy session
#[derive(Parser, Debug)]
#[command(name = "edemaflex")]
#[command(about = "Run a compression-glove therapy session", long_about = None)]
struct Args {
    /// Use the simulated peripheral instead of real hardware
    #[arg(long)]
    mock: bool,

    /// Session duration in minutes (default 30)
    #[arg(long, value_name = "MINUTES")]
    duration: Option<u64>,

    /// Set a drive level before connecting, e.g. --level thumb=5 (repeatable)
    #[arg(long, value_name = "SEGMENT=LEVEL")]
    level: Vec<String>,

    /// Set the activation pattern: 0 = Single, 1 = Dual, 2 = Triple
    #[arg(long, value_name = "MODE")]
    pattern: Option<u8>,

    /// Settings file (default: the platform config directory)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let args = Args::parse();

    let store = match &args.settings {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::open_default()?,
    };
    let (engine, mut events) = GloveEngine::new(store);

    if let Some(minutes) = args.duration {
        engine.set_session_duration(Duration::from_secs(minutes * 60));
    }

    // Configuration overrides persist even if the connect below fails.
    for entry in &args.level {
        let (key, level) = parse_level(entry)?;
        if !engine.set_pwm_level(key, level).await {
            eprintln!(
                "Rejected level '{}': {}",
                entry,
                engine.error_message().unwrap_or_default()
            );
            std::process::exit(2);
        }
    }
    if let Some(mode) = args.pattern {
        if !engine.change_activation_mode(mode).await {
            eprintln!(
                "Rejected pattern {}: {}",
                mode,
                engine.error_message().unwrap_or_default()
            );
            std::process::exit(2);
        }
    }

    info!(
        "session configured (mock={}, duration={:?})",
        args.mock,
        engine.session_duration()
    );

    if args.mock {
        engine.mock_connect().await?;
    } else {
        engine.connect().await?;
    }

    engine.start_board().await?;
    if !engine.is_running() {
        eprintln!(
            "Could not start the board: {}",
            engine.error_message().unwrap_or_default()
        );
        engine.disconnect().await;
        std::process::exit(1);
    }

    println!(
        "Session running for {} (Ctrl-C stops and disconnects)",
        engine.remaining_time()
    );

    // Only print telemetry that actually changed; the poll loop re-reads
    // every segment ten times a second.
    let mut last_seen: BTreeMap<CharacteristicKey, String> = BTreeMap::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping session...");
                let finals = engine.disconnect().await;
                print_readings(finals.as_ref());
                break;
            }
            event = events.recv() => {
                match event {
                    Some(EngineEvent::StatusChanged(status)) => {
                        println!("status: {status}");
                    }
                    Some(EngineEvent::CountdownTick { remaining }) => {
                        println!("auto-stop in {remaining}");
                    }
                    Some(EngineEvent::TelemetryUpdated { key, value }) => {
                        if last_seen.get(&key) != Some(&value) {
                            println!("  {key}: {value}");
                            last_seen.insert(key, value);
                        }
                    }
                    Some(EngineEvent::SessionEnded) => {
                        println!("Your session has ended!");
                        break;
                    }
                    Some(EngineEvent::EngineError(message)) => {
                        eprintln!("error: {message}");
                    }
                    None => break,
                }
            }
        }
    }

    Ok(())
}

/// Parse a `SEGMENT=LEVEL` override like `thumb=5`.
fn parse_level(entry: &str) -> Result<(CharacteristicKey, u8)> {
    let (name, level) = entry
        .split_once('=')
        .ok_or_else(|| Error::validation(format!("expected SEGMENT=LEVEL, got '{entry}'")))?;
    let key: CharacteristicKey = name.parse()?;
    let level: u8 = level
        .parse()
        .map_err(|_| Error::validation(format!("invalid drive level '{level}'")))?;
    Ok((key, level))
}

fn print_readings(readings: Option<&SegmentReadings>) {
    let Some(readings) = readings else {
        return;
    };
    println!("Final glove state:");
    for (key, value) in readings {
        println!("  {key}: {value}");
    }
}
