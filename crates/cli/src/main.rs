use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use engine::time::format_rate;
use engine::{
    Command, Engine, EngineConfig, Event, PlaybackParams, PlayerHost, SimulatedPlayer, TrimRange,
    format_clock,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "trim-cli")]
#[command(about = "Headless trim-and-play flow driven by a simulated player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a trimmed range against the simulated player
    Simulate {
        /// Video URI recorded in the session
        #[arg(long, default_value = "file:///simulated.mp4")]
        uri: String,

        /// Clip duration in milliseconds
        #[arg(short, long)]
        duration: u64,

        /// Range start in milliseconds
        #[arg(short, long)]
        start: u64,

        /// Range end in milliseconds
        #[arg(short, long)]
        end: u64,

        /// Pause at the range end instead of looping
        #[arg(long)]
        no_loop: bool,

        /// Number of player notifications to simulate
        #[arg(long, default_value = "200")]
        ticks: usize,

        /// Simulated time between notifications
        #[arg(long, default_value = "50")]
        tick_ms: u64,

        /// Rate ladder steps to advance before playing
        #[arg(long, default_value = "0")]
        rate_steps: usize,

        /// Engine configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one JSON snapshot per notification
        #[arg(long)]
        json: bool,
    },

    /// Check a trim range against a clip duration
    Validate {
        /// Clip duration in milliseconds
        #[arg(short, long)]
        duration: u64,

        /// Range start in milliseconds
        #[arg(short, long)]
        start: u64,

        /// Range end in milliseconds
        #[arg(short, long)]
        end: u64,
    },
}

struct SimulateArgs {
    uri: String,
    duration: u64,
    range: TrimRange,
    looping: bool,
    ticks: usize,
    tick_ms: u64,
    rate_steps: usize,
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            uri,
            duration,
            start,
            end,
            no_loop,
            ticks,
            tick_ms,
            rate_steps,
            config,
            json,
        } => {
            let config = load_config(config)?;
            simulate(
                config,
                SimulateArgs {
                    uri,
                    duration,
                    range: TrimRange {
                        start_ms: start,
                        end_ms: end,
                    },
                    looping: !no_loop,
                    ticks,
                    tick_ms,
                    rate_steps,
                    json,
                },
            )
        }
        Commands::Validate {
            duration,
            start,
            end,
        } => {
            let range = TrimRange {
                start_ms: start,
                end_ms: end,
            };
            range
                .validate(duration)
                .with_context(|| format!("range {start}..{end} rejected"))?;
            println!(
                "ok: {} to {} ({} ms)",
                format_clock(start),
                format_clock(end),
                range.len_ms()
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn simulate(mut config: EngineConfig, args: SimulateArgs) -> Result<()> {
    config.playback.looping = args.looping;
    let mut engine = Engine::new(config);
    let mut host = PlayerHost::new(SimulatedPlayer::new(args.duration));

    run(
        &mut engine,
        &mut host,
        Command::OpenPlayback(PlaybackParams {
            video_uri: Some(args.uri.clone()),
            start_time: args.range.start_ms,
            end_time: args.range.end_ms,
            original_duration: args.duration,
            trimmed_duration: args.range.len_ms(),
        }),
    )?;

    let mut started = false;
    for tick in 0..args.ticks {
        let status = host.player_mut().tick(args.tick_ms);
        run(&mut engine, &mut host, Command::PlayerStatus(status))?;

        let Some(playback) = engine.playback() else {
            bail!("playback stage closed unexpectedly");
        };
        if !started && playback.is_initialized() {
            started = true;
            for _ in 0..args.rate_steps {
                run(&mut engine, &mut host, Command::CycleRate)?;
            }
            run(&mut engine, &mut host, Command::Play)?;
        }

        let Some(playback) = engine.playback() else {
            bail!("playback stage closed unexpectedly");
        };
        let snapshot = playback.snapshot();
        if args.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!(
                "{tick:>5} {:>8} {:?} {} player={}",
                format_clock(snapshot.position_ms),
                snapshot.phase,
                format_rate(snapshot.rate),
                format_clock(host.player().position_ms()),
            );
        }
    }

    run(&mut engine, &mut host, Command::Teardown)?;
    info!(
        accepted = host.player().accepted().len(),
        "simulation finished"
    );
    Ok(())
}

/// Runs one engine command and every player command it emits.
fn run(
    engine: &mut Engine,
    host: &mut PlayerHost<SimulatedPlayer>,
    command: Command,
) -> Result<()> {
    let events = engine.handle_command(command)?;
    let mut commands = Vec::new();
    for event in events {
        match event {
            Event::Player(command) => commands.push(command),
            Event::Notice(notice) => warn!(kind = ?notice.kind, "{}", notice.message),
            _ => {}
        }
    }

    for failure in host.dispatch(&commands) {
        run(
            engine,
            host,
            Command::PlayerCommandFailed {
                seq: failure.seq,
                kind: failure.kind,
                reason: failure.reason,
            },
        )?;
    }
    Ok(())
}
