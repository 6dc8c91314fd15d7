//! Headless game runner.
//!
//! Computer players race each other while the event stream is logged.
//! Human players, if any, are driven from stdin with lines of the form
//! `<player> <slot>`.

use std::sync::Arc;

use anyhow::{Context, Error, bail};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use set_game::{
    ArbiterActor, ArbiterHandle, EventSink, FeatureRules, GameConfig, GameEvent, GameSummary,
    PlayerId, PlayerKind, Slot,
};
use tokio::sync::mpsc;

const HELP: &str = "\
Run a headless card-matching game

USAGE:
  sg_bots [OPTIONS]

OPTIONS:
  --players    N           Number of computer players      [default: env SET_COMPUTER_PLAYERS or 2]
  --humans     N           Number of stdin-driven players  [default: env SET_HUMAN_PLAYERS or 0]
  --round-ms   MS          Round duration in milliseconds  [default: env SET_ROUND_DURATION_MS or 60000]
  --seed       N           Seed for dealing and computer players
  --config     FILE        JSON configuration file (replaces SET_* environment variables)

FLAGS:
  --hints                  Log every valid combination at round start
  -h, --help               Print help information

HUMAN INPUT:
  One press per line on stdin: <player> <slot>, e.g. `0 7`

ENVIRONMENT:
  SET_TABLE_SIZE, SET_DECK_SIZE, SET_CLAIM_SIZE, SET_POINT_FREEZE_MS,
  SET_PENALTY_FREEZE_MS, SET_URGENT_THRESHOLD_MS, ... (see GameConfig)
  RUST_LOG                 Log verbosity (e.g. info, set_game=debug)
";

/// Event channel depth for the logger; urgent countdowns arrive every 10 ms
const EVENT_BUFFER: usize = 4096;

struct Args {
    players: Option<usize>,
    humans: Option<usize>,
    round_ms: Option<u64>,
    seed: Option<u64>,
    config: Option<String>,
    hints: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        players: pargs.opt_value_from_str("--players")?,
        humans: pargs.opt_value_from_str("--humans")?,
        round_ms: pargs.opt_value_from_str("--round-ms")?,
        seed: pargs.opt_value_from_str("--seed")?,
        config: pargs.opt_value_from_str("--config")?,
        hints: pargs.contains("--hints"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("Unexpected arguments: {:?}", remaining);
    }

    env_logger::builder().format_target(false).init();

    let config = load_config(&args)?;
    let rules = FeatureRules::default();
    if rules.deck_size() != config.deck_size {
        log::warn!(
            "Deck of {} cards with rules describing {}",
            config.deck_size,
            rules.deck_size()
        );
    }

    let events = EventSink::new();
    let stream = events.subscribe(EVENT_BUFFER);
    let (arbiter, handle) = ArbiterActor::new(config.clone(), Arc::new(rules), events)?;

    // Catching signals for a graceful end of game.
    let terminator = handle.clone();
    set_handler(move || {
        info!("Interrupted, ending game");
        terminator.terminate();
    })?;

    tokio::spawn(log_events(stream));
    if config.human_players > 0 {
        spawn_stdin_reader(handle.clone());
    }

    info!(
        "Starting game: {} human and {} computer players, {} ms rounds",
        config.human_players, config.computer_players, config.round_duration_ms
    );
    let summary = arbiter.run().await?;
    print_summary(&summary);

    Ok(())
}

/// File or environment configuration, then command-line overrides
fn load_config(args: &Args) -> Result<GameConfig, Error> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration file {path}"))?;
            GameConfig::from_json(&json)?
        }
        None => GameConfig::from_env(),
    };

    if let Some(players) = args.players {
        config.computer_players = players;
    }
    if let Some(humans) = args.humans {
        config.human_players = humans;
    }
    if let Some(round_ms) = args.round_ms {
        config.round_duration_ms = round_ms;
        config.urgent_threshold_ms = config.urgent_threshold_ms.min(round_ms);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.hints |= args.hints;

    config.validate()?;
    Ok(config)
}

async fn log_events(mut stream: mpsc::Receiver<GameEvent>) {
    while let Some(event) = stream.recv().await {
        match event {
            GameEvent::RoundStarted { round } => info!("Round {round} started"),
            GameEvent::RoundEnded { round } => info!("Round {round} ended"),
            GameEvent::ScoreChanged { player, score } => info!("{player} scores ({score})"),
            GameEvent::WinnersAnnounced(winners) => info!("Winners: {}", names(&winners)),
            GameEvent::Countdown { remaining, urgent } => {
                if urgent {
                    log::debug!("{:.1}s left", remaining.as_secs_f32());
                } else {
                    log::trace!("{}s left", remaining.as_secs());
                }
            }
            other => log::trace!("{:?}", other),
        }
    }
}

/// Forward stdin presses to human players.
///
/// Runs on a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader(handle: ArbiterHandle) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if handle.is_terminated() {
                break;
            }

            let Some((id, slot)) = parse_press(&line) else {
                log::warn!("Expected `<player> <slot>`, got {:?}", line);
                continue;
            };
            match handle.player(id) {
                Some(player) if player.kind() == PlayerKind::Human => {
                    if !player.key_pressed(slot) {
                        log::debug!("{id} press on slot {slot} dropped");
                    }
                }
                Some(_) => log::warn!("{id} is a computer player"),
                None => log::warn!("No such player: {id}"),
            }
        }
    });
}

fn parse_press(line: &str) -> Option<(PlayerId, Slot)> {
    let mut parts = line.split_whitespace();
    let player = parts.next()?.parse().ok()?;
    let slot = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((PlayerId(player), slot))
}

fn names(players: &[PlayerId]) -> String {
    players
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_summary(summary: &GameSummary) {
    println!("Game over after {} round(s)", summary.rounds);
    for (player, score) in &summary.scores {
        println!("  {player}: {score}");
    }
    println!("Winners: {}", names(&summary.winners));
    println!(
        "Claims: {} points, {} penalties, {} neutral",
        summary.stats.points, summary.stats.penalties, summary.stats.neutrals
    );
}
