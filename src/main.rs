//! Top Battle
//!
//! Runs one spinning-top battle from the command line, headless or in
//! real time, then checks it by replay.

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use top_battle::{
    config::{AppConfig, Cli},
    game::events::{GameEvent, GameEventData},
    replay::{verify_transcript, MatchTranscript},
    runtime::{MatchOutcome, MatchRunner, RunnerCommand},
    TICK_RATE, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;

    info!("Top Battle v{}", VERSION);
    let config = AppConfig::load(&cli).context("failed to load configuration")?;
    info!(
        "Tick Rate: {} Hz (default {} Hz)",
        config.runner.tick_rate, TICK_RATE
    );

    let handle = MatchRunner::spawn(&config.roster, config.settings.clone(), config.runner.clone())
        .context("failed to start match")?;
    info!(match_id = %handle.match_id, participants = config.roster.len(), "match created");

    // Event log
    let mut events = handle.subscribe_events();
    let event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Snapshot feed on stdout
    let snapshot_task = config.snapshots.then(|| {
        let mut snapshots = handle.snapshots();
        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                match snapshot.to_json_line() {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("failed to encode snapshot: {}", e),
                }
            }
        })
    });

    // Ctrl-C stops the match cleanly
    let commands = handle.commands();
    let interrupt_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping match");
            let _ = commands.send(RunnerCommand::Stop).await;
        }
    });

    let outcome = handle.join().await.context("match task failed")?;
    interrupt_task.abort();
    let _ = event_task.await;
    if let Some(task) = snapshot_task {
        let _ = task.await;
    }

    report(&outcome);

    if let Some(transcript) = &outcome.transcript {
        if let Some(path) = &config.transcript_path {
            let bytes = if config.binary_transcript {
                transcript.to_bytes()?
            } else {
                transcript.to_json()?.into_bytes()
            };
            fs::write(path, &bytes)
                .with_context(|| format!("failed to write transcript to {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "transcript written");
        }

        if config.verify {
            verify(transcript, outcome.stopped_early)?;
        }
    }

    Ok(())
}

fn init_logging(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    // Logs on stderr so stdout carries only snapshots
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn log_event(event: &GameEvent) {
    match &event.data {
        GameEventData::BodyEliminated { body, cause, placement } => {
            info!("Tick {}: {} eliminated ({}), placement {}", event.tick, body, cause, placement);
        }
        GameEventData::MatchEnded { winner: Some(winner), duration_ticks } => {
            info!("Match ended after {} ticks! Winner: {}", duration_ticks, winner);
        }
        GameEventData::MatchEnded { winner: None, duration_ticks } => {
            info!("Match ended after {} ticks with no survivor", duration_ticks);
        }
        _ => {}
    }
}

fn report(outcome: &MatchOutcome) {
    info!("=== Match Results ===");
    if outcome.stopped_early {
        warn!("Match stopped early at tick {}", outcome.ticks);
    }
    info!("Final State Hash: {}", hex::encode(outcome.final_hash));

    for (id, placement) in &outcome.placements {
        if *placement == u32::MAX {
            info!("  -: {}", id);
        } else {
            info!("#{}: {}", placement, id);
        }
    }
}

fn verify(transcript: &MatchTranscript, stopped_early: bool) -> Result<()> {
    if stopped_early {
        warn!("match did not finish, skipping replay verification");
        return Ok(());
    }

    info!("=== Verifying Determinism ===");
    let result = verify_transcript(transcript);
    info!("Replay State Hash: {}", hex::encode(result.computed_final_hash));

    if !result.valid {
        match result.error {
            Some(e) => bail!("DETERMINISM FAILURE: {}", e),
            None => bail!("DETERMINISM FAILURE"),
        }
    }
    info!(
        checkpoints = result.checkpoint_results.len(),
        "DETERMINISM VERIFIED: Hashes match!"
    );
    Ok(())
}
