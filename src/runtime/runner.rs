//! Match Runner
//!
//! Drives one match on a tokio task. The task owns the [`Match`]
//! exclusively; callers steer it with commands and watch it through a
//! snapshot channel and an event channel.
//!
//! Two pacing modes:
//! - `Realtime`: an interval feeds wall time into a [`FixedStepClock`]
//! - `Headless`: ticks run back to back, yielding between batches

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::core::hash::StateHash;
use crate::game::clock::{FixedStepClock, DEFAULT_MAX_CATCH_UP};
use crate::game::events::GameEvent;
use crate::game::roster::{Participant, ParticipantId};
use crate::game::settings::{Settings, SettingsError};
use crate::game::state::{Match, MatchError};
use crate::game::tick::tick;
use crate::replay::transcript::{MatchTranscript, TranscriptRecorder};
use crate::runtime::snapshot::MatchSnapshot;

/// Ticks run between yields in headless mode.
const HEADLESS_BATCH: u32 = 64;

/// Command channel depth.
const COMMAND_BUFFER: usize = 16;

/// Event channel depth.
const EVENT_BUFFER: usize = 1024;

/// Commands accepted by a running match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    /// Stop simulating until resumed.
    Pause,
    /// Continue after a pause.
    Resume,
    /// End the run now; the match is reported as stopped early.
    Stop,
}

/// How simulation time is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One step per `1 / tick_rate` seconds of wall time.
    #[default]
    Realtime,
    /// As fast as possible.
    Headless,
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Simulation rate (Hz); the fixed step is its inverse.
    pub tick_rate: u32,
    /// Pacing mode.
    pub mode: RunMode,
    /// Per-frame catch-up cap in realtime mode.
    pub max_catch_up: u32,
    /// Stop after this many ticks even if the match is still running.
    pub max_ticks: Option<u32>,
    /// Record a replay transcript.
    pub record_transcript: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            mode: RunMode::Realtime,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            max_ticks: None,
            record_transcript: false,
        }
    }
}

impl RunnerConfig {
    /// Fixed step in seconds.
    pub fn step(&self) -> f64 {
        1.0 / f64::from(self.tick_rate)
    }
}

/// Runner errors.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The match could not be started.
    #[error("failed to start match: {0}")]
    Match(#[from] MatchError),

    /// Tick rate of zero.
    #[error("tick rate must be positive")]
    InvalidTickRate,

    /// The fixed step was rejected.
    #[error("invalid step: {0}")]
    Step(#[from] SettingsError),

    /// The runner task panicked or was cancelled.
    #[error("match task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The runner has already finished.
    #[error("match runner is no longer running")]
    Closed,
}

/// How a run finished.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Match identifier.
    pub match_id: Uuid,
    /// Sole survivor, if the match ended with one.
    pub winner: Option<ParticipantId>,
    /// Ticks simulated.
    pub ticks: u32,
    /// State hash when the run finished.
    pub final_hash: StateHash,
    /// Standings, best first.
    pub placements: Vec<(ParticipantId, u32)>,
    /// Stopped by command or tick limit before the match ended.
    pub stopped_early: bool,
    /// Replay transcript, if recording was requested.
    pub transcript: Option<MatchTranscript>,
}

/// Caller side of a running match.
#[derive(Debug)]
pub struct MatchHandle {
    /// Match identifier.
    pub match_id: Uuid,
    commands: mpsc::Sender<RunnerCommand>,
    snapshots: watch::Receiver<MatchSnapshot>,
    events: broadcast::Sender<GameEvent>,
    task: JoinHandle<MatchOutcome>,
}

impl MatchHandle {
    /// Send a command to the runner.
    pub async fn send(&self, command: RunnerCommand) -> Result<(), RunnerError> {
        self.commands.send(command).await.map_err(|_| RunnerError::Closed)
    }

    /// Pause the match.
    pub async fn pause(&self) -> Result<(), RunnerError> {
        self.send(RunnerCommand::Pause).await
    }

    /// Resume the match.
    pub async fn resume(&self) -> Result<(), RunnerError> {
        self.send(RunnerCommand::Resume).await
    }

    /// Stop the match.
    pub async fn stop(&self) -> Result<(), RunnerError> {
        self.send(RunnerCommand::Stop).await
    }

    /// Command sender, for steering the match from other tasks.
    pub fn commands(&self) -> mpsc::Sender<RunnerCommand> {
        self.commands.clone()
    }

    /// Latest snapshot receiver.
    pub fn snapshots(&self) -> watch::Receiver<MatchSnapshot> {
        self.snapshots.clone()
    }

    /// Subscribe to game events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Wait for the run to finish.
    pub async fn join(self) -> Result<MatchOutcome, RunnerError> {
        Ok(self.task.await?)
    }
}

/// Task side of a running match.
pub struct MatchRunner {
    match_id: Uuid,
    state: Match,
    clock: FixedStepClock,
    config: RunnerConfig,
    commands: mpsc::Receiver<RunnerCommand>,
    commands_open: bool,
    snapshot_tx: watch::Sender<MatchSnapshot>,
    event_tx: broadcast::Sender<GameEvent>,
    recorder: Option<TranscriptRecorder>,
}

impl MatchRunner {
    /// Start a match and spawn its runner on the current tokio runtime.
    pub fn spawn(
        roster: &[Participant],
        settings: Settings,
        config: RunnerConfig,
    ) -> Result<MatchHandle, RunnerError> {
        if config.tick_rate == 0 {
            return Err(RunnerError::InvalidTickRate);
        }
        let clock = FixedStepClock::new(config.step())?.with_max_catch_up(config.max_catch_up);
        let state = Match::start(roster, settings)?;
        let match_id = Uuid::new_v4();

        let recorder = config
            .record_transcript
            .then(|| TranscriptRecorder::new(match_id, roster, &state, config.step()));

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let runner = Self {
            match_id,
            state,
            clock,
            config,
            commands: command_rx,
            commands_open: true,
            snapshot_tx,
            event_tx: event_tx.clone(),
            recorder,
        };
        let task = tokio::spawn(runner.run());

        Ok(MatchHandle {
            match_id,
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            task,
        })
    }

    /// Run until the match ends, a stop is requested or the tick limit hits.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    async fn run(mut self) -> MatchOutcome {
        info!(
            bodies = self.state.bodies().len(),
            seed = self.state.settings.seed,
            mode = ?self.config.mode,
            "match running"
        );

        let stopped_early = match self.config.mode {
            RunMode::Realtime => self.run_realtime().await,
            RunMode::Headless => self.run_headless().await,
        };

        self.finish(stopped_early)
    }

    async fn run_realtime(&mut self) -> bool {
        let frame = Duration::from_secs_f64(self.clock.step());
        let mut ticker = interval(frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_frame = Instant::now();

        if self.tick_limit_reached() {
            return true;
        }

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv(), if self.commands_open => {
                    if self.handle_command(command) {
                        return true;
                    }
                    if !self.clock.is_paused() {
                        last_frame = Instant::now();
                    }
                }
                now = ticker.tick() => {
                    let elapsed = now.saturating_duration_since(last_frame).as_secs_f64();
                    last_frame = now;

                    self.clock.set_max_catch_up(catch_up_budget(
                        self.config.max_catch_up,
                        self.config.max_ticks,
                        self.state.tick_count(),
                    ));
                    let recorder = &mut self.recorder;
                    let report = self.clock.advance_with(&mut self.state, elapsed, |state, result| {
                        if let Some(recorder) = recorder.as_mut() {
                            recorder.observe(state, &result.events);
                        }
                    });
                    if report.ticks_run == 0 {
                        continue;
                    }
                    self.broadcast(report.events);
                    self.snapshot_tx.send_replace(self.state.snapshot());

                    if report.match_ended {
                        return false;
                    }
                    if self.tick_limit_reached() {
                        return true;
                    }
                }
            }
        }
    }

    async fn run_headless(&mut self) -> bool {
        let step = self.clock.step();

        loop {
            // Drain commands; block while paused
            loop {
                let command = if self.clock.is_paused() && self.commands_open {
                    self.commands.recv().await
                } else {
                    match self.commands.try_recv() {
                        Ok(command) => Some(command),
                        Err(mpsc::error::TryRecvError::Empty) => break,
                        Err(mpsc::error::TryRecvError::Disconnected) => None,
                    }
                };
                if !self.commands_open && command.is_none() {
                    break;
                }
                if self.handle_command(command) {
                    return true;
                }
            }

            let mut events = Vec::new();
            for _ in 0..HEADLESS_BATCH {
                if self.state.is_ended() || self.tick_limit_reached() {
                    break;
                }
                let result = tick(&mut self.state, step);
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.observe(&self.state, &result.events);
                }
                events.extend(result.events);
            }
            self.broadcast(events);
            self.snapshot_tx.send_replace(self.state.snapshot());

            if self.state.is_ended() {
                return false;
            }
            if self.tick_limit_reached() {
                return true;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Apply a command. Returns true if the run should stop.
    fn handle_command(&mut self, command: Option<RunnerCommand>) -> bool {
        match command {
            Some(RunnerCommand::Pause) => {
                debug!(tick = self.state.tick_count(), "paused");
                self.clock.pause();
            }
            Some(RunnerCommand::Resume) => {
                debug!(tick = self.state.tick_count(), "resumed");
                self.clock.resume();
            }
            Some(RunnerCommand::Stop) => {
                info!(tick = self.state.tick_count(), "stop requested");
                return true;
            }
            None => {
                // Every handle is gone; keep running unattended
                debug!("command channel closed");
                self.commands_open = false;
                if self.clock.is_paused() {
                    warn!("command channel closed while paused, resuming");
                    self.clock.resume();
                }
            }
        }
        false
    }

    fn broadcast(&self, events: Vec<GameEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.event_tx.send(event);
        }
    }

    fn tick_limit_reached(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|limit| self.state.tick_count() >= limit)
    }

    fn finish(self, stopped_early: bool) -> MatchOutcome {
        let stopped_early = stopped_early && self.state.is_running();
        let final_hash = self.state.compute_hash();

        if stopped_early {
            info!(tick = self.state.tick_count(), alive = self.state.alive_count(), "match stopped");
        } else {
            info!(
                tick = self.state.tick_count(),
                winner = ?self.state.winner(),
                hash = %hex::encode(final_hash),
                "match finished"
            );
        }
        self.snapshot_tx.send_replace(self.state.snapshot());

        MatchOutcome {
            match_id: self.match_id,
            winner: self.state.winner(),
            ticks: self.state.tick_count(),
            final_hash,
            placements: self.state.placements(),
            stopped_early,
            transcript: self.recorder.map(|recorder| recorder.finish(&self.state)),
        }
    }
}

/// Ticks one realtime frame may run without overshooting `max_ticks`.
fn catch_up_budget(max_catch_up: u32, max_ticks: Option<u32>, tick: u32) -> u32 {
    match max_ticks {
        Some(limit) => max_catch_up.min(limit.saturating_sub(tick)),
        None => max_catch_up,
    }
}
