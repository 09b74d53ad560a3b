//! Fixed-Step Clock
//!
//! Turns variable frame times into whole simulation ticks. The remainder
//! carries over to the next frame so the simulation rate never depends on
//! the frame rate.

use tracing::warn;

use crate::game::events::GameEvent;
use crate::game::roster::ParticipantId;
use crate::game::settings::{validate_timestep, SettingsError};
use crate::game::state::Match;
use crate::game::tick::{tick, TickResult};

/// Default cap on ticks run for a single frame.
pub const DEFAULT_MAX_CATCH_UP: u32 = 5;

/// What one call to [`FixedStepClock::advance`] did.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Ticks simulated this frame
    pub ticks_run: u32,
    /// Events from all ticks of this frame, in tick order
    pub events: Vec<GameEvent>,
    /// Match has ended
    pub match_ended: bool,
    /// Winner, once ended
    pub winner: Option<ParticipantId>,
    /// Whole steps of backlog discarded by the catch-up cap
    pub dropped_ticks: u32,
}

/// Accumulating fixed-step driver.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f64,
    accumulator: f64,
    max_catch_up: u32,
    paused: bool,
}

impl FixedStepClock {
    /// Clock running `step`-second ticks.
    pub fn new(step: f64) -> Result<Self, SettingsError> {
        validate_timestep(step)?;
        Ok(Self {
            step,
            accumulator: 0.0,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            paused: false,
        })
    }

    /// Set the per-frame tick cap (at least 1).
    pub fn with_max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up.max(1);
        self
    }

    /// Change the per-frame tick cap (at least 1).
    pub fn set_max_catch_up(&mut self, max_catch_up: u32) {
        self.max_catch_up = max_catch_up.max(1);
    }

    /// Fixed step in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Feed `frame_seconds` of wall time and run the ticks it pays for.
    pub fn advance(&mut self, state: &mut Match, frame_seconds: f64) -> FrameReport {
        self.advance_with(state, frame_seconds, |_, _| {})
    }

    /// Like [`advance`](Self::advance), calling `on_tick` after every tick.
    pub fn advance_with<F>(&mut self, state: &mut Match, frame_seconds: f64, mut on_tick: F) -> FrameReport
    where
        F: FnMut(&Match, &TickResult),
    {
        let mut report = FrameReport {
            match_ended: state.is_ended(),
            winner: state.winner(),
            ..FrameReport::default()
        };

        if self.paused || state.is_ended() {
            return report;
        }
        // Negative or NaN frame times are treated as no time passing
        if frame_seconds.is_finite() && frame_seconds > 0.0 {
            self.accumulator += frame_seconds;
        }

        while self.accumulator >= self.step && report.ticks_run < self.max_catch_up {
            self.accumulator -= self.step;
            let result = tick(state, self.step);
            on_tick(state, &result);
            report.ticks_run += 1;
            report.events.extend(result.events);
            report.match_ended = result.match_ended;
            report.winner = result.winner;

            if result.match_ended {
                self.accumulator = 0.0;
                break;
            }
        }

        if self.accumulator >= self.step {
            let dropped = (self.accumulator / self.step).floor();
            report.dropped_ticks = dropped as u32;
            self.accumulator -= dropped * self.step;
            warn!(
                dropped = report.dropped_ticks,
                tick = state.tick_count(),
                "simulation falling behind, dropping backlog"
            );
        }

        report
    }

    /// Stop accumulating time.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Start accumulating again from an empty backlog.
    pub fn resume(&mut self) {
        self.paused = false;
        self.accumulator = 0.0;
    }

    /// Is the clock paused?
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fraction of a step waiting in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}
