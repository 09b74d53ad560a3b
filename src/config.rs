//! Configuration
//!
//! Layers, lowest to highest priority: built-in defaults, an optional
//! JSON settings file, `TOP_BATTLE_*` environment variables, command-line
//! flags. Unparseable environment values are logged and ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};

use crate::game::roster::{default_roster, Participant};
use crate::game::settings::{Settings, SettingsError};
use crate::runtime::runner::{RunMode, RunnerConfig};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "TOP_BATTLE_";

/// Roster size when no roster file is given.
pub const DEFAULT_PARTICIPANTS: usize = 8;

/// Command-line interface.
#[derive(Debug, Clone, Parser)]
#[command(name = "top-battle", version, about = "Deterministic spinning-top elimination battles")]
pub struct Cli {
    /// JSON roster file (array of {id, label, color})
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Number of generated participants when no roster file is given
    #[arg(long, short = 'n')]
    pub participants: Option<usize>,

    /// JSON settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u32>,

    /// Arena radius
    #[arg(long)]
    pub arena_radius: Option<f64>,

    /// Body radius
    #[arg(long)]
    pub body_radius: Option<f64>,

    /// Linear friction per second
    #[arg(long)]
    pub friction: Option<f64>,

    /// Angular friction per second
    #[arg(long)]
    pub spin_friction: Option<f64>,

    /// Damage multiplier
    #[arg(long)]
    pub damage: Option<f64>,

    /// Speed below which a top may settle
    #[arg(long)]
    pub settle_speed: Option<f64>,

    /// Spin below which a top may settle
    #[arg(long)]
    pub settle_spin: Option<f64>,

    /// Simulation rate (Hz)
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Run as fast as possible instead of in real time
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many ticks
    #[arg(long)]
    pub max_ticks: Option<u32>,

    /// Print snapshots to stdout as JSON lines
    #[arg(long)]
    pub snapshots: bool,

    /// Write a replay transcript to this path
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Write the transcript as bincode instead of JSON
    #[arg(long, requires = "transcript")]
    pub binary: bool,

    /// Skip the determinism check after the match
    #[arg(long)]
    pub no_verify: bool,

    /// Log filter (tracing EnvFilter syntax)
    #[arg(long, env = "TOP_BATTLE_LOG", default_value = "info")]
    pub log: String,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file is not valid JSON for its type.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The resulting settings are unusable.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Tick rate of zero.
    #[error("tick rate must be positive")]
    InvalidTickRate,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Participants in spawn order.
    pub roster: Vec<Participant>,
    /// Validated match settings.
    pub settings: Settings,
    /// Runner pacing.
    pub runner: RunnerConfig,
    /// Emit JSON snapshot lines.
    pub snapshots: bool,
    /// Transcript output path.
    pub transcript_path: Option<PathBuf>,
    /// Write the transcript as bincode.
    pub binary_transcript: bool,
    /// Replay and compare after the match.
    pub verify: bool,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with `lookup` standing in for the environment.
    pub fn resolve<F>(cli: &Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvOverrides { lookup };

        // Settings: defaults < file < env < flags
        let mut settings = match &cli.settings {
            Some(path) => read_json(path)?,
            None => Settings::default(),
        };
        env.apply(&mut settings);
        apply_flags(cli, &mut settings);
        settings.validate()?;

        let roster = match &cli.roster {
            Some(path) => read_json(path)?,
            None => {
                let count = cli
                    .participants
                    .or_else(|| env.get("PARTICIPANTS"))
                    .unwrap_or(DEFAULT_PARTICIPANTS);
                default_roster(count)
            }
        };

        let tick_rate = cli
            .tick_rate
            .or_else(|| env.get("TICK_RATE"))
            .unwrap_or(crate::TICK_RATE);
        if tick_rate == 0 {
            return Err(ConfigError::InvalidTickRate);
        }

        let runner = RunnerConfig {
            tick_rate,
            mode: if cli.headless { RunMode::Headless } else { RunMode::Realtime },
            max_ticks: cli.max_ticks,
            record_transcript: cli.transcript.is_some() || !cli.no_verify,
            ..RunnerConfig::default()
        };

        info!(
            participants = roster.len(),
            seed = settings.seed,
            tick_rate,
            mode = ?runner.mode,
            "configuration loaded"
        );

        Ok(Self {
            roster,
            settings,
            runner,
            snapshots: cli.snapshots,
            transcript_path: cli.transcript.clone(),
            binary_transcript: cli.binary,
            verify: !cli.no_verify,
        })
    }
}

/// `TOP_BATTLE_*` variables read through a lookup function.
struct EnvOverrides<F> {
    lookup: F,
}

impl<F> EnvOverrides<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Parsed value of `TOP_BATTLE_<name>`, if set and valid.
    fn get<T: FromStr>(&self, name: &str) -> Option<T> {
        let key = format!("{ENV_PREFIX}{name}");
        let raw = (self.lookup)(&key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%key, value = %raw, "ignoring unparseable environment override");
                None
            }
        }
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.get("SEED") {
            settings.seed = v;
        }
        if let Some(v) = self.get("ARENA_RADIUS") {
            settings.arena_radius = v;
        }
        if let Some(v) = self.get("BODY_RADIUS") {
            settings.body_radius = v;
        }
        if let Some(v) = self.get("FRICTION") {
            settings.friction = v;
        }
        if let Some(v) = self.get("SPIN_FRICTION") {
            settings.spin_friction = v;
        }
        if let Some(v) = self.get("DAMAGE") {
            settings.damage_multiplier = v;
        }
        if let Some(v) = self.get("SETTLE_SPEED") {
            settings.settle_speed = v;
        }
        if let Some(v) = self.get("SETTLE_SPIN") {
            settings.settle_spin = v;
        }
    }
}

fn apply_flags(cli: &Cli, settings: &mut Settings) {
    if let Some(v) = cli.seed {
        settings.seed = v;
    }
    if let Some(v) = cli.arena_radius {
        settings.arena_radius = v;
    }
    if let Some(v) = cli.body_radius {
        settings.body_radius = v;
    }
    if let Some(v) = cli.friction {
        settings.friction = v;
    }
    if let Some(v) = cli.spin_friction {
        settings.spin_friction = v;
    }
    if let Some(v) = cli.damage {
        settings.damage_multiplier = v;
    }
    if let Some(v) = cli.settle_speed {
        settings.settle_speed = v;
    }
    if let Some(v) = cli.settle_spin {
        settings.settle_spin = v;
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
