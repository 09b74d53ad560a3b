//! Match Settings
//!
//! Tunable parameters for one match plus the fixed tuning constants of
//! the physics. Settings are immutable for the lifetime of a match and
//! are validated once, at the configuration boundary; the physics stages
//! assume sane values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::hash::{StateHash, StateHasher};

// =============================================================================
// FIXED TUNING
// =============================================================================

/// Gap kept between a body and the arena wall.
pub const WALL_MARGIN: f64 = 4.0;

/// Distance past the arena radius at which a body counts as flown out.
pub const OUT_OF_BOUNDS_MARGIN: f64 = 40.0;

/// Fraction of normal speed kept when bouncing off the wall.
pub const WALL_RESTITUTION: f64 = 0.85;

/// Fraction of normal speed kept when two bodies collide.
pub const BODY_RESTITUTION: f64 = 0.92;

/// Damage per unit of outward normal speed on a wall hit.
pub const WALL_DAMAGE_FACTOR: f64 = 0.02;

/// Damage per unit of closing speed on a body-body hit.
pub const IMPACT_DAMAGE_FACTOR: f64 = 0.06;

/// Angular velocity gained per unit of tangential relative speed.
pub const SPIN_KICK_FACTOR: f64 = 0.02;

/// Health every body spawns with.
pub const STARTING_HEALTH: f64 = 100.0;

/// Max absolute jitter added to the evenly spaced spawn angle (radians).
pub const SPAWN_ANGLE_JITTER: f64 = 0.2;

/// Fixed share of the spawn radius; the rest is drawn at random.
pub const SPAWN_RADIUS_BASE: f64 = 0.85;

/// Random share of the spawn radius.
pub const SPAWN_RADIUS_RANDOM: f64 = 0.15;

/// Launch speed range (units/s).
pub const LAUNCH_SPEED_MIN: f64 = 120.0;
/// Launch speed range (units/s).
pub const LAUNCH_SPEED_MAX: f64 = 200.0;

/// Max absolute deviation of the launch heading from dead center (radians).
pub const LAUNCH_HEADING_JITTER: f64 = 0.35;

/// Max absolute initial angular velocity (rad/s).
pub const LAUNCH_SPIN_MAX: f64 = 8.0;

// =============================================================================
// SETTINGS
// =============================================================================

/// Per-match settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Radius of the circular arena
    pub arena_radius: f64,
    /// Linear damping rate (per second)
    pub friction: f64,
    /// Angular damping rate (per second)
    pub spin_friction: f64,
    /// Scales all collision damage
    pub damage_multiplier: f64,
    /// Radius of every body
    pub body_radius: f64,
    /// Generator seed
    pub seed: u32,
    /// Linear speed under which a body may count as settled
    pub settle_speed: f64,
    /// Angular speed under which a body may count as settled
    pub settle_spin: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_radius: 250.0,
            friction: 0.15,
            spin_friction: 0.2,
            damage_multiplier: 1.0,
            body_radius: 26.0,
            seed: 1337,
            settle_speed: 5.0,
            settle_spin: 0.2,
        }
    }
}

/// Settings that would make the physics produce non-finite values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// Arena radius is not a positive finite number.
    #[error("arena radius must be positive and finite, got {0}")]
    InvalidArenaRadius(f64),

    /// Body radius is not a positive finite number.
    #[error("body radius must be positive and finite, got {0}")]
    InvalidBodyRadius(f64),

    /// Bodies would not fit inside the arena.
    #[error("body radius {body_radius} does not fit an arena of radius {arena_radius}")]
    BodyTooLarge {
        /// Configured body radius.
        body_radius: f64,
        /// Configured arena radius.
        arena_radius: f64,
    },

    /// A damping rate is negative or non-finite.
    #[error("{name} must be a finite value >= 0, got {value}")]
    InvalidFriction {
        /// Which setting.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Damage multiplier is not a positive finite number.
    #[error("damage multiplier must be positive and finite, got {0}")]
    InvalidDamageMultiplier(f64),

    /// A settle threshold is negative or non-finite.
    #[error("{name} must be a finite value >= 0, got {value}")]
    InvalidSettleThreshold {
        /// Which setting.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Simulation step is not a positive finite duration.
    #[error("timestep must be positive and finite, got {0}")]
    InvalidTimestep(f64),
}

impl Settings {
    /// Check that these settings keep the physics finite.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.arena_radius.is_finite() && self.arena_radius > 0.0) {
            return Err(SettingsError::InvalidArenaRadius(self.arena_radius));
        }
        if !(self.body_radius.is_finite() && self.body_radius > 0.0) {
            return Err(SettingsError::InvalidBodyRadius(self.body_radius));
        }
        if self.body_radius + WALL_MARGIN >= self.arena_radius {
            return Err(SettingsError::BodyTooLarge {
                body_radius: self.body_radius,
                arena_radius: self.arena_radius,
            });
        }
        for (name, value) in [("friction", self.friction), ("spin friction", self.spin_friction)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::InvalidFriction { name, value });
            }
        }
        if !(self.damage_multiplier.is_finite() && self.damage_multiplier > 0.0) {
            return Err(SettingsError::InvalidDamageMultiplier(self.damage_multiplier));
        }
        for (name, value) in [("settle speed", self.settle_speed), ("settle spin", self.settle_spin)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::InvalidSettleThreshold { name, value });
            }
        }
        Ok(())
    }

    /// Furthest a body center may sit from the arena center before the
    /// wall pushes it back.
    #[inline]
    pub fn wall_limit(&self) -> f64 {
        self.arena_radius - self.body_radius - WALL_MARGIN
    }

    /// Distance from center past which a body has flown out.
    #[inline]
    pub fn out_of_bounds_radius(&self) -> f64 {
        self.arena_radius + OUT_OF_BOUNDS_MARGIN
    }

    /// Hash of every field, used to pin transcripts to their rules.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_settings();
        hasher.update_f64(self.arena_radius);
        hasher.update_f64(self.friction);
        hasher.update_f64(self.spin_friction);
        hasher.update_f64(self.damage_multiplier);
        hasher.update_f64(self.body_radius);
        hasher.update_u32(self.seed);
        hasher.update_f64(self.settle_speed);
        hasher.update_f64(self.settle_spin);
        hasher.finalize()
    }
}

/// Check a simulation step duration (seconds).
pub fn validate_timestep(dt: f64) -> Result<(), SettingsError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::InvalidTimestep(dt))
    }
}
