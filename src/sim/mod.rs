//! Deterministic fixed-timestep simulation
//!
//! The driver owns the clock: it calls [`tick`] with the player's input and a
//! timestep, and everything else - map layout, enemy minds, motion, collision,
//! lifecycle - advances inside. Two states built from the same seed and fed
//! the same inputs stay bit-identical.

use thiserror::Error;

use crate::config::ConfigError;

pub mod ai;
pub mod collision;
pub mod entity;
pub mod mapgen;
pub mod motion;
pub mod registry;
pub mod state;
pub mod tick;

pub use entity::{Behavior, Entity, EntityKind, Knockback, Speed, Team, Timer};
pub use mapgen::LevelMap;
pub use registry::{EntityId, Registry};
pub use state::{GameEvent, GameState};
pub use tick::{TickInput, tick};

/// Simulation construction failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("level must be at least 1, got {0}")]
    InvalidLevel(u32),
    #[error("map generation gave up after {attempts} attempts (path length {path_len})")]
    MapGeneration { attempts: u32, path_len: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
