//! Whole-simulation state
//!
//! Everything the simulation knows lives here, and all of it serializes: a
//! snapshot taken mid-game restores to a state that continues identically
//! under the same inputs. Per-tick events are the one exception; they are
//! drained by the driver and never persisted.

use serde::{Deserialize, Serialize};

use super::GameError;
use super::entity::{Entity, Team};
use super::mapgen::LevelMap;
use super::registry::{EntityId, Registry};
use crate::config::Cue;

/// Observable side effects of a tick, drained by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(Cue),
    UnitDied { id: EntityId, team: Team },
    LevelComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub level: u32,
    /// Simulation clock, advanced only by ticks
    pub time: f32,
    pub ticks: u64,
    pub registry: Registry,
    pub map: LevelMap,
    pub player: EntityId,
    /// Events raised by the current tick; cleared when the next tick starts
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Latched once the last enemy dies
    pub completed: bool,
}

impl GameState {
    /// Build a fresh level. The same seed and level always produce the same
    /// state.
    pub fn new(seed: u64, level: u32) -> Result<Self, GameError> {
        let mut registry = Registry::new();
        let map = LevelMap::generate(level, seed, &mut registry)?;
        let player_spawn = map.center();
        let player = registry.spawn(Entity::unit(player_spawn, 0.0, Team::Friendly, "PLAYER", 0.0)?);

        log::info!("game start: seed {seed}, level {level}, player at {player_spawn}");

        Ok(Self {
            seed,
            level,
            time: 0.0,
            ticks: 0,
            registry,
            map,
            player,
            events: Vec::new(),
            completed: false,
        })
    }

    pub fn player(&self) -> Option<&Entity> {
        self.registry.get(self.player)
    }

    pub fn player_alive(&self) -> bool {
        self.player().map(|p| !p.dead).unwrap_or(false)
    }

    /// Serialize the full state for a save slot
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_spawns_player_at_arena_center() {
        let state = GameState::new(11, 1).unwrap();
        let player = state.player().unwrap();
        assert_eq!(player.pos, state.map.center());
        assert_eq!(player.team, Team::Friendly);
        assert!(state.player_alive());
        assert!(!state.completed);
    }

    #[test]
    fn test_invalid_level_propagates() {
        assert!(matches!(GameState::new(11, 0), Err(GameError::InvalidLevel(0))));
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_state() {
        let state = GameState::new(77, 2).unwrap();
        let json = state.to_json().unwrap();
        let restored = GameState::from_json(&json).unwrap();
        assert_eq!(state, restored);
    }
}
