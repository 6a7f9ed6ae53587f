//! Maze Tanks - a top-down arcade maze shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (map generation, motion, collisions, AI)
//! - `config`: Read-only unit/weapon stat tables and palette
//!
//! Rendering, audio playback and input mapping live outside this crate; the
//! simulation talks to them through `TickInput` and drained `GameEvent`s.

pub mod config;
pub mod sim;

pub use config::{ConfigError, Cue, WeaponKind};
pub use sim::{GameError, GameEvent, GameState, TickInput, tick};

use glam::Vec2;

/// Game tuning constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;

    /// Floor tile size in world units
    pub const TILE_SIZE: f32 = 100.0;

    /// AI re-evaluates its behavior at this cadence (seconds)
    pub const THINK_RATE: f32 = 0.02;
    /// Enemies notice the player within this distance
    pub const PLAYER_DETECT_RANGE: f32 = 700.0;
    /// Enemies hold position and shoot within this distance
    pub const ENEMY_ATTACK_RANGE: f32 = 300.0;
    /// Facing counts as aligned with the bearing inside this many radians
    pub const AIM_TOLERANCE: f32 = 0.5;
    /// A patrol waypoint counts as reached within one tile
    pub const WAYPOINT_RADIUS: f32 = TILE_SIZE;

    /// Extra separation added when pushing a unit out of a wall, to keep it
    /// from re-penetrating on the next tick
    pub const WALL_PUSH_BIAS: f32 = 0.05;
    /// Knockback overlay decay window (seconds)
    pub const KNOCKBACK_DURATION: f32 = 0.25;
    /// Minimum interval between damage applications by one explosion
    pub const EXPLOSION_DAMAGE_DELAY: f32 = 0.25;
    /// Hit flash duration on damaged units (seconds)
    pub const FLASH_DURATION: f32 = 0.05;
    /// Lifetime of damage popup text (seconds)
    pub const FLOATING_TEXT_TTL: f32 = 0.8;

    /// Full map-generation restarts before giving up
    pub const MAX_MAP_ATTEMPTS: u32 = 64;
    /// Largest enemy squad placed in one route cell
    pub const MAX_ENEMIES_PER_CELL: u32 = 4;
    /// How often the player's route progress is re-checked (seconds)
    pub const ROUTE_CHECK_INTERVAL: f32 = 1.0;

    /// Fallback bullet range when the weapon doesn't specify one
    pub const DEFAULT_BULLET_RANGE: f32 = 40.0;
    /// Bullets past this coordinate are culled
    pub const WORLD_BOUNDS: f32 = 5.0e6;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let a = angle % TAU;
    if a < 0.0 { a + TAU } else { a }
}

/// Signed shortest angular difference `to - from`, in [-π, π)
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut d = (to - from) % TAU;
    if d >= PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    d
}

/// Bearing from one point to another, in [0, 2π)
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    wrap_angle((to.y - from.y).atan2(to.x - from.x))
}

/// Displacement of `dist` along `angle`
#[inline]
pub fn angle_delta(angle: f32, dist: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin()) * dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-FRAC_PI_2) - (TAU - FRAC_PI_2)).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(wrap_angle(0.0), 0.0);
    }

    #[test]
    fn test_angle_diff_shortest_path() {
        // Crossing the 0/2π seam should give the short way round
        let d = angle_diff(0.1, TAU - 0.1);
        assert!((d + 0.2).abs() < 1e-5, "got {d}");
        let d = angle_diff(TAU - 0.1, 0.1);
        assert!((d - 0.2).abs() < 1e-5, "got {d}");
        assert!((angle_diff(0.0, PI / 2.0) - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bearing() {
        let b = bearing(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!((b - FRAC_PI_2).abs() < 1e-6);
        let b = bearing(Vec2::ZERO, Vec2::new(-5.0, 0.0));
        assert!((b - PI).abs() < 1e-6);
    }
}
