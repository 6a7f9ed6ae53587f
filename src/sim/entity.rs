//! Simulation entities
//!
//! One kind-tagged record replaces the usual deep inheritance chain: common
//! fields live on `Entity`, kind-specific state hangs off `EntityKind`, and
//! behavior is dispatched on the tag.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::{self, Color, ConfigError, WeaponKind};
use crate::consts::*;
use crate::{angle_delta, wrap_angle};

/// Coarse collision/damage grouping. Neutral entities are excluded from
/// pairwise collision testing entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Neutral,
    Friendly,
    Enemy,
    Environment,
}

impl Team {
    #[inline]
    pub fn collides(self) -> bool {
        self != Team::Neutral
    }
}

/// Velocity ramp: `current` chases `direction * max` by `accel` while an
/// intent is held, and falls back to zero by `decel` once it is released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub current: f32,
    /// Intent: -1, 0 or 1
    pub direction: f32,
    pub max: f32,
    pub accel: f32,
    pub decel: f32,
}

impl Speed {
    pub fn new(max: f32, accel: f32, decel: f32) -> Self {
        Self { current: 0.0, direction: 0.0, max, accel, decel }
    }

    pub fn from_spec(spec: &config::SpeedSpec) -> Self {
        Self::new(spec.max, spec.accel, spec.decel)
    }

    /// A ramp pinned at full speed (bullets)
    pub fn constant(value: f32) -> Self {
        Self { current: value, direction: 1.0, max: value, accel: 0.0, decel: 0.0 }
    }

    /// Set the movement intent
    pub fn set_direction(&mut self, direction: f32) {
        self.direction = direction.clamp(-1.0, 1.0);
    }

    /// Advance the ramp by one tick
    pub fn update(&mut self, dt: f32) {
        if self.direction != 0.0 {
            self.current += self.direction * self.accel * dt;
            self.current = self.current.clamp(-self.max, self.max);
        } else if self.current != 0.0 {
            let drop = self.decel * dt;
            if self.current.abs() <= drop {
                self.current = 0.0;
            } else {
                self.current -= self.current.signum() * drop;
            }
        }
    }
}

/// Cooperative countdown compared against the driver-supplied clock.
/// Only advances when the tick advances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    start: f32,
    duration: f32,
}

impl Timer {
    pub fn new(now: f32, duration: f32) -> Self {
        Self { start: now, duration }
    }

    pub fn set(&mut self, now: f32, duration: f32) {
        self.start = now;
        self.duration = duration;
    }

    pub fn elapsed(&self, now: f32) -> bool {
        now - self.start >= self.duration
    }

    /// Fraction of the duration consumed, clamped to [0, 1]
    pub fn percent(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0)
    }

    /// Fraction of the duration remaining, clamped to [0, 1]
    pub fn remaining(&self, now: f32) -> f32 {
        1.0 - self.percent(now)
    }
}

/// Temporary displacement applied on top of normal motion, decaying to zero
/// over [`KNOCKBACK_DURATION`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub angle: f32,
    /// Total push distance; the per-tick displacement integrates to roughly
    /// this over the decay window.
    pub magnitude: f32,
    pub decay: Timer,
}

impl Knockback {
    pub fn new(now: f32, angle: f32, magnitude: f32) -> Self {
        Self { angle, magnitude, decay: Timer::new(now, KNOCKBACK_DURATION) }
    }

    /// Displacement contributed this tick
    pub fn displacement(&self, now: f32, dt: f32) -> Vec2 {
        let strength = self.magnitude * self.decay.remaining(now) * 2.0 / KNOCKBACK_DURATION;
        angle_delta(self.angle, strength * dt)
    }
}

/// Two-state behavior machine for autonomous units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    Patrol,
    Attack,
}

/// AI fragment attached to autonomous units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiState {
    pub behavior: Behavior,
    pub default_behavior: Behavior,
    pub think: Timer,
    /// Fixed cyclic waypoint list
    pub patrol_points: Vec<Vec2>,
    pub waypoint: usize,
}

impl AiState {
    pub fn patrolling(patrol_points: Vec<Vec2>, now: f32) -> Self {
        Self {
            behavior: Behavior::Patrol,
            default_behavior: Behavior::Patrol,
            think: Timer::new(now, THINK_RATE),
            patrol_points,
            waypoint: 0,
        }
    }
}

/// Weapon-carrier fragment shared by player and enemy units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitState {
    pub weapon: WeaponKind,
    pub fire_timer: Timer,
    /// Firing intent; consumed by the fire-rate timer each tick
    pub firing: bool,
    pub ai: Option<AiState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletState {
    pub weapon: WeaponKind,
    /// Remaining travel distance; the bullet deletes itself at zero
    pub range_left: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionState {
    pub damage: i32,
    pub push_back: f32,
    /// None = persists until otherwise removed
    pub expires: Option<Timer>,
    /// Damage re-trigger gate; absent until the first hit
    pub damage_gate: Option<Timer>,
    pub sound: Option<config::Cue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextState {
    pub text: String,
    pub ttl: Timer,
}

/// Kind tag plus kind-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Wall,
    Unit(UnitState),
    Bullet(BulletState),
    Explosion(ExplosionState),
    FloatingText(TextState),
}

/// A live simulation entity. Owned exclusively by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Vec2,
    /// Grid cell, recomputed from `pos` each tick
    pub grid_pos: IVec2,
    pub size: Vec2,
    /// Anchor for rotation and bounds
    pub center: Vec2,
    /// Facing, always in [0, 2π)
    pub angle: f32,
    pub color: Color,
    pub move_speed: Speed,
    pub rotate_speed: Speed,
    pub solid: bool,
    pub team: Team,
    pub hp: i32,
    pub max_hp: i32,
    pub can_die: bool,
    pub dead: bool,
    /// Removed at the next compaction
    pub doomed: bool,
    pub knockback: Option<Knockback>,
    /// Brief visual flash after taking a hit
    pub flash: Option<Timer>,
    pub kind: EntityKind,
}

impl Entity {
    fn base(pos: Vec2, size: Vec2, color: Color, team: Team, kind: EntityKind) -> Self {
        Self {
            pos,
            grid_pos: IVec2::ZERO,
            size,
            center: size * 0.5,
            angle: 0.0,
            color,
            move_speed: Speed::new(0.0, 0.0, 0.0),
            rotate_speed: Speed::new(0.0, 0.0, 0.0),
            solid: false,
            team,
            hp: 1,
            max_hp: 1,
            can_die: false,
            dead: false,
            doomed: false,
            knockback: None,
            flash: None,
            kind,
        }
    }

    /// Immovable pushout obstacle
    pub fn wall(pos: Vec2, size: Vec2) -> Self {
        let mut e = Self::base(pos, size, config::DARK_BLUE, Team::Environment, EntityKind::Wall);
        e.solid = true;
        e
    }

    /// A unit built from the named stat table entry
    pub fn unit(
        pos: Vec2,
        angle: f32,
        team: Team,
        unit_name: &str,
        now: f32,
    ) -> Result<Self, ConfigError> {
        let stats = config::unit(unit_name)?;
        let weapon = WeaponKind::from_name(stats.weapon)?;
        let mut e = Self::base(
            pos,
            stats.size,
            stats.color,
            team,
            // Zero-length timer: the first shot is never rate-limited
            EntityKind::Unit(UnitState {
                weapon,
                fire_timer: Timer::new(now, 0.0),
                firing: false,
                ai: None,
            }),
        );
        e.angle = wrap_angle(angle);
        e.move_speed = Speed::from_spec(&stats.speed);
        e.rotate_speed = Speed::from_spec(&stats.rotate);
        e.solid = true;
        e.hp = stats.hp;
        e.max_hp = stats.hp;
        e.can_die = true;
        Ok(e)
    }

    /// An enemy unit patrolling between its spawn point and `patrol_to`
    pub fn enemy(pos: Vec2, patrol_to: Vec2, now: f32) -> Result<Self, ConfigError> {
        let mut e = Self::unit(pos, 1.0, Team::Enemy, "ENEMY_TANK", now)?;
        if let EntityKind::Unit(unit) = &mut e.kind {
            unit.ai = Some(AiState::patrolling(vec![pos, patrol_to], now));
        }
        Ok(e)
    }

    /// A projectile fired along `angle`
    pub fn bullet(pos: Vec2, angle: f32, team: Team, weapon: WeaponKind) -> Self {
        let stats = weapon.stats();
        let size = Vec2::splat(stats.size);
        let mut e = Self::base(
            pos,
            size,
            stats.color,
            team,
            EntityKind::Bullet(BulletState {
                weapon,
                range_left: if stats.range > 0.0 { stats.range } else { DEFAULT_BULLET_RANGE },
            }),
        );
        e.angle = wrap_angle(angle);
        e.move_speed = Speed::constant(stats.speed);
        e
    }

    /// Area effect built from an explosion profile
    pub fn explosion(pos: Vec2, team: Team, spec: &config::ExplosionSpec, now: f32) -> Self {
        let mut e = Self::base(
            pos,
            Vec2::splat(spec.size),
            config::RED,
            team,
            EntityKind::Explosion(ExplosionState {
                damage: spec.damage,
                push_back: spec.push_back,
                expires: spec.duration.map(|d| Timer::new(now, d)),
                damage_gate: None,
                sound: spec.sound,
            }),
        );
        e.hp = i32::MAX;
        e
    }

    /// Cosmetic damage popup; never collides
    pub fn floating_text(pos: Vec2, text: String, now: f32) -> Self {
        Self::base(
            pos,
            Vec2::splat(20.0),
            config::WHITE,
            Team::Neutral,
            EntityKind::FloatingText(TextState {
                text,
                ttl: Timer::new(now, FLOATING_TEXT_TTL),
            }),
        )
    }

    /// Set the linear movement intent
    pub fn set_move(&mut self, direction: f32) {
        self.move_speed.set_direction(direction);
    }

    /// Set the rotation intent
    pub fn set_rotate(&mut self, direction: f32) {
        self.rotate_speed.set_direction(direction);
    }

    pub fn unit_state(&self) -> Option<&UnitState> {
        match &self.kind {
            EntityKind::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn unit_state_mut(&mut self) -> Option<&mut UnitState> {
        match &mut self.kind {
            EntityKind::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_wall(&self) -> bool {
        matches!(self.kind, EntityKind::Wall)
    }
}
