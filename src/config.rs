//! Read-only unit and weapon stat tables
//!
//! Process-wide configuration, looked up by name at entity construction time.
//! An unknown name is a fatal configuration error - construction never yields a
//! partially initialized entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Packed RGB color, PICO-8 palette
pub type Color = u32;

pub const BLACK: Color = 0x000000;
pub const DARK_BLUE: Color = 0x1D2B53;
pub const MAROON: Color = 0x7E2553;
pub const DARK_GREEN: Color = 0x008751;
pub const BROWN: Color = 0xAB5236;
pub const DARK_GRAY: Color = 0x5F574F;
pub const GRAY: Color = 0xC2C3C7;
pub const WHITE: Color = 0xFFF1E8;
pub const RED: Color = 0xFF004D;
pub const ORANGE: Color = 0xFFA300;
pub const YELLOW: Color = 0xFFEC27;
pub const GREEN: Color = 0x00E436;
pub const BLUE: Color = 0x29ADFF;
pub const PURPLE: Color = 0x83769C;
pub const PINK: Color = 0xFF77A8;
pub const SKIN: Color = 0xFFCCAA;

/// Configuration lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown unit name: {0:?}")]
    UnknownUnit(String),
    #[error("unknown weapon name: {0:?}")]
    UnknownWeapon(String),
}

/// Named audio cue, fired as a side effect of spawns/deaths.
/// Fire-and-forget; the audio collaborator owns playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    Shoot,
    Boom,
    PowerUp,
    Death,
    Plasma,
    PlasmaHit,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Cue::Shoot => "shoot",
            Cue::Boom => "boom",
            Cue::PowerUp => "powerUp",
            Cue::Death => "death",
            Cue::Plasma => "plasma",
            Cue::PlasmaHit => "plasmaHit",
        }
    }
}

/// Multi-shot firing patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotPattern {
    Single,
    Double,
}

/// Explosion profile attached to a weapon (or a unit death)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionSpec {
    pub size: f32,
    pub damage: i32,
    pub push_back: f32,
    /// None = the explosion persists until removed some other way
    pub duration: Option<f32>,
    pub sound: Option<Cue>,
}

/// Per-weapon stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    pub size: f32,
    pub speed: f32,
    pub range: f32,
    pub damage: i32,
    /// Seconds between shots
    pub fire_rate: f32,
    pub color: Color,
    pub pattern: ShotPattern,
    pub sound: Option<Cue>,
    pub explosion: Option<ExplosionSpec>,
}

/// Speed ramp parameters: max speed, acceleration, deceleration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSpec {
    pub max: f32,
    pub accel: f32,
    pub decel: f32,
}

/// Per-unit-type stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub color: Color,
    pub size: Vec2,
    pub speed: SpeedSpec,
    pub rotate: SpeedSpec,
    pub weapon: &'static str,
    pub hp: i32,
}

pub const BASIC_GUN: WeaponStats = WeaponStats {
    size: 10.0,
    speed: 500.0,
    range: 300.0,
    damage: 1,
    fire_rate: 1.0,
    color: RED,
    pattern: ShotPattern::Single,
    sound: None,
    explosion: Some(ExplosionSpec {
        size: 40.0,
        damage: 1,
        push_back: 100.0,
        duration: Some(0.3),
        sound: None,
    }),
};

pub const PLASMA_GUN: WeaponStats = WeaponStats {
    size: 5.0,
    speed: 900.0,
    range: 400.0,
    damage: 0,
    fire_rate: 0.2,
    color: YELLOW,
    pattern: ShotPattern::Double,
    sound: Some(Cue::Plasma),
    explosion: Some(ExplosionSpec {
        size: 5.0,
        damage: 0,
        push_back: 10.0,
        duration: None,
        sound: Some(Cue::PlasmaHit),
    }),
};

pub const ENEMY_GUN: WeaponStats = WeaponStats {
    size: 10.0,
    speed: 500.0,
    range: 300.0,
    damage: 0,
    fire_rate: 4.0,
    color: YELLOW,
    pattern: ShotPattern::Single,
    sound: None,
    explosion: Some(ExplosionSpec {
        size: 40.0,
        damage: 1,
        push_back: 40.0,
        duration: Some(0.2),
        sound: None,
    }),
};

pub const PLAYER: UnitStats = UnitStats {
    color: BLUE,
    size: Vec2::new(80.0, 100.0),
    speed: SpeedSpec { max: 300.0, accel: 600.0, decel: 1000.0 },
    rotate: SpeedSpec { max: 3.0, accel: 12.0, decel: 20.0 },
    weapon: "BASIC_GUN",
    hp: 10,
};

pub const ENEMY_TANK: UnitStats = UnitStats {
    color: ORANGE,
    size: Vec2::new(80.0, 100.0),
    speed: SpeedSpec { max: 100.0, accel: 600.0, decel: 1000.0 },
    rotate: SpeedSpec { max: 2.0, accel: 12.0, decel: 20.0 },
    weapon: "ENEMY_GUN",
    hp: 5,
};

/// Look up unit stats by name
pub fn unit(name: &str) -> Result<&'static UnitStats, ConfigError> {
    match name {
        "PLAYER" => Ok(&PLAYER),
        "ENEMY_TANK" => Ok(&ENEMY_TANK),
        _ => Err(ConfigError::UnknownUnit(name.to_string())),
    }
}

/// Resolved weapon reference, validated at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    BasicGun,
    PlasmaGun,
    EnemyGun,
}

impl WeaponKind {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "BASIC_GUN" => Ok(WeaponKind::BasicGun),
            "PLASMA_GUN" => Ok(WeaponKind::PlasmaGun),
            "ENEMY_GUN" => Ok(WeaponKind::EnemyGun),
            _ => Err(ConfigError::UnknownWeapon(name.to_string())),
        }
    }

    pub fn stats(self) -> &'static WeaponStats {
        match self {
            WeaponKind::BasicGun => &BASIC_GUN,
            WeaponKind::PlasmaGun => &PLASMA_GUN,
            WeaponKind::EnemyGun => &ENEMY_GUN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_lookups() {
        assert_eq!(unit("PLAYER").unwrap().hp, 10);
        assert_eq!(unit("ENEMY_TANK").unwrap().weapon, "ENEMY_GUN");
        assert_eq!(WeaponKind::from_name("PLASMA_GUN").unwrap(), WeaponKind::PlasmaGun);
    }

    #[test]
    fn test_unknown_name_is_fatal() {
        assert_eq!(
            unit("MEGA_TANK"),
            Err(ConfigError::UnknownUnit("MEGA_TANK".into()))
        );
        assert!(matches!(
            WeaponKind::from_name("RAILGUN"),
            Err(ConfigError::UnknownWeapon(_))
        ));
    }

    #[test]
    fn test_every_unit_weapon_resolves() {
        for stats in [&PLAYER, &ENEMY_TANK] {
            WeaponKind::from_name(stats.weapon).unwrap();
        }
    }
}
