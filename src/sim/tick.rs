//! The per-tick pipeline
//!
//! Fixed order: player input and AI write intents, motion integrates them,
//! housekeeping settles firing, ranges, lifetimes and deaths, collision
//! detects and resolves, route progress updates, and compaction removes
//! everything flagged doomed. Every run of [`tick`] with the same state and
//! input produces the same state.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

use super::ai;
use super::collision;
use super::entity::{Entity, EntityKind, Team};
use super::motion;
use super::registry::EntityId;
use super::state::{GameEvent, GameState};
use crate::angle_delta;
use crate::config::{Cue, ExplosionSpec, ShotPattern, WeaponKind};
use crate::consts::*;

/// Player intent for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// -1 reverse, 0 hold, 1 forward
    pub move_axis: i8,
    /// -1 counterclockwise, 0 hold, 1 clockwise
    pub turn_axis: i8,
    pub fire: bool,
}

/// Advance the whole simulation by `dt`
pub fn tick(state: &mut GameState, input: TickInput, dt: f32) {
    state.events.clear();
    state.time += dt;
    state.ticks += 1;
    let now = state.time;

    apply_player_input(state, input);
    ai::think_pass(&mut state.registry, state.player, now);
    motion::integrate(&mut state.registry, state.map.cell_size, now, dt);
    housekeeping(state, now, dt);
    collision::run(&mut state.registry, &mut state.events, now, dt);

    if let Some(player) = state.registry.get(state.player).cloned() {
        state.map.update(now, &player);
    }

    let removed = state.registry.compact();
    if removed > 0 {
        log::trace!("tick {}: compacted {removed} entities", state.ticks);
    }

    if !state.completed && state.map.is_complete(&state.registry) {
        state.completed = true;
        state.events.push(GameEvent::LevelComplete);
        log::info!("level {} complete after {} ticks", state.level, state.ticks);
    }
}

fn apply_player_input(state: &mut GameState, input: TickInput) {
    let Some(p) = state.registry.get_mut(state.player) else { return };
    if p.dead {
        return;
    }
    p.set_move(input.move_axis.clamp(-1, 1) as f32);
    p.set_rotate(input.turn_axis.clamp(-1, 1) as f32);
    if let Some(unit) = p.unit_state_mut() {
        unit.firing = input.fire;
    }
}

/// Everything between motion and collision: weapon triggers, bullet ranges,
/// explosion and popup lifetimes, flash expiry, and death transitions.
fn housekeeping(state: &mut GameState, now: f32, dt: f32) {
    let mut shots: Vec<(Vec2, f32, Team, WeaponKind)> = Vec::new();
    let mut blasts: Vec<(Vec2, Team, ExplosionSpec)> = Vec::new();
    let mut deaths: Vec<(EntityId, Vec2, Team, f32)> = Vec::new();

    for id in state.registry.ids() {
        let Some(e) = state.registry.get_mut(id) else { continue };

        if e.flash.map(|f| f.elapsed(now)).unwrap_or(false) {
            e.flash = None;
        }
        if e.dead {
            e.set_move(0.0);
            e.set_rotate(0.0);
            if let Some(unit) = e.unit_state_mut() {
                unit.firing = false;
            }
        }

        let pos = e.pos;
        let angle = e.angle;
        let team = e.team;
        let muzzle = e.center.y;
        let dead = e.dead;
        let speed = e.move_speed.current;
        let mut doomed = false;

        match &mut e.kind {
            EntityKind::Unit(unit) => {
                if !dead && unit.firing && unit.fire_timer.elapsed(now) {
                    unit.fire_timer.set(now, unit.weapon.stats().fire_rate);
                    unit.firing = false;
                    shots.push((pos + angle_delta(angle, muzzle), angle, team, unit.weapon));
                }
            }
            EntityKind::Bullet(bullet) => {
                bullet.range_left -= speed.abs() * dt;
                if bullet.range_left <= 0.0 {
                    doomed = true;
                    if let Some(spec) = bullet.weapon.stats().explosion {
                        blasts.push((pos, team, spec));
                    }
                } else if pos.x.abs() > WORLD_BOUNDS || pos.y.abs() > WORLD_BOUNDS {
                    doomed = true;
                }
            }
            EntityKind::Explosion(ex) => {
                if ex.expires.map(|t| t.elapsed(now)).unwrap_or(false) {
                    doomed = true;
                }
            }
            EntityKind::FloatingText(text) => {
                if text.ttl.elapsed(now) {
                    doomed = true;
                }
            }
            EntityKind::Wall => {}
        }
        if doomed {
            e.doomed = true;
        }

        // One-way transition: a unit dies exactly once and never comes back
        if e.can_die && e.hp <= 0 && !e.dead {
            e.dead = true;
            e.team = Team::Neutral;
            e.set_move(0.0);
            e.set_rotate(0.0);
            if let Some(unit) = e.unit_state_mut() {
                unit.firing = false;
            }
            deaths.push((id, pos, team, e.size.max_element() * 2.0));
        }
    }

    for (muzzle_pos, angle, team, weapon) in shots {
        fire(state, muzzle_pos, angle, team, weapon);
    }
    for (pos, team, spec) in blasts {
        collision::spawn_explosion(&mut state.registry, &mut state.events, pos, team, &spec, now);
    }
    for (id, pos, team, blast_size) in deaths {
        let spec = ExplosionSpec {
            size: blast_size,
            damage: 0,
            push_back: 20.0,
            duration: Some(2.0),
            sound: Some(Cue::Death),
        };
        collision::spawn_explosion(
            &mut state.registry,
            &mut state.events,
            pos,
            Team::Neutral,
            &spec,
            now,
        );
        state.events.push(GameEvent::UnitDied { id, team });
        log::debug!("unit {id:?} ({team:?}) died at {pos}");
    }
}

/// Spawn the weapon's bullet pattern and its firing cue
fn fire(state: &mut GameState, muzzle: Vec2, angle: f32, team: Team, weapon: WeaponKind) {
    let stats = weapon.stats();
    state.events.push(GameEvent::Sound(stats.sound.unwrap_or(Cue::Shoot)));
    match stats.pattern {
        ShotPattern::Single => {
            state.registry.spawn(Entity::bullet(muzzle, angle, team, weapon));
        }
        ShotPattern::Double => {
            for side in [-1.0, 1.0] {
                let offset = angle_delta(angle + FRAC_PI_2, stats.size * side);
                state.registry.spawn(Entity::bullet(muzzle + offset, angle, team, weapon));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeaponKind;
    use crate::sim::entity::EntityKind;

    fn arena() -> GameState {
        GameState::new(7, 1).unwrap()
    }

    fn bullets_of(state: &GameState, team: Team) -> usize {
        state
            .registry
            .iter()
            .filter(|(_, e)| e.team == team && matches!(e.kind, EntityKind::Bullet(_)))
            .count()
    }

    #[test]
    fn test_player_fire_is_rate_limited() {
        let mut state = arena();
        let input = TickInput { fire: true, ..Default::default() };

        tick(&mut state, input, SIM_DT);
        assert_eq!(bullets_of(&state, Team::Friendly), 1);
        assert!(state.events.contains(&GameEvent::Sound(Cue::Shoot)));

        // Held trigger: the fire-rate timer blocks an immediate second shot
        tick(&mut state, input, SIM_DT);
        assert_eq!(bullets_of(&state, Team::Friendly), 1);

        // Past the weapon's fire rate exactly one more shot goes out
        let fire_rate = WeaponKind::BasicGun.stats().fire_rate;
        let mut shots = 0;
        for _ in 0..(fire_rate / SIM_DT) as usize + 2 {
            tick(&mut state, input, SIM_DT);
            shots += state
                .events
                .iter()
                .filter(|e| **e == GameEvent::Sound(Cue::Shoot))
                .count();
        }
        assert_eq!(shots, 1);
    }

    #[test]
    fn test_bullet_dies_at_range_with_explosion() {
        let mut state = arena();
        // A quiet corner inside the border ring, far from any unit
        let start = Vec2::new(-5000.0, -5000.0);
        let bid = state
            .registry
            .spawn(Entity::bullet(start, 0.0, Team::Friendly, WeaponKind::BasicGun));

        let stats = WeaponKind::BasicGun.stats();
        let flight_ticks = (stats.range / stats.speed / SIM_DT) as usize + 2;
        let mut died_at_tick = None;
        for i in 0..flight_ticks + 60 {
            tick(&mut state, TickInput::default(), SIM_DT);
            if state.registry.get(bid).is_none() {
                died_at_tick = Some(i);
                break;
            }
        }

        let died_at = died_at_tick.expect("bullet should expire");
        assert!(died_at <= flight_ticks, "expired late: tick {died_at}");

        // The weapon's explosion profile appears where the bullet ended
        let explosion = state
            .registry
            .iter()
            .find(|(_, e)| matches!(e.kind, EntityKind::Explosion(_)) && e.pos.y == start.y);
        assert!(explosion.is_some());
    }

    #[test]
    fn test_death_is_one_way_and_announced() {
        let mut state = arena();
        state.registry.get_mut(state.player).unwrap().hp = 0;

        tick(&mut state, TickInput::default(), SIM_DT);
        let died = state
            .events
            .iter()
            .any(|ev| matches!(ev, GameEvent::UnitDied { team: Team::Friendly, .. }));
        assert!(died);
        assert!(state.events.contains(&GameEvent::Sound(Cue::Death)));

        let p = state.player().unwrap();
        assert!(p.dead);
        assert_eq!(p.team, Team::Neutral);
        assert_eq!(p.move_speed.direction, 0.0);

        // Input is ignored and the death is not re-announced
        tick(&mut state, TickInput { move_axis: 1, fire: true, ..Default::default() }, SIM_DT);
        let p = state.player().unwrap();
        assert!(p.dead);
        assert_eq!(p.move_speed.direction, 0.0);
        assert!(!state.events.iter().any(|ev| matches!(ev, GameEvent::UnitDied { .. })));
        assert_eq!(bullets_of(&state, Team::Neutral), 0);
    }

    #[test]
    fn test_level_completes_once_when_all_enemies_die() {
        let mut state = arena();
        for id in state.map.enemies.clone() {
            state.registry.get_mut(id).unwrap().hp = 0;
        }

        tick(&mut state, TickInput::default(), SIM_DT);
        assert!(state.completed);
        assert_eq!(
            state.events.iter().filter(|e| **e == GameEvent::LevelComplete).count(),
            1
        );

        tick(&mut state, TickInput::default(), SIM_DT);
        assert!(!state.events.contains(&GameEvent::LevelComplete));
    }

    #[test]
    fn test_explosion_lifetimes() {
        let mut state = arena();
        let quiet = Vec2::new(-5000.0, -5000.0);
        let finite = WeaponKind::BasicGun.stats().explosion.unwrap();
        let lasting = WeaponKind::PlasmaGun.stats().explosion.unwrap();
        let finite_id = collision::spawn_explosion(
            &mut state.registry,
            &mut state.events,
            quiet,
            Team::Enemy,
            &finite,
            state.time,
        );
        let lasting_id = collision::spawn_explosion(
            &mut state.registry,
            &mut state.events,
            quiet + Vec2::new(500.0, 0.0),
            Team::Enemy,
            &lasting,
            state.time,
        );

        let ticks = (finite.duration.unwrap() / SIM_DT) as usize + 2;
        for _ in 0..ticks {
            tick(&mut state, TickInput::default(), SIM_DT);
        }
        assert!(state.registry.get(finite_id).is_none());
        assert!(state.registry.get(lasting_id).is_some());
    }

    #[test]
    fn test_same_seed_and_inputs_are_deterministic() {
        let script = |t: u64| TickInput {
            move_axis: if t % 40 < 20 { 1 } else { 0 },
            turn_axis: if t % 90 < 30 { 1 } else { -1 },
            fire: t % 17 == 0,
        };

        let mut a = GameState::new(99, 2).unwrap();
        let mut b = GameState::new(99, 2).unwrap();
        for t in 0..240 {
            tick(&mut a, script(t), SIM_DT);
            tick(&mut b, script(t), SIM_DT);
        }
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(a, b);
    }
}
