//! Collision detection and resolution
//!
//! Every unordered pair of live, collidable entities is tested for
//! bounding-box overlap each tick. Resolution is a pure function of the pair,
//! run symmetrically for (a, b) and (b, a); it emits effects that are applied
//! only after the whole sweep, so the detection pass never observes a
//! half-resolved tick.

use glam::Vec2;

use super::entity::{Entity, EntityKind, Knockback, Timer};
use super::registry::{EntityId, Registry};
use super::state::GameEvent;
use crate::config::{Cue, ExplosionSpec};
use crate::consts::*;
use crate::{angle_delta, bearing};

/// Axis-aligned bounding box. Boxes are anchored at `pos - center` and never
/// rotate with the entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn of(e: &Entity) -> Self {
        let min = e.pos - e.center;
        Self {
            left: min.x,
            top: min.y,
            right: min.x + e.size.x,
            bottom: min.y + e.size.y,
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let min = center - size * 0.5;
        Self {
            left: min.x,
            top: min.y,
            right: min.x + size.x,
            bottom: min.y + size.y,
        }
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Outcome of resolving one ordered pair member
#[derive(Debug, Clone, PartialEq)]
enum Effect {
    /// Positional correction (wall pushout)
    Nudge { id: EntityId, delta: Vec2 },
    /// Explosion splash damage, gated by the damage-delay window
    Damage { id: EntityId, amount: i32 },
    Knockback { id: EntityId, angle: f32, magnitude: f32 },
    ResetDamageGate { id: EntityId },
    /// Single-hit bullet impact; applied at most once per bullet
    BulletHit { bullet: EntityId, target: EntityId },
}

/// Run detection and resolution over all live pairs
pub fn run(registry: &mut Registry, events: &mut Vec<GameEvent>, now: f32, dt: f32) {
    let ids = registry.ids();
    let mut effects = Vec::new();

    for i in 0..ids.len() {
        let Some(a) = registry.get(ids[i]) else { continue };
        if !a.team.collides() {
            continue;
        }
        let a_bounds = Bounds::of(a);
        for &jb in &ids[i + 1..] {
            let Some(b) = registry.get(jb) else { continue };
            if !b.team.collides() {
                continue;
            }
            if a_bounds.overlaps(&Bounds::of(b)) {
                resolve(ids[i], a, jb, b, now, dt, &mut effects);
                resolve(jb, b, ids[i], a, now, dt, &mut effects);
            }
        }
    }

    apply(registry, events, effects, now);
}

/// How `me` reacts to overlapping `other`. Pure; mutation happens in `apply`.
fn resolve(
    me_id: EntityId,
    me: &Entity,
    other_id: EntityId,
    other: &Entity,
    now: f32,
    dt: f32,
    out: &mut Vec<Effect>,
) {
    match &me.kind {
        EntityKind::Wall => {
            // Walls never interact with each other, and bullets pass through
            if other.is_wall() || matches!(other.kind, EntityKind::Bullet(_)) {
                return;
            }
            if !other.solid {
                return;
            }
            let delta = wall_pushout(me, other, now, dt);
            if delta != Vec2::ZERO {
                out.push(Effect::Nudge { id: other_id, delta });
            }
        }
        EntityKind::Bullet(_) => {
            if other.is_wall() || !other.can_die {
                return;
            }
            out.push(Effect::BulletHit { bullet: me_id, target: other_id });
        }
        EntityKind::Explosion(ex) => {
            if other.is_wall() || !other.can_die {
                return;
            }
            // Knockback every overlapping tick; damage only once per window
            out.push(Effect::Knockback {
                id: other_id,
                angle: bearing(me.pos, other.pos),
                magnitude: ex.push_back,
            });
            let gate_open = ex.damage_gate.map(|g| g.elapsed(now)).unwrap_or(true);
            if ex.damage != 0 && gate_open {
                out.push(Effect::Damage { id: other_id, amount: ex.damage });
                out.push(Effect::ResetDamageGate { id: me_id });
            }
        }
        // Units and floating text have no reaction of their own
        EntityKind::Unit(_) | EntityKind::FloatingText(_) => {}
    }
}

/// Axis-separated pushout of a movable out of a wall.
///
/// The penetration test uses the movable's displacement this tick - normal
/// motion plus any pending knockback - and corrects each axis independently,
/// with a fixed bias past the contact point so the next tick starts clear.
fn wall_pushout(wall: &Entity, other: &Entity, now: f32, dt: f32) -> Vec2 {
    let mut delta = angle_delta(other.angle, other.move_speed.current * dt);
    if let Some(kb) = other.knockback {
        delta += kb.displacement(now, dt);
    }
    if delta == Vec2::ZERO {
        return Vec2::ZERO;
    }

    let wb = Bounds::of(wall);
    let ob = Bounds::of(other);
    let mut fix = Vec2::ZERO;

    if wb.top < ob.bottom && delta.y > 0.0 && (wb.top - ob.bottom).abs() <= other.center.y {
        fix.y = -(delta.y + WALL_PUSH_BIAS);
    } else if wb.bottom > ob.top && delta.y < 0.0 && (wb.bottom - ob.top).abs() <= other.center.y {
        fix.y = -(delta.y - WALL_PUSH_BIAS);
    }
    if wb.left < ob.right && delta.x > 0.0 && (wb.left - ob.right).abs() <= other.center.x {
        fix.x = -(delta.x + WALL_PUSH_BIAS);
    } else if wb.right > ob.left && delta.x < 0.0 && (wb.right - ob.left).abs() <= other.center.x {
        fix.x = -(delta.x - WALL_PUSH_BIAS);
    }

    fix
}

fn apply(registry: &mut Registry, events: &mut Vec<GameEvent>, effects: Vec<Effect>, now: f32) {
    for effect in effects {
        match effect {
            Effect::Nudge { id, delta } => {
                if let Some(e) = registry.get_mut(id) {
                    e.pos += delta;
                }
            }
            Effect::Damage { id, amount } => {
                damage(registry, id, amount, now);
            }
            Effect::Knockback { id, angle, magnitude } => {
                if let Some(e) = registry.get_mut(id) {
                    e.knockback = Some(Knockback::new(now, angle, magnitude));
                }
            }
            Effect::ResetDamageGate { id } => {
                if let Some(e) = registry.get_mut(id) {
                    if let EntityKind::Explosion(ex) = &mut e.kind {
                        ex.damage_gate = Some(Timer::new(now, EXPLOSION_DAMAGE_DELAY));
                    }
                }
            }
            Effect::BulletHit { bullet, target } => {
                // First hit wins; the bullet is gone for the rest of the sweep
                let Some(b) = registry.get_mut(bullet) else { continue };
                if b.doomed {
                    continue;
                }
                b.doomed = true;
                let (weapon, pos, team) = match &b.kind {
                    EntityKind::Bullet(bs) => (bs.weapon, b.pos, b.team),
                    _ => continue,
                };
                let stats = weapon.stats();
                damage(registry, target, stats.damage, now);
                if let Some(t) = registry.get_mut(target) {
                    t.flash = Some(Timer::new(now, FLASH_DURATION));
                }
                if let Some(spec) = stats.explosion {
                    spawn_explosion(registry, events, pos, team, &spec, now);
                }
            }
        }
    }
}

/// Apply damage, spawning a cosmetic popup on units
fn damage(registry: &mut Registry, id: EntityId, amount: i32, now: f32) {
    let Some(e) = registry.get_mut(id) else { return };
    e.hp -= amount;
    if amount > 0 && matches!(e.kind, EntityKind::Unit(_)) {
        let pos = e.pos;
        registry.spawn(Entity::floating_text(pos, format!("-{amount}"), now));
    }
}

/// Register an explosion and emit its audio cue
pub fn spawn_explosion(
    registry: &mut Registry,
    events: &mut Vec<GameEvent>,
    pos: Vec2,
    team: super::entity::Team,
    spec: &ExplosionSpec,
    now: f32,
) -> EntityId {
    let id = registry.spawn(Entity::explosion(pos, team, spec, now));
    events.push(GameEvent::Sound(spec.sound.unwrap_or(Cue::Boom)));
    id
}
