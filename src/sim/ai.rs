//! Enemy minds
//!
//! A two-state machine per autonomous unit, re-evaluated on a think cadence
//! rather than every tick. Thinking only writes intents - movement, rotation,
//! firing - which the motion and lifecycle passes consume like player input.

use glam::Vec2;

use super::entity::{Behavior, Entity};
use super::registry::{EntityId, Registry};
use crate::consts::*;
use crate::{angle_diff, bearing};

/// Re-evaluate every autonomous unit whose think timer has elapsed
pub fn think_pass(registry: &mut Registry, player_id: EntityId, now: f32) {
    let player_pos = registry
        .get(player_id)
        .filter(|p| !p.dead)
        .map(|p| p.pos);

    for id in registry.ids() {
        let Some(e) = registry.get_mut(id) else { continue };
        if e.dead {
            continue;
        }
        let Some(unit) = e.unit_state_mut() else { continue };
        let Some(ai) = &mut unit.ai else { continue };
        if !ai.think.elapsed(now) {
            continue;
        }
        ai.think.set(now, THINK_RATE);
        think(e, player_pos);
    }
}

fn think(e: &mut Entity, player_pos: Option<Vec2>) {
    let pos = e.pos;
    let Some(unit) = e.unit_state_mut() else { return };
    unit.firing = false;
    let Some(ai) = unit.ai.as_mut() else { return };

    // Sighting the player always wins; losing it falls back to the default
    let player_dist = player_pos.map(|p| pos.distance(p));
    match player_dist {
        Some(d) if d <= PLAYER_DETECT_RANGE => ai.behavior = Behavior::Attack,
        _ => {
            if ai.behavior == Behavior::Attack {
                ai.behavior = ai.default_behavior;
            }
        }
    }

    match ai.behavior {
        Behavior::Attack => {
            let (target, dist) = match (player_pos, player_dist) {
                (Some(p), Some(d)) => (p, d),
                _ => return,
            };
            let in_range = dist <= ENEMY_ATTACK_RANGE;
            let (move_dir, rotate_dir) = steer(e, target, if in_range { 0.0 } else { 1.0 });
            e.set_move(move_dir);
            e.set_rotate(rotate_dir);
            if let Some(unit) = e.unit_state_mut() {
                unit.firing = in_range;
            }
            log::trace!("attack: dist {dist:.0}, firing {in_range}");
        }
        Behavior::Patrol => {
            let Some(ai) = e.unit_state_mut().and_then(|u| u.ai.as_mut()) else { return };
            if ai.patrol_points.is_empty() {
                return;
            }
            let mut wp = ai.patrol_points[ai.waypoint];
            if pos.distance(wp) < WAYPOINT_RADIUS {
                ai.waypoint = (ai.waypoint + 1) % ai.patrol_points.len();
                wp = ai.patrol_points[ai.waypoint];
            }
            let (move_dir, rotate_dir) = steer(e, wp, 1.0);
            e.set_move(move_dir);
            e.set_rotate(rotate_dir);
        }
    }
}

/// Turn-then-move steering: rotate toward the target until aligned, then snap
/// the facing and apply `move_when_aligned` as the movement intent.
fn steer(e: &mut Entity, target: Vec2, move_when_aligned: f32) -> (f32, f32) {
    let want = bearing(e.pos, target);
    let diff = angle_diff(e.angle, want);
    if diff.abs() < AIM_TOLERANCE {
        e.angle = want;
        (move_when_aligned, 0.0)
    } else {
        (0.0, diff.signum())
    }
}
