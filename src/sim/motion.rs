//! Motion integration
//!
//! Advances every entity from its speed ramps and any active knockback
//! overlay, then refreshes the derived grid cell.

use glam::IVec2;

use super::registry::Registry;
use crate::{angle_delta, wrap_angle};

/// Advance positions and facings by one tick
pub fn integrate(registry: &mut Registry, cell_size: f32, now: f32, dt: f32) {
    for id in registry.ids() {
        let Some(e) = registry.get_mut(id) else { continue };

        e.move_speed.update(dt);
        e.rotate_speed.update(dt);

        if e.move_speed.current != 0.0 {
            e.pos += angle_delta(e.angle, e.move_speed.current * dt);
        }

        if let Some(kb) = e.knockback {
            e.pos += kb.displacement(now, dt);
            if kb.decay.elapsed(now) {
                e.knockback = None;
            }
        }

        if e.rotate_speed.current != 0.0 {
            e.angle = wrap_angle(e.angle + e.rotate_speed.current * dt);
        }

        e.grid_pos = IVec2::new(
            (e.pos.x / cell_size).floor() as i32,
            (e.pos.y / cell_size).floor() as i32,
        );
    }
}
