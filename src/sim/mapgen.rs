//! Procedural level generation
//!
//! A constrained random walk carves a single corridor out of a wall-filled
//! grid. The walk may not repeat a direction three times in a row and may not
//! touch its own path, so a stuck walk has no local fix - generation restarts
//! from scratch, bounded by an attempt cap.

use glam::{IVec2, Vec2};
use rand::Rng;
use rand_pcg::Pcg32;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::GameError;
use super::collision::Bounds;
use super::entity::{Entity, Timer};
use super::registry::{EntityId, Registry};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Up,
    Left,
    Down,
    Right,
}

impl Dir {
    const ALL: [Dir; 4] = [Dir::Up, Dir::Left, Dir::Down, Dir::Right];

    fn delta(self) -> IVec2 {
        match self {
            Dir::Up => IVec2::new(0, -1),
            Dir::Left => IVec2::new(-1, 0),
            Dir::Down => IVec2::new(0, 1),
            Dir::Right => IVec2::new(1, 0),
        }
    }

    fn perp(self) -> IVec2 {
        let d = self.delta();
        IVec2::new(-d.y, d.x)
    }
}

/// Raw wall grid and route produced by the walk
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayout {
    /// Row-major; true = wall
    pub walls: Vec<bool>,
    /// Ordered path cells from the grid center outward
    pub route: Vec<IVec2>,
    /// Side length of the square grid
    pub grid_size: usize,
}

impl MapLayout {
    fn is_cleared(&self, cell: IVec2) -> bool {
        let side = self.grid_size as i32;
        if cell.x < 0 || cell.y < 0 || cell.x >= side || cell.y >= side {
            return false;
        }
        !self.walls[(cell.y * side + cell.x) as usize]
    }
}

/// One walk attempt; None when the walk gets stuck
fn try_walk(path_len: usize, grid_size: usize, rng: &mut Pcg32) -> Option<MapLayout> {
    let side = grid_size as i32;
    let start = IVec2::splat(side / 2);
    let mut layout = MapLayout {
        walls: vec![true; grid_size * grid_size],
        route: Vec::with_capacity(path_len),
        grid_size,
    };
    layout.walls[(start.y * side + start.x) as usize] = false;
    layout.route.push(start);

    let mut pos = start;
    let mut trail: [Option<Dir>; 2] = [None, None];

    for _ in 1..path_len {
        // The same direction twice in a row bans a third - no long corridors
        let banned = match trail {
            [Some(a), Some(b)] if a == b => Some(a),
            _ => None,
        };

        let mut options: Vec<Dir> = Vec::with_capacity(4);
        for dir in Dir::ALL {
            if Some(dir) == banned {
                continue;
            }
            let next = pos + dir.delta();
            if next.x < 0 || next.y < 0 || next.x >= side || next.y >= side {
                continue;
            }
            // The target cell, its two lateral neighbors and the cell straight
            // ahead must all still be wall, or the walk would touch itself and
            // open a loop or a 2-wide room.
            let lookahead = [
                next,
                next + dir.perp(),
                next - dir.perp(),
                next + dir.delta(),
            ];
            if lookahead.iter().any(|&c| layout.is_cleared(c)) {
                continue;
            }
            options.push(dir);
        }

        if options.is_empty() {
            return None;
        }
        let dir = options[rng.random_range(0..options.len())];
        pos += dir.delta();
        layout.walls[(pos.y * side + pos.x) as usize] = false;
        layout.route.push(pos);
        trail = [trail[1], Some(dir)];
    }

    Some(layout)
}

/// Generate a connected corridor layout, restarting the whole walk when it
/// gets stuck. Bounded: fails with [`GameError::MapGeneration`] past the cap.
pub fn generate_layout(path_len: usize, rng: &mut Pcg32) -> Result<MapLayout, GameError> {
    if path_len < 1 {
        return Err(GameError::MapGeneration { attempts: 0, path_len });
    }
    let grid_size = ((path_len as f32 * 1.3) as usize).max(1);
    for attempt in 0..MAX_MAP_ATTEMPTS {
        if let Some(layout) = try_walk(path_len, grid_size, rng) {
            if attempt > 0 {
                log::debug!("map walk succeeded after {} restarts", attempt);
            }
            return Ok(layout);
        }
    }
    Err(GameError::MapGeneration { attempts: MAX_MAP_ATTEMPTS, path_len })
}

/// The generated arena: wall entities, the route, and per-tick tracking of
/// how far along the route the player has made it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    pub level: u32,
    pub cell_size: f32,
    /// Side length of the walk grid, in cells
    pub dimensions: u32,
    /// Arena world size
    pub size: Vec2,
    pub route: Vec<IVec2>,
    pub walls: Vec<EntityId>,
    pub enemies: Vec<EntityId>,
    /// Route index of the cell the player currently occupies
    pub player_route_index: usize,
    route_timer: Timer,
}

impl LevelMap {
    /// Generate the arena for a difficulty level and register its entities.
    /// `level` must be >= 1.
    pub fn generate(level: u32, seed: u64, registry: &mut Registry) -> Result<Self, GameError> {
        if level < 1 {
            return Err(GameError::InvalidLevel(level));
        }
        let multiplier = level as f32 * 1.2;
        let path_len = 4 + multiplier as usize;
        let cell_size = (1000.0 * multiplier).min(1200.0);

        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = generate_layout(path_len, &mut rng)?;
        let side = layout.grid_size;
        let size = Vec2::splat(side as f32 * cell_size);
        let half_cell = cell_size / 2.0;

        let mut walls = Vec::new();
        for (i, &is_wall) in layout.walls.iter().enumerate() {
            if !is_wall {
                continue;
            }
            let px = (i % side) as f32;
            let py = (i / side) as f32;
            let pos = Vec2::new(px * cell_size + half_cell, py * cell_size + half_cell);
            walls.push(registry.spawn(Entity::wall(pos, Vec2::splat(cell_size))));
        }

        // Ring of 8 arena-sized walls around the playable area, no corner gaps
        let half_map = size * 0.5;
        for i in 0..3i32 {
            for j in 0..3i32 {
                if i == 1 && j == 1 {
                    continue;
                }
                let pos = Vec2::new(size.x * (i - 1) as f32, size.y * (j - 1) as f32) + half_map;
                walls.push(registry.spawn(Entity::wall(pos, size)));
            }
        }

        // Enemy squads in every route cell but the first, on a small offset
        // lattice so units never spawn exactly stacked
        let per_cell = (multiplier as u32).clamp(1, MAX_ENEMIES_PER_CELL);
        let spacing = cell_size * 0.2;
        let mut enemies = Vec::new();
        for &cell in &layout.route[1..] {
            let center = cell.as_vec2() * cell_size + Vec2::splat(half_cell);
            for k in 0..per_cell {
                let offset = Vec2::new(
                    spacing * ((k + 1) % 2) as f32,
                    spacing * ((k / 2 + 1) % 2) as f32,
                );
                let pos = center + offset;
                let patrol_to = pos + Vec2::new(cell_size * 0.3, 0.0);
                enemies.push(registry.spawn(Entity::enemy(pos, patrol_to, 0.0)?));
            }
        }

        log::info!(
            "level {level}: {side}x{side} grid, route {} cells, {} walls, {} enemies",
            layout.route.len(),
            walls.len(),
            enemies.len(),
        );

        Ok(Self {
            level,
            cell_size,
            dimensions: side as u32,
            size,
            route: layout.route,
            walls,
            enemies,
            player_route_index: 0,
            route_timer: Timer::new(0.0, ROUTE_CHECK_INTERVAL),
        })
    }

    /// World-space center of a route/grid cell
    pub fn cell_center(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() * self.cell_size + Vec2::splat(self.cell_size / 2.0)
    }

    /// Arena center - the player spawn point
    pub fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Re-check which route cell the player occupies (at a fixed interval,
    /// not every tick)
    pub fn update(&mut self, now: f32, player: &Entity) {
        if !self.route_timer.elapsed(now) {
            return;
        }
        let player_bounds = Bounds::of(player);
        let cell_size = Vec2::splat(self.cell_size);
        self.player_route_index = self
            .route
            .iter()
            .position(|&cell| {
                Bounds::from_center(self.cell_center(cell), cell_size).overlaps(&player_bounds)
            })
            .unwrap_or(0);
        self.route_timer.set(now, ROUTE_CHECK_INTERVAL);
    }

    /// True once every enemy is dead or gone
    pub fn is_complete(&self, registry: &Registry) -> bool {
        self.enemies
            .iter()
            .all(|&id| registry.get(id).map(|e| e.dead).unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_route_is_connected_and_loop_free(
            path_len in 1usize..24,
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = match generate_layout(path_len, &mut rng) {
                Ok(l) => l,
                // The bounded retry is allowed to give up on hostile seeds
                Err(GameError::MapGeneration { .. }) => return Ok(()),
                Err(e) => panic!("unexpected error: {e}"),
            };

            prop_assert_eq!(layout.route.len(), path_len);

            // Consecutive cells are grid-adjacent, no cell repeats
            for w in layout.route.windows(2) {
                let step = w[1] - w[0];
                prop_assert_eq!(step.x.abs() + step.y.abs(), 1);
            }
            let mut seen = std::collections::HashSet::new();
            for &cell in &layout.route {
                prop_assert!(seen.insert((cell.x, cell.y)), "route revisits {:?}", cell);
                prop_assert!(layout.is_cleared(cell));
            }

            // No three consecutive steps share a direction
            for w in layout.route.windows(4) {
                let d1 = w[1] - w[0];
                let d2 = w[2] - w[1];
                let d3 = w[3] - w[2];
                prop_assert!(!(d1 == d2 && d2 == d3), "straight corridor of 3 at {:?}", w[0]);
            }

            // Exactly the route cells are cleared
            let cleared = layout.walls.iter().filter(|&&w| !w).count();
            prop_assert_eq!(cleared, path_len);
        }
    }

    #[test]
    fn test_layout_is_deterministic_per_seed() {
        let mut a = Pcg32::seed_from_u64(42);
        let mut b = Pcg32::seed_from_u64(42);
        let la = generate_layout(8, &mut a).unwrap();
        let lb = generate_layout(8, &mut b).unwrap();
        assert_eq!(la.route, lb.route);
        assert_eq!(la.walls, lb.walls);
    }

    #[test]
    fn test_single_cell_path() {
        let mut rng = Pcg32::seed_from_u64(1);
        let layout = generate_layout(1, &mut rng).unwrap();
        assert_eq!(layout.route.len(), 1);
        assert_eq!(layout.grid_size, 1);
        assert!(layout.is_cleared(layout.route[0]));
    }

    #[test]
    fn test_zero_path_len_is_rejected() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(matches!(
            generate_layout(0, &mut rng),
            Err(GameError::MapGeneration { .. })
        ));
    }

    #[test]
    fn test_level_zero_is_rejected() {
        let mut reg = Registry::new();
        assert!(matches!(
            LevelMap::generate(0, 7, &mut reg),
            Err(GameError::InvalidLevel(0))
        ));
    }

    #[test]
    fn test_border_ring_has_eight_arena_sized_walls() {
        let mut reg = Registry::new();
        let map = LevelMap::generate(1, 123, &mut reg).unwrap();
        let border: Vec<_> = map
            .walls
            .iter()
            .filter_map(|&id| reg.get(id))
            .filter(|w| w.size == map.size)
            .collect();
        assert_eq!(border.len(), 8);

        // Every point just outside the arena falls inside some border wall
        let probes = [
            Vec2::new(-1.0, map.size.y / 2.0),
            Vec2::new(map.size.x + 1.0, map.size.y / 2.0),
            Vec2::new(map.size.x / 2.0, -1.0),
            Vec2::new(map.size.x / 2.0, map.size.y + 1.0),
            Vec2::new(-1.0, -1.0),
            Vec2::new(map.size.x + 1.0, map.size.y + 1.0),
        ];
        for probe in probes {
            let covered = border.iter().any(|w| {
                let b = Bounds::of(w);
                probe.x >= b.left && probe.x <= b.right && probe.y >= b.top && probe.y <= b.bottom
            });
            assert!(covered, "gap in border ring at {probe:?}");
        }
    }

    #[test]
    fn test_enemy_squads_fill_route_cells() {
        let mut reg = Registry::new();
        let map = LevelMap::generate(1, 99, &mut reg).unwrap();
        // Level 1: one enemy per route cell after the first
        assert_eq!(map.enemies.len(), map.route.len() - 1);
        for &id in &map.enemies {
            assert!(reg.get(id).is_some());
        }
    }
}
