//! Headless driver: runs a scripted session against the simulation and logs
//! the events it raises. Useful for soak runs and profiling; rendering and
//! input mapping live in a separate front end.

use log::{error, info};
use maze_tanks::consts::SIM_DT;
use maze_tanks::{GameEvent, GameState, TickInput, tick};

const DEFAULT_SEED: u64 = 0xC0FFEE;
const RUN_SECONDS: f32 = 30.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_SEED);
    let level = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    let mut state = match GameState::new(seed, level) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to start: {e}");
            std::process::exit(1);
        }
    };

    let ticks = (RUN_SECONDS / SIM_DT) as u64;
    for t in 0..ticks {
        // Drive in a loose weave: forward, alternating turns, periodic fire
        let input = TickInput {
            move_axis: 1,
            turn_axis: if (t / 240) % 2 == 0 { 1 } else { -1 },
            fire: t % 60 == 0,
        };
        tick(&mut state, input, SIM_DT);

        for event in state.events.drain(..) {
            match event {
                GameEvent::Sound(cue) => info!("cue: {}", cue.name()),
                GameEvent::UnitDied { team, .. } => info!("unit died ({team:?})"),
                GameEvent::LevelComplete => info!("level complete"),
            }
        }
        if state.completed || !state.player_alive() {
            break;
        }
    }

    info!(
        "ran {} ticks: {} entities live, player alive: {}, route index {}",
        state.ticks,
        state.registry.len(),
        state.player_alive(),
        state.map.player_route_index,
    );
}
