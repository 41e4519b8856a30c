//! Petal Arena headless driver
//!
//! Runs the simulation in idle mode for a fixed number of frames and prints
//! the final snapshot as JSON. Usage: `petal-arena [tuning.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::PathBuf;

    use petal_arena::consts::SIM_HZ;
    use petal_arena::sim::{GameEvent, GamePhase, SimulationState, TickInput, tick};
    use petal_arena::Tuning;

    env_logger::init();
    log::info!("Petal Arena (headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning_path = args.next().map(PathBuf::from);
    let seconds = parse_seconds(args.next().as_deref());

    let tuning = Tuning::load_or_default(tuning_path.as_deref());
    let seed = tuning.seed;
    let mut state = match SimulationState::from_tuning(tuning) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e}; starting with default tuning");
            SimulationState::new(seed)
        }
    };

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut kills = 0usize;
    let mut collected = 0usize;
    for _ in 0..frame_count(seconds, SIM_HZ) {
        let phase = tick(&mut state, &input);
        for event in &state.events {
            match event {
                GameEvent::MobKilled { .. } => kills += 1,
                GameEvent::DropCollected { .. } => collected += 1,
                _ => {}
            }
        }
        if phase == GamePhase::GameOver {
            break;
        }
    }

    log::info!(
        "Stopped at tick {} ({:?}): {} kills, {} drops collected, health {:.0}",
        state.time_ticks,
        state.phase,
        kills,
        collected,
        state.player.health
    );

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize snapshot: {e}"),
    }
}

const DEFAULT_SECONDS: u64 = 120;

/// Run length from the command line; a bad value falls back to the default
fn parse_seconds(arg: Option<&str>) -> u64 {
    match arg.map(str::parse::<u64>) {
        None => DEFAULT_SECONDS,
        Some(Ok(seconds)) => seconds,
        Some(Err(e)) => {
            log::warn!(
                "Invalid run length {:?} ({e}); running {DEFAULT_SECONDS} seconds",
                arg.unwrap_or_default()
            );
            DEFAULT_SECONDS
        }
    }
}

fn frame_count(seconds: u64, hz: u32) -> u64 {
    seconds.saturating_mul(u64::from(hz))
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on wasm; the host drives `tick` itself
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds(None), DEFAULT_SECONDS);
        assert_eq!(parse_seconds(Some("30")), 30);
        assert_eq!(parse_seconds(Some("soon")), DEFAULT_SECONDS);
        assert_eq!(parse_seconds(Some("-5")), DEFAULT_SECONDS);
    }

    #[test]
    fn test_frame_count_saturates() {
        assert_eq!(frame_count(2, 60), 120);
        assert_eq!(frame_count(u64::MAX, 60), u64::MAX);
    }
}
