//! Wolf Survival headless runner
//!
//! Plays a scripted run at 60 Hz without a window and logs what happens.
//! Usage: `wolf-survival [seconds] [seed] [settings.json]`

use wolf_survival::sim::{FrameEvent, InputState};
use wolf_survival::{FixedClock, Settings, Simulation};

/// Circle strafe while shooting, dashing now and then
fn scripted_input(frame: u64) -> InputState {
    let quarter = (frame / 90) % 4;
    let mut input = InputState {
        shoot: frame % 120 < 80,
        dash: frame % 300 == 0,
        restart: true,
        ..Default::default()
    };
    match quarter {
        0 => input.right = true,
        1 => input.down = true,
        2 => input.left = true,
        _ => input.up = true,
    }
    input
}

fn load_settings(path: Option<&String>) -> Settings {
    let Some(path) = path else {
        return Settings::default();
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Settings::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Could not load settings from {path}: {e}; using defaults");
            Settings::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let seconds: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(120);
    let seed: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(42);
    let settings = load_settings(args.get(3));

    log::info!("Wolf Survival (headless) starting: {seconds} s, seed {seed}");
    let mut sim = Simulation::new(settings, seed);
    let mut clock = FixedClock::sixty_hz();

    let mut deaths = 0;
    for frame in 0..seconds * 60 {
        let events = sim.run_frame(&scripted_input(frame), &mut clock);
        for event in &events {
            match event {
                FrameEvent::GameOver => {
                    deaths += 1;
                    log::info!("Run {deaths} over at frame {frame}");
                }
                FrameEvent::EnemyKilled { .. } | FrameEvent::CoinCollected { .. } => {
                    log::trace!("{event:?}");
                }
                _ => log::debug!("{event:?}"),
            }
        }
    }

    let state = sim.state();
    log::info!(
        "Finished: wave {}, score {}, kills {}, coins {}, lives {}, bosses defeated {}, runs lost {}",
        state.waves.wave,
        state.score,
        state.kills,
        state.coins,
        state.player.lives,
        state.waves.bosses_defeated,
        deaths
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives `Simulation` directly
}
