//! Host-facing façade
//!
//! Wraps a [`GameState`] with the collaborators the tick must not touch
//! directly: an [`AudioSink`] for cues and a [`Clock`] for elapsed time.

use crate::audio::{AudioSink, Music, NullAudio, SoundEffect};
use crate::settings::Settings;
use crate::sim::{FrameEvents, GameState, InputState, tick};

/// Source of elapsed frame time
pub trait Clock {
    /// Milliseconds since the previous call
    fn elapsed_ms(&mut self) -> f32;
}

/// A clock that always reports the same step (tests and headless runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub step_ms: f32,
}

impl FixedClock {
    pub fn new(step_ms: f32) -> Self {
        Self { step_ms }
    }

    /// One 60 Hz frame per call
    pub fn sixty_hz() -> Self {
        Self::new(crate::consts::REFERENCE_FRAME_MS)
    }
}

impl Clock for FixedClock {
    fn elapsed_ms(&mut self) -> f32 {
        self.step_ms
    }
}

pub struct Simulation {
    state: GameState,
    audio: Box<dyn AudioSink>,
    music: Option<Music>,
}

impl Simulation {
    /// A silent simulation
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self::with_audio(settings, seed, Box::new(NullAudio))
    }

    pub fn with_audio(settings: Settings, seed: u64, audio: Box<dyn AudioSink>) -> Self {
        log::info!("New run with seed {seed}");
        Self {
            state: GameState::with_settings(settings, seed),
            audio,
            music: None,
        }
    }

    /// Advance by `elapsed_ms`, forwarding cues to the audio sink
    pub fn advance(&mut self, input: &InputState, elapsed_ms: f32) -> FrameEvents {
        let events = tick(&mut self.state, input, elapsed_ms);
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.audio.play(effect);
        }
        let music = Music::for_state(&self.state);
        if music != self.music {
            self.music = music;
            self.audio.set_music(music);
        }
        events
    }

    /// Advance by whatever the clock says has elapsed
    pub fn run_frame(&mut self, input: &InputState, clock: &mut dyn Clock) -> FrameEvents {
        let elapsed = clock.elapsed_ms();
        self.advance(input, elapsed)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Throw the run away and start over
    pub fn restart(&mut self) {
        self.state.restart();
    }

    /// Host pause (menus, lost focus)
    pub fn set_paused(&mut self, paused: bool) {
        self.state.pause.host = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.pause.is_paused()
    }
}
