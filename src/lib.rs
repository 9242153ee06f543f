//! Wolf Survival - a top-down wave survival simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (steering, collisions, waves, powerups, house transitions)
//! - `simulation`: Host-facing façade with injected collaborators (audio, clock)
//! - `settings`: Data-driven world constants and game balance
//! - `audio`: Sound cue collaborator interface
//!
//! Rendering, asset loading and input translation live in the host shell; the core
//! consumes an [`sim::InputState`] per frame and emits [`sim::FrameEvent`]s plus
//! drawable state.

pub mod audio;
pub mod error;
pub mod settings;
pub mod sim;
pub mod simulation;

pub use error::SettingsError;
pub use settings::Settings;
pub use simulation::{Clock, FixedClock, Simulation};

use glam::Vec2;

/// Simulation timing constants
pub mod consts {
    /// Reference frame length. Per-frame speeds in [`crate::Settings`] are expressed
    /// in pixels per reference frame, as tuned for a 60 Hz display.
    pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;
    /// Default upper bound for a single tick's elapsed time (tab backgrounding etc.)
    pub const MAX_FRAME_MS: f32 = 100.0;
}

/// Convert elapsed milliseconds to reference frames
#[inline]
pub fn frames(dt_ms: f32) -> f32 {
    dt_ms / consts::REFERENCE_FRAME_MS
}

/// Unit vector for an angle in radians (screen space, y grows downward)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector in radians
#[inline]
pub fn bearing(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
