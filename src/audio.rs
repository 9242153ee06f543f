//! Audio cues
//!
//! The core never plays sound itself. Each frame's events are mapped to
//! [`SoundEffect`]s and handed to whatever [`AudioSink`] the host injected,
//! together with music changes.

use crate::sim::{FrameEvent, GameState};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Wolf or minion killed
    EnemyDeath,
    /// Boss killed
    BossDeath,
    /// Player lost a life
    PlayerHurt,
    /// Powerup picked up
    PowerupCollect,
    /// Coin picked up
    CoinCollect,
    /// Crate smashed open
    CrateBreak,
    /// Tree knocked down
    TreeFall,
    /// Wave horn
    WaveStart,
    /// Wave cleared
    WaveClear,
    /// Boss roar
    BossRoar,
    /// Door opening or closing
    Door,
    /// Campfire heal
    Heal,
    /// Dog bought
    Bark,
    Dash,
    GameOver,
}

impl SoundEffect {
    /// The cue for a frame event, if it has one
    pub fn for_event(event: &FrameEvent) -> Option<Self> {
        Some(match event {
            FrameEvent::EnemyKilled { is_boss: true, .. } => Self::BossDeath,
            FrameEvent::EnemyKilled { is_boss: false, .. } => Self::EnemyDeath,
            FrameEvent::PlayerDamaged { .. } => Self::PlayerHurt,
            FrameEvent::PowerupCollected { .. } => Self::PowerupCollect,
            FrameEvent::CoinCollected { .. } => Self::CoinCollect,
            FrameEvent::CrateBroken { .. } => Self::CrateBreak,
            FrameEvent::TreeDestroyed { .. } => Self::TreeFall,
            FrameEvent::WaveStarted { .. } => Self::WaveStart,
            FrameEvent::WaveCleared { .. } => Self::WaveClear,
            FrameEvent::BossSpawned { .. } => Self::BossRoar,
            FrameEvent::EnteredHouse | FrameEvent::ExitedHouse => Self::Door,
            FrameEvent::PlayerHealed { .. } => Self::Heal,
            FrameEvent::PetPurchased { .. } => Self::Bark,
            FrameEvent::DashStarted => Self::Dash,
            FrameEvent::GameOver => Self::GameOver,
            FrameEvent::WaveProgress { .. } | FrameEvent::BossDefeated { .. } | FrameEvent::HouseAppeared => {
                return None;
            }
        })
    }
}

/// Background music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Music {
    Forest,
    BossBattle,
    House,
}

impl Music {
    /// Track that fits the current state; silence after game over
    pub fn for_state(state: &GameState) -> Option<Self> {
        if state.is_game_over() {
            None
        } else if state.is_indoors() {
            Some(Self::House)
        } else if state.boss.is_some() {
            Some(Self::BossBattle)
        } else {
            Some(Self::Forest)
        }
    }
}

/// Host side of audio playback
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    /// Switch tracks; `None` stops the music
    fn set_music(&mut self, music: Option<Music>);
}

/// Discards every cue (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}

    fn set_music(&mut self, _music: Option<Music>) {}
}

/// Records cues with their effective volume instead of playing them
#[derive(Debug, Clone)]
pub struct AudioLog {
    pub played: Vec<(SoundEffect, f32)>,
    pub music: Option<Music>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioLog {
    fn default() -> Self {
        Self {
            played: Vec::new(),
            music: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl AudioLog {
    /// Clamped to `0.0..=1.0`; scales every recorded cue
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

impl AudioSink for AudioLog {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.played.push((effect, vol));
    }

    fn set_music(&mut self, music: Option<Music>) {
        log::debug!("Music: {music:?}");
        self.music = music;
    }
}
