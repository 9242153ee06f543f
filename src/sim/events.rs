//! Discrete things that happened during a tick
//!
//! The host turns these into sounds, HUD notifications and screen effects.

use glam::Vec2;
use serde::Serialize;

use super::state::PowerupKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FrameEvent {
    EnemyKilled { position: Vec2, is_boss: bool },
    PlayerDamaged { lives: u32 },
    PowerupCollected { kind: PowerupKind },
    CoinCollected { value: u32 },
    WaveStarted { number: u32, count: u32 },
    WaveProgress { number: u32, percent: u32 },
    WaveCleared { number: u32 },
    BossSpawned { health: i32 },
    BossDefeated { total: u32 },
    TreeDestroyed { position: Vec2 },
    CrateBroken { kind: PowerupKind },
    HouseAppeared,
    EnteredHouse,
    ExitedHouse,
    PlayerHealed { lives: u32 },
    PetPurchased { price: u32 },
    DashStarted,
    GameOver,
}

/// Events emitted by one tick, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameEvents(Vec<FrameEvent>);

impl FrameEvents {
    pub fn push(&mut self, event: FrameEvent) {
        self.0.push(event);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameEvent> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of events matching `pred`
    pub fn count(&self, pred: impl Fn(&FrameEvent) -> bool) -> usize {
        self.0.iter().filter(|e| pred(e)).count()
    }
}

impl IntoIterator for FrameEvents {
    type Item = FrameEvent;
    type IntoIter = std::vec::IntoIter<FrameEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameEvents {
    type Item = &'a FrameEvent;
    type IntoIter = std::slice::Iter<'a, FrameEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
