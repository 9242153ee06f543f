//! Wave director: preparing → spawning → active → waiting
//!
//! Wave sizes grow by tiers; every few waves a boss arrives with a minion
//! escort. The director only runs while the simulation is unpaused and the
//! player is outdoors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{FrameEvent, FrameEvents};
use super::state::{Enemy, EnemyKind, GameState};
use super::world_gen::spawn_crates;
use crate::settings::WaveSettings;

/// Progress notifications per wave, in percent
pub const PROGRESS_MILESTONES: [u32; 3] = [25, 50, 75];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Counting up to the first wave
    Preparing,
    Spawning,
    /// Quota spawned; waiting for the field to be cleared
    Active,
    /// Intermission after a cleared wave
    Waiting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveDirector {
    /// Current wave, 0 before the first one starts
    pub wave: u32,
    pub phase: WavePhase,
    /// Phase timer: counts up from a negative grace period while preparing,
    /// from zero while waiting
    pub timer_ms: f32,
    pub spawn_timer_ms: f32,
    pub spawn_rate_ms: f32,
    /// Enemies to spawn this wave (minions only on boss waves)
    pub quota: u32,
    pub spawned: u32,
    pub boss_wave: bool,
    /// Highest progress milestone already announced this wave
    pub last_milestone: u32,
    pub bosses_defeated: u32,
}

impl WaveDirector {
    pub fn new(settings: &WaveSettings) -> Self {
        Self {
            wave: 0,
            phase: WavePhase::Preparing,
            timer_ms: -settings.preparation_ms,
            spawn_timer_ms: 0.0,
            spawn_rate_ms: 0.0,
            quota: 0,
            spawned: 0,
            boss_wave: false,
            last_milestone: 0,
            bosses_defeated: 0,
        }
    }

    pub fn is_boss_wave(wave: u32, settings: &WaveSettings) -> bool {
        wave > 0 && wave % settings.boss_interval.max(1) == 0
    }

    /// Enemies in a normal wave, from the last tier that has started
    pub fn quota_for(wave: u32, settings: &WaveSettings) -> u32 {
        settings
            .tiers
            .iter()
            .rev()
            .find(|t| t.first_wave <= wave)
            .map_or(0, |t| t.base + t.per_wave * (wave - t.first_wave))
    }

    /// Minion escort for the next boss
    pub fn boss_escort(&self, settings: &WaveSettings) -> u32 {
        settings.boss_minions_base + settings.boss_minions_step * (self.bosses_defeated / 2)
    }

    pub fn spawn_rate_for(wave: u32, settings: &WaveSettings) -> f32 {
        settings
            .spawn_rates
            .iter()
            .rev()
            .find(|t| t.first_wave <= wave)
            .map_or(settings.boss_wave_spawn_rate_ms, |t| t.rate_ms)
    }

    /// Enemies still to deal with this wave, counting the unspawned ones
    pub fn remaining(&self, live: usize) -> u32 {
        self.quota.saturating_sub(self.spawned) + live as u32
    }

    /// Next milestone crossed given `live` enemies, at most once per milestone
    pub fn take_milestone(&mut self, live: usize) -> Option<u32> {
        if self.quota == 0 {
            return None;
        }
        let defeated = self.quota.saturating_sub(self.remaining(live));
        let percent = defeated * 100 / self.quota;
        let reached = PROGRESS_MILESTONES
            .iter()
            .copied()
            .filter(|&m| percent >= m && m > self.last_milestone)
            .max()?;
        self.last_milestone = reached;
        Some(reached)
    }
}

/// Advance the director by `dt`
///
/// `removed_any` tells whether an enemy finished dying this tick, which is
/// when progress milestones are re-evaluated.
pub fn update(state: &mut GameState, dt: f32, removed_any: bool, events: &mut FrameEvents) {
    match state.waves.phase {
        WavePhase::Preparing => {
            state.waves.timer_ms += dt;
            if state.waves.timer_ms >= 0.0 {
                start_wave(state, events);
            }
            return;
        }
        WavePhase::Waiting => {
            state.waves.timer_ms += dt;
            if state.waves.timer_ms >= state.settings.waves.intermission_ms {
                start_wave(state, events);
            }
            return;
        }
        WavePhase::Spawning | WavePhase::Active => {}
    }

    if removed_any {
        let live = state.live_enemy_count();
        if let Some(percent) = state.waves.take_milestone(live) {
            events.push(FrameEvent::WaveProgress {
                number: state.waves.wave,
                percent,
            });
        }
    }

    if state.waves.phase == WavePhase::Spawning {
        state.waves.spawn_timer_ms += dt;
        let due = state.waves.spawn_timer_ms >= state.waves.spawn_rate_ms;
        // At the live-enemy cap the spawn is held until something dies
        let below_cap = state.live_enemy_count() < state.settings.waves.max_enemies;
        if state.waves.spawned < state.waves.quota && due && below_cap {
            let kind = if state.waves.boss_wave {
                EnemyKind::Minion
            } else {
                EnemyKind::Wolf
            };
            spawn_enemy(state, kind);
            state.waves.spawned += 1;
            state.waves.spawn_timer_ms = 0.0;
        }
        if state.waves.spawned >= state.waves.quota {
            if state.waves.boss_wave {
                spawn_boss(state, events);
            }
            state.waves.phase = WavePhase::Active;
        }
    }

    if state.waves.phase == WavePhase::Active && state.live_enemy_count() == 0 && state.boss.is_none() {
        state.waves.phase = WavePhase::Waiting;
        state.waves.timer_ms = 0.0;
        log::info!("Wave {} cleared", state.waves.wave);
        events.push(FrameEvent::WaveCleared {
            number: state.waves.wave,
        });
        spawn_crates(state, state.settings.waves.crates_per_clear);
    }
}

/// Begin the next wave and raise its notification pause
pub fn start_wave(state: &mut GameState, events: &mut FrameEvents) {
    let settings = &state.settings.waves;
    let w = &mut state.waves;
    w.wave += 1;
    w.phase = WavePhase::Spawning;
    w.boss_wave = WaveDirector::is_boss_wave(w.wave, settings);
    if w.boss_wave {
        w.quota = w.boss_escort(settings);
        w.spawn_rate_ms = settings.boss_wave_spawn_rate_ms;
    } else {
        w.quota = WaveDirector::quota_for(w.wave, settings);
        w.spawn_rate_ms = WaveDirector::spawn_rate_for(w.wave, settings);
    }
    w.spawned = 0;
    w.spawn_timer_ms = 0.0;
    w.timer_ms = 0.0;
    w.last_milestone = 0;
    log::info!(
        "Wave {} starting: {} enemies every {} ms{}",
        w.wave,
        w.quota,
        w.spawn_rate_ms,
        if w.boss_wave { " (boss wave)" } else { "" }
    );
    events.push(FrameEvent::WaveStarted {
        number: w.wave,
        count: w.quota,
    });
    state.pause.notify(settings.notification_ms);
}

/// Spawn a wolf or minion just outside a random world edge
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind) {
    let margin = state.settings.waves.spawn_margin;
    let pos = state.world_bounds().edge_spawn(&mut state.rng, margin);
    let id = state.next_entity_id();
    let enemy = Enemy::new(id, kind, pos, state.settings.enemy(kind));
    log::debug!("Spawned {kind:?} {id:?} at {pos:?}");
    state.enemies.push(enemy);
}

/// Spawn the boss scaled by how many came before; never while one exists
pub fn spawn_boss(state: &mut GameState, events: &mut FrameEvents) {
    if state.boss.is_some() {
        log::warn!("Boss spawn skipped: one is already alive");
        return;
    }
    let (lo, hi) = state.settings.waves.boss_spawn_margin;
    let margin = if hi > lo {
        state.rng.random_range(lo..hi)
    } else {
        lo
    };
    let pos = state.world_bounds().edge_spawn(&mut state.rng, margin);
    let id = state.next_entity_id();
    let defeated = state.waves.bosses_defeated as f32;
    let scaling = &state.settings.boss_behavior;
    let health_scale = 1.0 + scaling.health_growth * defeated;
    let speed_scale = 1.0 + scaling.speed_growth * defeated;

    let profile = &state.settings.boss;
    let mut boss = Enemy::new(id, EnemyKind::Boss, pos, profile);
    boss.health = (profile.health as f32 * health_scale).floor() as i32;
    boss.max_health = boss.health;
    boss.speed = profile.speed * speed_scale;
    boss.health_scale = health_scale;

    log::info!(
        "Boss spawned with {} health, speed {:.2} ({} defeated so far)",
        boss.health,
        boss.speed,
        state.waves.bosses_defeated
    );
    events.push(FrameEvent::BossSpawned { health: boss.health });
    state.boss = Some(boss);
    state.pause.notify(state.settings.waves.notification_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn bare() -> GameState {
        GameState::bare(Settings::default(), 21)
    }

    #[test]
    fn test_quota_tiers() {
        let s = WaveSettings::default();
        let quotas: Vec<u32> = [1, 2, 5, 6, 10, 11, 15, 16, 20, 21, 22]
            .iter()
            .map(|&n| WaveDirector::quota_for(n, &s))
            .collect();
        assert_eq!(quotas, vec![5, 8, 17, 20, 36, 40, 60, 70, 110, 120, 135]);
    }

    #[test]
    fn test_spawn_rate_tiers() {
        let s = WaveSettings::default();
        assert_eq!(WaveDirector::spawn_rate_for(1, &s), 1500.0);
        assert_eq!(WaveDirector::spawn_rate_for(10, &s), 1500.0);
        assert_eq!(WaveDirector::spawn_rate_for(11, &s), 1200.0);
        assert_eq!(WaveDirector::spawn_rate_for(20, &s), 1000.0);
        assert_eq!(WaveDirector::spawn_rate_for(21, &s), 800.0);
    }

    #[test]
    fn test_first_wave_after_preparation() {
        let mut state = bare();
        let mut events = FrameEvents::default();
        update(&mut state, 9_990.0, false, &mut events);
        assert_eq!(state.waves.wave, 0);
        update(&mut state, 10.0, false, &mut events);
        assert_eq!(state.waves.wave, 1);
        assert_eq!(state.waves.phase, WavePhase::Spawning);
        assert_eq!(state.waves.quota, 5);
        assert!(state.pause.is_paused());
        assert_eq!(
            events.iter().next(),
            Some(&FrameEvent::WaveStarted { number: 1, count: 5 })
        );
    }

    #[test]
    fn test_wave_one_clears_exactly_once() {
        let mut state = bare();
        let mut events = FrameEvents::default();
        start_wave(&mut state, &mut events);
        while state.waves.phase == WavePhase::Spawning {
            update(&mut state, 100.0, false, &mut events);
        }
        assert_eq!(state.waves.phase, WavePhase::Active);
        assert_eq!(state.enemies.len(), 5);

        // Still enemies around: stays active
        update(&mut state, 100.0, false, &mut events);
        assert_eq!(state.waves.phase, WavePhase::Active);

        for e in &mut state.enemies {
            e.removed = true;
        }
        update(&mut state, 16.0, true, &mut events);
        state.compact();
        for _ in 0..10 {
            update(&mut state, 16.0, false, &mut events);
        }
        assert_eq!(state.waves.phase, WavePhase::Waiting);
        assert_eq!(events.count(|e| matches!(e, FrameEvent::WaveCleared { number: 1 })), 1);
        let crates = state.pickups.len();
        assert_eq!(crates, state.settings.waves.crates_per_clear);
    }

    #[test]
    fn test_intermission_starts_next_wave() {
        let mut state = bare();
        let mut events = FrameEvents::default();
        state.waves.wave = 1;
        state.waves.phase = WavePhase::Waiting;
        state.waves.timer_ms = 0.0;
        update(&mut state, 9_999.0, false, &mut events);
        assert_eq!(state.waves.wave, 1);
        update(&mut state, 1.0, false, &mut events);
        assert_eq!(state.waves.wave, 2);
        assert_eq!(state.waves.quota, 8);
    }

    #[test]
    fn test_spawning_waits_at_enemy_cap() {
        let mut state = bare();
        state.settings.waves.max_enemies = 2;
        let mut events = FrameEvents::default();
        start_wave(&mut state, &mut events);
        for _ in 0..50 {
            update(&mut state, 100.0, false, &mut events);
        }
        assert_eq!(state.enemies.len(), 2);
        assert_eq!(state.waves.spawned, 2);
        assert_eq!(state.waves.phase, WavePhase::Spawning);
    }

    #[test]
    fn test_boss_wave_spawns_escort_then_boss() {
        let mut state = bare();
        state.waves.wave = 4;
        state.waves.bosses_defeated = 2;
        let mut events = FrameEvents::default();
        start_wave(&mut state, &mut events);
        assert!(state.waves.boss_wave);
        assert_eq!(state.waves.quota, 7);
        assert_eq!(state.waves.spawn_rate_ms, 800.0);
        while state.waves.phase == WavePhase::Spawning {
            update(&mut state, 100.0, false, &mut events);
        }
        assert!(state.enemies.iter().all(|e| e.kind == EnemyKind::Minion));
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.health, 48);
        assert!((boss.speed - 2.0 * 1.2).abs() < 1e-5);
        assert_eq!(events.count(|e| matches!(e, FrameEvent::BossSpawned { .. })), 1);
    }

    #[test]
    fn test_never_a_second_boss() {
        let mut state = bare();
        let mut events = FrameEvents::default();
        spawn_boss(&mut state, &mut events);
        let first = state.boss.as_ref().map(|b| b.id);
        spawn_boss(&mut state, &mut events);
        assert_eq!(state.boss.as_ref().map(|b| b.id), first);
        assert_eq!(events.count(|e| matches!(e, FrameEvent::BossSpawned { .. })), 1);
    }

    #[test]
    fn test_progress_milestones_fire_once() {
        let mut w = WaveDirector::new(&WaveSettings::default());
        w.quota = 8;
        w.spawned = 8;
        assert_eq!(w.take_milestone(7), None);
        assert_eq!(w.take_milestone(6), Some(25));
        assert_eq!(w.take_milestone(6), None);
        // Jumping past two milestones reports the highest
        assert_eq!(w.take_milestone(1), Some(75));
        assert_eq!(w.take_milestone(0), None);
    }
}
