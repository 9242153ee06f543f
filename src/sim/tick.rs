//! Per-frame simulation tick
//!
//! Core game loop that advances the world by one variable-length frame:
//! player → camera → enemies → boss → projectiles → obstacles → particles →
//! pickups → pets (or the interior) → wave director → house transitions →
//! compaction.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Mover, commit_or_revert};
use super::events::{FrameEvent, FrameEvents};
use super::geom::{Rect, overlaps};
use super::interior::update_interior;
use super::pets::update_pets;
use super::projectile::update_projectiles;
use super::state::{GamePhase, GameState, ParticleKind, Pickup, PickupKind, PlayerFacing, Projectile};
use super::steering::{SteeringContext, steer};
use super::{transition, waves, world_gen};
use crate::frames;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
    pub dash: bool,
    /// Buy at the dog shop (edge triggered)
    pub interact: bool,
    /// Start a new run after game over
    pub restart: bool,
}

impl InputState {
    /// Normalized movement direction; opposite keys cancel
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

/// Which enemy a hit lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnemySlot {
    Crowd(usize),
    Boss,
}

/// Advance the game by `elapsed_ms` and report what happened
pub fn tick(state: &mut GameState, input: &InputState, elapsed_ms: f32) -> FrameEvents {
    let mut events = FrameEvents::default();

    if state.phase == GamePhase::GameOver {
        if input.restart {
            state.restart();
        }
        return events;
    }

    let dt = elapsed_ms.clamp(0.0, state.settings.world.max_frame_ms);

    // Only the notification countdown runs while paused
    if state.pause.is_paused() {
        if !state.pause.host {
            state.pause.notification_ms = (state.pause.notification_ms - dt).max(0.0);
        }
        state.interact_held = input.interact;
        return events;
    }

    state.time_ms += dt as f64;
    // Steering chases where the player stood when the tick began
    let target = state.player.rect.pos;

    update_player(state, input, dt, &mut events);
    let center = state.player.center();
    state.camera.follow(center, &state.settings.world, dt);

    let indoors = state.is_indoors();
    if !indoors {
        update_enemies(state, target, dt, &mut events);
        update_boss(state, target, dt, &mut events);
    }

    update_projectiles(state, dt, &mut events);

    let break_ms = state.settings.obstacles.tree_break_ms;
    for obstacle in &mut state.obstacles {
        obstacle.update(dt, break_ms);
    }
    for particle in &mut state.particles {
        particle.update(dt);
    }

    update_pickups(state, dt, &mut events);

    if indoors {
        update_interior(state, input, dt, &mut events);
    } else {
        update_pets(state, dt, &mut events);
        let removed_any = state.enemies.iter().any(|e| e.removed);
        waves::update(state, dt, removed_any, &mut events);
    }

    transition::update(state, dt, &mut events);

    state.interact_held = input.interact;
    state.compact();
    events
}

/// Timers, dash, shooting and movement
fn update_player(state: &mut GameState, input: &InputState, dt: f32, events: &mut FrameEvents) {
    let settings = &state.settings.player;
    let player = &mut state.player;
    player.update_timers(dt);

    let dir = input.direction();
    if input.dash && player.try_dash(state.time_ms, dir, settings) {
        log::debug!("Dash towards {:?}", dir);
        events.push(FrameEvent::DashStarted);
    }
    if let Some(delta) = player.advance_dash(dt, settings) {
        move_player(state, delta);
        return;
    }

    if dir != Vec2::ZERO {
        player.aim = dir;
        player.facing = PlayerFacing::from_input(dir, player.facing);
    }

    // Shooting roots the player in place; there is nothing to shoot indoors
    if input.shoot && state.interior.is_none() {
        if player.can_shoot() {
            player.shoot_cooldown_ms = player.shoot_cooldown_total(settings);
            let aim = player.aim;
            let id = state.next_entity_id();
            let bullet = Projectile::from_player(id, &state.player, aim, &state.settings.projectile);
            state.projectiles.push(bullet);
        }
        return;
    }

    let delta = dir * player.speed * frames(dt);
    move_player(state, delta);
}

fn move_player(state: &mut GameState, delta: Vec2) {
    if delta == Vec2::ZERO {
        return;
    }
    let rect = state.player.rect;
    state.player.rect = match state.interior.as_ref() {
        Some(interior) => rect.translated(delta).clamped_to(&interior.bounds),
        None => {
            let moved = commit_or_revert(rect, delta, &state.obstacles, Mover::Walker).rect;
            state.world_bounds().clamp(&moved)
        }
    };
}

/// Steer the crowd, run death throws and apply contact damage
fn update_enemies(state: &mut GameState, target: Vec2, dt: f32, events: &mut FrameEvents) {
    let bounds = state.world_bounds();
    let GameState {
        enemies,
        obstacles,
        settings,
        rng,
        ..
    } = &mut *state;
    let ctx = SteeringContext {
        target,
        obstacles: obstacles.as_slice(),
        bounds,
        settings: &settings.steering,
        mover: Mover::Walker,
    };
    for enemy in enemies.iter_mut() {
        if enemy.is_dying() {
            enemy.update_dying(dt, settings.enemy(enemy.kind).death_ms);
        } else {
            steer(enemy, &ctx, dt, rng);
        }
    }

    let player = state.player.rect;
    let touching = state
        .enemies
        .iter()
        .any(|e| e.is_alive() && overlaps(&e.rect, &player));
    if touching {
        state.damage_player(events);
    }
}

/// Boss pursuit, tree smashing, death and contact damage
fn update_boss(state: &mut GameState, target: Vec2, dt: f32, events: &mut FrameEvents) {
    let bounds = state.world_bounds();
    let player_rect = state.player.rect;
    let GameState {
        boss,
        obstacles,
        settings,
        rng,
        waves,
        ..
    } = &mut *state;
    let Some(b) = boss.as_mut() else {
        return;
    };

    if b.is_dying() {
        b.update_dying(dt, settings.boss.death_ms);
        if b.removed {
            *boss = None;
            waves.bosses_defeated += 1;
            let total = waves.bosses_defeated;
            log::info!("Boss defeated ({total} so far)");
            events.push(FrameEvent::BossDefeated { total });
        }
        return;
    }

    let ctx = SteeringContext {
        target,
        obstacles: obstacles.as_slice(),
        bounds,
        settings: &settings.steering,
        mover: Mover::Boss,
    };
    steer(b, &ctx, dt, rng);

    b.tree_cooldown_ms = (b.tree_cooldown_ms - dt).max(0.0);
    let mut felled = None;
    if b.tree_cooldown_ms <= 0.0 {
        let hit = obstacles
            .iter()
            .position(|o| o.active && o.is_tree() && overlaps(&o.rect, &b.rect));
        if let Some(oi) = hit {
            if obstacles[oi].fell_tree() {
                b.tree_cooldown_ms = settings.boss_behavior.tree_destruction_ms;
                felled = Some(oi);
            }
        }
    }
    let touching = overlaps(&b.rect, &player_rect);

    if let Some(oi) = felled {
        fell_tree(state, oi, events);
    }
    if touching {
        state.damage_player(events);
    }
}

/// Coins fly to the player; broken crates are collected on touch
fn update_pickups(state: &mut GameState, dt: f32, events: &mut FrameEvents) {
    let bounds = state.world_bounds();
    let GameState {
        pickups,
        player,
        settings,
        coins,
        score,
        ..
    } = &mut *state;
    let target = player.center();
    for pickup in pickups.iter_mut().filter(|p| p.active) {
        match pickup.kind {
            PickupKind::Coin { .. } => {
                if let Some(value) = pickup.update_coin(dt, target, &settings.pickups, &bounds) {
                    *coins += value;
                    events.push(FrameEvent::CoinCollected { value });
                }
            }
            PickupKind::Crate { powerup, broken: true } if overlaps(&pickup.rect, &player.rect) => {
                pickup.active = false;
                player.apply_powerup(powerup, &settings.player, &settings.powerups);
                *score += settings.powerups.score;
                events.push(FrameEvent::PowerupCollected { kind: powerup });
            }
            PickupKind::Crate { .. } => {}
        }
    }
}

/// Apply damage to an enemy and pay out the reward if it died
///
/// Returns true when this hit was the killing blow.
pub(crate) fn damage_enemy(state: &mut GameState, slot: EnemySlot, amount: i32, events: &mut FrameEvents) -> bool {
    let GameState {
        enemies,
        boss,
        settings,
        rng,
        ..
    } = &mut *state;
    let enemy = match slot {
        EnemySlot::Crowd(i) => enemies.get_mut(i),
        EnemySlot::Boss => boss.as_mut(),
    };
    let Some(enemy) = enemy else {
        return false;
    };
    let profile = settings.enemy(enemy.kind);
    if !enemy.take_damage(amount, profile, rng) {
        return false;
    }

    let position = enemy.rect.center();
    let is_boss = enemy.is_boss();
    let (lo, hi) = profile.coin_drop;
    let credit = profile.kill_credit;
    state.score += profile.score;
    state.kills += credit;
    state.kills_since_house += credit;

    let count = if hi > lo { state.rng.random_range(lo..=hi) } else { lo };
    drop_coins(state, position, count);
    log::debug!("Killed {:?} at {position:?}, dropped {count} coins", slot);
    events.push(FrameEvent::EnemyKilled { position, is_boss });
    true
}

/// Scatter `count` coins in a ring around `center`
fn drop_coins(state: &mut GameState, center: Vec2, count: u32) {
    let size = Vec2::splat(state.settings.pickups.coin_size);
    let value = state.settings.pickups.coin_value;
    for k in 0..count {
        let angle = k as f32 / count as f32 * TAU;
        let dir = crate::heading(angle);
        let vel = dir * state.rng.random_range(1.0..3.0);
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            rect: Rect::from_center(center + dir * 15.0, size),
            kind: PickupKind::Coin {
                value,
                vel,
                age_ms: 0.0,
            },
            active: true,
        });
    }
}

/// A tree was knocked down: debris, event and a replacement elsewhere
pub(crate) fn fell_tree(state: &mut GameState, oi: usize, events: &mut FrameEvents) {
    let Some(tree) = state.obstacles.get(oi) else {
        return;
    };
    let position = tree.rect.center();
    events.push(FrameEvent::TreeDestroyed { position });
    state.burst(position, ParticleKind::Wood, 10);
    world_gen::regrow_tree(state);
}

impl GameState {
    /// Contact or bullet damage on the player
    ///
    /// Returns true when a life was lost. Losing the last life ends the run;
    /// after that nothing can damage the player again.
    pub fn damage_player(&mut self, events: &mut FrameEvents) -> bool {
        if self.phase == GamePhase::GameOver || !self.player.take_hit(&self.settings.player) {
            return false;
        }
        let lives = self.player.lives;
        events.push(FrameEvent::PlayerDamaged { lives });
        if lives == 0 {
            self.phase = GamePhase::GameOver;
            log::info!(
                "Game over on wave {} with score {} ({} kills)",
                self.waves.wave,
                self.score,
                self.kills
            );
            events.push(FrameEvent::GameOver);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;
    use crate::settings::Settings;
    use crate::sim::state::{Enemy, EnemyKind, PowerupKind};
    use crate::sim::waves::WavePhase;

    fn quiet() -> GameState {
        let mut state = GameState::bare(Settings::default(), 31);
        // Hold the first wave back
        state.waves.timer_ms = -1.0e9;
        state
    }

    fn press(f: impl FnOnce(&mut InputState)) -> InputState {
        let mut input = InputState::default();
        f(&mut input);
        input
    }

    #[test]
    fn test_input_direction() {
        assert_eq!(press(|i| i.right = true).direction(), Vec2::X);
        assert_eq!(press(|i| (i.left, i.right) = (true, true)).direction(), Vec2::ZERO);
        let diag = press(|i| (i.up, i.right) = (true, true)).direction();
        assert!((diag.length() - 1.0).abs() < 1e-5);
        assert!(diag.x > 0.0 && diag.y < 0.0);
    }

    #[test]
    fn test_player_moves_at_speed() {
        let mut state = quiet();
        let start = state.player.rect.pos;
        tick(&mut state, &press(|i| i.right = true), REFERENCE_FRAME_MS);
        assert!((state.player.rect.pos.x - start.x - 4.0).abs() < 1e-3);
        assert_eq!(state.player.facing, PlayerFacing::DownRight);
    }

    #[test]
    fn test_elapsed_time_is_clamped() {
        let mut state = quiet();
        let start = state.player.rect.pos;
        tick(&mut state, &press(|i| i.right = true), 10_000.0);
        assert!((state.time_ms - 100.0).abs() < 1e-6);
        assert!((state.player.rect.pos.x - start.x - 4.0 * frames(100.0)).abs() < 1e-3);
    }

    #[test]
    fn test_shooting_respects_cooldown_and_roots_player() {
        let mut state = quiet();
        let start = state.player.rect.pos;
        let fire = press(|i| (i.shoot, i.right) = (true, true));
        tick(&mut state, &fire, 16.0);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.player.rect.pos, start);
        assert_eq!(state.projectiles[0].direction, Vec2::X);
        for _ in 0..20 {
            tick(&mut state, &fire, 16.0);
        }
        assert_eq!(state.projectiles.len(), 1);
        for _ in 0..10 {
            tick(&mut state, &fire, 16.0);
        }
        assert_eq!(state.projectiles.len(), 2);
    }

    #[test]
    fn test_three_hits_end_the_run() {
        let mut state = quiet();
        let mut events = FrameEvents::default();
        for _ in 0..3 {
            state.player.invulnerable_ms = 0.0;
            assert!(state.damage_player(&mut events));
        }
        assert_eq!(state.player.lives, 0);
        assert!(state.is_game_over());
        assert_eq!(events.count(|e| *e == FrameEvent::GameOver), 1);

        state.player.invulnerable_ms = 0.0;
        assert!(!state.damage_player(&mut events));
        assert_eq!(state.player.lives, 0);
        assert_eq!(events.count(|e| *e == FrameEvent::GameOver), 1);
    }

    #[test]
    fn test_game_over_freezes_until_restart() {
        let mut state = quiet();
        state.phase = GamePhase::GameOver;
        let before = state.player.rect.pos;
        let events = tick(&mut state, &press(|i| i.right = true), 16.0);
        assert!(events.is_empty());
        assert_eq!(state.player.rect.pos, before);
        assert_eq!(state.time_ms, 0.0);

        tick(&mut state, &press(|i| i.restart = true), 16.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.lives, state.settings.player.max_lives);
    }

    #[test]
    fn test_contact_damage_grants_invulnerability() {
        let mut state = quiet();
        let id = state.next_entity_id();
        let profile = state.settings.wolf.clone();
        state
            .enemies
            .push(Enemy::new(id, EnemyKind::Wolf, state.player.rect.pos, &profile));
        let events = tick(&mut state, &InputState::default(), 16.0);
        assert_eq!(state.player.lives, 2);
        assert_eq!(events.count(|e| matches!(e, FrameEvent::PlayerDamaged { .. })), 1);
        let events = tick(&mut state, &InputState::default(), 16.0);
        assert_eq!(state.player.lives, 2);
        assert!(events.is_empty());
    }

    #[test]
    fn test_boss_contact_damages_player() {
        let mut state = quiet();
        let id = state.next_entity_id();
        let pos = state.player.rect.pos;
        state.boss = Some(Enemy::new(id, EnemyKind::Boss, pos, &state.settings.boss));
        let events = tick(&mut state, &InputState::default(), 16.0);
        assert_eq!(state.player.lives, 2);
        assert!(events.iter().any(|e| *e == FrameEvent::PlayerDamaged { lives: 2 }));
        assert!(state.player.is_invulnerable());
    }

    #[test]
    fn test_notification_pause_freezes_world() {
        let mut state = quiet();
        state.pause.notify(3000.0);
        let start = state.player.rect.pos;
        tick(&mut state, &press(|i| i.right = true), 100.0);
        assert_eq!(state.player.rect.pos, start);
        assert_eq!(state.time_ms, 0.0);
        assert!((state.pause.notification_ms - 2900.0).abs() < 1e-3);

        state.pause.notification_ms = 0.0;
        tick(&mut state, &press(|i| i.right = true), 16.0);
        assert!(state.player.rect.pos.x > start.x);
    }

    #[test]
    fn test_host_pause_holds_notification() {
        let mut state = quiet();
        state.pause.host = true;
        state.pause.notify(3000.0);
        tick(&mut state, &InputState::default(), 100.0);
        assert_eq!(state.pause.notification_ms, 3000.0);
    }

    #[test]
    fn test_kill_pays_out() {
        let mut state = quiet();
        let id = state.next_entity_id();
        let profile = state.settings.wolf.clone();
        state
            .enemies
            .push(Enemy::new(id, EnemyKind::Wolf, Vec2::new(100.0, 100.0), &profile));
        let mut events = FrameEvents::default();
        assert!(!damage_enemy(&mut state, EnemySlot::Crowd(0), 1, &mut events));
        assert!(damage_enemy(&mut state, EnemySlot::Crowd(0), 1, &mut events));
        assert_eq!(state.score, 100);
        assert_eq!(state.kills, 1);
        let coins = state
            .pickups
            .iter()
            .filter(|p| matches!(p.kind, PickupKind::Coin { .. }))
            .count();
        assert!((2..=3).contains(&coins));
        assert!(!damage_enemy(&mut state, EnemySlot::Crowd(0), 1, &mut events));
        assert!(!damage_enemy(&mut state, EnemySlot::Boss, 1, &mut events));
    }

    #[test]
    fn test_boss_death_is_counted_once() {
        let mut state = quiet();
        let id = state.next_entity_id();
        let mut boss = Enemy::new(id, EnemyKind::Boss, Vec2::new(100.0, 100.0), &state.settings.boss);
        boss.health = 1;
        state.boss = Some(boss);
        let mut events = FrameEvents::default();
        assert!(damage_enemy(&mut state, EnemySlot::Boss, 1, &mut events));
        assert_eq!(state.kills, 5);

        let mut defeated = 0;
        for _ in 0..80 {
            let events = tick(&mut state, &InputState::default(), 16.0);
            defeated += events.count(|e| matches!(e, FrameEvent::BossDefeated { .. }));
        }
        assert_eq!(defeated, 1);
        assert!(state.boss.is_none());
        assert_eq!(state.waves.bosses_defeated, 1);
    }

    #[test]
    fn test_broken_crate_is_collected_on_touch() {
        let mut state = quiet();
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            rect: Rect::from_center(state.player.center(), Vec2::splat(40.0)),
            kind: PickupKind::Crate {
                powerup: PowerupKind::Piercing,
                broken: true,
            },
            active: true,
        });
        let events = tick(&mut state, &InputState::default(), 16.0);
        assert_eq!(state.player.powerups.piercing, 1);
        assert_eq!(state.score, 50);
        assert!(state.pickups.is_empty());
        assert_eq!(
            events.count(|e| *e == FrameEvent::PowerupCollected { kind: PowerupKind::Piercing }),
            1
        );
    }

    #[test]
    fn test_first_wave_starts_after_preparation() {
        let mut state = GameState::bare(Settings::default(), 3);
        let mut started = 0;
        for _ in 0..101 {
            let events = tick(&mut state, &InputState::default(), 100.0);
            started += events.count(|e| matches!(e, FrameEvent::WaveStarted { number: 1, count: 5 }));
        }
        assert_eq!(started, 1);
        assert_eq!(state.waves.phase, WavePhase::Spawning);
        assert!(state.pause.is_paused());
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99);
        let mut b = GameState::new(99);
        let inputs = [
            press(|i| i.right = true),
            press(|i| (i.shoot, i.up) = (true, true)),
            press(|i| i.dash = true),
            InputState::default(),
        ];
        for step in 0..2000 {
            let input = inputs[step % inputs.len()];
            let ea = tick(&mut a, &input, 16.0);
            let eb = tick(&mut b, &input, 16.0);
            assert_eq!(ea, eb);
        }
        assert_eq!(a.player.rect, b.player.rect);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.score, b.score);
    }
}
