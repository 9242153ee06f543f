//! Bullets: flight, lifetime and hit resolution
//!
//! Each bullet is resolved against trees first, then enemies (crowd in
//! collection order, then the boss), then crates. A bullet with piercing level
//! N may damage N + 1 distinct enemies before it is spent; trees and crates
//! always stop it.

use glam::Vec2;

use super::collision::tree_hit;
use super::events::{FrameEvent, FrameEvents};
use super::geom::{Rect, WorldBounds, overlaps};
use super::state::{
    EntityId, GameState, ParticleKind, PickupKind, Player, Projectile, ProjectileOwner,
};
use super::tick::{EnemySlot, damage_enemy, fell_tree};
use crate::frames;
use crate::settings::ProjectileSettings;

impl Projectile {
    /// A bullet fired by the player from its centre, with powerups applied
    pub fn from_player(id: EntityId, player: &Player, direction: Vec2, settings: &ProjectileSettings) -> Self {
        let p = player.powerups;
        let size = Vec2::splat(settings.size * p.bullet_size);
        Self {
            id,
            rect: Rect::from_center(player.center(), size),
            direction: direction.normalize_or(Vec2::Y),
            speed: settings.speed * p.bullet_speed,
            owner: ProjectileOwner::Player,
            lifetime_ms: settings.lifetime_ms,
            piercing: p.piercing,
            hit_enemies: Vec::new(),
            active: true,
        }
    }

    /// Move along the heading; expire on lifetime or leaving the world
    pub fn advance(&mut self, dt: f32, bounds: &WorldBounds) {
        if !self.active {
            return;
        }
        self.rect = self.rect.translated(self.direction * self.speed * frames(dt));
        self.lifetime_ms -= dt;
        if self.lifetime_ms <= 0.0 || !bounds.contains(&self.rect) {
            self.active = false;
        }
    }

    /// How many distinct enemies this bullet may damage
    pub fn hit_budget(&self) -> usize {
        self.piercing as usize + 1
    }

    pub fn can_hit_enemy(&self, id: EntityId) -> bool {
        self.active && !self.hit_enemies.contains(&id) && self.hit_enemies.len() < self.hit_budget()
    }

    /// Record a hit; the bullet is spent once its budget is used up
    pub fn mark_enemy_hit(&mut self, id: EntityId) {
        if !self.hit_enemies.contains(&id) {
            self.hit_enemies.push(id);
        }
        if self.hit_enemies.len() >= self.hit_budget() {
            self.active = false;
        }
    }
}

/// Advance every bullet and resolve what it touches
pub fn update_projectiles(state: &mut GameState, dt: f32, events: &mut FrameEvents) {
    let bounds = state.world_bounds();
    for pi in 0..state.projectiles.len() {
        state.projectiles[pi].advance(dt, &bounds);
        if !state.projectiles[pi].active {
            continue;
        }
        let rect = state.projectiles[pi].rect;

        if let Some(oi) = tree_hit(&rect, &state.obstacles) {
            state.projectiles[pi].active = false;
            state.burst(rect.center(), ParticleKind::Leaf, 3);
            if state.obstacles[oi].damage_tree() {
                fell_tree(state, oi, events);
            }
            continue;
        }

        match state.projectiles[pi].owner {
            ProjectileOwner::Player => resolve_enemy_hits(state, pi, events),
            ProjectileOwner::Enemy => {
                if overlaps(&rect, &state.player.rect) {
                    state.projectiles[pi].active = false;
                    state.damage_player(events);
                }
            }
        }

        if state.projectiles[pi].active {
            resolve_crate_hit(state, pi, events);
        }
    }
}

/// Damage enemies the bullet overlaps until its piercing budget runs out
fn resolve_enemy_hits(state: &mut GameState, pi: usize, events: &mut FrameEvents) {
    let rect = state.projectiles[pi].rect;
    for ei in 0..state.enemies.len() {
        if !state.projectiles[pi].active {
            return;
        }
        let enemy = &state.enemies[ei];
        if !enemy.is_alive() || !overlaps(&rect, &enemy.rect) {
            continue;
        }
        let id = enemy.id;
        if state.projectiles[pi].can_hit_enemy(id) {
            state.projectiles[pi].mark_enemy_hit(id);
            damage_enemy(state, EnemySlot::Crowd(ei), 1, events);
        }
    }
    let boss_hit = state
        .boss
        .as_ref()
        .filter(|b| b.is_alive() && overlaps(&rect, &b.rect))
        .map(|b| b.id);
    if let Some(id) = boss_hit.filter(|&id| state.projectiles[pi].can_hit_enemy(id)) {
        state.projectiles[pi].mark_enemy_hit(id);
        damage_enemy(state, EnemySlot::Boss, 1, events);
    }
}

/// Break the first unbroken crate the bullet touches
fn resolve_crate_hit(state: &mut GameState, pi: usize, events: &mut FrameEvents) {
    let rect = state.projectiles[pi].rect;
    let hit = state.pickups.iter_mut().find(|p| {
        p.active && matches!(p.kind, PickupKind::Crate { broken: false, .. }) && overlaps(&p.rect, &rect)
    });
    let Some(crate_box) = hit else {
        return;
    };
    let PickupKind::Crate { powerup, broken } = &mut crate_box.kind else {
        return;
    };
    *broken = true;
    let kind = *powerup;
    let center = crate_box.rect.center();
    state.projectiles[pi].active = false;
    state.burst(center, ParticleKind::Wood, 8);
    log::debug!("Crate broken, revealing {kind:?}");
    events.push(FrameEvent::CrateBroken { kind });
}
