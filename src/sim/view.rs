//! Drawable snapshot for the host renderer
//!
//! The core does no drawing. [`GameState::drawables`] lists what is on screen,
//! back to front, in world coordinates; subtract `camera.offset` to get screen
//! space.

use glam::Vec2;
use serde::Serialize;

use super::geom::Rect;
use super::state::{
    EnemyAi, EnemyKind, Facing, GameState, ObstacleKind, ParticleKind, PickupKind, PlayerFacing, PowerupKind,
};

/// Extra room around the viewport before things are culled
const CULL_MARGIN: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SpriteKind {
    Player(PlayerFacing),
    Wolf,
    Minion,
    Boss,
    Pet,
    Bullet,
    Tree { chopped: bool },
    Lake,
    Rock,
    Coin,
    Crate,
    /// Contents of a broken crate, waiting to be picked up
    Powerup(PowerupKind),
    Particle(ParticleKind),
    House,
    Floor,
    Campfire,
    Exit,
    DogForSale,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drawable {
    pub sprite: SpriteKind,
    pub rect: Rect,
    pub facing: Facing,
    /// Radians, around the rect centre
    pub rotation: f32,
    pub alpha: f32,
    /// Hit flash
    pub flash: bool,
}

impl Drawable {
    fn new(sprite: SpriteKind, rect: Rect) -> Self {
        Self {
            sprite,
            rect,
            facing: Facing::Right,
            rotation: 0.0,
            alpha: 1.0,
            flash: false,
        }
    }
}

impl GameState {
    /// Everything inside (or near) the viewport, back to front
    pub fn drawables(&self) -> Vec<Drawable> {
        let world = &self.settings.world;
        let view = Rect {
            pos: self.camera.offset,
            size: Vec2::new(world.viewport_width, world.viewport_height),
        }
        .expanded(CULL_MARGIN);

        let mut out = Vec::new();
        match &self.interior {
            Some(interior) => {
                out.push(Drawable::new(SpriteKind::Floor, interior.bounds));
                out.push(Drawable::new(SpriteKind::Exit, interior.exit));
                out.push(Drawable::new(SpriteKind::Campfire, interior.campfire));
                if !interior.shop.sold {
                    out.push(Drawable::new(SpriteKind::DogForSale, interior.shop.rect));
                }
            }
            None => self.outdoor_ground(&mut out),
        }

        for pickup in &self.pickups {
            let sprite = match pickup.kind {
                PickupKind::Coin { .. } => SpriteKind::Coin,
                PickupKind::Crate { broken: false, .. } => SpriteKind::Crate,
                PickupKind::Crate { powerup, broken: true } => SpriteKind::Powerup(powerup),
            };
            let mut d = Drawable::new(sprite, pickup.rect);
            if let PickupKind::Coin { age_ms, .. } = pickup.kind {
                let left = self.settings.pickups.coin_lifetime_ms - age_ms;
                d.alpha = (left / 2000.0).clamp(0.0, 1.0);
            }
            out.push(d);
        }

        if let Some(house) = &self.house {
            if self.interior.is_none() {
                let mut d = Drawable::new(SpriteKind::House, house.rect);
                if let Some(fade) = house.fading_ms {
                    d.alpha = 1.0 - (fade / self.settings.interior.house_fade_ms).clamp(0.0, 1.0);
                }
                out.push(d);
            }
        }

        for enemy in self.enemies.iter().chain(&self.boss) {
            let sprite = match enemy.kind {
                EnemyKind::Wolf => SpriteKind::Wolf,
                EnemyKind::Minion => SpriteKind::Minion,
                EnemyKind::Boss => SpriteKind::Boss,
            };
            let mut d = Drawable::new(sprite, enemy.rect);
            d.facing = enemy.facing;
            d.flash = enemy.hit_flash_ms > 0.0;
            if let EnemyAi::Dying { rotation, .. } = enemy.ai {
                d.rotation = rotation;
                let death_ms = self.settings.enemy(enemy.kind).death_ms;
                d.alpha = 1.0 - enemy.death_progress(death_ms).unwrap_or(0.0);
            }
            out.push(d);
        }

        if self.interior.is_none() {
            for pet in &self.pets {
                let mut d = Drawable::new(SpriteKind::Pet, pet.rect);
                d.facing = pet.facing;
                out.push(d);
            }
        }

        let player = &self.player;
        let mut d = Drawable::new(SpriteKind::Player(player.facing), player.rect);
        d.rotation = player.dash_rotation(&self.settings.player);
        // Blink while invulnerable after a hit
        if player.invulnerable_ms > 0.0 && (player.invulnerable_ms / 100.0) as u32 % 2 == 1 {
            d.alpha = 0.4;
        }
        out.push(d);

        out.extend(
            self.projectiles
                .iter()
                .map(|p| Drawable::new(SpriteKind::Bullet, p.rect)),
        );

        // Trees draw over whatever walks behind their trunks
        if self.interior.is_none() {
            let break_ms = self.settings.obstacles.tree_break_ms;
            for tree in self.obstacles.iter().filter(|o| o.active) {
                let ObstacleKind::Tree(t) = &tree.kind else {
                    continue;
                };
                let mut d = Drawable::new(SpriteKind::Tree { chopped: t.chopped }, tree.rect);
                d.rotation = tree.fall_rotation(break_ms);
                if let Some(elapsed) = t.breaking_ms {
                    d.alpha = 1.0 - (elapsed / break_ms).clamp(0.0, 1.0);
                }
                out.push(d);
            }
        }

        for particle in &self.particles {
            let mut d = Drawable::new(
                SpriteKind::Particle(particle.kind),
                Rect::from_center(particle.pos, Vec2::splat(particle.size)),
            );
            d.alpha = particle.alpha();
            out.push(d);
        }

        out.retain(|d| d.rect.overlaps(&view));
        out
    }

    fn outdoor_ground(&self, out: &mut Vec<Drawable>) {
        for obstacle in self.obstacles.iter().filter(|o| o.active) {
            match &obstacle.kind {
                ObstacleKind::Lake { segments } => {
                    out.extend(segments.iter().map(|s| Drawable::new(SpriteKind::Lake, *s)));
                }
                ObstacleKind::Rock => out.push(Drawable::new(SpriteKind::Rock, obstacle.rect)),
                ObstacleKind::Tree(_) => {}
            }
        }
    }
}
