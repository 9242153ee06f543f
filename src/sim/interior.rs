//! Inside the house: campfire healing and the dog shop

use glam::Vec2;

use super::events::{FrameEvent, FrameEvents};
use super::geom::{Rect, WorldBounds};
use super::state::{DogShop, Facing, GameState, Interior, ParticleKind, Pet};
use super::tick::InputState;
use crate::settings::{InteriorSettings, PetSettings};

impl Interior {
    /// Lay out the indoor map centred in the world
    pub fn new(world: &WorldBounds, settings: &InteriorSettings, pets: &PetSettings, dog_price: u32) -> Self {
        let size = Vec2::new(settings.width, settings.height);
        let bounds = Rect::from_center(world.center(), size);
        let exit = Rect::new(
            bounds.pos.x + (settings.width - settings.exit_width) / 2.0,
            bounds.bottom() - settings.exit_height,
            settings.exit_width,
            settings.exit_height,
        );
        let campfire = Rect::from_center(bounds.center(), Vec2::splat(settings.campfire_size));
        // Dog waits above the campfire
        let shop_center = bounds.center() - Vec2::new(0.0, 100.0 - pets.size / 2.0);
        Self {
            bounds,
            exit,
            campfire,
            heal_ms: 0.0,
            shop: DogShop {
                rect: Rect::from_center(shop_center, Vec2::splat(pets.size)),
                price: dog_price,
                sold: false,
            },
        }
    }

    /// Where the player appears on entering
    pub fn spawn_point(&self, settings: &InteriorSettings, player_size: Vec2) -> Vec2 {
        Vec2::new(
            self.bounds.center().x - player_size.x / 2.0,
            self.bounds.pos.y + settings.spawn_offset_y,
        )
    }
}

/// Price of the next dog given how many were already bought
pub fn dog_price(settings: &PetSettings, purchased: u32) -> u32 {
    settings.base_price + settings.price_step * purchased
}

/// Campfire healing and edge-triggered dog purchases
pub fn update_interior(state: &mut GameState, input: &InputState, dt: f32, events: &mut FrameEvents) {
    let Some(interior) = state.interior.as_mut() else {
        return;
    };
    let s = &state.settings.interior;
    let player = &mut state.player;

    let near_fire = player.center().distance(interior.campfire.center()) <= s.campfire_heal_distance;
    let mut healed = false;
    if near_fire && player.lives < player.max_lives {
        interior.heal_ms += dt;
        if interior.heal_ms >= s.campfire_heal_ms {
            interior.heal_ms = 0.0;
            player.lives = (player.lives + 1).min(player.max_lives);
            healed = true;
        }
    } else {
        interior.heal_ms = 0.0;
    }

    let pressed = input.interact && !state.interact_held;
    let near_shop = !interior.shop.sold
        && player.center().distance(interior.shop.rect.center()) < state.settings.pets.shop_reach;
    let mut bought = None;
    if pressed && near_shop && state.coins >= interior.shop.price {
        state.coins -= interior.shop.price;
        interior.shop.sold = true;
        bought = Some(interior.shop.price);
    }

    if healed {
        let lives = state.player.lives;
        log::debug!("Campfire healed the player to {lives}");
        events.push(FrameEvent::PlayerHealed { lives });
        let center = state.player.center();
        state.burst(center, ParticleKind::Ember, 5);
    }
    if let Some(price) = bought {
        adopt_pet(state);
        log::info!("Dog bought for {price} coins ({} owned)", state.pets.len());
        events.push(FrameEvent::PetPurchased { price });
    }
}

/// New pet next to the player's outdoor position
fn adopt_pet(state: &mut GameState) {
    let outdoor = state
        .snapshot
        .as_ref()
        .map_or(state.player.rect.pos, |s| s.player_pos);
    let size = state.settings.pets.size;
    let pos = outdoor + Vec2::new(state.player.rect.size.x + 10.0, 0.0);
    let id = state.next_entity_id();
    state.pets.push(Pet {
        id,
        rect: Rect {
            pos,
            size: Vec2::splat(size),
        },
        facing: Facing::Right,
        bite_cooldown_ms: 0.0,
        facing_cooldown_ms: 0.0,
        target: None,
    });
    state.dogs_purchased += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn inside() -> GameState {
        let mut state = GameState::bare(Settings::default(), 4);
        let world = state.world_bounds();
        let price = dog_price(&state.settings.pets, 0);
        state.interior = Some(Interior::new(&world, &state.settings.interior, &state.settings.pets, price));
        state
    }

    #[test]
    fn test_layout() {
        let state = inside();
        let interior = state.interior.as_ref().unwrap();
        assert_eq!(interior.bounds, Rect::new(1000.0, 1000.0, 400.0, 400.0));
        assert_eq!(interior.exit, Rect::new(1160.0, 1340.0, 80.0, 60.0));
        assert_eq!(interior.campfire.center(), Vec2::new(1200.0, 1200.0));
        let spawn = interior.spawn_point(&state.settings.interior, Vec2::new(40.0, 50.0));
        assert_eq!(spawn, Vec2::new(1180.0, 1080.0));
    }

    #[test]
    fn test_campfire_heals_one_life_per_interval() {
        let mut state = inside();
        state.player.lives = 1;
        state.player.rect.pos = Vec2::new(1180.0, 1175.0);
        let mut events = FrameEvents::default();
        let input = InputState::default();
        for _ in 0..124 {
            update_interior(&mut state, &input, 16.0, &mut events);
        }
        assert_eq!(state.player.lives, 1);
        update_interior(&mut state, &input, 16.0, &mut events);
        assert_eq!(state.player.lives, 2);
        assert_eq!(events.count(|e| matches!(e, FrameEvent::PlayerHealed { lives: 2 })), 1);
    }

    #[test]
    fn test_no_healing_at_full_lives() {
        let mut state = inside();
        state.player.rect.pos = Vec2::new(1180.0, 1175.0);
        let mut events = FrameEvents::default();
        for _ in 0..300 {
            update_interior(&mut state, &InputState::default(), 16.0, &mut events);
        }
        assert!(events.is_empty());
    }

    #[test]
    fn test_dog_purchase_is_edge_triggered() {
        let mut state = inside();
        state.coins = 1000;
        let shop = state.interior.as_ref().unwrap().shop.rect;
        state.player.rect = Rect::from_center(shop.center() + Vec2::new(0.0, 30.0), state.player.rect.size);
        let held = InputState {
            interact: true,
            ..Default::default()
        };
        let mut events = FrameEvents::default();
        update_interior(&mut state, &held, 16.0, &mut events);
        state.interact_held = true;
        update_interior(&mut state, &held, 16.0, &mut events);
        assert_eq!(state.coins, 700);
        assert_eq!(state.pets.len(), 1);
        assert_eq!(state.dogs_purchased, 1);
        assert_eq!(dog_price(&state.settings.pets, state.dogs_purchased), 500);
    }

    #[test]
    fn test_dog_needs_enough_coins() {
        let mut state = inside();
        state.coins = 299;
        let shop = state.interior.as_ref().unwrap().shop.rect;
        state.player.rect = Rect::from_center(shop.center(), state.player.rect.size);
        let press = InputState {
            interact: true,
            ..Default::default()
        };
        let mut events = FrameEvents::default();
        update_interior(&mut state, &press, 16.0, &mut events);
        assert!(state.pets.is_empty());
        assert_eq!(state.coins, 299);
    }
}
