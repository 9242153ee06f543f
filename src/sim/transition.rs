//! Moving between the outdoor world and the house interior
//!
//! Entering moves every live outdoor collection into a [`WorldSnapshot`] and
//! leaves the outdoor world empty; exiting moves them back verbatim. The two
//! maps never share live entities.

use std::mem;

use glam::Vec2;

use super::events::{FrameEvent, FrameEvents};
use super::geom::overlaps;
use super::interior::dog_price;
use super::state::{Enemy, GameState, House, Interior, Particle, Pickup, Projectile};
use super::world_gen::house_spot;

/// The outdoor world set aside while the player is indoors
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub enemies: Vec<Enemy>,
    pub boss: Option<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub particles: Vec<Particle>,
    pub camera: Vec2,
    /// Player position at the moment of entry
    pub player_pos: Vec2,
}

/// Swap the outdoor world out and place the player inside
pub fn enter_house(state: &mut GameState, events: &mut FrameEvents) {
    if state.is_indoors() {
        return;
    }
    // Only live entities go into the snapshot
    state.compact();
    let snapshot = WorldSnapshot {
        enemies: mem::take(&mut state.enemies),
        boss: state.boss.take(),
        projectiles: mem::take(&mut state.projectiles),
        pickups: mem::take(&mut state.pickups),
        particles: mem::take(&mut state.particles),
        camera: state.camera.offset,
        player_pos: state.player.rect.pos,
    };
    log::info!(
        "Entering house; setting aside {} enemies, {} pickups{}",
        snapshot.enemies.len(),
        snapshot.pickups.len(),
        if snapshot.boss.is_some() { " and the boss" } else { "" }
    );
    state.snapshot = Some(snapshot);

    let world = state.world_bounds();
    let price = dog_price(&state.settings.pets, state.dogs_purchased);
    let interior = Interior::new(&world, &state.settings.interior, &state.settings.pets, price);
    state.player.rect.pos = interior.spawn_point(&state.settings.interior, state.player.rect.size);
    state.camera.snap(state.player.center(), &state.settings.world);
    state.interior = Some(interior);
    events.push(FrameEvent::EnteredHouse);
}

/// Restore the outdoor world exactly as it was left
pub fn exit_house(state: &mut GameState, events: &mut FrameEvents) {
    let Some(snapshot) = state.snapshot.take() else {
        return;
    };
    state.interior = None;
    state.enemies = snapshot.enemies;
    state.boss = snapshot.boss;
    state.projectiles = snapshot.projectiles;
    state.pickups = snapshot.pickups;
    state.particles = snapshot.particles;
    state.camera.offset = snapshot.camera;
    state.player.rect.pos = snapshot.player_pos;
    if let Some(house) = state.house.as_mut() {
        house.fading_ms = Some(0.0);
    }
    state.kills_since_house = 0;
    log::info!("Left the house");
    events.push(FrameEvent::ExitedHouse);
}

/// House lifecycle: appear after enough kills, fade once used, enter and exit on contact
pub fn update(state: &mut GameState, dt: f32, events: &mut FrameEvents) {
    if let Some(interior) = state.interior.as_ref() {
        if overlaps(&state.player.rect, &interior.exit) {
            exit_house(state, events);
        }
        return;
    }

    let fade_ms = state.settings.interior.house_fade_ms;
    let faded = match state.house.as_mut() {
        Some(House {
            fading_ms: Some(elapsed),
            ..
        }) => {
            *elapsed += dt;
            *elapsed >= fade_ms
        }
        _ => false,
    };
    if faded {
        state.house = None;
    }

    match state.house {
        Some(house) if house.can_enter() && overlaps(&state.player.rect, &house.rect) => {
            enter_house(state, events);
        }
        Some(_) => {}
        None if state.kills_since_house >= state.settings.interior.kills_per_house => {
            if let Some(rect) = house_spot(state) {
                log::info!("House appeared at {:?}", rect.pos);
                state.house = Some(House { rect, fading_ms: None });
                events.push(FrameEvent::HouseAppeared);
            }
        }
        None => {}
    }
}
