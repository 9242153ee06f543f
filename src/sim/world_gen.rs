//! Procedural outdoor world: lakes, trees, rocks, crates and house spots
//!
//! Every placement is rejection sampled with a bounded number of attempts; a
//! placement that never finds a valid spot is skipped.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{Mover, blocked};
use super::geom::{Rect, overlaps};
use super::state::{EntityId, GameState, Obstacle, ObstacleKind, Pickup, PickupKind, PowerupKind};

/// Rock footprints: (probability, min side, max side)
const ROCK_SIZES: [(f32, f32, f32); 3] = [(0.6, 8.0, 15.0), (0.3, 15.0, 25.0), (0.1, 25.0, 35.0)];
const LAKE_SEGMENT_SIZE: (f32, f32) = (80.0, 150.0);
/// Rocks keep this far from tree origins
const ROCK_TREE_SPACING: f32 = 30.0;
/// Houses keep this far from tree centres
const HOUSE_TREE_SPACING: f32 = 100.0;
const HOUSE_PLAYER_SPACING: f32 = 200.0;
/// Border kept free around sampled positions
const EDGE_MARGIN: f32 = 50.0;

/// Sample until `f` accepts a candidate or the attempts run out
fn sample<T>(rng: &mut Pcg32, attempts: usize, mut f: impl FnMut(&mut Pcg32) -> Option<T>) -> Option<T> {
    (0..attempts).find_map(|_| f(rng))
}

/// Uniform in `lo..hi`, or `lo` when the world leaves no room
fn coord(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

fn lakes(obstacles: &[Obstacle]) -> impl Iterator<Item = &Obstacle> {
    obstacles
        .iter()
        .filter(|o| matches!(o.kind, ObstacleKind::Lake { .. }))
}

fn in_lake(rect: &Rect, obstacles: &[Obstacle]) -> bool {
    lakes(obstacles).any(|l| l.collides(rect))
}

/// Generate the whole outdoor world and make sure the player stands clear
pub fn populate(state: &mut GameState) {
    generate_lakes(state);
    let center = state.world_bounds().center();
    for _ in 0..state.settings.obstacles.tree_count {
        let min_distance = state.settings.obstacles.tree_min_center_distance;
        plant_tree(state, center, min_distance);
    }
    scatter_rocks(state);
    spawn_crates(state, state.settings.obstacles.crate_count);
    free_player(state);
    log::info!(
        "World generated: {} obstacles, {} crates",
        state.obstacles.len(),
        state.pickups.len()
    );
}

fn generate_lakes(state: &mut GameState) {
    let settings = state.settings.obstacles.clone();
    let world = state.world_bounds();
    let center = world.center();
    for _ in 0..settings.lake_count {
        let start = sample(&mut state.rng, 30, |rng| {
            let p = Vec2::new(
                coord(rng, EDGE_MARGIN, world.width - 300.0),
                coord(rng, EDGE_MARGIN, world.height - 300.0),
            );
            (p.distance(center) > settings.lake_min_center_distance).then_some(p)
        });
        let Some(mut cursor) = start else {
            continue;
        };

        let (lo, hi) = settings.lake_segments;
        let count = state.rng.random_range(lo..=hi);
        let mut segments = Vec::with_capacity(count);
        for i in 0..count {
            let rng = &mut state.rng;
            let size = Vec2::new(
                rng.random_range(LAKE_SEGMENT_SIZE.0..LAKE_SEGMENT_SIZE.1),
                rng.random_range(LAKE_SEGMENT_SIZE.0..LAKE_SEGMENT_SIZE.1),
            );
            segments.push(Rect { pos: cursor, size });
            if i + 1 < count {
                cursor += match rng.random_range(0..3) {
                    0 => Vec2::new(size.x * rng.random_range(0.3..0.7), rng.random_range(-30.0..30.0)),
                    1 => Vec2::new(rng.random_range(-30.0..30.0), size.y * rng.random_range(0.3..0.7)),
                    _ => size * Vec2::new(rng.random_range(0.2..0.5), rng.random_range(0.2..0.5)),
                };
            }
        }

        let bounds = bounding_box(&segments);
        let clashes = lakes(&state.obstacles).any(|l| overlaps(&bounds, &l.rect.expanded(settings.lake_margin)));
        if !clashes {
            let id = state.next_entity_id();
            state.obstacles.push(Obstacle {
                id,
                rect: bounds,
                kind: ObstacleKind::Lake { segments },
                active: true,
            });
        }
    }
}

fn bounding_box(rects: &[Rect]) -> Rect {
    let min = rects.iter().fold(Vec2::splat(f32::MAX), |m, r| m.min(r.pos));
    let max = rects.iter().fold(Vec2::splat(f32::MIN), |m, r| m.max(r.pos + r.size));
    Rect { pos: min, size: max - min }
}

/// Plant one tree at least `min_distance` from `away_from`, outside lakes
fn plant_tree(state: &mut GameState, away_from: Vec2, min_distance: f32) -> Option<EntityId> {
    let world = state.world_bounds();
    let size = Vec2::new(state.settings.obstacles.tree_width, state.settings.obstacles.tree_height);
    let obstacles = &state.obstacles;
    let pos = sample(&mut state.rng, 50, |rng| {
        let p = Vec2::new(
            coord(rng, EDGE_MARGIN, world.width - EDGE_MARGIN),
            coord(rng, EDGE_MARGIN, world.height - EDGE_MARGIN),
        );
        let rect = Rect { pos: p, size };
        (p.distance(away_from) > min_distance && !in_lake(&rect, obstacles)).then_some(rect)
    })?;
    let id = state.next_entity_id();
    let tree = Obstacle::tree(id, pos, state.settings.obstacles.tree_health, &mut state.rng);
    state.obstacles.push(tree);
    Some(id)
}

/// Replace a felled tree somewhere away from the player
pub fn regrow_tree(state: &mut GameState) {
    let player = state.player.rect.pos;
    let min_distance = state.settings.obstacles.tree_regrow_distance;
    if plant_tree(state, player, min_distance).is_none() {
        log::debug!("No room to regrow a tree");
    }
}

fn scatter_rocks(state: &mut GameState) {
    let world = state.world_bounds();
    let center = world.center();
    let keep_clear = state.settings.obstacles.tree_min_center_distance;
    for _ in 0..state.settings.obstacles.rock_count {
        let roll: f32 = state.rng.random();
        let mut acc = 0.0;
        let (_, lo, hi) = ROCK_SIZES
            .iter()
            .copied()
            .find(|&(p, _, _)| {
                acc += p;
                roll < acc
            })
            .unwrap_or(ROCK_SIZES[0]);
        let obstacles = &state.obstacles;
        let rect = sample(&mut state.rng, 30, |rng| {
            let p = Vec2::new(
                coord(rng, EDGE_MARGIN, world.width - EDGE_MARGIN),
                coord(rng, EDGE_MARGIN, world.height - EDGE_MARGIN),
            );
            let rect = Rect {
                pos: p,
                size: Vec2::new(rng.random_range(lo..hi), rng.random_range(lo..hi)),
            };
            let near_tree = obstacles
                .iter()
                .any(|o| o.is_tree() && o.rect.pos.distance(p) < ROCK_TREE_SPACING);
            let ok = p.distance(center) > keep_clear && !in_lake(&rect, obstacles) && !near_tree;
            ok.then_some(rect)
        });
        if let Some(rect) = rect {
            let id = state.next_entity_id();
            state.obstacles.push(Obstacle {
                id,
                rect,
                kind: ObstacleKind::Rock,
                active: true,
            });
        }
    }
}

/// Drop up to `count` crates, each holding a random powerup
pub fn spawn_crates(state: &mut GameState, count: usize) {
    let world = state.world_bounds();
    let s = &state.settings.obstacles;
    let (size, margin, spacing) = (Vec2::splat(s.crate_size), s.crate_edge_margin, s.crate_min_spacing);
    let kinds = state.settings.powerups.crate_kinds.clone();
    for _ in 0..count {
        let obstacles = &state.obstacles;
        let pickups = &state.pickups;
        let rect = sample(&mut state.rng, 100, |rng| {
            let rect = Rect {
                pos: world.random_inside(rng, size, margin),
                size,
            };
            let crowded = pickups.iter().any(|p| {
                matches!(p.kind, PickupKind::Crate { .. }) && p.rect.center().distance(rect.center()) < spacing
            });
            (!crowded && !in_lake(&rect, obstacles)).then_some(rect)
        });
        let Some(rect) = rect else {
            continue;
        };
        let powerup = kinds
            .get(state.rng.random_range(0..kinds.len().max(1)))
            .copied()
            .unwrap_or(PowerupKind::FireRate);
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            rect,
            kind: PickupKind::Crate { powerup, broken: false },
            active: true,
        });
    }
}

/// Nudge the player out of any obstacle it was placed on, searching outward rings
fn free_player(state: &mut GameState) {
    let start = state.player.rect;
    if !blocked(&start, &state.obstacles, Mover::Walker) {
        return;
    }
    for ring in 1..=20 {
        let radius = ring as f32 * 25.0;
        for step in 0..16 {
            let angle = step as f32 / 16.0 * std::f32::consts::TAU;
            let candidate = state
                .world_bounds()
                .clamp(&start.translated(crate::heading(angle) * radius));
            if !blocked(&candidate, &state.obstacles, Mover::Walker) {
                log::debug!("Moved player out of an obstacle to {:?}", candidate.pos);
                state.player.rect = candidate;
                return;
            }
        }
    }
    log::warn!("Player start position is blocked and no free spot was found");
}

/// A free spot for the house: outside lakes, away from trees and the player
pub fn house_spot(state: &mut GameState) -> Option<Rect> {
    let world = state.world_bounds();
    let size = Vec2::new(state.settings.interior.house_width, state.settings.interior.house_height);
    let player = state.player.rect.pos;
    let obstacles = &state.obstacles;
    sample(&mut state.rng, 100, |rng| {
        let pos = Vec2::new(
            coord(rng, 200.0, world.width - 200.0 - size.x),
            coord(rng, 200.0, world.height - 200.0 - size.y),
        );
        let rect = Rect { pos, size };
        let center = rect.center();
        let near_tree = obstacles
            .iter()
            .any(|o| o.is_tree() && o.rect.center().distance(center) < HOUSE_TREE_SPACING);
        let ok = !in_lake(&rect, obstacles)
            && !blocked(&rect, obstacles, Mover::Walker)
            && !near_tree
            && center.distance(player) >= HOUSE_PLAYER_SPACING;
        ok.then_some(rect)
    })
}
