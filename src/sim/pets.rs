//! Dogs bought in the house: follow the player, bite wolves that come close

use glam::Vec2;

use super::collision::{Mover, commit_or_revert};
use super::events::FrameEvents;
use super::state::{EntityId, Facing, GameState};
use super::tick::{EnemySlot, damage_enemy};
use crate::frames;

/// Nearest living crowd enemy to `from` that is inside the guard radius of the player
fn pick_target(state: &GameState, from: Vec2) -> Option<(usize, EntityId)> {
    let guard = state.settings.pets.guard_radius;
    let player = state.player.center();
    state
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && e.rect.center().distance(player) <= guard)
        .min_by(|(_, a), (_, b)| {
            let da = a.rect.center().distance(from);
            let db = b.rect.center().distance(from);
            da.total_cmp(&db)
        })
        .map(|(i, e)| (i, e.id))
}

pub fn update_pets(state: &mut GameState, dt: f32, events: &mut FrameEvents) {
    let f = frames(dt);
    for pi in 0..state.pets.len() {
        let s = &state.settings.pets;
        let (follow_speed, follow_distance, attack_speed) = (s.follow_speed, s.follow_distance, s.attack_speed);
        let (bite_range, bite_cooldown) = (s.bite_range, s.bite_cooldown_ms);
        let facing_cooldown = s.facing_cooldown_ms;

        let pet = &mut state.pets[pi];
        pet.bite_cooldown_ms = (pet.bite_cooldown_ms - dt).max(0.0);
        pet.facing_cooldown_ms = (pet.facing_cooldown_ms - dt).max(0.0);
        let from = pet.rect.center();

        let target = pick_target(state, from);
        state.pets[pi].target = target.map(|(_, id)| id);

        let step = match target {
            Some((ei, _)) => {
                let to_enemy = state.enemies[ei].rect.center() - from;
                let distance = to_enemy.length();
                if distance <= bite_range {
                    if state.pets[pi].bite_cooldown_ms <= 0.0 {
                        state.pets[pi].bite_cooldown_ms = bite_cooldown;
                        log::debug!("Pet {:?} bit enemy {:?}", state.pets[pi].id, state.enemies[ei].id);
                        damage_enemy(state, EnemySlot::Crowd(ei), 1, events);
                    }
                    Vec2::ZERO
                } else {
                    to_enemy / distance * attack_speed * f
                }
            }
            None => {
                let to_player = state.player.center() - from;
                let distance = to_player.length();
                if distance > follow_distance {
                    to_player / distance * follow_speed * f
                } else {
                    Vec2::ZERO
                }
            }
        };

        if step == Vec2::ZERO {
            continue;
        }
        let bounds = state.world_bounds();
        let moved = commit_or_revert(state.pets[pi].rect, step, &state.obstacles, Mover::Walker);
        let pet = &mut state.pets[pi];
        pet.rect = bounds.clamp(&moved.rect);
        let wanted = if step.x > 0.0 { Facing::Right } else { Facing::Left };
        if step.x.abs() > 0.1 && wanted != pet.facing && pet.facing_cooldown_ms <= 0.0 {
            pet.facing = wanted;
            pet.facing_cooldown_ms = facing_cooldown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_FRAME_MS;
    use crate::settings::Settings;
    use crate::sim::events::FrameEvent;
    use crate::sim::geom::Rect;
    use crate::sim::state::{Enemy, EnemyKind, Obstacle, ObstacleKind, Pet};

    fn with_pet(pos: Vec2) -> GameState {
        let mut state = GameState::bare(Settings::default(), 6);
        let id = state.next_entity_id();
        state.pets.push(Pet {
            id,
            rect: Rect {
                pos,
                size: Vec2::splat(40.0),
            },
            facing: Facing::Right,
            bite_cooldown_ms: 0.0,
            facing_cooldown_ms: 0.0,
            target: None,
        });
        state
    }

    #[test]
    fn test_pet_follows_player_when_far() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(-300.0, -20.0));
        let before = state.pets[0].rect.pos;
        let mut events = FrameEvents::default();
        update_pets(&mut state, REFERENCE_FRAME_MS, &mut events);
        let moved = state.pets[0].rect.pos - before;
        assert!((moved.length() - 3.5).abs() < 1e-3);
        assert!(moved.x > 0.0);
    }

    #[test]
    fn test_pet_rests_near_player() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(40.0, 0.0));
        let before = state.pets[0].rect.pos;
        let mut events = FrameEvents::default();
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.pets[0].rect.pos, before);
    }

    #[test]
    fn test_pet_bites_nearby_wolf_on_cooldown() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(60.0, 0.0));
        let id = state.next_entity_id();
        let profile = state.settings.wolf.clone();
        let wolf_pos = state.pets[0].rect.pos + Vec2::new(20.0, 0.0);
        state.enemies.push(Enemy::new(id, EnemyKind::Wolf, wolf_pos, &profile));

        let mut events = FrameEvents::default();
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.enemies[0].health, 1);
        assert_eq!(state.pets[0].target, Some(id));
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.enemies[0].health, 1);

        for _ in 0..125 {
            update_pets(&mut state, 16.0, &mut events);
        }
        assert!(state.enemies[0].is_dying());
        assert_eq!(events.count(|e| matches!(e, FrameEvent::EnemyKilled { is_boss: false, .. })), 1);
    }

    #[test]
    fn test_pet_ignores_wolves_outside_guard_radius() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(60.0, 0.0));
        let id = state.next_entity_id();
        let profile = state.settings.wolf.clone();
        state
            .enemies
            .push(Enemy::new(id, EnemyKind::Wolf, player + Vec2::new(400.0, 0.0), &profile));
        let mut events = FrameEvents::default();
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.pets[0].target, None);
    }

    #[test]
    fn test_pet_stops_at_rock_between_it_and_player() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(-300.0, -20.0));
        let start = state.pets[0].rect.pos;
        let id = state.next_entity_id();
        let rock = Rect::new(start.x + 60.0, start.y - 200.0, 40.0, 400.0);
        state.obstacles.push(Obstacle {
            id,
            rect: rock,
            kind: ObstacleKind::Rock,
            active: true,
        });

        let mut events = FrameEvents::default();
        for _ in 0..120 {
            update_pets(&mut state, 16.0, &mut events);
            assert!(!state.pets[0].rect.overlaps(&rock));
        }
        assert!(state.pets[0].rect.right() <= rock.pos.x);
        assert!(state.pets[0].rect.pos.x > start.x);
    }

    #[test]
    fn test_pet_stays_inside_world() {
        let mut state = with_pet(Vec2::new(-30.0, -30.0));
        let mut events = FrameEvents::default();
        update_pets(&mut state, 16.0, &mut events);
        assert!(state.pets[0].rect.pos.x >= 0.0 && state.pets[0].rect.pos.y >= 0.0);
    }

    #[test]
    fn test_pet_facing_flip_waits_for_cooldown() {
        let player = GameState::bare(Settings::default(), 6).player.center();
        let mut state = with_pet(player + Vec2::new(300.0, 0.0));
        let mut events = FrameEvents::default();
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.pets[0].facing, Facing::Left);

        state.pets[0].rect.pos = player + Vec2::new(-340.0, 0.0);
        update_pets(&mut state, 16.0, &mut events);
        assert_eq!(state.pets[0].facing, Facing::Left);

        for _ in 0..13 {
            update_pets(&mut state, 16.0, &mut events);
        }
        assert_eq!(state.pets[0].facing, Facing::Right);
    }
}
