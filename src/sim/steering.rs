//! Enemy steering: pursuit with look-ahead probing and stuck recovery
//!
//! Each tick an enemy heads for its target. Before committing to a heading it
//! projects its box forward by every probe distance; a blocked probe makes it
//! try a fan of deviations, then perpendicular sidesteps, then give up for the
//! tick. An enemy that barely moves while far from its target for long enough
//! breaks away sideways for a short burst.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{Mover, blocked, commit_move};
use super::geom::{Rect, WorldBounds};
use super::state::{Enemy, EnemyAi, Facing, Obstacle};
use crate::settings::SteeringSettings;
use crate::{bearing, frames, heading};

/// What an enemy steers against this tick
pub struct SteeringContext<'a> {
    /// Start-of-tick position of whatever is being chased
    pub target: Vec2,
    pub obstacles: &'a [Obstacle],
    pub bounds: WorldBounds,
    pub settings: &'a SteeringSettings,
    pub mover: Mover,
}

impl SteeringContext<'_> {
    /// Every probe along `dir` is free of blocking obstacles
    fn heading_clear(&self, rect: &Rect, dir: Vec2) -> bool {
        self.settings
            .probe_distances
            .iter()
            .all(|&d| !blocked(&rect.translated(dir * d), self.obstacles, self.mover))
    }

    /// Direct heading if clear, else the smallest clear deviation, else a sidestep
    pub fn choose_heading(&self, rect: &Rect, desired: Vec2) -> Option<Vec2> {
        if self.heading_clear(rect, desired) {
            return Some(desired);
        }
        let base = bearing(desired);
        let fan = self
            .settings
            .fan_offsets_deg
            .iter()
            .flat_map(|&deg| [deg.to_radians(), -deg.to_radians()]);
        let sidesteps = [FRAC_PI_2, -FRAC_PI_2];
        fan.chain(sidesteps)
            .map(|offset| heading(base + offset))
            .find(|&dir| self.heading_clear(rect, dir))
    }
}

/// Run one tick of AI for a live enemy and commit its movement
pub fn steer(enemy: &mut Enemy, ctx: &SteeringContext, dt: f32, rng: &mut Pcg32) {
    if !enemy.is_alive() {
        return;
    }
    let s = ctx.settings;
    enemy.hit_flash_ms = (enemy.hit_flash_ms - dt).max(0.0);
    enemy.facing_cooldown_ms = (enemy.facing_cooldown_ms - dt).max(0.0);

    let to_target = ctx.target - enemy.rect.pos;
    let distance = to_target.length();
    let moved = enemy.rect.pos.distance(enemy.last_pos);
    if moved < s.stuck_epsilon && distance > s.stuck_min_distance {
        enemy.stuck_ms += dt;
    } else {
        enemy.stuck_ms = 0.0;
    }
    enemy.last_pos = enemy.rect.pos;

    if enemy.stuck_ms > s.stuck_threshold_ms && enemy.ai == EnemyAi::Chasing {
        let side = if rng.random_bool(0.5) { FRAC_PI_2 } else { -FRAC_PI_2 };
        let jitter = s.unstuck_jitter_deg.to_radians();
        let jitter = rng.random_range(-jitter..=jitter);
        enemy.ai = EnemyAi::Unstuck {
            direction: heading(bearing(to_target) + side + jitter),
            remaining_ms: s.unstuck_ms,
        };
        log::debug!("Enemy {:?} stuck at {:?}, breaking away", enemy.id, enemy.rect.pos);
    }

    let f = frames(dt);
    let step = match &mut enemy.ai {
        EnemyAi::Unstuck {
            direction,
            remaining_ms,
        } => {
            let step = *direction * enemy.speed * s.unstuck_speed_multiplier * f;
            *remaining_ms -= dt;
            if *remaining_ms <= 0.0 {
                enemy.ai = EnemyAi::Chasing;
                enemy.stuck_ms = 0.0;
            }
            step
        }
        EnemyAi::Chasing if distance > s.attack_range => ctx
            .choose_heading(&enemy.rect, to_target / distance)
            .map_or(Vec2::ZERO, |dir| dir * enemy.speed * f),
        EnemyAi::Chasing => Vec2::ZERO,
        EnemyAi::Dying { .. } => return,
    };

    let was_inside = ctx.bounds.clamp(&enemy.rect) == enemy.rect;
    let outcome = commit_move(enemy.rect, step, ctx.obstacles, ctx.mover);
    enemy.rect = if was_inside {
        ctx.bounds.clamp(&outcome.rect)
    } else {
        outcome.rect
    };
    update_facing(enemy, step.x, s.facing_cooldown_ms);
}

/// Flip the sprite when horizontal motion changes sign, at most once per cooldown
fn update_facing(enemy: &mut Enemy, dx: f32, cooldown_ms: f32) {
    let wanted = if dx > 0.0 {
        Facing::Right
    } else if dx < 0.0 {
        Facing::Left
    } else {
        return;
    };
    if wanted != enemy.facing && enemy.facing_cooldown_ms <= 0.0 {
        enemy.facing = wanted;
        enemy.facing_cooldown_ms = cooldown_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{EnemyKind, EntityId, ObstacleKind, TreeState};
    use rand::SeedableRng;

    fn rock(x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle {
            id: EntityId(90),
            rect: Rect::new(x, y, w, h),
            kind: ObstacleKind::Rock,
            active: true,
        }
    }

    fn wolf_at(x: f32, y: f32) -> (Enemy, Settings) {
        let settings = Settings::default();
        let wolf = Enemy::new(EntityId(1), EnemyKind::Wolf, Vec2::new(x, y), &settings.wolf);
        (wolf, settings)
    }

    fn ctx<'a>(target: Vec2, obstacles: &'a [Obstacle], settings: &'a Settings, mover: Mover) -> SteeringContext<'a> {
        SteeringContext {
            target,
            obstacles,
            bounds: WorldBounds::new(settings.world.width, settings.world.height),
            settings: &settings.steering,
            mover,
        }
    }

    #[test]
    fn test_open_ground_pursuit() {
        let (mut wolf, settings) = wolf_at(1000.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let c = ctx(Vec2::new(1300.0, 1000.0), &[], &settings, Mover::Walker);
        steer(&mut wolf, &c, crate::consts::REFERENCE_FRAME_MS, &mut rng);
        assert!((wolf.rect.pos.x - 1002.5).abs() < 1e-3);
        assert_eq!(wolf.rect.pos.y, 1000.0);
        assert_eq!(wolf.facing, Facing::Right);
    }

    #[test]
    fn test_idle_within_attack_range() {
        let (mut wolf, settings) = wolf_at(1000.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let c = ctx(Vec2::new(1003.0, 1000.0), &[], &settings, Mover::Walker);
        steer(&mut wolf, &c, 16.0, &mut rng);
        assert_eq!(wolf.rect.pos, Vec2::new(1000.0, 1000.0));
    }

    fn assert_heading(dir: Vec2, degrees: f32) {
        let expected = heading(degrees.to_radians());
        assert!((dir - expected).length() < 1e-4, "{dir:?} is not {degrees} degrees");
    }

    #[test]
    fn test_blocked_heading_prefers_positive_thirty_degrees() {
        let (wolf, settings) = wolf_at(1000.0, 1000.0);
        // Pin caught only by the far direct probe; both 30 degree fans are clear
        let obstacles = vec![rock(1067.0, 1001.0, 2.0, 5.0)];
        let c = ctx(Vec2::new(1500.0, 1025.0), &obstacles, &settings, Mover::Walker);
        let dir = c.choose_heading(&wolf.rect, Vec2::X).unwrap();
        assert_heading(dir, 30.0);
    }

    #[test]
    fn test_blocked_thirty_degree_fans_fall_back_to_sixty() {
        let (wolf, settings) = wolf_at(1000.0, 1000.0);
        // Pins past the reach of the 60 degree probes
        let obstacles = vec![rock(1057.0, 1040.0, 5.0, 5.0), rock(1057.0, 990.0, 5.0, 5.0)];
        let c = ctx(Vec2::new(1500.0, 1025.0), &obstacles, &settings, Mover::Walker);
        let dir = c.choose_heading(&wolf.rect, Vec2::X).unwrap();
        assert_heading(dir, 60.0);
    }

    #[test]
    fn test_fully_blocked_stalls() {
        let (mut wolf, settings) = wolf_at(1000.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let obstacles = vec![
            rock(950.0, 960.0, 200.0, 40.0),
            rock(950.0, 960.0, 40.0, 200.0),
            rock(1050.0, 960.0, 40.0, 200.0),
        ];
        let c = ctx(Vec2::new(1000.0, 200.0), &obstacles, &settings, Mover::Walker);
        steer(&mut wolf, &c, 16.0, &mut rng);
        assert_eq!(wolf.rect.pos, Vec2::new(1000.0, 1000.0));
    }

    #[test]
    fn test_wedged_enemy_breaks_away() {
        let (mut wolf, settings) = wolf_at(1000.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(11);
        // Wall touching the top edge, side walls 10 px away, open below
        let obstacles = vec![
            rock(900.0, 960.0, 240.0, 40.0),
            rock(950.0, 960.0, 40.0, 200.0),
            rock(1050.0, 960.0, 40.0, 200.0),
        ];
        let c = ctx(Vec2::new(1000.0, 100.0), &obstacles, &settings, Mover::Walker);
        let start = wolf.rect.pos;
        let mut broke_away = false;
        let mut moved = false;
        for _ in 0..400 {
            steer(&mut wolf, &c, 16.0, &mut rng);
            broke_away |= matches!(wolf.ai, EnemyAi::Unstuck { .. });
            moved |= wolf.rect.pos.distance(start) > 1.0;
        }
        assert!(broke_away);
        assert!(moved);
    }

    #[test]
    fn test_facing_flip_respects_cooldown() {
        let (mut wolf, settings) = wolf_at(1000.0, 1000.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let right = ctx(Vec2::new(1300.0, 1000.0), &[], &settings, Mover::Walker);
        let left = ctx(Vec2::new(700.0, 1000.0), &[], &settings, Mover::Walker);
        steer(&mut wolf, &left, 16.0, &mut rng);
        assert_eq!(wolf.facing, Facing::Left);
        steer(&mut wolf, &right, 16.0, &mut rng);
        assert_eq!(wolf.facing, Facing::Left);
        for _ in 0..13 {
            steer(&mut wolf, &right, 16.0, &mut rng);
        }
        assert_eq!(wolf.facing, Facing::Right);
    }

    #[test]
    fn test_boss_walks_through_trees() {
        let settings = Settings::default();
        let mut boss = Enemy::new(EntityId(5), EnemyKind::Boss, Vec2::new(1000.0, 1000.0), &settings.boss);
        let tree = Obstacle {
            id: EntityId(6),
            rect: Rect::new(1000.0, 900.0, 60.0, 90.0),
            kind: ObstacleKind::Tree(TreeState {
                health: 5,
                breaking_ms: None,
                fall_direction: 1.0,
                chopped: false,
            }),
            active: true,
        };
        let obstacles = vec![tree];
        let c = ctx(Vec2::new(1000.0, 200.0), &obstacles, &settings, Mover::Boss);
        assert_eq!(c.choose_heading(&boss.rect, Vec2::NEG_Y), Some(Vec2::NEG_Y));
        let mut rng = Pcg32::seed_from_u64(2);
        steer(&mut boss, &c, 16.0, &mut rng);
        assert!(boss.rect.pos.y < 1000.0);
    }

    #[test]
    fn test_spawned_outside_walks_in_without_teleport() {
        let (mut wolf, settings) = wolf_at(1200.0, -50.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let c = ctx(Vec2::new(1200.0, 1200.0), &[], &settings, Mover::Walker);
        steer(&mut wolf, &c, crate::consts::REFERENCE_FRAME_MS, &mut rng);
        assert!((wolf.rect.pos.y - (-47.5)).abs() < 1e-3);
    }
}
