//! Player abilities: powerup stacking, shooting cooldown, dash and contact damage

use std::f32::consts::TAU;

use glam::Vec2;

use super::state::{DashState, Player, PowerupKind};
use crate::frames;
use crate::settings::{PlayerSettings, PowerupSettings};

impl Player {
    /// Stack a powerup onto the current modifiers
    pub fn apply_powerup(&mut self, kind: PowerupKind, base: &PlayerSettings, factors: &PowerupSettings) {
        let p = &mut self.powerups;
        match kind {
            PowerupKind::FireRate => p.fire_rate *= factors.fire_rate_factor,
            PowerupKind::BulletSpeed => p.bullet_speed *= factors.bullet_speed_factor,
            PowerupKind::BulletSize => p.bullet_size *= factors.bullet_size_factor,
            PowerupKind::MovementSpeed => {
                p.move_speed *= factors.move_speed_factor;
            }
            PowerupKind::Piercing => p.piercing += 1,
            PowerupKind::Health => {
                self.max_lives += 1;
                self.lives += 1;
            }
        }
        self.speed = base.speed * self.powerups.move_speed;
        log::debug!("Powerup {kind:?} applied: {:?}", self.powerups);
    }

    /// Time between shots with the current fire rate
    pub fn shoot_cooldown_total(&self, base: &PlayerSettings) -> f32 {
        base.shoot_cooldown_ms * self.powerups.fire_rate
    }

    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown_ms <= 0.0 && !self.is_dashing()
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.dash, DashState::Dashing { .. })
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0 || self.is_dashing()
    }

    /// Count down shot and invulnerability timers
    pub fn update_timers(&mut self, dt: f32) {
        self.shoot_cooldown_ms = (self.shoot_cooldown_ms - dt).max(0.0);
        self.invulnerable_ms = (self.invulnerable_ms - dt).max(0.0);
    }

    /// Start a dash along `direction` (or the aim direction when zero)
    ///
    /// Rejected while dashing or within the cooldown measured from the previous
    /// dash start.
    pub fn try_dash(&mut self, now_ms: f64, direction: Vec2, settings: &PlayerSettings) -> bool {
        if self.is_dashing() {
            return false;
        }
        let cooling_down = self
            .dash_started_ms
            .is_some_and(|started| now_ms - started < settings.dash_cooldown_ms as f64);
        if cooling_down {
            return false;
        }
        let direction = direction.try_normalize().unwrap_or(self.aim);
        self.dash = DashState::Dashing {
            elapsed_ms: 0.0,
            direction,
        };
        self.dash_started_ms = Some(now_ms);
        true
    }

    /// Advance an active dash and return this tick's displacement
    pub fn advance_dash(&mut self, dt: f32, settings: &PlayerSettings) -> Option<Vec2> {
        let DashState::Dashing { elapsed_ms, direction } = &mut self.dash else {
            return None;
        };
        let step = dt.min(settings.dash_duration_ms - *elapsed_ms).max(0.0);
        *elapsed_ms += dt;
        let delta = *direction * settings.dash_speed * frames(step);
        if *elapsed_ms >= settings.dash_duration_ms {
            self.dash = DashState::Idle;
        }
        Some(delta)
    }

    /// Spin angle for the dash animation, 0 when not dashing
    pub fn dash_rotation(&self, settings: &PlayerSettings) -> f32 {
        match self.dash {
            DashState::Dashing { elapsed_ms, .. } => {
                (elapsed_ms / settings.dash_duration_ms).clamp(0.0, 1.0) * TAU
            }
            DashState::Idle => 0.0,
        }
    }

    /// Remaining share of the dash cooldown: 1 right after a dash, 0 when ready
    pub fn dash_cooldown_fraction(&self, now_ms: f64, settings: &PlayerSettings) -> f32 {
        match self.dash_started_ms {
            Some(started) if settings.dash_cooldown_ms > 0.0 => {
                let since = (now_ms - started) as f32;
                (1.0 - since / settings.dash_cooldown_ms).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Contact damage; returns true when a life was lost
    pub fn take_hit(&mut self, settings: &PlayerSettings) -> bool {
        if self.lives == 0 || self.is_invulnerable() {
            return false;
        }
        self.lives -= 1;
        self.invulnerable_ms = settings.invulnerability_ms;
        true
    }
}
