//! World constants and game balance
//!
//! Everything the simulation tunes lives here and is loadable from JSON. Speeds
//! are expressed in pixels per reference frame (see [`crate::consts::REFERENCE_FRAME_MS`]),
//! durations in milliseconds.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_MS;
use crate::error::SettingsError;
use crate::sim::PowerupKind;

/// World generation keeps borders and spacing that need at least this much room
const MIN_WORLD_SIDE: f32 = 400.0;

/// World and camera dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub width: f32,
    pub height: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Fraction of the remaining camera distance covered per reference frame
    pub camera_smoothing: f32,
    /// Upper bound on a single tick's elapsed time
    pub max_frame_ms: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            width: 2400.0,
            height: 2400.0,
            viewport_width: 1200.0,
            viewport_height: 800.0,
            camera_smoothing: 0.1,
            max_frame_ms: MAX_FRAME_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub max_lives: u32,
    pub shoot_cooldown_ms: f32,
    /// Grace period after taking a hit
    pub invulnerability_ms: f32,
    pub dash_speed: f32,
    pub dash_duration_ms: f32,
    /// Measured from the start of the previous dash
    pub dash_cooldown_ms: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 50.0,
            speed: 4.0,
            max_lives: 3,
            shoot_cooldown_ms: 400.0,
            invulnerability_ms: 2000.0,
            dash_speed: 12.0,
            dash_duration_ms: 200.0,
            dash_cooldown_ms: 2000.0,
        }
    }
}

/// Per-kind enemy profile shared by wolves, minions and the boss
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub health: i32,
    /// Score awarded on kill
    pub score: u64,
    /// How many kills this enemy counts for (house unlock)
    pub kill_credit: u32,
    /// Inclusive range of coins dropped on death
    pub coin_drop: (u32, u32),
    pub death_ms: f32,
    /// Inclusive range of the death throw impulse
    pub death_force: (f32, f32),
}

impl EnemySettings {
    pub fn wolf() -> Self {
        Self {
            width: 40.0,
            height: 50.0,
            speed: 2.5,
            health: 2,
            score: 100,
            kill_credit: 1,
            coin_drop: (2, 3),
            death_ms: 500.0,
            death_force: (2.0, 4.0),
        }
    }

    pub fn minion() -> Self {
        Self {
            health: 3,
            ..Self::wolf()
        }
    }

    pub fn boss() -> Self {
        Self {
            width: 80.0,
            height: 100.0,
            speed: 2.0,
            health: 30,
            score: 1000,
            kill_credit: 5,
            coin_drop: (8, 12),
            death_ms: 1000.0,
            death_force: (4.0, 7.0),
        }
    }
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self::wolf()
    }
}

/// Boss-only behaviour on top of its [`EnemySettings`] profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossSettings {
    /// Health multiplier growth per boss already defeated
    pub health_growth: f32,
    /// Speed multiplier growth per boss already defeated
    pub speed_growth: f32,
    /// Minimum time between two trees knocked down
    pub tree_destruction_ms: f32,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            health_growth: 0.3,
            speed_growth: 0.1,
            tree_destruction_ms: 100.0,
        }
    }
}

/// Pursuit, probing and stuck recovery tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringSettings {
    /// Enemies closer than this to their target stand still
    pub attack_range: f32,
    pub stuck_epsilon: f32,
    pub stuck_min_distance: f32,
    pub stuck_threshold_ms: f32,
    pub unstuck_ms: f32,
    pub unstuck_speed_multiplier: f32,
    pub unstuck_jitter_deg: f32,
    /// Look-ahead distances checked before committing to a heading
    pub probe_distances: Vec<f32>,
    /// Heading deviations tried when the direct path is blocked, smallest first
    pub fan_offsets_deg: Vec<f32>,
    pub facing_cooldown_ms: f32,
}

impl Default for SteeringSettings {
    fn default() -> Self {
        Self {
            attack_range: 5.0,
            stuck_epsilon: 0.5,
            stuck_min_distance: 50.0,
            stuck_threshold_ms: 500.0,
            unstuck_ms: 300.0,
            unstuck_speed_multiplier: 1.5,
            unstuck_jitter_deg: 30.0,
            probe_distances: vec![15.0, 30.0],
            fan_offsets_deg: vec![30.0, 60.0],
            facing_cooldown_ms: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileSettings {
    pub size: f32,
    pub speed: f32,
    pub lifetime_ms: f32,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            size: 8.0,
            speed: 8.0,
            lifetime_ms: 1000.0,
        }
    }
}

/// Powerup multipliers and which kinds crates may contain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupSettings {
    pub fire_rate_factor: f32,
    pub bullet_speed_factor: f32,
    pub bullet_size_factor: f32,
    pub move_speed_factor: f32,
    /// Score for collecting a revealed powerup
    pub score: u64,
    pub crate_kinds: Vec<PowerupKind>,
}

impl Default for PowerupSettings {
    fn default() -> Self {
        Self {
            fire_rate_factor: 0.85,
            bullet_speed_factor: 1.15,
            bullet_size_factor: 1.2,
            move_speed_factor: 1.1,
            score: 50,
            crate_kinds: vec![
                PowerupKind::FireRate,
                PowerupKind::BulletSpeed,
                PowerupKind::BulletSize,
                PowerupKind::MovementSpeed,
                PowerupKind::Piercing,
            ],
        }
    }
}

/// Quota band: waves from `first_wave` onward get `base + per_wave * (n - first_wave)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveTier {
    pub first_wave: u32,
    pub base: u32,
    pub per_wave: u32,
}

/// Spawn interval band: waves from `first_wave` onward spawn every `rate_ms`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRateTier {
    pub first_wave: u32,
    pub rate_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Grace period before wave 1
    pub preparation_ms: f32,
    /// Pause between a cleared wave and the next one
    pub intermission_ms: f32,
    /// Notification pause raised on wave start and boss spawn
    pub notification_ms: f32,
    /// Every n-th wave is a boss wave
    pub boss_interval: u32,
    /// Live-enemy cap; spawning waits while it is reached
    pub max_enemies: usize,
    /// Ordered by `first_wave`, the first band starting at wave 1
    pub tiers: Vec<WaveTier>,
    /// Ordered by `first_wave`, the first band starting at wave 1
    pub spawn_rates: Vec<SpawnRateTier>,
    pub boss_wave_spawn_rate_ms: f32,
    pub boss_minions_base: u32,
    /// Extra minions per two bosses defeated
    pub boss_minions_step: u32,
    pub crates_per_clear: usize,
    /// Distance outside the world edge at which enemies appear
    pub spawn_margin: f32,
    pub boss_spawn_margin: (f32, f32),
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            preparation_ms: 10_000.0,
            intermission_ms: 10_000.0,
            notification_ms: 3000.0,
            boss_interval: 5,
            max_enemies: 50,
            tiers: vec![
                WaveTier { first_wave: 1, base: 5, per_wave: 3 },
                WaveTier { first_wave: 6, base: 20, per_wave: 4 },
                WaveTier { first_wave: 11, base: 40, per_wave: 5 },
                WaveTier { first_wave: 16, base: 70, per_wave: 10 },
                WaveTier { first_wave: 21, base: 120, per_wave: 15 },
            ],
            spawn_rates: vec![
                SpawnRateTier { first_wave: 1, rate_ms: 1500.0 },
                SpawnRateTier { first_wave: 11, rate_ms: 1200.0 },
                SpawnRateTier { first_wave: 16, rate_ms: 1000.0 },
                SpawnRateTier { first_wave: 21, rate_ms: 800.0 },
            ],
            boss_wave_spawn_rate_ms: 800.0,
            boss_minions_base: 5,
            boss_minions_step: 2,
            crates_per_clear: 3,
            spawn_margin: 50.0,
            boss_spawn_margin: (50.0, 100.0),
        }
    }
}

/// Procedural world layout and destructible trees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleSettings {
    pub lake_count: usize,
    /// Inclusive range of rectangles per lake chain
    pub lake_segments: (usize, usize),
    pub lake_min_center_distance: f32,
    pub lake_margin: f32,
    pub tree_count: usize,
    pub tree_width: f32,
    pub tree_height: f32,
    pub tree_min_center_distance: f32,
    pub tree_health: u32,
    pub tree_break_ms: f32,
    /// Regrown trees keep at least this far from the player
    pub tree_regrow_distance: f32,
    pub rock_count: usize,
    pub crate_count: usize,
    pub crate_size: f32,
    pub crate_edge_margin: f32,
    pub crate_min_spacing: f32,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            lake_count: 10,
            lake_segments: (4, 8),
            lake_min_center_distance: 300.0,
            lake_margin: 50.0,
            tree_count: 40,
            tree_width: 60.0,
            tree_height: 90.0,
            tree_min_center_distance: 150.0,
            tree_health: 5,
            tree_break_ms: 800.0,
            tree_regrow_distance: 300.0,
            rock_count: 80,
            crate_count: 8,
            crate_size: 40.0,
            crate_edge_margin: 100.0,
            crate_min_spacing: 200.0,
        }
    }
}

/// Coins dropped by enemies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupSettings {
    pub coin_size: f32,
    pub coin_value: u32,
    pub coin_lifetime_ms: f32,
    pub magnet_range: f32,
    /// Base pull per reference frame, growing tenfold as the coin closes in
    pub magnet_strength: f32,
    pub max_coin_speed: f32,
    pub friction: f32,
    pub collect_distance: f32,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            coin_size: 12.0,
            coin_value: 10,
            coin_lifetime_ms: 15_000.0,
            magnet_range: 120.0,
            magnet_strength: 0.2,
            max_coin_speed: 8.0,
            friction: 0.9,
            collect_distance: 20.0,
        }
    }
}

/// House, interior map and campfire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteriorSettings {
    pub house_width: f32,
    pub house_height: f32,
    /// Kills since the previous house needed before a new one appears
    pub kills_per_house: u32,
    pub house_fade_ms: f32,
    pub width: f32,
    pub height: f32,
    /// Player spawn distance below the interior's top edge
    pub spawn_offset_y: f32,
    pub exit_width: f32,
    pub exit_height: f32,
    pub campfire_size: f32,
    pub campfire_heal_ms: f32,
    pub campfire_heal_distance: f32,
}

impl Default for InteriorSettings {
    fn default() -> Self {
        Self {
            house_width: 120.0,
            house_height: 100.0,
            kills_per_house: 10,
            house_fade_ms: 1000.0,
            width: 400.0,
            height: 400.0,
            spawn_offset_y: 80.0,
            exit_width: 80.0,
            exit_height: 60.0,
            campfire_size: 50.0,
            campfire_heal_ms: 2000.0,
            campfire_heal_distance: 80.0,
        }
    }
}

/// Dog shop and pet behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PetSettings {
    pub base_price: u32,
    pub price_step: u32,
    pub size: f32,
    pub shop_reach: f32,
    pub follow_speed: f32,
    pub follow_distance: f32,
    pub attack_speed: f32,
    /// Pets only chase wolves this close to the player
    pub guard_radius: f32,
    pub bite_range: f32,
    pub bite_cooldown_ms: f32,
    pub facing_cooldown_ms: f32,
}

impl Default for PetSettings {
    fn default() -> Self {
        Self {
            base_price: 300,
            price_step: 200,
            size: 40.0,
            shop_reach: 60.0,
            follow_speed: 3.5,
            follow_distance: 120.0,
            attack_speed: 5.0,
            guard_radius: 250.0,
            bite_range: 50.0,
            bite_cooldown_ms: 2000.0,
            facing_cooldown_ms: 200.0,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldSettings,
    pub player: PlayerSettings,
    pub wolf: EnemySettings,
    pub minion: EnemySettings,
    pub boss: EnemySettings,
    pub boss_behavior: BossSettings,
    pub steering: SteeringSettings,
    pub projectile: ProjectileSettings,
    pub powerups: PowerupSettings,
    pub waves: WaveSettings,
    pub obstacles: ObstacleSettings,
    pub pickups: PickupSettings,
    pub interior: InteriorSettings,
    pub pets: PetSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world: WorldSettings::default(),
            player: PlayerSettings::default(),
            wolf: EnemySettings::wolf(),
            minion: EnemySettings::minion(),
            boss: EnemySettings::boss(),
            boss_behavior: BossSettings::default(),
            steering: SteeringSettings::default(),
            projectile: ProjectileSettings::default(),
            powerups: PowerupSettings::default(),
            waves: WaveSettings::default(),
            obstacles: ObstacleSettings::default(),
            pickups: PickupSettings::default(),
            interior: InteriorSettings::default(),
            pets: PetSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!(
            "Loaded settings: world {}x{}, {} wave tiers",
            settings.world.width,
            settings.world.height,
            settings.waves.tiers.len()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.world.width < MIN_WORLD_SIDE || self.world.height < MIN_WORLD_SIDE {
            return Err(SettingsError::invalid("world", "sides must be at least 400 px"));
        }
        if self.world.max_frame_ms <= 0.0 {
            return Err(SettingsError::invalid("world.max_frame_ms", "must be positive"));
        }
        if self.interior.width > self.world.width || self.interior.height > self.world.height {
            return Err(SettingsError::invalid("interior", "must fit inside the world"));
        }
        if self.player.max_lives == 0 {
            return Err(SettingsError::invalid("player.max_lives", "must be at least 1"));
        }
        if self.projectile.lifetime_ms <= 0.0 {
            return Err(SettingsError::invalid("projectile.lifetime_ms", "must be positive"));
        }
        if self.waves.boss_interval == 0 {
            return Err(SettingsError::invalid("waves.boss_interval", "must be at least 1"));
        }
        if !starts_at_wave_one(self.waves.tiers.iter().map(|t| t.first_wave)) {
            return Err(SettingsError::invalid(
                "waves.tiers",
                "must be non-empty, ascending and start at wave 1",
            ));
        }
        if !starts_at_wave_one(self.waves.spawn_rates.iter().map(|t| t.first_wave)) {
            return Err(SettingsError::invalid(
                "waves.spawn_rates",
                "must be non-empty, ascending and start at wave 1",
            ));
        }
        if self.steering.probe_distances.is_empty() {
            return Err(SettingsError::invalid("steering.probe_distances", "must not be empty"));
        }
        if self.powerups.crate_kinds.is_empty() {
            return Err(SettingsError::invalid("powerups.crate_kinds", "must not be empty"));
        }
        let (lo, hi) = self.obstacles.lake_segments;
        if lo == 0 || lo > hi {
            return Err(SettingsError::invalid("obstacles.lake_segments", "must be a range of at least 1"));
        }
        Ok(())
    }

    /// Profile for an enemy kind
    pub fn enemy(&self, kind: crate::sim::EnemyKind) -> &EnemySettings {
        use crate::sim::EnemyKind;
        match kind {
            EnemyKind::Wolf => &self.wolf,
            EnemyKind::Minion => &self.minion,
            EnemyKind::Boss => &self.boss,
        }
    }
}

fn starts_at_wave_one(mut waves: impl Iterator<Item = u32>) -> bool {
    let Some(mut prev) = waves.next() else {
        return false;
    };
    if prev != 1 {
        return false;
    }
    for wave in waves {
        if wave <= prev {
            return false;
        }
        prev = wave;
    }
    true
}
