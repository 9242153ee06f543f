//! Game state and core simulation types
//!
//! Everything the tick mutates lives here. Collections own their entities;
//! an entity is destroyed only by being compacted out of its collection.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::{Rect, WorldBounds};
use super::transition::WorldSnapshot;
use super::waves::WaveDirector;
use crate::frames;
use crate::settings::{EnemySettings, PickupSettings, PlayerSettings, Settings, WorldSettings};

/// Stable identity for entities that other entities remember (projectile hit lists)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Lives ran out; nothing advances until a restart
    GameOver,
}

/// Player sprite facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerFacing {
    Up,
    #[default]
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl PlayerFacing {
    /// Facing for a movement input; horizontal-only input keeps the vertical half
    pub fn from_input(dir: Vec2, current: PlayerFacing) -> Self {
        let up_half = matches!(current, Self::Up | Self::UpLeft | Self::UpRight);
        let sign = |v: f32| {
            if v < 0.0 {
                -1
            } else if v > 0.0 {
                1
            } else {
                0
            }
        };
        match (sign(dir.x), sign(dir.y)) {
            (0, -1) => Self::Up,
            (0, 1) => Self::Down,
            (-1, -1) => Self::UpLeft,
            (1, -1) => Self::UpRight,
            (-1, 1) => Self::DownLeft,
            (1, 1) => Self::DownRight,
            (-1, 0) if up_half => Self::UpLeft,
            (1, 0) if up_half => Self::UpRight,
            (-1, 0) => Self::DownLeft,
            (1, 0) => Self::DownRight,
            _ => current,
        }
    }
}

/// Enemy sprite facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Collectable stat boosts revealed by broken crates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerupKind {
    FireRate,
    BulletSpeed,
    BulletSize,
    MovementSpeed,
    Piercing,
    Health,
}

/// Multiplicative stat modifiers, starting at identity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Powerups {
    pub fire_rate: f32,
    pub bullet_speed: f32,
    pub bullet_size: f32,
    pub move_speed: f32,
    /// Extra enemies a bullet may pass through
    pub piercing: u32,
}

impl Default for Powerups {
    fn default() -> Self {
        Self {
            fire_rate: 1.0,
            bullet_speed: 1.0,
            bullet_size: 1.0,
            move_speed: 1.0,
            piercing: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DashState {
    #[default]
    Idle,
    Dashing { elapsed_ms: f32, direction: Vec2 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub rect: Rect,
    pub lives: u32,
    pub max_lives: u32,
    pub facing: PlayerFacing,
    /// Last movement direction, used for idle shots and dashes
    pub aim: Vec2,
    pub powerups: Powerups,
    /// Effective movement speed (base * move_speed modifier)
    pub speed: f32,
    pub shoot_cooldown_ms: f32,
    pub invulnerable_ms: f32,
    pub dash: DashState,
    /// Simulation time of the last dash start
    pub dash_started_ms: Option<f64>,
}

impl Player {
    pub fn new(settings: &PlayerSettings, pos: Vec2) -> Self {
        Self {
            rect: Rect {
                pos,
                size: Vec2::new(settings.width, settings.height),
            },
            lives: settings.max_lives,
            max_lives: settings.max_lives,
            facing: PlayerFacing::Down,
            aim: Vec2::Y,
            powerups: Powerups::default(),
            speed: settings.speed,
            shoot_cooldown_ms: 0.0,
            invulnerable_ms: 0.0,
            dash: DashState::Idle,
            dash_started_ms: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Wolf,
    /// Escort spawned during boss waves
    Minion,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyAi {
    Chasing,
    /// Escaping a wedge along a fixed heading
    Unstuck { direction: Vec2, remaining_ms: f32 },
    /// Death throw; removed once `elapsed_ms` reaches the profile's death time
    Dying {
        elapsed_ms: f32,
        velocity: Vec2,
        rotation: f32,
        rotation_speed: f32,
    },
}

/// Red flash after taking a hit
pub const HIT_FLASH_MS: f32 = 150.0;
/// Per-reference-frame decay of the death throw
pub const DEATH_DRAG: f32 = 0.95;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub rect: Rect,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub facing: Facing,
    pub facing_cooldown_ms: f32,
    pub ai: EnemyAi,
    pub stuck_ms: f32,
    /// Position at the end of the previous tick
    pub last_pos: Vec2,
    pub hit_flash_ms: f32,
    /// Boss only: time until the next tree may be knocked down
    pub tree_cooldown_ms: f32,
    /// Boss only: health multiplier applied at spawn
    pub health_scale: f32,
    /// Death animation finished; compacted at the end of the tick
    pub removed: bool,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, pos: Vec2, profile: &EnemySettings) -> Self {
        Self {
            id,
            kind,
            rect: Rect {
                pos,
                size: Vec2::new(profile.width, profile.height),
            },
            health: profile.health,
            max_health: profile.health,
            speed: profile.speed,
            facing: Facing::Right,
            facing_cooldown_ms: 0.0,
            ai: EnemyAi::Chasing,
            stuck_ms: 0.0,
            last_pos: pos,
            hit_flash_ms: 0.0,
            tree_cooldown_ms: 0.0,
            health_scale: 1.0,
            removed: false,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    pub fn is_dying(&self) -> bool {
        matches!(self.ai, EnemyAi::Dying { .. })
    }

    /// Takes part in collision and AI
    pub fn is_alive(&self) -> bool {
        !self.removed && !self.is_dying()
    }

    /// Apply damage; returns true when this hit killed the enemy
    ///
    /// A kill starts the death throw in a random direction. Hits on dying or
    /// removed enemies are ignored.
    pub fn take_damage(&mut self, amount: i32, profile: &EnemySettings, rng: &mut Pcg32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health -= amount;
        self.hit_flash_ms = HIT_FLASH_MS;
        if self.health > 0 {
            return false;
        }
        let angle = rng.random_range(0.0..TAU);
        let (lo, hi) = profile.death_force;
        let force = if hi > lo { rng.random_range(lo..hi) } else { lo };
        self.ai = EnemyAi::Dying {
            elapsed_ms: 0.0,
            velocity: crate::heading(angle) * force,
            rotation: 0.0,
            rotation_speed: rng.random_range(-0.1..0.1),
        };
        true
    }

    /// Advance the death throw; flags removal once it has run `death_ms`
    pub fn update_dying(&mut self, dt: f32, death_ms: f32) {
        let f = frames(dt);
        if let EnemyAi::Dying {
            elapsed_ms,
            velocity,
            rotation,
            rotation_speed,
        } = &mut self.ai
        {
            *elapsed_ms += dt;
            self.rect.pos += *velocity * f;
            *velocity *= DEATH_DRAG.powf(f);
            *rotation += *rotation_speed * f;
            if *elapsed_ms >= death_ms {
                self.removed = true;
            }
        }
    }

    /// Death animation progress in `0..=1`, None while alive
    pub fn death_progress(&self, death_ms: f32) -> Option<f32> {
        match self.ai {
            EnemyAi::Dying { elapsed_ms, .. } => Some((elapsed_ms / death_ms.max(1.0)).min(1.0)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub rect: Rect,
    /// Unit vector
    pub direction: Vec2,
    pub speed: f32,
    pub owner: ProjectileOwner,
    pub lifetime_ms: f32,
    /// A bullet with piercing N may hit N + 1 distinct enemies
    pub piercing: u32,
    pub hit_enemies: Vec<EntityId>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeState {
    pub health: u32,
    /// Fall animation elapsed time, Some once the tree is knocked down
    pub breaking_ms: Option<f32>,
    /// +1 falls right, -1 falls left
    pub fall_direction: f32,
    /// Stump sprite variant
    pub chopped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Tree(TreeState),
    /// A chain of overlapping rectangles; `rect` is their bounding box
    Lake { segments: Vec<Rect> },
    Rock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub rect: Rect,
    pub kind: ObstacleKind,
    pub active: bool,
}

impl Obstacle {
    pub fn tree(id: EntityId, rect: Rect, health: u32, rng: &mut Pcg32) -> Self {
        Self {
            id,
            rect,
            kind: ObstacleKind::Tree(TreeState {
                health,
                breaking_ms: None,
                fall_direction: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
                chopped: rng.random_bool(0.2),
            }),
            active: true,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self.kind, ObstacleKind::Tree(_))
    }

    /// Tree hit by a bullet; true when this hit knocked it down
    pub fn damage_tree(&mut self) -> bool {
        match &mut self.kind {
            ObstacleKind::Tree(tree) if tree.breaking_ms.is_none() && self.active => {
                tree.health = tree.health.saturating_sub(1);
                if tree.health == 0 {
                    tree.breaking_ms = Some(0.0);
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Knock a tree down regardless of its health (boss contact)
    pub fn fell_tree(&mut self) -> bool {
        match &mut self.kind {
            ObstacleKind::Tree(tree) if tree.breaking_ms.is_none() && self.active => {
                tree.health = 0;
                tree.breaking_ms = Some(0.0);
                true
            }
            _ => false,
        }
    }

    /// Advance the fall animation; the tree deactivates when it ends
    pub fn update(&mut self, dt: f32, break_ms: f32) {
        if let ObstacleKind::Tree(TreeState {
            breaking_ms: Some(elapsed),
            ..
        }) = &mut self.kind
        {
            *elapsed += dt;
            if *elapsed >= break_ms {
                self.active = false;
            }
        }
    }

    /// Fall rotation in radians for a breaking tree
    pub fn fall_rotation(&self, break_ms: f32) -> f32 {
        match self.kind {
            ObstacleKind::Tree(TreeState {
                breaking_ms: Some(elapsed),
                fall_direction,
                ..
            }) => (elapsed / break_ms).min(1.0) * std::f32::consts::FRAC_PI_2 * fall_direction,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    Coin { value: u32, vel: Vec2, age_ms: f32 },
    /// Unbroken crates block nothing but stop bullets; broken ones can be collected
    Crate { powerup: PowerupKind, broken: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub rect: Rect,
    pub kind: PickupKind,
    pub active: bool,
}

impl Pickup {
    /// Magnet pull towards `target`, friction when out of range, lifetime expiry
    ///
    /// Returns the coin's value when it is close enough to collect.
    pub fn update_coin(
        &mut self,
        dt: f32,
        target: Vec2,
        settings: &PickupSettings,
        bounds: &WorldBounds,
    ) -> Option<u32> {
        let PickupKind::Coin { value, vel, age_ms } = &mut self.kind else {
            return None;
        };
        *age_ms += dt;
        if *age_ms >= settings.coin_lifetime_ms {
            self.active = false;
            return None;
        }
        let to_target = target - self.rect.center();
        let distance = to_target.length();
        if distance < settings.collect_distance {
            self.active = false;
            return Some(*value);
        }
        let f = frames(dt);
        if distance < settings.magnet_range {
            let closeness = (settings.magnet_range - distance) / settings.magnet_range;
            let pull = (settings.magnet_strength * (1.0 + closeness * 10.0)).min(settings.max_coin_speed);
            *vel += to_target / distance * pull * f;
            *vel = vel.clamp_length_max(settings.max_coin_speed);
        } else {
            *vel *= settings.friction.powf(f);
        }
        self.rect = bounds.clamp(&self.rect.translated(*vel * f));
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Leaf,
    Wood,
    Spark,
    Ember,
}

/// Purely visual; nothing reads particles back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: ParticleKind,
    pub size: f32,
    pub life_ms: f32,
    pub max_life_ms: f32,
}

/// Upward drift applied to particles per reference frame
pub const PARTICLE_GRAVITY: f32 = -0.05;

impl Particle {
    pub fn update(&mut self, dt: f32) {
        let f = frames(dt);
        self.pos += self.vel * f;
        self.vel.y += PARTICLE_GRAVITY * f;
        self.life_ms -= dt;
    }

    pub fn alive(&self) -> bool {
        self.life_ms > 0.0
    }

    pub fn alpha(&self) -> f32 {
        (self.life_ms / self.max_life_ms).clamp(0.0, 1.0)
    }
}

/// Scrolling viewport over the world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub offset: Vec2,
}

impl Camera {
    /// Ease towards centring `target`, clamped so the viewport never leaves the world
    pub fn follow(&mut self, target: Vec2, world: &WorldSettings, dt: f32) {
        let viewport = Vec2::new(world.viewport_width, world.viewport_height);
        let max = (Vec2::new(world.width, world.height) - viewport).max(Vec2::ZERO);
        let goal = (target - viewport / 2.0).clamp(Vec2::ZERO, max);
        let t = 1.0 - (1.0 - world.camera_smoothing).powf(frames(dt));
        self.offset += (goal - self.offset) * t;
        self.offset = self.offset.clamp(Vec2::ZERO, max);
    }

    /// Jump straight to the target
    pub fn snap(&mut self, target: Vec2, world: &WorldSettings) {
        let viewport = Vec2::new(world.viewport_width, world.viewport_height);
        let max = (Vec2::new(world.width, world.height) - viewport).max(Vec2::ZERO);
        self.offset = (target - viewport / 2.0).clamp(Vec2::ZERO, max);
    }
}

/// The enterable house that appears in the outdoor world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub rect: Rect,
    /// Fade-out elapsed time after the player left it
    pub fading_ms: Option<f32>,
}

impl House {
    pub fn can_enter(&self) -> bool {
        self.fading_ms.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DogShop {
    pub rect: Rect,
    pub price: u32,
    /// One dog per visit
    pub sold: bool,
}

/// The indoor map, present only while the player is inside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interior {
    pub bounds: Rect,
    /// Touching this leaves the house
    pub exit: Rect,
    pub campfire: Rect,
    pub heal_ms: f32,
    pub shop: DogShop,
}

/// A bought dog guarding the player outdoors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: EntityId,
    pub rect: Rect,
    pub facing: Facing,
    pub bite_cooldown_ms: f32,
    /// Facing flips are held back while this runs
    pub facing_cooldown_ms: f32,
    pub target: Option<EntityId>,
}

/// Global pause: host requested or a notification being shown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pause {
    pub host: bool,
    pub notification_ms: f32,
}

impl Pause {
    pub fn is_paused(&self) -> bool {
        self.host || self.notification_ms > 0.0
    }

    /// Raise a notification pause, extending any shorter one still showing
    pub fn notify(&mut self, duration_ms: f32) {
        self.notification_ms = self.notification_ms.max(duration_ms);
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub settings: Settings,
    pub phase: GamePhase,
    /// Simulation time, advances only while unpaused
    pub time_ms: f64,
    pub player: Player,
    /// Wolves and minions
    pub enemies: Vec<Enemy>,
    /// At most one boss exists
    pub boss: Option<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub particles: Vec<Particle>,
    pub pets: Vec<Pet>,
    pub camera: Camera,
    pub waves: WaveDirector,
    pub house: Option<House>,
    pub interior: Option<Interior>,
    /// The outdoor world while the player is indoors
    pub snapshot: Option<WorldSnapshot>,
    pub pause: Pause,
    pub score: u64,
    pub coins: u32,
    pub kills: u32,
    pub kills_since_house: u32,
    pub dogs_purchased: u32,
    /// Interact held on the previous tick (shop purchases are edge triggered)
    pub(crate) interact_held: bool,
    next_id: u32,
}

impl GameState {
    /// Create a new run with default settings
    pub fn new(seed: u64) -> Self {
        Self::with_settings(Settings::default(), seed)
    }

    /// Create a new run with a generated world
    pub fn with_settings(settings: Settings, seed: u64) -> Self {
        let mut state = Self::bare(settings, seed);
        super::world_gen::populate(&mut state);
        state
    }

    /// A run with the player centred and no obstacles or crates
    pub fn bare(settings: Settings, seed: u64) -> Self {
        let world = WorldBounds::new(settings.world.width, settings.world.height);
        let player_size = Vec2::new(settings.player.width, settings.player.height);
        let player = Player::new(&settings.player, world.center() - player_size / 2.0);
        let mut camera = Camera::default();
        camera.snap(player.center(), &settings.world);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            waves: WaveDirector::new(&settings.waves),
            settings,
            phase: GamePhase::Playing,
            time_ms: 0.0,
            player,
            enemies: Vec::new(),
            boss: None,
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            pickups: Vec::new(),
            particles: Vec::new(),
            pets: Vec::new(),
            camera,
            house: None,
            interior: None,
            snapshot: None,
            pause: Pause::default(),
            score: 0,
            coins: 0,
            kills: 0,
            kills_since_house: 0,
            dogs_purchased: 0,
            interact_held: false,
            next_id: 1,
        }
    }

    /// Start a fresh run with the same settings and a seed drawn from this run
    pub fn restart(&mut self) {
        let seed: u64 = self.rng.random();
        log::info!("Restarting run with seed {seed}");
        *self = Self::with_settings(self.settings.clone(), seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds::new(self.settings.world.width, self.settings.world.height)
    }

    pub fn is_indoors(&self) -> bool {
        self.interior.is_some()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Wolves and minions still taking part in the fight
    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.removed).count()
    }

    /// Spawn a burst of particles around `center`
    pub fn burst(&mut self, center: Vec2, kind: ParticleKind, count: usize) {
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(0.5..2.5);
            let life = self.rng.random_range(300.0..700.0);
            self.particles.push(Particle {
                pos: center,
                vel: crate::heading(angle) * speed,
                kind,
                size: self.rng.random_range(2.0..4.0),
                life_ms: life,
                max_life_ms: life,
            });
        }
    }

    /// Drop compacted entities
    pub fn compact(&mut self) {
        self.enemies.retain(|e| !e.removed);
        self.projectiles.retain(|p| p.active);
        self.obstacles.retain(|o| o.active);
        self.pickups.retain(|p| p.active);
        self.particles.retain(Particle::alive);
    }
}
