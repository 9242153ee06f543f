//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (collection order)
//! - Elapsed time in, events and drawables out
//! - No rendering, audio or platform dependencies

pub mod abilities;
pub mod collision;
pub mod events;
pub mod geom;
pub mod interior;
pub mod pets;
pub mod projectile;
pub mod state;
pub mod steering;
pub mod tick;
pub mod transition;
pub mod view;
pub mod waves;
pub mod world_gen;

pub use collision::Mover;
pub use events::{FrameEvent, FrameEvents};
pub use geom::{Rect, WorldBounds, overlaps};
pub use state::{
    Enemy, EnemyAi, EnemyKind, EntityId, Facing, GamePhase, GameState, Obstacle, ObstacleKind, Pickup,
    PickupKind, Player, PlayerFacing, PowerupKind, Powerups, Projectile, ProjectileOwner,
};
pub use tick::{InputState, tick};
pub use transition::WorldSnapshot;
pub use view::{Drawable, SpriteKind};
pub use waves::{WaveDirector, WavePhase};
