//! Axis-aligned rectangle geometry
//!
//! Positions are top-left origins with y growing downward. Every collision
//! decision in the simulation goes through [`overlaps`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            pos: self.pos + delta,
            size: self.size,
        }
    }

    pub fn with_pos(&self, pos: Vec2) -> Self {
        Self { pos, size: self.size }
    }

    /// Strict overlap test, touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        overlaps(self, other)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.pos.x && p.x <= self.right() && p.y >= self.pos.y && p.y <= self.bottom()
    }

    /// Move the rect so it lies inside `bounds` (or is pinned to its top-left if larger)
    pub fn clamped_to(&self, bounds: &Rect) -> Self {
        let max = (bounds.pos + bounds.size - self.size).max(bounds.pos);
        self.with_pos(self.pos.clamp(bounds.pos, max))
    }

    /// Shrink to a sub-box given as fractions of this rect's size
    ///
    /// `offset` and `size` are fractions: `(0.3, 0.55)` / `(0.4, 0.3)` keeps the
    /// lower-middle part of a tree sprite.
    pub fn inset(&self, offset: Vec2, size: Vec2) -> Self {
        Self {
            pos: self.pos + self.size * offset,
            size: self.size * size,
        }
    }

    /// Grow by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            pos: self.pos - Vec2::splat(margin),
            size: self.size + Vec2::splat(margin * 2.0),
        }
    }
}

/// AABB overlap: `a.x < b.x+b.w && a.x+a.w > b.x && a.y < b.y+b.h && a.y+a.h > b.y`
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.pos.x < b.right() && a.right() > b.pos.x && a.pos.y < b.bottom() && a.bottom() > b.pos.y
}

/// The playable area plus edge-spawn helpers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, rect: &Rect) -> bool {
        overlaps(rect, &self.rect())
    }

    pub fn clamp(&self, rect: &Rect) -> Rect {
        rect.clamped_to(&self.rect())
    }

    /// A point just outside a random edge, `margin` px beyond it
    ///
    /// Matches the "appear from off-screen" spawn: top, right, bottom or left,
    /// uniformly along the chosen edge.
    pub fn edge_spawn<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        match rng.random_range(0..4) {
            0 => Vec2::new(rng.random_range(0.0..self.width), -margin),
            1 => Vec2::new(self.width + margin, rng.random_range(0.0..self.height)),
            2 => Vec2::new(rng.random_range(0.0..self.width), self.height + margin),
            _ => Vec2::new(-margin, rng.random_range(0.0..self.height)),
        }
    }

    /// A uniformly random position for a box of `size` fully inside the world,
    /// keeping `margin` px from every edge
    pub fn random_inside<R: Rng>(&self, rng: &mut R, size: Vec2, margin: f32) -> Vec2 {
        let max_x = (self.width - size.x - margin).max(margin + 1.0);
        let max_y = (self.height - size.y - margin).max(margin + 1.0);
        Vec2::new(rng.random_range(margin..max_x), rng.random_range(margin..max_y))
    }
}
