//! Collision detection and response against world obstacles
//!
//! Obstacles come in three shapes: trees collide only with their trunk, lakes
//! with any of their segments and rocks with their whole box. Movement is
//! resolved by trying the full step first and sliding along an axis if that is
//! blocked.

use glam::Vec2;

use super::geom::{Rect, overlaps};
use super::state::{Obstacle, ObstacleKind, TreeState};

/// Trunk box as fractions of the tree sprite: middle 40% wide, 30% tall, raised 15%
const TRUNK_OFFSET: Vec2 = Vec2::new(0.3, 0.55);
const TRUNK_SIZE: Vec2 = Vec2::new(0.4, 0.3);

/// Who is trying to move; the boss walks straight through trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Walker,
    Boss,
}

/// Result of committing a step
#[derive(Debug, Clone, Copy)]
pub struct MoveOutcome {
    pub rect: Rect,
    /// The full step was not possible
    pub blocked: bool,
}

impl Obstacle {
    /// Solid part of a tree sprite
    pub fn trunk(&self) -> Rect {
        self.rect.inset(TRUNK_OFFSET, TRUNK_SIZE)
    }

    /// Shape test against the obstacle's solid parts
    pub fn collides(&self, rect: &Rect) -> bool {
        if !self.active {
            return false;
        }
        match &self.kind {
            ObstacleKind::Tree(TreeState {
                breaking_ms: Some(_),
                ..
            }) => false,
            ObstacleKind::Tree(_) => overlaps(&self.trunk(), rect),
            ObstacleKind::Lake { segments } => {
                overlaps(&self.rect, rect) && segments.iter().any(|s| overlaps(s, rect))
            }
            ObstacleKind::Rock => overlaps(&self.rect, rect),
        }
    }

    /// Whether this obstacle stops `mover`
    pub fn blocks(&self, rect: &Rect, mover: Mover) -> bool {
        if mover == Mover::Boss && self.is_tree() {
            return false;
        }
        self.collides(rect)
    }
}

/// Any obstacle blocks `rect` for `mover`
pub fn blocked(rect: &Rect, obstacles: &[Obstacle], mover: Mover) -> bool {
    obstacles.iter().any(|o| o.blocks(rect, mover))
}

/// Index of the first tree whose trunk `rect` touches (bullets stop on trees)
pub fn tree_hit(rect: &Rect, obstacles: &[Obstacle]) -> Option<usize> {
    obstacles.iter().position(|o| o.is_tree() && o.collides(rect))
}

/// Apply `delta` to `rect`: full step if clear, else slide along x, else along y,
/// else stay put
pub fn commit_move(rect: Rect, delta: Vec2, obstacles: &[Obstacle], mover: Mover) -> MoveOutcome {
    let full = rect.translated(delta);
    if !blocked(&full, obstacles, mover) {
        return MoveOutcome { rect: full, blocked: false };
    }
    for axis in [Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)] {
        if axis == Vec2::ZERO {
            continue;
        }
        let slid = rect.translated(axis);
        if !blocked(&slid, obstacles, mover) {
            return MoveOutcome { rect: slid, blocked: true };
        }
    }
    MoveOutcome { rect, blocked: true }
}

/// Apply `delta` only if the destination is clear (the player never slides)
pub fn commit_or_revert(rect: Rect, delta: Vec2, obstacles: &[Obstacle], mover: Mover) -> MoveOutcome {
    let next = rect.translated(delta);
    if blocked(&next, obstacles, mover) {
        MoveOutcome { rect, blocked: true }
    } else {
        MoveOutcome { rect: next, blocked: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityId;

    fn rock(x: f32, y: f32, w: f32, h: f32) -> Obstacle {
        Obstacle {
            id: EntityId(1),
            rect: Rect::new(x, y, w, h),
            kind: ObstacleKind::Rock,
            active: true,
        }
    }

    fn tree(x: f32, y: f32) -> Obstacle {
        Obstacle {
            id: EntityId(2),
            rect: Rect::new(x, y, 60.0, 90.0),
            kind: ObstacleKind::Tree(TreeState {
                health: 5,
                breaking_ms: None,
                fall_direction: 1.0,
                chopped: false,
            }),
            active: true,
        }
    }

    #[test]
    fn test_tree_collides_with_trunk_only() {
        let t = tree(100.0, 100.0);
        // Canopy area
        assert!(!t.collides(&Rect::new(100.0, 100.0, 10.0, 10.0)));
        // Trunk area: x 118..142, y 149.5..176.5
        assert!(t.collides(&Rect::new(125.0, 155.0, 5.0, 5.0)));
    }

    #[test]
    fn test_boss_ignores_trees_but_not_rocks() {
        let obstacles = vec![tree(100.0, 100.0), rock(300.0, 100.0, 40.0, 40.0)];
        let trunk = Rect::new(125.0, 155.0, 5.0, 5.0);
        assert!(blocked(&trunk, &obstacles, Mover::Walker));
        assert!(!blocked(&trunk, &obstacles, Mover::Boss));
        let on_rock = Rect::new(310.0, 110.0, 5.0, 5.0);
        assert!(blocked(&on_rock, &obstacles, Mover::Boss));
    }

    #[test]
    fn test_lake_collides_by_segment() {
        let lake = Obstacle {
            id: EntityId(3),
            rect: Rect::new(0.0, 0.0, 200.0, 200.0),
            kind: ObstacleKind::Lake {
                segments: vec![Rect::new(0.0, 0.0, 100.0, 100.0), Rect::new(100.0, 100.0, 100.0, 100.0)],
            },
            active: true,
        };
        assert!(lake.collides(&Rect::new(50.0, 50.0, 10.0, 10.0)));
        // Inside the bounding box but between segments
        assert!(!lake.collides(&Rect::new(150.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_commit_move_slides_along_wall() {
        let wall = vec![rock(0.0, -20.0, 200.0, 20.0)];
        let mover = Rect::new(50.0, 0.0, 10.0, 10.0);
        let out = commit_move(mover, Vec2::new(3.0, -3.0), &wall, Mover::Walker);
        assert!(out.blocked);
        assert_eq!(out.rect.pos, Vec2::new(53.0, 0.0));
    }

    #[test]
    fn test_commit_move_stays_when_cornered() {
        let walls = vec![rock(0.0, -20.0, 200.0, 20.0), rock(60.0, 0.0, 20.0, 100.0)];
        let mover = Rect::new(50.0, 0.0, 10.0, 10.0);
        let out = commit_move(mover, Vec2::new(3.0, -3.0), &walls, Mover::Walker);
        assert_eq!(out.rect, mover);
    }

    #[test]
    fn test_breaking_tree_is_passable() {
        let mut t = tree(100.0, 100.0);
        if let ObstacleKind::Tree(state) = &mut t.kind {
            state.breaking_ms = Some(10.0);
        }
        assert!(!t.collides(&Rect::new(125.0, 155.0, 5.0, 5.0)));
    }
}
