//! Box-based arena implementing the spatial collaborators.
//!
//! The arena is a flat navigable floor with box occluders standing on it. It
//! is enough to drive placement in the headless adapter and in tests; hosts
//! with real navigation meshes implement the collaborator traits themselves.

use serde::{Deserialize, Serialize};
use wave_warden_core::{Aabb, Category, CategoryMask, NavigableSurface, ObstructionQuery, Vec3};

/// Solid box that blocks sight and cannot be stood on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Occluder {
    /// World-space extent of the box.
    pub bounds: Aabb,
    /// Category the box belongs to.
    pub category: Category,
}

/// Flat floor plus occluders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticArena {
    floor: Aabb,
    floor_category: Category,
    #[serde(default)]
    occluders: Vec<Occluder>,
}

impl StaticArena {
    /// Creates an arena whose walkable top is the upper face of `floor`.
    #[must_use]
    pub fn new(floor: Aabb, floor_category: Category) -> Self {
        Self {
            floor,
            floor_category,
            occluders: Vec::new(),
        }
    }

    /// Returns the arena extended with an occluder.
    #[must_use]
    pub fn with_occluder(mut self, occluder: Occluder) -> Self {
        self.occluders.push(occluder);
        self
    }

    /// Replaces the floor, as if the navigable surface had been rebuilt.
    pub fn rebuild_floor(&mut self, floor: Aabb) {
        self.floor = floor;
    }

    /// Occluders standing in the arena.
    #[must_use]
    pub fn occluders(&self) -> &[Occluder] {
        &self.occluders
    }

    fn walkable_height(&self) -> f32 {
        self.floor.max().y
    }

    fn is_blocked(&self, point: Vec3) -> bool {
        self.occluders
            .iter()
            .any(|occluder| occluder.bounds.contains(point))
    }
}

impl NavigableSurface for StaticArena {
    fn bounds(&self) -> Aabb {
        self.floor
    }

    fn category(&self) -> Category {
        self.floor_category
    }

    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let clamped = self.floor.clamp(point);
        let candidate = Vec3::new(clamped.x, self.walkable_height(), clamped.z);
        if candidate.distance(point) > radius || self.is_blocked(candidate) {
            return None;
        }
        Some(candidate)
    }
}

impl ObstructionQuery for StaticArena {
    fn segment_obstructed(&self, from: Vec3, to: Vec3, filter: CategoryMask) -> bool {
        if filter.contains(self.floor_category) && self.floor.intersects_segment(from, to) {
            return true;
        }

        self.occluders.iter().any(|occluder| {
            filter.contains(occluder.category) && occluder.bounds.intersects_segment(from, to)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(index: u8) -> Category {
        Category::new(index).expect("category")
    }

    fn arena() -> StaticArena {
        StaticArena::new(
            Aabb::new(Vec3::new(-10.0, -1.0, -10.0), Vec3::new(10.0, 0.0, 10.0)),
            category(0),
        )
        .with_occluder(Occluder {
            bounds: Aabb::new(Vec3::new(2.0, 0.0, -10.0), Vec3::new(3.0, 5.0, 10.0)),
            category: category(1),
        })
    }

    #[test]
    fn projects_onto_floor_top() {
        let projected = arena().project(Vec3::new(-4.0, -0.5, 1.0), 4.0);
        assert_eq!(projected, Some(Vec3::new(-4.0, 0.0, 1.0)));
    }

    #[test]
    fn projection_respects_radius() {
        assert_eq!(arena().project(Vec3::new(-4.0, 6.0, 1.0), 4.0), None);
    }

    #[test]
    fn projection_rejects_occluder_footprint() {
        assert_eq!(arena().project(Vec3::new(2.5, -0.5, 0.0), 4.0), None);
    }

    #[test]
    fn occluder_blocks_sight_when_filtered() {
        let arena = arena();
        let observer = Vec3::new(-5.0, 1.0, 0.0);
        let hidden = Vec3::new(6.0, 1.0, 0.0);
        let walls = CategoryMask::NONE.with(category(1));

        assert!(arena.segment_obstructed(observer, hidden, walls));
        assert!(!arena.segment_obstructed(observer, hidden, CategoryMask::NONE));
    }

    #[test]
    fn open_floor_leaves_sight_clear() {
        let arena = arena();
        let observer = Vec3::new(-5.0, 1.0, 0.0);
        let visible = Vec3::new(-1.0, 1.0, 4.0);
        assert!(!arena.segment_obstructed(observer, visible, CategoryMask::ALL));
    }

    #[test]
    fn rebuilt_floor_changes_bounds() {
        let mut arena = arena();
        let floor = Aabb::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(4.0, 0.0, 4.0));
        arena.rebuild_floor(floor);
        assert_eq!(arena.bounds(), floor);
    }

    #[test]
    fn parses_from_toml() {
        let arena: StaticArena = toml::from_str(
            r#"
            floor_category = 0
            floor = { min = [-5.0, -1.0, -5.0], max = [5.0, 0.0, 5.0] }

            [[occluders]]
            category = 1
            bounds = { min = [1.0, 0.0, -5.0], max = [2.0, 3.0, 5.0] }
            "#,
        )
        .expect("arena parses");

        assert_eq!(arena.occluders().len(), 1);
        assert_eq!(arena.category(), category(0));
    }
}
