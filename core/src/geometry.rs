//! Spatial vocabulary shared by the world and the placement system.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned volume expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "AabbCorners")]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Creates a volume spanning the two corners, in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Corner with the smallest coordinates.
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Corner with the largest coordinates.
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Geometric center of the volume.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the volume moved by the provided offset.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Reports whether the point lies inside or on the boundary of the volume.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the point inside the volume nearest to the provided one.
    #[must_use]
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Reports whether the segment from `from` to `to` touches the volume.
    ///
    /// Uses the slab method; a degenerate segment is tested as a point.
    #[must_use]
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let delta = to - from;
        let mut enter = 0.0_f32;
        let mut exit = 1.0_f32;

        for axis in 0..3 {
            let origin = from[axis];
            let direction = delta[axis];
            let low = self.min[axis];
            let high = self.max[axis];

            if direction.abs() <= f32::EPSILON {
                if origin < low || origin > high {
                    return false;
                }
                continue;
            }

            let inverse = 1.0 / direction;
            let mut near = (low - origin) * inverse;
            let mut far = (high - origin) * inverse;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            enter = enter.max(near);
            exit = exit.min(far);
            if enter > exit {
                return false;
            }
        }

        true
    }
}

#[derive(Deserialize)]
struct AabbCorners {
    min: Vec3,
    max: Vec3,
}

impl From<AabbCorners> for Aabb {
    fn from(corners: AabbCorners) -> Self {
        Self::new(corners.min, corners.max)
    }
}

/// Spatial layer a piece of geometry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct Category(u8);

impl Category {
    /// Number of distinct categories a [`CategoryMask`] can express.
    pub const COUNT: u8 = 32;

    /// Creates a category, returning `None` when the index does not fit a mask.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Zero-based index of the category.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Category {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| format!("category {index} exceeds {}", Self::COUNT - 1))
    }
}

/// Set of categories a spatial query takes into account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMask(u32);

impl CategoryMask {
    /// Mask that matches no category.
    pub const NONE: Self = Self(0);
    /// Mask that matches every category.
    pub const ALL: Self = Self(u32::MAX);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation of the mask.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns the mask extended with the provided category.
    #[must_use]
    pub const fn with(self, category: Category) -> Self {
        Self(self.0 | (1 << category.0))
    }

    /// Reports whether the category is part of the mask.
    #[must_use]
    pub const fn contains(&self, category: Category) -> bool {
        self.0 & (1 << category.0) != 0
    }
}

impl FromIterator<Category> for CategoryMask {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Walkable region that bounds valid spawn placement.
pub trait NavigableSurface {
    /// World-space bounds of the navigable region as currently built.
    fn bounds(&self) -> Aabb;

    /// Category the surface geometry belongs to.
    fn category(&self) -> Category;

    /// Projects the point onto the nearest navigable point within `radius`.
    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3>;
}

/// Line-of-sight test against world geometry.
pub trait ObstructionQuery {
    /// Reports whether geometry in `filter` blocks the segment from `from` to `to`.
    fn segment_obstructed(&self, from: Vec3, to: Vec3, filter: CategoryMask) -> bool;
}
