#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic placement sampler that finds hidden, navigable spawn points.
//!
//! A candidate is drawn uniformly inside the navigable bounds, projected onto
//! the navigable surface within four agent half-heights, and accepted only
//! when the sight line from the observer to the agent's mid-height is
//! obstructed. Rejected candidates are resampled up to a configured number of
//! attempts.

use std::num::NonZeroU32;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wave_warden_core::{
    Aabb, Category, CategoryMask, EntityTemplate, NavigableSurface, ObstructionQuery, Vec3,
};

const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(4_096) {
    Some(value) => value,
    None => NonZeroU32::MIN,
};
const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Configuration parameters required to construct the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Candidates drawn per placement before giving up.
    pub max_attempts: NonZeroU32,
    /// Seed of the candidate generator.
    pub seed: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Inputs of a single placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    /// Position the placed entity must be hidden from.
    pub observer: Vec3,
    /// Half of the agent's height.
    pub half_height: f32,
    /// Categories that block sight. Must include the navigable surface's.
    pub blocking: CategoryMask,
}

impl PlacementRequest {
    /// Builds a request for an agent described by `template`.
    #[must_use]
    pub fn for_template(observer: Vec3, template: &EntityTemplate, blocking: CategoryMask) -> Self {
        Self {
            observer,
            half_height: template.half_height,
            blocking,
        }
    }
}

/// Reasons a placement produced no point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The navigable surface is not part of the sight-blocking filter.
    #[error(
        "navigable surface category {} is not in the blocking filter {:#034b}",
        surface.index(),
        filter.bits()
    )]
    CategoryMismatch {
        /// Category of the navigable surface.
        surface: Category,
        /// Filter used for sight checks.
        filter: CategoryMask,
    },
    /// No candidate satisfied both constraints.
    #[error("no hidden navigable point found after {attempts} attempts")]
    Exhausted {
        /// Number of candidates drawn.
        attempts: u32,
    },
}

impl PlacementError {
    /// Reports whether retrying later can succeed.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CategoryMismatch { .. })
    }
}

/// Seeded sampler of hidden spawn points.
#[derive(Clone, Debug)]
pub struct PlacementSampler {
    rng: ChaCha8Rng,
    max_attempts: NonZeroU32,
    last_attempts: u32,
}

impl PlacementSampler {
    /// Creates a sampler using the supplied configuration.
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            max_attempts: config.max_attempts,
            last_attempts: 0,
        }
    }

    /// Candidates drawn by the most recent call to [`PlacementSampler::sample`].
    #[must_use]
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Finds a point on `surface` hidden from the request's observer.
    ///
    /// The surface bounds are read once and reused for every candidate of
    /// this call.
    pub fn sample<S, O>(
        &mut self,
        surface: &S,
        occluders: &O,
        request: &PlacementRequest,
    ) -> Result<Vec3, PlacementError>
    where
        S: NavigableSurface + ?Sized,
        O: ObstructionQuery + ?Sized,
    {
        self.last_attempts = 0;

        let category = surface.category();
        if !request.blocking.contains(category) {
            return Err(PlacementError::CategoryMismatch {
                surface: category,
                filter: request.blocking,
            });
        }

        let bounds = surface.bounds();
        let radius = 4.0 * request.half_height;
        let eye_offset = Vec3::Y * request.half_height;

        for attempt in 1..=self.max_attempts.get() {
            self.last_attempts = attempt;

            let candidate = self.uniform_point(&bounds);
            let Some(point) = surface.project(candidate, radius) else {
                continue;
            };
            if !bounds.contains(point) {
                continue;
            }
            if !occluders.segment_obstructed(request.observer, point + eye_offset, request.blocking)
            {
                continue;
            }

            tracing::trace!(attempt, ?point, "placement accepted");
            return Ok(point);
        }

        Err(PlacementError::Exhausted {
            attempts: self.max_attempts.get(),
        })
    }

    fn uniform_point(&mut self, bounds: &Aabb) -> Vec3 {
        let min = bounds.min();
        let max = bounds.max();
        Vec3::new(
            self.rng.gen_range(min.x..=max.x),
            self.rng.gen_range(min.y..=max.y),
            self.rng.gen_range(min.z..=max.z),
        )
    }
}
