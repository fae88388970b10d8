#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wave Warden engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.
//!
//! The spatial collaborators that decide where an entity may appear are
//! described by the [`NavigableSurface`] and [`ObstructionQuery`] traits; the
//! engine only consumes their request/response contracts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod geometry;
mod signal;
mod wave;

pub use geometry::{Aabb, Category, CategoryMask, NavigableSurface, ObstructionQuery};
pub use glam::Vec3;
pub use signal::Signal;
pub use wave::{WaveConfigError, WaveDefinition};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Announces that the wave flow should begin.
    StartSimulation,
    /// Advances the logical clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Freezes or resumes the logical clock.
    SetPaused {
        /// Whether the clock should stop advancing.
        paused: bool,
    },
    /// Moves the observer that spawned entities must stay hidden from.
    MoveObserver {
        /// New world-space position of the observer.
        position: Vec3,
    },
    /// Replaces the template applied to entities on their next activation.
    ConfigureTemplate {
        /// Template describing agent clearance and durability.
        template: EntityTemplate,
    },
    /// Registers a persistent subscriber for the wave-cleared signal.
    SubscribeWaveCleared {
        /// Identifier chosen by the subscriber.
        subscription: SubscriptionId,
    },
    /// Makes the provided wave the one tracked by the world.
    BeginWave {
        /// Sequential identifier of the wave.
        wave: WaveId,
        /// Count and pacing of the wave.
        definition: WaveDefinition,
    },
    /// Acquires a pooled entity, places it and adds it to the wave membership.
    SpawnEntity {
        /// Wave the entity belongs to.
        wave: WaveId,
        /// Navigable point the entity should occupy.
        position: Vec3,
    },
    /// Declares that every spawn of the wave has been issued.
    FinishSpawning {
        /// Wave whose spawning completed.
        wave: WaveId,
    },
    /// Registers a single-fire subscriber for an entity's death signal.
    SubscribeDeath {
        /// Entity whose death should be reported.
        handle: EntityHandle,
        /// Identifier chosen by the subscriber.
        subscription: SubscriptionId,
    },
    /// Revokes a death-signal subscription. Unknown subscriptions are ignored.
    UnsubscribeDeath {
        /// Entity the subscription was registered on.
        handle: EntityHandle,
        /// Subscription to revoke.
        subscription: SubscriptionId,
    },
    /// Deals damage and applies an impulse to an active entity.
    DamageEntity {
        /// Entity receiving the damage.
        handle: EntityHandle,
        /// Amount added to the entity's cumulative damage.
        amount: f32,
        /// Velocity change applied to the entity's body.
        impulse: Vec3,
    },
    /// Turns on the visible state of an active entity.
    RevealEntity {
        /// Entity to reveal.
        handle: EntityHandle,
    },
    /// Returns an entity to the pool.
    ReleaseEntity {
        /// Entity to deactivate.
        handle: EntityHandle,
    },
    /// Removes an entity from the current wave membership.
    RemoveFromWave {
        /// Entity to remove.
        handle: EntityHandle,
    },
    /// Permanently disposes idle pool instances beyond the retained count.
    TrimPool {
        /// Number of idle instances kept for reuse.
        retain: usize,
    },
    /// Disposes every pool instance and resets the wave tracker.
    Shutdown,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the wave flow has begun.
    SimulationStarted,
    /// Indicates that the logical clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the clock was paused or resumed.
    PauseChanged {
        /// Whether the clock is now frozen.
        paused: bool,
    },
    /// Confirms that the world now tracks the provided wave.
    WaveStarted {
        /// Sequential identifier of the wave.
        wave: WaveId,
        /// Count and pacing of the wave.
        definition: WaveDefinition,
    },
    /// Confirms that an entity was acquired, placed and added to the wave.
    EntitySpawned {
        /// Handle of the activated entity.
        handle: EntityHandle,
        /// Wave the entity belongs to.
        wave: WaveId,
        /// Position the entity was placed at.
        position: Vec3,
        /// Whether an idle pool instance was reused.
        reused: bool,
    },
    /// Confirms that the tracked wave issued all of its spawns.
    SpawningFinished {
        /// Wave whose spawning completed.
        wave: WaveId,
    },
    /// Delivers an entity's death signal to one subscriber.
    DeathSignalled {
        /// Entity that died.
        handle: EntityHandle,
        /// Subscriber receiving the signal.
        subscription: SubscriptionId,
    },
    /// Confirms that an entity was returned to the pool.
    EntityReleased {
        /// Handle that is no longer active.
        handle: EntityHandle,
    },
    /// Confirms that an entity left the wave membership.
    EntityRemoved {
        /// Handle that left the membership.
        handle: EntityHandle,
        /// Wave the entity belonged to.
        wave: WaveId,
    },
    /// Delivers the wave-cleared signal to one subscriber.
    WaveCleared {
        /// Wave whose membership emptied.
        wave: WaveId,
        /// Subscriber receiving the signal.
        subscription: SubscriptionId,
    },
    /// Reports how many idle instances a trim disposed.
    PoolTrimmed {
        /// Number of disposed instances.
        disposed: usize,
    },
    /// Confirms that every pool instance was disposed.
    ShutdownCompleted {
        /// Number of disposed instances.
        disposed: usize,
    },
}

/// Sequential identifier assigned to a wave as it leaves the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Identifier of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Generational reference to a pooled entity instance.
///
/// The generation changes on every activation of the slot, so a handle kept
/// from an earlier activation never addresses a later one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    slot: u32,
    generation: u32,
}

impl EntityHandle {
    /// Creates a handle addressing the provided slot and generation.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Index of the pool slot holding the instance.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Activation counter of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Identifier of a signal subscription, chosen by the subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    /// Creates a new subscription identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Destination an entity pursues once placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementTarget {
    /// Chase the observer.
    Observer,
}

/// Per-entity tuning applied on activation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityTemplate {
    /// Half of the agent's height; also the vertical offset used for sight checks.
    pub half_height: f32,
    /// Cumulative damage at which the entity raises its death signal.
    pub health: f32,
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self {
            half_height: 1.0,
            health: 100.0,
        }
    }
}

impl EntityTemplate {
    /// Radius within which a sampled point may be projected onto the navigable surface.
    #[must_use]
    pub fn projection_radius(&self) -> f32 {
        4.0 * self.half_height
    }
}

/// Immutable representation of a single active entity used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Handle of the entity.
    pub handle: EntityHandle,
    /// Wave the entity belongs to.
    pub wave: Option<WaveId>,
    /// World-space position of the entity.
    pub position: Vec3,
    /// Whether the entity is rendered.
    pub visible: bool,
    /// Destination assigned after placement.
    pub target: Option<MovementTarget>,
    /// Current velocity of the entity's body.
    pub velocity: Vec3,
    /// Whether the body is excluded from physical simulation.
    pub kinematic: bool,
    /// Cumulative damage received since activation.
    pub damage: f32,
}
