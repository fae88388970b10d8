#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Wave Warden.
//!
//! The world owns the entity pool, the wave tracker, the observer and the
//! logical clock. It mutates them only through [`apply`], which broadcasts
//! the resulting [`Event`] values for systems to react to.

pub mod arena;
mod entity;
pub mod pool;
pub mod tracker;

use std::time::Duration;

use wave_warden_core::{
    Command, EntityHandle, EntityTemplate, Event, SubscriptionId, Vec3, WaveDefinition, WaveId,
};

use crate::{
    entity::{Activation, Entity},
    pool::EntityPool,
    tracker::{TrackerPhase, WaveTracker},
};

/// Represents the authoritative Wave Warden world state.
#[derive(Debug)]
pub struct World {
    started: bool,
    paused: bool,
    elapsed: Duration,
    observer: Vec3,
    template: EntityTemplate,
    pool: EntityPool<Entity, Activation>,
    tracker: WaveTracker,
    recipients: Vec<SubscriptionId>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the observer at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: false,
            paused: false,
            elapsed: Duration::ZERO,
            observer: Vec3::ZERO,
            template: EntityTemplate::default(),
            pool: EntityPool::new(entity::STRATEGIES),
            tracker: WaveTracker::new(),
            recipients: Vec::new(),
        }
    }

    fn begin_wave(&mut self, wave: WaveId, definition: WaveDefinition, out: &mut Vec<Event>) {
        if !self.tracker.begin(wave) {
            tracing::warn!(
                wave = wave.get(),
                current = ?self.tracker.current(),
                "refusing to begin a wave while another is in progress"
            );
            return;
        }

        tracing::info!(
            wave = wave.get(),
            spawn_count = definition.spawn_count().get(),
            spawn_period = ?definition.spawn_period(),
            "wave started"
        );
        out.push(Event::WaveStarted { wave, definition });
    }

    fn spawn_entity(&mut self, wave: WaveId, position: Vec3, out: &mut Vec<Event>) {
        let spawning = self.tracker.phase() == TrackerPhase::Spawning;
        if self.tracker.current() != Some(wave) || !spawning {
            tracing::warn!(
                wave = wave.get(),
                phase = ?self.tracker.phase(),
                "ignoring spawn for a wave that is not spawning"
            );
            return;
        }

        let activation = Activation {
            position,
            wave,
            template: self.template,
        };
        let acquired = self.pool.acquire(&activation);
        let inserted = self.tracker.add(acquired.handle);
        debug_assert!(inserted, "fresh activation already in membership");

        tracing::debug!(
            wave = wave.get(),
            slot = acquired.handle.slot(),
            reused = acquired.reused,
            "entity spawned"
        );
        out.push(Event::EntitySpawned {
            handle: acquired.handle,
            wave,
            position,
            reused: acquired.reused,
        });
    }

    fn damage_entity(
        &mut self,
        handle: EntityHandle,
        amount: f32,
        impulse: Vec3,
        out: &mut Vec<Event>,
    ) {
        let Some(entity) = self.pool.get_mut(handle) else {
            tracing::trace!(slot = handle.slot(), "damage on inactive entity ignored");
            return;
        };

        entity.body.velocity += impulse;
        if !entity.vitality.absorb(amount) {
            return;
        }

        entity.body.kinematic = true;
        self.recipients.clear();
        entity.death.fire(&mut self.recipients);
        for subscription in self.recipients.drain(..) {
            out.push(Event::DeathSignalled {
                handle,
                subscription,
            });
        }
    }

    fn remove_from_wave(&mut self, handle: EntityHandle, out: &mut Vec<Event>) {
        let Some(wave) = self.tracker.remove(handle) else {
            tracing::trace!(slot = handle.slot(), "removal of non-member ignored");
            return;
        };

        out.push(Event::EntityRemoved { handle, wave });
        self.raise_cleared(out);
    }

    fn raise_cleared(&mut self, out: &mut Vec<Event>) {
        self.recipients.clear();
        let Some(wave) = self.tracker.take_cleared(&mut self.recipients) else {
            return;
        };

        tracing::info!(wave = wave.get(), "wave cleared");
        for subscription in self.recipients.drain(..) {
            out.push(Event::WaveCleared { wave, subscription });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartSimulation => {
            if world.started {
                return;
            }
            world.started = true;
            out_events.push(Event::SimulationStarted);
        }
        Command::Tick { dt } => {
            if world.paused {
                return;
            }
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::MoveObserver { position } => {
            world.observer = position;
        }
        Command::ConfigureTemplate { template } => {
            world.template = template;
        }
        Command::SubscribeWaveCleared { subscription } => {
            if !world.tracker.subscribe_cleared(subscription) {
                tracing::debug!(
                    subscription = subscription.get(),
                    "cleared subscription already registered"
                );
            }
        }
        Command::BeginWave { wave, definition } => {
            world.begin_wave(wave, definition, out_events);
        }
        Command::SpawnEntity { wave, position } => {
            world.spawn_entity(wave, position, out_events);
        }
        Command::FinishSpawning { wave } => {
            if world.tracker.finish_spawning(wave) {
                out_events.push(Event::SpawningFinished { wave });
                world.raise_cleared(out_events);
            }
        }
        Command::SubscribeDeath {
            handle,
            subscription,
        } => {
            let registered = world
                .pool
                .get_mut(handle)
                .map_or(false, |entity| entity.death.subscribe_once(subscription));
            if !registered {
                tracing::debug!(
                    slot = handle.slot(),
                    subscription = subscription.get(),
                    "death subscription refused"
                );
            }
        }
        Command::UnsubscribeDeath {
            handle,
            subscription,
        } => {
            if let Some(entity) = world.pool.get_retained_mut(handle) {
                let _ = entity.death.unsubscribe(subscription);
            }
        }
        Command::DamageEntity {
            handle,
            amount,
            impulse,
        } => {
            world.damage_entity(handle, amount, impulse, out_events);
        }
        Command::RevealEntity { handle } => {
            if let Some(entity) = world.pool.get_mut(handle) {
                entity.visible = true;
            }
        }
        Command::ReleaseEntity { handle } => {
            if world.pool.release(handle) {
                out_events.push(Event::EntityReleased { handle });
            } else {
                tracing::trace!(slot = handle.slot(), "release of inactive entity ignored");
            }
        }
        Command::RemoveFromWave { handle } => {
            world.remove_from_wave(handle, out_events);
        }
        Command::TrimPool { retain } => {
            let disposed = world.pool.trim(retain);
            out_events.push(Event::PoolTrimmed { disposed });
        }
        Command::Shutdown => {
            let disposed = world.pool.shutdown();
            world.tracker.reset();
            world.started = false;
            tracing::info!(disposed, "world shut down");
            out_events.push(Event::ShutdownCompleted { disposed });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use wave_warden_core::{EntityHandle, EntitySnapshot, EntityTemplate, Vec3, WaveId};

    use super::World;
    use crate::{entity::Entity, pool::PoolStats, tracker::TrackerPhase};

    /// Total simulated time that elapsed while the clock was running.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Reports whether the logical clock is frozen.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Position of the observer spawned entities must be hidden from.
    #[must_use]
    pub fn observer(world: &World) -> Vec3 {
        world.observer
    }

    /// Template applied to entities on activation.
    #[must_use]
    pub fn template(world: &World) -> EntityTemplate {
        world.template
    }

    /// Captures a snapshot of the active entity addressed by the handle.
    #[must_use]
    pub fn entity(world: &World, handle: EntityHandle) -> Option<EntitySnapshot> {
        world
            .pool
            .get(handle)
            .map(|entity| snapshot(handle, entity))
    }

    /// Captures snapshots of every active entity in handle order.
    #[must_use]
    pub fn entity_view(world: &World) -> Vec<EntitySnapshot> {
        let mut snapshots: Vec<EntitySnapshot> = world
            .pool
            .iter_active()
            .map(|(handle, entity)| snapshot(handle, entity))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.handle);
        snapshots
    }

    /// Number of death subscriptions registered on the active entity.
    #[must_use]
    pub fn death_subscriptions(world: &World, handle: EntityHandle) -> usize {
        world
            .pool
            .get(handle)
            .map_or(0, |entity| entity.death.len())
    }

    /// Occupancy counters of the entity pool.
    #[must_use]
    pub fn pool_stats(world: &World) -> PoolStats {
        world.pool.stats()
    }

    /// Wave currently tracked, if any.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveId> {
        world.tracker.current()
    }

    /// Progress of the tracked wave.
    #[must_use]
    pub fn tracker_phase(world: &World) -> TrackerPhase {
        world.tracker.phase()
    }

    /// Members of the current wave in handle order.
    #[must_use]
    pub fn wave_members(world: &World) -> Vec<EntityHandle> {
        world.tracker.members().collect()
    }

    fn snapshot(handle: EntityHandle, entity: &Entity) -> EntitySnapshot {
        EntitySnapshot {
            handle,
            wave: entity.wave,
            position: entity.position,
            visible: entity.visible,
            target: entity.target,
            velocity: entity.body.velocity,
            kinematic: entity.body.kinematic,
            damage: entity.vitality.damage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn definition(count: u32) -> WaveDefinition {
        WaveDefinition::new(
            NonZeroU32::new(count).expect("non-zero"),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn paused_clock_does_not_advance() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::SetPaused { paused: true }, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );

        assert_eq!(events, vec![Event::PauseChanged { paused: true }]);
        assert_eq!(query::elapsed(&world), Duration::ZERO);

        events.clear();
        apply(&mut world, Command::SetPaused { paused: false }, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        assert_eq!(query::elapsed(&world), Duration::from_millis(250));
    }

    #[test]
    fn start_is_announced_once() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::StartSimulation, &mut events);
        apply(&mut world, Command::StartSimulation, &mut events);
        assert_eq!(events, vec![Event::SimulationStarted]);
    }

    #[test]
    fn spawn_for_untracked_wave_is_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEntity {
                wave: WaveId::new(0),
                position: Vec3::ZERO,
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::pool_stats(&world).active, 0);
    }

    #[test]
    fn second_wave_cannot_begin_while_first_alive() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BeginWave {
                wave: WaveId::new(0),
                definition: definition(1),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::BeginWave {
                wave: WaveId::new(1),
                definition: definition(1),
            },
            &mut events,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(query::current_wave(&world), Some(WaveId::new(0)));
    }
}
