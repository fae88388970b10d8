#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave simulation that wires the world to its systems.
//!
//! A [`Simulation`] owns the authoritative world, the spatial environment and
//! every pure system. Each submitted command is applied to the world and the
//! resulting events are dispatched to the wave queue, the spawn scheduler
//! and the lifecycle binder. Commands produced in response are applied
//! before any later command, so the binder always subscribes to a fresh
//! entity before the next spawn is placed.

pub mod config;

use std::{collections::VecDeque, time::Duration};

use thiserror::Error;
use wave_warden_core::{
    CategoryMask, Command, EntityHandle, Event, NavigableSurface, ObstructionQuery,
    SubscriptionId, Vec3,
};
use wave_warden_system_lifecycle::LifecycleBinder;
use wave_warden_system_placement::{PlacementError, PlacementRequest, PlacementSampler};
use wave_warden_system_spawning::{PendingSpawns, SpawnScheduler, SpawnSite};
use wave_warden_system_waves::WaveQueue;
use wave_warden_world::{self as world, query, World};

pub use config::{ConfigError, SimulationConfig};
pub use wave_warden_system_waves::QueueState;

const WAVE_QUEUE_SUBSCRIPTION: SubscriptionId = SubscriptionId::new(0);

/// Failures that stop the simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Spawn placement is misconfigured.
    #[error("spawn placement failed")]
    Placement(#[from] PlacementError),
    /// The simulation was already torn down.
    #[error("simulation has been torn down")]
    TornDown,
}

/// Wave flow running against an environment providing the navigable surface
/// and the sight-blocking geometry.
#[derive(Debug)]
pub struct Simulation<E> {
    world: World,
    environment: E,
    blocking: CategoryMask,
    sampler: PlacementSampler,
    scheduler: SpawnScheduler,
    binder: LifecycleBinder,
    waves: WaveQueue,
    log: Vec<Event>,
    torn_down: bool,
}

impl<E> Simulation<E>
where
    E: NavigableSurface + ObstructionQuery,
{
    /// Creates a simulation that has not started yet.
    #[must_use]
    pub fn new(config: SimulationConfig, environment: E) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureTemplate {
                template: config.template,
            },
            &mut events,
        );
        world::apply(
            &mut world,
            Command::MoveObserver {
                position: config.observer,
            },
            &mut events,
        );

        Self {
            world,
            environment,
            blocking: config.blocking,
            sampler: PlacementSampler::new(config.placement),
            scheduler: SpawnScheduler::new(),
            binder: LifecycleBinder::new(),
            waves: WaveQueue::new(config.waves, WAVE_QUEUE_SUBSCRIPTION),
            log: events,
            torn_down: false,
        }
    }

    /// Starts the first wave.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.torn_down {
            return Err(SimulationError::TornDown);
        }
        tracing::info!(waves = self.waves.remaining(), "simulation starting");
        self.submit(Command::StartSimulation)
    }

    /// Advances the logical clock. Ignored once torn down.
    pub fn advance(&mut self, dt: Duration) -> Result<(), SimulationError> {
        if self.torn_down {
            tracing::debug!(?dt, "advance after teardown ignored");
            return Ok(());
        }
        self.submit(Command::Tick { dt })
    }

    /// Freezes or resumes the logical clock.
    pub fn set_paused(&mut self, paused: bool) -> Result<(), SimulationError> {
        self.submit(Command::SetPaused { paused })
    }

    /// Moves the observer spawns must stay hidden from.
    pub fn move_observer(&mut self, position: Vec3) -> Result<(), SimulationError> {
        self.submit(Command::MoveObserver { position })
    }

    /// Deals damage to an entity, which may raise its death signal.
    pub fn damage(
        &mut self,
        handle: EntityHandle,
        amount: f32,
        impulse: Vec3,
    ) -> Result<(), SimulationError> {
        self.submit(Command::DamageEntity {
            handle,
            amount,
            impulse,
        })
    }

    /// Makes an entity visible.
    pub fn reveal(&mut self, handle: EntityHandle) -> Result<(), SimulationError> {
        self.submit(Command::RevealEntity { handle })
    }

    /// Disposes idle pool instances beyond `retain`.
    pub fn trim_pool(&mut self, retain: usize) -> Result<(), SimulationError> {
        self.submit(Command::TrimPool { retain })
    }

    /// Cancels the pending spawn wait, revokes every death subscription and
    /// disposes the pool.
    pub fn teardown(&mut self) -> Result<(), SimulationError> {
        if self.torn_down {
            return Ok(());
        }

        if let Some(wave) = self.scheduler.cancel() {
            tracing::info!(wave = wave.get(), "spawning cancelled by teardown");
        }
        let mut commands = Vec::new();
        self.binder.teardown(&mut commands);
        commands.push(Command::Shutdown);
        for command in commands {
            self.submit(command)?;
        }

        self.torn_down = true;
        Ok(())
    }

    /// Reports whether [`Simulation::teardown`] completed.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spatial environment used for placement.
    #[must_use]
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Mutable access to the environment, e.g. to rebuild the navigable surface.
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    /// Progress of the wave queue.
    #[must_use]
    pub fn queue_state(&self) -> QueueState {
        self.waves.state()
    }

    /// Spawns still owed by the current wave.
    #[must_use]
    pub fn pending_spawns(&self) -> Option<PendingSpawns> {
        self.scheduler.pending()
    }

    /// Handles of the current wave's live members.
    #[must_use]
    pub fn live_entities(&self) -> Vec<EntityHandle> {
        query::wave_members(&self.world)
    }

    /// Every event broadcast so far, in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.log
    }

    fn submit(&mut self, command: Command) -> Result<(), SimulationError> {
        let mut queue = VecDeque::from([command]);
        let mut events = Vec::new();
        let mut responses = Vec::new();

        while let Some(command) = queue.pop_front() {
            world::apply(&mut self.world, command, &mut events);
            if events.is_empty() {
                continue;
            }

            self.log.extend_from_slice(&events);
            self.dispatch(&events, &mut responses)?;
            events.clear();

            for response in responses.drain(..).rev() {
                queue.push_front(response);
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        events: &[Event],
        out: &mut Vec<Command>,
    ) -> Result<(), SimulationError> {
        self.waves.handle(events, out);

        let site = SpawnSite {
            surface: &self.environment,
            occluders: &self.environment,
            request: PlacementRequest::for_template(
                query::observer(&self.world),
                &query::template(&self.world),
                self.blocking,
            ),
        };
        self.scheduler.handle(events, &site, &mut self.sampler, out)?;

        self.binder.handle(events, out);
        Ok(())
    }
}
