#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that paces a wave's spawns over its period.
//!
//! Each started wave issues its first spawn immediately and the rest one
//! interval apart, where the interval is the wave's period divided by its
//! count. Time only advances through `TimeAdvanced` events, so a paused
//! clock suspends the wave and [`SpawnScheduler::cancel`] drops the pending
//! wait without further output.

use std::time::Duration;

use wave_warden_core::{Command, Event, NavigableSurface, ObstructionQuery, WaveDefinition, WaveId};
use wave_warden_system_placement::{PlacementError, PlacementRequest, PlacementSampler};

/// Spatial collaborators and inputs used to place each spawn.
#[derive(Debug)]
pub struct SpawnSite<'a, S: ?Sized, O: ?Sized> {
    /// Navigable surface the entity must stand on.
    pub surface: &'a S,
    /// Geometry used for the sight test.
    pub occluders: &'a O,
    /// Observer, agent clearance and sight filter.
    pub request: PlacementRequest,
}

/// Snapshot of the wave currently being spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingSpawns {
    /// Wave being spawned.
    pub wave: WaveId,
    /// Spawns still to be issued.
    pub remaining: u32,
    /// Time left until the next spawn is due.
    pub next_in: Duration,
    /// Consecutive ticks on which placement ran out of attempts.
    pub failed_attempts: u32,
}

/// Pure system that turns a started wave into spaced spawn commands.
#[derive(Debug, Default)]
pub struct SpawnScheduler {
    run: Option<SpawnRun>,
}

#[derive(Clone, Copy, Debug)]
struct SpawnRun {
    wave: WaveId,
    remaining: u32,
    interval: Duration,
    elapsed: Duration,
    next_due: Duration,
    failed_attempts: u32,
}

impl SpawnRun {
    fn new(wave: WaveId, definition: WaveDefinition) -> Self {
        Self {
            wave,
            remaining: definition.spawn_count().get(),
            interval: definition.spawn_interval(),
            elapsed: Duration::ZERO,
            next_due: Duration::ZERO,
            failed_attempts: 0,
        }
    }

    fn is_due(&self) -> bool {
        self.remaining > 0 && self.elapsed >= self.next_due
    }
}

impl SpawnScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes the wave being spawned, if any.
    #[must_use]
    pub fn pending(&self) -> Option<PendingSpawns> {
        self.run.map(|run| PendingSpawns {
            wave: run.wave,
            remaining: run.remaining,
            next_in: run.next_due.saturating_sub(run.elapsed),
            failed_attempts: run.failed_attempts,
        })
    }

    /// Abandons the wave being spawned, returning it.
    pub fn cancel(&mut self) -> Option<WaveId> {
        let run = self.run.take()?;
        tracing::debug!(
            wave = run.wave.get(),
            remaining = run.remaining,
            "spawn wait cancelled"
        );
        Some(run.wave)
    }

    /// Consumes events and emits the spawns that became due.
    ///
    /// A fatal placement error is returned immediately. A placement that ran
    /// out of attempts leaves the spawn due so it is retried on the next
    /// `TimeAdvanced`, and [`PendingSpawns::failed_attempts`] counts the
    /// stalled ticks. Spawns that fell due while placement was failing, or
    /// within one long frame, are all issued together once placement
    /// succeeds again.
    pub fn handle<S, O>(
        &mut self,
        events: &[Event],
        site: &SpawnSite<'_, S, O>,
        sampler: &mut PlacementSampler,
        out: &mut Vec<Command>,
    ) -> Result<(), PlacementError>
    where
        S: NavigableSurface + ?Sized,
        O: ObstructionQuery + ?Sized,
    {
        let mut advanced = false;
        for event in events {
            match event {
                Event::WaveStarted { wave, definition } => {
                    if let Some(previous) = self.run {
                        tracing::warn!(
                            previous = previous.wave.get(),
                            wave = wave.get(),
                            "wave started while another was still spawning"
                        );
                    }
                    self.run = Some(SpawnRun::new(*wave, *definition));
                    advanced = true;
                }
                Event::TimeAdvanced { dt } => {
                    if let Some(run) = self.run.as_mut() {
                        run.elapsed = run.elapsed.saturating_add(*dt);
                        advanced = true;
                    }
                }
                _ => {}
            }
        }

        if advanced {
            self.issue_due(site, sampler, out)?;
        }
        Ok(())
    }

    fn issue_due<S, O>(
        &mut self,
        site: &SpawnSite<'_, S, O>,
        sampler: &mut PlacementSampler,
        out: &mut Vec<Command>,
    ) -> Result<(), PlacementError>
    where
        S: NavigableSurface + ?Sized,
        O: ObstructionQuery + ?Sized,
    {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };

        while run.is_due() {
            let position = match sampler.sample(site.surface, site.occluders, &site.request) {
                Ok(position) => position,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    run.failed_attempts = run.failed_attempts.saturating_add(1);
                    if run.failed_attempts == 1 {
                        tracing::warn!(
                            wave = run.wave.get(),
                            %error,
                            "placement failed, retrying on next tick"
                        );
                    } else {
                        tracing::debug!(
                            wave = run.wave.get(),
                            failed_attempts = run.failed_attempts,
                            %error,
                            "placement still failing"
                        );
                    }
                    return Ok(());
                }
            };

            if run.failed_attempts > 0 {
                tracing::info!(
                    wave = run.wave.get(),
                    failed_attempts = run.failed_attempts,
                    "placement recovered"
                );
                run.failed_attempts = 0;
            }

            out.push(Command::SpawnEntity {
                wave: run.wave,
                position,
            });
            run.remaining -= 1;
            run.next_due = run.next_due.saturating_add(run.interval);
        }

        if run.remaining == 0 {
            let wave = run.wave;
            out.push(Command::FinishSpawning { wave });
            self.run = None;
            tracing::debug!(wave = wave.get(), "all spawns issued");
        }
        Ok(())
    }
}
