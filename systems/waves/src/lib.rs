#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure wave progression system.
//!
//! The queue owns the configured wave definitions and consumes them front to
//! back. It starts the first wave when the simulation starts and each
//! following wave only when the world reports that the tracked wave cleared.
//! An exhausted queue stays idle permanently.

use std::collections::VecDeque;

use wave_warden_core::{Command, Event, SubscriptionId, WaveDefinition, WaveId};

/// Progress of the wave flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueState {
    /// No wave is in flight.
    Idle,
    /// A wave was requested but the world has not confirmed it yet.
    Starting(WaveId),
    /// The wave's spawns are still being issued.
    Spawning(WaveId),
    /// Every spawn was issued and the wave waits for its last member to die.
    WaitingForClear(WaveId),
}

/// Ordered, destructively consumed list of wave definitions.
#[derive(Debug)]
pub struct WaveQueue {
    pending: VecDeque<WaveDefinition>,
    next_wave: WaveId,
    state: QueueState,
    subscription: SubscriptionId,
    subscribed: bool,
}

impl WaveQueue {
    /// Creates a queue that listens for cleared waves under `subscription`.
    #[must_use]
    pub fn new(
        waves: impl IntoIterator<Item = WaveDefinition>,
        subscription: SubscriptionId,
    ) -> Self {
        Self {
            pending: waves.into_iter().collect(),
            next_wave: WaveId::new(0),
            state: QueueState::Idle,
            subscription,
            subscribed: false,
        }
    }

    /// Current progress of the wave flow.
    #[must_use]
    pub fn state(&self) -> QueueState {
        self.state
    }

    /// Number of waves that have not been started yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Consumes events and requests the next wave when appropriate.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SimulationStarted => {
                    if !self.subscribed {
                        self.subscribed = true;
                        out.push(Command::SubscribeWaveCleared {
                            subscription: self.subscription,
                        });
                    }
                    if self.state == QueueState::Idle {
                        self.start_next(out);
                    }
                }
                Event::WaveStarted { wave, .. } => {
                    self.state = QueueState::Spawning(*wave);
                }
                Event::SpawningFinished { wave } => {
                    if self.state == QueueState::Spawning(*wave) {
                        self.state = QueueState::WaitingForClear(*wave);
                    }
                }
                Event::WaveCleared { wave, subscription } => {
                    if *subscription != self.subscription {
                        continue;
                    }
                    if self.state != QueueState::WaitingForClear(*wave) {
                        tracing::warn!(
                            wave = wave.get(),
                            state = ?self.state,
                            "cleared signal for a wave that is not awaited"
                        );
                        continue;
                    }
                    self.state = QueueState::Idle;
                    self.start_next(out);
                }
                Event::ShutdownCompleted { .. } => {
                    self.state = QueueState::Idle;
                    self.subscribed = false;
                }
                _ => {}
            }
        }
    }

    /// Requests the front definition as the next wave, if any remains.
    pub fn start_next(&mut self, out: &mut Vec<Command>) {
        let Some(definition) = self.pending.pop_front() else {
            tracing::info!(started = self.next_wave.get(), "wave queue exhausted");
            return;
        };

        let wave = self.next_wave;
        self.next_wave = wave.next();
        self.state = QueueState::Starting(wave);
        out.push(Command::BeginWave { wave, definition });
    }
}
