#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure lifecycle system that binds each spawned entity's death to its
//! return to the pool.
//!
//! Every `EntitySpawned` event registers a single-fire death subscription.
//! When that subscription is delivered the binder releases the entity,
//! removes it from the wave and revokes the subscription, in that order.
//! A binding is consumed by its first delivery, so repeated death signals
//! for the same activation produce no further commands.

use std::collections::BTreeMap;

use wave_warden_core::{Command, EntityHandle, Event, SubscriptionId};

/// Tracks the death subscription registered for every live entity.
#[derive(Debug, Default)]
pub struct LifecycleBinder {
    bindings: BTreeMap<EntityHandle, SubscriptionId>,
    next_subscription: u32,
}

impl LifecycleBinder {
    /// Creates a binder without any bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities whose death is still awaited.
    #[must_use]
    pub fn bound(&self) -> usize {
        self.bindings.len()
    }

    /// Subscription registered for the entity, if it is still bound.
    #[must_use]
    pub fn binding(&self, handle: EntityHandle) -> Option<SubscriptionId> {
        self.bindings.get(&handle).copied()
    }

    /// Consumes events and emits the commands that keep pool and wave in step.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::EntitySpawned { handle, .. } => self.bind(*handle, out),
                Event::DeathSignalled {
                    handle,
                    subscription,
                } => self.on_death(*handle, *subscription, out),
                Event::ShutdownCompleted { .. } => {
                    if !self.bindings.is_empty() {
                        tracing::warn!(
                            bound = self.bindings.len(),
                            "pool shut down with live bindings"
                        );
                        self.bindings.clear();
                    }
                }
                _ => {}
            }
        }
    }

    /// Revokes every outstanding death subscription.
    pub fn teardown(&mut self, out: &mut Vec<Command>) {
        let bindings = std::mem::take(&mut self.bindings);
        tracing::debug!(bound = bindings.len(), "revoking death subscriptions");
        out.extend(
            bindings
                .into_iter()
                .map(|(handle, subscription)| Command::UnsubscribeDeath {
                    handle,
                    subscription,
                }),
        );
    }

    fn bind(&mut self, handle: EntityHandle, out: &mut Vec<Command>) {
        let subscription = SubscriptionId::new(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);

        if let Some(previous) = self.bindings.insert(handle, subscription) {
            tracing::warn!(
                slot = handle.slot(),
                previous = previous.get(),
                "entity was already bound"
            );
        }
        out.push(Command::SubscribeDeath {
            handle,
            subscription,
        });
    }

    fn on_death(
        &mut self,
        handle: EntityHandle,
        subscription: SubscriptionId,
        out: &mut Vec<Command>,
    ) {
        if self.bindings.get(&handle) != Some(&subscription) {
            tracing::debug!(
                slot = handle.slot(),
                subscription = subscription.get(),
                "death signal without binding ignored"
            );
            return;
        }
        let _ = self.bindings.remove(&handle);

        out.push(Command::ReleaseEntity { handle });
        out.push(Command::RemoveFromWave { handle });
        out.push(Command::UnsubscribeDeath {
            handle,
            subscription,
        });
    }
}

#[cfg(test)]
mod tests {
    use wave_warden_core::{Vec3, WaveId};

    use super::*;

    fn spawned(handle: EntityHandle) -> Event {
        Event::EntitySpawned {
            handle,
            wave: WaveId::new(0),
            position: Vec3::ZERO,
            reused: false,
        }
    }

    #[test]
    fn each_spawn_gets_its_own_subscription() {
        let mut binder = LifecycleBinder::new();
        let mut commands = Vec::new();
        let first = EntityHandle::new(0, 1);
        let second = EntityHandle::new(1, 1);

        binder.handle(&[spawned(first), spawned(second)], &mut commands);

        assert_eq!(
            commands,
            vec![
                Command::SubscribeDeath {
                    handle: first,
                    subscription: SubscriptionId::new(0),
                },
                Command::SubscribeDeath {
                    handle: second,
                    subscription: SubscriptionId::new(1),
                },
            ]
        );
        assert_eq!(binder.bound(), 2);
    }

    #[test]
    fn foreign_subscription_is_ignored() {
        let mut binder = LifecycleBinder::new();
        let mut commands = Vec::new();
        let handle = EntityHandle::new(0, 1);
        binder.handle(&[spawned(handle)], &mut commands);
        commands.clear();

        binder.handle(
            &[Event::DeathSignalled {
                handle,
                subscription: SubscriptionId::new(42),
            }],
            &mut commands,
        );

        assert!(commands.is_empty());
        assert_eq!(binder.binding(handle), Some(SubscriptionId::new(0)));
    }
}
