//! Live membership of the wave currently being fought.

use std::collections::BTreeSet;

use wave_warden_core::{EntityHandle, Signal, SubscriptionId, WaveId};

/// Progress of the tracked wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackerPhase {
    /// No wave has been tracked since creation or the last reset.
    Idle,
    /// The wave is still issuing spawns.
    Spawning,
    /// Every spawn was issued and at least one member is alive.
    Spawned,
    /// The membership emptied after spawning finished.
    Cleared,
}

/// Long-lived tracker reused across every wave.
///
/// Holds only the membership of the current wave and raises the cleared
/// signal once per wave, when the membership becomes empty after all of the
/// wave's spawns were issued.
#[derive(Debug)]
pub struct WaveTracker {
    wave: Option<WaveId>,
    phase: TrackerPhase,
    members: BTreeSet<EntityHandle>,
    cleared: Signal,
}

impl Default for WaveTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveTracker {
    /// Creates an idle tracker without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wave: None,
            phase: TrackerPhase::Idle,
            members: BTreeSet::new(),
            cleared: Signal::new(),
        }
    }

    /// Registers a persistent subscriber for the cleared signal.
    pub fn subscribe_cleared(&mut self, subscription: SubscriptionId) -> bool {
        self.cleared.subscribe(subscription)
    }

    /// Starts tracking the provided wave.
    ///
    /// Returns `false` while another wave is still spawning or alive.
    pub fn begin(&mut self, wave: WaveId) -> bool {
        if matches!(self.phase, TrackerPhase::Spawning | TrackerPhase::Spawned) {
            return false;
        }

        debug_assert!(self.members.is_empty(), "cleared wave left members behind");
        self.wave = Some(wave);
        self.phase = TrackerPhase::Spawning;
        true
    }

    /// Adds a member, returning whether it was newly inserted.
    ///
    /// Members are only accepted while the wave is spawning.
    pub fn add(&mut self, handle: EntityHandle) -> bool {
        if self.phase != TrackerPhase::Spawning {
            return false;
        }
        self.members.insert(handle)
    }

    /// Removes a member, returning the wave it belonged to.
    ///
    /// Removing an unknown handle does nothing.
    pub fn remove(&mut self, handle: EntityHandle) -> Option<WaveId> {
        if self.members.remove(&handle) {
            self.wave
        } else {
            None
        }
    }

    /// Marks the spawning of `wave` as complete.
    pub fn finish_spawning(&mut self, wave: WaveId) -> bool {
        if self.wave != Some(wave) || self.phase != TrackerPhase::Spawning {
            return false;
        }

        self.phase = TrackerPhase::Spawned;
        true
    }

    /// Raises the cleared signal if the wave just became clear.
    ///
    /// Recipients are appended to `out` in registration order. Returns the
    /// cleared wave; subsequent calls return `None` until a new wave begins.
    pub fn take_cleared(&mut self, out: &mut Vec<SubscriptionId>) -> Option<WaveId> {
        if self.phase != TrackerPhase::Spawned || !self.members.is_empty() {
            return None;
        }

        self.phase = TrackerPhase::Cleared;
        self.cleared.fire(out);
        self.wave
    }

    /// Forgets the wave, its members and every cleared subscriber.
    pub fn reset(&mut self) {
        self.members.clear();
        let _ = self.cleared.clear();
        self.wave = None;
        self.phase = TrackerPhase::Idle;
    }

    /// Wave currently tracked, if any.
    #[must_use]
    pub fn current(&self) -> Option<WaveId> {
        self.wave
    }

    /// Progress of the tracked wave.
    #[must_use]
    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    /// Members of the current wave in handle order.
    pub fn members(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.members.iter().copied()
    }

    /// Number of live members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether the membership is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(slot: u32) -> EntityHandle {
        EntityHandle::new(slot, 1)
    }

    fn tracker_with_subscriber() -> WaveTracker {
        let mut tracker = WaveTracker::new();
        assert!(tracker.subscribe_cleared(SubscriptionId::new(0)));
        tracker
    }

    #[test]
    fn add_is_idempotent() {
        let mut tracker = WaveTracker::new();
        assert!(tracker.begin(WaveId::new(0)));
        assert!(tracker.add(handle(0)));
        assert!(!tracker.add(handle(0)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn add_is_refused_outside_spawning() {
        let mut tracker = tracker_with_subscriber();
        let wave = WaveId::new(0);
        assert!(!tracker.add(handle(0)));

        assert!(tracker.begin(wave));
        assert!(tracker.add(handle(1)));
        assert!(tracker.finish_spawning(wave));
        assert!(!tracker.add(handle(2)));

        let _ = tracker.remove(handle(1));
        let mut delivered = Vec::new();
        assert_eq!(tracker.take_cleared(&mut delivered), Some(wave));
        assert!(!tracker.add(handle(3)));
        assert!(tracker.is_empty());
        assert!(tracker.begin(WaveId::new(1)));
    }

    #[test]
    fn cleared_fires_once_after_last_member_leaves() {
        let mut tracker = tracker_with_subscriber();
        let wave = WaveId::new(0);
        assert!(tracker.begin(wave));
        assert!(tracker.add(handle(0)));
        assert!(tracker.add(handle(1)));
        assert!(tracker.finish_spawning(wave));

        let mut delivered = Vec::new();
        assert_eq!(tracker.remove(handle(0)), Some(wave));
        assert_eq!(tracker.take_cleared(&mut delivered), None);
        assert_eq!(tracker.remove(handle(1)), Some(wave));
        assert_eq!(tracker.take_cleared(&mut delivered), Some(wave));
        assert_eq!(tracker.take_cleared(&mut delivered), None);
        assert_eq!(delivered, vec![SubscriptionId::new(0)]);
    }

    #[test]
    fn emptying_while_spawning_does_not_clear() {
        let mut tracker = tracker_with_subscriber();
        let wave = WaveId::new(3);
        assert!(tracker.begin(wave));
        assert!(tracker.add(handle(0)));
        assert_eq!(tracker.remove(handle(0)), Some(wave));

        let mut delivered = Vec::new();
        assert_eq!(tracker.take_cleared(&mut delivered), None);
        assert!(delivered.is_empty());

        assert!(tracker.add(handle(1)));
        assert!(tracker.finish_spawning(wave));
        assert_eq!(tracker.remove(handle(1)), Some(wave));
        assert_eq!(tracker.take_cleared(&mut delivered), Some(wave));
    }

    #[test]
    fn removing_unknown_member_is_noop() {
        let mut tracker = tracker_with_subscriber();
        let wave = WaveId::new(0);
        assert!(tracker.begin(wave));
        assert!(tracker.add(handle(0)));
        assert!(tracker.finish_spawning(wave));

        assert_eq!(tracker.remove(handle(5)), None);
        let mut delivered = Vec::new();
        assert_eq!(tracker.take_cleared(&mut delivered), None);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn waves_never_overlap() {
        let mut tracker = WaveTracker::new();
        assert!(tracker.begin(WaveId::new(0)));
        assert!(!tracker.begin(WaveId::new(1)));
        assert!(tracker.add(handle(0)));
        assert!(tracker.finish_spawning(WaveId::new(0)));
        assert!(!tracker.begin(WaveId::new(1)));

        let _ = tracker.remove(handle(0));
        let mut delivered = Vec::new();
        assert_eq!(tracker.take_cleared(&mut delivered), Some(WaveId::new(0)));
        assert!(tracker.begin(WaveId::new(1)));
        assert_eq!(tracker.phase(), TrackerPhase::Spawning);
    }

    #[test]
    fn subscription_survives_across_waves() {
        let mut tracker = tracker_with_subscriber();
        let mut delivered = Vec::new();

        for index in 0..3 {
            let wave = WaveId::new(index);
            assert!(tracker.begin(wave));
            assert!(tracker.add(handle(index)));
            assert!(tracker.finish_spawning(wave));
            let _ = tracker.remove(handle(index));
            assert_eq!(tracker.take_cleared(&mut delivered), Some(wave));
        }

        assert_eq!(delivered.len(), 3);
    }
}
