//! Generic instance pool that activates and deactivates rather than
//! constructing and destroying per use.

use std::fmt;

use wave_warden_core::EntityHandle;

/// Strategy functions that give a pool its behaviour.
///
/// `create` builds a dormant instance from the activation arguments of the
/// first acquire that needed it, `on_acquire` activates an instance for a new
/// use, `on_release` returns it to a dormant state and `dispose` consumes it
/// permanently.
pub struct PoolStrategies<T, A> {
    /// Builds a new dormant instance.
    pub create: fn(&A) -> T,
    /// Activates an instance for a new use.
    pub on_acquire: fn(&mut T, &A),
    /// Deactivates an instance that is handed back.
    pub on_release: fn(&mut T),
    /// Permanently destroys an instance.
    pub dispose: fn(T),
}

impl<T, A> Clone for PoolStrategies<T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A> Copy for PoolStrategies<T, A> {}

impl<T, A> fmt::Debug for PoolStrategies<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolStrategies").finish_non_exhaustive()
    }
}

/// Result of a successful acquire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// Handle addressing the activated instance.
    pub handle: EntityHandle,
    /// Whether an idle instance was reused instead of created.
    pub reused: bool,
}

/// Occupancy counters of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances currently handed out.
    pub active: usize,
    /// Instantiated instances waiting for reuse.
    pub idle: usize,
    /// Slots whose instance was disposed.
    pub vacant: usize,
}

#[derive(Debug)]
struct PoolSlot<T> {
    instance: Option<T>,
    active: bool,
    generation: u32,
}

/// Unbounded pool that recycles instances through generational slots.
#[derive(Debug)]
pub struct EntityPool<T, A> {
    strategies: PoolStrategies<T, A>,
    slots: Vec<PoolSlot<T>>,
    idle: Vec<u32>,
    vacant: Vec<u32>,
}

impl<T, A> EntityPool<T, A> {
    /// Creates an empty pool driven by the provided strategies.
    #[must_use]
    pub fn new(strategies: PoolStrategies<T, A>) -> Self {
        Self {
            strategies,
            slots: Vec::new(),
            idle: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Activates an idle instance, creating one when none is available.
    ///
    /// The returned handle never addresses an instance that was already active.
    pub fn acquire(&mut self, args: &A) -> Acquired {
        let (index, reused) = if let Some(index) = self.idle.pop() {
            (index, true)
        } else if let Some(index) = self.vacant.pop() {
            self.slots[index as usize].instance = Some((self.strategies.create)(args));
            (index, false)
        } else {
            self.slots.push(PoolSlot {
                instance: Some((self.strategies.create)(args)),
                active: false,
                generation: 0,
            });
            ((self.slots.len() - 1) as u32, false)
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.active, "idle list handed out an active slot");
        slot.generation = slot.generation.wrapping_add(1);
        slot.active = true;
        if let Some(instance) = slot.instance.as_mut() {
            (self.strategies.on_acquire)(instance, args);
        }

        Acquired {
            handle: EntityHandle::new(index, slot.generation),
            reused,
        }
    }

    /// Deactivates the instance so it can be reused.
    ///
    /// Returns `false` without side effects when the handle is stale or
    /// already released.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        let on_release = self.strategies.on_release;
        let Some(slot) = self.active_slot_mut(handle) else {
            return false;
        };

        if let Some(instance) = slot.instance.as_mut() {
            on_release(instance);
        }
        slot.active = false;
        self.idle.push(handle.slot());
        true
    }

    /// Reports whether the handle addresses a currently active instance.
    #[must_use]
    pub fn is_active(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Immutable access to an active instance.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        self.slots
            .get(handle.slot() as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_ref())
    }

    /// Mutable access to an active instance.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        self.active_slot_mut(handle)
            .and_then(|slot| slot.instance.as_mut())
    }

    /// Mutable access to the instance of the handle's activation, even once
    /// it has been released, as long as the slot was not reactivated or
    /// disposed since.
    pub fn get_retained_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.slot() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_mut())
    }

    /// Iterates over active instances in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (EntityHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .filter_map(|(index, slot)| {
                slot.instance
                    .as_ref()
                    .map(|instance| (EntityHandle::new(index as u32, slot.generation), instance))
            })
    }

    /// Permanently disposes idle instances beyond `retain`, least recently
    /// released first. Returns the number of disposed instances.
    pub fn trim(&mut self, retain: usize) -> usize {
        let excess = self.idle.len().saturating_sub(retain);
        let doomed: Vec<u32> = self.idle.drain(..excess).collect();
        for index in &doomed {
            if let Some(instance) = self.slots[*index as usize].instance.take() {
                (self.strategies.dispose)(instance);
            }
        }
        self.vacant.extend_from_slice(&doomed);
        doomed.len()
    }

    /// Disposes every instance, active or idle. Returns the number disposed.
    ///
    /// Outstanding handles become stale; the slots stay available for future
    /// acquires.
    pub fn shutdown(&mut self) -> usize {
        let mut disposed = 0;
        self.idle.clear();
        self.vacant.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.active = false;
            if let Some(instance) = slot.instance.take() {
                (self.strategies.dispose)(instance);
                disposed += 1;
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.vacant.push(index as u32);
        }
        disposed
    }

    /// Current occupancy counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.slots.iter().filter(|slot| slot.active).count(),
            idle: self.idle.len(),
            vacant: self.vacant.len(),
        }
    }

    fn active_slot_mut(&mut self, handle: EntityHandle) -> Option<&mut PoolSlot<T>> {
        self.slots
            .get_mut(handle.slot() as usize)
            .filter(|slot| slot.active && slot.generation == handle.generation())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    thread_local! {
        static DISPOSED: Cell<usize> = Cell::new(0);
    }

    #[derive(Debug, Default)]
    struct Token {
        uses: u32,
        live: bool,
        label: u32,
    }

    fn pool() -> EntityPool<Token, u32> {
        DISPOSED.with(|count| count.set(0));
        EntityPool::new(PoolStrategies {
            create: |label| Token {
                label: *label,
                ..Token::default()
            },
            on_acquire: |token, label| {
                token.uses += 1;
                token.live = true;
                token.label = *label;
            },
            on_release: |token| token.live = false,
            dispose: |_| DISPOSED.with(|count| count.set(count.get() + 1)),
        })
    }

    #[test]
    fn acquire_creates_when_no_idle_instance() {
        let mut pool = pool();
        let first = pool.acquire(&1);
        let second = pool.acquire(&2);

        assert!(!first.reused);
        assert!(!second.reused);
        assert_ne!(first.handle.slot(), second.handle.slot());
        assert_eq!(pool.stats().active, 2);
    }

    #[test]
    fn released_instance_is_reused_with_new_generation() {
        let mut pool = pool();
        let first = pool.acquire(&1);
        assert!(pool.release(first.handle));

        let second = pool.acquire(&2);
        assert!(second.reused);
        assert_eq!(second.handle.slot(), first.handle.slot());
        assert_ne!(second.handle.generation(), first.handle.generation());

        let token = pool.get(second.handle).expect("active token");
        assert_eq!(token.uses, 2);
        assert_eq!(token.label, 2);
        assert!(pool.get(first.handle).is_none());
    }

    #[test]
    fn acquire_never_returns_active_instance() {
        let mut pool = pool();
        let handles: Vec<_> = (0..4).map(|label| pool.acquire(&label).handle).collect();
        assert!(pool.release(handles[1]));
        let next = pool.acquire(&9).handle;

        for handle in [handles[0], handles[2], handles[3]] {
            assert_ne!(next.slot(), handle.slot());
        }
    }

    #[test]
    fn double_release_is_noop() {
        let mut pool = pool();
        let handle = pool.acquire(&1).handle;
        assert!(pool.release(handle));
        assert!(!pool.release(handle));
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn stale_handle_cannot_release_later_activation() {
        let mut pool = pool();
        let stale = pool.acquire(&1).handle;
        assert!(pool.release(stale));
        let current = pool.acquire(&2).handle;

        assert!(!pool.release(stale));
        assert!(pool.is_active(current));
    }

    #[test]
    fn release_runs_strategy_and_keeps_instance() {
        let mut pool = pool();
        let handle = pool.acquire(&1).handle;
        assert!(pool.release(handle));

        let token = pool.get_retained_mut(handle).expect("retained token");
        assert!(!token.live);
        DISPOSED.with(|count| assert_eq!(count.get(), 0));
    }

    #[test]
    fn trim_disposes_only_excess_idle_instances() {
        let mut pool = pool();
        let handles: Vec<_> = (0..3).map(|label| pool.acquire(&label).handle).collect();
        for handle in &handles[..2] {
            assert!(pool.release(*handle));
        }

        assert_eq!(pool.trim(1), 1);
        DISPOSED.with(|count| assert_eq!(count.get(), 1));
        assert_eq!(
            pool.stats(),
            PoolStats {
                active: 1,
                idle: 1,
                vacant: 1,
            }
        );

        let reused = pool.acquire(&7);
        assert!(reused.reused);
        let recreated = pool.acquire(&8);
        assert!(!recreated.reused);
        assert_eq!(pool.stats().vacant, 0);
    }

    #[test]
    fn shutdown_disposes_everything_and_invalidates_handles() {
        let mut pool = pool();
        let active = pool.acquire(&1).handle;
        let idle = pool.acquire(&2).handle;
        assert!(pool.release(idle));

        assert_eq!(pool.shutdown(), 2);
        DISPOSED.with(|count| assert_eq!(count.get(), 2));
        assert!(!pool.release(active));
        assert!(pool.get_retained_mut(idle).is_none());
        assert_eq!(pool.stats().active, 0);
    }
}
