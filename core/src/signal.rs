//! Broadcast primitive used for death and wave-cleared notifications.

use crate::SubscriptionId;

/// Ordered set of subscribers to a single notification.
///
/// Subscribers are delivered in registration order. Single-fire entries are
/// revoked in the same call that delivers them, so they can never observe a
/// second firing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signal {
    entries: Vec<Entry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    subscription: SubscriptionId,
    once: bool,
}

impl Signal {
    /// Creates a signal without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber that stays attached until revoked.
    ///
    /// Returns `false` when the subscription is already registered.
    pub fn subscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.register(subscription, false)
    }

    /// Registers a subscriber that is revoked as soon as it is delivered.
    ///
    /// Returns `false` when the subscription is already registered.
    pub fn subscribe_once(&mut self, subscription: SubscriptionId) -> bool {
        self.register(subscription, true)
    }

    /// Revokes a subscription, returning whether it was registered.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.subscription != subscription);
        self.entries.len() != before
    }

    /// Delivers the notification, appending every recipient to `out`.
    pub fn fire(&mut self, out: &mut Vec<SubscriptionId>) {
        out.extend(self.entries.iter().map(|entry| entry.subscription));
        self.entries.retain(|entry| !entry.once);
    }

    /// Revokes every subscription, returning them in registration order.
    pub fn clear(&mut self) -> Vec<SubscriptionId> {
        self.entries
            .drain(..)
            .map(|entry| entry.subscription)
            .collect()
    }

    /// Number of registered subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no subscription is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register(&mut self, subscription: SubscriptionId, once: bool) -> bool {
        if self
            .entries
            .iter()
            .any(|entry| entry.subscription == subscription)
        {
            return false;
        }

        self.entries.push(Entry { subscription, once });
        true
    }
}
