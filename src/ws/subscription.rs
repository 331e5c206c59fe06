//! Per-connection subscription manager.
//!
//! Tracks which event names a WebSocket client wants and provides
//! server-side filtering. A fresh connection receives every event until it
//! narrows the filter with an explicit subscribe.

use std::collections::HashSet;

/// Event name that selects every event.
pub const WILDCARD: &str = "*";

/// Manages the set of event subscriptions for a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    /// Subscribed event names. Ignored while `subscribe_all` is true.
    events: HashSet<String>,
    /// Whether the client receives every event.
    subscribe_all: bool,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self {
            events: HashSet::new(),
            subscribe_all: true,
        }
    }
}

impl SubscriptionManager {
    /// Creates a subscription manager that matches every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds event names to the filter.
    ///
    /// Naming [`WILDCARD`] matches everything again; naming anything else
    /// switches off the wildcard so only listed events match.
    pub fn subscribe<S: AsRef<str>>(&mut self, events: &[S]) {
        let mut wildcard = false;
        for name in events {
            let name = name.as_ref();
            if name == WILDCARD {
                wildcard = true;
            } else {
                self.events.insert(name.to_string());
            }
        }
        if wildcard {
            self.subscribe_all = true;
        } else if !events.is_empty() {
            self.subscribe_all = false;
        }
    }

    /// Removes event names from the filter. [`WILDCARD`] clears the
    /// wildcard flag.
    pub fn unsubscribe<S: AsRef<str>>(&mut self, events: &[S]) {
        for name in events {
            let name = name.as_ref();
            if name == WILDCARD {
                self.subscribe_all = false;
            } else {
                self.events.remove(name);
            }
        }
    }

    /// Returns `true` if the given event name passes the filter.
    #[must_use]
    pub fn matches(&self, event: &str) -> bool {
        self.subscribe_all || self.events.contains(event)
    }

    /// Returns the number of explicitly subscribed event names.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
