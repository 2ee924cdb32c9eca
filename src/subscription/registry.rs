// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of advise loops the endpoint wants to keep alive.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::Format;

/// Identity of an advise loop: topic, item and format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionKey {
    /// Conversation topic.
    pub topic: String,
    /// Item within the topic.
    pub item: String,
    /// Data format of the item.
    pub format: Format,
}

impl SubscriptionKey {
    /// Creates a key.
    #[must_use]
    pub fn new(topic: impl Into<String>, item: impl Into<String>, format: Format) -> Self {
        Self {
            topic: topic.into(),
            item: item.into(),
            format,
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}!{}", self.topic, self.item, self.format)
    }
}

/// A tracked advise loop and the parameters needed to re-issue it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Conversation topic.
    pub topic: String,
    /// Item within the topic.
    pub item: String,
    /// Data format of the item.
    pub format: Format,
    /// Whether the server was asked to push the current value at once.
    pub want_initial_value: bool,
}

impl Subscription {
    /// Returns the registry key of this subscription.
    #[must_use]
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(self.topic.clone(), self.item.clone(), self.format)
    }
}

/// In-memory table of advise loops, keyed by [`SubscriptionKey`].
///
/// Entries are only added after the server accepted the advise, so the
/// registry describes the desired subscription state. After a reconnect the
/// endpoint replays every entry to bring the server back in line.
///
/// Iteration order is stable (sorted by key), which keeps replays
/// deterministic.
#[derive(Debug, Default)]
pub struct AdviseRegistry {
    entries: BTreeMap<SubscriptionKey, Subscription>,
}

impl AdviseRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a subscription, replacing any entry with the same key.
    ///
    /// Returns `true` if the key was not tracked before.
    pub fn insert(&mut self, subscription: Subscription) -> bool {
        self.entries
            .insert(subscription.key(), subscription)
            .is_none()
    }

    /// Stops tracking a subscription.
    pub fn remove(&mut self, key: &SubscriptionKey) -> Option<Subscription> {
        self.entries.remove(key)
    }

    /// Returns true if the key is tracked.
    #[must_use]
    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes every entry and returns them.
    pub fn drain(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    /// Returns the entries to replay.
    ///
    /// With a topic, only that topic's entries are returned.
    #[must_use]
    pub fn replay_set(&self, topic: Option<&str>) -> Vec<Subscription> {
        self.entries
            .values()
            .filter(|sub| topic.is_none_or(|t| sub.topic == t))
            .cloned()
            .collect()
    }

    /// Returns the number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(topic: &str, item: &str) -> Subscription {
        Subscription {
            topic: topic.to_string(),
            item: item.to_string(),
            format: Format::Text,
            want_initial_value: false,
        }
    }

    #[test]
    fn insert_is_keyed_by_topic_item_format() {
        let mut registry = AdviseRegistry::new();

        assert!(registry.insert(sub("T", "I")));
        assert!(!registry.insert(sub("T", "I")));
        assert_eq!(registry.len(), 1);

        let mut other_format = sub("T", "I");
        other_format.format = Format::UnicodeText;
        assert!(registry.insert(other_format));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_unknown_key_is_noop() {
        let mut registry = AdviseRegistry::new();
        registry.insert(sub("T", "I"));

        assert!(registry.remove(&SubscriptionKey::new("T", "X", Format::Text)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_known_key() {
        let mut registry = AdviseRegistry::new();
        registry.insert(sub("T", "I"));

        let key = SubscriptionKey::new("T", "I", Format::Text);
        assert!(registry.contains(&key));
        assert_eq!(registry.remove(&key), Some(sub("T", "I")));
        assert!(registry.is_empty());
    }

    #[test]
    fn replay_set_filters_by_topic() {
        let mut registry = AdviseRegistry::new();
        registry.insert(sub("A", "1"));
        registry.insert(sub("A", "2"));
        registry.insert(sub("B", "1"));

        assert_eq!(registry.replay_set(None).len(), 3);

        let only_a = registry.replay_set(Some("A"));
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|s| s.topic == "A"));

        assert!(registry.replay_set(Some("C")).is_empty());
    }

    #[test]
    fn drain_empties_registry() {
        let mut registry = AdviseRegistry::new();
        registry.insert(sub("A", "1"));
        registry.insert(sub("B", "1"));

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn key_display() {
        let key = SubscriptionKey::new("PLC1", "R100", Format::Text);
        assert_eq!(key.to_string(), "PLC1!R100!CF_TEXT");
    }
}
