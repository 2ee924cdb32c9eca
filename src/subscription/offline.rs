// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topics whose conversation was lost while the connection stayed up.

use std::collections::BTreeMap;

/// Set of topics currently believed unreachable.
///
/// A topic enters the set on a per-topic disconnect and leaves it only when a
/// conversation probe for it succeeds. Each entry remembers the transport
/// generation it was last marked under. The periodic recheck itself is
/// driven by the endpoint.
#[derive(Debug, Default)]
pub struct OfflineTopics {
    topics: BTreeMap<String, u64>,
}

impl OfflineTopics {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a topic offline on the transport of `generation`. Returns `true`
    /// if it was online before.
    pub fn mark_offline(&mut self, topic: impl Into<String>, generation: u64) -> bool {
        self.topics.insert(topic.into(), generation).is_none()
    }

    /// Marks a topic reachable again, returning the generation it went
    /// offline under, or `None` if it was not offline.
    pub fn mark_online(&mut self, topic: &str) -> Option<u64> {
        self.topics.remove(topic)
    }

    /// Returns true if the topic is offline.
    #[must_use]
    pub fn is_offline(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// Returns the topics to probe on the next recheck.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.topics.keys().cloned().collect()
    }

    /// Forgets every offline topic.
    pub fn clear(&mut self) {
        self.topics.clear();
    }

    /// Returns the number of offline topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns true if every topic is believed reachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
