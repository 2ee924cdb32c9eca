// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel through which a transport reports asynchronous events.

use tokio::sync::mpsc;

use crate::endpoint::DriverEvent;
use crate::error::TransportError;

use super::{AdviseData, TransportEvent};

/// Sender half given to a transport when it is created.
///
/// Each sink is tagged with the connection generation of its transport. Once
/// the endpoint has moved on to a newer transport, events sent through an old
/// sink are discarded.
#[derive(Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self { generation, tx }
    }

    /// Returns the connection generation this sink belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true once the endpoint stopped listening.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Delivers an event to the endpoint.
    ///
    /// Returns `false` if the endpoint is gone.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(DriverEvent::Transport {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// Reports a transport error.
    pub fn error(&self, error: TransportError) {
        self.send(TransportEvent::Error(error));
    }

    /// Reports that the connection closed.
    pub fn closed(&self) {
        self.send(TransportEvent::Closed);
    }

    /// Delivers advise data.
    pub fn advise(&self, data: AdviseData) {
        self.send(TransportEvent::Advise(data));
    }

    /// Reports that the conversation for `topic` was lost.
    pub fn topic_disconnected(&self, topic: impl Into<String>) {
        self.send(TransportEvent::TopicDisconnected(topic.into()));
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);

        sink.topic_disconnected("PLC1");

        match rx.try_recv().unwrap() {
            DriverEvent::Transport { generation, event } => {
                assert_eq!(generation, 7);
                assert_eq!(event, TransportEvent::TopicDisconnected("PLC1".to_string()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn send_fails_once_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(1, tx);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.send(TransportEvent::Closed));
    }
}
