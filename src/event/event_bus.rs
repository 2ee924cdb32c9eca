// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting endpoint events.

use tokio::sync::broadcast;

use super::EndpointEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts endpoint events to any number of observers.
///
/// Each observer gets its own copy of every event published after it
/// subscribed. A slow observer that falls more than the capacity behind loses
/// the oldest events (`RecvError::Lagged`); the endpoint never blocks on it.
///
/// # Examples
///
/// ```
/// use dde_session::endpoint::Status;
/// use dde_session::event::{EndpointEvent, EndpointId, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EndpointEvent::StatusChanged {
///     endpoint_id: EndpointId::new(),
///     status: Status::Online,
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EndpointEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus buffering at most `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EndpointEvent> {
        self.sender.subscribe()
    }

    /// Hands an event to every current observer.
    ///
    /// Events published while nobody listens are lost.
    pub fn publish(&self, event: EndpointEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Endpoint event dropped, no observers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
