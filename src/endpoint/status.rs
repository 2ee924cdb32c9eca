// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint status as seen by observers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::event::{EndpointEvent, EndpointId, EventBus};

/// Externally visible status of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A connection attempt is in progress.
    Connecting,
    /// Connected to the server.
    Online,
    /// Not connected; a reconnect may be pending.
    Offline,
    /// Connected, but the server returned unusable values.
    BadValues,
    /// No status has been reported yet.
    #[default]
    Unknown,
}

impl Status {
    /// Returns the lowercase status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::BadValues => "badvalues",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true if the endpoint is online.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-writer holder of an endpoint's status.
///
/// Readers either query it synchronously, watch it, or receive
/// `StatusChanged` events on the bus. Setting the current value again is a
/// no-op: nobody is notified.
#[derive(Debug)]
pub(crate) struct StatusCell {
    endpoint_id: EndpointId,
    tx: watch::Sender<Status>,
    bus: EventBus,
}

impl StatusCell {
    pub(crate) fn new(endpoint_id: EndpointId, bus: EventBus) -> Self {
        let (tx, _) = watch::channel(Status::Unknown);
        Self {
            endpoint_id,
            tx,
            bus,
        }
    }

    /// Returns the current status.
    pub(crate) fn get(&self) -> Status {
        *self.tx.borrow()
    }

    /// Returns a receiver that observes status changes.
    pub(crate) fn watch(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }

    /// Updates the status. Returns `true` and notifies observers only if the
    /// value changed.
    pub(crate) fn set(&self, status: Status) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });

        if changed {
            tracing::debug!(endpoint = %self.endpoint_id, %status, "Status changed");
            self.bus.publish(EndpointEvent::StatusChanged {
                endpoint_id: self.endpoint_id,
                status,
            });
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_is_unknown() {
        let cell = StatusCell::new(EndpointId::new(), EventBus::new());
        assert_eq!(cell.get(), Status::Unknown);
    }

    #[test]
    fn notifies_only_on_change() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let cell = StatusCell::new(EndpointId::new(), bus);

        for status in [
            Status::Online,
            Status::Online,
            Status::Offline,
            Status::Offline,
            Status::Connecting,
        ] {
            cell.set(status);
        }

        let mut observed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            observed.extend(event.status());
        }
        assert_eq!(
            observed,
            vec![Status::Online, Status::Offline, Status::Connecting]
        );
        assert_eq!(cell.get(), Status::Connecting);
    }

    #[tokio::test]
    async fn watch_sees_changes() {
        let cell = StatusCell::new(EndpointId::new(), EventBus::new());
        let mut rx = cell.watch();

        assert!(!cell.set(Status::Unknown));
        assert!(!rx.has_changed().unwrap());

        assert!(cell.set(Status::Online));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Status::Online);
    }

    #[test]
    fn status_names() {
        assert_eq!(Status::BadValues.to_string(), "badvalues");
        assert_eq!(
            serde_json::to_string(&Status::Connecting).unwrap(),
            "\"connecting\""
        );
        assert!(Status::Online.is_online());
        assert!(!Status::Offline.is_online());
    }
}
