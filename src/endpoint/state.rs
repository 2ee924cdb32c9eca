// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection lifecycle states.

use std::fmt;

/// Lifecycle state of an endpoint's connection.
///
/// ```text
/// Disconnected ──► Connecting ──► Online
///                     ▲   │         │
///                     │   ▼         ▼
///                     └─ Offline ◄──┘
///
/// any state ──► Closed (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, no attempt made yet.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and serving operations.
    Online,
    /// Connection lost or failed; a reconnect is scheduled.
    Offline,
    /// Closed on request; never reconnects.
    Closed,
}

impl ConnectionState {
    /// Returns true if the state machine allows moving to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        use ConnectionState::{Closed, Connecting, Disconnected, Offline, Online};

        match (self, next) {
            (Closed, _) => false,
            (_, Closed)
            | (Disconnected | Offline, Connecting)
            | (Connecting, Online)
            | (Disconnected | Connecting | Online | Offline, Offline) => true,
            _ => false,
        }
    }

    /// Returns true if a connection attempt may start from this state.
    #[must_use]
    pub const fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Offline)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
