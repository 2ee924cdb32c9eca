// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint event types.

use crate::endpoint::Status;
use crate::error::TransportError;
use crate::transport::AdviseData;

use super::EndpointId;

/// Events published by an endpoint to its observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointEvent {
    /// The endpoint status changed. Never emitted for a redundant set.
    StatusChanged {
        /// The endpoint.
        endpoint_id: EndpointId,
        /// The new status.
        status: Status,
    },

    /// Advise data arrived.
    Advise {
        /// The endpoint.
        endpoint_id: EndpointId,
        /// Topic, item, format and value.
        data: AdviseData,
    },

    /// The conversation for a topic was lost.
    TopicDisconnected {
        /// The endpoint.
        endpoint_id: EndpointId,
        /// The topic.
        topic: String,
    },

    /// A background failure (connect, teardown, replay, transport error).
    Error {
        /// The endpoint.
        endpoint_id: EndpointId,
        /// What failed.
        context: ErrorContext,
        /// The underlying error.
        error: TransportError,
    },

    /// The endpoint was closed and will not reconnect.
    Closed {
        /// The endpoint.
        endpoint_id: EndpointId,
    },
}

/// Where a background error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    /// A connection attempt failed.
    Connect,
    /// Disconnecting the transport failed.
    Disconnect,
    /// Re-issuing a tracked advise failed.
    Readvise,
    /// The transport reported an error event.
    Transport,
}

impl EndpointEvent {
    /// Returns the endpoint this event belongs to.
    #[must_use]
    pub fn endpoint_id(&self) -> EndpointId {
        match self {
            Self::StatusChanged { endpoint_id, .. }
            | Self::Advise { endpoint_id, .. }
            | Self::TopicDisconnected { endpoint_id, .. }
            | Self::Error { endpoint_id, .. }
            | Self::Closed { endpoint_id } => *endpoint_id,
        }
    }

    /// Returns the status if this is a status change.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::StatusChanged { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the advise data if this is an advise event.
    #[must_use]
    pub fn advise_data(&self) -> Option<&AdviseData> {
        match self {
            Self::Advise { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns `true` if this is an error event.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
