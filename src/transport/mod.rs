// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport contract for DDE conversations.
//!
//! The wire protocol (conversation setup, data encoding, framing) lives
//! outside this crate. An endpoint only needs something that implements
//! [`Transport`] and a [`TransportFactory`] that builds a fresh instance for
//! every connection attempt.
//!
//! Asynchronous notifications (advise data, per-topic disconnects, errors and
//! the final close) are pushed through the [`EventSink`] handed to the factory.
//!
//! # Implementing a transport
//!
//! ```no_run
//! use dde_session::error::TransportError;
//! use dde_session::transport::{EventSink, Transport};
//! use dde_session::types::{DdeValue, Format};
//!
//! struct NetDdeClient {
//!     events: EventSink,
//! }
//!
//! impl Transport for NetDdeClient {
//!     async fn connect(&self) -> Result<(), TransportError> { Ok(()) }
//!     async fn disconnect(&self) -> Result<(), TransportError> {
//!         self.events.closed();
//!         Ok(())
//!     }
//!     async fn request(&self, _: &str, _: &str, _: Format) -> Result<DdeValue, TransportError> {
//!         Ok(DdeValue::from("0"))
//!     }
//!     async fn poke(&self, _: &str, _: &str, _: Format, _: &DdeValue) -> Result<(), TransportError> { Ok(()) }
//!     async fn execute(&self, _: &str, _: &str) -> Result<(), TransportError> { Ok(()) }
//!     async fn advise(&self, _: &str, _: &str, _: Format, _: bool) -> Result<(), TransportError> { Ok(()) }
//!     async fn stop_advise(&self, _: &str, _: &str, _: Format) -> Result<(), TransportError> { Ok(()) }
//!     async fn probe_conversation(&self, _: &str) -> Result<(), TransportError> { Ok(()) }
//! }
//! ```

mod sink;

pub use sink::EventSink;

use std::future::Future;

use crate::endpoint::EndpointConfig;
use crate::error::TransportError;
use crate::types::{DdeValue, Format};

/// Data pushed by the server for an active advise loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviseData {
    /// Topic of the conversation.
    pub topic: String,
    /// Item that changed.
    pub item: String,
    /// Format of the data.
    pub format: Format,
    /// New item value.
    pub data: DdeValue,
}

/// Asynchronous notifications emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A transport-level error. A `Closed` event is expected to follow when
    /// the error broke the connection.
    Error(TransportError),
    /// The connection is gone, whatever the cause.
    Closed,
    /// Advise data arrived.
    Advise(AdviseData),
    /// The conversation for one topic was lost while the connection stays up.
    TopicDisconnected(String),
}

/// Client side of a DDE connection.
///
/// Every method may suspend and may fail. An instance is used for a single
/// connection: after `disconnect` the endpoint drops it and asks its
/// [`TransportFactory`] for a new one.
pub trait Transport: Send + Sync + 'static {
    /// Establishes the connection.
    fn connect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the connection.
    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Reads the current value of an item.
    fn request(
        &self,
        topic: &str,
        item: &str,
        format: Format,
    ) -> impl Future<Output = Result<DdeValue, TransportError>> + Send;

    /// Writes a value to an item.
    fn poke(
        &self,
        topic: &str,
        item: &str,
        format: Format,
        data: &DdeValue,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a command string to the server.
    fn execute(
        &self,
        topic: &str,
        command: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Starts an advise loop on an item.
    ///
    /// When `want_initial_value` is true the server pushes the current value
    /// right away.
    fn advise(
        &self,
        topic: &str,
        item: &str,
        format: Format,
        want_initial_value: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Stops an advise loop.
    fn stop_advise(
        &self,
        topic: &str,
        item: &str,
        format: Format,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Checks that a conversation on `topic` can be established.
    fn probe_conversation(
        &self,
        topic: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Builds transports for an endpoint.
///
/// Called once per connection attempt. The [`EventSink`] is bound to that
/// attempt, so events from an older transport can never disturb a newer one.
///
/// Any `Fn(&EndpointConfig, EventSink) -> T` closure is a factory.
pub trait TransportFactory: Send + Sync + 'static {
    /// The transport type produced.
    type Transport: Transport;

    /// Creates an unconnected transport.
    fn create(&self, config: &EndpointConfig, events: EventSink) -> Self::Transport;
}

impl<T, F> TransportFactory for F
where
    T: Transport,
    F: Fn(&EndpointConfig, EventSink) -> T + Send + Sync + 'static,
{
    type Transport = T;

    fn create(&self, config: &EndpointConfig, events: EventSink) -> T {
        self(config, events)
    }
}
