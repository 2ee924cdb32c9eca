// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Public handle of a DDE endpoint.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::error::{Error, Result, TransportError};
use crate::event::{EndpointEvent, EndpointId};
use crate::subscription::{Subscription, SubscriptionKey};
use crate::transport::{Transport, TransportFactory};
use crate::types::{DdeValue, Format};

use super::config::EndpointConfig;
use super::driver::{Driver, DriverEvent, Shared};
use super::state::ConnectionState;
use super::status::Status;

/// Advises never ask the server for the current value up front.
const REQUEST_INITIAL_VALUE: bool = false;

/// A resilient connection to one DDE service.
///
/// The endpoint connects as soon as it starts, reconnects after every
/// connection loss, remembers the advise loops it set up and re-establishes
/// them after reconnects. Topics whose conversation drops while the
/// connection stays up are probed periodically and re-advised once they come
/// back.
///
/// `Endpoint` is cheaply cloneable. When the last clone is dropped the
/// endpoint closes itself; call [`close`](Self::close) to wait for the
/// disconnect to finish.
///
/// # Examples
///
/// ```ignore
/// use dde_session::endpoint::{Endpoint, EndpointConfig};
/// use dde_session::types::Format;
///
/// # async fn example() -> dde_session::Result<()> {
/// let config = EndpointConfig::builder().service("EXCEL").build()?;
/// let endpoint = Endpoint::start(config, |config: &EndpointConfig, events| {
///     NetDdeClient::new(config, events)
/// })?;
///
/// endpoint.advise("Sheet1", "R1C1", Format::Text).await?;
///
/// let mut events = endpoint.subscribe();
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Endpoint<T: Transport> {
    inner: Arc<EndpointInner<T>>,
}

/// Owner of the driver link; closes the endpoint when the last handle goes.
struct EndpointInner<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Drop for EndpointInner<T> {
    fn drop(&mut self) {
        let _ = self.shared.tx.send(DriverEvent::Close { done: None });
    }
}

impl<T: Transport> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Endpoint<T> {
    /// Validates the configuration, spawns the endpoint driver and starts
    /// connecting.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingService` if no service is configured.
    pub fn start<F>(config: EndpointConfig, factory: F) -> Result<Self>
    where
        F: TransportFactory<Transport = T>,
    {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new(config, tx));

        tracing::info!(
            endpoint = %shared.id,
            service = %shared.config.service(),
            track_advise = shared.config.track_advise(),
            "Starting DDE endpoint"
        );

        tokio::spawn(Driver::new(Arc::clone(&shared), factory, rx).run());
        let _ = shared.tx.send(DriverEvent::Connect);

        Ok(Self {
            inner: Arc::new(EndpointInner { shared }),
        })
    }

    fn shared(&self) -> &Arc<Shared<T>> {
        &self.inner.shared
    }

    /// Returns the endpoint identifier.
    #[must_use]
    pub fn id(&self) -> EndpointId {
        self.shared().id
    }

    /// Returns the configuration the endpoint was started with.
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.shared().config
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.shared().status.get()
    }

    /// Returns a receiver that observes status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<Status> {
        self.shared().status.watch()
    }

    /// Subscribes to endpoint events: status changes, advise data, topic
    /// disconnects and background errors.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EndpointEvent> {
        self.shared().bus.subscribe()
    }

    /// Returns the connection lifecycle state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.shared().core.lock().state
    }

    /// Returns true once [`close`](Self::close) was requested.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared().core.lock().closing
    }

    /// Returns the tracked advise loops.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.shared().core.lock().registry.replay_set(None)
    }

    /// Returns the topics currently considered offline.
    #[must_use]
    pub fn offline_topics(&self) -> Vec<String> {
        self.shared().core.lock().offline.snapshot()
    }

    /// Returns the current transport and its generation.
    fn transport(&self) -> Result<(Arc<T>, u64)> {
        let core = self.shared().core.lock();
        if core.closing {
            return Err(Error::Closed);
        }
        core.transport
            .clone()
            .map(|transport| (transport, core.generation))
            .ok_or(Error::Transport(TransportError::NotConnected))
    }

    /// Lets the driver decide whether a failed operation warrants a reconnect.
    fn operation_failed(&self, generation: u64, error: TransportError) -> Error {
        if self.shared().config.reconnect_on_operation_error() {
            let _ = self.shared().tx.send(DriverEvent::OperationFailed {
                generation,
                error: error.clone(),
            });
        }
        Error::Transport(error)
    }

    /// Reads the value of an item.
    ///
    /// # Errors
    ///
    /// Returns the transport error, `NotConnected` while no transport exists,
    /// or `Error::Closed` after close.
    pub async fn request(&self, topic: &str, item: &str, format: Format) -> Result<DdeValue> {
        let (transport, generation) = self.transport()?;
        transport
            .request(topic, item, format)
            .await
            .map_err(|e| self.operation_failed(generation, e))
    }

    /// Writes a value to an item.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn poke(
        &self,
        topic: &str,
        item: &str,
        format: Format,
        data: &DdeValue,
    ) -> Result<()> {
        let (transport, generation) = self.transport()?;
        transport
            .poke(topic, item, format, data)
            .await
            .map_err(|e| self.operation_failed(generation, e))
    }

    /// Sends a command to the server.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn execute(&self, topic: &str, command: &str) -> Result<()> {
        let (transport, generation) = self.transport()?;
        transport
            .execute(topic, command)
            .await
            .map_err(|e| self.operation_failed(generation, e))
    }

    /// Starts an advise loop.
    ///
    /// The subscription is tracked (when tracking is enabled) only after the
    /// server accepted it, so a rejected advise is never replayed.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn advise(&self, topic: &str, item: &str, format: Format) -> Result<()> {
        let (transport, generation) = self.transport()?;
        transport
            .advise(topic, item, format, REQUEST_INITIAL_VALUE)
            .await
            .map_err(|e| self.operation_failed(generation, e))?;

        if self.shared().config.track_advise() {
            let subscription = Subscription {
                topic: topic.to_string(),
                item: item.to_string(),
                format,
                want_initial_value: REQUEST_INITIAL_VALUE,
            };
            tracing::debug!(subscription = %subscription.key(), "Tracking advise");
            self.shared().core.lock().registry.insert(subscription);
        }
        Ok(())
    }

    /// Stops an advise loop.
    ///
    /// Local tracking is dropped first and unconditionally; the stop is then
    /// sent to the server even if the subscription was not tracked.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request).
    pub async fn stop_advise(&self, topic: &str, item: &str, format: Format) -> Result<()> {
        if self.shared().config.track_advise() {
            let key = SubscriptionKey::new(topic, item, format);
            let removed = self.shared().core.lock().registry.remove(&key);
            tracing::debug!(subscription = %key, tracked = removed.is_some(), "Untracking advise");
        }

        let (transport, generation) = self.transport()?;
        transport
            .stop_advise(topic, item, format)
            .await
            .map_err(|e| self.operation_failed(generation, e))
    }

    /// Stops every tracked advise loop.
    ///
    /// The stops run concurrently and all of them are awaited. The registry
    /// and the offline topic set are cleared whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first stop failure, after every stop has settled.
    pub async fn stop_advise_all(&self) -> Result<()> {
        let (entries, transport) = {
            let mut core = self.shared().core.lock();
            let entries = core.registry.drain();
            core.offline.clear();
            core.recheck_timer.cancel();
            let transport = if core.closing {
                Err(Error::Closed)
            } else {
                core.transport
                    .clone()
                    .map(|transport| (transport, core.generation))
                    .ok_or(Error::Transport(TransportError::NotConnected))
            };
            (entries, transport)
        };

        tracing::info!(count = entries.len(), "Stopping all advise loops");
        if entries.is_empty() {
            return Ok(());
        }
        let (transport, generation) = transport?;

        let results = join_all(
            entries
                .iter()
                .map(|sub| transport.stop_advise(&sub.topic, &sub.item, sub.format)),
        )
        .await;

        let mut first_error = None;
        for (sub, result) in entries.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(subscription = %sub.key(), error = %e, "Stop advise failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(self.operation_failed(generation, e)),
            None => Ok(()),
        }
    }

    /// Closes the endpoint and waits for the transport to disconnect.
    ///
    /// No reconnect is attempted afterwards. Closing twice is harmless.
    pub async fn close(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .shared()
            .tx
            .send(DriverEvent::Close {
                done: Some(done_tx),
            })
            .is_err()
        {
            return;
        }
        // Err means the driver had already stopped
        let _ = done_rx.await;
    }
}

impl<T: Transport> std::fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id())
            .field("service", &self.config().service())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
