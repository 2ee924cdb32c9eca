// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event-driven connection state machine.
//!
//! One driver task per endpoint consumes [`DriverEvent`]s in order. Every
//! state transition, timer arm and registry replay decision happens inside
//! [`Driver::dispatch`], so the lifecycle has a single writer even on a
//! multi-threaded runtime. Slow transport calls (connect, probes, replays)
//! run in spawned tasks that report back through the same queue.
//!
//! # Architecture
//!
//! ```text
//!  start ──► Connect ──► factory.create(gen N) ──► spawn connect()
//!                                                     │
//!            ConnectFinished{N, Ok}  ◄────────────────┘
//!                 │ on_connect: cancel reconnect timer, Online, replay all
//!                 │
//!  Transport{N, Closed} / ConnectFinished{N, Err}
//!                 │ reconnect: cancel timers, teardown (Offline,
//!                 │            disconnect + drop transport), arm timer
//!                 ▼
//!  ReconnectTimer{ticket} ──► Connect ──► factory.create(gen N+1) ...
//! ```

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::TransportError;
use crate::event::{EndpointEvent, EndpointId, ErrorContext, EventBus};
use crate::subscription::{AdviseRegistry, OfflineTopics};
use crate::transport::{EventSink, Transport, TransportEvent, TransportFactory};

use super::config::EndpointConfig;
use super::state::ConnectionState;
use super::status::{Status, StatusCell};
use super::timer::TimerSlot;

/// Inputs of the connection state machine.
#[derive(Debug)]
pub(crate) enum DriverEvent {
    /// Start a connection attempt.
    Connect,
    /// The reconnect timer expired.
    ReconnectTimer { ticket: u64 },
    /// A connection attempt completed.
    ConnectFinished {
        generation: u64,
        result: Result<(), TransportError>,
    },
    /// The transport of `generation` emitted an event.
    Transport {
        generation: u64,
        event: TransportEvent,
    },
    /// The offline topic recheck timer expired.
    RecheckTimer { ticket: u64 },
    /// A conversation probe completed.
    ProbeFinished {
        generation: u64,
        topic: String,
        result: Result<(), TransportError>,
    },
    /// A caller's operation failed on the transport of `generation`.
    OperationFailed {
        generation: u64,
        error: TransportError,
    },
    /// Close the endpoint for good.
    Close { done: Option<oneshot::Sender<()>> },
}

/// State shared between the driver and endpoint handles.
pub(crate) struct Shared<T> {
    pub(crate) id: EndpointId,
    pub(crate) config: EndpointConfig,
    pub(crate) bus: EventBus,
    pub(crate) status: StatusCell,
    pub(crate) core: Mutex<Core<T>>,
    pub(crate) tx: mpsc::UnboundedSender<DriverEvent>,
}

/// Mutable endpoint state. Guarded by [`Shared::core`]; the guard is never
/// held across an `.await`.
pub(crate) struct Core<T> {
    pub(crate) state: ConnectionState,
    pub(crate) closing: bool,
    pub(crate) generation: u64,
    pub(crate) transport: Option<Arc<T>>,
    pub(crate) registry: AdviseRegistry,
    pub(crate) offline: OfflineTopics,
    pub(crate) reconnect_timer: TimerSlot,
    pub(crate) recheck_timer: TimerSlot,
}

impl<T> Core<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            closing: false,
            generation: 0,
            transport: None,
            registry: AdviseRegistry::new(),
            offline: OfflineTopics::new(),
            reconnect_timer: TimerSlot::new("reconnect"),
            recheck_timer: TimerSlot::new("offline-recheck"),
        }
    }

    /// Returns true if `generation` is the transport currently in use.
    pub(crate) fn is_live(&self, generation: u64) -> bool {
        !self.closing && self.transport.is_some() && self.generation == generation
    }

    fn transition(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = %self.state, to = %next, "Ignoring invalid state transition");
            return false;
        }
        tracing::trace!(from = %self.state, to = %next, "State transition");
        self.state = next;
        true
    }
}

impl<T> Shared<T> {
    pub(crate) fn new(
        config: EndpointConfig,
        tx: mpsc::UnboundedSender<DriverEvent>,
    ) -> Self {
        let id = EndpointId::new();
        let bus = EventBus::new();
        Self {
            id,
            status: StatusCell::new(id, bus.clone()),
            bus,
            config,
            core: Mutex::new(Core::new()),
            tx,
        }
    }

    /// Publishes a background failure to observers.
    pub(crate) fn report(&self, context: ErrorContext, error: TransportError) {
        self.bus.publish(EndpointEvent::Error {
            endpoint_id: self.id,
            context,
            error,
        });
    }
}

/// Re-issues tracked advises on the current transport.
///
/// With a topic, only that topic's subscriptions are replayed. Each advise is
/// independent: a failure is reported and neither removes the entry nor stops
/// the others.
pub(crate) fn replay<T: Transport>(shared: &Arc<Shared<T>>, topic: Option<&str>) {
    let (transport, entries) = {
        let core = shared.core.lock();
        (core.transport.clone(), core.registry.replay_set(topic))
    };
    let Some(transport) = transport else {
        return;
    };
    if entries.is_empty() {
        return;
    }

    tracing::debug!(
        service = %shared.config.service(),
        topic = topic.unwrap_or("*"),
        count = entries.len(),
        "Re-advising tracked subscriptions"
    );

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let results = join_all(entries.iter().map(|sub| {
            transport.advise(&sub.topic, &sub.item, sub.format, sub.want_initial_value)
        }))
        .await;

        for (sub, result) in entries.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(subscription = %sub.key(), error = %e, "Re-advise failed");
                shared.report(ErrorContext::Readvise, e);
            }
        }
    });
}

/// Whether the driver keeps running after an event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The task that owns the connection lifecycle of one endpoint.
pub(crate) struct Driver<F: TransportFactory> {
    shared: Arc<Shared<F::Transport>>,
    factory: F,
    rx: mpsc::UnboundedReceiver<DriverEvent>,
}

impl<F: TransportFactory> Driver<F> {
    pub(crate) fn new(
        shared: Arc<Shared<F::Transport>>,
        factory: F,
        rx: mpsc::UnboundedReceiver<DriverEvent>,
    ) -> Self {
        Self {
            shared,
            factory,
            rx,
        }
    }

    /// Processes events until the endpoint is closed.
    pub(crate) async fn run(mut self) {
        tracing::debug!(endpoint = %self.shared.id, "Endpoint driver started");

        while let Some(event) = self.rx.recv().await {
            if self.dispatch(event).await == Flow::Stop {
                break;
            }
        }

        tracing::debug!(endpoint = %self.shared.id, "Endpoint driver stopped");
    }

    async fn dispatch(&mut self, event: DriverEvent) -> Flow {
        match event {
            DriverEvent::Connect => self.connect(),
            DriverEvent::ReconnectTimer { ticket } => {
                let fired = self.shared.core.lock().reconnect_timer.fire(ticket);
                if fired {
                    self.connect();
                }
            }
            DriverEvent::ConnectFinished { generation, result } => {
                self.on_connect_finished(generation, result).await;
            }
            DriverEvent::Transport { generation, event } => {
                self.on_transport_event(generation, event).await;
            }
            DriverEvent::RecheckTimer { ticket } => {
                let fired = self.shared.core.lock().recheck_timer.fire(ticket);
                if fired {
                    self.check_offline_topics();
                }
            }
            DriverEvent::ProbeFinished {
                generation,
                topic,
                result,
            } => self.on_probe_finished(generation, topic, result),
            DriverEvent::OperationFailed { generation, error } => {
                let live = self.shared.core.lock().is_live(generation);
                if live && self.shared.config.reconnect_on_operation_error() {
                    tracing::warn!(error = %error, "Operation failed, forcing reconnect");
                    self.reconnect().await;
                }
            }
            DriverEvent::Close { done } => {
                self.close().await;
                if let Some(done) = done {
                    let _ = done.send(());
                }
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Creates a fresh transport and starts connecting it.
    fn connect(&mut self) {
        let (transport, generation) = {
            let mut core = self.shared.core.lock();
            if core.closing || !core.state.can_connect() {
                tracing::debug!(state = %core.state, "Ignoring connect request");
                return;
            }
            core.generation += 1;
            let generation = core.generation;
            let sink = EventSink::new(generation, self.shared.tx.clone());
            let transport = Arc::new(self.factory.create(&self.shared.config, sink));
            core.transport = Some(Arc::clone(&transport));
            core.transition(ConnectionState::Connecting);
            (transport, generation)
        };
        self.shared.status.set(Status::Connecting);

        tracing::info!(
            service = %self.shared.config.service(),
            host = %self.shared.config.host(),
            port = self.shared.config.port(),
            generation,
            "Connecting to DDE server"
        );

        let tx = self.shared.tx.clone();
        tokio::spawn(async move {
            let result = transport.connect().await;
            let _ = tx.send(DriverEvent::ConnectFinished { generation, result });
        });
    }

    async fn on_connect_finished(&mut self, generation: u64, result: Result<(), TransportError>) {
        let live = {
            let core = self.shared.core.lock();
            core.is_live(generation) && core.state == ConnectionState::Connecting
        };
        if !live {
            tracing::trace!(generation, "Ignoring connect result of a superseded transport");
            return;
        }

        match result {
            Ok(()) => self.on_connect(),
            Err(e) => {
                tracing::error!(
                    service = %self.shared.config.service(),
                    error = %e,
                    "Failed to connect to DDE server"
                );
                self.shared.report(ErrorContext::Connect, e);
                self.reconnect().await;
            }
        }
    }

    fn on_connect(&mut self) {
        let offline = {
            let mut core = self.shared.core.lock();
            core.reconnect_timer.cancel();
            core.transition(ConnectionState::Online);
            core.offline.len()
        };
        self.shared.status.set(Status::Online);

        tracing::info!(
            service = %self.shared.config.service(),
            offline_topics = offline,
            "Connected to DDE server"
        );

        replay(&self.shared, None);
    }

    async fn on_transport_event(&mut self, generation: u64, event: TransportEvent) {
        let live = self.shared.core.lock().is_live(generation);
        if !live {
            tracing::trace!(generation, ?event, "Dropping event of a superseded transport");
            return;
        }

        match event {
            TransportEvent::Error(e) => {
                // A Closed event follows when the connection broke; it alone
                // triggers the reconnect.
                tracing::error!(error = %e, "Transport error");
                self.shared.report(ErrorContext::Transport, e);
            }
            TransportEvent::Closed => {
                tracing::info!(
                    service = %self.shared.config.service(),
                    "Connection closed by transport"
                );
                self.reconnect().await;
            }
            TransportEvent::Advise(data) => {
                tracing::trace!(topic = %data.topic, item = %data.item, "Advise data received");
                self.shared.bus.publish(EndpointEvent::Advise {
                    endpoint_id: self.shared.id,
                    data,
                });
            }
            TransportEvent::TopicDisconnected(topic) => self.on_topic_disconnect(topic),
        }
    }

    /// Tears the connection down and schedules the next attempt.
    async fn reconnect(&mut self) {
        let closing = {
            let mut core = self.shared.core.lock();
            core.recheck_timer.cancel();
            core.reconnect_timer.cancel();
            core.closing
        };
        if closing {
            return;
        }

        self.teardown().await;

        let delay = self.shared.config.reconnect_delay();
        self.shared.core.lock().reconnect_timer.arm(
            delay,
            self.shared.tx.clone(),
            |ticket| DriverEvent::ReconnectTimer { ticket },
        );
        tracing::info!(?delay, "Reconnect scheduled");
    }

    /// Goes offline and disconnects the current transport, if any.
    ///
    /// A disconnect failure is reported and otherwise ignored.
    async fn teardown(&mut self) {
        let transport = {
            let mut core = self.shared.core.lock();
            core.reconnect_timer.cancel();
            core.recheck_timer.cancel();
            core.transition(ConnectionState::Offline);
            core.transport.take()
        };
        self.shared.status.set(Status::Offline);

        if let Some(transport) = transport
            && let Err(e) = transport.disconnect().await
        {
            tracing::warn!(error = %e, "Failed to disconnect from DDE server");
            self.shared.report(ErrorContext::Disconnect, e);
        }
    }

    async fn close(&mut self) {
        self.shared.core.lock().closing = true;
        tracing::info!(service = %self.shared.config.service(), "Closing endpoint");

        self.teardown().await;

        self.shared.core.lock().transition(ConnectionState::Closed);
        self.shared.bus.publish(EndpointEvent::Closed {
            endpoint_id: self.shared.id,
        });
    }

    fn on_topic_disconnect(&mut self, topic: String) {
        tracing::warn!(topic = %topic, "Topic conversation lost");
        self.shared.bus.publish(EndpointEvent::TopicDisconnected {
            endpoint_id: self.shared.id,
            topic: topic.clone(),
        });

        if !self.shared.config.track_advise() {
            return;
        }

        let delay = self.shared.config.recheck_delay();
        let mut core = self.shared.core.lock();
        let generation = core.generation;
        core.offline.mark_offline(topic, generation);
        core.recheck_timer.arm(delay, self.shared.tx.clone(), |ticket| {
            DriverEvent::RecheckTimer { ticket }
        });
    }

    /// Probes every offline topic once.
    fn check_offline_topics(&mut self) {
        let (transport, generation, topics) = {
            let core = self.shared.core.lock();
            if !core.is_live(core.generation) {
                return;
            }
            (core.transport.clone(), core.generation, core.offline.snapshot())
        };
        let Some(transport) = transport else {
            return;
        };

        tracing::debug!(count = topics.len(), "Probing offline topics");

        for topic in topics {
            let transport = Arc::clone(&transport);
            let tx = self.shared.tx.clone();
            tokio::spawn(async move {
                let result = transport.probe_conversation(&topic).await;
                let _ = tx.send(DriverEvent::ProbeFinished {
                    generation,
                    topic,
                    result,
                });
            });
        }
    }

    fn on_probe_finished(
        &mut self,
        generation: u64,
        topic: String,
        result: Result<(), TransportError>,
    ) {
        let (live, still_offline) = {
            let core = self.shared.core.lock();
            (core.is_live(generation), core.offline.is_offline(&topic))
        };
        // Superseded transport, or dropped by stop-all in the meantime
        if !live || !still_offline {
            return;
        }

        match result {
            Ok(()) => {
                let marked = self.shared.core.lock().offline.mark_online(&topic);
                tracing::info!(topic = %topic, "Topic conversation restored");
                // Topics marked under an earlier transport were already
                // re-advised by the full replay on connect
                if marked == Some(generation) {
                    replay(&self.shared, Some(&topic));
                }
            }
            Err(e) => {
                tracing::debug!(topic = %topic, error = %e, "Topic still unreachable");
                self.on_topic_disconnect(topic);
            }
        }
    }
}
