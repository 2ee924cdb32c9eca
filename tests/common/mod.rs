// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use dde_session::error::TransportError;
use dde_session::transport::{AdviseData, EventSink, Transport};
use dde_session::types::{DdeValue, Format};
use dde_session::{EndpointConfig, EndpointEvent};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// A transport call as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Disconnect,
    Request {
        topic: String,
        item: String,
        format: Format,
    },
    Poke {
        topic: String,
        item: String,
        format: Format,
        data: DdeValue,
    },
    Execute {
        topic: String,
        command: String,
    },
    Advise {
        topic: String,
        item: String,
        format: Format,
        want_initial_value: bool,
    },
    StopAdvise {
        topic: String,
        item: String,
        format: Format,
    },
    Probe {
        topic: String,
    },
}

impl Call {
    pub fn advise(topic: &str, item: &str, format: Format) -> Self {
        Self::Advise {
            topic: topic.to_string(),
            item: item.to_string(),
            format,
            want_initial_value: false,
        }
    }

    pub fn stop_advise(topic: &str, item: &str, format: Format) -> Self {
        Self::StopAdvise {
            topic: topic.to_string(),
            item: item.to_string(),
            format,
        }
    }
}

#[derive(Default)]
struct HubState {
    calls: Vec<Call>,
    connect_times: Vec<Instant>,
    failing_connects: usize,
    failing_items: HashSet<String>,
    item_delays: HashMap<String, Duration>,
    failing_commands: HashSet<String>,
    unreachable_topics: HashSet<String>,
    sinks: Vec<EventSink>,
}

/// Server side of the mock: records calls and decides their outcome.
///
/// Every transport created through [`MockHub::factory`] reports to the same
/// hub, so call history spans reconnects.
#[derive(Clone, Default)]
pub struct MockHub {
    state: Arc<Mutex<HubState>>,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a transport factory bound to this hub.
    pub fn factory(
        &self,
    ) -> impl Fn(&EndpointConfig, EventSink) -> MockTransport + Send + Sync + 'static {
        let hub = self.clone();
        move |_config: &EndpointConfig, events: EventSink| {
            hub.state.lock().sinks.push(events.clone());
            MockTransport {
                hub: hub.clone(),
                events,
            }
        }
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.state.lock().failing_connects = count;
    }

    /// Makes every item operation on `item` fail.
    pub fn fail_item(&self, item: &str) {
        self.state.lock().failing_items.insert(item.to_string());
    }

    /// Makes every item operation on `item` take `delay` before answering.
    pub fn delay_item(&self, item: &str, delay: Duration) {
        self.state.lock().item_delays.insert(item.to_string(), delay);
    }

    /// Makes executing `command` fail.
    pub fn fail_command(&self, command: &str) {
        self.state.lock().failing_commands.insert(command.to_string());
    }

    /// Makes conversation probes for `topic` fail or succeed.
    pub fn set_reachable(&self, topic: &str, reachable: bool) {
        let mut state = self.state.lock();
        if reachable {
            state.unreachable_topics.remove(topic);
        } else {
            state.unreachable_topics.insert(topic.to_string());
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn connects(&self) -> usize {
        self.count(&Call::Connect)
    }

    pub fn disconnects(&self) -> usize {
        self.count(&Call::Disconnect)
    }

    pub fn advises(&self) -> usize {
        self.matching(|c| matches!(c, Call::Advise { .. }))
    }

    pub fn stop_advises(&self) -> usize {
        self.matching(|c| matches!(c, Call::StopAdvise { .. }))
    }

    pub fn probes(&self, topic: &str) -> usize {
        self.count(&Call::Probe {
            topic: topic.to_string(),
        })
    }

    pub fn matching(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.state.lock().connect_times.clone()
    }

    /// Returns the sink of the most recently created transport.
    pub fn sink(&self) -> EventSink {
        self.state
            .lock()
            .sinks
            .last()
            .cloned()
            .expect("no transport created yet")
    }

    /// Simulates the server dropping the connection.
    pub fn drop_connection(&self) {
        self.sink().closed();
    }

    /// Simulates the server losing the conversation for `topic`.
    pub fn drop_topic(&self, topic: &str) {
        self.sink().topic_disconnected(topic);
    }

    /// Pushes advise data through the current transport.
    pub fn push(&self, topic: &str, item: &str, value: &str) {
        self.sink().advise(AdviseData {
            topic: topic.to_string(),
            item: item.to_string(),
            format: Format::Text,
            data: DdeValue::from(value),
        });
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    async fn item_result(&self, call: Call, item: &str) -> Result<(), TransportError> {
        let (failing, delay) = {
            let state = self.state.lock();
            (
                state.failing_items.contains(item),
                state.item_delays.get(item).copied(),
            )
        };
        self.record(call);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            Err(TransportError::Rejected(format!("item {item} rejected")))
        } else {
            Ok(())
        }
    }
}

/// One connection of the mock.
pub struct MockTransport {
    hub: MockHub,
    events: EventSink,
}

impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let fail = {
            let mut state = self.hub.state.lock();
            state.calls.push(Call::Connect);
            state.connect_times.push(Instant::now());
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                true
            } else {
                false
            }
        };
        if fail {
            Err(TransportError::ConnectionFailed("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.hub.record(Call::Disconnect);
        // A real client reports its own close, which the endpoint must ignore.
        self.events.closed();
        Ok(())
    }

    async fn request(
        &self,
        topic: &str,
        item: &str,
        format: Format,
    ) -> Result<DdeValue, TransportError> {
        let call = Call::Request {
            topic: topic.to_string(),
            item: item.to_string(),
            format,
        };
        self.hub.item_result(call, item).await?;
        Ok(DdeValue::Text(format!("{topic}!{item}")))
    }

    async fn poke(
        &self,
        topic: &str,
        item: &str,
        format: Format,
        data: &DdeValue,
    ) -> Result<(), TransportError> {
        let call = Call::Poke {
            topic: topic.to_string(),
            item: item.to_string(),
            format,
            data: data.clone(),
        };
        self.hub.item_result(call, item).await
    }

    async fn execute(&self, topic: &str, command: &str) -> Result<(), TransportError> {
        let failing = self.hub.state.lock().failing_commands.contains(command);
        self.hub.record(Call::Execute {
            topic: topic.to_string(),
            command: command.to_string(),
        });
        if failing {
            Err(TransportError::Rejected(format!("command {command} rejected")))
        } else {
            Ok(())
        }
    }

    async fn advise(
        &self,
        topic: &str,
        item: &str,
        format: Format,
        want_initial_value: bool,
    ) -> Result<(), TransportError> {
        let call = Call::Advise {
            topic: topic.to_string(),
            item: item.to_string(),
            format,
            want_initial_value,
        };
        self.hub.item_result(call, item).await
    }

    async fn stop_advise(
        &self,
        topic: &str,
        item: &str,
        format: Format,
    ) -> Result<(), TransportError> {
        self.hub
            .item_result(Call::stop_advise(topic, item, format), item)
            .await
    }

    async fn probe_conversation(&self, topic: &str) -> Result<(), TransportError> {
        let unreachable = self.hub.state.lock().unreachable_topics.contains(topic);
        self.hub.record(Call::Probe {
            topic: topic.to_string(),
        });
        if unreachable {
            Err(TransportError::Rejected(format!("topic {topic} unavailable")))
        } else {
            Ok(())
        }
    }
}

/// Lets every runnable task finish without moving the paused clock past
/// pending timers.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Returns a config for the `EXCEL` service.
pub fn config() -> EndpointConfig {
    EndpointConfig::builder()
        .service("EXCEL")
        .build()
        .expect("valid config")
}

/// Drains the events received so far.
pub fn drain(rx: &mut broadcast::Receiver<EndpointEvent>) -> Vec<EndpointEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
