// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-message dispatch of session operations.

use std::future::Future;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::endpoint::{Endpoint, Status};
use crate::error::{ConfigError, Error, Result};
use crate::event::EndpointEvent;
use crate::transport::Transport;
use crate::types::{DdeValue, Format};

use super::config::{OneOrMany, SessionConfig, SessionFunction};
use super::message::SessionMessage;

/// Runs one configured operation against an endpoint for every message.
///
/// Items and commands fan out to one endpoint call each. All calls run
/// concurrently and run to completion; the message fails as a whole if any
/// of them fails.
///
/// # Examples
///
/// ```ignore
/// use dde_session::session::{Session, SessionConfig, SessionFunction, SessionMessage};
///
/// let session = Session::new(
///     endpoint.clone(),
///     SessionConfig::new(SessionFunction::Request).with_topic("Sheet1"),
/// )?;
///
/// let reply = session
///     .handle(SessionMessage::default().with_item(vec!["R1C1".into(), "R2C1".into()]))
///     .await?;
/// println!("{}", reply.payload); // ["12", "13"]
/// ```
#[derive(Debug)]
pub struct Session<T: Transport> {
    endpoint: Endpoint<T>,
    function: SessionFunction,
    config: SessionConfig,
}

/// Parameters of one message after applying the configuration.
struct Resolved {
    topic: String,
    items: Vec<String>,
    format: Format,
}

fn non_blank(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.trim().is_empty())
}

impl<T: Transport> Session<T> {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFunction` if the configured function is
    /// unknown.
    pub fn new(
        endpoint: Endpoint<T>,
        config: SessionConfig,
    ) -> std::result::Result<Self, ConfigError> {
        let function = config.function().inspect_err(|e| {
            tracing::error!(error = %e, "Invalid session configuration");
        })?;

        tracing::debug!(
            endpoint = %endpoint.id(),
            function = %function,
            "Session created"
        );

        Ok(Self {
            endpoint,
            function,
            config,
        })
    }

    /// Returns the operation this session performs.
    #[must_use]
    pub fn function(&self) -> SessionFunction {
        self.function
    }

    /// Returns the endpoint of this session.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint<T> {
        &self.endpoint
    }

    /// Returns the current endpoint status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.endpoint.status()
    }

    /// Processes one input message.
    ///
    /// On success the message is returned unchanged, except for `request`
    /// which replaces the payload with the value read (a single value for one
    /// item, an array otherwise).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingParameter` if the topic, items or commands
    /// are neither configured nor present in the message, `Error::Value` if
    /// the payload cannot be converted, or the first failing endpoint call.
    pub async fn handle(&self, mut msg: SessionMessage) -> Result<SessionMessage> {
        let result = match self.function {
            SessionFunction::Request => self.request(&mut msg).await,
            SessionFunction::Poke => self.poke(&msg).await,
            SessionFunction::Execute => self.execute(&msg).await,
            SessionFunction::Advise => self.advise(&msg).await,
            SessionFunction::AdviseStop => self.stop_advise(&msg).await,
            SessionFunction::AdviseStopAll => self.endpoint.stop_advise_all().await,
        };

        match result {
            Ok(()) => Ok(msg),
            Err(e) => {
                tracing::warn!(function = %self.function, error = %e, "Session operation failed");
                Err(e)
            }
        }
    }

    /// Returns a stream of advise data messages for `advise` sessions.
    ///
    /// Returns `None` for every other function.
    #[must_use]
    pub fn advise_listener(&self) -> Option<AdviseListener> {
        (self.function == SessionFunction::Advise).then(|| AdviseListener {
            rx: self.endpoint.subscribe(),
        })
    }

    fn resolve(&self, msg: &SessionMessage) -> Result<Resolved> {
        let topic = non_blank(self.config.topic.as_ref())
            .or(non_blank(msg.topic.as_ref()))
            .cloned()
            .ok_or(ConfigError::MissingParameter("topic"))?;

        let format = self.config.format.or(msg.format).unwrap_or_default();

        let items = if self.function.uses_items() {
            let items = self
                .config
                .item
                .as_ref()
                .filter(|item| !item.is_empty())
                .or(msg.item.as_ref())
                .cloned()
                .map(OneOrMany::into_vec)
                .unwrap_or_default();
            if items.is_empty() {
                return Err(ConfigError::MissingParameter("item").into());
            }
            items
        } else {
            Vec::new()
        };

        Ok(Resolved {
            topic,
            items,
            format,
        })
    }

    async fn request(&self, msg: &mut SessionMessage) -> Result<()> {
        let Resolved {
            topic,
            items,
            format,
        } = self.resolve(msg)?;

        let mut values = settle_all(
            items
                .iter()
                .map(|item| self.endpoint.request(&topic, item, format)),
        )
        .await?;

        msg.payload = if values.len() == 1 {
            values.remove(0).to_json()
        } else {
            Value::Array(values.iter().map(DdeValue::to_json).collect())
        };
        Ok(())
    }

    async fn poke(&self, msg: &SessionMessage) -> Result<()> {
        let Resolved {
            topic,
            items,
            format,
        } = self.resolve(msg)?;
        let data = DdeValue::try_from(msg.payload.clone())?;

        settle_all(
            items
                .iter()
                .map(|item| self.endpoint.poke(&topic, item, format, &data)),
        )
        .await?;
        Ok(())
    }

    async fn execute(&self, msg: &SessionMessage) -> Result<()> {
        let Resolved { topic, .. } = self.resolve(msg)?;
        let commands = match self.config.command.as_ref().filter(|c| !c.is_empty()) {
            Some(commands) => commands.clone().into_vec(),
            None => commands_from_payload(&msg.payload)?,
        };

        settle_all(
            commands
                .iter()
                .map(|command| self.endpoint.execute(&topic, command)),
        )
        .await?;
        Ok(())
    }

    async fn advise(&self, msg: &SessionMessage) -> Result<()> {
        let Resolved {
            topic,
            items,
            format,
        } = self.resolve(msg)?;

        settle_all(
            items
                .iter()
                .map(|item| self.endpoint.advise(&topic, item, format)),
        )
        .await?;
        Ok(())
    }

    async fn stop_advise(&self, msg: &SessionMessage) -> Result<()> {
        let Resolved {
            topic,
            items,
            format,
        } = self.resolve(msg)?;

        settle_all(
            items
                .iter()
                .map(|item| self.endpoint.stop_advise(&topic, item, format)),
        )
        .await?;
        Ok(())
    }
}

/// Awaits every call, then returns the results or the first error in call
/// order. A failure never cancels its siblings.
async fn settle_all<I, F, R>(calls: I) -> Result<Vec<R>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<R>>,
{
    join_all(calls).await.into_iter().collect()
}

/// Reads execute commands from a message payload.
fn commands_from_payload(payload: &Value) -> Result<Vec<String>> {
    match payload {
        Value::String(command) => Ok(vec![command.clone()]),
        Value::Array(commands) if !commands.is_empty() => commands
            .iter()
            .map(|command| {
                command
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::Value(format!("command {command} is not a string")))
            })
            .collect(),
        Value::Null | Value::Array(_) => Err(ConfigError::MissingParameter("command").into()),
        other => Err(Error::Value(format!(
            "command must be a string or a list of strings, got {other}"
        ))),
    }
}

/// Advise data of an endpoint, shaped as session output messages.
#[derive(Debug)]
pub struct AdviseListener {
    rx: broadcast::Receiver<EndpointEvent>,
}

impl AdviseListener {
    /// Waits for the next advise data message.
    ///
    /// Returns `None` once the endpoint is closed.
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        loop {
            match self.rx.recv().await {
                Ok(EndpointEvent::Advise { data, .. }) => return Some(data.into()),
                Ok(EndpointEvent::Closed { .. }) | Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Advise listener lagged behind");
                }
            }
        }
    }
}
