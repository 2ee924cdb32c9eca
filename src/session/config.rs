// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Format;

/// The operation a session performs for every input message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionFunction {
    /// Read items.
    Request,
    /// Write the payload to items.
    Poke,
    /// Send commands.
    Execute,
    /// Start advise loops and forward their data.
    Advise,
    /// Stop advise loops.
    AdviseStop,
    /// Stop every tracked advise loop of the endpoint.
    AdviseStopAll,
}

impl SessionFunction {
    /// Returns the configuration name of the function.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Poke => "poke",
            Self::Execute => "execute",
            Self::Advise => "advise",
            Self::AdviseStop => "advise-stop",
            Self::AdviseStopAll => "advise-stop-all",
        }
    }

    /// Returns true if the function addresses individual items.
    #[must_use]
    pub const fn uses_items(&self) -> bool {
        matches!(
            self,
            Self::Request | Self::Poke | Self::Advise | Self::AdviseStop
        )
    }
}

impl fmt::Display for SessionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(Self::Request),
            "poke" => Ok(Self::Poke),
            "execute" => Ok(Self::Execute),
            "advise" => Ok(Self::Advise),
            "advise-stop" => Ok(Self::AdviseStop),
            "advise-stop-all" => Ok(Self::AdviseStopAll),
            other => Err(ConfigError::InvalidFunction(other.to_string())),
        }
    }
}

/// A single value or a list of values.
///
/// Items and commands may be given either way; a single value behaves like a
/// one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// One value.
    One(T),
    /// Several values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Returns the values as a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }

    /// Returns true if there is no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Many(values) if values.is_empty())
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

/// Configuration of a [`Session`](super::Session).
///
/// Configured parameters take precedence over the ones carried by input
/// messages. Blank strings count as not configured.
///
/// # Examples
///
/// ```
/// use dde_session::session::{SessionConfig, SessionFunction};
///
/// let config: SessionConfig = serde_json::from_str(
///     r#"{"function": "request", "topic": "Sheet1", "item": ["R1C1", "R1C2"]}"#,
/// )
/// .unwrap();
/// assert_eq!(config.function().unwrap(), SessionFunction::Request);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the operation, see [`SessionFunction`].
    pub function: String,
    /// Conversation topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Item or items to operate on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<OneOrMany<String>>,
    /// Clipboard format of the items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    /// Command or commands for `execute`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<OneOrMany<String>>,
}

impl SessionConfig {
    /// Creates a configuration for `function` with no fixed parameters.
    #[must_use]
    pub fn new(function: SessionFunction) -> Self {
        Self {
            function: function.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Fixes the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Fixes the item or items.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<OneOrMany<String>>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Fixes the clipboard format.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Fixes the command or commands.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<OneOrMany<String>>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Parses the configured function.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFunction` for an unknown name.
    pub fn function(&self) -> Result<SessionFunction, ConfigError> {
        self.function.parse()
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
