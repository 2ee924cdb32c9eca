// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages flowing through a session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transport::AdviseData;
use crate::types::Format;

use super::config::OneOrMany;

/// An input or output message of a [`Session`](super::Session).
///
/// Fields the session does not know about are kept in `extra` and survive
/// the round trip through [`Session::handle`](super::Session::handle).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMessage {
    /// Conversation topic, used when the session has none configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Item or items, used when the session has none configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<OneOrMany<String>>,
    /// Clipboard format, used when the session has none configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    /// Data to poke, commands to execute, or the values read.
    pub payload: Value,
    /// Any other message properties.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionMessage {
    /// Creates a message carrying only a payload.
    #[must_use]
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Sets the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the item or items.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<OneOrMany<String>>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Sets the clipboard format.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

impl From<AdviseData> for SessionMessage {
    fn from(data: AdviseData) -> Self {
        Self {
            payload: data.data.to_json(),
            topic: Some(data.topic),
            item: Some(OneOrMany::One(data.item)),
            format: Some(data.format),
            extra: Map::new(),
        }
    }
}
