// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data values exchanged with a DDE server.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The data of a DDE item.
///
/// Text formats carry strings; every other format is an opaque byte buffer.
///
/// # Examples
///
/// ```
/// use dde_session::types::DdeValue;
/// use serde_json::json;
///
/// let text = DdeValue::try_from(json!("21.5")).unwrap();
/// assert_eq!(text, DdeValue::Text("21.5".to_string()));
///
/// let bytes = DdeValue::try_from(json!([1, 2, 3])).unwrap();
/// assert_eq!(bytes, DdeValue::Binary(vec![1, 2, 3]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DdeValue {
    /// Textual item data.
    Text(String),
    /// Raw item data.
    Binary(Vec<u8>),
}

impl DdeValue {
    /// Returns the text if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    /// Returns the value as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }

    /// Converts the value to JSON for outgoing messages.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Binary(b) => Value::Array(b.iter().map(|&x| Value::from(x)).collect()),
        }
    }
}

impl fmt::Display for DdeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Binary(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for DdeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DdeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for DdeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl TryFrom<Value> for DdeValue {
    type Error = Error;

    /// Strings, numbers and booleans become text; arrays of bytes become
    /// binary data.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::Text(s)),
            Value::Number(n) => Ok(Self::Text(n.to_string())),
            Value::Bool(b) => Ok(Self::Text(b.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| Error::Value(format!("{item} is not a byte")))
                })
                .collect::<Result<Vec<u8>, Error>>()
                .map(Self::Binary),
            Value::Null => Err(Error::Value("payload is empty".to_string())),
            Value::Object(_) => Err(Error::Value(
                "objects cannot be sent as DDE data".to_string(),
            )),
        }
    }
}
