// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `dde_session` library.
//!
//! Configuration errors are fatal and surface at construction time. Transport
//! errors are reported to the caller of the failing operation, or logged and
//! published on the endpoint event bus when they happen in the background
//! (reconnects, replays, topic probes).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Required setup is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The underlying transport reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A payload could not be converted to a DDE value.
    #[error("value error: {0}")]
    Value(String),

    /// The endpoint was closed and accepts no further operations.
    #[error("endpoint is closed")]
    Closed,
}

/// Errors in endpoint or session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No DDE service name was configured.
    #[error("no DDE service configured")]
    MissingService,

    /// The session function name is not one of the supported operations.
    #[error("invalid control function: {0}")]
    InvalidFunction(String),

    /// A parameter required by the operation was neither configured nor
    /// provided by the message.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A configuration value could not be interpreted.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// Configuration JSON could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by a [`Transport`](crate::transport::Transport).
///
/// This type is `Clone` so it can travel on the broadcast event bus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Establishing the connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection dropped while the operation was in flight.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// The operation timed out.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// The remote service rejected the operation.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// There is no transport to run the operation on.
    #[error("not connected")]
    NotConnected,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidFunction("subscribe".to_string());
        assert_eq!(err.to_string(), "invalid control function: subscribe");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingService.into();
        assert!(matches!(err, Error::Config(ConfigError::MissingService)));
        assert_eq!(
            err.to_string(),
            "configuration error: no DDE service configured"
        );
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Timeout(10_000);
        assert_eq!(err.to_string(), "operation timed out after 10000 ms");
    }

    #[test]
    fn error_from_transport_error() {
        let err: Error = TransportError::Rejected("busy".to_string()).into();
        assert!(matches!(err, Error::Transport(TransportError::Rejected(_))));
    }

    #[test]
    fn missing_parameter_display() {
        let err = ConfigError::MissingParameter("topic");
        assert_eq!(err.to_string(), "missing parameter: topic");
    }
}
