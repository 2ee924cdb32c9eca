// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::timer::MIN_CYCLE_TIME;

/// Default NetDDE server port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default delay between a connection loss and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Default delay before offline topics are probed again.
pub const DEFAULT_RECHECK_DELAY: Duration = Duration::from_millis(5000);

/// Configuration of a DDE endpoint.
///
/// Loaded once when the endpoint starts. The only required value is the DDE
/// service name; everything else has a default.
///
/// The JSON form accepts the keys used by flow editors (`address`, `timeout`,
/// `trackadvise`, `process`) as well as the field names.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dde_session::endpoint::EndpointConfig;
///
/// let config = EndpointConfig::builder()
///     .service("EXCEL")
///     .host("192.168.1.20")
///     .connect_timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(config.port(), 8888);
///
/// let config = EndpointConfig::from_json(
///     r#"{"service": "RSLinx", "address": "plc-gw", "port": 8888, "trackadvise": true}"#,
/// )
/// .unwrap();
/// assert_eq!(config.host(), "plc-gw");
/// assert!(config.track_advise());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    service: String,
    #[serde(alias = "address")]
    host: String,
    port: u16,
    #[serde(rename = "timeout", with = "duration_ms")]
    connect_timeout: Duration,
    #[serde(alias = "process")]
    client_name: String,
    #[serde(alias = "trackadvise")]
    track_advise: bool,
    #[serde(rename = "reconnect_delay_ms", with = "duration_ms")]
    reconnect_delay: Duration,
    #[serde(rename = "recheck_delay_ms", with = "duration_ms")]
    recheck_delay: Duration,
    reconnect_on_operation_error: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(10),
            client_name: "dde_session".to_string(),
            track_advise: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            recheck_delay: DEFAULT_RECHECK_DELAY,
            reconnect_on_operation_error: false,
        }
    }
}

impl EndpointConfig {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> EndpointConfigBuilder {
        EndpointConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` for malformed JSON and
    /// `ConfigError::MissingService` when no service is given.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can drive an endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingService` if the service name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.trim().is_empty() {
            return Err(ConfigError::MissingService);
        }
        Ok(())
    }

    /// Returns the DDE service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the NetDDE server host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the NetDDE server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the connection timeout handed to the transport.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the client name announced to the server.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Returns whether advise loops are tracked and replayed.
    #[must_use]
    pub fn track_advise(&self) -> bool {
        self.track_advise
    }

    /// Returns the reconnect delay, never below the minimum cycle time.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay.max(MIN_CYCLE_TIME)
    }

    /// Returns the offline topic recheck delay, never below the minimum
    /// cycle time.
    #[must_use]
    pub fn recheck_delay(&self) -> Duration {
        self.recheck_delay.max(MIN_CYCLE_TIME)
    }

    /// Returns whether a failed operation forces a reconnect.
    ///
    /// Off by default: an operation error alone leaves the connection
    /// assumed healthy until the transport reports a close.
    #[must_use]
    pub fn reconnect_on_operation_error(&self) -> bool {
        self.reconnect_on_operation_error
    }
}

/// Builder for [`EndpointConfig`].
#[derive(Debug, Default)]
pub struct EndpointConfigBuilder {
    config: EndpointConfig,
}

impl EndpointConfigBuilder {
    /// Sets the DDE service name (required).
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    /// Sets the NetDDE server host (default: `localhost`).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the NetDDE server port (default: 8888).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the client name announced to the server.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Enables or disables advise tracking (default: enabled).
    #[must_use]
    pub fn track_advise(mut self, enabled: bool) -> Self {
        self.config.track_advise = enabled;
        self
    }

    /// Sets the reconnect delay (default: 5 seconds).
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Sets the offline topic recheck delay (default: 5 seconds).
    #[must_use]
    pub fn recheck_delay(mut self, delay: Duration) -> Self {
        self.config.recheck_delay = delay;
        self
    }

    /// Makes failed operations force a reconnect (default: off).
    #[must_use]
    pub fn reconnect_on_operation_error(mut self, enabled: bool) -> Self {
        self.config.reconnect_on_operation_error = enabled;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingService` if no service was set.
    pub fn build(self) -> Result<EndpointConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
