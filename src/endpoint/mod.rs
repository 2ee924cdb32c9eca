// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resilient DDE endpoints.
//!
//! An [`Endpoint`] owns the connection to one DDE service. It keeps the
//! connection alive across failures, tracks advise loops so they survive
//! reconnects, and watches topics whose conversation dropped while the
//! connection itself stayed up.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──► Connecting ──► Online
//!                     ▲             │ connection lost
//!                     │             ▼
//!                     └─ 5 s ──── Offline
//!
//! any state ──close()──► Closed
//! ```

mod config;
mod driver;
mod handle;
mod state;
mod status;
mod timer;

pub use config::{
    DEFAULT_PORT, DEFAULT_RECHECK_DELAY, DEFAULT_RECONNECT_DELAY, EndpointConfig,
    EndpointConfigBuilder,
};
pub use handle::Endpoint;
pub use state::ConnectionState;
pub use status::Status;
pub use timer::MIN_CYCLE_TIME;

pub(crate) use driver::DriverEvent;
