// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer events emitted by endpoints.
//!
//! Every endpoint owns an [`EventBus`]. Observers subscribe to it to receive
//! status changes, advise data, per-topic disconnects and background errors.
//!
//! # Examples
//!
//! ```no_run
//! use dde_session::event::{EndpointEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if let EndpointEvent::Advise { data, .. } = event {
//!             println!("{}!{} = {}", data.topic, data.item, data.data);
//!         }
//!     }
//! });
//! ```

mod endpoint_event;
mod endpoint_id;
mod event_bus;

pub use endpoint_event::{EndpointEvent, ErrorContext};
pub use endpoint_id::EndpointId;
pub use event_bus::EventBus;
