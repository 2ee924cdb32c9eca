// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dde_session` - Resilient client sessions for DDE and NetDDE services.
//!
//! This library keeps a client connection to a DDE service alive across
//! network instability. It reconnects after failures, remembers the advise
//! loops the application set up and re-establishes them after every
//! reconnect, and recovers individual topics whose conversation dropped while
//! the connection stayed up.
//!
//! The wire protocol is not part of this crate. Plug in any client through the
//! [`Transport`] trait.
//!
//! # Features
//!
//! - **Reconnects**: fixed 5 s delay, never more than one pending attempt
//! - **Advise tracking**: accepted advise loops are replayed after reconnects
//! - **Topic recovery**: lost topics are probed every 5 s and re-advised
//! - **Observers**: status changes and advise data on a broadcast bus
//! - **Sessions**: message-driven request, poke, execute and advise with
//!   multi-item fan-out
//!
//! # Quick Start
//!
//! ```ignore
//! use dde_session::{Endpoint, EndpointConfig, Format};
//!
//! #[tokio::main]
//! async fn main() -> dde_session::Result<()> {
//!     let config = EndpointConfig::builder()
//!         .service("EXCEL")
//!         .host("192.168.1.20")
//!         .build()?;
//!
//!     let endpoint = Endpoint::start(config, |config: &EndpointConfig, events| {
//!         NetDdeClient::new(config, events)
//!     })?;
//!
//!     let value = endpoint.request("Sheet1", "R1C1", Format::Text).await?;
//!     println!("R1C1 = {value}");
//!
//!     endpoint.advise("Sheet1", "R2C1", Format::Text).await?;
//!     endpoint.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Sessions
//!
//! ```ignore
//! use dde_session::session::{Session, SessionConfig, SessionFunction, SessionMessage};
//!
//! let session = Session::new(
//!     endpoint.clone(),
//!     SessionConfig::new(SessionFunction::Advise).with_topic("Sheet1"),
//! )?;
//! session
//!     .handle(SessionMessage::default().with_item(vec!["R1C1".into(), "R1C2".into()]))
//!     .await?;
//!
//! if let Some(mut advise) = session.advise_listener() {
//!     while let Some(msg) = advise.recv().await {
//!         println!("{:?} = {}", msg.item, msg.payload);
//!     }
//! }
//! ```

pub mod endpoint;
pub mod error;
pub mod event;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod types;

pub use endpoint::{ConnectionState, Endpoint, EndpointConfig, EndpointConfigBuilder, Status};
pub use error::{ConfigError, Error, Result, TransportError};
pub use event::{EndpointEvent, EndpointId, ErrorContext, EventBus};
pub use session::{Session, SessionConfig, SessionFunction, SessionMessage};
pub use subscription::{Subscription, SubscriptionKey};
pub use transport::{AdviseData, EventSink, Transport, TransportEvent, TransportFactory};
pub use types::{DdeValue, Format};
