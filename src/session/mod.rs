// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Message-driven operations on an endpoint.
//!
//! A [`Session`] is configured with one [`SessionFunction`] and runs it for
//! every [`SessionMessage`] it is given. Topic, items, format and commands come
//! from the [`SessionConfig`] first and from the message otherwise.

mod config;
mod dispatch;
mod message;

pub use config::{OneOrMany, SessionConfig, SessionFunction};
pub use dispatch::{AdviseListener, Session};
pub use message::SessionMessage;
