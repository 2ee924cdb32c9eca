// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription bookkeeping for an endpoint.
//!
//! - [`AdviseRegistry`] - advise loops to keep alive and replay after reconnects
//! - [`OfflineTopics`] - topics whose conversation is currently lost
//!
//! Both are plain owned collections. The endpoint owns one of each and
//! guards them with its state lock, so every mutation happens through it.

mod offline;
mod registry;

pub use offline::OfflineTopics;
pub use registry::{AdviseRegistry, Subscription, SubscriptionKey};
