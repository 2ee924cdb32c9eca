// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for DDE conversations.
//!
//! - [`Format`] - Clipboard format of an item (`CF_TEXT`, `CF_UNICODETEXT`, ...)
//! - [`DdeValue`] - Item data, either text or raw bytes

mod format;
mod value;

pub use format::Format;
pub use value::DdeValue;
