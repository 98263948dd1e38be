// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback subscriptions for published snapshots.
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Registry that stores callbacks and dispatches snapshots
//! - [`Subscribable`] - Trait for types that support subscriptions
//!
//! Callbacks are the push side of the snapshot store. Hosts that prefer to
//! pull can use [`SnapshotStore::watch`](crate::state::SnapshotStore::watch)
//! instead.

mod callback;
mod subscribable;

pub use callback::{CallbackRegistry, SubscriptionId};
pub use subscribable::Subscribable;
