// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that publish device snapshots.

use crate::protocol::Endpoint;
use crate::state::{DeviceState, FetchFailure};
use crate::subscription::SubscriptionId;

/// Trait for types that deliver snapshots to callbacks.
///
/// Implemented by [`SnapshotStore`](crate::state::SnapshotStore) and by
/// [`Coordinator`](crate::coordinator::Coordinator), which forwards to its
/// store.
///
/// # Examples
///
/// ```
/// use ezhi_local::state::SnapshotStore;
/// use ezhi_local::subscription::Subscribable;
///
/// let store = SnapshotStore::new();
/// let id = store.on_snapshot(|state| {
///     if let Some(output) = state.power().value() {
///         println!("PV: {} W", output.pv_power);
///     }
/// });
/// assert!(store.unsubscribe(id));
/// ```
pub trait Subscribable {
    /// Subscribes to published snapshots.
    ///
    /// The callback runs once per publish, with the complete merged state.
    fn on_snapshot<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static;

    /// Subscribes to fetch failures.
    fn on_fetch_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Endpoint, &FetchFailure) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
