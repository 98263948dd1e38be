// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback storage and dispatch for snapshot subscriptions.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::protocol::Endpoint;
use crate::state::{DeviceState, FetchFailure};

/// Unique identifier for a subscription.
///
/// Returned when registering a callback; pass it back to unsubscribe.
/// IDs are never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type SnapshotCallback = Arc<dyn Fn(&DeviceState) + Send + Sync>;

type FailureCallback = Arc<dyn Fn(Endpoint, &FetchFailure) + Send + Sync>;

/// Registry of snapshot and failure callbacks.
///
/// Callbacks run synchronously on the publishing task, in registration
/// order. The registry lock is released before any callback runs, so a
/// callback may itself subscribe or unsubscribe.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    snapshot_callbacks: RwLock<BTreeMap<SubscriptionId, SnapshotCallback>>,
    failure_callbacks: RwLock<BTreeMap<SubscriptionId, FailureCallback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            snapshot_callbacks: RwLock::new(BTreeMap::new()),
            failure_callbacks: RwLock::new(BTreeMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback invoked with every published snapshot.
    pub fn on_snapshot<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.snapshot_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback invoked whenever a fetch fails.
    ///
    /// The callback receives the endpoint that failed and the recorded
    /// failure.
    pub fn on_fetch_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Endpoint, &FetchFailure) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.failure_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.snapshot_callbacks.write().remove(&id).is_some()
            || self.failure_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.snapshot_callbacks.write().clear();
        self.failure_callbacks.write().clear();
    }

    /// Delivers a snapshot to every snapshot callback.
    pub fn dispatch(&self, state: &DeviceState) {
        let callbacks: Vec<SnapshotCallback> =
            self.snapshot_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(state);
        }
    }

    /// Delivers a fetch failure to every failure callback.
    pub fn dispatch_failure(&self, endpoint: Endpoint, failure: &FetchFailure) {
        let callbacks: Vec<FailureCallback> =
            self.failure_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(endpoint, failure);
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.snapshot_callbacks.read().len() + self.failure_callbacks.read().len()
    }

    /// Returns `true` if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("snapshot_callbacks", &self.snapshot_callbacks.read().len())
            .field("failure_callbacks", &self.failure_callbacks.read().len())
            .finish_non_exhaustive()
    }
}
