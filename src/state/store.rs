// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Atomic snapshot publication.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::protocol::Endpoint;
use crate::state::{DeviceState, FetchFailure};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};

struct StoreInner {
    current: RwLock<Arc<DeviceState>>,
    // Serializes clone-modify-swap and dispatch so subscribers see
    // snapshots in publish order.
    writer: Mutex<()>,
    callbacks: CallbackRegistry,
    sender: watch::Sender<Arc<DeviceState>>,
}

/// Holds the latest [`DeviceState`] and notifies subscribers.
///
/// Readers get an `Arc` to an immutable snapshot, so a reader never sees a
/// half-merged state and never waits on a fetch. Cloning the store is cheap
/// and every clone shares the same state.
///
/// # Examples
///
/// ```
/// use ezhi_local::state::SnapshotStore;
///
/// let store = SnapshotStore::new();
/// let before = store.current();
/// assert_eq!(before.version(), 0);
///
/// let mut rx = store.watch();
/// assert_eq!(rx.borrow_and_update().version(), 0);
/// ```
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<StoreInner>,
}

impl SnapshotStore {
    /// Creates a store holding an empty state.
    #[must_use]
    pub fn new() -> Self {
        let initial = Arc::new(DeviceState::new());
        let (sender, _) = watch::channel(Arc::clone(&initial));
        Self {
            inner: Arc::new(StoreInner {
                current: RwLock::new(initial),
                writer: Mutex::new(()),
                callbacks: CallbackRegistry::new(),
                sender,
            }),
        }
    }

    /// Returns the latest published snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<DeviceState> {
        Arc::clone(&self.inner.current.read())
    }

    /// Returns a receiver that is notified of every publish.
    ///
    /// A slow receiver only ever sees the newest snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<DeviceState>> {
        self.inner.sender.subscribe()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.callbacks.callback_count()
    }

    /// Applies `update` to a copy of the current state and publishes the
    /// result as one new snapshot.
    ///
    /// Callbacks must not publish: the writer lock is held while they run.
    pub(crate) fn publish<F>(&self, update: F) -> Arc<DeviceState>
    where
        F: FnOnce(&mut DeviceState),
    {
        let _writer = self.inner.writer.lock();

        let mut next = DeviceState::clone(&self.current());
        update(&mut next);
        next.bump_version();
        let next = Arc::new(next);

        *self.inner.current.write() = Arc::clone(&next);
        self.inner.sender.send_replace(Arc::clone(&next));
        self.inner.callbacks.dispatch(&next);

        tracing::trace!(version = next.version(), "Published snapshot");
        next
    }

    pub(crate) fn report_failure(&self, endpoint: Endpoint, failure: &FetchFailure) {
        self.inner.callbacks.dispatch_failure(endpoint, failure);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("version", &self.current().version())
            .field("callbacks", &self.inner.callbacks)
            .finish()
    }
}

impl Subscribable for SnapshotStore {
    fn on_snapshot<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_snapshot(callback)
    }

    fn on_fetch_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Endpoint, &FetchFailure) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_fetch_failed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}
