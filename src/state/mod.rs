// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merged device state and the store that publishes it.
//!
//! A [`DeviceState`] is an immutable snapshot made of independently
//! refreshed [`Section`]s. The [`SnapshotStore`] swaps whole snapshots in
//! atomically, so a reader always sees one consistent version.
//!
//! # Examples
//!
//! ```
//! use ezhi_local::state::SnapshotStore;
//!
//! let store = SnapshotStore::new();
//! let state = store.current();
//! assert!(!state.has_data());
//! assert!(state.alarms().last_error().is_none());
//! ```

mod device_state;
mod store;

pub(crate) use device_state::Stamp;
pub use device_state::{DeviceState, FailureKind, FetchFailure, Section};
pub use store::SnapshotStore;
