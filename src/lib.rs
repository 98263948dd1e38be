// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ezhi_local` - poll and control APsystems EZHI micro-inverters over
//! their local HTTP API.
//!
//! The inverter exposes five plain-HTTP endpoints. This library reads four
//! of them on two independent cadences, decodes the payloads into typed
//! records and merges them into immutable [`DeviceState`] snapshots. The
//! fifth endpoint sets the on-grid power limit.
//!
//! # Features
//!
//! - **Dual-interval polling**: power readings on a fast interval, alarms
//!   and device info on a slow one, each with its own failure boundary
//! - **Last-good values**: a failed fetch records an error next to the old
//!   value instead of erasing it
//! - **Power-limit control**: validated writes with a confirming read-back
//! - **Subscriptions**: callbacks and a `watch` channel, one notification
//!   per published snapshot
//!
//! # Quick Start
//!
//! ```no_run
//! use ezhi_local::{Coordinator, HttpConfig, InverterConfig, Subscribable};
//!
//! #[tokio::main]
//! async fn main() -> ezhi_local::Result<()> {
//!     let config = InverterConfig::new(HttpConfig::new("192.168.1.100"));
//!     let coordinator = Coordinator::connect(config)?;
//!
//!     coordinator.on_snapshot(|state| {
//!         if let Some(output) = state.power().value() {
//!             println!("PV {} W, battery {} %", output.pv_power, output.battery_soc);
//!         }
//!         if let Some(status) = state.battery_status() {
//!             println!("Battery: {status}");
//!         }
//!     });
//!     coordinator.start();
//!
//!     // Export at most 600 W to the grid.
//!     coordinator.set_power_limit(600).await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library logs through [`tracing`] and installs no subscriber.
//! Transport and decode failures are logged at `warn`; decode failures use
//! a distinct message because they point to a firmware or API change.

pub mod command;
pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod response;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::{Command, PowerCommand, ReadCommand};
pub use coordinator::{
    Coordinator, CoordinatorConfig, InverterConfig, SectionKind, SectionStats,
};
pub use error::{DecodeError, Error, Result, TransportError, ValueError};
pub use protocol::{Endpoint, HttpClient, HttpConfig, Transport};
pub use response::{Alarm, AlarmFlags, CommandAck, DeviceInfo, OutputData, PowerSetting};
pub use state::{DeviceState, FailureKind, FetchFailure, Section, SnapshotStore};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{BatteryStatus, PollIntervals, PowerLimit};
