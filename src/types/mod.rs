// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for inverter control and configuration.
//!
//! Each constrained type checks its range at construction time, so an
//! invalid value never reaches the network layer.
//!
//! # Types
//!
//! - [`PowerLimit`] - On-grid power setting in watts (-1200 to 1200)
//! - [`PollIntervals`] - Fast and slow polling cadences (each at least 1 s)
//! - [`BatteryStatus`] - Decoded battery status code

mod battery;
mod interval;
mod power;

pub use battery::BatteryStatus;
pub use interval::PollIntervals;
pub use power::PowerLimit;
