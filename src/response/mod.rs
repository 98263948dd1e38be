// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoders for the inverter's JSON payloads.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! {"data": {...}, "message": "SUCCESS", "deviceId": "E17000000123"}
//! ```
//!
//! The decoders here are pure functions from that JSON to typed records.
//! They declare which fields are required: a missing required field or a
//! value of the wrong type is a [`DecodeError`](crate::error::DecodeError),
//! never a silent zero. Unknown extra fields are ignored so newer firmware
//! keeps decoding.
//!
//! Numeric fields may arrive either as JSON numbers or as numeric strings;
//! both are accepted.

mod alarm;
mod device_info;
mod fields;
mod output;
mod power;

pub use alarm::{Alarm, AlarmFlags};
pub use device_info::DeviceInfo;
pub use output::OutputData;
pub use power::{CommandAck, PowerSetting};
