// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed request shapes for the inverter API.
//!
//! | Command | Endpoint | Query |
//! |---------|----------|-------|
//! | [`ReadCommand::DeviceInfo`] | `/getDeviceInfo` | |
//! | [`ReadCommand::OutputData`] | `/getOutputData` | |
//! | [`ReadCommand::Alarm`] | `/getAlarm` | |
//! | [`PowerCommand::Get`] | `/getPower` | |
//! | [`PowerCommand::Set`] | `/setPower` | `p=<watts>` |
//!
//! # Examples
//!
//! ```
//! use ezhi_local::command::{Command, PowerCommand};
//! use ezhi_local::protocol::Endpoint;
//! use ezhi_local::types::PowerLimit;
//!
//! let cmd = PowerCommand::Set(PowerLimit::new(-300).unwrap());
//! assert_eq!(cmd.endpoint(), Endpoint::SetPower);
//! assert_eq!(cmd.query(), vec![("p", "-300".to_string())]);
//! ```

mod power;

pub use power::PowerCommand;

use crate::protocol::Endpoint;

/// A request that can be sent to the inverter.
pub trait Command {
    /// Returns the endpoint this command targets.
    fn endpoint(&self) -> Endpoint;

    /// Returns the query parameters, if any.
    fn query(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Read-only queries polled by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadCommand {
    /// Query `/getDeviceInfo`.
    DeviceInfo,
    /// Query `/getOutputData`.
    OutputData,
    /// Query `/getAlarm`.
    Alarm,
}

impl Command for ReadCommand {
    fn endpoint(&self) -> Endpoint {
        match self {
            Self::DeviceInfo => Endpoint::DeviceInfo,
            Self::OutputData => Endpoint::OutputData,
            Self::Alarm => Endpoint::Alarm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_commands_have_no_query() {
        for cmd in [ReadCommand::DeviceInfo, ReadCommand::OutputData, ReadCommand::Alarm] {
            assert!(cmd.query().is_empty());
        }
    }

    #[test]
    fn read_command_endpoints() {
        assert_eq!(ReadCommand::Alarm.endpoint(), Endpoint::Alarm);
        assert_eq!(ReadCommand::OutputData.endpoint().path(), "/getOutputData");
    }
}
