// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Battery status type.

use std::fmt;

/// Operating status of the attached battery.
///
/// Decoded from the small integer code the inverter reports. Codes this
/// library does not know are kept as [`Unknown`](Self::Unknown) so newer
/// firmware does not break decoding.
///
/// # Examples
///
/// ```
/// use ezhi_local::types::BatteryStatus;
///
/// assert_eq!(BatteryStatus::from_code(2), BatteryStatus::Charging);
/// assert_eq!(BatteryStatus::from_code(42), BatteryStatus::Unknown(42));
/// assert_eq!(BatteryStatus::Charging.to_string(), "Charging");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum BatteryStatus {
    /// Battery neither charging nor discharging.
    Idle,
    /// Battery is charging.
    Charging,
    /// Battery is discharging.
    Discharging,
    /// Battery reports a fault.
    Fault,
    /// Battery is shut down.
    Shutdown,
    /// No communication with the battery, or with the inverter itself.
    NoCommunication,
    /// A code this library does not recognise.
    Unknown(i64),
}

impl BatteryStatus {
    /// Maps a raw status code to a status.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Idle,
            2 => Self::Charging,
            3 => Self::Discharging,
            4 => Self::Fault,
            5 => Self::Shutdown,
            6 => Self::NoCommunication,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw code for this status, if it has one.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Idle => 1,
            Self::Charging => 2,
            Self::Discharging => 3,
            Self::Fault => 4,
            Self::Shutdown => 5,
            Self::NoCommunication => 6,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns `true` for statuses that need attention.
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        matches!(self, Self::Fault | Self::Shutdown | Self::NoCommunication)
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Charging => f.write_str("Charging"),
            Self::Discharging => f.write_str("Discharging"),
            Self::Fault => f.write_str("Fault"),
            Self::Shutdown => f.write_str("Shutdown"),
            Self::NoCommunication => f.write_str("No Communication"),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        let expected = [
            (1, BatteryStatus::Idle),
            (2, BatteryStatus::Charging),
            (3, BatteryStatus::Discharging),
            (4, BatteryStatus::Fault),
            (5, BatteryStatus::Shutdown),
            (6, BatteryStatus::NoCommunication),
        ];
        for (code, status) in expected {
            assert_eq!(BatteryStatus::from_code(code), status);
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(BatteryStatus::from_code(0), BatteryStatus::Unknown(0));
        assert_eq!(BatteryStatus::from_code(7).code(), 7);
        assert_eq!(BatteryStatus::Unknown(7).to_string(), "Unknown (7)");
    }

    #[test]
    fn problem_statuses() {
        assert!(BatteryStatus::Fault.is_problem());
        assert!(BatteryStatus::NoCommunication.is_problem());
        assert!(!BatteryStatus::Charging.is_problem());
    }
}
