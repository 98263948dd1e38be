// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm flags from `/getAlarm`.
//!
//! The inverter reports 17 alarm bits as separate fields of the `data`
//! object. Each bit is expected in one of these encodings:
//!
//! | Encoding | Inactive | Active |
//! |---|---|---|
//! | string | `"0"` | `"1"` |
//! | number | `0` | `1` |
//! | boolean | `false` | `true` |
//!
//! `1` means the alarm is raised. Any other value (for example `"2"`,
//! `"on"` or `null`) is reported as
//! [`DecodeError::UnrecognizedEncoding`] instead of being guessed at.

use std::fmt;

use serde_json::Value;

use crate::error::DecodeError;

use super::fields::Envelope;

/// One of the inverter's alarm conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Alarm {
    /// `BatHTP`: battery high temperature protection.
    BatteryOvertemperature,
    /// `BatLTP`: battery low temperature protection.
    BatteryUndertemperature,
    /// `BatCE`: battery communication error.
    BatteryCommunicationError,
    /// `BatHV`: battery overvoltage.
    BatteryOvervoltage,
    /// `BatLV`: battery undervoltage.
    BatteryUndervoltage,
    /// `BatHI`: battery overcurrent.
    BatteryOvercurrent,
    /// `BatE`: battery error.
    BatteryError,
    /// `DTP`: device temperature protection.
    DeviceOvertemperature,
    /// `EE`: device error.
    DeviceError,
    /// `SBS`: battery shutdown.
    BatteryShutdown,
    /// `ACA`: AC abnormal.
    AcAbnormal,
    /// `OfOI`: off-grid overcurrent.
    OffGridOvercurrent,
    /// `PvHV`: PV high voltage.
    PvOvervoltage,
    /// `PvOC`: PV overcurrent.
    PvOvercurrent,
    /// `IRDE`: insulation resistance detection error.
    InsulationResistanceError,
    /// `PVWE`: PV wiring error.
    PvWiringError,
    /// `OfGS`: off-grid short circuit.
    OffGridShortCircuit,
}

impl Alarm {
    /// All alarms, in the order the device reports them.
    pub const ALL: [Self; 17] = [
        Self::BatteryOvertemperature,
        Self::BatteryUndertemperature,
        Self::BatteryCommunicationError,
        Self::BatteryOvervoltage,
        Self::BatteryUndervoltage,
        Self::BatteryOvercurrent,
        Self::BatteryError,
        Self::DeviceOvertemperature,
        Self::DeviceError,
        Self::BatteryShutdown,
        Self::AcAbnormal,
        Self::OffGridOvercurrent,
        Self::PvOvervoltage,
        Self::PvOvercurrent,
        Self::InsulationResistanceError,
        Self::PvWiringError,
        Self::OffGridShortCircuit,
    ];

    /// Returns the field name the device uses for this alarm.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BatteryOvertemperature => "BatHTP",
            Self::BatteryUndertemperature => "BatLTP",
            Self::BatteryCommunicationError => "BatCE",
            Self::BatteryOvervoltage => "BatHV",
            Self::BatteryUndervoltage => "BatLV",
            Self::BatteryOvercurrent => "BatHI",
            Self::BatteryError => "BatE",
            Self::DeviceOvertemperature => "DTP",
            Self::DeviceError => "EE",
            Self::BatteryShutdown => "SBS",
            Self::AcAbnormal => "ACA",
            Self::OffGridOvercurrent => "OfOI",
            Self::PvOvervoltage => "PvHV",
            Self::PvOvercurrent => "PvOC",
            Self::InsulationResistanceError => "IRDE",
            Self::PvWiringError => "PVWE",
            Self::OffGridShortCircuit => "OfGS",
        }
    }

    /// Returns a human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::BatteryOvertemperature => "Battery high temperature protection",
            Self::BatteryUndertemperature => "Battery low temperature protection",
            Self::BatteryCommunicationError => "Battery communication error",
            Self::BatteryOvervoltage => "Battery overvoltage",
            Self::BatteryUndervoltage => "Battery undervoltage",
            Self::BatteryOvercurrent => "Battery overcurrent",
            Self::BatteryError => "Battery error",
            Self::DeviceOvertemperature => "Device temperature protection",
            Self::DeviceError => "Device error",
            Self::BatteryShutdown => "Battery shutdown",
            Self::AcAbnormal => "AC abnormal",
            Self::OffGridOvercurrent => "Off-grid overcurrent",
            Self::PvOvervoltage => "PV high voltage",
            Self::PvOvercurrent => "PV overcurrent",
            Self::InsulationResistanceError => "Insulation resistance detection error",
            Self::PvWiringError => "PV wiring error",
            Self::OffGridShortCircuit => "Off-grid short circuit",
        }
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The set of raised alarms, one independent boolean per [`Alarm`].
///
/// # Examples
///
/// ```
/// use ezhi_local::response::{Alarm, AlarmFlags};
///
/// let mut data = serde_json::Map::new();
/// for alarm in Alarm::ALL {
///     data.insert(alarm.code().into(), "0".into());
/// }
/// data.insert("BatHTP".into(), "1".into());
///
/// let flags = AlarmFlags::decode(&serde_json::json!({ "data": data })).unwrap();
/// assert!(flags.is_active(Alarm::BatteryOvertemperature));
/// assert_eq!(flags.count(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlarmFlags(u32);

impl AlarmFlags {
    /// Flags with no alarm raised.
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Decodes a `/getAlarm` payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if any of the 17 fields is
    /// absent and `DecodeError::UnrecognizedEncoding` if one uses an encoding
    /// other than those listed in the module documentation.
    pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
        let data = Envelope::parse(payload)?.into_data()?;

        let mut flags = Self::none();
        for alarm in Alarm::ALL {
            let value = data
                .get(alarm.code())
                .ok_or_else(|| DecodeError::MissingField(format!("data.{}", alarm.code())))?;
            flags.set(alarm, decode_flag(alarm.code(), value)?);
        }
        Ok(flags)
    }

    /// Returns whether `alarm` is raised.
    #[must_use]
    pub const fn is_active(&self, alarm: Alarm) -> bool {
        self.0 & alarm.bit() != 0
    }

    /// Raises or clears `alarm`.
    pub fn set(&mut self, alarm: Alarm, active: bool) {
        if active {
            self.0 |= alarm.bit();
        } else {
            self.0 &= !alarm.bit();
        }
    }

    /// Returns the raised alarms in device order.
    pub fn active(&self) -> impl Iterator<Item = Alarm> + '_ {
        Alarm::ALL.into_iter().filter(|a| self.is_active(*a))
    }

    /// Returns every alarm paired with its state.
    pub fn iter(&self) -> impl Iterator<Item = (Alarm, bool)> + '_ {
        Alarm::ALL.into_iter().map(|a| (a, self.is_active(a)))
    }

    /// Returns the number of raised alarms.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` if any alarm is raised.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.0 != 0
    }
}

impl FromIterator<Alarm> for AlarmFlags {
    fn from_iter<I: IntoIterator<Item = Alarm>>(iter: I) -> Self {
        let mut flags = Self::none();
        for alarm in iter {
            flags.set(alarm, true);
        }
        flags
    }
}

impl serde::Serialize for AlarmFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Alarm::ALL.len()))?;
        for (alarm, active) in self.iter() {
            map.serialize_entry(alarm.code(), &active)?;
        }
        map.end()
    }
}

fn decode_flag(code: &str, value: &Value) -> Result<bool, DecodeError> {
    let decoded = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        _ => None,
    };
    decoded.ok_or_else(|| DecodeError::UnrecognizedEncoding {
        field: format!("data.{code}"),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::fake::alarm_payload;
    use serde_json::json;

    #[test]
    fn single_bit_sets_exactly_one_flag() {
        let flags = AlarmFlags::decode(&alarm_payload(&["BatHTP"])).unwrap();

        let raised: Vec<_> = flags.iter().filter(|(_, on)| *on).collect();
        let cleared = flags.iter().filter(|(_, on)| !*on).count();

        assert_eq!(raised, vec![(Alarm::BatteryOvertemperature, true)]);
        assert_eq!(cleared, 16);
    }

    #[test]
    fn all_clear() {
        let flags = AlarmFlags::decode(&alarm_payload(&[])).unwrap();
        assert!(!flags.any());
        assert_eq!(flags, AlarmFlags::none());
    }

    #[test]
    fn every_code_maps_to_its_own_bit() {
        for alarm in Alarm::ALL {
            let flags = AlarmFlags::decode(&alarm_payload(&[alarm.code()])).unwrap();
            assert_eq!(flags.active().collect::<Vec<_>>(), vec![alarm]);
        }
    }

    #[test]
    fn numeric_and_boolean_encodings() {
        let mut payload = alarm_payload(&[]);
        payload["data"]["PvOC"] = json!(1);
        payload["data"]["OfGS"] = json!(true);
        payload["data"]["EE"] = json!(false);

        let flags = AlarmFlags::decode(&payload).unwrap();
        assert!(flags.is_active(Alarm::PvOvercurrent));
        assert!(flags.is_active(Alarm::OffGridShortCircuit));
        assert!(!flags.is_active(Alarm::DeviceError));
        assert_eq!(flags.count(), 2);
    }

    #[test]
    fn unknown_encoding_fails_loudly() {
        for bad in [json!("2"), json!("on"), json!(null), json!(-1), json!(0.5)] {
            let mut payload = alarm_payload(&[]);
            payload["data"]["ACA"] = bad;
            assert!(matches!(
                AlarmFlags::decode(&payload),
                Err(DecodeError::UnrecognizedEncoding { ref field, .. }) if field == "data.ACA"
            ));
        }
    }

    #[test]
    fn missing_flag_is_missing_field() {
        let mut payload = alarm_payload(&[]);
        payload["data"].as_object_mut().unwrap().remove("SBS");
        assert_eq!(
            AlarmFlags::decode(&payload),
            Err(DecodeError::MissingField("data.SBS".to_string()))
        );
    }

    #[test]
    fn collect_from_alarms() {
        let flags: AlarmFlags = [Alarm::AcAbnormal, Alarm::BatteryError].into_iter().collect();
        assert_eq!(
            flags.active().collect::<Vec<_>>(),
            vec![Alarm::BatteryError, Alarm::AcAbnormal]
        );
    }

    #[test]
    fn serializes_as_code_map() {
        let flags: AlarmFlags = std::iter::once(Alarm::PvWiringError).collect();
        let value = serde_json::to_value(flags).unwrap();
        assert_eq!(value["PVWE"], json!(true));
        assert_eq!(value["BatHTP"], json!(false));
        assert_eq!(value.as_object().unwrap().len(), 17);
    }
}
