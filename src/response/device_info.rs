// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device information from `/getDeviceInfo`.

use serde_json::Value;

use crate::error::DecodeError;
use crate::types::BatteryStatus;

use super::fields::{
    Envelope, number, optional_i32, optional_integer, optional_string, string,
};

/// Identity and battery information of an inverter.
///
/// `deviceId`, `devVer` and `batteryCapacity` are required. The battery
/// status code and the network details are optional, since not every
/// firmware reports them.
///
/// The battery status code is read from the nested `data.batS` field. The
/// envelope's top level also carries fields (such as `deviceId`) but never
/// the status; a top-level `batS` is ignored.
///
/// # Examples
///
/// ```
/// use ezhi_local::response::DeviceInfo;
/// use ezhi_local::types::BatteryStatus;
///
/// let json = serde_json::json!({
///     "data": {
///         "deviceId": "E17000000123",
///         "devVer": "EZHI_1.2.7",
///         "batteryCapacity": "2.0",
///         "batS": "3"
///     },
///     "message": "SUCCESS",
///     "deviceId": "E17000000123"
/// });
/// let info = DeviceInfo::decode(&json).unwrap();
/// assert_eq!(info.serial, "E17000000123");
/// assert_eq!(info.battery_status(), Some(BatteryStatus::Discharging));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DeviceInfo {
    /// Device serial number (`deviceId`).
    pub serial: String,
    /// Firmware version (`devVer`).
    pub firmware_version: String,
    /// Installed battery capacity in kWh.
    pub battery_capacity_kwh: f64,
    /// Raw battery status code, if reported.
    pub raw_status_code: Option<i64>,
    /// IP address the inverter reports for itself.
    pub ip_address: Option<String>,
    /// Wi-Fi network the inverter is connected to.
    pub ssid: Option<String>,
    /// Lowest power setting the device advertises, in watts.
    pub min_power: Option<i32>,
    /// Highest power setting the device advertises, in watts.
    pub max_power: Option<i32>,
}

impl DeviceInfo {
    /// Decodes a `/getDeviceInfo` payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if a required field is absent and
    /// `DecodeError::TypeMismatch` if any declared field has the wrong type.
    pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
        let data = Envelope::parse(payload)?.into_data()?;

        Ok(Self {
            serial: string(&data, "deviceId")?,
            firmware_version: string(&data, "devVer")?,
            battery_capacity_kwh: number(&data, "batteryCapacity")?,
            raw_status_code: optional_integer(&data, "batS")?,
            ip_address: optional_string(&data, "ipAddr")?,
            ssid: optional_string(&data, "ssid")?,
            min_power: optional_i32(&data, "minPower")?,
            max_power: optional_i32(&data, "maxPower")?,
        })
    }

    /// Returns the battery status decoded from the raw code, if reported.
    #[must_use]
    pub fn battery_status(&self) -> Option<BatteryStatus> {
        self.raw_status_code.map(BatteryStatus::from_code)
    }
}
