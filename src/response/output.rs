// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power and energy readings from `/getOutputData`.

use serde_json::Value;

use crate::error::DecodeError;

use super::fields::{Envelope, number};

/// Real-time power and energy readings.
///
/// Power values are in watts, energy totals in kWh, temperatures in °C and
/// percentages in 0-100. Values are passed through without unit conversion.
///
/// Every field is required: if the inverter stops reporting one of them the
/// whole decode fails rather than reporting a fabricated zero.
///
/// # Examples
///
/// ```
/// use ezhi_local::response::OutputData;
///
/// let json = serde_json::json!({
///     "data": {
///         "pvP": "612", "pvTE": "1520.4",
///         "batP": "-350", "batSoc": "76", "batSoh": "99", "batTemp": "24.5",
///         "batCTE": "410.2", "batDTE": "388.9",
///         "ogP": "250", "ogOTE": "901.7", "ogITE": "12.3",
///         "ofgP": "0", "ofgOTE": "0", "ofgITE": "0",
///         "devTemp": "38.1"
///     },
///     "message": "SUCCESS"
/// });
/// let output = OutputData::decode(&json).unwrap();
/// assert_eq!(output.pv_power, 612.0);
/// assert_eq!(output.battery_power, -350.0);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OutputData {
    /// Photovoltaic input power (W).
    pub pv_power: f64,
    /// Total photovoltaic input energy (kWh).
    pub pv_energy: f64,
    /// Battery power (W); negative while charging.
    pub battery_power: f64,
    /// Battery state of charge (%).
    pub battery_soc: f64,
    /// Battery state of health (%).
    pub battery_soh: f64,
    /// Battery temperature (°C).
    pub battery_temperature: f64,
    /// Total battery charge energy (kWh).
    pub battery_charge_energy: f64,
    /// Total battery discharge energy (kWh).
    pub battery_discharge_energy: f64,
    /// On-grid power (W).
    pub on_grid_power: f64,
    /// Total on-grid output energy (kWh).
    pub on_grid_output_energy: f64,
    /// Total on-grid input energy (kWh).
    pub on_grid_input_energy: f64,
    /// Off-grid power (W).
    pub off_grid_power: f64,
    /// Total off-grid output energy (kWh).
    pub off_grid_output_energy: f64,
    /// Total off-grid input energy (kWh).
    pub off_grid_input_energy: f64,
    /// Inverter temperature (°C).
    pub device_temperature: f64,
}

impl OutputData {
    /// Decodes a `/getOutputData` payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if any reading is absent and
    /// `DecodeError::TypeMismatch` if one is not numeric.
    pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
        let data = Envelope::parse(payload)?.into_data()?;

        Ok(Self {
            pv_power: number(&data, "pvP")?,
            pv_energy: number(&data, "pvTE")?,
            battery_power: number(&data, "batP")?,
            battery_soc: number(&data, "batSoc")?,
            battery_soh: number(&data, "batSoh")?,
            battery_temperature: number(&data, "batTemp")?,
            battery_charge_energy: number(&data, "batCTE")?,
            battery_discharge_energy: number(&data, "batDTE")?,
            on_grid_power: number(&data, "ogP")?,
            on_grid_output_energy: number(&data, "ogOTE")?,
            on_grid_input_energy: number(&data, "ogITE")?,
            off_grid_power: number(&data, "ofgP")?,
            off_grid_output_energy: number(&data, "ofgOTE")?,
            off_grid_input_energy: number(&data, "ofgITE")?,
            device_temperature: number(&data, "devTemp")?,
        })
    }
}
