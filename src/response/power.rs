// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-limit read and write responses.

use serde_json::Value;

use crate::error::DecodeError;

use super::fields::{Envelope, integer};

/// The on-grid power setting reported by `/getPower`.
///
/// The value is reported as the device sends it, in watts, without
/// range-checking: the device is the authority on its own setting.
///
/// # Examples
///
/// ```
/// use ezhi_local::response::PowerSetting;
///
/// let json = serde_json::json!({"data": {"power": 450}, "message": "SUCCESS"});
/// assert_eq!(PowerSetting::decode(&json).unwrap().watts(), 450);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PowerSetting {
    watts: i32,
}

impl PowerSetting {
    /// Creates a setting from a wattage.
    #[must_use]
    pub const fn new(watts: i32) -> Self {
        Self { watts }
    }

    /// Decodes a `/getPower` payload.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if `data.power` is absent and
    /// `DecodeError::TypeMismatch` if it is not an integer that fits in
    /// 32 bits.
    pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
        let data = Envelope::parse(payload)?.into_data()?;
        let raw = integer(&data, "power")?;
        let watts = i32::try_from(raw).map_err(|_| DecodeError::TypeMismatch {
            field: "data.power".to_string(),
            expected: "32-bit integer",
        })?;
        Ok(Self { watts })
    }

    /// Returns the setting in watts.
    #[must_use]
    pub const fn watts(&self) -> i32 {
        self.watts
    }
}

/// Acknowledgement returned by a write request.
///
/// The device signals the outcome through the top-level `message` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAck {
    message: String,
}

impl CommandAck {
    /// The message the device sends on success.
    pub const SUCCESS: &'static str = "SUCCESS";

    /// Decodes a write acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if there is no `message`.
    pub fn decode(payload: &Value) -> Result<Self, DecodeError> {
        let message = Envelope::parse(payload)?
            .message
            .ok_or_else(|| DecodeError::MissingField("message".to_string()))?;
        Ok(Self { message })
    }

    /// Returns `true` if the device accepted the write.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.message.eq_ignore_ascii_case(Self::SUCCESS)
    }

    /// Returns the raw message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
