// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state snapshot and per-section metadata.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::error::Error;
use crate::response::{AlarmFlags, DeviceInfo, OutputData, PowerSetting};
use crate::types::BatteryStatus;

/// Classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum FailureKind {
    /// The request timed out.
    Timeout,
    /// The device answered with a non-success HTTP status.
    HttpStatus,
    /// The request could not be completed.
    Network,
    /// The device answered with a body that is not JSON.
    MalformedJson,
    /// A required field was missing from the payload.
    MissingField,
    /// A field had the wrong type.
    TypeMismatch,
    /// A flag used an encoding the decoder does not know.
    UnrecognizedEncoding,
    /// The device refused a write.
    Rejected,
}

impl FailureKind {
    /// Returns `true` for failures caused by the payload shape rather than
    /// the network.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson
                | Self::MissingField
                | Self::TypeMismatch
                | Self::UnrecognizedEncoding
        )
    }
}

/// A recorded fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FetchFailure {
    /// What went wrong.
    pub kind: FailureKind,
    /// The error rendered as text.
    pub message: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

impl FetchFailure {
    pub(crate) fn from_error(err: &Error, at: DateTime<Utc>) -> Self {
        Self {
            kind: err.failure_kind().unwrap_or(FailureKind::Network),
            message: err.to_string(),
            at,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.at.to_rfc3339())
    }
}

/// The moment a merge happened, on both clocks.
///
/// Wall-clock time is what subscribers see; the monotonic instant drives
/// staleness so clock adjustments cannot fake liveness.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Stamp {
    pub wall: DateTime<Utc>,
    pub mono: Instant,
}

impl Stamp {
    pub fn now() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }
}

/// One independently refreshed part of the device state.
///
/// A section keeps its last good value through failures: a failed fetch
/// only records the error and bumps the failure counter.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Section<T> {
    value: Option<T>,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<FetchFailure>,
    consecutive_failures: u32,
    #[serde(skip)]
    refreshed_at: Option<Instant>,
    #[serde(skip)]
    failing_since: Option<Instant>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_updated: None,
            last_error: None,
            consecutive_failures: 0,
            refreshed_at: None,
            failing_since: None,
        }
    }
}

impl<T> Section<T> {
    /// Returns the last successfully decoded value.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns when the value was last refreshed successfully.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Returns the most recent failure, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&FetchFailure> {
        self.last_error.as_ref()
    }

    /// Returns the number of failures since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns `true` if the section holds a value and its latest fetch
    /// succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.value.is_some() && self.last_error.is_none()
    }

    /// Returns `true` if the latest fetch failed.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.last_error.is_some()
    }

    /// Returns `true` if the section has been failing for longer than
    /// `threshold`, measured from its last success (or, if it never
    /// succeeded, from the first failure).
    #[must_use]
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        if !self.is_failing() {
            return false;
        }
        self.refreshed_at
            .or(self.failing_since)
            .is_some_and(|since| now.saturating_duration_since(since) >= threshold)
    }

    pub(crate) fn record_success(&mut self, value: T, at: Stamp) {
        self.value = Some(value);
        self.last_updated = Some(at.wall);
        self.last_error = None;
        self.consecutive_failures = 0;
        self.refreshed_at = Some(at.mono);
        self.failing_since = None;
    }

    pub(crate) fn record_failure(&mut self, err: &Error, at: Stamp) {
        self.last_error = Some(FetchFailure::from_error(err, at.wall));
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.failing_since.is_none() {
            self.failing_since = Some(at.mono);
        }
    }
}

/// Immutable, fully merged view of an inverter.
///
/// Snapshots are created by the coordinator and handed out as
/// `Arc<DeviceState>`; they are never modified once published.
///
/// # Sections
///
/// | Section | Endpoint | Cadence |
/// |---|---|---|
/// | [`power`](Self::power) | `/getOutputData` | fast |
/// | [`power_limit`](Self::power_limit) | `/getPower` | fast, and after a write |
/// | [`alarms`](Self::alarms) | `/getAlarm` | slow |
/// | [`device_info`](Self::device_info) | `/getDeviceInfo` | slow |
///
/// # Examples
///
/// ```
/// use ezhi_local::state::DeviceState;
///
/// let state = DeviceState::new();
/// assert!(state.power().value().is_none());
/// assert!(state.battery_status().is_none());
/// assert_eq!(state.version(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct DeviceState {
    power: Section<OutputData>,
    power_limit: Section<PowerSetting>,
    alarms: Section<AlarmFlags>,
    device_info: Section<DeviceInfo>,
    battery_status: Option<BatteryStatus>,
    version: u64,
}

impl DeviceState {
    /// Creates an empty state with every section unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Power and energy readings.
    #[must_use]
    pub fn power(&self) -> &Section<OutputData> {
        &self.power
    }

    /// The current on-grid power limit.
    #[must_use]
    pub fn power_limit(&self) -> &Section<PowerSetting> {
        &self.power_limit
    }

    /// Alarm flags.
    #[must_use]
    pub fn alarms(&self) -> &Section<AlarmFlags> {
        &self.alarms
    }

    /// Serial, firmware and battery information.
    #[must_use]
    pub fn device_info(&self) -> &Section<DeviceInfo> {
        &self.device_info
    }

    /// Battery status, derived from the device-info status code and the
    /// liveness of the device-info fetch.
    ///
    /// Reports [`BatteryStatus::NoCommunication`] once device info has been
    /// failing for longer than the staleness threshold, whatever the last
    /// known code was, and even if it never succeeded. Otherwise `None`
    /// until a status code has been seen.
    #[must_use]
    pub fn battery_status(&self) -> Option<BatteryStatus> {
        self.battery_status
    }

    /// Monotonic publish counter, incremented once per published snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns `true` if any section holds a value.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.power.value.is_some()
            || self.power_limit.value.is_some()
            || self.alarms.value.is_some()
            || self.device_info.value.is_some()
    }

    pub(crate) fn power_mut(&mut self) -> &mut Section<OutputData> {
        &mut self.power
    }

    pub(crate) fn power_limit_mut(&mut self) -> &mut Section<PowerSetting> {
        &mut self.power_limit
    }

    pub(crate) fn alarms_mut(&mut self) -> &mut Section<AlarmFlags> {
        &mut self.alarms
    }

    pub(crate) fn device_info_mut(&mut self) -> &mut Section<DeviceInfo> {
        &mut self.device_info
    }

    pub(crate) fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Re-derives [`battery_status`](Self::battery_status).
    pub(crate) fn derive_battery_status(&mut self, now: Instant, stale_after: Duration) {
        self.battery_status = if self.device_info.is_stale(now, stale_after) {
            Some(BatteryStatus::NoCommunication)
        } else {
            self.device_info.value().and_then(DeviceInfo::battery_status)
        };
    }
}
