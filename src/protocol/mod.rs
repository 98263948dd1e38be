// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for talking to the inverter's local HTTP API.
//!
//! The inverter exposes five fixed GET endpoints (see [`Endpoint`]). Every
//! request is independent: there is no session, no authentication and no
//! retry at this layer. Scheduling and retry policy live in the
//! [`Coordinator`](crate::coordinator::Coordinator).
//!
//! - [`Transport`]: the contract the coordinator polls through
//! - [`HttpClient`]: the reqwest-backed implementation

mod http;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;

pub use http::{HttpClient, HttpConfig};

use crate::error::TransportError;

/// The request shapes understood by the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Serial, firmware, battery capacity and battery status code.
    DeviceInfo,
    /// PV, battery and grid power and energy readings.
    OutputData,
    /// The 17 alarm flags.
    Alarm,
    /// The current on-grid power limit.
    Power,
    /// Writes a new on-grid power limit (`?p=<watts>`).
    SetPower,
}

impl Endpoint {
    /// All endpoints, in the order they appear in the device documentation.
    pub const ALL: [Self; 5] = [
        Self::DeviceInfo,
        Self::OutputData,
        Self::Alarm,
        Self::Power,
        Self::SetPower,
    ];

    /// Returns the URL path of this endpoint.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::DeviceInfo => "/getDeviceInfo",
            Self::OutputData => "/getOutputData",
            Self::Alarm => "/getAlarm",
            Self::Power => "/getPower",
            Self::SetPower => "/setPower",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Something that can fetch JSON from the inverter.
///
/// Implementations must not retry: a failed call is reported once and the
/// caller decides what happens next. The `timeout` bounds the whole call so
/// a hung request cannot hold up the next scheduled poll.
pub trait Transport: Send + Sync + 'static {
    /// Issues a GET to `endpoint` with the given query parameters and
    /// returns the decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on timeout, non-2xx status, network
    /// failure or a body that is not valid JSON.
    fn fetch(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}
