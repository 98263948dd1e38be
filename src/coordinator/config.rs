// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration.

use std::time::Duration;

use crate::protocol::HttpConfig;
use crate::types::PollIntervals;

/// Upper bound on the default per-call timeout.
pub const MAX_DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How many slow intervals device info may fail before battery status
/// degrades to `NoCommunication`.
pub const DEFAULT_STALE_FACTOR: u32 = 3;

/// Scheduling configuration for a [`Coordinator`](super::Coordinator).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ezhi_local::coordinator::CoordinatorConfig;
/// use ezhi_local::types::PollIntervals;
///
/// let config = CoordinatorConfig::new()
///     .with_intervals(PollIntervals::from_secs(10, 120).unwrap());
///
/// assert_eq!(config.request_timeout(), Duration::from_secs(5));
/// assert_eq!(config.stale_after(), Duration::from_secs(360));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    intervals: PollIntervals,
    stale_after: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    /// Creates a configuration with default intervals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll intervals.
    #[must_use]
    pub fn with_intervals(mut self, intervals: PollIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Sets how long device info may fail before battery status reports
    /// `NoCommunication`.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Sets the per-call request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns the poll intervals.
    #[must_use]
    pub fn intervals(&self) -> PollIntervals {
        self.intervals
    }

    /// Returns the staleness threshold, three slow intervals unless set.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        self.stale_after
            .unwrap_or_else(|| self.intervals.slow().saturating_mul(DEFAULT_STALE_FACTOR))
    }

    /// Returns the per-call timeout, `min(fast interval, 5 s)` unless set.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or_else(|| self.intervals.fast().min(MAX_DEFAULT_REQUEST_TIMEOUT))
    }

    pub(crate) fn set_intervals(&mut self, intervals: PollIntervals) {
        self.intervals = intervals;
    }
}

/// Everything a host needs to configure to talk to one inverter.
///
/// # Examples
///
/// ```
/// use ezhi_local::coordinator::{CoordinatorConfig, InverterConfig};
/// use ezhi_local::protocol::HttpConfig;
///
/// let config = InverterConfig::new(HttpConfig::new("192.168.1.100"))
///     .with_coordinator(CoordinatorConfig::new());
/// assert_eq!(config.http().base_url(), "http://192.168.1.100");
/// ```
#[derive(Debug, Clone)]
pub struct InverterConfig {
    http: HttpConfig,
    coordinator: CoordinatorConfig,
}

impl InverterConfig {
    /// Creates a configuration with default scheduling.
    #[must_use]
    pub fn new(http: HttpConfig) -> Self {
        Self {
            http,
            coordinator: CoordinatorConfig::default(),
        }
    }

    /// Sets the scheduling configuration.
    #[must_use]
    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Returns the transport configuration.
    #[must_use]
    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// Returns the scheduling configuration.
    #[must_use]
    pub fn coordinator(&self) -> &CoordinatorConfig {
        &self.coordinator
    }

    pub(crate) fn into_parts(self) -> (HttpConfig, CoordinatorConfig) {
        (self.http, self.coordinator)
    }
}
