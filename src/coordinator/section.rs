// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduled sections and their in-flight bookkeeping.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::protocol::Endpoint;
use crate::types::PollIntervals;

/// An independently scheduled group of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `/getOutputData` and `/getPower`, on the fast interval.
    Power,
    /// `/getAlarm` and `/getDeviceInfo`, on the slow interval.
    AlarmsAndInfo,
}

impl SectionKind {
    /// Both sections.
    pub const ALL: [Self; 2] = [Self::Power, Self::AlarmsAndInfo];

    /// Returns the endpoints this section fetches on each tick.
    #[must_use]
    pub const fn endpoints(self) -> [Endpoint; 2] {
        match self {
            Self::Power => [Endpoint::OutputData, Endpoint::Power],
            Self::AlarmsAndInfo => [Endpoint::Alarm, Endpoint::DeviceInfo],
        }
    }

    /// Returns this section's period.
    #[must_use]
    pub const fn period(self, intervals: &PollIntervals) -> Duration {
        match self {
            Self::Power => intervals.fast(),
            Self::AlarmsAndInfo => intervals.slow(),
        }
    }

    /// Returns the section name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::AlarmsAndInfo => "alarms_and_info",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tick counters for one section, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionStats {
    /// Scheduled ticks that started a fetch.
    pub ticks: u64,
    /// Scheduled ticks dropped because a fetch was still in flight.
    pub skipped: u64,
}

/// In-flight flag and counters for one section.
///
/// The flag is an async mutex: scheduled ticks only `try_lock` it and skip
/// when busy, while the gateway and manual refreshes wait for it.
#[derive(Debug, Default)]
pub(crate) struct SectionSlot {
    in_flight: Arc<Mutex<()>>,
    ticks: AtomicU64,
    skipped: AtomicU64,
}

impl SectionSlot {
    /// Claims the slot for a scheduled tick, or records a skip.
    pub fn try_claim(&self) -> Option<OwnedMutexGuard<()>> {
        if let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() {
            self.ticks.fetch_add(1, Ordering::Relaxed);
            Some(guard)
        } else {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Waits until the slot is free and claims it.
    pub async fn claim(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.in_flight).lock_owned().await
    }

    pub fn stats(&self) -> SectionStats {
        SectionStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
