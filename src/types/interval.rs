// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling interval configuration.

use std::time::Duration;

use crate::error::ValueError;

/// The two independent polling cadences.
///
/// The fast interval drives power/energy readings and the power-limit read;
/// the slow interval drives alarms and device info. The two are not
/// required to be ordered, but each must be at least [`MIN_INTERVAL`](Self::MIN_INTERVAL)
/// so the inverter is not hammered, and at most [`MAX_INTERVAL`](Self::MAX_INTERVAL).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ezhi_local::types::PollIntervals;
///
/// let intervals = PollIntervals::new(Duration::from_secs(5), Duration::from_secs(60)).unwrap();
/// assert_eq!(intervals.fast(), Duration::from_secs(5));
///
/// assert!(PollIntervals::new(Duration::from_millis(200), Duration::from_secs(60)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollIntervals {
    fast: Duration,
    slow: Duration,
}

impl PollIntervals {
    /// Lowest accepted interval.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
    /// Highest accepted interval.
    pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
    /// Default interval for power/energy readings.
    pub const DEFAULT_FAST: Duration = Duration::from_secs(5);
    /// Default interval for alarms and device info.
    pub const DEFAULT_SLOW: Duration = Duration::from_secs(60);

    /// Creates a validated pair of intervals.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::IntervalTooShort` if either interval is below
    /// [`MIN_INTERVAL`](Self::MIN_INTERVAL), or `ValueError::IntervalTooLong`
    /// if either is above [`MAX_INTERVAL`](Self::MAX_INTERVAL).
    pub fn new(fast: Duration, slow: Duration) -> Result<Self, ValueError> {
        Self::check("fast", fast)?;
        Self::check("slow", slow)?;
        Ok(Self { fast, slow })
    }

    /// Creates intervals from whole seconds, as stored by host configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::IntervalTooShort` if either value is zero, or
    /// `ValueError::IntervalTooLong` if either exceeds a day.
    pub fn from_secs(fast: u64, slow: u64) -> Result<Self, ValueError> {
        Self::new(Duration::from_secs(fast), Duration::from_secs(slow))
    }

    fn check(name: &'static str, interval: Duration) -> Result<(), ValueError> {
        if interval < Self::MIN_INTERVAL {
            return Err(ValueError::IntervalTooShort {
                name,
                actual_ms: interval.as_millis(),
                min_ms: Self::MIN_INTERVAL.as_millis(),
            });
        }
        if interval > Self::MAX_INTERVAL {
            return Err(ValueError::IntervalTooLong {
                name,
                actual_ms: interval.as_millis(),
                max_ms: Self::MAX_INTERVAL.as_millis(),
            });
        }
        Ok(())
    }

    /// Returns the fast interval.
    #[must_use]
    pub const fn fast(&self) -> Duration {
        self.fast
    }

    /// Returns the slow interval.
    #[must_use]
    pub const fn slow(&self) -> Duration {
        self.slow
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            fast: Self::DEFAULT_FAST,
            slow: Self::DEFAULT_SLOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_integration_defaults() {
        let intervals = PollIntervals::default();
        assert_eq!(intervals.fast(), Duration::from_secs(5));
        assert_eq!(intervals.slow(), Duration::from_secs(60));
    }

    #[test]
    fn floor_is_inclusive() {
        assert!(PollIntervals::new(Duration::from_secs(1), Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn fast_may_exceed_slow() {
        let intervals = PollIntervals::from_secs(120, 30).unwrap();
        assert!(intervals.fast() > intervals.slow());
    }

    #[test]
    fn short_slow_interval_is_named() {
        let err = PollIntervals::new(Duration::from_secs(5), Duration::from_millis(999)).unwrap_err();
        assert!(matches!(
            err,
            ValueError::IntervalTooShort { name: "slow", actual_ms: 999, .. }
        ));
    }

    #[test]
    fn ceiling_is_inclusive() {
        let day = PollIntervals::MAX_INTERVAL;
        assert!(PollIntervals::new(day, day).is_ok());
    }

    #[test]
    fn huge_slow_interval_is_rejected() {
        let err = PollIntervals::new(Duration::from_secs(5), Duration::from_secs(u64::MAX / 2))
            .unwrap_err();
        assert!(matches!(
            err,
            ValueError::IntervalTooLong { name: "slow", max_ms: 86_400_000, .. }
        ));
    }

    #[test]
    fn zero_seconds_rejected() {
        assert!(PollIntervals::from_secs(0, 60).is_err());
    }
}
