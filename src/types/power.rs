// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-grid power limit type.
//!
//! The inverter accepts a signed on-grid power setting in watts. Positive
//! values feed into the grid, negative values draw from it to charge the
//! battery.

use std::fmt;

use crate::error::ValueError;

/// On-grid power limit in watts, within `[-1200, 1200]`.
///
/// # Examples
///
/// ```
/// use ezhi_local::types::PowerLimit;
///
/// let limit = PowerLimit::new(450).unwrap();
/// assert_eq!(limit.watts(), 450);
///
/// let charging = PowerLimit::new(-600).unwrap();
/// assert_eq!(charging.watts(), -600);
///
/// // Values outside the device range are rejected up front
/// assert!(PowerLimit::new(1201).is_err());
/// assert!(PowerLimit::new(-1201).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct PowerLimit(i32);

impl PowerLimit {
    /// Lowest accepted setting, in watts.
    pub const MIN_WATTS: i32 = -1200;
    /// Highest accepted setting, in watts.
    pub const MAX_WATTS: i32 = 1200;

    /// The lowest accepted setting.
    pub const MIN: Self = Self(Self::MIN_WATTS);
    /// The highest accepted setting.
    pub const MAX: Self = Self(Self::MAX_WATTS);

    /// Creates a new power limit.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `watts` is outside `[-1200, 1200]`.
    pub fn new(watts: i32) -> Result<Self, ValueError> {
        if !(Self::MIN_WATTS..=Self::MAX_WATTS).contains(&watts) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN_WATTS,
                max: Self::MAX_WATTS,
                actual: watts,
            });
        }
        Ok(Self(watts))
    }

    /// Creates a power limit, clamping to the valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use ezhi_local::types::PowerLimit;
    ///
    /// assert_eq!(PowerLimit::clamped(5000).watts(), 1200);
    /// assert_eq!(PowerLimit::clamped(-5000).watts(), -1200);
    /// ```
    #[must_use]
    pub const fn clamped(watts: i32) -> Self {
        if watts < Self::MIN_WATTS {
            Self::MIN
        } else if watts > Self::MAX_WATTS {
            Self::MAX
        } else {
            Self(watts)
        }
    }

    /// Returns the setting in watts.
    #[must_use]
    pub const fn watts(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for PowerLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} W", self.0)
    }
}

impl TryFrom<i32> for PowerLimit {
    type Error = ValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
