// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-grid power limit commands.

use crate::command::Command;
use crate::protocol::Endpoint;
use crate::types::PowerLimit;

/// Command to read or write the on-grid power limit.
///
/// A [`PowerLimit`] is validated on construction, so a `Set` command can
/// only ever carry a value the device accepts.
///
/// # Examples
///
/// ```
/// use ezhi_local::command::{Command, PowerCommand};
/// use ezhi_local::protocol::Endpoint;
/// use ezhi_local::types::PowerLimit;
///
/// let get = PowerCommand::Get;
/// assert_eq!(get.endpoint(), Endpoint::Power);
/// assert!(get.query().is_empty());
///
/// let set = PowerCommand::Set(PowerLimit::new(600).unwrap());
/// assert_eq!(set.query(), vec![("p", "600".to_string())]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// Query the current setting.
    Get,
    /// Write a new setting.
    Set(PowerLimit),
}

impl PowerCommand {
    /// Creates a command writing `limit`.
    #[must_use]
    pub const fn set(limit: PowerLimit) -> Self {
        Self::Set(limit)
    }
}

impl Command for PowerCommand {
    fn endpoint(&self) -> Endpoint {
        match self {
            Self::Get => Endpoint::Power,
            Self::Set(_) => Endpoint::SetPower,
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Get => Vec::new(),
            Self::Set(limit) => vec![("p", limit.watts().to_string())],
        }
    }
}
