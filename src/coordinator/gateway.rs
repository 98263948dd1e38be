// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-limit writes.

use tracing::{info, warn};

use super::poller::record;
use super::{Coordinator, SectionKind, Shared};
use crate::command::PowerCommand;
use crate::error::{Error, Result};
use crate::protocol::{Endpoint, Transport};
use crate::response::{CommandAck, PowerSetting};
use crate::types::PowerLimit;

impl<T: Transport> Coordinator<T> {
    /// Sets the on-grid power limit, in watts.
    ///
    /// The value is validated before anything is sent. After the device
    /// acknowledges the write, the current limit is read back and published
    /// so subscribers see the confirmed setting without waiting for the next
    /// tick. The regular schedule is not moved.
    ///
    /// The write waits for any in-flight power fetch to finish, and a power
    /// tick that fires during the write is skipped.
    ///
    /// # Errors
    ///
    /// - `Error::Value` if `watts` is outside `[-1200, 1200]`; no request is made.
    /// - `Error::Transport` if the write request fails.
    /// - `Error::Decode` if the acknowledgement cannot be read.
    /// - `Error::CommandRejected` if the device answers with anything but success.
    ///
    /// A failure of the read-back does not fail the write; it is recorded on
    /// the power-limit section like any other fetch failure.
    pub async fn set_power_limit(&self, watts: i32) -> Result<PowerLimit> {
        let limit = PowerLimit::new(watts)?;
        self.shared.write_power_limit(limit).await?;
        Ok(limit)
    }
}

impl<T: Transport> Shared<T> {
    async fn write_power_limit(&self, limit: PowerLimit) -> Result<()> {
        let _claim = self.slot(SectionKind::Power).claim().await;

        info!(watts = limit.watts(), "Setting power limit");
        let payload = self.request(&PowerCommand::set(limit)).await?;
        let ack = CommandAck::decode(&payload)?;
        if !ack.is_success() {
            warn!(
                watts = limit.watts(),
                message = ack.message(),
                "Device rejected power limit"
            );
            return Err(Error::CommandRejected(ack.message().to_string()));
        }

        let confirmed = self.read(PowerCommand::Get, PowerSetting::decode).await;
        self.merge(|state, stamp, failures| {
            record(
                SectionKind::Power,
                Endpoint::Power,
                state.power_limit_mut(),
                confirmed,
                stamp,
                failures,
            );
        });
        Ok(())
    }
}
