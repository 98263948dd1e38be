// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section fetches, merging and the fixed-rate timer loop.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{SectionKind, Shared};
use crate::command::{Command, PowerCommand, ReadCommand};
use crate::error::{DecodeError, Error};
use crate::protocol::{Endpoint, Transport};
use crate::response::{AlarmFlags, DeviceInfo, OutputData, PowerSetting};
use crate::state::{DeviceState, FetchFailure, Section, Stamp};

/// Failures collected during a merge, reported after the publish.
pub(super) type Failures = Vec<(Endpoint, FetchFailure)>;

impl<T: Transport> Shared<T> {
    /// Sends one command through the current transport.
    pub(super) async fn request<C: Command>(&self, command: &C) -> Result<Value, Error> {
        let transport = self.transport();
        let timeout = self.config.read().request_timeout();
        let endpoint = command.endpoint();
        let query = command.query();

        debug!(%endpoint, ?query, timeout_ms = millis(timeout), "Sending request");
        Ok(transport.fetch(endpoint, &query, timeout).await?)
    }

    /// Sends a read command and decodes the answer.
    pub(super) async fn read<C, D>(
        &self,
        command: C,
        decode: fn(&Value) -> Result<D, DecodeError>,
    ) -> Result<D, Error>
    where
        C: Command,
    {
        let payload = self.request(&command).await?;
        Ok(decode(&payload)?)
    }

    /// Fetches every endpoint of a section and publishes one snapshot.
    ///
    /// The caller must hold the section's in-flight claim.
    pub(super) async fn poll(&self, kind: SectionKind) -> Arc<DeviceState> {
        let started = Instant::now();

        let snapshot = match kind {
            SectionKind::Power => {
                let (output, limit) = tokio::join!(
                    self.read(ReadCommand::OutputData, OutputData::decode),
                    self.read(PowerCommand::Get, PowerSetting::decode),
                );
                self.merge(|state, stamp, failures| {
                    record(kind, Endpoint::OutputData, state.power_mut(), output, stamp, failures);
                    record(kind, Endpoint::Power, state.power_limit_mut(), limit, stamp, failures);
                })
            }
            SectionKind::AlarmsAndInfo => {
                let (alarms, info) = tokio::join!(
                    self.read(ReadCommand::Alarm, AlarmFlags::decode),
                    self.read(ReadCommand::DeviceInfo, DeviceInfo::decode),
                );
                self.merge(|state, stamp, failures| {
                    record(kind, Endpoint::Alarm, state.alarms_mut(), alarms, stamp, failures);
                    record(kind, Endpoint::DeviceInfo, state.device_info_mut(), info, stamp, failures);
                })
            }
        };

        let elapsed = started.elapsed();
        let period = kind.period(&self.config.read().intervals());
        if elapsed > period {
            warn!(
                section = %kind,
                elapsed_ms = millis(elapsed),
                period_ms = millis(period),
                "Fetch overran its interval"
            );
        }
        snapshot
    }

    /// Applies `update` to a copy of the current state, re-derives the
    /// battery status and publishes the result once.
    pub(super) fn merge<F>(&self, update: F) -> Arc<DeviceState>
    where
        F: FnOnce(&mut DeviceState, Stamp, &mut Failures),
    {
        let stamp = Stamp::now();
        let stale_after = self.config.read().stale_after();
        let mut failures = Failures::new();

        let snapshot = self.store.publish(|state| {
            update(state, stamp, &mut failures);
            state.derive_battery_status(stamp.mono, stale_after);
        });

        for (endpoint, failure) in &failures {
            self.store.report_failure(*endpoint, failure);
        }
        snapshot
    }
}

/// Records one fetch result on its sub-section.
pub(super) fn record<D>(
    kind: SectionKind,
    endpoint: Endpoint,
    section: &mut Section<D>,
    result: Result<D, Error>,
    stamp: Stamp,
    failures: &mut Failures,
) {
    match result {
        Ok(value) => {
            if section.is_failing() {
                info!(
                    section = %kind,
                    %endpoint,
                    failures = section.consecutive_failures(),
                    "Section recovered"
                );
            }
            section.record_success(value, stamp);
        }
        Err(err) => {
            if err.failure_kind().is_some_and(|k| k.is_decode()) {
                warn!(section = %kind, %endpoint, error = %err, "Payload no longer matches the expected shape");
            } else {
                warn!(section = %kind, %endpoint, error = %err, "Fetch failed");
            }
            section.record_failure(&err, stamp);
            if let Some(failure) = section.last_error() {
                failures.push((endpoint, failure.clone()));
            }
        }
    }
}

/// Drives one section on a fixed-rate schedule until `shutdown` fires.
///
/// Each tick spawns the fetch so the schedule is measured from tick start.
/// A tick that finds the previous fetch still running is skipped. On
/// shutdown, in-flight fetches are allowed to finish; each is bounded by
/// the request timeout.
pub(super) async fn run_timer<T: Transport>(
    shared: Arc<Shared<T>>,
    kind: SectionKind,
    period: Duration,
    first_tick: Instant,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();

    info!(section = %kind, period_ms = millis(period), "Section timer started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            Some(joined) = in_flight.join_next() => {
                if let Err(err) = joined {
                    warn!(section = %kind, error = %err, "Fetch task ended abnormally");
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let Some(claim) = shared.slot(kind).try_claim() else {
            debug!(section = %kind, "Previous fetch still in flight, skipping tick");
            continue;
        };

        let task_shared = Arc::clone(&shared);
        in_flight.spawn(async move {
            task_shared.poll(kind).await;
            drop(claim);
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(err) = joined {
            warn!(section = %kind, error = %err, "Fetch task ended abnormally");
        }
    }
    info!(section = %kind, "Section timer stopped");
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
