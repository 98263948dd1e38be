// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dual-interval polling coordinator.
//!
//! The [`Coordinator`] owns two independent fixed-rate timers:
//!
//! | Section | Endpoints | Default interval |
//! |---|---|---|
//! | [`SectionKind::Power`] | `/getOutputData`, `/getPower` | 5 s |
//! | [`SectionKind::AlarmsAndInfo`] | `/getAlarm`, `/getDeviceInfo` | 60 s |
//!
//! On each tick the section's endpoints are fetched independently, decoded,
//! merged into one new [`DeviceState`] and published once. A failed fetch
//! only touches its own sub-section's error metadata; last good values are
//! kept. At most one fetch per section is in flight: a tick that finds the
//! previous one still running is skipped.
//!
//! # Examples
//!
//! ```no_run
//! use ezhi_local::coordinator::{Coordinator, InverterConfig};
//! use ezhi_local::protocol::HttpConfig;
//!
//! # async fn example() -> ezhi_local::Result<()> {
//! let coordinator = Coordinator::connect(InverterConfig::new(HttpConfig::new("192.168.1.100")))?;
//! coordinator.start();
//!
//! let mut updates = coordinator.watch();
//! updates.changed().await.ok();
//! if let Some(output) = updates.borrow().power().value() {
//!     println!("PV: {} W, battery: {} %", output.pv_power, output.battery_soc);
//! }
//!
//! coordinator.set_power_limit(600).await?;
//! coordinator.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod gateway;
mod poller;
mod section;

pub use config::{CoordinatorConfig, DEFAULT_STALE_FACTOR, InverterConfig, MAX_DEFAULT_REQUEST_TIMEOUT};
pub use section::{SectionKind, SectionStats};

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{Endpoint, HttpClient, Transport};
use crate::state::{DeviceState, FetchFailure, SnapshotStore};
use crate::subscription::{Subscribable, SubscriptionId};
use crate::types::PollIntervals;

use section::SectionSlot;

/// State shared between the coordinator handle and its timer tasks.
pub(crate) struct Shared<T> {
    transport: RwLock<Arc<T>>,
    config: RwLock<CoordinatorConfig>,
    store: SnapshotStore,
    power: SectionSlot,
    alarms_and_info: SectionSlot,
}

impl<T> Shared<T> {
    fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport.read())
    }

    fn slot(&self, kind: SectionKind) -> &SectionSlot {
        match kind {
            SectionKind::Power => &self.power,
            SectionKind::AlarmsAndInfo => &self.alarms_and_info,
        }
    }
}

/// Handles to the running timer tasks.
struct Timers {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Timers {
    async fn stop(self) {
        self.shutdown.send_replace(true);
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "Section timer task ended abnormally");
            }
        }
    }
}

/// Polls one inverter and publishes merged snapshots.
///
/// The coordinator is the only writer of its [`SnapshotStore`]. Dropping it
/// signals the timers to stop; use [`shutdown`](Self::shutdown) to also
/// wait for in-flight fetches.
pub struct Coordinator<T: Transport> {
    shared: Arc<Shared<T>>,
    timers: Mutex<Option<Timers>>,
}

impl<T: Transport> Coordinator<T> {
    /// Creates a stopped coordinator with an empty snapshot.
    #[must_use]
    pub fn new(transport: T, config: CoordinatorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport: RwLock::new(Arc::new(transport)),
                config: RwLock::new(config),
                store: SnapshotStore::new(),
                power: SectionSlot::default(),
                alarms_and_info: SectionSlot::default(),
            }),
            timers: Mutex::new(None),
        }
    }

    /// Starts both timers. The first tick of each section fires immediately.
    ///
    /// Does nothing if the timers are already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&self) {
        let mut timers = self.timers.lock();
        if timers.is_some() {
            debug!("Coordinator already running");
            return;
        }
        *timers = Some(self.spawn_timers(false));
    }

    /// Returns `true` while the timers are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timers.lock().is_some()
    }

    /// Stops both timers and waits for in-flight fetches to finish.
    ///
    /// The snapshot store and its subscribers are left intact.
    pub async fn shutdown(&self) {
        let running = self.timers.lock().take();
        if let Some(timers) = running {
            timers.stop().await;
            info!("Coordinator stopped");
        }
    }

    /// Changes the poll intervals.
    ///
    /// Running timers are rescheduled: each section next fires one new
    /// period from now. The snapshot and subscribers are untouched.
    pub async fn reconfigure(&self, intervals: PollIntervals) {
        self.shared.config.write().set_intervals(intervals);
        info!(
            fast = ?intervals.fast(),
            slow = ?intervals.slow(),
            "Poll intervals changed"
        );
        self.reschedule(true).await;
    }

    /// Swaps the transport used by subsequent fetches.
    ///
    /// Fetches already in flight finish on the old transport.
    pub fn replace_transport(&self, transport: T) {
        *self.shared.transport.write() = Arc::new(transport);
        debug!("Transport replaced");
    }

    /// Runs one fetch of `kind` now, outside the schedule, and returns the
    /// resulting snapshot.
    ///
    /// Waits for an in-flight fetch of the same section first. The regular
    /// schedule is not moved.
    pub async fn refresh(&self, kind: SectionKind) -> Arc<DeviceState> {
        let _claim = self.shared.slot(kind).claim().await;
        self.shared.poll(kind).await
    }

    /// Returns the latest snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<DeviceState> {
        self.shared.store.current()
    }

    /// Returns the snapshot store.
    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.shared.store
    }

    /// Returns a receiver notified of every publish.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<DeviceState>> {
        self.shared.store.watch()
    }

    /// Returns a copy of the active configuration.
    #[must_use]
    pub fn config(&self) -> CoordinatorConfig {
        self.shared.config.read().clone()
    }

    /// Returns tick counters for a section.
    #[must_use]
    pub fn stats(&self, kind: SectionKind) -> SectionStats {
        self.shared.slot(kind).stats()
    }

    fn spawn_timers(&self, delayed: bool) -> Timers {
        let intervals = self.shared.config.read().intervals();
        let (shutdown, receiver) = watch::channel(false);
        let now = Instant::now();

        let handles = SectionKind::ALL
            .iter()
            .map(|&kind| {
                let period = kind.period(&intervals);
                let first_tick = if delayed { now + period } else { now };
                tokio::spawn(poller::run_timer(
                    Arc::clone(&self.shared),
                    kind,
                    period,
                    first_tick,
                    receiver.clone(),
                ))
            })
            .collect();

        Timers { shutdown, handles }
    }

    async fn reschedule(&self, delayed: bool) {
        let running = self.timers.lock().take();
        let Some(timers) = running else {
            return;
        };
        timers.stop().await;

        let replacement = self.spawn_timers(delayed);
        let mut slot = self.timers.lock();
        if slot.is_some() {
            // Started concurrently; keep the newer timers.
            replacement.shutdown.send_replace(true);
        } else {
            *slot = Some(replacement);
        }
        info!("Timers rescheduled");
    }
}

impl Coordinator<HttpClient> {
    /// Creates a stopped coordinator talking HTTP to the configured host.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn connect(config: InverterConfig) -> Result<Self> {
        let (http, coordinator) = config.into_parts();
        let client = http
            .into_client()
            .map_err(|err| Error::Config(err.to_string()))?;
        Ok(Self::new(client, coordinator))
    }

    /// Applies a new host and schedule without discarding the snapshot
    /// store or its subscribers.
    ///
    /// Running timers restart immediately against the new host.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built; the
    /// previous configuration stays in effect.
    pub async fn apply_config(&self, config: InverterConfig) -> Result<()> {
        let (http, coordinator) = config.into_parts();
        let client = http
            .into_client()
            .map_err(|err| Error::Config(err.to_string()))?;

        info!(base_url = client.base_url(), "Applying new configuration");
        self.replace_transport(client);
        *self.shared.config.write() = coordinator;
        self.reschedule(false).await;
        Ok(())
    }
}

impl<T: Transport> Subscribable for Coordinator<T> {
    fn on_snapshot<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        self.shared.store.on_snapshot(callback)
    }

    fn on_fetch_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Endpoint, &FetchFailure) + Send + Sync + 'static,
    {
        self.shared.store.on_fetch_failed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.store.unsubscribe(id)
    }
}

impl<T: Transport> Drop for Coordinator<T> {
    fn drop(&mut self) {
        if let Some(timers) = self.timers.get_mut().take() {
            timers.shutdown.send_replace(true);
        }
    }
}

impl<T: Transport> std::fmt::Debug for Coordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &*self.shared.config.read())
            .field("running", &self.is_running())
            .field("store", &self.shared.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::{TransportError, ValueError};
    use crate::protocol::fake::{FakeTransport, Reply, ack_payload, power_payload};
    use crate::response::PowerSetting;
    use crate::state::FailureKind;
    use crate::types::BatteryStatus;

    fn coordinator(fake: &FakeTransport) -> Coordinator<FakeTransport> {
        Coordinator::new(fake.clone(), CoordinatorConfig::new())
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_rate_counts_over_window() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        tokio::time::sleep(Duration::from_millis(64_500)).await;
        coordinator.shutdown().await;

        let fast = fake.count(Endpoint::OutputData);
        let slow = fake.count(Endpoint::Alarm);
        assert!((12..=14).contains(&fast), "fast fetched {fast} times");
        assert!((1..=3).contains(&slow), "slow fetched {slow} times");
        assert_eq!(fake.count(Endpoint::Power), fast);
        assert_eq!(fake.count(Endpoint::DeviceInfo), slow);
        assert_eq!(coordinator.stats(SectionKind::Power).skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn alarm_failures_leave_power_untouched() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::Alarm, Reply::Status(500));
        let coordinator = coordinator(&fake);

        coordinator.refresh(SectionKind::Power).await;
        let power_before = coordinator.current().power().clone();
        for _ in 0..4 {
            coordinator.refresh(SectionKind::AlarmsAndInfo).await;
        }

        let state = coordinator.current();
        assert_eq!(state.power(), &power_before);
        assert!(state.power().is_available());
        assert_eq!(state.alarms().consecutive_failures(), 4);
        assert_eq!(
            state.alarms().last_error().unwrap().kind,
            FailureKind::HttpStatus
        );
        // Fetched independently of the alarm endpoint.
        assert!(state.device_info().is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn output_merge_leaves_other_sections_untouched() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        let before = coordinator.refresh(SectionKind::AlarmsAndInfo).await;
        tokio::time::advance(secs(3)).await;
        let after = coordinator.refresh(SectionKind::Power).await;

        assert_eq!(after.alarms(), before.alarms());
        assert_eq!(after.device_info(), before.device_info());
        assert!(after.power().value().is_some());
        assert!(before.power().value().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_last_good_value() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        let good = coordinator.refresh(SectionKind::Power).await;
        fake.reply(Endpoint::OutputData, Reply::Timeout);
        let failed = coordinator.refresh(SectionKind::Power).await;

        assert_eq!(failed.power().value(), good.power().value());
        assert_eq!(failed.power().last_updated(), good.power().last_updated());
        assert_eq!(failed.power().last_error().unwrap().kind, FailureKind::Timeout);
        assert!(failed.power_limit().is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failure_is_recorded_like_transport_failure() {
        let fake = FakeTransport::healthy();
        fake.reply(
            Endpoint::OutputData,
            Reply::Json(serde_json::json!({"data": {"pvP": "1"}, "message": "SUCCESS"})),
        );
        let coordinator = coordinator(&fake);

        let state = coordinator.refresh(SectionKind::Power).await;
        let failure = state.power().last_error().unwrap();
        assert_eq!(failure.kind, FailureKind::MissingField);
        assert!(state.power().value().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn one_publish_per_tick() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);
        let publishes = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&publishes);
        coordinator.on_snapshot(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let state = coordinator.refresh(SectionKind::Power).await;
        assert_eq!(publishes.load(Ordering::SeqCst), 1);
        assert_eq!(state.version(), 1);
        // Both sub-sections carry the same merge time.
        assert_eq!(
            state.power().last_updated(),
            state.power_limit().last_updated()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_never_see_half_merged_ticks() {
        let fake = FakeTransport::healthy();
        fake.delay(Endpoint::Power, Duration::from_millis(1500));
        let coordinator = coordinator(&fake);

        let torn = Arc::new(AtomicU64::new(0));
        let seen = Arc::new(AtomicU64::new(0));
        let (torn_count, seen_count) = (Arc::clone(&torn), Arc::clone(&seen));
        let mut last_version = 0;
        let versions = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = Arc::clone(&versions);
        coordinator.on_snapshot(move |state| {
            seen_count.fetch_add(1, Ordering::SeqCst);
            if state.power().last_updated() != state.power_limit().last_updated() {
                torn_count.fetch_add(1, Ordering::SeqCst);
            }
            log.lock().push(state.version());
        });

        coordinator.start();
        tokio::time::sleep(secs(31)).await;
        coordinator.shutdown().await;

        assert!(seen.load(Ordering::SeqCst) > 5);
        assert_eq!(torn.load(Ordering::SeqCst), 0);
        for version in versions.lock().iter() {
            assert_eq!(*version, last_version + 1);
            last_version = *version;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skips_tick_while_fetch_in_flight() {
        let fake = FakeTransport::healthy();
        fake.delay(Endpoint::OutputData, secs(12));
        let config = CoordinatorConfig::new()
            .with_intervals(PollIntervals::from_secs(5, 600).unwrap())
            .with_request_timeout(secs(20));
        let coordinator = Coordinator::new(fake.clone(), config);

        coordinator.start();
        // Ticks at 0 and 15 fetch; 5, 10, 20 and 25 find a fetch running.
        tokio::time::sleep(secs(29)).await;

        assert_eq!(fake.count(Endpoint::OutputData), 2);
        assert_eq!(
            coordinator.stats(SectionKind::Power),
            SectionStats { ticks: 2, skipped: 4 }
        );
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn valid_watts_write_exactly_once() {
        for watts in [-1200, -1, 0, 1, 450, 1200] {
            let fake = FakeTransport::healthy();
            let coordinator = coordinator(&fake);

            let limit = coordinator.set_power_limit(watts).await.unwrap();
            assert_eq!(limit.watts(), watts);

            let writes: Vec<_> = fake
                .calls()
                .into_iter()
                .filter(|c| c.endpoint == Endpoint::SetPower)
                .collect();
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].query, vec![("p", watts.to_string())]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_watts_send_nothing() {
        for watts in [-1201, 1201, i32::MIN, i32::MAX] {
            let fake = FakeTransport::healthy();
            let coordinator = coordinator(&fake);

            let err = coordinator.set_power_limit(watts).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Value(ValueError::OutOfRange { actual, .. }) if actual == watts
            ));
            assert!(fake.calls().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn write_failure_surfaces_transport_error() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::SetPower, Reply::Status(503));
        let coordinator = coordinator(&fake);

        let err = coordinator.set_power_limit(300).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::HttpStatus { status: 503 })
        ));
        assert_eq!(fake.count(Endpoint::Power), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_write_is_reported() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::SetPower, Reply::Json(ack_payload("FAILED")));
        let coordinator = coordinator(&fake);

        let err = coordinator.set_power_limit(300).await.unwrap_err();
        assert!(matches!(err, Error::CommandRejected(ref m) if m == "FAILED"));
        assert_eq!(fake.count(Endpoint::Power), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn write_publishes_confirmed_limit_only() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::Power, Reply::Json(power_payload(-300)));
        let coordinator = coordinator(&fake);

        coordinator.set_power_limit(-300).await.unwrap();

        let state = coordinator.current();
        assert_eq!(state.power_limit().value(), Some(&PowerSetting::new(-300)));
        assert!(state.power().value().is_none());
        assert_eq!(fake.count(Endpoint::OutputData), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_read_back_does_not_fail_write() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::Power, Reply::Status(500));
        let coordinator = coordinator(&fake);

        assert!(coordinator.set_power_limit(100).await.is_ok());
        assert_eq!(coordinator.current().power_limit().consecutive_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_does_not_move_schedule() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        tokio::time::sleep(secs(7)).await;
        coordinator.set_power_limit(100).await.unwrap();
        tokio::time::sleep(Duration::from_millis(57_500)).await;
        coordinator.shutdown().await;

        assert_eq!(fake.count(Endpoint::OutputData), 13);
        assert_eq!(fake.count(Endpoint::SetPower), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_waits_for_scheduled_fetch() {
        let fake = FakeTransport::healthy();
        fake.delay(Endpoint::OutputData, secs(3));
        let coordinator = coordinator(&fake);
        let published = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (log, probe) = (Arc::clone(&published), fake.clone());
        coordinator.on_snapshot(move |state| {
            log.lock().push((
                state.version(),
                state.power().value().is_some(),
                probe.count(Endpoint::SetPower),
            ));
        });

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        let before = Instant::now();
        coordinator.set_power_limit(250).await.unwrap();

        // The power tick started at 0 s merges at 3 s; the write goes out after it.
        assert!(before.elapsed() >= secs(2));
        assert_eq!(
            *published.lock(),
            vec![(1, false, 0), (2, true, 0), (3, true, 1)]
        );
        assert_eq!(
            coordinator.current().power_limit().value(),
            Some(&PowerSetting::new(800))
        );
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn tick_during_write_is_skipped() {
        let fake = FakeTransport::healthy();
        fake.delay(Endpoint::SetPower, secs(7));
        let config = CoordinatorConfig::new().with_request_timeout(secs(20));
        let coordinator = Coordinator::new(fake.clone(), config);

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        // Holds the power slot from 1 s to 8 s, across the 5 s tick.
        coordinator.set_power_limit(100).await.unwrap();

        assert_eq!(
            coordinator.stats(SectionKind::Power),
            SectionStats { ticks: 1, skipped: 1 }
        );
        assert_eq!(fake.count(Endpoint::OutputData), 1);
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_fetch_does_not_stop_timer() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::OutputData, Reply::Panic);
        let coordinator = coordinator(&fake);

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        fake.reply(
            Endpoint::OutputData,
            Reply::Json(crate::protocol::fake::output_payload()),
        );
        tokio::time::sleep(secs(5)).await;

        assert_eq!(fake.count(Endpoint::OutputData), 2);
        assert_eq!(coordinator.stats(SectionKind::Power).skipped, 0);
        assert!(coordinator.current().power().is_available());
        assert!(coordinator.is_running());
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn longest_intervals_poll_and_reschedule() {
        let day = PollIntervals::MAX_INTERVAL;
        let intervals = PollIntervals::new(day, day).unwrap();
        let fake = FakeTransport::healthy();
        let coordinator =
            Coordinator::new(fake.clone(), CoordinatorConfig::new().with_intervals(intervals));

        let state = coordinator.refresh(SectionKind::AlarmsAndInfo).await;
        assert!(state.device_info().is_available());
        assert_eq!(state.battery_status(), Some(BatteryStatus::Charging));

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        coordinator.reconfigure(intervals).await;
        assert!(coordinator.is_running());
        coordinator.shutdown().await;

        assert_eq!(fake.count(Endpoint::DeviceInfo), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn battery_status_degrades_past_threshold() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        assert_eq!(
            coordinator.current().battery_status(),
            Some(BatteryStatus::Charging)
        );

        fake.reply(Endpoint::DeviceInfo, Reply::Timeout);
        // Failures at 60 s and 120 s are within the 180 s threshold.
        tokio::time::sleep(secs(169)).await;
        assert_eq!(
            coordinator.current().battery_status(),
            Some(BatteryStatus::Charging)
        );

        tokio::time::sleep(secs(16)).await;
        let state = coordinator.current();
        assert_eq!(state.battery_status(), Some(BatteryStatus::NoCommunication));
        assert_eq!(state.device_info().value().unwrap().raw_status_code, Some(2));

        fake.reply(
            Endpoint::DeviceInfo,
            Reply::Json(crate::protocol::fake::device_info_payload(3)),
        );
        tokio::time::sleep(secs(60)).await;
        assert_eq!(
            coordinator.current().battery_status(),
            Some(BatteryStatus::Discharging)
        );
        coordinator.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_both_timers() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        assert!(coordinator.is_running());
        tokio::time::sleep(secs(1)).await;
        coordinator.shutdown().await;
        assert!(!coordinator.is_running());

        let calls = fake.calls().len();
        tokio::time::sleep(secs(120)).await;
        assert_eq!(fake.calls().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_runs_one_schedule() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        coordinator.shutdown().await;

        assert_eq!(fake.count(Endpoint::OutputData), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_timers() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        drop(coordinator);

        let calls = fake.calls().len();
        tokio::time::sleep(secs(30)).await;
        assert_eq!(fake.calls().len(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_reschedules_and_keeps_store() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);
        let publishes = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&publishes);
        coordinator.on_snapshot(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        coordinator.start();
        tokio::time::sleep(secs(1)).await;
        coordinator
            .reconfigure(PollIntervals::from_secs(10, 60).unwrap())
            .await;
        assert!(coordinator.is_running());
        // New fast ticks at 11, 21 and 31 s; next slow tick at 61 s.
        tokio::time::sleep(secs(31)).await;
        coordinator.shutdown().await;

        assert_eq!(fake.count(Endpoint::OutputData), 4);
        assert_eq!(fake.count(Endpoint::Alarm), 1);
        assert_eq!(coordinator.config().intervals().fast(), secs(10));
        assert_eq!(publishes.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_while_stopped_only_updates_config() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);

        coordinator
            .reconfigure(PollIntervals::from_secs(2, 20).unwrap())
            .await;

        assert!(!coordinator.is_running());
        assert_eq!(coordinator.config().request_timeout(), secs(2));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_transport_serves_next_fetch() {
        let first = FakeTransport::healthy();
        let second = FakeTransport::healthy();
        second.reply(Endpoint::Power, Reply::Json(power_payload(-50)));
        let coordinator = coordinator(&first);

        coordinator.refresh(SectionKind::Power).await;
        coordinator.replace_transport(second.clone());
        let state = coordinator.refresh(SectionKind::Power).await;

        assert_eq!(first.count(Endpoint::Power), 1);
        assert_eq!(second.count(Endpoint::Power), 1);
        assert_eq!(state.power_limit().value(), Some(&PowerSetting::new(-50)));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_callbacks_name_the_endpoint() {
        let fake = FakeTransport::healthy();
        fake.reply(Endpoint::DeviceInfo, Reply::Status(404));
        let coordinator = coordinator(&fake);
        let failed = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = Arc::clone(&failed);
        coordinator.on_fetch_failed(move |endpoint, failure| {
            log.lock().push((endpoint, failure.kind));
        });

        coordinator.refresh(SectionKind::AlarmsAndInfo).await;

        assert_eq!(
            *failed.lock(),
            vec![(Endpoint::DeviceInfo, FailureKind::HttpStatus)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn watch_receives_published_snapshots() {
        let fake = FakeTransport::healthy();
        let coordinator = coordinator(&fake);
        let mut rx = coordinator.watch();

        coordinator.refresh(SectionKind::AlarmsAndInfo).await;

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.device_info().value().unwrap().serial, "E17000000123");
    }
}
