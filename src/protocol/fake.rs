// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport and payload fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::protocol::{Endpoint, Transport};

/// What the fake answers for an endpoint.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(Value),
    Status(u16),
    Timeout,
    Panic,
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub endpoint: Endpoint,
    pub query: Vec<(&'static str, String)>,
}

#[derive(Debug, Default)]
struct Inner {
    replies: Mutex<HashMap<Endpoint, Reply>>,
    delays: Mutex<HashMap<Endpoint, Duration>>,
    calls: Mutex<Vec<Call>>,
}

/// Transport that answers from a script and records every call.
///
/// Clones share the same script and call log.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    /// A transport that answers every read endpoint with a healthy payload.
    pub fn healthy() -> Self {
        let fake = Self::default();
        fake.reply(Endpoint::OutputData, Reply::Json(output_payload()));
        fake.reply(Endpoint::Alarm, Reply::Json(alarm_payload(&[])));
        fake.reply(Endpoint::DeviceInfo, Reply::Json(device_info_payload(2)));
        fake.reply(Endpoint::Power, Reply::Json(power_payload(800)));
        fake.reply(Endpoint::SetPower, Reply::Json(ack_payload("SUCCESS")));
        fake
    }

    pub fn reply(&self, endpoint: Endpoint, reply: Reply) {
        self.inner.replies.lock().insert(endpoint, reply);
    }

    pub fn delay(&self, endpoint: Endpoint, delay: Duration) {
        self.inner.delays.lock().insert(endpoint, delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }
}

impl Transport for FakeTransport {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        self.inner.calls.lock().push(Call {
            endpoint,
            query: query.to_vec(),
        });

        let delay = self.inner.delays.lock().get(&endpoint).copied();
        let reply = self.inner.replies.lock().get(&endpoint).cloned();

        if let Some(delay) = delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(TransportError::Timeout {
                    after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Status(status)) => Err(TransportError::HttpStatus { status }),
            Some(Reply::Timeout) => Err(TransportError::Timeout {
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            Some(Reply::Panic) => panic!("scripted panic for {endpoint}"),
            None => Err(TransportError::Network(format!("no reply scripted for {endpoint}"))),
        }
    }
}

// ============================================================================
// Payload fixtures, shaped like real EZHI responses
// ============================================================================

pub(crate) fn output_payload() -> Value {
    json!({
        "data": {
            "batS": "2",
            "batSoc": "76",
            "batSoh": "99",
            "batTemp": "24.5",
            "devTemp": "38.1",
            "pvP": "612",
            "pvTE": "1520.4",
            "batP": "-350",
            "batCTE": "410.2",
            "batDTE": "388.9",
            "ogP": "250",
            "ogOTE": "901.7",
            "ogITE": "12.3",
            "ofgP": "0",
            "ofgOTE": "0",
            "ofgITE": "0"
        },
        "message": "SUCCESS",
        "deviceId": "E17000000123"
    })
}

pub(crate) fn alarm_payload(active: &[&str]) -> Value {
    let codes = [
        "BatHTP", "BatLTP", "BatCE", "BatHV", "BatLV", "BatHI", "BatE", "DTP", "EE", "SBS", "ACA",
        "OfOI", "PvHV", "PvOC", "IRDE", "PVWE", "OfGS",
    ];
    let data: serde_json::Map<String, Value> = codes
        .iter()
        .map(|code| {
            let flag = if active.contains(code) { "1" } else { "0" };
            ((*code).to_string(), Value::from(flag))
        })
        .collect();
    json!({ "data": data, "message": "SUCCESS", "deviceId": "E17000000123" })
}

pub(crate) fn device_info_payload(status_code: u8) -> Value {
    json!({
        "data": {
            "deviceId": "E17000000123",
            "devVer": "EZHI_1.2.7",
            "ssid": "home-iot",
            "ipAddr": "192.168.1.100",
            "minPower": "-1200",
            "maxPower": "1200",
            "batteryCapacity": "2.0",
            "batS": status_code.to_string()
        },
        "message": "SUCCESS",
        "deviceId": "E17000000123"
    })
}

pub(crate) fn power_payload(watts: i32) -> Value {
    json!({ "data": { "power": watts.to_string() }, "message": "SUCCESS", "deviceId": "E17000000123" })
}

pub(crate) fn ack_payload(message: &str) -> Value {
    json!({ "data": {}, "message": message, "deviceId": "E17000000123" })
}
