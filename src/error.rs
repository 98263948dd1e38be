// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ezhi_local` library.
//!
//! Failures fall into three families that are handled very differently:
//!
//! - [`TransportError`]: a single request to the inverter failed. Recorded on
//!   the affected section of the device state, never fatal.
//! - [`DecodeError`]: the inverter answered, but the payload does not have
//!   the shape this library expects. Treated like a transport failure for
//!   scheduling, but signals a firmware or API change.
//! - [`ValueError`]: a caller-supplied value was rejected before anything
//!   was sent to the device.

use thiserror::Error;

use crate::state::FailureKind;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value failed validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A request to the inverter failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An inverter payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The inverter answered a write request with something other than success.
    #[error("command rejected by device: {0}")]
    CommandRejected(String),

    /// The configuration could not be turned into a working client.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Classifies this error for recording in a section's metadata.
    ///
    /// Returns `None` for errors that never originate from a poll.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Transport(err) => Some(err.failure_kind()),
            Self::Decode(err) => Some(err.failure_kind()),
            Self::CommandRejected(_) => Some(FailureKind::Rejected),
            Self::Value(_) | Self::Config(_) => None,
        }
    }
}

/// Errors raised by a single request to the inverter.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within the per-call timeout.
    #[error("request timed out after {after_ms} ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        after_ms: u64,
    },

    /// The inverter answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    HttpStatus {
        /// The returned status code.
        status: u16,
    },

    /// The request could not be sent or its body could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The inverter answered, but the body is not valid JSON.
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),

    /// The configured address cannot be used to build a client.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl TransportError {
    /// Classifies this error for recording in a section's metadata.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::MalformedJson(_) => FailureKind::MalformedJson,
            Self::Network(_) | Self::InvalidAddress(_) => FailureKind::Network,
        }
    }
}

/// Errors raised while decoding an inverter payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field is absent.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// A field is present but has the wrong JSON type.
    #[error("field {field} has the wrong type, expected {expected}")]
    TypeMismatch {
        /// The offending field.
        field: String,
        /// What the decoder expected to find.
        expected: &'static str,
    },

    /// A flag uses an encoding the decoder does not know how to read.
    #[error("field {field} uses an unrecognized encoding: {value}")]
    UnrecognizedEncoding {
        /// The offending field.
        field: String,
        /// The raw JSON value, rendered as text.
        value: String,
    },
}

impl DecodeError {
    /// Classifies this error for recording in a section's metadata.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingField(_) => FailureKind::MissingField,
            Self::TypeMismatch { .. } => FailureKind::TypeMismatch,
            Self::UnrecognizedEncoding { .. } => FailureKind::UnrecognizedEncoding,
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i32,
        /// Maximum allowed value.
        max: i32,
        /// The actual value that was provided.
        actual: i32,
    },

    /// A polling interval is below the allowed floor.
    #[error("{name} interval of {actual_ms} ms is below the minimum of {min_ms} ms")]
    IntervalTooShort {
        /// Which interval was rejected.
        name: &'static str,
        /// The interval that was provided, in milliseconds.
        actual_ms: u128,
        /// The floor, in milliseconds.
        min_ms: u128,
    },

    /// A polling interval is above the allowed ceiling.
    #[error("{name} interval of {actual_ms} ms is above the maximum of {max_ms} ms")]
    IntervalTooLong {
        /// Which interval was rejected.
        name: &'static str,
        /// The interval that was provided, in milliseconds.
        actual_ms: u128,
        /// The ceiling, in milliseconds.
        max_ms: u128,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: -1200,
            max: 1200,
            actual: 1500,
        };
        assert_eq!(err.to_string(), "value 1500 is out of range [-1200, 1200]");
    }

    #[test]
    fn interval_error_display() {
        let err = ValueError::IntervalTooShort {
            name: "fast",
            actual_ms: 200,
            min_ms: 1000,
        };
        assert_eq!(
            err.to_string(),
            "fast interval of 200 ms is below the minimum of 1000 ms"
        );
    }

    #[test]
    fn error_from_value_error() {
        let err: Error = ValueError::OutOfRange {
            min: 0,
            max: 1,
            actual: 2,
        }
        .into();
        assert!(matches!(err, Error::Value(ValueError::OutOfRange { .. })));
        assert_eq!(err.failure_kind(), None);
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::MissingField("data.pvP".to_string());
        assert_eq!(err.to_string(), "missing field in response: data.pvP");
    }

    #[test]
    fn failure_kinds_are_distinct() {
        let timeout: Error = TransportError::Timeout { after_ms: 5000 }.into();
        let status: Error = TransportError::HttpStatus { status: 500 }.into();
        let decode: Error = DecodeError::UnrecognizedEncoding {
            field: "BatE".to_string(),
            value: "\"yes\"".to_string(),
        }
        .into();

        assert_eq!(timeout.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(status.failure_kind(), Some(FailureKind::HttpStatus));
        assert_eq!(
            decode.failure_kind(),
            Some(FailureKind::UnrecognizedEncoding)
        );

        let garbled: Error = TransportError::MalformedJson("expected value".to_string()).into();
        assert_eq!(garbled.failure_kind(), Some(FailureKind::MalformedJson));
    }
}
