// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Envelope and field helpers shared by the payload decoders.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// The wrapper every endpoint puts around its payload.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    pub fn parse(payload: &Value) -> Result<Self, DecodeError> {
        if !payload.is_object() {
            return Err(DecodeError::TypeMismatch {
                field: "<root>".to_string(),
                expected: "object",
            });
        }
        Self::deserialize(payload).map_err(|_| DecodeError::TypeMismatch {
            field: "<envelope>".to_string(),
            expected: "object `data` and string `message`",
        })
    }

    /// Returns the `data` object, which every read endpoint requires.
    pub fn into_data(self) -> Result<Map<String, Value>, DecodeError> {
        self.data
            .ok_or_else(|| DecodeError::MissingField("data".to_string()))
    }
}

fn path(key: &str) -> String {
    format!("data.{key}")
}

fn present<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

/// A required number, given either as a JSON number or a numeric string.
pub(crate) fn number(data: &Map<String, Value>, key: &str) -> Result<f64, DecodeError> {
    optional_number(data, key)?.ok_or_else(|| DecodeError::MissingField(path(key)))
}

pub(crate) fn optional_number(
    data: &Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, DecodeError> {
    let Some(value) = present(data, key) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| DecodeError::TypeMismatch {
            field: path(key),
            expected: "number",
        })
}

/// A required integer, given either as a JSON integer or an integer string.
pub(crate) fn integer(data: &Map<String, Value>, key: &str) -> Result<i64, DecodeError> {
    optional_integer(data, key)?.ok_or_else(|| DecodeError::MissingField(path(key)))
}

pub(crate) fn optional_integer(
    data: &Map<String, Value>,
    key: &str,
) -> Result<Option<i64>, DecodeError> {
    let Some(value) = present(data, key) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| DecodeError::TypeMismatch {
        field: path(key),
        expected: "integer",
    })
}

/// An integer that must also fit in an `i32`.
pub(crate) fn optional_i32(
    data: &Map<String, Value>,
    key: &str,
) -> Result<Option<i32>, DecodeError> {
    optional_integer(data, key)?
        .map(|v| {
            i32::try_from(v).map_err(|_| DecodeError::TypeMismatch {
                field: path(key),
                expected: "32-bit integer",
            })
        })
        .transpose()
}

pub(crate) fn string(data: &Map<String, Value>, key: &str) -> Result<String, DecodeError> {
    optional_string(data, key)?.ok_or_else(|| DecodeError::MissingField(path(key)))
}

pub(crate) fn optional_string(
    data: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, DecodeError> {
    match present(data, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::TypeMismatch {
            field: path(key),
            expected: "string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn numbers_accept_strings_and_numbers() {
        let d = data(json!({"a": "12.5", "b": 7, "c": " -3 "}));
        assert!((number(&d, "a").unwrap() - 12.5).abs() < f64::EPSILON);
        assert!((number(&d, "b").unwrap() - 7.0).abs() < f64::EPSILON);
        assert!((number(&d, "c").unwrap() + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_and_null_are_missing() {
        let d = data(json!({"a": null}));
        assert_eq!(
            number(&d, "a"),
            Err(DecodeError::MissingField("data.a".to_string()))
        );
        assert_eq!(
            number(&d, "b"),
            Err(DecodeError::MissingField("data.b".to_string()))
        );
    }

    #[test]
    fn non_numeric_is_type_mismatch() {
        let d = data(json!({"a": "n/a", "b": true, "c": "NaN"}));
        for key in ["a", "b", "c"] {
            assert!(matches!(
                number(&d, key),
                Err(DecodeError::TypeMismatch { expected: "number", .. })
            ));
        }
    }

    #[test]
    fn integers_reject_fractions() {
        let d = data(json!({"a": "450", "b": 1.5}));
        assert_eq!(integer(&d, "a").unwrap(), 450);
        assert!(matches!(
            integer(&d, "b"),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn i32_overflow_is_type_mismatch() {
        let d = data(json!({"a": 10_000_000_000_i64}));
        assert!(optional_i32(&d, "a").is_err());
    }

    #[test]
    fn envelope_requires_object_data() {
        let err = Envelope::parse(&json!({"data": "oops"})).unwrap_err();
        assert!(matches!(err, DecodeError::TypeMismatch { .. }));

        let missing = Envelope::parse(&json!({"message": "SUCCESS"}))
            .unwrap()
            .into_data()
            .unwrap_err();
        assert_eq!(missing, DecodeError::MissingField("data".to_string()));
    }

    #[test]
    fn envelope_rejects_non_object_root() {
        assert!(Envelope::parse(&json!([1, 2, 3])).is_err());
    }
}
