//! Per-scalar-kind decode/encode over `serde_json::Value`.
//!
//! Decode goes straight at the underlying parser and lets its failure
//! propagate as a `Malformed` error; there is no local recovery here.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CodecError;
use crate::shape::ScalarKind;
use crate::value::FieldValue;

pub(crate) fn decode_scalar(kind: ScalarKind, v: &Value) -> Result<FieldValue, CodecError> {
    match kind {
        ScalarKind::Text => match v {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(type_mismatch("text", other)),
        },
        ScalarKind::Int => match v.as_i64() {
            Some(i) => Ok(FieldValue::Int(i)),
            None => Err(type_mismatch("integer", v)),
        },
        ScalarKind::Float => match v.as_f64() {
            Some(x) => Ok(FieldValue::Float(x)),
            None => Err(type_mismatch("float", v)),
        },
        ScalarKind::Bool => match v {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            other => Err(type_mismatch("boolean", other)),
        },
        ScalarKind::Decimal => decode_decimal(v),
        ScalarKind::Uuid => match v {
            Value::String(s) => Uuid::parse_str(s)
                .map(FieldValue::Uuid)
                .map_err(|e| CodecError::malformed(format!("invalid uuid {s:?}: {e}"))),
            other => Err(type_mismatch("uuid text", other)),
        },
        ScalarKind::Date => match v {
            Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|e| CodecError::malformed(format!("invalid date {s:?}: {e}"))),
            other => Err(type_mismatch("date text", other)),
        },
        ScalarKind::DateTime => match v {
            Value::String(s) => decode_datetime(s),
            other => Err(type_mismatch("date-time text", other)),
        },
        ScalarKind::Identity => Ok(identity_from_json(v)),
    }
}

pub(crate) fn encode_scalar(kind: ScalarKind, v: &FieldValue) -> Result<Value, CodecError> {
    match (kind, v) {
        (ScalarKind::Text, FieldValue::Text(s)) => Ok(Value::String(s.clone())),
        (ScalarKind::Int, FieldValue::Int(i)) => Ok(Value::from(*i)),
        (ScalarKind::Float, FieldValue::Float(x)) => Ok(Value::from(*x)),
        (ScalarKind::Float, FieldValue::Int(i)) => Ok(Value::from(*i as f64)),
        (ScalarKind::Bool, FieldValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ScalarKind::Decimal, FieldValue::Decimal(d)) => Ok(Value::String(d.to_string())),
        (ScalarKind::Uuid, FieldValue::Uuid(u)) => Ok(Value::String(u.to_string())),
        (ScalarKind::Date, FieldValue::Date(d)) => {
            Ok(Value::String(d.format("%Y-%m-%d").to_string()))
        }
        (ScalarKind::DateTime, FieldValue::DateTime(dt)) => Ok(Value::String(dt.to_rfc3339())),
        (ScalarKind::Identity, other) => Ok(other.to_json()),
        (kind, other) => Err(CodecError::malformed(format!(
            "cannot encode {other:?} as {kind:?}"
        ))),
    }
}

/// Null stays the dedicated null marker; everything else is carried opaque.
pub(crate) fn identity_from_json(v: &Value) -> FieldValue {
    match v {
        Value::Null => FieldValue::Null,
        other => FieldValue::Json(other.clone()),
    }
}

/// Decimal construction always goes through the textual form, even for
/// numeric wire input, so float representation artifacts never leak in.
fn decode_decimal(v: &Value) -> Result<FieldValue, CodecError> {
    let text = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(type_mismatch("decimal", other)),
    };
    BigDecimal::from_str(&text)
        .map(FieldValue::Decimal)
        .map_err(|e| CodecError::malformed(format!("invalid decimal {text:?}: {e}")))
}

/// A trailing literal `Z` means an explicit zero UTC offset.
fn decode_datetime(s: &str) -> Result<FieldValue, CodecError> {
    let normalized;
    let text = if let Some(stripped) = s.strip_suffix('Z') {
        normalized = format!("{stripped}+00:00");
        normalized.as_str()
    } else {
        s
    };
    DateTime::parse_from_rfc3339(text)
        .map(FieldValue::DateTime)
        .map_err(|e| CodecError::malformed(format!("invalid date-time {s:?}: {e}")))
}

fn type_mismatch(expected: &str, got: &Value) -> CodecError {
    CodecError::malformed(format!("expected {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn datetime_trailing_z_equals_explicit_utc() {
        let a = decode_scalar(ScalarKind::DateTime, &json!("2021-06-17T10:00:00Z")).unwrap();
        let b = decode_scalar(ScalarKind::DateTime, &json!("2021-06-17T10:00:00+00:00")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn datetime_encodes_with_explicit_offset() {
        let dt = decode_scalar(ScalarKind::DateTime, &json!("2021-06-17T10:00:00Z")).unwrap();
        let wire = encode_scalar(ScalarKind::DateTime, &dt).unwrap();
        assert_eq!(wire, json!("2021-06-17T10:00:00+00:00"));
    }

    #[test]
    fn decimal_from_number_has_no_float_artifacts() {
        let d = decode_scalar(ScalarKind::Decimal, &json!(0.1)).unwrap();
        assert_eq!(
            encode_scalar(ScalarKind::Decimal, &d).unwrap(),
            json!("0.1")
        );
    }

    #[test]
    fn decimal_from_text() {
        let d = decode_scalar(ScalarKind::Decimal, &json!("12.3400")).unwrap();
        // Scale is preserved.
        assert_eq!(
            encode_scalar(ScalarKind::Decimal, &d).unwrap(),
            json!("12.3400")
        );
    }

    #[test]
    fn uuid_round_trips_through_canonical_text() {
        let s = "b9b19876-b5a9-4a9f-9de2-51b25e172ba8";
        let u = decode_scalar(ScalarKind::Uuid, &json!(s)).unwrap();
        assert_eq!(encode_scalar(ScalarKind::Uuid, &u).unwrap(), json!(s));
    }

    #[test]
    fn date_round_trip() {
        let d = decode_scalar(ScalarKind::Date, &json!("2021-06-17")).unwrap();
        assert_eq!(
            encode_scalar(ScalarKind::Date, &d).unwrap(),
            json!("2021-06-17")
        );
    }

    #[test]
    fn malformed_date_propagates() {
        let err = decode_scalar(ScalarKind::Date, &json!("17/06/2021")).unwrap_err();
        assert_eq!(err.kind, crate::error::CodecErrorKind::Malformed);
    }

    #[test]
    fn identity_keeps_null_as_null_marker() {
        assert_eq!(
            decode_scalar(ScalarKind::Identity, &Value::Null).unwrap(),
            FieldValue::Null
        );
        assert_eq!(
            decode_scalar(ScalarKind::Identity, &json!({"a": [1, 2]})).unwrap(),
            FieldValue::Json(json!({"a": [1, 2]}))
        );
    }
}
