//! Transform construction: one composable transformer per type descriptor
//! and direction, not yet bound to any field.
//!
//! Transformers are closure trees. Nesting depth is unbounded; each level
//! owns its inner transformer, so composition cannot shadow or double-
//! evaluate anything. `Identity` is kept distinguishable from `Apply` so the
//! routine generator can replicate the trivial-transform elision rules.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::compile::CompileEnv;
use crate::error::CodecError;
use crate::scalar;
use crate::shape::{KeyKind, ScalarKind, TypeDescriptor};
use crate::value::{FieldValue, JsonMap, MapKey};

#[derive(Clone)]
pub(crate) enum DecodeTransform {
    Identity,
    Apply(Arc<dyn Fn(&Value) -> Result<FieldValue, CodecError> + Send + Sync>),
}

impl DecodeTransform {
    pub(crate) fn is_identity(&self) -> bool {
        matches!(self, DecodeTransform::Identity)
    }

    pub(crate) fn apply(&self, v: &Value) -> Result<FieldValue, CodecError> {
        match self {
            DecodeTransform::Identity => Ok(scalar::identity_from_json(v)),
            DecodeTransform::Apply(f) => f(v),
        }
    }
}

#[derive(Clone)]
pub(crate) enum EncodeTransform {
    Identity,
    Apply(Arc<dyn Fn(&FieldValue) -> Result<Value, CodecError> + Send + Sync>),
}

impl EncodeTransform {
    pub(crate) fn is_identity(&self) -> bool {
        matches!(self, EncodeTransform::Identity)
    }

    pub(crate) fn apply(&self, v: &FieldValue) -> Result<Value, CodecError> {
        match self {
            EncodeTransform::Identity => Ok(v.to_json()),
            EncodeTransform::Apply(f) => f(v),
        }
    }
}

pub(crate) fn build_decode(
    desc: &TypeDescriptor,
    env: &CompileEnv,
) -> Result<DecodeTransform, CodecError> {
    match desc {
        TypeDescriptor::Scalar(ScalarKind::Identity) => Ok(DecodeTransform::Identity),
        TypeDescriptor::Scalar(kind) => {
            let kind = *kind;
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                scalar::decode_scalar(kind, v)
            })))
        }
        TypeDescriptor::Optional(inner) => {
            let inner = build_decode(inner, env)?;
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                if v.is_null() {
                    Ok(FieldValue::Null)
                } else {
                    inner.apply(v)
                }
            })))
        }
        TypeDescriptor::FixedTuple(inners) => {
            let mut slots = Vec::with_capacity(inners.len());
            for inner in inners {
                slots.push(build_decode(inner, env)?);
            }
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                let arr = as_array(v)?;
                if arr.len() != slots.len() {
                    return Err(CodecError::malformed(format!(
                        "expected {}-tuple, got {} elements",
                        slots.len(),
                        arr.len()
                    )));
                }
                let mut items = Vec::with_capacity(slots.len());
                for (slot, item) in slots.iter().zip(arr) {
                    items.push(slot.apply(item)?);
                }
                Ok(FieldValue::Tuple(items))
            })))
        }
        TypeDescriptor::Sequence { inner, tuple } => {
            let inner = build_decode(inner, env)?;
            let tuple = *tuple;
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                let arr = as_array(v)?;
                let mut items = Vec::with_capacity(arr.len());
                for item in arr {
                    items.push(inner.apply(item)?);
                }
                Ok(if tuple {
                    FieldValue::Tuple(items)
                } else {
                    FieldValue::List(items)
                })
            })))
        }
        TypeDescriptor::Mapping { key, value } => {
            let key = *key;
            let value = build_decode(value, env)?;
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                let obj = as_object(v)?;
                let mut entries = Vec::with_capacity(obj.len());
                for (k, item) in obj {
                    entries.push((decode_key(key, k)?, value.apply(item)?));
                }
                Ok(FieldValue::Map(entries))
            })))
        }
        TypeDescriptor::Record(name) => {
            let handle = env.record(name)?.clone();
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                let obj = as_object(v)?;
                handle.from_mapping(obj).map(FieldValue::Record)
            })))
        }
        TypeDescriptor::Enum(name) => {
            let def = env.enum_def(name)?.clone();
            Ok(DecodeTransform::Apply(Arc::new(move |v| {
                match def.member_for_wire(v) {
                    Some(member) => Ok(FieldValue::Enum {
                        enum_name: def.name().to_string(),
                        member: member.to_string(),
                    }),
                    None => Err(CodecError::malformed(format!(
                        "{} has no member with wire value {v}",
                        def.name()
                    ))),
                }
            })))
        }
    }
}

pub(crate) fn build_encode(
    desc: &TypeDescriptor,
    env: &CompileEnv,
) -> Result<EncodeTransform, CodecError> {
    match desc {
        TypeDescriptor::Scalar(ScalarKind::Identity) => Ok(EncodeTransform::Identity),
        TypeDescriptor::Scalar(kind) => {
            let kind = *kind;
            Ok(EncodeTransform::Apply(Arc::new(move |v| {
                scalar::encode_scalar(kind, v)
            })))
        }
        TypeDescriptor::Optional(inner) => {
            let inner = build_encode(inner, env)?;
            Ok(EncodeTransform::Apply(Arc::new(move |v| {
                if v.is_null() {
                    Ok(Value::Null)
                } else {
                    inner.apply(v)
                }
            })))
        }
        TypeDescriptor::FixedTuple(inners) => {
            let mut slots = Vec::with_capacity(inners.len());
            for inner in inners {
                slots.push(build_encode(inner, env)?);
            }
            Ok(EncodeTransform::Apply(Arc::new(move |v| {
                let items = as_fixed_items(v, slots.len())?;
                let mut out = Vec::with_capacity(slots.len());
                for (slot, item) in slots.iter().zip(items) {
                    out.push(slot.apply(item)?);
                }
                Ok(Value::Array(out))
            })))
        }
        TypeDescriptor::Sequence { inner, .. } => {
            let inner = build_encode(inner, env)?;
            Ok(EncodeTransform::Apply(Arc::new(move |v| {
                let items = match v {
                    FieldValue::List(items) | FieldValue::Tuple(items) => items,
                    other => return Err(shape_mismatch("sequence", other)),
                };
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(inner.apply(item)?);
                }
                Ok(Value::Array(out))
            })))
        }
        TypeDescriptor::Mapping { value, .. } => {
            let value = build_encode(value, env)?;
            Ok(EncodeTransform::Apply(Arc::new(move |v| {
                let entries = match v {
                    FieldValue::Map(entries) => entries,
                    other => return Err(shape_mismatch("mapping", other)),
                };
                let mut out = JsonMap::new();
                for (k, item) in entries {
                    out.insert(k.wire_string(), value.apply(item)?);
                }
                Ok(Value::Object(out))
            })))
        }
        TypeDescriptor::Record(name) => {
            let handle = env.record(name)?.clone();
            Ok(EncodeTransform::Apply(Arc::new(move |v| match v {
                FieldValue::Record(rec) => handle.to_mapping(rec).map(Value::Object),
                other => Err(shape_mismatch("record", other)),
            })))
        }
        TypeDescriptor::Enum(name) => {
            let def = env.enum_def(name)?.clone();
            Ok(EncodeTransform::Apply(Arc::new(move |v| match v {
                FieldValue::Enum { member, .. } => match def.wire_for_member(member) {
                    Some(wire) => Ok(wire.clone()),
                    None => Err(CodecError::malformed(format!(
                        "{} has no member named {member:?}",
                        def.name()
                    ))),
                },
                other => Err(shape_mismatch("enum member", other)),
            })))
        }
    }
}

fn decode_key(kind: KeyKind, k: &str) -> Result<MapKey, CodecError> {
    match kind {
        KeyKind::Text => Ok(MapKey::Text(k.to_string())),
        KeyKind::Int => k
            .parse::<i64>()
            .map(MapKey::Int)
            .map_err(|e| CodecError::malformed(format!("invalid integer key {k:?}: {e}"))),
        KeyKind::Float => k
            .parse::<f64>()
            .map(MapKey::Float)
            .map_err(|e| CodecError::malformed(format!("invalid float key {k:?}: {e}"))),
        // Literal recognition: exactly "true" is true, anything else false.
        KeyKind::Bool => Ok(MapKey::Bool(k == "true")),
        KeyKind::Uuid => Uuid::parse_str(k)
            .map(MapKey::Uuid)
            .map_err(|e| CodecError::malformed(format!("invalid uuid key {k:?}: {e}"))),
    }
}

fn as_array(v: &Value) -> Result<&Vec<Value>, CodecError> {
    match v {
        Value::Array(items) => Ok(items),
        other => Err(CodecError::malformed(format!(
            "expected array, got {other}"
        ))),
    }
}

fn as_object(v: &Value) -> Result<&JsonMap, CodecError> {
    match v {
        Value::Object(map) => Ok(map),
        other => Err(CodecError::malformed(format!(
            "expected object, got {other}"
        ))),
    }
}

fn as_fixed_items(v: &FieldValue, arity: usize) -> Result<&[FieldValue], CodecError> {
    let items = match v {
        FieldValue::Tuple(items) | FieldValue::List(items) => items.as_slice(),
        other => return Err(shape_mismatch("tuple", other)),
    };
    if items.len() != arity {
        return Err(CodecError::malformed(format!(
            "expected {arity}-tuple, got {} elements",
            items.len()
        )));
    }
    Ok(items)
}

fn shape_mismatch(expected: &str, got: &FieldValue) -> CodecError {
    CodecError::malformed(format!("expected {expected} value, got {got:?}"))
}
