//! Routine assembly: per-field plans from a schema, folded into one decode
//! or encode closure.
//!
//! The decode routine accumulates wire values field by field, then
//! constructs the record in schema order, letting defaults and the
//! missing-field check live in construction rather than per-field logic.
//! The encode routine mirrors it, omitting a field's entry entirely when
//! its value is absent.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::build::{build_decode, build_encode, DecodeTransform, EncodeTransform};
use crate::error::CodecError;
use crate::registry::{DecodeFn, EncodeFn, RecordHandle};
use crate::schema::{EnumDef, FieldDefault, FieldDescriptor, RecordSchema, RegisterOptions};
use crate::shape::{classify, NamedKind, ResolveNamed, TypeDescriptor};
use crate::value::{FieldValue, JsonMap, Record};

/// Auxiliary types in scope for one compilation: every named type reachable
/// from the schema, resolved to its registry handle or enum definition.
/// Names are unique within a registry by construction, so the compiled
/// closures can never capture two different types under one name.
pub(crate) struct CompileEnv {
    records: HashMap<String, RecordHandle>,
    enums: HashMap<String, Arc<EnumDef>>,
}

impl CompileEnv {
    pub(crate) fn new(
        records: HashMap<String, RecordHandle>,
        enums: HashMap<String, Arc<EnumDef>>,
    ) -> Self {
        Self { records, enums }
    }

    pub(crate) fn record(&self, name: &str) -> Result<&RecordHandle, CodecError> {
        self.records
            .get(name)
            .ok_or_else(|| CodecError::config(format!("unknown record type {name:?}")))
    }

    pub(crate) fn enum_def(&self, name: &str) -> Result<&Arc<EnumDef>, CodecError> {
        self.enums
            .get(name)
            .ok_or_else(|| CodecError::config(format!("unknown enumeration {name:?}")))
    }
}

impl ResolveNamed for CompileEnv {
    fn named_kind(&self, name: &str) -> Option<NamedKind> {
        if self.records.contains_key(name) {
            Some(NamedKind::Record)
        } else if self.enums.contains_key(name) {
            Some(NamedKind::Enum)
        } else {
            None
        }
    }
}

/// Wire name resolution: explicit per-field override wins over the
/// whole-schema transform, which wins over the declared name.
fn wire_name(field: &FieldDescriptor, options: &RegisterOptions) -> String {
    if let Some(explicit) = field.wire_name() {
        return explicit.to_string();
    }
    match options.transform() {
        Some(transform) => transform(field.name()),
        None => field.name().to_string(),
    }
}

/// One layer of optionality is handled by the field loop's null/absent
/// guard; the transform itself is built from the stripped descriptor.
fn split_top_optional(desc: TypeDescriptor) -> (bool, TypeDescriptor) {
    match desc {
        TypeDescriptor::Optional(inner) => (true, *inner),
        other => (false, other),
    }
}

struct DecodeFieldPlan {
    name: String,
    wire_name: String,
    transform: DecodeTransform,
    default: FieldDefault,
    top_optional: bool,
}

pub(crate) fn compile_decode(
    schema: &RecordSchema,
    options: &RegisterOptions,
    env: &CompileEnv,
) -> Result<DecodeFn, CodecError> {
    let mut plans = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let (top_optional, eff) = split_top_optional(classify(field.type_expr(), env)?);
        let transform = match field.decoder() {
            Some(custom) => DecodeTransform::Apply(custom.clone()),
            None => build_decode(&eff, env)?,
        };
        plans.push(DecodeFieldPlan {
            name: field.name().to_string(),
            wire_name: wire_name(field, options),
            transform,
            default: field.default().clone(),
            top_optional,
        });
    }

    let record_name = schema.name().to_string();
    Ok(Arc::new(move |map: &JsonMap, _infer_missing: bool| {
        let mut fields = Vec::with_capacity(plans.len());
        for plan in &plans {
            let value = match map.get(&plan.wire_name) {
                // Present-with-null is an explicit null, never the default.
                Some(Value::Null) => FieldValue::Null,
                Some(v) => plan.transform.apply(v)?,
                None => match plan.default.produce() {
                    Some(d) => d,
                    None if plan.top_optional => FieldValue::Null,
                    None => {
                        return Err(CodecError::missing_field(&record_name, &plan.name));
                    }
                },
            };
            fields.push((plan.name.clone(), value));
        }
        Ok(Record::from_fields(record_name.clone(), fields))
    }))
}

struct EncodeFieldPlan {
    name: String,
    wire_name: String,
    transform: EncodeTransform,
    top_optional: bool,
}

pub(crate) fn compile_encode(
    schema: &RecordSchema,
    options: &RegisterOptions,
    env: &CompileEnv,
) -> Result<EncodeFn, CodecError> {
    let mut plans = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let (top_optional, eff) = split_top_optional(classify(field.type_expr(), env)?);
        let transform = match field.encoder() {
            Some(custom) => EncodeTransform::Apply(custom.clone()),
            None => build_encode(&eff, env)?,
        };
        plans.push(EncodeFieldPlan {
            name: field.name().to_string(),
            wire_name: wire_name(field, options),
            transform,
            top_optional,
        });
    }

    Ok(Arc::new(move |rec: &Record| {
        let mut out = JsonMap::new();
        for plan in &plans {
            let value = rec.get(&plan.name).unwrap_or(&FieldValue::Null);
            if !value.is_null() {
                out.insert(plan.wire_name.clone(), plan.transform.apply(value)?);
            } else if plan.transform.is_identity() && !plan.top_optional {
                // Pass-through fields are written unconditionally, null
                // included. Optional fields omit the entry instead.
                out.insert(plan.wire_name.clone(), Value::Null);
            }
            // Absent values of optional fields are omitted. An
            // always-include-absent policy would insert Value::Null here;
            // it is documented but not wired to any external toggle.
        }
        Ok(out)
    }))
}
