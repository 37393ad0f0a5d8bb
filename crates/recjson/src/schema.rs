//! Record schemas, per-field metadata, and enumeration definitions.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CodecError;
use crate::types::TypeExpr;
use crate::value::FieldValue;

/// Custom wire-value → field-value decoder. Replaces the built transformer
/// for its field, decode direction only.
pub type DecoderFn = Arc<dyn Fn(&Value) -> Result<FieldValue, CodecError> + Send + Sync>;

/// Custom field-value → wire-value encoder. Replaces the built transformer
/// for its field, encode direction only.
pub type EncoderFn = Arc<dyn Fn(&FieldValue) -> Result<Value, CodecError> + Send + Sync>;

/// Wire-name transform applied to every field lacking an explicit override.
pub type NameTransformFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    None,
    Value(FieldValue),
    Factory(Arc<dyn Fn() -> FieldValue + Send + Sync>),
}

impl FieldDefault {
    pub fn is_none(&self) -> bool {
        matches!(self, FieldDefault::None)
    }

    pub(crate) fn produce(&self) -> Option<FieldValue> {
        match self {
            FieldDefault::None => None,
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Factory(f) => Some(f()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::None => f.write_str("None"),
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// One field: declared name, declared type, default, and optional overrides.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeExpr,
    default: FieldDefault,
    wire_name: Option<String>,
    decoder: Option<DecoderFn>,
    encoder: Option<EncoderFn>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            default: FieldDefault::None,
            wire_name: None,
            decoder: None,
            encoder: None,
        }
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = FieldDefault::Value(value);
        self
    }

    pub fn with_default_factory(
        mut self,
        factory: impl Fn() -> FieldValue + Send + Sync + 'static,
    ) -> Self {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    /// Rename on the wire. Wins over a whole-schema name transform.
    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = Some(wire_name.into());
        self
    }

    pub fn with_decoder(
        mut self,
        decoder: impl Fn(&Value) -> Result<FieldValue, CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    pub fn with_encoder(
        mut self,
        encoder: impl Fn(&FieldValue) -> Result<Value, CodecError> + Send + Sync + 'static,
    ) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_expr(&self) -> &TypeExpr {
        &self.ty
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub fn wire_name(&self) -> Option<&str> {
        self.wire_name.as_deref()
    }

    pub(crate) fn decoder(&self) -> Option<&DecoderFn> {
        self.decoder.as_ref()
    }

    pub(crate) fn encoder(&self) -> Option<&EncoderFn> {
        self.encoder.as_ref()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("default", &self.default)
            .field("wire_name", &self.wire_name)
            .field("decoder", &self.decoder.as_ref().map(|_| ".."))
            .field("encoder", &self.encoder.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Ordered field collection for one record type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a plain field with no default or overrides.
    pub fn field(self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.field_desc(FieldDescriptor::new(name, ty))
    }

    pub fn field_desc(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Structural comparison for idempotent registration. Closures cannot be
    /// compared, so override presence stands in for override identity.
    pub(crate) fn compatible_with(&self, other: &RecordSchema) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.name == b.name
                    && a.ty == b.ty
                    && a.wire_name == b.wire_name
                    && a.default.is_none() == b.default.is_none()
                    && a.decoder.is_some() == b.decoder.is_some()
                    && a.encoder.is_some() == b.encoder.is_some()
            })
    }
}

/// An enumeration: ordered members, each with a wire value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    name: String,
    members: Vec<(String, Value)>,
}

impl EnumDef {
    pub fn new<M, S>(name: impl Into<String>, members: M) -> Self
    where
        M: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(m, v)| (m.into(), v))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    pub(crate) fn member_for_wire(&self, wire: &Value) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| v == wire)
            .map(|(m, _)| m.as_str())
    }

    pub(crate) fn wire_for_member(&self, member: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(m, _)| m == member)
            .map(|(_, v)| v)
    }
}

/// Registration-time configuration.
#[derive(Clone, Default)]
pub struct RegisterOptions {
    wire_name_transform: Option<NameTransformFn>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied to every field without an explicit wire name.
    pub fn wire_name_transform(
        mut self,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.wire_name_transform = Some(Arc::new(transform));
        self
    }

    pub(crate) fn transform(&self) -> Option<&NameTransformFn> {
        self.wire_name_transform.as_ref()
    }
}

impl fmt::Debug for RegisterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterOptions")
            .field(
                "wire_name_transform",
                &self.wire_name_transform.as_ref().map(|_| ".."),
            )
            .finish()
    }
}
