use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

/// String-keyed JSON object in wire order (`serde_json` with `preserve_order`).
pub type JsonMap = serde_json::Map<String, Value>;

/// A decoded mapping key. Wire keys are always JSON object keys (text);
/// these are the typed forms a mapping field may declare.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
}

impl MapKey {
    /// Canonical wire spelling of the key.
    pub fn wire_string(&self) -> String {
        match self {
            MapKey::Text(s) => s.clone(),
            MapKey::Int(i) => i.to_string(),
            MapKey::Float(x) => x.to_string(),
            MapKey::Bool(true) => "true".to_string(),
            MapKey::Bool(false) => "false".to_string(),
            MapKey::Uuid(u) => u.to_string(),
        }
    }
}

/// The dynamic instance model: one decoded field value.
///
/// `Tuple` and `List` are deliberately distinct so container identity
/// survives a round trip. `Map` is a vector of pairs so iteration order is
/// the wire order. `Json` carries identity pass-through payloads for fields
/// that degraded to no transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Decimal(BigDecimal),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    List(Vec<FieldValue>),
    Tuple(Vec<FieldValue>),
    Map(Vec<(MapKey, FieldValue)>),
    Record(Record),
    Enum { enum_name: String, member: String },
    Json(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn enum_member(enum_name: impl Into<String>, member: impl Into<String>) -> Self {
        FieldValue::Enum {
            enum_name: enum_name.into(),
            member: member.into(),
        }
    }

    /// Structural JSON rendering, independent of any schema.
    ///
    /// Compiled encode routines only use this for identity pass-through
    /// fields; it is also convenient inside custom encoders. Enum members
    /// render as their member name here since no wire table is in scope.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(x) => Value::from(*x),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Decimal(d) => Value::String(d.to_string()),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339()),
            FieldValue::List(items) | FieldValue::Tuple(items) => {
                Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
            FieldValue::Map(entries) => {
                let mut out = JsonMap::new();
                for (k, v) in entries {
                    out.insert(k.wire_string(), v.to_json());
                }
                Value::Object(out)
            }
            FieldValue::Record(rec) => {
                let mut out = JsonMap::new();
                for (name, v) in rec.fields() {
                    out.insert(name.clone(), v.to_json());
                }
                Value::Object(out)
            }
            FieldValue::Enum { member, .. } => Value::String(member.clone()),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

/// A record instance: its type name plus fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Insert or replace a field, keeping first-insertion order.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub(crate) fn from_fields(type_name: String, fields: Vec<(String, FieldValue)>) -> Self {
        Self { type_name, fields }
    }
}
