//! Declared-type classification: `TypeExpr` in, codec shape out.
//!
//! Descriptors are derived fresh each time a routine is compiled and never
//! persisted; the closed shape set is what the transform builder composes
//! over.

use std::collections::BTreeSet;

use crate::error::CodecError;
use crate::schema::RecordSchema;
use crate::types::TypeExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Int,
    Float,
    Bool,
    Decimal,
    Uuid,
    Date,
    DateTime,
    /// No transformation in either direction.
    Identity,
}

/// Mapping key kinds with a JSON-native wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Text,
    Int,
    Float,
    Bool,
    Uuid,
}

/// Exactly one tag applies to any declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Optional(Box<TypeDescriptor>),
    FixedTuple(Vec<TypeDescriptor>),
    Sequence {
        inner: Box<TypeDescriptor>,
        /// Decoded container keeps tuple identity instead of list identity.
        tuple: bool,
    },
    Mapping {
        key: KeyKind,
        value: Box<TypeDescriptor>,
    },
    Record(String),
    Enum(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKind {
    Record,
    Enum,
}

/// How `Named` type references resolve during classification. Implemented by
/// the compile environment; tests use a stub.
pub trait ResolveNamed {
    fn named_kind(&self, name: &str) -> Option<NamedKind>;
}

pub fn classify(
    ty: &TypeExpr,
    resolve: &dyn ResolveNamed,
) -> Result<TypeDescriptor, CodecError> {
    match ty {
        TypeExpr::Option(inner) => Ok(TypeDescriptor::Optional(Box::new(classify(
            inner, resolve,
        )?))),
        TypeExpr::Tuple(items) => {
            let mut inners = Vec::with_capacity(items.len());
            for item in items {
                inners.push(classify(item, resolve)?);
            }
            Ok(TypeDescriptor::FixedTuple(inners))
        }
        TypeExpr::TupleOf(inner) => Ok(TypeDescriptor::Sequence {
            inner: Box::new(classify(inner, resolve)?),
            tuple: true,
        }),
        TypeExpr::List(inner) => Ok(TypeDescriptor::Sequence {
            inner: Box::new(classify(inner, resolve)?),
            tuple: false,
        }),
        TypeExpr::Map(key, value) => match key_kind(key) {
            Some(kind) => Ok(TypeDescriptor::Mapping {
                key: kind,
                value: Box::new(classify(value, resolve)?),
            }),
            None => {
                // Permissive fallback, not an error: the whole field is
                // serialized untouched, which breaks round-tripping for
                // non-JSON-native key types.
                tracing::warn!(
                    key = ?key,
                    "mapping key type has no JSON-native spelling; field degrades to identity pass-through"
                );
                Ok(TypeDescriptor::Scalar(ScalarKind::Identity))
            }
        },
        TypeExpr::Named(name) => match resolve.named_kind(name) {
            Some(NamedKind::Record) => Ok(TypeDescriptor::Record(name.clone())),
            Some(NamedKind::Enum) => Ok(TypeDescriptor::Enum(name.clone())),
            None => Err(CodecError::config(format!(
                "unknown type {name:?}: register it before first use"
            ))),
        },
        TypeExpr::Any => Ok(TypeDescriptor::Scalar(ScalarKind::Identity)),
        TypeExpr::Text => Ok(TypeDescriptor::Scalar(ScalarKind::Text)),
        TypeExpr::Int => Ok(TypeDescriptor::Scalar(ScalarKind::Int)),
        TypeExpr::Float => Ok(TypeDescriptor::Scalar(ScalarKind::Float)),
        TypeExpr::Bool => Ok(TypeDescriptor::Scalar(ScalarKind::Bool)),
        TypeExpr::Decimal => Ok(TypeDescriptor::Scalar(ScalarKind::Decimal)),
        TypeExpr::Uuid => Ok(TypeDescriptor::Scalar(ScalarKind::Uuid)),
        TypeExpr::Date => Ok(TypeDescriptor::Scalar(ScalarKind::Date)),
        TypeExpr::DateTime => Ok(TypeDescriptor::Scalar(ScalarKind::DateTime)),
    }
}

fn key_kind(key: &TypeExpr) -> Option<KeyKind> {
    match key {
        TypeExpr::Text => Some(KeyKind::Text),
        TypeExpr::Int => Some(KeyKind::Int),
        TypeExpr::Float => Some(KeyKind::Float),
        TypeExpr::Bool => Some(KeyKind::Bool),
        TypeExpr::Uuid => Some(KeyKind::Uuid),
        _ => None,
    }
}

/// Every named auxiliary type transitively reachable through the schema's
/// declared field types. The compiled routine must be able to resolve each
/// of these from the registry.
pub fn referenced_types(schema: &RecordSchema) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for field in schema.fields() {
        collect_named(field.type_expr(), &mut out);
    }
    out
}

fn collect_named(ty: &TypeExpr, out: &mut BTreeSet<String>) {
    match ty {
        TypeExpr::Named(name) => {
            out.insert(name.clone());
        }
        TypeExpr::Option(inner) | TypeExpr::List(inner) | TypeExpr::TupleOf(inner) => {
            collect_named(inner, out);
        }
        TypeExpr::Tuple(items) => {
            for item in items {
                collect_named(item, out);
            }
        }
        TypeExpr::Map(key, value) => {
            collect_named(key, out);
            collect_named(value, out);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;

    impl ResolveNamed for Stub {
        fn named_kind(&self, name: &str) -> Option<NamedKind> {
            match name {
                "Point" => Some(NamedKind::Record),
                "Color" => Some(NamedKind::Enum),
                _ => None,
            }
        }
    }

    #[test]
    fn option_strips_exactly_one_layer() {
        let d = classify(
            &TypeExpr::option(TypeExpr::option(TypeExpr::Int)),
            &Stub,
        )
        .unwrap();
        assert_eq!(
            d,
            TypeDescriptor::Optional(Box::new(TypeDescriptor::Optional(Box::new(
                TypeDescriptor::Scalar(ScalarKind::Int)
            ))))
        );
    }

    #[test]
    fn tuple_of_keeps_tuple_identity() {
        let d = classify(&TypeExpr::tuple_of(TypeExpr::Int), &Stub).unwrap();
        assert_eq!(
            d,
            TypeDescriptor::Sequence {
                inner: Box::new(TypeDescriptor::Scalar(ScalarKind::Int)),
                tuple: true,
            }
        );
    }

    #[test]
    fn unsupported_map_key_degrades_field_to_identity() {
        let d = classify(&TypeExpr::map(TypeExpr::Date, TypeExpr::Int), &Stub).unwrap();
        assert_eq!(d, TypeDescriptor::Scalar(ScalarKind::Identity));
    }

    #[test]
    fn named_types_classify_by_registry_kind() {
        assert_eq!(
            classify(&TypeExpr::named("Point"), &Stub).unwrap(),
            TypeDescriptor::Record("Point".to_string())
        );
        assert_eq!(
            classify(&TypeExpr::named("Color"), &Stub).unwrap(),
            TypeDescriptor::Enum("Color".to_string())
        );
    }

    #[test]
    fn unknown_named_type_is_a_config_error() {
        let err = classify(&TypeExpr::named("Ghost"), &Stub).unwrap_err();
        assert_eq!(err.kind, crate::error::CodecErrorKind::Config);
    }

    #[test]
    fn referenced_types_walks_all_positions() {
        let schema = RecordSchema::new("Outer")
            .field("a", TypeExpr::option(TypeExpr::list(TypeExpr::named("Point"))))
            .field("b", TypeExpr::map(TypeExpr::Uuid, TypeExpr::named("Color")))
            .field(
                "c",
                TypeExpr::Tuple(vec![TypeExpr::Int, TypeExpr::named("Point")]),
            );
        let names: Vec<String> = referenced_types(&schema).into_iter().collect();
        assert_eq!(names, vec!["Color".to_string(), "Point".to_string()]);
    }
}
