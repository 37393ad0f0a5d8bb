//! Record type registry and the lazy compile-and-cache gate.
//!
//! Each registered record type owns two single-assignment cells, one per
//! direction. The first call through a handle compiles the routine and
//! installs it; every later call goes straight to the installed closure.
//! Two threads racing the first call may both compile: wasted work, not a
//! correctness problem, since both routines are functionally identical and
//! `OnceLock` keeps exactly one. Compilation resolves nested record types
//! to registry handles and defers their own compilation to call time, so
//! mutually referencing types cannot deadlock each other's gates.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::compile::{compile_decode, compile_encode, CompileEnv};
use crate::error::CodecError;
use crate::json::{parse_mapping, render_mapping, JsonOptions};
use crate::schema::{EnumDef, RecordSchema, RegisterOptions};
use crate::shape::referenced_types;
use crate::value::{JsonMap, Record};

pub(crate) type DecodeFn = Arc<dyn Fn(&JsonMap, bool) -> Result<Record, CodecError> + Send + Sync>;
pub(crate) type EncodeFn = Arc<dyn Fn(&Record) -> Result<JsonMap, CodecError> + Send + Sync>;

struct RecordEntry {
    schema: RecordSchema,
    options: RegisterOptions,
    decode: OnceLock<DecodeFn>,
    encode: OnceLock<EncodeFn>,
}

#[derive(Default)]
struct RegistryInner {
    records: HashMap<String, Arc<RecordEntry>>,
    enums: HashMap<String, Arc<EnumDef>>,
}

/// A shared name-to-type table. Clones share the same underlying table;
/// `global()` provides the process-wide instance.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record schema and get back its codec handle.
    ///
    /// Idempotent: registering a structurally identical schema under an
    /// already-taken name returns the existing handle (the original's
    /// options stay in effect). A conflicting schema under an existing
    /// name is a configuration error; auxiliary type names are unique
    /// within a registry, so generated routines can never see a collision.
    pub fn register(&self, schema: RecordSchema) -> Result<RecordHandle, CodecError> {
        self.register_with(schema, RegisterOptions::default())
    }

    pub fn register_with(
        &self,
        schema: RecordSchema,
        options: RegisterOptions,
    ) -> Result<RecordHandle, CodecError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if let Some(existing) = inner.records.get(schema.name()) {
            if existing.schema.compatible_with(&schema) {
                return Ok(RecordHandle {
                    registry: self.clone(),
                    entry: existing.clone(),
                });
            }
            return Err(CodecError::config(format!(
                "record type {:?} is already registered with a different schema",
                schema.name()
            )));
        }
        if inner.enums.contains_key(schema.name()) {
            return Err(CodecError::config(format!(
                "{:?} is already registered as an enumeration",
                schema.name()
            )));
        }
        let entry = Arc::new(RecordEntry {
            schema,
            options,
            decode: OnceLock::new(),
            encode: OnceLock::new(),
        });
        inner
            .records
            .insert(entry.schema.name().to_string(), entry.clone());
        Ok(RecordHandle {
            registry: self.clone(),
            entry,
        })
    }

    /// Register an enumeration. Identical redefinition is a no-op;
    /// anything else is a configuration error.
    pub fn register_enum(&self, def: EnumDef) -> Result<(), CodecError> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if let Some(existing) = inner.enums.get(def.name()) {
            if **existing == def {
                return Ok(());
            }
            return Err(CodecError::config(format!(
                "enumeration {:?} is already registered with different members",
                def.name()
            )));
        }
        if inner.records.contains_key(def.name()) {
            return Err(CodecError::config(format!(
                "{:?} is already registered as a record type",
                def.name()
            )));
        }
        inner.enums.insert(def.name().to_string(), Arc::new(def));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<RecordHandle> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.records.get(name).map(|entry| RecordHandle {
            registry: self.clone(),
            entry: entry.clone(),
        })
    }

    /// Snapshot the auxiliary types one schema needs: every reachable named
    /// type, resolved now, captured read-only by the compiled closures.
    fn resolve_env(&self, schema: &RecordSchema) -> Result<CompileEnv, CodecError> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let mut records = HashMap::new();
        let mut enums = HashMap::new();
        for name in referenced_types(schema) {
            if let Some(entry) = inner.records.get(&name) {
                records.insert(
                    name,
                    RecordHandle {
                        registry: self.clone(),
                        entry: entry.clone(),
                    },
                );
            } else if let Some(def) = inner.enums.get(&name) {
                enums.insert(name, def.clone());
            } else {
                return Err(CodecError::config(format!(
                    "unknown type {name:?} referenced by {:?}: register it before first use",
                    schema.name()
                )));
            }
        }
        Ok(CompileEnv::new(records, enums))
    }
}

/// The public codec surface of one registered record type.
#[derive(Clone)]
pub struct RecordHandle {
    registry: Registry,
    entry: Arc<RecordEntry>,
}

impl std::fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordHandle")
            .field("name", &self.entry.schema.name())
            .finish_non_exhaustive()
    }
}

impl RecordHandle {
    pub fn name(&self) -> &str {
        self.entry.schema.name()
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.entry.schema
    }

    pub fn from_mapping(&self, map: &JsonMap) -> Result<Record, CodecError> {
        self.from_mapping_opts(map, true)
    }

    /// `infer_missing` is accepted for interface compatibility; absent
    /// fields always fall back to the schema's own default mechanism.
    pub fn from_mapping_opts(
        &self,
        map: &JsonMap,
        infer_missing: bool,
    ) -> Result<Record, CodecError> {
        let decode = match self.entry.decode.get() {
            Some(installed) => installed,
            None => {
                let env = self.registry.resolve_env(&self.entry.schema)?;
                let compiled = compile_decode(&self.entry.schema, &self.entry.options, &env)?;
                // A concurrent first caller may have won the install race;
                // whichever routine landed is the one everyone uses.
                self.entry.decode.get_or_init(|| compiled)
            }
        };
        decode(map, infer_missing)
    }

    pub fn to_mapping(&self, rec: &Record) -> Result<JsonMap, CodecError> {
        let encode = match self.entry.encode.get() {
            Some(installed) => installed,
            None => {
                let env = self.registry.resolve_env(&self.entry.schema)?;
                let compiled = compile_encode(&self.entry.schema, &self.entry.options, &env)?;
                self.entry.encode.get_or_init(|| compiled)
            }
        };
        encode(rec)
    }

    /// Parse JSON text (or bytes) and decode the resulting mapping.
    pub fn from_json(&self, input: impl AsRef<[u8]>) -> Result<Record, CodecError> {
        self.from_json_opts(input, true)
    }

    pub fn from_json_opts(
        &self,
        input: impl AsRef<[u8]>,
        infer_missing: bool,
    ) -> Result<Record, CodecError> {
        let map = parse_mapping(input.as_ref())?;
        self.from_mapping_opts(&map, infer_missing)
    }

    /// Encode and serialize with the most compact valid separators.
    pub fn to_json(&self, rec: &Record) -> Result<String, CodecError> {
        self.to_json_opts(rec, &JsonOptions::default())
    }

    pub fn to_json_opts(&self, rec: &Record, options: &JsonOptions) -> Result<String, CodecError> {
        let map = self.to_mapping(rec)?;
        render_mapping(&map, options)
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide default registry.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}
