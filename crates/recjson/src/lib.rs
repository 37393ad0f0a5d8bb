//! Schema-driven record ⇄ JSON codec with per-type compiled routines.
//!
//! A record type is registered once as a [`RecordSchema`]; on the first
//! decode or encode call the registry compiles a specialized closure tree
//! for that schema and caches it, so every later call runs the compiled
//! routine with no per-call type walking.
//!
//! ```
//! use recjson::{Registry, RecordSchema, TypeExpr};
//!
//! let registry = Registry::new();
//! let point = registry
//!     .register(
//!         RecordSchema::new("Point")
//!             .field("x", TypeExpr::Int)
//!             .field("y", TypeExpr::Int),
//!     )
//!     .unwrap();
//!
//! let rec = point.from_json(r#"{"x":1,"y":2}"#).unwrap();
//! assert_eq!(point.to_json(&rec).unwrap(), r#"{"x":1,"y":2}"#);
//! ```

pub mod error;
pub mod json;
pub mod registry;
pub mod schema;
pub mod shape;
pub mod types;
pub mod value;

mod build;
mod compile;
mod scalar;

pub use error::{CodecError, CodecErrorKind};
pub use json::JsonOptions;
pub use registry::{global, RecordHandle, Registry};
pub use schema::{EnumDef, FieldDefault, FieldDescriptor, RecordSchema, RegisterOptions};
pub use types::TypeExpr;
pub use value::{FieldValue, JsonMap, MapKey, Record};
