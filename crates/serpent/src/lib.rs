// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serpent term marshaling
//!
//! Converts between typed local values and the tagged terms exchanged with a
//! BEAM runtime across a process boundary.
//!
//! # Features
//!
//! - **Primitive codec**: text leaves as UTF-8 binaries and comes back as
//!   text; containers keep their kind
//! - **Typed records**: records travel as mappings tagged through the
//!   reserved `__struct__` key
//! - **Struct registry**: tag to factory lookup, resolved at any nesting depth
//! - **Active codec**: one process-wide marshaler, swapped atomically
//!
//! # Quick Start
//!
//! ```rust
//! use serpent::record::RecordTypeBuilder;
//! use serpent::{Marshaler, Record, StructRegistry, Value};
//! use std::sync::Arc;
//!
//! let pair = Arc::new(
//!     RecordTypeBuilder::new("Pair")
//!         .tag("Elixir.Pair")
//!         .nil_field("left")
//!         .field("right", 0i64)
//!         .build(),
//! );
//!
//! let mut registry = StructRegistry::new();
//! registry.register_type(pair.clone()).unwrap();
//! serpent::install(Arc::new(Marshaler::with_registry(Arc::new(registry))));
//!
//! let record = Record::blank(&pair).with("left", "a").with("right", 3i64);
//! let term = serpent::encode(&Value::Record(record.clone())).unwrap();
//! assert_eq!(term.to_string(), "#{'__struct__' => 'Elixir.Pair', left => <<\"a\">>, right => 3}");
//!
//! assert_eq!(serpent::decode(&term).unwrap(), Value::Record(record));
//! ```

pub mod adapter;
pub mod codec;
pub mod error;
pub mod facade;
pub mod introspect;
pub mod record;
pub mod registry;
pub mod term;
pub mod value;


pub use error::{MarshalError, Result};
pub use facade::{active, decode, encode, install, uninstall, Marshaler, TermCodec};
pub use introspect::{Callable, CallableKind, IntrospectError, ModuleCatalog, Parameter, ParameterKind};
pub use record::{FieldDef, Record, RecordType, RecordTypeBuilder};
pub use registry::{BlankFactory, RecordFactory, StructRegistry};
pub use term::{Atom, Term, TermMap, NIL_MARKER, STRUCT_KEY};
pub use value::{Object, Value, ValueMap};
