// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed records.
//!
//! A [`RecordType`] describes a named local type: its tag (the value that
//! goes into the `__struct__` slot on the wire) and its declared fields with
//! their defaults. A [`Record`] is an instance of such a type. The field store
//! is open: keys that the type does not declare are still accepted so that a
//! newer peer can send fields this side does not know about yet.
//!
//! # Example
//!
//! ```rust
//! use serpent::record::{Record, RecordTypeBuilder};
//! use serpent::Value;
//! use std::sync::Arc;
//!
//! let pair = Arc::new(
//!     RecordTypeBuilder::new("Pair")
//!         .tag("Elixir.Pair")
//!         .string_field("left")
//!         .field("right", 0i64)
//!         .build(),
//! );
//!
//! let mut record = Record::blank(&pair);
//! record.set("left", "a");
//! assert_eq!(record.get("left"), Some(&Value::from("a")));
//! assert_eq!(record.get("right"), Some(&Value::Int(0)));
//! ```

mod builder;

pub use builder::RecordTypeBuilder;

use crate::term::{Atom, STRUCT_KEY};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A declared field and its default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub default: Value,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }
}

/// Runtime description of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Local type name.
    pub name: String,
    /// Discriminant value; `None` for types that cannot be encoded.
    pub tag: Option<Atom>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDef>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, tag: Option<Atom>) -> Self {
        Self {
            name: name.into(),
            tag,
            fields: Vec::new(),
        }
    }

    /// Find a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// An instance of a [`RecordType`].
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    tag: Option<Atom>,
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with every declared field at its default and the tag
    /// taken from the type.
    pub fn blank(record_type: &Arc<RecordType>) -> Self {
        let values = record_type
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();
        Self {
            record_type: record_type.clone(),
            tag: record_type.tag.clone(),
            values,
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn type_name(&self) -> &str {
        &self.record_type.name
    }

    /// The discriminant, if any.
    pub fn tag(&self) -> Option<&Atom> {
        self.tag.as_ref()
    }

    pub fn set_tag(&mut self, tag: Atom) {
        self.tag = Some(tag);
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a field, declared or not.
    ///
    /// Setting `__struct__` with an atom replaces the tag instead of storing a
    /// field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if name == STRUCT_KEY {
            if let Value::Atom(tag) = value {
                self.tag = Some(tag);
            } else {
                log::warn!(
                    "[serpent] ignoring non-atom {} on record {}",
                    STRUCT_KEY,
                    self.record_type.name
                );
            }
            return;
        }
        if !self.record_type.declares(&name) {
            log::debug!(
                "[serpent] record {} accepts undeclared field '{}'",
                self.record_type.name,
                name
            );
        }
        self.values.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.record_type
            .fields
            .iter()
            .filter_map(|f| self.values.get(&f.name).map(|v| (f.name.as_str(), v)))
    }

    /// Fields present on this instance that the type does not declare.
    pub fn extra_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .filter(|(k, _)| !self.record_type.declares(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Every stored field, declared or not.
    pub fn all_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.record_type
            .name
            .cmp(&other.record_type.name)
            .then_with(|| self.tag.cmp(&other.tag))
            .then_with(|| self.values.cmp(&other.values))
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Record {}
