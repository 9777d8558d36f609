// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for RecordType.

use super::{FieldDef, Record, RecordType};
use crate::term::Atom;
use crate::value::Value;
use std::sync::Arc;

/// Builder for creating RecordType instances.
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    tag: Option<Atom>,
    fields: Vec<FieldDef>,
}

impl RecordTypeBuilder {
    /// Create a new builder for an untagged type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            fields: Vec::new(),
        }
    }

    /// Set the discriminant.
    pub fn tag(mut self, tag: impl Into<Atom>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a field with a default value.
    ///
    /// Redeclaring a field replaces its default but keeps its position.
    pub fn field(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        let field = FieldDef::new(name, default);
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Add a field defaulting to nil.
    pub fn nil_field(self, name: impl Into<String>) -> Self {
        self.field(name, Value::Nil)
    }

    /// Add a string field (empty by default).
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, Value::Str(String::new()))
    }

    /// Add a list field (empty by default).
    pub fn list_field(self, name: impl Into<String>) -> Self {
        self.field(name, Value::List(Vec::new()))
    }

    /// Add a field holding a nested record, defaulting to a blank instance.
    pub fn record_field(self, name: impl Into<String>, record_type: &Arc<RecordType>) -> Self {
        self.field(name, Record::blank(record_type))
    }

    /// Build the RecordType.
    pub fn build(self) -> RecordType {
        RecordType {
            name: self.name,
            tag: self.tag,
            fields: self.fields,
        }
    }
}
