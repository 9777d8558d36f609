// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct registry: tag to record factory lookup.
//!
//! The registry is filled once during start-up and then shared read-only
//! (usually behind an `Arc`) by every decode call. It has no interior
//! mutability, so concurrent reads need no coordination.
//!
//! # Example
//!
//! ```rust
//! use serpent::record::RecordTypeBuilder;
//! use serpent::{Atom, StructRegistry};
//! use std::sync::Arc;
//!
//! let pair = Arc::new(RecordTypeBuilder::new("Pair").tag("Elixir.Pair").build());
//!
//! let mut registry = StructRegistry::new();
//! registry.register_type(pair).unwrap();
//!
//! assert!(registry.resolve(&Atom::new("Elixir.Pair")).is_ok());
//! assert!(registry.resolve(&Atom::new("Elixir.Nope")).is_err());
//! ```

use crate::error::{MarshalError, Result};
use crate::record::{Record, RecordType};
use crate::term::Atom;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces blank records of one type.
pub trait RecordFactory: Send + Sync {
    /// A fresh record with every field at its default.
    fn blank(&self) -> Record;
}

/// Factory producing blank instances of a [`RecordType`].
#[derive(Debug, Clone)]
pub struct BlankFactory(pub Arc<RecordType>);

impl RecordFactory for BlankFactory {
    fn blank(&self) -> Record {
        Record::blank(&self.0)
    }
}

impl<F> RecordFactory for F
where
    F: Fn() -> Record + Send + Sync,
{
    fn blank(&self) -> Record {
        self()
    }
}

/// Mapping from tag to record factory, plus class bindings for promoting
/// untyped objects.
#[derive(Default)]
pub struct StructRegistry {
    factories: HashMap<Atom, Arc<dyn RecordFactory>>,
    classes: HashMap<String, Atom>,
}

impl StructRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `tag`. The last registration for a tag wins.
    pub fn register(&mut self, tag: impl Into<Atom>, factory: impl RecordFactory + 'static) {
        let tag = tag.into();
        if self.factories.insert(tag.clone(), Arc::new(factory)).is_some() {
            log::warn!("[serpent] struct tag {} re-registered, previous factory replaced", tag);
        } else {
            log::debug!("[serpent] registered struct tag {}", tag);
        }
    }

    /// Register a record type under its own tag.
    pub fn register_type(&mut self, record_type: Arc<RecordType>) -> Result<()> {
        let tag = record_type.tag.clone().ok_or_else(|| {
            MarshalError::Construction(format!(
                "record type {} has no tag to register under",
                record_type.name
            ))
        })?;
        self.register(tag, BlankFactory(record_type));
        Ok(())
    }

    /// Look up the factory for `tag`.
    pub fn resolve(&self, tag: &Atom) -> Result<Arc<dyn RecordFactory>> {
        self.factories
            .get(tag)
            .cloned()
            .ok_or_else(|| MarshalError::UnknownTag(tag.clone()))
    }

    pub fn contains(&self, tag: &Atom) -> bool {
        self.factories.contains_key(tag)
    }

    /// Bind an untyped object class to a registered tag.
    ///
    /// Objects of a bound class are encoded as records of that tag.
    pub fn bind_class(&mut self, class: impl Into<String>, tag: impl Into<Atom>) {
        self.classes.insert(class.into(), tag.into());
    }

    /// Tag bound to `class`, if any.
    pub fn class_tag(&self, class: &str) -> Option<&Atom> {
        self.classes.get(class)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&Atom> {
        let mut tags: Vec<_> = self.factories.keys().collect();
        tags.sort();
        tags
    }

    /// Number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no tags are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for StructRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructRegistry")
            .field("tags", &self.tags())
            .field("classes", &self.classes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordTypeBuilder;
    use crate::value::Value;

    fn pair_type(tag: &str) -> Arc<RecordType> {
        Arc::new(
            RecordTypeBuilder::new("Pair")
                .tag(tag)
                .nil_field("left")
                .field("right", 0i64)
                .build(),
        )
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = StructRegistry::new();
        assert!(registry.is_empty());

        registry.register_type(pair_type("Elixir.Pair")).expect("register");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&Atom::new("Elixir.Pair")));

        let factory = registry.resolve(&Atom::new("Elixir.Pair")).expect("resolve");
        assert_eq!(factory.blank().type_name(), "Pair");
    }

    #[test]
    fn test_unknown_tag() {
        let registry = StructRegistry::new();
        let err = registry.resolve(&Atom::new("Elixir.Missing")).err();
        assert_eq!(err, Some(MarshalError::UnknownTag(Atom::new("Elixir.Missing"))));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = StructRegistry::new();
        registry.register("Elixir.Pair", BlankFactory(pair_type("Elixir.Pair")));
        registry.register("Elixir.Pair", || {
            Record::blank(&pair_type("Elixir.Pair")).with("right", 9i64)
        });

        assert_eq!(registry.len(), 1);
        let blank = registry.resolve(&Atom::new("Elixir.Pair")).expect("resolve").blank();
        assert_eq!(blank.get("right"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_register_untagged_type_fails() {
        let mut registry = StructRegistry::new();
        let untagged = Arc::new(RecordTypeBuilder::new("Loose").build());
        assert!(matches!(
            registry.register_type(untagged),
            Err(MarshalError::Construction(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_class_binding() {
        let mut registry = StructRegistry::new();
        registry.bind_class("Test", "Elixir.VenomousTest.TestStruct");
        assert_eq!(
            registry.class_tag("Test").map(Atom::as_str),
            Some("Elixir.VenomousTest.TestStruct")
        );
        assert!(registry.class_tag("Other").is_none());
    }

    #[test]
    fn test_tags_sorted() {
        let mut registry = StructRegistry::new();
        registry.register_type(pair_type("Elixir.B")).expect("b");
        registry.register_type(pair_type("Elixir.A")).expect("a");
        let tags: Vec<_> = registry.tags().into_iter().map(Atom::as_str).collect();
        assert_eq!(tags, vec!["Elixir.A", "Elixir.B"]);
    }
}
