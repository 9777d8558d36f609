// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Marshaling facade and the process-wide active codec.
//!
//! A bridge builds one [`Marshaler`] at start-up (with its registry fully
//! populated), calls [`install`] once and from then on goes through
//! [`encode`] / [`decode`]. Installing again replaces the active codec; codecs
//! never stack.
//!
//! # Design
//!
//! - **Immutable registry**: shared as `Arc<StructRegistry>`, never mutated
//!   after install, so concurrent decodes need no lock.
//! - **Atomic swap**: the active slot is an `ArcSwapOption`; readers take a
//!   snapshot without locking and a replacement never disturbs calls already
//!   in flight.

use crate::adapter;
use crate::codec;
use crate::error::{MarshalError, Result};
use crate::registry::StructRegistry;
use crate::term::Term;
use crate::value::{Object, Value};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

static ACTIVE: ArcSwapOption<Marshaler> = ArcSwapOption::const_empty();

/// Encoder/decoder pair as seen by a bridge.
pub trait TermCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Term>;
    fn decode(&self, term: &Term) -> Result<Value>;
}

/// Dispatches values and terms to the codec and the record adapter.
#[derive(Debug, Clone, Default)]
pub struct Marshaler {
    registry: Option<Arc<StructRegistry>>,
}

impl Marshaler {
    /// A marshaler without registry: tagged mappings decode as plain maps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_registry(registry: Arc<StructRegistry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn registry(&self) -> Option<&Arc<StructRegistry>> {
        self.registry.as_ref()
    }

    /// Encode a local value.
    ///
    /// Records become tagged mappings. Objects whose class is bound in the
    /// registry are promoted to records first; other objects are flattened to
    /// their field-map. Containers are walked so that nested records and
    /// objects get the same treatment.
    pub fn encode(&self, value: &Value) -> Result<Term> {
        Ok(match value {
            Value::Record(record) => adapter::to_term(record)?,
            Value::Object(object) => self.encode_object(object)?,
            Value::List(items) => Term::List(self.encode_all(items)?),
            Value::Tuple(items) => Term::Tuple(self.encode_all(items)?),
            Value::Set(items) => Term::Set(
                items
                    .iter()
                    .map(|v| self.encode(v))
                    .collect::<Result<_>>()?,
            ),
            Value::Map(map) => Term::Map(
                map.iter()
                    .map(|(k, v)| -> Result<(Term, Term)> { Ok((self.encode(k)?, self.encode(v)?)) })
                    .collect::<Result<_>>()?,
            ),
            other => codec::encode_value(other)?,
        })
    }

    fn encode_all(&self, items: &[Value]) -> Result<Vec<Term>> {
        items.iter().map(|v| self.encode(v)).collect()
    }

    fn encode_object(&self, object: &Object) -> Result<Term> {
        let bound = self
            .registry
            .as_deref()
            .and_then(|registry| registry.class_tag(&object.class).map(|tag| (registry, tag)));

        let Some((registry, tag)) = bound else {
            return codec::encode_fields(&object.fields);
        };

        log::trace!("[serpent] promoting {} object to {}", object.class, tag);
        let factory = registry.resolve(tag)?;
        let mut record = adapter::from_local(
            factory.as_ref(),
            object.fields.iter().map(|(k, v)| (k.as_str(), v)),
        )?;
        record.set_tag(tag.clone());
        adapter::to_term(&record)
    }

    /// Decode a term.
    ///
    /// With a registry, tagged mappings are resolved to records at any depth
    /// and an unresolvable tag fails the call. Without one, everything
    /// decodes through the primitive codec.
    pub fn decode(&self, term: &Term) -> Result<Value> {
        adapter::decode_value(term, self.registry.as_deref())
    }
}

impl TermCodec for Marshaler {
    fn encode(&self, value: &Value) -> Result<Term> {
        Marshaler::encode(self, value)
    }

    fn decode(&self, term: &Term) -> Result<Value> {
        Marshaler::decode(self, term)
    }
}

/// Make `marshaler` the active codec, returning the one it replaces.
pub fn install(marshaler: Arc<Marshaler>) -> Option<Arc<Marshaler>> {
    let previous = ACTIVE.swap(Some(marshaler));
    if previous.is_some() {
        log::info!("[serpent] active codec replaced");
    } else {
        log::debug!("[serpent] active codec installed");
    }
    previous
}

/// Current active codec, if any.
pub fn active() -> Option<Arc<Marshaler>> {
    ACTIVE.load_full()
}

/// Remove the active codec.
pub fn uninstall() -> Option<Arc<Marshaler>> {
    ACTIVE.swap(None)
}

/// Encode with the active codec.
pub fn encode(value: &Value) -> Result<Term> {
    let marshaler = active().ok_or(MarshalError::NoActiveCodec)?;
    marshaler.encode(value)
}

/// Decode with the active codec.
pub fn decode(term: &Term) -> Result<Value> {
    let marshaler = active().ok_or(MarshalError::NoActiveCodec)?;
    marshaler.decode(term)
}
