// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed value adapter: records to and from tagged mappings.
//!
//! # Wire shape
//!
//! A record `Pair { left: "a", right: 3 }` tagged `Elixir.Pair` travels as
//!
//! ```text
//! #{'__struct__' => 'Elixir.Pair', left => <<"a">>, right => 3}
//! ```
//!
//! Field names are atoms, the tag sits in the reserved `__struct__` slot and
//! field values go through the primitive codec.
//!
//! # Decode rules
//!
//! - The `__struct__` entry is never assigned as a field; the tag is set on
//!   the blank record before any field is populated.
//! - A field whose blank default is truthy keeps that default when the
//!   incoming value is the textual nil marker.
//! - With a registry, tagged mappings are resolved at any depth (directly in
//!   a field or inside lists, tuples, sets and maps); an unknown tag aborts
//!   the decode. Without a registry nothing is resolved.
//! - Keys the record type does not declare are still assigned.

use crate::codec;
use crate::error::{MarshalError, Result};
use crate::record::Record;
use crate::registry::{RecordFactory, StructRegistry};
use crate::term::{map_tag, Atom, Term, TermMap, STRUCT_KEY};
use crate::value::{Value, ValueMap};

/// Encode a record as a tagged mapping.
///
/// Fails with [`MarshalError::Construction`] if the record has no tag.
pub fn to_term(record: &Record) -> Result<Term> {
    let tag = record.tag().ok_or_else(|| {
        MarshalError::Construction(format!(
            "record {} has no {} tag",
            record.type_name(),
            STRUCT_KEY
        ))
    })?;

    let mut map = TermMap::new();
    map.insert(Term::Atom(Atom::struct_key()), Term::Atom(tag.clone()));
    for (name, value) in record.all_fields() {
        let encoded = match value {
            Value::Record(nested) => to_term(nested)?,
            other => codec::encode_value(other)?,
        };
        map.insert(Term::atom(name), encoded);
    }
    Ok(Term::Map(map))
}

/// Decode a tagged mapping into a record.
///
/// `tag` overrides the tag embedded in `map`. The registry resolves the tag
/// and any nested tagged mapping; without one the tag cannot be resolved and
/// the call fails with [`MarshalError::UnknownTag`].
pub fn from_term(
    tag: Option<&Atom>,
    map: &TermMap,
    registry: Option<&StructRegistry>,
) -> Result<Record> {
    let tag = tag
        .or_else(|| map_tag(map))
        .ok_or_else(|| {
            MarshalError::Construction(format!("mapping carries no {} atom", STRUCT_KEY))
        })?
        .clone();
    let factory = match registry {
        Some(registry) => registry.resolve(&tag)?,
        None => return Err(MarshalError::UnknownTag(tag)),
    };
    from_term_with(factory.as_ref(), Some(&tag), map, registry)
}

/// Decode a mapping against a known factory.
///
/// The tag is taken from `tag`, then from the mapping, then from the blank
/// record itself.
pub fn from_term_with(
    factory: &dyn RecordFactory,
    tag: Option<&Atom>,
    map: &TermMap,
    registry: Option<&StructRegistry>,
) -> Result<Record> {
    let mut record = factory.blank();
    if let Some(tag) = tag.or_else(|| map_tag(map)) {
        record.set_tag(tag.clone());
    }
    log::trace!(
        "[serpent] decoding {} ({} entries) into {}",
        record.tag().map_or("<untagged>", Atom::as_str),
        map.len(),
        record.type_name()
    );

    for (key, term) in map {
        if matches!(key, Term::Atom(a) if a.is_struct_key()) {
            continue;
        }
        let name = decode_key(key)?;
        if name == STRUCT_KEY {
            continue;
        }
        if term.is_nil_marker() && record.get(&name).is_some_and(Value::is_truthy) {
            log::trace!("[serpent] keeping default of {}.{} over nil", record.type_name(), name);
            continue;
        }
        let value = match registry {
            Some(registry) => decode_value(term, Some(registry))?,
            None => codec::decode_term(term)?,
        };
        record.set(name, value);
    }
    Ok(record)
}

/// Populate a record from local fields (mixed mode, no registry).
///
/// Used to promote an untyped object into a typed record before encoding:
/// bytes become text, nested records and objects are encoded in place and
/// carried as [`Value::Encoded`], everything else is kept as is.
pub fn from_local<'a, I>(factory: &dyn RecordFactory, fields: I) -> Result<Record>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut record = factory.blank();
    for (name, value) in fields {
        if name == STRUCT_KEY {
            continue;
        }
        if is_local_nil_marker(value) && record.get(name).is_some_and(Value::is_truthy) {
            continue;
        }
        let value = match value {
            Value::Bytes(bytes) => Value::Str(codec::decode_text(bytes)?),
            Value::Record(nested) => Value::Encoded(to_term(nested)?),
            Value::Object(object) => Value::Encoded(codec::encode_fields(&object.fields)?),
            other => other.clone(),
        };
        record.set(name, value);
    }
    Ok(record)
}

// Only raw bytes count; a local string "nil" is a real value.
fn is_local_nil_marker(value: &Value) -> bool {
    matches!(value, Value::Bytes(b) if b == crate::term::NIL_MARKER.as_bytes())
}

/// Decode a term, resolving tagged mappings through `registry` at any depth.
///
/// Without a registry this is the plain primitive decode.
pub fn decode_value(term: &Term, registry: Option<&StructRegistry>) -> Result<Value> {
    let Some(registry) = registry else {
        return codec::decode_term(term);
    };
    Ok(match term {
        Term::Map(map) => match map_tag(map) {
            Some(tag) => Value::Record(from_term(Some(tag), map, Some(registry))?),
            None => Value::Map(
                map.iter()
                    .map(|(k, v)| -> Result<(Value, Value)> {
                        Ok((decode_value(k, Some(registry))?, decode_value(v, Some(registry))?))
                    })
                    .collect::<Result<ValueMap>>()?,
            ),
        },
        Term::List(items) => Value::List(decode_all(items, registry)?),
        Term::Tuple(items) => Value::Tuple(decode_all(items, registry)?),
        Term::Set(items) => Value::Set(
            items
                .iter()
                .map(|t| decode_value(t, Some(registry)))
                .collect::<Result<_>>()?,
        ),
        scalar => codec::decode_term(scalar)?,
    })
}

fn decode_all(items: &[Term], registry: &StructRegistry) -> Result<Vec<Value>> {
    items.iter().map(|t| decode_value(t, Some(registry))).collect()
}

/// Field name from a mapping key.
fn decode_key(key: &Term) -> Result<String> {
    match key {
        Term::Atom(a) => Ok(a.as_str().to_string()),
        Term::Text(s) => Ok(s.clone()),
        Term::Binary(bytes) => String::from_utf8(bytes.clone())
            .map_err(|e| MarshalError::KeyDecode(format!("binary key is not UTF-8: {}", e))),
        other => Err(MarshalError::KeyDecode(format!("unsupported key {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordType, RecordTypeBuilder};
    use crate::registry::BlankFactory;
    use crate::value::Object;
    use std::sync::Arc;

    fn pair_type(right_default: i64) -> Arc<RecordType> {
        Arc::new(
            RecordTypeBuilder::new("Pair")
                .tag("Pair")
                .nil_field("left")
                .field("right", right_default)
                .build(),
        )
    }

    fn registry_with(types: &[Arc<RecordType>]) -> StructRegistry {
        let mut registry = StructRegistry::new();
        for t in types {
            registry.register_type(t.clone()).expect("register");
        }
        registry
    }

    fn tagged(tag: &str, entries: Vec<(&str, Term)>) -> TermMap {
        let mut map = TermMap::new();
        map.insert(Term::Atom(Atom::struct_key()), Term::atom(tag));
        for (k, v) in entries {
            map.insert(Term::atom(k), v);
        }
        map
    }

    #[test]
    fn test_to_term_pair() {
        let record = Record::blank(&pair_type(0)).with("left", "a").with("right", 3i64);
        let term = to_term(&record).expect("encode");

        let expected = tagged("Pair", vec![("left", Term::binary("a")), ("right", Term::Integer(3))]);
        assert_eq!(term, Term::Map(expected));
    }

    #[test]
    fn test_to_term_requires_tag() {
        let untagged = Arc::new(RecordTypeBuilder::new("Loose").field("x", 1i64).build());
        let err = to_term(&Record::blank(&untagged));
        assert!(matches!(err, Err(MarshalError::Construction(_))));
    }

    #[test]
    fn test_pair_round_trip() {
        let pair = pair_type(0);
        let registry = registry_with(&[pair.clone()]);
        let record = Record::blank(&pair).with("left", "a").with("right", 3i64);

        let term = to_term(&record).expect("encode");
        let decoded = from_term(None, term.as_map().expect("map"), Some(&registry)).expect("decode");
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_nil_keeps_truthy_default() {
        let registry = registry_with(&[pair_type(5)]);
        let map = tagged("Pair", vec![("left", Term::binary("x")), ("right", Term::binary("nil"))]);

        let record = from_term(None, &map, Some(&registry)).expect("decode");
        assert_eq!(record.get("left"), Some(&Value::from("x")));
        assert_eq!(record.get("right"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_nil_overwrites_falsy_default() {
        let registry = registry_with(&[pair_type(0)]);
        let map = tagged("Pair", vec![("left", Term::binary("x")), ("right", Term::binary("nil"))]);

        let record = from_term(None, &map, Some(&registry)).expect("decode");
        assert_eq!(record.get("right"), Some(&Value::from("nil")));
    }

    #[test]
    fn test_real_value_overwrites_default() {
        let registry = registry_with(&[pair_type(5)]);
        let map = tagged("Pair", vec![("right", Term::Integer(8))]);

        let record = from_term(None, &map, Some(&registry)).expect("decode");
        assert_eq!(record.get("right"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let registry = registry_with(&[pair_type(0)]);
        let map = tagged("Elixir.Nope", vec![("left", Term::binary("x"))]);
        assert_eq!(
            from_term(None, &map, Some(&registry)).err(),
            Some(MarshalError::UnknownTag(Atom::new("Elixir.Nope")))
        );
    }

    #[test]
    fn test_unknown_nested_tag_aborts_whole_decode() {
        let registry = registry_with(&[pair_type(0)]);
        let inner = tagged("Elixir.Nope", vec![]);
        let map = tagged("Pair", vec![("left", Term::List(vec![Term::Map(inner)]))]);
        assert!(matches!(
            from_term(None, &map, Some(&registry)),
            Err(MarshalError::UnknownTag(_))
        ));
    }

    #[test]
    fn test_explicit_tag_overrides_embedded() {
        let registry = registry_with(&[pair_type(0)]);
        let mut map = TermMap::new();
        map.insert(Term::atom("left"), Term::binary("x"));

        let record = from_term(Some(&Atom::new("Pair")), &map, Some(&registry)).expect("decode");
        assert_eq!(record.tag().map(Atom::as_str), Some("Pair"));
    }

    #[test]
    fn test_missing_tag_is_construction_error() {
        let registry = registry_with(&[pair_type(0)]);
        let mut map = TermMap::new();
        map.insert(Term::atom("left"), Term::binary("x"));
        assert!(matches!(
            from_term(None, &map, Some(&registry)),
            Err(MarshalError::Construction(_))
        ));
    }

    #[test]
    fn test_without_registry_tag_cannot_resolve() {
        let map = tagged("Pair", vec![]);
        assert!(matches!(from_term(None, &map, None), Err(MarshalError::UnknownTag(_))));
    }

    #[test]
    fn test_registry_optional_leaves_nested_plain() {
        let inner = tagged("Pair", vec![("left", Term::binary("deep"))]);
        let map = tagged("Pair", vec![("left", Term::Map(inner))]);

        let record = from_term_with(&BlankFactory(pair_type(0)), None, &map, None).expect("decode");
        let left = record.get("left").and_then(Value::as_map).expect("plain map");
        assert_eq!(left.get(&Value::Atom(Atom::new("left"))), Some(&Value::from("deep")));
    }

    #[test]
    fn test_binary_keys_and_undeclared_fields() {
        let registry = registry_with(&[pair_type(0)]);
        let mut map = tagged("Pair", vec![]);
        map.insert(Term::binary("left"), Term::binary("via binary key"));
        map.insert(Term::binary("__struct__"), Term::binary("ignored"));
        map.insert(Term::atom("colour"), Term::binary("green"));

        let record = from_term(None, &map, Some(&registry)).expect("decode");
        assert_eq!(record.get("left"), Some(&Value::from("via binary key")));
        assert_eq!(record.get("colour"), Some(&Value::from("green")));
        assert_eq!(record.extra_fields().count(), 1);
        assert_eq!(record.tag().map(Atom::as_str), Some("Pair"));
    }

    #[test]
    fn test_bad_keys() {
        let registry = registry_with(&[pair_type(0)]);

        let mut map = tagged("Pair", vec![]);
        map.insert(Term::Integer(1), Term::binary("x"));
        assert!(matches!(
            from_term(None, &map, Some(&registry)),
            Err(MarshalError::KeyDecode(_))
        ));

        let mut map = tagged("Pair", vec![]);
        map.insert(Term::Binary(vec![0xc3, 0x28]), Term::binary("x"));
        assert!(matches!(
            from_term(None, &map, Some(&registry)),
            Err(MarshalError::KeyDecode(_))
        ));
    }

    #[test]
    fn test_malformed_field_binary() {
        let registry = registry_with(&[pair_type(0)]);
        let map = tagged("Pair", vec![("left", Term::Binary(vec![0xff]))]);
        assert!(matches!(
            from_term(None, &map, Some(&registry)),
            Err(MarshalError::Decode(_))
        ));
    }

    #[test]
    fn test_from_local_promotes_object_fields() {
        let test_type = Arc::new(
            RecordTypeBuilder::new("TestStruct")
                .tag("Elixir.VenomousTest.TestStruct")
                .string_field("test")
                .list_field("snake")
                .build(),
        );
        let inner = Record::blank(&pair_type(0)).with("left", "l");
        let fields = [
            ("test", Value::Bytes(b"t".to_vec())),
            ("snake", Value::from(vec!["s"])),
            ("pair", Value::Record(inner.clone())),
            ("plain", Value::Object(Object::new("Plain").with("k", 1i64))),
            ("__struct__", Value::from("ignored")),
        ];

        let record = from_local(
            &BlankFactory(test_type),
            fields.iter().map(|(k, v)| (*k, v)),
        )
        .expect("promote");

        assert_eq!(record.get("test"), Some(&Value::from("t")));
        assert_eq!(record.get("snake"), Some(&Value::from(vec!["s"])));
        assert_eq!(
            record.get("pair"),
            Some(&Value::Encoded(to_term(&inner).expect("inner")))
        );
        assert!(matches!(record.get("plain"), Some(Value::Encoded(Term::Map(_)))));
        assert_eq!(record.tag().map(Atom::as_str), Some("Elixir.VenomousTest.TestStruct"));
    }

    #[test]
    fn test_from_local_nil_marker() {
        let fields = [("right", Value::Bytes(b"nil".to_vec()))];
        let record = from_local(&BlankFactory(pair_type(4)), fields.iter().map(|(k, v)| (*k, v)))
            .expect("promote");
        assert_eq!(record.get("right"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_from_local_keeps_nil_string() {
        let with_default = Arc::new(
            RecordTypeBuilder::new("Pair")
                .tag("Pair")
                .field("left", "dflt")
                .build(),
        );
        let fields = [("left", Value::from("nil"))];
        let record = from_local(&BlankFactory(with_default), fields.iter().map(|(k, v)| (*k, v)))
            .expect("promote");
        assert_eq!(record.get("left"), Some(&Value::from("nil")));

        let term = to_term(&record).expect("encode");
        let map = term.as_map().expect("map");
        assert_eq!(map.get(&Term::atom("left")), Some(&Term::binary("nil")));
    }
}
