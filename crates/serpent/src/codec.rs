// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive codec: scalars and containers.
//!
//! Text always leaves as a UTF-8 binary and binaries always come back as
//! text. Booleans and nil travel as the atoms `true`, `false` and `nil`.
//! Containers keep their kind in both directions. Nothing here consults the
//! struct registry; tagged mappings decode as plain maps.

use crate::adapter;
use crate::error::Result;
use crate::term::{Atom, Term, TermMap};
use crate::value::{Value, ValueMap};
use std::collections::BTreeMap;

const TRUE: &str = "true";
const FALSE: &str = "false";
const NIL: &str = "nil";

/// Encode a local value.
pub fn encode_value(value: &Value) -> Result<Term> {
    Ok(match value {
        Value::Nil => Term::atom(NIL),
        Value::Bool(true) => Term::atom(TRUE),
        Value::Bool(false) => Term::atom(FALSE),
        Value::Int(v) => Term::Integer(*v),
        Value::Float(v) => Term::Float(*v),
        Value::Str(s) => Term::Binary(s.as_bytes().to_vec()),
        Value::Bytes(b) => Term::Binary(b.clone()),
        Value::Atom(a) => Term::Atom(a.clone()),
        Value::List(items) => Term::List(encode_items(items)?),
        Value::Tuple(items) => Term::Tuple(encode_items(items)?),
        Value::Set(items) => Term::Set(items.iter().map(encode_value).collect::<Result<_>>()?),
        Value::Map(map) => Term::Map(encode_map(map)?),
        Value::Record(record) => adapter::to_term(record)?,
        Value::Object(object) => encode_fields(&object.fields)?,
        Value::Encoded(term) => term.clone(),
    })
}

fn encode_items(items: &[Value]) -> Result<Vec<Term>> {
    items.iter().map(encode_value).collect()
}

fn encode_map(map: &ValueMap) -> Result<TermMap> {
    map.iter()
        .map(|(k, v)| -> Result<(Term, Term)> { Ok((encode_value(k)?, encode_value(v)?)) })
        .collect()
}

/// Encode a field-map as a plain mapping; field names become binaries.
///
/// An empty field-map yields an empty mapping.
pub fn encode_fields(fields: &BTreeMap<String, Value>) -> Result<Term> {
    let map = fields
        .iter()
        .map(|(k, v)| -> Result<(Term, Term)> {
            Ok((Term::Binary(k.as_bytes().to_vec()), encode_value(v)?))
        })
        .collect::<Result<TermMap>>()?;
    Ok(Term::Map(map))
}

/// Decode a term without resolving tagged mappings.
pub fn decode_term(term: &Term) -> Result<Value> {
    Ok(match term {
        Term::Atom(a) => decode_atom(a),
        Term::Integer(v) => Value::Int(*v),
        Term::Float(v) => Value::Float(*v),
        Term::Binary(bytes) => Value::Str(decode_text(bytes)?),
        Term::Text(s) => Value::Str(s.clone()),
        Term::List(items) => Value::List(decode_items(items)?),
        Term::Tuple(items) => Value::Tuple(decode_items(items)?),
        Term::Set(items) => Value::Set(items.iter().map(decode_term).collect::<Result<_>>()?),
        Term::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| -> Result<(Value, Value)> { Ok((decode_term(k)?, decode_term(v)?)) })
                .collect::<Result<_>>()?,
        ),
    })
}

fn decode_items(items: &[Term]) -> Result<Vec<Value>> {
    items.iter().map(decode_term).collect()
}

/// Map the well-known atoms back to their local scalars.
pub fn decode_atom(atom: &Atom) -> Value {
    match atom.as_str() {
        TRUE => Value::Bool(true),
        FALSE => Value::Bool(false),
        NIL => Value::Nil,
        _ => Value::Atom(atom.clone()),
    }
}

/// UTF-8 decode a binary.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8(bytes.to_vec())?)
}
