// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External term representation.
//!
//! A [`Term`] is what crosses the process boundary: the bridge parses it off
//! the wire and hands it to the decoder, and serializes whatever the encoder
//! produces. Terms carry a total order (modelled on the foreign runtime's term
//! order) so they can be used directly as map keys and set members.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Reserved key holding a record's tag inside a tagged mapping.
pub const STRUCT_KEY: &str = "__struct__";

/// Textual marker the foreign runtime uses for an absent value.
pub const NIL_MARKER: &str = "nil";

/// Map payload of [`Term::Map`].
pub type TermMap = BTreeMap<Term, Term>;

/// Symbolic name, distinct from text.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(Arc<str>);

impl Atom {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The `__struct__` discriminant key.
    pub fn struct_key() -> Self {
        Self::new(STRUCT_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_struct_key(&self) -> bool {
        &*self.0 == STRUCT_KEY
    }

    /// Whether the atom can be printed without quotes.
    fn is_bare(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bare() {
            f.write_str(&self.0)
        } else {
            write!(f, "'{}'", self.0.replace('\'', "\\'"))
        }
    }
}

impl From<&str> for Atom {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Atom {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// A term exchanged with the foreign runtime.
#[derive(Debug, Clone)]
pub enum Term {
    Atom(Atom),
    Integer(i64),
    Float(f64),
    /// Raw bytes; text always travels as UTF-8 binaries.
    Binary(Vec<u8>),
    /// Text the bridge already decoded on its side.
    Text(String),
    List(Vec<Term>),
    Tuple(Vec<Term>),
    Set(BTreeSet<Term>),
    /// Mapping; a tagged mapping when it holds the `__struct__` key.
    Map(TermMap),
}

impl Term {
    pub fn atom(name: impl AsRef<str>) -> Self {
        Self::Atom(Atom::new(name))
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Self::Atom(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            Self::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&TermMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Tag stored under `__struct__`, if this is a tagged mapping.
    ///
    /// A tag slot holding anything but an atom does not count as a tag.
    pub fn tag(&self) -> Option<&Atom> {
        self.as_map().and_then(map_tag)
    }

    pub fn is_tagged(&self) -> bool {
        self.tag().is_some()
    }

    /// Whether this is the textual nil marker (`"nil"` as binary or text).
    pub fn is_nil_marker(&self) -> bool {
        self.as_bytes() == Some(NIL_MARKER.as_bytes())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Integer(_) | Self::Float(_) => 0,
            Self::Atom(_) => 1,
            Self::Tuple(_) => 2,
            Self::Map(_) => 3,
            Self::List(_) => 4,
            Self::Set(_) => 5,
            Self::Binary(_) | Self::Text(_) => 6,
        }
    }
}

/// Tag of a term map, if present and an atom.
pub fn map_tag(map: &TermMap) -> Option<&Atom> {
    map.get(&Term::Atom(Atom::struct_key()))
        .and_then(Term::as_atom)
}

/// Numbers compare by value; on a tie the integer sorts first so that
/// ordering stays consistent with exact equality.
fn cmp_numbers(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Integer(x), Term::Integer(y)) => x.cmp(y),
        (Term::Float(x), Term::Float(y)) => x.total_cmp(y),
        (Term::Integer(x), Term::Float(y)) => (*x as f64).total_cmp(y).then(Ordering::Less),
        (Term::Float(x), Term::Integer(y)) => x.total_cmp(&(*y as f64)).then(Ordering::Greater),
        _ => Ordering::Equal,
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Self::Atom(a), Self::Atom(b)) => a.cmp(b),
            (Self::Tuple(a), Self::Tuple(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Map(a), Self::Map(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Binary(_) | Self::Text(_), Self::Binary(_) | Self::Text(_)) => {
                let (a, b) = (self.as_bytes().unwrap_or_default(), other.as_bytes().unwrap_or_default());
                // Same bytes: binary before text so that the two stay distinct.
                a.cmp(b).then_with(|| {
                    matches!(self, Self::Text(_)).cmp(&matches!(other, Self::Text(_)))
                })
            }
            _ => cmp_numbers(self, other),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl From<Atom> for Term {
    fn from(a: Atom) -> Self {
        Self::Atom(a)
    }
}

impl From<i64> for Term {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Term {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<Term>> for Term {
    fn from(v: Vec<Term>) -> Self {
        Self::List(v)
    }
}

impl From<TermMap> for Term {
    fn from(m: TermMap) -> Self {
        Self::Map(m)
    }
}

fn write_joined<'a, I, T>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a T>,
    T: fmt::Display + 'a,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(a) => write!(f, "{}", a),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) if !s.chars().any(char::is_control) => write!(f, "<<{:?}>>", s),
                _ => {
                    f.write_str("<<")?;
                    write_joined(f, bytes)?;
                    f.write_str(">>")
                }
            },
            Self::Text(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            Self::Set(items) => {
                f.write_str("#set{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            Self::Map(map) => {
                f.write_str("#{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} => {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}
