// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Marshaling errors.

use crate::term::Atom;
use thiserror::Error;

/// Errors raised while converting between terms and local values.
///
/// Every error aborts the whole encode/decode call that raised it; nothing is
/// retried or partially recovered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    /// A binary that should hold text is not valid UTF-8.
    #[error("invalid UTF-8 in binary: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// No factory is registered for the tag.
    #[error("unknown struct tag: {0}")]
    UnknownTag(Atom),

    /// A record could not be built or emitted (e.g. it has no tag).
    #[error("cannot construct record: {0}")]
    Construction(String),

    /// A mapping key is neither an atom, text, nor a UTF-8 binary.
    #[error("cannot decode mapping key: {0}")]
    KeyDecode(String),

    /// `encode`/`decode` was called before a codec was installed.
    #[error("no active codec installed")]
    NoActiveCodec,
}

/// Result type for marshaling operations.
pub type Result<T> = std::result::Result<T, MarshalError>;
