//! Errors produced while resolving, encoding and decoding records.

use core::fmt;

use smallvec::SmallVec;

use crate::kind::WireKind;
use crate::wire::WireType;

/// A record type's declarations cannot be turned into a [`Codec`].
///
/// Schema errors are fatal for the type: the same declarations will fail the
/// same way on every attempt.
///
/// [`Codec`]: crate::codec::Codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field '{field}' of '{record}': {value_type} cannot be encoded as {kind}")]
    UnsupportedFieldType {
        record: &'static str,
        field: &'static str,
        value_type: &'static str,
        kind: WireKind,
    },
    #[error("field '{field}' of '{record}': invalid field number {number}")]
    InvalidFieldNumber {
        record: &'static str,
        field: &'static str,
        number: u32,
    },
    #[error("duplicate field number {number} in '{record}': '{first}' and '{second}'")]
    DuplicateFieldNumber {
        record: &'static str,
        number: u32,
        first: &'static str,
        second: &'static str,
    },
    #[error("recursive record type: {path}")]
    RecursiveType { path: String },
}

/// Failures of the encode passes.
///
/// The size and write passes mirror each other, so none of these are reachable
/// through a [`Codec`] unless that invariant is broken.
///
/// [`Codec`]: crate::codec::Codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("output buffer too small: need {needed} bytes, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },
    #[error("encoded {written} bytes but the computed size was {expected}")]
    SizeMismatch { expected: usize, written: usize },
    #[error("no cached size for an instance of '{record}'")]
    MissingSize { record: &'static str },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("invalid key: '{reason}'")]
    InvalidKey { reason: &'static str },
    #[error("invalid leb128 varint")]
    InvalidVarInt,
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,
    #[error("deprecated group encoding not supported")]
    DeprecatedGroupEncoding,
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },
    #[error("invalid packed field length: {actual} is not a multiple of {expected_multiple}")]
    InvalidPackedLength { expected_multiple: u8, actual: usize },
    #[error("wire type mismatch: expected {expected:?}, found {actual:?}")]
    WireTypeMismatch { expected: WireType, actual: WireType },
}

/// Malformed input, along with where in the record tree it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    /// `(record, field number)` pairs, innermost first.
    path: SmallVec<[(&'static str, u32); 4]>,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Returns the `(record, field number)` pairs leading to the failure,
    /// outermost first.
    ///
    /// A field number of 0 means the failure was in reading a field key, so no
    /// field was known yet.
    pub fn path(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.path.iter().rev().copied()
    }

    #[cold]
    pub(crate) fn within(mut self, record: &'static str, number: u32) -> Self {
        self.path.push((record, number));
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    #[cold]
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError {
            kind,
            path: SmallVec::new(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.kind);
        }
        for (i, (record, number)) in self.path().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            match number {
                0 => f.write_str(record)?,
                _ => write!(f, "{record}#{number}")?,
            }
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Any failure surfaced by the [`Registry`](crate::registry::Registry) entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
