//! Numeric and boolean fields.

// Bit pattern conversions are intentional truncations and sign extensions.
#![allow(clippy::as_conversions)]

use crate::codec::packed::decode_packed_into;
use crate::codec::size_cache::{PackedLengths, SizeEntry};
use crate::descriptor::{FieldDescriptor, Storage};
use crate::error::{DecodeErrorKind, EncodeError};
use crate::kind::ScalarKind;
use crate::wire::{encoded_len_prefix_len, split_len_delimited, WireType, WireWriter};

/// Rust types stored in numeric and boolean fields.
///
/// Values cross the wire layer as a 64-bit pattern, see [`ScalarKind`].
pub(crate) trait ScalarValue: Copy + Default + PartialEq + Send + Sync + 'static {
    /// Kind used when the declaration does not override it.
    const DEFAULT_KIND: ScalarKind;
    /// Every kind this type may be encoded as.
    const KINDS: &'static [ScalarKind];

    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

const KINDS_32: &[ScalarKind] = &[
    ScalarKind::Int32,
    ScalarKind::UInt32,
    ScalarKind::Sint32,
    ScalarKind::Fixed32,
    ScalarKind::Sfixed32,
];

const KINDS_64: &[ScalarKind] = &[
    ScalarKind::Int64,
    ScalarKind::UInt64,
    ScalarKind::Sint64,
    ScalarKind::Fixed64,
    ScalarKind::Sfixed64,
];

impl ScalarValue for i32 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::Int32;
    const KINDS: &'static [ScalarKind] = KINDS_32;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        self as i64 as u64
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        bits as i32
    }
}

impl ScalarValue for u32 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::UInt32;
    const KINDS: &'static [ScalarKind] = KINDS_32;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        bits as u32
    }
}

impl ScalarValue for i64 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::Int64;
    const KINDS: &'static [ScalarKind] = KINDS_64;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        bits as i64
    }
}

impl ScalarValue for u64 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::UInt64;
    const KINDS: &'static [ScalarKind] = KINDS_64;

    #[inline(always)]
    fn to_bits(self) -> u64 {
        self
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        bits
    }
}

impl ScalarValue for f32 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::Float;
    const KINDS: &'static [ScalarKind] = &[ScalarKind::Float];

    #[inline(always)]
    fn to_bits(self) -> u64 {
        u64::from(f32::to_bits(self))
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl ScalarValue for f64 {
    const DEFAULT_KIND: ScalarKind = ScalarKind::Double;
    const KINDS: &'static [ScalarKind] = &[ScalarKind::Double];

    #[inline(always)]
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

impl ScalarValue for bool {
    const DEFAULT_KIND: ScalarKind = ScalarKind::Bool;
    const KINDS: &'static [ScalarKind] = &[ScalarKind::Bool];

    #[inline(always)]
    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    #[inline(always)]
    fn from_bits(bits: u64) -> Self {
        bits != 0
    }
}

#[inline]
fn value_len<V: ScalarValue>(kind: ScalarKind, value: V) -> usize {
    kind.encoded_len(value.to_bits())
}

/// Size of the concatenated values of a packed run, excluding key and length.
fn packed_payload_len<V: ScalarValue>(kind: ScalarKind, values: &[V]) -> usize {
    match kind.fixed_width() {
        Some(width) => values.len() * usize::from(width),
        None => values.iter().map(|value| value_len(kind, *value)).sum(),
    }
}

pub(crate) fn compute_size<M, V: ScalarValue>(
    field: &FieldDescriptor<M>,
    storage: &Storage<M, V>,
    kind: ScalarKind,
    msg: &M,
    packed: &mut PackedLengths,
    omit_defaults: bool,
) -> usize {
    match storage {
        Storage::Single(access) => {
            let value = *access.get(msg);
            if omit_defaults && value == V::default() {
                return 0;
            }
            field.key_len + value_len(kind, value)
        }
        Storage::Optional(access) => access
            .get(msg)
            .map_or(0, |value| field.key_len + value_len(kind, value)),
        Storage::Repeated(access) => {
            let values = access.get(msg);
            if values.is_empty() {
                0
            } else if field.packed {
                let payload = packed_payload_len(kind, values);
                packed.push((field.number, payload));
                field.key_len + encoded_len_prefix_len(payload) + payload
            } else {
                values
                    .iter()
                    .map(|value| field.key_len + value_len(kind, *value))
                    .sum()
            }
        }
    }
}

pub(crate) fn encode<M, V: ScalarValue>(
    field: &FieldDescriptor<M>,
    storage: &Storage<M, V>,
    kind: ScalarKind,
    msg: &M,
    entry: &SizeEntry,
    omit_defaults: bool,
    writer: &mut WireWriter<'_>,
) -> Result<(), EncodeError> {
    match storage {
        Storage::Single(access) => {
            let value = *access.get(msg);
            if omit_defaults && value == V::default() {
                return Ok(());
            }
            writer.put_key(kind.wire_type(), field.number)?;
            kind.encode(value.to_bits(), writer)
        }
        Storage::Optional(access) => match access.get(msg) {
            Some(value) => {
                writer.put_key(kind.wire_type(), field.number)?;
                kind.encode(value.to_bits(), writer)
            }
            None => Ok(()),
        },
        Storage::Repeated(access) => {
            let values = access.get(msg);
            if values.is_empty() {
                return Ok(());
            }
            if field.packed {
                writer.put_key(WireType::Len, field.number)?;
                writer.put_len(entry.packed_len(field.number)?)?;
                for value in values {
                    kind.encode(value.to_bits(), writer)?;
                }
            } else {
                for value in values {
                    writer.put_key(kind.wire_type(), field.number)?;
                    kind.encode(value.to_bits(), writer)?;
                }
            }
            Ok(())
        }
    }
}

/// Applies one occurrence of the field from the wire.
///
/// Returns `false`, without consuming anything, if `wire_type` cannot carry
/// this field.
pub(crate) fn merge<M, V: ScalarValue>(
    storage: &Storage<M, V>,
    kind: ScalarKind,
    wire_type: WireType,
    msg: &mut M,
    buf: &mut &[u8],
) -> Result<bool, DecodeErrorKind> {
    match storage {
        Storage::Single(access) if wire_type == kind.wire_type() => {
            *access.get_mut(msg) = V::from_bits(kind.decode(buf)?);
        }
        Storage::Optional(access) if wire_type == kind.wire_type() => {
            *access.get_mut(msg) = Some(V::from_bits(kind.decode(buf)?));
        }
        Storage::Repeated(access) if wire_type == kind.wire_type() => {
            access.get_mut(msg).push(V::from_bits(kind.decode(buf)?));
        }
        // Packed runs are accepted whether or not the field packs on encode.
        Storage::Repeated(access) if wire_type == WireType::Len => {
            let payload = split_len_delimited(buf)?;
            decode_packed_into(kind, payload, access.get_mut(msg))?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}
