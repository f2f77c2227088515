//! Field kinds and how each one maps onto the wire.

// Bit pattern conversions between integer widths are intentional truncations
// and sign extensions.
#![allow(clippy::as_conversions)]

use core::fmt;

use bytes::Buf;

use crate::error::{DecodeErrorKind, EncodeError};
use crate::leb128::{zigzag_decode_32, zigzag_decode_64, zigzag_encode_32, zigzag_encode_64};
use crate::leb128::LebCodec;
use crate::wire::{WireType, WireWriter};

/// The protobuf type a field is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Message,
}

impl WireKind {
    /// The [`WireType`] a single, unpacked value of this kind is framed with.
    pub fn wire_type(self) -> WireType {
        match self.scalar() {
            Some(scalar) => scalar.wire_type(),
            None => WireType::Len,
        }
    }

    /// Returns the [`ScalarKind`] for numeric and boolean kinds.
    pub fn scalar(self) -> Option<ScalarKind> {
        let scalar = match self {
            WireKind::Int32 => ScalarKind::Int32,
            WireKind::Int64 => ScalarKind::Int64,
            WireKind::UInt32 => ScalarKind::UInt32,
            WireKind::UInt64 => ScalarKind::UInt64,
            WireKind::Sint32 => ScalarKind::Sint32,
            WireKind::Sint64 => ScalarKind::Sint64,
            WireKind::Fixed32 => ScalarKind::Fixed32,
            WireKind::Fixed64 => ScalarKind::Fixed64,
            WireKind::Sfixed32 => ScalarKind::Sfixed32,
            WireKind::Sfixed64 => ScalarKind::Sfixed64,
            WireKind::Float => ScalarKind::Float,
            WireKind::Double => ScalarKind::Double,
            WireKind::Bool => ScalarKind::Bool,
            WireKind::String | WireKind::Bytes | WireKind::Message => return None,
        };
        Some(scalar)
    }

    /// Only numeric and boolean kinds may use the packed repeated encoding.
    pub fn is_packable(self) -> bool {
        self.scalar().is_some()
    }

    /// The name of this kind in a `.proto` file.
    pub fn name(self) -> &'static str {
        match self {
            WireKind::Int32 => "int32",
            WireKind::Int64 => "int64",
            WireKind::UInt32 => "uint32",
            WireKind::UInt64 => "uint64",
            WireKind::Sint32 => "sint32",
            WireKind::Sint64 => "sint64",
            WireKind::Fixed32 => "fixed32",
            WireKind::Fixed64 => "fixed64",
            WireKind::Sfixed32 => "sfixed32",
            WireKind::Sfixed64 => "sfixed64",
            WireKind::Float => "float",
            WireKind::Double => "double",
            WireKind::Bool => "bool",
            WireKind::String => "string",
            WireKind::Bytes => "bytes",
            WireKind::Message => "message",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The numeric and boolean subset of [`WireKind`].
///
/// Values travel through here as a 64-bit pattern: 32-bit kinds only look at
/// the low 32 bits when encoding, and decoding returns a pattern that the
/// target Rust type truncates back to its own width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    Bool,
}

impl ScalarKind {
    pub fn wire_kind(self) -> WireKind {
        match self {
            ScalarKind::Int32 => WireKind::Int32,
            ScalarKind::Int64 => WireKind::Int64,
            ScalarKind::UInt32 => WireKind::UInt32,
            ScalarKind::UInt64 => WireKind::UInt64,
            ScalarKind::Sint32 => WireKind::Sint32,
            ScalarKind::Sint64 => WireKind::Sint64,
            ScalarKind::Fixed32 => WireKind::Fixed32,
            ScalarKind::Fixed64 => WireKind::Fixed64,
            ScalarKind::Sfixed32 => WireKind::Sfixed32,
            ScalarKind::Sfixed64 => WireKind::Sfixed64,
            ScalarKind::Float => WireKind::Float,
            ScalarKind::Double => WireKind::Double,
            ScalarKind::Bool => WireKind::Bool,
        }
    }

    pub fn wire_type(self) -> WireType {
        match self {
            ScalarKind::Int32
            | ScalarKind::Int64
            | ScalarKind::UInt32
            | ScalarKind::UInt64
            | ScalarKind::Sint32
            | ScalarKind::Sint64
            | ScalarKind::Bool => WireType::Varint,
            ScalarKind::Fixed32 | ScalarKind::Sfixed32 | ScalarKind::Float => WireType::I32,
            ScalarKind::Fixed64 | ScalarKind::Sfixed64 | ScalarKind::Double => WireType::I64,
        }
    }

    /// Width in bytes of fixed-size kinds, `None` for varints.
    pub fn fixed_width(self) -> Option<u8> {
        match self.wire_type() {
            WireType::I32 => Some(4),
            WireType::I64 => Some(8),
            _ => None,
        }
    }

    /// The varint payload for `bits`, only meaningful for varint kinds.
    #[inline]
    fn varint(self, bits: u64) -> u64 {
        match self {
            // int32 is sign extended to 64 bits on the wire.
            ScalarKind::Int32 => bits as u32 as i32 as i64 as u64,
            ScalarKind::UInt32 => u64::from(bits as u32),
            ScalarKind::Sint32 => u64::from(zigzag_encode_32(bits as u32 as i32)),
            ScalarKind::Sint64 => zigzag_encode_64(bits as i64),
            ScalarKind::Bool => u64::from(bits != 0),
            _ => bits,
        }
    }

    /// Size in bytes of a single encoded value, excluding the key.
    #[inline]
    pub fn encoded_len(self, bits: u64) -> usize {
        match self.fixed_width() {
            Some(width) => usize::from(width),
            None => self.varint(bits).encoded_leb128_len(),
        }
    }

    /// Writes a single value, excluding the key.
    #[inline]
    pub fn encode(self, bits: u64, writer: &mut WireWriter<'_>) -> Result<(), EncodeError> {
        match self.wire_type() {
            WireType::I32 => writer.put_u32_le(bits as u32),
            WireType::I64 => writer.put_u64_le(bits),
            _ => writer.put_varint(self.varint(bits)),
        }
    }

    /// Reads a single value, returning its bit pattern.
    #[inline]
    pub fn decode<B: Buf>(self, buf: &mut B) -> Result<u64, DecodeErrorKind> {
        match self.wire_type() {
            WireType::I32 => {
                if buf.remaining() < 4 {
                    return Err(DecodeErrorKind::UnexpectedEndOfBuffer);
                }
                Ok(u64::from(buf.get_u32_le()))
            }
            WireType::I64 => {
                if buf.remaining() < 8 {
                    return Err(DecodeErrorKind::UnexpectedEndOfBuffer);
                }
                Ok(buf.get_u64_le())
            }
            _ => {
                let raw = u64::decode_leb128_buf(buf)?;
                Ok(match self {
                    ScalarKind::Sint32 => zigzag_decode_32(raw as u32) as i64 as u64,
                    ScalarKind::Sint64 => zigzag_decode_64(raw) as u64,
                    ScalarKind::Bool => u64::from(raw != 0),
                    _ => raw,
                })
            }
        }
    }
}

/// Whether a field holds one value or a sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Singular,
    Repeated,
}
