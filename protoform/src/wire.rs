//! Low level framing: field keys, length prefixes and skipping.
//!
//! See <https://protobuf.dev/programming-guides/encoding> for the layout.

use core::num::NonZeroU32;

use bytes::{Buf, BufMut};

use crate::error::{DecodeErrorKind, EncodeError};
use crate::leb128::LebCodec;

/// Smallest usable field number.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Largest usable field number, 29 bits.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;
/// Field numbers reserved for the protobuf implementation itself.
pub const RESERVED_TAG_RANGE: core::ops::RangeInclusive<u32> = 19000..=19999;

/// Returns true if `number` may be used as a field number.
pub fn is_valid_field_number(number: u32) -> bool {
    (MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&number) && !RESERVED_TAG_RANGE.contains(&number)
}

/// A validated field key as read off the wire.
///
/// The low three bits carry the [`WireType`], the rest the field number.
/// Field number 0 is rejected, so the packed value is at least 8 and can live
/// in a `NonZeroU32`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ProtoKey(NonZeroU32);

impl ProtoKey {
    #[inline(always)]
    fn try_from_raw(raw_key: u64) -> Result<Self, DecodeErrorKind> {
        let raw_key = u32::try_from(raw_key).map_err(|_| DecodeErrorKind::InvalidKey {
            reason: "key does not fit in 32 bits",
        })?;

        WireType::from_low_bits(raw_key)?;

        let number = raw_key >> 3;
        if !(MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&number) {
            return Err(DecodeErrorKind::InvalidKey {
                reason: "field number out of range",
            });
        }

        NonZeroU32::new(raw_key).map(ProtoKey).ok_or(DecodeErrorKind::InvalidKey {
            reason: "field number out of range",
        })
    }

    #[inline(always)]
    pub fn wire_type(self) -> WireType {
        // Checked in `try_from_raw`.
        WireType::from_low_bits(self.0.get()).unwrap_or(WireType::Varint)
    }

    /// The field number.
    #[inline(always)]
    pub const fn tag(self) -> u32 {
        self.0.get() >> 3
    }

    #[inline(always)]
    pub fn into_parts(self) -> (WireType, u32) {
        (self.wire_type(), self.tag())
    }
}

impl core::fmt::Debug for ProtoKey {
    #[cold]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ProtoKey({}:{:?})", self.tag(), self.wire_type())
    }
}

/// Writes the key for field `tag` and returns the number of bytes written.
#[inline(always)]
pub fn encode_key<B: BufMut>(wire_type: WireType, tag: u32, buf: &mut B) -> usize {
    let key = (tag << 3) | u32::from(wire_type.into_val());
    key.encode_leb128(buf)
}

/// Bytes taken by the key of field `tag`, independent of the wire type.
#[inline(always)]
pub fn encoded_key_len(tag: u32) -> usize {
    (tag << 3).encoded_leb128_len()
}

/// Bytes taken by the varint prefix of a `len` byte payload.
#[inline(always)]
pub fn encoded_len_prefix_len(len: usize) -> usize {
    u64::try_from(len).map_or(10, |len| len.encoded_leb128_len())
}

/// Reads and validates the next field key.
#[inline]
pub fn decode_key<B: Buf>(buf: &mut B) -> Result<ProtoKey, DecodeErrorKind> {
    let raw = match buf.chunk().first() {
        // Field numbers up to 15 need a single byte.
        Some(&byte) if byte < 0x80 => {
            buf.advance(1);
            u64::from(byte)
        }
        _ => u64::decode_leb128_buf(buf)?,
    };
    ProtoKey::try_from_raw(raw)
}

/// Reads the varint length prefix of a `Len` payload.
#[inline(always)]
pub fn decode_len<B: Buf>(buf: &mut B) -> Result<usize, DecodeErrorKind> {
    if let Some(&byte) = buf.chunk().first().filter(|byte| **byte < 0x80) {
        buf.advance(1);
        return Ok(usize::from(byte));
    }
    let len = u64::decode_leb128_buf(buf)?;
    usize::try_from(len).map_err(|_| DecodeErrorKind::LengthOverflow { value: len })
}

/// Splits a length-delimited payload off the front of `buf`.
#[inline]
pub fn split_len_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeErrorKind> {
    let len = decode_len(buf)?;
    if buf.len() < len {
        return Err(DecodeErrorKind::UnexpectedEndOfBuffer);
    }
    let (payload, rest) = buf.split_at(len);
    *buf = rest;
    Ok(payload)
}

/// Advances `buf` past a payload of the given wire type without looking at it.
///
/// Groups cannot be skipped without tracking nesting, and are rejected.
#[inline]
pub fn skip_field<B: Buf>(wire_type: WireType, buf: &mut B) -> Result<(), DecodeErrorKind> {
    let width = match wire_type {
        WireType::Varint => return u64::decode_leb128_buf(buf).map(drop),
        WireType::I32 => 4,
        WireType::I64 => 8,
        WireType::Len => decode_len(buf)?,
        WireType::SGroup | WireType::EGroup => {
            return Err(DecodeErrorKind::DeprecatedGroupEncoding)
        }
    };

    if buf.remaining() < width {
        return Err(DecodeErrorKind::UnexpectedEndOfBuffer);
    }
    buf.advance(width);
    Ok(())
}

/// How the payload following a key is framed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// LEB128 varint: `int32`, `int64`, `uint32`, `uint64`, `sint32`,
    /// `sint64`, `bool`.
    Varint = 0,
    /// Eight little-endian bytes: `fixed64`, `sfixed64`, `double`.
    I64 = 1,
    /// Varint length, then that many bytes: `string`, `bytes`, nested
    /// records and packed runs.
    Len = 2,
    /// Deprecated group start.
    SGroup = 3,
    /// Deprecated group end.
    EGroup = 4,
    /// Four little-endian bytes: `fixed32`, `sfixed32`, `float`.
    I32 = 5,
}

impl WireType {
    #[inline(always)]
    fn from_low_bits(raw_key: u32) -> Result<Self, DecodeErrorKind> {
        // Masked to three bits, always fits.
        let value = u8::try_from(raw_key & 0b111).unwrap_or(u8::MAX);
        WireType::try_from(value)
    }

    #[inline(always)]
    #[allow(clippy::as_conversions)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeErrorKind;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, DecodeErrorKind> {
        Ok(match value {
            0 => WireType::Varint,
            1 => WireType::I64,
            2 => WireType::Len,
            3 => WireType::SGroup,
            4 => WireType::EGroup,
            5 => WireType::I32,
            _ => return Err(DecodeErrorKind::InvalidWireType { value }),
        })
    }
}

/// Bounds-checked writer over a pre-sized output buffer.
///
/// Encoding sizes the output exactly before writing, so running out of room
/// means the two passes disagree; that surfaces as
/// [`EncodeError::BufferOverflow`] rather than a panic.
pub struct WireWriter<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> WireWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        WireWriter { buf, written: 0 }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Number of bytes that can still be written.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    fn reserve(&self, needed: usize) -> Result<(), EncodeError> {
        if needed > self.buf.len() {
            return Err(EncodeError::BufferOverflow {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn put_key(&mut self, wire_type: WireType, tag: u32) -> Result<(), EncodeError> {
        self.reserve(encoded_key_len(tag))?;
        self.written += encode_key(wire_type, tag, &mut self.buf);
        Ok(())
    }

    #[inline]
    pub fn put_varint(&mut self, value: u64) -> Result<(), EncodeError> {
        self.reserve(value.encoded_leb128_len())?;
        self.written += value.encode_leb128(&mut self.buf);
        Ok(())
    }

    #[inline]
    pub fn put_len(&mut self, len: usize) -> Result<(), EncodeError> {
        let len = u64::try_from(len).map_err(|_| EncodeError::BufferOverflow {
            needed: len,
            remaining: self.buf.len(),
        })?;
        self.put_varint(len)
    }

    #[inline]
    pub fn put_u32_le(&mut self, value: u32) -> Result<(), EncodeError> {
        self.reserve(4)?;
        BufMut::put_u32_le(&mut self.buf, value);
        self.written += 4;
        Ok(())
    }

    #[inline]
    pub fn put_u64_le(&mut self, value: u64) -> Result<(), EncodeError> {
        self.reserve(8)?;
        BufMut::put_u64_le(&mut self.buf, value);
        self.written += 8;
        Ok(())
    }

    #[inline]
    pub fn put_slice(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.reserve(data.len())?;
        BufMut::put_slice(&mut self.buf, data);
        self.written += data.len();
        Ok(())
    }
}
