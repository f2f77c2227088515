//! LEB128 variable-length integer encoding/decoding, plus the zigzag
//! transforms used by the `sint32`/`sint64` kinds.

// Varint and zigzag math reinterprets integer widths.
#![allow(clippy::as_conversions)]

use bytes::{Buf, BufMut};

use crate::error::DecodeErrorKind;

/// Types that can be encoded as, and decoded from, a LEB128 varint.
pub trait LebCodec: Sized + Copy {
    const MAX_LEB_BYTES: usize;

    /// Decode a LEB128 varint from the front of `data`.
    ///
    /// Returns a tuple of the decoded value and the number of bytes read to
    /// decode said value.
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind>;

    /// Decode a LEB128 varint from `buf`, advancing it past the value.
    fn decode_leb128_buf<B: Buf>(buf: &mut B) -> Result<Self, DecodeErrorKind> {
        let chunk = buf.chunk();

        // Fast path: the varint is guaranteed to end within the current chunk.
        if chunk.len() >= Self::MAX_LEB_BYTES || chunk.len() == buf.remaining() {
            let (value, bytes_read) = Self::decode_leb128(chunk)?;
            buf.advance(bytes_read);
            return Ok(value);
        }

        // Slow path: the varint may straddle chunks, gather it byte by byte.
        let mut scratch = [0u8; 10];
        for i in 0..Self::MAX_LEB_BYTES {
            if !buf.has_remaining() {
                return Err(DecodeErrorKind::UnexpectedEndOfBuffer);
            }
            let byte = buf.get_u8();
            scratch[i] = byte;
            if byte < 0x80 {
                return Self::decode_leb128(&scratch[..=i]).map(|(value, _)| value);
            }
        }
        Err(DecodeErrorKind::InvalidVarInt)
    }

    /// Encode `self` as a LEB128 varint into the provided buffer, returning
    /// the number of bytes written.
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize;

    /// The number of bytes required to encode this integer.
    fn encoded_leb128_len(self) -> usize;
}

impl LebCodec for u64 {
    const MAX_LEB_BYTES: usize = 10;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let mut value = 0u64;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            // The tenth byte only has room for the top bit of a u64.
            if i == Self::MAX_LEB_BYTES - 1 && byte > 0x01 {
                return Err(DecodeErrorKind::InvalidVarInt);
            }
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte < 0x80 {
                return Ok((value, i + 1));
            }
        }

        if data.len() >= Self::MAX_LEB_BYTES {
            Err(DecodeErrorKind::InvalidVarInt)
        } else {
            Err(DecodeErrorKind::UnexpectedEndOfBuffer)
        }
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        let mut value = self;
        let mut written = 1;
        while value >= 0x80 {
            buf.put_u8((value as u8) | 0x80);
            value >>= 7;
            written += 1;
        }
        buf.put_u8(value as u8);
        written
    }

    /// LEB128 carries 7 bits per byte, so the length is
    /// `ceil(significant_bits / 7)` with a minimum of one byte.
    #[inline]
    fn encoded_leb128_len(self) -> usize {
        ((70 - self.leading_zeros()) / 7).max(1) as usize
    }
}

impl LebCodec for u32 {
    const MAX_LEB_BYTES: usize = 5;

    #[inline]
    fn decode_leb128(data: &[u8]) -> Result<(Self, usize), DecodeErrorKind> {
        let mut value = 0u32;
        for (i, &byte) in data.iter().take(Self::MAX_LEB_BYTES).enumerate() {
            // The fifth byte only has room for the top four bits of a u32.
            if i == Self::MAX_LEB_BYTES - 1 && byte > 0x0f {
                return Err(DecodeErrorKind::InvalidVarInt);
            }
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte < 0x80 {
                return Ok((value, i + 1));
            }
        }

        if data.len() >= Self::MAX_LEB_BYTES {
            Err(DecodeErrorKind::InvalidVarInt)
        } else {
            Err(DecodeErrorKind::UnexpectedEndOfBuffer)
        }
    }

    #[inline]
    fn encode_leb128<B: BufMut>(self, buf: &mut B) -> usize {
        u64::from(self).encode_leb128(buf)
    }

    #[inline]
    fn encoded_leb128_len(self) -> usize {
        ((38 - self.leading_zeros()) / 7).max(1) as usize
    }
}

#[inline(always)]
pub const fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline(always)]
pub const fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline(always)]
pub const fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline(always)]
pub const fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}
