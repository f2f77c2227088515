//! `string` and `bytes` fields.

use crate::descriptor::{FieldDescriptor, Storage};
use crate::error::{DecodeErrorKind, EncodeError};
use crate::wire::{encoded_len_prefix_len, split_len_delimited, WireType, WireWriter};

/// Rust types stored in length-delimited byte fields.
pub(crate) trait DelimitedValue: Default + Send + Sync + 'static {
    fn as_bytes(&self) -> &[u8];
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeErrorKind>;
}

impl DelimitedValue for String {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    #[inline]
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeErrorKind> {
        core::str::from_utf8(payload)
            .map(str::to_owned)
            .map_err(|_| DecodeErrorKind::InvalidUtf8)
    }
}

impl DelimitedValue for Vec<u8> {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }

    #[inline]
    fn from_payload(payload: &[u8]) -> Result<Self, DecodeErrorKind> {
        Ok(payload.to_vec())
    }
}

#[inline]
fn framed_len<V: DelimitedValue>(key_len: usize, value: &V) -> usize {
    let len = value.as_bytes().len();
    key_len + encoded_len_prefix_len(len) + len
}

#[inline]
fn write_framed<V: DelimitedValue>(
    number: u32,
    value: &V,
    writer: &mut WireWriter<'_>,
) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    writer.put_key(WireType::Len, number)?;
    writer.put_len(bytes.len())?;
    writer.put_slice(bytes)
}

/// Singular values are skipped when empty; `Some` and repeated elements are
/// always written.
pub(crate) fn compute_size<M, V: DelimitedValue>(
    field: &FieldDescriptor<M>,
    storage: &Storage<M, V>,
    msg: &M,
) -> usize {
    match storage {
        Storage::Single(access) => {
            let value = access.get(msg);
            if value.as_bytes().is_empty() {
                0
            } else {
                framed_len(field.key_len, value)
            }
        }
        Storage::Optional(access) => access
            .get(msg)
            .as_ref()
            .map_or(0, |value| framed_len(field.key_len, value)),
        Storage::Repeated(access) => access
            .get(msg)
            .iter()
            .map(|value| framed_len(field.key_len, value))
            .sum(),
    }
}

pub(crate) fn encode<M, V: DelimitedValue>(
    field: &FieldDescriptor<M>,
    storage: &Storage<M, V>,
    msg: &M,
    writer: &mut WireWriter<'_>,
) -> Result<(), EncodeError> {
    match storage {
        Storage::Single(access) => {
            let value = access.get(msg);
            if value.as_bytes().is_empty() {
                return Ok(());
            }
            write_framed(field.number, value, writer)
        }
        Storage::Optional(access) => match access.get(msg) {
            Some(value) => write_framed(field.number, value, writer),
            None => Ok(()),
        },
        Storage::Repeated(access) => {
            for value in access.get(msg) {
                write_framed(field.number, value, writer)?;
            }
            Ok(())
        }
    }
}

/// Applies one occurrence of the field from the wire.
///
/// Returns `false`, without consuming anything, for any wire type but `Len`.
pub(crate) fn merge<M, V: DelimitedValue>(
    storage: &Storage<M, V>,
    wire_type: WireType,
    msg: &mut M,
    buf: &mut &[u8],
) -> Result<bool, DecodeErrorKind> {
    if wire_type != WireType::Len {
        return Ok(false);
    }

    let value = V::from_payload(split_len_delimited(buf)?)?;
    match storage {
        Storage::Single(access) => *access.get_mut(msg) = value,
        Storage::Optional(access) => *access.get_mut(msg) = Some(value),
        Storage::Repeated(access) => access.get_mut(msg).push(value),
    }
    Ok(true)
}
