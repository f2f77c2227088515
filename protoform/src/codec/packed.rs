//! Packed repeated field decoding.

use crate::codec::scalar::ScalarValue;
use crate::error::DecodeErrorKind;
use crate::kind::ScalarKind;

/// Decodes a packed run of `kind` values and appends them to `dst`.
///
/// Fixed-size kinds require the run to hold a whole number of values. Varint
/// runs are consumed until exhausted, a value cut off at the end of the run
/// is malformed input.
pub(crate) fn decode_packed_into<V: ScalarValue>(
    kind: ScalarKind,
    mut data: &[u8],
    dst: &mut Vec<V>,
) -> Result<(), DecodeErrorKind> {
    let count = match kind.fixed_width() {
        Some(width) => {
            if data.len() % usize::from(width) != 0 {
                return Err(DecodeErrorKind::InvalidPackedLength {
                    expected_multiple: width,
                    actual: data.len(),
                });
            }
            data.len() / usize::from(width)
        }
        // Every varint ends with exactly one byte below 0x80.
        None => data.iter().filter(|byte| **byte < 0x80).count(),
    };
    dst.reserve(count);

    while !data.is_empty() {
        dst.push(V::from_bits(kind.decode(&mut data)?));
    }
    Ok(())
}
