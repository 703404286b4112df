//! Variable-length integer primitives.
//!
//! Unsigned 64-bit values are stored as base-128 groups, low-order group
//! first, with the high bit of every byte except the last marking
//! continuation. The minimal encoding is always produced, so a value
//! occupies between 1 and 10 bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Result, WireError};

/// Appends `value` to `writer` in base-128 continuation form.
pub fn encode_varint(writer: &mut BytesMut, value: u64) {
    let mut v = value;
    while v >= 0x80 {
        writer.put_u8((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    writer.put_u8(v as u8);
}

/// Reads one varint from `reader`, consuming its bytes.
///
/// A tenth continuation byte may still terminate the sequence; its bits
/// beyond the 64th are discarded. An eleventh byte can never be part of a
/// 64-bit value.
///
/// # Errors
/// Returns [`WireError::UnexpectedEndOfInput`] when the buffer ends before
/// a byte with the continuation bit clear, and
/// [`WireError::IntegerOverflow`] when the sequence runs past 10 bytes.
pub fn decode_varint(reader: &mut Bytes) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if shift >= 64 {
            return Err(WireError::IntegerOverflow);
        }
        if !reader.has_remaining() {
            return Err(WireError::UnexpectedEndOfInput);
        }
        let byte = reader.get_u8();
        value |= u64::from(byte & 0x7f) << shift;
        if byte < 0x80 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Number of bytes [`encode_varint`] emits for `value`, computed without
/// materializing them. Seven value bits fit per byte; zero still takes one.
pub const fn varint_len(value: u64) -> usize {
    (((value | 1).leading_zeros() ^ 63) / 7) as usize + 1
}
