//! Record tags: the field number and wire type pair heading every record.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::varint::{decode_varint, encode_varint, varint_len};
use crate::{Result, WireError};

/// How the value bytes following a tag are framed.
///
/// The discriminants are the low three bits of an encoded tag and are part
/// of the wire format. Bit patterns 6 and 7 are unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// A single base-128 integer. Carries booleans and integers.
    Varint = 0,
    /// Eight raw little-endian bytes.
    Fixed64 = 1,
    /// A varint byte count followed by that many bytes. Carries strings,
    /// byte blobs and embedded messages.
    LengthDelimited = 2,
    /// Opens a legacy group. Its records run until the balancing
    /// [`WireType::EndGroup`].
    StartGroup = 3,
    /// Closes a legacy group. Never valid outside one.
    EndGroup = 4,
    /// Four raw little-endian bytes.
    Fixed32 = 5,
}

impl WireType {
    /// Maps the low three bits of a tag to a wire type.
    ///
    /// # Errors
    /// Returns [`WireError::InvalidWireType`] for the unassigned patterns
    /// 6 and 7.
    pub fn from_bits(bits: u8) -> Result<WireType> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(WireError::InvalidWireType(other)),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

/// A decoded record tag.
///
/// Unpacking validates only the wire-type bits. A zero field number is
/// representable here so that group contents can be walked blindly; the
/// record decoder rejects it for real records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub number: u64,
    pub wire_type: WireType,
}

impl Tag {
    pub const fn new(number: u64, wire_type: WireType) -> Tag {
        Tag { number, wire_type }
    }

    /// Packs the pair into the single integer that goes on the wire.
    pub const fn pack(self) -> u64 {
        (self.number << 3) | self.wire_type as u64
    }

    /// Splits a packed tag into its parts.
    pub fn unpack(raw: u64) -> Result<Tag> {
        let wire_type = WireType::from_bits((raw & 0x7) as u8)?;
        Ok(Tag { number: raw >> 3, wire_type })
    }

    pub fn encode(self, writer: &mut BytesMut) {
        encode_varint(writer, self.pack());
    }

    pub fn decode(reader: &mut Bytes) -> Result<Tag> {
        Tag::unpack(decode_varint(reader)?)
    }

    /// Number of bytes [`Tag::encode`] emits.
    pub const fn encoded_len(self) -> usize {
        varint_len(self.pack())
    }
}
