//! Deserialization: the record loop, value decoding and the unknown-field
//! skipper.

use bytes::{Buf, Bytes};

use crate::message::{FieldSlot, Message, Value};
use crate::schema::{Cardinality, FieldDescriptor, FieldKind, MessageSchema};
use crate::tag::{Tag, WireType};
use crate::varint::decode_varint;
use crate::{Result, WireError};

impl Message {
    /// Decodes one message of the given type from everything remaining in
    /// `reader`.
    ///
    /// # Errors
    /// Any [`WireError`] describing how the input is malformed, or
    /// [`WireError::RequiredFieldMissing`] when the input carries no
    /// record for a required field.
    pub fn decode(schema: &'static MessageSchema, reader: &mut Bytes) -> Result<Message> {
        let mut message = Message::new(schema);
        message.merge(reader)?;
        Ok(message)
    }

    /// Decodes records from `reader` into `self` until the buffer is
    /// exhausted, then verifies that every required field is set.
    ///
    /// Repeated records for one field follow merge semantics: scalars are
    /// overwritten, embedded messages merge field-wise and repeated fields
    /// append. Records for field numbers the schema does not declare are
    /// skipped over and preserved verbatim in the unknown-field remainder.
    pub fn merge(&mut self, reader: &mut Bytes) -> Result<()> {
        while reader.has_remaining() {
            let record_start = reader.clone();
            let tag = Tag::decode(reader)?;
            if tag.wire_type == WireType::EndGroup {
                return Err(WireError::InvalidWireType(WireType::EndGroup as u8));
            }
            if tag.number == 0 {
                return Err(WireError::InvalidFieldNumber(tag.pack()));
            }
            let known = u32::try_from(tag.number)
                .ok()
                .and_then(|number| self.schema().field(number));
            match known {
                Some((index, field)) => {
                    if tag.wire_type != field.wire_type() {
                        return Err(WireError::WireTypeMismatch {
                            message: self.schema().name,
                            field: field.name,
                            expected: field.wire_type(),
                            actual: tag.wire_type,
                        });
                    }
                    let name = self.schema().name;
                    decode_known(name, field, &mut self.slots[index], reader)?;
                }
                None => {
                    skip_field(tag.wire_type, reader)?;
                    let record_len = record_start.remaining() - reader.remaining();
                    self.unknown.extend_from_slice(&record_start[..record_len]);
                }
            }
        }
        for (field, slot) in self.schema().fields.iter().zip(&self.slots) {
            if field.cardinality == Cardinality::Required && matches!(slot, FieldSlot::Unset) {
                return Err(WireError::RequiredFieldMissing {
                    message: self.schema().name,
                    field: field.name,
                });
            }
        }
        Ok(())
    }
}

fn decode_known(
    message: &'static str,
    field: &'static FieldDescriptor,
    slot: &mut FieldSlot,
    reader: &mut Bytes,
) -> Result<()> {
    match field.kind {
        FieldKind::Bool => {
            let raw = decode_varint(reader)?;
            store(field, slot, Value::Bool(raw != 0));
        }
        FieldKind::Uint64 => {
            let raw = decode_varint(reader)?;
            store(field, slot, Value::Uint64(raw));
        }
        FieldKind::Str => {
            let payload = read_delimited(reader)?;
            let text = String::from_utf8(payload.to_vec()).map_err(|_| {
                WireError::InvalidUtf8 { message, field: field.name }
            })?;
            store(field, slot, Value::Str(text));
        }
        FieldKind::Bytes => {
            let payload = read_delimited(reader)?;
            store(field, slot, Value::Bytes(payload.to_vec()));
        }
        FieldKind::Message(schema) => {
            let mut payload = read_delimited(reader)?;
            if field.cardinality == Cardinality::Repeated {
                let element = Message::decode(schema, &mut payload)?;
                store(field, slot, Value::Message(element));
            } else if let FieldSlot::Single(Value::Message(existing)) = slot {
                existing.merge(&mut payload)?;
            } else {
                let fresh = Message::decode(schema, &mut payload)?;
                *slot = FieldSlot::Single(Value::Message(fresh));
            }
        }
    }
    Ok(())
}

// Overwrite single fields, append to repeated ones.
fn store(field: &FieldDescriptor, slot: &mut FieldSlot, value: Value) {
    if field.cardinality == Cardinality::Repeated {
        match slot {
            FieldSlot::Repeated(values) => values.push(value),
            _ => *slot = FieldSlot::Repeated(vec![value]),
        }
    } else {
        *slot = FieldSlot::Single(value);
    }
}

/// Reads a length-delimited payload: a varint byte count, then that many
/// bytes split out of `reader`.
pub(crate) fn read_delimited(reader: &mut Bytes) -> Result<Bytes> {
    let len = read_length(reader)?;
    Ok(reader.split_to(len))
}

/// Decodes a length header and validates it against the remaining input.
///
/// A length beyond the signed 64-bit range is rejected as
/// [`WireError::NegativeLength`]; one beyond the buffer as
/// [`WireError::UnexpectedEndOfInput`].
pub(crate) fn read_length(reader: &mut Bytes) -> Result<usize> {
    let raw = decode_varint(reader)?;
    if raw > i64::MAX as u64 {
        return Err(WireError::NegativeLength);
    }
    if raw > reader.remaining() as u64 {
        return Err(WireError::UnexpectedEndOfInput);
    }
    Ok(raw as usize)
}

/// Consumes the value bytes of one record whose tag was already read,
/// without interpreting them, and returns how many bytes that took.
///
/// Legacy groups are handled best-effort: a start-group is skipped by
/// walking nested records until the next balancing end-group marker, with
/// no validation beyond tag and length sanity, and a bare end-group
/// consumes nothing.
///
/// # Errors
/// Returns [`WireError::UnexpectedEndOfInput`] when the record runs past
/// the buffer (including a group with no end marker), or any error from
/// decoding nested tags and lengths.
pub fn skip_field(wire_type: WireType, reader: &mut Bytes) -> Result<usize> {
    let before = reader.remaining();
    match wire_type {
        WireType::Varint => {
            decode_varint(reader)?;
        }
        WireType::Fixed64 => advance_exact(reader, 8)?,
        WireType::LengthDelimited => {
            let len = read_length(reader)?;
            reader.advance(len);
        }
        WireType::StartGroup => loop {
            let tag = Tag::decode(reader)?;
            if tag.wire_type == WireType::EndGroup {
                break;
            }
            skip_field(tag.wire_type, reader)?;
        },
        WireType::EndGroup => {}
        WireType::Fixed32 => advance_exact(reader, 4)?,
    }
    Ok(before - reader.remaining())
}

fn advance_exact(reader: &mut Bytes, len: usize) -> Result<()> {
    if reader.remaining() < len {
        return Err(WireError::UnexpectedEndOfInput);
    }
    reader.advance(len);
    Ok(())
}
