//! Serialization: the size pre-pass and the encoder proper.

use bytes::{BufMut, BytesMut};

use crate::message::{FieldSlot, Message, Value};
use crate::schema::{Cardinality, FieldDescriptor};
use crate::tag::Tag;
use crate::varint::{encode_varint, varint_len};
use crate::{Result, WireError};

impl Message {
    /// Exact number of bytes [`Message::encode`] will write.
    ///
    /// Mirrors the encoder's traversal without producing any bytes, so an
    /// output buffer can be allocated once at the right size. A missing
    /// required field does not affect the count; the encoder rejects it.
    pub fn encoded_len(&self) -> usize {
        let mut len = 0;
        for (field, slot) in self.schema().fields.iter().zip(&self.slots) {
            match slot {
                FieldSlot::Unset => {}
                FieldSlot::Single(value) => len += record_len(field, value),
                FieldSlot::Repeated(values) => {
                    for value in values {
                        len += record_len(field, value);
                    }
                }
            }
        }
        len + self.unknown.len()
    }

    /// Serializes the message into `writer`: one record per present field
    /// value in ascending field-number order, then the preserved unknown
    /// records verbatim.
    ///
    /// # Errors
    /// Returns [`WireError::RequiredFieldMissing`] when a required field
    /// is unset, here or in any embedded message. The buffer may then hold
    /// a partial encoding.
    pub fn encode(&self, writer: &mut BytesMut) -> Result<()> {
        for (field, slot) in self.schema().fields.iter().zip(&self.slots) {
            match slot {
                FieldSlot::Unset => {
                    if field.cardinality == Cardinality::Required {
                        return Err(WireError::RequiredFieldMissing {
                            message: self.schema().name,
                            field: field.name,
                        });
                    }
                }
                FieldSlot::Single(value) => encode_record(field, value, writer)?,
                FieldSlot::Repeated(values) => {
                    for value in values {
                        encode_record(field, value, writer)?;
                    }
                }
            }
        }
        writer.put_slice(&self.unknown);
        Ok(())
    }
}

fn field_tag(field: &FieldDescriptor) -> Tag {
    Tag::new(u64::from(field.number), field.wire_type())
}

fn record_len(field: &FieldDescriptor, value: &Value) -> usize {
    field_tag(field).encoded_len() + value_len(value)
}

/// Bytes the value part of a record occupies, length prefix included.
pub(crate) fn value_len(value: &Value) -> usize {
    match value {
        Value::Bool(_) => 1,
        Value::Uint64(value) => varint_len(*value),
        Value::Str(value) => varint_len(value.len() as u64) + value.len(),
        Value::Bytes(value) => varint_len(value.len() as u64) + value.len(),
        Value::Message(value) => {
            let len = value.encoded_len();
            varint_len(len as u64) + len
        }
    }
}

fn encode_record(field: &FieldDescriptor, value: &Value, writer: &mut BytesMut) -> Result<()> {
    field_tag(field).encode(writer);
    write_value(value, writer)
}

/// Writes the value part of a record, length prefix included.
pub(crate) fn write_value(value: &Value, writer: &mut BytesMut) -> Result<()> {
    match value {
        Value::Bool(value) => writer.put_u8(u8::from(*value)),
        Value::Uint64(value) => encode_varint(writer, *value),
        Value::Str(value) => {
            encode_varint(writer, value.len() as u64);
            writer.put_slice(value.as_bytes());
        }
        Value::Bytes(value) => {
            encode_varint(writer, value.len() as u64);
            writer.put_slice(value);
        }
        Value::Message(value) => {
            encode_varint(writer, value.encoded_len() as u64);
            value.encode(writer)?;
        }
    }
    Ok(())
}
