//! Static descriptions of message types.
//!
//! A message type is a [`MessageSchema`]: a name plus one
//! [`FieldDescriptor`] per declared field, sorted by ascending field
//! number. Tables are plain `static` data, built once and never mutated,
//! so they can be shared across threads and refer to each other (including
//! recursively) through `&'static` references.

use std::fmt;

use crate::tag::WireType;

/// The kind of value a field carries.
///
/// The wire type of a field is fully determined by its kind.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// Boolean, encoded as a one-byte varint. Any nonzero byte decodes as
    /// true.
    Bool,
    /// Unsigned 64-bit integer, encoded as a varint.
    Uint64,
    /// UTF-8 text, length-delimited. Decoding validates the payload.
    Str,
    /// Raw byte blob, length-delimited. Contents pass through untouched.
    Bytes,
    /// Embedded message of the referenced type, length-delimited.
    Message(&'static MessageSchema),
}

impl FieldKind {
    /// Wire type records of this kind are framed with.
    pub const fn wire_type(self) -> WireType {
        match self {
            FieldKind::Bool | FieldKind::Uint64 => WireType::Varint,
            FieldKind::Str | FieldKind::Bytes | FieldKind::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }
}

// A derived impl would chase the `&'static MessageSchema` and never
// terminate on self-referential schemas, so embedded types print by name.
impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("Bool"),
            FieldKind::Uint64 => f.write_str("Uint64"),
            FieldKind::Str => f.write_str("Str"),
            FieldKind::Bytes => f.write_str("Bytes"),
            FieldKind::Message(schema) => write!(f, "Message({})", schema.name),
        }
    }
}

/// How many values a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one value. Absence is meaningful and survives round trips.
    Optional,
    /// Exactly one value. Encoding and decoding both fail when it is
    /// absent.
    Required,
    /// Any number of values whose order is significant.
    Repeated,
}

/// One declared field of a message type.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field number, unique within the message type. Never zero.
    pub number: u32,
    /// Field name, used in diagnostics.
    pub name: &'static str,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
}

impl FieldDescriptor {
    /// Wire type records for this field are framed with.
    pub const fn wire_type(&self) -> WireType {
        self.kind.wire_type()
    }
}

/// A message type: a name plus its field table.
#[derive(Debug)]
pub struct MessageSchema {
    pub name: &'static str,
    /// Declared fields in strictly ascending field-number order.
    pub fields: &'static [FieldDescriptor],
}

impl MessageSchema {
    /// Looks up a declared field by number, returning its position in the
    /// field table together with its descriptor.
    pub fn field(&self, number: u32) -> Option<(usize, &FieldDescriptor)> {
        self.fields
            .binary_search_by_key(&number, |field| field.number)
            .ok()
            .map(|index| (index, &self.fields[index]))
    }

    /// Whether the field table upholds its ordering invariant: nonzero
    /// field numbers in strictly ascending order.
    pub fn is_well_formed(&self) -> bool {
        self.fields.first().map_or(true, |field| field.number >= 1)
            && self
                .fields
                .windows(2)
                .all(|pair| pair[0].number < pair[1].number)
    }
}
