//! Dynamic message values driven by a static schema.

use std::fmt;
use std::ptr;

use crate::schema::{Cardinality, FieldDescriptor, FieldKind, MessageSchema};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint64(u64),
    Str(String),
    Bytes(Vec<u8>),
    Message(Message),
}

impl Value {
    /// Whether this value is admissible for a field of `kind`. Embedded
    /// messages must carry exactly the declared schema.
    pub(crate) fn matches(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Value::Bool(_), FieldKind::Bool)
            | (Value::Uint64(_), FieldKind::Uint64)
            | (Value::Str(_), FieldKind::Str)
            | (Value::Bytes(_), FieldKind::Bytes) => true,
            (Value::Message(message), FieldKind::Message(schema)) => {
                ptr::eq(message.schema(), schema)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Uint64(value) => write!(f, "{value}"),
            Value::Str(value) => write!(f, "{value:?}"),
            Value::Bytes(value) => {
                f.write_str("0x")?;
                for byte in value {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Message(value) => write!(f, "{value}"),
        }
    }
}

/// Storage for one declared field.
///
/// Repeated fields become `Repeated` on their first element, so an empty
/// sequence and an unset field are the same state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldSlot {
    Unset,
    Single(Value),
    Repeated(Vec<Value>),
}

/// An instance of a message type described by a [`MessageSchema`].
///
/// A message starts with every field unset and is populated through the
/// typed setters or by decoding. Cloning yields a fully independent deep
/// copy, embedded messages, repeated values and preserved unknown fields
/// included.
///
/// Wire-level problems always surface as errors from the encode and
/// decode entry points. The accessors on this type, by contrast, panic
/// when called against the schema (an undeclared field number, a value of
/// the wrong kind, single-value access to a repeated field), since that
/// is a programming error and not a property of the input.
#[derive(Clone)]
pub struct Message {
    schema: &'static MessageSchema,
    pub(crate) slots: Vec<FieldSlot>,
    pub(crate) unknown: Vec<u8>,
}

impl Message {
    /// Creates an empty message of the given type.
    pub fn new(schema: &'static MessageSchema) -> Message {
        debug_assert!(
            schema.is_well_formed(),
            "schema {} violates field-table ordering",
            schema.name
        );
        Message {
            schema,
            slots: vec![FieldSlot::Unset; schema.fields.len()],
            unknown: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'static MessageSchema {
        self.schema
    }

    /// Records of fields the schema does not declare, preserved verbatim
    /// from decoding in arrival order. Re-encoding appends them after all
    /// declared fields.
    pub fn unknown_fields(&self) -> &[u8] {
        &self.unknown
    }

    /// Whether the field holds a value. For repeated fields this means at
    /// least one element.
    pub fn is_set(&self, number: u32) -> bool {
        let (index, _) = self.descriptor(number);
        !matches!(self.slots[index], FieldSlot::Unset)
    }

    /// Resets the field to unset, or a repeated field to empty.
    pub fn clear(&mut self, number: u32) {
        let (index, _) = self.descriptor(number);
        self.slots[index] = FieldSlot::Unset;
    }

    // --- single-value access ---

    /// Returns the value of a single-valued field, or `None` when unset.
    ///
    /// # Panics
    /// Panics when the schema does not declare field `number` or declares
    /// it repeated.
    pub fn get(&self, number: u32) -> Option<&Value> {
        match self.single_slot(number, "a single value", |_| true) {
            FieldSlot::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_bool(&self, number: u32) -> Option<bool> {
        match self.single_slot(number, "Bool", |kind| matches!(kind, FieldKind::Bool)) {
            FieldSlot::Single(Value::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_u64(&self, number: u32) -> Option<u64> {
        match self.single_slot(number, "Uint64", |kind| matches!(kind, FieldKind::Uint64)) {
            FieldSlot::Single(Value::Uint64(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_str(&self, number: u32) -> Option<&str> {
        match self.single_slot(number, "Str", |kind| matches!(kind, FieldKind::Str)) {
            FieldSlot::Single(Value::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_bytes(&self, number: u32) -> Option<&[u8]> {
        match self.single_slot(number, "Bytes", |kind| matches!(kind, FieldKind::Bytes)) {
            FieldSlot::Single(Value::Bytes(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_message(&self, number: u32) -> Option<&Message> {
        match self.single_slot(number, "Message", |kind| matches!(kind, FieldKind::Message(_))) {
            FieldSlot::Single(Value::Message(value)) => Some(value),
            _ => None,
        }
    }

    /// Sets a single-valued field, replacing any previous value.
    ///
    /// # Panics
    /// Panics when the schema does not declare field `number`, declares it
    /// repeated, or declares a kind `value` does not match.
    pub fn set(&mut self, number: u32, value: Value) {
        let (index, field) = self.descriptor(number);
        if field.cardinality == Cardinality::Repeated {
            panic!(
                "field {}.{} is repeated; use push",
                self.schema.name, field.name
            );
        }
        if !value.matches(field.kind) {
            panic!(
                "value does not match field {}.{} declared as {:?}",
                self.schema.name, field.name, field.kind
            );
        }
        self.slots[index] = FieldSlot::Single(value);
    }

    pub fn set_bool(&mut self, number: u32, value: bool) {
        self.set(number, Value::Bool(value));
    }

    pub fn set_u64(&mut self, number: u32, value: u64) {
        self.set(number, Value::Uint64(value));
    }

    pub fn set_str(&mut self, number: u32, value: impl Into<String>) {
        self.set(number, Value::Str(value.into()));
    }

    pub fn set_bytes(&mut self, number: u32, value: impl Into<Vec<u8>>) {
        self.set(number, Value::Bytes(value.into()));
    }

    pub fn set_message(&mut self, number: u32, value: Message) {
        self.set(number, Value::Message(value));
    }

    // --- repeated access ---

    /// Returns the elements of a repeated field, oldest first.
    ///
    /// # Panics
    /// Panics when the schema does not declare field `number` or does not
    /// declare it repeated.
    pub fn repeated(&self, number: u32) -> &[Value] {
        let (index, field) = self.descriptor(number);
        if field.cardinality != Cardinality::Repeated {
            panic!(
                "field {}.{} is not repeated",
                self.schema.name, field.name
            );
        }
        match &self.slots[index] {
            FieldSlot::Repeated(values) => values,
            _ => &[],
        }
    }

    /// Appends an element to a repeated field.
    ///
    /// # Panics
    /// Panics when the schema does not declare field `number`, does not
    /// declare it repeated, or declares a kind `value` does not match.
    pub fn push(&mut self, number: u32, value: Value) {
        let (index, field) = self.descriptor(number);
        if field.cardinality != Cardinality::Repeated {
            panic!(
                "field {}.{} is not repeated; use set",
                self.schema.name, field.name
            );
        }
        if !value.matches(field.kind) {
            panic!(
                "value does not match field {}.{} declared as {:?}",
                self.schema.name, field.name, field.kind
            );
        }
        match &mut self.slots[index] {
            FieldSlot::Repeated(values) => values.push(value),
            slot => *slot = FieldSlot::Repeated(vec![value]),
        }
    }

    pub fn push_bool(&mut self, number: u32, value: bool) {
        self.push(number, Value::Bool(value));
    }

    pub fn push_u64(&mut self, number: u32, value: u64) {
        self.push(number, Value::Uint64(value));
    }

    pub fn push_str(&mut self, number: u32, value: impl Into<String>) {
        self.push(number, Value::Str(value.into()));
    }

    pub fn push_bytes(&mut self, number: u32, value: impl Into<Vec<u8>>) {
        self.push(number, Value::Bytes(value.into()));
    }

    pub fn push_message(&mut self, number: u32, value: Message) {
        self.push(number, Value::Message(value));
    }

    // --- internals ---

    fn descriptor(&self, number: u32) -> (usize, &'static FieldDescriptor) {
        match self.schema.field(number) {
            Some(found) => found,
            None => panic!(
                "message {} declares no field {}",
                self.schema.name, number
            ),
        }
    }

    fn single_slot(
        &self,
        number: u32,
        wanted: &str,
        kind_ok: fn(FieldKind) -> bool,
    ) -> &FieldSlot {
        let (index, field) = self.descriptor(number);
        if field.cardinality == Cardinality::Repeated {
            panic!(
                "field {}.{} is repeated; use repeated",
                self.schema.name, field.name
            );
        }
        if !kind_ok(field.kind) {
            panic!(
                "field {}.{} is declared {:?}, not {}",
                self.schema.name, field.name, field.kind, wanted
            );
        }
        &self.slots[index]
    }
}

// Two messages are equal when they share the message type (schema tables
// compare by identity) and hold equal field values and unknown records.
impl PartialEq for Message {
    fn eq(&self, other: &Message) -> bool {
        ptr::eq(self.schema, other.schema)
            && self.slots == other.slots
            && self.unknown == other.unknown
    }
}

// A derived impl would print the schema through every message and recurse
// on self-referential types, so only set fields are shown.
impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name);
        for (field, slot) in self.schema.fields.iter().zip(&self.slots) {
            match slot {
                FieldSlot::Unset => {}
                FieldSlot::Single(value) => {
                    out.field(field.name, value);
                }
                FieldSlot::Repeated(values) => {
                    out.field(field.name, values);
                }
            }
        }
        if !self.unknown.is_empty() {
            out.field("unknown", &self.unknown);
        }
        out.finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.schema.name)?;
        let mut first = true;
        for (field, slot) in self.schema.fields.iter().zip(&self.slots) {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}: ", field.name)?;
            match slot {
                FieldSlot::Unset => f.write_str("<unset>")?,
                FieldSlot::Single(value) => write!(f, "{value}")?,
                FieldSlot::Repeated(values) => {
                    f.write_str("[")?;
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{value}")?;
                    }
                    f.write_str("]")?;
                }
            }
        }
        if !self.unknown.is_empty() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "unknown: {} bytes", self.unknown.len())?;
        }
        f.write_str("}")
    }
}
