//! Typed extensions carried in a message's unknown-field remainder.
//!
//! An extension grafts a field onto a host message type whose schema does
//! not declare it. On the wire the record is indistinguishable from any
//! other record, so it travels through the host's unknown-field remainder
//! and round-trips through parties that have never heard of it. Whoever
//! holds the [`ExtensionDescriptor`] can read and write it in place.
//!
//! Descriptors are usually `static` and registered once during program
//! initialization, after which the process-wide registry is only read.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use bytes::{Buf, Bytes, BytesMut};

use crate::decode::{read_delimited, skip_field};
use crate::encode::write_value;
use crate::message::{Message, Value};
use crate::schema::FieldKind;
use crate::tag::Tag;
use crate::varint::decode_varint;
use crate::{Result, WireError};

/// Describes one extension: a typed field grafted onto `host` at `number`.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionDescriptor {
    /// Name of the host message type the extension attaches to.
    pub host: &'static str,
    /// Field number, outside the range the host schema declares.
    pub number: u32,
    /// Fully qualified extension name, used in diagnostics.
    pub name: &'static str,
    /// Kind of value the extension carries.
    pub kind: FieldKind,
}

/// Errors from [`register`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Another descriptor already claims the same host and field number.
    #[error("extension {name} duplicates field {number} of {host}")]
    DuplicateExtension {
        name: &'static str,
        host: &'static str,
        number: u32,
    },
}

type RegistryMap = HashMap<(&'static str, u32), &'static ExtensionDescriptor>;

fn registry() -> &'static RwLock<RegistryMap> {
    static REGISTRY: OnceLock<RwLock<RegistryMap>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers `desc` process-wide so [`lookup`] and [`for_host`] can find
/// it.
///
/// # Errors
/// Returns [`RegistryError::DuplicateExtension`] when a descriptor is
/// already registered for the same host and field number.
pub fn register(desc: &'static ExtensionDescriptor) -> std::result::Result<(), RegistryError> {
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    match map.entry((desc.host, desc.number)) {
        Entry::Occupied(_) => Err(RegistryError::DuplicateExtension {
            name: desc.name,
            host: desc.host,
            number: desc.number,
        }),
        Entry::Vacant(slot) => {
            slot.insert(desc);
            Ok(())
        }
    }
}

/// Looks up the registered extension for `host` at `number`.
pub fn lookup(host: &'static str, number: u32) -> Option<&'static ExtensionDescriptor> {
    let map = registry().read().unwrap_or_else(PoisonError::into_inner);
    map.get(&(host, number)).copied()
}

/// All registered extensions of `host`, in ascending field-number order.
pub fn for_host(host: &'static str) -> Vec<&'static ExtensionDescriptor> {
    let map = registry().read().unwrap_or_else(PoisonError::into_inner);
    let mut found: Vec<_> = map
        .values()
        .filter(|desc| desc.host == host)
        .copied()
        .collect();
    found.sort_by_key(|desc| desc.number);
    found
}

/// Decodes the value of `desc` out of `message`'s unknown-field remainder.
///
/// Returns `Ok(None)` when no record with the extension's number is
/// present. When several are, scalar kinds resolve to the last record and
/// message kinds merge the records field-wise, the same way duplicate
/// declared fields do.
///
/// # Errors
/// Returns [`WireError::WireTypeMismatch`] when a record with the
/// extension's number is framed with the wrong wire type, or any error
/// from walking the remainder.
pub fn get(message: &Message, desc: &ExtensionDescriptor) -> Result<Option<Value>> {
    let mut reader = Bytes::copy_from_slice(message.unknown_fields());
    let mut found = None;
    while reader.has_remaining() {
        let tag = Tag::decode(&mut reader)?;
        if tag.number != u64::from(desc.number) {
            skip_field(tag.wire_type, &mut reader)?;
            continue;
        }
        if tag.wire_type != desc.kind.wire_type() {
            return Err(WireError::WireTypeMismatch {
                message: desc.host,
                field: desc.name,
                expected: desc.kind.wire_type(),
                actual: tag.wire_type,
            });
        }
        match &mut found {
            Some(Value::Message(existing)) => {
                let mut payload = read_delimited(&mut reader)?;
                existing.merge(&mut payload)?;
            }
            slot => *slot = Some(decode_value(desc, &mut reader)?),
        }
    }
    Ok(found)
}

/// Writes `value` as `desc`'s record into `message`'s unknown-field
/// remainder, replacing any records already carrying that number. The new
/// record lands at the end; unrelated records keep their relative order.
///
/// # Errors
/// Returns any error from serializing an embedded message value, or from
/// rewriting the remainder. On error the message is left unchanged.
///
/// # Panics
/// Panics when `value` does not match the kind `desc` declares.
pub fn set(message: &mut Message, desc: &ExtensionDescriptor, value: Value) -> Result<()> {
    if !value.matches(desc.kind) {
        panic!(
            "value does not match extension {} declared as {:?}",
            desc.name, desc.kind
        );
    }
    // The value is serialized first; a failed encode leaves the
    // remainder untouched.
    let mut writer = BytesMut::new();
    Tag::new(u64::from(desc.number), desc.kind.wire_type()).encode(&mut writer);
    write_value(&value, &mut writer)?;
    strip(message, desc.number)?;
    message.unknown.extend_from_slice(&writer);
    Ok(())
}

/// Removes every record carrying `desc`'s number from `message`'s
/// unknown-field remainder.
pub fn clear(message: &mut Message, desc: &ExtensionDescriptor) -> Result<()> {
    strip(message, desc.number)
}

fn decode_value(desc: &ExtensionDescriptor, reader: &mut Bytes) -> Result<Value> {
    match desc.kind {
        FieldKind::Bool => Ok(Value::Bool(decode_varint(reader)? != 0)),
        FieldKind::Uint64 => Ok(Value::Uint64(decode_varint(reader)?)),
        FieldKind::Str => {
            let payload = read_delimited(reader)?;
            String::from_utf8(payload.to_vec())
                .map(Value::Str)
                .map_err(|_| WireError::InvalidUtf8 {
                    message: desc.host,
                    field: desc.name,
                })
        }
        FieldKind::Bytes => Ok(Value::Bytes(read_delimited(reader)?.to_vec())),
        FieldKind::Message(schema) => {
            let mut payload = read_delimited(reader)?;
            Ok(Value::Message(Message::decode(schema, &mut payload)?))
        }
    }
}

// Rewrites the remainder without the records carrying `number`.
fn strip(message: &mut Message, number: u32) -> Result<()> {
    if message.unknown.is_empty() {
        return Ok(());
    }
    let mut reader = Bytes::copy_from_slice(&message.unknown);
    let mut kept = Vec::with_capacity(message.unknown.len());
    while reader.has_remaining() {
        let record_start = reader.clone();
        let tag = Tag::decode(&mut reader)?;
        skip_field(tag.wire_type, &mut reader)?;
        if tag.number != u64::from(number) {
            let record_len = record_start.remaining() - reader.remaining();
            kept.extend_from_slice(&record_start[..record_len]);
        }
    }
    message.unknown = kept;
    Ok(())
}
