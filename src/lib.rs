//! # tagwire
//!
//! A schema-driven binary message codec over a tag-length-value wire
//! format.
//!
//! Message types are described by static [`MessageSchema`] tables of
//! numbered fields, each optional, required or repeated, carrying
//! booleans, unsigned integers, UTF-8 text, raw bytes or embedded
//! messages. One data-driven engine serializes and deserializes every
//! type; there is no per-type generated code.
//!
//! ## Features
//! - Records are independent `tag, value` units: a varint tag packing the
//!   field number with a wire type, then the value bytes the wire type
//!   frames
//! - Fields the local schema does not declare survive a decode and
//!   re-encode byte for byte, so old readers can relay messages from
//!   newer writers
//! - Required fields are enforced on both the encode and decode path
//! - [`Message::encoded_len`] predicts the exact output size, letting
//!   [`encode`] fill a single right-sized allocation
//! - Typed [`extensions`] read and write fields of the unknown-field
//!   remainder in place
//!
//! ## Usage
//! ```rust
//! use tagwire::{Cardinality, FieldDescriptor, FieldKind, Message, MessageSchema};
//!
//! static GREETING: MessageSchema = MessageSchema {
//!     name: "Greeting",
//!     fields: &[
//!         FieldDescriptor {
//!             number: 1,
//!             name: "text",
//!             kind: FieldKind::Str,
//!             cardinality: Cardinality::Required,
//!         },
//!         FieldDescriptor {
//!             number: 2,
//!             name: "urgent",
//!             kind: FieldKind::Bool,
//!             cardinality: Cardinality::Optional,
//!         },
//!     ],
//! };
//!
//! let mut greeting = Message::new(&GREETING);
//! greeting.set_str(1, "hello");
//! greeting.set_bool(2, false);
//!
//! let mut wire = tagwire::encode(&greeting).unwrap();
//! let decoded = tagwire::decode(&GREETING, &mut wire).unwrap();
//! assert_eq!(decoded.get_str(1), Some("hello"));
//! assert_eq!(decoded.get_bool(2), Some(false));
//! assert_eq!(decoded, greeting);
//! ```

use bytes::{Bytes, BytesMut};

mod decode;
mod encode;
pub mod extensions;
mod message;
mod schema;
mod tag;
mod varint;

pub use decode::skip_field;
pub use extensions::{ExtensionDescriptor, RegistryError};
pub use message::{Message, Value};
pub use schema::{Cardinality, FieldDescriptor, FieldKind, MessageSchema};
pub use tag::{Tag, WireType};
pub use varint::{decode_varint, encode_varint, varint_len};

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The input ended in the middle of a record.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// A varint ran past the 10 bytes a 64-bit value may occupy.
    #[error("varint overflows 64 bits")]
    IntegerOverflow,
    /// A record tag carried field number zero.
    #[error("invalid field number in tag {0:#x}")]
    InvalidFieldNumber(u64),
    /// A record tag carried an end-group marker outside any group, or one
    /// of the unassigned wire-type bit patterns.
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    /// A record for a declared field was framed with the wrong wire type.
    #[error("field {message}.{field} expects wire type {expected}, got {actual}")]
    WireTypeMismatch {
        message: &'static str,
        field: &'static str,
        expected: WireType,
        actual: WireType,
    },
    /// A required field was unset at encode time, or the input carried no
    /// record for it.
    #[error("required field {message}.{field} is not set")]
    RequiredFieldMissing {
        message: &'static str,
        field: &'static str,
    },
    /// A length-delimited record declared a length beyond the signed
    /// 64-bit range.
    #[error("length-delimited record declares an invalid length")]
    NegativeLength,
    /// The payload of a string field is not valid UTF-8.
    #[error("field {message}.{field} holds invalid UTF-8")]
    InvalidUtf8 {
        message: &'static str,
        field: &'static str,
    },
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, WireError>;

/// Encodes `message` into a freshly allocated buffer of exactly
/// [`Message::encoded_len`] bytes.
///
/// # Example
/// ```rust
/// use tagwire::{Cardinality, FieldDescriptor, FieldKind, Message, MessageSchema};
///
/// static COUNTER: MessageSchema = MessageSchema {
///     name: "Counter",
///     fields: &[FieldDescriptor {
///         number: 1,
///         name: "count",
///         kind: FieldKind::Uint64,
///         cardinality: Cardinality::Optional,
///     }],
/// };
///
/// let mut counter = Message::new(&COUNTER);
/// counter.set_u64(1, 300);
/// let wire = tagwire::encode(&counter).unwrap();
/// assert_eq!(&wire[..], &[0x08, 0xac, 0x02]);
/// ```
///
/// # Errors
/// Returns [`WireError::RequiredFieldMissing`] when a required field is
/// unset anywhere in the message tree.
pub fn encode(message: &Message) -> Result<Bytes> {
    let mut writer = BytesMut::with_capacity(message.encoded_len());
    message.encode(&mut writer)?;
    debug_assert_eq!(writer.len(), message.encoded_len());
    Ok(writer.freeze())
}

/// Decodes one message of the given type from everything remaining in
/// `reader`.
///
/// # Errors
/// Any [`WireError`] describing how the input is malformed or incomplete.
pub fn decode(schema: &'static MessageSchema, reader: &mut Bytes) -> Result<Message> {
    Message::decode(schema, reader)
}
