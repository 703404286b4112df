use bytes::{Bytes, BytesMut};
use tagwire::{
    decode, encode, encode_varint, Cardinality, FieldDescriptor, FieldKind, Message,
    MessageSchema, Tag, WireError, WireType,
};

static ITEM: MessageSchema = MessageSchema {
    name: "Item",
    fields: &[FieldDescriptor {
        number: 1,
        name: "kind",
        kind: FieldKind::Str,
        cardinality: Cardinality::Optional,
    }],
};

// A record wrapper whose payload must always be present.
static ENTRY: MessageSchema = MessageSchema {
    name: "Entry",
    fields: &[FieldDescriptor {
        number: 1,
        name: "item",
        kind: FieldKind::Message(&ITEM),
        cardinality: Cardinality::Required,
    }],
};

static TAGGED: MessageSchema = MessageSchema {
    name: "Tagged",
    fields: &[
        FieldDescriptor {
            number: 1,
            name: "id",
            kind: FieldKind::Uint64,
            cardinality: Cardinality::Required,
        },
        FieldDescriptor {
            number: 2,
            name: "note",
            kind: FieldKind::Str,
            cardinality: Cardinality::Optional,
        },
    ],
};

#[test]
fn test_encode_fails_without_required_field() {
    let unset = Message::new(&TAGGED);
    assert_eq!(
        encode(&unset),
        Err(WireError::RequiredFieldMissing {
            message: "Tagged",
            field: "id",
        })
    );
}

#[test]
fn test_encode_succeeds_once_required_field_is_set() {
    let mut tagged = Message::new(&TAGGED);
    tagged.set_u64(1, 12);
    let wire = encode(&tagged).unwrap();
    assert_eq!(&wire[..], &[0x08, 0x0c]);
}

#[test]
fn test_decode_fails_when_stream_lacks_required_field() {
    // The optional note alone does not satisfy the schema.
    let mut only_note = BytesMut::new();
    Tag::new(2, WireType::LengthDelimited).encode(&mut only_note);
    encode_varint(&mut only_note, 4);
    only_note.extend_from_slice(b"memo");

    assert_eq!(
        decode(&TAGGED, &mut only_note.freeze()),
        Err(WireError::RequiredFieldMissing {
            message: "Tagged",
            field: "id",
        })
    );
}

#[test]
fn test_decode_empty_stream_fails_for_required_schema() {
    assert_eq!(
        decode(&TAGGED, &mut Bytes::new()),
        Err(WireError::RequiredFieldMissing {
            message: "Tagged",
            field: "id",
        })
    );
}

#[test]
fn test_required_embedded_message_enforced_on_encode() {
    let bare = Message::new(&ENTRY);
    assert_eq!(
        encode(&bare),
        Err(WireError::RequiredFieldMissing {
            message: "Entry",
            field: "item",
        })
    );

    let mut entry = Message::new(&ENTRY);
    entry.set_message(1, Message::new(&ITEM));
    assert!(encode(&entry).is_ok());
}

#[test]
fn test_required_embedded_message_enforced_on_decode() {
    let mut item = Message::new(&ITEM);
    item.set_str(1, "disk");
    let mut entry = Message::new(&ENTRY);
    entry.set_message(1, item);

    let mut wire = encode(&entry).unwrap();
    let decoded = decode(&ENTRY, &mut wire).unwrap();
    assert_eq!(decoded, entry);
    assert_eq!(decoded.get_message(1).unwrap().get_str(1), Some("disk"));

    // A stream carrying only an unknown field fails the same check.
    let mut unknown_only = BytesMut::new();
    Tag::new(9, WireType::Varint).encode(&mut unknown_only);
    encode_varint(&mut unknown_only, 3);
    assert_eq!(
        decode(&ENTRY, &mut unknown_only.freeze()),
        Err(WireError::RequiredFieldMissing {
            message: "Entry",
            field: "item",
        })
    );
}

#[test]
fn test_clearing_required_field_fails_next_encode() {
    let mut tagged = Message::new(&TAGGED);
    tagged.set_u64(1, 12);
    assert!(encode(&tagged).is_ok());

    tagged.clear(1);
    assert_eq!(
        encode(&tagged),
        Err(WireError::RequiredFieldMissing {
            message: "Tagged",
            field: "id",
        })
    );
}

#[test]
fn test_late_record_satisfies_required_field() {
    // The required record may arrive after other records in the stream.
    let mut stream = BytesMut::new();
    Tag::new(2, WireType::LengthDelimited).encode(&mut stream);
    encode_varint(&mut stream, 1);
    stream.extend_from_slice(b"n");
    Tag::new(1, WireType::Varint).encode(&mut stream);
    encode_varint(&mut stream, 44);

    let decoded = decode(&TAGGED, &mut stream.freeze()).unwrap();
    assert_eq!(decoded.get_u64(1), Some(44));
    assert_eq!(decoded.get_str(2), Some("n"));
}
