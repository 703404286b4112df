use bytes::BytesMut;
use tagwire::{
    decode, encode, Cardinality, FieldDescriptor, FieldKind, Message, MessageSchema, Value,
};

static NODE: MessageSchema = MessageSchema {
    name: "Node",
    fields: &[
        FieldDescriptor {
            number: 1,
            name: "host",
            kind: FieldKind::Str,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            number: 2,
            name: "port",
            kind: FieldKind::Uint64,
            cardinality: Cardinality::Optional,
        },
    ],
};

static CONFIG: MessageSchema = MessageSchema {
    name: "Config",
    fields: &[
        FieldDescriptor {
            number: 1,
            name: "level",
            kind: FieldKind::Uint64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            number: 2,
            name: "peer",
            kind: FieldKind::Message(&NODE),
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            number: 3,
            name: "labels",
            kind: FieldKind::Str,
            cardinality: Cardinality::Repeated,
        },
    ],
};

// Encodes both messages and decodes the concatenation, as if one stream
// carried records for the same message twice.
fn decode_concatenated(first: &Message, second: &Message) -> Message {
    let mut stream = BytesMut::new();
    stream.extend_from_slice(&encode(first).unwrap());
    stream.extend_from_slice(&encode(second).unwrap());
    decode(&CONFIG, &mut stream.freeze()).unwrap()
}

#[test]
fn test_duplicate_scalar_records_last_wins() {
    let mut first = Message::new(&CONFIG);
    first.set_u64(1, 1);
    let mut second = Message::new(&CONFIG);
    second.set_u64(1, 7);

    let merged = decode_concatenated(&first, &second);
    assert_eq!(merged.get_u64(1), Some(7));
}

#[test]
fn test_duplicate_embedded_messages_merge_fieldwise() {
    let mut with_host = Message::new(&NODE);
    with_host.set_str(1, "alpha");
    let mut first = Message::new(&CONFIG);
    first.set_message(2, with_host);

    let mut with_port = Message::new(&NODE);
    with_port.set_u64(2, 9000);
    let mut second = Message::new(&CONFIG);
    second.set_message(2, with_port);

    // Distinct fields of the two records both survive.
    let merged = decode_concatenated(&first, &second);
    let peer = merged.get_message(2).unwrap();
    assert_eq!(peer.get_str(1), Some("alpha"));
    assert_eq!(peer.get_u64(2), Some(9000));
}

#[test]
fn test_embedded_merge_overwrites_colliding_scalars() {
    let mut old_port = Message::new(&NODE);
    old_port.set_u64(2, 1);
    let mut first = Message::new(&CONFIG);
    first.set_message(2, old_port);

    let mut new_port = Message::new(&NODE);
    new_port.set_u64(2, 2);
    let mut second = Message::new(&CONFIG);
    second.set_message(2, new_port);

    let merged = decode_concatenated(&first, &second);
    assert_eq!(merged.get_message(2).unwrap().get_u64(2), Some(2));
}

#[test]
fn test_repeated_fields_append_across_records() {
    let mut first = Message::new(&CONFIG);
    first.push_str(3, "a");
    first.push_str(3, "b");
    let mut second = Message::new(&CONFIG);
    second.push_str(3, "c");

    let merged = decode_concatenated(&first, &second);
    assert_eq!(
        merged.repeated(3),
        vec![
            Value::Str("a".into()),
            Value::Str("b".into()),
            Value::Str("c".into()),
        ]
    );
}

#[test]
fn test_merge_accumulates_separate_buffers() {
    let mut first = Message::new(&CONFIG);
    first.set_u64(1, 3);
    first.push_str(3, "x");
    let mut second = Message::new(&CONFIG);
    second.push_str(3, "y");

    let mut target = Message::new(&CONFIG);
    target.merge(&mut encode(&first).unwrap()).unwrap();
    target.merge(&mut encode(&second).unwrap()).unwrap();

    assert_eq!(target.get_u64(1), Some(3));
    assert_eq!(
        target.repeated(3),
        vec![Value::Str("x".into()), Value::Str("y".into())]
    );
}

#[test]
fn test_merge_keeps_existing_fields_not_in_stream() {
    let mut target = Message::new(&CONFIG);
    target.set_u64(1, 5);

    let mut update = Message::new(&CONFIG);
    update.push_str(3, "late");
    target.merge(&mut encode(&update).unwrap()).unwrap();

    assert_eq!(target.get_u64(1), Some(5));
    assert_eq!(target.repeated(3), vec![Value::Str("late".into())]);
}
