use tagbuf::prelude::*;
use tagbuf::tag::{TAG_BOOL, TAG_I32, TAG_TEXT};

#[derive(Clone, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl Record for Point {
    fn name() -> &'static str {
        "Point"
    }

    fn empty() -> Self {
        Point { x: 0, y: 0 }
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                name: "x",
                kind: Kind::I32,
                get: |r: &Point| Some(Value::I32(r.x)),
                set: |r: &mut Point, v: Value| {
                    r.x = v.try_into()?;
                    Ok(())
                },
            },
            Field {
                name: "y",
                kind: Kind::I32,
                get: |r: &Point| Some(Value::I32(r.y)),
                set: |r: &mut Point, v: Value| {
                    r.y = v.try_into()?;
                    Ok(())
                },
            },
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Label {
    origin: Point,
    text: String,
}

impl Record for Label {
    fn name() -> &'static str {
        "Label"
    }

    fn empty() -> Self {
        Label {
            origin: Point::empty(),
            text: String::new(),
        }
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                name: "origin",
                kind: nested::<Point>(),
                get: |r: &Label| r.origin.to_value(),
                set: |r: &mut Label, v: Value| {
                    r.origin = Point::of_value(v)?;
                    Ok(())
                },
            },
            Field {
                name: "text",
                kind: Kind::Text,
                get: |r: &Label| Some(Value::Text(r.text.clone())),
                set: |r: &mut Label, v: Value| {
                    r.text = v.try_into()?;
                    Ok(())
                },
            },
        ]
    }
}

#[test]
fn nested_record_is_flattened_in_place() {
    let label = Label {
        origin: Point { x: 1, y: -1 },
        text: "hi".to_string(),
    };
    let buf = encode(&label).unwrap();
    #[rustfmt::skip]
    let expected: &[u8] = &[
        TAG_I32 as u8, 0, 0, 0,
        1, 0, 0, 0,
        TAG_I32 as u8, 0, 0, 0,
        0xFF, 0xFF, 0xFF, 0xFF,
        TAG_TEXT as u8, 0, 0, 0,
        2, 0, 0, 0,
        b'h', b'i',
    ];
    assert_eq!(&buf[..], expected);

    let back: Label = decode(&buf).unwrap();
    assert_eq!(back, label);
}

#[test]
fn text_prefix_counts_bytes_not_characters() {
    let label = Label {
        origin: Point { x: 0, y: 0 },
        text: "héllo".to_string(),
    };
    let buf = encode(&label).unwrap();
    // two i32 fields, then the text tag, then the byte count
    let prefix_at = 2 * 8 + 4;
    let count = u32::from_le_bytes([
        buf[prefix_at],
        buf[prefix_at + 1],
        buf[prefix_at + 2],
        buf[prefix_at + 3],
    ]);
    assert_eq!(count as usize, "héllo".len());
    assert_eq!(count, 6);

    let back: Label = decode(&buf).unwrap();
    assert_eq!(back.text, "héllo");
}

#[test]
fn invalid_utf8_text_payload_is_a_value_error() {
    let label = Label {
        origin: Point { x: 0, y: 0 },
        text: "ab".to_string(),
    };
    let mut raw = encode(&label).unwrap().to_vec();
    let payload_at = raw.len() - 2;
    raw[payload_at] = 0xFF;
    let err = decode::<Label>(&raw).unwrap_err();
    assert!(!err.is_structural());
    assert_eq!(err.field(), "text");
}

#[test]
fn descriptors_built_concurrently_agree() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                let d = Point::descriptor();
                d as *const _ as usize
            })
        })
        .collect();
    let ptrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ptrs.iter().all(|p| *p == ptrs[0]));
}

#[derive(Clone, Debug, PartialEq)]
struct Node {
    id: u32,
    next: Option<Box<Node>>,
}

impl Record for Node {
    fn name() -> &'static str {
        "Node"
    }

    fn empty() -> Self {
        Node { id: 0, next: None }
    }

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field {
                name: "id",
                kind: Kind::U32,
                get: |r: &Node| Some(Value::U32(r.id)),
                set: |r: &mut Node, v: Value| {
                    r.id = v.try_into()?;
                    Ok(())
                },
            },
            Field {
                name: "next",
                kind: nested::<Node>(),
                get: |r: &Node| match &r.next {
                    Some(n) => n.to_value(),
                    None => Some(Value::Unknown),
                },
                set: |r: &mut Node, v: Value| {
                    r.next = Some(Box::new(Node::of_value(v)?));
                    Ok(())
                },
            },
        ]
    }
}

#[test]
fn self_referential_record_cannot_be_laid_out() {
    // the descriptor still builds, with the cyclic edge degraded
    let shape = Node::shape();
    assert_eq!(shape.fields[1], ("next", Kind::Unknown));

    let err = encode(&Node { id: 1, next: None }).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(err.field(), "next");

    // decoding hits the same wall before any payload is trusted
    let raw = [
        tagbuf::tag::TAG_U32 as u8, 0, 0, 0,
        1, 0, 0, 0,
    ];
    let err = decode::<Node>(&raw).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(err.field(), "next");
}

#[derive(Clone, Debug, PartialEq)]
struct Profile {
    nick: Option<String>,
}

impl Record for Profile {
    fn name() -> &'static str {
        "Profile"
    }

    fn empty() -> Self {
        Profile { nick: None }
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field {
            name: "nick",
            kind: Kind::Text,
            get: |r: &Profile| r.nick.clone().map(Value::Text),
            set: |r: &mut Profile, v: Value| {
                r.nick = Some(v.try_into()?);
                Ok(())
            },
        }]
    }
}

#[test]
fn absent_value_is_a_value_error_naming_the_field() {
    let err = encode(&Profile { nick: None }).unwrap_err();
    assert!(!err.is_structural());
    assert_eq!(err.field(), "nick");
}

#[derive(Clone, Debug, PartialEq)]
struct Flag {
    on: bool,
}

impl Record for Flag {
    fn name() -> &'static str {
        "Flag"
    }

    fn empty() -> Self {
        Flag { on: false }
    }

    fn fields() -> Vec<Field<Self>> {
        vec![Field {
            name: "on",
            kind: Kind::Bool,
            get: |r: &Flag| Some(Value::Bool(r.on)),
            set: |r: &mut Flag, v: Value| {
                r.on = v.try_into()?;
                Ok(())
            },
        }]
    }
}

#[test]
fn boolean_payload_must_be_zero_or_one() {
    let raw = [TAG_BOOL as u8, 0, 0, 0, 2];
    let err = decode::<Flag>(&raw).unwrap_err();
    assert!(!err.is_structural());
    assert_eq!(err.field(), "on");
}

#[test]
fn unrecognized_wire_tag_is_rejected() {
    let raw = [99u8, 0, 0, 0, 1];
    let err = decode::<Flag>(&raw).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(err.field(), "on");
    assert_eq!(err.offset(), 0);
}

#[test]
fn lying_length_prefix_is_caught_before_the_payload_read() {
    let label = Label {
        origin: Point { x: 0, y: 0 },
        text: "abcd".to_string(),
    };
    let mut raw = encode(&label).unwrap().to_vec();
    // claim far more payload than the buffer holds
    let prefix_at = 2 * 8 + 4;
    raw[prefix_at..prefix_at + 4].copy_from_slice(&1000u32.to_le_bytes());
    let err = decode::<Label>(&raw).unwrap_err();
    assert!(err.is_structural());
    assert_eq!(err.field(), "text");
}

#[test]
fn diagnostic_sink_never_affects_the_outcome() {
    let label = Label {
        origin: Point { x: 3, y: 4 },
        text: "ok".to_string(),
    };
    let sink = LogSink;

    let plain = encode(&label).unwrap();
    let observed = Encoder::with_diagnostics(&sink).encode(&label).unwrap();
    assert_eq!(plain, observed);

    let back: Label = Decoder::with_diagnostics(&sink).decode(&observed).unwrap();
    assert_eq!(back, label);

    let err = Decoder::with_diagnostics(&sink)
        .decode::<Label>(&observed[..3])
        .unwrap_err();
    assert!(err.is_structural());
}
