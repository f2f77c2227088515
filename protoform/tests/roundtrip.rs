//! Integration tests for encoding and decoding derived records.

use proptest::prelude::*;
use proptest::property_test;
use protoform::{Config, ProtoRecord, Registry};

/// The packed run example from the protobuf encoding guide.
#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Packed {
    #[proto(tag = 1)]
    pub field1: i32,
    #[proto(tag = 5, repeated)]
    pub field5: Vec<i32>,
}

/// One field per wire kind.
#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Scalars {
    #[proto(tag = 1)]
    pub int32: i32,
    #[proto(tag = 2)]
    pub int64: i64,
    #[proto(tag = 3)]
    pub uint32: u32,
    #[proto(tag = 4)]
    pub uint64: u64,
    #[proto(tag = 5, kind = "sint32")]
    pub sint32: i32,
    #[proto(tag = 6, kind = "sint64")]
    pub sint64: i64,
    #[proto(tag = 7, kind = "fixed32")]
    pub fixed32: u32,
    #[proto(tag = 8, kind = "fixed64")]
    pub fixed64: u64,
    #[proto(tag = 9, kind = "sfixed32")]
    pub sfixed32: i32,
    #[proto(tag = 10, kind = "sfixed64")]
    pub sfixed64: i64,
    #[proto(tag = 11)]
    pub float: f32,
    #[proto(tag = 12)]
    pub double: f64,
    #[proto(tag = 13)]
    pub flag: bool,
    #[proto(tag = 14)]
    pub text: String,
    #[proto(tag = 15)]
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Item {
    #[proto(tag = 1)]
    pub sku: String,
    #[proto(tag = 2)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Catalog {
    #[proto(tag = 1)]
    pub owner: Scalars,
    #[proto(tag = 2, repeated)]
    pub items: Vec<Item>,
    #[proto(tag = 3, optional)]
    pub featured: Option<Item>,
    #[proto(tag = 4, repeated)]
    pub ids: Vec<i64>,
    #[proto(tag = 5, repeated)]
    pub names: Vec<String>,
    #[proto(tag = 6, repeated, kind = "sfixed32")]
    pub offsets: Vec<i32>,
    #[proto(tag = 7, repeated, unpacked)]
    pub flags: Vec<bool>,
    #[proto(tag = 8, optional, kind = "sint64")]
    pub delta: Option<i64>,
    #[proto(tag = 9, repeated)]
    pub chunks: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Section {
    #[proto(tag = 2, repeated)]
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Report {
    #[proto(tag = 1)]
    pub count: i32,
    #[proto(tag = 2)]
    pub ratio: f64,
    #[proto(tag = 3)]
    pub title: String,
    #[proto(tag = 4)]
    pub published: bool,
    #[proto(tag = 5, repeated)]
    pub counts: Vec<i32>,
    #[proto(tag = 6, repeated)]
    pub ratios: Vec<f64>,
    #[proto(tag = 7, repeated)]
    pub sections: Vec<Section>,
}

fn sample_scalars() -> Scalars {
    Scalars {
        int32: -7,
        int64: i64::MIN,
        uint32: u32::MAX,
        uint64: 1 << 40,
        sint32: -150,
        sint64: i64::MAX,
        fixed32: 0xDEAD_BEEF,
        fixed64: u64::MAX - 1,
        sfixed32: i32::MIN,
        sfixed64: -2,
        float: 1.5,
        double: -0.25,
        flag: true,
        text: "héllo".to_string(),
        blob: vec![0, 1, 2, 0xFF],
    }
}

fn sample_catalog() -> Catalog {
    Catalog {
        owner: sample_scalars(),
        items: vec![
            Item {
                sku: "a-1".to_string(),
                quantity: 3,
            },
            Item::default(),
        ],
        featured: Some(Item {
            sku: "b-2".to_string(),
            quantity: 300,
        }),
        ids: vec![0, -1, 1 << 50],
        names: vec!["x".to_string(), String::new(), "zz".to_string()],
        offsets: vec![-1, 0, 7],
        flags: vec![true, false, true],
        delta: Some(-3),
        chunks: vec![vec![], vec![9, 9]],
    }
}

#[test]
fn test_packed_scenario_bytes() {
    let registry = Registry::new();
    let msg = Packed {
        field1: 42,
        field5: vec![1, 2, 3, 4, 5],
    };

    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(
        bytes,
        [0x08, 0x2A, 0x2A, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05]
    );
    assert_eq!(registry.decode::<Packed>(&bytes).unwrap(), msg);
}

#[test]
fn test_report_roundtrip() {
    let registry = Registry::new();
    let report = Report {
        count: 42,
        ratio: 0.5,
        title: "Hello, World!".to_string(),
        published: true,
        counts: vec![1, 2, 3, 4, 5],
        ratios: vec![0.1, 0.2, 0.3, 0.4, 0.5],
        sections: vec![
            Section {
                lines: vec!["Hello".to_string(), "World".to_string()],
            },
            Section {
                lines: vec!["Goodbye".to_string(), "World".to_string()],
            },
        ],
    };

    let bytes = registry.encode(&report).unwrap();
    assert_eq!(
        bytes[..12],
        [0x08, 0x2A, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xE0, 0x3F, 0x1A]
    );
    // Five packed doubles.
    let ratios = bytes.windows(2).position(|w| w == [0x32, 0x28]);
    assert!(ratios.is_some());

    let decoded: Report = registry.decode(&bytes).unwrap();
    assert_eq!(decoded, report);
    assert_eq!(decoded.sections[1].lines[0], "Goodbye");
}

#[test]
fn test_negative_int32_is_ten_bytes() {
    let registry = Registry::new();
    let msg = Packed {
        field1: -1,
        field5: Vec::new(),
    };

    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(
        bytes,
        [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
    );
    assert_eq!(registry.decode::<Packed>(&bytes).unwrap(), msg);
}

#[test]
fn test_scalars_roundtrip() {
    let registry = Registry::new();
    let msg = sample_scalars();

    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(bytes.len(), registry.encoded_len(&msg).unwrap());
    assert_eq!(registry.decode::<Scalars>(&bytes).unwrap(), msg);
}

#[test]
fn test_nested_roundtrip() {
    let registry = Registry::new();
    let msg = sample_catalog();

    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(bytes.len(), registry.encoded_len(&msg).unwrap());
    assert_eq!(registry.decode::<Catalog>(&bytes).unwrap(), msg);

    // Every record reachable from `Catalog` got a codec.
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_encode_into_buffer() {
    let registry = Registry::new();
    let msg = sample_catalog();
    let expected = registry.encode(&msg).unwrap();

    let mut buf = vec![0xAA; expected.len() + 16];
    let written = registry.encode_into(&msg, &mut buf).unwrap();
    assert_eq!(written, expected.len());
    assert_eq!(&buf[..written], &expected[..]);
    // Bytes past the encoded message are untouched.
    assert!(buf[written..].iter().all(|b| *b == 0xAA));
}

#[test]
fn test_encode_into_too_small() {
    let registry = Registry::new();
    let msg = sample_catalog();
    let len = registry.encoded_len(&msg).unwrap();

    let mut buf = vec![0; len - 1];
    let err = registry.encode_into(&msg, &mut buf).unwrap_err();
    assert_eq!(
        err,
        protoform::Error::Encode(protoform::EncodeError::BufferOverflow {
            needed: len,
            remaining: len - 1,
        })
    );
}

#[test]
fn test_encoded_len_follows_mutation() {
    let registry = Registry::new();
    let codec = registry.codec::<Catalog>().unwrap();
    let mut msg = sample_catalog();

    let before = codec.encode(&msg).unwrap();
    assert_eq!(codec.encoded_len(&msg), before.len());

    msg.names.push("later".to_string());
    let after = codec.encode(&msg).unwrap();
    assert_eq!(codec.encoded_len(&msg), before.len() + 7);
    assert_eq!(after.len(), before.len() + 7);
    assert_eq!(codec.decode(&after).unwrap(), msg);
}

#[test]
fn test_empty_fields_are_not_written() {
    let registry = Registry::new();
    let msg = Item::default();

    // The singular scalar is always written, the empty string is not.
    assert_eq!(registry.encode(&msg).unwrap(), [0x10, 0x00]);
}

#[test]
fn test_omit_default_scalars() {
    let registry = Registry::with_config(*Config::new().omit_default_scalars(true));
    assert!(registry.encode(&Item::default()).unwrap().is_empty());
    assert!(registry.encode(&Scalars::default()).unwrap().is_empty());

    // `Some(0)` is still written.
    let msg = Catalog {
        delta: Some(0),
        ..Catalog::default()
    };
    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(bytes, [0x0A, 0x00, 0x40, 0x00]);
    assert_eq!(registry.decode::<Catalog>(&bytes).unwrap(), msg);
}

#[test]
fn test_unpacked_repeated_bytes() {
    let registry = Registry::new();
    let msg = Catalog {
        flags: vec![true, false],
        ..Catalog::default()
    };

    let bytes = registry.encode(&msg).unwrap();
    // `owner` holds thirteen zero scalars, then one key per flag.
    assert_eq!(bytes[..2], [0x0A, 56]);
    assert_eq!(bytes.len(), 2 + 56 + 4);
    assert!(bytes.ends_with(&[0x38, 0x01, 0x38, 0x00]));
}

#[test]
fn test_fixed_width_packed_bytes() {
    let registry = Registry::with_config(*Config::new().omit_default_scalars(true));
    let msg = Catalog {
        offsets: vec![1, -1],
        ..Catalog::default()
    };

    let bytes = registry.encode(&msg).unwrap();
    assert_eq!(
        bytes,
        [0x0A, 0x00, 0x32, 0x08, 0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

#[property_test]
fn proptest_size_matches_encoding(
    int32: i32,
    sint64: i64,
    fixed32: u32,
    float: f32,
    text: String,
    blob: Vec<u8>,
    ids: Vec<i64>,
    offsets: Vec<i32>,
) {
    let registry = Registry::new();
    let msg = Catalog {
        owner: Scalars {
            int32,
            sint64,
            fixed32,
            float,
            text: text.clone(),
            blob,
            ..Scalars::default()
        },
        items: vec![Item {
            sku: text,
            quantity: fixed32,
        }],
        ids,
        offsets,
        ..Catalog::default()
    };

    let bytes = registry.encode(&msg).unwrap();
    prop_assert_eq!(bytes.len(), registry.encoded_len(&msg).unwrap());

    let decoded = registry.decode::<Catalog>(&bytes).unwrap();
    prop_assert_eq!(decoded.owner.float.to_bits(), float.to_bits());
    prop_assert_eq!(decoded.owner.sint64, sint64);
    prop_assert_eq!(&decoded.items, &msg.items);
    prop_assert_eq!(&decoded.ids, &msg.ids);
    prop_assert_eq!(&decoded.offsets, &msg.offsets);
}
