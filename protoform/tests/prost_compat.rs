//! Wire compatibility with prost generated messages.

use prost::Message;
use protoform::{Config, ProtoRecord, Registry};

mod prost_types {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PhoneNumber {
        #[prost(string, tag = "1")]
        pub number: String,
        #[prost(int32, tag = "2")]
        pub phone_type: i32,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Person {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(int32, tag = "2")]
        pub id: i32,
        #[prost(sint64, tag = "3")]
        pub delta: i64,
        #[prost(fixed32, tag = "4")]
        pub crc: u32,
        #[prost(double, tag = "5")]
        pub weight: f64,
        #[prost(bool, tag = "6")]
        pub active: bool,
        #[prost(bytes = "vec", tag = "7")]
        pub avatar: Vec<u8>,
        #[prost(message, repeated, tag = "8")]
        pub phones: Vec<PhoneNumber>,
        #[prost(message, optional, tag = "9")]
        pub primary: Option<PhoneNumber>,
        #[prost(int32, repeated, tag = "10")]
        pub scores: Vec<i32>,
        #[prost(string, repeated, tag = "11")]
        pub tags: Vec<String>,
        #[prost(sfixed64, repeated, tag = "12")]
        pub stamps: Vec<i64>,
        #[prost(uint64, tag = "300")]
        pub far: u64,
    }
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct PhoneNumber {
    #[proto(tag = 1)]
    pub number: String,
    #[proto(tag = 2)]
    pub phone_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, ProtoRecord)]
pub struct Person {
    #[proto(tag = 1)]
    pub name: String,
    #[proto(tag = 2)]
    pub id: i32,
    #[proto(tag = 3, kind = "sint64")]
    pub delta: i64,
    #[proto(tag = 4, kind = "fixed32")]
    pub crc: u32,
    #[proto(tag = 5)]
    pub weight: f64,
    #[proto(tag = 6)]
    pub active: bool,
    #[proto(tag = 7)]
    pub avatar: Vec<u8>,
    #[proto(tag = 8, repeated)]
    pub phones: Vec<PhoneNumber>,
    #[proto(tag = 9, optional)]
    pub primary: Option<PhoneNumber>,
    #[proto(tag = 10, repeated)]
    pub scores: Vec<i32>,
    #[proto(tag = 11, repeated)]
    pub tags: Vec<String>,
    #[proto(tag = 12, repeated, kind = "sfixed64")]
    pub stamps: Vec<i64>,
    #[proto(tag = 300)]
    pub far: u64,
}

/// prost omits zero scalars, as proto3 does.
fn registry() -> Registry {
    Registry::with_config(*Config::new().omit_default_scalars(true))
}

fn sample() -> Person {
    Person {
        name: "Grace".to_string(),
        id: -1,
        delta: -123_456_789,
        crc: 0xCAFE_F00D,
        weight: 61.5,
        active: true,
        avatar: vec![0x89, b'P', b'N', b'G'],
        phones: vec![
            PhoneNumber {
                number: "555-0100".to_string(),
                phone_type: 1,
            },
            PhoneNumber::default(),
        ],
        primary: Some(PhoneNumber {
            number: "555-0199".to_string(),
            phone_type: 0,
        }),
        scores: vec![0, 1, -1, 1 << 20],
        tags: vec!["a".to_string(), String::new()],
        stamps: vec![i64::MIN, 0, 42],
        far: u64::MAX,
    }
}

fn to_prost(person: &Person) -> prost_types::Person {
    let phone = |p: &PhoneNumber| prost_types::PhoneNumber {
        number: p.number.clone(),
        phone_type: p.phone_type,
    };
    prost_types::Person {
        name: person.name.clone(),
        id: person.id,
        delta: person.delta,
        crc: person.crc,
        weight: person.weight,
        active: person.active,
        avatar: person.avatar.clone(),
        phones: person.phones.iter().map(phone).collect(),
        primary: person.primary.as_ref().map(phone),
        scores: person.scores.clone(),
        tags: person.tags.clone(),
        stamps: person.stamps.clone(),
        far: person.far,
    }
}

#[test]
fn test_encoding_matches_prost() {
    let person = sample();
    let ours = registry().encode(&person).unwrap();
    let theirs = to_prost(&person).encode_to_vec();
    assert_eq!(ours, theirs);
}

#[test]
fn test_default_encoding_matches_prost() {
    let person = Person::default();
    let ours = registry().encode(&person).unwrap();
    let theirs = to_prost(&person).encode_to_vec();
    assert!(ours.is_empty());
    assert_eq!(ours, theirs);
}

#[test]
fn test_decode_prost_output() {
    let person = sample();
    let theirs = to_prost(&person).encode_to_vec();
    let decoded: Person = Registry::new().decode(&theirs).unwrap();
    assert_eq!(decoded, person);
}

#[test]
fn test_prost_decodes_our_output() {
    let person = sample();
    // Zero scalars written explicitly are accepted by prost too.
    let ours = Registry::new().encode(&person).unwrap();
    let decoded = prost_types::Person::decode(&ours[..]).unwrap();
    assert!(decoded == to_prost(&person));
}
