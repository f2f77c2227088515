//! Snapshot tests for the derive macro.

use crate::impl_proto_record;
use proc_macro2::TokenStream as TokenStream2;
use syn::{parse_quote, DeriveInput};

/// Format generated tokens as pretty Rust code.
fn format_tokens(tokens: TokenStream2) -> String {
    let file = syn::parse_file(&tokens.to_string()).expect("generated invalid syntax");
    prettyplease::unparse(&file)
}

fn expand_err(input: DeriveInput) -> String {
    match impl_proto_record(&input) {
        Ok(tokens) => panic!("expected an error, got:\n{}", format_tokens(tokens)),
        Err(err) => err.to_string(),
    }
}

#[test]
fn test_simple_record() {
    let input: DeriveInput = parse_quote! {
        struct Person {
            #[proto(tag = 1)]
            name: String,
            #[proto(tag = 2)]
            id: i32,
        }
    };
    let output = impl_proto_record(&input).expect("derive failed");
    insta::assert_snapshot!(format_tokens(output));
}

#[test]
fn test_record_with_optional_and_repeated() {
    let input: DeriveInput = parse_quote! {
        struct Message {
            #[proto(tag = 1, optional)]
            note: Option<String>,
            #[proto(tag = 2, repeated)]
            values: Vec<i64>,
            #[proto(tag = 3, repeated)]
            children: Vec<Child>,
        }
    };
    let output = impl_proto_record(&input).expect("derive failed");
    insta::assert_snapshot!(format_tokens(output));
}

#[test]
fn test_record_with_overrides() {
    let input: DeriveInput = parse_quote! {
        struct Message {
            #[proto(tag = 1, kind = "sint32")]
            delta: i32,
            #[proto(tag = 2, repeated, unpacked, kind = "fixed64")]
            stamps: Vec<u64>,
        }
    };
    let output = impl_proto_record(&input).expect("derive failed");
    insta::assert_snapshot!(format_tokens(output));
}

#[test]
fn test_fields_without_attribute_are_skipped() {
    let input: DeriveInput = parse_quote! {
        struct Message {
            #[proto(tag = 1)]
            id: u32,
            scratch: Vec<String>,
        }
    };
    let code = format_tokens(impl_proto_record(&input).expect("derive failed"));

    assert!(code.contains("m.id"));
    assert!(!code.contains("scratch"));
}

#[test]
fn test_missing_tag() {
    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(optional)]
            note: Option<String>,
        }
    });
    assert!(err.contains("missing #[proto(tag = N)] attribute"), "{err}");
}

#[test]
fn test_invalid_tags() {
    for tag in [0u32, 19_000, 19_999, 1 << 29] {
        let err = expand_err(parse_quote! {
            struct Message {
                #[proto(tag = #tag)]
                id: i32,
            }
        });
        assert!(err.contains(&format!("Tag number '{tag}' is invalid")), "{err}");
    }
}

#[test]
fn test_duplicate_tags() {
    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 4)]
            a: i32,
            #[proto(tag = 4)]
            b: String,
        }
    });
    assert_eq!(err, "tag 4 is used by both 'a' and 'b'");
}

#[test]
fn test_conflicting_storage() {
    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 1, optional, repeated)]
            a: Vec<i32>,
        }
    });
    assert_eq!(err, "conflicting field attributes");

    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 1, unpacked)]
            a: i32,
        }
    });
    assert_eq!(err, "'unpacked' is only valid for repeated fields");
}

#[test]
fn test_storage_requires_wrapper_type() {
    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 1, optional)]
            a: i32,
        }
    });
    assert_eq!(err, "optional fields must have type Option<T>");

    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 1, repeated)]
            a: Option<i32>,
        }
    });
    assert_eq!(err, "repeated fields must have type Vec<T>");
}

#[test]
fn test_unknown_kind() {
    let err = expand_err(parse_quote! {
        struct Message {
            #[proto(tag = 1, kind = "varint")]
            a: i32,
        }
    });
    assert!(err.starts_with("unknown kind 'varint'"), "{err}");
    assert!(err.contains("sfixed64"), "{err}");
}

#[test]
fn test_unsupported_shapes() {
    let err = expand_err(parse_quote! {
        struct Pair(#[proto(tag = 1)] i32, #[proto(tag = 2)] i32);
    });
    assert_eq!(err, "only named fields supported");

    let err = expand_err(parse_quote! {
        enum Choice {
            A,
        }
    });
    assert_eq!(err, "only structs supported");

    let err = expand_err(parse_quote! {
        struct Wrapper<T> {
            #[proto(tag = 1)]
            inner: T,
        }
    });
    assert_eq!(err, "generic records are not supported");
}
