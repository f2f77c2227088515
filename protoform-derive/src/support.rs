//! Types and functions related to parsing the input from our proc-macro.

use core::ops::RangeInclusive;
use darling::FromMeta;
use proc_macro2::{Ident, Span};
use syn::spanned::Spanned;
use syn::{Field, Result, Type};

/// Minimum value of a protobuf tag.
const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a protobuf tag.
const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;
/// Range of tag values that is reserved by Google.
const RESERVED_TAG_RANGE: RangeInclusive<u32> = 19000..=19999;

/// `kind = "..."` names and the `WireKind` variants they select.
const KIND_NAMES: &[(&str, &str)] = &[
    ("int32", "Int32"),
    ("int64", "Int64"),
    ("uint32", "UInt32"),
    ("uint64", "UInt64"),
    ("sint32", "Sint32"),
    ("sint64", "Sint64"),
    ("fixed32", "Fixed32"),
    ("fixed64", "Fixed64"),
    ("sfixed32", "Sfixed32"),
    ("sfixed64", "Sfixed64"),
    ("float", "Float"),
    ("double", "Double"),
    ("bool", "Bool"),
    ("string", "String"),
    ("bytes", "Bytes"),
    ("message", "Message"),
];

/// Metadata for a single field annotated with `#[proto(...)]`.
pub struct FieldMetadata<'a> {
    /// Name of the field.
    pub name: &'a Ident,
    /// Type of the value(s) stored in the field, with any `Option` or `Vec` removed.
    pub value_ty: &'a Type,
    pub tag: u32,
    pub storage: StorageKind,
    /// `WireKind` variant overriding the value type's default kind.
    pub kind: Option<Ident>,
    pub unpacked: bool,
}

/// How the field holds its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Normal kind of field, if not present will deserialize to the default value.
    Single,
    /// Optional field, if not present will deserialize to `None`.
    Optional,
    /// Repeated field, if not present will deserialize to an empty `Vec`.
    Repeated,
}

/// Raw attributes parsed from `#[proto(...)]` on a field.
///
/// We parse these and then transform them into a [`FieldMetadata`] with [`parse_field_metadata`].
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct RawProtoFieldAttrs {
    tag: Option<u32>,
    repeated: bool,
    optional: bool,
    kind: Option<String>,
    unpacked: bool,
}

/// Parse `#[proto(...)]` attributes from a [`Field`], validates them, and returns
/// a complete [`FieldMetadata`].
///
/// Returns `None` for fields without a `#[proto(...)]` attribute, they are not
/// part of the wire format.
pub fn parse_field_metadata(field: &Field) -> Result<Option<FieldMetadata<'_>>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("proto")) else {
        return Ok(None);
    };
    let raw = RawProtoFieldAttrs::from_meta(&attr.meta)
        .map_err(|e| syn::Error::new_spanned(field, e.to_string()))?;

    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "only named fields supported"))?;

    let tag = raw
        .tag
        .ok_or_else(|| syn::Error::new_spanned(field, "missing #[proto(tag = N)] attribute"))?;
    validate_tag(tag, field.span())?;

    let storage = match (raw.repeated, raw.optional) {
        (false, false) => StorageKind::Single,
        (false, true) => StorageKind::Optional,
        (true, false) => StorageKind::Repeated,
        (true, true) => {
            return Err(syn::Error::new_spanned(
                field,
                "conflicting field attributes",
            ))
        }
    };

    if raw.unpacked && storage != StorageKind::Repeated {
        return Err(syn::Error::new_spanned(
            field,
            "'unpacked' is only valid for repeated fields",
        ));
    }

    let value_ty = match storage {
        StorageKind::Single => &field.ty,
        StorageKind::Optional => extract_inner_type(&field.ty, "Option").ok_or_else(|| {
            syn::Error::new_spanned(&field.ty, "optional fields must have type Option<T>")
        })?,
        StorageKind::Repeated => extract_inner_type(&field.ty, "Vec").ok_or_else(|| {
            syn::Error::new_spanned(&field.ty, "repeated fields must have type Vec<T>")
        })?,
    };

    let kind = raw
        .kind
        .map(|kind| parse_kind(&kind, attr.span()))
        .transpose()?;

    Ok(Some(FieldMetadata {
        name,
        value_ty,
        tag,
        storage,
        kind,
        unpacked: raw.unpacked,
    }))
}

/// Maps a `.proto` type name onto its `WireKind` variant.
fn parse_kind(name: &str, span: Span) -> Result<Ident> {
    KIND_NAMES
        .iter()
        .find(|(proto, _)| *proto == name)
        .map(|(_, variant)| Ident::new(variant, span))
        .ok_or_else(|| {
            let valid: Vec<&str> = KIND_NAMES.iter().map(|(proto, _)| *proto).collect();
            syn::Error::new(
                span,
                format!("unknown kind '{name}', expected one of: {}", valid.join(", ")),
            )
        })
}

/// Validates that a tag number is within the valid Protocol Buffers range.
pub fn validate_tag(tag: u32, span: Span) -> Result<()> {
    if !(MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&tag) || RESERVED_TAG_RANGE.contains(&tag) {
        let msg = format!(
            "Tag number '{}' is invalid. Valid tag numbers are in the range [{}, {}], excluding [{}, {}]",
            tag,
            MINIMUM_TAG_VAL,
            MAXIMUM_TAG_VAL,
            RESERVED_TAG_RANGE.start(),
            RESERVED_TAG_RANGE.end(),
        );
        return Err(syn::Error::new(span, msg));
    }

    Ok(())
}

/// Returns `T` for a type written as `Wrapper<T>`.
fn extract_inner_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
