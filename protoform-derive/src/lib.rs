//! Derive macro for protoform.
//!
//! Provides `#[derive(ProtoRecord)]`, which turns `#[proto(...)]` field
//! attributes into the field declarations a protoform codec is resolved from.

use std::collections::BTreeMap;

use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::{DeriveInput, Result};

use crate::support::{parse_field_metadata, FieldMetadata, StorageKind};

mod support;
#[cfg(test)]
mod tests;

/// Derive macro for implementing the `ProtoRecord` and `ProtoValue` traits.
///
/// Note: You must also derive or implement `Default` for your struct.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, ProtoRecord)]
/// pub struct Person {
///     #[proto(tag = 1)]
///     name: String,
///     #[proto(tag = 2, kind = "sint32")]
///     id: i32,
///     #[proto(tag = 3, optional)]
///     email: Option<String>,
///     #[proto(tag = 4, repeated)]
///     phones: Vec<PhoneNumber>,
///     #[proto(tag = 5, repeated, unpacked)]
///     scores: Vec<u32>,
///     // Not part of the wire format.
///     cached_display_name: String,
/// }
/// ```
///
/// The wire kind of each field defaults to the one of its value type (`i32`
/// is `int32`, `String` is `string`, records are `message`, ...) and can be
/// overridden with `kind = "..."`. Fields without `#[proto(...)]` are neither
/// encoded nor touched by decoding.
#[proc_macro_derive(ProtoRecord, attributes(proto))]
pub fn derive_proto_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match impl_proto_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_proto_record(input: &DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic records are not supported",
        ));
    }

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "only named fields supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "only structs supported")),
    };

    let mut field_info = Vec::new();
    for field in fields {
        if let Some(metadata) = parse_field_metadata(field)? {
            field_info.push(metadata);
        }
    }
    check_duplicate_tags(&field_info)?;

    let record_name = name.to_string();
    let decls = field_info.iter().map(generate_field_decl);

    Ok(quote! {
        impl ::protoform::ProtoRecord for #name {
            fn fields() -> ::std::vec::Vec<::protoform::FieldDecl<Self>> {
                ::std::vec::Vec::from([#(#decls),*])
            }

            fn record_name() -> &'static str {
                #record_name
            }
        }

        impl ::protoform::ProtoValue for #name {
            #[inline]
            fn slot<M: 'static>(field: ::protoform::Storage<M, Self>) -> ::protoform::Slot<M> {
                ::protoform::Slot::message(field)
            }
        }
    })
}

/// Rejects two fields declaring the same tag, pointing at the second one.
fn check_duplicate_tags(fields: &[FieldMetadata<'_>]) -> Result<()> {
    let mut seen = BTreeMap::new();
    for field in fields {
        if let Some(first) = seen.insert(field.tag, field.name) {
            return Err(syn::Error::new_spanned(
                field.name,
                format!(
                    "tag {} is used by both '{}' and '{}'",
                    field.tag, first, field.name
                ),
            ));
        }
    }
    Ok(())
}

/// Generates the `FieldDecl` expression for a single field.
fn generate_field_decl(field: &FieldMetadata<'_>) -> TokenStream2 {
    let ident = field.name;
    let name = ident.to_string();
    let tag = Literal::u32_unsuffixed(field.tag);
    let value_ty = field.value_ty;

    let constructor = match field.storage {
        StorageKind::Single => quote!(single),
        StorageKind::Optional => quote!(optional),
        StorageKind::Repeated => quote!(repeated),
    };
    let kind = field
        .kind
        .as_ref()
        .map(|kind| quote!(.kind(::protoform::WireKind::#kind)));
    let unpacked = field.unpacked.then(|| quote!(.unpacked()));

    quote! {
        ::protoform::FieldDecl::new(
            #name,
            #tag,
            ::protoform::Slot::<Self>::#constructor::<#value_ty>(
                |m: &Self| &m.#ident,
                |m: &mut Self| &mut m.#ident,
            ),
        )
        #kind
        #unpacked
    }
}
