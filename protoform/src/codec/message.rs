//! Nested record fields.
//!
//! The nested record type is erased behind [`MessageDecl`] while declaring and
//! [`MessageField`] once resolved, so a record's field table can hold fields of
//! any nested type.

use std::sync::Arc;

use crate::codec::{Codec, SizeCache};
use crate::descriptor::{FieldDescriptor, ProtoRecord, RecordType, Storage};
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::kind::Cardinality;
use crate::registry::Registry;
use crate::resolve::Resolving;
use crate::wire::{encoded_len_prefix_len, split_len_delimited, WireType, WireWriter};

/// A declared, not yet resolved, nested record field.
pub(crate) trait MessageDecl<M>: Send + Sync {
    fn record_type(&self) -> RecordType;
    fn cardinality(&self) -> Cardinality;
    fn is_optional(&self) -> bool;

    /// Resolves the nested record's codec and binds it to this field.
    fn bind(
        self: Box<Self>,
        registry: &Registry,
        resolving: &mut Resolving,
    ) -> Result<Box<dyn MessageField<M>>, SchemaError>;
}

/// A nested record field bound to the nested record's codec.
pub(crate) trait MessageField<M>: Send + Sync {
    fn record_type(&self) -> RecordType;

    fn compute_size(&self, field: &FieldDescriptor<M>, msg: &M, cache: &mut SizeCache) -> usize;

    fn encode(
        &self,
        field: &FieldDescriptor<M>,
        msg: &M,
        cache: &SizeCache,
        writer: &mut WireWriter<'_>,
    ) -> Result<(), EncodeError>;

    /// Applies one occurrence of the field from the wire.
    ///
    /// Returns `false`, without consuming anything, for any wire type but `Len`.
    fn merge(&self, wire_type: WireType, msg: &mut M, buf: &mut &[u8]) -> Result<bool, DecodeError>;

    /// Resets the field to its value when absent from the wire.
    fn fill_default(&self, msg: &mut M);
}

pub(crate) struct NestedDecl<M, N> {
    storage: Storage<M, N>,
}

impl<M, N> NestedDecl<M, N> {
    pub(crate) fn new(storage: Storage<M, N>) -> Self {
        NestedDecl { storage }
    }
}

impl<M: 'static, N: ProtoRecord> MessageDecl<M> for NestedDecl<M, N> {
    fn record_type(&self) -> RecordType {
        RecordType::of::<N>()
    }

    fn cardinality(&self) -> Cardinality {
        self.storage.cardinality()
    }

    fn is_optional(&self) -> bool {
        self.storage.is_optional()
    }

    fn bind(
        self: Box<Self>,
        registry: &Registry,
        resolving: &mut Resolving,
    ) -> Result<Box<dyn MessageField<M>>, SchemaError> {
        let codec = registry.resolve::<N>(resolving)?;
        Ok(Box::new(NestedField {
            storage: self.storage,
            codec,
        }))
    }
}

struct NestedField<M, N> {
    storage: Storage<M, N>,
    codec: Arc<Codec<N>>,
}

impl<M, N: ProtoRecord> NestedField<M, N> {
    fn framed_len(&self, key_len: usize, nested: &N, cache: &mut SizeCache) -> usize {
        let body = self.codec.compute_size(nested, cache);
        key_len + encoded_len_prefix_len(body) + body
    }

    fn write_framed(
        &self,
        number: u32,
        nested: &N,
        cache: &SizeCache,
        writer: &mut WireWriter<'_>,
    ) -> Result<(), EncodeError> {
        let body = cache.encoded_len(nested).ok_or(EncodeError::MissingSize {
            record: N::record_name(),
        })?;
        writer.put_key(WireType::Len, number)?;
        writer.put_len(body)?;
        self.codec.encode_body(nested, cache, writer)
    }
}

impl<M: 'static, N: ProtoRecord> MessageField<M> for NestedField<M, N> {
    fn record_type(&self) -> RecordType {
        self.codec.record_type()
    }

    fn compute_size(&self, field: &FieldDescriptor<M>, msg: &M, cache: &mut SizeCache) -> usize {
        match &self.storage {
            Storage::Single(access) => self.framed_len(field.key_len, access.get(msg), cache),
            Storage::Optional(access) => match access.get(msg) {
                Some(nested) => self.framed_len(field.key_len, nested, cache),
                None => 0,
            },
            Storage::Repeated(access) => access
                .get(msg)
                .iter()
                .map(|nested| self.framed_len(field.key_len, nested, cache))
                .sum(),
        }
    }

    fn encode(
        &self,
        field: &FieldDescriptor<M>,
        msg: &M,
        cache: &SizeCache,
        writer: &mut WireWriter<'_>,
    ) -> Result<(), EncodeError> {
        match &self.storage {
            Storage::Single(access) => self.write_framed(field.number, access.get(msg), cache, writer),
            Storage::Optional(access) => match access.get(msg) {
                Some(nested) => self.write_framed(field.number, nested, cache, writer),
                None => Ok(()),
            },
            Storage::Repeated(access) => {
                for nested in access.get(msg) {
                    self.write_framed(field.number, nested, cache, writer)?;
                }
                Ok(())
            }
        }
    }

    fn merge(&self, wire_type: WireType, msg: &mut M, buf: &mut &[u8]) -> Result<bool, DecodeError> {
        if wire_type != WireType::Len {
            return Ok(false);
        }

        let nested = self.codec.decode(split_len_delimited(buf)?)?;
        match &self.storage {
            Storage::Single(access) => *access.get_mut(msg) = nested,
            Storage::Optional(access) => *access.get_mut(msg) = Some(nested),
            Storage::Repeated(access) => access.get_mut(msg).push(nested),
        }
        Ok(true)
    }

    fn fill_default(&self, msg: &mut M) {
        match &self.storage {
            // Non-optional records are never left blank.
            Storage::Single(access) => *access.get_mut(msg) = self.codec.default_instance(),
            Storage::Optional(access) => *access.get_mut(msg) = None,
            Storage::Repeated(access) => access.get_mut(msg).clear(),
        }
    }
}
