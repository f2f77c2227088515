//! The per-record codec: size calculation, encoding, decoding and default fill.

use smallvec::SmallVec;

use crate::config::{Config, MismatchPolicy};
use crate::descriptor::{FieldAccessor, FieldDescriptor, ProtoRecord, RecordType};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};
use crate::kind::Cardinality;
use crate::wire::{decode_key, skip_field, WireType, WireWriter};

mod delimited;
pub(crate) mod message;
mod packed;
pub(crate) mod scalar;
mod size_cache;

pub(crate) use size_cache::SizeCache;

use size_cache::{PackedLengths, SizeEntry};

/// Runs `$on_scalar` for numeric and boolean accessors, `$on_delimited` for
/// string and bytes accessors, and `$on_message` for nested records, each arm
/// type-checked against its own storage type.
macro_rules! dispatch {
    (
        $accessor:expr,
        scalar($storage:ident, $kind:ident) => $on_scalar:expr,
        delimited($bytes:ident) => $on_delimited:expr,
        message($nested:ident) => $on_message:expr $(,)?
    ) => {
        match $accessor {
            FieldAccessor::I32($storage, $kind) => $on_scalar,
            FieldAccessor::I64($storage, $kind) => $on_scalar,
            FieldAccessor::U32($storage, $kind) => $on_scalar,
            FieldAccessor::U64($storage, $kind) => $on_scalar,
            FieldAccessor::F32($storage, $kind) => $on_scalar,
            FieldAccessor::F64($storage, $kind) => $on_scalar,
            FieldAccessor::Bool($storage, $kind) => $on_scalar,
            FieldAccessor::String($bytes) => $on_delimited,
            FieldAccessor::Bytes($bytes) => $on_delimited,
            FieldAccessor::Message($nested) => $on_message,
        }
    };
}

/// Encoder and decoder for one record type.
///
/// Built once by a [`Registry`](crate::registry::Registry) and shared. Fields
/// are kept sorted by number, which is both the encode order and the decode
/// lookup table.
pub struct Codec<M> {
    record: RecordType,
    fields: Vec<FieldDescriptor<M>>,
    config: Config,
}

impl<M: ProtoRecord> Codec<M> {
    /// `fields` must be sorted by number with no duplicates.
    pub(crate) fn new(fields: Vec<FieldDescriptor<M>>, config: Config) -> Self {
        debug_assert!(fields.windows(2).all(|w| w[0].number < w[1].number));
        Codec {
            record: RecordType::of::<M>(),
            fields,
            config,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record
    }

    /// Field descriptors in field number order.
    pub fn fields(&self) -> &[FieldDescriptor<M>] {
        &self.fields
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor<M>> {
        self.fields
            .binary_search_by_key(&number, |field| field.number)
            .ok()
            .map(|index| &self.fields[index])
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Size pass: computes the encoded size of `msg`, recording it (and the
    /// payload length of every packed field) in `cache`.
    ///
    /// Each instance is sized at most once per cache. The cache must not
    /// outlive the borrow of `msg` that the following write pass uses.
    pub(crate) fn compute_size(&self, msg: &M, cache: &mut SizeCache) -> usize {
        if let Some(len) = cache.encoded_len(msg) {
            return len;
        }

        let omit_defaults = self.config.omit_default_scalars;
        let mut packed = PackedLengths::new();
        let mut total = 0;
        for field in &self.fields {
            total += dispatch!(&field.accessor,
                scalar(storage, kind) =>
                    scalar::compute_size(field, storage, *kind, msg, &mut packed, omit_defaults),
                delimited(storage) => delimited::compute_size(field, storage, msg),
                message(nested) => nested.compute_size(field, msg, cache),
            );
        }

        cache.insert(msg, SizeEntry::new(self.record.name(), total, packed));
        total
    }

    /// The number of bytes [`Codec::encode`] produces for `msg`.
    pub fn encoded_len(&self, msg: &M) -> usize {
        self.compute_size(msg, &mut SizeCache::new())
    }

    pub fn encode(&self, msg: &M) -> Result<Vec<u8>, EncodeError> {
        let mut cache = SizeCache::new();
        let len = self.compute_size(msg, &mut cache);
        let mut out = vec![0u8; len];
        self.write(msg, &cache, &mut out)?;
        Ok(out)
    }

    /// Encodes `msg` into the front of `out`, returning the number of bytes written.
    pub fn encode_into(&self, msg: &M, out: &mut [u8]) -> Result<usize, EncodeError> {
        let mut cache = SizeCache::new();
        let len = self.compute_size(msg, &mut cache);
        let remaining = out.len();
        let out = out.get_mut(..len).ok_or(EncodeError::BufferOverflow {
            needed: len,
            remaining,
        })?;
        self.write(msg, &cache, out)?;
        Ok(len)
    }

    /// Write pass over a buffer of exactly the computed size.
    fn write(&self, msg: &M, cache: &SizeCache, out: &mut [u8]) -> Result<(), EncodeError> {
        let expected = out.len();
        let mut writer = WireWriter::new(out);
        self.encode_body(msg, cache, &mut writer)?;

        if writer.remaining() != 0 {
            return Err(EncodeError::SizeMismatch {
                expected,
                written: writer.written(),
            });
        }
        Ok(())
    }

    /// Writes the fields of `msg`, which must already be sized in `cache`.
    pub(crate) fn encode_body(
        &self,
        msg: &M,
        cache: &SizeCache,
        writer: &mut WireWriter<'_>,
    ) -> Result<(), EncodeError> {
        let entry = cache.entry(msg).ok_or(EncodeError::MissingSize {
            record: self.record.name(),
        })?;

        let omit_defaults = self.config.omit_default_scalars;
        for field in &self.fields {
            dispatch!(&field.accessor,
                scalar(storage, kind) =>
                    scalar::encode(field, storage, *kind, msg, entry, omit_defaults, writer)?,
                delimited(storage) => delimited::encode(field, storage, msg, writer)?,
                message(nested) => nested.encode(field, msg, cache, writer)?,
            );
        }
        Ok(())
    }

    pub fn decode(&self, buf: &[u8]) -> Result<M, DecodeError> {
        let mut msg = M::default();
        self.merge(&mut msg, buf)?;
        Ok(msg)
    }

    /// A blank instance with every field default-filled.
    ///
    /// This is what decoding an empty buffer produces.
    pub fn default_instance(&self) -> M {
        let mut msg = M::default();
        for field in &self.fields {
            Self::fill_default(field, &mut msg);
        }
        msg
    }

    fn merge(&self, msg: &mut M, mut buf: &[u8]) -> Result<(), DecodeError> {
        let mut accepted: SmallVec<[bool; 32]> = SmallVec::from_elem(false, self.fields.len());

        while !buf.is_empty() {
            let (wire_type, number) = decode_key(&mut buf)
                .map_err(|err| DecodeError::from(err).within(self.record.name(), 0))?
                .into_parts();
            let Ok(index) = self.fields.binary_search_by_key(&number, |field| field.number) else {
                tracing::trace!(record = self.record.name(), number, ?wire_type, "skipping unknown field");
                skip_field(wire_type, &mut buf)
                    .map_err(|err| DecodeError::from(err).within(self.record.name(), number))?;
                continue;
            };

            let field = &self.fields[index];
            // Wire elements replace whatever `M::default()` put in the list.
            if !accepted[index] && field.cardinality == Cardinality::Repeated {
                Self::fill_default(field, msg);
            }
            let merged = Self::merge_field(field, wire_type, msg, &mut buf)
                .map_err(|err| err.within(self.record.name(), number))?;
            if merged {
                accepted[index] = true;
            } else {
                self.mismatch(field, wire_type, &mut buf)?;
            }
        }

        for (field, accepted) in self.fields.iter().zip(accepted) {
            if !accepted {
                Self::fill_default(field, msg);
            }
        }
        Ok(())
    }

    fn merge_field(
        field: &FieldDescriptor<M>,
        wire_type: WireType,
        msg: &mut M,
        buf: &mut &[u8],
    ) -> Result<bool, DecodeError> {
        dispatch!(&field.accessor,
            scalar(storage, kind) => Ok(scalar::merge(storage, *kind, wire_type, msg, buf)?),
            delimited(storage) => Ok(delimited::merge(storage, wire_type, msg, buf)?),
            message(nested) => nested.merge(wire_type, msg, buf),
        )
    }

    /// A known field arrived with a wire type it cannot carry.
    #[cold]
    fn mismatch(
        &self,
        field: &FieldDescriptor<M>,
        actual: WireType,
        buf: &mut &[u8],
    ) -> Result<(), DecodeError> {
        let expected = field.kind.wire_type();
        match self.config.wire_type_mismatch {
            MismatchPolicy::Skip => {
                tracing::debug!(
                    record = self.record.name(),
                    field = field.name,
                    number = field.number,
                    ?expected,
                    ?actual,
                    "skipping field with mismatched wire type"
                );
                skip_field(actual, buf)
                    .map_err(|err| DecodeError::from(err).within(self.record.name(), field.number))
            }
            MismatchPolicy::Reject => Err(DecodeError::from(DecodeErrorKind::WireTypeMismatch {
                expected,
                actual,
            })
            .within(self.record.name(), field.number)),
        }
    }

    fn fill_default(field: &FieldDescriptor<M>, msg: &mut M) {
        dispatch!(&field.accessor,
            scalar(storage, _kind) => storage.reset(msg),
            delimited(storage) => storage.reset(msg),
            message(nested) => nested.fill_default(msg),
        )
    }
}

impl<M> core::fmt::Debug for Codec<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Codec")
            .field("record", &self.record)
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish()
    }
}
