//! Process-wide memoization of codecs, one per record type.

use core::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::Codec;
use crate::config::Config;
use crate::descriptor::{ProtoRecord, RecordType};
use crate::error::{Error, SchemaError};
use crate::resolve::{resolve_fields, Resolving};

type ErasedCodec = Arc<dyn Any + Send + Sync>;

/// Builds and caches a [`Codec`] per record type.
///
/// Create one registry up front and share it by reference. Lookups only take
/// a read lock; a missing codec is built without holding any lock and then
/// published if no other thread published one first, so concurrent callers
/// always end up sharing a single, fully built codec.
pub struct Registry {
    config: Config,
    codecs: RwLock<HashMap<TypeId, ErasedCodec>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Registry {
            config,
            codecs: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of record types with a published codec, nested records included.
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }

    pub fn contains<M: ProtoRecord>(&self) -> bool {
        self.codecs.read().contains_key(&TypeId::of::<M>())
    }

    /// Returns the codec for `M`, resolving it (and every record it nests) on
    /// first use.
    pub fn codec<M: ProtoRecord>(&self) -> Result<Arc<Codec<M>>, SchemaError> {
        if let Some(codec) = self.lookup::<M>() {
            return Ok(codec);
        }
        self.resolve::<M>(&mut Resolving::new()).map_err(|err| {
            tracing::warn!(record = M::record_name(), %err, "failed to resolve record");
            err
        })
    }

    fn lookup<M: ProtoRecord>(&self) -> Option<Arc<Codec<M>>> {
        let codecs = self.codecs.read();
        let codec = codecs.get(&TypeId::of::<M>())?;
        Arc::clone(codec).downcast::<Codec<M>>().ok()
    }

    pub(crate) fn resolve<M: ProtoRecord>(
        &self,
        resolving: &mut Resolving,
    ) -> Result<Arc<Codec<M>>, SchemaError> {
        if let Some(codec) = self.lookup::<M>() {
            return Ok(codec);
        }

        let record = RecordType::of::<M>();
        resolving.enter(record)?;
        let fields = resolve_fields::<M>(self, resolving);
        resolving.exit();

        let built = Arc::new(Codec::new(fields?, self.config));
        let published = match self.codecs.write().entry(record.id()) {
            Entry::Occupied(existing) => {
                tracing::debug!(record = record.name(), "discarding codec built concurrently");
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => {
                tracing::debug!(
                    record = record.name(),
                    fields = built.fields().len(),
                    "registered codec"
                );
                let erased: ErasedCodec = built.clone();
                Arc::clone(slot.insert(erased))
            }
        };
        // Keyed by `TypeId`, the published codec always has type `Codec<M>`.
        Ok(published.downcast::<Codec<M>>().unwrap_or(built))
    }

    pub fn encode<M: ProtoRecord>(&self, msg: &M) -> Result<Vec<u8>, Error> {
        Ok(self.codec::<M>()?.encode(msg)?)
    }

    /// Encodes `msg` into the front of `out`, returning the number of bytes written.
    pub fn encode_into<M: ProtoRecord>(&self, msg: &M, out: &mut [u8]) -> Result<usize, Error> {
        Ok(self.codec::<M>()?.encode_into(msg, out)?)
    }

    pub fn encoded_len<M: ProtoRecord>(&self, msg: &M) -> Result<usize, Error> {
        Ok(self.codec::<M>()?.encoded_len(msg))
    }

    pub fn decode<M: ProtoRecord>(&self, buf: &[u8]) -> Result<M, Error> {
        Ok(self.codec::<M>()?.decode(buf)?)
    }

    /// The instance decoding an empty buffer produces.
    pub fn default_instance<M: ProtoRecord>(&self) -> Result<M, Error> {
        Ok(self.codec::<M>()?.default_instance())
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("records", &self.len())
            .finish()
    }
}
