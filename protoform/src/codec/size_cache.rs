//! Sizes computed by the first encode pass, read back by the second.

use core::any::TypeId;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::EncodeError;

/// `(field number, payload length)` for each packed field of one instance.
pub(crate) type PackedLengths = SmallVec<[(u32, usize); 4]>;

/// Encoded sizes of record instances, keyed by instance identity.
///
/// One cache lives for the duration of one encode: the size pass fills it and
/// the write pass reads nested body lengths and packed payload lengths back out
/// of it, so nothing is computed twice. Entries are keyed by address, the
/// records must not move or change between the two passes, which borrowing
/// them immutably for the whole encode guarantees.
#[derive(Debug, Default)]
pub(crate) struct SizeCache {
    entries: HashMap<(TypeId, usize), SizeEntry>,
}

#[derive(Debug)]
pub(crate) struct SizeEntry {
    record: &'static str,
    encoded_len: usize,
    packed: PackedLengths,
}

impl SizeEntry {
    pub(crate) fn new(record: &'static str, encoded_len: usize, packed: PackedLengths) -> Self {
        SizeEntry {
            record,
            encoded_len,
            packed,
        }
    }

    /// Payload length of the packed field `number`.
    pub(crate) fn packed_len(&self, number: u32) -> Result<usize, EncodeError> {
        self.packed
            .iter()
            .find(|(field, _)| *field == number)
            .map(|(_, len)| *len)
            .ok_or(EncodeError::MissingSize {
                record: self.record,
            })
    }
}

impl SizeCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of instances sized so far.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(clippy::as_conversions)]
    fn key<M: 'static>(msg: &M) -> (TypeId, usize) {
        (TypeId::of::<M>(), msg as *const M as usize)
    }

    /// The cached encoded size of `msg`, excluding any framing around it.
    pub(crate) fn encoded_len<M: 'static>(&self, msg: &M) -> Option<usize> {
        self.entry(msg).map(|entry| entry.encoded_len)
    }

    pub(crate) fn entry<M: 'static>(&self, msg: &M) -> Option<&SizeEntry> {
        self.entries.get(&Self::key(msg))
    }

    pub(crate) fn insert<M: 'static>(&mut self, msg: &M, entry: SizeEntry) {
        self.entries.insert(Self::key(msg), entry);
    }
}
