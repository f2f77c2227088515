//! How record types declare their fields, and the resolved per-field wire
//! contract a [`Codec`](crate::codec::Codec) runs on.
//!
//! A record implements [`ProtoRecord`] and returns one [`FieldDecl`] per wire
//! field. Each declaration carries the field number, optional overrides and a
//! [`Slot`]: a typed accessor pair for the struct field, tagged with the
//! field's value type. Resolution turns declarations into
//! [`FieldDescriptor`]s.

use core::any::TypeId;
use core::fmt;

use crate::codec::message::{MessageDecl, MessageField, NestedDecl};
use crate::codec::scalar::ScalarValue;
use crate::kind::{Cardinality, ScalarKind, WireKind};

/// A record type that can be encoded and decoded.
///
/// `Default` provides the blank instance that decoding starts from.
pub trait ProtoRecord: Default + Send + Sync + 'static {
    /// The wire fields of this record, in any order.
    fn fields() -> Vec<FieldDecl<Self>>;

    /// Name used in errors and logs.
    fn record_name() -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Value types that can be stored in a record field.
///
/// Implemented for the supported primitives, `String`, `Vec<u8>` and, through
/// `#[derive(ProtoRecord)]`, every record type.
pub trait ProtoValue: Sized + Send + Sync + 'static {
    /// Tags `storage` with this value type.
    fn slot<M: 'static>(storage: Storage<M, Self>) -> Slot<M>;
}

macro_rules! impl_proto_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl ProtoValue for $ty {
            #[inline]
            fn slot<M: 'static>(storage: Storage<M, Self>) -> Slot<M> {
                Slot::$variant(storage)
            }
        }
    )+};
}

impl_proto_value! {
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => String,
    Vec<u8> => Bytes,
}

/// A pair of plain functions projecting a record onto one of its fields.
pub struct Access<M, V> {
    get: fn(&M) -> &V,
    get_mut: fn(&mut M) -> &mut V,
}

impl<M, V> Access<M, V> {
    pub const fn new(get: fn(&M) -> &V, get_mut: fn(&mut M) -> &mut V) -> Self {
        Access { get, get_mut }
    }

    #[inline(always)]
    pub fn get<'m>(&self, msg: &'m M) -> &'m V {
        (self.get)(msg)
    }

    #[inline(always)]
    pub fn get_mut<'m>(&self, msg: &'m mut M) -> &'m mut V {
        (self.get_mut)(msg)
    }
}

impl<M, V> Clone for Access<M, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, V> Copy for Access<M, V> {}

/// How a field holds its values.
pub enum Storage<M, V> {
    /// Exactly one value, always present.
    Single(Access<M, V>),
    /// At most one value; `None` when absent from the wire.
    Optional(Access<M, Option<V>>),
    /// Zero or more values.
    Repeated(Access<M, Vec<V>>),
}

impl<M, V> Storage<M, V> {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Storage::Single(_) | Storage::Optional(_) => Cardinality::Singular,
            Storage::Repeated(_) => Cardinality::Repeated,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Storage::Optional(_))
    }
}

impl<M, V: Default> Storage<M, V> {
    /// Resets the field to its value when absent from the wire.
    pub(crate) fn reset(&self, msg: &mut M) {
        match self {
            Storage::Single(access) => *access.get_mut(msg) = V::default(),
            Storage::Optional(access) => *access.get_mut(msg) = None,
            Storage::Repeated(access) => access.get_mut(msg).clear(),
        }
    }
}

impl<M, V> Clone for Storage<M, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, V> Copy for Storage<M, V> {}

/// A field's storage, tagged with its value type.
pub enum Slot<M> {
    I32(Storage<M, i32>),
    I64(Storage<M, i64>),
    U32(Storage<M, u32>),
    U64(Storage<M, u64>),
    F32(Storage<M, f32>),
    F64(Storage<M, f64>),
    Bool(Storage<M, bool>),
    String(Storage<M, String>),
    Bytes(Storage<M, Vec<u8>>),
    Message(NestedSlot<M>),
}

/// Storage of a nested record, erased over the record type.
pub struct NestedSlot<M>(pub(crate) Box<dyn MessageDecl<M>>);

impl<M: 'static> Slot<M> {
    /// A field holding exactly one `V`.
    pub fn single<V: ProtoValue>(get: fn(&M) -> &V, get_mut: fn(&mut M) -> &mut V) -> Self {
        V::slot(Storage::Single(Access::new(get, get_mut)))
    }

    /// A field holding an `Option<V>`, `None` when absent from the wire.
    pub fn optional<V: ProtoValue>(
        get: fn(&M) -> &Option<V>,
        get_mut: fn(&mut M) -> &mut Option<V>,
    ) -> Self {
        V::slot(Storage::Optional(Access::new(get, get_mut)))
    }

    /// A field holding a `Vec<V>`.
    pub fn repeated<V: ProtoValue>(
        get: fn(&M) -> &Vec<V>,
        get_mut: fn(&mut M) -> &mut Vec<V>,
    ) -> Self {
        V::slot(Storage::Repeated(Access::new(get, get_mut)))
    }

    /// Tags `storage` as a nested record field.
    ///
    /// This is what [`ProtoValue::slot`] returns for record types.
    pub fn message<N: ProtoRecord>(storage: Storage<M, N>) -> Self {
        Slot::Message(NestedSlot(Box::new(NestedDecl::new(storage))))
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Slot::I32(storage) => storage.cardinality(),
            Slot::I64(storage) => storage.cardinality(),
            Slot::U32(storage) => storage.cardinality(),
            Slot::U64(storage) => storage.cardinality(),
            Slot::F32(storage) => storage.cardinality(),
            Slot::F64(storage) => storage.cardinality(),
            Slot::Bool(storage) => storage.cardinality(),
            Slot::String(storage) => storage.cardinality(),
            Slot::Bytes(storage) => storage.cardinality(),
            Slot::Message(nested) => nested.0.cardinality(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            Slot::I32(storage) => storage.is_optional(),
            Slot::I64(storage) => storage.is_optional(),
            Slot::U32(storage) => storage.is_optional(),
            Slot::U64(storage) => storage.is_optional(),
            Slot::F32(storage) => storage.is_optional(),
            Slot::F64(storage) => storage.is_optional(),
            Slot::Bool(storage) => storage.is_optional(),
            Slot::String(storage) => storage.is_optional(),
            Slot::Bytes(storage) => storage.is_optional(),
            Slot::Message(nested) => nested.0.is_optional(),
        }
    }

    /// The kind a field of this value type is encoded as without an override.
    pub fn default_kind(&self) -> WireKind {
        match self {
            Slot::I32(_) => i32::DEFAULT_KIND.wire_kind(),
            Slot::I64(_) => i64::DEFAULT_KIND.wire_kind(),
            Slot::U32(_) => u32::DEFAULT_KIND.wire_kind(),
            Slot::U64(_) => u64::DEFAULT_KIND.wire_kind(),
            Slot::F32(_) => f32::DEFAULT_KIND.wire_kind(),
            Slot::F64(_) => f64::DEFAULT_KIND.wire_kind(),
            Slot::Bool(_) => bool::DEFAULT_KIND.wire_kind(),
            Slot::String(_) => WireKind::String,
            Slot::Bytes(_) => WireKind::Bytes,
            Slot::Message(_) => WireKind::Message,
        }
    }

    /// Name of the value type, for error messages.
    pub fn value_type(&self) -> &'static str {
        match self {
            Slot::I32(_) => "i32",
            Slot::I64(_) => "i64",
            Slot::U32(_) => "u32",
            Slot::U64(_) => "u64",
            Slot::F32(_) => "f32",
            Slot::F64(_) => "f64",
            Slot::Bool(_) => "bool",
            Slot::String(_) => "String",
            Slot::Bytes(_) => "Vec<u8>",
            Slot::Message(nested) => nested.0.record_type().name(),
        }
    }
}

/// The declaration of one wire field.
pub struct FieldDecl<M> {
    pub(crate) name: &'static str,
    pub(crate) number: u32,
    pub(crate) kind: Option<WireKind>,
    pub(crate) packing_disabled: bool,
    pub(crate) slot: Slot<M>,
}

impl<M> FieldDecl<M> {
    pub fn new(name: &'static str, number: u32, slot: Slot<M>) -> Self {
        FieldDecl {
            name,
            number,
            kind: None,
            packing_disabled: false,
            slot,
        }
    }

    /// Encode the field as `kind` instead of its value type's default kind.
    pub fn kind(mut self, kind: WireKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Write repeated numeric values one key per element instead of packed.
    pub fn unpacked(mut self) -> Self {
        self.packing_disabled = true;
        self
    }
}

/// Identity and name of a record type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
}

impl RecordType {
    pub fn of<M: ProtoRecord>() -> Self {
        RecordType {
            id: TypeId::of::<M>(),
            name: M::record_name(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType").field(&self.name).finish()
    }
}

/// The resolved wire contract of one field.
pub struct FieldDescriptor<M> {
    pub(crate) name: &'static str,
    pub(crate) number: u32,
    pub(crate) kind: WireKind,
    pub(crate) cardinality: Cardinality,
    pub(crate) packed: bool,
    pub(crate) optional: bool,
    /// Encoded length of this field's key, identical for every wire type.
    pub(crate) key_len: usize,
    pub(crate) accessor: FieldAccessor<M>,
}

impl<M> FieldDescriptor<M> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The nested record type, for message fields.
    pub fn nested_type(&self) -> Option<RecordType> {
        match &self.accessor {
            FieldAccessor::Message(nested) => Some(nested.record_type()),
            _ => None,
        }
    }
}

impl<M> fmt::Debug for FieldDescriptor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("number", &self.number)
            .field("kind", &self.kind)
            .field("cardinality", &self.cardinality)
            .field("packed", &self.packed)
            .field("optional", &self.optional)
            .field("nested_type", &self.nested_type())
            .finish()
    }
}

/// Accessors bound to their wire encoding.
pub(crate) enum FieldAccessor<M> {
    I32(Storage<M, i32>, ScalarKind),
    I64(Storage<M, i64>, ScalarKind),
    U32(Storage<M, u32>, ScalarKind),
    U64(Storage<M, u64>, ScalarKind),
    F32(Storage<M, f32>, ScalarKind),
    F64(Storage<M, f64>, ScalarKind),
    Bool(Storage<M, bool>, ScalarKind),
    String(Storage<M, String>),
    Bytes(Storage<M, Vec<u8>>),
    Message(Box<dyn MessageField<M>>),
}
