//! Descriptor resolution: a record's declarations become a validated field
//! table sorted by field number.

use crate::codec::scalar::ScalarValue;
use crate::descriptor::{FieldAccessor, FieldDecl, FieldDescriptor, ProtoRecord, RecordType, Slot};
use crate::error::SchemaError;
use crate::kind::{Cardinality, ScalarKind, WireKind};
use crate::registry::Registry;
use crate::wire::{encoded_key_len, is_valid_field_number};

/// Records currently being resolved, outermost first.
///
/// A record that reaches itself through its message fields would otherwise
/// recurse without bound.
#[derive(Debug, Default)]
pub(crate) struct Resolving {
    stack: Vec<RecordType>,
}

impl Resolving {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&mut self, record: RecordType) -> Result<(), SchemaError> {
        if let Some(start) = self.stack.iter().position(|open| *open == record) {
            let path = self.stack[start..]
                .iter()
                .chain(core::iter::once(&record))
                .map(RecordType::name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(SchemaError::RecursiveType { path });
        }
        self.stack.push(record);
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.stack.pop();
    }
}

/// Resolves the fields of `M`, binding nested records through `registry`.
pub(crate) fn resolve_fields<M: ProtoRecord>(
    registry: &Registry,
    resolving: &mut Resolving,
) -> Result<Vec<FieldDescriptor<M>>, SchemaError> {
    let record = M::record_name();
    let mut decls = M::fields();
    decls.sort_by_key(|decl| decl.number);

    for decl in &decls {
        if !is_valid_field_number(decl.number) {
            return Err(SchemaError::InvalidFieldNumber {
                record,
                field: decl.name,
                number: decl.number,
            });
        }
    }
    if let Some(pair) = decls.windows(2).find(|pair| pair[0].number == pair[1].number) {
        return Err(SchemaError::DuplicateFieldNumber {
            record,
            number: pair[0].number,
            first: pair[0].name,
            second: pair[1].name,
        });
    }

    decls
        .into_iter()
        .map(|decl| resolve_field(record, decl, registry, resolving))
        .collect()
}

fn scalar_kind<V: ScalarValue>(kind: WireKind) -> Option<ScalarKind> {
    kind.scalar().filter(|scalar| V::KINDS.contains(scalar))
}

fn resolve_field<M: 'static>(
    record: &'static str,
    decl: FieldDecl<M>,
    registry: &Registry,
    resolving: &mut Resolving,
) -> Result<FieldDescriptor<M>, SchemaError> {
    let FieldDecl {
        name,
        number,
        kind,
        packing_disabled,
        slot,
    } = decl;

    let kind = kind.unwrap_or_else(|| slot.default_kind());
    let cardinality = slot.cardinality();
    let optional = slot.is_optional();
    let value_type = slot.value_type();
    let unsupported = move || SchemaError::UnsupportedFieldType {
        record,
        field: name,
        value_type,
        kind,
    };

    let accessor = match slot {
        Slot::I32(storage) => FieldAccessor::I32(storage, scalar_kind::<i32>(kind).ok_or_else(unsupported)?),
        Slot::I64(storage) => FieldAccessor::I64(storage, scalar_kind::<i64>(kind).ok_or_else(unsupported)?),
        Slot::U32(storage) => FieldAccessor::U32(storage, scalar_kind::<u32>(kind).ok_or_else(unsupported)?),
        Slot::U64(storage) => FieldAccessor::U64(storage, scalar_kind::<u64>(kind).ok_or_else(unsupported)?),
        Slot::F32(storage) => FieldAccessor::F32(storage, scalar_kind::<f32>(kind).ok_or_else(unsupported)?),
        Slot::F64(storage) => FieldAccessor::F64(storage, scalar_kind::<f64>(kind).ok_or_else(unsupported)?),
        Slot::Bool(storage) => {
            FieldAccessor::Bool(storage, scalar_kind::<bool>(kind).ok_or_else(unsupported)?)
        }
        Slot::String(storage) if kind == WireKind::String => FieldAccessor::String(storage),
        Slot::Bytes(storage) if kind == WireKind::Bytes => FieldAccessor::Bytes(storage),
        Slot::Message(nested) if kind == WireKind::Message => {
            FieldAccessor::Message(nested.0.bind(registry, resolving)?)
        }
        Slot::String(_) | Slot::Bytes(_) | Slot::Message(_) => return Err(unsupported()),
    };

    // String, bytes and message fields are never packed.
    let packed = cardinality == Cardinality::Repeated && kind.is_packable() && !packing_disabled;

    Ok(FieldDescriptor {
        name,
        number,
        kind,
        cardinality,
        packed,
        optional,
        key_len: encoded_key_len(number),
        accessor,
    })
}
