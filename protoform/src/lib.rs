//! Schema-less [protobuf](https://protobuf.dev) codec.
//!
//! Record types are plain structs that describe their fields through
//! [`ProtoRecord`], usually via `#[derive(ProtoRecord)]`. A [`Registry`]
//! resolves those declarations once into an immutable [`Codec`] that encodes
//! with a two-pass (size, then write) scheme and decodes with unknown-field
//! skipping and default fill.
//!
//! ```ignore
//! #[derive(Debug, Default, PartialEq, ProtoRecord)]
//! struct Person {
//!     #[proto(tag = 1)]
//!     id: i32,
//!     #[proto(tag = 2)]
//!     name: String,
//!     #[proto(tag = 3, repeated)]
//!     scores: Vec<u32>,
//! }
//!
//! let registry = Registry::new();
//! let bytes = registry.encode(&person)?;
//! let decoded: Person = registry.decode(&bytes)?;
//! ```

#![deny(clippy::as_conversions)]

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod kind;
pub mod leb128;
pub mod registry;
pub mod wire;

mod resolve;

pub use codec::Codec;
pub use config::{Config, MismatchPolicy};
pub use descriptor::{Access, FieldDecl, FieldDescriptor, ProtoRecord, ProtoValue, RecordType};
pub use descriptor::{Slot, Storage};
pub use error::{DecodeError, DecodeErrorKind, EncodeError, Error, SchemaError};
pub use kind::{Cardinality, ScalarKind, WireKind};
pub use registry::Registry;

#[cfg(feature = "derive")]
pub use protoform_derive::ProtoRecord;
