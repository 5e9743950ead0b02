//! Re-exports for declaring and using bit field sets.

#[doc(no_inline)]
pub use crate::{
    bitfield_set, Access, CachedWord, Error, Field, FieldDescriptor, FieldSet, Layout, Mmio,
    Readable, Report, Storage, Volatile, Word, Writable,
};
