#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "_nightly", feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

mod access;
pub mod descriptor;
mod dynamic;
mod error;
pub mod example;
mod field_set;
pub mod layout;
pub mod mask;
pub mod prelude;
pub mod storage;
pub mod validate;
mod word;

pub use crate::access::Access;
pub use crate::descriptor::FieldDescriptor;
pub use crate::dynamic::{DynCachedWord, DynFieldSet, DynLayout};
pub use crate::error::Error;
pub use crate::field_set::{CachedWord, FieldSet};
pub use crate::layout::{Field, Layout, Readable, Slot, WordOf, WordSlot, Writable};
pub use crate::storage::{Mmio, Storage, Volatile};
pub use crate::validate::{Check, Overlap, Report};
pub use crate::word::Word;

// For macro access via `$crate`.
#[doc(hidden)]
pub mod __private {
    pub use bitfieldset_macros::bitfield_set;
}

mod sealed {
    pub trait Sealed {}
}

/// Declares bit field layouts.
///
/// Each `struct` in the invocation becomes an uninhabited type implementing [`Layout`], plus a
/// module named after it in snake case holding one uninhabited marker type per field. Markers
/// implement [`Field`], and [`Readable`] and [`Writable`] as their access permits.
///
/// ```
/// use bitfieldset::prelude::*;
///
/// bitfield_set! {
///     /// A DMA descriptor shared with a device.
///     pub struct Descriptor: [u32; 4] {
///         /// Buffer address, bits 0 to 31.
///         #[compound_offset = 0]
///         AddrLow: 0[0..],
///         /// Buffer address, bits 32 to 47.
///         #[byte_offset = 4]
///         #[compound_offset = 32]
///         AddrHigh: [0..=15],
///         /// Transfer length in bytes.
///         #[min = 1]
///         #[max = 4096]
///         Length: 2[0..=12],
///         /// Raised by the device when the transfer completes.
///         #[read_only]
///         Done: 3[31],
///         /// The whole status word.
///         #[may_overlap]
///         Status: 3[0..],
///     }
/// }
///
/// fn main() {
///     let mut desc = FieldSet::<Descriptor>::new();
///     desc.set::<descriptor::AddrLow>(0x2000_0000)
///         .set::<descriptor::AddrHigh>(0x1);
///     desc.checked_set::<descriptor::Length>(512).unwrap();
///     assert!(desc.checked_set::<descriptor::Length>(0).is_err());
///
///     let address =
///         desc.get_compound::<descriptor::AddrLow>() | desc.get_compound::<descriptor::AddrHigh>();
///     assert_eq!(address, 0x1_2000_0000);
///     assert_eq!(desc.get::<descriptor::Done>(), 0);
///     assert_eq!(<descriptor::Length as Field>::NAME, "Length");
/// }
/// ```
///
/// # Syntax
///
/// A field is written `Name: word[bits]`. `word` is the index of the word holding the field and
/// may be left out when the field has a `#[byte_offset = N]` attribute, in which case it is
/// `N / size_of::<word type>()`. `bits` is a single bit `[n]`, an inclusive range `[lsb..=msb]`
/// or `[lsb..]`, which extends to the top bit of the word.
///
/// Field attributes:
///
/// - `#[read_only]`, `#[write_only]`, `#[no_access]`: restrict access. Fields are read-write
///   otherwise.
/// - `#[default = N]`, `#[min = N]`, `#[max = N]`: the value envelope.
/// - `#[compound_offset = N]`: the field's position in a value assembled from several fields.
/// - `#[byte_offset = N]`: the byte offset of the field's word, checked against the word index.
/// - `#[may_overlap]`: excludes the field from overlap checking.
///
/// Doc comments and other attributes are forwarded to the generated types.
///
/// The layout is validated while compiling, so overlapping fields or a bad default are compile
/// errors.
///
/// Layouts must be declared at module level, since the field modules refer to their layout by a
/// relative path.
#[macro_export]
macro_rules! bitfield_set {
    ($($tt:tt)*) => {
        $crate::__private::bitfield_set! { ($crate, $($tt)*) }
    };
}

#[test]
fn trybuild_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests_error/*.rs");
}
