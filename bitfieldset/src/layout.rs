//! Layout and field capabilities.
//!
//! A [`Layout`] is a type that names a word type, a word count and an ordered list of field
//! descriptors. A [`Field`] is a type that names one entry of a layout. Both are normally generated
//! by [`bitfield_set!`](crate::bitfield_set), which also implements [`Readable`] and [`Writable`]
//! for the fields whose access permits it.
//!
//! The types carry no data. Every accessor resolves its word index and mask from associated
//! constants, so nothing is computed per call.

use core::marker::PhantomData;

use crate::storage::Storage;
use crate::validate::{self, Report};
use crate::{FieldDescriptor, Word};

/// A statically described bit field layout.
///
/// Implementations must agree with themselves: `Words` holds exactly `WORD_COUNT` words, `FIELDS`
/// has `FIELD_COUNT` entries and `REPORT` is the validator's verdict on them. A
/// [`FieldSet`](crate::FieldSet) can only be constructed over a layout whose `REPORT` passes; a
/// failing report is a compile error at the construction site.
///
/// # Examples
///
/// Hand-written layouts are possible, though [`bitfield_set!`](crate::bitfield_set) is shorter:
///
/// ```
/// use bitfieldset::prelude::*;
/// use bitfieldset::validate::validate_u16;
///
/// enum Pair {}
///
/// impl Layout for Pair {
///     type Word = u16;
///     type Words = [u16; 1];
///     const WORD_COUNT: usize = 1;
///     const FIELD_COUNT: usize = 2;
///     const FIELDS: &'static [FieldDescriptor<u16>] = &[
///         FieldDescriptor::<u16>::new(0, 0, 7),
///         FieldDescriptor::<u16>::new(0, 8, 15),
///     ];
///     const ZEROED: [u16; 1] = [0];
///     const REPORT: Report = validate_u16(Self::FIELDS, Self::WORD_COUNT, Self::FIELD_COUNT);
/// }
///
/// assert!(Pair::REPORT.is_ok());
/// assert_eq!(Pair::validate(), Pair::REPORT);
/// ```
pub trait Layout: 'static {
    /// The word type fields are packed into.
    type Word: Word;

    /// Plain storage for one instance of the layout.
    type Words: Storage<Word = Self::Word> + Copy;

    /// The number of words backing the layout.
    const WORD_COUNT: usize;

    /// The declared number of fields.
    const FIELD_COUNT: usize;

    /// The field descriptors, in declaration order.
    const FIELDS: &'static [FieldDescriptor<Self::Word>];

    /// Storage with every word zero.
    const ZEROED: Self::Words;

    /// The validator's verdict on this layout, computed at compile time.
    const REPORT: Report;

    /// Validates the layout at run time.
    fn validate() -> Report {
        validate::validate(Self::FIELDS, Self::WORD_COUNT, Self::FIELD_COUNT)
    }
}

/// A type-level word index.
pub trait Slot: 'static {
    /// The word index.
    const INDEX: usize;
}

/// The [`Slot`] for word `N`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WordSlot<const N: usize>;

impl<const N: usize> Slot for WordSlot<N> {
    const INDEX: usize = N;
}

/// One field of a [`Layout`].
///
/// `Slot` must name the word the field lives in and `MASK` must be the in-position mask of the
/// descriptor. `Slot` is checked at compile time when the field is first used. `MASK` is checked on
/// every access in builds with debug assertions.
pub trait Field: 'static {
    /// The layout the field belongs to.
    type Layout: Layout;

    /// The word the field lives in, as a type.
    type Slot: Slot;

    /// The field's name, for diagnostics.
    const NAME: &'static str;

    /// The field's index in [`Layout::FIELDS`].
    const INDEX: usize;

    /// The field's descriptor.
    const DESCRIPTOR: FieldDescriptor<<Self::Layout as Layout>::Word> =
        <Self::Layout as Layout>::FIELDS[Self::INDEX];

    /// The in-position mask of the field.
    const MASK: <Self::Layout as Layout>::Word;
}

/// A field whose access permits reads.
pub trait Readable: Field {}

/// A field whose access permits writes.
pub trait Writable: Field {}

/// The word type of a field's layout.
pub type WordOf<F> = <<F as Field>::Layout as Layout>::Word;

/// Compile-time proof that a layout passes validation and fits its storage.
pub(crate) struct LayoutProof<L, S>(PhantomData<fn() -> (L, S)>);

impl<L: Layout, S: Storage<Word = L::Word>> LayoutProof<L, S> {
    pub(crate) const VALID: () = {
        validate::assert_valid(L::REPORT);
        assert!(
            S::LEN == L::WORD_COUNT,
            "storage length does not match the layout's word count",
        );
    };
}

/// Compile-time proof that a field's slot agrees with its descriptor.
pub(crate) struct FieldProof<F>(PhantomData<fn() -> F>);

impl<F: Field> FieldProof<F> {
    pub(crate) const VALID: () = {
        assert!(
            F::INDEX < <F::Layout as Layout>::FIELD_COUNT,
            "field index is outside its layout",
        );
        assert!(
            <F::Slot as Slot>::INDEX == F::DESCRIPTOR.word,
            "field slot does not match its descriptor's word",
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_u8;

    enum Nibbles {}

    impl Layout for Nibbles {
        type Word = u8;
        type Words = [u8; 2];
        const WORD_COUNT: usize = 2;
        const FIELD_COUNT: usize = 2;
        const FIELDS: &'static [FieldDescriptor<u8>] = &[
            FieldDescriptor::<u8>::new(0, 0, 3),
            FieldDescriptor::<u8>::new(1, 4, 7).read_only(),
        ];
        const ZEROED: [u8; 2] = [0; 2];
        const REPORT: Report = validate_u8(Self::FIELDS, Self::WORD_COUNT, Self::FIELD_COUNT);
    }

    enum High {}

    impl Field for High {
        type Layout = Nibbles;
        type Slot = WordSlot<1>;
        const NAME: &'static str = "High";
        const INDEX: usize = 1;
        const MASK: u8 = 0xf0;
    }

    #[test]
    fn test_descriptor_defaults_to_layout_entry() {
        assert_eq!(High::DESCRIPTOR, Nibbles::FIELDS[1]);
        assert_eq!(High::DESCRIPTOR.mask(), Some(High::MASK));
    }

    #[test]
    fn test_proofs() {
        let () = LayoutProof::<Nibbles, [u8; 2]>::VALID;
        let () = FieldProof::<High>::VALID;
        assert_eq!(<WordSlot<3> as Slot>::INDEX, 3);
    }

    #[test]
    fn test_run_time_validation_matches() {
        assert!(Nibbles::REPORT.is_ok());
        assert_eq!(Nibbles::validate(), Nibbles::REPORT);
    }
}
