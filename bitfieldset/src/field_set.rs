//! The statically checked field-set accessor.
//!
//! A [`FieldSet`] owns the words of one instance of a [`Layout`] and reads and writes fields named
//! by their marker types. Every field access is exactly one load of the field's word, and a write
//! is one load followed by one store.
//!
//! ```
//! use bitfieldset::prelude::*;
//!
//! bitfield_set! {
//!     struct Control: [u32; 2] {
//!         Enable: 0[0],
//!         Mode: 0[1..=3],
//!         #[read_only]
//!         Busy: 0[31],
//!         #[write_only]
//!         Kick: 1[0],
//!     }
//! }
//!
//! fn main() {
//!     let mut regs = FieldSet::<Control>::from_words([0x8000_0000, 0]);
//!     regs.set::<control::Enable>(1).set::<control::Mode>(5);
//!     regs.set::<control::Kick>(1);
//!     assert_eq!(regs.get::<control::Mode>(), 5);
//!
//!     let status = regs.word::<control::Busy>();
//!     assert_eq!(status.get::<control::Busy>(), 1);
//!     assert_eq!(status.get::<control::Enable>(), 1);
//!     assert_eq!(regs.into_storage(), [0x8000_000b, 1]);
//! }
//! ```
//!
//! Misuse is rejected at compile time. Writing a read-only field, reading a write-only field and
//! reading a field of another word from a [`CachedWord`] are trait-bound errors, and so is naming a
//! field of another layout. Storage whose length differs from the layout's word count fails const
//! evaluation when the field set is created.

use core::fmt::{self, Debug, Formatter};
use core::marker::PhantomData;

use snafu::ensure;

use crate::error::{Error, OutOfRangeSnafu};
use crate::layout::{Field, FieldProof, Layout, LayoutProof, Readable, Slot, WordOf, Writable};
use crate::storage::Storage;
use crate::Word;

#[inline(always)]
fn check_mask<F: Field>() {
    let () = FieldProof::<F>::VALID;
    let descriptor = F::DESCRIPTOR;
    debug_assert!(
        <WordOf<F> as Word>::checked_mask(descriptor.lsb as u32, descriptor.msb as u32)
            == Some(F::MASK),
        "mask of field `{}` does not match its descriptor",
        F::NAME,
    );
}

#[inline(always)]
fn extract<F: Field>(word: WordOf<F>) -> WordOf<F> {
    check_mask::<F>();
    (word & F::MASK) >> F::DESCRIPTOR.lsb as usize
}

#[inline(always)]
fn insert<F: Field>(word: WordOf<F>, value: WordOf<F>) -> WordOf<F> {
    check_mask::<F>();
    (word & !F::MASK) | ((value << F::DESCRIPTOR.lsb as usize) & F::MASK)
}

#[inline(always)]
fn compound<F: Field>(value: WordOf<F>) -> u64 {
    value
        .widen()
        .checked_shl(F::DESCRIPTOR.compound_offset as u32)
        .unwrap_or(0)
}

/// The words of one instance of layout `L`, held in storage `S`.
///
/// `S` defaults to plain memory, [`Layout::Words`]. Use [`Volatile`](crate::Volatile) or
/// [`Mmio`](crate::Mmio) for memory that hardware also accesses.
///
/// Constructing a `FieldSet` proves at compile time that `L` passes validation and that `S` holds
/// exactly [`Layout::WORD_COUNT`] words.
#[repr(transparent)]
pub struct FieldSet<L: Layout, S = <L as Layout>::Words> {
    storage: S,
    _phantom_layout: PhantomData<fn() -> L>,
}

impl<L: Layout> FieldSet<L> {
    /// Creates a field set with every word zero.
    #[inline(always)]
    #[must_use]
    pub const fn new() -> Self {
        Self::from_storage(L::ZEROED)
    }

    /// Creates a field set from initial word values.
    #[inline(always)]
    #[must_use]
    pub const fn from_words(words: L::Words) -> Self {
        Self::from_storage(words)
    }
}

impl<L: Layout, S: Storage<Word = L::Word>> FieldSet<L, S> {
    /// Creates a field set over existing storage.
    #[inline(always)]
    #[must_use]
    pub const fn from_storage(storage: S) -> Self {
        let () = LayoutProof::<L, S>::VALID;
        Self {
            storage,
            _phantom_layout: PhantomData,
        }
    }

    /// Unwraps the storage.
    #[inline(always)]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Borrows the storage.
    #[inline(always)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads field `F`.
    #[inline(always)]
    pub fn get<F: Readable<Layout = L>>(&self) -> L::Word {
        extract::<F>(self.storage.load(F::DESCRIPTOR.word))
    }

    /// Reads field `F` into `value`, returning `self` so reads can be chained.
    #[inline(always)]
    pub fn get_into<F: Readable<Layout = L>>(&self, value: &mut L::Word) -> &Self {
        *value = self.get::<F>();
        self
    }

    /// Reads field `F` and shifts it to its compound offset.
    ///
    /// Bits moved past bit 63 are discarded.
    #[inline(always)]
    pub fn get_compound<F: Readable<Layout = L>>(&self) -> u64 {
        compound::<F>(self.get::<F>())
    }

    /// Writes field `F`, leaving every other bit of its word unchanged.
    ///
    /// Bits of `value` that do not fit the field are discarded. This is a read-modify-write of the
    /// field's word and is not atomic.
    #[inline(always)]
    pub fn set<F: Writable<Layout = L>>(&mut self, value: L::Word) -> &mut Self {
        let index = F::DESCRIPTOR.word;
        let word = self.storage.load(index);
        self.storage.store(index, insert::<F>(word, value));
        self
    }

    /// Writes field `F` if `value` is within the field's `min..=max`.
    pub fn checked_set<F: Writable<Layout = L>>(
        &mut self,
        value: L::Word,
    ) -> Result<&mut Self, Error> {
        let descriptor = F::DESCRIPTOR;
        ensure!(
            descriptor.min <= value && value <= descriptor.max,
            OutOfRangeSnafu {
                field: F::INDEX,
                value: value.widen(),
                min: descriptor.min.widen(),
                max: descriptor.max.widen(),
            }
        );
        Ok(self.set::<F>(value))
    }

    /// Replaces field `F` with `f` applied to its current value.
    ///
    /// The field's word is loaded once and stored once.
    #[inline(always)]
    pub fn modify<F>(&mut self, f: impl FnOnce(L::Word) -> L::Word) -> &mut Self
    where
        F: Readable<Layout = L> + Writable,
    {
        let index = F::DESCRIPTOR.word;
        let word = self.storage.load(index);
        self.storage.store(index, insert::<F>(word, f(extract::<F>(word))));
        self
    }

    /// Sets every word to zero.
    ///
    /// Field defaults are not applied.
    pub fn reset_all(&mut self) -> &mut Self {
        for index in 0..L::WORD_COUNT {
            self.storage.store(index, <L::Word as Word>::ZERO);
        }
        self
    }

    /// Loads the word holding field `F` once, for extracting any of the fields in that word.
    ///
    /// The view borrows the field set, so the words cannot change through it while the view is
    /// alive.
    #[inline(always)]
    pub fn word<F: Field<Layout = L>>(&self) -> CachedWord<'_, L, F::Slot> {
        let () = FieldProof::<F>::VALID;
        CachedWord {
            bits: self.storage.load(<F::Slot as Slot>::INDEX),
            _phantom: PhantomData,
        }
    }
}

impl<L: Layout> Default for FieldSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Layout, S: Clone> Clone for FieldSet<L, S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            _phantom_layout: PhantomData,
        }
    }
}

impl<L: Layout, S: Copy> Copy for FieldSet<L, S> {}

impl<L: Layout, S: PartialEq> PartialEq for FieldSet<L, S> {
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl<L: Layout, S: Eq> Eq for FieldSet<L, S> {}

impl<L: Layout, S: Debug> Debug for FieldSet<L, S> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FieldSet")
            .field("layout", &core::any::type_name::<L>())
            .field("storage", &self.storage)
            .finish()
    }
}

/// A snapshot of one word of a [`FieldSet`], from a single load.
///
/// `S` is the word's [`Slot`]; only fields in that word can be read from the view.
pub struct CachedWord<'a, L: Layout, S: Slot> {
    bits: L::Word,
    _phantom: PhantomData<(&'a (), fn() -> (L, S))>,
}

impl<'a, L: Layout, S: Slot> CachedWord<'a, L, S> {
    /// Extracts field `F`.
    #[inline(always)]
    pub fn get<F: Readable<Layout = L, Slot = S>>(&self) -> L::Word {
        extract::<F>(self.bits)
    }

    /// Extracts field `F` into `value`, returning `self` so extractions can be chained.
    #[inline(always)]
    pub fn get_into<F: Readable<Layout = L, Slot = S>>(&self, value: &mut L::Word) -> &Self {
        *value = self.get::<F>();
        self
    }

    /// Extracts field `F` and shifts it to its compound offset.
    #[inline(always)]
    pub fn get_compound<F: Readable<Layout = L, Slot = S>>(&self) -> u64 {
        compound::<F>(self.get::<F>())
    }

    /// Returns the raw word.
    #[inline(always)]
    pub fn bits(&self) -> L::Word {
        self.bits
    }

    /// Returns the index of the word.
    #[inline(always)]
    pub fn index(&self) -> usize {
        S::INDEX
    }
}

impl<L: Layout, S: Slot> Clone for CachedWord<'_, L, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L: Layout, S: Slot> Copy for CachedWord<'_, L, S> {}

impl<L: Layout, S: Slot> Debug for CachedWord<'_, L, S> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("CachedWord")
            .field("index", &S::INDEX)
            .field("bits", &self.bits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::WordSlot;

    bitfield_set! {
        struct Tbf: [u32; 3] {
            #[default = 3]
            F1: 0[0..=2],
            F2: 0[3..=4],
            F3: 0[5..],
            F4: 1[0..=16],
            #[read_only]
            F5: 1[17..=31],
            #[min = 2]
            #[max = 9]
            #[compound_offset = 32]
            F6: 2[0..],
        }
    }

    #[test]
    fn test_set_get() {
        let mut set = FieldSet::<Tbf>::new();
        set.set::<tbf::F1>(3).set::<tbf::F2>(2);
        assert_eq!(set.get::<tbf::F1>(), 3);
        assert_eq!(set.get::<tbf::F2>(), 2);
        assert_eq!(set.into_storage(), [0b10_011, 0, 0]);
    }

    #[test]
    fn test_set_discards_excess_bits() {
        let mut set = FieldSet::<Tbf>::from_words([u32::MAX, 0, 0]);
        set.set::<tbf::F2>(0xfc);
        assert_eq!(set.get::<tbf::F2>(), 0);
        assert_eq!(set.get::<tbf::F1>(), 7);
        assert_eq!(set.get::<tbf::F3>(), 0x07ff_ffff);
    }

    #[test]
    fn test_read_only_field_reads_storage() {
        let set = FieldSet::<Tbf>::from_words([0, 0xabcd_0000, 0]);
        assert_eq!(set.get::<tbf::F5>(), 0xabcd_0000 >> 17);
    }

    #[test]
    fn test_get_into() {
        let set = FieldSet::<Tbf>::from_words([0b01_110, 0, 0]);
        let (mut f1, mut f2) = (0, 0);
        set.get_into::<tbf::F1>(&mut f1).get_into::<tbf::F2>(&mut f2);
        assert_eq!((f1, f2), (6, 1));
    }

    #[test]
    fn test_checked_set() {
        let mut set = FieldSet::<Tbf>::new();
        assert!(set.checked_set::<tbf::F6>(9).is_ok());
        assert_eq!(set.get::<tbf::F6>(), 9);
        assert!(matches!(
            set.checked_set::<tbf::F6>(1),
            Err(Error::OutOfRange {
                field: 5,
                value: 1,
                min: 2,
                max: 9,
            }),
        ));
        assert_eq!(set.get::<tbf::F6>(), 9);
    }

    #[test]
    fn test_modify() {
        let mut set = FieldSet::<Tbf>::from_words([0, 0xfffe_0005, 0]);
        set.modify::<tbf::F4>(|value| value + 1);
        assert_eq!(set.get::<tbf::F4>(), 6);
        assert_eq!(set.get::<tbf::F5>(), 0x7fff);
    }

    #[test]
    fn test_get_compound() {
        let set = FieldSet::<Tbf>::from_words([5, 0, 0x8000_0001]);
        assert_eq!(set.get_compound::<tbf::F1>(), 5);
        assert_eq!(set.get_compound::<tbf::F6>(), 0x8000_0001 << 32);
    }

    #[test]
    fn test_reset_all_ignores_defaults() {
        let mut set = FieldSet::<Tbf>::from_words([u32::MAX; 3]);
        set.reset_all();
        assert_eq!(set.get::<tbf::F1>(), 0);
        assert_eq!(set, FieldSet::new());
    }

    #[test]
    fn test_cached_word() {
        let set = FieldSet::<Tbf>::from_words([0b1111_01_101, 7, 9]);
        let view = set.word::<tbf::F2>();
        assert_eq!(view.index(), 0);
        assert_eq!(view.bits(), 0b1111_01_101);
        assert_eq!(view.get::<tbf::F1>(), set.get::<tbf::F1>());
        assert_eq!(view.get::<tbf::F2>(), set.get::<tbf::F2>());
        assert_eq!(view.get::<tbf::F3>(), 0b1111);

        let (mut f4, mut f5) = (0, 0);
        set.word::<tbf::F4>()
            .get_into::<tbf::F4>(&mut f4)
            .get_into::<tbf::F5>(&mut f5);
        assert_eq!((f4, f5), (7, 0));
        assert_eq!(set.word::<tbf::F6>().get_compound::<tbf::F6>(), 9 << 32);
    }

    #[test]
    fn test_traits() {
        let set = FieldSet::<Tbf>::default();
        let copy = set;
        assert_eq!(copy, set);
        assert!(format!("{set:?}").contains("storage: [0, 0, 0]"));
        assert_eq!(
            format!("{:?}", set.word::<tbf::F6>()),
            "CachedWord { index: 2, bits: 0 }",
        );
    }

    enum Nibbles {}

    impl Layout for Nibbles {
        type Word = u32;
        type Words = [u32; 1];
        const WORD_COUNT: usize = 1;
        const FIELD_COUNT: usize = 2;
        const FIELDS: &'static [FieldDescriptor<u32>] = &[
            FieldDescriptor::<u32>::new(0, 0, 3),
            FieldDescriptor::<u32>::new(0, 4, 7),
        ];
        const ZEROED: [u32; 1] = [0];
        const REPORT: Report =
            crate::validate::validate_u32(Self::FIELDS, Self::WORD_COUNT, Self::FIELD_COUNT);
    }

    /// Claims bits 0 to 7 although its descriptor only covers bits 0 to 3.
    enum WideLow {}

    impl Field for WideLow {
        type Layout = Nibbles;
        type Slot = WordSlot<0>;
        const NAME: &'static str = "WideLow";
        const INDEX: usize = 0;
        const MASK: u32 = 0xff;
    }

    impl Readable for WideLow {}
    impl Writable for WideLow {}

    #[test]
    #[should_panic(expected = "mask of field `WideLow` does not match its descriptor")]
    fn test_wrong_mask_is_caught_on_write() {
        let mut set = FieldSet::<Nibbles>::from_words([0xa0]);
        set.set::<WideLow>(3);
    }

    #[test]
    #[should_panic(expected = "mask of field `WideLow` does not match its descriptor")]
    fn test_wrong_mask_is_caught_on_read() {
        let set = FieldSet::<Nibbles>::from_words([0xa0]);
        let _ = set.get::<WideLow>();
    }
}
