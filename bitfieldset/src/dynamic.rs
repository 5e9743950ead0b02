//! Layouts described at run time.
//!
//! When descriptors are only known at run time, for example when they are parsed from a
//! configuration file, [`DynLayout`] validates them once and [`DynFieldSet`] checks each access
//! against them. Every misuse that [`FieldSet`](crate::FieldSet) rejects at compile time is an
//! [`Error`] here.
//!
//! ```
//! use bitfieldset::prelude::*;
//! use bitfieldset::{DynFieldSet, DynLayout};
//!
//! # fn main() -> Result<(), Error> {
//! // Bit ranges read from a configuration file.
//! let ranges = [(0, 3), (4, 15)];
//! let fields = [
//!     FieldDescriptor::<u16>::checked_new(0, ranges[0].0, ranges[0].1)?,
//!     FieldDescriptor::<u16>::checked_new(0, ranges[1].0, ranges[1].1)?.read_only(),
//! ];
//! let layout = DynLayout::new(&fields, 1)?;
//! let mut regs = DynFieldSet::new(layout, [0xabc0u16])?;
//!
//! regs.set(0, 9)?;
//! assert_eq!(regs.get(0)?, 9);
//! assert_eq!(regs.get(1)?, 0xabc);
//! assert!(matches!(regs.set(1, 0), Err(Error::NotWritable { field: 1, .. })));
//! # Ok(())
//! # }
//! ```

use snafu::{ensure, OptionExt};
use tracing::{debug, trace};

use crate::error::{
    Error, NotReadableSnafu, NotWritableSnafu, OutOfRangeSnafu, StorageSizeSnafu,
    UnknownFieldSnafu, WrongWordSnafu,
};
use crate::layout::{Layout, LayoutProof};
use crate::mask::mask;
use crate::storage::Storage;
use crate::validate::validate;
use crate::{FieldDescriptor, Word};

/// A validated layout held as a borrowed slice of descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynLayout<'a, W> {
    fields: &'a [FieldDescriptor<W>],
    word_count: usize,
}

impl<'a, W: Word> DynLayout<'a, W> {
    /// Validates `fields` over `word_count` words.
    ///
    /// Fails with [`Error::InvalidLayout`] listing every failed check.
    pub fn new(fields: &'a [FieldDescriptor<W>], word_count: usize) -> Result<Self, Error> {
        validate(fields, word_count, fields.len()).into_result()?;
        trace!(
            fields = fields.len(),
            word_count,
            bits = <W as Word>::BITS,
            "accepted bit field layout",
        );
        Ok(Self { fields, word_count })
    }

    /// Returns the run-time form of a statically described layout.
    pub fn of<L: Layout<Word = W>>() -> DynLayout<'static, W> {
        let () = LayoutProof::<L, L::Words>::VALID;
        DynLayout {
            fields: L::FIELDS,
            word_count: L::WORD_COUNT,
        }
    }

    /// Returns the descriptors.
    pub fn fields(&self) -> &'a [FieldDescriptor<W>] {
        self.fields
    }

    /// Returns the number of words backing the layout.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Returns the descriptor of field `index`.
    pub fn field(&self, index: usize) -> Result<&'a FieldDescriptor<W>, Error> {
        self.fields
            .get(index)
            .context(UnknownFieldSnafu { field: index })
    }

    fn readable(&self, index: usize) -> Result<&'a FieldDescriptor<W>, Error> {
        let field = self.field(index)?;
        ensure!(
            field.access.is_readable(),
            NotReadableSnafu {
                field: index,
                access: field.access,
            }
        );
        Ok(field)
    }

    fn writable(&self, index: usize) -> Result<&'a FieldDescriptor<W>, Error> {
        let field = self.field(index)?;
        ensure!(
            field.access.is_writable(),
            NotWritableSnafu {
                field: index,
                access: field.access,
            }
        );
        Ok(field)
    }
}

fn field_mask<W: Word>(field: &FieldDescriptor<W>) -> Result<W, Error> {
    mask(field.lsb as u32, field.msb as u32)
}

fn extract<W: Word>(field: &FieldDescriptor<W>, word: W) -> Result<W, Error> {
    Ok((word & field_mask(field)?) >> field.lsb as usize)
}

fn insert<W: Word>(field: &FieldDescriptor<W>, word: W, value: W) -> Result<W, Error> {
    let mask = field_mask(field)?;
    Ok((word & !mask) | ((value << field.lsb as usize) & mask))
}

fn compound<W: Word>(field: &FieldDescriptor<W>, value: W) -> u64 {
    value
        .widen()
        .checked_shl(field.compound_offset as u32)
        .unwrap_or(0)
}

/// Fields of a [`DynLayout`] over storage `S`, checked on every access.
#[derive(Debug)]
pub struct DynFieldSet<'a, W, S> {
    layout: DynLayout<'a, W>,
    storage: S,
}

impl<'a, W: Word, S: Storage<Word = W>> DynFieldSet<'a, W, S> {
    /// Creates a field set over `storage`.
    ///
    /// Fails with [`Error::StorageSize`] if `storage` has fewer words than the layout. Extra words
    /// are never accessed.
    pub fn new(layout: DynLayout<'a, W>, storage: S) -> Result<Self, Error> {
        ensure!(
            S::LEN >= layout.word_count,
            StorageSizeSnafu {
                len: S::LEN,
                word_count: layout.word_count,
            }
        );
        debug!(
            fields = layout.fields.len(),
            word_count = layout.word_count,
            len = S::LEN,
            "created run-time field set",
        );
        Ok(Self { layout, storage })
    }

    /// Returns the layout.
    pub fn layout(&self) -> DynLayout<'a, W> {
        self.layout
    }

    /// Borrows the storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Unwraps the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Reads field `index`.
    pub fn get(&self, index: usize) -> Result<W, Error> {
        let field = self.layout.readable(index)?;
        extract(field, self.storage.load(field.word))
    }

    /// Reads field `index` into `value`, returning `self` so reads can be chained.
    pub fn get_into(&self, index: usize, value: &mut W) -> Result<&Self, Error> {
        *value = self.get(index)?;
        Ok(self)
    }

    /// Reads field `index` and shifts it to its compound offset.
    pub fn get_compound(&self, index: usize) -> Result<u64, Error> {
        let field = self.layout.readable(index)?;
        Ok(compound(field, extract(field, self.storage.load(field.word))?))
    }

    /// Writes field `index`, leaving every other bit of its word unchanged.
    ///
    /// Bits of `value` that do not fit the field are discarded.
    pub fn set(&mut self, index: usize, value: W) -> Result<&mut Self, Error> {
        let field = self.layout.writable(index)?;
        let word = self.storage.load(field.word);
        self.storage.store(field.word, insert(field, word, value)?);
        Ok(self)
    }

    /// Writes field `index` if `value` is within the field's `min..=max`.
    pub fn checked_set(&mut self, index: usize, value: W) -> Result<&mut Self, Error> {
        let field = self.layout.writable(index)?;
        ensure!(
            field.min <= value && value <= field.max,
            OutOfRangeSnafu {
                field: index,
                value: value.widen(),
                min: field.min.widen(),
                max: field.max.widen(),
            }
        );
        self.set(index, value)
    }

    /// Replaces field `index` with `f` applied to its current value.
    pub fn modify(
        &mut self,
        index: usize,
        f: impl FnOnce(W) -> W,
    ) -> Result<&mut Self, Error> {
        let field = self.layout.readable(index)?;
        self.layout.writable(index)?;
        let word = self.storage.load(field.word);
        let value = f(extract(field, word)?);
        self.storage.store(field.word, insert(field, word, value)?);
        Ok(self)
    }

    /// Sets every word of the layout to zero.
    pub fn reset_all(&mut self) -> &mut Self {
        for index in 0..self.layout.word_count {
            self.storage.store(index, W::ZERO);
        }
        self
    }

    /// Loads the word holding field `index` once, for extracting any of the fields in that word.
    pub fn word(&self, index: usize) -> Result<DynCachedWord<'_, 'a, W>, Error> {
        let field = self.layout.field(index)?;
        Ok(DynCachedWord {
            layout: &self.layout,
            word: field.word,
            bits: self.storage.load(field.word),
        })
    }
}

/// A snapshot of one word of a [`DynFieldSet`], from a single load.
#[derive(Clone, Copy, Debug)]
pub struct DynCachedWord<'s, 'a, W> {
    layout: &'s DynLayout<'a, W>,
    word: usize,
    bits: W,
}

impl<'s, 'a, W: Word> DynCachedWord<'s, 'a, W> {
    /// Extracts field `index`.
    ///
    /// Fails with [`Error::WrongWord`] if the field is in a different word.
    pub fn get(&self, index: usize) -> Result<W, Error> {
        let field = self.layout.readable(index)?;
        ensure!(
            field.word == self.word,
            WrongWordSnafu {
                field: index,
                field_word: field.word,
                view_word: self.word,
            }
        );
        extract(field, self.bits)
    }

    /// Extracts field `index` into `value`, returning `self` so extractions can be chained.
    pub fn get_into(&self, index: usize, value: &mut W) -> Result<&Self, Error> {
        *value = self.get(index)?;
        Ok(self)
    }

    /// Extracts field `index` and shifts it to its compound offset.
    pub fn get_compound(&self, index: usize) -> Result<u64, Error> {
        let value = self.get(index)?;
        Ok(compound(self.layout.field(index)?, value))
    }

    /// Returns the raw word.
    pub fn bits(&self) -> W {
        self.bits
    }

    /// Returns the index of the word.
    pub fn index(&self) -> usize {
        self.word
    }
}
