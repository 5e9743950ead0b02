//! Field descriptors.

use paste::paste;

use crate::error::Error;
use crate::{Access, Word};

/// The position, permissions and value envelope of one field within an array of words.
///
/// Values (`default`, `min` and `max`) are stored right-aligned, i.e. as the field value rather
/// than as bits in position.
///
/// Descriptors are built with the `const` builders, for example
///
/// ```
/// # use bitfieldset::prelude::*;
/// const ENABLE: FieldDescriptor<u32> = FieldDescriptor::<u32>::new(0, 0, 0);
/// const DIVIDER: FieldDescriptor<u32> = FieldDescriptor::<u32>::at_byte_offset(4, 8, 15)
///     .with_default(1)
///     .with_range(1, 200);
///
/// assert_eq!(DIVIDER.word, 1);
/// assert_eq!(DIVIDER.mask(), Some(0xff00));
/// assert_eq!(ENABLE.access, Access::ReadWrite);
/// ```
///
/// A range with `lsb > msb` panics as soon as the descriptor is built, which makes it a compile
/// error for constant descriptors. [`checked_new`](Self::checked_new) returns an error instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor<W> {
    /// Index of the word holding the field.
    pub word: usize,
    /// Byte offset of the word, if the field was declared by offset. Must equal
    /// `word * size_of::<W>()`.
    pub byte_offset: Option<usize>,
    /// Least significant bit of the field, inclusive.
    pub lsb: u8,
    /// Most significant bit of the field, inclusive.
    pub msb: u8,
    /// Bit offset of this field's value within a compound value assembled from several fields.
    pub compound_offset: u8,
    /// Default value, e.g. the power-on reset value of a register field.
    pub default: W,
    /// Smallest allowed value.
    pub min: W,
    /// Largest allowed value.
    pub max: W,
    /// Permitted access.
    pub access: Access,
    /// Excludes the field from overlap checking, for aliases of other fields.
    pub may_overlap: bool,
}

macro_rules! define_descriptor_builders {
    ($($primitive:ident),*) => {$(
        paste! {
            impl FieldDescriptor<$primitive> {
                /// Describes bits `lsb..=msb` of word `word`.
                ///
                /// The field is read-write, has default and minimum zero, and its maximum is the
                /// largest value its width can hold.
                ///
                /// # Panics
                ///
                /// Panics if `lsb > msb`.
                #[must_use]
                pub const fn new(word: usize, lsb: u8, msb: u8) -> Self {
                    assert!(lsb <= msb, "bit field lsb must not exceed msb");
                    Self {
                        word,
                        byte_offset: None,
                        lsb,
                        msb,
                        compound_offset: 0,
                        default: 0,
                        min: 0,
                        max: Self::width_max(lsb, msb),
                        access: Access::ReadWrite,
                        may_overlap: false,
                    }
                }

                /// Describes bits `lsb..=msb` of the word at `byte_offset`.
                ///
                /// # Panics
                ///
                /// Panics if `lsb > msb`.
                #[must_use]
                pub const fn at_byte_offset(byte_offset: usize, lsb: u8, msb: u8) -> Self {
                    let word = byte_offset / ::core::mem::size_of::<$primitive>();
                    Self::new(word, lsb, msb).with_byte_offset(byte_offset)
                }

                const fn width_max(lsb: u8, msb: u8) -> $primitive {
                    let width = (msb - lsb) as u32 + 1;
                    if width >= $primitive::BITS {
                        $primitive::MAX
                    } else {
                        (1 << width) - 1
                    }
                }

                /// Records the byte offset of the field's word.
                #[must_use]
                pub const fn with_byte_offset(mut self, byte_offset: usize) -> Self {
                    self.byte_offset = Some(byte_offset);
                    self
                }

                /// Sets the permitted access.
                #[must_use]
                pub const fn with_access(mut self, access: Access) -> Self {
                    self.access = access;
                    self
                }

                /// Makes the field read-only.
                #[must_use]
                pub const fn read_only(self) -> Self {
                    self.with_access(Access::ReadOnly)
                }

                /// Makes the field write-only.
                #[must_use]
                pub const fn write_only(self) -> Self {
                    self.with_access(Access::WriteOnly)
                }

                /// Makes the field inaccessible.
                #[must_use]
                pub const fn no_access(self) -> Self {
                    self.with_access(Access::None)
                }

                /// Sets the default value.
                #[must_use]
                pub const fn with_default(mut self, default: $primitive) -> Self {
                    self.default = default;
                    self
                }

                /// Sets the smallest allowed value.
                #[must_use]
                pub const fn with_min(mut self, min: $primitive) -> Self {
                    self.min = min;
                    self
                }

                /// Sets the largest allowed value.
                #[must_use]
                pub const fn with_max(mut self, max: $primitive) -> Self {
                    self.max = max;
                    self
                }

                /// Sets the allowed value range, inclusive.
                #[must_use]
                pub const fn with_range(self, min: $primitive, max: $primitive) -> Self {
                    self.with_min(min).with_max(max)
                }

                /// Sets the bit offset within a compound value.
                #[must_use]
                pub const fn with_compound_offset(mut self, compound_offset: u8) -> Self {
                    self.compound_offset = compound_offset;
                    self
                }

                /// Excludes the field from overlap checking.
                #[must_use]
                pub const fn overlapping(mut self) -> Self {
                    self.may_overlap = true;
                    self
                }

                /// Returns the number of bits in the field, or zero for a backwards range.
                #[inline(always)]
                #[must_use]
                pub const fn width(&self) -> u32 {
                    if self.lsb > self.msb {
                        0
                    } else {
                        (self.msb - self.lsb) as u32 + 1
                    }
                }

                /// Returns the in-position mask of the field, or `None` if its range is invalid
                /// for the word.
                #[inline(always)]
                #[must_use]
                pub const fn mask(&self) -> Option<$primitive> {
                    crate::mask::[<checked_mask_ $primitive>](self.lsb as u32, self.msb as u32)
                }

                /// Returns the right-aligned mask of the field, or `None` if its range is invalid
                /// for the word.
                #[inline(always)]
                #[must_use]
                pub const fn value_mask(&self) -> Option<$primitive> {
                    match self.mask() {
                        Some(mask) => Some(mask >> self.lsb as u32),
                        None => None,
                    }
                }
            }
        }
    )*};
}
define_descriptor_builders!(u8, u16, u32, u64);

impl<W: Word> FieldDescriptor<W> {
    /// Describes bits `lsb..=msb` of word `word`, for ranges that are only known at run time.
    ///
    /// The descriptor is the one `new` would build. Fails with [`Error::InvalidRange`] if
    /// `lsb > msb` or if `msb` is outside the word.
    ///
    /// ```
    /// # use bitfieldset::prelude::*;
    /// let status = FieldDescriptor::<u16>::checked_new(1, 4, 15)?.read_only();
    /// assert_eq!(status.max, 0xfff);
    /// assert!(FieldDescriptor::<u16>::checked_new(1, 4, 16).is_err());
    /// # Ok::<(), Error>(())
    /// ```
    pub fn checked_new(word: usize, lsb: u8, msb: u8) -> Result<Self, Error> {
        let mask: W = crate::mask::mask(lsb as u32, msb as u32)?;
        Ok(Self {
            word,
            byte_offset: None,
            lsb,
            msb,
            compound_offset: 0,
            default: W::ZERO,
            min: W::ZERO,
            max: mask >> lsb as usize,
            access: Access::ReadWrite,
            may_overlap: false,
        })
    }

    /// Describes bits `lsb..=msb` of the word at `byte_offset`, for ranges that are only known at
    /// run time.
    pub fn checked_at_byte_offset(byte_offset: usize, lsb: u8, msb: u8) -> Result<Self, Error> {
        let mut descriptor = Self::checked_new(byte_offset / W::BYTES, lsb, msb)?;
        descriptor.byte_offset = Some(byte_offset);
        Ok(descriptor)
    }
}
