//! Machine word types that back a bit field set.

use core::fmt::{Debug, LowerHex};
use core::hash::Hash;

use num_traits::{PrimInt, Unsigned};
use paste::paste;

use crate::descriptor::FieldDescriptor;
use crate::sealed::Sealed;
use crate::validate::Report;

/// Unsigned machine words that fields are packed into.
///
/// `Word` is implemented for [`u8`], [`u16`], [`u32`] and [`u64`] and cannot be implemented
/// outside this crate. The width of the word is also the width of every memory access made on
/// behalf of a field.
///
/// Every word type also has a family of `const fn`s (for example [`mask_u32`](crate::mask::mask_u32)
/// and [`validate_u32`](crate::validate::validate_u32)). The trait methods below call those same
/// functions, so compile-time and run-time results agree.
pub trait Word:
    PrimInt + Unsigned + Debug + LowerHex + Hash + Default + Send + Sync + Sealed + 'static
{
    /// The width of the word in bits.
    const BITS: u32;
    /// The size of the word in bytes.
    const BYTES: usize;
    /// The value with no bits set.
    const ZERO: Self;
    /// The value with every bit set.
    const ONES: Self;

    /// Returns the mask with bits `lsb..=msb` set, or `None` if the range is empty or leaves the
    /// word.
    fn checked_mask(lsb: u32, msb: u32) -> Option<Self>;

    /// Runs the layout validator for this word type.
    fn validate(fields: &[FieldDescriptor<Self>], word_count: usize, field_count: usize)
        -> Report;

    /// Losslessly widens the value for diagnostics.
    fn widen(self) -> u64;
}

macro_rules! impl_word {
    ($($primitive:ident),*) => {$(
        paste! {
            impl Sealed for $primitive {}

            impl Word for $primitive {
                const BITS: u32 = $primitive::BITS;
                const BYTES: usize = ::core::mem::size_of::<$primitive>();
                const ZERO: Self = 0;
                const ONES: Self = $primitive::MAX;

                #[inline(always)]
                fn checked_mask(lsb: u32, msb: u32) -> Option<Self> {
                    crate::mask::[<checked_mask_ $primitive>](lsb, msb)
                }

                fn validate(
                    fields: &[FieldDescriptor<Self>],
                    word_count: usize,
                    field_count: usize,
                ) -> Report {
                    crate::validate::[<validate_ $primitive>](fields, word_count, field_count)
                }

                #[inline(always)]
                fn widen(self) -> u64 {
                    self as u64
                }
            }
        }
    )*};
}
impl_word!(u8, u16, u32, u64);
