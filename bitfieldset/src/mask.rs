//! Contiguous bit masks.
//!
//! A mask for `lsb..=msb` is built as `(1 << span) | ((1 << span) - 1)` shifted left by `lsb`,
//! where `span = msb - lsb`. No step shifts by the full word width, so the top bit of the word is
//! handled without overflow.
//!
//! Each word type gets three `const fn`s:
//!
//! - `checked_mask_uN(lsb, msb)` returns `None` for an invalid range.
//! - `mask_uN(lsb, msb)` panics for an invalid range, which is a compile error in const context.
//! - `bit_uN(pos)` is the single-bit mask `mask_uN(pos, pos)`.
//!
//! [`mask`] and [`bit`] are the generic run-time forms.

use paste::paste;
use snafu::OptionExt;

use crate::error::{Error, InvalidRangeSnafu};
use crate::Word;

macro_rules! define_mask_fns {
    ($($primitive:ident),*) => {$(
        paste! {
            #[doc = concat!(
                "Returns the `", stringify!($primitive), "` mask with bits `lsb..=msb` set, or ",
                "`None` if `msb < lsb` or `msb` is outside the word.",
            )]
            #[inline(always)]
            #[must_use]
            pub const fn [<checked_mask_ $primitive>](lsb: u32, msb: u32) -> Option<$primitive> {
                if msb < lsb || msb >= $primitive::BITS {
                    return None;
                }
                let span = msb - lsb;
                let one: $primitive = 1;
                Some(((one << span) | ((one << span) - 1)) << lsb)
            }

            #[doc = concat!(
                "Returns the `", stringify!($primitive), "` mask with bits `lsb..=msb` set.",
            )]
            ///
            /// # Panics
            ///
            /// Panics if `msb < lsb` or `msb` is outside the word. In const context this is a
            /// compile error.
            #[inline(always)]
            #[must_use]
            pub const fn [<mask_ $primitive>](lsb: u32, msb: u32) -> $primitive {
                match [<checked_mask_ $primitive>](lsb, msb) {
                    Some(mask) => mask,
                    None => panic!("invalid bit range"),
                }
            }

            #[doc = concat!("Returns the `", stringify!($primitive), "` with only bit `pos` set.")]
            ///
            /// # Panics
            ///
            /// Panics if `pos` is outside the word.
            #[inline(always)]
            #[must_use]
            pub const fn [<bit_ $primitive>](pos: u32) -> $primitive {
                [<mask_ $primitive>](pos, pos)
            }
        }
    )*};
}
define_mask_fns!(u8, u16, u32, u64);

/// Returns the mask with bits `lsb..=msb` set.
///
/// This is the run-time counterpart of the `mask_uN` functions for bounds that are only known
/// at run time.
///
/// # Examples
///
/// ```
/// # use bitfieldset::mask::mask;
/// assert_eq!(mask::<u8>(0, 7).unwrap(), 0xff);
/// assert_eq!(mask::<u32>(4, 7).unwrap(), 0xf0);
/// assert!(mask::<u16>(3, 2).is_err());
/// assert!(mask::<u16>(0, 16).is_err());
/// ```
pub fn mask<W: Word>(lsb: u32, msb: u32) -> Result<W, Error> {
    W::checked_mask(lsb, msb).context(InvalidRangeSnafu {
        lsb,
        msb,
        bits: <W as Word>::BITS,
    })
}

/// Returns the word with only bit `pos` set.
pub fn bit<W: Word>(pos: u32) -> Result<W, Error> {
    mask(pos, pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive<W: Word>(lsb: u32, msb: u32) -> W {
        let mut mask = W::ZERO;
        for i in lsb..=msb {
            mask = mask | (W::one() << i as usize);
        }
        mask
    }

    fn check_constants<W: Word>() {
        let bits = <W as Word>::BITS;
        assert_eq!(mask::<W>(0, 0).unwrap(), W::one());
        assert_eq!(
            mask::<W>(bits - 1, bits - 1).unwrap(),
            W::one() << (bits - 1) as usize,
        );
        assert_eq!(mask::<W>(0, bits - 1).unwrap(), W::ONES);
        assert_eq!(mask::<W>(0, 7).unwrap(), W::ONES >> (bits - 8) as usize);
        assert_eq!(mask::<W>(0, 3).unwrap(), W::ONES >> (bits - 4) as usize);
    }

    fn check_against_naive<W: Word>() {
        let bits = <W as Word>::BITS;
        for lsb in 0..bits {
            for msb in lsb..bits {
                let mask = mask::<W>(lsb, msb).unwrap();
                assert_eq!(mask, naive::<W>(lsb, msb), "lsb {lsb} msb {msb}");
                assert_eq!(mask.count_ones(), msb - lsb + 1);
                assert_eq!(mask.trailing_zeros(), lsb);
            }
        }
    }

    #[test]
    fn test_constants() {
        check_constants::<u8>();
        check_constants::<u16>();
        check_constants::<u32>();
        check_constants::<u64>();
    }

    #[test]
    fn test_against_naive() {
        check_against_naive::<u8>();
        check_against_naive::<u16>();
        check_against_naive::<u32>();
        check_against_naive::<u64>();
    }

    #[test]
    fn test_const_evaluation() {
        const TOP: u64 = mask_u64(63, 63);
        const ALL: u16 = mask_u16(0, 15);
        const LOW_NIBBLE: u8 = bit_u8(0) | bit_u8(1) | bit_u8(2) | bit_u8(3);
        assert_eq!(TOP, 1 << 63);
        assert_eq!(ALL, u16::MAX);
        assert_eq!(LOW_NIBBLE, 0xf);
    }

    #[test]
    fn test_invalid_ranges() {
        assert_eq!(checked_mask_u32(5, 4), None);
        assert_eq!(checked_mask_u32(0, 32), None);
        assert_eq!(checked_mask_u8(8, 8), None);
        assert!(matches!(
            mask::<u8>(2, 9),
            Err(Error::InvalidRange {
                lsb: 2,
                msb: 9,
                bits: 8
            }),
        ));
        assert!(bit::<u64>(64).is_err());
    }

    #[test]
    #[should_panic(expected = "invalid bit range")]
    fn test_mask_panics_at_run_time() {
        let msb = core::hint::black_box(40);
        let _ = mask_u32(0, msb);
    }
}
