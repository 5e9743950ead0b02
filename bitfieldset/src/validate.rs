//! The layout validator.
//!
//! A layout is a sequence of [`FieldDescriptor`]s over a fixed number of words. The validator runs
//! every check independently and records all that fail in a [`Report`]:
//!
//! - [`Check::Bounds`]: every field lies within its word and within the word array.
//! - [`Check::Overlap`]: no two fields in the same word share a bit, unless one of them is marked
//!   `may_overlap`.
//! - [`Check::ByteOffset`]: a field's byte offset, when given, matches its word index.
//! - [`Check::Default`]: a field's default value fits its width.
//! - [`Check::Range`]: a field's minimum and maximum fit its width and are ordered.
//! - [`Check::Count`]: the declared field count matches the number of descriptors.
//!
//! `validate_uN` are `const fn`s so that layouts known at compile time are rejected at compile
//! time through [`assert_valid`]. [`validate`] is the generic run-time entry point; it calls the
//! same functions.

use core::fmt::{self, Display, Formatter};

use paste::paste;
use snafu::ensure;

use crate::error::{Error, InvalidLayoutSnafu};
use crate::{FieldDescriptor, Word};

/// One of the independent layout checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Check {
    /// A field lies outside its word or outside the word array.
    Bounds,
    /// Two fields in the same word share bits.
    Overlap,
    /// A field's byte offset disagrees with its word index.
    ByteOffset,
    /// A field's default value does not fit the field.
    Default,
    /// A field's minimum or maximum does not fit the field, or the minimum exceeds the maximum.
    Range,
    /// The declared field count differs from the number of descriptors.
    Count,
}

impl Check {
    /// Every check, in reporting order.
    pub const ALL: [Check; 6] = [
        Check::Bounds,
        Check::Overlap,
        Check::ByteOffset,
        Check::Default,
        Check::Range,
        Check::Count,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl Display for Check {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Bounds => "bounds",
            Self::Overlap => "overlap",
            Self::ByteOffset => "byte offset",
            Self::Default => "default value",
            Self::Range => "value range",
            Self::Count => "field count",
        })
    }
}

/// The overlapping bits found in one word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Overlap {
    /// Index of the word.
    pub word: usize,
    /// Bits claimed by two or more fields, widened to `u64`.
    pub bits: u64,
}

/// The outcome of validating a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Report {
    failed: u8,
    offenders: [Option<usize>; Check::ALL.len()],
    overlap: Option<Overlap>,
}

impl Report {
    /// A report with no failed checks.
    pub const PASSED: Self = Self {
        failed: 0,
        offenders: [None; Check::ALL.len()],
        overlap: None,
    };

    /// Returns whether every check passed.
    #[inline(always)]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failed == 0
    }

    /// Returns whether `check` failed.
    #[inline(always)]
    #[must_use]
    pub const fn failed(&self, check: Check) -> bool {
        self.failed & check.bit() != 0
    }

    /// Returns the lowest index of a field that failed `check`.
    ///
    /// This is `None` for checks that passed and for [`Check::Count`], which is not about any one
    /// field.
    #[must_use]
    pub const fn offender(&self, check: Check) -> Option<usize> {
        self.offenders[check as usize]
    }

    /// Returns the lowest-indexed word with overlapping fields.
    ///
    /// The reported bits are those claimed by more than one field, so they do not depend on the
    /// order in which the fields are declared.
    #[must_use]
    pub const fn overlap(&self) -> Option<Overlap> {
        self.overlap
    }

    /// Iterates over the failed checks.
    pub fn failures(&self) -> impl Iterator<Item = Check> + '_ {
        Check::ALL.into_iter().filter(|&check| self.failed(check))
    }

    /// Converts the report into a result, failing with [`Error::InvalidLayout`] if any check
    /// failed.
    pub fn into_result(self) -> Result<(), Error> {
        ensure!(self.is_ok(), InvalidLayoutSnafu { report: self });
        Ok(())
    }

    const fn record(mut self, check: Check, field: Option<usize>) -> Self {
        self.failed |= check.bit();
        let slot = check as usize;
        self.offenders[slot] = match (self.offenders[slot], field) {
            (Some(previous), Some(field)) if previous <= field => Some(previous),
            (None, None) => None,
            (Some(previous), None) => Some(previous),
            (_, Some(field)) => Some(field),
        };
        self
    }

    const fn record_overlap(self, field: usize, word: usize, bits: u64) -> Self {
        let mut report = self.record(Check::Overlap, Some(field));
        report.overlap = match report.overlap {
            Some(overlap) if overlap.word <= word => Some(overlap),
            _ => Some(Overlap { word, bits }),
        };
        report
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("valid");
        }
        for (i, check) in self.failures().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{check}")?;
            match (check, self.overlap, self.offender(check)) {
                (Check::Overlap, Some(overlap), _) => {
                    write!(f, " in word {} (bits {:#x})", overlap.word, overlap.bits)?
                }
                (_, _, Some(field)) => write!(f, " at field {field}")?,
                _ => (),
            }
        }
        Ok(())
    }
}

macro_rules! define_validators {
    ($($primitive:ident),*) => {$(
        paste! {
            #[doc = concat!("Validates a layout of `", stringify!($primitive), "` words.")]
            ///
            /// `word_count` is the number of words backing the layout and `field_count` the number
            /// of fields the layout declares.
            #[must_use]
            pub const fn [<validate_ $primitive>](
                fields: &[FieldDescriptor<$primitive>],
                word_count: usize,
                field_count: usize,
            ) -> Report {
                const BYTES: usize = ::core::mem::size_of::<$primitive>();

                let mut report = Report::PASSED;
                if fields.len() != field_count {
                    report = report.record(Check::Count, None);
                }

                // Per-field checks.
                let mut i = 0;
                while i < fields.len() {
                    let field = &fields[i];
                    if field.word >= word_count
                        || field.lsb > field.msb
                        || field.msb as u32 >= $primitive::BITS
                    {
                        report = report.record(Check::Bounds, Some(i));
                    }
                    if let Some(byte_offset) = field.byte_offset {
                        let consistent = match field.word.checked_mul(BYTES) {
                            Some(expected) => expected == byte_offset,
                            None => false,
                        };
                        if !consistent {
                            report = report.record(Check::ByteOffset, Some(i));
                        }
                    }
                    if let Some(value_mask) = field.value_mask() {
                        if field.default & !value_mask != 0 {
                            report = report.record(Check::Default, Some(i));
                        }
                        if field.min & !value_mask != 0
                            || field.max & !value_mask != 0
                            || field.min > field.max
                        {
                            report = report.record(Check::Range, Some(i));
                        }
                    }
                    i += 1;
                }

                // Overlap checks, one pass per word, started from the first field in that word.
                let mut i = 0;
                while i < fields.len() {
                    let word = fields[i].word;
                    let mut seen = false;
                    let mut j = 0;
                    while j < i {
                        if fields[j].word == word {
                            seen = true;
                            break;
                        }
                        j += 1;
                    }

                    if !seen {
                        let mut used: $primitive = 0;
                        let mut conflict: $primitive = 0;
                        let mut j = i;
                        while j < fields.len() {
                            let other = &fields[j];
                            if other.word == word && !other.may_overlap {
                                if let Some(mask) = other.mask() {
                                    conflict |= used & mask;
                                    used |= mask;
                                }
                            }
                            j += 1;
                        }

                        if conflict != 0 {
                            let mut j = i;
                            while j < fields.len() {
                                let other = &fields[j];
                                let claims_conflict = match other.mask() {
                                    Some(mask) => mask & conflict != 0,
                                    None => false,
                                };
                                if other.word == word && !other.may_overlap && claims_conflict {
                                    report = report.record_overlap(j, word, conflict as u64);
                                    break;
                                }
                                j += 1;
                            }
                        }
                    }
                    i += 1;
                }

                report
            }
        }
    )*};
}
define_validators!(u8, u16, u32, u64);

/// Validates a layout of `W` words at run time.
///
/// This gives the same result as the `validate_uN` function for `W`.
pub fn validate<W: Word>(
    fields: &[FieldDescriptor<W>],
    word_count: usize,
    field_count: usize,
) -> Report {
    W::validate(fields, word_count, field_count)
}

/// Panics with a description of the first failed check, if any.
///
/// In const context the panic is a compile error; this is how layouts declared with
/// [`bitfield_set!`](crate::bitfield_set) are rejected before they can be used.
pub const fn assert_valid(report: Report) {
    if report.failed(Check::Bounds) {
        panic!("bit field layout is invalid: a field lies outside its word or the word array");
    }
    if report.failed(Check::Overlap) {
        panic!("bit field layout is invalid: fields overlap; mark aliases with `may_overlap`");
    }
    if report.failed(Check::ByteOffset) {
        panic!("bit field layout is invalid: a byte offset does not match its word index");
    }
    if report.failed(Check::Default) {
        panic!("bit field layout is invalid: a default value does not fit its field");
    }
    if report.failed(Check::Range) {
        panic!("bit field layout is invalid: a min/max does not fit its field or min exceeds max");
    }
    if report.failed(Check::Count) {
        panic!("bit field layout is invalid: the declared field count is wrong");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = FieldDescriptor<u32>;

    const GOOD: [D; 6] = [
        D::new(0, 0, 2),
        D::new(0, 3, 4),
        D::new(0, 5, 31),
        D::new(1, 0, 16),
        D::new(1, 17, 31),
        D::new(2, 0, 31),
    ];

    #[test]
    fn test_good_layout() {
        const REPORT: Report = validate_u32(&GOOD, 3, GOOD.len());
        assert!(REPORT.is_ok());
        assert_eq!(REPORT.failures().count(), 0);
        assert_eq!(REPORT.overlap(), None);
        assert!(REPORT.into_result().is_ok());
    }

    #[test]
    fn test_overlap() {
        let fields = [D::new(0, 0, 2), D::new(0, 2, 7)];
        let report = validate_u32(&fields, 1, 2);
        assert!(report.failed(Check::Overlap));
        assert_eq!(report.failures().collect::<Vec<_>>(), [Check::Overlap]);
        assert_eq!(report.overlap(), Some(Overlap { word: 0, bits: 0b100 }));
        assert_eq!(report.offender(Check::Overlap), Some(0));
    }

    #[test]
    fn test_overlap_is_order_independent() {
        let a = D::new(1, 0, 7);
        let b = D::new(1, 4, 11);
        let c = D::new(1, 10, 15);
        let d = D::new(0, 0, 31);
        let orders = [[a, b, c, d], [d, c, b, a], [b, d, a, c], [c, a, d, b]];
        for fields in orders {
            let report = validate_u32(&fields, 2, 4);
            assert_eq!(report.failures().collect::<Vec<_>>(), [Check::Overlap]);
            assert_eq!(
                report.overlap(),
                Some(Overlap {
                    word: 1,
                    bits: 0x0cf0,
                }),
            );
        }
    }

    #[test]
    fn test_overlap_reports_lowest_word() {
        let fields = [
            D::new(3, 0, 1),
            D::new(3, 1, 2),
            D::new(2, 4, 5),
            D::new(2, 5, 6),
        ];
        let report = validate_u32(&fields, 4, 4);
        assert_eq!(report.overlap(), Some(Overlap { word: 2, bits: 0x20 }));
        assert_eq!(report.offender(Check::Overlap), Some(0));
    }

    #[test]
    fn test_may_overlap() {
        let fields = [D::new(0, 0, 31), D::new(0, 0, 7).overlapping()];
        assert!(validate_u32(&fields, 1, 2).is_ok());
    }

    #[test]
    fn test_fields_sharing_bits_in_different_words() {
        let fields = [D::new(0, 0, 7), D::new(1, 0, 7)];
        assert!(validate_u32(&fields, 2, 2).is_ok());
    }

    #[test]
    fn test_bounds() {
        let fields = [D::new(0, 0, 7), D::new(2, 0, 7), D::new(0, 8, 32)];
        let report = validate_u32(&fields, 2, 3);
        assert_eq!(report.failures().collect::<Vec<_>>(), [Check::Bounds]);
        assert_eq!(report.offender(Check::Bounds), Some(1));
    }

    #[test]
    fn test_backwards_range_built_by_hand() {
        let mut field = D::new(0, 0, 7);
        field.lsb = 9;
        let report = validate_u32(&[field], 1, 1);
        assert!(report.failed(Check::Bounds));
    }

    #[test]
    fn test_byte_offset() {
        let fields = [
            D::at_byte_offset(8, 0, 7),
            D::new(1, 0, 7).with_byte_offset(4),
            D::new(1, 8, 15).with_byte_offset(5),
        ];
        let report = validate_u32(&fields, 3, 3);
        assert_eq!(report.failures().collect::<Vec<_>>(), [Check::ByteOffset]);
        assert_eq!(report.offender(Check::ByteOffset), Some(2));
    }

    #[test]
    fn test_default_value() {
        let fields = [D::new(0, 0, 2).with_default(7), D::new(0, 3, 4).with_default(4)];
        let report = validate_u32(&fields, 1, 2);
        assert_eq!(report.failures().collect::<Vec<_>>(), [Check::Default]);
        assert_eq!(report.offender(Check::Default), Some(1));
    }

    #[test]
    fn test_value_range() {
        let too_wide = D::new(0, 0, 2).with_max(8);
        let backwards = D::new(0, 3, 6).with_range(5, 4);
        assert!(validate_u32(&[too_wide], 1, 1).failed(Check::Range));
        assert!(validate_u32(&[backwards], 1, 1).failed(Check::Range));
        assert!(validate_u32(&[D::new(0, 0, 2).with_range(3, 3)], 1, 1).is_ok());
    }

    #[test]
    fn test_count() {
        let report = validate_u32(&GOOD, 3, 5);
        assert_eq!(report.failures().collect::<Vec<_>>(), [Check::Count]);
        assert_eq!(report.offender(Check::Count), None);
    }

    #[test]
    fn test_reports_every_failed_check() {
        let fields = [
            D::new(0, 0, 3).with_default(16),
            D::new(0, 2, 5).with_range(9, 3),
            D::new(4, 0, 1).with_byte_offset(3),
        ];
        let report = validate_u32(&fields, 2, 4);
        assert_eq!(
            report.failures().collect::<Vec<_>>(),
            [
                Check::Bounds,
                Check::Overlap,
                Check::ByteOffset,
                Check::Default,
                Check::Range,
                Check::Count,
            ],
        );
    }

    #[test]
    fn test_generic_matches_const() {
        let fields = [D::new(0, 0, 2), D::new(0, 2, 7).with_default(0x80)];
        assert_eq!(validate::<u32>(&fields, 1, 2), validate_u32(&fields, 1, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Report::PASSED.to_string(), "valid");
        let fields = [D::new(0, 0, 2), D::new(0, 2, 7), D::new(3, 0, 0)];
        assert_eq!(
            validate_u32(&fields, 1, 3).to_string(),
            "bounds at field 2; overlap in word 0 (bits 0x4)",
        );
    }

    #[test]
    fn test_into_result() {
        let fields = [D::new(0, 0, 2), D::new(0, 2, 7)];
        let report = validate_u32(&fields, 1, 2);
        assert!(matches!(
            report.into_result(),
            Err(Error::InvalidLayout { report: r }) if r == report,
        ));
    }

    #[test]
    fn test_assert_valid_accepts_good_layout() {
        const _: () = assert_valid(validate_u32(&GOOD, 3, 6));
    }

    #[test]
    #[should_panic(expected = "fields overlap")]
    fn test_assert_valid_rejects_overlap() {
        let fields = [D::new(0, 0, 2), D::new(0, 2, 7)];
        assert_valid(validate_u32(&fields, 1, 2));
    }
}
