use snafu::Snafu;

use crate::validate::Report;
use crate::Access;

/// Errors returned by run-time checked operations.
///
/// Statically declared layouts and fields reject the same misuse at compile time instead.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// A bit range is empty or leaves the word.
    #[snafu(display("invalid bit range {lsb}..={msb} for a {bits}-bit word"))]
    InvalidRange {
        /// Least significant bit.
        lsb: u32,
        /// Most significant bit.
        msb: u32,
        /// Width of the word.
        bits: u32,
    },

    /// A layout failed validation.
    #[snafu(display("invalid bit field layout: {report}"))]
    InvalidLayout {
        /// Every failed check.
        report: Report,
    },

    /// Storage has fewer words than the layout needs.
    #[snafu(display("storage holds {len} words but the layout needs {word_count}"))]
    StorageSize {
        /// Words available in the storage.
        len: usize,
        /// Words needed by the layout.
        word_count: usize,
    },

    /// A field index is not part of the layout.
    #[snafu(display("no field with index {field}"))]
    UnknownField {
        /// The requested field index.
        field: usize,
    },

    /// A field that does not permit reads was read.
    #[snafu(display("field {field} is {access} and cannot be read"))]
    NotReadable {
        /// The field index.
        field: usize,
        /// The field's access.
        access: Access,
    },

    /// A field that does not permit writes was written.
    #[snafu(display("field {field} is {access} and cannot be written"))]
    NotWritable {
        /// The field index.
        field: usize,
        /// The field's access.
        access: Access,
    },

    /// A field was requested from a cached view of a different word.
    #[snafu(display("field {field} is in word {field_word}, not cached word {view_word}"))]
    WrongWord {
        /// The field index.
        field: usize,
        /// The word holding the field.
        field_word: usize,
        /// The word held by the view.
        view_word: usize,
    },

    /// A value is outside a field's allowed range.
    #[snafu(display("value {value:#x} for field {field} is outside {min:#x}..={max:#x}"))]
    OutOfRange {
        /// The field index.
        field: usize,
        /// The rejected value.
        value: u64,
        /// Smallest allowed value.
        min: u64,
        /// Largest allowed value.
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::InvalidRange {
                lsb: 3,
                msb: 40,
                bits: 32,
            }
            .to_string(),
            "invalid bit range 3..=40 for a 32-bit word",
        );
        assert_eq!(
            Error::NotWritable {
                field: 2,
                access: Access::ReadOnly,
            }
            .to_string(),
            "field 2 is read-only and cannot be written",
        );
        assert_eq!(
            Error::OutOfRange {
                field: 0,
                value: 9,
                min: 1,
                max: 6,
            }
            .to_string(),
            "value 0x9 for field 0 is outside 0x1..=0x6",
        );
    }
}
