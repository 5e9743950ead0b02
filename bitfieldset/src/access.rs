use core::fmt::{self, Display, Formatter};

/// The access a field permits.
///
/// The discriminants encode read permission in bit 0 and write permission in bit 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Access {
    /// The field can be neither read nor written.
    None = 0,
    /// The field can only be read.
    ReadOnly = 1,
    /// The field can only be written.
    WriteOnly = 2,
    /// The field can be read and written.
    #[default]
    ReadWrite = 3,
}

impl Access {
    const READ: u8 = 1 << 0;
    const WRITE: u8 = 1 << 1;

    /// Returns the permission bits.
    #[inline(always)]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes permission bits, returning `None` if bits other than read and write are set.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::None),
            1 => Some(Self::ReadOnly),
            2 => Some(Self::WriteOnly),
            3 => Some(Self::ReadWrite),
            _ => None,
        }
    }

    /// Returns whether the field can be read.
    #[inline(always)]
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.bits() & Self::READ != 0
    }

    /// Returns whether the field can be written.
    #[inline(always)]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.bits() & Self::WRITE != 0
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::None => "inaccessible",
            Self::ReadOnly => "read-only",
            Self::WriteOnly => "write-only",
            Self::ReadWrite => "read-write",
        })
    }
}
