//! Optional header magic and the architecture derived from it.
//!
//! Only the leading two bytes of the optional header are ever read. The fields that follow
//! differ in width between PE32 and PE32+; anything that wants to interpret them has to branch
//! on [`Magic`] first.

use strum::{Display, EnumIter};

/// Magic value identifying a PE32 optional header
pub const PE32_MAGIC: u16 = 0x010B;
/// Magic value identifying a PE32+ optional header
pub const PE32_PLUS_MAGIC: u16 = 0x020B;

/// The optional header magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magic {
    /// 32-bit image (`0x10B`)
    Pe32,
    /// 64-bit image (`0x20B`)
    Pe32Plus,
    /// Any other value, including ROM images (`0x107`)
    Unknown(u16),
}

impl From<u16> for Magic {
    fn from(value: u16) -> Self {
        match value {
            PE32_MAGIC => Magic::Pe32,
            PE32_PLUS_MAGIC => Magic::Pe32Plus,
            other => Magic::Unknown(other),
        }
    }
}

/// The part of the optional header this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalHeader {
    /// The decoded magic
    pub magic: Magic,
    /// File offset at which the optional header starts
    pub offset: usize,
    /// Declared size of the optional header, taken from the COFF header
    pub size: u16,
}

/// Processor architecture of an image, as far as the host needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Architecture {
    /// PE32 image
    #[strum(to_string = "x86")]
    X86_32,
    /// PE32+ image
    #[strum(to_string = "x64")]
    X86_64,
    /// No optional header, or an unrecognised magic
    #[strum(to_string = "unknown")]
    Unknown,
}

impl Architecture {
    /// Classifies an image by its optional header, if it has one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pescope::{Architecture, Magic, OptionalHeader};
    ///
    /// let header = OptionalHeader { magic: Magic::Pe32Plus, offset: 0x98, size: 0xF0 };
    /// assert_eq!(Architecture::classify(Some(&header)), Architecture::X86_64);
    /// assert_eq!(Architecture::classify(None), Architecture::Unknown);
    /// ```
    #[must_use]
    pub fn classify(optional_header: Option<&OptionalHeader>) -> Architecture {
        match optional_header.map(|header| header.magic) {
            Some(Magic::Pe32) => Architecture::X86_32,
            Some(Magic::Pe32Plus) => Architecture::X86_64,
            Some(Magic::Unknown(_)) | None => Architecture::Unknown,
        }
    }
}
