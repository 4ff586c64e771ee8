//! COFF file header.
//!
//! The 20-byte header that directly follows the `PE\0\0` signature. It names the target machine,
//! the number of section records that follow the optional header, and the size of the optional
//! header itself.

use bitflags::bitflags;
use strum::Display;

use crate::{file::parser::Parser, Result};

/// Size in bytes of the COFF file header
pub const COFF_HEADER_SIZE: usize = 20;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// `IMAGE_FILE_*` characteristics of the COFF header
    pub struct FileCharacteristics: u16 {
        /// Image has no base relocations and must load at its preferred base
        const RELOCS_STRIPPED = 0x0001;
        /// Image is valid and can be run
        const EXECUTABLE_IMAGE = 0x0002;
        /// COFF line numbers have been removed
        const LINE_NUMS_STRIPPED = 0x0004;
        /// COFF symbol table entries for local symbols have been removed
        const LOCAL_SYMS_STRIPPED = 0x0008;
        /// Aggressively trim working set (obsolete)
        const AGGRESSIVE_WS_TRIM = 0x0010;
        /// Application can handle addresses above 2 GB
        const LARGE_ADDRESS_AWARE = 0x0020;
        /// Little endian (obsolete)
        const BYTES_REVERSED_LO = 0x0080;
        /// Machine is based on a 32-bit-word architecture
        const MACHINE_32BIT = 0x0100;
        /// Debugging information is removed from the image file
        const DEBUG_STRIPPED = 0x0200;
        /// Copy to swap file when run from removable media
        const REMOVABLE_RUN_FROM_SWAP = 0x0400;
        /// Copy to swap file when run from network media
        const NET_RUN_FROM_SWAP = 0x0800;
        /// The image file is a system file
        const SYSTEM = 0x1000;
        /// The image file is a dynamic-link library
        const DLL = 0x2000;
        /// Run only on a uniprocessor machine
        const UP_SYSTEM_ONLY = 0x4000;
        /// Big endian (obsolete)
        const BYTES_REVERSED_HI = 0x8000;
    }
}

/// Target machine named by the COFF header.
///
/// This is informational only; [`crate::Architecture`] is derived from the optional header
/// magic, not from this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Machine {
    /// Intel 386 and compatibles
    #[strum(to_string = "i386")]
    I386,
    /// x64
    #[strum(to_string = "amd64")]
    Amd64,
    /// ARM little endian
    #[strum(to_string = "arm")]
    Arm,
    /// ARM Thumb-2 little endian
    #[strum(to_string = "armnt")]
    ArmNt,
    /// ARM64 little endian
    #[strum(to_string = "arm64")]
    Arm64,
    /// Intel Itanium
    #[strum(to_string = "ia64")]
    Ia64,
    /// Any other machine value
    #[strum(to_string = "unknown")]
    Unknown(u16),
}

impl From<u16> for Machine {
    fn from(value: u16) -> Self {
        match value {
            0x014C => Machine::I386,
            0x8664 => Machine::Amd64,
            0x01C0 => Machine::Arm,
            0x01C4 => Machine::ArmNt,
            0xAA64 => Machine::Arm64,
            0x0200 => Machine::Ia64,
            other => Machine::Unknown(other),
        }
    }
}

/// The COFF file header, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoffHeader {
    /// Raw `IMAGE_FILE_MACHINE_*` value
    pub machine: u16,
    /// Number of section records in the section table
    pub number_of_sections: u16,
    /// Link time, seconds since the Unix epoch
    pub time_date_stamp: u32,
    /// File offset of the COFF symbol table, usually zero for images
    pub pointer_to_symbol_table: u32,
    /// Number of entries in the symbol table
    pub number_of_symbols: u32,
    /// Size of the optional header that follows this header
    pub size_of_optional_header: u16,
    /// Raw `IMAGE_FILE_*` characteristics
    pub characteristics: u16,
}

impl CoffHeader {
    /// Reads the 20-byte header at the parser's current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 20 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<CoffHeader> {
        Ok(CoffHeader {
            machine: parser.read_le::<u16>()?,
            number_of_sections: parser.read_le::<u16>()?,
            time_date_stamp: parser.read_le::<u32>()?,
            pointer_to_symbol_table: parser.read_le::<u32>()?,
            number_of_symbols: parser.read_le::<u32>()?,
            size_of_optional_header: parser.read_le::<u16>()?,
            characteristics: parser.read_le::<u16>()?,
        })
    }

    /// Returns the decoded machine type.
    #[must_use]
    pub fn machine_type(&self) -> Machine {
        Machine::from(self.machine)
    }

    /// Returns the characteristics as flags; unknown bits are dropped.
    #[must_use]
    pub fn characteristics(&self) -> FileCharacteristics {
        FileCharacteristics::from_bits_truncate(self.characteristics)
    }

    /// Returns `true` if the image is a dynamic-link library.
    #[must_use]
    pub fn is_dll(&self) -> bool {
        self.characteristics().contains(FileCharacteristics::DLL)
    }
}
