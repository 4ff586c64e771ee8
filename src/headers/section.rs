//! Section table and RVA resolution.
//!
//! The section table is an array of fixed 40-byte records that follows the optional header.
//! Records are kept in file order: when sections overlap in virtual address space the first
//! matching record decides where an RVA lives on disk.

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

/// Size in bytes of one section record
pub const SECTION_HEADER_SIZE: usize = 40;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// `IMAGE_SCN_*` characteristics of a section; alignment bits are not modelled
    pub struct SectionCharacteristics: u32 {
        /// Section contains executable code
        const CNT_CODE = 0x0000_0020;
        /// Section contains initialized data
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        /// Section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        /// Section contains extended relocations
        const LNK_NRELOC_OVFL = 0x0100_0000;
        /// Section can be discarded as needed
        const MEM_DISCARDABLE = 0x0200_0000;
        /// Section cannot be cached
        const MEM_NOT_CACHED = 0x0400_0000;
        /// Section is not pageable
        const MEM_NOT_PAGED = 0x0800_0000;
        /// Section can be shared in memory
        const MEM_SHARED = 0x1000_0000;
        /// Section can be executed as code
        const MEM_EXECUTE = 0x2000_0000;
        /// Section can be read
        const MEM_READ = 0x4000_0000;
        /// Section can be written to
        const MEM_WRITE = 0x8000_0000;
    }
}

/// One record of the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Raw name, NUL padded, not necessarily valid UTF-8
    pub name: [u8; 8],
    /// Size of the section once loaded into memory
    pub virtual_size: u32,
    /// RVA of the first byte of the section
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the section data
    pub pointer_to_raw_data: u32,
    /// File offset of the relocation entries
    pub pointer_to_relocations: u32,
    /// File offset of the line-number entries
    pub pointer_to_linenumbers: u32,
    /// Number of relocation entries
    pub number_of_relocations: u16,
    /// Number of line-number entries
    pub number_of_linenumbers: u16,
    /// Raw `IMAGE_SCN_*` characteristics
    pub characteristics: u32,
}

impl Section {
    /// Reads one 40-byte record at the parser's current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 40 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<Section> {
        Ok(Section {
            name: parser.read_array::<8>()?,
            virtual_size: parser.read_le::<u32>()?,
            virtual_address: parser.read_le::<u32>()?,
            size_of_raw_data: parser.read_le::<u32>()?,
            pointer_to_raw_data: parser.read_le::<u32>()?,
            pointer_to_relocations: parser.read_le::<u32>()?,
            pointer_to_linenumbers: parser.read_le::<u32>()?,
            number_of_relocations: parser.read_le::<u16>()?,
            number_of_linenumbers: parser.read_le::<u16>()?,
            characteristics: parser.read_le::<u32>()?,
        })
    }

    /// Returns the name with trailing NUL bytes removed, replacing invalid UTF-8.
    #[must_use]
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(self.name.len());

        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Returns the characteristics as flags; alignment and unknown bits are dropped.
    #[must_use]
    pub fn characteristics(&self) -> SectionCharacteristics {
        SectionCharacteristics::from_bits_truncate(self.characteristics)
    }

    /// Returns `true` if `rva` falls inside the in-memory extent of this section.
    ///
    /// The test uses `virtual_size`, so RVAs in the zero-filled tail beyond the on-disk data
    /// are still considered part of the section.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.virtual_size);

        (start..end).contains(&u64::from(rva))
    }

    /// Translates an RVA inside this section to a file offset.
    ///
    /// Returns `None` if the RVA is not contained in the section.
    #[must_use]
    pub fn rva_to_offset(&self, rva: u32) -> Option<u64> {
        if !self.contains_rva(rva) {
            return None;
        }

        Some(u64::from(self.pointer_to_raw_data) + u64::from(rva - self.virtual_address))
    }
}

/// Reads exactly `count` consecutive section records.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the table is truncated.
pub fn read_section_table(parser: &mut Parser, count: u16) -> Result<Vec<Section>> {
    // Capacity is bounded by what the remaining bytes can actually hold.
    let fits = parser.remaining() / SECTION_HEADER_SIZE;
    let mut sections = Vec::with_capacity(usize::from(count).min(fits));

    for _ in 0..count {
        sections.push(Section::read(parser)?);
    }

    Ok(sections)
}

/// Maps an RVA to the first section containing it and the corresponding file offset.
///
/// Sections are scanned in file order and the first match wins. `None` means the RVA is not
/// backed by any section.
///
/// # Examples
///
/// ```rust
/// use pescope::{headers::resolve, Section};
///
/// let text = Section {
///     name: *b".text\0\0\0",
///     virtual_size: 0x500,
///     virtual_address: 0x1000,
///     size_of_raw_data: 0x500,
///     pointer_to_raw_data: 0x400,
///     pointer_to_relocations: 0,
///     pointer_to_linenumbers: 0,
///     number_of_relocations: 0,
///     number_of_linenumbers: 0,
///     characteristics: 0,
/// };
///
/// assert_eq!(resolve(0x1200, &[text]), Some((0, 0x600)));
/// assert_eq!(resolve(0x1600, &[text]), None);
/// ```
#[must_use]
pub fn resolve(rva: u32, sections: &[Section]) -> Option<(usize, u64)> {
    sections
        .iter()
        .enumerate()
        .find_map(|(index, section)| section.rva_to_offset(rva).map(|offset| (index, offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(
        name: &[u8],
        virtual_address: u32,
        virtual_size: u32,
        raw: u32,
        raw_size: u32,
    ) -> Section {
        let mut padded = [0_u8; 8];
        padded[..name.len()].copy_from_slice(name);

        Section {
            name: padded,
            virtual_size,
            virtual_address,
            size_of_raw_data: raw_size,
            pointer_to_raw_data: raw,
            pointer_to_relocations: 0,
            pointer_to_linenumbers: 0,
            number_of_relocations: 0,
            number_of_linenumbers: 0,
            characteristics: 0x4000_0040,
        }
    }

    #[test]
    fn resolve_inside_and_outside() {
        let sections = [section(b".text", 0x1000, 0x500, 0x400, 0x500)];

        assert_eq!(resolve(0x1200, &sections), Some((0, 0x600)));
        assert_eq!(resolve(0x1000, &sections), Some((0, 0x400)));
        assert_eq!(resolve(0x14FF, &sections), Some((0, 0x8FF)));
        assert_eq!(resolve(0x1500, &sections), None);
        assert_eq!(resolve(0x1600, &sections), None);
        assert_eq!(resolve(0x0FFF, &sections), None);
    }

    #[test]
    fn resolve_uses_virtual_size() {
        let sections = [section(b".bss", 0x1000, 0x2000, 0x400, 0x200)];

        // Beyond the 0x200 bytes on disk, but inside the in-memory extent.
        assert_eq!(resolve(0x1800, &sections), Some((0, 0xC00)));
    }

    #[test]
    fn resolve_first_match_wins() {
        let sections = [
            section(b".a", 0x1000, 0x1000, 0x400, 0x1000),
            section(b".b", 0x1800, 0x1000, 0x2000, 0x1000),
        ];

        assert_eq!(resolve(0x1900, &sections), Some((0, 0xD00)));
        assert_eq!(resolve(0x2100, &sections), Some((1, 0x2900)));
    }

    #[test]
    fn resolve_no_overflow() {
        let sections = [section(b".end", 0xFFFF_F000, 0xFFFF_FFFF, 0xFFFF_FFFF, 0)];

        assert_eq!(
            resolve(0xFFFF_FFFF, &sections),
            Some((0, 0xFFFF_FFFF + 0xFFF))
        );
        assert_eq!(resolve(0x1000, &sections), None);
    }

    #[test]
    fn read_records() {
        let mut data = Vec::new();
        for (name, va) in [(b".text\0\0\0", 0x1000_u32), (b".rsrc\0\0\0", 0x2000)] {
            data.extend_from_slice(name);
            data.extend_from_slice(&0x100_u32.to_le_bytes());
            data.extend_from_slice(&va.to_le_bytes());
            data.extend_from_slice(&0x200_u32.to_le_bytes());
            data.extend_from_slice(&(va / 4).to_le_bytes());
            data.extend_from_slice(&[0_u8; 12]);
            data.extend_from_slice(&0x4000_0040_u32.to_le_bytes());
        }

        let mut parser = Parser::new(&data);
        let sections = read_section_table(&mut parser, 2).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name_str(), ".text");
        assert_eq!(sections[1].name_str(), ".rsrc");
        assert_eq!(sections[1].virtual_address, 0x2000);
        assert_eq!(sections[1].pointer_to_raw_data, 0x800);
        assert_eq!(
            sections[1].characteristics(),
            SectionCharacteristics::MEM_READ | SectionCharacteristics::CNT_INITIALIZED_DATA
        );

        let mut parser = Parser::new(&data);
        assert!(read_section_table(&mut parser, 3).is_err());

        let mut parser = Parser::new(&data);
        assert!(read_section_table(&mut parser, 0).unwrap().is_empty());
    }

    #[test]
    fn name_not_utf8() {
        let mut record = section(b"", 0, 0, 0, 0);
        record.name = [0xFF, b'x', 0, 0, 0, 0, 0, 0];
        assert_eq!(record.name_str(), "\u{FFFD}x");

        record.name = *b"LONGNAME";
        assert_eq!(record.name_str(), "LONGNAME");
    }
}
