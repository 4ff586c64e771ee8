//! Resource directory records.
//!
//! All offsets stored in these records are relative to the first byte of the resource section.
//! A directory is a 16-byte header followed by `named + id` 8-byte entries; a leaf is a
//! 16-byte data entry whose RVA points at the payload.

use std::fmt;

use widestring::U16Str;

use crate::{file::io::read_le_at, Result};

/// Size in bytes of a resource directory header
pub const RESOURCE_DIRECTORY_SIZE: usize = 16;
/// Size in bytes of one resource directory entry
pub const RESOURCE_ENTRY_SIZE: usize = 8;
/// Size in bytes of a resource data entry
pub const RESOURCE_DATA_ENTRY_SIZE: usize = 16;

/// High bit of an entry field, marking a name string or a subdirectory
pub const RESOURCE_HIGH_BIT: u32 = 0x8000_0000;

/// Identifier of a directory entry: either numeric or a UTF-16 name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// Numeric identifier
    Id(u32),
    /// Name decoded from the resource section
    Name(String),
}

impl ResourceId {
    /// Returns the numeric identifier, if this is one.
    #[must_use]
    pub fn as_id(&self) -> Option<u32> {
        match self {
            ResourceId::Id(id) => Some(*id),
            ResourceId::Name(_) => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Id(id) => write!(f, "#{}", id),
            ResourceId::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A leaf of the resource tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDataEntry {
    /// RVA of the payload; unlike the directory offsets this is image relative
    pub data_rva: u32,
    /// Size of the payload in bytes
    pub size: u32,
    /// Code page used to decode code point values in the payload
    pub codepage: u32,
    /// Reserved, should be zero
    pub reserved: u32,
}

impl ResourceDataEntry {
    /// Reads a data entry at `offset` within the resource section.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the 16 bytes do not fit.
    pub fn read(section: &[u8], offset: usize) -> Result<ResourceDataEntry> {
        let mut offset = offset;

        Ok(ResourceDataEntry {
            data_rva: read_le_at::<u32>(section, &mut offset)?,
            size: read_le_at::<u32>(section, &mut offset)?,
            codepage: read_le_at::<u32>(section, &mut offset)?,
            reserved: read_le_at::<u32>(section, &mut offset)?,
        })
    }
}

/// What a directory entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChild {
    /// A nested directory
    Directory(ResourceDirectoryTable),
    /// A leaf
    Data(ResourceDataEntry),
}

/// One `(identifier, child)` pair of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDirectoryEntry {
    /// Type, name or language identifier depending on the level
    pub id: ResourceId,
    /// The subdirectory or leaf this entry points at
    pub child: ResourceChild,
}

/// A decoded resource directory.
///
/// `entries` holds only the entries that could be decoded (and, at the root, that passed the
/// type filter). The header counts are kept as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDirectoryTable {
    /// Reserved, should be zero
    pub characteristics: u32,
    /// Time the resource data was created by the resource compiler
    pub time_date_stamp: u32,
    /// Major version number
    pub major_version: u16,
    /// Minor version number
    pub minor_version: u16,
    /// Number of entries identified by name, stored first
    pub number_of_named_entries: u16,
    /// Number of entries identified by a numeric id, stored after the named ones
    pub number_of_id_entries: u16,
    /// Entries in stored order
    pub entries: Vec<ResourceDirectoryEntry>,
}

/// The fixed part of a directory node before its entries are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DirectoryHeader {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub number_of_named_entries: u16,
    pub number_of_id_entries: u16,
}

impl DirectoryHeader {
    /// Reads the 16-byte header at `offset`.
    pub fn read(section: &[u8], offset: usize) -> Result<DirectoryHeader> {
        let mut offset = offset;

        Ok(DirectoryHeader {
            characteristics: read_le_at::<u32>(section, &mut offset)?,
            time_date_stamp: read_le_at::<u32>(section, &mut offset)?,
            major_version: read_le_at::<u16>(section, &mut offset)?,
            minor_version: read_le_at::<u16>(section, &mut offset)?,
            number_of_named_entries: read_le_at::<u16>(section, &mut offset)?,
            number_of_id_entries: read_le_at::<u16>(section, &mut offset)?,
        })
    }

    pub fn entry_count(&self) -> usize {
        usize::from(self.number_of_named_entries) + usize::from(self.number_of_id_entries)
    }

    pub fn into_table(self, entries: Vec<ResourceDirectoryEntry>) -> ResourceDirectoryTable {
        ResourceDirectoryTable {
            characteristics: self.characteristics,
            time_date_stamp: self.time_date_stamp,
            major_version: self.major_version,
            minor_version: self.minor_version,
            number_of_named_entries: self.number_of_named_entries,
            number_of_id_entries: self.number_of_id_entries,
            entries,
        }
    }
}

/// An 8-byte directory entry as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub name: u32,
    pub offset: u32,
}

impl RawEntry {
    pub fn read(section: &[u8], offset: usize) -> Result<RawEntry> {
        let mut offset = offset;

        Ok(RawEntry {
            name: read_le_at::<u32>(section, &mut offset)?,
            offset: read_le_at::<u32>(section, &mut offset)?,
        })
    }

    pub fn is_directory(&self) -> bool {
        self.offset & RESOURCE_HIGH_BIT != 0
    }

    pub fn child_offset(&self) -> usize {
        (self.offset & !RESOURCE_HIGH_BIT) as usize
    }

    /// Decodes the identifier, following the name pointer if the high bit is set.
    pub fn id(&self, section: &[u8]) -> Result<ResourceId> {
        if self.name & RESOURCE_HIGH_BIT == 0 {
            return Ok(ResourceId::Id(self.name));
        }

        read_name(section, (self.name & !RESOURCE_HIGH_BIT) as usize).map(ResourceId::Name)
    }
}

/// Reads a length-prefixed UTF-16LE name string.
fn read_name(section: &[u8], offset: usize) -> Result<String> {
    let mut offset = offset;
    let length = usize::from(read_le_at::<u16>(section, &mut offset)?);

    let mut units = Vec::with_capacity(length);
    for _ in 0..length {
        units.push(read_le_at::<u16>(section, &mut offset)?);
    }

    Ok(U16Str::from_slice(&units).to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_entry() {
        let mut data = vec![0xEE_u8; 4];
        for value in [0x3010_u32, 0x128, 1252, 0] {
            data.extend_from_slice(&value.to_le_bytes());
        }

        let entry = ResourceDataEntry::read(&data, 4).unwrap();
        assert_eq!(entry.data_rva, 0x3010);
        assert_eq!(entry.size, 0x128);
        assert_eq!(entry.codepage, 1252);
        assert_eq!(entry.reserved, 0);

        assert!(ResourceDataEntry::read(&data, 5).is_err());
    }

    #[test]
    fn directory_header() {
        #[rustfmt::skip]
        let data = [
            0x00, 0x00, 0x00, 0x00, // characteristics
            0x10, 0x00, 0x00, 0x00, // time_date_stamp
            0x04, 0x00,             // major_version
            0x00, 0x00,             // minor_version
            0x01, 0x00,             // named entries
            0x02, 0x00,             // id entries
        ];

        let header = DirectoryHeader::read(&data, 0).unwrap();
        assert_eq!(header.time_date_stamp, 0x10);
        assert_eq!(header.major_version, 4);
        assert_eq!(header.entry_count(), 3);

        let table = header.into_table(vec![]);
        assert_eq!(table.number_of_named_entries, 1);
        assert_eq!(table.number_of_id_entries, 2);

        assert!(DirectoryHeader::read(&data[..15], 0).is_err());
    }

    #[test]
    fn entry_flags() {
        let directory = RawEntry {
            name: 3,
            offset: 0x8000_0018,
        };
        assert!(directory.is_directory());
        assert_eq!(directory.child_offset(), 0x18);
        assert_eq!(directory.id(&[]).unwrap(), ResourceId::Id(3));

        let leaf = RawEntry {
            name: 1033,
            offset: 0x48,
        };
        assert!(!leaf.is_directory());
        assert_eq!(leaf.child_offset(), 0x48);
    }

    #[test]
    fn named_entry() {
        let mut section = vec![0_u8; 4];
        section.extend_from_slice(&4_u16.to_le_bytes());
        for unit in "ICON".encode_utf16() {
            section.extend_from_slice(&unit.to_le_bytes());
        }

        let entry = RawEntry {
            name: RESOURCE_HIGH_BIT | 4,
            offset: 0,
        };
        assert_eq!(
            entry.id(&section).unwrap(),
            ResourceId::Name("ICON".to_string())
        );

        // Length prefix claims more characters than the section holds.
        section[4] = 0x40;
        assert!(entry.id(&section).is_err());
    }

    #[test]
    fn id_display() {
        assert_eq!(ResourceId::Id(14).to_string(), "#14");
        assert_eq!(ResourceId::Name("MAINICON".to_string()).to_string(), "MAINICON");
        assert_eq!(ResourceId::Name("X".to_string()).as_id(), None);
        assert_eq!(ResourceId::Id(3).as_id(), Some(3));
    }
}
