//! Depth-first walk over a resource section, filtered by type at the root.

use crate::{
    config::ResourceLimits,
    resources::directory::{
        DirectoryHeader, RawEntry, ResourceChild, ResourceDataEntry, ResourceDirectoryEntry,
        ResourceDirectoryTable, RESOURCE_DATA_ENTRY_SIZE, RESOURCE_DIRECTORY_SIZE,
        RESOURCE_ENTRY_SIZE, RESOURCE_HIGH_BIT,
    },
    Result,
};

/// Depth-first decoder over the bytes of one resource section.
///
/// The section is borrowed once and every node is addressed by its offset into it. A node that
/// cannot be decoded is dropped together with its subtree; its siblings are still visited.
pub(crate) struct Walker<'a> {
    section: &'a [u8],
    limits: &'a ResourceLimits,
    /// Offsets of the directories on the current path, for cycle detection
    ancestors: Vec<usize>,
    directories: usize,
    leaves: usize,
}

impl<'a> Walker<'a> {
    pub fn new(section: &'a [u8], limits: &'a ResourceLimits) -> Self {
        Walker {
            section,
            limits,
            ancestors: Vec::new(),
            directories: 0,
            leaves: 0,
        }
    }

    /// Decodes the tree, keeping only root entries whose numeric id is in `types`.
    ///
    /// An empty `types` keeps every root entry. Levels below the root are never filtered.
    pub fn walk(&mut self, types: &[u32]) -> Result<ResourceDirectoryTable> {
        self.directory(0, 0, types)
    }

    fn directory(
        &mut self,
        offset: usize,
        depth: usize,
        types: &[u32],
    ) -> Result<ResourceDirectoryTable> {
        if depth > self.limits.max_depth {
            return Err(malformed_resource!(
                "Directory at 0x{:X} nested deeper than {} levels",
                offset,
                self.limits.max_depth
            ));
        }

        // Shared subdirectories are legal, so the total number of visits is bounded as well.
        if self.directories >= self.limits.max_directories {
            return Err(malformed_resource!(
                "More than {} directories visited",
                self.limits.max_directories
            ));
        }
        self.directories += 1;

        if self.ancestors.contains(&offset) {
            return Err(malformed_resource!(
                "Directory at 0x{:X} is its own ancestor",
                offset
            ));
        }

        let header = DirectoryHeader::read(self.section, offset).map_err(|_| {
            malformed_resource!(
                "Directory header at 0x{:X} exceeds the section of {} bytes",
                offset,
                self.section.len()
            )
        })?;

        let count = header.entry_count();
        let first_entry = offset + RESOURCE_DIRECTORY_SIZE;
        let table_end = first_entry + count * RESOURCE_ENTRY_SIZE;
        if table_end > self.section.len() {
            return Err(malformed_resource!(
                "Directory at 0x{:X} declares {} entries, exceeding the section",
                offset,
                count
            ));
        }

        self.ancestors.push(offset);

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let entry_offset = first_entry + index * RESOURCE_ENTRY_SIZE;

            match self.entry(entry_offset, depth, types) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(error) => {
                    log::debug!("Skipping resource entry at 0x{:X}: {}", entry_offset, error);
                }
            }
        }

        self.ancestors.pop();

        Ok(header.into_table(entries))
    }

    /// Decodes one entry; `Ok(None)` means it was filtered out or the leaf limit was hit.
    fn entry(
        &mut self,
        offset: usize,
        depth: usize,
        types: &[u32],
    ) -> Result<Option<ResourceDirectoryEntry>> {
        let raw = RawEntry::read(self.section, offset)?;

        if depth == 0 && !types.is_empty() {
            // Named types never match a numeric filter, so their names are not even decoded.
            if raw.name & RESOURCE_HIGH_BIT != 0 || !types.contains(&raw.name) {
                log::trace!("Root entry {:#X} filtered out", raw.name);
                return Ok(None);
            }
        }

        if self.leaves >= self.limits.max_resources {
            log::debug!(
                "Resource limit of {} reached, ignoring the remaining entries",
                self.limits.max_resources
            );
            return Ok(None);
        }

        let id = raw.id(self.section).map_err(|_| {
            malformed_resource!("Name of entry at 0x{:X} exceeds the section", offset)
        })?;

        let child_offset = raw.child_offset();
        if child_offset >= self.section.len() {
            return Err(malformed_resource!(
                "Entry {} points to 0x{:X}, past the section of {} bytes",
                id,
                child_offset,
                self.section.len()
            ));
        }

        let child = if raw.is_directory() {
            ResourceChild::Directory(self.directory(child_offset, depth + 1, &[])?)
        } else {
            ResourceChild::Data(self.data_entry(child_offset)?)
        };

        Ok(Some(ResourceDirectoryEntry { id, child }))
    }

    fn data_entry(&mut self, offset: usize) -> Result<ResourceDataEntry> {
        if offset + RESOURCE_DATA_ENTRY_SIZE > self.section.len() {
            return Err(malformed_resource!(
                "Data entry at 0x{:X} exceeds the section",
                offset
            ));
        }

        let entry = ResourceDataEntry::read(self.section, offset)?;
        if u64::from(entry.size) > self.limits.max_image_bytes {
            return Err(malformed_resource!(
                "Data entry at 0x{:X} declares {} bytes, above the limit of {}",
                offset,
                entry.size,
                self.limits.max_image_bytes
            ));
        }

        self.leaves += 1;
        Ok(entry)
    }
}
