//! PE file abstraction.
//!
//! This module ties the byte sources, the header parser, the resource walker and the icon
//! decoder together behind [`crate::file::PeFile`].
//!
//! # Key Components
//!
//! ## Core Types
//! - [`crate::file::PeFile`] - A loaded image with architecture and icon queries
//! - [`crate::file::Backend`] - Trait for different data sources (disk files, memory buffers)
//!
//! ## Parsing Infrastructure
//! - [`crate::file::parser::Parser`] - Cursor over a byte slice
//! - [`crate::file::io`] - Low-level little-endian reads
//!
//! # Data Sources
//!
//! - **Physical files** - Read-only memory maps, see [`PeFile::from_file`]
//! - **Memory buffers** - Owned byte vectors, see [`PeFile::from_mem`]
//! - **Readers** - Anything implementing [`std::io::Read`], copied into memory by
//!   [`PeFile::from_reader`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::PeFile;
//! use std::path::Path;
//!
//! let pe = PeFile::from_file(Path::new("setup.exe"))?;
//! println!("{} image, {} sections", pe.architecture(), pe.sections().len());
//!
//! if let Some(icon) = pe.best_icon() {
//!     println!("Best icon is {}x{}", icon.width(), icon.height());
//! }
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`PeFile`] is immutable after loading and can be shared across threads. Every query walks
//! the borrowed bytes again; nothing is cached.

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::{io::Read, path::Path};

use crate::{
    config::ResourceLimits,
    headers::{self, Architecture, CoffHeader, Headers, OptionalHeader, Section},
    icon::{self, Icon},
    resources::{parse_resource_directory, Resource, ResourceDirectoryTable, ResourceType},
    Error::{Empty, UnreachableResource},
    Result,
};
use memory::Memory;
use physical::Physical;

/// Name of the section holding the resource tree
pub const RESOURCE_SECTION_NAME: &str = ".rsrc";

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of PE data, allowing for both in-memory and on-disk
/// representations. All implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// A loaded PE image.
///
/// Loading decodes the fixed headers and classifies the architecture. Resources and icons are
/// decoded on demand from the retained bytes.
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{Architecture, PeFile};
///
/// let data = std::fs::read("app.exe")?;
/// let pe = PeFile::from_mem(data)?;
///
/// match pe.architecture() {
///     Architecture::X86_64 => println!("64-bit"),
///     Architecture::X86_32 => println!("32-bit"),
///     Architecture::Unknown => println!("unknown"),
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
pub struct PeFile {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// Headers decoded at load time
    headers: Headers,
    architecture: Architecture,
}

impl PeFile {
    /// Loads a PE image from the given path.
    ///
    /// The file is memory-mapped read-only; the handle is closed once the map exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped,
    /// [`crate::Error::Empty`] for an empty file and [`crate::Error::InvalidFormat`] if the
    /// headers are not those of a PE image.
    pub fn from_file(file: &Path) -> Result<PeFile> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE image from a memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] for an empty buffer and [`crate::Error::InvalidFormat`]
    /// if the headers are not those of a PE image.
    pub fn from_mem(data: Vec<u8>) -> Result<PeFile> {
        let input = Memory::new(data);

        Self::load(input)
    }

    /// Loads a PE image by reading `reader` to its end.
    ///
    /// The reader is only borrowed for the duration of this call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if reading fails, otherwise the same errors as
    /// [`PeFile::from_mem`].
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<PeFile> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        Self::from_mem(data)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<PeFile> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let headers = headers::parse(data.data())?;
        let architecture = headers.architecture();

        Ok(PeFile {
            data: Box::new(data),
            headers,
            architecture,
        })
    }

    /// Returns the total size of the loaded image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw bytes of the image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a slice of the image at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Returns the architecture decided at load time. Never fails.
    #[must_use]
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Returns all decoded fixed headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the COFF file header.
    #[must_use]
    pub fn coff_header(&self) -> &CoffHeader {
        &self.headers.coff
    }

    /// Returns the optional header magic, if the image declares an optional header.
    #[must_use]
    pub fn optional_header(&self) -> Option<&OptionalHeader> {
        self.headers.optional.as_ref()
    }

    /// Returns the section records in file order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.headers.sections
    }

    /// Converts a relative virtual address to a file offset using the first section that
    /// contains it.
    #[must_use]
    pub fn rva_to_offset(&self, rva: u32) -> Option<u64> {
        headers::resolve(rva, self.sections()).map(|(_, offset)| offset)
    }

    /// Returns the first section named `.rsrc`.
    #[must_use]
    pub fn resource_section(&self) -> Option<&Section> {
        self.sections()
            .iter()
            .find(|section| section.name_str() == RESOURCE_SECTION_NAME)
    }

    /// Raw bytes of a section, clamped to the bytes present in the image.
    fn section_bytes(&self, section: &Section) -> &[u8] {
        let data = self.data();
        let start = (section.pointer_to_raw_data as usize).min(data.len());
        let end = start
            .saturating_add(section.size_of_raw_data as usize)
            .min(data.len());

        &data[start..end]
    }

    /// Decodes the resource tree with the default limits, see
    /// [`PeFile::resource_directory_with`].
    #[must_use]
    pub fn resource_directory(&self, types: &[ResourceType]) -> Option<ResourceDirectoryTable> {
        self.resource_directory_with(types, &ResourceLimits::default())
    }

    /// Decodes the resource tree, keeping only the listed top-level types.
    ///
    /// An empty `types` keeps all of them. Returns `None` if the image has no resource section
    /// or its root directory is unusable; damaged subtrees are skipped.
    #[must_use]
    pub fn resource_directory_with(
        &self,
        types: &[ResourceType],
        limits: &ResourceLimits,
    ) -> Option<ResourceDirectoryTable> {
        let type_ids: Vec<u32> = types.iter().map(|kind| kind.id()).collect();
        self.resource_directory_by_id(&type_ids, limits)
    }

    /// Decodes the resource tree, keeping only the top-level types with the given numeric ids.
    ///
    /// Unlike [`PeFile::resource_directory_with`] this also accepts application-defined type
    /// ids outside the predefined `RT_*` set.
    #[must_use]
    pub fn resource_directory_by_id(
        &self,
        type_ids: &[u32],
        limits: &ResourceLimits,
    ) -> Option<ResourceDirectoryTable> {
        let Some(section) = self.resource_section() else {
            log::trace!("No {} section", RESOURCE_SECTION_NAME);
            return None;
        };

        match parse_resource_directory(self.section_bytes(section), type_ids, limits) {
            Ok(table) => Some(table),
            Err(error) => {
                log::debug!("Unusable resource directory: {}", error);
                None
            }
        }
    }

    /// Returns the leaves of the resource tree in file order, with the default limits.
    #[must_use]
    pub fn resources(&self, types: &[ResourceType]) -> Vec<Resource> {
        self.resources_with(types, &ResourceLimits::default())
    }

    /// Returns the leaves of the resource tree in file order.
    #[must_use]
    pub fn resources_with(&self, types: &[ResourceType], limits: &ResourceLimits) -> Vec<Resource> {
        self.resource_directory_with(types, limits)
            .map(|table| table.leaves())
            .unwrap_or_default()
    }

    /// Returns the leaves of the top-level types with the given numeric ids, in file order.
    #[must_use]
    pub fn resources_by_id(&self, type_ids: &[u32], limits: &ResourceLimits) -> Vec<Resource> {
        self.resource_directory_by_id(type_ids, limits)
            .map(|table| table.leaves())
            .unwrap_or_default()
    }

    /// Returns the payload of a resource leaf.
    ///
    /// The payload is clamped to the raw data of the section its RVA resolves to and to the end
    /// of the image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnreachableResource`] if the RVA belongs to no section and
    /// [`crate::Error::MalformedResource`] if none of the payload is present in the image.
    pub fn resource_data(&self, resource: &Resource) -> Result<&[u8]> {
        let entry = &resource.entry;
        let (index, offset) = headers::resolve(entry.data_rva, self.sections())
            .ok_or(UnreachableResource(entry.data_rva))?;

        let section = &self.sections()[index];
        let raw_end =
            u64::from(section.pointer_to_raw_data) + u64::from(section.size_of_raw_data);
        let end = (offset + u64::from(entry.size))
            .min(raw_end)
            .min(self.len() as u64);

        if offset >= end {
            return Err(malformed_resource!(
                "Resource {} at RVA 0x{:08X} has no bytes in the image",
                resource.type_id(),
                entry.data_rva
            ));
        }

        Ok(&self.data()[offset as usize..end as usize])
    }

    /// Decodes every icon with the default limits.
    #[must_use]
    pub fn icons(&self) -> Vec<Icon> {
        self.icons_with(&ResourceLimits::default())
    }

    /// Decodes every `RT_ICON` leaf, in file order.
    ///
    /// Leaves that cannot be located or decoded are skipped.
    #[must_use]
    pub fn icons_with(&self, limits: &ResourceLimits) -> Vec<Icon> {
        let mut icons = Vec::new();

        for resource in self.resources_with(&[ResourceType::Icon], limits) {
            let decoded = self
                .resource_data(&resource)
                .and_then(|payload| icon::decode(payload, limits));

            match decoded {
                Ok(icon) => icons.push(icon),
                Err(error) => log::debug!(
                    "Skipping icon {}: {}",
                    resource
                        .name()
                        .map_or_else(String::new, ToString::to_string),
                    error
                ),
            }
        }

        icons
    }

    /// Returns the tallest icon with the default limits, see [`PeFile::best_icon_with`].
    #[must_use]
    pub fn best_icon(&self) -> Option<Icon> {
        self.best_icon_with(&ResourceLimits::default())
    }

    /// Returns the tallest decodable icon; on ties the one stored first.
    ///
    /// `None` means the image has no decodable icon at all, including when it has no resource
    /// section.
    #[must_use]
    pub fn best_icon_with(&self, limits: &ResourceLimits) -> Option<Icon> {
        icon::select_best(self.icons_with(limits))
    }
}
