//! Resource section decoding.
//!
//! The resource section holds a tree of directories, conventionally three levels deep
//! (type, then name or id, then language), whose leaves point at the raw resource bytes.
//!
//! # Key Components
//!
//! - [`crate::resources::parse_resource_directory`] - Decode the tree from the section bytes
//! - [`crate::resources::ResourceDirectoryTable`] - A decoded directory node
//! - [`crate::resources::Resource`] - A leaf together with the identifiers on its path
//! - [`crate::resources::ResourceType`] - The predefined `RT_*` type identifiers
//!
//! # Filtering
//!
//! Callers pass the set of resource types they are interested in. The set is only consulted
//! for the entries of the root directory; the subtrees of matching types are decoded in full.
//!
//! # Damaged Trees
//!
//! A directory or data entry that does not fit into the section, points outside of it, nests
//! too deep or loops back to one of its ancestors is skipped together with its subtree. The rest
//! of the tree is still decoded, so a single bad entry never hides the remaining resources.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::{resources::ResourceType, PeFile};
//! use std::path::Path;
//!
//! let pe = PeFile::from_file(Path::new("setup.exe"))?;
//! for resource in pe.resources(&[ResourceType::Icon, ResourceType::GroupIcon]) {
//!     println!("{} {:?} {} bytes", resource.type_id(), resource.name(), resource.entry.size);
//! }
//! # Ok::<(), pescope::Error>(())
//! ```

mod directory;
mod walker;

pub use directory::{
    ResourceChild, ResourceDataEntry, ResourceDirectoryEntry, ResourceDirectoryTable, ResourceId,
    RESOURCE_DATA_ENTRY_SIZE, RESOURCE_DIRECTORY_SIZE, RESOURCE_ENTRY_SIZE, RESOURCE_HIGH_BIT,
};

use strum::{Display, EnumIter, FromRepr};

use crate::{config::ResourceLimits, Result};
use walker::Walker;

/// Predefined resource types (`RT_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(u32)]
pub enum ResourceType {
    /// Hardware-dependent cursor
    Cursor = 1,
    /// Bitmap
    Bitmap = 2,
    /// Hardware-dependent icon image
    Icon = 3,
    /// Menu
    Menu = 4,
    /// Dialog box
    Dialog = 5,
    /// String table entry
    String = 6,
    /// Font directory
    FontDir = 7,
    /// Font
    Font = 8,
    /// Accelerator table
    Accelerator = 9,
    /// Application-defined raw data
    RcData = 10,
    /// Message table entry
    MessageTable = 11,
    /// Hardware-independent cursor group
    GroupCursor = 12,
    /// Hardware-independent icon group
    GroupIcon = 14,
    /// Version information
    Version = 16,
    /// Dialog include file name
    DlgInclude = 17,
    /// Plug and Play resource
    PlugPlay = 19,
    /// VXD
    Vxd = 20,
    /// Animated cursor
    AniCursor = 21,
    /// Animated icon
    AniIcon = 22,
    /// HTML resource
    Html = 23,
    /// Side-by-side assembly manifest
    Manifest = 24,
}

impl ResourceType {
    /// Returns the numeric identifier stored in the resource directory.
    #[must_use]
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// A leaf of the resource tree, with the identifiers of every directory above it.
///
/// `path[0]` is the type, `path[1]` the name and `path[2]` the language for regular trees.
/// Leaves found higher up simply have a shorter path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Identifiers from the root down to the leaf, never empty
    pub path: Vec<ResourceId>,
    /// The data entry of the leaf
    pub entry: ResourceDataEntry,
}

impl Resource {
    /// Returns the type identifier.
    #[must_use]
    pub fn type_id(&self) -> &ResourceId {
        &self.path[0]
    }

    /// Returns the predefined type, if the type identifier is one.
    #[must_use]
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.type_id().as_id().and_then(ResourceType::from_repr)
    }

    /// Returns the name or id of the resource, if the leaf is at least two levels deep.
    #[must_use]
    pub fn name(&self) -> Option<&ResourceId> {
        self.path.get(1)
    }

    /// Returns the language identifier, if the leaf is at least three levels deep.
    #[must_use]
    pub fn language(&self) -> Option<&ResourceId> {
        self.path.get(2)
    }
}

/// Decodes the resource tree from the bytes of the resource section.
///
/// Only root entries whose numeric identifier is listed in `type_ids` are decoded; an empty
/// list decodes every type. Identifiers need not be predefined `RT_*` values, see
/// [`ResourceType::id`]. Returns `Err` only if the root directory itself is unusable.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedResource`] if the root directory header or its entry table
/// does not fit into `section`.
pub fn parse_resource_directory(
    section: &[u8],
    type_ids: &[u32],
    limits: &ResourceLimits,
) -> Result<ResourceDirectoryTable> {
    Walker::new(section, limits).walk(type_ids)
}

impl ResourceDirectoryTable {
    /// Flattens the tree into its leaves, in stored order.
    #[must_use]
    pub fn leaves(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        let mut path = Vec::new();

        collect(self, &mut path, &mut resources);
        resources
    }
}

fn collect(table: &ResourceDirectoryTable, path: &mut Vec<ResourceId>, out: &mut Vec<Resource>) {
    for entry in &table.entries {
        path.push(entry.id.clone());

        match &entry.child {
            ResourceChild::Directory(child) => collect(child, path, out),
            ResourceChild::Data(data) => out.push(Resource {
                path: path.clone(),
                entry: *data,
            }),
        }

        path.pop();
    }
}
