//! Limits applied while walking resources and decoding icons.
//!
//! Every count, offset and size inside the resource section is attacker controlled. These
//! limits bound how far a walk may recurse, how many leaves it collects and how large an image
//! may get before it is allocated, independently of what the file claims.

/// Bounds for resource walks and icon decoding
///
/// The defaults accept every well-formed image produced by common toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum nesting of resource directories below the root (default: 8)
    ///
    /// Regular images nest three levels deep (type, name, language). Deeper subtrees are
    /// treated as malformed and skipped.
    pub max_depth: usize,

    /// Maximum number of leaves collected from one walk (default: 4096)
    pub max_resources: usize,

    /// Maximum number of directory nodes visited during one walk (default: 4096)
    ///
    /// Directories may be shared between several parents, so this bounds the total work of a
    /// walk even when no subtree is cyclic.
    pub max_directories: usize,

    /// Maximum width and height of a decoded icon, in pixels (default: 1024)
    pub max_icon_dimension: u32,

    /// Maximum size of one resource payload and of one decoded image, in bytes (default: 64 MiB)
    pub max_image_bytes: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_resources: 4096,
            max_directories: 4096,
            max_icon_dimension: 1024,
            max_image_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ResourceLimits {
    /// Creates a configuration for untrusted input processed on a latency-sensitive path
    ///
    /// Only the standard three directory levels are accepted and icons are capped at the
    /// 256 pixel maximum of the icon format.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_depth: 2,
            max_resources: 512,
            max_directories: 512,
            max_icon_dimension: 256,
            max_image_bytes: 4 * 1024 * 1024,
        }
    }

    /// Creates a configuration that accepts unusually large or deep resource sections
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_depth: 32,
            max_resources: 65536,
            max_directories: 65536,
            max_icon_dimension: 4096,
            max_image_bytes: 256 * 1024 * 1024,
        }
    }

    /// Returns `true` if an image of `width` x `height` RGBA pixels stays within the limits.
    #[must_use]
    pub fn allows_image(&self, width: u32, height: u32) -> bool {
        width <= self.max_icon_dimension
            && height <= self.max_icon_dimension
            && u64::from(width) * u64::from(height) * 4 <= self.max_image_bytes
    }
}
