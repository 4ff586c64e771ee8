//! # pescope Prelude
//!
//! The types needed for the common path: load an image, classify it, fetch its icon.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pescope operations
pub use crate::Error;

/// The result type used throughout pescope
pub use crate::Result;

/// Limits for resource walks and icon decoding
pub use crate::ResourceLimits;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded PE image
pub use crate::PeFile;

/// Architecture derived from the optional header magic
pub use crate::Architecture;

// ================================================================================================
// Resources and Icons
// ================================================================================================

/// Resource leaves and their identifiers
pub use crate::resources::{Resource, ResourceId, ResourceType};

/// Decoded icons
pub use crate::icon::{Icon, IconFormat};
