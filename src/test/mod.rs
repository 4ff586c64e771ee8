//! Shared helpers for unit tests
//!
//! Builders that synthesize PE images, resource sections and icon payloads, so tests never
//! depend on binaries checked into the repository.


pub use builders::{PeBuilder, ResourceBuilder, ResourceNode};
pub use images::{bitmap_header, dib32, png};
