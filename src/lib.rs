// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # pescope
//!
//! Architecture classification and icon extraction for Windows PE executables, without
//! executing or loading them.
//!
//! Given the raw bytes of an `.exe` or `.dll`, `pescope` decodes just enough of the image to
//! answer two questions: whether it targets 32-bit or 64-bit x86, and which of its embedded
//! icons is the best one to show a user.
//!
//! ## Features
//!
//! - **Bounds-checked parsing** - Every read is checked against the input, malformed input
//!   yields an error and never a panic
//! - **Memory-mapped files** - Only the pages holding headers and resources are touched
//! - **Damage tolerant resources** - A corrupt resource subtree is skipped, the rest is still
//!   decoded
//! - **Icon decoding** - Raw bitmaps (1, 4, 8, 24 and 32 bpp with AND masks) and PNG payloads,
//!   decoded to RGBA
//! - **Configurable limits** - [`ResourceLimits`] bounds recursion, resource counts and image
//!   sizes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pescope::prelude::*;
//! use std::path::Path;
//!
//! let pe = PeFile::from_file(Path::new("setup.exe"))?;
//! println!("Architecture: {}", pe.architecture());
//!
//! if let Some(icon) = pe.best_icon() {
//!     icon.into_image().save("setup.png").ok();
//! }
//! # Ok::<(), pescope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Loading fails only if the fixed headers are unusable, see [`Error::is_fatal`]. Problems
//! inside the resource section are logged through the [`log`] facade at `debug` level and the
//! affected entries are skipped.

#[macro_use]
pub(crate) mod error;

pub mod config;

/// PE file abstraction, byte sources and low-level readers
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::PeFile;
///
/// let pe = PeFile::from_mem(std::fs::read("app.exe")?)?;
/// for section in pe.sections() {
///     println!("{:8} rva 0x{:08X}", section.name_str(), section.virtual_address);
/// }
/// # Ok::<(), pescope::Error>(())
/// ```
pub mod file;
pub mod headers;
pub mod icon;
pub mod resources;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use pescope::prelude::*;
///
/// let pe = PeFile::from_file("tests/sample.exe".as_ref())?;
/// let icons: Vec<Icon> = pe.icons();
/// # Ok::<(), pescope::Error>(())
/// ```
pub mod prelude;

/// `pescope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `pescope` Error type
///
/// ```rust
/// use pescope::{Error, PeFile};
///
/// match PeFile::from_mem(vec![0x4D, 0x5A]) {
///     Err(Error::InvalidFormat { message, .. }) => println!("Not a PE image: {}", message),
///     Err(other) => println!("Error: {}", other),
///     Ok(_) => unreachable!(),
/// }
/// ```
pub use error::Error;

pub use config::ResourceLimits;
pub use file::{parser::Parser, Backend, PeFile};
pub use headers::{Architecture, CoffHeader, Machine, Magic, OptionalHeader, Section};
pub use icon::{Icon, IconFormat};
pub use resources::{Resource, ResourceId, ResourceType};
