//! Low-level byte order and safe reading utilities for PE parsing.
//!
//! Every structure this crate decodes (COFF header, section records, resource directories,
//! bitmap headers) is stored in little-endian byte order at an offset taken from untrusted
//! input. This module provides the bounds-checked primitive reads everything else is built on.
//!
//! # Key Components
//!
//! - [`crate::file::io::PeIO`] - Trait describing how a primitive is decoded from its bytes
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::read_bytes_at`] - Borrow a fixed number of bytes at an offset
//!
//! # Error Handling
//!
//! All functions return [`crate::Error::OutOfBounds`] when the buffer does not hold enough
//! bytes. Offset arithmetic is checked, so attacker-controlled offsets close to `usize::MAX`
//! never wrap around.
//!
//! # Examples
//!
//! ```rust,ignore
//! use pescope::file::io::read_le_at;
//!
//! let data = [0x4C, 0x01, 0x03, 0x00];
//! let mut offset = 0;
//!
//! let machine: u16 = read_le_at(&data, &mut offset)?;
//! let sections: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((machine, sections, offset), (0x014C, 3, 4));
//! # Ok::<(), pescope::Error>(())
//! ```

use crate::Result;

/// Trait for implementing type-specific safe little-endian reads.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size
/// byte array required for that particular type (e.g., `[u8; 4]` for `u32`).
pub trait PeIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_pe_io {
    ($($ty:ty),*) => {
        $(
            impl PeIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_pe_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: PeIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`.
///
/// On success the offset is advanced by the size of `T`; on failure it is left untouched.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: PeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let bytes = read_bytes_at(data, offset, type_len)?;

    let Ok(read) = bytes.try_into() else {
        return Err(out_of_bounds_error!());
    };

    Ok(T::from_le_bytes(read))
}

/// Borrows `len` bytes starting at `offset` and advances the offset past them.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the range does not fit into `data`.
pub fn read_bytes_at<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8]> {
    let Some(end) = offset.checked_add(len) else {
        return Err(out_of_bounds_error!());
    };

    let Some(bytes) = data.get(*offset..end) else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;
    Ok(bytes)
}
