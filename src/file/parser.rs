//! Cursor-based reader over a byte slice.
//!
//! [`crate::file::parser::Parser`] wraps the primitive reads of [`crate::file::io`] with a
//! position, which is how the fixed PE headers are consumed: a seek to the header pointer,
//! sequential field reads, a jump over the optional header, then the section table.
//!
//! # Examples
//!
//! ```rust
//! use pescope::Parser;
//!
//! let data = [0x50, 0x45, 0x00, 0x00, 0x64, 0x86];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_bytes(4)?, b"PE\0\0");
//! assert_eq!(parser.read_le::<u16>()?, 0x8664);
//! assert!(!parser.has_more_data());
//! # Ok::<(), pescope::Error>(())
//! ```

use crate::{
    file::io::{read_bytes_at, read_le_at, PeIO},
    Result,
};

/// A bounds-checked cursor over little-endian binary data.
///
/// The parser never reads past the end of its slice; every failed operation returns
/// [`crate::Error::OutOfBounds`] and leaves the position unchanged.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pescope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let parser = Parser::new(&data);
    /// assert_eq!(parser.len(), 4);
    /// ```
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the number of bytes between the current position and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Move the current position to the specified index.
    ///
    /// Seeking to exactly the end of the data is allowed; the next read will fail.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is beyond the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pescope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// parser.seek(2)?;
    /// assert_eq!(parser.read_le::<u8>()?, 0x03);
    /// assert!(parser.seek(5).is_err());
    /// # Ok::<(), pescope::Error>(())
    /// ```
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a type `T` from the current position in little-endian format and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_le<T: PeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow `len` bytes from the current position and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        read_bytes_at(self.data, &mut self.position, len)
    }

    /// Read a fixed-size byte array from the current position and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if there are not enough bytes remaining.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;

        let mut array = [0_u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }
}
