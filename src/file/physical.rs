//! Read-only memory-mapped file backend.
//!
//! [`crate::file::physical::Physical`] maps an executable on disk into the address space instead
//! of reading it, so looking up an icon in a large installer only touches the pages holding the
//! headers and the resource section.
//!
//! The file handle is closed as soon as the mapping exists; the mapping itself is released when
//! the backend is dropped.

use super::Backend;
use crate::{Error::FileError, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for access to files on disk.
///
/// # Examples
///
/// ```rust,ignore
/// use pescope::file::{Physical, Backend};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("notepad.exe"))?;
/// assert_eq!(physical.data_slice(0, 2)?, b"MZ");
/// # Ok::<(), pescope::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    /// * `path` - Path to the PE file on disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path).map_err(FileError)?;

        // The mapping is read-only; concurrent truncation of the file by another process is
        // outside of what this crate can guard against.
        let mmap = unsafe { Mmap::map(&file) }.map_err(FileError)?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        self.data
            .get(offset..offset_end)
            .ok_or_else(|| out_of_bounds_error!())
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, path::PathBuf};

    use tempfile::NamedTempFile;

    use super::*;

    fn temp_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn physical() {
        let file = temp_file(&[0x4D, 0x5A, 0x90, 0x00, 0x03, 0x00]);
        let physical = Physical::new(file.path()).unwrap();

        assert_eq!(physical.len(), 6);
        assert_eq!(physical.data_slice(0, 2).unwrap(), b"MZ");
        assert_eq!(physical.data_slice(4, 2).unwrap(), &[0x03, 0x00]);
        assert!(physical.data_slice(5, 2).is_err());
        assert!(physical.data_slice(usize::MAX, 1).is_err());
    }

    #[test]
    fn invalid_file_path() {
        let result = Physical::new(PathBuf::from("/nonexistent/path/to/setup.exe"));
        match result {
            Err(FileError(io_error)) => {
                assert_eq!(io_error.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected FileError"),
        }
    }

    #[test]
    fn empty_file() {
        let file = temp_file(b"");

        let physical = Physical::new(file.path()).unwrap();
        assert_eq!(physical.len(), 0);
        assert!(physical.data_slice(0, 1).is_err());
        let empty_slice: &[u8] = &[];
        assert_eq!(physical.data_slice(0, 0).unwrap(), empty_slice);
    }
}
