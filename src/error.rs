use thiserror::Error;

macro_rules! invalid_format {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidFormat {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidFormat {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! malformed_resource {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedResource {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedResource {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only [`Error::InvalidFormat`], [`Error::Empty`] and [`Error::FileError`] ever escape the
/// construction of a [`crate::PeFile`]. Everything downstream of a successful header parse
/// (unreachable RVAs, damaged resource nodes, icons that cannot be decoded) is reported through
/// the remaining variants internally and is turned into a skip by the public queries, so that a
/// damaged resource section never hides the architecture or the other valid icons.
///
/// # Error Categories
///
/// ## Fatal
/// - [`Error::InvalidFormat`] - Missing PE signature or truncated fixed header
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Non-fatal
/// - [`Error::OutOfBounds`] - A read would have gone past the available bytes
/// - [`Error::UnreachableResource`] - An RVA that is not covered by any section
/// - [`Error::MalformedResource`] - An inconsistent resource directory node or data entry
/// - [`Error::UndecodableIcon`] - Resource bytes that are neither a DIB nor an encoded image
/// - [`Error::Image`] - Failure reported by the `image` decoders
///
/// # Examples
///
/// ```rust,no_run
/// use pescope::{Error, PeFile};
/// use std::path::Path;
///
/// match PeFile::from_file(Path::new("setup.exe")) {
///     Ok(pe) => println!("{}", pe.architecture()),
///     Err(Error::InvalidFormat { message, .. }) => eprintln!("Not a PE file: {}", message),
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not a PE image, or one of its fixed headers could not be fully read.
    ///
    /// This is the only parse failure that prevents a [`crate::PeFile`] from being
    /// constructed. The error carries the source location where it was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was wrong
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Invalid format - {file}:{line}: {message}")]
    InvalidFormat {
        /// The message to be printed for the InvalidFormat error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while reading binary data.
    #[error("Out of Bound read would have occurred - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The RVA is not contained in any section of the image.
    #[error("RVA 0x{0:08X} does not belong to any section")]
    UnreachableResource(u32),

    /// A resource directory node or data entry is internally inconsistent.
    ///
    /// Raised while walking the resource tree; the affected subtree is skipped and the
    /// walk continues with its siblings.
    #[error("Malformed resource - {file}:{line}: {message}")]
    MalformedResource {
        /// The message to be printed for the MalformedResource error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The bytes of an icon resource match neither supported icon format.
    #[error("Undecodable icon: {0}")]
    UndecodableIcon(String),

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error reported by the `image` crate while decoding an embedded image.
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Returns `true` if this error prevents a [`crate::PeFile`] from being produced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pescope::Error;
    ///
    /// assert!(Error::Empty.is_fatal());
    /// assert!(!Error::UnreachableResource(0x1000).is_fatal());
    /// ```
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat { .. } | Error::Empty | Error::FileError(_)
        )
    }
}
