//! Icon payload decoding and selection.
//!
//! An `RT_ICON` leaf holds either a raw device-independent bitmap without a file header or a
//! complete image in a self-describing format (PNG for most large icons). [`IconPayload::probe`]
//! tells the two apart from the first 40 bytes; [`decode`] turns either into an RGBA image.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pescope::{icon, ResourceLimits};
//!
//! let payload = std::fs::read("icon.bin")?;
//! let icon = icon::decode(&payload, &ResourceLimits::default())?;
//! println!("{:?} icon, {}x{}", icon.format(), icon.width(), icon.height());
//! # Ok::<(), pescope::Error>(())
//! ```

mod dib;
mod encoded;

pub use dib::{BitmapInfoHeader, BITMAP_INFO_HEADER_SIZE, BI_RGB};

use image::RgbaImage;
use strum::Display;

use crate::{config::ResourceLimits, Result};

/// How an icon payload was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum IconFormat {
    /// Raw device-independent bitmap
    #[strum(serialize = "dib")]
    Dib,
    /// Self-describing image format such as PNG
    #[strum(serialize = "encoded")]
    Encoded,
}

/// The result of probing a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconPayload {
    /// A `BITMAPINFOHEADER` with a supported layout
    Dib(BitmapInfoHeader),
    /// Anything else, left to the image codecs
    Encoded,
}

impl IconPayload {
    /// Classifies a payload by its leading bytes.
    #[must_use]
    pub fn probe(data: &[u8]) -> IconPayload {
        match BitmapInfoHeader::read(data) {
            Ok(header) if header.is_supported() => IconPayload::Dib(header),
            _ => IconPayload::Encoded,
        }
    }
}

/// A decoded icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    format: IconFormat,
    image: RgbaImage,
}

impl Icon {
    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// How the payload was stored
    #[must_use]
    pub fn format(&self) -> IconFormat {
        self.format
    }

    /// The decoded image
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// RGBA pixels, row by row from the top
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Returns `true` if the icon has a non-zero width and height.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Consumes the icon, returning the decoded image.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Decodes one icon payload.
///
/// # Errors
///
/// Returns [`crate::Error::UndecodableIcon`] if the payload is neither a supported bitmap nor a
/// recognized image format, is truncated or exceeds `limits`. A recognized image that its codec
/// rejects yields [`crate::Error::Image`].
pub fn decode(data: &[u8], limits: &ResourceLimits) -> Result<Icon> {
    match IconPayload::probe(data) {
        IconPayload::Dib(header) => Ok(Icon {
            format: IconFormat::Dib,
            image: dib::decode(data, &header, limits)?,
        }),
        IconPayload::Encoded => Ok(Icon {
            format: IconFormat::Encoded,
            image: encoded::decode(data, limits)?,
        }),
    }
}

/// Picks the tallest valid icon; on ties the earliest one wins.
pub fn select_best<I>(icons: I) -> Option<Icon>
where
    I: IntoIterator<Item = Icon>,
{
    icons
        .into_iter()
        .filter(Icon::is_valid)
        .fold(None, |best, icon| match best {
            Some(best) if best.height() >= icon.height() => Some(best),
            _ => Some(icon),
        })
}
