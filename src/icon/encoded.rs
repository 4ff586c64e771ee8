//! Icons stored in a self-describing image format, usually PNG.

use std::io::Cursor;

use image::{ImageReader, Limits, RgbaImage};

use crate::{config::ResourceLimits, Error, Result};

/// Decodes `data` with whichever of the enabled `image` codecs recognizes its signature.
///
/// # Errors
/// Returns [`crate::Error::UndecodableIcon`] if no codec recognizes the data or the result
/// exceeds the limits, and [`crate::Error::Image`] if a recognized codec fails.
pub fn decode(data: &[u8], limits: &ResourceLimits) -> Result<RgbaImage> {
    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|error| Error::UndecodableIcon(error.to_string()))?;

    let Some(format) = reader.format() else {
        return Err(Error::UndecodableIcon(format!(
            "Unrecognized image signature {:02X?}",
            &data[..data.len().min(8)]
        )));
    };

    let mut decoder_limits = Limits::default();
    decoder_limits.max_image_width = Some(limits.max_icon_dimension);
    decoder_limits.max_image_height = Some(limits.max_icon_dimension);
    decoder_limits.max_alloc = Some(limits.max_image_bytes);
    reader.limits(decoder_limits);

    let image = reader.decode()?.to_rgba8();
    if !limits.allows_image(image.width(), image.height()) {
        return Err(Error::UndecodableIcon(format!(
            "{:?} image of {}x{} pixels exceeds the limits",
            format,
            image.width(),
            image.height()
        )));
    }

    log::trace!(
        "Decoded {:?} icon of {}x{} pixels",
        format,
        image.width(),
        image.height()
    );
    Ok(image)
}
