//! Raw device-independent bitmaps as stored in `RT_ICON` resources.
//!
//! An icon DIB is a `BITMAPINFOHEADER`, an optional palette, the color (XOR) rows and a
//! 1-bit transparency (AND) mask. Icons conventionally store twice the image height in the
//! header to cover both bitmaps.

use image::RgbaImage;

use crate::{config::ResourceLimits, file::parser::Parser, Error, Result};

/// Size in bytes of a `BITMAPINFOHEADER`
pub const BITMAP_INFO_HEADER_SIZE: u32 = 40;
/// Uncompressed pixel rows
pub const BI_RGB: u32 = 0;

/// A `BITMAPINFOHEADER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    /// Size of this header, 40 for the layouts decoded here
    pub size: u32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels, negative for top-down rows, doubled for icons with a mask
    pub height: i32,
    /// Number of planes, always 1
    pub planes: u16,
    /// Bits per pixel
    pub bit_count: u16,
    /// Compression, [`BI_RGB`] for uncompressed rows
    pub compression: u32,
    /// Size of the pixel data, may be zero for uncompressed rows
    pub size_image: u32,
    /// Horizontal resolution
    pub x_pels_per_meter: i32,
    /// Vertical resolution
    pub y_pels_per_meter: i32,
    /// Number of palette entries in use, zero for the maximum
    pub clr_used: u32,
    /// Number of important palette entries
    pub clr_important: u32,
}

impl BitmapInfoHeader {
    /// Reads the header from the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than 40 bytes.
    pub fn read(data: &[u8]) -> Result<BitmapInfoHeader> {
        let mut parser = Parser::new(data);

        Ok(BitmapInfoHeader {
            size: parser.read_le::<u32>()?,
            width: parser.read_le::<i32>()?,
            height: parser.read_le::<i32>()?,
            planes: parser.read_le::<u16>()?,
            bit_count: parser.read_le::<u16>()?,
            compression: parser.read_le::<u32>()?,
            size_image: parser.read_le::<u32>()?,
            x_pels_per_meter: parser.read_le::<i32>()?,
            y_pels_per_meter: parser.read_le::<i32>()?,
            clr_used: parser.read_le::<u32>()?,
            clr_important: parser.read_le::<u32>()?,
        })
    }

    /// Returns `true` for the layouts [`decode`] understands.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.size == BITMAP_INFO_HEADER_SIZE
            && matches!(self.bit_count, 1 | 4 | 8 | 24 | 32)
            && self.compression == BI_RGB
    }

    /// Number of palette entries preceding the pixel rows.
    #[must_use]
    pub fn palette_len(&self) -> usize {
        if self.bit_count > 8 {
            return 0;
        }

        let full = 1_u32 << self.bit_count;
        if self.clr_used > 0 && self.clr_used <= full {
            self.clr_used as usize
        } else {
            full as usize
        }
    }
}

/// Padded byte length of one row of `width` pixels at `bits` per pixel.
fn stride(width: u32, bits: u16) -> Option<usize> {
    let bits = u64::from(width).checked_mul(u64::from(bits))?;
    let stride = bits.checked_add(31)? / 32 * 4;
    usize::try_from(stride).ok()
}

fn undecodable(message: String) -> Error {
    Error::UndecodableIcon(message)
}

/// Decodes a DIB whose header already passed [`BitmapInfoHeader::is_supported`].
///
/// A stored height of exactly twice the width means the rows hold both bitmaps and the image
/// is square. Any other even height too tall for the pixel data is halved the same way. The AND
/// mask is applied whenever the data holds it entirely. For 32 bpp rows the
/// stored alpha channel wins unless every alpha byte is zero.
///
/// # Errors
/// Returns [`crate::Error::UndecodableIcon`] for zero or oversized dimensions and for pixel
/// data shorter than the header declares.
pub fn decode(
    data: &[u8],
    header: &BitmapInfoHeader,
    limits: &ResourceLimits,
) -> Result<RgbaImage> {
    if header.width <= 0 || header.height == 0 {
        return Err(undecodable(format!(
            "Bitmap of {}x{} pixels",
            header.width, header.height
        )));
    }

    let width = header.width.unsigned_abs();
    let stored_height = header.height.unsigned_abs();
    let top_down = header.height < 0;

    let bits = header.bit_count;
    let xor_stride = stride(width, bits).ok_or_else(|| undecodable("Row size overflow".into()))?;
    let and_stride = stride(width, 1).ok_or_else(|| undecodable("Row size overflow".into()))?;

    let palette_start = header.size as usize;
    let palette_len = header.palette_len();
    let pixels_start = palette_start + palette_len * 4;

    let color_rows_fit = |rows: u32| {
        xor_stride
            .checked_mul(rows as usize)
            .and_then(|len| len.checked_add(pixels_start))
            .is_some_and(|end| end <= data.len())
    };
    let height = if u64::from(stored_height) == u64::from(width) * 2 {
        width
    } else if stored_height % 2 == 0 && !color_rows_fit(stored_height) {
        stored_height / 2
    } else {
        stored_height
    };

    if !limits.allows_image(width, height) {
        return Err(undecodable(format!(
            "Bitmap of {}x{} pixels exceeds the limits",
            width, height
        )));
    }

    let rows = height as usize;
    let xor_end = xor_stride
        .checked_mul(rows)
        .and_then(|len| len.checked_add(pixels_start))
        .ok_or_else(|| undecodable("Pixel data size overflow".into()))?;
    if xor_end > data.len() {
        return Err(undecodable(format!(
            "Bitmap needs {} bytes, only {} present",
            xor_end,
            data.len()
        )));
    }

    let palette: Vec<[u8; 4]> = data[palette_start..pixels_start]
        .chunks_exact(4)
        .map(|bgrx| [bgrx[2], bgrx[1], bgrx[0], 0xFF])
        .collect();

    let mask = and_stride
        .checked_mul(rows)
        .and_then(|len| len.checked_add(xor_end))
        .filter(|&end| end <= data.len())
        .map(|end| &data[xor_end..end]);

    let xor = &data[pixels_start..xor_end];
    let row_len = width as usize * 4;
    let mut rgba = vec![0_u8; rows * row_len];

    for row in 0..rows {
        let source = &xor[row * xor_stride..(row + 1) * xor_stride];
        let target_row = if top_down { row } else { rows - 1 - row };
        let target = &mut rgba[target_row * row_len..(target_row + 1) * row_len];

        for (x, pixel) in target.chunks_exact_mut(4).enumerate() {
            let color = match bits {
                1 => palette_color(&palette, (source[x / 8] >> (7 - x % 8)) & 0x01),
                4 => palette_color(&palette, (source[x / 2] >> (4 * (1 - x % 2))) & 0x0F),
                8 => palette_color(&palette, source[x]),
                24 => [source[x * 3 + 2], source[x * 3 + 1], source[x * 3], 0xFF],
                _ => [source[x * 4 + 2], source[x * 4 + 1], source[x * 4], source[x * 4 + 3]],
            };
            pixel.copy_from_slice(&color);
        }
    }

    let alpha_is_empty = bits == 32 && rgba.chunks_exact(4).all(|pixel| pixel[3] == 0);
    if bits < 32 || alpha_is_empty {
        for row in 0..rows {
            let target_row = if top_down { row } else { rows - 1 - row };
            let target = &mut rgba[target_row * row_len..(target_row + 1) * row_len];
            let mask_row = mask.map(|mask| &mask[row * and_stride..(row + 1) * and_stride]);

            for (x, pixel) in target.chunks_exact_mut(4).enumerate() {
                let transparent =
                    mask_row.is_some_and(|row_bits| (row_bits[x / 8] >> (7 - x % 8)) & 0x01 == 1);
                pixel[3] = if transparent { 0x00 } else { 0xFF };
            }
        }
    }

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| undecodable(format!("Bitmap of {}x{} pixels", width, height)))
}

fn palette_color(palette: &[[u8; 4]], index: u8) -> [u8; 4] {
    palette
        .get(usize::from(index))
        .copied()
        .unwrap_or([0x00, 0x00, 0x00, 0xFF])
}
