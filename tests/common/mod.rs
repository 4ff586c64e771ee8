//! Image synthesis shared by the integration tests and benchmarks.
#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

pub const PE32: u16 = 0x010B;
pub const PE32_PLUS: u16 = 0x020B;

const PE_OFFSET: usize = 0x80;

/// One section of a synthesized image.
pub struct SectionLayout<'a> {
    pub name: &'a [u8],
    pub virtual_address: u32,
    pub virtual_size: u32,
    pub data: &'a [u8],
}

impl<'a> SectionLayout<'a> {
    pub fn new(name: &'a [u8], virtual_address: u32, data: &'a [u8]) -> Self {
        SectionLayout {
            name,
            virtual_address,
            virtual_size: data.len() as u32,
            data,
        }
    }
}

/// Builds a PE image with an optional header of `optional_size` bytes starting with `magic`.
///
/// Raw section data is placed at 0x200-aligned offsets after the headers.
pub fn pe_image(magic: u16, optional_size: u16, sections: &[SectionLayout]) -> Vec<u8> {
    let optional_start = PE_OFFSET + 24;
    let table_start = optional_start + usize::from(optional_size);
    let headers_end = table_start + sections.len() * 40;

    let mut image = vec![0_u8; headers_end];
    image[0..2].copy_from_slice(b"MZ");
    image[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());
    image[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

    let machine: u16 = if magic == PE32_PLUS { 0x8664 } else { 0x014C };
    image[PE_OFFSET + 4..PE_OFFSET + 6].copy_from_slice(&machine.to_le_bytes());
    image[PE_OFFSET + 6..PE_OFFSET + 8].copy_from_slice(&(sections.len() as u16).to_le_bytes());
    image[PE_OFFSET + 20..PE_OFFSET + 22].copy_from_slice(&optional_size.to_le_bytes());
    if optional_size >= 2 {
        image[optional_start..optional_start + 2].copy_from_slice(&magic.to_le_bytes());
    }

    let mut raw_offset = headers_end.div_ceil(0x200) * 0x200;
    for (index, section) in sections.iter().enumerate() {
        let record = table_start + index * 40;
        let raw_size = section.data.len().div_ceil(0x200) * 0x200;

        image[record..record + section.name.len()].copy_from_slice(section.name);
        image[record + 8..record + 12].copy_from_slice(&section.virtual_size.to_le_bytes());
        image[record + 12..record + 16].copy_from_slice(&section.virtual_address.to_le_bytes());
        image[record + 16..record + 20].copy_from_slice(&(raw_size as u32).to_le_bytes());
        image[record + 20..record + 24].copy_from_slice(&(raw_offset as u32).to_le_bytes());

        image.resize(raw_offset, 0);
        image.extend_from_slice(section.data);
        image.resize(raw_offset + raw_size, 0);
        raw_offset += raw_size;
    }

    image
}

fn directory(section: &mut Vec<u8>, id_entries: u16) {
    section.extend_from_slice(&[0_u8; 14]);
    section.extend_from_slice(&id_entries.to_le_bytes());
}

/// Builds a resource section holding one `RT_ICON` per payload, ids counting from 1.
///
/// Layout: root at 0, the icon type directory at 24, then one 24-byte language directory per
/// icon, the data entries and finally the payloads.
pub fn icon_resources(virtual_address: u32, payloads: &[Vec<u8>]) -> Vec<u8> {
    let count = payloads.len();
    let types_offset = 24_u32;
    let languages_offset = types_offset + 16 + 8 * count as u32;
    let entries_offset = languages_offset + 24 * count as u32;
    let mut payload_offset = entries_offset + 16 * count as u32;

    let mut section = Vec::new();
    directory(&mut section, 1);
    section.extend_from_slice(&3_u32.to_le_bytes());
    section.extend_from_slice(&(0x8000_0000 | types_offset).to_le_bytes());

    directory(&mut section, count as u16);
    for index in 0..count as u32 {
        section.extend_from_slice(&(index + 1).to_le_bytes());
        section.extend_from_slice(&(0x8000_0000 | (languages_offset + 24 * index)).to_le_bytes());
    }

    for index in 0..count as u32 {
        directory(&mut section, 1);
        section.extend_from_slice(&1033_u32.to_le_bytes());
        section.extend_from_slice(&(entries_offset + 16 * index).to_le_bytes());
    }

    let mut placed = Vec::with_capacity(count);
    for payload in payloads {
        section.extend_from_slice(&(virtual_address + payload_offset).to_le_bytes());
        section.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        section.extend_from_slice(&[0_u8; 8]);

        placed.push(payload_offset as usize);
        payload_offset = (payload_offset + payload.len() as u32).div_ceil(4) * 4;
    }

    for (payload, offset) in payloads.iter().zip(placed) {
        section.resize(offset, 0);
        section.extend_from_slice(payload);
    }

    section
}

/// A PE32+ image whose `.rsrc` section holds the given icon payloads.
pub fn image_with_icons(payloads: &[Vec<u8>]) -> Vec<u8> {
    let resources = icon_resources(0x2000, payloads);
    pe_image(
        PE32_PLUS,
        0xF0,
        &[
            SectionLayout::new(b".text", 0x1000, &[0xC3; 0x10]),
            SectionLayout::new(b".rsrc", 0x2000, &resources),
        ],
    )
}

/// A 32 bpp icon bitmap with doubled height and an all-clear AND mask.
pub fn dib32(width: u32, height: u32, bgra: [u8; 4]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&40_u32.to_le_bytes());
    data.extend_from_slice(&(width as i32).to_le_bytes());
    data.extend_from_slice(&((height * 2) as i32).to_le_bytes());
    data.extend_from_slice(&1_u16.to_le_bytes());
    data.extend_from_slice(&32_u16.to_le_bytes());
    data.extend_from_slice(&[0_u8; 24]);

    for _ in 0..width * height {
        data.extend_from_slice(&bgra);
    }
    data.resize(data.len() + (width.div_ceil(32) * 4 * height) as usize, 0);
    data
}

/// A single-color PNG.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut data = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(rgba))
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .unwrap();
    data
}
