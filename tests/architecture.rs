//! Loading images and classifying their architecture through the public API.

mod common;

use std::io::{Cursor, Write};

use tempfile::NamedTempFile;

use common::{pe_image, SectionLayout, PE32, PE32_PLUS};
use pescope::{prelude::*, Magic};

#[test]
fn pe32_is_x86() {
    let pe = PeFile::from_mem(pe_image(PE32, 0xE0, &[])).unwrap();

    assert_eq!(pe.architecture(), Architecture::X86_32);
    assert_eq!(pe.architecture().to_string(), "x86");
    assert_eq!(pe.optional_header().unwrap().magic, Magic::Pe32);
    assert!(pe.sections().is_empty());
}

#[test]
fn pe32_plus_is_x64() {
    let pe = PeFile::from_mem(pe_image(PE32_PLUS, 0xF0, &[])).unwrap();

    assert_eq!(pe.architecture(), Architecture::X86_64);
    assert_eq!(pe.architecture().to_string(), "x64");
}

#[test]
fn unknown_magic_loads() {
    let pe = PeFile::from_mem(pe_image(0x0107, 0xE0, &[])).unwrap();
    assert_eq!(pe.architecture(), Architecture::Unknown);

    let pe = PeFile::from_mem(pe_image(PE32, 0, &[])).unwrap();
    assert_eq!(pe.architecture(), Architecture::Unknown);
    assert!(pe.optional_header().is_none());
}

#[test]
fn not_a_pe_image() {
    let result = PeFile::from_mem(b"#!/bin/sh\necho hello\n".to_vec());
    assert!(matches!(result, Err(Error::InvalidFormat { .. })));

    let mut image = pe_image(PE32, 0xE0, &[]);
    image[0x80..0x84].copy_from_slice(b"PE\0\x01");
    assert!(matches!(
        PeFile::from_mem(image),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn shorter_than_dos_header() {
    for len in [1, 0x20, 0x3F] {
        let result = PeFile::from_mem(vec![0x4D; len]);
        assert!(matches!(result, Err(Error::InvalidFormat { .. })), "{} bytes", len);
    }

    assert!(matches!(PeFile::from_mem(Vec::new()), Err(Error::Empty)));
}

#[test]
fn truncated_headers() {
    let text = [0x90_u8; 0x40];
    let image = pe_image(PE32, 0xE0, &[SectionLayout::new(b".text", 0x1000, &text)]);
    let table_end = 0x80 + 24 + 0xE0 + 40;

    for len in [0x84, 0x80 + 23, 0x80 + 24 + 0xDF, table_end - 1] {
        let result = PeFile::from_mem(image[..len].to_vec());
        assert!(
            matches!(result, Err(Error::InvalidFormat { .. })),
            "truncated at 0x{:X}",
            len
        );
    }

    let pe = PeFile::from_mem(image[..table_end].to_vec()).unwrap();
    assert_eq!(pe.sections().len(), 1);
    assert!(pe.best_icon().is_none());
}

#[test]
fn section_index_and_offsets() {
    let text = [0x90_u8; 0x500];
    let data = [0x00_u8; 0x100];
    let image = pe_image(
        PE32,
        0xE0,
        &[
            SectionLayout::new(b".text", 0x1000, &text),
            SectionLayout {
                name: b".bss",
                virtual_address: 0x2000,
                virtual_size: 0x1000,
                data: &data,
            },
        ],
    );
    let pe = PeFile::from_mem(image).unwrap();
    let text_raw = u64::from(pe.sections()[0].pointer_to_raw_data);
    let bss_raw = u64::from(pe.sections()[1].pointer_to_raw_data);

    assert_eq!(pe.rva_to_offset(0x1200), Some(text_raw + 0x200));
    assert_eq!(pe.rva_to_offset(0x1500), None);
    // Inside the virtual size but past the raw data.
    assert_eq!(pe.rva_to_offset(0x2800), Some(bss_raw + 0x800));
    assert_eq!(pe.rva_to_offset(0x3000), None);
    assert_eq!(pe.rva_to_offset(u32::MAX), None);
}

#[test]
fn all_sources_agree() {
    let image = common::image_with_icons(&[common::dib32(32, 32, [0x00, 0x80, 0xFF, 0xFF])]);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&image).unwrap();

    let from_mem = PeFile::from_mem(image.clone()).unwrap();
    let from_file = PeFile::from_file(file.path()).unwrap();
    let from_reader = PeFile::from_reader(&mut Cursor::new(&image)).unwrap();

    for pe in [&from_file, &from_reader] {
        assert_eq!(pe.architecture(), from_mem.architecture());
        assert_eq!(pe.headers(), from_mem.headers());
        assert_eq!(pe.best_icon(), from_mem.best_icon());
    }
}

#[test]
fn parsing_is_deterministic() {
    let image = common::image_with_icons(&[
        common::dib32(16, 16, [0x11; 4]),
        common::png(24, 24, [0x22; 4]),
    ]);

    let first = PeFile::from_mem(image.clone()).unwrap();
    let second = PeFile::from_mem(image).unwrap();

    assert_eq!(first.headers(), second.headers());
    assert_eq!(first.resources(&[]), second.resources(&[]));
    assert_eq!(first.icons(), second.icons());
    assert_eq!(first.best_icon(), second.best_icon());
    assert_eq!(first.architecture(), second.architecture());
}
