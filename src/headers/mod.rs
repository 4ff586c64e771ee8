//! Fixed PE headers: signature pointer, COFF header, optional header magic and section table.
//!
//! These are the only parts of an image whose failure is fatal. [`parse`] walks them in file
//! order and fails with [`crate::Error::InvalidFormat`] as soon as something required is
//! missing or truncated.
//!
//! # Layout
//!
//! ```text
//! 0x00            DOS header, e_lfanew (u32) at 0x3C
//! e_lfanew        "PE\0\0"
//! e_lfanew + 4    COFF header (20 bytes)
//! e_lfanew + 24   optional header (size_of_optional_header bytes, only the magic is read)
//! ...             section table (number_of_sections * 40 bytes)
//! ```

mod coff;
mod optional;
mod section;

pub use coff::{CoffHeader, FileCharacteristics, Machine, COFF_HEADER_SIZE};
pub use optional::{Architecture, Magic, OptionalHeader, PE32_MAGIC, PE32_PLUS_MAGIC};
pub use section::{
    read_section_table, resolve, Section, SectionCharacteristics, SECTION_HEADER_SIZE,
};

use crate::{file::parser::Parser, Result};

/// Offset of `e_lfanew`, the pointer to the PE signature
pub const PE_POINTER_OFFSET: usize = 0x3C;
/// The four signature bytes expected at `e_lfanew`
pub const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";

/// Everything decoded from the fixed part of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    /// File offset of the PE signature
    pub pe_offset: usize,
    /// The COFF file header
    pub coff: CoffHeader,
    /// The optional header magic, `None` when `size_of_optional_header` is zero
    pub optional: Option<OptionalHeader>,
    /// Section records in file order
    pub sections: Vec<Section>,
}

impl Headers {
    /// Returns the architecture derived from the optional header magic.
    #[must_use]
    pub fn architecture(&self) -> Architecture {
        Architecture::classify(self.optional.as_ref())
    }
}

/// Decodes the fixed headers of a PE image.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidFormat`] if the signature pointer cannot be read, the
/// signature does not match, or the COFF header, optional header extent or section table is
/// truncated.
///
/// # Examples
///
/// ```rust
/// use pescope::headers::parse;
///
/// let result = parse(&[0_u8; 0x20]);
/// assert!(matches!(result, Err(pescope::Error::InvalidFormat { .. })));
/// ```
pub fn parse(data: &[u8]) -> Result<Headers> {
    let mut parser = Parser::new(data);

    parser
        .seek(PE_POINTER_OFFSET)
        .map_err(|_| invalid_format!("Input of {} bytes has no PE header pointer", data.len()))?;
    let pe_offset = parser
        .read_le::<u32>()
        .map_err(|_| invalid_format!("Input of {} bytes has no PE header pointer", data.len()))?
        as usize;

    let signature = parser
        .seek(pe_offset)
        .and_then(|()| parser.read_bytes(PE_SIGNATURE.len()))
        .map_err(|_| invalid_format!("PE header pointer 0x{:X} is out of range", pe_offset))?;
    if signature != PE_SIGNATURE {
        return Err(invalid_format!(
            "Invalid PE signature {:02X?} at 0x{:X}",
            signature,
            pe_offset
        ));
    }

    let coff = CoffHeader::read(&mut parser)
        .map_err(|_| invalid_format!("Truncated COFF header at 0x{:X}", pe_offset + 4))?;

    let optional = read_optional_header(&mut parser, coff.size_of_optional_header)?;

    let sections = read_section_table(&mut parser, coff.number_of_sections).map_err(|_| {
        invalid_format!(
            "Truncated section table, {} sections declared",
            coff.number_of_sections
        )
    })?;

    log::trace!(
        "PE header at 0x{:X}: machine {}, {} sections, optional header {:?}",
        pe_offset,
        coff.machine_type(),
        sections.len(),
        optional.map(|header| header.magic)
    );

    Ok(Headers {
        pe_offset,
        coff,
        optional,
        sections,
    })
}

/// Reads the optional header magic and moves the parser to the first section record.
///
/// The cursor is advanced by the declared size, never by the number of bytes consumed.
fn read_optional_header(parser: &mut Parser, size: u16) -> Result<Option<OptionalHeader>> {
    if size == 0 {
        return Ok(None);
    }

    let offset = parser.pos();
    let declared = usize::from(size);

    let magic = if declared >= 2 {
        let value = parser
            .read_le::<u16>()
            .map_err(|_| invalid_format!("Truncated optional header at 0x{:X}", offset))?;
        Magic::from(value)
    } else {
        Magic::Unknown(0)
    };

    parser.seek(offset)?;
    parser.advance_by(declared).map_err(|_| {
        invalid_format!(
            "Optional header of {} bytes at 0x{:X} exceeds the input",
            declared,
            offset
        )
    })?;

    Ok(Some(OptionalHeader {
        magic,
        offset,
        size,
    }))
}
