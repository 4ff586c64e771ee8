use super::Backend;
use crate::Result;

/// Image bytes held in an owned buffer.
///
/// Used for buffers handed over by the caller and for images copied out of a reader.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend
    ///
    /// ## Arguments
    /// * 'data' - The image bytes to take ownership of
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(out_of_bounds_error!());
        };

        self.data
            .get(offset..offset_end)
            .ok_or_else(|| out_of_bounds_error!())
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn memory() {
        let mut data = vec![0x00_u8; 0x200];
        data[0] = b'M';
        data[1] = b'Z';
        data[0x80..0x84].copy_from_slice(b"PE\0\0");

        let memory = Memory::new(data);

        assert_eq!(memory.len(), 0x200);
        assert_eq!(&memory.data()[..2], b"MZ");
        assert_eq!(memory.data_slice(0x80, 4).unwrap(), b"PE\0\0");

        assert!(memory
            .data_slice(u32::MAX as usize, u32::MAX as usize)
            .is_err());
        assert!(memory.data_slice(0, 0x201).is_err());
    }

    #[test]
    fn empty_buffer() {
        let memory = Memory::new(vec![]);

        assert_eq!(memory.len(), 0);
        assert!(memory.data_slice(0, 1).is_err());
        assert!(memory.data_slice(1, 0).is_err());
        let empty_slice: &[u8] = &[];
        assert_eq!(memory.data_slice(0, 0).unwrap(), empty_slice);
    }

    #[test]
    fn offset_overflow() {
        let memory = Memory::new(vec![0x00; 100]);

        let result = memory.data_slice(usize::MAX, 1);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));

        let result = memory.data_slice(100, 1);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));

        let result = memory.data_slice(99, 2);
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));

        assert_eq!(memory.data_slice(99, 1).unwrap(), &[0x00]);
    }
}
