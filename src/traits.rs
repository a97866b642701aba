//! Traits used in this library
use crate::io::{ByteSource, Result};

/// Reader extension to read little endian data
pub trait ReadBytesExt<T> {
    /// Reads `T` from a byte source. Least significant byte first.
    fn read_le(&mut self) -> Result<T>;
}

impl<S: ByteSource + ?Sized> ReadBytesExt<u8> for S {
    #[inline(always)]
    fn read_le(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

impl<S: ByteSource + ?Sized> ReadBytesExt<u16> for S {
    #[inline]
    fn read_le(&mut self) -> Result<u16> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
}

#[test]
fn little_endian_order() {
    let mut data: &[u8] = &[0x34, 0x12, 0xFF];
    let value: u16 = data.read_le().unwrap();
    assert_eq!(value, 0x1234);
    let byte: u8 = data.read_le().unwrap();
    assert_eq!(byte, 0xFF);
    assert!(ReadBytesExt::<u8>::read_le(&mut data).is_err());
}
