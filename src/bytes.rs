//! Cursor over game data files. Multi-byte reads are big-endian unless the
//! method name says `_le`.
//!
//! Image decoders read headers and pixels through this and hand the result to
//! the renderer as a [`Bitmap`](crate::renderer::Bitmap).

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("unexpected end of data at offset {offset}, wanted {wanted} bytes")]
    UnexpectedEof { offset: usize, wanted: usize },
}

pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let bytes = self
            .position
            .checked_add(N)
            .and_then(|end| self.data.get(self.position..end))
            .ok_or(ReadError::UnexpectedEof {
                offset: self.position,
                wanted: N,
            })?;
        let mut out = [0; N];
        out.copy_from_slice(bytes);
        self.position += N;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, ReadError> {
        self.take::<1>().map(|[b]| b)
    }

    pub fn i8(&mut self) -> Result<i8, ReadError> {
        self.take::<1>().map(i8::from_be_bytes)
    }

    pub fn u16(&mut self) -> Result<u16, ReadError> {
        self.take().map(u16::from_be_bytes)
    }

    pub fn u16_le(&mut self) -> Result<u16, ReadError> {
        self.take().map(u16::from_le_bytes)
    }

    pub fn i16(&mut self) -> Result<i16, ReadError> {
        self.take().map(i16::from_be_bytes)
    }

    pub fn i16_le(&mut self) -> Result<i16, ReadError> {
        self.take().map(i16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, ReadError> {
        self.take().map(u32::from_be_bytes)
    }

    pub fn u32_le(&mut self) -> Result<u32, ReadError> {
        self.take().map(u32::from_le_bytes)
    }

    pub fn i32(&mut self) -> Result<i32, ReadError> {
        self.take().map(i32::from_be_bytes)
    }

    pub fn i32_le(&mut self) -> Result<i32, ReadError> {
        self.take().map(i32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_byte_orders() {
        let data = [0x12, 0x34, 0x12, 0x34, 0xff, 0xff, 0xff, 0xfe];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.u16().unwrap(), 0x1234);
        assert_eq!(reader.u16_le().unwrap(), 0x3412);
        assert_eq!(reader.i32().unwrap(), -2);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn signed_bytes_wrap() {
        let mut reader = ByteReader::new(&[0x80, 0xff, 0x7f]);
        assert_eq!(reader.i8().unwrap(), -128);
        assert_eq!(reader.i16_le().unwrap(), 0x7fff);
    }

    #[test]
    fn decodes_a_bitmap_from_a_sized_pixel_block() {
        use crate::renderer::{Bitmap, Rgba};

        let data = [0, 2, 0, 1, 10, 20, 30, 255, 40, 50, 60, 128];
        let mut reader = ByteReader::new(&data);
        let width = reader.u16().unwrap() as u32;
        let height = reader.u16().unwrap() as u32;
        let pixels = (0..width * height)
            .map(|_| {
                Ok(Rgba::new(reader.u8()?, reader.u8()?, reader.u8()?, reader.u8()?))
            })
            .collect::<Result<Vec<_>, ReadError>>()
            .unwrap();

        let bitmap = Bitmap::new(width, height, pixels).unwrap();
        assert_eq!(bitmap.width(), 2);
        assert_eq!(bitmap.pixels()[1], Rgba::new(40, 50, 60, 128));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn short_read_reports_offset_and_keeps_position() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        reader.u8().unwrap();
        assert_eq!(
            reader.u32_le(),
            Err(ReadError::UnexpectedEof {
                offset: 1,
                wanted: 4
            })
        );
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.u16().unwrap(), 0x0203);
    }
}
