//! Little endian byte writer for assembling binary fixtures.
//!
//! Offsets are absolute positions in [`ByteWriter::data`], so directory
//! fields can be written as placeholders first and patched once the data
//! they point to has been laid out.

#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    pub data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current write position.
    pub fn get_offset(&self) -> usize {
        self.data.len()
    }

    pub fn append_u8(&mut self, i: u8) -> &mut Self {
        self.data.push(i);
        self
    }

    pub fn append_i16(&mut self, i: i16) -> &mut Self {
        self.data.extend(i.to_le_bytes());
        self
    }

    pub fn append_u16(&mut self, i: u16) -> &mut Self {
        self.data.extend(i.to_le_bytes());
        self
    }

    pub fn append_u32(&mut self, i: u32) -> &mut Self {
        self.data.extend(i.to_le_bytes());
        self
    }

    pub fn append_u8_slice(&mut self, i: &[u8]) -> &mut Self {
        self.data.extend_from_slice(i);
        self
    }

    /// Appends `count` zero bytes.
    pub fn append_zeroes(&mut self, count: usize) -> &mut Self {
        self.data.resize(self.data.len() + count, 0);
        self
    }

    /// Zero pads until the buffer is `offset` bytes long. Does nothing if it is already longer.
    pub fn pad_to(&mut self, offset: usize) -> &mut Self {
        if self.data.len() < offset {
            self.data.resize(offset, 0);
        }
        self
    }

    pub fn replace(&mut self, start: usize, slice: &[u8]) {
        self.data[start..(start + slice.len())].copy_from_slice(slice);
    }

    pub fn replace_with_u32(&mut self, start: usize, val: u32) {
        self.replace(start, &val.to_le_bytes());
    }
}

#[cfg(test)]
mod test {
    use super::ByteWriter;

    #[test]
    fn patch_placeholder() {
        let mut writer = ByteWriter::new();
        writer.append_u32(0).append_u16(0xbeef);

        let here = writer.get_offset() as u32;
        writer.replace_with_u32(0, here);

        assert_eq!(writer.data, vec![6, 0, 0, 0, 0xef, 0xbe]);
    }

    #[test]
    fn pad_never_truncates() {
        let mut writer = ByteWriter::new();
        writer.append_zeroes(4).pad_to(2);
        assert_eq!(writer.get_offset(), 4);

        writer.pad_to(8);
        assert_eq!(writer.get_offset(), 8);
    }
}
