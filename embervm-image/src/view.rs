use byteorder::{ByteOrder, LittleEndian};

/// Bounds-checked little-endian view over the raw image buffer.
///
/// Every read is validated against the buffer end before any bytes are
/// touched; the loader never reinterprets memory. Offsets are absolute
/// (relative to the start of the image), which keeps error reporting in
/// the same coordinate space as the diagnostics.
#[derive(Clone, Copy)]
pub(crate) struct View<'a> {
    bytes: &'a [u8],
}

impl<'a> View<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A sub-slice of the buffer, or `None` if any part is out of range.
    pub fn slice(&self, off: usize, len: usize) -> Option<&'a [u8]> {
        let end = off.checked_add(len)?;
        self.bytes.get(off..end)
    }

    pub fn u8(&self, off: usize) -> Option<u8> {
        self.bytes.get(off).copied()
    }

    pub fn u16(&self, off: usize) -> Option<u16> {
        self.slice(off, 2).map(LittleEndian::read_u16)
    }

    pub fn u32(&self, off: usize) -> Option<u32> {
        self.slice(off, 4).map(LittleEndian::read_u32)
    }

    pub fn i32(&self, off: usize) -> Option<i32> {
        self.slice(off, 4).map(LittleEndian::read_i32)
    }

    pub fn u64(&self, off: usize) -> Option<u64> {
        self.slice(off, 8).map(LittleEndian::read_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_bounded() {
        let v = View::new(&[1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(v.u32(0), Some(1));
        assert_eq!(v.u32(4), Some(2));
        assert_eq!(v.u32(5), None);
        assert_eq!(v.u64(0), Some(0x0000_0002_0000_0001));
        assert_eq!(v.u64(1), None);
        assert_eq!(v.slice(8, 0), Some(&[] as &[u8]));
        assert_eq!(v.slice(usize::MAX, 2), None);
    }
}
