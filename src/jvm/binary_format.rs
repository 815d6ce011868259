use super::Error;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

/// Utility trait for serializing data inside class files
///
/// Java class files have some peculiarities that make it useful to define an extra trait (instead
/// of just using `serde`):
///
///   - tags are always `u8`
///   - multi-byte quantities are always big endian
///
pub trait Serialize: Sized {
    /// Serialize construct into a binary output stream
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()>;
}

impl Serialize for u8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(*self)
    }
}

impl Serialize for u16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u16::<BigEndian>(*self)
    }
}

impl Serialize for u32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(*self)
    }
}

/// Read-only cursor over a borrowed class file
///
/// Besides the usual big endian reads, the cursor can hand out sub-slices of the underlying buffer
/// so that constant pool payloads can be copied (or inspected) without intermediate allocations.
/// Running off the end of the buffer is always reported as [`Error::TruncatedStream`].
pub struct ClassCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> ClassCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ClassCursor<'a> {
        ClassCursor {
            inner: Cursor::new(bytes),
        }
    }

    /// Offset of the next byte to be read
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    pub fn u1(&mut self) -> Result<u8, Error> {
        Ok(self.inner.read_u8()?)
    }

    pub fn u2(&mut self) -> Result<u16, Error> {
        Ok(self.inner.read_u16::<BigEndian>()?)
    }

    pub fn u4(&mut self) -> Result<u32, Error> {
        Ok(self.inner.read_u32::<BigEndian>()?)
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn take_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let buffer: &'a [u8] = self.inner.get_ref();
        let start = self.position();
        let end = start.checked_add(len).ok_or(Error::TruncatedStream)?;
        let slice = buffer.get(start..end).ok_or(Error::TruncatedStream)?;
        self.inner.set_position(end as u64);
        Ok(slice)
    }

    /// Skip over the next `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.take_slice(len).map(|_| ())
    }

    /// Everything that has not been read yet
    pub fn remaining(&self) -> &'a [u8] {
        let buffer: &'a [u8] = self.inner.get_ref();
        buffer.get(self.position()..).unwrap_or(&[])
    }
}

impl<'a> Read for ClassCursor<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}
