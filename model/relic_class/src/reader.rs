//! Bounds-checked big-endian byte reader.

use crate::ClassError;

/// Cursor over the raw record bytes. All reads are bounds-checked; running
/// past the end yields [`ClassError::Truncated`] with the offending offset.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn truncated(&self) -> ClassError {
        ClassError::Truncated { at: self.pos }
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ClassError> {
        let byte = *self.bytes.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(byte)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ClassError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ClassError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consume exactly `len` bytes.
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], ClassError> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated())?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| self.truncated())?;
        self.pos = end;
        Ok(slice)
    }

    /// Skip `len` bytes (unparsed attribute payloads).
    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ClassError> {
        self.take(len).map(|_| ())
    }
}
