//! # Wire Cursor
//!
//! Sequential, bounds-checked reader and writer used by every codec in the crate.
//!
//! Multi-byte integers take an explicit [`ByteOrder`]; the order is chosen once per
//! message from the header's data representation and passed to each read or write.
//! Reads never panic: running out of bytes is a [`ProtocolError::MalformedInput`].

use crate::error::{ProtocolError, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Integer byte order of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Canonical NDR order
    #[default]
    Little,
    Big,
}

/// Reader over a borrowed byte slice with position tracking.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails with `MalformedInput` unless `needed` bytes are left.
    pub fn ensure(&self, field: &'static str, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(ProtocolError::MalformedInput {
                field,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Borrows the next `len` bytes and advances past them.
    pub fn read_bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8]> {
        self.ensure(field, len)?;
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Copies the next `N` bytes out as an array.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(field, N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        let [b] = self.read_array::<1>(field)?;
        Ok(b)
    }

    pub fn read_u16(&mut self, field: &'static str, order: ByteOrder) -> Result<u16> {
        let raw = self.read_array::<2>(field)?;
        Ok(match order {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        })
    }

    pub fn read_u32(&mut self, field: &'static str, order: ByteOrder) -> Result<u32> {
        let raw = self.read_array::<4>(field)?;
        Ok(match order {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        })
    }
}

/// Append-only writer backed by a `BytesMut`.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the buffer, typically from a computed PDU length.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16, order: ByteOrder) {
        match order {
            ByteOrder::Little => self.buf.put_u16_le(value),
            ByteOrder::Big => self.buf.put_u16(value),
        }
    }

    pub fn put_u32(&mut self, value: u32, order: ByteOrder) {
        match order {
            ByteOrder::Little => self.buf.put_u32_le(value),
            ByteOrder::Big => self.buf.put_u32(value),
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn put_zeros(&mut self, count: usize) {
        self.buf.put_bytes(0, count);
    }

    /// Overwrites two already-written bytes at `offset`.
    pub fn patch_u16(&mut self, offset: usize, value: u16, order: ByteOrder) -> Result<()> {
        let written = self.buf.len();
        let slot = self
            .buf
            .get_mut(offset..offset + 2)
            .ok_or(ProtocolError::MalformedInput {
                field: "patch_u16",
                needed: offset + 2,
                available: written,
            })?;
        let raw = match order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        slot.copy_from_slice(&raw);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}
