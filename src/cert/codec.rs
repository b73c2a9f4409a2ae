//! Big-endian framing primitives (spec.md §6: "All multi-byte integers in
//! on-disk files are big-endian").
//!
//! Ported from `bbchallenge.h`'s `Read32`/`Write32` (byte-swap, never a raw
//! pointer cast — Design Notes). `Cursor`/`Writer` give the deciders a small
//! buffer-oriented API instead of repeating `to_be_bytes`/`from_be_bytes`
//! everywhere.

use anyhow::{ensure, Context};

/// Appends big-endian encoded values to an in-memory certificate buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// `(u16 len, u8[len])` length-prefixed byte string.
    pub fn bytes16(&mut self, data: &[u8]) -> &mut Self {
        self.u16(data.len() as u16);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Reads big-endian values out of a certificate byte slice, tracking
/// position. Every read is bounds-checked; a truncated/corrupted buffer
/// yields an `Err` rather than a panic, since verifiers must reject
/// malformed certificates rather than crash (spec.md §8 "Verifier
/// soundness").
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> anyhow::Result<&'a [u8]> {
        ensure!(self.remaining() >= n, "certificate truncated");
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn u8(&mut self) -> anyhow::Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> anyhow::Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32(&mut self) -> anyhow::Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn i16(&mut self) -> anyhow::Result<i16> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn i32(&mut self) -> anyhow::Result<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn bytes16(&mut self) -> anyhow::Result<&'a [u8]> {
        let len = self.u16().context("reading bytes16 length")? as usize;
        self.take(len)
    }

    pub fn raw(&mut self, n: usize) -> anyhow::Result<&'a [u8]> {
        self.take(n)
    }

    pub fn expect_exhausted(&self) -> anyhow::Result<()> {
        ensure!(
            self.remaining() == 0,
            "certificate has {} trailing bytes",
            self.remaining()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_and_cursor_round_trip() {
        let mut w = Writer::new();
        w.u32(42).i32(-7).bytes16(&[1, 2, 3]);
        let bytes = w.into_bytes();
        let mut c = Cursor::new(&bytes);
        assert_eq!(c.u32().unwrap(), 42);
        assert_eq!(c.i32().unwrap(), -7);
        assert_eq!(c.bytes16().unwrap(), &[1, 2, 3]);
        c.expect_exhausted().unwrap();
    }

    #[test]
    fn cursor_rejects_truncated_buffer() {
        let mut c = Cursor::new(&[0, 0]);
        assert!(c.u32().is_err());
    }

    #[test]
    fn big_endian_byte_order() {
        let mut w = Writer::new();
        w.u32(0x01020304);
        assert_eq!(w.into_bytes(), vec![0x01, 0x02, 0x03, 0x04]);
    }
}
