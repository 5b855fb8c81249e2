//! Byte stream abstraction shared by the client and the renderer.
//!
//! All multi-byte values travel little-endian. Strings are prefixed with a
//! `u64` byte length. Arrays carry no prefix of their own; their element
//! count is always sent as a separate field before them.

use glam::Vec3;

use crate::color::Color4f;
use crate::error::{EmcaError, Result};

/// Upper bound for a single allocation while reading from an unsized source.
const READ_CHUNK: usize = 64 * 1024;

/// An ordered byte source/sink.
///
/// Implementors provide raw reads and writes; the typed codec is supplied
/// by the provided methods.
pub trait Stream {
    /// Fills `buf` completely or fails with [`EmcaError::TruncatedStream`].
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Writes all of `data`.
    fn write_raw(&mut self, data: &[u8]) -> Result<()>;

    /// Pushes buffered writes to the peer.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads exactly `len` bytes into a new buffer.
    ///
    /// The default implementation grows the buffer in bounded chunks so a
    /// bogus length cannot trigger one huge allocation before the source
    /// runs dry.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(READ_CHUNK));
        let mut chunk = [0_u8; 4096];
        let mut left = len;
        while left > 0 {
            let n = left.min(chunk.len());
            self.read_raw(&mut chunk[..n])
                .map_err(|e| match e {
                    EmcaError::TruncatedStream { .. } => EmcaError::TruncatedStream { needed: len },
                    other => other,
                })?;
            out.extend_from_slice(&chunk[..n]);
            left -= n;
        }
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(read_le::<1, _>(self)?[0])
    }

    /// Reads one byte; any non-zero value is `true`.
    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    fn read_i16(&mut self) -> Result<i16> {
        read_le(self).map(i16::from_le_bytes)
    }

    fn read_u16(&mut self) -> Result<u16> {
        read_le(self).map(u16::from_le_bytes)
    }

    fn read_i32(&mut self) -> Result<i32> {
        read_le(self).map(i32::from_le_bytes)
    }

    fn read_u32(&mut self) -> Result<u32> {
        read_le(self).map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Result<u64> {
        read_le(self).map(u64::from_le_bytes)
    }

    fn read_f32(&mut self) -> Result<f32> {
        read_le(self).map(f32::from_le_bytes)
    }

    fn read_f64(&mut self) -> Result<f64> {
        read_le(self).map(f64::from_le_bytes)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u64()?;
        let len = usize::try_from(len)
            .map_err(|_| EmcaError::malformed(format!("string length {len} exceeds address space")))?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| EmcaError::malformed(format!("invalid UTF-8 string: {e}")))
    }

    /// Reads `count` consecutive `f32` values.
    fn read_float_array(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.read_bytes(array_byte_len(count, 4)?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Reads `count` consecutive `u32` values.
    fn read_uint_array(&mut self, count: usize) -> Result<Vec<u32>> {
        let bytes = self.read_bytes(array_byte_len(count, 4)?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn read_point3f(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    fn read_vec3f(&mut self) -> Result<Vec3> {
        self.read_point3f()
    }

    fn read_color4f(&mut self) -> Result<Color4f> {
        Ok(Color4f::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_raw(&value.to_le_bytes())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_u64(value.len() as u64)?;
        self.write_raw(value.as_bytes())
    }

    fn write_float_array(&mut self, values: &[f32]) -> Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_raw(&bytes)
    }

    fn write_uint_array(&mut self, values: &[u32]) -> Result<()> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_raw(&bytes)
    }

    fn write_point3f(&mut self, p: Vec3) -> Result<()> {
        self.write_float_array(&p.to_array())
    }

    fn write_vec3f(&mut self, v: Vec3) -> Result<()> {
        self.write_point3f(v)
    }

    fn write_color4f(&mut self, c: Color4f) -> Result<()> {
        self.write_float_array(&c.to_array())
    }
}

fn read_le<const N: usize, S: Stream + ?Sized>(stream: &mut S) -> Result<[u8; N]> {
    let mut buf = [0_u8; N];
    stream.read_raw(&mut buf)?;
    Ok(buf)
}

fn array_byte_len(count: usize, elem_size: usize) -> Result<usize> {
    count
        .checked_mul(elem_size)
        .ok_or_else(|| EmcaError::malformed(format!("array of {count} elements overflows")))
}

/// In-memory stream: an append-only buffer with a read cursor.
///
/// Writes always append at the end; reads consume from the cursor. A read
/// that asks for more than [`ByteStream::remaining`] fails without moving
/// the cursor.
#[derive(Debug, Clone, Default)]
pub struct ByteStream {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stream positioned at the start of `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: bytes.into(),
            pos: 0,
        }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Returns true once every written byte has been read.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Current read offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// All bytes ever written, including those already read.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the stream, returning every byte ever written.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.remaining() {
            return Err(EmcaError::TruncatedStream { needed: len });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl Stream for ByteStream {
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        let src = self.take(buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }

    // The whole payload is already resident, so check the length up front.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.take(len).map(<[u8]>::to_vec)
    }
}
