//! Streaming transcoding of single-byte encodings into UTF-8

use std::io::{self, Read};

use thiserror::Error;

use super::format::Encoding;

/// Byte with no mapping in the selected code page
#[derive(Debug, Error)]
#[error("undefined byte 0x{byte:02X} at offset {offset}")]
pub(crate) struct UndefinedByte {
    pub byte: u8,
    pub offset: u64,
}

/// Counts raw bytes pulled from the underlying stream
pub(crate) struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

const RAW_BUFFER_SIZE: usize = 8 * 1024;

/// Presents the input as UTF-8 regardless of its encoding.
///
/// UTF-8 input passes through untouched; validation happens when the CSV
/// reader builds string records.
pub(crate) struct DecodingReader<R> {
    inner: CountingReader<R>,
    encoding: Encoding,
    raw: Vec<u8>,
    pending: Vec<u8>,
    pos: usize,
}

impl<R: Read> DecodingReader<R> {
    pub(crate) fn new(inner: R, encoding: Encoding) -> Self {
        Self {
            inner: CountingReader::new(inner),
            encoding,
            raw: vec![0; RAW_BUFFER_SIZE],
            pending: Vec::with_capacity(RAW_BUFFER_SIZE * 2),
            pos: 0,
        }
    }

    /// Raw bytes consumed from the source so far
    pub(crate) fn bytes_read(&self) -> u64 {
        self.inner.count
    }

    fn refill(&mut self) -> io::Result<bool> {
        let offset = self.inner.count;
        let n = self.inner.read(&mut self.raw)?;
        if n == 0 {
            return Ok(false);
        }

        self.pending.clear();
        self.pos = 0;
        let mut utf8 = [0u8; 4];
        for (i, &byte) in self.raw[..n].iter().enumerate() {
            if byte.is_ascii() {
                self.pending.push(byte);
                continue;
            }
            let ch = self.encoding.decode_byte(byte).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    UndefinedByte {
                        byte,
                        offset: offset + i as u64,
                    },
                )
            })?;
            self.pending
                .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        }
        Ok(true)
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.encoding == Encoding::Utf8 {
            return self.inner.read(buf);
        }

        while self.pos >= self.pending.len() {
            if !self.refill()? {
                return Ok(0);
            }
        }

        let available = &self.pending[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}
