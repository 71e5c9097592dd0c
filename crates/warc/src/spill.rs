//! A bounded in-memory buffer that spills to a temporary file once it grows
//! past a configured threshold.
//!
//! Record blocks read from a WARC file are not necessarily small, and a
//! caller that wants random access to a block's bytes (to recompute a
//! digest, or to hand a payload to an HTTP parser that peeks before it
//! commits) shouldn't have to hold an arbitrarily large block in memory.
//! [SpillBuffer] behaves like a growable byte buffer up to `mem_cap`, then
//! transparently continues into a [tempfile::NamedTempFile].

use std::io::{Read, Seek, SeekFrom, Write};

use thiserror::Error;

/// Configuration for a [SpillBuffer].
#[derive(Debug, Clone)]
pub struct SpillBufferOptions {
    /// Maximum number of bytes kept in memory before spilling to disk.
    pub mem_cap: usize,
    /// Maximum total number of bytes (in memory and on disk combined).
    pub total_cap: u64,
    /// Initial capacity to reserve for the in-memory buffer.
    pub mem_hint: usize,
    /// Directory in which the spill file is created. `None` uses the
    /// platform temporary directory.
    pub tmp_dir: Option<std::path::PathBuf>,
}

impl Default for SpillBufferOptions {
    fn default() -> Self {
        Self {
            mem_cap: 1 << 20,
            total_cap: u64::MAX,
            mem_hint: 0,
            tmp_dir: None,
        }
    }
}

/// Errors from [SpillBuffer] operations.
#[derive(Debug, Error)]
pub enum SpillError {
    /// Writing the full input would have exceeded `total_cap`. `written` is
    /// how many of the input bytes were actually appended before the cap
    /// was hit, letting the caller distinguish "nothing written" (0) from
    /// "truncated" (> 0).
    #[error("spill buffer exceeded its total size limit after writing {written} bytes")]
    TotalCapExceeded { written: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A bounded buffer that spills from memory to a temp file.
pub struct SpillBuffer {
    mem: Vec<u8>,
    file: Option<tempfile::NamedTempFile>,
    options: SpillBufferOptions,
    size: u64,
    read_pos: u64,
}

impl SpillBuffer {
    pub fn new(options: SpillBufferOptions) -> Self {
        Self {
            mem: Vec::with_capacity(options.mem_hint.min(options.mem_cap)),
            file: None,
            options,
            size: 0,
            read_pos: 0,
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns whether any bytes have spilled to disk.
    pub fn is_spilled(&self) -> bool {
        self.file.is_some()
    }

    /// Appends bytes, spilling to a temp file once `mem_cap` is exceeded.
    ///
    /// Writes as many leading bytes of `data` as fit under `total_cap`, then
    /// fails with [SpillError::TotalCapExceeded] carrying the count actually
    /// written if `data` didn't fully fit. On success, returns `data.len()`.
    pub fn write_from(&mut self, data: &[u8]) -> Result<usize, SpillError> {
        let available = self.options.total_cap.saturating_sub(self.size);
        let writable = (data.len() as u64).min(available) as usize;
        let writable_data = &data[..writable];

        if !writable_data.is_empty() {
            if self.file.is_none() && self.mem.len() + writable_data.len() <= self.options.mem_cap {
                self.mem.extend_from_slice(writable_data);
            } else {
                self.spill_if_needed()?;
                self.file.as_mut().unwrap().write_all(writable_data)?;
            }

            self.size += writable_data.len() as u64;
        }

        if writable < data.len() {
            Err(SpillError::TotalCapExceeded { written: writable })
        } else {
            Ok(writable)
        }
    }

    fn spill_if_needed(&mut self) -> Result<(), SpillError> {
        if self.file.is_some() {
            return Ok(());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("warc-spill-");
        let mut file = match &self.options.tmp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&self.mem)?;
        self.mem.clear();
        self.mem.shrink_to_fit();
        self.file = Some(file);

        Ok(())
    }

    /// Reads up to `buf.len()` bytes starting at the current read position,
    /// advancing it. Returns the number of bytes read (0 at EOF).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, SpillError> {
        let amount = self.read_at_impl(self.read_pos, buf)?;
        self.read_pos += amount as u64;
        Ok(amount)
    }

    /// Reads up to `buf.len()` bytes at an absolute offset, without moving
    /// the current read position.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, SpillError> {
        self.read_at_impl(offset, buf)
    }

    fn read_at_impl(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, SpillError> {
        if offset >= self.size {
            return Ok(0);
        }

        let remaining = (self.size - offset) as usize;
        let want = buf.len().min(remaining);

        if let Some(file) = &mut self.file {
            file.as_file_mut().seek(SeekFrom::Start(offset))?;
            let amount = file.read(&mut buf[0..want])?;
            Ok(amount)
        } else {
            let start = offset as usize;
            buf[0..want].copy_from_slice(&self.mem[start..start + want]);
            Ok(want)
        }
    }

    /// Moves the current read position.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, SpillError> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.size as i64 + offset,
            SeekFrom::Current(offset) => self.read_pos as i64 + offset,
        };

        if new_pos < 0 {
            return Err(SpillError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start",
            )));
        }

        self.read_pos = new_pos as u64;
        Ok(self.read_pos)
    }

    /// Returns up to `amount` bytes from the current read position without
    /// advancing it.
    pub fn peek(&mut self, amount: usize) -> Result<Vec<u8>, SpillError> {
        let mut buf = vec![0u8; amount];
        let read = self.read_at_impl(self.read_pos, &mut buf)?;
        buf.truncate(read);
        Ok(buf)
    }

    /// Reads until `delimiter` (inclusive) or EOF, appending to `buf`.
    /// Returns the number of bytes appended.
    pub fn read_until(&mut self, delimiter: u8, buf: &mut Vec<u8>) -> Result<usize, SpillError> {
        let mut count = 0;
        let mut byte = [0u8; 1];

        loop {
            let amount = self.read(&mut byte)?;
            if amount == 0 {
                break;
            }

            buf.push(byte[0]);
            count += 1;

            if byte[0] == delimiter {
                break;
            }
        }

        Ok(count)
    }

    /// Returns a borrowing view of a byte range without copying data already
    /// resident in memory; a range that spans the spilled file is copied
    /// into an owned buffer since the file is not memory-mapped.
    pub fn slice(&mut self, start: u64, end: u64) -> Result<SpillSlice<'_>, SpillError> {
        assert!(start <= end && end <= self.size);
        let len = (end - start) as usize;

        if self.file.is_none() {
            let start = start as usize;
            return Ok(SpillSlice {
                data: SpillSliceData::Borrowed(&self.mem[start..start + len]),
                pos: 0,
            });
        }

        let mut buf = vec![0u8; len];
        let mut remaining = &mut buf[..];
        let mut offset = start;

        while !remaining.is_empty() {
            let amount = self.read_at_impl(offset, remaining)?;
            if amount == 0 {
                break;
            }
            offset += amount as u64;
            remaining = &mut remaining[amount..];
        }

        Ok(SpillSlice {
            data: SpillSliceData::Owned(buf),
            pos: 0,
        })
    }

    /// Consumes the buffer, releasing the temp file (if any) and in-memory
    /// storage.
    pub fn close(self) {}
}

/// A borrowed or owned view into a [SpillBuffer]'s contents, depending on
/// whether the requested range is still resident in memory.
enum SpillSliceData<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
}

/// A read-only view into a range of a [SpillBuffer], returned by
/// [SpillBuffer::slice]. Re-exposes the same read/seek operations as the
/// buffer itself, scoped to the sliced range.
pub struct SpillSlice<'a> {
    data: SpillSliceData<'a>,
    pos: u64,
}

impl<'a> SpillSlice<'a> {
    fn as_bytes(&self) -> &[u8] {
        match &self.data {
            SpillSliceData::Borrowed(data) => data,
            SpillSliceData::Owned(data) => data,
        }
    }

    /// Length of the slice in bytes.
    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Reads up to `buf.len()` bytes starting at the current read position,
    /// advancing it. Returns the number of bytes read (0 at EOF).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, SpillError> {
        let amount = self.read_at_impl(self.pos, buf);
        self.pos += amount as u64;
        Ok(amount)
    }

    /// Reads up to `buf.len()` bytes at an offset within the slice, without
    /// moving the current read position.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, SpillError> {
        Ok(self.read_at_impl(offset, buf))
    }

    fn read_at_impl(&self, offset: u64, buf: &mut [u8]) -> usize {
        let bytes = self.as_bytes();

        if offset >= bytes.len() as u64 {
            return 0;
        }

        let start = offset as usize;
        let remaining = bytes.len() - start;
        let want = buf.len().min(remaining);
        buf[..want].copy_from_slice(&bytes[start..start + want]);
        want
    }

    /// Moves the current read position.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, SpillError> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => self.len() as i64 + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };

        if new_pos < 0 {
            return Err(SpillError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start",
            )));
        }

        self.pos = new_pos as u64;
        Ok(self.pos)
    }

    /// Returns up to `amount` bytes from the current read position without
    /// advancing it.
    pub fn peek(&self, amount: usize) -> Vec<u8> {
        let mut buf = vec![0u8; amount];
        let read = self.read_at_impl(self.pos, &mut buf);
        buf.truncate(read);
        buf
    }

    /// Reads until `delimiter` (inclusive) or EOF, appending to `buf`.
    /// Returns the number of bytes appended.
    pub fn read_until(&mut self, delimiter: u8, buf: &mut Vec<u8>) -> Result<usize, SpillError> {
        let mut count = 0;
        let mut byte = [0u8; 1];

        loop {
            let amount = self.read(&mut byte)?;
            if amount == 0 {
                break;
            }

            buf.push(byte[0]);
            count += 1;

            if byte[0] == delimiter {
                break;
            }
        }

        Ok(count)
    }
}

impl<'a> AsRef<[u8]> for SpillSlice<'a> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let mut buf = SpillBuffer::new(SpillBufferOptions::default());
        buf.write_from(b"hello world").unwrap();
        assert!(!buf.is_spilled());

        let mut out = [0u8; 5];
        let amount = buf.read(&mut out).unwrap();
        assert_eq!(amount, 5);
        assert_eq!(&out, b"hello");
    }

    #[test]
    fn test_spills_past_mem_cap() {
        let mut buf = SpillBuffer::new(SpillBufferOptions {
            mem_cap: 4,
            ..Default::default()
        });
        buf.write_from(b"hello world").unwrap();
        assert!(buf.is_spilled());

        let mut out = Vec::new();
        out.resize(11, 0);
        buf.read_at(0, &mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_total_cap_exceeded_reports_partial_write_count() {
        let mut buf = SpillBuffer::new(SpillBufferOptions {
            total_cap: 4,
            ..Default::default()
        });
        let result = buf.write_from(b"hello world");
        assert!(matches!(result, Err(SpillError::TotalCapExceeded { written: 4 })));
        assert_eq!(buf.len(), 4);

        let mut out = [0u8; 4];
        buf.read_at(0, &mut out).unwrap();
        assert_eq!(&out, b"hell");
    }

    #[test]
    fn test_total_cap_exceeded_with_nothing_written() {
        let mut buf = SpillBuffer::new(SpillBufferOptions {
            total_cap: 4,
            ..Default::default()
        });
        buf.write_from(b"halt").unwrap();

        let result = buf.write_from(b"more");
        assert!(matches!(result, Err(SpillError::TotalCapExceeded { written: 0 })));
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_slice_borrowed_in_memory() {
        let mut buf = SpillBuffer::new(SpillBufferOptions::default());
        buf.write_from(b"hello world").unwrap();

        let slice = buf.slice(0, 5).unwrap();
        assert_eq!(slice.as_ref(), b"hello");
        assert!(matches!(slice.data, SpillSliceData::Borrowed(_)));
    }

    #[test]
    fn test_slice_read_seek_peek_and_read_until() {
        let mut buf = SpillBuffer::new(SpillBufferOptions::default());
        buf.write_from(b"line one\nline two\n").unwrap();

        let mut slice = buf.slice(0, 19).unwrap();
        assert_eq!(slice.peek(4), b"line");

        let mut first = Vec::new();
        slice.read_until(b'\n', &mut first).unwrap();
        assert_eq!(first, b"line one\n");

        slice.seek(SeekFrom::Start(0)).unwrap();
        let mut out = [0u8; 4];
        slice.read(&mut out).unwrap();
        assert_eq!(&out, b"line");

        let mut at_offset = [0u8; 3];
        slice.read_at(9, &mut at_offset).unwrap();
        assert_eq!(&at_offset, b"lin");
    }

    #[test]
    fn test_slice_spans_spilled_file() {
        let mut buf = SpillBuffer::new(SpillBufferOptions {
            mem_cap: 4,
            ..Default::default()
        });
        buf.write_from(b"hello world").unwrap();

        let mut slice = buf.slice(0, 11).unwrap();
        assert!(matches!(slice.data, SpillSliceData::Owned(_)));

        let mut out = Vec::new();
        out.resize(11, 0);
        slice.read(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_read_until() {
        let mut buf = SpillBuffer::new(SpillBufferOptions::default());
        buf.write_from(b"line one\nline two\n").unwrap();

        let mut out = Vec::new();
        buf.read_until(b'\n', &mut out).unwrap();
        assert_eq!(out, b"line one\n");
    }
}
