//! File-positioning wrapper around [Reader].
//!
//! [FileReader] opens a WARC file at a given byte offset and reports the
//! offset of each record it returns, which is what an index (CDX-like)
//! consumer needs to later seek directly to a record. Unlike the source
//! implementation this crate was modeled on, reaching end of file always
//! reports a clean end-of-stream rather than resetting the offset to 0.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use super::{Reader, ReaderOptions, RecordMetadata, WarcError};

/// Opens a WARC file at an offset and drives a [Reader] over it, closing
/// each record automatically before parsing the next.
pub struct FileReader {
    reader: Reader<File>,
    file_size: u64,
    record_open: bool,
}

impl FileReader {
    /// Opens `path`, seeks to `offset`, and prepares to read records from
    /// there using `options`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        offset: u64,
        options: ReaderOptions,
    ) -> std::io::Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        file.seek(SeekFrom::Start(offset))?;

        Ok(Self {
            reader: Reader::with_options(file, options),
            file_size,
            record_open: false,
        })
    }

    /// Byte offset, from the start of the file, of the next record.
    pub fn next_offset(&self) -> u64 {
        self.reader.offset()
    }

    /// Closes the current record, if any, draining any unread block, then
    /// parses the next one.
    ///
    /// Returns `Ok(None)` once the tracked offset reaches the file's size
    /// observed at open time.
    pub fn next(&mut self) -> Result<Option<RecordMetadata>, WarcError> {
        if self.record_open {
            self.reader.end_record()?;
            self.record_open = false;
        }

        if self.reader.offset() >= self.file_size {
            return Ok(None);
        }

        let metadata = self.reader.begin_record()?;
        self.record_open = metadata.is_some();
        Ok(metadata)
    }

    /// Returns the underlying [Reader] for reading the current record's
    /// block.
    ///
    /// Panics under the same conditions as [Reader::read_block].
    pub fn reader_mut(&mut self) -> &mut Reader<File> {
        &mut self.reader
    }

    /// Reads the current record's block, verifying it against its declared
    /// `WARC-Block-Digest`. See [Reader::verify_block_digest].
    pub fn verify_block_digest(&mut self, metadata: &RecordMetadata) -> Result<Vec<u8>, WarcError> {
        self.reader.verify_block_digest(metadata)
    }
}
