use std::io::Write;

use crate::{
    compress::{CompressionFormat, CompressionLevel, Compressor},
    header::{HeaderFormatter, HeaderMap},
};

use super::{HeaderMapExt, Mode, RecordType, WarcError};

/// Default WARC version string.
pub const DEFAULT_VERSION: &str = "WARC/1.1";

/// Writes a WARC file, one record at a time.
///
/// The writer handles compression by writing each record as its own
/// independent gzip member, so records can still be located and
/// decompressed individually by a downstream consumer. A stream already
/// handed in pre-compressed works too, but the result will not be
/// self-indexing since the wrapper compression covers the whole file.
pub struct Writer<S: Write> {
    stream: Option<S>,

    state: WriterState,
    mode: Mode,

    compressed_stream: Option<Compressor<S>>,
    compression_format: CompressionFormat,
    compression_level: CompressionLevel,

    version: String,
    header_formatter: HeaderFormatter,

    record_id: String,
    block_length: u64,
    block_amount_written: u64,
}

impl<S: Write> Writer<S> {
    /// Creates a writer with the given stream without compression.
    pub fn new(stream: S) -> Self {
        Self::new_compressed(stream, CompressionFormat::Raw, Default::default())
    }

    /// Creates a writer with the given stream and compression configuration.
    pub fn new_compressed(
        stream: S,
        compression_format: CompressionFormat,
        compression_level: CompressionLevel,
    ) -> Self {
        Self {
            stream: Some(stream),
            state: WriterState::StartOfHeader,
            mode: Mode::default(),
            compressed_stream: None,
            compression_format,
            compression_level,
            version: DEFAULT_VERSION.to_string(),
            header_formatter: HeaderFormatter::new(),
            record_id: String::new(),
            block_length: 0,
            block_amount_written: 0,
        }
    }

    /// Returns the formatter for headers.
    pub fn header_formatter(&self) -> &HeaderFormatter {
        &self.header_formatter
    }

    /// Sets the formatter for headers.
    pub fn set_header_formatter(&mut self, header_formatter: HeaderFormatter) {
        self.header_formatter = header_formatter;
    }

    /// Returns the WARC version string used when writing headers.
    ///
    /// Default: [DEFAULT_VERSION]
    pub fn version(&self) -> &str {
        self.version.as_ref()
    }

    /// Sets the WARC version string used when writing headers.
    pub fn set_version(&mut self, version: String) {
        self.version = version;
    }

    /// Returns the wrapped stream.
    ///
    /// Panics if the writer is in the middle of writing a record.
    pub fn into_inner(self) -> S {
        self.stream.unwrap()
    }

    /// Returns the strictness mode used when emitting records.
    ///
    /// Default: [Mode::Lenient]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the strictness mode. In [Mode::Strict], [Self::begin_record]
    /// validates the header set's completeness before writing anything.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Begins a record by writing the version line and header block.
    ///
    /// The caller must call [Self::write_block] next to advance the stream.
    ///
    /// In [Mode::Strict], refuses to write anything if `header` is missing a
    /// mandatory field, repeats a single-valued field, or carries a field
    /// not allowed for its `WARC-Type`.
    ///
    /// Panics when called out of sequence.
    pub fn begin_record(&mut self, header: &HeaderMap) -> Result<(), WarcError> {
        assert!(self.state == WriterState::StartOfHeader);
        assert!(self.stream.is_some());
        assert!(self.compressed_stream.is_none());

        tracing::debug!("begin_record");

        if self.mode == Mode::Strict {
            let record_type = header
                .get_parsed::<RecordType>(super::fields::name::WARC_TYPE)
                .ok()
                .flatten()
                .unwrap_or_else(|| RecordType::Unknown(String::new()));
            super::fields::validate_header_completeness(header, &record_type)?;
        }

        self.create_compressor()?;
        self.write_header(header)?;
        self.prepare_for_block_write(header)?;

        self.state = WriterState::EndOfHeader;

        Ok(())
    }

    fn create_compressor(&mut self) -> Result<(), WarcError> {
        tracing::debug!("create_compressor");

        let stream = self.stream.take().unwrap();
        let stream = Compressor::new(stream, self.compression_format, self.compression_level)?;
        self.compressed_stream = Some(stream);

        Ok(())
    }

    fn write_header(&mut self, header: &HeaderMap) -> Result<(), WarcError> {
        tracing::debug!("write_header");

        let stream = self.compressed_stream.as_mut().unwrap();

        stream.write_all(self.version.as_bytes())?;
        stream.write_all(b"\r\n")?;
        if let Err(error) = self.header_formatter.format_header(header, &mut *stream) {
            return Err(WarcError::MalformedHeader {
                offset: 0,
                source: Some(Box::new(error)),
            });
        }
        stream.write_all(b"\r\n")?;

        Ok(())
    }

    fn prepare_for_block_write(&mut self, header: &HeaderMap) -> Result<(), WarcError> {
        self.record_id = header
            .get_str(super::fields::name::WARC_RECORD_ID)
            .unwrap_or_default()
            .to_string();
        self.block_length = header.get_parsed_required(super::fields::name::CONTENT_LENGTH)?;
        self.block_amount_written = 0;

        tracing::debug!(block_length = self.block_length, "prepare_for_block_write");

        Ok(())
    }

    /// Starts writing a record body.
    ///
    /// The caller must write all the block contents and then call [Self::end_record].
    /// The amount of bytes written must match `Content-Length` in the header.
    ///
    /// Panics when called out of sequence.
    pub fn write_block(&mut self) -> BlockWriter<'_, S> {
        assert!(self.state == WriterState::EndOfHeader);
        tracing::debug!("write_block");

        self.state = WriterState::InBlock;

        BlockWriter {
            stream: self.compressed_stream.as_mut().unwrap(),
            num_bytes_written: &mut self.block_amount_written,
        }
    }

    /// Finish writing a record.
    ///
    /// Panics when called out of sequence.
    pub fn end_record(&mut self) -> Result<(), WarcError> {
        assert!(self.state == WriterState::InBlock);
        tracing::debug!("end_record");
        assert!(self.stream.is_none());
        assert!(self.compressed_stream.is_some());

        self.check_block_length()?;

        let mut stream = self.compressed_stream.take().unwrap();
        stream.write_all(b"\r\n\r\n")?;
        let mut stream = stream.finish()?;
        stream.flush()?;
        self.stream = Some(stream);
        self.state = WriterState::StartOfHeader;

        Ok(())
    }

    fn check_block_length(&self) -> Result<(), WarcError> {
        tracing::debug!(
            bytes_written = self.block_amount_written,
            block_length = self.block_length,
            "check_block_length"
        );

        if self.block_amount_written != self.block_length {
            return Err(WarcError::WrongBlockLength {
                record_id: self.record_id.clone(),
            });
        }

        Ok(())
    }
}

/// Writer stream for a record body.
pub struct BlockWriter<'b, S: Write> {
    stream: &'b mut Compressor<S>,
    num_bytes_written: &'b mut u64,
}

impl<'b, S: Write> Write for BlockWriter<'b, S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let amount = self.stream.write(buf)?;
        *self.num_bytes_written += amount as u64;
        Ok(amount)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    StartOfHeader,
    EndOfHeader,
    InBlock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Decompressor;
    use std::io::Read;

    fn sample_header() -> HeaderMap {
        let mut header = HeaderMap::new();
        header.insert("WARC-Type", "resource");
        header.insert(
            "WARC-Record-ID",
            "<urn:uuid:00000000-0000-0000-0000-000000000000>",
        );
        header.insert("WARC-Date", "2022-01-01T00:00:00Z");
        header.insert("Content-Length", "5");
        header
    }

    #[test]
    fn test_write_record_raw() {
        let mut writer = Writer::new(Vec::new());
        let header = sample_header();

        writer.begin_record(&header).unwrap();
        writer.write_block().write_all(b"hello").unwrap();
        writer.end_record().unwrap();

        let output = writer.into_inner();
        let text = String::from_utf8(output).unwrap();

        assert!(text.starts_with("WARC/1.1\r\n"));
        assert!(text.contains("WARC-Type: resource\r\n"));
        assert!(text.ends_with("hello\r\n\r\n"));
    }

    #[test]
    fn test_write_record_gzip_roundtrips() {
        let mut writer = Writer::new_compressed(
            Vec::new(),
            CompressionFormat::Gzip,
            CompressionLevel::Fast,
        );
        let header = sample_header();

        writer.begin_record(&header).unwrap();
        writer.write_block().write_all(b"hello").unwrap();
        writer.end_record().unwrap();

        let output = writer.into_inner();
        let mut decompressor = Decompressor::new(std::io::Cursor::new(output)).unwrap();
        let mut text = String::new();
        decompressor.read_to_string(&mut text).unwrap();

        assert!(text.starts_with("WARC/1.1\r\n"));
        assert!(text.ends_with("hello\r\n\r\n"));
    }

    #[test]
    fn test_wrong_block_length_is_rejected() {
        let mut writer = Writer::new(Vec::new());
        let header = sample_header();

        writer.begin_record(&header).unwrap();
        writer.write_block().write_all(b"hi").unwrap();
        let result = writer.end_record();

        assert!(matches!(result, Err(WarcError::WrongBlockLength { .. })));
    }

    #[test]
    fn test_strict_mode_rejects_incomplete_header() {
        let mut writer = Writer::new(Vec::new());
        writer.set_mode(Mode::Strict);

        let mut header = HeaderMap::new();
        header.insert("WARC-Type", "resource");
        header.insert(
            "WARC-Record-ID",
            "<urn:uuid:00000000-0000-0000-0000-000000000000>",
        );
        header.insert("WARC-Date", "2022-01-01T00:00:00Z");

        let result = writer.begin_record(&header);
        assert!(matches!(result, Err(WarcError::MissingRequiredField { .. })));
    }

    #[test]
    fn test_strict_mode_rejects_field_not_allowed_for_record_type() {
        let mut writer = Writer::new(Vec::new());
        writer.set_mode(Mode::Strict);

        let mut header = sample_header();
        header.insert("WARC-Filename", "crawl.warc.gz");

        let result = writer.begin_record(&header);
        assert!(matches!(result, Err(WarcError::IllegalField { .. })));
    }

    #[test]
    fn test_lenient_mode_accepts_incomplete_header() {
        let mut writer = Writer::new(Vec::new());
        let mut header = HeaderMap::new();
        header.insert("WARC-Type", "resource");
        header.insert("Content-Length", "5");

        writer.begin_record(&header).unwrap();
        writer.write_block().write_all(b"hello").unwrap();
        writer.end_record().unwrap();
    }
}
