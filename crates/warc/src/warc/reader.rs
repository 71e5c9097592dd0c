//! Streaming record-at-a-time reader.
//!
//! Records are read through an explicit three-call protocol modeled on a
//! simple open/read/close cycle rather than a typestate API: [Reader::begin_record]
//! parses the version line and header block, [Reader::read_block] hands back
//! a [Read] over the block bytes, and [Reader::end_record] discards whatever
//! of the block went unread plus the trailing blank lines, leaving the
//! stream positioned at the next record.

use std::io::{ErrorKind, Read};

use crate::compress::Decompressor;
use crate::digest::{DigestReader, LabelledDigest};
use crate::header::{HeaderMap, HeaderParser};
use crate::io::{ComboReader, PeekRead};

use super::block::{classify_block, BlockKind};
use super::fields::{name, HeaderMapExt};
use super::http_block::{HttpBlock, HttpMessage};
use super::revisit::{merge_revisit, MergedRevisit};
use super::{Mode, RecordType, WarcError};

/// Configuration for a [Reader].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// How strictly line endings and framing are checked.
    pub mode: Mode,
    /// Maximum size in bytes of a record's version line plus header block.
    pub max_header_size: u64,
    /// Maximum allowed `Content-Length` of a single record's block.
    pub max_block_size: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            max_header_size: 1 << 20,
            max_block_size: u64::MAX,
        }
    }
}

/// The version line and header fields of a record, returned by
/// [Reader::begin_record].
#[derive(Debug, Clone)]
pub struct RecordMetadata {
    version: String,
    header: HeaderMap,
    offset: u64,
    content_length: u64,
}

impl RecordMetadata {
    /// The `WARC/x.y` version line text, without the line ending.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The record's header fields.
    pub fn header(&self) -> &HeaderMap {
        &self.header
    }

    /// Byte offset of this record's version line in the underlying stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The declared `Content-Length` of the block, in decompressed bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// The record's `WARC-Type`, or `Unknown("")` if absent.
    pub fn record_type(&self) -> RecordType {
        self.header
            .get_parsed::<RecordType>(name::WARC_TYPE)
            .ok()
            .flatten()
            .unwrap_or_else(|| RecordType::Unknown(String::new()))
    }
}

enum ReaderState<S: Read> {
    /// Between records; holds the raw stream with its look-ahead buffer.
    Idle(ComboReader<S>),
    /// A record's header has been parsed and its block is open for reading.
    InRecord {
        decompressor: Decompressor<ComboReader<S>>,
        remaining: u64,
    },
    /// Transient placeholder used only while moving between the above states.
    Transitioning,
}

/// Reads WARC records one at a time from an underlying byte stream.
pub struct Reader<S: Read> {
    state: ReaderState<S>,
    options: ReaderOptions,
    offset: u64,
}

impl<S: Read> Reader<S> {
    /// Creates a reader with the default [ReaderOptions].
    pub fn new(stream: S) -> Self {
        Self::with_options(stream, ReaderOptions::default())
    }

    /// Creates a reader with the given options.
    pub fn with_options(stream: S, options: ReaderOptions) -> Self {
        Self {
            state: ReaderState::Idle(ComboReader::new(stream)),
            options,
            offset: 0,
        }
    }

    /// Byte offset of the next record to be parsed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Parses the next record's version line and header block.
    ///
    /// Returns `Ok(None)` at a clean end of file. Panics if a previous
    /// record's block was not closed with [Reader::end_record].
    pub fn begin_record(&mut self) -> Result<Option<RecordMetadata>, WarcError> {
        let mut combo = match std::mem::replace(&mut self.state, ReaderState::Transitioning) {
            ReaderState::Idle(combo) => combo,
            _ => panic!("begin_record called with a record already open"),
        };

        loop {
            let peeked = combo.peek(5).map_err(WarcError::Io)?;

            if peeked.is_empty() {
                self.state = ReaderState::Idle(combo);
                return Ok(None);
            }

            if peeked.starts_with(&[0x1f, 0x8b]) || peeked.starts_with(b"WARC/") {
                break;
            }

            if self.options.mode == Mode::Strict {
                self.state = ReaderState::Idle(combo);
                return Err(WarcError::UnknownFormat);
            }

            // Resync: discard a byte of trailing garbage between records and
            // retry. It is legal for this to consume the remainder of the
            // stream and report end-of-stream.
            let mut discard = [0u8; 1];
            if combo.read(&mut discard).map_err(WarcError::Io)? == 0 {
                self.state = ReaderState::Idle(combo);
                return Ok(None);
            }
            self.offset += 1;
        }

        let record_offset = self.offset;
        let mut decompressor = Decompressor::new_allow_unknown(combo).map_err(WarcError::Io)?;

        let version = read_version_line(&mut decompressor, self.options.mode, record_offset)?;
        let header_bytes = read_header_block(
            &mut decompressor,
            self.options.mode,
            self.options.max_header_size,
            record_offset,
        )?;

        let header = HeaderParser::new()
            .parse_header(&header_bytes)
            .map_err(|error| WarcError::MalformedHeader {
                offset: record_offset,
                source: Some(Box::new(error)),
            })?;

        if self.options.mode == Mode::Strict {
            super::fields::validate_repeatability(&header)?;

            let record_type = header
                .get_parsed::<RecordType>(name::WARC_TYPE)
                .ok()
                .flatten()
                .unwrap_or_else(|| RecordType::Unknown(String::new()));
            super::fields::validate_allowed_record_types(&header, &record_type)?;
        }

        let content_length = header.get_parsed_required::<u64>(name::CONTENT_LENGTH)?;

        if content_length > self.options.max_block_size {
            return Err(WarcError::MaxSizeExceeded {
                what: format!("block length {content_length} exceeds configured maximum"),
            });
        }

        self.state = ReaderState::InRecord {
            decompressor,
            remaining: content_length,
        };

        Ok(Some(RecordMetadata {
            version,
            header,
            offset: record_offset,
            content_length,
        }))
    }

    /// Returns a [Read] over the current record's block bytes.
    ///
    /// Panics unless called after a successful [Reader::begin_record] with
    /// no intervening [Reader::end_record].
    pub fn read_block(&mut self) -> BlockReader<'_, S> {
        assert!(
            matches!(self.state, ReaderState::InRecord { .. }),
            "read_block called without an open record"
        );
        BlockReader { reader: self }
    }

    /// Classifies `metadata`'s block and hands back the matching typed view
    /// over it: an [HttpBlock] for `application/http`, a parsed [HeaderMap]
    /// for `application/warc-fields`, or the raw block bytes otherwise.
    ///
    /// Panics under the same conditions as [Self::read_block].
    pub fn typed_block(&mut self, metadata: &RecordMetadata) -> Result<TypedBlock<'_, S>, WarcError> {
        let block = classify_block(&metadata.record_type(), metadata.header());

        Ok(match block.kind {
            BlockKind::Http => {
                let msgtype_hint = block
                    .content_type
                    .as_ref()
                    .and_then(|media_type| media_type.parameter("msgtype"))
                    .map(str::to_string);
                TypedBlock::Http(HttpBlock::new(self.read_block(), msgtype_hint))
            }
            BlockKind::WarcFields => {
                let mut bytes = Vec::new();
                self.read_block().read_to_end(&mut bytes).map_err(WarcError::Io)?;
                let header = HeaderParser::new()
                    .parse_header(&bytes)
                    .map_err(|error| WarcError::MalformedHeader {
                        offset: metadata.offset(),
                        source: Some(Box::new(error)),
                    })?;
                TypedBlock::WarcFields(header)
            }
            BlockKind::Revisit => TypedBlock::Revisit(self.read_block()),
            BlockKind::Generic => TypedBlock::Generic(self.read_block()),
        })
    }

    /// Reads the current revisit record's own block (its HTTP header bytes,
    /// or nothing) and merges it with `referent_payload`, the block of the
    /// record it revisits, synthesizing a `response`-equivalent record.
    ///
    /// See [merge_revisit]. Panics under the same conditions as
    /// [Self::read_block].
    pub fn merge_revisit_block<R: Read>(
        &mut self,
        metadata: &RecordMetadata,
        referent_payload: R,
    ) -> Result<MergedRevisit<R>, WarcError> {
        let mut revisit_http_headers = Vec::new();
        self.read_block()
            .read_to_end(&mut revisit_http_headers)
            .map_err(WarcError::Io)?;

        Ok(merge_revisit(metadata.header(), revisit_http_headers, referent_payload))
    }

    /// Reads the current record's block to completion, teeing it through a
    /// digest keyed by its declared `WARC-Block-Digest` field and verifying
    /// the result.
    ///
    /// Returns the block's bytes. Fails with
    /// [WarcError::UnsupportedDigestAlgorithm] if `WARC-Block-Digest` names
    /// an algorithm this crate doesn't implement, or [WarcError::DigestMismatch]
    /// if the recomputed digest doesn't match. If no `WARC-Block-Digest`
    /// field is present, the block is read back without verification.
    pub fn verify_block_digest(&mut self, metadata: &RecordMetadata) -> Result<Vec<u8>, WarcError> {
        let record_id = metadata
            .header()
            .get_str(name::WARC_RECORD_ID)
            .unwrap_or_default()
            .to_string();

        match metadata.header().get_str(name::WARC_BLOCK_DIGEST) {
            Some(text) => {
                let expected: LabelledDigest =
                    text.parse().map_err(WarcError::UnsupportedDigestAlgorithm)?;

                let mut digest_reader = DigestReader::new(self.read_block(), expected.algorithm);
                let mut bytes = Vec::new();
                digest_reader.read_to_end(&mut bytes).map_err(WarcError::Io)?;

                digest_reader
                    .verify(&expected)
                    .map_err(|source| WarcError::DigestMismatch { record_id, source })?;

                Ok(bytes)
            }
            None => {
                let mut bytes = Vec::new();
                self.read_block().read_to_end(&mut bytes).map_err(WarcError::Io)?;
                Ok(bytes)
            }
        }
    }

    /// Finishes the current record, discarding any unread block bytes and
    /// the trailing blank lines, and readies the stream for the next
    /// [Reader::begin_record].
    pub fn end_record(&mut self) -> Result<(), WarcError> {
        let (mut decompressor, mut remaining) =
            match std::mem::replace(&mut self.state, ReaderState::Transitioning) {
                ReaderState::InRecord {
                    decompressor,
                    remaining,
                } => (decompressor, remaining),
                _ => panic!("end_record called without an open record"),
            };

        let record_offset = self.offset;
        let mut sink = [0u8; 4096];

        while remaining > 0 {
            let want = remaining.min(sink.len() as u64) as usize;
            let amount = decompressor.read(&mut sink[0..want]).map_err(WarcError::Io)?;
            if amount == 0 {
                return Err(WarcError::WrongBlockLength {
                    record_id: String::new(),
                });
            }
            remaining -= amount as u64;
        }

        read_trailer(&mut decompressor, self.options.mode, record_offset)?;

        let consumed = decompressor.raw_input_read_count();
        let combo = decompressor.into_inner();

        self.offset += consumed;
        self.state = ReaderState::Idle(combo);

        Ok(())
    }
}

/// A [Read] over the bytes of an open record's block.
///
/// Reads beyond the block's declared `Content-Length` return `Ok(0)`.
pub struct BlockReader<'a, S: Read> {
    reader: &'a mut Reader<S>,
}

impl<'a, S: Read> Read for BlockReader<'a, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.reader.state {
            ReaderState::InRecord {
                decompressor,
                remaining,
            } => {
                if *remaining == 0 {
                    return Ok(0);
                }

                let want = buf.len().min(*remaining as usize);
                let amount = decompressor.read(&mut buf[0..want])?;
                *remaining -= amount as u64;
                Ok(amount)
            }
            _ => Ok(0),
        }
    }
}

/// The typed view of a record's block returned by [Reader::typed_block].
pub enum TypedBlock<'a, S: Read> {
    /// An `application/http` block, on `response`/`request`/`resource`/
    /// `conversion`/`continuation` records.
    Http(HttpBlock<BlockReader<'a, S>>),
    /// An `application/warc-fields` block, parsed into its own header map.
    WarcFields(HeaderMap),
    /// A `revisit` record's block, unparsed. See [Reader::merge_revisit_block].
    Revisit(BlockReader<'a, S>),
    /// Any other block, as raw bytes.
    Generic(BlockReader<'a, S>),
}

/// Reads a single line byte by byte, including its terminator, so framing
/// boundaries (a gzip member's end, a record's declared block length) are
/// never over-read. Returns `None` at a clean EOF with nothing read.
fn read_line_raw<R: Read>(stream: &mut R, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let amount = stream.read(&mut byte)?;

        if amount == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            break;
        }

        buf.push(byte[0]);

        if byte[0] == b'\n' {
            break;
        }

        if buf.len() as u64 >= limit {
            return Err(ErrorKind::InvalidData.into());
        }
    }

    Ok(Some(buf))
}

/// Strips a line's terminator, enforcing `\r\n` in [Mode::Strict].
fn strip_line_ending(mut line: Vec<u8>, mode: Mode, offset: u64) -> Result<Vec<u8>, WarcError> {
    if line.last() == Some(&b'\n') {
        line.pop();

        if line.last() == Some(&b'\r') {
            line.pop();
        } else if mode == Mode::Strict {
            return Err(WarcError::MissingCarriageReturn { offset });
        }
    }

    Ok(line)
}

fn read_version_line<R: Read>(stream: &mut R, mode: Mode, offset: u64) -> Result<String, WarcError> {
    let raw = read_line_raw(stream, 256)
        .map_err(WarcError::Io)?
        .ok_or(WarcError::MissingRecordVersion)?;
    let line = strip_line_ending(raw, mode, offset)?;
    let text = String::from_utf8_lossy(&line).into_owned();

    let version_part = text.strip_prefix("WARC/").ok_or(WarcError::UnknownFormat)?;

    if !matches!(version_part, "1.0" | "1.1") {
        return Err(WarcError::UnsupportedVersion { version: text });
    }

    Ok(text)
}

fn read_header_block<R: Read>(
    stream: &mut R,
    mode: Mode,
    limit: u64,
    offset: u64,
) -> Result<Vec<u8>, WarcError> {
    let mut header_bytes = Vec::new();

    loop {
        let raw = read_line_raw(stream, limit)
            .map_err(WarcError::Io)?
            .ok_or(WarcError::MissingEndOfFieldsMarker { offset })?;
        let stripped = strip_line_ending(raw, mode, offset)?;

        if stripped.is_empty() {
            break;
        }

        header_bytes.extend_from_slice(&stripped);
        header_bytes.extend_from_slice(b"\r\n");

        if header_bytes.len() as u64 > limit {
            return Err(WarcError::MaxSizeExceeded {
                what: "header block".to_string(),
            });
        }
    }

    Ok(header_bytes)
}

fn read_trailer<R: Read>(stream: &mut R, mode: Mode, offset: u64) -> Result<(), WarcError> {
    for _ in 0..2 {
        let raw = read_line_raw(stream, 16)
            .map_err(WarcError::Io)?
            .ok_or(WarcError::MissingRecordTrailer { offset })?;
        let stripped = strip_line_ending(raw, mode, offset)?;

        if !stripped.is_empty() {
            return Err(WarcError::MissingRecordTrailer { offset });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_record() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"WARC/1.1\r\n");
        data.extend_from_slice(b"WARC-Type: resource\r\n");
        data.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        data.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        data.extend_from_slice(b"Content-Length: 5\r\n");
        data.extend_from_slice(b"\r\n");
        data.extend_from_slice(b"hello");
        data.extend_from_slice(b"\r\n\r\n");
        data
    }

    #[test]
    fn test_read_single_record() {
        let mut reader = Reader::new(Cursor::new(sample_record()));

        let metadata = reader.begin_record().unwrap().unwrap();
        assert_eq!(metadata.version(), "WARC/1.1");
        assert_eq!(metadata.content_length(), 5);
        assert_eq!(metadata.record_type(), RecordType::Resource);

        let mut block = Vec::new();
        reader.read_block().read_to_end(&mut block).unwrap();
        assert_eq!(block, b"hello");

        reader.end_record().unwrap();

        assert!(reader.begin_record().unwrap().is_none());
    }

    #[test]
    fn test_read_two_records_tracks_offsets() {
        let mut data = sample_record();
        data.extend_from_slice(&sample_record());
        let mut reader = Reader::new(Cursor::new(data));

        let first = reader.begin_record().unwrap().unwrap();
        assert_eq!(first.offset(), 0);
        reader.read_block().read_to_end(&mut Vec::new()).unwrap();
        reader.end_record().unwrap();

        let second = reader.begin_record().unwrap().unwrap();
        assert!(second.offset() > 0);
        reader.read_block().read_to_end(&mut Vec::new()).unwrap();
        reader.end_record().unwrap();

        assert!(reader.begin_record().unwrap().is_none());
    }

    #[test]
    fn test_end_record_without_reading_block_skips_it() {
        let mut data = sample_record();
        data.extend_from_slice(&sample_record());
        let mut reader = Reader::new(Cursor::new(data));

        reader.begin_record().unwrap().unwrap();
        reader.end_record().unwrap();

        let second = reader.begin_record().unwrap().unwrap();
        let mut block = Vec::new();
        reader.read_block().read_to_end(&mut block).unwrap();
        assert_eq!(block, b"hello");
        reader.end_record().unwrap();

        let _ = second;
    }

    #[test]
    fn test_strict_mode_rejects_non_warc_data() {
        let mut reader = Reader::with_options(
            Cursor::new(b"not a warc file".to_vec()),
            ReaderOptions {
                mode: Mode::Strict,
                ..Default::default()
            },
        );
        let result = reader.begin_record();
        assert!(matches!(result, Err(WarcError::UnknownFormat)));
    }

    #[test]
    fn test_lenient_mode_returns_end_of_stream_for_pure_garbage() {
        let mut reader = Reader::new(Cursor::new(b"not a warc file".to_vec()));
        assert!(reader.begin_record().unwrap().is_none());
    }

    #[test]
    fn test_lenient_mode_resyncs_over_garbage_between_records() {
        let mut data = b"garbage-before-the-record".to_vec();
        let garbage_len = data.len() as u64;
        data.extend_from_slice(&sample_record());
        let mut reader = Reader::new(Cursor::new(data));

        let metadata = reader.begin_record().unwrap().unwrap();
        assert_eq!(metadata.offset(), garbage_len);
        assert_eq!(metadata.content_length(), 5);

        let mut block = Vec::new();
        reader.read_block().read_to_end(&mut block).unwrap();
        assert_eq!(block, b"hello");
        reader.end_record().unwrap();

        assert!(reader.begin_record().unwrap().is_none());
    }

    #[test]
    fn test_typed_block_dispatches_http() {
        let mut data = Vec::new();
        data.extend_from_slice(b"WARC/1.1\r\n");
        data.extend_from_slice(b"WARC-Type: response\r\n");
        data.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        data.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        data.extend_from_slice(b"Content-Type: application/http; msgtype=response\r\n");
        let block = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";
        data.extend_from_slice(format!("Content-Length: {}\r\n", block.len()).as_bytes());
        data.extend_from_slice(b"\r\n");
        data.extend_from_slice(block);
        data.extend_from_slice(b"\r\n\r\n");

        let mut reader = Reader::new(Cursor::new(data));
        let metadata = reader.begin_record().unwrap().unwrap();

        match reader.typed_block(&metadata).unwrap() {
            TypedBlock::Http(mut http_block) => {
                match http_block.message().unwrap() {
                    HttpMessage::Response(response) => assert_eq!(response.status_line.status_code, 200),
                    HttpMessage::Request(_) => panic!("expected a response"),
                }
                let mut payload = Vec::new();
                http_block.payload().unwrap().read_to_end(&mut payload).unwrap();
                assert_eq!(payload, b"hello");
            }
            _ => panic!("expected a Http typed block"),
        }

        reader.end_record().unwrap();
    }

    #[test]
    fn test_typed_block_dispatches_warc_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(b"WARC/1.1\r\n");
        data.extend_from_slice(b"WARC-Type: warcinfo\r\n");
        data.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        data.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        data.extend_from_slice(b"Content-Type: application/warc-fields\r\n");
        let block = b"software: test/1.0\r\n";
        data.extend_from_slice(format!("Content-Length: {}\r\n", block.len()).as_bytes());
        data.extend_from_slice(b"\r\n");
        data.extend_from_slice(block);
        data.extend_from_slice(b"\r\n\r\n");

        let mut reader = Reader::new(Cursor::new(data));
        let metadata = reader.begin_record().unwrap().unwrap();

        match reader.typed_block(&metadata).unwrap() {
            TypedBlock::WarcFields(fields) => {
                assert_eq!(fields.get_str("software"), Some("test/1.0"));
            }
            _ => panic!("expected a WarcFields typed block"),
        }

        reader.end_record().unwrap();
    }

    #[test]
    fn test_merge_revisit_block_reads_own_block_and_merges() {
        let mut data = Vec::new();
        data.extend_from_slice(b"WARC/1.1\r\n");
        data.extend_from_slice(b"WARC-Type: revisit\r\n");
        data.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        data.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        data.extend_from_slice(
            b"WARC-Refers-To: <urn:uuid:11111111-1111-1111-1111-111111111111>\r\n",
        );
        let block = b"HTTP/1.1 200 OK\r\n\r\n";
        data.extend_from_slice(format!("Content-Length: {}\r\n", block.len()).as_bytes());
        data.extend_from_slice(b"\r\n");
        data.extend_from_slice(block);
        data.extend_from_slice(b"\r\n\r\n");

        let mut reader = Reader::new(Cursor::new(data));
        let metadata = reader.begin_record().unwrap().unwrap();

        let mut merged = reader
            .merge_revisit_block(&metadata, Cursor::new(b"referent body".to_vec()))
            .unwrap();

        assert_eq!(merged.header.get_str("WARC-Type"), Some("response"));
        assert!(!merged.header.contains_key("WARC-Refers-To"));

        let mut block = Vec::new();
        merged.block.read_to_end(&mut block).unwrap();
        assert_eq!(block, b"HTTP/1.1 200 OK\r\n\r\nreferent body");

        reader.end_record().unwrap();
    }

    #[test]
    fn test_verify_block_digest_detects_match_and_mismatch() {
        let mut good = Vec::new();
        good.extend_from_slice(b"WARC/1.1\r\n");
        good.extend_from_slice(b"WARC-Type: resource\r\n");
        good.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        good.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        let expected = crate::digest::LabelledDigest {
            algorithm: crate::digest::DigestAlgorithm::Sha256,
            encoding: crate::digest::DigestEncoding::Base16,
            value: {
                use digest::Digest;
                sha2::Sha256::digest(b"hello").to_vec()
            },
        };
        good.extend_from_slice(format!("WARC-Block-Digest: {}\r\n", expected.to_field_value()).as_bytes());
        good.extend_from_slice(b"Content-Length: 5\r\n");
        good.extend_from_slice(b"\r\n");
        good.extend_from_slice(b"hello");
        good.extend_from_slice(b"\r\n\r\n");

        let mut reader = Reader::new(Cursor::new(good));
        let metadata = reader.begin_record().unwrap().unwrap();
        let bytes = reader.verify_block_digest(&metadata).unwrap();
        assert_eq!(bytes, b"hello");
        reader.end_record().unwrap();

        let mut bad = Vec::new();
        bad.extend_from_slice(b"WARC/1.1\r\n");
        bad.extend_from_slice(b"WARC-Type: resource\r\n");
        bad.extend_from_slice(b"WARC-Record-ID: <urn:uuid:00000000-0000-0000-0000-000000000000>\r\n");
        bad.extend_from_slice(b"WARC-Date: 2022-01-01T00:00:00Z\r\n");
        bad.extend_from_slice(b"WARC-Block-Digest: sha256:0000000000000000000000000000000000000000000000000000000000000000\r\n");
        bad.extend_from_slice(b"Content-Length: 5\r\n");
        bad.extend_from_slice(b"\r\n");
        bad.extend_from_slice(b"hello");
        bad.extend_from_slice(b"\r\n\r\n");

        let mut reader = Reader::new(Cursor::new(bad));
        let metadata = reader.begin_record().unwrap().unwrap();
        let result = reader.verify_block_digest(&metadata);
        assert!(matches!(result, Err(WarcError::DigestMismatch { .. })));
    }

    #[test]
    fn test_strict_mode_rejects_bare_newline() {
        let data = b"WARC/1.1\nWARC-Type: resource\r\n\r\n".to_vec();
        let mut reader = Reader::with_options(
            Cursor::new(data),
            ReaderOptions {
                mode: Mode::Strict,
                ..Default::default()
            },
        );

        let result = reader.begin_record();
        assert!(matches!(result, Err(WarcError::MissingCarriageReturn { .. })));
    }
}
