//! Streaming reader and writer for WARC (ISO 28500) files.

mod block;
mod fields;
mod file;
mod http_block;
mod record;
mod reader;
mod revisit;
mod writer;

pub use block::{classify_block, Block, BlockKind};
pub use fields::{HeaderMapExt, RecordType, TruncatedReason};
pub use file::FileReader;
pub use http_block::{HttpBlock, HttpBlockPhase, HttpMessage};
pub use reader::{BlockReader, RecordMetadata, Reader, ReaderOptions, TypedBlock};
pub use record::RecordBuilder;
pub use revisit::{merge_revisit, MergedRevisit};
pub use writer::{BlockWriter, Writer, DEFAULT_VERSION};

use thiserror::Error;

/// How strictly the reader enforces line-ending and framing conventions.
///
/// WARC producers in the wild sometimes emit bare `\n` line endings instead
/// of the `\r\n` the format requires. [Mode::Lenient] accepts those files;
/// [Mode::Strict] rejects them with [WarcError::MissingCarriageReturn].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Lenient,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Lenient
    }
}

/// Errors during parsing or formatting of WARC files.
#[derive(Error, Debug)]
pub enum WarcError {
    /// Not a recognized WARC file: no `WARC/` version line at all.
    #[error("unknown format")]
    UnknownFormat,

    /// The version line was empty (clean EOF between records is not this
    /// error; this is an EOF in the middle of a line).
    #[error("missing record version line")]
    MissingRecordVersion,

    /// The version line didn't match a supported `WARC/x.y`.
    #[error("unsupported WARC version: {version}")]
    UnsupportedVersion { version: String },

    /// In [Mode::Strict], a line ended with a bare `\n` instead of `\r\n`.
    #[error("line is missing its carriage return")]
    MissingCarriageReturn { offset: u64 },

    /// A header line had no `:` separator and wasn't a continuation line.
    #[error("malformed header line at offset {offset}")]
    MalformedHeaderLine { offset: u64 },

    /// Header block couldn't be parsed at all (also covers the above).
    #[error("malformed header")]
    MalformedHeader {
        offset: u64,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The blank line separating headers from the block was never found.
    #[error("missing end of fields marker")]
    MissingEndOfFieldsMarker { offset: u64 },

    /// A field required by the WARC type was absent.
    #[error("missing required field {name} in record {record_id}")]
    MissingRequiredField { name: String, record_id: String },

    /// A field name or value was illegal for the record's context.
    #[error("illegal field {name} in record {record_id}")]
    IllegalField { name: String, record_id: String },

    /// A field that must appear at most once appeared more than once.
    #[error("field {name} repeated in record {record_id}")]
    FieldRepeatedNotAllowed { name: String, record_id: String },

    /// Field contained a value that could not be interpreted as its type.
    #[error("invalid field value")]
    InvalidFieldValue {
        name: String,
        record_id: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The length of the record body does not correspond with `Content-Length`.
    #[error("wrong block length for record {record_id}")]
    WrongBlockLength { record_id: String },

    /// The two CRLF lines ending a record were missing or malformed.
    #[error("malformed record trailer at offset {offset}")]
    MissingRecordTrailer { offset: u64 },

    /// `WARC-*-Digest` named an algorithm this crate does not implement.
    #[error(transparent)]
    UnsupportedDigestAlgorithm(#[from] crate::digest::DigestError),

    /// A computed digest did not match the record's declared digest.
    #[error("digest mismatch in record {record_id}")]
    DigestMismatch {
        record_id: String,
        #[source]
        source: crate::digest::DigestError,
    },

    /// A configured size limit (header, block, or spill buffer) was exceeded.
    #[error("maximum size exceeded: {what}")]
    MaxSizeExceeded { what: String },

    /// Attempted to write to a buffer opened only for reading, or vice versa.
    #[error("buffer is read only")]
    ReadOnlyBuffer,

    /// The record's block was already fully consumed or closed.
    #[error("record content already consumed")]
    ContentAlreadyConsumed,

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
