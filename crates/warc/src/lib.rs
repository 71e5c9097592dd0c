//! Streaming reader, writer, and supporting codecs for WARC (ISO 28500)
//! web archive files.

#![warn(missing_docs)]
pub mod compress;
pub mod digest;
pub mod error;
pub mod header;
pub mod http;
pub mod io;
mod nomutil;
pub mod spill;
pub mod string;
pub mod stringutil;
pub mod warc;

pub use warc::{
    BlockReader, BlockWriter, FileReader, HeaderMapExt, Mode, RecordBuilder, RecordMetadata,
    Reader, ReaderOptions, Writer, WarcError,
};
