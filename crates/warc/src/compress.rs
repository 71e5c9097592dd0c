//! Per-record gzip compression and decompression.
//!
//! A WARC file may store each record as its own independent gzip member so
//! that records can be located and decompressed individually. This module
//! deliberately decodes exactly one gzip member per [Decompressor] rather
//! than transparently concatenating multiple members: the WARC reader
//! constructs a fresh [Decompressor] at the start of every record, so a
//! multi-member-aware decoder would silently swallow the next record's
//! bytes into the current one.
//!
//! [Decompressor] and [Compressor] operate directly on a caller-owned
//! [BufRead]/[Write] rather than wrapping their own buffer, so that the same
//! stream (and its look-ahead buffer) can be carried from one record's
//! decompressor into the next via [Decompressor::into_inner].

use std::io::{BufRead, ErrorKind, Read, Write};

use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;

use crate::io::CountRead;

/// Specifies a compression or decompression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Apply no codec. Pass data through as is.
    Raw,
    /// Gzip file format, one member per record.
    Gzip,
}

enum Decoder<S: BufRead> {
    Raw(S),
    Gzip(GzDecoder<S>),
}

impl<S: BufRead> Decoder<S> {
    fn name(&self) -> &'static str {
        match self {
            Decoder::Raw(_) => "raw",
            Decoder::Gzip(_) => "gzip",
        }
    }
}

/// Decompresses a single gzip member, or passes through uncompressed data.
pub struct Decompressor<S: BufRead> {
    decoder: Decoder<S>,
}

impl<S: BufRead> Decompressor<S> {
    fn new_impl(mut stream: S, allow_unknown: bool) -> std::io::Result<Self> {
        let peeked = stream.fill_buf()?;
        let magic_bytes = peeked[..peeked.len().min(2)].to_vec();

        tracing::debug!(?magic_bytes, "decompressor analysis");

        let decoder = if magic_bytes.len() >= 2 && magic_bytes[0] == 0x1f && magic_bytes[1] == 0x8b
        {
            Decoder::Gzip(GzDecoder::new(stream))
        } else if allow_unknown {
            Decoder::Raw(stream)
        } else {
            return Err(ErrorKind::InvalidData.into());
        };
        tracing::debug!(decoder = decoder.name(), "decoder select");

        Ok(Self { decoder })
    }

    /// Opens a compressed stream. Returns an error for unsupported formats.
    pub fn new(stream: S) -> std::io::Result<Self> {
        Self::new_impl(stream, false)
    }

    /// Opens a compressed stream, or passes through contents unchanged for
    /// unrecognized formats.
    pub fn new_allow_unknown(stream: S) -> std::io::Result<Self> {
        Self::new_impl(stream, true)
    }

    /// Returns the wrapped stream, with any bytes it had already buffered
    /// past this gzip member (the start of the next record) intact.
    pub fn into_inner(self) -> S {
        match self.decoder {
            Decoder::Raw(stream) => stream,
            Decoder::Gzip(stream) => stream.into_inner(),
        }
    }
}

impl<S: BufRead + CountRead> Decompressor<S> {
    /// Returns the number of (possibly still compressed) bytes consumed
    /// from the wrapped stream.
    pub fn raw_input_read_count(&self) -> u64 {
        match &self.decoder {
            Decoder::Raw(stream) => stream.read_count(),
            Decoder::Gzip(stream) => stream.get_ref().read_count(),
        }
    }
}

impl<S: BufRead> Read for Decompressor<S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.decoder {
            Decoder::Raw(stream) => stream.read(buf),
            Decoder::Gzip(stream) => stream.read(buf),
        }
    }
}

enum Encoder<S: Write> {
    Raw(S),
    Gzip(GzEncoder<S>),
}

/// Specifies a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Fastest speed but with low compression ratio.
    Fast,
    /// Default level specified by the codec.
    CodecDefault,
    /// Recommended balanced ratio of speed and compression. Default value.
    Optimal,
    /// Almost best compression ratio at the cost of slow speed.
    High,
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::Optimal
    }
}

impl CompressionLevel {
    fn get_int_for_format(&self, format: CompressionFormat) -> u32 {
        match format {
            CompressionFormat::Raw => 0,
            CompressionFormat::Gzip => match self {
                CompressionLevel::Fast => 1,
                CompressionLevel::CodecDefault => 6,
                CompressionLevel::Optimal => 9,
                CompressionLevel::High => 9,
            },
        }
    }
}

/// Compresses a single record as one independent gzip member, or passes
/// data through unchanged.
pub struct Compressor<S: Write> {
    encoder: Encoder<S>,
}

impl<S: Write> Compressor<S> {
    /// Creates a compressor with the given stream and codec options.
    pub fn new(
        stream: S,
        format: CompressionFormat,
        level: CompressionLevel,
    ) -> std::io::Result<Self> {
        let encoder = match format {
            CompressionFormat::Raw => Encoder::Raw(stream),
            CompressionFormat::Gzip => Encoder::Gzip(GzEncoder::new(
                stream,
                GzCompression::new(level.get_int_for_format(format)),
            )),
        };
        Ok(Self { encoder })
    }

    /// Completes the gzip member (if any) and returns the wrapped stream.
    pub fn finish(self) -> std::io::Result<S> {
        match self.encoder {
            Encoder::Raw(stream) => Ok(stream),
            Encoder::Gzip(stream) => stream.finish(),
        }
    }
}

impl<S: Write> Write for Compressor<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.encoder {
            Encoder::Raw(stream) => stream.write(buf),
            Encoder::Gzip(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.encoder {
            Encoder::Raw(stream) => stream.flush(),
            Encoder::Gzip(stream) => stream.flush(),
        }
    }
}
