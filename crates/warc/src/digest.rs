//! Digest algorithms for `WARC-Block-Digest` and `WARC-Payload-Digest`.
//!
//! A WARC digest field value looks like `sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ`:
//! an algorithm label, a colon, and the hash encoded in base16, base32, or
//! base64. This module parses and formats that value and provides a
//! [DigestReader] that tees bytes read from a block into one or more running
//! hashes so a reader can verify a digest without buffering the whole block.

use std::{
    fmt::Display,
    io::{Read, Result as IoResult},
    str::FromStr,
};

use data_encoding::{BASE32, BASE64};
use digest::DynDigest;
use thiserror::Error;

/// A supported digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the canonical lowercase label used in WARC digest fields.
    pub fn label(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Creates a fresh hasher for this algorithm.
    pub fn new_hasher(self) -> Box<dyn DynDigest> {
        match self {
            DigestAlgorithm::Md5 => Box::new(md5::Md5::default()),
            DigestAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            DigestAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            DigestAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = DigestError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match normalize_algorithm_name(name).as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(DigestError::UnsupportedAlgorithm {
                name: name.to_string(),
            }),
        }
    }
}

impl Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Removes the hyphen from SHA-1/SHA-2 style names and lowercases them.
fn normalize_algorithm_name(name: &str) -> String {
    let mut name = name.to_ascii_lowercase();

    if let Some(rest) = name.strip_prefix("sha-") {
        name = format!("sha{rest}");
    }

    name
}

/// Encoding used for the hash portion of a digest field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestEncoding {
    Base16,
    Base32,
    Base64,
}

impl DigestEncoding {
    /// Guesses the encoding from the hash text alone, used when the
    /// algorithm label's encoding convention is not otherwise known.
    ///
    /// Base32 (used by the `sha1` label's conventional digest encoding in
    /// most WARC producers) is all-uppercase by definition, so disambiguate
    /// hex from base32 by whether any non-hex letters (g-z) appear.
    pub fn guess(hash_text: &str) -> Self {
        if hash_text.contains('=') || hash_text.contains('+') || hash_text.contains('/') {
            DigestEncoding::Base64
        } else if hash_text.chars().all(|c| c.is_ascii_hexdigit()) {
            DigestEncoding::Base16
        } else {
            DigestEncoding::Base32
        }
    }

    fn decode(self, text: &str) -> Result<Vec<u8>, DigestError> {
        let map_err = |_| DigestError::MalformedValue {
            value: text.to_string(),
        };

        match self {
            DigestEncoding::Base16 => {
                data_encoding::HEXUPPER_PERMISSIVE.decode(text.as_bytes()).map_err(|_| map_err(()))
            }
            DigestEncoding::Base32 => BASE32.decode(text.to_ascii_uppercase().as_bytes()).map_err(|_| map_err(())),
            DigestEncoding::Base64 => BASE64.decode(text.as_bytes()).map_err(|_| map_err(())),
        }
    }

    fn encode(self, data: &[u8]) -> String {
        match self {
            DigestEncoding::Base16 => data_encoding::HEXUPPER.encode(data),
            DigestEncoding::Base32 => BASE32.encode(data),
            DigestEncoding::Base64 => BASE64.encode(data),
        }
    }
}

/// Errors parsing, formatting, or verifying a digest.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("digest field value is missing the \"algorithm:hash\" separator")]
    MissingSeparator,

    #[error("unsupported digest algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    #[error("malformed digest hash value: {value}")]
    MalformedValue { value: String },

    #[error("digest mismatch: expected {expected}, computed {computed}")]
    Mismatch { expected: String, computed: String },
}

/// A parsed `algorithm:hash` digest field value.
#[derive(Debug, Clone)]
pub struct LabelledDigest {
    pub algorithm: DigestAlgorithm,
    pub encoding: DigestEncoding,
    pub value: Vec<u8>,
}

impl LabelledDigest {
    /// Formats this digest back into its `algorithm:hash` field value form.
    pub fn to_field_value(&self) -> String {
        format!(
            "{}:{}",
            self.algorithm.label(),
            self.encoding.encode(&self.value)
        )
    }
}

impl FromStr for LabelledDigest {
    type Err = DigestError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (algorithm, hash_text) = input.split_once(':').ok_or(DigestError::MissingSeparator)?;
        let algorithm: DigestAlgorithm = algorithm.parse()?;
        let encoding = DigestEncoding::guess(hash_text);
        let value = encoding.decode(hash_text)?;

        Ok(LabelledDigest {
            algorithm,
            encoding,
            value,
        })
    }
}

impl Display for LabelledDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_field_value())
    }
}

/// Wraps a reader, updating one running hash per byte read, so a digest can
/// be verified while streaming a record's block without buffering it.
pub struct DigestReader<R: Read> {
    stream: R,
    hasher: Box<dyn DynDigest>,
    algorithm: DigestAlgorithm,
}

impl<R: Read> DigestReader<R> {
    pub fn new(stream: R, algorithm: DigestAlgorithm) -> Self {
        Self {
            stream,
            hasher: algorithm.new_hasher(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Consumes the reader and returns the computed hash.
    pub fn finalize(self) -> Vec<u8> {
        self.hasher.finalize()
    }

    /// Checks the computed hash against an expected digest's value, without
    /// consuming the hasher.
    pub fn verify(&self, expected: &LabelledDigest) -> Result<(), DigestError> {
        let computed = self.hasher.clone().finalize();

        if computed.as_ref() == expected.value.as_slice() {
            Ok(())
        } else {
            Err(DigestError::Mismatch {
                expected: expected.to_field_value(),
                computed: LabelledDigest {
                    algorithm: self.algorithm,
                    encoding: expected.encoding,
                    value: computed.to_vec(),
                }
                .to_field_value(),
            })
        }
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let amount = self.stream.read(buf)?;
        self.hasher.update(&buf[0..amount]);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_labelled_digest_base32() {
        let digest: LabelledDigest = "sha1:3I42H3S6NNFQ2MSVX7XZKYAYSCX5QBYJ".parse().unwrap();
        assert_eq!(digest.algorithm, DigestAlgorithm::Sha1);
        assert_eq!(digest.encoding, DigestEncoding::Base32);
    }

    #[test]
    fn test_parse_labelled_digest_unsupported() {
        let result = "sha3-256:deadbeef".parse::<LabelledDigest>();
        assert!(matches!(result, Err(DigestError::UnsupportedAlgorithm { .. })));
    }

    #[test]
    fn test_digest_reader_roundtrip() {
        let mut reader = DigestReader::new(Cursor::new(b"hello world"), DigestAlgorithm::Sha256);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();

        let computed = reader.finalize();
        let expected = data_encoding::HEXLOWER.encode(&computed);

        assert_eq!(
            expected,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
    }
}
