//! HTTP start-line and header parsing used for the `application/http` block
//! type embedded in WARC records.
pub mod field;
mod pc;
mod request;
mod response;
mod util;

pub use field::MediaType;
pub use request::*;
pub use response::*;
pub use util::HeaderByteExt;

use thiserror::Error;

/// HTTP version as `(major, minor)`, e.g. `(1, 1)` for HTTP/1.1.
pub type Version = (u16, u16);

/// Version assumed when formatting a request or response that didn't specify one.
pub const DEFAULT_VERSION: Version = (1, 1);

/// Errors during HTTP parsing, formatting, or processing protocol state.
#[derive(Error, Debug)]
pub enum HTTPError {
    /// Unexpected end of data.
    #[error("unexpected end of data")]
    UnexpectedEnd,

    /// Invalid or malformed start line (request line or status line).
    #[error("invalid start line")]
    InvalidStartLine {
        /// Source of the error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Header couldn't be parsed or formatted.
    #[error("malformed header")]
    MalformedHeader {
        /// Source of the error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
