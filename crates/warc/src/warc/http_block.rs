//! Lazy, single-shot parsing of the `application/http` block type.
//!
//! An `application/http` block is itself an HTTP request or response:
//! a start-line, a header block, a blank line, then the payload. Nothing is
//! read until the caller asks for it: [HttpBlock] tracks which phase of
//! `Created -> HeadersParsed -> PayloadConsumed -> Closed` it's in and only
//! advances when the corresponding accessor is called.

use std::io::Read;

use crate::http::{RequestHeader, ResponseHeader};

use super::WarcError;

/// A parsed HTTP request or response start-line and header block.
#[derive(Debug, Clone)]
pub enum HttpMessage {
    Request(RequestHeader),
    Response(ResponseHeader),
}

/// Where an [HttpBlock] is in its read lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpBlockPhase {
    /// Nothing has been read yet. [HttpBlock::into_raw] is only callable
    /// here.
    Created,
    /// The start-line and headers have been parsed; the payload has not
    /// been touched.
    HeadersParsed,
    /// [HttpBlock::payload] has been read to EOF.
    PayloadConsumed,
    /// [HttpBlock::close] has run; nothing further can be read.
    Closed,
}

/// An `application/http` record block.
///
/// Headers are parsed on first access, not in the constructor: a caller that
/// only wants [Self::into_raw] never pays for header parsing, and a caller
/// that only wants the headers never buffers the payload.
pub struct HttpBlock<R: Read> {
    block: Option<R>,
    message: Option<HttpMessage>,
    msgtype_hint: Option<String>,
    phase: HttpBlockPhase,
}

impl<R: Read> HttpBlock<R> {
    /// Wraps `block` without reading anything from it.
    ///
    /// `msgtype_hint` is the `msgtype` parameter of the record's
    /// `Content-Type` (`request` or `response`), when present. Without a
    /// hint, the first line is sniffed once headers are actually parsed: a
    /// line starting with `HTTP/` is a response, anything else a request.
    pub fn new(block: R, msgtype_hint: Option<String>) -> Self {
        Self {
            block: Some(block),
            message: None,
            msgtype_hint,
            phase: HttpBlockPhase::Created,
        }
    }

    /// Where this block is in its read lifecycle.
    pub fn phase(&self) -> HttpBlockPhase {
        self.phase
    }

    /// The parsed start-line and headers, parsing them on first call.
    ///
    /// Panics if [Self::into_raw] was already called.
    pub fn message(&mut self) -> Result<&HttpMessage, WarcError> {
        assert_ne!(
            self.phase,
            HttpBlockPhase::Closed,
            "message() called on a closed HttpBlock"
        );

        if self.message.is_none() {
            let mut block = self.block.take().expect("block taken while not Closed");
            let header_bytes = read_until_blank_line(&mut block)?;

            let is_response = match self.msgtype_hint.as_deref() {
                Some("response") => true,
                Some("request") => false,
                _ => header_bytes.starts_with(b"HTTP/"),
            };

            let message = if is_response {
                HttpMessage::Response(ResponseHeader::parse_from(&header_bytes).map_err(wrap_error)?)
            } else {
                HttpMessage::Request(RequestHeader::parse_from(&header_bytes).map_err(wrap_error)?)
            };

            self.message = Some(message);
            self.block = Some(block);

            if self.phase == HttpBlockPhase::Created {
                self.phase = HttpBlockPhase::HeadersParsed;
            }
        }

        Ok(self.message.as_ref().unwrap())
    }

    /// A reader over the payload following the header block, parsing the
    /// headers first if that hasn't happened yet.
    ///
    /// Reading it to EOF advances the phase to [HttpBlockPhase::PayloadConsumed].
    pub fn payload(&mut self) -> Result<HttpBlockPayload<'_, R>, WarcError> {
        self.message()?;
        Ok(HttpBlockPayload { block: self })
    }

    /// Consumes this block, returning the underlying reader positioned at
    /// the very start, bypassing header parsing entirely.
    ///
    /// Panics unless called from [HttpBlockPhase::Created].
    pub fn into_raw(mut self) -> R {
        assert_eq!(
            self.phase,
            HttpBlockPhase::Created,
            "into_raw() called after headers were parsed"
        );
        self.block.take().expect("block present in Created phase")
    }

    /// Drains whatever of the block hasn't been read and marks it closed.
    pub fn close(&mut self) -> Result<(), WarcError> {
        if self.phase == HttpBlockPhase::Closed {
            return Ok(());
        }

        if self.message.is_none() {
            self.message()?;
        }

        if let Some(block) = self.block.as_mut() {
            let mut sink = [0u8; 4096];
            loop {
                let amount = block.read(&mut sink).map_err(WarcError::Io)?;
                if amount == 0 {
                    break;
                }
            }
        }

        self.phase = HttpBlockPhase::Closed;
        Ok(())
    }
}

/// Borrowing [Read] over an [HttpBlock]'s payload, returned by
/// [HttpBlock::payload].
pub struct HttpBlockPayload<'a, R: Read> {
    block: &'a mut HttpBlock<R>,
}

impl<'a, R: Read> Read for HttpBlockPayload<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let stream = self.block.block.as_mut().expect("block present while parsed");
        let amount = stream.read(buf)?;

        if amount == 0 && self.block.phase == HttpBlockPhase::HeadersParsed {
            self.block.phase = HttpBlockPhase::PayloadConsumed;
        }

        Ok(amount)
    }
}

fn wrap_error(error: crate::http::HTTPError) -> WarcError {
    WarcError::MalformedHeader {
        offset: 0,
        source: Some(Box::new(error)),
    }
}

fn read_until_blank_line<R: Read>(stream: &mut R) -> Result<Vec<u8>, WarcError> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let amount = stream.read(&mut byte).map_err(WarcError::Io)?;

        if amount == 0 {
            break;
        }

        buf.push(byte[0]);

        if buf.ends_with(b"\r\n\r\n") || buf.ends_with(b"\n\n") {
            break;
        }
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_starts_in_created_phase() {
        let data = b"GET / HTTP/1.1\r\n\r\n";
        let block = HttpBlock::new(Cursor::new(data.to_vec()), None);
        assert_eq!(block.phase(), HttpBlockPhase::Created);
    }

    #[test]
    fn test_message_parses_lazily_and_advances_phase() {
        let data = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\nbody bytes";
        let mut block = HttpBlock::new(Cursor::new(data.to_vec()), None);

        match block.message().unwrap() {
            HttpMessage::Request(request) => {
                assert_eq!(request.request_line.method, "GET");
                assert_eq!(request.fields.get_str("Host"), Some("example.com"));
            }
            HttpMessage::Response(_) => panic!("expected a request"),
        }
        assert_eq!(block.phase(), HttpBlockPhase::HeadersParsed);

        let mut body = Vec::new();
        block.payload().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"body bytes");
        assert_eq!(block.phase(), HttpBlockPhase::PayloadConsumed);
    }

    #[test]
    fn test_response_sniffed_from_status_line() {
        let data = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello";
        let mut block = HttpBlock::new(Cursor::new(data.to_vec()), None);

        match block.message().unwrap() {
            HttpMessage::Response(response) => assert_eq!(response.status_line.status_code, 200),
            HttpMessage::Request(_) => panic!("expected a response"),
        }
    }

    #[test]
    fn test_msgtype_hint_overrides_sniffing() {
        let data = b"GET / HTTP/1.1\r\n\r\n";
        let mut block = HttpBlock::new(Cursor::new(data.to_vec()), Some("request".to_string()));
        assert!(matches!(block.message().unwrap(), HttpMessage::Request(_)));
    }

    #[test]
    fn test_into_raw_bypasses_parsing() {
        let data = b"GET / HTTP/1.1\r\n\r\nthe rest";
        let block = HttpBlock::new(Cursor::new(data.to_vec()), None);

        let mut raw = Vec::new();
        block.into_raw().read_to_end(&mut raw).unwrap();
        assert_eq!(raw, data);
    }

    #[test]
    fn test_close_drains_unread_payload_and_marks_closed() {
        let data = b"GET / HTTP/1.1\r\n\r\nunread payload";
        let mut block = HttpBlock::new(Cursor::new(data.to_vec()), None);

        block.close().unwrap();
        assert_eq!(block.phase(), HttpBlockPhase::Closed);
    }
}
