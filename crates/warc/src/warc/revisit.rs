//! Synthesizes a `response`-equivalent record from a `revisit` record and
//! the earlier record it revisits.
//!
//! A `revisit` record's block is, by grammar, empty or carries only the
//! HTTP headers of the resource; the resource's body is not stored again.
//! [merge_revisit] produces the header and block a reader would see if it
//! were looking at the original resource directly: the record type becomes
//! `response`, the `WARC-Refers-To*` and `WARC-Profile` fields (which only
//! make sense on a `revisit`) are dropped, and the block is the revisit's
//! own HTTP header bytes followed by the referent's payload. The returned
//! record borrows the referent's payload reader, so the caller must keep
//! the referent record alive for as long as the merged block is read.

use std::io::{Chain, Cursor, Read};

use crate::header::HeaderMap;

use super::fields::name;

const DROPPED_FIELDS: &[&str] = &[
    name::WARC_REFERS_TO,
    name::WARC_REFERS_TO_TARGET_URI,
    name::WARC_REFERS_TO_DATE,
    name::WARC_PROFILE,
];

/// The header and block produced by [merge_revisit].
pub struct MergedRevisit<R: Read> {
    /// The synthesized header, with `WARC-Type` set to `response` and the
    /// revisit-only fields removed.
    pub header: HeaderMap,
    /// The revisit's own HTTP header bytes, chained with the referent's
    /// payload.
    pub block: Chain<Cursor<Vec<u8>>, R>,
}

/// Merges a revisit record's header and HTTP headers with the payload of
/// the record it revisits.
///
/// `revisit_http_headers` is the bytes of the revisit record's own block
/// (empty, or an HTTP header block per the grammar). `referent_payload` is
/// the referent's block, read from wherever it was stored.
pub fn merge_revisit<R: Read>(
    revisit_header: &HeaderMap,
    revisit_http_headers: Vec<u8>,
    referent_payload: R,
) -> MergedRevisit<R> {
    let mut header = revisit_header.clone();
    header.insert(name::WARC_TYPE, "response");

    for field_name in DROPPED_FIELDS {
        header.remove(field_name);
    }

    MergedRevisit {
        header,
        block: Cursor::new(revisit_http_headers).chain(referent_payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_retypes_and_drops_refers_to_fields() {
        let mut revisit = HeaderMap::new();
        revisit.insert("WARC-Type", "revisit");
        revisit.insert(
            "WARC-Record-ID",
            "<urn:uuid:11111111-1111-1111-1111-111111111111>",
        );
        revisit.insert("WARC-Target-URI", "https://example.com/");
        revisit.insert(
            "WARC-Refers-To",
            "<urn:uuid:22222222-2222-2222-2222-222222222222>",
        );
        revisit.insert("WARC-Refers-To-Target-URI", "https://example.com/");
        revisit.insert("WARC-Refers-To-Date", "2000-01-01T00:00:00Z");
        revisit.insert("WARC-Profile", "http://netpreserve.org/warc/1.1/revisit/identical-payload-digest");

        let merged = merge_revisit(&revisit, Vec::new(), Cursor::new(Vec::<u8>::new()));

        assert_eq!(merged.header.get_str("WARC-Type"), Some("response"));
        assert_eq!(
            merged.header.get_str("WARC-Record-ID"),
            Some("<urn:uuid:11111111-1111-1111-1111-111111111111>")
        );
        assert!(!merged.header.contains_key("WARC-Refers-To"));
        assert!(!merged.header.contains_key("WARC-Refers-To-Target-URI"));
        assert!(!merged.header.contains_key("WARC-Refers-To-Date"));
        assert!(!merged.header.contains_key("WARC-Profile"));
    }

    #[test]
    fn test_merge_concatenates_http_headers_with_referent_payload() {
        let revisit = HeaderMap::new();
        let http_headers = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n".to_vec();
        let referent_payload = Cursor::new(b"<html></html>".to_vec());

        let mut merged = merge_revisit(&revisit, http_headers, referent_payload);

        let mut block = Vec::new();
        merged.block.read_to_end(&mut block).unwrap();

        assert_eq!(
            block,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html></html>"
        );
    }
}
