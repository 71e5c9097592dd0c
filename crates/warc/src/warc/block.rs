//! Classifies a record's block so callers can pick the right reader for it.

use crate::header::HeaderMap;
use crate::http::MediaType;

use super::fields::name;
use super::RecordType;

/// What kind of content a record's block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// An embedded HTTP request or response (`application/http`), found in
    /// `response`/`request`/`resource`/`conversion`/`continuation` records.
    Http,
    /// A `application/warc-fields` block: a second, nested name-value field
    /// list (used by `warcinfo` and `metadata` records).
    WarcFields,
    /// A `revisit` record; the block (if any) is a short sample, not a
    /// full resource, and must be merged with its referent record to be
    /// interpreted. See [super::merge_revisit].
    Revisit,
    /// Any other block; treat it as an opaque byte sequence.
    Generic,
}

/// The result of classifying a record's block.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// The parsed `Content-Type`, if present and well-formed.
    pub content_type: Option<MediaType>,
}

/// Classifies a record's block from its `WARC-Type` and `Content-Type`.
pub fn classify_block(record_type: &RecordType, header: &HeaderMap) -> Block {
    if *record_type == RecordType::Revisit {
        return Block {
            kind: BlockKind::Revisit,
            content_type: None,
        };
    }

    let content_type = header
        .get_str(name::CONTENT_TYPE)
        .and_then(|value| value.parse::<MediaType>().ok());

    let is_http_eligible = matches!(
        record_type,
        RecordType::Response
            | RecordType::Request
            | RecordType::Resource
            | RecordType::Conversion
            | RecordType::Continuation
    );

    let kind = match &content_type {
        Some(media_type) if is_http_eligible && media_type.essence() == "application/http" => {
            BlockKind::Http
        }
        Some(media_type) if media_type.essence() == "application/warc-fields" => {
            BlockKind::WarcFields
        }
        _ => BlockKind::Generic,
    };

    Block { kind, content_type }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_response() {
        let mut header = HeaderMap::new();
        header.insert("Content-Type", "application/http; msgtype=response");

        let block = classify_block(&RecordType::Response, &header);
        assert_eq!(block.kind, BlockKind::Http);
    }

    #[test]
    fn test_classify_warc_fields() {
        let mut header = HeaderMap::new();
        header.insert("Content-Type", "application/warc-fields");

        let block = classify_block(&RecordType::Warcinfo, &header);
        assert_eq!(block.kind, BlockKind::WarcFields);
    }

    #[test]
    fn test_classify_revisit_ignores_content_type() {
        let mut header = HeaderMap::new();
        header.insert("Content-Type", "application/http; msgtype=response");

        let block = classify_block(&RecordType::Revisit, &header);
        assert_eq!(block.kind, BlockKind::Revisit);
    }

    #[test]
    fn test_classify_generic() {
        let mut header = HeaderMap::new();
        header.insert("Content-Type", "image/png");

        let block = classify_block(&RecordType::Resource, &header);
        assert_eq!(block.kind, BlockKind::Generic);
    }
}
