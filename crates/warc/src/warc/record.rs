//! Builds the header fields for a record to be handed to [super::Writer].

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::header::{FieldName, FieldValue, HeaderMap};

use super::fields::name;
use super::RecordType;

/// Incrementally builds a record's header fields.
///
/// `WARC-Record-ID` and `WARC-Date` are filled in with sensible defaults at
/// [RecordBuilder::build] unless explicitly set first; `Content-Length` is
/// always set from the block length passed to [RecordBuilder::build].
pub struct RecordBuilder {
    header: HeaderMap,
    record_id_set: bool,
    date_set: bool,
}

impl RecordBuilder {
    /// Starts a new record of the given `WARC-Type`.
    pub fn new(record_type: RecordType) -> Self {
        let mut header = HeaderMap::new();
        header.insert(name::WARC_TYPE, record_type.as_str());

        Self {
            header,
            record_id_set: false,
            date_set: false,
        }
    }

    /// Sets an arbitrary header field, replacing any existing value.
    pub fn field<N, V>(mut self, field_name: N, value: V) -> Self
    where
        N: Into<FieldName>,
        V: Into<FieldValue>,
    {
        let field_name = field_name.into();

        if field_name.text.eq_ignore_ascii_case(name::WARC_RECORD_ID) {
            self.record_id_set = true;
        } else if field_name.text.eq_ignore_ascii_case(name::WARC_DATE) {
            self.date_set = true;
        }

        self.header.insert(field_name, value);
        self
    }

    /// Sets `WARC-Target-URI`.
    pub fn target_uri<V: Into<FieldValue>>(self, uri: V) -> Self {
        self.field(name::WARC_TARGET_URI, uri)
    }

    /// Adds a `WARC-Concurrent-To` reference to another record's ID.
    pub fn concurrent_to<V: Into<FieldValue>>(self, record_id: V) -> Self {
        self.field(name::WARC_CONCURRENT_TO, record_id)
    }

    /// Sets `WARC-Warcinfo-ID`.
    pub fn warcinfo_id<V: Into<FieldValue>>(self, record_id: V) -> Self {
        self.field(name::WARC_WARCINFO_ID, record_id)
    }

    /// Finishes the header for a block of `block_length` bytes.
    pub fn build(mut self, block_length: u64) -> HeaderMap {
        if !self.record_id_set {
            self.header.insert(
                name::WARC_RECORD_ID,
                format!("<urn:uuid:{}>", Uuid::new_v4()),
            );
        }

        if !self.date_set {
            self.header.insert(
                name::WARC_DATE,
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }

        self.header
            .insert(name::CONTENT_LENGTH, block_length.to_string());

        self.header
    }
}
