//! The dictionary of well-known WARC header fields and their value types.

use std::str::FromStr;

use crate::header::HeaderMap;

use super::WarcError;

/// Field name constants, as registered by ISO 28500.
pub mod name {
    pub const WARC_TYPE: &str = "WARC-Type";
    pub const WARC_RECORD_ID: &str = "WARC-Record-ID";
    pub const WARC_DATE: &str = "WARC-Date";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const WARC_CONCURRENT_TO: &str = "WARC-Concurrent-To";
    pub const WARC_BLOCK_DIGEST: &str = "WARC-Block-Digest";
    pub const WARC_PAYLOAD_DIGEST: &str = "WARC-Payload-Digest";
    pub const WARC_IP_ADDRESS: &str = "WARC-IP-Address";
    pub const WARC_REFERS_TO: &str = "WARC-Refers-To";
    pub const WARC_REFERS_TO_TARGET_URI: &str = "WARC-Refers-To-Target-URI";
    pub const WARC_REFERS_TO_DATE: &str = "WARC-Refers-To-Date";
    pub const WARC_TARGET_URI: &str = "WARC-Target-URI";
    pub const WARC_TRUNCATED: &str = "WARC-Truncated";
    pub const WARC_WARCINFO_ID: &str = "WARC-Warcinfo-ID";
    pub const WARC_FILENAME: &str = "WARC-Filename";
    pub const WARC_PROFILE: &str = "WARC-Profile";
    pub const WARC_IDENTIFIED_PAYLOAD_TYPE: &str = "WARC-Identified-Payload-Type";
    pub const WARC_SEGMENT_NUMBER: &str = "WARC-Segment-Number";
    pub const WARC_SEGMENT_ORIGIN_ID: &str = "WARC-Segment-Origin-ID";
    pub const WARC_SEGMENT_TOTAL_LENGTH: &str = "WARC-Segment-Total-Length";
}

/// The `WARC-Type` of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Warcinfo,
    Response,
    Resource,
    Request,
    Metadata,
    Revisit,
    Conversion,
    Continuation,
    /// A type this crate doesn't recognize by name; the original text is
    /// preserved so it can be round-tripped.
    Unknown(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::Warcinfo => "warcinfo",
            RecordType::Response => "response",
            RecordType::Resource => "resource",
            RecordType::Request => "request",
            RecordType::Metadata => "metadata",
            RecordType::Revisit => "revisit",
            RecordType::Conversion => "conversion",
            RecordType::Continuation => "continuation",
            RecordType::Unknown(text) => text,
        }
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(match text.to_ascii_lowercase().as_str() {
            "warcinfo" => RecordType::Warcinfo,
            "response" => RecordType::Response,
            "resource" => RecordType::Resource,
            "request" => RecordType::Request,
            "metadata" => RecordType::Metadata,
            "revisit" => RecordType::Revisit,
            "conversion" => RecordType::Conversion,
            "continuation" => RecordType::Continuation,
            _ => RecordType::Unknown(text.to_string()),
        })
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reason a record's block is shorter than the original resource, as
/// given by `WARC-Truncated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruncatedReason {
    Length,
    Time,
    Disconnect,
    Unspecified,
    Unknown(String),
}

impl FromStr for TruncatedReason {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(match text.to_ascii_lowercase().as_str() {
            "length" => TruncatedReason::Length,
            "time" => TruncatedReason::Time,
            "disconnect" => TruncatedReason::Disconnect,
            "unspecified" => TruncatedReason::Unspecified,
            _ => TruncatedReason::Unknown(text.to_string()),
        })
    }
}

impl std::fmt::Display for TruncatedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TruncatedReason::Length => "length",
            TruncatedReason::Time => "time",
            TruncatedReason::Disconnect => "disconnect",
            TruncatedReason::Unspecified => "unspecified",
            TruncatedReason::Unknown(text) => text,
        };
        f.write_str(text)
    }
}

/// Extension trait for typed, WARC-error-returning access to header fields.
pub trait HeaderMapExt {
    fn get_required(&self, name: &str) -> Result<&str, WarcError>;

    fn get_parsed<T>(&self, name: &str) -> Result<Option<T>, WarcError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static;

    fn get_parsed_required<T>(&self, name: &str) -> Result<T, WarcError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static;
}

impl HeaderMapExt for HeaderMap {
    fn get_required(&self, name: &str) -> Result<&str, WarcError> {
        match self.get(name) {
            Some(field) => Ok(field.text.as_str()),
            None => Err(make_field_error(self, name, None)),
        }
    }

    fn get_parsed<T>(&self, name: &str) -> Result<Option<T>, WarcError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(name) {
            Some(field) => field
                .text
                .parse::<T>()
                .map(Some)
                .map_err(|error| make_field_error(self, name, Some(Box::new(error)))),
            None => Ok(None),
        }
    }

    fn get_parsed_required<T>(&self, name: &str) -> Result<T, WarcError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(name) {
            Some(field) => field
                .text
                .parse::<T>()
                .map_err(|error| make_field_error(self, name, Some(Box::new(error)))),
            None => Err(make_field_error(self, name, None)),
        }
    }
}

/// Fields that may legally appear more than once on a record.
///
/// Every other field named in the standard fields table is single-valued;
/// [validate_repeatability] rejects a second occurrence of one of those in
/// [crate::warc::Mode::Strict].
const REPEATABLE_FIELDS: &[&str] = &[name::WARC_CONCURRENT_TO];

const SINGLE_VALUED_FIELDS: &[&str] = &[
    name::WARC_TYPE,
    name::WARC_RECORD_ID,
    name::WARC_DATE,
    name::CONTENT_LENGTH,
    name::CONTENT_TYPE,
    name::WARC_BLOCK_DIGEST,
    name::WARC_PAYLOAD_DIGEST,
    name::WARC_IP_ADDRESS,
    name::WARC_IDENTIFIED_PAYLOAD_TYPE,
    name::WARC_FILENAME,
    name::WARC_PROFILE,
    name::WARC_REFERS_TO,
    name::WARC_REFERS_TO_DATE,
    name::WARC_REFERS_TO_TARGET_URI,
    name::WARC_TARGET_URI,
    name::WARC_TRUNCATED,
    name::WARC_WARCINFO_ID,
    name::WARC_SEGMENT_NUMBER,
    name::WARC_SEGMENT_ORIGIN_ID,
    name::WARC_SEGMENT_TOTAL_LENGTH,
];

/// Rejects a standard field named in the data model's "repeatable" column
/// (only `WARC-Concurrent-To`) that appears more than once.
///
/// Unrecognized (extension) fields are never checked; they're outside the
/// standard fields table this validates against.
pub fn validate_repeatability(header: &HeaderMap) -> Result<(), WarcError> {
    for field_name in SINGLE_VALUED_FIELDS {
        debug_assert!(!REPEATABLE_FIELDS.contains(field_name));

        if header.get_all(*field_name).count() > 1 {
            let record_id = header
                .get(name::WARC_RECORD_ID)
                .map(|field| field.text.as_str())
                .unwrap_or_default()
                .to_string();

            return Err(WarcError::FieldRepeatedNotAllowed {
                name: field_name.to_string(),
                record_id,
            });
        }
    }

    Ok(())
}

/// Which record types a standard field is allowed to appear on.
enum AllowedRecordTypes {
    All,
    AllExcept(RecordType),
    Only(&'static [RecordType]),
}

impl AllowedRecordTypes {
    fn permits(&self, record_type: &RecordType) -> bool {
        match self {
            AllowedRecordTypes::All => true,
            AllowedRecordTypes::AllExcept(excluded) => record_type != excluded,
            AllowedRecordTypes::Only(allowed) => allowed.contains(record_type),
        }
    }
}

/// The data model's "Allowed record types" column, field by field.
static ALLOWED_RECORD_TYPES: &[(&str, AllowedRecordTypes)] = &[
    (name::CONTENT_LENGTH, AllowedRecordTypes::All),
    (name::CONTENT_TYPE, AllowedRecordTypes::All),
    (name::WARC_RECORD_ID, AllowedRecordTypes::All),
    (name::WARC_DATE, AllowedRecordTypes::All),
    (name::WARC_TYPE, AllowedRecordTypes::All),
    (name::WARC_BLOCK_DIGEST, AllowedRecordTypes::All),
    (name::WARC_PAYLOAD_DIGEST, AllowedRecordTypes::All),
    (
        name::WARC_CONCURRENT_TO,
        AllowedRecordTypes::Only(&[
            RecordType::Response,
            RecordType::Resource,
            RecordType::Request,
            RecordType::Metadata,
            RecordType::Revisit,
        ]),
    ),
    (
        name::WARC_IP_ADDRESS,
        AllowedRecordTypes::Only(&[
            RecordType::Response,
            RecordType::Resource,
            RecordType::Request,
            RecordType::Metadata,
            RecordType::Revisit,
        ]),
    ),
    (name::WARC_IDENTIFIED_PAYLOAD_TYPE, AllowedRecordTypes::All),
    (name::WARC_FILENAME, AllowedRecordTypes::Only(&[RecordType::Warcinfo])),
    (name::WARC_PROFILE, AllowedRecordTypes::Only(&[RecordType::Revisit])),
    (
        name::WARC_REFERS_TO,
        AllowedRecordTypes::Only(&[RecordType::Metadata, RecordType::Revisit, RecordType::Conversion]),
    ),
    (name::WARC_REFERS_TO_DATE, AllowedRecordTypes::Only(&[RecordType::Revisit])),
    (
        name::WARC_REFERS_TO_TARGET_URI,
        AllowedRecordTypes::Only(&[RecordType::Revisit]),
    ),
    (name::WARC_TARGET_URI, AllowedRecordTypes::All),
    (name::WARC_TRUNCATED, AllowedRecordTypes::All),
    (name::WARC_WARCINFO_ID, AllowedRecordTypes::AllExcept(RecordType::Warcinfo)),
    (name::WARC_SEGMENT_NUMBER, AllowedRecordTypes::All),
    (name::WARC_SEGMENT_ORIGIN_ID, AllowedRecordTypes::All),
    (name::WARC_SEGMENT_TOTAL_LENGTH, AllowedRecordTypes::All),
];

/// Fields a record must carry for its header set to be considered complete.
const MANDATORY_FIELDS: &[&str] = &[
    name::WARC_TYPE,
    name::WARC_RECORD_ID,
    name::WARC_DATE,
    name::CONTENT_LENGTH,
];

/// Rejects a standard field present on a record type not named in the data
/// model's "Allowed record types" column.
///
/// Unrecognized (extension) fields are never checked.
pub fn validate_allowed_record_types(header: &HeaderMap, record_type: &RecordType) -> Result<(), WarcError> {
    for (field_name, allowed) in ALLOWED_RECORD_TYPES {
        if header.get(*field_name).is_some() && !allowed.permits(record_type) {
            let record_id = header
                .get(name::WARC_RECORD_ID)
                .map(|field| field.text.as_str())
                .unwrap_or_default()
                .to_string();

            return Err(WarcError::IllegalField {
                name: field_name.to_string(),
                record_id,
            });
        }
    }

    Ok(())
}

/// Strict-mode pre-emission check: every mandatory field is present, no
/// single-valued field repeats, and no field is used on a record type that
/// doesn't permit it.
pub fn validate_header_completeness(header: &HeaderMap, record_type: &RecordType) -> Result<(), WarcError> {
    for field_name in MANDATORY_FIELDS {
        if header.get(*field_name).is_none() {
            let record_id = header
                .get(name::WARC_RECORD_ID)
                .map(|field| field.text.as_str())
                .unwrap_or_default()
                .to_string();

            return Err(WarcError::MissingRequiredField {
                name: field_name.to_string(),
                record_id,
            });
        }
    }

    validate_repeatability(header)?;
    validate_allowed_record_types(header, record_type)?;

    Ok(())
}

fn make_field_error(
    header: &HeaderMap,
    name: &str,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> WarcError {
    let record_id = header
        .get(name::WARC_RECORD_ID)
        .map(|field| field.text.as_str())
        .unwrap_or_default()
        .to_string();

    match source {
        Some(source) => WarcError::InvalidFieldValue {
            name: name.to_string(),
            record_id,
            source: Some(source),
        },
        None => WarcError::MissingRequiredField {
            name: name.to_string(),
            record_id,
        },
    }
}
