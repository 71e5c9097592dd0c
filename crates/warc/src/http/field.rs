//! Header field values parsers.
use std::str::FromStr;

use crate::{error::ParseError, header::HeaderMap, nomutil::NomParseError};

/// Parse a field value formatted as a "parameter".
///
/// Example input: `name=value` or `name="value inside quoted-string"`.
pub fn parse_parameter(input: &[u8]) -> Result<(String, String), ParseError> {
    super::pc::parse_parameter(input)
        .map_err(|error| ParseError(NomParseError::from_nom(input, &error)))
}

/// Parse a field value formatted as a "quoted-string".
///
/// Example input: `"Hello world!"`.
pub fn parse_quoted_string(input: &[u8]) -> Result<String, ParseError> {
    super::pc::parse_quoted_string(input)
        .map_err(|error| ParseError(NomParseError::from_nom(input, &error)))
}

/// Parse a field value formatted as a comma separated list.
///
/// Example input: `abc, "Hello world!"`.
pub fn parse_comma_list(input: &[u8]) -> Result<Vec<String>, ParseError> {
    super::pc::parse_comma_list(input)
        .map_err(|error| ParseError(NomParseError::from_nom(input, &error)))
}

/// A parsed `Content-Type` style media type: `type/subtype; param=value; ...`.
///
/// Type, subtype, and parameter names are lowercased; parameter values keep
/// their original case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub type_: String,
    pub subtype: String,
    pub parameters: Vec<(String, String)>,
}

impl MediaType {
    /// Returns `type/subtype`, without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Returns the value of a parameter, case-insensitively by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (type_, subtype, parameters) = super::pc::parse_media_type(input.as_bytes())
            .map_err(|error| ParseError(NomParseError::from_nom(input.as_bytes(), &error)))?;

        Ok(MediaType {
            type_,
            subtype,
            parameters,
        })
    }
}

/// Extension trait for header map for HTTP values.
pub trait HeaderMapExt {
    /// Returns values formatted as comma separated list or duplicate names.
    fn get_comma_list<N: Into<String>>(&self, name: N) -> Vec<String>;
}

impl HeaderMapExt for HeaderMap {
    fn get_comma_list<N: Into<String>>(&self, name: N) -> Vec<String> {
        let mut list = Vec::new();

        for field_value in self.get_all(name) {
            let values = match parse_comma_list(field_value.text.as_bytes()) {
                Ok(values) => values,
                Err(error) => {
                    tracing::trace!(?error, "get_comma_list");
                    Vec::new()
                }
            };

            list.extend_from_slice(&values);
        }

        list.iter_mut().for_each(|item| item.make_ascii_lowercase());

        list
    }
}
