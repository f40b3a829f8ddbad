//! Representation format negotiation
//!
//! The last `.` of a path separates the resource from its representation
//! suffix: `/rest/block/<hash>.json` → (`/rest/block/<hash>`, Json).

use crate::rpc::errors::RestError;

/// Requested representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetFormat {
    Undefined,
    Binary,
    Hex,
    Json,
}

const FORMAT_NAMES: [(RetFormat, &str); 4] = [
    (RetFormat::Undefined, ""),
    (RetFormat::Binary, "bin"),
    (RetFormat::Hex, "hex"),
    (RetFormat::Json, "json"),
];

/// Formats served by endpoints with a binary encoding
pub const ALL_FORMATS: &[RetFormat] = &[RetFormat::Binary, RetFormat::Hex, RetFormat::Json];

/// Formats served by JSON-only endpoints
pub const JSON_ONLY: &[RetFormat] = &[RetFormat::Json];

impl RetFormat {
    /// Suffix used in request paths
    pub fn name(self) -> &'static str {
        FORMAT_NAMES
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }

    fn from_suffix(suffix: &str) -> Self {
        FORMAT_NAMES
            .iter()
            .find(|(_, name)| *name == suffix)
            .map(|(format, _)| *format)
            .unwrap_or(RetFormat::Undefined)
    }
}

/// Split `path` into its base and requested format
pub fn parse_data_format(path: &str) -> (&str, RetFormat) {
    match path.rsplit_once('.') {
        Some((base, suffix)) => (base, RetFormat::from_suffix(suffix)),
        None => (path, RetFormat::Undefined),
    }
}

/// Comma-separated list of format suffixes, e.g. `bin, hex, json`
pub fn available_formats(supported: &[RetFormat]) -> String {
    supported
        .iter()
        .map(|format| format.name())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Negotiate the format for a handler serving `supported`.
///
/// Returns the base path, or `UnsupportedFormat` listing what the handler serves.
pub fn negotiate<'a>(path: &'a str, supported: &[RetFormat]) -> Result<(&'a str, RetFormat), RestError> {
    let (base, format) = parse_data_format(path);
    if format == RetFormat::Undefined || !supported.contains(&format) {
        return Err(RestError::UnsupportedFormat(available_formats(supported)));
    }
    Ok((base, format))
}
