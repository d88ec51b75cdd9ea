//! HTCPCP header block parsing and validation.
//!
//! The header block is the part of a request before the blank line:
//!
//! ```text
//! HTTP/1.1 BREW\r\n
//! Accept-Additions: 0\r\n
//! Content-Type: application/coffee-pot-command
//! ```
//!
//! Parsing happens in two steps. [`ParsedHeaders::parse`] splits the block into
//! an ordered key/value table without judging any value. [`validate`] then
//! checks the method line and every entry of [`HEADER_SCHEMA`] in one pass and
//! produces a typed [`ValidatedRequest`].
//!
//! # Example
//!
//! ```
//! use htcpcp_gateway::request::{self, BrewMethod};
//!
//! let block = "HTTP/1.1 BREW\r\nAccept-Additions: 0\r\nContent-Type: application/coffee-pot-command";
//! let request = request::parse(block).unwrap();
//! assert_eq!(request.method, BrewMethod::Brew);
//! assert!(request.accepts_additions.contains(&0));
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::RequestError;

/// Line terminator of the header block.
pub const HEADER_LINE_TERMINATOR: &str = "\r\n";

/// Separator between a header name and its value.
pub const HEADER_SEPARATOR: &str = ": ";

/// The only supported content type.
pub const COFFEE_POT_COMMAND: &str = "application/coffee-pot-command";

/// Name of the header listing requested additions.
pub const ACCEPT_ADDITIONS: &str = "Accept-Additions";

/// Name of the content type header.
pub const CONTENT_TYPE: &str = "Content-Type";

/// A required header and the single value it must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    /// Header name, matched case-sensitively.
    pub name: &'static str,
    /// Exact required first value.
    pub expected: &'static str,
    /// Error reported when the header is absent or carries another value.
    pub error: RequestError,
}

/// Required headers, checked in order after the method line.
pub const HEADER_SCHEMA: [HeaderRule; 2] = [
    HeaderRule {
        name: ACCEPT_ADDITIONS,
        expected: "0",
        error: RequestError::UnsupportedAcceptAdditions,
    },
    HeaderRule {
        name: CONTENT_TYPE,
        expected: COFFEE_POT_COMMAND,
        error: RequestError::UnsupportedContentType,
    },
];

/// Ordered header table.
///
/// Keys keep their first-seen position; a repeated key overwrites the values of
/// the earlier entry. Lines without a `": "` separator become keys with no
/// values, which is how the method line is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl ParsedHeaders {
    /// Splits a raw header block into the ordered table.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MalformedHeader`] if the block is empty or has
    /// no line terminator at all.
    pub fn parse(block: &str) -> Result<Self, RequestError> {
        if block.is_empty() || !block.contains(HEADER_LINE_TERMINATOR) {
            return Err(RequestError::MalformedHeader);
        }

        let mut headers = Self::default();
        for line in block.split(HEADER_LINE_TERMINATOR) {
            match line.split_once(HEADER_SEPARATOR) {
                Some((key, value)) => headers.insert(key, vec![value.to_string()]),
                None => headers.insert(line, Vec::new()),
            }
        }
        Ok(headers)
    }

    fn insert(&mut self, key: &str, values: Vec<String>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = values,
            None => self.entries.push((key.to_string(), values)),
        }
    }

    /// The first key inserted, which must be the method line.
    pub fn method_line(&self) -> Option<&str> {
        self.entries.first().map(|(key, _)| key.as_str())
    }

    /// Values of a header, `None` if the header is absent.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value of a header, if present and non-empty.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Methods the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewMethod {
    /// RFC 2324 BREW.
    Brew,
}

impl BrewMethod {
    /// Method token on the wire.
    pub fn token(self) -> &'static str {
        match self {
            Self::Brew => "BREW",
        }
    }

    /// Parses a method line of the form `<version> <method> ...`.
    ///
    /// Anything other than `BREW` as the second space-separated token is
    /// rejected, including the deprecated `POST`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::UnsupportedMethod`].
    pub fn from_method_line(line: &str) -> Result<Self, RequestError> {
        match line.split(' ').nth(1) {
            Some(token) if token == Self::Brew.token() => Ok(Self::Brew),
            _ => Err(RequestError::UnsupportedMethod {
                method_line: line.to_string(),
            }),
        }
    }
}

/// A header block that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Requested method.
    pub method: BrewMethod,
    /// Addition codes listed in `Accept-Additions`.
    pub accepts_additions: BTreeSet<u32>,
    /// Content type of the body.
    pub content_type: String,
}

/// Validates a parsed header table against the method rule and [`HEADER_SCHEMA`].
///
/// Every check runs and its result is logged; the first failure is returned.
///
/// # Errors
///
/// Returns the first failing [`RequestError`].
pub fn validate(headers: &ParsedHeaders) -> Result<ValidatedRequest, RequestError> {
    let method_line = headers.method_line().unwrap_or_default();
    let method = BrewMethod::from_method_line(method_line);
    match &method {
        Ok(method) => debug!(method = method.token(), "method accepted"),
        Err(err) => debug!(kind = err.kind(), method_line, "method rejected"),
    }

    let mut first_failure = method.as_ref().err().cloned();
    for rule in &HEADER_SCHEMA {
        let value = headers.first(rule.name);
        if value == Some(rule.expected) {
            debug!(header = rule.name, "header accepted");
            continue;
        }
        let err = rule.error.clone();
        debug!(header = rule.name, value = ?value, kind = err.kind(), "header rejected");
        first_failure.get_or_insert(err);
    }

    if let Some(err) = first_failure {
        return Err(err);
    }

    Ok(ValidatedRequest {
        method: method?,
        accepts_additions: parse_additions(headers.first(ACCEPT_ADDITIONS).unwrap_or_default()),
        content_type: headers
            .first(CONTENT_TYPE)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Parses a comma-separated list of addition codes, skipping non-numeric items.
fn parse_additions(value: &str) -> BTreeSet<u32> {
    value
        .split(',')
        .filter_map(|item| item.trim().parse().ok())
        .collect()
}

/// Splits and validates a raw header block.
///
/// # Errors
///
/// Returns [`RequestError::MalformedHeader`] for an unsplittable block, or the
/// first validation failure.
pub fn parse(block: &str) -> Result<ValidatedRequest, RequestError> {
    let headers = ParsedHeaders::parse(block)?;
    validate(&headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VALID: &str =
        "HTTP/1.1 BREW\r\nAccept-Additions: 0\r\nContent-Type: application/coffee-pot-command";

    #[test]
    fn test_parse_keeps_order_and_values() {
        let headers = ParsedHeaders::parse(VALID).unwrap();
        let keys: Vec<&str> = headers.keys().collect();
        assert_eq!(keys, ["HTTP/1.1 BREW", "Accept-Additions", "Content-Type"]);
        assert_eq!(headers.method_line(), Some("HTTP/1.1 BREW"));
        assert_eq!(headers.get("HTTP/1.1 BREW"), Some(&[][..]));
        assert_eq!(headers.first(ACCEPT_ADDITIONS), Some("0"));
    }

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let headers =
            ParsedHeaders::parse("HTTP/1.1 BREW\r\nX: 1\r\nY: 2\r\nX: 3").unwrap();
        let keys: Vec<&str> = headers.keys().collect();
        assert_eq!(keys, ["HTTP/1.1 BREW", "X", "Y"]);
        assert_eq!(headers.first("X"), Some("3"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_value_split_once() {
        let headers = ParsedHeaders::parse("HTTP/1.1 BREW\r\nNote: a: b").unwrap();
        assert_eq!(headers.first("Note"), Some("a: b"));
    }

    #[test]
    fn test_header_keys_are_case_sensitive() {
        let block = "HTTP/1.1 BREW\r\naccept-additions: 0\r\nContent-Type: application/coffee-pot-command";
        assert_eq!(parse(block), Err(RequestError::UnsupportedAcceptAdditions));
    }

    #[rstest]
    #[case::empty("")]
    #[case::single_line("HTTP/1.1 BREW")]
    fn test_malformed_header(#[case] block: &str) {
        assert_eq!(parse(block), Err(RequestError::MalformedHeader));
    }

    #[test]
    fn test_accepts_valid_block() {
        let request = parse(VALID).unwrap();
        assert_eq!(request.method, BrewMethod::Brew);
        assert_eq!(request.accepts_additions, BTreeSet::from([0]));
        assert_eq!(request.content_type, COFFEE_POT_COMMAND);
    }

    #[rstest]
    #[case::post("HTTP/1.1 POST")]
    #[case::lowercase("HTTP/1.1 brew")]
    #[case::no_method("HTTP/1.1")]
    #[case::get("HTTP/1.1 GET")]
    fn test_rejects_method(#[case] method_line: &str) {
        let block = VALID.replacen("HTTP/1.1 BREW", method_line, 1);
        assert!(matches!(
            parse(&block),
            Err(RequestError::UnsupportedMethod { .. })
        ));
    }

    #[rstest]
    #[case::other_addition("Accept-Additions: 1\r\n")]
    #[case::list("Accept-Additions: 0, 1\r\n")]
    #[case::no_value("Accept-Additions\r\n")]
    #[case::missing("")]
    fn test_rejects_accept_additions(#[case] line: &str) {
        let block = format!(
            "HTTP/1.1 BREW\r\n{line}Content-Type: application/coffee-pot-command"
        );
        assert_eq!(parse(&block), Err(RequestError::UnsupportedAcceptAdditions));
    }

    #[rstest]
    #[case::plain_text("Content-Type: text/plain")]
    #[case::parameter("Content-Type: application/coffee-pot-command; charset=utf-8")]
    #[case::missing("X-Other: 1")]
    fn test_rejects_content_type(#[case] line: &str) {
        let block = format!("HTTP/1.1 BREW\r\nAccept-Additions: 0\r\n{line}");
        assert_eq!(parse(&block), Err(RequestError::UnsupportedContentType));
    }

    #[test]
    fn test_reports_first_failure() {
        let block = "HTTP/1.1 POST\r\nAccept-Additions: 2\r\nContent-Type: text/plain";
        assert!(matches!(
            parse(block),
            Err(RequestError::UnsupportedMethod { .. })
        ));

        let block = "HTTP/1.1 BREW\r\nAccept-Additions: 2\r\nContent-Type: text/plain";
        assert_eq!(parse(block), Err(RequestError::UnsupportedAcceptAdditions));
    }

    #[test]
    fn test_parse_additions() {
        assert_eq!(parse_additions("0"), BTreeSet::from([0]));
        assert_eq!(parse_additions("0, 3,x"), BTreeSet::from([0, 3]));
        assert!(parse_additions("").is_empty());
    }
}
