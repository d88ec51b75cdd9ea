//! HTCPCP message body parsing.
//!
//! The body follows the blank line of the request. Each field is a
//! `key = value` pair terminated by a space and a newline, exactly as the
//! enterprise-zone client encodes it:
//!
//! ```text
//! coffee-message-body = start \n
//! ```
//!
//! The only field the gateway acts on is `coffee-message-body`, which must be
//! `start` or `stop`.

use std::fmt;

use tracing::debug;

use crate::error::RequestError;
use crate::state::ActuatorState;

/// Line delimiter of the body block.
pub const BODY_LINE_DELIMITER: &str = " \n";

/// Separator between a body field name and its value.
pub const BODY_SEPARATOR: &str = " = ";

/// Name of the field carrying the actuator directive.
pub const COFFEE_MESSAGE_BODY: &str = "coffee-message-body";

/// Body fields in first-seen order; a repeated key overwrites its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBody {
    entries: Vec<(String, Vec<String>)>,
}

impl ParsedBody {
    /// Splits a raw body block into fields.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MalformedBody`] if the block is empty. A final
    /// line without the delimiter is kept as an ordinary field.
    pub fn parse(block: &str) -> Result<Self, RequestError> {
        if block.is_empty() {
            return Err(RequestError::MalformedBody);
        }

        let mut body = Self::default();
        for line in block.split(BODY_LINE_DELIMITER) {
            let (key, values) = match line.split_once(BODY_SEPARATOR) {
                Some((key, value)) => (key, vec![value.to_string()]),
                None => (line, Vec::new()),
            };
            match body.entries.iter_mut().find(|(existing, _)| existing == key) {
                Some((_, slot)) => *slot = values,
                None => body.entries.push((key.to_string(), values)),
            }
        }
        Ok(body)
    }

    /// First value of a field, if present and non-empty.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

/// Normalised on/off command extracted from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorDirective {
    /// Switch the brewer on.
    Start,
    /// Switch the brewer off.
    Stop,
}

impl ActuatorDirective {
    /// Parses the exact, case-sensitive `start`/`stop` tokens.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ActuatorDirective;
    ///
    /// assert_eq!(ActuatorDirective::from_token("start"), Some(ActuatorDirective::Start));
    /// assert_eq!(ActuatorDirective::from_token("Stop"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Coil value the directive maps to.
    pub fn is_on(self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Display for ActuatorDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Parses a body block into a directive without touching any state.
///
/// # Errors
///
/// Returns [`RequestError::MalformedBody`] for an empty block and
/// [`RequestError::UnsupportedBodyValue`] when `coffee-message-body` is absent,
/// empty or not a known token.
pub fn parse(block: &str) -> Result<ActuatorDirective, RequestError> {
    let body = ParsedBody::parse(block)?;
    let value = body.first(COFFEE_MESSAGE_BODY);
    match value.and_then(ActuatorDirective::from_token) {
        Some(directive) => Ok(directive),
        None => {
            debug!(value = ?value, "unsupported coffee-message-body");
            Err(RequestError::UnsupportedBodyValue)
        }
    }
}

/// Parses a body block and, on success, records the directive in `state`.
///
/// On failure `state` is left untouched.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_into(block: &str, state: &mut ActuatorState) -> Result<ActuatorDirective, RequestError> {
    let directive = parse(block)?;
    state.apply(directive);
    debug!(%directive, desired_on = state.desired_on(), "directive applied");
    Ok(directive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_start_sets_state() {
        let mut state = ActuatorState::new();
        let directive = parse_into("coffee-message-body = start \n", &mut state).unwrap();
        assert_eq!(directive, ActuatorDirective::Start);
        assert!(state.desired_on());
    }

    #[test]
    fn test_parse_stop_clears_state() {
        let mut state = ActuatorState::new();
        state.set_desired_on(true);
        let directive = parse_into("coffee-message-body = stop \n", &mut state).unwrap();
        assert_eq!(directive, ActuatorDirective::Stop);
        assert!(!state.desired_on());
    }

    #[test]
    fn test_consecutive_stops_are_idempotent() {
        let mut state = ActuatorState::new();
        for _ in 0..2 {
            assert_eq!(
                parse_into("coffee-message-body = stop \n", &mut state),
                Ok(ActuatorDirective::Stop)
            );
            assert!(!state.desired_on());
        }
    }

    #[rstest]
    #[case::pause("coffee-message-body = pause \n")]
    #[case::brew("coffee-message-body = brew \n")]
    #[case::uppercase("coffee-message-body = START \n")]
    #[case::empty_value("coffee-message-body =  \n")]
    #[case::no_value("coffee-message-body \n")]
    #[case::missing_field("milk = whole \n")]
    #[case::bare_newline("coffee-message-body = start\n")]
    fn test_rejects_value_and_keeps_state(#[case] block: &str) {
        let mut state = ActuatorState::new();
        state.set_desired_on(true);
        assert_eq!(parse_into(block, &mut state), Err(RequestError::UnsupportedBodyValue));
        assert!(state.desired_on());
    }

    #[test]
    fn test_empty_body_is_malformed() {
        let mut state = ActuatorState::new();
        assert_eq!(parse_into("", &mut state), Err(RequestError::MalformedBody));
        assert!(!state.desired_on());
    }

    #[rstest]
    #[case::start("coffee-message-body = start", ActuatorDirective::Start)]
    #[case::stop("coffee-message-body = stop", ActuatorDirective::Stop)]
    #[case::after_field("milk = whole \ncoffee-message-body = start", ActuatorDirective::Start)]
    fn test_unterminated_last_line(#[case] block: &str, #[case] expected: ActuatorDirective) {
        let mut state = ActuatorState::new();
        assert_eq!(parse_into(block, &mut state), Ok(expected));
        assert_eq!(state.desired_on(), expected.is_on());
    }

    #[test]
    fn test_multiple_fields_last_wins() {
        let body = "milk = whole \ncoffee-message-body = start \ncoffee-message-body = stop \n";
        assert_eq!(parse(body), Ok(ActuatorDirective::Stop));
    }

    #[test]
    fn test_parsed_body_fields() {
        let body = ParsedBody::parse("a = 1 \nb = x = y \nflag \n").unwrap();
        assert_eq!(body.first("a"), Some("1"));
        assert_eq!(body.first("b"), Some("x = y"));
        assert_eq!(body.first("flag"), None);
    }

    #[test]
    fn test_directive_display() {
        assert_eq!(ActuatorDirective::Start.to_string(), "start");
        assert!(!ActuatorDirective::Stop.is_on());
    }
}
