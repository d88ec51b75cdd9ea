//! Error types for the gateway.
//!
//! Each layer has its own error enum:
//!
//! - [`ModbusError`] - fieldbus framing, transport and controller exceptions
//! - [`RequestError`] - validation failures of the inbound HTCPCP request
//! - [`ActuatorError`] - failures while driving the controller coil

use std::io;
use thiserror::Error;

/// Result type alias for Modbus operations.
pub type Result<T> = std::result::Result<T, ModbusError>;

/// Errors that can occur during Modbus communication.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Exception response returned by the controller.
    #[error(
        "controller exception: function 0x{function:02X}, code 0x{code:02X} ({})",
        describe(.code)
    )]
    Exception {
        /// Function code of the rejected request (without the exception bit).
        function: u8,
        /// Exception code from the response.
        code: u8,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Invalid response received from the controller.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },

    /// Transaction identifier mismatch between request and response.
    #[error("transaction mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    TransactionMismatch {
        /// Transaction id sent with the request.
        expected: u16,
        /// Transaction id found in the response.
        received: u16,
    },

    /// Unit identifier in the response differs from the addressed device.
    #[error("unit mismatch: expected {expected}, received {received}")]
    UnitMismatch {
        /// Unit id sent with the request.
        expected: u8,
        /// Unit id found in the response.
        received: u8,
    },

    /// Communication timeout.
    #[error("Communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ModbusError {
    /// Creates a new `Exception` error.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ModbusError;
    ///
    /// let err = ModbusError::exception(0x05, 0x02);
    /// ```
    pub fn exception(function: u8, code: u8) -> Self {
        Self::Exception { function, code }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ModbusError;
    ///
    /// let err = ModbusError::invalid_parameter("quantity", "must be greater than 0");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ModbusError;
    ///
    /// let err = ModbusError::invalid_response("response too short");
    /// ```
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `TransactionMismatch` error.
    pub fn transaction_mismatch(expected: u16, received: u16) -> Self {
        Self::TransactionMismatch { expected, received }
    }

    /// Creates a new `UnitMismatch` error.
    pub fn unit_mismatch(expected: u8, received: u8) -> Self {
        Self::UnitMismatch { expected, received }
    }

    /// Returns whether the error happened before any frame reached the controller
    /// or while waiting on the socket, as opposed to a reply the controller sent.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout)
    }
}

/// Returns a human-readable description of a standard Modbus exception code.
///
/// # Example
///
/// ```
/// use htcpcp_gateway::exception_description;
///
/// assert_eq!(exception_description(0x02), "illegal data address");
/// assert_eq!(exception_description(0x7F), "unknown exception");
/// ```
pub fn exception_description(code: u8) -> &'static str {
    match code {
        0x01 => "illegal function",
        0x02 => "illegal data address",
        0x03 => "illegal data value",
        0x04 => "server device failure",
        0x05 => "acknowledge",
        0x06 => "server device busy",
        0x08 => "memory parity error",
        0x0A => "gateway path unavailable",
        0x0B => "gateway target device failed to respond",
        _ => "unknown exception",
    }
}

fn describe(code: &u8) -> &'static str {
    exception_description(*code)
}

/// Reasons an inbound request is rejected.
///
/// None of these are disclosed to the requester; they only reach the logs
/// and the caller of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The header block could not be split into lines.
    #[error("malformed header block")]
    MalformedHeader,

    /// The body block could not be located or split into lines.
    #[error("malformed message body")]
    MalformedBody,

    /// The method line does not carry the BREW method.
    #[error("unsupported method line '{method_line}'")]
    UnsupportedMethod {
        /// The method line as received.
        method_line: String,
    },

    /// `Accept-Additions` is missing or lists additions other than `0`.
    #[error("unsupported Accept-Additions")]
    UnsupportedAcceptAdditions,

    /// `Content-Type` is missing or not `application/coffee-pot-command`.
    #[error("unsupported Content-Type")]
    UnsupportedContentType,

    /// `coffee-message-body` is missing or not `start`/`stop`.
    #[error("unsupported coffee-message-body value")]
    UnsupportedBodyValue,
}

impl RequestError {
    /// Stable snake_case name of the error kind, used as a log field.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::RequestError;
    ///
    /// assert_eq!(RequestError::UnsupportedContentType.kind(), "unsupported_content_type");
    /// ```
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedHeader => "malformed_header",
            Self::MalformedBody => "malformed_body",
            Self::UnsupportedMethod { .. } => "unsupported_method",
            Self::UnsupportedAcceptAdditions => "unsupported_accept_additions",
            Self::UnsupportedContentType => "unsupported_content_type",
            Self::UnsupportedBodyValue => "unsupported_body_value",
        }
    }
}

/// Failures while driving the actuator coil.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The controller could not be reached.
    #[error("controller unreachable: {0}")]
    Unreachable(#[source] ModbusError),

    /// The coil write was rejected or lost.
    #[error("coil write failed: {0}")]
    WriteFailed(#[source] ModbusError),

    /// The read-back after a successful write failed.
    #[error("coil read-back failed: {0}")]
    ReadFailed(#[source] ModbusError),
}

impl ActuatorError {
    /// Stable snake_case name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "actuator_unreachable",
            Self::WriteFailed(_) => "actuator_write_failed",
            Self::ReadFailed(_) => "actuator_read_failed",
        }
    }
}
