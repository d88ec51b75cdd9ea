//! Modbus response parsing and validation.
//!
//! # Response Structure
//!
//! | Component | Size | Description |
//! |-----------|------|-------------|
//! | Header | 7 bytes | MBAP header, transaction id echoed from the request |
//! | Function | 1 byte | Request function code, `| 0x80` on exception |
//! | Data | Variable | Function-specific payload, or 1 exception code byte |
//!
//! Write Single Coil echoes the address and output value of the request.
//! Read Coils returns a byte count followed by the packed coil states.
//!
//! # Example
//!
//! ```
//! use htcpcp_gateway::ModbusResponse;
//!
//! // Read Coils response: 1 byte of coil data, first coil ON
//! let bytes = [
//!     0x00, 0x02, 0x00, 0x00, 0x00, 0x04, 0x01, // header
//!     0x01, // function
//!     0x01, 0x01, // byte count, coils
//! ];
//!
//! let response = ModbusResponse::from_bytes(&bytes).unwrap();
//! assert!(response.is_success());
//!
//! let coils = response.to_coils(8).unwrap();
//! assert!(coils[0]);
//! ```

use crate::command::{COIL_OFF, COIL_ON, EXCEPTION_FLAG, FC_READ_COILS, FC_WRITE_SINGLE_COIL};
use crate::error::{ModbusError, Result};
use crate::header::{MbapHeader, MBAP_HEADER_SIZE};
use crate::utils::{coil_byte_count, unpack_coils};

/// Minimum response size: header (7) + function (1) + one data byte.
pub const MIN_RESPONSE_SIZE: usize = MBAP_HEADER_SIZE + 2;

/// Parsed Modbus response.
#[derive(Debug, Clone)]
pub struct ModbusResponse {
    /// Response header.
    pub header: MbapHeader,
    /// Function code, with the exception flag when the request was rejected.
    pub function: u8,
    /// Response data following the function code.
    pub data: Vec<u8>,
}

impl ModbusResponse {
    /// Parses a Modbus response from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is too short, the header is invalid,
    /// or the header length disagrees with the bytes received.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_RESPONSE_SIZE {
            return Err(ModbusError::invalid_response(format!(
                "response too short: expected at least {} bytes, got {}",
                MIN_RESPONSE_SIZE,
                data.len()
            )));
        }

        let header = MbapHeader::from_bytes(&data[..MBAP_HEADER_SIZE])?;
        let pdu = &data[MBAP_HEADER_SIZE..];
        if pdu.len() != header.pdu_len() {
            return Err(ModbusError::invalid_response(format!(
                "length mismatch: header announces {} PDU bytes, got {}",
                header.pdu_len(),
                pdu.len()
            )));
        }

        Ok(Self {
            header,
            function: pdu[0],
            data: pdu[1..].to_vec(),
        })
    }

    /// Returns whether the response is a normal (non-exception) reply.
    pub fn is_success(&self) -> bool {
        self.function & EXCEPTION_FLAG == 0
    }

    /// Validates the response and returns an error if it is an exception.
    ///
    /// # Errors
    ///
    /// Returns `ModbusError::Exception` carrying the exception code.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ModbusResponse;
    ///
    /// let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, 0x85, 0x02];
    /// let response = ModbusResponse::from_bytes(&bytes).unwrap();
    /// assert!(response.check_exception().is_err());
    /// ```
    pub fn check_exception(&self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        let code = self.data.first().copied().unwrap_or(0);
        Err(ModbusError::exception(self.function & !EXCEPTION_FLAG, code))
    }

    /// Validates that the response answers the given transaction.
    ///
    /// # Errors
    ///
    /// Returns `ModbusError::TransactionMismatch` if the id differs.
    pub fn check_transaction(&self, expected: u16) -> Result<()> {
        if self.header.transaction_id == expected {
            Ok(())
        } else {
            Err(ModbusError::transaction_mismatch(
                expected,
                self.header.transaction_id,
            ))
        }
    }

    /// Validates that the response comes from the addressed unit.
    ///
    /// # Errors
    ///
    /// Returns `ModbusError::UnitMismatch` if the unit id differs.
    pub fn check_unit(&self, expected: u8) -> Result<()> {
        if self.header.unit_id == expected {
            Ok(())
        } else {
            Err(ModbusError::unit_mismatch(expected, self.header.unit_id))
        }
    }

    /// Validates a Write Single Coil echo against the request.
    ///
    /// # Errors
    ///
    /// Returns `ModbusError::InvalidResponse` if the function, address or
    /// value in the echo differs from what was written.
    pub fn check_write_echo(&self, address: u16, value: bool) -> Result<()> {
        self.check_function(FC_WRITE_SINGLE_COIL)?;
        if self.data.len() != 4 {
            return Err(ModbusError::invalid_response(format!(
                "write echo must be 4 bytes, got {}",
                self.data.len()
            )));
        }

        let echoed_address = u16::from_be_bytes([self.data[0], self.data[1]]);
        let echoed_value = u16::from_be_bytes([self.data[2], self.data[3]]);
        let expected_value = if value { COIL_ON } else { COIL_OFF };
        if echoed_address != address || echoed_value != expected_value {
            return Err(ModbusError::invalid_response(format!(
                "write echo mismatch: address {echoed_address}, value 0x{echoed_value:04X}"
            )));
        }
        Ok(())
    }

    /// Converts a Read Coils response to `count` coil states.
    ///
    /// # Errors
    ///
    /// Returns an error if the function is not Read Coils or the byte count
    /// does not match `count`.
    pub fn to_coils(&self, count: u16) -> Result<Vec<bool>> {
        self.check_function(FC_READ_COILS)?;
        let expected = coil_byte_count(usize::from(count));
        let (byte_count, packed) = match self.data.split_first() {
            Some((byte_count, packed)) => (usize::from(*byte_count), packed),
            None => return Err(ModbusError::invalid_response("no data for coil conversion")),
        };
        if byte_count != expected || packed.len() != expected {
            return Err(ModbusError::invalid_response(format!(
                "coil byte count mismatch: expected {}, announced {}, got {}",
                expected,
                byte_count,
                packed.len()
            )));
        }

        Ok(unpack_coils(packed, usize::from(count)))
    }

    fn check_function(&self, expected: u8) -> Result<()> {
        if self.function == expected {
            Ok(())
        } else {
            Err(ModbusError::invalid_response(format!(
                "unexpected function 0x{:02X}, expected 0x{:02X}",
                self.function, expected
            )))
        }
    }
}
