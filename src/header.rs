//! Modbus application protocol (MBAP) header.
//!
//! Every Modbus TCP frame starts with a 7-byte MBAP header:
//!
//! | Byte | Field | Description |
//! |------|-------|-------------|
//! | 0-1 | Transaction ID | Echoed by the server, used to match responses |
//! | 2-3 | Protocol ID | Always `0x0000` for Modbus |
//! | 4-5 | Length | Number of following bytes (unit id + PDU) |
//! | 6 | Unit ID | Selects the device behind the endpoint |
//!
//! All multi-byte fields are big-endian.
//!
//! # Example
//!
//! ```
//! use htcpcp_gateway::MbapHeader;
//!
//! // Header for a 5-byte PDU sent to unit 1
//! let header = MbapHeader::new(0x0001, 0x01, 5);
//! let bytes = header.to_bytes();
//! assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01]);
//! ```

use crate::error::{ModbusError, Result};

/// MBAP header size in bytes.
pub const MBAP_HEADER_SIZE: usize = 7;

/// Protocol identifier for Modbus.
pub const MODBUS_PROTOCOL_ID: u16 = 0x0000;

/// Largest PDU a Modbus frame may carry.
pub const MAX_PDU_SIZE: usize = 253;

/// Modbus TCP frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Transaction identifier.
    pub transaction_id: u16,
    /// Protocol identifier (0 for Modbus).
    pub protocol_id: u16,
    /// Byte count of the unit id plus the PDU.
    pub length: u16,
    /// Unit identifier of the addressed device.
    pub unit_id: u8,
}

impl MbapHeader {
    /// Creates a request header for a PDU of `pdu_len` bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::MbapHeader;
    ///
    /// let header = MbapHeader::new(7, 1, 5);
    /// assert_eq!(header.length, 6);
    /// ```
    pub fn new(transaction_id: u16, unit_id: u8, pdu_len: u16) -> Self {
        Self {
            transaction_id,
            protocol_id: MODBUS_PROTOCOL_ID,
            length: pdu_len + 1,
            unit_id,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; MBAP_HEADER_SIZE] {
        let [tid_hi, tid_lo] = self.transaction_id.to_be_bytes();
        let [pid_hi, pid_lo] = self.protocol_id.to_be_bytes();
        let [len_hi, len_lo] = self.length.to_be_bytes();
        [tid_hi, tid_lo, pid_hi, pid_lo, len_hi, len_lo, self.unit_id]
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `ModbusError::InvalidResponse` if the slice is too short, the
    /// protocol id is not Modbus, or the length field is out of range.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::MbapHeader;
    ///
    /// let bytes = [0x00, 0x2A, 0x00, 0x00, 0x00, 0x06, 0x01];
    /// let header = MbapHeader::from_bytes(&bytes).unwrap();
    /// assert_eq!(header.transaction_id, 42);
    /// assert_eq!(header.pdu_len(), 5);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MBAP_HEADER_SIZE {
            return Err(ModbusError::invalid_response(format!(
                "header too short: expected {} bytes, got {}",
                MBAP_HEADER_SIZE,
                data.len()
            )));
        }

        let header = Self {
            transaction_id: u16::from_be_bytes([data[0], data[1]]),
            protocol_id: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            unit_id: data[6],
        };

        if header.protocol_id != MODBUS_PROTOCOL_ID {
            return Err(ModbusError::invalid_response(format!(
                "unexpected protocol id 0x{:04X}",
                header.protocol_id
            )));
        }
        if header.length < 2 || usize::from(header.length) > MAX_PDU_SIZE + 1 {
            return Err(ModbusError::invalid_response(format!(
                "length field out of range: {}",
                header.length
            )));
        }

        Ok(header)
    }

    /// Number of PDU bytes that follow the header.
    pub fn pdu_len(self) -> usize {
        usize::from(self.length).saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_new() {
        let header = MbapHeader::new(0x1234, 0x01, 5);
        assert_eq!(header.transaction_id, 0x1234);
        assert_eq!(header.protocol_id, 0);
        assert_eq!(header.length, 6);
        assert_eq!(header.unit_id, 1);
    }

    #[test]
    fn test_header_to_bytes() {
        let header = MbapHeader::new(0x1234, 0x11, 5);
        assert_eq!(
            header.to_bytes().to_vec(),
            hex::decode("12340000000611").unwrap()
        );
    }

    #[test]
    fn test_header_from_bytes() {
        let bytes = hex::decode("000100000004ff").unwrap();
        let header = MbapHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.transaction_id, 1);
        assert_eq!(header.length, 4);
        assert_eq!(header.unit_id, 0xFF);
        assert_eq!(header.pdu_len(), 3);
    }

    #[test]
    fn test_header_from_bytes_too_short() {
        let result = MbapHeader::from_bytes(&[0x00, 0x01, 0x00]);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_rejects_foreign_protocol() {
        let bytes = hex::decode("000100010006 01".replace(' ', "")).unwrap();
        let err = MbapHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("protocol id"));
    }

    #[test]
    fn test_header_rejects_bad_length() {
        let zero = hex::decode("00010000000101").unwrap();
        assert!(MbapHeader::from_bytes(&zero).is_err());

        let huge = hex::decode("00010000ffff01").unwrap();
        assert!(MbapHeader::from_bytes(&huge).is_err());
    }
}
