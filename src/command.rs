//! Modbus request structures and serialization.
//!
//! Each command carries its own MBAP header and serializes itself to a
//! complete Modbus TCP frame. Only the two coil functions used by the gateway
//! are implemented:
//!
//! - [`WriteSingleCoilCommand`] - function `0x05`
//! - [`ReadCoilsCommand`] - function `0x01`
//!
//! # Example
//!
//! ```
//! use htcpcp_gateway::{ReadCoilsCommand, WriteSingleCoilCommand};
//!
//! let write = WriteSingleCoilCommand::new(0x0001, 0x01, 8225, true);
//! assert_eq!(write.to_bytes().len(), 12);
//!
//! let read = ReadCoilsCommand::new(0x0002, 0x01, 8225, 8).unwrap();
//! assert_eq!(read.to_bytes().len(), 12);
//! ```

use crate::error::{ModbusError, Result};
use crate::header::{MbapHeader, MBAP_HEADER_SIZE};

/// Read Coils function code.
pub(crate) const FC_READ_COILS: u8 = 0x01;
/// Write Single Coil function code.
pub(crate) const FC_WRITE_SINGLE_COIL: u8 = 0x05;
/// Bit set on the function code of an exception response.
pub(crate) const EXCEPTION_FLAG: u8 = 0x80;

/// Output value encoding ON for Write Single Coil.
pub const COIL_ON: u16 = 0xFF00;
/// Output value encoding OFF for Write Single Coil.
pub const COIL_OFF: u16 = 0x0000;

/// Maximum number of coils in a single Read Coils request.
pub const MAX_COILS_PER_READ: u16 = 2000;

/// Both coil requests carry a 5-byte PDU: function, address, value/quantity.
const COIL_PDU_LEN: u16 = 5;

/// Command for forcing a single coil ON or OFF.
#[derive(Debug, Clone)]
pub struct WriteSingleCoilCommand {
    header: MbapHeader,
    address: u16,
    value: bool,
}

impl WriteSingleCoilCommand {
    /// Creates a new write single coil command.
    ///
    /// # Arguments
    ///
    /// * `transaction_id` - Transaction id for request/response matching
    /// * `unit_id` - Unit identifier of the controller
    /// * `address` - Coil address
    /// * `value` - Desired coil state
    pub fn new(transaction_id: u16, unit_id: u8, address: u16, value: bool) -> Self {
        Self {
            header: MbapHeader::new(transaction_id, unit_id, COIL_PDU_LEN),
            address,
            value,
        }
    }

    /// Returns the transaction id.
    pub fn transaction_id(&self) -> u16 {
        self.header.transaction_id
    }

    /// Returns the coil address.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Returns the output value field as sent on the wire.
    pub fn output_value(&self) -> u16 {
        if self.value {
            COIL_ON
        } else {
            COIL_OFF
        }
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MBAP_HEADER_SIZE + usize::from(COIL_PDU_LEN));
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(FC_WRITE_SINGLE_COIL);
        bytes.extend_from_slice(&self.address.to_be_bytes());
        bytes.extend_from_slice(&self.output_value().to_be_bytes());
        bytes
    }
}

/// Command for reading a run of coils.
#[derive(Debug, Clone)]
pub struct ReadCoilsCommand {
    header: MbapHeader,
    address: u16,
    quantity: u16,
}

impl ReadCoilsCommand {
    /// Creates a new read coils command.
    ///
    /// # Arguments
    ///
    /// * `transaction_id` - Transaction id for request/response matching
    /// * `unit_id` - Unit identifier of the controller
    /// * `address` - First coil address
    /// * `quantity` - Number of coils to read (1-2000)
    ///
    /// # Errors
    ///
    /// Returns an error if quantity is 0, exceeds [`MAX_COILS_PER_READ`], or
    /// runs past the end of the coil address space.
    pub fn new(transaction_id: u16, unit_id: u8, address: u16, quantity: u16) -> Result<Self> {
        if quantity == 0 {
            return Err(ModbusError::invalid_parameter(
                "quantity",
                "must be greater than 0",
            ));
        }
        if quantity > MAX_COILS_PER_READ {
            return Err(ModbusError::invalid_parameter(
                "quantity",
                format!("must not exceed {}", MAX_COILS_PER_READ),
            ));
        }
        if u32::from(address) + u32::from(quantity) > 0x1_0000 {
            return Err(ModbusError::invalid_parameter(
                "quantity",
                "range runs past the last coil address",
            ));
        }

        Ok(Self {
            header: MbapHeader::new(transaction_id, unit_id, COIL_PDU_LEN),
            address,
            quantity,
        })
    }

    /// Returns the transaction id.
    pub fn transaction_id(&self) -> u16 {
        self.header.transaction_id
    }

    /// Returns the number of coils requested.
    pub fn quantity(&self) -> u16 {
        self.quantity
    }

    /// Serializes the command to bytes for transmission.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(MBAP_HEADER_SIZE + usize::from(COIL_PDU_LEN));
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.push(FC_READ_COILS);
        bytes.extend_from_slice(&self.address.to_be_bytes());
        bytes.extend_from_slice(&self.quantity.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_single_coil_on() {
        let cmd = WriteSingleCoilCommand::new(0x0001, 0x01, 8225, true);
        assert_eq!(cmd.transaction_id(), 1);
        assert_eq!(cmd.address(), 8225);
        assert_eq!(cmd.output_value(), COIL_ON);
        // 8225 = 0x2021
        assert_eq!(
            cmd.to_bytes(),
            hex::decode("000100000006010520 21ff00".replace(' ', "")).unwrap()
        );
    }

    #[test]
    fn test_write_single_coil_off() {
        let cmd = WriteSingleCoilCommand::new(0x00FF, 0x02, 0x0010, false);
        assert_eq!(
            cmd.to_bytes(),
            hex::decode("00ff000000060205 0010 0000".replace(' ', "")).unwrap()
        );
    }

    #[test]
    fn test_read_coils_bytes() {
        let cmd = ReadCoilsCommand::new(0x0002, 0x01, 8225, 8).unwrap();
        assert_eq!(cmd.quantity(), 8);
        assert_eq!(
            cmd.to_bytes(),
            hex::decode("0002000000060101 2021 0008".replace(' ', "")).unwrap()
        );
    }

    #[test]
    fn test_read_coils_zero_quantity() {
        let err = ReadCoilsCommand::new(1, 1, 0, 0).unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn test_read_coils_quantity_limit() {
        assert!(ReadCoilsCommand::new(1, 1, 0, MAX_COILS_PER_READ).is_ok());
        assert!(ReadCoilsCommand::new(1, 1, 0, MAX_COILS_PER_READ + 1).is_err());
    }

    #[test]
    fn test_read_coils_address_overflow() {
        assert!(ReadCoilsCommand::new(1, 1, 0xFFF8, 8).is_ok());
        assert!(ReadCoilsCommand::new(1, 1, 0xFFF9, 8).is_err());
    }
}
