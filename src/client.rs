//! Modbus TCP client for the brewing controller.
//!
//! This module provides the [`Client`] struct, the interface the actuator
//! driver uses to talk to the controller.
//!
//! # Overview
//!
//! The client handles:
//! - Command construction and serialization
//! - Request/response correlation via the MBAP transaction id
//! - Response parsing and exception checking
//!
//! Each call produces exactly 1 request and 1 response. No automatic retries,
//! caching, or reconnection.
//!
//! # Example
//!
//! ```no_run
//! use htcpcp_gateway::{Client, ClientConfig};
//! use std::net::Ipv4Addr;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(172, 29, 101, 190), 0x01);
//! let mut client = Client::connect(&config)?;
//!
//! client.write_single_coil(8225, true)?;
//! let coils = client.read_coils(8225, 8)?;
//! # Ok::<(), htcpcp_gateway::ModbusError>(())
//! ```
//!
//! # Thread Safety
//!
//! The `Client` owns a blocking TCP stream and takes `&mut self` for every
//! request; it must not be shared between concurrent requests.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use crate::command::{ReadCoilsCommand, WriteSingleCoilCommand};
use crate::error::Result;
use crate::response::ModbusResponse;
use crate::transport::{TcpTransport, DEFAULT_MODBUS_PORT, DEFAULT_TIMEOUT};

/// Configuration for connecting to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Controller socket address.
    pub controller_addr: SocketAddr,
    /// Unit identifier of the controller.
    pub unit_id: u8,
    /// Connect/read/write timeout, `None` to block indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a new client configuration on the default port and timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ClientConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(172, 29, 101, 190), 1);
    /// assert_eq!(config.controller_addr.port(), 502);
    /// ```
    pub fn new(controller_ip: impl Into<IpAddr>, unit_id: u8) -> Self {
        Self {
            controller_addr: SocketAddr::new(controller_ip.into(), DEFAULT_MODBUS_PORT),
            unit_id,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Sets a custom controller port (default is 502).
    pub fn with_port(mut self, port: u16) -> Self {
        self.controller_addr.set_port(port);
        self
    }

    /// Sets a custom timeout (default is 3 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use htcpcp_gateway::ClientConfig;
    /// use std::net::Ipv4Addr;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::LOCALHOST, 1)
    ///     .with_timeout(Some(Duration::from_secs(5)));
    /// ```
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Modbus TCP client bound to one controller connection.
pub struct Client {
    transport: TcpTransport,
    unit_id: u8,
    transaction_counter: AtomicU16,
}

impl Client {
    /// Connects to the controller described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection cannot be established.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = TcpTransport::connect(config.controller_addr, config.timeout)?;

        Ok(Self {
            transport,
            unit_id: config.unit_id,
            transaction_counter: AtomicU16::new(1),
        })
    }

    /// Generates the next transaction id.
    fn next_transaction_id(&self) -> u16 {
        self.transaction_counter.fetch_add(1, Ordering::Relaxed)
    }

    fn send_receive(&mut self, frame: &[u8], transaction_id: u16) -> Result<ModbusResponse> {
        let response_bytes = self.transport.send_receive(frame)?;
        let response = ModbusResponse::from_bytes(&response_bytes)?;
        response.check_transaction(transaction_id)?;
        response.check_unit(self.unit_id)?;
        response.check_exception()?;
        Ok(response)
    }

    /// Writes a single coil.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication fails
    /// - The controller answers with an exception
    /// - The echo does not match the request
    pub fn write_single_coil(&mut self, address: u16, value: bool) -> Result<()> {
        let transaction_id = self.next_transaction_id();
        let cmd = WriteSingleCoilCommand::new(transaction_id, self.unit_id, address, value);

        let response = self.send_receive(&cmd.to_bytes(), transaction_id)?;
        response.check_write_echo(address, value)
    }

    /// Reads `quantity` coils starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Quantity is 0 or > 2000
    /// - Communication fails
    /// - The controller answers with an exception
    pub fn read_coils(&mut self, address: u16, quantity: u16) -> Result<Vec<bool>> {
        let transaction_id = self.next_transaction_id();
        let cmd = ReadCoilsCommand::new(transaction_id, self.unit_id, address, quantity)?;

        let response = self.send_receive(&cmd.to_bytes(), transaction_id)?;
        response.to_coils(cmd.quantity())
    }

    /// Returns the connected controller address.
    pub fn controller_addr(&self) -> SocketAddr {
        self.transport.remote_addr()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("unit_id", &self.unit_id)
            .finish()
    }
}
