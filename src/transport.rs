//! TCP transport layer for Modbus communication.
//!
//! This module provides the [`TcpTransport`] struct which handles low-level
//! TCP communication with the controller. The transport only knows about
//! sockets and MBAP framing, never about function codes.
//!
//! # Design
//!
//! - **Synchronous** - Blocking send/receive, optional timeout
//! - **One frame per request** - reads exactly the bytes the MBAP length announces
//! - **Simple** - One stream, one remote address, no connection pooling
//!
//! # Constants
//!
//! - [`DEFAULT_MODBUS_PORT`] - Default Modbus TCP port (502)
//! - [`DEFAULT_TIMEOUT`] - Default timeout (3 seconds)

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{ModbusError, Result};
use crate::header::{MbapHeader, MBAP_HEADER_SIZE};

/// Default Modbus TCP port.
pub const DEFAULT_MODBUS_PORT: u16 = 502;

/// Default timeout for connect, read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// TCP transport for Modbus communication.
pub struct TcpTransport {
    stream: TcpStream,
    remote_addr: SocketAddr,
}

impl TcpTransport {
    /// Opens a connection to the controller.
    ///
    /// `None` as timeout blocks indefinitely on connect, read and write.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or configured.
    pub fn connect(remote_addr: SocketAddr, timeout: Option<Duration>) -> Result<Self> {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&remote_addr, timeout).map_err(map_io)?,
            None => TcpStream::connect(remote_addr)?,
        };
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            remote_addr,
        })
    }

    /// Sends a request frame and receives the complete response frame.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The send fails
    /// - The receive times out (`ModbusError::Timeout`)
    /// - The peer closes the connection mid-frame
    /// - The response header is invalid
    pub fn send_receive(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.stream.write_all(data).map_err(map_io)?;

        let mut frame = vec![0u8; MBAP_HEADER_SIZE];
        self.stream.read_exact(&mut frame).map_err(map_io)?;
        let header = MbapHeader::from_bytes(&frame)?;

        frame.resize(MBAP_HEADER_SIZE + header.pdu_len(), 0);
        self.stream
            .read_exact(&mut frame[MBAP_HEADER_SIZE..])
            .map_err(map_io)?;
        Ok(frame)
    }

    /// Returns the remote controller address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.stream.local_addr().ok())
            .finish()
    }
}

fn map_io(e: io::Error) -> ModbusError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ModbusError::Timeout,
        _ => ModbusError::Io(e),
    }
}
