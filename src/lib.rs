//! # HTCPCP to Modbus application gateway
//!
//! Sits in the supervisory zone of a brewing-process testbed. It accepts
//! HTCPCP (RFC 2324) `BREW` requests from the enterprise zone, validates them
//! against a fixed grammar, and turns accepted requests into a Modbus TCP coil
//! write on the controller that switches the brewer.
//!
//! ## Pipeline
//!
//! | Stage | Module | Failure |
//! |-------|--------|---------|
//! | Header block | [`request`] | `400 Bad Request` |
//! | Body block | [`body`] | `400 Bad Request` |
//! | Desired state | [`ActuatorState`] | - |
//! | Coil write + read-back | [`ActuatorDriver`] | logged only |
//! | Reply | [`Reply`] | - |
//!
//! ## Quick Start
//!
//! ```no_run
//! use htcpcp_gateway::{ActuatorDriver, ClientConfig, DriverConfig, Gateway};
//! use std::net::{Ipv4Addr, TcpListener};
//!
//! let client = ClientConfig::new(Ipv4Addr::new(172, 29, 101, 190), 1);
//! let driver = ActuatorDriver::new(DriverConfig::new(client).with_coil_address(8225));
//!
//! let listener = TcpListener::bind("127.0.0.1:8080")?;
//! Gateway::new(driver).serve(&listener);
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Handling a single request
//!
//! ```
//! use htcpcp_gateway::{Actuator, ActuatorOutcome, Gateway, Reply};
//!
//! struct Dry;
//!
//! impl Actuator for Dry {
//!     fn drive(&mut self, _desired_on: bool) -> ActuatorOutcome {
//!         ActuatorOutcome::default()
//!     }
//! }
//!
//! let mut gateway = Gateway::new(Dry);
//! let outcome = gateway.handle(
//!     b"HTTP/1.1 BREW\r\nAccept-Additions: 0\r\nContent-Type: application/coffee-pot-command\r\n\r\ncoffee-message-body = start \n",
//! );
//! assert!(outcome.is_accepted());
//! assert!(gateway.state().desired_on());
//! assert_eq!(outcome.reply(), Reply::Silent);
//! ```
//!
//! ## Modbus layer
//!
//! The fieldbus side is a small protocol-only client: each call produces
//! exactly 1 request and 1 response, with no retries, caching or reconnection.
//! Only Write Single Coil (`0x05`) and Read Coils (`0x01`) are implemented.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod body;
mod client;
mod command;
pub mod config;
mod driver;
mod error;
mod gateway;
mod header;
mod reply;
pub mod request;
mod response;
mod state;
pub mod telemetry;
mod transport;
pub mod utils;

// Public re-exports
pub use body::ActuatorDirective;
pub use client::{Client, ClientConfig};
pub use command::{
    ReadCoilsCommand, WriteSingleCoilCommand, COIL_OFF, COIL_ON, MAX_COILS_PER_READ,
};
pub use config::{GatewayConfig, LogFormat};
pub use driver::{
    Actuator, ActuatorDriver, ActuatorOutcome, DriverConfig, DEFAULT_COIL_ADDRESS,
    READ_BACK_COILS,
};
pub use error::{exception_description, ActuatorError, ModbusError, RequestError, Result};
pub use gateway::{Gateway, PipelineOutcome, MAX_REQUEST_SIZE, REQUEST_SEPARATOR};
pub use header::{MbapHeader, MBAP_HEADER_SIZE};
pub use reply::{Reply, BAD_REQUEST};
pub use request::{BrewMethod, ParsedHeaders, ValidatedRequest};
pub use response::ModbusResponse;
pub use state::ActuatorState;
pub use transport::{TcpTransport, DEFAULT_MODBUS_PORT, DEFAULT_TIMEOUT};
