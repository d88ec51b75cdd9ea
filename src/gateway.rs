//! Request pipeline and blocking accept loop.
//!
//! ```text
//! raw bytes -> header block -> body block -> actuator -> reply
//!                  |               |
//!                  +---------------+--> 400 Bad Request
//! ```
//!
//! Connections are served one at a time. Each connection delivers its whole
//! request in a single read of at most [`MAX_REQUEST_SIZE`] bytes; longer or
//! fragmented requests are not reassembled.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};

use tracing::{debug, info, info_span, warn};

use crate::body::{self, ActuatorDirective};
use crate::driver::{Actuator, ActuatorOutcome};
use crate::error::RequestError;
use crate::reply::Reply;
use crate::request;
use crate::state::ActuatorState;

/// Largest request read from a connection.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Blank line separating the header block from the body block.
pub const REQUEST_SEPARATOR: &str = "\r\n\r\n";

/// What the pipeline did with one request.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The header block failed validation; the body was never parsed.
    HeaderRejected(RequestError),
    /// The body failed validation; the actuator was never driven.
    BodyRejected(RequestError),
    /// The request was accepted and the actuator was driven.
    Actuated {
        /// Directive taken from the body.
        directive: ActuatorDirective,
        /// Result of the controller interaction.
        outcome: ActuatorOutcome,
    },
}

impl PipelineOutcome {
    /// Returns whether both header and body were accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Actuated { .. })
    }

    /// Validation error that rejected the request, if any.
    pub fn rejection(&self) -> Option<&RequestError> {
        match self {
            Self::HeaderRejected(err) | Self::BodyRejected(err) => Some(err),
            Self::Actuated { .. } => None,
        }
    }

    /// Reply owed to the requester.
    pub fn reply(&self) -> Reply {
        Reply::for_outcome(self)
    }
}

/// The protocol gateway: pipeline state plus the downstream actuator.
#[derive(Debug)]
pub struct Gateway<A> {
    state: ActuatorState,
    actuator: A,
}

impl<A: Actuator> Gateway<A> {
    /// Creates a gateway with the actuator register OFF.
    pub fn new(actuator: A) -> Self {
        Self::with_state(actuator, ActuatorState::new())
    }

    /// Creates a gateway with an explicit initial register.
    pub fn with_state(actuator: A, state: ActuatorState) -> Self {
        Self { state, actuator }
    }

    /// Current actuator register.
    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    /// The downstream actuator.
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Runs one raw request through validation and, if accepted, the actuator.
    ///
    /// Never panics on malformed input.
    pub fn handle(&mut self, raw: &[u8]) -> PipelineOutcome {
        let Ok(text) = std::str::from_utf8(raw) else {
            info!(kind = RequestError::MalformedHeader.kind(), "request is not valid UTF-8");
            return PipelineOutcome::HeaderRejected(RequestError::MalformedHeader);
        };

        let (header_block, body_block) = match text.split_once(REQUEST_SEPARATOR) {
            Some((header, body)) => (header, Some(body)),
            None => (text, None),
        };
        debug!(header = header_block, body = ?body_block, "request received");

        let request = match request::parse(header_block) {
            Ok(request) => request,
            Err(err) => {
                info!(kind = err.kind(), error = %err, "header rejected");
                return PipelineOutcome::HeaderRejected(err);
            }
        };
        info!(method = request.method.token(), "header accepted");

        let directive = match body_block
            .ok_or(RequestError::MalformedBody)
            .and_then(|block| body::parse_into(block, &mut self.state))
        {
            Ok(directive) => directive,
            Err(err) => {
                info!(kind = err.kind(), error = %err, "body rejected");
                return PipelineOutcome::BodyRejected(err);
            }
        };
        info!(%directive, "body accepted");

        let outcome = self.actuator.drive(self.state.desired_on());
        info!(
            write_succeeded = outcome.write_succeeded,
            read_back_succeeded = outcome.read_back_succeeded,
            observed_on = ?outcome.observed_on,
            "actuator interaction finished"
        );
        PipelineOutcome::Actuated { directive, outcome }
    }

    /// Serves a single accepted connection: one read, one pipeline run, reply.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading the request or writing the reply fails.
    pub fn serve_connection(&mut self, stream: &mut TcpStream) -> io::Result<PipelineOutcome> {
        let mut buffer = [0u8; MAX_REQUEST_SIZE];
        let len = stream.read(&mut buffer)?;
        let outcome = self.handle(&buffer[..len]);

        let reply = outcome.reply();
        let bytes = reply.as_bytes();
        if !bytes.is_empty() {
            stream.write_all(bytes)?;
            stream.flush()?;
        }
        debug!(reply = ?reply, "reply sent");

        // The peer may already have gone away.
        let _ = stream.shutdown(Shutdown::Both);
        Ok(outcome)
    }

    /// Serves connections from `incoming` until it is exhausted.
    ///
    /// Accept and per-connection I/O failures are logged and never stop the
    /// loop.
    pub fn serve_incoming<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = io::Result<TcpStream>>,
    {
        for stream in incoming {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let peer = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let span = info_span!("connection", %peer);
            let _entered = span.enter();

            if let Err(e) = self.serve_connection(&mut stream) {
                warn!(error = %e, "connection failed");
            }
        }
    }

    /// Serves connections on `listener` forever.
    pub fn serve(&mut self, listener: &TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening for HTCPCP requests");
        }
        self.serve_incoming(listener.incoming());
    }
}
