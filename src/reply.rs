//! Bytes sent back to the requester.
//!
//! Every rejection produces the same status line, regardless of which check
//! failed. A request that reached the controller gets no reply at all; the
//! outcome is only visible in the logs and to the caller of
//! [`Gateway::handle`](crate::Gateway::handle).

use crate::gateway::PipelineOutcome;

/// Status line sent for every rejected request.
pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\n";

/// Reply decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Generic negative acknowledgement.
    BadRequest,
    /// Nothing is written back.
    Silent,
}

impl Reply {
    /// Chooses the reply for a pipeline outcome.
    pub fn for_outcome(outcome: &PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::HeaderRejected(_) | PipelineOutcome::BodyRejected(_) => {
                Self::BadRequest
            }
            PipelineOutcome::Actuated { .. } => Self::Silent,
        }
    }

    /// Wire bytes of the reply; empty when silent.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::BadRequest => BAD_REQUEST,
            Self::Silent => &[],
        }
    }
}
