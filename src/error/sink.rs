//! Outbound sink error module.
//!
//! The peer hands serialized envelopes to an externally supplied sink (see
//! [`crate::protocol::jsonrpc::peer::OutputSink`]). This module defines the
//! failure shape that sink can report back.

use thiserror::Error;

/// Errors that can occur while handing an envelope to the outbound sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink rejected the bytes outright (e.g. the underlying transport is closed).
    #[error("sink rejected output: {0}")]
    Rejected(String),

    /// The sink is not ready to accept output right now.
    #[error("sink not ready")]
    NotReady,
}
