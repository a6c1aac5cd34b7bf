//! Protocol error module.
//!
//! This module defines error types that may occur during JSON-RPC envelope
//! handling at the host-side `Result` level (as opposed to the wire-facing
//! `JsonRpcError` object in [`crate::protocol::jsonrpc::error`]).

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Error when the JSON-RPC message is invalid.
    #[error("invalid JSON-RPC message: {0}")]
    InvalidMessage(String),

    /// Error when a message with a duplicate ID is received.
    #[error("duplicate message ID: {0}")]
    DuplicateId(String),

    /// Error when the message exceeds the maximum allowed size.
    #[error("message size exceeds maximum allowed: {size} > {max_size}")]
    MessageTooLarge {
        /// The actual size of the message in bytes
        size: usize,
        /// The maximum allowed size in bytes
        max_size: usize,
    },

    /// Error when the response cannot be correlated with a request.
    #[error("cannot correlate response to request: {0}")]
    CorrelationError(String),

    /// Other protocol errors.
    #[error("protocol error: {0}")]
    Other(String),
}
