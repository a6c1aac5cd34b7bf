// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! A bidirectional JSON-RPC 2.0 peer for single-threaded cooperative
//! environments.
//!
//! This module implements the [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification):
//! envelope types, error codes, shape validation, envelope construction,
//! a client-side pending-request registry, a server-side request
//! dispatcher, and the [`peer::Peer`] that ties the two together over one
//! [`client::OutputSink`].
//!
//! # Example
//!
//! ```
//! use cooperative_jrpc_lib::protocol::jsonrpc::client::{ClientRegistry, OutputSink};
//! use cooperative_jrpc_lib::protocol::jsonrpc::server::{HandlerOutcome, ServerDispatcher};
//! use cooperative_jrpc_lib::protocol::jsonrpc::peer::Peer;
//! use cooperative_jrpc_lib::error::sink::SinkError;
//!
//! struct NullSink;
//! impl OutputSink for NullSink {
//!     fn send(&self, _bytes: &[u8]) -> Result<(), SinkError> { Ok(()) }
//! }
//!
//! # async fn run() {
//! let server = ServerDispatcher::new(16, false);
//! server.handler_set("echo", |params| async move { HandlerOutcome::Ok(params.unwrap_or_default()) });
//! let peer = Peer::new(ClientRegistry::new(16), server, NullSink, 64 * 1024);
//! peer.read(br#"{"jsonrpc":"2.0","method":"echo","params":1,"id":1}"#).await;
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod peer;
pub mod server;
pub mod types;
pub mod validation;

// Re-exports
pub use client::{ClientOutcome, ClientRegistry, ClientStatus, OutputSink};
pub use error::{Error, ErrorCode, JsonRpcError, Result};
pub use peer::Peer;
pub use server::{HandlerOutcome, MethodHandler, MethodResult, ServerDispatcher};
pub use types::{Id, Notification, Request, Response};
pub use validation::{is_valid_envelope_shape, is_valid_request, is_valid_response};
