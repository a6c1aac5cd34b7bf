//! Cooperative JSON-RPC peer library.
//!
//! This library contains a bidirectional JSON-RPC 2.0 peer built for embedded
//! and other single-threaded-cooperative environments where the transport
//! (WebSocket, serial, IPC) is supplied by the host application. The peer is
//! simultaneously a client (it originates requests and matches incoming
//! responses to them) and a server (it receives requests, dispatches them to
//! registered handlers, and produces responses).
//!
//! # Architecture
//!
//! - Strict component boundaries between the client registry, server
//!   dispatcher, and demultiplexing peer
//! - Dependency injection for the outbound sink and error callback
//! - Async-first approach: completions are `tokio::sync::oneshot` channels,
//!   handlers are async functions
//! - Comprehensive error handling and propagation

// Re-export public modules
pub mod config;
pub mod error;
pub mod protocol;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization function.
///
/// Installs the default tracing-based error reporter. Call once during
/// process startup, before constructing any [`protocol::jsonrpc::peer::Peer`].
pub fn init() {
    error::set_error_reporter(std::sync::Arc::new(error::TracingErrorReporter));
}
