//! Protocol module: the JSON-RPC 2.0 peer.

// JSON-RPC 2.0 implementation
pub mod jsonrpc;

// Re-export common protocol components
pub use self::jsonrpc::client::{ClientOutcome, ClientRegistry, ClientStatus, OutputSink};
pub use self::jsonrpc::peer::Peer;
pub use self::jsonrpc::server::{HandlerOutcome, MethodHandler, MethodResult, ServerDispatcher};
