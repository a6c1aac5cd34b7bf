// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! The bidirectional peer: demultiplexes inbound bytes between the
//! client's pending-request registry and the server's request
//! dispatcher, and provides the outbound half of both through one sink.

use std::time::Duration;

use serde_json::Value;

use crate::error::sink::SinkError;
use super::client::{ClientOutcome, ClientRegistry, OutputSink};
use super::codec;
use super::error::JsonRpcError;
use super::server::{MethodHandler, ServerDispatcher};
use super::types::{Id, Response};
use super::validation;

/// A bidirectional JSON-RPC 2.0 peer.
///
/// Reads raw inbound bytes, classifies each top-level payload as either a
/// response (routed to the client registry) or a request/notification/
/// batch (routed to the server dispatcher), and writes any resulting
/// bytes back out through `sink`.
pub struct Peer<S: OutputSink> {
    client: ClientRegistry,
    server: ServerDispatcher,
    sink: S,
    max_input_len: usize,
    on_error: Option<Box<dyn Fn(SinkError) + Send + Sync>>,
}

impl<S: OutputSink> Peer<S> {
    /// Creates a new peer. Inbound payloads longer than `max_input_len`
    /// bytes are rejected with a `-32000` error before they are parsed.
    pub fn new(client: ClientRegistry, server: ServerDispatcher, sink: S, max_input_len: usize) -> Self {
        Self { client, server, sink, max_input_len, on_error: None }
    }

    /// Installs a callback invoked whenever a write to the sink fails.
    pub fn with_on_error(mut self, on_error: impl Fn(SinkError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Sends a request and awaits its outcome. See
    /// [`ClientRegistry::send_request`].
    pub async fn send_request(&self, method: &str, params: Option<Value>, timeout: Duration) -> ClientOutcome {
        self.client.send_request(&self.sink, method, params, timeout).await
    }

    /// Sends a notification (fire-and-forget).
    pub fn send_notification(&self, method: &str, params: Option<Value>) -> Result<(), SinkError> {
        self.client.send_notification(&self.sink, method, params)
    }

    /// Registers a method handler with the server dispatcher.
    pub fn handler_set<H: MethodHandler + 'static>(&self, method: impl Into<String>, handler: H) {
        self.server.handler_set(method, handler);
    }

    /// Removes a method handler. Returns `true` if one was registered.
    pub fn handler_unset(&self, method: &str) -> bool {
        self.server.handler_unset(method)
    }

    /// Feeds raw inbound bytes (one complete JSON document) to the peer.
    ///
    /// Oversized input and unparsable input both produce a synthesized
    /// error envelope written back through the sink; neither condition
    /// ever reaches the classification step below.
    pub async fn read(&self, bytes: &[u8]) {
        if bytes.len() > self.max_input_len {
            self.emit(codec::build_error(
                Id::Null,
                JsonRpcError::input_too_long(bytes.len(), self.max_input_len),
            ));
            return;
        }

        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(_) => {
                self.emit(codec::build_error(Id::Null, JsonRpcError::parse_error()));
                return;
            }
        };

        self.read_json(value).await;
    }

    /// Feeds an already-parsed JSON value to the peer.
    ///
    /// A top-level object or array is classified as a response if it (or,
    /// for an array, its first element) has the shape of one. When an
    /// array's first element looks like a response, only that element is
    /// routed to the client registry; the rest of the array is discarded
    /// rather than being reinterpreted as a batch of requests.
    pub async fn read_json(&self, value: Value) {
        match &value {
            Value::Array(items) => {
                if let Some(first) = items.first() {
                    if validation::is_valid_response(first) {
                        self.route_response(first.clone());
                        return;
                    }
                }
                if let Some(response) = self.server.call(value).await {
                    self.emit(response);
                }
            }
            Value::Object(_) => {
                if validation::is_valid_response(&value) {
                    self.route_response(value);
                    return;
                }
                if let Some(response) = self.server.call(value).await {
                    self.emit(response);
                }
            }
            _ => self.emit(codec::build_error(Id::Null, JsonRpcError::invalid_request())),
        }
    }

    fn route_response(&self, value: Value) {
        if let Ok(response) = serde_json::from_value::<Response>(value) {
            self.client.read_response(response);
        }
    }

    fn emit(&self, envelope: Value) {
        let Ok(bytes) = serde_json::to_vec(&envelope) else {
            return;
        };
        if let Err(e) = self.sink.send(&bytes) {
            if let Some(on_error) = &self.on_error {
                on_error(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink {
        sent: Mutex<Vec<Value>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { sent: Mutex::new(Vec::new()) }
        }
    }

    impl OutputSink for RecordingSink {
        fn send(&self, bytes: &[u8]) -> Result<(), SinkError> {
            self.sent.lock().unwrap().push(serde_json::from_slice(bytes).unwrap());
            Ok(())
        }
    }

    fn build_peer() -> Peer<RecordingSink> {
        Peer::new(ClientRegistry::new(8), ServerDispatcher::new(8, false), RecordingSink::new(), 1024)
    }

    #[tokio::test]
    async fn routes_request_to_server() {
        let peer = build_peer();
        peer.handler_set("ping", |_params: Option<Value>| async move {
            super::super::server::HandlerOutcome::Ok(json!("pong"))
        });

        peer.read(br#"{"jsonrpc":"2.0","method":"ping","id":1}"#).await;

        let sent = peer.sink.sent.lock().unwrap();
        assert_eq!(sent[0]["result"], "pong");
    }

    #[tokio::test]
    async fn routes_response_to_client() {
        let peer = build_peer();

        let call = {
            let client = peer.client.clone();
            let sink = RecordingSink::new();
            tokio::spawn(async move { client.send_request(&sink, "ping", None, Duration::from_secs(5)).await })
        };

        tokio::task::yield_now().await;
        peer.read_json(json!({"jsonrpc": "2.0", "result": "pong", "id": 0})).await;

        let outcome = call.await.unwrap();
        assert_eq!(outcome.result, Some(json!("pong")));
    }

    #[tokio::test]
    async fn oversized_input_yields_input_too_long() {
        let peer = Peer::new(ClientRegistry::new(8), ServerDispatcher::new(8, false), RecordingSink::new(), 4);
        peer.read(br#"{"jsonrpc":"2.0"}"#).await;
        let sent = peer.sink.sent.lock().unwrap();
        assert_eq!(sent[0]["error"]["code"], -32000);
    }

    #[tokio::test]
    async fn unparsable_input_yields_parse_error() {
        let peer = build_peer();
        peer.read(b"not json").await;
        let sent = peer.sink.sent.lock().unwrap();
        assert_eq!(sent[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn array_led_by_a_response_extracts_only_that_element() {
        let peer = build_peer();

        let call = {
            let client = peer.client.clone();
            let sink = RecordingSink::new();
            tokio::spawn(async move { client.send_request(&sink, "ping", None, Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;

        peer.read_json(json!([
            {"jsonrpc": "2.0", "result": "pong", "id": 0},
            {"jsonrpc": "2.0", "method": "ignored", "id": "x"},
        ]))
        .await;

        let outcome = call.await.unwrap();
        assert_eq!(outcome.result, Some(json!("pong")));
        // the second array element was never dispatched as a request
        assert!(peer.sink.sent.lock().unwrap().is_empty());
    }
}
