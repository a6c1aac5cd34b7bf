// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Server-side request dispatcher.
//!
//! Owns the method registry and routes inbound request/notification/batch
//! envelopes to registered handlers, honoring an in-flight invocation cap
//! shared across both the single-request and batch paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::ReentrantMutex;
use serde_json::Value;

use super::codec;
use super::error::JsonRpcError;
use super::types::{Id, Request};
use super::validation;

/// The result a registered method handler produces.
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// The method executed successfully, producing `result`.
    Ok(Value),
    /// The supplied `params` were rejected by the handler itself.
    InvalidParams(String),
}

/// Alias kept for call sites that register a handler inline; the type a
/// handler's future resolves to.
pub type MethodResult = HandlerOutcome;

/// A registered JSON-RPC method handler.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Invokes the method with the request's (already-extracted) params.
    async fn call(&self, params: Option<Value>) -> HandlerOutcome;
}

#[async_trait]
impl<F, Fut> MethodHandler for F
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerOutcome> + Send,
{
    async fn call(&self, params: Option<Value>) -> HandlerOutcome {
        (self)(params).await
    }
}

struct Inner {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
    in_flight: u32,
}

/// Dispatches inbound JSON-RPC envelopes to registered method handlers.
#[derive(Clone)]
pub struct ServerDispatcher {
    inner: Arc<ReentrantMutex<RefCell<Inner>>>,
    max_requests: u32,
    parallel: bool,
}

impl ServerDispatcher {
    /// Creates a dispatcher that allows at most `max_requests` handler
    /// invocations in flight at once.
    ///
    /// `parallel` selects the batch execution strategy: when `true`,
    /// batch sub-requests are launched together and complete in whatever
    /// order their handlers finish; when `false`, sub-requests run one at
    /// a time in array order.
    pub fn new(max_requests: u32, parallel: bool) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(Inner {
                handlers: HashMap::new(),
                in_flight: 0,
            }))),
            max_requests,
            parallel,
        }
    }

    /// Registers `handler` under `method`, replacing any existing
    /// registration. Method names are matched case-sensitively.
    pub fn handler_set<H: MethodHandler + 'static>(&self, method: impl Into<String>, handler: H) {
        let guard = self.inner.lock();
        guard.borrow_mut().handlers.insert(method.into(), Arc::new(handler));
    }

    /// Removes the handler registered under `method`, if any. Returns
    /// `true` if a handler was actually removed.
    pub fn handler_unset(&self, method: &str) -> bool {
        let guard = self.inner.lock();
        guard.borrow_mut().handlers.remove(method).is_some()
    }

    /// Number of handler invocations currently in flight.
    pub fn in_flight(&self) -> u32 {
        let guard = self.inner.lock();
        guard.borrow().in_flight
    }

    /// Routes a parsed JSON-RPC envelope (single request, notification, or
    /// batch array) to its handler(s).
    ///
    /// Returns `None` when the envelope calls for no response at all: a
    /// lone notification, or a batch made up entirely of notifications.
    pub async fn call(&self, envelope: Value) -> Option<Value> {
        match envelope {
            Value::Array(items) => {
                if items.is_empty() {
                    return Some(codec::build_error(Id::Null, JsonRpcError::invalid_request()));
                }
                let responses = if self.parallel {
                    self.call_batch_parallel(items).await
                } else {
                    self.call_batch_sequential(items).await
                };
                if responses.is_empty() {
                    None
                } else {
                    Some(Value::Array(responses))
                }
            }
            Value::Object(_) => self.call_single(envelope).await,
            _ => Some(codec::build_error(Id::Null, JsonRpcError::invalid_request())),
        }
    }

    /// Sequential batch: sub-requests run strictly one at a time, in
    /// array order, and the response array preserves that order.
    async fn call_batch_sequential(&self, items: Vec<Value>) -> Vec<Value> {
        let mut responses = Vec::with_capacity(items.len());
        for item in items {
            if let Some(response) = self.call_single(item).await {
                responses.push(response);
            }
        }
        responses
    }

    /// Parallel batch: every sub-request's future is queued before any of
    /// them is polled, then all run concurrently against the shared
    /// in-flight cap. Responses land in completion order, which need not
    /// match the request array's order.
    async fn call_batch_parallel(&self, items: Vec<Value>) -> Vec<Value> {
        let mut pending = FuturesUnordered::new();
        for item in items {
            pending.push(self.call_single(item));
        }

        let mut responses = Vec::new();
        while let Some(response) = pending.next().await {
            if let Some(response) = response {
                responses.push(response);
            }
        }
        responses
    }

    /// Handles one request object: in-flight check, then shape
    /// validation, then id extraction, then handler lookup and
    /// invocation.
    async fn call_single(&self, value: Value) -> Option<Value> {
        let has_id = value.get("id").is_some();

        if !self.try_enter() {
            return if has_id {
                Some(codec::build_error(best_effort_id(&value), JsonRpcError::too_many_requests()))
            } else {
                None
            };
        }

        let response = self.dispatch_validated(value).await;
        self.leave();
        response
    }

    async fn dispatch_validated(&self, value: Value) -> Option<Value> {
        if !validation::is_valid_request(&value) {
            return Some(codec::build_error(best_effort_id(&value), JsonRpcError::invalid_request()));
        }

        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(_) => return Some(codec::build_error(Id::Null, JsonRpcError::invalid_request())),
        };

        let handler = self.get_handler(&request.method);
        let outcome = match handler {
            Some(handler) => Some(handler.call(request.params).await),
            None => None,
        };

        request.id.map(|id| match outcome {
            None => codec::build_error(id, JsonRpcError::method_not_found()),
            Some(HandlerOutcome::Ok(value)) => codec::build_result(id, value),
            Some(HandlerOutcome::InvalidParams(msg)) => codec::build_error(id, JsonRpcError::invalid_params(msg)),
        })
    }

    fn get_handler(&self, method: &str) -> Option<Arc<dyn MethodHandler>> {
        let guard = self.inner.lock();
        guard.borrow().handlers.get(method).cloned()
    }

    fn try_enter(&self) -> bool {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        if inner.in_flight >= self.max_requests {
            false
        } else {
            inner.in_flight += 1;
            true
        }
    }

    fn leave(&self) {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }
}

/// Extracts an `id` for an error response without committing to the full
/// shape validation, used when we must reply to a request whose shape we
/// have not yet (or could not) parse as a [`Request`].
fn best_effort_id(value: &Value) -> Id {
    match value.get("id") {
        Some(Value::String(s)) => Id::String(s.clone()),
        Some(Value::Number(n)) => n.as_i64().map(Id::Number).unwrap_or(Id::Null),
        _ => Id::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn echo_handler(params: Option<Value>) -> impl Future<Output = HandlerOutcome> {
        async move { HandlerOutcome::Ok(params.unwrap_or(Value::Null)) }
    }

    #[tokio::test]
    async fn dispatches_single_request() {
        let dispatcher = ServerDispatcher::new(8, false);
        dispatcher.handler_set("echo", echo_handler);

        let response = dispatcher
            .call(json!({"jsonrpc": "2.0", "method": "echo", "params": {"x": 1}, "id": 1}))
            .await
            .unwrap();

        assert_eq!(response["result"], json!({"x": 1}));
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn notification_produces_no_response() {
        let dispatcher = ServerDispatcher::new(8, false);
        dispatcher.handler_set("echo", echo_handler);

        let response = dispatcher
            .call(json!({"jsonrpc": "2.0", "method": "echo", "params": [1]}))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let dispatcher = ServerDispatcher::new(8, false);
        let response = dispatcher
            .call(json!({"jsonrpc": "2.0", "method": "nope", "id": 1}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn handler_invalid_params_maps_to_error_code() {
        let dispatcher = ServerDispatcher::new(8, false);
        dispatcher.handler_set("strict", |_params: Option<Value>| async move {
            HandlerOutcome::InvalidParams("expected an object".to_string())
        });

        let response = dispatcher
            .call(json!({"jsonrpc": "2.0", "method": "strict", "params": [1], "id": 9}))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn sequential_batch_preserves_order() {
        let dispatcher = ServerDispatcher::new(8, false);
        dispatcher.handler_set("echo", echo_handler);

        let batch = json!([
            {"jsonrpc": "2.0", "method": "echo", "params": 1, "id": "a"},
            {"jsonrpc": "2.0", "method": "echo", "params": 2, "id": "b"},
            {"jsonrpc": "2.0", "method": "echo", "params": 3, "id": "c"},
        ]);

        let response = dispatcher.call(batch).await.unwrap();
        let responses = response.as_array().unwrap();
        assert_eq!(responses[0]["id"], "a");
        assert_eq!(responses[1]["id"], "b");
        assert_eq!(responses[2]["id"], "c");
    }

    #[tokio::test]
    async fn parallel_batch_completes_out_of_order() {
        let dispatcher = ServerDispatcher::new(8, true);
        dispatcher.handler_set("slow_then_fast", |params: Option<Value>| async move {
            let delay_ms = params.as_ref().and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            HandlerOutcome::Ok(json!(delay_ms))
        });

        let batch = json!([
            {"jsonrpc": "2.0", "method": "slow_then_fast", "params": 30, "id": "slow"},
            {"jsonrpc": "2.0", "method": "slow_then_fast", "params": 1, "id": "fast"},
        ]);

        let response = dispatcher.call(batch).await.unwrap();
        let responses = response.as_array().unwrap();
        assert_eq!(responses.len(), 2);
        // the fast handler was queued second but finishes first
        assert_eq!(responses[0]["id"], "fast");
        assert_eq!(responses[1]["id"], "slow");
    }

    #[tokio::test]
    async fn in_flight_cap_rejects_excess_requests() {
        let dispatcher = ServerDispatcher::new(1, true);
        let gate = Arc::new(tokio::sync::Notify::new());
        let entered = Arc::new(AtomicU32::new(0));

        let gate_clone = gate.clone();
        let entered_clone = entered.clone();
        dispatcher.handler_set("hold", move |_params: Option<Value>| {
            let gate = gate_clone.clone();
            let entered = entered_clone.clone();
            async move {
                entered.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
                HandlerOutcome::Ok(Value::Null)
            }
        });

        let batch = json!([
            {"jsonrpc": "2.0", "method": "hold", "id": 1},
            {"jsonrpc": "2.0", "method": "hold", "id": 2},
        ]);

        let dispatcher_clone = dispatcher.clone();
        let call = tokio::spawn(async move { dispatcher_clone.call(batch).await });

        // let the first handler claim the only in-flight slot
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(entered.load(Ordering::SeqCst), 1);

        gate.notify_one();
        let response = call.await.unwrap().unwrap();
        let responses = response.as_array().unwrap();
        let rejected = responses.iter().find(|r| r["id"] == 2).unwrap();
        assert_eq!(rejected["error"]["code"], -32001);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sequential_batch_output_order_always_matches_input(ids in proptest::collection::vec(0i64..1000, 1..12)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let dispatcher = ServerDispatcher::new(64, false);
                dispatcher.handler_set("echo", echo_handler);

                let batch: Vec<Value> = ids
                    .iter()
                    .map(|id| json!({"jsonrpc": "2.0", "method": "echo", "params": id, "id": id}))
                    .collect();

                let response = dispatcher.call(Value::Array(batch)).await.unwrap();
                let responses = response.as_array().unwrap();

                prop_assert_eq!(responses.len(), ids.len());
                for (response, expected_id) in responses.iter().zip(ids.iter()) {
                    prop_assert_eq!(response["id"].as_i64(), Some(*expected_id));
                }
                Ok(())
            })?;
        }
    }
}
