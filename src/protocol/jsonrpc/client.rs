// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Client-side pending-request registry.
//!
//! Tracks requests this peer has sent and is waiting on a response for.
//! Each outstanding request owns exactly one slot in an internal map keyed
//! by correlation id. A slot moves through `Armed -> Completed -> gone`: a
//! response or a pre-send failure can mark a slot `Completed` and fulfill
//! its completion, but only the slot's own timer removes it from the map.
//! This keeps the id reserved for the whole timeout window, so a delayed
//! duplicate response can never be misrouted to a newer request that
//! happens to reuse the same number. All of this is serialized under a
//! single lock, so "who transitioned the slot first" is well defined even
//! though the timer fires from a separately spawned task.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::sink::SinkError;
use super::codec;
use super::error::JsonRpcError;
use super::types::{Id, Response};

/// Sink a peer writes serialized JSON-RPC bytes to.
///
/// Implementations only need to accept the bytes for transmission; this
/// peer never blocks waiting for the remote end to acknowledge delivery.
pub trait OutputSink: Send + Sync {
    /// Accepts `bytes` for transmission. Returning `Err` means the bytes
    /// were not accepted at all, not that delivery failed downstream.
    fn send(&self, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Final disposition of a request sent through [`ClientRegistry::send_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// A matching success response arrived.
    Ok,
    /// The request could not be sent or correlated, for a reason local to
    /// this peer (serialization failure, sink rejection, shutdown).
    ClientError,
    /// A matching response arrived carrying a JSON-RPC error object.
    ServerError,
    /// No response arrived before the timeout elapsed.
    Timeout,
    /// The registry was already at its configured capacity.
    TooManyRequests,
}

/// The outcome of a completed (or never-started) request.
#[derive(Debug, Clone)]
pub struct ClientOutcome {
    /// How the request concluded.
    pub status: ClientStatus,
    /// The `result` value, present only when `status` is `Ok`.
    pub result: Option<Value>,
    /// The wire error object, present only when `status` is `ServerError`.
    pub error: Option<JsonRpcError>,
    /// A host-side diagnostic message, present for `ClientError`.
    pub message: Option<String>,
}

impl ClientOutcome {
    fn ok(result: Value) -> Self {
        Self { status: ClientStatus::Ok, result: Some(result), error: None, message: None }
    }

    fn server_error(error: JsonRpcError) -> Self {
        Self { status: ClientStatus::ServerError, result: None, error: Some(error), message: None }
    }

    fn client_error(message: impl Into<String>) -> Self {
        Self {
            status: ClientStatus::ClientError,
            result: None,
            error: None,
            message: Some(message.into()),
        }
    }

    fn timeout() -> Self {
        Self { status: ClientStatus::Timeout, result: None, error: None, message: None }
    }

    /// Convenience constructor for a capacity rejection, returned before a
    /// request is ever sent.
    pub fn too_many_requests() -> Self {
        Self { status: ClientStatus::TooManyRequests, result: None, error: None, message: None }
    }
}

/// The state of one reserved correlation id.
///
/// A response transitions a slot from `Armed` to `Completed` rather than
/// removing it outright, so the id stays off-limits to new requests until
/// the timer reaps it. This is what makes a delayed duplicate response
/// harmless: by the time it could possibly collide with a *new* request
/// reusing the same id, the old slot is long gone.
enum Slot {
    Armed(oneshot::Sender<ClientOutcome>),
    Completed,
}

struct Inner {
    entries: HashMap<u32, Slot>,
    cursor: u32,
    armed_count: u32,
}

/// Registry of outstanding client requests.
///
/// Cheaply cloneable; all clones share the same underlying table, so a
/// handle can be moved into the spawned timer task for each request.
#[derive(Clone)]
pub struct ClientRegistry {
    inner: Arc<ReentrantMutex<RefCell<Inner>>>,
    max_requests: u32,
}

impl ClientRegistry {
    /// Creates a registry that admits at most `max_requests` concurrently
    /// armed requests.
    pub fn new(max_requests: u32) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(Inner {
                entries: HashMap::new(),
                cursor: 0,
                armed_count: 0,
            }))),
            max_requests,
        }
    }

    /// Number of requests currently awaiting a response (`Armed` slots).
    /// A slot that has already received its response but is still held
    /// open pending timer cleanup does not count against this.
    pub fn in_flight(&self) -> usize {
        let guard = self.inner.lock();
        guard.borrow().armed_count as usize
    }

    /// Reserves the next free correlation id and registers `sender` under
    /// it, or returns `None` if the registry is at capacity.
    ///
    /// The cursor is a monotonic counter that wraps at `u32::MAX`; each
    /// call resumes probing from where the last call left off rather than
    /// rescanning from zero, so the cost of finding a free slot stays
    /// proportional to how full the table is, not to `u32`'s range. A
    /// `Completed` slot awaiting timer cleanup still occupies its id, so
    /// the probe skips it exactly like an `Armed` one.
    fn register(&self, sender: oneshot::Sender<ClientOutcome>) -> Option<u32> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();

        if inner.armed_count >= self.max_requests {
            return None;
        }

        let start = inner.cursor;
        loop {
            let candidate = inner.cursor;
            inner.cursor = inner.cursor.wrapping_add(1);
            if !inner.entries.contains_key(&candidate) {
                inner.entries.insert(candidate, Slot::Armed(sender));
                inner.armed_count += 1;
                return Some(candidate);
            }
            if inner.cursor == start {
                return None;
            }
        }
    }

    /// Removes the slot for `id` unconditionally and returns its sender if
    /// it was still `Armed`. Used by timer expiry, which is the only path
    /// allowed to free a slot outright.
    fn reap(&self, id: u32) -> Option<oneshot::Sender<ClientOutcome>> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        match inner.entries.remove(&id) {
            Some(Slot::Armed(sender)) => {
                inner.armed_count = inner.armed_count.saturating_sub(1);
                Some(sender)
            }
            Some(Slot::Completed) | None => None,
        }
    }

    /// Transitions the slot for `id` from `Armed` to `Completed` and
    /// returns its sender, or `None` if there was no armed slot with that
    /// id (already completed, already reaped, or never existed). Does
    /// *not* remove the entry — that is the timer's job.
    fn complete_slot(&self, id: u32) -> Option<oneshot::Sender<ClientOutcome>> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let slot = inner.entries.get_mut(&id)?;
        if matches!(slot, Slot::Completed) {
            return None;
        }
        match std::mem::replace(slot, Slot::Completed) {
            Slot::Armed(sender) => {
                inner.armed_count = inner.armed_count.saturating_sub(1);
                Some(sender)
            }
            Slot::Completed => unreachable!(),
        }
    }

    /// Sends a request through `sink` and waits for a matching response,
    /// a timeout, or a send failure, whichever comes first.
    ///
    /// Registers the pending slot and arms its timer before writing the
    /// bytes, so a response or timeout racing the write can never find an
    /// un-registered id.
    pub async fn send_request<S: OutputSink>(
        &self,
        sink: &S,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> ClientOutcome {
        let (tx, rx) = oneshot::channel();
        let Some(id) = self.register(tx) else {
            return ClientOutcome::too_many_requests();
        };

        let envelope = codec::build_request(method, params, Id::from(id));
        let bytes = match serde_json::to_vec(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail_armed(id, ClientOutcome::client_error(e.to_string()));
                return rx.await.unwrap_or_else(|_| ClientOutcome::client_error("registry shut down"));
            }
        };

        if let Err(e) = sink.send(&bytes) {
            self.fail_armed(id, ClientOutcome::client_error(e.to_string()));
            return rx.await.unwrap_or_else(|_| ClientOutcome::client_error("registry shut down"));
        }

        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            registry.expire(id);
        });

        rx.await.unwrap_or_else(|_| ClientOutcome::client_error("registry shut down"))
    }

    /// Sends a notification (no response expected, no slot registered).
    pub fn send_notification<S: OutputSink>(
        &self,
        sink: &S,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), SinkError> {
        let envelope = codec::build_notification(method, params);
        let bytes = serde_json::to_vec(&envelope).expect("notification envelope always serializes");
        sink.send(&bytes)
    }

    /// Removes the slot for `id` outright and fulfills it with `outcome`.
    /// Used only for the two pre-timer failure paths (serialization, sink
    /// rejection) where no timer was ever armed to own the cleanup, so
    /// this call reverses the registration itself rather than leaving a
    /// `Completed` slot behind.
    fn fail_armed(&self, id: u32, outcome: ClientOutcome) {
        if let Some(sender) = self.reap(id) {
            let _ = sender.send(outcome);
        }
    }

    /// Timer-expiry handler: fires `Timeout` if the slot is still `Armed`,
    /// or simply removes it if a response already moved it to `Completed`.
    /// Either way, this is the only place a slot is freed after a response
    /// has raced it, which keeps the id reserved for the whole timeout
    /// window rather than letting a new request recycle it immediately.
    fn expire(&self, id: u32) {
        if let Some(sender) = self.reap(id) {
            let _ = sender.send(ClientOutcome::timeout());
        }
    }

    /// Routes an inbound response to its matching slot.
    ///
    /// Returns `true` if `response.id` correlated with an armed request.
    /// A `false` return means the response was either malformed, late
    /// (its slot already timed out), or a duplicate of one already
    /// matched — all of which are silently dropped, never treated as
    /// protocol errors. The slot itself is not removed here; it stays
    /// reserved as `Completed` until its timer fires, so a further
    /// duplicate carrying the same id can never match a newer request
    /// that happened to reuse it.
    pub fn read_response(&self, response: Response) -> bool {
        let Some(id) = response.id.as_correlation_id() else {
            return false;
        };

        let Some(sender) = self.complete_slot(id) else {
            return false;
        };

        let outcome = match response.error {
            Some(error) => ClientOutcome::server_error(error),
            None => ClientOutcome::ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
        true
    }

    /// Completes every still-armed request with `ClientError`, draining
    /// the table. Intended for orderly peer shutdown.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            inner.armed_count = 0;
            inner.entries.drain().collect()
        };
        for (_, slot) in drained {
            if let Slot::Armed(sender) = slot {
                let _ = sender.send(ClientOutcome::client_error("registry shut down"));
            }
        }
    }
}
