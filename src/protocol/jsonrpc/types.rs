// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Types for the JSON-RPC 2.0 protocol.
//!
//! This module defines the core data structures for JSON-RPC 2.0 requests,
//! notifications, and responses according to the
//! [specification](https://www.jsonrpc.org/specification).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::JsonRpcError;

/// JSON-RPC request identifier.
///
/// Can be a string, number, or null as per the JSON-RPC 2.0 specification.
/// The client registry only ever generates [`Id::Number`] values, but a
/// request envelope built on behalf of a peer can carry any variant (the
/// sender chooses the id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),

    /// Numeric identifier
    Number(i64),

    /// Null identifier (not recommended but valid per spec)
    Null,
}

impl Id {
    /// True if this is a [`Id::Number`] whose value fits in `[0, 2^32)`, the
    /// range the codec requires for a well-formed response id.
    pub fn is_valid_response_id(&self) -> bool {
        matches!(self, Id::Number(n) if (0..=i64::from(u32::MAX)).contains(n))
    }

    /// The numeric value of this id, if it is a [`Id::Number`] within
    /// `u32` range.
    pub fn as_correlation_id(&self) -> Option<u32> {
        match self {
            Id::Number(n) if *n >= 0 && *n <= i64::from(u32::MAX) => Some(*n as u32),
            _ => None,
        }
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Number(i64::from(value))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "{s}"),
            Id::Number(n) => write!(f, "{n}"),
            Id::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request object.
///
/// A request without an `id` is a notification — no response is expected.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    /// JSON-RPC protocol version, always "2.0"
    pub jsonrpc: String,

    /// Name of the method to be invoked
    pub method: String,

    /// Method parameters, can be positional (array) or named (object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,

    /// Request identifier, if None then the request is a notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl Request {
    /// Creates a new JSON-RPC 2.0 request.
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: Option<Id>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Returns true if this request is a notification (no id).
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Creates a new JSON-RPC notification (no id).
    pub fn notification(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self::new(method, params, None)
    }
}

/// A JSON-RPC 2.0 notification object.
///
/// Functionally identical to a [`Request`] without an id; kept as a
/// separate alias for API clarity at call sites.
pub type Notification = Request;

/// A JSON-RPC 2.0 response object.
///
/// Contains either a `result` or an `error`, never both.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Response {
    /// JSON-RPC protocol version, always "2.0"
    pub jsonrpc: String,

    /// The result of the method invocation, if successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// The error object, if an error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Same identifier as the request this is responding to (or `null` for
    /// errors detected before an id could be extracted).
    pub id: Id,
}

impl Response {
    /// Creates a new successful JSON-RPC 2.0 response.
    pub fn success(id: Id, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Creates a new error JSON-RPC 2.0 response.
    pub fn error(id: Id, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Returns true if this response contains a successful result.
    pub fn is_success(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    /// Returns true if this response contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
