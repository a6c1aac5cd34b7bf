// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Shape validation for JSON-RPC envelopes.
//!
//! These checks operate directly on parsed [`serde_json::Value`]s rather
//! than on the typed [`super::types::Request`]/[`super::types::Response`]
//! structs. A cooperative peer has to decide *before* it commits to a typed
//! deserialization whether a malformed payload is a request or a response,
//! so the checks here are deliberately loose: they confirm just enough
//! shape to route the envelope, and never panic on unexpected input.

use serde_json::Value;

/// Returns true if `value` looks like a well-formed JSON-RPC 2.0 request
/// (or notification) object.
///
/// A request must be a JSON object with `jsonrpc: "2.0"` and a string
/// `method` field. `id`, if present, must be a string, number, or null.
/// `params` is not inspected at all — any shape, including a scalar, is
/// tolerated here. An empty method name is tolerated too; the dispatcher
/// reports `MethodNotFound` for it like any other unregistered name.
pub fn is_valid_request(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return false;
    }

    if !matches!(obj.get("method"), Some(Value::String(_))) {
        return false;
    }

    if let Some(id) = obj.get("id") {
        if !id.is_string() && !id.is_number() && !id.is_null() {
            return false;
        }
    }

    true
}

/// Returns true if `value` looks like a well-formed JSON-RPC 2.0 response
/// object.
///
/// A response must be a JSON object with `jsonrpc: "2.0"`, an `id` that is a
/// number in `[0, 2^32)` (the only shape the client registry ever assigns),
/// and exactly one of `result` or `error` (never both, never neither). When
/// `error` is present it must itself be an object with an integer `code` in
/// signed-64 range and a string `message`.
pub fn is_valid_response(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return false;
    }

    let has_result = obj.contains_key("result");
    let has_error = obj.contains_key("error");
    if has_result == has_error {
        return false;
    }

    if has_error && !is_valid_error_object(&obj["error"]) {
        return false;
    }

    match obj.get("id").and_then(Value::as_i64) {
        Some(id) => (0..=i64::from(u32::MAX)).contains(&id),
        None => false,
    }
}

/// True if `value` is a JSON-RPC error object: an object with an integer
/// `code` (signed-64 range) and a string `message`. `data`, if present, is
/// unconstrained.
fn is_valid_error_object(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    if !matches!(obj.get("code"), Some(Value::Number(n)) if n.is_i64()) {
        return false;
    }

    matches!(obj.get("message"), Some(Value::String(_)))
}

/// Returns true if `value` is a top-level JSON-RPC envelope shape: either
/// an object (single request/response) or a non-empty array (batch).
pub fn is_valid_envelope_shape(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}
