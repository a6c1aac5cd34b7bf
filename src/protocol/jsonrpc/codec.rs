// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Envelope construction helpers.
//!
//! The original C implementation these four functions are modeled on each
//! return a status code because they allocate into a fixed-size arena that
//! can run out of room. `serde_json::Value` construction here only fails
//! against the global allocator, which aborts rather than returning an
//! error in Rust, so these builders are infallible.

use serde_json::{json, Value};

use super::error::JsonRpcError;
use super::types::Id;

/// Builds a JSON-RPC 2.0 request envelope.
pub fn build_request(method: &str, params: Option<Value>, id: Id) -> Value {
    let mut envelope = json!({
        "jsonrpc": "2.0",
        "method": method,
        "id": id_to_value(&id),
    });
    if let Some(params) = params {
        envelope["params"] = params;
    }
    envelope
}

/// Builds a JSON-RPC 2.0 notification envelope (a request with no `id`).
pub fn build_notification(method: &str, params: Option<Value>) -> Value {
    let mut envelope = json!({
        "jsonrpc": "2.0",
        "method": method,
    });
    if let Some(params) = params {
        envelope["params"] = params;
    }
    envelope
}

/// Builds a successful JSON-RPC 2.0 response envelope.
pub fn build_result(id: Id, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id_to_value(&id),
    })
}

/// Builds an error JSON-RPC 2.0 response envelope.
pub fn build_error(id: Id, error: JsonRpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": error,
        "id": id_to_value(&id),
    })
}

fn id_to_value(id: &Id) -> Value {
    serde_json::to_value(id).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_request_with_params() {
        let env = build_request("subtract", Some(json!([42, 23])), Id::Number(1));
        assert_eq!(env["method"], "subtract");
        assert_eq!(env["params"], json!([42, 23]));
        assert_eq!(env["id"], 1);
    }

    #[test]
    fn builds_notification_without_id() {
        let env = build_notification("update", Some(json!([1, 2, 3])));
        assert!(env.get("id").is_none());
        assert_eq!(env["method"], "update");
    }

    #[test]
    fn builds_result_and_error() {
        let ok = build_result(Id::String("a".into()), json!(19));
        assert_eq!(ok["result"], 19);
        assert_eq!(ok["id"], "a");

        let err = build_error(Id::Null, JsonRpcError::method_not_found());
        assert_eq!(err["error"]["code"], -32601);
        assert!(err["id"].is_null());
    }

    use proptest::prelude::*;
    use super::super::types::Request;

    fn arb_id() -> impl Strategy<Value = Id> {
        prop_oneof![
            (0i64..=i64::from(u32::MAX)).prop_map(Id::Number),
            "[a-zA-Z0-9_-]{0,16}".prop_map(Id::String),
        ]
    }

    fn arb_params() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            any::<i64>().prop_map(|n| Some(json!(n))),
            "[a-z]{0,8}".prop_map(|s| Some(json!({ "value": s }))),
            proptest::collection::vec(any::<i32>(), 0..4).prop_map(|v| Some(json!(v))),
        ]
    }

    proptest! {
        #[test]
        fn build_request_round_trips_through_parse(
            method in "[a-zA-Z][a-zA-Z0-9_]{0,15}",
            params in arb_params(),
            id in arb_id(),
        ) {
            let envelope = build_request(&method, params.clone(), id.clone());
            let bytes = serde_json::to_vec(&envelope).unwrap();
            let parsed: Request = serde_json::from_slice(&bytes).unwrap();

            prop_assert_eq!(&parsed.jsonrpc, "2.0");
            prop_assert_eq!(&parsed.method, &method);
            prop_assert_eq!(parsed.id, Some(id));
            prop_assert_eq!(parsed.params, params);
        }
    }
}
