// Copyright (c) 2025 Cooperative JRPC Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error types for the JSON-RPC 2.0 protocol handler.
//!
//! This module defines error codes and error types according to the
//! [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification#error_object),
//! plus the two implementation-defined codes this peer uses to reject
//! oversized input and to signal saturation of its in-flight capacity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard JSON-RPC 2.0 error codes, plus this peer's two reserved codes.
///
/// The error codes -32700, -32600, -32601, -32602, and -32603 are standard
/// JSON-RPC 2.0 errors. -32000 and -32001 fall in the `-32000` to `-32099`
/// "server error" range the specification reserves for implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parse error (-32700). Invalid JSON was received.
    ParseError = -32700,

    /// Invalid Request (-32600). The JSON sent is not a valid Request object.
    InvalidRequest = -32600,

    /// Method not found (-32601). The method does not exist / is not available.
    MethodNotFound = -32601,

    /// Invalid params (-32602). Invalid method parameter(s).
    InvalidParams = -32602,

    /// Internal error (-32603).
    InternalError = -32603,

    /// Input too long (-32000). The inbound payload exceeded the configured
    /// maximum length before it could be parsed.
    InputTooLong = -32000,

    /// Too many requests (-32001). The dispatcher or registry is at its
    /// configured in-flight capacity and cannot accept another request.
    TooManyRequests = -32001,
}

impl ErrorCode {
    /// Returns a string description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::InputTooLong => "Input too long",
            ErrorCode::TooManyRequests => "Too many requests",
        }
    }

    /// Creates an `ErrorCode` from a raw integer value.
    ///
    /// Returns `None` if the code is not one of the codes this peer emits.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(ErrorCode::ParseError),
            -32600 => Some(ErrorCode::InvalidRequest),
            -32601 => Some(ErrorCode::MethodNotFound),
            -32602 => Some(ErrorCode::InvalidParams),
            -32603 => Some(ErrorCode::InternalError),
            -32000 => Some(ErrorCode::InputTooLong),
            -32001 => Some(ErrorCode::TooManyRequests),
            _ => None,
        }
    }

    /// Returns the integer error code.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> i32 {
        code as i32
    }
}

/// JSON-RPC error object as defined in the specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Creates a new JSON-RPC error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a new JSON-RPC error with additional data.
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates a standard parse error.
    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError, "Parse error")
    }

    /// Creates a standard invalid request error.
    pub fn invalid_request() -> Self {
        Self::new(ErrorCode::InvalidRequest, "Invalid Request")
    }

    /// Creates a standard method not found error.
    ///
    /// The wire message is the bare standard string; the method name is not
    /// interpolated into it.
    pub fn method_not_found() -> Self {
        Self::new(ErrorCode::MethodNotFound, "Method not found")
    }

    /// Creates a standard invalid params error.
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Invalid params: {}", msg.into()))
    }

    /// Creates a standard internal error.
    pub fn internal_error<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorCode::InternalError, format!("Internal error: {}", msg.into()))
    }

    /// Creates the "input too long" error.
    pub fn input_too_long(size: usize, max_size: usize) -> Self {
        Self::with_data(
            ErrorCode::InputTooLong,
            "Server error",
            serde_json::json!({ "size": size, "maxSize": max_size }),
        )
    }

    /// Creates the "too many requests" error.
    pub fn too_many_requests() -> Self {
        Self::new(ErrorCode::TooManyRequests, "Too many requests in flight")
    }
}

/// Error type for JSON-RPC envelope operations.
#[derive(Debug, Error)]
pub enum Error {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON-RPC protocol error.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),

    /// Method handler error.
    #[error("method handler error: {0}")]
    MethodHandler(String),
}

impl From<JsonRpcError> for Error {
    fn from(error: JsonRpcError) -> Self {
        Error::JsonRpc(format!("{}: {}", error.code, error.message))
    }
}

impl Error {
    /// Converts the error to a JSON-RPC error object suitable for the wire.
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Error::Json(_) => JsonRpcError::parse_error(),
            Error::JsonRpc(msg) => JsonRpcError::new(ErrorCode::InternalError, msg),
            Error::MethodHandler(msg) => JsonRpcError::new(ErrorCode::InternalError, msg),
        }
    }
}

/// Specialized Result type for JSON-RPC envelope operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(ErrorCode::ParseError.description(), "Parse error");
        assert_eq!(ErrorCode::InputTooLong.description(), "Input too long");
        assert_eq!(ErrorCode::TooManyRequests.description(), "Too many requests");
    }

    #[test]
    fn test_error_code_from_code() {
        assert_eq!(ErrorCode::from_code(-32700), Some(ErrorCode::ParseError));
        assert_eq!(ErrorCode::from_code(-32600), Some(ErrorCode::InvalidRequest));
        assert_eq!(ErrorCode::from_code(-32601), Some(ErrorCode::MethodNotFound));
        assert_eq!(ErrorCode::from_code(-32602), Some(ErrorCode::InvalidParams));
        assert_eq!(ErrorCode::from_code(-32603), Some(ErrorCode::InternalError));
        assert_eq!(ErrorCode::from_code(-32000), Some(ErrorCode::InputTooLong));
        assert_eq!(ErrorCode::from_code(-32001), Some(ErrorCode::TooManyRequests));
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(-32099), None);
    }

    #[test]
    fn test_jsonrpc_error_creation() {
        let error = JsonRpcError::new(ErrorCode::ParseError, "Invalid JSON");
        assert_eq!(error.code, -32700);
        assert!(error.data.is_none());

        let too_long = JsonRpcError::input_too_long(100, 64);
        assert_eq!(too_long.code, -32000);
        assert_eq!(too_long.message, "Server error");
        assert_eq!(too_long.data.unwrap()["size"], 100);
    }

    #[test]
    fn standard_wire_messages_match_the_literal_spec_strings() {
        assert_eq!(JsonRpcError::parse_error().message, "Parse error");
        assert_eq!(JsonRpcError::invalid_request().message, "Invalid Request");
        assert_eq!(JsonRpcError::method_not_found().message, "Method not found");
        assert_eq!(JsonRpcError::input_too_long(17, 16).message, "Server error");
    }

    #[test]
    fn test_error_conversion() {
        let json_error = Error::Json(serde_json::from_str::<serde_json::Value>("not json").unwrap_err());
        assert_eq!(json_error.to_jsonrpc_error().code, -32700);

        let method_error = Error::MethodHandler("division by zero".to_string());
        let jsonrpc_error = method_error.to_jsonrpc_error();
        assert_eq!(jsonrpc_error.code, -32603);
        assert!(jsonrpc_error.message.contains("division by zero"));
    }

    use test_case::test_case;

    #[test_case(ErrorCode::ParseError, -32700, "Parse error"; "parse error")]
    #[test_case(ErrorCode::InvalidRequest, -32600, "Invalid Request"; "invalid request")]
    #[test_case(ErrorCode::MethodNotFound, -32601, "Method not found"; "method not found")]
    #[test_case(ErrorCode::InvalidParams, -32602, "Invalid params"; "invalid params")]
    #[test_case(ErrorCode::InternalError, -32603, "Internal error"; "internal error")]
    #[test_case(ErrorCode::InputTooLong, -32000, "Input too long"; "input too long")]
    #[test_case(ErrorCode::TooManyRequests, -32001, "Too many requests"; "too many requests")]
    fn error_code_taxonomy_round_trips(code: ErrorCode, wire: i32, description: &str) {
        assert_eq!(code.code(), wire);
        assert_eq!(code.description(), description);
        assert_eq!(ErrorCode::from_code(wire), Some(code));
        assert_eq!(i32::from(code), wire);
    }
}
