//! Error module for the cooperative JSON-RPC peer.
//!
//! This module provides a comprehensive error handling framework for the
//! whole crate, following Rust's idiomatic error handling patterns with
//! explicit error types, proper error propagation, and helpful context
//! information. It is distinct from [`crate::protocol::jsonrpc::error`],
//! which models the JSON-RPC error *object* that travels on the wire; the
//! types here never get serialized, they are for host-side `Result`
//! propagation.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

use once_cell::sync::OnceCell;

pub mod config;
pub mod protocol;
pub mod sink;

/// Result type alias used throughout the crate.
pub type PeerResult<T> = Result<T, PeerError>;

/// Core error enum for the crate.
#[derive(Error, Debug)]
pub enum PeerError {
    /// Errors occurring during configuration loading or validation.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Errors related to JSON-RPC envelope handling.
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    /// Errors related to the outbound sink.
    #[error("sink error: {0}")]
    Sink(#[from] sink::SinkError),

    /// IO errors that may occur during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases where specific error types are not defined.
    #[error("{0}")]
    Custom(String),
}

/// Error reporting structure to provide context and debugging information.
#[derive(Debug)]
pub struct ErrorContext {
    /// The original error that occurred.
    pub error: PeerError,

    /// The component where the error occurred.
    pub component: String,

    /// Additional context information to help with debugging.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context with the given error and component.
    pub fn new<S: Into<String>>(error: PeerError, component: S) -> Self {
        Self {
            error,
            component: component.into(),
            details: None,
        }
    }

    /// Adds detail information to the error context.
    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error in {}: {}", self.component, self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\ndetails: {details}")?;
        }
        Ok(())
    }
}

/// Error reporter trait for reporting errors to various sinks.
pub trait ErrorReporter: Send + Sync + std::fmt::Debug {
    /// Report an error with context.
    fn report(&self, context: ErrorContext);
}

/// A simple error reporter implementation that logs errors using the tracing framework.
#[derive(Default, Debug)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: ErrorContext) {
        tracing::error!(
            error = %context.error,
            component = %context.component,
            details = context.details.as_deref().unwrap_or("none"),
            "error reported"
        );
    }
}

/// Global error reporter instance.
///
/// The reference implementation this crate is modeled on used a `static mut`
/// here; `OnceCell` gives the same single-assignment global without unsafe.
static ERROR_REPORTER: OnceCell<Arc<dyn ErrorReporter>> = OnceCell::new();

/// Set the global error reporter.
///
/// Has no effect if a reporter has already been installed.
pub fn set_error_reporter(reporter: Arc<dyn ErrorReporter>) {
    let _ = ERROR_REPORTER.set(reporter);
}

/// Report an error via the globally configured reporter, falling back to
/// stderr if none has been installed.
pub fn report_error(context: ErrorContext) {
    match ERROR_REPORTER.get() {
        Some(reporter) => reporter.report(context),
        None => eprintln!("{context}"),
    }
}
