// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core error types.
//!
//! Every fallible operation in the crate surfaces one of these variants.
//! Compute-time errors abort only the triggering push; processor state is
//! left as it was before the failed computation.

use thiserror::Error;

use crate::core::processor::ProcessorId;

/// Result type for lineflux operations
pub type FluxResult<T> = Result<T, FluxError>;

/// Error taxonomy for graph construction and evaluation
#[derive(Error, Debug)]
pub enum FluxError {
    /// A function or processor was invoked with the wrong number of inputs.
    #[error("arity mismatch in '{context}': expected {expected} inputs, got {actual}")]
    ArityMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A value of an unexpected runtime shape was passed to a function.
    #[error("type mismatch in '{context}': expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Invalid wiring at graph-build time. Fails fast before any event flows.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// A processor id that is not registered in the graph.
    #[error("unknown processor {id}")]
    UnknownProcessor { id: ProcessorId },

    /// A port index outside a processor's declared arity.
    #[error("port {port} out of range for {direction} arity {arity} of processor {id}")]
    PortOutOfRange {
        id: ProcessorId,
        port: usize,
        arity: usize,
        direction: PortDirection,
    },

    /// Input text could not be mapped to an event.
    #[error("mapping failed: {message}")]
    MappingFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Which side of a processor a port index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

impl FluxError {
    /// Create an arity mismatch error
    pub fn arity_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a generic connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a mapping error from a message
    pub fn mapping_failed(message: impl Into<String>) -> Self {
        Self::MappingFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a mapping error with an underlying cause
    pub fn mapping_failed_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::MappingFailed {
            message: message.into(),
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_mismatch_message() {
        let error = FluxError::arity_mismatch("And", 2, 3);
        assert_eq!(
            error.to_string(),
            "arity mismatch in 'And': expected 2 inputs, got 3"
        );
    }

    #[test]
    fn test_type_mismatch_message() {
        let error = FluxError::type_mismatch("And", "boolean", "string");
        assert!(matches!(error, FluxError::TypeMismatch { .. }));
        assert!(error.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_connection_error() {
        let error = FluxError::connection("input port 0 already bound");
        assert!(matches!(error, FluxError::Connection { .. }));
    }

    #[test]
    fn test_mapping_failed_with_source() {
        let cause: Box<dyn std::error::Error + Send + Sync> =
            "unexpected end of input".to_string().into();
        let error = FluxError::mapping_failed_with_source("bad JSON line", cause);
        match error {
            FluxError::MappingFailed { source, .. } => assert!(source.is_some()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
