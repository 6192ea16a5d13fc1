//! Engine errors.
//!
//! Every error aborts processing of the current document. There is no
//! partial-success mode: after an error the engine must be reset with a new
//! document start (or dropped) before it is used again.

use thiserror::Error;

use crate::event::Position;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required collaborator is missing or a configuration value is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to parse engine configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A matched processor is of a kind the engine cannot execute on elements.
    #[error("processor '{processor}' matched <{tag}> at {position} but is not an element processor")]
    UnsupportedProcessor {
        processor: String,
        tag: String,
        position: Position,
    },

    /// Internal bookkeeping went wrong. Indicates a bug, not bad input.
    #[error("engine invariant violated at {position}: {message}")]
    Invariant { message: String, position: Position },

    /// Iteration was requested but the variables map has no local scopes.
    #[error(
        "cannot iterate <{tag}> at {position}: variables map does not support local variables"
    )]
    IterationUnavailable { tag: String, position: Position },

    #[error("processor '{processor}' failed on <{tag}> at {position}")]
    Processor {
        processor: String,
        tag: String,
        position: Position,
        #[source]
        source: ProcessorError,
    },
}

impl EngineError {
    pub(crate) fn invariant(message: impl Into<String>, position: Position) -> Self {
        EngineError::Invariant {
            message: message.into(),
            position,
        }
    }
}

/// Failure reported by a processor (typically an expression evaluation error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProcessorError {
    message: String,
}

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
