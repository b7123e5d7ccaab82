use std::fmt;

use thiserror::Error;

/// Failures surfaced by a `UserInteraction` backend.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The operator interrupted the prompt (Ctrl+C / Esc).
    #[error("prompt cancelled by operator")]
    Cancelled,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("terminal failure: {0}")]
    Terminal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompatibleReason {
    /// The node kind is outside the supported subset.
    UnsupportedKind(String),
    /// Record nesting went past the configured depth bound.
    DepthExceeded { max_depth: usize },
    /// Arrays may only hold primitives or enums.
    UnsupportedArrayElement(String),
    /// `$ref` and other self-referential constructs.
    SelfReference,
    Malformed(String),
}

impl fmt::Display for IncompatibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompatibleReason::UnsupportedKind(kind) => write!(f, "unsupported schema kind `{kind}`"),
            IncompatibleReason::DepthExceeded { max_depth } => {
                write!(f, "record nesting exceeds the depth bound of {max_depth}")
            }
            IncompatibleReason::UnsupportedArrayElement(kind) => {
                write!(f, "array elements must be primitive or enum, found `{kind}`")
            }
            IncompatibleReason::SelfReference => write!(f, "schema references are not supported"),
            IncompatibleReason::Malformed(msg) => write!(f, "malformed schema: {msg}"),
        }
    }
}

/// A schema node that cannot be rendered, with the path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("incompatible schema at `{path}`: {reason}")]
pub struct Incompatibility {
    pub path: String,
    pub reason: IncompatibleReason,
}

impl Incompatibility {
    pub fn new(path: impl Into<String>, reason: IncompatibleReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Incompatible(#[from] Incompatibility),

    #[error("invalid schema at `{path}`: {message}")]
    InvalidSchema { path: String, message: String },

    #[error("unsupported array element type `{kind}`")]
    UnsupportedArrayElement { kind: String },

    #[error("session interrupted: {message}")]
    Interrupted { message: String },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("transcript logging failed: {0}")]
    Transcript(String),
}
