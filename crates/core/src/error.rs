use serde::{Deserialize, Serialize};

use crate::ast::Bucket;

/// A malformed token stream. `pos` is a character offset into the command
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("lex error at position {pos}: {reason}")]
pub struct LexError {
    pub pos: usize,
    pub reason: String,
}

impl LexError {
    pub fn new(pos: usize, reason: impl Into<String>) -> Self {
        LexError {
            pos,
            reason: reason.into(),
        }
    }
}

/// A malformed command. Carries what the parser was looking for and what it
/// saw instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("parse error at position {pos}: expected {expected}, found {found}")]
pub struct ParseError {
    pub pos: usize,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn new(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        ParseError {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Non-fatal finding recorded during modifier resolution. Attached to the
/// command node it concerns; never aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticWarning {
    /// The same canonical key was stated in two different buckets on one
    /// command. The most recently stated bucket wins.
    BucketConflict {
        key: String,
        kept: Bucket,
        dropped: Bucket,
    },
}

impl std::fmt::Display for SemanticWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticWarning::BucketConflict { key, kept, dropped } => write!(
                f,
                "modifier '{}' stated as both {} and {}; keeping {}",
                key,
                dropped.label(),
                kept.label(),
                kept.label()
            ),
        }
    }
}

/// Transpilation failure. Raised before any prompt text is produced, so a
/// caller never sees partial output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranspileError {
    #[error("unbound placeholder '{{{name}}}'")]
    UnboundPlaceholder { name: String },
}

/// Failure loading an alias or template table from an external source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("load error: {message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        LoadError {
            message: message.into(),
        }
    }
}

/// Umbrella error for the pipeline entry points. Each stage's error type is
/// also usable on its own.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(untagged)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transpile(#[from] TranspileError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Validation(#[from] crate::contract::ValidationError),
}
