//! Error types for rule compilation

use thiserror::Error;

/// Errors produced while turning rules into detectors
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("rule {name:?}: unknown rule type {kind:?}")]
    UnknownKind { name: String, kind: String },

    #[error("rule {name:?}: {message}")]
    MalformedRecord { name: String, message: String },

    #[error("{}", join_failures(.failures))]
    Batch { failures: Vec<CompileError> },
}

impl CompileError {
    pub fn unknown_kind(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownKind { name: name.into(), kind: kind.into() }
    }

    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord { name: name.into(), message: message.into() }
    }

    /// Unknown kinds are skipped by batch compilation instead of failing it.
    pub fn is_unknown_kind(&self) -> bool {
        matches!(self, Self::UnknownKind { .. })
    }
}

fn join_failures(failures: &[CompileError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
